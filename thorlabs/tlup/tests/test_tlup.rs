//! Tests for the TLUP facade using the loopback driver.

use std::{
    ffi::CStr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use rstest::*;

use thorlabs_tlup::{
    DeviceHandle, DriverCall, ErrorKind, LoopbackDevice, LoopbackDriver, OpenOptions,
    SetpointAttribute, StringBuffer, Tlup, TlupDriver, TlupError, ViSession, ViStatus, sys,
};

type TlupLbk = Tlup<LoopbackDriver>;

const RSRC_1: &str = "USB0::0x1313::0x80C8::M00412345::INSTR";
const RSRC_2: &str = "USB0::0x1313::0x80C8::M00467890::INSTR";

/// Create a facade with a loopback driver that has the given devices attached.
fn crt_tlup(devices: Vec<LoopbackDevice>) -> TlupLbk {
    Tlup::new(LoopbackDriver::new(devices))
}

/// A facade with two LEDs attached.
#[fixture]
fn two_leds() -> TlupLbk {
    crt_tlup(vec![
        LoopbackDevice::new(RSRC_1, 11).with_info("LED1", "SN001", 0.5, 5.0, 405.0),
        LoopbackDevice::new(RSRC_2, 22).with_info("LED2", "SN002", 1.0, 3.0, 625.0),
    ])
}

// Discovery

#[rstest]
#[case(vec![])]
#[case(vec!["COM1"])]
#[case(vec!["COM3", "COM1", "USB0::0x1313::0x80C8::M00412345::INSTR"])]
fn test_list_devices(#[case] resources: Vec<&str>) {
    let devices = resources
        .iter()
        .enumerate()
        .map(|(i, r)| LoopbackDevice::new(r, i as ViSession))
        .collect();
    let tlup = crt_tlup(devices);

    assert_eq!(tlup.list_devices().unwrap(), resources);
}

#[rstest]
fn test_list_devices_none_is_empty() {
    let tlup = crt_tlup(vec![]);

    let names = tlup.list_devices().unwrap();
    assert!(names.is_empty());
    assert_eq!(tlup.into_driver().calls(), &[DriverCall::FindResources]);
}

#[rstest]
fn test_list_devices_find_fails() {
    let tlup = Tlup::new(
        LoopbackDriver::new(vec![LoopbackDevice::new("COM1", 1)])
            .with_failure(DriverCall::FindResources, -17),
    );

    let err = tlup.list_devices().unwrap_err();
    assert_eq!(err, TlupError::Discovery(-17));
    assert_eq!(err.kind(), ErrorKind::Discovery);
    assert_eq!(err.code(), Some(-17));
    assert_eq!(err.to_string(), "Could not find devices. Error code: -17");
}

/// A failing name lookup aborts the whole search without partial results.
#[rstest]
fn test_list_devices_name_fails(two_leds: TlupLbk) {
    let mut drv = two_leds.into_driver();
    drv.fail_on(DriverCall::ResourceName, -3);
    let tlup = Tlup::new(drv);

    match tlup.list_devices() {
        Err(TlupError::ResourceName { index, code }) => {
            assert_eq!(index, 0);
            assert_eq!(code, -3);
        }
        other => panic!("Expected ResourceName error, got {other:?}"),
    }
}

/// A lookup failing after others succeeded still returns no names at all.
#[rstest]
#[case(1)]
#[case(2)]
fn test_list_devices_later_name_fails(#[case] failing: u32) {
    let devices = (0..3)
        .map(|i| LoopbackDevice::new(&format!("COM{i}"), i))
        .collect();
    let tlup = Tlup::new(
        LoopbackDriver::new(devices).with_failure_at(
            DriverCall::ResourceName,
            failing as usize,
            -99,
        ),
    );

    assert_eq!(
        tlup.list_devices(),
        Err(TlupError::ResourceName {
            index: failing,
            code: -99
        })
    );
    // The search stopped at the failing lookup.
    let calls = tlup.into_driver().calls().to_vec();
    assert_eq!(calls.len(), 2 + failing as usize);
}

// Opening and closing

#[rstest]
fn test_open_returns_driver_session(two_leds: TlupLbk) {
    let h1 = two_leds.open(RSRC_1).unwrap();
    let h2 = two_leds.open(RSRC_2).unwrap();
    assert_eq!(h1.as_raw(), 11);
    assert_eq!(h2.as_raw(), 22);

    two_leds.close(h1).unwrap();
    two_leds.close(h2).unwrap();
    two_leds.into_driver().finalize();
}

#[rstest]
#[case(-1_073_807_343)]
#[case(-1)]
#[case(42)]
fn test_open_fails_with_code(#[case] code: ViStatus) {
    let tlup = crt_tlup(vec![LoopbackDevice::new("COM4", 1).with_open_status(code)]);

    match tlup.open("COM4") {
        Err(TlupError::Open { resource, code: c }) => {
            assert_eq!(resource, "COM4");
            assert_eq!(c, code);
        }
        other => panic!("Expected Open error, got {other:?}"),
    }
}

#[rstest]
fn test_open_unknown_resource(two_leds: TlupLbk) {
    let err = two_leds.open("COM99").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Open);
    assert_eq!(err.code(), Some(sys::VI_ERROR_RSRC_NFOUND));
}

#[rstest]
fn test_open_nul_in_resource(two_leds: TlupLbk) {
    let err = two_leds.open("COM\01").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Open);
    assert_eq!(err.code(), None);
    // The driver was never called.
    assert!(two_leds.into_driver().calls().is_empty());
}

#[rstest]
fn test_close_never_opened(two_leds: TlupLbk) {
    let err = two_leds.close(DeviceHandle::from_raw(11)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Close);
    assert_eq!(err, TlupError::Close(sys::VI_ERROR_INV_OBJECT));
}

#[rstest]
fn test_close_twice(two_leds: TlupLbk) {
    let handle = two_leds.open(RSRC_1).unwrap();
    let raw = handle.as_raw();
    two_leds.close(handle).unwrap();

    // The handle is gone, but a raw copy can still be handed to the driver, which rejects it.
    assert!(two_leds.close(DeviceHandle::from_raw(raw)).is_err());
}

// Queries

#[rstest]
fn test_get_info(two_leds: TlupLbk) {
    let handle = two_leds.open(RSRC_1).unwrap();

    let info = two_leds.get_info(&handle).unwrap();
    assert_eq!(
        info.into_tuple(),
        ("LED1".to_string(), "SN001".to_string(), 0.5, 5.0, 405.0)
    );

    two_leds.close(handle).unwrap();
}

/// Information is queried from the driver on every call.
#[rstest]
fn test_get_info_not_cached(two_leds: TlupLbk) {
    let handle = two_leds.open(RSRC_2).unwrap();
    let first = two_leds.get_info(&handle).unwrap();
    let second = two_leds.get_info(&handle).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.name(), "LED2");
    two_leds.close(handle).unwrap();

    let calls = two_leds.into_driver().calls().to_vec();
    assert_eq!(
        calls.iter().filter(|c| **c == DriverCall::LedInfo).count(),
        2
    );
}

#[rstest]
fn test_get_info_invalid_handle(two_leds: TlupLbk) {
    let err = two_leds.get_info(&DeviceHandle::from_raw(7)).unwrap_err();
    assert_eq!(
        err,
        TlupError::Query {
            what: "info",
            code: sys::VI_ERROR_INV_OBJECT
        }
    );
}

#[rstest]
#[case(0.0)]
#[case(0.123)]
#[case(0.5)]
fn test_current_round_trip(two_leds: TlupLbk, #[case] amps: f64) {
    let handle = two_leds.open(RSRC_1).unwrap();

    two_leds.set_current(&handle, amps).unwrap();
    assert_eq!(two_leds.get_current(&handle).unwrap(), amps);

    two_leds.close(handle).unwrap();
}

#[rstest]
#[case(SetpointAttribute::SetValue, 0.25)]
#[case(SetpointAttribute::MinValue, 0.0)]
#[case(SetpointAttribute::MaxValue, 1.0)]
#[case(SetpointAttribute::DefaultValue, 0.0)]
fn test_current_attributes(
    two_leds: TlupLbk,
    #[case] attribute: SetpointAttribute,
    #[case] expected: f64,
) {
    let handle = two_leds.open(RSRC_2).unwrap();
    two_leds.set_current(&handle, 0.25).unwrap();

    assert_eq!(
        two_leds.get_current_attribute(&handle, attribute).unwrap(),
        expected
    );

    two_leds.close(handle).unwrap();
}

#[rstest]
fn test_get_current_fails(two_leds: TlupLbk) {
    let handle = two_leds.open(RSRC_1).unwrap();
    let mut drv = two_leds.into_driver();
    drv.fail_on(DriverCall::CurrentSetpoint, -5);
    let tlup = Tlup::new(drv);

    let err = tlup.get_current(&handle).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Query);
    assert_eq!(err.to_string(), "Could not get device current. Error code: -5");
}

// Setting values

/// The limit is enforced by the driver, the facade only reports the failure.
#[rstest]
#[case(0.51)]
#[case(-0.1)]
#[case(f64::NAN)]
fn test_set_current_rejected(two_leds: TlupLbk, #[case] amps: f64) {
    let handle = two_leds.open(RSRC_1).unwrap();

    let err = two_leds.set_current(&handle, amps).unwrap_err();
    assert_eq!(
        err,
        TlupError::Set {
            what: "current",
            code: sys::VI_ERROR_PARAMETER2
        }
    );
    assert_eq!(two_leds.get_current(&handle).unwrap(), 0.0);

    two_leds.close(handle).unwrap();
}

#[rstest]
fn test_set_output(two_leds: TlupLbk) {
    let handle = two_leds.open(RSRC_2).unwrap();

    two_leds.set_output(&handle, true).unwrap();

    let drv = two_leds.into_driver();
    assert!(drv.device(RSRC_2).unwrap().output());
    assert!(!drv.device(RSRC_1).unwrap().output());
}

#[rstest]
fn test_set_output_fails(two_leds: TlupLbk) {
    let handle = two_leds.open(RSRC_2).unwrap();
    let mut drv = two_leds.into_driver();
    drv.fail_on(DriverCall::SwitchOutput, -9);
    let tlup = Tlup::new(drv);

    let err = tlup.set_output(&handle, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Set);
    assert_eq!(err.code(), Some(-9));
    assert_eq!(err.to_string(), "Could not set device output. Error code: -9");
}

#[rstest]
fn test_open_with_options(two_leds: TlupLbk) {
    let opts = OpenOptions::new().id_query(true).reset(true);
    let handle = two_leds.open_with(RSRC_1, opts).unwrap();
    two_leds.close(handle).unwrap();
}

// Concurrency

/// A driver that counts how many calls are in flight at the same time.
struct CallCounter {
    inner: LoopbackDriver,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl CallCounter {
    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // Give other threads the chance to interleave if they could.
        thread::sleep(Duration::from_millis(1));
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn count<F: FnOnce(&mut LoopbackDriver) -> ViStatus>(&mut self, f: F) -> ViStatus {
        self.enter();
        let status = f(&mut self.inner);
        self.exit();
        status
    }
}

impl TlupDriver for CallCounter {
    fn find_resources(&mut self, count: &mut u32) -> ViStatus {
        self.count(|d| d.find_resources(count))
    }

    fn resource_name(&mut self, index: u32, name: &mut StringBuffer) -> ViStatus {
        self.count(|d| d.resource_name(index, name))
    }

    fn init(
        &mut self,
        resource: &CStr,
        id_query: bool,
        reset: bool,
        session: &mut ViSession,
    ) -> ViStatus {
        self.count(|d| d.init(resource, id_query, reset, session))
    }

    fn close(&mut self, session: ViSession) -> ViStatus {
        self.count(|d| d.close(session))
    }

    fn led_info(
        &mut self,
        session: ViSession,
        name: &mut StringBuffer,
        serial: &mut StringBuffer,
        current_limit: &mut f64,
        forward_voltage: &mut f64,
        wavelength: &mut f64,
    ) -> ViStatus {
        self.count(|d| {
            d.led_info(
                session,
                name,
                serial,
                current_limit,
                forward_voltage,
                wavelength,
            )
        })
    }

    fn current_setpoint(
        &mut self,
        session: ViSession,
        attribute: SetpointAttribute,
        amps: &mut f64,
    ) -> ViStatus {
        self.count(|d| d.current_setpoint(session, attribute, amps))
    }

    fn set_current_setpoint(&mut self, session: ViSession, amps: f64) -> ViStatus {
        self.count(|d| d.set_current_setpoint(session, amps))
    }

    fn switch_output(&mut self, session: ViSession, on: bool) -> ViStatus {
        self.count(|d| d.switch_output(session, on))
    }
}

/// Calls from many threads on different devices never overlap inside the driver.
#[rstest]
fn test_calls_are_serialized() {
    let devices = (0..4)
        .map(|i| LoopbackDevice::new(&format!("COM{i}"), i).with_info("LED", "SN", 1.0, 3.0, 530.0))
        .collect();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let tlup = Tlup::new(CallCounter {
        inner: LoopbackDriver::new(devices),
        in_flight: Arc::clone(&in_flight),
        max_in_flight: Arc::clone(&max_in_flight),
    });

    thread::scope(|s| {
        for i in 0..4 {
            let tlup = &tlup;
            s.spawn(move || {
                assert_eq!(tlup.list_devices().unwrap().len(), 4);
                let handle = tlup.open(&format!("COM{i}")).unwrap();
                for step in 0..10 {
                    let amps = f64::from(step) / 10.0;
                    tlup.set_current(&handle, amps).unwrap();
                    tlup.set_output(&handle, step % 2 == 0).unwrap();
                    assert_eq!(tlup.get_current(&handle).unwrap(), amps);
                    tlup.get_info(&handle).unwrap();
                }
                tlup.close(handle).unwrap();
            });
        }
    });

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    tlup.into_driver().inner.finalize();
}

/// Independent facades do not share a lock.
#[rstest]
fn test_independent_facades() {
    let a = crt_tlup(vec![LoopbackDevice::new("COM1", 1)]);
    let b = crt_tlup(vec![]);

    let _handle = a.open("COM1").unwrap();
    assert!(b.list_devices().unwrap().is_empty());
    assert_eq!(a.list_devices().unwrap(), vec!["COM1"]);
}

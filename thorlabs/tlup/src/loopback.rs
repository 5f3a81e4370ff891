//! The loopback module provides a TLUP driver simulator for testing purposes.
//!
//! The [`LoopbackDriver`] behaves like the vendor driver with a set of [`LoopbackDevice`]s
//! attached: it hands out the configured sessions, echoes the current setpoint, enforces the
//! current limit, and rejects unknown sessions. On top of that, any entry point can be made to
//! fail with a given status code and all calls are recorded.

use std::{collections::HashMap, ffi::CStr};

use tlup_sys::{
    VI_ERROR_INV_OBJECT, VI_ERROR_PARAMETER2, VI_ERROR_RSRC_NFOUND, VI_SUCCESS, ViSession,
    ViStatus,
};

use crate::driver::{SetpointAttribute, StringBuffer, TlupDriver};

/// The entry points of the driver, used to record calls and to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverCall {
    /// [`TlupDriver::find_resources`]
    FindResources,
    /// [`TlupDriver::resource_name`]
    ResourceName,
    /// [`TlupDriver::init`]
    Init,
    /// [`TlupDriver::close`]
    Close,
    /// [`TlupDriver::led_info`]
    LedInfo,
    /// [`TlupDriver::current_setpoint`]
    CurrentSetpoint,
    /// [`TlupDriver::set_current_setpoint`]
    SetCurrentSetpoint,
    /// [`TlupDriver::switch_output`]
    SwitchOutput,
}

/// A simulated LED controller attached to the [`LoopbackDriver`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoopbackDevice {
    resource: String,
    session: ViSession,
    open_status: ViStatus,
    name: String,
    serial: String,
    current_limit: f64,
    forward_voltage: f64,
    wavelength: f64,
    setpoint: f64,
    output: bool,
    is_open: bool,
}

impl LoopbackDevice {
    /// Create a new device that is found under `resource` and opens with the given session.
    ///
    /// The LED defaults to a 1 A current limit, 3 V forward voltage, and a wavelength of 0 nm,
    /// use [`LoopbackDevice::with_info`] to change this.
    pub fn new(resource: &str, session: ViSession) -> Self {
        LoopbackDevice {
            resource: resource.to_string(),
            session,
            open_status: VI_SUCCESS,
            name: String::new(),
            serial: String::new(),
            current_limit: 1.0,
            forward_voltage: 3.0,
            wavelength: 0.0,
            setpoint: 0.0,
            output: false,
            is_open: false,
        }
    }

    /// Set the information the device reports on its LED.
    pub fn with_info(
        mut self,
        name: &str,
        serial: &str,
        current_limit: f64,
        forward_voltage: f64,
        wavelength: f64,
    ) -> Self {
        self.name = name.to_string();
        self.serial = serial.to_string();
        self.current_limit = current_limit;
        self.forward_voltage = forward_voltage;
        self.wavelength = wavelength;
        self
    }

    /// Make opening this device fail with the given status code.
    pub fn with_open_status(mut self, status: ViStatus) -> Self {
        self.open_status = status;
        self
    }

    /// The resource name of this device.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The current setpoint in amperes.
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Whether the LED output is switched on.
    pub fn output(&self) -> bool {
        self.output
    }

    /// Whether a session to this device is open.
    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

/// A driver that allows you to simply write tests for code using the [`crate::Tlup`] facade.
///
/// # Example
///
/// ```
/// use thorlabs_tlup::{LoopbackDevice, LoopbackDriver, Tlup};
///
/// let device = LoopbackDevice::new("USB0::0x1313::0x80C8::M00412345::INSTR", 7)
///     .with_info("LED1", "SN001", 0.5, 5.0, 405.0);
/// let tlup = Tlup::new(LoopbackDriver::new(vec![device]));
///
/// let resources = tlup.list_devices().unwrap();
/// let handle = tlup.open(&resources[0]).unwrap();
/// tlup.set_current(&handle, 0.1).unwrap();
/// assert_eq!(tlup.get_current(&handle).unwrap(), 0.1);
/// tlup.close(handle).unwrap();
///
/// // Make sure all sessions were closed again.
/// tlup.into_driver().finalize();
/// ```
#[derive(Debug, Default)]
pub struct LoopbackDriver {
    devices: Vec<LoopbackDevice>,
    found: u32,
    failures: HashMap<DriverCall, ViStatus>,
    failures_at: HashMap<(DriverCall, usize), ViStatus>,
    calls: Vec<DriverCall>,
}

impl LoopbackDriver {
    /// Create a new loopback driver with the given devices attached.
    ///
    /// The devices are reported by discovery in the given order.
    pub fn new(devices: Vec<LoopbackDevice>) -> Self {
        LoopbackDriver {
            devices,
            ..Default::default()
        }
    }

    /// Make every call of the given entry point fail with `status`.
    pub fn with_failure(mut self, call: DriverCall, status: ViStatus) -> Self {
        self.fail_on(call, status);
        self
    }

    /// Make every following call of the given entry point fail with `status`.
    pub fn fail_on(&mut self, call: DriverCall, status: ViStatus) {
        self.failures.insert(call, status);
    }

    /// Make only the `nth` call (counting from zero) of the given entry point fail with `status`.
    ///
    /// E.g., `with_failure_at(DriverCall::ResourceName, 1, status)` lets discovery read the first
    /// name and fail on the second one.
    pub fn with_failure_at(mut self, call: DriverCall, nth: usize, status: ViStatus) -> Self {
        self.failures_at.insert((call, nth), status);
        self
    }

    /// Let the given entry point succeed again.
    pub fn clear_failure(&mut self, call: DriverCall) {
        self.failures.remove(&call);
        self.failures_at.retain(|(c, _), _| *c != call);
    }

    /// All calls the driver received, in order.
    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    /// Get the device with the given resource name.
    pub fn device(&self, resource: &str) -> Option<&LoopbackDevice> {
        self.devices.iter().find(|dev| dev.resource == resource)
    }

    /// This command panics if a session to any of the devices is still open.
    ///
    /// You should use this command at the end of your test in order to make sure that your code
    /// closed every session it opened.
    pub fn finalize(&self) {
        if let Some(dev) = self.devices.iter().find(|dev| dev.is_open) {
            panic!(
                "Session {} to {} was never closed.",
                dev.session, dev.resource
            );
        }
    }

    /// Record the call and return the injected failure for it, if any.
    fn enter(&mut self, call: DriverCall) -> Option<ViStatus> {
        let nth = self.calls.iter().filter(|c| **c == call).count();
        self.calls.push(call);
        self.failures
            .get(&call)
            .or_else(|| self.failures_at.get(&(call, nth)))
            .copied()
    }

    /// Get the device with an open session `session`.
    fn open_device(&mut self, session: ViSession) -> Option<&mut LoopbackDevice> {
        self.devices
            .iter_mut()
            .find(|dev| dev.is_open && dev.session == session)
    }
}

/// Write `value` nul-terminated into `buf`, truncating it if required.
fn write_to_buffer(value: &str, buf: &mut StringBuffer) {
    let len = value.len().min(buf.len() - 1);
    buf[..len].copy_from_slice(&value.as_bytes()[..len]);
    buf[len] = 0;
}

impl TlupDriver for LoopbackDriver {
    fn find_resources(&mut self, count: &mut u32) -> ViStatus {
        if let Some(status) = self.enter(DriverCall::FindResources) {
            return status;
        }
        self.found = u32::try_from(self.devices.len()).unwrap_or(u32::MAX);
        *count = self.found;
        VI_SUCCESS
    }

    fn resource_name(&mut self, index: u32, name: &mut StringBuffer) -> ViStatus {
        if let Some(status) = self.enter(DriverCall::ResourceName) {
            return status;
        }
        if index >= self.found {
            return VI_ERROR_PARAMETER2;
        }
        match self.devices.get(index as usize) {
            Some(dev) => {
                write_to_buffer(&dev.resource, name);
                VI_SUCCESS
            }
            None => VI_ERROR_PARAMETER2,
        }
    }

    fn init(
        &mut self,
        resource: &CStr,
        _id_query: bool,
        _reset: bool,
        session: &mut ViSession,
    ) -> ViStatus {
        if let Some(status) = self.enter(DriverCall::Init) {
            return status;
        }
        let resource = resource.to_string_lossy();
        let Some(dev) = self.devices.iter_mut().find(|dev| dev.resource == resource) else {
            return VI_ERROR_RSRC_NFOUND;
        };
        if dev.open_status != VI_SUCCESS {
            return dev.open_status;
        }
        dev.is_open = true;
        *session = dev.session;
        VI_SUCCESS
    }

    fn close(&mut self, session: ViSession) -> ViStatus {
        if let Some(status) = self.enter(DriverCall::Close) {
            return status;
        }
        match self.open_device(session) {
            Some(dev) => {
                dev.is_open = false;
                VI_SUCCESS
            }
            None => VI_ERROR_INV_OBJECT,
        }
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
        if let Some(status) = self.enter(DriverCall::LedInfo) {
            return status;
        }
        let Some(dev) = self.open_device(session) else {
            return VI_ERROR_INV_OBJECT;
        };
        write_to_buffer(&dev.name, name);
        write_to_buffer(&dev.serial, serial);
        *current_limit = dev.current_limit;
        *forward_voltage = dev.forward_voltage;
        *wavelength = dev.wavelength;
        VI_SUCCESS
    }

    fn current_setpoint(
        &mut self,
        session: ViSession,
        attribute: SetpointAttribute,
        amps: &mut f64,
    ) -> ViStatus {
        if let Some(status) = self.enter(DriverCall::CurrentSetpoint) {
            return status;
        }
        let Some(dev) = self.open_device(session) else {
            return VI_ERROR_INV_OBJECT;
        };
        *amps = match attribute {
            SetpointAttribute::SetValue => dev.setpoint,
            SetpointAttribute::MinValue | SetpointAttribute::DefaultValue => 0.0,
            SetpointAttribute::MaxValue => dev.current_limit,
        };
        VI_SUCCESS
    }

    fn set_current_setpoint(&mut self, session: ViSession, amps: f64) -> ViStatus {
        if let Some(status) = self.enter(DriverCall::SetCurrentSetpoint) {
            return status;
        }
        let Some(dev) = self.open_device(session) else {
            return VI_ERROR_INV_OBJECT;
        };
        // NaN is rejected as well, as it is not contained in any range.
        if !(0.0..=dev.current_limit).contains(&amps) {
            return VI_ERROR_PARAMETER2;
        }
        dev.setpoint = amps;
        VI_SUCCESS
    }

    fn switch_output(&mut self, session: ViSession, on: bool) -> ViStatus {
        if let Some(status) = self.enter(DriverCall::SwitchOutput) {
            return status;
        }
        let Some(dev) = self.open_device(session) else {
            return VI_ERROR_INV_OBJECT;
        };
        dev.output = on;
        VI_SUCCESS
    }
}

//! The vendor library behind the [`TlupDriver`] trait.

use std::ffi::CStr;

use tlup_sys::{ViBoolean, ViSession, ViStatus};

use crate::driver::{SetpointAttribute, StringBuffer, TlupDriver};

/// Forwards every call to the TLUP library.
///
/// The library is not reentrant and keeps global state, so there must only ever be one of these
/// per process. It can therefore not be created directly, use [`crate::Tlup::shared`] instead.
#[derive(Debug)]
pub struct NativeDriver {
    _private: (),
}

impl NativeDriver {
    pub(crate) fn new() -> Self {
        NativeDriver { _private: () }
    }
}

// SAFETY (all methods): pointers are derived from live references for the duration of the call
// and every string buffer holds `TLUP_BUFFER_SIZE` bytes, which is the maximum the driver writes.
impl TlupDriver for NativeDriver {
    fn find_resources(&mut self, count: &mut u32) -> ViStatus {
        unsafe { tlup_sys::TLUP_findRsrc(0, count) }
    }

    fn resource_name(&mut self, index: u32, name: &mut StringBuffer) -> ViStatus {
        unsafe { tlup_sys::TLUP_getRsrcName(0, index, name.as_mut_ptr().cast()) }
    }

    fn init(
        &mut self,
        resource: &CStr,
        id_query: bool,
        reset: bool,
        session: &mut ViSession,
    ) -> ViStatus {
        unsafe {
            tlup_sys::TLUP_init(
                resource.as_ptr(),
                ViBoolean::from(id_query),
                ViBoolean::from(reset),
                session,
            )
        }
    }

    fn close(&mut self, session: ViSession) -> ViStatus {
        unsafe { tlup_sys::TLUP_close(session) }
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
        unsafe {
            tlup_sys::TLUP_getLedInfo(
                session,
                name.as_mut_ptr().cast(),
                serial.as_mut_ptr().cast(),
                current_limit,
                forward_voltage,
                wavelength,
            )
        }
    }

    fn current_setpoint(
        &mut self,
        session: ViSession,
        attribute: SetpointAttribute,
        amps: &mut f64,
    ) -> ViStatus {
        unsafe { tlup_sys::TLUP_getLedCurrentSetpoint(session, attribute.as_raw(), amps) }
    }

    fn set_current_setpoint(&mut self, session: ViSession, amps: f64) -> ViStatus {
        unsafe { tlup_sys::TLUP_setLedCurrentSetpoint(session, amps) }
    }

    fn switch_output(&mut self, session: ViSession, on: bool) -> ViStatus {
        unsafe { tlup_sys::TLUP_switchLedOutput(session, ViBoolean::from(on)) }
    }
}

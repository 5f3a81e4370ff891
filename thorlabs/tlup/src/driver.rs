//! The seam between the [`crate::Tlup`] facade and the vendor driver.
//!
//! [`TlupDriver`] mirrors the C API of the TLUP library one to one: every method returns the raw
//! status code and fills its output parameters. Strings are written by the driver into fixed-size
//! buffers that the caller provides.

use std::ffi::CStr;

use tlup_sys::{
    TLUP_ATTR_DEFAULT_VAL, TLUP_ATTR_MAX_VAL, TLUP_ATTR_MIN_VAL, TLUP_ATTR_SET_VAL,
    TLUP_BUFFER_SIZE, ViInt16, ViSession, ViStatus,
};

/// A buffer the driver writes a nul-terminated string into.
pub type StringBuffer = [u8; TLUP_BUFFER_SIZE];

/// Selects which of the current setpoint values of a device to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SetpointAttribute {
    /// The value that is currently set.
    #[default]
    SetValue,
    /// The smallest value that can be set.
    MinValue,
    /// The largest value that can be set.
    MaxValue,
    /// The value the device starts with.
    DefaultValue,
}

impl SetpointAttribute {
    /// The attribute selector as it is passed to the driver.
    pub fn as_raw(&self) -> ViInt16 {
        match self {
            SetpointAttribute::SetValue => TLUP_ATTR_SET_VAL,
            SetpointAttribute::MinValue => TLUP_ATTR_MIN_VAL,
            SetpointAttribute::MaxValue => TLUP_ATTR_MAX_VAL,
            SetpointAttribute::DefaultValue => TLUP_ATTR_DEFAULT_VAL,
        }
    }
}

/// The entry points of the TLUP driver.
///
/// Implement this trait to put something else than the vendor library behind a
/// [`crate::Tlup`], e.g., the [`crate::LoopbackDriver`] for testing. Implementations do not need
/// to be reentrant, the facade never calls into a driver from two threads at the same time.
pub trait TlupDriver {
    /// Scan for devices and write how many were found into `count`.
    fn find_resources(&mut self, count: &mut u32) -> ViStatus;

    /// Write the resource name of the device with index `index` into `name`.
    fn resource_name(&mut self, index: u32, name: &mut StringBuffer) -> ViStatus;

    /// Open a session to `resource` and write its handle into `session`.
    fn init(
        &mut self,
        resource: &CStr,
        id_query: bool,
        reset: bool,
        session: &mut ViSession,
    ) -> ViStatus;

    /// Close the session.
    fn close(&mut self, session: ViSession) -> ViStatus;

    /// Read the information on the LED that is connected.
    fn led_info(
        &mut self,
        session: ViSession,
        name: &mut StringBuffer,
        serial: &mut StringBuffer,
        current_limit: &mut f64,
        forward_voltage: &mut f64,
        wavelength: &mut f64,
    ) -> ViStatus;

    /// Read one of the current setpoint values in amperes.
    fn current_setpoint(
        &mut self,
        session: ViSession,
        attribute: SetpointAttribute,
        amps: &mut f64,
    ) -> ViStatus;

    /// Set the current setpoint in amperes.
    fn set_current_setpoint(&mut self, session: ViSession, amps: f64) -> ViStatus;

    /// Switch the LED output on or off.
    fn switch_output(&mut self, session: ViSession, on: bool) -> ViStatus;
}

/// Copy a string out of a driver buffer.
///
/// Reads up to the first nul byte, or the whole buffer if there is none. Invalid UTF-8 is
/// replaced.
pub(crate) fn string_from_buffer(buf: &[u8]) -> String {
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

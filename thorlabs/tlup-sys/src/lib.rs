//! Raw FFI declarations for the Thorlabs TLUP VISA driver.
//!
//! TLUP is the vendor library that talks to Thorlabs LED controllers (LEDD1B, DC2200, UPLED,
//! ...). This crate only mirrors the part of its C API that is needed to discover devices,
//! open sessions, and control the LED current. Use the `thorlabs-tlup` crate for a safe
//! interface.
//!
//! The type aliases and constants are always available. The function declarations, and
//! linking against `TLUP_64` / `TLUP_32`, require the `tlup-sdk` feature.

#![warn(missing_docs)]
#![allow(non_camel_case_types, non_snake_case)]

use std::ffi::c_char;

#[cfg(test)]
mod link;

/// Status code returned by every driver entry point.
pub type ViStatus = i32;
/// Session handle of an opened instrument.
pub type ViSession = u32;
/// Unsigned 32 bit integer.
pub type ViUInt32 = u32;
/// Signed 16 bit integer.
pub type ViInt16 = i16;
/// 64 bit floating point number.
pub type ViReal64 = f64;
/// VISA boolean, see [`VI_TRUE`] and [`VI_FALSE`].
pub type ViBoolean = u16;
/// Single character of a driver string.
pub type ViChar = c_char;

/// Status returned by a successful call.
pub const VI_SUCCESS: ViStatus = 0;
/// VISA `true`.
pub const VI_TRUE: ViBoolean = 1;
/// VISA `false`.
pub const VI_FALSE: ViBoolean = 0;

/// The given session or object reference is invalid.
pub const VI_ERROR_INV_OBJECT: ViStatus = 0xBFFF_000Eu32 as ViStatus;
/// Insufficient location information or the requested device or resource is not present.
pub const VI_ERROR_RSRC_NFOUND: ViStatus = 0xBFFF_0011u32 as ViStatus;
/// Timeout expired before the operation completed.
pub const VI_ERROR_TMO: ViStatus = 0xBFFF_0015u32 as ViStatus;
/// The first parameter of a driver function is out of range.
pub const VI_ERROR_PARAMETER1: ViStatus = 0xBFFC_0001u32 as ViStatus;
/// The second parameter of a driver function is out of range.
pub const VI_ERROR_PARAMETER2: ViStatus = 0xBFFC_0002u32 as ViStatus;

/// Attribute selector: the currently set value.
pub const TLUP_ATTR_SET_VAL: ViInt16 = 0;
/// Attribute selector: the minimum value.
pub const TLUP_ATTR_MIN_VAL: ViInt16 = 1;
/// Attribute selector: the maximum value.
pub const TLUP_ATTR_MAX_VAL: ViInt16 = 2;
/// Attribute selector: the default value.
pub const TLUP_ATTR_DEFAULT_VAL: ViInt16 = 3;

/// Size of every string buffer handed to the driver.
///
/// The driver documents 256 characters for names and 512 for resource strings, we use the
/// larger one throughout.
pub const TLUP_BUFFER_SIZE: usize = 512;

#[cfg(feature = "tlup-sdk")]
unsafe extern "C" {
    /// Scan for connected devices and write their number to `resourceCount`.
    ///
    /// `vi` is unused by the driver and should be `0`.
    pub fn TLUP_findRsrc(vi: ViSession, resourceCount: *mut ViUInt32) -> ViStatus;

    /// Write the resource name of the device with the given index into `resourceName`.
    ///
    /// Must be preceded by [`TLUP_findRsrc`]. `resourceName` must hold at least
    /// [`TLUP_BUFFER_SIZE`] characters.
    pub fn TLUP_getRsrcName(
        vi: ViSession,
        index: ViUInt32,
        resourceName: *mut ViChar,
    ) -> ViStatus;

    /// Open a session to the device with the given resource name.
    pub fn TLUP_init(
        resourceName: *const ViChar,
        IDQuery: ViBoolean,
        resetDevice: ViBoolean,
        vi: *mut ViSession,
    ) -> ViStatus;

    /// Close the session.
    pub fn TLUP_close(vi: ViSession) -> ViStatus;

    /// Read name, serial number, current limit, forward voltage, and wavelength of the LED.
    ///
    /// Both string buffers must hold at least [`TLUP_BUFFER_SIZE`] characters.
    pub fn TLUP_getLedInfo(
        vi: ViSession,
        ledName: *mut ViChar,
        ledSerialNumber: *mut ViChar,
        ledCurrentLimit: *mut ViReal64,
        ledForwardVoltage: *mut ViReal64,
        ledWavelength: *mut ViReal64,
    ) -> ViStatus;

    /// Read the LED current setpoint in amperes for one of the `TLUP_ATTR_*` selectors.
    pub fn TLUP_getLedCurrentSetpoint(
        vi: ViSession,
        attribute: ViInt16,
        LEDCurrentSetpoint: *mut ViReal64,
    ) -> ViStatus;

    /// Set the LED current setpoint in amperes.
    pub fn TLUP_setLedCurrentSetpoint(vi: ViSession, LEDCurrentSetpoint: ViReal64) -> ViStatus;

    /// Switch the LED output on or off.
    pub fn TLUP_switchLedOutput(vi: ViSession, enableLEDOutput: ViBoolean) -> ViStatus;
}

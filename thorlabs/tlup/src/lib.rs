//! A rust driver for Thorlabs LED controllers that are supported by the TLUP driver.
//!
//! This covers, e.g., the LEDD1B T-Cube driver, the DC2200 high-power LED driver, and the UPLED
//! controller. All communication with the devices is done by the (closed-source) TLUP library
//! from Thorlabs, which is only available on Windows. This crate wraps the library in the
//! [`Tlup`] facade:
//!
//! - all calls go through a lock, so a [`Tlup`] can be shared between threads,
//! - status codes returned by the library are converted into [`TlupError`]s,
//! - sessions are represented by [`DeviceHandle`]s that are consumed when closed.
//!
//! To talk to real hardware, enable the `sdk` feature and use [`Tlup::shared`]. For testing, a
//! [`LoopbackDriver`] simulates the library.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "sdk")]
//! # {
//! use thorlabs_tlup::Tlup;
//!
//! let tlup = Tlup::shared();
//! for resource in tlup.list_devices().unwrap() {
//!     let handle = tlup.open(&resource).unwrap();
//!     println!("{resource}: {}", tlup.get_info(&handle).unwrap());
//!     tlup.close(handle).unwrap();
//! }
//! # }
//! ```

#![warn(missing_docs)]

mod driver;
mod error;
mod info;
mod light;
mod loopback;
#[cfg(feature = "sdk")]
mod native;

pub use driver::{SetpointAttribute, StringBuffer, TlupDriver};
pub use error::{ErrorKind, TlupError};
pub use info::DeviceInfo;
pub use light::Light;
pub use loopback::{DriverCall, LoopbackDevice, LoopbackDriver};
#[cfg(feature = "sdk")]
pub use native::NativeDriver;
pub use tlup_sys as sys;
pub use tlup_sys::{TLUP_BUFFER_SIZE, VI_SUCCESS, ViSession, ViStatus};

use std::{
    ffi::CString,
    fmt::Display,
    sync::{Mutex, MutexGuard, PoisonError},
};

use log::debug;
#[cfg(feature = "sdk")]
use once_cell::sync::Lazy;

use driver::string_from_buffer;
use error::check;

/// Handle to an open session with a device.
///
/// Handles are returned by [`Tlup::open`] and consumed by [`Tlup::close`], after which the
/// session is gone. The facade does not check whether a handle is valid, this is left to the
/// driver.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct DeviceHandle(ViSession);

impl DeviceHandle {
    /// Create a handle from the raw session number of the driver.
    ///
    /// This is only required when handles are passed through another layer, e.g., to a scripting
    /// language. Nothing guarantees that the session is open.
    pub fn from_raw(session: ViSession) -> Self {
        DeviceHandle(session)
    }

    /// The raw session number that is passed to the driver.
    pub fn as_raw(&self) -> ViSession {
        self.0
    }
}

impl Display for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session {}", self.0)
    }
}

/// Options that are passed to the driver when opening a session.
///
/// By default, neither the identification query nor the reset are performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    id_query: bool,
    reset: bool,
}

impl OpenOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the driver query the device identification and check it while opening.
    pub fn id_query(mut self, id_query: bool) -> Self {
        self.id_query = id_query;
        self
    }

    /// Reset the device to its default state while opening.
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }
}

/// The facade for all communication with TLUP devices.
///
/// Every operation locks the driver for the duration of the driver call, regardless of which
/// device it addresses. Thus, at most one call is executed at a time, which is what the
/// non-reentrant vendor library requires. Share a [`Tlup`] between threads with a reference or
/// an [`std::sync::Arc`].
///
/// ```
/// use thorlabs_tlup::{LoopbackDevice, LoopbackDriver, Tlup};
///
/// let device = LoopbackDevice::new("COM3", 1).with_info("LED1", "SN001", 0.5, 5.0, 405.0);
/// let tlup = Tlup::new(LoopbackDriver::new(vec![device]));
///
/// let handle = tlup.open("COM3").unwrap();
/// let info = tlup.get_info(&handle).unwrap();
/// assert_eq!(info.name(), "LED1");
/// tlup.close(handle).unwrap();
/// ```
#[derive(Debug)]
pub struct Tlup<D: TlupDriver> {
    driver: Mutex<D>,
}

impl<D: TlupDriver> Tlup<D> {
    /// Create a new facade that owns the given driver.
    pub fn new(driver: D) -> Self {
        Tlup {
            driver: Mutex::new(driver),
        }
    }

    /// Take the driver back out of the facade.
    pub fn into_driver(self) -> D {
        self.driver
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the resource names of all connected devices.
    ///
    /// The names are returned in the order the driver reports them. If any of the driver calls
    /// fails, no names are returned at all. No connected devices result in an empty vector.
    pub fn list_devices(&self) -> Result<Vec<String>, TlupError> {
        // Keep the lock for the whole search, the names are indexed by the find call.
        let mut driver = self.lock();

        let mut count = 0;
        check(driver.find_resources(&mut count), TlupError::Discovery)?;
        debug!("Found {count} TLUP device(s)");

        let mut names = Vec::new();
        for index in 0..count {
            let mut buf: StringBuffer = [0; TLUP_BUFFER_SIZE];
            check(driver.resource_name(index, &mut buf), |code| {
                TlupError::ResourceName { index, code }
            })?;
            names.push(string_from_buffer(&buf));
        }
        Ok(names)
    }

    /// Open a session to the device with the given resource name.
    ///
    /// This uses the default [`OpenOptions`].
    pub fn open(&self, resource: &str) -> Result<DeviceHandle, TlupError> {
        self.open_with(resource, OpenOptions::default())
    }

    /// Open a session to the device with the given resource name and options.
    pub fn open_with(
        &self,
        resource: &str,
        options: OpenOptions,
    ) -> Result<DeviceHandle, TlupError> {
        let c_resource = CString::new(resource)
            .map_err(|_| TlupError::InvalidResourceName(resource.to_string()))?;

        let mut session = 0;
        let status = self
            .lock()
            .init(&c_resource, options.id_query, options.reset, &mut session);
        check(status, |code| TlupError::Open {
            resource: resource.to_string(),
            code,
        })?;

        debug!("Opened {resource} as session {session}");
        Ok(DeviceHandle(session))
    }

    /// Close the session.
    ///
    /// The handle is consumed, even if closing fails. In that case, the state of the session is
    /// up to the driver.
    pub fn close(&self, handle: DeviceHandle) -> Result<(), TlupError> {
        let status = self.lock().close(handle.0);
        check(status, TlupError::Close)?;
        debug!("Closed {handle}");
        Ok(())
    }

    /// Query name, serial number, and limits of the LED.
    pub fn get_info(&self, handle: &DeviceHandle) -> Result<DeviceInfo, TlupError> {
        let mut name: StringBuffer = [0; TLUP_BUFFER_SIZE];
        let mut serial: StringBuffer = [0; TLUP_BUFFER_SIZE];
        let (mut current_limit, mut voltage_limit, mut wavelength) = (0.0, 0.0, 0.0);

        let status = self.lock().led_info(
            handle.0,
            &mut name,
            &mut serial,
            &mut current_limit,
            &mut voltage_limit,
            &mut wavelength,
        );
        check(status, |code| TlupError::Query { what: "info", code })?;

        Ok(DeviceInfo::new(
            &string_from_buffer(&name),
            &string_from_buffer(&serial),
            current_limit,
            voltage_limit,
            wavelength,
        ))
    }

    /// Get the current setpoint in amperes.
    pub fn get_current(&self, handle: &DeviceHandle) -> Result<f64, TlupError> {
        self.get_current_attribute(handle, SetpointAttribute::SetValue)
    }

    /// Get one of the current setpoint values in amperes, e.g., the maximum that can be set.
    pub fn get_current_attribute(
        &self,
        handle: &DeviceHandle,
        attribute: SetpointAttribute,
    ) -> Result<f64, TlupError> {
        let mut amps = 0.0;
        let status = self.lock().current_setpoint(handle.0, attribute, &mut amps);
        check(status, |code| TlupError::Query {
            what: "current",
            code,
        })?;
        Ok(amps)
    }

    /// Set the current setpoint in amperes.
    ///
    /// The value is not checked against the current limit of the device, the driver rejects
    /// values that are out of range.
    pub fn set_current(&self, handle: &DeviceHandle, amps: f64) -> Result<(), TlupError> {
        let status = self.lock().set_current_setpoint(handle.0, amps);
        check(status, |code| TlupError::Set {
            what: "current",
            code,
        })?;
        debug!("Set current of {handle} to {amps} A");
        Ok(())
    }

    /// Switch the LED output on (`true`) or off (`false`).
    pub fn set_output(&self, handle: &DeviceHandle, on: bool) -> Result<(), TlupError> {
        let status = self.lock().switch_output(handle.0, on);
        check(status, |code| TlupError::Set {
            what: "output",
            code,
        })?;
        debug!("Switched output of {handle} {}", if on { "on" } else { "off" });
        Ok(())
    }

    /// Lock the driver.
    ///
    /// A panic while the lock was held cannot leave the driver in a broken state from our side,
    /// so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, D> {
        self.driver.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "sdk")]
impl Tlup<NativeDriver> {
    /// Get the facade for the TLUP library of this process.
    ///
    /// The library keeps global state, thus all callers in a process share this one instance
    /// and with it its lock.
    pub fn shared() -> &'static Tlup<NativeDriver> {
        static SHARED: Lazy<Tlup<NativeDriver>> = Lazy::new(|| Tlup::new(NativeDriver::new()));
        &SHARED
    }
}

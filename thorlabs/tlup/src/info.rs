//! Information that a device reports on its LED.

use std::fmt::Display;

use measurements::{Current, Length, Voltage};

/// Name, serial number, and operating limits of the LED connected to a device.
///
/// This is queried from the device on every call of [`crate::Tlup::get_info`] and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    name: String,
    serial: String,
    current_limit: f64,
    voltage_limit: f64,
    wavelength: f64,
}

impl DeviceInfo {
    /// Create a new device info from the raw driver values.
    ///
    /// # Arguments
    /// - `current_limit`: Current limit in amperes.
    /// - `voltage_limit`: Forward voltage limit in volts.
    /// - `wavelength`: Wavelength in nanometers.
    pub fn new(
        name: &str,
        serial: &str,
        current_limit: f64,
        voltage_limit: f64,
        wavelength: f64,
    ) -> Self {
        DeviceInfo {
            name: name.to_string(),
            serial: serial.to_string(),
            current_limit,
            voltage_limit,
            wavelength,
        }
    }

    /// The display name of the LED.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The serial number of the LED.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// The maximum current that can be set.
    pub fn current_limit(&self) -> Current {
        Current::from_amperes(self.current_limit)
    }

    /// The forward voltage limit of the LED.
    pub fn voltage_limit(&self) -> Voltage {
        Voltage::from_volts(self.voltage_limit)
    }

    /// The wavelength of the LED.
    pub fn wavelength(&self) -> Length {
        Length::from_nanometers(self.wavelength)
    }

    /// Return name, serial number, current limit (A), voltage limit (V), and wavelength (nm)
    /// exactly as they were reported by the driver.
    pub fn into_tuple(self) -> (String, String, f64, f64, f64) {
        (
            self.name,
            self.serial,
            self.current_limit,
            self.voltage_limit,
            self.wavelength,
        )
    }
}

impl Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (SN: {}), {} nm, limits: {} A, {} V",
            self.name, self.serial, self.wavelength, self.current_limit, self.voltage_limit
        )
    }
}

//! A named light source, i.e., an LED with its controller.

use crate::{DeviceHandle, DeviceInfo, Tlup, TlupDriver, TlupError};

/// A light source driven by a TLUP device.
///
/// The light keeps a session open to its device until [`Light::close`] is called. Its state is the
/// LED current: setting a current larger than zero also switches the output on, setting it to
/// zero switches the output off.
///
/// ```
/// use thorlabs_tlup::{Light, LoopbackDevice, LoopbackDriver, Tlup};
///
/// let tlup = Tlup::new(LoopbackDriver::new(vec![LoopbackDevice::new("COM3", 1)]));
///
/// let uv = Light::open(&tlup, "UV", "COM3").unwrap();
/// uv.set_state(0.2).unwrap();
/// assert_eq!(uv.state().unwrap(), 0.2);
/// uv.close().unwrap();
/// ```
#[derive(Debug)]
pub struct Light<'a, D: TlupDriver> {
    name: String,
    tlup: &'a Tlup<D>,
    handle: DeviceHandle,
}

impl<'a, D: TlupDriver> Light<'a, D> {
    /// Open a session to the device at `resource` and name the light.
    ///
    /// # Arguments
    /// - `tlup`: The facade to communicate through.
    /// - `name`: A name for the light, e.g., the color.
    /// - `resource`: The resource name of the device.
    pub fn open(tlup: &'a Tlup<D>, name: &str, resource: &str) -> Result<Self, TlupError> {
        let handle = tlup.open(resource)?;
        Ok(Light {
            name: name.to_string(),
            tlup,
            handle,
        })
    }

    /// The name of the light.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handle of the session that the light uses.
    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    /// Query the information on the LED.
    pub fn info(&self) -> Result<DeviceInfo, TlupError> {
        self.tlup.get_info(&self.handle)
    }

    /// Get the current setpoint of the LED in amperes.
    pub fn state(&self) -> Result<f64, TlupError> {
        self.tlup.get_current(&self.handle)
    }

    /// Set the current of the LED in amperes and switch the output accordingly.
    ///
    /// If setting the current fails, the output is left untouched.
    pub fn set_state(&self, amps: f64) -> Result<(), TlupError> {
        self.tlup.set_current(&self.handle, amps)?;
        self.tlup.set_output(&self.handle, amps > 0.0)
    }

    /// Close the session to the device.
    pub fn close(self) -> Result<(), TlupError> {
        self.tlup.close(self.handle)
    }
}

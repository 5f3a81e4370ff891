//! Python bindings for the Thorlabs TLUP LED controller driver.
//!
//! The `tlup` extension module exposes the process-wide [`Tlup`] facade as plain functions that
//! pass device handles around as integers, plus a small `Light` class.
//!
//! # Quick Start (Python)
//! ```python
//! import tlup
//!
//! for port in tlup.devices():
//!     device_id = tlup.init(port)
//!     name, serial, max_amps, max_volts, wavelength = tlup.info(device_id)
//!     tlup.set_amps(device_id, max_amps / 10)
//!     tlup.toggle(device_id, True)
//!     tlup.close(device_id)
//!
//! uv = tlup.Light("UV", port)
//! uv.state = 0.1  # sets the current and switches the output on
//! uv.close()
//! ```
//!
//! All errors derive from `tlup.TlupError` (a `RuntimeError`) and carry the driver status code in
//! their `code` attribute.
//!
//! Without the default `sdk` feature, the module is built against a simulated driver that has no
//! devices attached. This is what `cargo test --no-default-features` uses.

use pyo3::{create_exception, exceptions::PyRuntimeError, prelude::*};
use thorlabs_tlup::{DeviceHandle, ErrorKind, Light as TlupLight, Tlup};

#[cfg(feature = "sdk")]
type Driver = thorlabs_tlup::NativeDriver;
#[cfg(not(feature = "sdk"))]
type Driver = thorlabs_tlup::LoopbackDriver;

create_exception!(
    tlup,
    TlupError,
    PyRuntimeError,
    "Base class of all errors raised by the TLUP driver."
);
create_exception!(
    tlup,
    DiscoveryError,
    TlupError,
    "Searching for devices failed."
);
create_exception!(tlup, OpenError, TlupError, "Opening a device failed.");
create_exception!(tlup, CloseError, TlupError, "Closing a device failed.");
create_exception!(
    tlup,
    QueryError,
    TlupError,
    "Reading a value from a device failed."
);
create_exception!(
    tlup,
    SetError,
    TlupError,
    "Writing a value to a device failed."
);

/// Convert a driver error into the matching Python exception.
fn to_py_err(py: Python<'_>, err: thorlabs_tlup::TlupError) -> PyErr {
    let msg = err.to_string();
    let py_err = match err.kind() {
        ErrorKind::Discovery => DiscoveryError::new_err(msg),
        ErrorKind::Open => OpenError::new_err(msg),
        ErrorKind::Close => CloseError::new_err(msg),
        ErrorKind::Query => QueryError::new_err(msg),
        ErrorKind::Set => SetError::new_err(msg),
    };
    // Only fails if the exception object refuses attributes, which ours do not.
    let _ = py_err.value(py).setattr("code", err.code());
    py_err
}

/// The facade all functions of this module go through.
#[cfg(feature = "sdk")]
fn shared() -> &'static Tlup<Driver> {
    Tlup::shared()
}

/// The facade all functions of this module go through.
#[cfg(not(feature = "sdk"))]
fn shared() -> &'static Tlup<Driver> {
    static SHARED: once_cell::sync::Lazy<Tlup<Driver>> =
        once_cell::sync::Lazy::new(|| Tlup::new(Driver::default()));
    &SHARED
}

/// Return the resource names of all connected devices.
#[pyfunction]
fn devices(py: Python<'_>) -> PyResult<Vec<String>> {
    py.allow_threads(|| shared().list_devices())
        .map_err(|e| to_py_err(py, e))
}

/// Open the device at the given port and return its id.
#[pyfunction]
fn init(py: Python<'_>, port: &str) -> PyResult<u32> {
    py.allow_threads(|| shared().open(port))
        .map(|handle| handle.as_raw())
        .map_err(|e| to_py_err(py, e))
}

/// Close the device with the given id.
#[pyfunction]
fn close(py: Python<'_>, device_id: u32) -> PyResult<()> {
    py.allow_threads(|| shared().close(DeviceHandle::from_raw(device_id)))
        .map_err(|e| to_py_err(py, e))
}

/// Return name, serial number, current limit, voltage limit, and wavelength of the LED.
#[pyfunction]
fn info(py: Python<'_>, device_id: u32) -> PyResult<(String, String, f64, f64, f64)> {
    py.allow_threads(|| shared().get_info(&DeviceHandle::from_raw(device_id)))
        .map(|info| info.into_tuple())
        .map_err(|e| to_py_err(py, e))
}

/// Return the current setpoint in amperes.
#[pyfunction]
fn get_amps(py: Python<'_>, device_id: u32) -> PyResult<f64> {
    py.allow_threads(|| shared().get_current(&DeviceHandle::from_raw(device_id)))
        .map_err(|e| to_py_err(py, e))
}

/// Set the current setpoint in amperes.
#[pyfunction]
fn set_amps(py: Python<'_>, device_id: u32, amps: f64) -> PyResult<()> {
    py.allow_threads(|| shared().set_current(&DeviceHandle::from_raw(device_id), amps))
        .map_err(|e| to_py_err(py, e))
}

/// Switch the LED output on or off.
#[pyfunction]
fn toggle(py: Python<'_>, device_id: u32, on: bool) -> PyResult<()> {
    py.allow_threads(|| shared().set_output(&DeviceHandle::from_raw(device_id), on))
        .map_err(|e| to_py_err(py, e))
}

/// A named LED. Its `state` is the LED current in amperes.
#[pyclass(module = "tlup")]
struct Light {
    inner: Option<TlupLight<'static, Driver>>,
}

impl Light {
    fn light(&self) -> PyResult<&TlupLight<'static, Driver>> {
        self.inner
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("Light is closed."))
    }
}

#[pymethods]
impl Light {
    #[new]
    fn new(py: Python<'_>, name: &str, port: &str) -> PyResult<Self> {
        let light = py
            .allow_threads(|| TlupLight::open(shared(), name, port))
            .map_err(|e| to_py_err(py, e))?;
        Ok(Light { inner: Some(light) })
    }

    /// The name of the light.
    #[getter]
    fn name(&self) -> PyResult<String> {
        Ok(self.light()?.name().to_string())
    }

    /// The current setpoint in amperes.
    #[getter]
    fn state(&self, py: Python<'_>) -> PyResult<f64> {
        let light = self.light()?;
        py.allow_threads(|| light.state())
            .map_err(|e| to_py_err(py, e))
    }

    /// Set the current in amperes, the output is on for currents larger than zero.
    #[setter]
    fn set_state(&self, py: Python<'_>, amps: f64) -> PyResult<()> {
        let light = self.light()?;
        py.allow_threads(|| light.set_state(amps))
            .map_err(|e| to_py_err(py, e))
    }

    /// Close the device. Closing twice does nothing.
    fn close(&mut self, py: Python<'_>) -> PyResult<()> {
        match self.inner.take() {
            Some(light) => py
                .allow_threads(|| light.close())
                .map_err(|e| to_py_err(py, e)),
            None => Ok(()),
        }
    }

    fn __repr__(&self) -> String {
        match &self.inner {
            Some(light) => format!("Light(name='{}', {})", light.name(), light.handle()),
            None => "Light(closed)".to_string(),
        }
    }
}

#[pymodule]
fn tlup(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add_function(wrap_pyfunction!(devices, m)?)?;
    m.add_function(wrap_pyfunction!(init, m)?)?;
    m.add_function(wrap_pyfunction!(close, m)?)?;
    m.add_function(wrap_pyfunction!(info, m)?)?;
    m.add_function(wrap_pyfunction!(get_amps, m)?)?;
    m.add_function(wrap_pyfunction!(set_amps, m)?)?;
    m.add_function(wrap_pyfunction!(toggle, m)?)?;
    m.add_class::<Light>()?;
    m.add("TlupError", py.get_type::<TlupError>())?;
    m.add("DiscoveryError", py.get_type::<DiscoveryError>())?;
    m.add("OpenError", py.get_type::<OpenError>())?;
    m.add("CloseError", py.get_type::<CloseError>())?;
    m.add("QueryError", py.get_type::<QueryError>())?;
    m.add("SetError", py.get_type::<SetError>())?;
    Ok(())
}

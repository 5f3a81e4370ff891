//! Errors returned by the TLUP driver wrapper.

use std::fmt::Display;

use log::warn;
use thiserror::Error;
use tlup_sys::{VI_SUCCESS, ViStatus};

/// The category of operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Searching for devices or reading their resource names failed.
    Discovery,
    /// Opening a session failed.
    Open,
    /// Closing a session failed.
    Close,
    /// Reading a value from an open device failed.
    Query,
    /// Writing a value to an open device failed.
    Set,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Discovery => "discovery",
            ErrorKind::Open => "open",
            ErrorKind::Close => "close",
            ErrorKind::Query => "query",
            ErrorKind::Set => "set",
        };
        write!(f, "{name}")
    }
}

/// The error enum for all TLUP operations.
///
/// Apart from [`TlupError::InvalidResourceName`], every variant wraps the status code that the
/// driver returned. Use [`TlupError::kind`] to find out which kind of operation failed and
/// [`TlupError::code`] to get the raw status code.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum TlupError {
    /// The driver could not search for connected devices.
    #[error("Could not find devices. Error code: {0}")]
    Discovery(ViStatus),
    /// The driver could not return the resource name of a found device.
    #[error("Could not get name of device {index}. Error code: {code}")]
    ResourceName {
        /// Index of the device in the discovery list.
        index: u32,
        /// Status code returned by the driver.
        code: ViStatus,
    },
    /// The driver could not open a session to the given resource.
    #[error("Could not initialize device {resource}. Error code: {code}")]
    Open {
        /// The resource name that was passed to the driver.
        resource: String,
        /// Status code returned by the driver.
        code: ViStatus,
    },
    /// The resource name contains a nul byte and can thus not be handed to the driver.
    #[error("Could not initialize device {0:?}: resource name contains a nul byte.")]
    InvalidResourceName(String),
    /// The driver could not close the session.
    #[error("Could not close device. Error code: {0}")]
    Close(ViStatus),
    /// The driver could not read a value from the device.
    #[error("Could not get device {what}. Error code: {code}")]
    Query {
        /// The value that was requested, e.g., "info" or "current".
        what: &'static str,
        /// Status code returned by the driver.
        code: ViStatus,
    },
    /// The driver could not write a value to the device.
    #[error("Could not set device {what}. Error code: {code}")]
    Set {
        /// The value that was written, e.g., "current" or "output".
        what: &'static str,
        /// Status code returned by the driver.
        code: ViStatus,
    },
}

impl TlupError {
    /// Get the kind of operation that failed.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TlupError::Discovery(_) | TlupError::ResourceName { .. } => ErrorKind::Discovery,
            TlupError::Open { .. } | TlupError::InvalidResourceName(_) => ErrorKind::Open,
            TlupError::Close(_) => ErrorKind::Close,
            TlupError::Query { .. } => ErrorKind::Query,
            TlupError::Set { .. } => ErrorKind::Set,
        }
    }

    /// Get the status code the driver returned, if the error originates from the driver.
    pub fn code(&self) -> Option<ViStatus> {
        match self {
            TlupError::Discovery(code)
            | TlupError::ResourceName { code, .. }
            | TlupError::Open { code, .. }
            | TlupError::Close(code)
            | TlupError::Query { code, .. }
            | TlupError::Set { code, .. } => Some(*code),
            TlupError::InvalidResourceName(_) => None,
        }
    }
}

/// Turn a driver status into a result.
///
/// Anything but [`VI_SUCCESS`] is converted into an error using `to_err` and logged.
pub(crate) fn check<F>(status: ViStatus, to_err: F) -> Result<(), TlupError>
where
    F: FnOnce(ViStatus) -> TlupError,
{
    if status == VI_SUCCESS {
        return Ok(());
    }
    let err = to_err(status);
    warn!("{err}");
    Err(err)
}

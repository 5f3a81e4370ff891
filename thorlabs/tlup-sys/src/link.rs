//! Which vendor library to link and where to look for it.
//!
//! Included by `build.rs`, so everything here depends on the target pointer width as reported by
//! cargo (`CARGO_CFG_TARGET_POINTER_WIDTH`), never on the host.

use std::path::PathBuf;

/// Name of the TLUP import library for the target.
pub fn lib_name(target_pointer_width: &str) -> &'static str {
    if target_pointer_width == "64" {
        "TLUP_64"
    } else {
        "TLUP_32"
    }
}

/// Default location of the VISA import libraries installed by the IVI Foundation setup.
pub fn default_lib_dir(target_pointer_width: &str) -> PathBuf {
    if target_pointer_width == "64" {
        PathBuf::from(r"C:\Program Files\IVI Foundation\VISA\Win64\Lib_x64\msc")
    } else {
        PathBuf::from(r"C:\Program Files (x86)\IVI Foundation\VISA\WinNT\lib\msc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_64bit_target() {
        assert_eq!(lib_name("64"), "TLUP_64");
        assert!(default_lib_dir("64").to_string_lossy().ends_with(r"Win64\Lib_x64\msc"));
    }

    /// A 32 bit target gets the 32 bit library and directory, whatever the host is.
    #[test]
    fn test_32bit_target() {
        assert_eq!(lib_name("32"), "TLUP_32");
        assert!(default_lib_dir("32").to_string_lossy().ends_with(r"WinNT\lib\msc"));
    }
}

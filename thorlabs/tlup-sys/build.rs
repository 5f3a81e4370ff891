#[allow(dead_code)]
#[path = "src/link.rs"]
mod link;

fn main() {
    // Only link when the vendor library is requested, so the crate builds everywhere else.
    #[cfg(feature = "tlup-sdk")]
    {
        println!("cargo:rerun-if-env-changed=TLUP_LIB_DIR");

        let pointer_width =
            std::env::var("CARGO_CFG_TARGET_POINTER_WIDTH").unwrap_or_else(|_| "64".to_string());

        let lib_dir = match std::env::var("TLUP_LIB_DIR") {
            Ok(dir) => std::path::PathBuf::from(dir),
            Err(_) => link::default_lib_dir(&pointer_width),
        };
        if !lib_dir.exists() {
            println!(
                "cargo:warning=TLUP library directory does not exist: {}",
                lib_dir.display()
            );
            println!("cargo:warning=Linker will search the standard library paths");
        }
        println!("cargo:rustc-link-search=native={}", lib_dir.display());
        println!("cargo:rustc-link-lib={}", link::lib_name(&pointer_width));
    }
}

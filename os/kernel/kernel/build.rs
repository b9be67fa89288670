use kernel_info::memory;
use std::{env, path::PathBuf};

fn main() {
    // Point to the linker script
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let ld = manifest_dir.join("kernel.ld");

    // Sanity checks (fail fast during build)
    let phys_offset = memory::PHYS_OFFSET;
    let text_offset = memory::KERNEL_TEXT_OFFSET;
    assert_eq!(
        phys_offset & ((1u64 << 20) - 1),
        0,
        "PHYS_OFFSET must be 1 MiB aligned (got {phys_offset:#x})"
    );
    assert_eq!(
        text_offset & 0xfff,
        0,
        "KERNEL_TEXT_OFFSET must be 4 KiB aligned (got {text_offset:#x})"
    );

    // Rebuild when inputs change
    println!("cargo:rerun-if-changed={}", ld.display());
    println!("cargo:rerun-if-env-changed=KERNEL_CMDLINE");

    // Linker script
    println!("cargo:rustc-link-arg-bins=-T{}", ld.display());

    // Provide symbols to the linker script
    println!("cargo:rustc-link-arg-bins=--defsym=PHYS_OFFSET={phys_offset:#x}");
    println!("cargo:rustc-link-arg-bins=--defsym=KERNEL_TEXT_OFFSET={text_offset:#x}");
}

// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! This build script writes a `memory.x` matching the selected SoftDevice into
//! a directory where the linker can always find it at build time, and asks
//! Cargo to re-run it whenever the SoftDevice feature changes.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Flash occupied by the MBR and SoftDevice S112 7.x
#[cfg(not(feature = "s113"))]
const SOFTDEVICE_FLASH: u32 = 0x19000;
/// Flash occupied by the MBR and SoftDevice S113 7.x
#[cfg(feature = "s113")]
const SOFTDEVICE_FLASH: u32 = 0x1C000;

/// nRF52805 flash and RAM sizes
const CHIP_FLASH: u32 = 192 * 1024;
const CHIP_RAM: u32 = 24 * 1024;

fn main() {
    // Put `memory.x` in our output directory and ensure it's
    // on the linker search path.
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());

    /* The SoftDevices S113 7.3.0 minimal RAM requirement is 4.4K (0x1198) */
    /* and use a maximum of 1.75K (0x700) for call stack. */
    /* We choose to reserve 10648 bytes (0x2998) at the begining of RAM */
    let soft_device_ram_reserved = 10648;

    let memory_x_content = format!(
        r##"
        MEMORY
        {{
            /* NOTE 1 K = 1 KiBi = 1024 bytes */
            FLASH (rx) : ORIGIN = {:#X}, LENGTH = {:#X}
            RAM : ORIGIN = 0x20000000 + {}, LENGTH = {} - {}
        }}
        "##,
        SOFTDEVICE_FLASH,
        CHIP_FLASH - SOFTDEVICE_FLASH,
        soft_device_ram_reserved,
        CHIP_RAM,
        soft_device_ram_reserved
    );
    File::create(out.join("./memory.x"))
        .unwrap()
        .write_all(memory_x_content.as_bytes())
        .unwrap();

    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_S113");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

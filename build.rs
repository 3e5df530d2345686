// OpenAWG SCPI front end - Build Script
//
// Injects instrument identity and firmware version as compile-time env.

use std::env;
use std::process::Command;

fn main() {
    // ESP-IDF environment setup (MUST be first!)
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    // Identity strings, overridable at build time
    let manufacturer = env::var("AWG_MANUFACTURER").unwrap_or_else(|_| "OpenAWG".to_string());
    let model = env::var("AWG_MODEL").unwrap_or_else(|_| "AWG-1".to_string());

    // Get git version info
    let version = env!("CARGO_PKG_VERSION");
    let firmware = env::var("AWG_FIRMWARE_VERSION").unwrap_or_else(|_| {
        let git_hash = Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .output()
            .ok()
            .filter(|o| o.status.success())
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        match git_hash {
            Some(hash) => format!("{}-g{}", version, hash),
            None => version.to_string(),
        }
    });

    println!("cargo:rustc-env=AWG_MANUFACTURER={}", manufacturer);
    println!("cargo:rustc-env=AWG_MODEL={}", model);
    println!("cargo:rustc-env=AWG_FIRMWARE_VERSION={}", firmware);

    println!("cargo:rerun-if-env-changed=AWG_MANUFACTURER");
    println!("cargo:rerun-if-env-changed=AWG_MODEL");
    println!("cargo:rerun-if-env-changed=AWG_FIRMWARE_VERSION");

    // Rebuild if git HEAD changes
    println!("cargo:rerun-if-changed=.git/HEAD");
}

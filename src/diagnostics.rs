//! System diagnostics and dependency checking.
//!
//! Verifies that the external decoder is installed and reports the inference
//! setup this build will use.

use crate::defaults;
use crate::models::{self, ModelTier};
use crate::stt::compute::{DeviceCapabilities, select_compute};
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Tool is installed and working
    Ok,
    /// Tool is not found
    NotFound,
    /// Tool is found but has issues
    Warning(String),
}

/// Check if a command exists and is executable.
fn check_command(command: &str) -> CheckResult {
    match Command::new(command).arg("-version").output() {
        Ok(output) if output.status.success() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning(format!("'{}' found but -version failed", command)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{}': {}", command, e)),
    }
}

/// Run all dependency checks and print results.
pub fn check_dependencies(ffmpeg: &str) {
    println!("Checking dependencies...\n");

    print!("{} (decoder): ", ffmpeg);
    match check_command(ffmpeg) {
        CheckResult::Ok => println!("✓ OK"),
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            println!("  Install ffmpeg:");
            println!("    Ubuntu/Debian: sudo apt install ffmpeg");
            println!("    Arch: sudo pacman -S ffmpeg");
            println!("    macOS: brew install ffmpeg");
        }
        CheckResult::Warning(msg) => println!("⚠ WARNING: {}", msg),
    }

    let compute = select_compute(&DeviceCapabilities::detect());
    println!(
        "inference: {} backend, compute {}",
        defaults::gpu_backend(),
        compute
    );

    println!("\nInstalled models:");
    let mut any = false;
    for &tier in ModelTier::ALL {
        if let Some(path) = models::installed_path(tier) {
            println!("  ✓ {} ({} MB) — {}", tier, tier.size_mb(), path.display());
            any = true;
        }
    }
    if !any {
        println!("  none found");
        println!(
            "  Download a ggml model (e.g. {}) into one of:",
            ModelTier::Base.file_name()
        );
        for dir in models::search_dirs() {
            println!("    {}", dir.display());
        }
    }
}

/// Print the model catalog with installed state, for `mediascribe models`.
pub fn list_models() {
    for &tier in ModelTier::ALL {
        let installed = match models::installed_path(tier) {
            Some(path) => format!("installed at {}", path.display()),
            None => "not installed".to_string(),
        };
        println!(
            "{:<8} {:>5} MB  {}  ({})",
            tier.to_string(),
            tier.size_mb(),
            tier.file_name(),
            installed
        );
    }
}

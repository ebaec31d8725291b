//! Run finalization: per-user cache cleanup, runtime refresh and operator
//! guidance. Reached only after the installer and the module build have
//! both succeeded.

use std::path::{Path, PathBuf};

use console::style;
use walkdir::WalkDir;

use crate::error::Result;
use crate::system::command::run_status_quiet;
use crate::system::sync_disks;

/// Cache directory names Electron applications key off the GPU driver;
/// stale entries render garbage after a driver change.
const ELECTRON_CACHE_DIRS: [&str; 2] = ["GPUCache", "GrShaderCache"];

/// Remove Electron GPU cache directories under a user's `.config` tree.
/// Returns how many were removed.
pub fn clear_electron_caches(config_dir: &Path) -> Result<usize> {
    if !config_dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    let mut doomed: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(config_dir)
        .max_depth(4)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| ELECTRON_CACHE_DIRS.contains(&name))
        {
            doomed.push(entry.path().to_path_buf());
        }
    }
    for dir in doomed {
        if std::fs::remove_dir_all(&dir).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Per-user cleanup for the invoking (sudo) user, then disk sync and the
/// operator's follow-up instructions.
pub fn finalize() {
    if let Ok(user) = std::env::var("SUDO_USER") {
        if user != "root" {
            let config_dir = PathBuf::from(format!("/home/{user}/.config"));
            match clear_electron_caches(&config_dir) {
                Ok(0) => {}
                Ok(n) => println!("Cleared {n} stale Electron GPU cache(s) for {user}"),
                Err(_) => {}
            }
            // Flatpak apps bundle their own GL stack; refresh it to match
            let _ = run_status_quiet(
                "runuser",
                &["-u", &user, "--", "flatpak", "update", "--assumeyes"],
            );
        }
    }

    sync_disks();

    println!();
    println!("{}", style("Driver installation complete.").green().bold());
    println!("Reboot to load the new kernel module.");
    println!(
        "Optimus laptops: review {} for the PrimaryGPU options.",
        style("/etc/X11/xorg.conf.d/10-nvidia-primary.conf").cyan()
    );
}

//! Environment guard: verifies host identity, build prerequisites and
//! runtime state before the installer is allowed to touch anything.

use std::path::Path;

use crate::error::{NvupError, Result};
use crate::system::command::{binary_on_path, output_of};
use crate::system::ServiceManager;

/// Fix-up unit provisioned by the distro packaging; doubles as the marker
/// that the host carries the nvup integration files.
pub const FIXUP_UNIT: &str = "nvidia-fixup.service";

const FIXUP_UNIT_PATH: &str = "usr/lib/systemd/system/nvidia-fixup.service";

/// Host facts gathered during preflight and needed by later stages.
#[derive(Debug, Clone)]
pub struct HostInfo {
    /// `uname -r` of the running kernel
    pub kernel_release: String,
    /// Numeric `VERSION_ID` from os-release
    pub os_version: u32,
}

/// Parsed `/etc/os-release` fields the guard cares about.
#[derive(Debug, Default)]
struct OsRelease {
    id: String,
    id_like: String,
    version_id: u32,
}

fn parse_os_release(content: &str) -> OsRelease {
    let mut parsed = OsRelease::default();
    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim_matches('"');
        match key {
            "ID" => parsed.id = value.to_string(),
            "ID_LIKE" => parsed.id_like = value.to_string(),
            "VERSION_ID" => parsed.version_id = value.parse().unwrap_or(0),
            _ => {}
        }
    }
    parsed
}

fn is_fedora_family(os: &OsRelease) -> bool {
    os.id == "fedora" || os.id_like.split_whitespace().any(|id| id == "fedora")
}

/// Run all preflight checks against a filesystem root. Split out from
/// [`preflight`] so tests can stage a fake root.
pub fn preflight_at(
    root: &Path,
    kernel_release: &str,
    services: &dyn ServiceManager,
) -> Result<HostInfo> {
    let os_release_path = root.join("etc/os-release");
    let content =
        std::fs::read_to_string(&os_release_path).map_err(|_| NvupError::WrongHost {
            reason: format!("cannot read {}", os_release_path.display()),
        })?;
    let os = parse_os_release(&content);
    if !is_fedora_family(&os) {
        return Err(NvupError::WrongHost {
            reason: format!("os-release ID is '{}'", os.id),
        });
    }

    if !root.join(FIXUP_UNIT_PATH).is_file() {
        return Err(NvupError::MissingPrerequisite {
            what: format!("{FIXUP_UNIT} unit file"),
            hint: Some("Install the nvup integration package first".to_string()),
        });
    }

    if !binary_on_path("dkms") {
        return Err(NvupError::MissingPrerequisite {
            what: "dkms".to_string(),
            hint: Some("dnf install dkms".to_string()),
        });
    }

    let headers = root.join(format!("usr/src/kernels/{kernel_release}"));
    let build_link = root.join(format!("lib/modules/{kernel_release}/build"));
    if !headers.is_dir() && !build_link.exists() {
        return Err(NvupError::MissingPrerequisite {
            what: format!("kernel headers for {kernel_release}"),
            hint: Some("dnf install kernel-devel matching the running kernel".to_string()),
        });
    }

    // The module cannot be swapped while a compositor holds the GPU
    if services.is_active("graphical.target") {
        return Err(NvupError::GraphicalSessionActive);
    }

    Ok(HostInfo {
        kernel_release: kernel_release.to_string(),
        os_version: os.version_id,
    })
}

/// Preflight against the live system.
pub fn preflight(services: &dyn ServiceManager) -> Result<HostInfo> {
    let kernel_release = output_of("uname", &["-r"])?;
    preflight_at(Path::new("/"), &kernel_release, services)
}

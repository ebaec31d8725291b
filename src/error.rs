//! Error types and handling for nvup
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Every failure is fatal to the run; [`NvupError::exit_code`] maps the error
//! taxonomy to the process exit status contract:
//! - 1: usage, precondition and fetch failures
//! - 2: privileged-credential acquisition failure
//! - vendor installer / DKMS build failures pass their own status through

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for nvup operations
#[derive(Error, Diagnostic, Debug)]
pub enum NvupError {
    // Usage errors
    #[error("Unknown selector: '{selector}'")]
    #[diagnostic(
        code(nvup::usage::unknown_selector),
        help("Valid selectors: latest, vulkan, a named release (e.g. 550), or a local driver file")
    )]
    UnknownSelector { selector: String },

    #[error("Unrecognized driver file name: {name}")]
    #[diagnostic(
        code(nvup::usage::unrecognized_filename),
        help(
            "Accepted patterns: NVIDIA-Linux-x86_64-<ver>.run, \
             nvidia_driver-linux-x86_64-<ver>-archive.tar.xz, \
             NVIDIA-Linux-x86_64-<ver>-vulkan.run"
        )
    )]
    UnrecognizedFileName { name: String },

    #[error("Driver variant not supported: {name}")]
    #[diagnostic(
        code(nvup::usage::variant_rejected),
        help("vGPU/GRID virtualization-only driver packages cannot be installed on a desktop host")
    )]
    VariantRejected { name: String },

    #[error("Driver file not found: {path}")]
    #[diagnostic(code(nvup::usage::file_not_found))]
    ArtifactNotFound { path: String },

    // Precondition failures
    #[error("Unsupported host: {reason}")]
    #[diagnostic(
        code(nvup::precondition::wrong_host),
        help("nvup only supports Fedora-family systems")
    )]
    WrongHost { reason: String },

    #[error("Missing prerequisite: {what}")]
    #[diagnostic(code(nvup::precondition::missing_prerequisite))]
    MissingPrerequisite {
        what: String,
        #[help]
        hint: Option<String>,
    },

    #[error("A graphical session is active")]
    #[diagnostic(
        code(nvup::precondition::graphical_session),
        help(
            "Switch to a text console first: systemctl isolate multi-user.target, \
             then re-run nvup from a virtual terminal"
        )
    )]
    GraphicalSessionActive,

    #[error("Driver version {version} is no longer supported")]
    #[diagnostic(
        code(nvup::precondition::version_too_old),
        help("Releases 470 and older are not supported; use the distro's legacy packages")
    )]
    VersionTooOld { version: String },

    // Privilege errors
    #[error("Failed to acquire root privileges")]
    #[diagnostic(
        code(nvup::privilege::acquisition_failed),
        help("Re-run as root, or complete the sudo password prompt")
    )]
    PrivilegeAcquisitionFailed,

    // Fetch failures
    #[error("Download failed: {url}")]
    #[diagnostic(code(nvup::fetch::download_failed))]
    DownloadFailed { url: String, reason: String },

    #[error("Driver package not found on server: {url}")]
    #[diagnostic(
        code(nvup::fetch::not_found),
        help("The release may have been withdrawn; try 'nvup latest'")
    )]
    RemoteNotFound { url: String },

    #[error("Failed to read the release index")]
    #[diagnostic(code(nvup::fetch::index_unreadable))]
    IndexUnreadable { reason: String },

    // Installer failures
    #[error("nvidia-installer exited with status {status}")]
    #[diagnostic(
        code(nvup::install::installer_failed),
        help("See /var/log/nvidia-installer.log for the vendor installer's own log")
    )]
    InstallerFailed { status: i32 },

    #[error("Failed to unpack driver archive: {reason}")]
    #[diagnostic(code(nvup::install::unpack_failed))]
    UnpackFailed { reason: String },

    // Build failures
    #[error("DKMS build failed with status {status} for nvidia/{version}")]
    #[diagnostic(
        code(nvup::build::dkms_failed),
        help("See /var/lib/dkms/nvidia/{version}/build/make.log")
    )]
    ModuleBuildFailed { version: String, status: i32 },

    // Command execution
    #[error("Failed to run '{command}': {reason}")]
    #[diagnostic(code(nvup::command::spawn_failed))]
    CommandSpawnFailed { command: String, reason: String },

    #[error("'{command}' exited with status {status}")]
    #[diagnostic(code(nvup::command::failed))]
    CommandFailed { command: String, status: i32 },

    // File system errors
    #[error("IO error: {message}")]
    #[diagnostic(code(nvup::fs::io_error))]
    IoError { message: String },
}

impl NvupError {
    /// Exit status for the whole run. Installer and DKMS failures pass the
    /// external tool's own status through verbatim.
    pub fn exit_code(&self) -> i32 {
        match self {
            NvupError::PrivilegeAcquisitionFailed => 2,
            NvupError::InstallerFailed { status } => *status,
            NvupError::ModuleBuildFailed { status, .. } => *status,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for NvupError {
    fn from(err: std::io::Error) -> Self {
        NvupError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for NvupError {
    fn from(err: reqwest::Error) -> Self {
        NvupError::DownloadFailed {
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, NvupError>;

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_error_contains {
        ($test_name:ident, $err:expr, $($contains:expr),+ $(,)?) => {
            #[test]
            fn $test_name() {
                let err = $err;
                let error_string = err.to_string();
                $(
                    assert!(error_string.contains($contains),
                        "Error message should contain '{}', got: {}",
                        $contains,
                        error_string
                    );
                )+
            }
        };
    }

    test_error_contains!(
        test_unknown_selector_display,
        NvupError::UnknownSelector {
            selector: "nonsense".to_string()
        },
        "Unknown selector",
        "nonsense"
    );

    test_error_contains!(
        test_variant_rejected_display,
        NvupError::VariantRejected {
            name: "NVIDIA-Linux-x86_64-550.90.07-vgpu-kvm.run".to_string()
        },
        "not supported",
        "vgpu"
    );

    test_error_contains!(
        test_graphical_session_display,
        NvupError::GraphicalSessionActive,
        "graphical session"
    );

    #[test]
    fn test_error_code() {
        let err = NvupError::RemoteNotFound {
            url: "https://example.invalid/driver.run".to_string(),
        };
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("nvup::fetch::not_found".to_string())
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NvupError = io_err.into();
        assert!(matches!(err, NvupError::IoError { .. }));
    }

    #[test]
    fn test_exit_code_generic_is_one() {
        let err = NvupError::UnknownSelector {
            selector: "x".to_string(),
        };
        assert_eq!(err.exit_code(), 1);
        let err = NvupError::DownloadFailed {
            url: "u".to_string(),
            reason: "r".to_string(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_privilege_is_two() {
        assert_eq!(NvupError::PrivilegeAcquisitionFailed.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_installer_passthrough() {
        let err = NvupError::InstallerFailed { status: 137 };
        assert_eq!(err.exit_code(), 137);
    }

    #[test]
    fn test_exit_code_build_passthrough() {
        let err = NvupError::ModuleBuildFailed {
            version: "550.107.02".to_string(),
            status: 10,
        };
        assert_eq!(err.exit_code(), 10);
    }
}

//! Narrow interfaces over the external system tools nvup sequences.
//!
//! Orchestration code talks to these traits, not to `std::process::Command`
//! directly, so the pipeline can be exercised with fakes in tests.

pub mod command;
pub mod download;

pub use command::{output_of, run_checked, run_status};
pub use download::{Downloader, HttpDownloader};

use crate::error::Result;

/// Process supervisor operations (systemd in production).
pub trait ServiceManager {
    /// Reload unit definitions.
    fn daemon_reload(&self) -> Result<()>;

    /// Start a unit, waiting for the job to finish.
    fn start(&self, unit: &str) -> Result<()>;

    /// Whether a unit or target is currently active.
    fn is_active(&self, unit: &str) -> bool;
}

/// `systemctl`-backed [`ServiceManager`].
pub struct Systemctl;

impl ServiceManager for Systemctl {
    fn daemon_reload(&self) -> Result<()> {
        run_checked("systemctl", &["daemon-reload"])
    }

    fn start(&self, unit: &str) -> Result<()> {
        run_checked("systemctl", &["start", unit])
    }

    fn is_active(&self, unit: &str) -> bool {
        run_status("systemctl", &["--quiet", "is-active", unit])
            .map(|status| status == 0)
            .unwrap_or(false)
    }
}

/// Flush pending disk writes. Failure is not actionable at this point.
pub fn sync_disks() {
    let _ = run_status("sync", &[]);
}

/// Refresh the shared-library cache after library installs/symlink changes.
pub fn refresh_ldconfig() -> Result<()> {
    run_checked("ldconfig", &[])
}

//! Compatibility patch application into the installed module source tree.

use std::fs;
use std::path::Path;

use crate::error::{NvupError, Result};
use crate::system::run_status;
use crate::version::ClassifiedArtifact;

/// Staged patch file names, one per flag.
pub const GCC14_PATCH: &str = "nvidia-550-gcc14.patch";
pub const KERNEL_6_10_PATCH: &str = "nvidia-550-kernel-6.10.patch";

/// Apply the flagged compatibility patches into `usr/src/nvidia-<ver>`.
/// Each staged patch file is consumed (deleted) after application. A set
/// flag whose staged file is absent is skipped silently.
pub fn apply_patches(
    classified: &ClassifiedArtifact,
    root: &Path,
    work_dir: &Path,
) -> Result<()> {
    let Some(version) = classified.version_string() else {
        return Ok(());
    };
    let module_src = root.join(format!("usr/src/nvidia-{version}"));

    if classified.patches.gcc14 {
        apply_one(&work_dir.join(GCC14_PATCH), &module_src)?;
    }
    if classified.patches.kernel_6_10 {
        apply_one(&work_dir.join(KERNEL_6_10_PATCH), &module_src)?;
    }
    Ok(())
}

/// Apply one staged patch with path stripping, no backups, and rejects
/// discarded; non-matching hunks are accepted (exit status 1).
fn apply_one(patch_file: &Path, module_src: &Path) -> Result<()> {
    if !patch_file.is_file() {
        return Ok(());
    }
    let status = run_status("patch", &[
        "-p1",
        "--forward",
        "--no-backup-if-mismatch",
        "--reject-file=-",
        "-d",
        &module_src.display().to_string(),
        "-i",
        &patch_file.display().to_string(),
    ])?;
    // 0 = applied, 1 = some hunks skipped; both acceptable
    if status > 1 {
        return Err(NvupError::CommandFailed {
            command: format!("patch -p1 -i {}", patch_file.display()),
            status,
        });
    }
    fs::remove_file(patch_file)?;
    Ok(())
}

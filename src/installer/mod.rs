//! Installer invocation: staging, clearing previous driver state and
//! executing the vendor installer with the distro's fixed flag set.

pub mod redist;

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::dkms::ModuleBuilder;
use crate::error::{NvupError, Result};
use crate::selector::ArtifactKind;
use crate::version::ClassifiedArtifact;

/// Fixed nvidia-installer argument set. Relocates every component into the
/// distro's prefixes and suppresses the interactive/compiled-module paths;
/// the kernel module is built through DKMS afterwards instead.
pub const INSTALLER_FLAGS: [&str; 10] = [
    "--accept-license",
    "--no-questions",
    "--ui=none",
    "--no-backup",
    "--no-distro-scripts",
    "--no-kernel-module",
    "--x-prefix=/usr",
    "--x-module-path=/usr/lib64/xorg/modules",
    "--x-library-path=/usr/lib64",
    "--glvnd-egl-config-path=/usr/share/glvnd/egl_vendor.d",
];

/// Directory the integration package stages patch files into.
pub const PATCH_SOURCE_DIR: &str = "usr/share/nvup/patches";

/// Runs the vendor installer and reports its exit status.
pub trait PackageInstaller {
    /// Execute `program` with the fixed flag set from `work_dir`, with the
    /// diagnostic stream discarded. Returns the installer's exit status.
    fn run(&self, program: &Path, work_dir: &Path) -> Result<i32>;
}

/// Production [`PackageInstaller`]. Run files are self-extracting shell
/// archives and go through `sh`; the unpacked `nvidia-installer` binary from
/// a redistributable archive is executed directly.
pub struct NvidiaInstaller;

impl PackageInstaller for NvidiaInstaller {
    fn run(&self, program: &Path, work_dir: &Path) -> Result<i32> {
        let is_run_file = program.extension().is_some_and(|ext| ext == "run");
        let mut command = if is_run_file {
            let mut c = Command::new("sh");
            c.arg(program);
            c
        } else {
            Command::new(program)
        };
        let status = command
            .args(INSTALLER_FLAGS)
            .current_dir(work_dir)
            .stderr(Stdio::null())
            .status()
            .map_err(|e| NvupError::CommandSpawnFailed {
                command: program.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(status.code().unwrap_or(1))
    }
}

/// Copy the staged compatibility patch files next to the artifact so the
/// patch applier can find (and later consume) them.
pub fn stage_patch_files(root: &Path, work_dir: &Path) -> Result<()> {
    let source = root.join(PATCH_SOURCE_DIR);
    if !source.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(&source)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "patch") {
            fs::copy(&path, work_dir.join(entry.file_name()))?;
        }
    }
    Ok(())
}

/// Remove leftover module source trees and their DKMS registrations from
/// previous installs so the new version starts clean.
pub fn clear_previous_state(root: &Path, builder: &dyn ModuleBuilder) -> Result<()> {
    let src_dir = root.join("usr/src");
    if !src_dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(&src_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(old_version) = name.strip_prefix("nvidia-") {
            builder.unregister(old_version);
            fs::remove_dir_all(entry.path())?;
        }
    }
    Ok(())
}

/// Invoke the vendor installer for the resolved artifact. A nonzero status
/// is fatal and becomes the run's own exit status.
pub fn invoke(
    classified: &ClassifiedArtifact,
    installer: &dyn PackageInstaller,
    work_dir: &Path,
) -> Result<()> {
    let artifact = &classified.artifact;
    let status = match artifact.kind {
        ArtifactKind::RunFile | ArtifactKind::VulkanFile => {
            installer.run(&artifact.path, work_dir)?
        }
        ArtifactKind::RedistArchive => {
            let version = classified.version_string().unwrap_or_default().to_string();
            redist::install_from_archive(&artifact.path, &version, installer)?
        }
    };
    if status != 0 {
        return Err(NvupError::InstallerFailed { status });
    }
    Ok(())
}

#[cfg(test)]
pub mod fakes {
    //! Fake installer recording invocations.

    use std::cell::RefCell;
    use std::path::PathBuf;

    use super::*;

    pub struct FakePackageInstaller {
        pub status: i32,
        pub invocations: RefCell<Vec<PathBuf>>,
    }

    impl FakePackageInstaller {
        pub fn succeeding() -> Self {
            Self {
                status: 0,
                invocations: RefCell::new(Vec::new()),
            }
        }

        pub fn failing(status: i32) -> Self {
            Self {
                status,
                invocations: RefCell::new(Vec::new()),
            }
        }
    }

    impl PackageInstaller for FakePackageInstaller {
        fn run(&self, program: &Path, _work_dir: &Path) -> Result<i32> {
            self.invocations.borrow_mut().push(program.to_path_buf());
            Ok(self.status)
        }
    }
}

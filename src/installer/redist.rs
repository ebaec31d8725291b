//! Redistributable-archive support: unpacks the vendor's tar.xz bundle and
//! reorganizes it into the on-disk shape the run-file installer produces,
//! so the same `nvidia-installer` invocation works for both.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{NvupError, Result};
use crate::system::run_checked;

use super::PackageInstaller;

/// Unpack, relocate and run the installer from a redistributable archive.
/// The scratch directory is removed unconditionally, success or failure.
pub fn install_from_archive(
    archive: &Path,
    version: &str,
    installer: &dyn PackageInstaller,
) -> Result<i32> {
    let scratch = tempfile::Builder::new().prefix("nvup-redist-").tempdir()?;
    run_checked("tar", &[
        "-xJf",
        &archive.display().to_string(),
        "-C",
        &scratch.path().display().to_string(),
    ])
    .map_err(|e| NvupError::UnpackFailed {
        reason: e.to_string(),
    })?;

    let layout_root = relocate(scratch.path(), version)?;
    let installer_binary = layout_root.join("nvidia-installer");
    if !installer_binary.is_file() {
        return Err(NvupError::UnpackFailed {
            reason: "archive does not contain nvidia-installer".to_string(),
        });
    }
    installer.run(&installer_binary, &layout_root)
    // scratch dropped here; tempdir cleanup runs on both paths
}

/// Reorganize the unpacked archive into the run-file installer layout:
/// flatten the versioned top directory, merge `lib/` and `bin/` into the
/// root, and synthesize the two metadata files the installer expects.
pub fn relocate(unpack_dir: &Path, version: &str) -> Result<PathBuf> {
    let top = unpack_dir.join(format!("nvidia_driver-linux-x86_64-{version}-archive"));
    let layout_root = if top.is_dir() {
        flatten_into(&top, unpack_dir)?;
        fs::remove_dir_all(&top)?;
        unpack_dir.to_path_buf()
    } else {
        unpack_dir.to_path_buf()
    };

    for subdir in ["lib", "bin"] {
        let dir = layout_root.join(subdir);
        if dir.is_dir() {
            flatten_into(&dir, &layout_root)?;
            fs::remove_dir_all(&dir)?;
        }
    }

    // The installer refuses layouts without a package history
    fs::write(
        layout_root.join("pkg-history.txt"),
        format!("Package history for NVIDIA-Linux-x86_64-{version}-internal:\n\n"),
    )?;

    let manifest = layout_root.join("MANIFEST");
    if manifest.is_file() {
        fs::rename(&manifest, layout_root.join(".manifest"))?;
    }

    Ok(layout_root)
}

/// Move every entry of `from` into `into`, overwriting existing names.
fn flatten_into(from: &Path, into: &Path) -> Result<()> {
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = into.join(entry.file_name());
        if target.exists() {
            if target.is_dir() {
                fs::remove_dir_all(&target)?;
            } else {
                fs::remove_file(&target)?;
            }
        }
        fs::rename(entry.path(), &target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::fakes::FakePackageInstaller;
    use tempfile::TempDir;

    const VERSION: &str = "550.107.02";

    /// Stage the directory shape the vendor archive unpacks to.
    fn staged_unpack(dir: &Path) {
        let top = dir.join(format!("nvidia_driver-linux-x86_64-{VERSION}-archive"));
        fs::create_dir_all(top.join("lib")).unwrap();
        fs::create_dir_all(top.join("bin")).unwrap();
        fs::write(top.join("lib/libGLX_nvidia.so.0"), b"lib").unwrap();
        fs::write(top.join("bin/nvidia-smi"), b"bin").unwrap();
        fs::write(top.join("nvidia-installer"), b"installer").unwrap();
        fs::write(top.join("MANIFEST"), b"manifest body").unwrap();
        fs::write(top.join("nvidia_icd.json"), b"{}").unwrap();
    }

    #[test]
    fn test_relocate_flattens_to_run_file_layout() {
        let dir = TempDir::new().unwrap();
        staged_unpack(dir.path());

        let root = relocate(dir.path(), VERSION).unwrap();

        assert_eq!(root, dir.path());
        assert!(root.join("nvidia-installer").is_file());
        assert!(root.join("libGLX_nvidia.so.0").is_file());
        assert!(root.join("nvidia-smi").is_file());
        assert!(root.join("nvidia_icd.json").is_file());
        assert!(!root.join("lib").exists());
        assert!(!root.join("bin").exists());
        assert!(
            !root
                .join(format!("nvidia_driver-linux-x86_64-{VERSION}-archive"))
                .exists()
        );
    }

    #[test]
    fn test_relocate_synthesizes_metadata() {
        let dir = TempDir::new().unwrap();
        staged_unpack(dir.path());

        let root = relocate(dir.path(), VERSION).unwrap();

        let history = fs::read_to_string(root.join("pkg-history.txt")).unwrap();
        assert!(history.contains(VERSION));
        assert!(root.join(".manifest").is_file());
        assert!(!root.join("MANIFEST").exists());
    }

    #[test]
    fn test_relocate_is_tolerant_of_missing_top_dir() {
        // Some archives unpack without the versioned top directory
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("nvidia-installer"), b"installer").unwrap();

        let root = relocate(dir.path(), VERSION).unwrap();
        assert!(root.join("nvidia-installer").is_file());
        assert!(root.join("pkg-history.txt").is_file());
    }

    #[test]
    fn test_install_from_archive_runs_unpacked_installer() {
        // tar an archive-shaped tree, then run the full path
        let stage = TempDir::new().unwrap();
        staged_unpack(stage.path());
        let archive_dir = TempDir::new().unwrap();
        let archive = archive_dir
            .path()
            .join(format!("nvidia_driver-linux-x86_64-{VERSION}-archive.tar.xz"));
        let status = std::process::Command::new("tar")
            .args([
                "-cJf",
                &archive.display().to_string(),
                "-C",
                &stage.path().display().to_string(),
                ".",
            ])
            .status()
            .unwrap();
        assert!(status.success());

        let installer = FakePackageInstaller::succeeding();
        let exit = install_from_archive(&archive, VERSION, &installer).unwrap();
        assert_eq!(exit, 0);
        let invocations = installer.invocations.borrow();
        assert_eq!(invocations.len(), 1);
        assert!(invocations[0].ends_with("nvidia-installer"));
    }

    #[test]
    fn test_install_from_archive_mirrors_status() {
        let stage = TempDir::new().unwrap();
        staged_unpack(stage.path());
        let archive_dir = TempDir::new().unwrap();
        let archive = archive_dir
            .path()
            .join(format!("nvidia_driver-linux-x86_64-{VERSION}-archive.tar.xz"));
        std::process::Command::new("tar")
            .args([
                "-cJf",
                &archive.display().to_string(),
                "-C",
                &stage.path().display().to_string(),
                ".",
            ])
            .status()
            .unwrap();

        let installer = FakePackageInstaller::failing(5);
        let exit = install_from_archive(&archive, VERSION, &installer).unwrap();
        assert_eq!(exit, 5);
    }

    #[test]
    fn test_install_from_archive_unpack_failure() {
        let archive_dir = TempDir::new().unwrap();
        let archive = archive_dir.path().join("not-an-archive.tar.xz");
        fs::write(&archive, b"garbage").unwrap();

        let installer = FakePackageInstaller::succeeding();
        let err = install_from_archive(&archive, VERSION, &installer).unwrap_err();
        assert!(matches!(err, NvupError::UnpackFailed { .. }));
    }
}

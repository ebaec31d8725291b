//! Post-install configuration: a sequence of idempotent filesystem edits,
//! each gated on existence checks so reruns are safe.

pub mod files;

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::guard::{FIXUP_UNIT, HostInfo};
use crate::system::{ServiceManager, refresh_ldconfig};
use crate::version::ClassifiedArtifact;

/// Drivers from this major on no longer ship the Wayland helper library.
const WAYLAND_HELPER_DROPPED_MAJOR: u32 = 560;

/// OS releases from this version on default new users to the Wayland session.
const WAYLAND_SESSION_MIN_OS: u32 = 40;

const LIB_DIR: &str = "usr/lib64";
const WAYLAND_HELPER_SO: &str = "libnvidia-wayland-client.so.1";
const HELPER_LIB_SOURCE_DIR: &str = "usr/share/nvup/lib";
const GBM_BACKEND_LINK: &str = "usr/lib64/gbm/nvidia-drm_gbm.so";
const ALLOCATOR_SO: &str = "libnvidia-allocator.so.1";

/// Applies the post-install system configuration against a filesystem root.
pub struct Configurator<'a> {
    root: PathBuf,
    services: &'a dyn ServiceManager,
}

impl<'a> Configurator<'a> {
    pub fn new(root: &Path, services: &'a dyn ServiceManager) -> Self {
        Self {
            root: root.to_path_buf(),
            services,
        }
    }

    /// Run the full configuration sequence. Safe to repeat.
    pub fn apply(&self, classified: &ClassifiedArtifact, host: &HostInfo) -> Result<()> {
        self.write_environment_defaults()?;
        if host.os_version >= WAYLAND_SESSION_MIN_OS {
            if let Ok(user) = std::env::var("SUDO_USER") {
                self.seed_session_default(&user)?;
            }
        }
        self.rewrite_gdm_rules()?;
        self.manage_wayland_helper(classified)?;
        self.link_gbm_backend()?;
        // Cache refresh only makes sense against the live root
        if self.root == Path::new("/") {
            refresh_ldconfig()?;
        }
        self.write_output_class()?;
        self.services.daemon_reload()?;
        self.services.start(FIXUP_UNIT)?;
        Ok(())
    }

    fn write_environment_defaults(&self) -> Result<()> {
        let path = self.root.join(files::ENVIRONMENT_CONF_PATH);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, files::ENVIRONMENT_CONF)?;
        Ok(())
    }

    /// Seed the user's AccountsService record with the Wayland session, but
    /// only when the record carries no configuration yet.
    pub fn seed_session_default(&self, user: &str) -> Result<()> {
        let path = self
            .root
            .join(files::ACCOUNTS_SERVICE_USERS_DIR)
            .join(user);
        let is_empty = match fs::read_to_string(&path) {
            Ok(content) => content.trim().is_empty(),
            Err(_) => true,
        };
        if is_empty {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, files::SESSION_DEFAULT)?;
        }
        Ok(())
    }

    fn rewrite_gdm_rules(&self) -> Result<()> {
        let path = self.root.join(files::GDM_RULES_PATH);
        let Ok(content) = fs::read_to_string(&path) else {
            return Ok(());
        };
        let rewritten = files::rewrite_gdm_rules(&content);
        if rewritten != content {
            fs::write(path, rewritten)?;
        }
        Ok(())
    }

    /// Newer drivers dropped the Wayland helper library: remove the stale
    /// link. Older drivers need it present in the system library directory
    /// with its `.so.1` name.
    fn manage_wayland_helper(&self, classified: &ClassifiedArtifact) -> Result<()> {
        let Some(version) = &classified.version else {
            return Ok(());
        };
        let link = self.root.join(LIB_DIR).join(WAYLAND_HELPER_SO);

        if version.major >= WAYLAND_HELPER_DROPPED_MAJOR {
            if link.symlink_metadata().is_ok() {
                fs::remove_file(&link)?;
            }
            return Ok(());
        }

        let versioned_name = format!("libnvidia-wayland-client.so.{}", version.full);
        let versioned = self.root.join(LIB_DIR).join(&versioned_name);
        if !versioned.exists() {
            let staged = self.root.join(HELPER_LIB_SOURCE_DIR).join(&versioned_name);
            if staged.is_file() {
                fs::create_dir_all(versioned.parent().unwrap_or(Path::new("/")))?;
                fs::copy(&staged, &versioned)?;
            }
        }
        if versioned.exists() && link.symlink_metadata().is_err() {
            symlink(&versioned_name, &link)?;
        }
        Ok(())
    }

    /// Compositors allocate buffers through this link; created only when
    /// the allocator library is installed and the link is missing.
    fn link_gbm_backend(&self) -> Result<()> {
        let allocator = self.root.join(LIB_DIR).join(ALLOCATOR_SO);
        let link = self.root.join(GBM_BACKEND_LINK);
        if !allocator.exists() || link.symlink_metadata().is_ok() {
            return Ok(());
        }
        if let Some(parent) = link.parent() {
            fs::create_dir_all(parent)?;
        }
        symlink(format!("../{ALLOCATOR_SO}"), &link)?;
        Ok(())
    }

    fn write_output_class(&self) -> Result<()> {
        let path = self.root.join(files::XORG_OUTPUT_CLASS_PATH);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, files::XORG_OUTPUT_CLASS)?;
        Ok(())
    }
}

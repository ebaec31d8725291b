//! Install pipeline: threads the resolved artifact through classification,
//! installer invocation, patching, the module build and post-install
//! configuration, in that order. Any stage error aborts the run and the
//! stages after it never execute.

use std::path::{Path, PathBuf};

use console::style;

use crate::configure::Configurator;
use crate::dkms::{ModuleBuilder, register_and_build};
use crate::error::Result;
use crate::guard::HostInfo;
use crate::installer::{PackageInstaller, clear_previous_state, invoke, stage_patch_files};
use crate::patch::apply_patches;
use crate::resolver::Resolver;
use crate::selector::Selector;
use crate::system::ServiceManager;
use crate::version::classify;

/// One driver install run over injected stage implementations.
pub struct Pipeline<'a> {
    resolver: Resolver<'a>,
    installer: &'a dyn PackageInstaller,
    builder: &'a dyn ModuleBuilder,
    services: &'a dyn ServiceManager,
    root: PathBuf,
    work_dir: PathBuf,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        resolver: Resolver<'a>,
        installer: &'a dyn PackageInstaller,
        builder: &'a dyn ModuleBuilder,
        services: &'a dyn ServiceManager,
        work_dir: &Path,
    ) -> Self {
        Self::with_root(resolver, installer, builder, services, Path::new("/"), work_dir)
    }

    /// Construct against an explicit filesystem root.
    pub fn with_root(
        resolver: Resolver<'a>,
        installer: &'a dyn PackageInstaller,
        builder: &'a dyn ModuleBuilder,
        services: &'a dyn ServiceManager,
        root: &Path,
        work_dir: &Path,
    ) -> Self {
        Self {
            resolver,
            installer,
            builder,
            services,
            root: root.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
        }
    }

    pub fn run(&self, selector: &Selector, host: &HostInfo) -> Result<()> {
        let artifact = self.resolver.resolve(selector)?;
        let classified = classify(artifact)?;
        println!(
            "Installing {}",
            style(&classified.artifact.file_name).cyan()
        );

        stage_patch_files(&self.root, &self.work_dir)?;
        clear_previous_state(&self.root, self.builder)?;
        invoke(&classified, self.installer, &self.work_dir)?;
        apply_patches(&classified, &self.root, &self.work_dir)?;

        if let Some(version) = classified.version_string() {
            register_and_build(self.builder, version, &host.kernel_release)?;
        }

        Configurator::new(&self.root, self.services).apply(&classified, host)?;
        Ok(())
    }
}

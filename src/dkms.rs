//! Module registration and build through DKMS.
//!
//! The vendor installer only unpacks the module source tree (it is invoked
//! with `--no-kernel-module`); DKMS owns the actual build so the module
//! survives kernel upgrades.

use crate::error::{NvupError, Result};
use crate::system::command::{run_checked, run_status, run_status_quiet};

/// Kernel module registration and build operations.
pub trait ModuleBuilder {
    /// Register the installed module source tree.
    fn register(&self, version: &str) -> Result<()>;

    /// Build and install the module for `kernel`, returning the build
    /// tool's exit status.
    fn build(&self, version: &str, kernel: &str) -> Result<i32>;

    /// Best-effort removal of a previous registration. Never fatal.
    fn unregister(&self, version: &str);
}

/// `dkms`-backed [`ModuleBuilder`].
pub struct Dkms;

impl ModuleBuilder for Dkms {
    fn register(&self, version: &str) -> Result<()> {
        run_checked("dkms", &["add", &format!("nvidia/{version}")])
    }

    fn build(&self, version: &str, kernel: &str) -> Result<i32> {
        run_status("dkms", &["install", &format!("nvidia/{version}"), "-k", kernel])
    }

    fn unregister(&self, version: &str) {
        let _ = run_status_quiet("dkms", &["remove", &format!("nvidia/{version}"), "--all"]);
    }
}

/// Register the new module source and build it for the running kernel.
/// A nonzero build status is fatal and propagates verbatim.
pub fn register_and_build(
    builder: &dyn ModuleBuilder,
    version: &str,
    kernel: &str,
) -> Result<()> {
    builder.register(version)?;
    let status = builder.build(version, kernel)?;
    if status != 0 {
        return Err(NvupError::ModuleBuildFailed {
            version: version.to_string(),
            status,
        });
    }
    Ok(())
}

#[cfg(test)]
pub mod fakes {
    //! Fake module builder recording DKMS operations.

    use std::cell::RefCell;

    use super::*;

    pub struct FakeModuleBuilder {
        pub build_status: i32,
        pub registered: RefCell<Vec<String>>,
        pub built: RefCell<Vec<(String, String)>>,
        pub unregistered: RefCell<Vec<String>>,
    }

    impl FakeModuleBuilder {
        pub fn succeeding() -> Self {
            Self::with_status(0)
        }

        pub fn with_status(build_status: i32) -> Self {
            Self {
                build_status,
                registered: RefCell::new(Vec::new()),
                built: RefCell::new(Vec::new()),
                unregistered: RefCell::new(Vec::new()),
            }
        }
    }

    impl ModuleBuilder for FakeModuleBuilder {
        fn register(&self, version: &str) -> Result<()> {
            self.registered.borrow_mut().push(version.to_string());
            Ok(())
        }

        fn build(&self, version: &str, kernel: &str) -> Result<i32> {
            self.built
                .borrow_mut()
                .push((version.to_string(), kernel.to_string()));
            Ok(self.build_status)
        }

        fn unregister(&self, version: &str) {
            self.unregistered.borrow_mut().push(version.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fakes::FakeModuleBuilder;

    #[test]
    fn test_register_and_build_success() {
        let builder = FakeModuleBuilder::succeeding();
        register_and_build(&builder, "550.107.02", "6.10.3-200.fc40.x86_64").unwrap();
        assert_eq!(builder.registered.borrow().as_slice(), &["550.107.02"]);
        assert_eq!(
            builder.built.borrow().as_slice(),
            &[("550.107.02".to_string(), "6.10.3-200.fc40.x86_64".to_string())]
        );
    }

    #[test]
    fn test_build_failure_propagates_status() {
        let builder = FakeModuleBuilder::with_status(10);
        let err = register_and_build(&builder, "550.107.02", "6.10.3").unwrap_err();
        assert!(matches!(
            err,
            NvupError::ModuleBuildFailed { status: 10, .. }
        ));
        assert_eq!(err.exit_code(), 10);
    }
}

mod cli;
mod configure;
mod dkms;
mod error;
mod finalize;
mod guard;
mod installer;
mod patch;
mod pipeline;
mod resolver;
mod selector;
mod system;
mod version;

use std::os::unix::process::CommandExt;
use std::process::Command;

use clap::Parser;

use cli::Cli;
use dkms::Dkms;
use error::{NvupError, Result};
use installer::NvidiaInstaller;
use pipeline::Pipeline;
use resolver::Resolver;
use selector::Selector;
use system::{HttpDownloader, Systemctl};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Parse before touching privileges so usage errors never prompt for a
    // password
    let selector = Selector::parse(&cli.selector)?;
    ensure_root()?;

    let services = Systemctl;
    let host = guard::preflight(&services)?;

    let downloader = HttpDownloader::new();
    let work_dir = std::env::current_dir()?;
    let resolver = Resolver::new(&downloader, &work_dir)?;
    let installer = NvidiaInstaller;
    let builder = Dkms;

    let pipeline = Pipeline::new(resolver, &installer, &builder, &services, &work_dir);
    pipeline.run(&selector, &host)?;

    finalize::finalize();
    Ok(())
}

/// Re-execute under sudo when not already root. Credentials are validated
/// first so an authentication failure maps to its own exit status instead
/// of sudo's.
fn ensure_root() -> Result<()> {
    if nix::unistd::Uid::effective().is_root() {
        return Ok(());
    }

    let validated = Command::new("sudo")
        .arg("-v")
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    if !validated {
        return Err(NvupError::PrivilegeAcquisitionFailed);
    }

    let exe = std::env::current_exe()?;
    // exec only returns on failure
    let _ = Command::new("sudo")
        .arg(exe)
        .args(std::env::args_os().skip(1))
        .exec();
    Err(NvupError::PrivilegeAcquisitionFailed)
}

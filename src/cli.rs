//! CLI definitions using clap derive API
//!
//! The surface is deliberately small: one positional selector, no flags.
//! Everything else (cache location, target paths) is fixed by the distro
//! contract this tool implements.

use clap::Parser;
use clap::builder::{Styles, styling::AnsiColor};

/// nvup - NVIDIA driver installer
///
/// Installs the proprietary NVIDIA driver on Fedora-family systems.
#[derive(Parser, Debug)]
#[command(
    name = "nvup",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "NVIDIA proprietary driver installer for Fedora-family systems",
    long_about = "nvup resolves a driver package (named release, latest, Vulkan beta, or a \
                  local file), downloads it if absent, runs the vendor installer with the \
                  distro's path layout, builds the kernel module through DKMS and applies \
                  the post-install configuration GDM, udev and Xorg expect.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  nvup latest                              \x1b[90m# Newest release from the download index\x1b[0m\n   \
                  nvup 550                                 \x1b[90m# A named release\x1b[0m\n   \
                  nvup vulkan                              \x1b[90m# Vulkan beta driver\x1b[0m\n   \
                  nvup ./NVIDIA-Linux-x86_64-550.107.02.run \x1b[90m# Previously downloaded file\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// What to install: 'latest', 'vulkan', a named release tag, or the path
    /// to a downloaded driver package
    pub selector: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_selector() {
        let cli = Cli::try_parse_from(["nvup", "550"]).unwrap();
        assert_eq!(cli.selector, "550");
    }

    #[test]
    fn test_cli_parsing_path_selector() {
        let cli = Cli::try_parse_from(["nvup", "./NVIDIA-Linux-x86_64-550.107.02.run"]).unwrap();
        assert_eq!(cli.selector, "./NVIDIA-Linux-x86_64-550.107.02.run");
    }

    #[test]
    fn test_cli_requires_selector() {
        assert!(Cli::try_parse_from(["nvup"]).is_err());
    }

    #[test]
    fn test_cli_rejects_extra_args() {
        assert!(Cli::try_parse_from(["nvup", "latest", "extra"]).is_err());
    }
}

//! Selector parsing: maps the positional CLI argument to a typed install
//! request before anything touches the network or the system.
//!
//! A filename is classified exactly once, here; every later stage switches
//! on [`ArtifactKind`] instead of re-matching patterns.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{NvupError, Result};
use crate::resolver::releases::{self, ReleaseEntry};

/// Driver package shape, decided once at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Self-extracting `NVIDIA-Linux-x86_64-<ver>.run` installer
    RunFile,
    /// `nvidia_driver-linux-x86_64-<ver>-archive.tar.xz` redistributable bundle
    RedistArchive,
    /// Vulkan beta build, `NVIDIA-Linux-x86_64-<ver>-vulkan.run`
    VulkanFile,
}

/// Parsed install request.
#[derive(Debug, Clone)]
pub enum Selector {
    /// A named release from the fixed table
    Release(&'static ReleaseEntry),
    /// Newest release from the vendor download index
    Latest,
    /// The Vulkan beta driver
    Vulkan,
    /// A driver package already on disk
    LocalFile { path: PathBuf, kind: ArtifactKind },
}

static RUN_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^NVIDIA-Linux-x86_64-[0-9]+\.[0-9]+(?:\.[0-9]+)?\.run$").expect("static pattern")
});

static VULKAN_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^NVIDIA-Linux-x86_64-[0-9]+\.[0-9]+(?:\.[0-9]+)?-vulkan\.run$")
        .expect("static pattern")
});

static REDIST_ARCHIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^nvidia_driver-linux-x86_64-[0-9]+\.[0-9]+(?:\.[0-9]+)?-archive\.tar\.xz$")
        .expect("static pattern")
});

/// Virtualization-only driver variants; never installable on a desktop host.
const REJECTED_VARIANTS: [&str; 2] = ["vgpu", "grid"];

/// Classify a driver file name into its artifact kind.
pub fn classify_file_name(name: &str) -> Option<ArtifactKind> {
    if VULKAN_FILE.is_match(name) {
        Some(ArtifactKind::VulkanFile)
    } else if RUN_FILE.is_match(name) {
        Some(ArtifactKind::RunFile)
    } else if REDIST_ARCHIVE.is_match(name) {
        Some(ArtifactKind::RedistArchive)
    } else {
        None
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn looks_like_path(input: &str) -> bool {
    input.contains('/') || classify_file_name(input).is_some()
}

impl Selector {
    /// Parse the positional argument. Pure string and read-only filesystem
    /// checks only; safe to run before privilege acquisition.
    pub fn parse(input: &str) -> Result<Self> {
        match input {
            "latest" => return Ok(Selector::Latest),
            "vulkan" => return Ok(Selector::Vulkan),
            _ => {}
        }

        if let Some(entry) = releases::find(input) {
            return Ok(Selector::Release(entry));
        }

        if looks_like_path(input) {
            let path = PathBuf::from(input);
            let name = file_name_of(&path);
            let lower = name.to_lowercase();
            if REJECTED_VARIANTS.iter().any(|v| lower.contains(v)) {
                return Err(NvupError::VariantRejected { name });
            }
            let Some(kind) = classify_file_name(&name) else {
                return Err(NvupError::UnrecognizedFileName { name });
            };
            if !path.is_file() {
                return Err(NvupError::ArtifactNotFound {
                    path: path.display().to_string(),
                });
            }
            return Ok(Selector::LocalFile { path, kind });
        }

        Err(NvupError::UnknownSelector {
            selector: input.to_string(),
        })
    }
}

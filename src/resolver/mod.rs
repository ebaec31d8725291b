//! Source resolution: maps a parsed [`Selector`] to a driver artifact on
//! disk, downloading into the cache directory when absent.

pub mod releases;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{NvupError, Result};
use crate::selector::{ArtifactKind, Selector, classify_file_name};
use crate::system::Downloader;

/// Cache subdirectory name under the user's download directory.
const CACHE_DIR: &str = "nvidia-drivers";

/// A driver package present on disk with nonzero size.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub file_name: String,
    pub kind: ArtifactKind,
}

/// Default cache directory for downloaded driver packages.
///
/// Prefers the desktop environment's configured download directory, falls
/// back to the home directory. Can be overridden with `NVUP_CACHE_DIR`.
pub fn default_cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("NVUP_CACHE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::download_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| NvupError::IoError {
            message: "Could not determine a download directory".to_string(),
        })?;
    Ok(base.join(CACHE_DIR))
}

/// Resolves selectors against the working directory, the cache and the
/// download server.
pub struct Resolver<'a> {
    downloader: &'a dyn Downloader,
    work_dir: PathBuf,
    cache_dir: PathBuf,
}

impl<'a> Resolver<'a> {
    pub fn new(downloader: &'a dyn Downloader, work_dir: &Path) -> Result<Self> {
        Ok(Self {
            downloader,
            work_dir: work_dir.to_path_buf(),
            cache_dir: default_cache_dir()?,
        })
    }

    /// Construct with an explicit cache directory.
    pub fn with_cache_dir(downloader: &'a dyn Downloader, work_dir: &Path, cache_dir: &Path) -> Self {
        Self {
            downloader,
            work_dir: work_dir.to_path_buf(),
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Resolve a selector to an on-disk artifact, downloading if needed.
    pub fn resolve(&self, selector: &Selector) -> Result<Artifact> {
        match selector {
            Selector::LocalFile { path, kind } => local_artifact(path, *kind),
            Selector::Release(entry) => self.obtain(
                &releases::run_file_name(entry.version),
                &releases::run_file_url(entry.version),
                ArtifactKind::RunFile,
            ),
            Selector::Vulkan => self.obtain(
                &releases::vulkan_file_name(),
                releases::VULKAN_URL,
                ArtifactKind::VulkanFile,
            ),
            Selector::Latest => {
                let (file_name, url) = self.latest_run_file()?;
                let Some(kind) = classify_file_name(&file_name) else {
                    return Err(NvupError::IndexUnreadable {
                        reason: format!("index names unrecognized file '{file_name}'"),
                    });
                };
                self.obtain(&file_name, &url, kind)
            }
        }
    }

    /// Read the release index and extract the newest run file's name + URL.
    fn latest_run_file(&self) -> Result<(String, String)> {
        let index = self.downloader.fetch_text(&releases::latest_index_url())?;
        let first_line = index.lines().next().unwrap_or("");
        let relative = first_line
            .split_whitespace()
            .last()
            .ok_or_else(|| NvupError::IndexUnreadable {
                reason: "index is empty".to_string(),
            })?;
        let file_name = relative
            .rsplit('/')
            .next()
            .unwrap_or(relative)
            .to_string();
        let url = format!("{}/{relative}", releases::DOWNLOAD_BASE);
        Ok((file_name, url))
    }

    /// Probe working directory, then cache; download into the cache last.
    fn obtain(&self, file_name: &str, url: &str, kind: ArtifactKind) -> Result<Artifact> {
        let in_work_dir = self.work_dir.join(file_name);
        if nonzero_file(&in_work_dir) {
            return Ok(artifact(in_work_dir, file_name, kind));
        }

        let in_cache = self.cache_dir.join(file_name);
        if nonzero_file(&in_cache) {
            return Ok(artifact(in_cache, file_name, kind));
        }

        fs::create_dir_all(&self.cache_dir)?;
        println!(
            "Downloading {} to {}",
            file_name,
            self.cache_dir.display()
        );
        self.downloader.fetch_file(url, &in_cache)?;
        if !nonzero_file(&in_cache) {
            // Downloader cleans partials; guard against an empty success
            let _ = fs::remove_file(&in_cache);
            return Err(NvupError::DownloadFailed {
                url: url.to_string(),
                reason: "downloaded file is empty".to_string(),
            });
        }
        Ok(artifact(in_cache, file_name, kind))
    }
}

fn artifact(path: PathBuf, file_name: &str, kind: ArtifactKind) -> Artifact {
    Artifact {
        path,
        file_name: file_name.to_string(),
        kind,
    }
}

fn local_artifact(path: &Path, kind: ArtifactKind) -> Result<Artifact> {
    if !nonzero_file(path) {
        return Err(NvupError::ArtifactNotFound {
            path: path.display().to_string(),
        });
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(artifact(path.to_path_buf(), &file_name, kind))
}

fn nonzero_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}

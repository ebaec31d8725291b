//! HTTP artifact download behind a narrow trait.
//!
//! The vendor's download server answers missing artifacts with a 200 page
//! whose body carries a "404 - Not Found" marker, so both the HTTP status
//! and the body head are checked before a download counts as successful.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{NvupError, Result};

/// Marker string the download server embeds in soft-404 bodies.
const NOT_FOUND_MARKER: &[u8] = b"404 - Not Found";

/// Fetches remote artifacts and index files.
pub trait Downloader {
    /// Fetch a small text resource (the release index).
    fn fetch_text(&self, url: &str) -> Result<String>;

    /// Download a driver package to `dest`. On failure no partial file is
    /// left behind.
    fn fetch_file(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Production [`Downloader`] backed by a blocking reqwest client.
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("nvup/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for HttpDownloader {
    fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(NvupError::IndexUnreadable {
                reason: format!("{} returned HTTP {}", url, response.status()),
            });
        }
        Ok(response.text()?)
    }

    fn fetch_file(&self, url: &str, dest: &Path) -> Result<()> {
        let result = self.fetch_file_inner(url, dest);
        if result.is_err() && dest.exists() {
            let _ = std::fs::remove_file(dest);
        }
        result
    }
}

impl HttpDownloader {
    fn fetch_file_inner(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self.client.get(url).send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(NvupError::RemoteNotFound {
                url: url.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(NvupError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let pb = download_progress_bar(response.content_length());
        let mut file = File::create(dest)?;
        let mut head: Vec<u8> = Vec::with_capacity(1024);
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = response.read(&mut buf)?;
            if n == 0 {
                break;
            }
            if head.len() < 1024 {
                let take = (1024 - head.len()).min(n);
                head.extend_from_slice(&buf[..take]);
            }
            file.write_all(&buf[..n])?;
            pb.inc(n as u64);
        }
        pb.finish_and_clear();
        file.flush()?;

        if contains_marker(&head, NOT_FOUND_MARKER) {
            return Err(NvupError::RemoteNotFound {
                url: url.to_string(),
            });
        }

        let size = std::fs::metadata(dest)?.len();
        if size == 0 {
            return Err(NvupError::DownloadFailed {
                url: url.to_string(),
                reason: "empty response body".to_string(),
            });
        }
        Ok(())
    }
}

fn download_progress_bar(total: Option<u64>) -> ProgressBar {
    let pb = match total {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{bar:40.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec} {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };
    pb.set_message("downloading");
    pb
}

fn contains_marker(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

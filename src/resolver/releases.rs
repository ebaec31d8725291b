//! Fixed release table and download endpoints.
//!
//! Named selectors map to pinned artifact URLs; the mapping is part of the
//! external contract and must stay deterministic.

/// Base URL for official driver run files.
pub const DOWNLOAD_BASE: &str = "https://us.download.nvidia.com/XFree86/Linux-x86_64";

/// Vulkan beta driver version and its fixed developer-site URL.
pub const VULKAN_VERSION: &str = "550.40.82";
pub const VULKAN_URL: &str = "https://developer.nvidia.com/downloads/vulkan-beta-5504082-linux";

/// A pinned named release.
#[derive(Debug)]
pub struct ReleaseEntry {
    /// Selector tag as typed on the command line
    pub tag: &'static str,
    /// Full dotted driver version
    pub version: &'static str,
}

/// Named releases selectable by tag. Newest last.
pub static RELEASES: [ReleaseEntry; 4] = [
    ReleaseEntry {
        tag: "535",
        version: "535.183.01",
    },
    ReleaseEntry {
        tag: "550",
        version: "550.107.02",
    },
    ReleaseEntry {
        tag: "555",
        version: "555.58.02",
    },
    ReleaseEntry {
        tag: "560",
        version: "560.35.03",
    },
];

/// Look up a named release by its selector tag.
pub fn find(tag: &str) -> Option<&'static ReleaseEntry> {
    RELEASES.iter().find(|entry| entry.tag == tag)
}

/// Canonical run-file name for a driver version.
pub fn run_file_name(version: &str) -> String {
    format!("NVIDIA-Linux-x86_64-{version}.run")
}

/// Download URL for a pinned release run file.
pub fn run_file_url(version: &str) -> String {
    format!("{DOWNLOAD_BASE}/{version}/{}", run_file_name(version))
}

/// URL of the index file naming the newest release.
pub fn latest_index_url() -> String {
    format!("{DOWNLOAD_BASE}/latest.txt")
}

/// Local file name used for the Vulkan beta build. The developer site serves
/// an unversioned attachment, so the name is synthesized here.
pub fn vulkan_file_name() -> String {
    format!("NVIDIA-Linux-x86_64-{VULKAN_VERSION}-vulkan.run")
}

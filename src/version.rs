//! Version classification: parses the driver version out of the artifact
//! file name and derives the compatibility-patch flags.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{NvupError, Result};
use crate::resolver::Artifact;
use crate::selector::ArtifactKind;

/// Releases at or below this major are rejected outright.
pub const MIN_SUPPORTED_MAJOR: u32 = 470;

/// The 550 series needed a GCC 14 build fix up to this minor.
const GCC14_MAX_MINOR: u32 = 40;

/// The 550 series needed a kernel 6.10 source fix for minors in
/// (GCC14_MAX_MINOR, KERNEL_6_10_MAX_MINOR].
const KERNEL_6_10_MAX_MINOR: u32 = 90;

static VERSION_IN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\.([0-9]+)(?:\.([0-9]+))?").expect("static pattern"));

/// Driver version parsed from the artifact file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverVersion {
    pub major: u32,
    pub minor: u32,
    /// Full dotted version as it appeared in the file name
    pub full: String,
}

/// Which compatibility patches apply to this driver's module source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchFlags {
    pub gcc14: bool,
    pub kernel_6_10: bool,
}

/// Artifact enriched with version and patch decisions; threaded through the
/// installer, registrar and configurator stages.
#[derive(Debug, Clone)]
pub struct ClassifiedArtifact {
    pub artifact: Artifact,
    pub version: Option<DriverVersion>,
    pub patches: PatchFlags,
}

impl ClassifiedArtifact {
    /// Full dotted version, where known. Vulkan builds still carry one in
    /// their file name even though they bypass the patch policy.
    pub fn version_string(&self) -> Option<&str> {
        self.version.as_ref().map(|v| v.full.as_str())
    }
}

/// Parse `major.minor[.patch]` out of a driver file name.
pub fn parse_version(file_name: &str) -> Option<DriverVersion> {
    let caps = VERSION_IN_NAME.captures(file_name)?;
    let major: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minor: u32 = caps.get(2)?.as_str().parse().ok()?;
    let full = caps.get(0)?.as_str().to_string();
    Some(DriverVersion { major, minor, full })
}

fn patch_flags_for(version: &DriverVersion) -> PatchFlags {
    if version.major != 550 {
        return PatchFlags::default();
    }
    PatchFlags {
        gcc14: version.minor <= GCC14_MAX_MINOR,
        kernel_6_10: version.minor > GCC14_MAX_MINOR && version.minor <= KERNEL_6_10_MAX_MINOR,
    }
}

/// Classify a resolved artifact. Vulkan builds bypass the version policy;
/// everything else must parse and clear the minimum-major bar.
pub fn classify(artifact: Artifact) -> Result<ClassifiedArtifact> {
    let version = parse_version(&artifact.file_name);

    if artifact.kind == ArtifactKind::VulkanFile {
        return Ok(ClassifiedArtifact {
            artifact,
            version,
            patches: PatchFlags::default(),
        });
    }

    let Some(version) = version else {
        return Err(NvupError::UnrecognizedFileName {
            name: artifact.file_name.clone(),
        });
    };
    if version.major <= MIN_SUPPORTED_MAJOR {
        return Err(NvupError::VersionTooOld {
            version: version.full.clone(),
        });
    }

    let patches = patch_flags_for(&version);
    Ok(ClassifiedArtifact {
        artifact,
        version: Some(version),
        patches,
    })
}

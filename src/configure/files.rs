//! Fixed-path configuration files and their verbatim contents.
//!
//! The exact text of these files is part of the external contract with the
//! display manager, udev and the X server; edit with care.

/// Environment defaults selecting the NVIDIA VA-API decode backend.
pub const ENVIRONMENT_CONF_PATH: &str = "etc/environment.d/90-nvidia-vaapi.conf";

pub const ENVIRONMENT_CONF: &str = "\
# Installed by nvup. Selects the direct NVDEC backend for nvidia-vaapi-driver.
NVD_BACKEND=direct
";

/// X11 output-class fragment binding the proprietary driver as primary GPU.
pub const XORG_OUTPUT_CLASS_PATH: &str = "etc/X11/xorg.conf.d/10-nvidia-primary.conf";

pub const XORG_OUTPUT_CLASS: &str = r#"# Installed by nvup.
#
# Binds the proprietary driver to NVIDIA hardware and makes it the primary
# GPU. On Optimus (dual-GPU) laptops that should render on the integrated
# GPU instead, comment out the PrimaryGPU option and uncomment
# AllowNVIDIAGPUScreens below.
Section "OutputClass"
    Identifier "nvidia"
    MatchDriver "nvidia-drm"
    Driver "nvidia"
    Option "PrimaryGPU" "yes"
#    Option "AllowNVIDIAGPUScreens"
    ModulePath "/usr/lib64/nvidia/xorg"
    ModulePath "/usr/lib64/xorg/modules"
EndSection
"#;

/// GDM's udev rule file that disables Wayland on NVIDIA systems; rewritten
/// so the (now working) Wayland path stays enabled.
pub const GDM_RULES_PATH: &str = "usr/lib/udev/rules.d/61-gdm.rules";

/// Per-user AccountsService records live here.
pub const ACCOUNTS_SERVICE_USERS_DIR: &str = "var/lib/AccountsService/users";

/// Seeded login-session default for freshly created user records.
pub const SESSION_DEFAULT: &str = "\
[User]
Session=gnome-wayland
";

/// Rewrite the GDM udev rules: comment out the directive that switches
/// Wayland off and redirect the disable-wayland jump to the end label.
pub fn rewrite_gdm_rules(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        let rewritten = if line.contains("gdm-runtime-config set daemon WaylandEnable false")
            && !line.trim_start().starts_with('#')
        {
            format!("#{line}")
        } else {
            line.replace("GOTO=\"gdm_disable_wayland\"", "GOTO=\"gdm_end\"")
        };
        out.push_str(&rewritten);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RULES: &str = r#"# disable Wayland on Hi1710 chipsets
ATTR{vendor}=="0x19e5", ATTR{device}=="0x1711", GOTO="gdm_disable_wayland"
# disable Wayland when nvidia modeset is off
IMPORT{parent}="NVIDIA_MODESET", ENV{NVIDIA_MODESET}!="1", GOTO="gdm_disable_wayland"
GOTO="gdm_end"

LABEL="gdm_disable_wayland"
RUN+="/usr/libexec/gdm-runtime-config set daemon WaylandEnable false"
GOTO="gdm_end"

LABEL="gdm_end"
"#;

    #[test]
    fn test_rewrite_comments_out_wayland_disable() {
        let rewritten = rewrite_gdm_rules(SAMPLE_RULES);
        assert!(rewritten.contains(
            "#RUN+=\"/usr/libexec/gdm-runtime-config set daemon WaylandEnable false\""
        ));
        assert!(!rewritten.contains("\nRUN+=\"/usr/libexec/gdm-runtime-config"));
    }

    #[test]
    fn test_rewrite_redirects_goto() {
        let rewritten = rewrite_gdm_rules(SAMPLE_RULES);
        assert!(!rewritten.contains("GOTO=\"gdm_disable_wayland\""));
        assert!(rewritten.contains("ENV{NVIDIA_MODESET}!=\"1\", GOTO=\"gdm_end\""));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = rewrite_gdm_rules(SAMPLE_RULES);
        let twice = rewrite_gdm_rules(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_environment_conf_selects_direct_backend() {
        assert!(ENVIRONMENT_CONF.contains("NVD_BACKEND=direct"));
    }

    #[test]
    fn test_output_class_keeps_operator_knobs_commented() {
        assert!(XORG_OUTPUT_CLASS.contains("Option \"PrimaryGPU\" \"yes\""));
        assert!(XORG_OUTPUT_CLASS.contains("#    Option \"AllowNVIDIAGPUScreens\""));
    }
}

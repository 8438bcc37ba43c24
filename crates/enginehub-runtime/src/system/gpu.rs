//! Accelerator detection by probing vendor tools.

use std::process::Command;

/// Detect if NVIDIA GPU hardware is present (regardless of CUDA installation).
pub fn detect_nvidia_hardware() -> bool {
    // nvidia-smi is the most reliable signal when drivers are installed
    if command_succeeds("nvidia-smi", &["--list-gpus"]) {
        return true;
    }

    #[cfg(target_os = "linux")]
    {
        if lspci_mentions("nvidia") {
            return true;
        }
    }

    false
}

/// Detect an AMD GPU usable through ROCm.
pub fn detect_rocm_hardware() -> bool {
    if command_succeeds("rocm-smi", &["--showproductname"]) {
        return true;
    }

    #[cfg(target_os = "linux")]
    {
        // Only trust lspci when the ROCm runtime is also installed
        if std::path::Path::new("/opt/rocm").exists() && lspci_mentions("amd/ati") {
            return true;
        }
    }

    false
}

fn command_succeeds(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(target_os = "linux")]
fn lspci_mentions(needle: &str) -> bool {
    Command::new("lspci")
        .output()
        .map(|output| {
            output.status.success()
                && vga_lines_mention(&String::from_utf8_lossy(&output.stdout), needle)
        })
        .unwrap_or(false)
}

/// True if a display controller line of `lspci` output mentions `needle`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn vga_lines_mention(lspci: &str, needle: &str) -> bool {
    lspci
        .lines()
        .map(str::to_lowercase)
        .filter(|l| l.contains("vga") || l.contains("3d controller") || l.contains("display"))
        .any(|l| l.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSPCI: &str = "\
00:00.0 Host bridge: Intel Corporation 8th Gen Core Processor Host Bridge
01:00.0 VGA compatible controller: NVIDIA Corporation GA102 [GeForce RTX 3090] (rev a1)
01:00.1 Audio device: NVIDIA Corporation GA102 High Definition Audio Controller (rev a1)
03:00.0 Display controller: Advanced Micro Devices, Inc. [AMD/ATI] Navi 31";

    #[test]
    fn test_vga_lines_mention() {
        assert!(vga_lines_mention(LSPCI, "nvidia"));
        assert!(vga_lines_mention(LSPCI, "amd/ati"));
        assert!(!vga_lines_mention("00:1f.3 Audio device: NVIDIA", "nvidia"));
        assert!(!vga_lines_mention("", "nvidia"));
    }

    #[test]
    fn test_missing_tool_is_not_success() {
        assert!(!command_succeeds("enginehub-no-such-tool", &[]));
    }
}

//! Default machine fingerprint.
//!
//! Composes host name, user name, OS version, and a stable selection of
//! MAC addresses, hashed to a hex string. Wireless and container
//! pseudo-interfaces are excluded because they come and go without the
//! machine changing.

use sha2::{Digest, Sha256};

use licensehub_core::traits::HardwareIdentifier;

/// Interface name prefixes that do not identify the machine.
const EXCLUDED_INTERFACE_PREFIXES: &[&str] = &["lo", "wl", "docker", "veth", "br-", "virbr"];

/// Default [`HardwareIdentifier`]: deterministic on unchanged hardware,
/// idempotent across restarts.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineIdentifier;

impl MachineIdentifier {
    /// Create the default identifier.
    pub fn new() -> Self {
        Self
    }

    fn compose(&self) -> String {
        let mut macs = mac_addresses();
        macs.sort();

        format!(
            "{}|{}|{}|{}",
            host_name(),
            user_name(),
            os_version(),
            macs.join(",")
        )
    }
}

impl HardwareIdentifier for MachineIdentifier {
    fn get(&self) -> String {
        let composite = self.compose();

        let mut hasher = Sha256::new();
        hasher.update(composite.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn validate(&self, candidate: &str) -> bool {
        candidate == self.get()
    }
}

fn host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

fn user_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn os_version() -> String {
    #[cfg(target_os = "linux")]
    {
        if let Ok(content) = std::fs::read_to_string("/etc/os-release") {
            if let Some(line) = content.lines().find(|l| l.starts_with("VERSION_ID=")) {
                let version = line.trim_start_matches("VERSION_ID=").trim_matches('"');
                return format!("{}-{}", std::env::consts::OS, version);
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(version) = std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
        {
            return format!("{}-{}", std::env::consts::OS, version.trim());
        }
    }

    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// MAC addresses of physical-looking interfaces, read from sysfs on Linux.
///
/// Falls back to an empty list elsewhere; the remaining components still
/// give a stable per-machine fingerprint.
fn mac_addresses() -> Vec<String> {
    let mut macs = Vec::new();

    #[cfg(target_os = "linux")]
    {
        if let Ok(entries) = std::fs::read_dir("/sys/class/net") {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if EXCLUDED_INTERFACE_PREFIXES
                    .iter()
                    .any(|prefix| name.starts_with(prefix))
                {
                    continue;
                }

                if let Ok(address) = std::fs::read_to_string(entry.path().join("address")) {
                    let address = address.trim().to_string();
                    if !address.is_empty() && address != "00:00:00:00:00:00" {
                        macs.push(address);
                    }
                }
            }
        }
    }

    macs
}

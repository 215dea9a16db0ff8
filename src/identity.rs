use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result, anyhow};
use macaddr::MacAddr6;

const HOSTNAME_PATH: &str = "/proc/sys/kernel/hostname";
const NET_CLASS_DIR: &str = "/sys/class/net";

/// `{hostname}-{mac}` of this host.
pub fn resolve_sensor_id() -> Result<String> {
    let hostname = fs::read_to_string(HOSTNAME_PATH)
        .with_context(|| format!("failed to read hostname from {HOSTNAME_PATH}"))?;
    let mac = primary_mac(Path::new(NET_CLASS_DIR)).context("failed to find a MAC address")?;

    Ok(sensor_id(hostname.trim(), mac))
}

pub fn sensor_id(hostname: &str, mac: MacAddr6) -> String {
    format!("{hostname}-{mac}")
}

/// First interface, by name, that is not loopback and has a non-zero address.
pub fn primary_mac(net_class_dir: &Path) -> Result<MacAddr6> {
    let mut interfaces: Vec<String> = fs::read_dir(net_class_dir)
        .with_context(|| format!("failed to list {}", net_class_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name != "lo")
        .collect();
    interfaces.sort();

    interfaces
        .iter()
        .filter_map(|name| {
            let raw = fs::read_to_string(net_class_dir.join(name).join("address")).ok()?;
            raw.trim().parse::<MacAddr6>().ok()
        })
        .find(|mac| !mac.is_nil())
        .ok_or_else(|| anyhow!("no network interface with a MAC address"))
}

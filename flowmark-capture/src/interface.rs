//! Network interface enumeration
//!
//! Which interface to capture on is the caller's decision; this module only
//! answers what exists and resolves names.

use pnet_datalink::{self, NetworkInterface};
use std::net::IpAddr;

use flowmark_core::{Error, Result};

/// Information about a network interface
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    /// Interface name (e.g. "eth0")
    pub name: String,
    /// Human-readable description, where the platform provides one
    pub description: String,
    /// MAC address if available
    pub mac: Option<String>,
    /// IP addresses assigned to this interface
    pub ips: Vec<IpAddr>,
    /// Whether the interface is up
    pub is_up: bool,
    /// Whether the interface is a loopback
    pub is_loopback: bool,
}

impl From<&NetworkInterface> for InterfaceInfo {
    fn from(iface: &NetworkInterface) -> Self {
        InterfaceInfo {
            name: iface.name.clone(),
            description: iface.description.clone(),
            mac: iface.mac.map(|mac| mac.to_string()),
            ips: iface.ips.iter().map(|network| network.ip()).collect(),
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
        }
    }
}

impl InterfaceInfo {
    /// Whether the interface is a sensible capture target
    pub fn is_capture_capable(&self) -> bool {
        self.is_up && !self.is_loopback
    }
}

/// List all available network interfaces
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>> {
    let interfaces = pnet_datalink::interfaces();

    if interfaces.is_empty() {
        return Err(Error::capture(
            "no network interfaces found; are you running with sufficient privileges?",
        ));
    }

    Ok(interfaces.iter().map(InterfaceInfo::from).collect())
}

/// Look up a specific interface by name
pub fn get_interface(name: &str) -> Result<InterfaceInfo> {
    pnet_datalink::interfaces()
        .iter()
        .find(|iface| iface.name == name)
        .map(InterfaceInfo::from)
        .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
}

/// First up, non-loopback interface
pub fn default_interface() -> Result<InterfaceInfo> {
    list_interfaces()?
        .into_iter()
        .find(|iface| iface.is_capture_capable())
        .ok_or_else(|| Error::capture("no suitable default interface found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_interfaces() {
        let interfaces = list_interfaces().unwrap();
        assert!(!interfaces.is_empty());
        for iface in &interfaces {
            assert!(!iface.name.is_empty());
        }
    }

    #[test]
    fn test_get_nonexistent_interface() {
        let result = get_interface("nonexistent_interface_xyz");
        assert!(matches!(result, Err(Error::InterfaceNotFound(_))));
    }

    #[test]
    fn test_loopback_is_not_capture_capable() {
        let interfaces = list_interfaces().unwrap();
        for iface in interfaces.iter().filter(|iface| iface.is_loopback) {
            assert!(!iface.is_capture_capable());
        }
    }
}

//! Example: List all network interfaces
//!
//! Run with: cargo run --example list_interfaces

use flowmark_capture::{default_interface, list_interfaces};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Network Interfaces ===\n");

    for iface in list_interfaces()? {
        println!("Interface: {}", iface.name);
        if !iface.description.is_empty() {
            println!("  Description: {}", iface.description);
        }
        if let Some(ref mac) = iface.mac {
            println!("  MAC Address: {}", mac);
        }
        for ip in &iface.ips {
            println!("  IP: {}", ip);
        }
        println!("  Up: {}", iface.is_up);
        println!("  Loopback: {}", iface.is_loopback);
        println!("  Capture Capable: {}", iface.is_capture_capable());
        println!();
    }

    match default_interface() {
        Ok(iface) => println!("Default capture interface: {}", iface.name),
        Err(e) => println!("No default interface found: {}", e),
    }

    Ok(())
}

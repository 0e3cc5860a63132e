//! Capture filter construction for tagged test streams

/// Deepest VLAN nesting level covered by the ICMP exclusion
pub const MAX_VLAN_NESTING: usize = 4;

/// Build the receive-statistics capture filter.
///
/// Admits frames whose trailing four bytes equal the stream signature
/// magic. ICMP errors can quote a full copy of a tagged frame in their
/// payload and would otherwise be counted a second time, so ICMP is
/// excluded, bare and under up to [`MAX_VLAN_NESTING`] stacked VLAN tags.
/// Each `vlan` keyword shifts the BPF decode offset by one tag, which is
/// why the clause repeats verbatim once per nesting level.
pub fn rx_stats_filter(magic: u32) -> String {
    let mut filter = format!("(ether[len - 4:4] == 0x{:x})", magic);
    filter.push_str(" and not (icmp");
    for _ in 0..MAX_VLAN_NESTING {
        filter.push_str(" or (vlan and icmp)");
    }
    filter.push(')');
    filter
}

// =============================================================================
// stats.rs - Distributia Traficului pe Protocoale
// =============================================================================
//
// Contoare per protocol (pachete + bytes) si totaluri, alimentate de
// pipeline pentru fiecare pachet care trece de filtru. Folosite de linia
// periodica de statistici din terminal.
//
// =============================================================================

use crate::packet::{PacketRecord, Protocol};
use std::collections::BTreeMap;

/// Contoarele unui protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolCounter {
    pub packets: u64,
    pub bytes: u64,
}

/// NOTA RUST: `BTreeMap` (nu HashMap) - iterarea este in ordinea cheilor,
/// deci defalcarea pe protocoale se afiseaza mereu in aceeasi ordine.
#[derive(Debug, Clone)]
pub struct ProtocolDistribution {
    counters: BTreeMap<Protocol, ProtocolCounter>,
    total_packets: u64,
    total_bytes: u64,
}

impl Default for ProtocolDistribution {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolDistribution {
    pub fn new() -> Self {
        Self {
            counters: Protocol::ALL
                .iter()
                .map(|p| (*p, ProtocolCounter::default()))
                .collect(),
            total_packets: 0,
            total_bytes: 0,
        }
    }

    pub fn record(&mut self, packet: &PacketRecord) {
        let counter = self.counters.entry(packet.protocol()).or_default();
        counter.packets += 1;
        counter.bytes += u64::from(packet.size());
        self.total_packets += 1;
        self.total_bytes += u64::from(packet.size());
    }

    /// Procentul pachetelor unui protocol din total (0 daca nu exista trafic).
    pub fn percentage(&self, protocol: Protocol) -> f64 {
        if self.total_packets == 0 {
            return 0.0;
        }
        self.counter(protocol).packets as f64 / self.total_packets as f64 * 100.0
    }

    pub fn counter(&self, protocol: Protocol) -> ProtocolCounter {
        self.counters.get(&protocol).copied().unwrap_or_default()
    }

    /// Protocolul cu cele mai multe pachete. `None` fara trafic.
    ///
    /// La egalitate castiga protocolul declarat primul in enum.
    pub fn most_common(&self) -> Option<Protocol> {
        if self.total_packets == 0 {
            return None;
        }
        self.counters
            .iter()
            .rev()
            .max_by_key(|(_, counter)| counter.packets)
            .map(|(protocol, _)| *protocol)
    }

    /// Protocoalele cu trafic nenul, in ordinea enum-ului.
    pub fn breakdown(&self) -> Vec<(Protocol, ProtocolCounter)> {
        self.counters
            .iter()
            .filter(|(_, counter)| counter.packets > 0)
            .map(|(protocol, counter)| (*protocol, *counter))
            .collect()
    }

    pub fn total_packets(&self) -> u64 {
        self.total_packets
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Formateaza un numar de bytes: "512 B", "1.5 KB", "2 MB".
///
/// Unitatea creste cat timp valoarea este >= 1024; maxim doua zecimale,
/// zerourile finale sunt eliminate.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(protocol: Protocol, size: u32) -> PacketRecord {
        PacketRecord::new("p", "a", "b", 1024, 80, protocol, size, 0.0).unwrap()
    }

    #[test]
    fn test_empty_distribution() {
        let dist = ProtocolDistribution::new();
        assert_eq!(dist.total_packets(), 0);
        assert_eq!(dist.percentage(Protocol::Http), 0.0);
        assert_eq!(dist.most_common(), None);
        assert!(dist.breakdown().is_empty());
    }

    #[test]
    fn test_record_and_percentages() {
        let mut dist = ProtocolDistribution::new();
        dist.record(&packet(Protocol::Https, 1000));
        dist.record(&packet(Protocol::Https, 500));
        dist.record(&packet(Protocol::Dns, 100));
        dist.record(&packet(Protocol::Tcp, 64));

        assert_eq!(dist.total_packets(), 4);
        assert_eq!(dist.total_bytes(), 1664);
        assert_eq!(dist.percentage(Protocol::Https), 50.0);
        assert_eq!(dist.counter(Protocol::Https).bytes, 1500);
        assert_eq!(dist.most_common(), Some(Protocol::Https));
        assert_eq!(
            dist.breakdown().iter().map(|(p, _)| *p).collect::<Vec<_>>(),
            vec![Protocol::Https, Protocol::Dns, Protocol::Tcp]
        );
    }

    #[test]
    fn test_most_common_tie_prefers_declaration_order() {
        let mut dist = ProtocolDistribution::new();
        dist.record(&packet(Protocol::Udp, 1));
        dist.record(&packet(Protocol::Http, 1));
        assert_eq!(dist.most_common(), Some(Protocol::Http));
    }

    #[test]
    fn test_reset() {
        let mut dist = ProtocolDistribution::new();
        dist.record(&packet(Protocol::Ssh, 10));
        dist.reset();
        assert_eq!(dist.total_packets(), 0);
        assert_eq!(dist.total_bytes(), 0);
        assert_eq!(dist.counter(Protocol::Ssh), ProtocolCounter::default());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10 MB");
        assert_eq!(format_bytes(1_288_490_189), "1.2 GB");
    }
}

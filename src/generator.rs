// =============================================================================
// generator.rs - Generator de Trafic Sintetic
// =============================================================================
//
// Sursa de PacketRecord-uri pentru simulare:
//   - pachete aleatoare (IP-uri din pool, protocol ponderat, marime in interval)
//   - cu probabilitatea `anomaly_probability`, pachete anormale
//     (foarte mari, protocol Unknown, sau "rapid fire" obisnuit)
//   - rafale de la o singura sursa (declanseaza DDoS / Port Scan)
//   - trafic "normal" (doar HTTP, HTTPS, DNS, TCP)
//
// NOTA RUST: `StdRng` + `SeedableRng::seed_from_u64` da secvente
// reproductibile - testele si demo-urile pot fixa seed-ul din config.
//
// =============================================================================

use crate::config::SimulationConfig;
use crate::packet::{PacketError, PacketRecord, Protocol};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Intervalul porturilor efemere (sursa si destinatie fara port standard).
const EPHEMERAL_PORTS: std::ops::Range<u16> = 1024..65535;

/// Marimea pachetelor anormal de mari.
const LARGE_PACKET_SIZES: std::ops::Range<u32> = 5_000..15_000;

const NORMAL_PROTOCOLS: [Protocol; 4] = [
    Protocol::Http,
    Protocol::Https,
    Protocol::Dns,
    Protocol::Tcp,
];

pub struct SampleGenerator {
    rng: StdRng,
    ips: Vec<String>,
    anomaly_probability: f64,
    min_packet_size: u32,
    max_packet_size: u32,
    packet_count: u64,
    next_id: u64,
}

impl SampleGenerator {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng,
            ips: config
                .sample_ips
                .iter()
                .map(|ip| ip.trim().to_string())
                .filter(|ip| !ip.is_empty())
                .collect(),
            anomaly_probability: config.anomaly_probability,
            min_packet_size: config.min_packet_size,
            max_packet_size: config.max_packet_size,
            packet_count: 0,
            next_id: 0,
        }
    }

    /// Pachet aleator; ocazional anormal. Singurul care incrementeaza
    /// `packet_count`.
    pub fn random_packet(&mut self, now: f64) -> Result<PacketRecord, PacketError> {
        let (source, destination) = self.distinct_pair();

        let packet = if self.rng.gen::<f64>() < self.anomaly_probability {
            self.anomalous_packet(source, destination, now)?
        } else {
            let protocol = self.random_protocol();
            let size = self.random_size();
            self.build(source, destination, protocol, size, now)?
        };

        self.packet_count += 1;
        Ok(packet)
    }

    /// Pachet cu caracteristici anormale (una din trei variante).
    fn anomalous_packet(
        &mut self,
        source: String,
        destination: String,
        now: f64,
    ) -> Result<PacketRecord, PacketError> {
        match self.rng.gen_range(0..3) {
            0 => {
                let protocol = self.random_protocol();
                let size = self.rng.gen_range(LARGE_PACKET_SIZES);
                self.build(source, destination, protocol, size, now)
            }
            1 => {
                let size = self.random_size();
                self.build(source, destination, Protocol::Unknown, size, now)
            }
            // "Rapid fire" - pachet obisnuit; detectia vine din volum.
            _ => {
                let protocol = self.random_protocol();
                let size = self.random_size();
                self.build(source, destination, protocol, size, now)
            }
        }
    }

    /// Rafala de `count` pachete de la aceeasi sursa catre destinatii aleatoare.
    pub fn burst(
        &mut self,
        count: usize,
        source: Option<&str>,
        now: f64,
    ) -> Result<Vec<PacketRecord>, PacketError> {
        let source = match source {
            Some(ip) => ip.to_string(),
            None => self.random_ip(),
        };

        (0..count)
            .map(|_| {
                let destination = self.random_ip_except(&source);
                let protocol = self.random_protocol();
                let size = self.random_size();
                self.build(source.clone(), destination, protocol, size, now)
            })
            .collect()
    }

    /// Trafic obisnuit: doar protocoalele comune, marime normala.
    pub fn normal_packet(&mut self, now: f64) -> Result<PacketRecord, PacketError> {
        let (source, destination) = self.distinct_pair();
        let protocol = NORMAL_PROTOCOLS[self.rng.gen_range(0..NORMAL_PROTOCOLS.len())];
        let size = self.random_size();
        self.build(source, destination, protocol, size, now)
    }

    /// Pachetele produse de `random_packet` (rafalele si traficul normal
    /// nu sunt numarate).
    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    pub fn reset_count(&mut self) {
        self.packet_count = 0;
    }

    fn build(
        &mut self,
        source: String,
        destination: String,
        protocol: Protocol,
        size: u32,
        now: f64,
    ) -> Result<PacketRecord, PacketError> {
        let source_port = self.rng.gen_range(EPHEMERAL_PORTS);
        let destination_port = match protocol.default_port() {
            Some(port) => port,
            None => self.rng.gen_range(EPHEMERAL_PORTS),
        };

        self.next_id += 1;
        PacketRecord::new(
            format!("pkt-{:08}", self.next_id),
            source,
            destination,
            source_port,
            destination_port,
            protocol,
            size,
            now,
        )
    }

    fn distinct_pair(&mut self) -> (String, String) {
        let source = self.random_ip();
        let destination = self.random_ip_except(&source);
        (source, destination)
    }

    fn random_ip(&mut self) -> String {
        self.ips[self.rng.gen_range(0..self.ips.len())].clone()
    }

    /// IP aleator diferit de `exclude`. Daca pool-ul nu are alta adresa,
    /// returneaza chiar `exclude` (config-ul validat cere minim 2 adrese).
    fn random_ip_except(&mut self, exclude: &str) -> String {
        let candidates: Vec<&String> = self.ips.iter().filter(|ip| *ip != exclude).collect();
        if candidates.is_empty() {
            return exclude.to_string();
        }
        candidates[self.rng.gen_range(0..candidates.len())].clone()
    }

    fn random_size(&mut self) -> u32 {
        self.rng.gen_range(self.min_packet_size..self.max_packet_size)
    }

    fn random_protocol(&mut self) -> Protocol {
        pick_protocol(self.rng.gen::<f64>())
    }
}

/// Alege protocolul dupa o valoare uniforma in [0, 1).
///
/// HTTPS 30%, HTTP 20%, DNS/TCP/UDP cate 10%, SSH/FTP/SMTP cate 5%,
/// ICMP 3%, Unknown 2%.
fn pick_protocol(roll: f64) -> Protocol {
    const WEIGHTS: [(f64, Protocol); 9] = [
        (0.30, Protocol::Https),
        (0.50, Protocol::Http),
        (0.60, Protocol::Dns),
        (0.70, Protocol::Tcp),
        (0.80, Protocol::Udp),
        (0.85, Protocol::Ssh),
        (0.90, Protocol::Ftp),
        (0.95, Protocol::Smtp),
        (0.98, Protocol::Icmp),
    ];

    WEIGHTS
        .iter()
        .find(|(limit, _)| roll < *limit)
        .map(|(_, protocol)| *protocol)
        .unwrap_or(Protocol::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(anomaly_probability: f64) -> SampleGenerator {
        let config = SimulationConfig {
            seed: Some(7),
            anomaly_probability,
            ..SimulationConfig::default()
        };
        SampleGenerator::new(&config)
    }

    #[test]
    fn test_pick_protocol_weights() {
        assert_eq!(pick_protocol(0.0), Protocol::Https);
        assert_eq!(pick_protocol(0.29), Protocol::Https);
        assert_eq!(pick_protocol(0.30), Protocol::Http);
        assert_eq!(pick_protocol(0.65), Protocol::Tcp);
        assert_eq!(pick_protocol(0.97), Protocol::Icmp);
        assert_eq!(pick_protocol(0.98), Protocol::Unknown);
        assert_eq!(pick_protocol(0.999), Protocol::Unknown);
    }

    #[test]
    fn test_random_packets_are_well_formed() {
        let mut generator = seeded(0.0);
        for i in 0..200 {
            let packet = generator.random_packet(i as f64).unwrap();
            assert_ne!(packet.source(), packet.destination());
            assert!((64..1500).contains(&packet.size()));
            assert!(packet.source_port() >= 1024);
            if let Some(port) = packet.protocol().default_port() {
                assert_eq!(packet.destination_port(), port);
            }
            assert!(!packet.is_anomaly());
        }
        assert_eq!(generator.packet_count(), 200);
    }

    #[test]
    fn test_ids_are_unique_across_reset() {
        let mut generator = seeded(0.0);
        let first = generator.random_packet(0.0).unwrap();
        generator.reset_count();
        assert_eq!(generator.packet_count(), 0);
        let second = generator.random_packet(0.0).unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_anomalous_packets_shape() {
        let mut generator = seeded(1.0);
        let mut saw_large = false;
        let mut saw_unknown = false;
        for _ in 0..300 {
            let packet = generator.random_packet(0.0).unwrap();
            if packet.size() >= 5_000 {
                assert!(packet.size() < 15_000);
                saw_large = true;
            }
            if packet.protocol() == Protocol::Unknown {
                saw_unknown = true;
            }
        }
        assert!(saw_large);
        assert!(saw_unknown);
    }

    #[test]
    fn test_burst_from_single_source() {
        let mut generator = seeded(0.0);
        let burst = generator.burst(60, Some("10.0.0.50"), 3.0).unwrap();
        assert_eq!(burst.len(), 60);
        assert!(burst.iter().all(|p| p.source() == "10.0.0.50"));
        assert!(burst.iter().all(|p| p.destination() != "10.0.0.50"));
        assert!(burst.iter().all(|p| p.timestamp() == 3.0));
    }

    #[test]
    fn test_only_random_packets_are_counted() {
        let mut generator = seeded(0.5);
        generator.random_packet(0.0).unwrap();
        generator.burst(60, None, 0.0).unwrap();
        generator.normal_packet(0.0).unwrap();
        generator.random_packet(0.0).unwrap();
        assert_eq!(generator.packet_count(), 2);
    }

    #[test]
    fn test_normal_packets_use_common_protocols() {
        let mut generator = seeded(1.0);
        for _ in 0..100 {
            let packet = generator.normal_packet(0.0).unwrap();
            assert!(NORMAL_PROTOCOLS.contains(&packet.protocol()));
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = seeded(0.1);
        let mut b = seeded(0.1);
        for _ in 0..50 {
            let (pa, pb) = (a.random_packet(1.0).unwrap(), b.random_packet(1.0).unwrap());
            assert_eq!(pa, pb);
        }
    }
}

// =============================================================================
// pipeline.rs - Conducta de Procesare a Pachetelor
// =============================================================================
//
// Apelantul celor doua componente de baza. Pentru fiecare pachet:
//   1. Filtrul de protocol (pachetele filtrate nu sunt nici clasificate,
//      nici animate)
//   2. Clasificare (istoric per sursa, euristici, notificari)
//   3. Statistici per protocol
//   4. Filtrul "doar anomalii" (dupa clasificare, inainte de noduri)
//   5. Contoare per nod + admitere in managerul de fluxuri
//
// Asezarea nodurilor in spatiu este minimala: fiecare adresa noua primeste
// urmatorul loc pe un cerc (si pe cercuri concentrice dupa ce primul se
// umple). Geometria reala a vizualizarii este in afara nucleului.
//
// =============================================================================

use crate::classifier::{Classification, TrafficClassifier};
use crate::config::AppConfig;
use crate::flow::{FlowManager, TickSummary, Vec3, VisualHandle};
use crate::packet::{PacketRecord, Protocol};
use crate::stats::ProtocolDistribution;
use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;
use std::sync::Arc;

/// Fabrica de reprezentari vizuale pentru pachetele admise.
pub type VisualFactory = Box<dyn Fn(&PacketRecord, Vec3) -> Box<dyn VisualHandle>>;

/// Un nod (adresa IP) al retelei vizualizate.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub address: String,
    pub position: Vec3,
    pub packets_sent: u64,
    pub packets_received: u64,
    /// Setat cand nodul a fost sursa unui pachet anormal. Nu se reseteaza.
    pub suspicious: bool,
}

/// Instantaneu pentru linia periodica de statistici.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub total_packets: u64,
    pub total_bytes: u64,
    pub active_flows: usize,
    pub overflow: usize,
    pub dropped: u64,
    pub anomalies: usize,
    /// Anomaliile din ultimele `recent_window` secunde.
    pub recent_anomalies: usize,
    pub tracked_sources: usize,
    pub suspicious_nodes: usize,
    /// (protocol, pachete, bytes, procent)
    pub breakdown: Vec<(Protocol, u64, u64, f64)>,
}

pub struct Pipeline {
    classifier: Arc<TrafficClassifier>,
    flows: FlowManager,
    stats: ProtocolDistribution,
    nodes: HashMap<String, Node>,
    enabled_protocols: Option<HashSet<Protocol>>,
    anomalies_only: bool,
    ring_slots: usize,
    node_radius: f64,
    visual_factory: Option<VisualFactory>,
}

impl Pipeline {
    pub fn new(config: &AppConfig, classifier: Arc<TrafficClassifier>) -> Self {
        Self {
            classifier,
            flows: FlowManager::new(config.flow.clone()),
            stats: ProtocolDistribution::new(),
            nodes: HashMap::new(),
            enabled_protocols: config.filter.enabled_protocols(),
            anomalies_only: config.filter.anomalies_only,
            ring_slots: config.simulation.sample_ips.len().max(1),
            node_radius: config.simulation.node_radius,
            visual_factory: None,
        }
    }

    /// Ataseaza o reprezentare vizuala fiecarui flux admis de acum inainte.
    pub fn with_visuals(mut self, factory: VisualFactory) -> Self {
        self.visual_factory = Some(factory);
        self
    }

    /// Proceseaza un pachet. `None` daca protocolul este filtrat.
    pub fn process_packet(&mut self, mut packet: PacketRecord) -> Option<Classification> {
        if let Some(enabled) = &self.enabled_protocols {
            if !enabled.contains(&packet.protocol()) {
                return None;
            }
        }

        let classification = self.classifier.classify(&mut packet);
        self.stats.record(&packet);

        // Pachetele ascunse nu creeaza noduri si nu ating contoarele lor.
        if self.anomalies_only && !packet.is_anomaly() {
            return Some(classification);
        }

        let source_pos = {
            let node = self.node_entry(packet.source());
            node.packets_sent += 1;
            if packet.is_anomaly() {
                node.suspicious = true;
            }
            node.position
        };
        let destination_pos = {
            let node = self.node_entry(packet.destination());
            node.packets_received += 1;
            node.position
        };

        let visual = self
            .visual_factory
            .as_ref()
            .map(|factory| factory(&packet, source_pos));
        self.flows.admit(packet, source_pos, destination_pos, visual);

        Some(classification)
    }

    /// Un cadru de animatie.
    pub fn tick(&mut self, delta_time: f64) -> TickSummary {
        self.flows.tick(delta_time)
    }

    fn node_entry(&mut self, address: &str) -> &mut Node {
        let position = self.ring_position(self.nodes.len());
        self.nodes
            .entry(address.to_string())
            .or_insert_with(|| Node {
                address: address.to_string(),
                position,
                packets_sent: 0,
                packets_received: 0,
                suspicious: false,
            })
    }

    /// Pozitia celui de-al `index`-lea nod: `ring_slots` locuri pe cerc,
    /// apoi cercuri concentrice cu raza crescatoare.
    fn ring_position(&self, index: usize) -> Vec3 {
        let ring = index / self.ring_slots;
        let slot = index % self.ring_slots;
        let radius = self.node_radius * (1 + ring) as f64;
        let angle = TAU * slot as f64 / self.ring_slots as f64;
        Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
    }

    pub fn classifier(&self) -> &Arc<TrafficClassifier> {
        &self.classifier
    }

    pub fn flows(&self) -> &FlowManager {
        &self.flows
    }

    pub fn flows_mut(&mut self) -> &mut FlowManager {
        &mut self.flows
    }

    pub fn stats(&self) -> &ProtocolDistribution {
        &self.stats
    }

    pub fn node(&self, address: &str) -> Option<&Node> {
        self.nodes.get(address)
    }

    /// Sterge statisticile de protocol (nodurile si fluxurile raman).
    pub fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    pub fn snapshot(&self, now: f64, recent_window: f64) -> StatsSnapshot {
        StatsSnapshot {
            total_packets: self.stats.total_packets(),
            total_bytes: self.stats.total_bytes(),
            active_flows: self.flows.active_count(),
            overflow: self.flows.overflow_len(),
            dropped: self.flows.dropped_count(),
            anomalies: self.classifier.total_anomaly_count(),
            recent_anomalies: self.classifier.recent_anomalies(now, recent_window).len(),
            tracked_sources: self.classifier.tracked_sources(),
            suspicious_nodes: self.nodes.values().filter(|n| n.suspicious).count(),
            breakdown: self
                .stats
                .breakdown()
                .into_iter()
                .map(|(protocol, counter)| {
                    (
                        protocol,
                        counter.packets,
                        counter.bytes,
                        self.stats.percentage(protocol),
                    )
                })
                .collect(),
        }
    }
}

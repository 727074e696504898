// =============================================================================
// classifier.rs - Motorul de Clasificare a Traficului
// =============================================================================
//
// Acest modul implementeaza logica centrala de detectie:
//   1. Inregistreaza fiecare pachet (IP sursa + port destinatie + timestamp)
//   2. Port Scan:  > N porturi destinatie unice accesate de o sursa
//   3. DDoS:       > M pachete de la aceeasi sursa in fereastra de T secunde
//   4. Oversized:  pachet mai mare decat pragul configurat (fara stare)
//   5. Jurnalizeaza anomaliile si notifica observatorii, sincron
//   6. Curata periodic istoricul vechi (prune, apelat din exterior)
//
// CONCEPTE RUST EXPLICATE:
//
// 1. DOUA DashMap-uri SEPARATE
//    `history` (observatii cu timestamp) si `ports` (set de porturi unice)
//    sunt tinute separat intentionat: prune() goleste si sterge intrari din
//    `history`, dar setul de porturi este CUMULATIV - supravietuieste
//    curatarii. Daca ar fi fost in aceeasi intrare, stergerea sursei ar fi
//    sters si marcajul de Port Scan.
//
// 2. INTERIOR MUTABILITY
//    Toate metodele publice primesc `&self`. DashMap (lock per shard) si
//    parking_lot::Mutex/RwLock permit modificari prin referinta shared,
//    deci `Arc<TrafficClassifier>` poate fi folosit simultan din bucla de
//    ingestie si din task-ul de prune.
//
// 3. NOTIFICARE SINCRONA, FARA LOCK-URI TINUTE
//    Observatorii sunt apelati in interiorul lui classify(), in ordinea
//    inregistrarii, DUPA ce toate guard-urile DashMap / jurnal au fost
//    eliberate. Un observator NU trebuie sa apeleze inapoi clasificatorul
//    (lista de observatori este tinuta sub read-lock pe durata notificarii).
//
// =============================================================================

use crate::config::DetectionConfig;
use crate::packet::PacketRecord;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashSet, VecDeque};

// =============================================================================
// Structuri de date
// =============================================================================

/// Rezultatul clasificarii unui pachet.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub is_anomalous: bool,
    /// Motivele declansate, separate prin "; ". Gol daca pachetul e normal.
    pub reasons: String,
}

impl Classification {
    fn normal() -> Self {
        Self {
            is_anomalous: false,
            reasons: String::new(),
        }
    }
}

/// Anomalie detectata - intrare imutabila in jurnal.
///
/// `packet` este un snapshot al pachetului DUPA marcare (flag + motiv setate).
#[derive(Debug, Clone)]
pub struct AnomalyEvent {
    pub packet: PacketRecord,
    pub detected_at: f64,
    pub reason: String,
}

/// Observator de anomalii.
///
/// NOTA RUST: `Send + Sync` deoarece clasificatorul poate fi partajat intre
/// task-uri tokio prin Arc.
pub type AnomalyObserver = Box<dyn Fn(&AnomalyEvent) + Send + Sync>;

/// O observatie: momentul si portul destinatie.
struct Observation {
    seen_at: f64,
    port: u16,
}

/// Jurnalul de anomalii cu retentie limitata.
///
/// `total` numara TOATE anomaliile detectate, inclusiv cele evacuate din
/// jurnal cand capacitatea a fost atinsa.
struct AnomalyLog {
    events: VecDeque<AnomalyEvent>,
    capacity: usize,
    total: usize,
}

impl AnomalyLog {
    fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity,
            total: 0,
        }
    }

    fn push(&mut self, event: AnomalyEvent) {
        if self.capacity > 0 && self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.total += 1;
    }
}

// =============================================================================
// TrafficClassifier
// =============================================================================

/// Clasificatorul de trafic: euristici Port Scan / DDoS / Oversized.
pub struct TrafficClassifier {
    /// Observatii (timestamp, port) per IP sursa, in ordinea sosirii.
    history: DashMap<String, VecDeque<Observation>>,

    /// Porturile destinatie unice accesate de fiecare sursa.
    /// Cumulativ (nu este atins de prune) cand `cumulative_port_tracking`.
    ports: DashMap<String, HashSet<u16>>,

    log: Mutex<AnomalyLog>,

    observers: RwLock<Vec<AnomalyObserver>>,

    config: DetectionConfig,
}

impl TrafficClassifier {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            history: DashMap::new(),
            ports: DashMap::new(),
            log: Mutex::new(AnomalyLog::new(config.max_logged_anomalies)),
            observers: RwLock::new(Vec::new()),
            config,
        }
    }

    /// Inregistreaza un observator. Observatorii sunt apelati in ordinea
    /// inregistrarii, sincron, din interiorul lui `classify()`.
    ///
    /// Un observator nu trebuie sa apeleze `subscribe()`: lista este
    /// blocata pentru citire pe durata notificarii.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&AnomalyEvent) + Send + Sync + 'static,
    {
        self.observers.write().push(Box::new(observer));
    }

    /// Clasifica un pachet si actualizeaza istoricul sursei.
    ///
    /// Timestamp-ul pachetului este folosit ca "acum" pentru fereastra DDoS.
    /// Euristicile sunt evaluate toate, in ordine fixa; motivele declansate
    /// se concateneaza cu "; " in aceeasi ordine.
    pub fn classify(&self, packet: &mut PacketRecord) -> Classification {
        let now = packet.timestamp();
        let source = packet.source().to_string();
        let port = packet.destination_port();

        // --- 1. Inregistram observatia ---
        //
        // Blocurile `{}` elibereaza RefMut-ul (write-lock pe shard) inainte
        // de citirile din detect_*() pe aceeasi cheie.
        {
            let mut observations = self.history.entry(source.clone()).or_default();
            observations.push_back(Observation { seen_at: now, port });
        }
        {
            let mut seen_ports = self.ports.entry(source.clone()).or_default();
            seen_ports.insert(port);
        }

        // --- 2. Evaluam euristicile ---
        let mut reasons: Vec<String> = Vec::with_capacity(3);

        if let Some(reason) = self.detect_port_scan(&source) {
            reasons.push(reason);
        }
        if let Some(reason) = self.detect_ddos(&source, now) {
            reasons.push(reason);
        }
        if packet.size() > self.config.unusual_packet_size {
            reasons.push("Unusually large packet".to_string());
        }

        if reasons.is_empty() {
            return Classification::normal();
        }

        // --- 3. Marcam pachetul, jurnalizam, notificam ---
        let reason = reasons.join("; ");
        if !packet.mark_anomalous(reason.clone()) {
            tracing::debug!(packet = packet.id(), "Pachet deja marcat, motivul initial pastrat");
        }

        let event = AnomalyEvent {
            packet: packet.clone(),
            detected_at: now,
            reason: reason.clone(),
        };

        tracing::debug!(source = %source, reason = %reason, "Anomalie detectata");

        self.log.lock().push(event.clone());

        for observer in self.observers.read().iter() {
            observer(&event);
        }

        Classification {
            is_anomalous: true,
            reasons: reason,
        }
    }

    /// Port Scan: numarul de porturi unice ever-seen depaseste pragul.
    fn detect_port_scan(&self, source: &str) -> Option<String> {
        let unique_ports = self.ports.get(source)?.len();
        if unique_ports > self.config.port_scan_threshold {
            Some(format!(
                "Port scan detected: {} unique ports accessed",
                unique_ports
            ))
        } else {
            None
        }
    }

    /// DDoS: numarul de observatii din fereastra [now - T, now] depaseste pragul.
    ///
    /// Recalculat la fiecare apel, O(marimea istoricului). Istoricul este
    /// limitat de prune() la 2T, dar intre doua prune-uri o rafala mare
    /// face costul total patratic in marimea rafalei.
    fn detect_ddos(&self, source: &str, now: f64) -> Option<String> {
        let window = self.config.time_window_secs;
        let recent = self
            .history
            .get(source)?
            .iter()
            .filter(|obs| now - obs.seen_at <= window)
            .count();

        if recent > self.config.ddos_threshold {
            Some(format!("Potential DDoS: {} packets in {}s", recent, window))
        } else {
            None
        }
    }

    /// Sterge observatiile mai vechi de 2x fereastra si sursele ramase goale.
    ///
    /// Idempotent: doua apeluri consecutive cu acelasi `now` lasa aceeasi
    /// stare ca unul singur. Returneaza numarul de surse eliminate.
    ///
    /// NOTA RUST: `DashMap::retain` filtreaza in-place, shard cu shard; o
    /// intrare pentru care closure-ul returneaza `false` este dropata.
    pub fn prune(&self, now: f64) -> usize {
        let cutoff = now - self.config.time_window_secs * 2.0;
        let before = self.history.len();

        self.history.retain(|_, observations| {
            observations.retain(|obs| obs.seen_at > cutoff);
            !observations.is_empty()
        });

        // Setul de porturi urmeaza istoricul doar in modul ferestruit.
        // Accesarea altui DashMap din closure este sigura: shard-uri si
        // lock-uri separate.
        if !self.config.cumulative_port_tracking {
            self.ports.retain(|source, seen_ports| match self.history.get(source) {
                Some(observations) => {
                    *seen_ports = observations.iter().map(|obs| obs.port).collect();
                    true
                }
                None => false,
            });
        }

        before.saturating_sub(self.history.len())
    }

    /// Anomaliile detectate in ultimele `seconds` secunde (cele mai vechi
    /// primele). Nu modifica jurnalul.
    pub fn recent_anomalies(&self, now: f64, seconds: f64) -> Vec<AnomalyEvent> {
        let cutoff = now - seconds;
        self.log
            .lock()
            .events
            .iter()
            .filter(|event| event.detected_at > cutoff)
            .cloned()
            .collect()
    }

    /// Numarul total de anomalii detectate de la pornire.
    pub fn total_anomaly_count(&self) -> usize {
        self.log.lock().total
    }

    /// Numarul de surse cu istoric activ (nu inca curatat).
    pub fn tracked_sources(&self) -> usize {
        self.history.len()
    }
}

// =============================================================================
// config.rs - Modul de Configurare
// =============================================================================
//
// CONCEPTE RUST EXPLICATE:
//
// 1. DERIVE MACROS (#[derive(...)])
//    #[derive(Debug, Clone, Deserialize)] genereaza la compile-time:
//      - Debug:       printare cu {:?}
//      - Clone:       duplicare cu .clone() (sub-sectiunile sunt clonate
//                     catre clasificator / managerul de fluxuri)
//      - Deserialize: serde populeaza structura din TOML
//
// 2. #[serde(default)]
//    Fiecare sectiune are un `impl Default` cu valorile implicite ale
//    vizualizatorului. Un config.toml partial (sau gol) este valid: cheile
//    lipsa primesc valoarea din Default, nu o eroare de parsare.
//
// 3. VALIDARE POST-DESERIALIZARE
//    serde verifica doar tipurile. AppConfig::validate() verifica semantica
//    (praguri zero, ferestre negative, intervale inversate, protocoale
//    necunoscute) si raporteaza TOATE erorile simultan.
//
// =============================================================================

use crate::packet::Protocol;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Structura principala de configurare a aplicatiei.
///
/// Fiecare camp corespunde unei sectiuni din `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub flow: FlowConfig,
    pub simulation: SimulationConfig,
    pub filter: FilterConfig,
    pub cleanup: CleanupConfig,
    pub display: DisplayConfig,
}

/// Pragurile euristicilor de anomalie.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Numar de porturi destinatie unice peste care sursa e marcata Port Scan.
    pub port_scan_threshold: usize,
    /// Fereastra de timp (secunde) pentru numararea pachetelor DDoS.
    /// Istoricul este pastrat 2x fereastra inainte de prune.
    pub time_window_secs: f64,
    /// Numar de pachete in fereastra peste care sursa e marcata DDoS.
    pub ddos_threshold: usize,
    /// Marimea (bytes) peste care un pachet este "neobisnuit de mare".
    pub unusual_packet_size: u32,
    /// `true`: setul de porturi per sursa nu se curata niciodata (marcaj
    /// permanent). `false`: setul urmeaza istoricul curatat de prune.
    pub cumulative_port_tracking: bool,
    /// Capacitatea jurnalului de anomalii (0 = nelimitat).
    pub max_logged_anomalies: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            port_scan_threshold: 10,
            time_window_secs: 5.0,
            ddos_threshold: 50,
            unusual_packet_size: 10_000,
            cumulative_port_tracking: true,
            max_logged_anomalies: 10_000,
        }
    }
}

/// Ce se intampla cu pachetele din coada de overflow cand se elibereaza loc.
///
/// NOTA RUST: `rename_all = "lowercase"` mapeaza `Resume` <-> "resume" in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Pachetul este re-admis ca flux nou, cu pozitiile memorate la admitere.
    Resume,
    /// Pachetul este aruncat; aruncarea este numarata.
    Drop,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Viteza de deplasare (unitati de spatiu pe secunda).
    pub packet_speed: f64,
    /// Capacitatea setului de fluxuri active.
    pub max_active_packets: usize,
    /// Durata maxima de viata a unui flux (secunde).
    pub packet_lifetime_secs: f64,
    /// Distanta minima folosita la calculul progresului (capete identice).
    pub min_distance: f64,
    pub overflow_policy: OverflowPolicy,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            packet_speed: 5.0,
            max_active_packets: 100,
            packet_lifetime_secs: 10.0,
            min_distance: 0.1,
            overflow_policy: OverflowPolicy::Resume,
        }
    }
}

/// Parametrii generatorului de trafic sintetic si ai buclei de simulare.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Interval intre doua pachete generate (milisecunde).
    pub packet_interval_ms: u64,
    /// Frecventa tick-urilor de animatie (cadre pe secunda).
    pub frame_rate_hz: u32,
    /// Probabilitatea ca un pachet generat sa fie anormal.
    pub anomaly_probability: f64,
    pub min_packet_size: u32,
    pub max_packet_size: u32,
    /// Pool-ul de adrese IP folosit de generator.
    pub sample_ips: Vec<String>,
    /// Durata simularii in secunde (0 = pana la Ctrl+C).
    pub duration_secs: u64,
    /// La fiecare N secunde se genereaza o rafala de la o singura sursa
    /// (0 = fara rafale).
    pub burst_interval_secs: u64,
    pub burst_size: usize,
    /// Seed pentru generator (None = entropie de la OS).
    pub seed: Option<u64>,
    /// Raza cercului pe care sunt asezate nodurile.
    pub node_radius: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            packet_interval_ms: 500,
            frame_rate_hz: 60,
            anomaly_probability: 0.1,
            min_packet_size: 64,
            max_packet_size: 1500,
            sample_ips: [
                "192.168.1.100",
                "192.168.1.101",
                "192.168.1.102",
                "10.0.0.50",
                "10.0.0.51",
                "172.16.0.10",
                "172.16.0.11",
                "8.8.8.8",
                "1.1.1.1",
                "203.0.113.5",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            duration_secs: 0,
            burst_interval_secs: 15,
            burst_size: 60,
            seed: None,
            node_radius: 10.0,
        }
    }
}

/// Filtrul aplicat de apelant inainte de clasificare / animatie.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Protocoalele afisate. Lista goala = toate.
    pub protocols: Vec<String>,
    /// Doar pachetele marcate ca anomalii sunt animate.
    pub anomalies_only: bool,
}

impl FilterConfig {
    /// Setul de protocoale permise. `None` = toate sunt permise.
    ///
    /// Numele necunoscute sunt ignorate aici; validate() le raporteaza.
    pub fn enabled_protocols(&self) -> Option<HashSet<Protocol>> {
        if self.protocols.is_empty() {
            return None;
        }
        Some(
            self.protocols
                .iter()
                .filter_map(|name| Protocol::from_name(name))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Interval intre doua apeluri prune() ale clasificatorului (ms).
    pub interval_ms: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self { interval_ms: 100 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Interval intre doua linii de statistici (secunde).
    pub stats_interval_secs: u64,
    /// Afiseaza fiecare pachet procesat.
    pub show_packets: bool,
    /// Nivel de detaliu suplimentar in terminal (fluxuri, overflow).
    pub debug: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            stats_interval_secs: 5,
            show_packets: false,
            debug: false,
        }
    }
}

impl AppConfig {
    /// Incarca si parseaza fisierul de configurare TOML.
    ///
    /// NOTA RUST: `P: AsRef<Path>` accepta String, &str, PathBuf, &Path.
    /// `.with_context()` adauga un mesaj descriptiv erorii propagate cu `?`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Nu pot citi fisierul: {:?}", path.as_ref()))?;

        Self::parse(&content)
    }

    /// Parseaza si valideaza continutul unui config.toml.
    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).context("Eroare la parsarea fisierului TOML")?;

        config.validate()?;

        Ok(config)
    }

    /// Valideaza constrangerile semantice ale configuratiei.
    ///
    /// Toate erorile sunt colectate inainte de a esua - utilizatorul vede
    /// dintr-o singura rulare tot ce trebuie corectat.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // --- Detection ---

        let det = &self.detection;
        if det.port_scan_threshold == 0 {
            errors.push(
                "detection.port_scan_threshold = 0: orice pachet va declansa alerta Port Scan"
                    .to_string(),
            );
        }
        if det.ddos_threshold == 0 {
            errors.push(
                "detection.ddos_threshold = 0: orice pachet va declansa alerta DDoS".to_string(),
            );
        }
        if !(det.time_window_secs.is_finite() && det.time_window_secs > 0.0) {
            errors.push(format!(
                "detection.time_window_secs = {}: fereastra de timp trebuie sa fie pozitiva",
                det.time_window_secs
            ));
        }
        if det.unusual_packet_size == 0 {
            errors.push(
                "detection.unusual_packet_size = 0: orice pachet va fi considerat prea mare"
                    .to_string(),
            );
        }

        // --- Flow ---

        let flow = &self.flow;
        if flow.max_active_packets == 0 {
            errors.push(
                "flow.max_active_packets = 0: niciun pachet nu ar putea fi animat".to_string(),
            );
        }
        if !(flow.packet_speed.is_finite() && flow.packet_speed > 0.0) {
            errors.push(format!(
                "flow.packet_speed = {}: viteza trebuie sa fie pozitiva",
                flow.packet_speed
            ));
        }
        if !(flow.packet_lifetime_secs.is_finite() && flow.packet_lifetime_secs > 0.0) {
            errors.push(format!(
                "flow.packet_lifetime_secs = {}: durata de viata trebuie sa fie pozitiva",
                flow.packet_lifetime_secs
            ));
        }
        if !(flow.min_distance.is_finite() && flow.min_distance > 0.0) {
            errors.push(format!(
                "flow.min_distance = {}: distanta minima trebuie sa fie pozitiva (impartire la zero)",
                flow.min_distance
            ));
        }

        // --- Simulation ---

        let sim = &self.simulation;
        if sim.packet_interval_ms == 0 {
            errors.push("simulation.packet_interval_ms = 0 este invalid".to_string());
        }
        if sim.frame_rate_hz == 0 {
            errors.push("simulation.frame_rate_hz = 0 este invalid".to_string());
        }
        if !(0.0..=1.0).contains(&sim.anomaly_probability) {
            errors.push(format!(
                "simulation.anomaly_probability = {} trebuie sa fie in [0, 1]",
                sim.anomaly_probability
            ));
        }
        if sim.min_packet_size >= sim.max_packet_size {
            errors.push(format!(
                "simulation.min_packet_size ({}) trebuie sa fie mai mic decat \
                 simulation.max_packet_size ({})",
                sim.min_packet_size, sim.max_packet_size
            ));
        }
        let distinct_ips: HashSet<&str> = sim
            .sample_ips
            .iter()
            .map(|ip| ip.trim())
            .filter(|ip| !ip.is_empty())
            .collect();
        if distinct_ips.len() < 2 {
            errors.push(
                "simulation.sample_ips trebuie sa contina cel putin 2 adrese distincte nenule"
                    .to_string(),
            );
        }
        if sim.burst_interval_secs > 0 && sim.burst_size == 0 {
            errors.push(
                "simulation.burst_size = 0 cu rafale activate (burst_interval_secs > 0)"
                    .to_string(),
            );
        }
        if !(sim.node_radius.is_finite() && sim.node_radius >= 0.0) {
            errors.push(format!(
                "simulation.node_radius = {} este invalid",
                sim.node_radius
            ));
        }

        // --- Filter ---

        for name in &self.filter.protocols {
            if Protocol::from_name(name).is_none() {
                let valid = Protocol::ALL
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                errors.push(format!(
                    "filter.protocols contine {:?} - protocol necunoscut. Valori acceptate: {}",
                    name, valid
                ));
            }
        }

        // --- Cleanup / Display ---

        if self.cleanup.interval_ms == 0 {
            errors.push(
                "cleanup.interval_ms = 0: prune continuu va bloca procesarea".to_string(),
            );
        }
        if self.display.stats_interval_secs == 0 {
            errors.push("display.stats_interval_secs = 0 este invalid".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            let listing = errors
                .iter()
                .enumerate()
                .map(|(i, e)| format!("  {}. {}", i + 1, e))
                .collect::<Vec<_>>()
                .join("\n");
            anyhow::bail!(
                "config.toml contine {} erori de configurare:\n{}",
                errors.len(),
                listing
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.detection.port_scan_threshold, 10);
        assert_eq!(config.detection.time_window_secs, 5.0);
        assert_eq!(config.detection.ddos_threshold, 50);
        assert_eq!(config.detection.unusual_packet_size, 10_000);
        assert!(config.detection.cumulative_port_tracking);
        assert_eq!(config.flow.max_active_packets, 100);
        assert_eq!(config.flow.packet_speed, 5.0);
        assert_eq!(config.flow.packet_lifetime_secs, 10.0);
        assert_eq!(config.flow.overflow_policy, OverflowPolicy::Resume);
        assert_eq!(config.simulation.sample_ips.len(), 10);
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::parse(
            r#"
            [detection]
            ddos_threshold = 20
            cumulative_port_tracking = false

            [flow]
            overflow_policy = "drop"

            [filter]
            protocols = ["http", "DNS"]
            "#,
        )
        .unwrap();

        assert_eq!(config.detection.ddos_threshold, 20);
        assert_eq!(config.detection.port_scan_threshold, 10);
        assert!(!config.detection.cumulative_port_tracking);
        assert_eq!(config.flow.overflow_policy, OverflowPolicy::Drop);

        let enabled = config.filter.enabled_protocols().unwrap();
        assert!(enabled.contains(&Protocol::Http));
        assert!(enabled.contains(&Protocol::Dns));
        assert_eq!(enabled.len(), 2);
    }

    #[test]
    fn test_collects_all_errors() {
        let err = AppConfig::parse(
            r#"
            [detection]
            port_scan_threshold = 0
            time_window_secs = -1.0

            [flow]
            min_distance = 0.0

            [filter]
            protocols = ["gopher"]
            "#,
        )
        .unwrap_err()
        .to_string();

        assert!(err.contains("4 erori"), "mesaj: {}", err);
        assert!(err.contains("port_scan_threshold"));
        assert!(err.contains("time_window_secs"));
        assert!(err.contains("min_distance"));
        assert!(err.contains("gopher"));
    }

    #[test]
    fn test_inverted_size_range_rejected() {
        let err = AppConfig::parse(
            r#"
            [simulation]
            min_packet_size = 2000
            max_packet_size = 100
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("min_packet_size"));
    }

    #[test]
    fn test_unknown_overflow_policy_is_parse_error() {
        assert!(AppConfig::parse("[flow]\noverflow_policy = \"requeue\"").is_err());
    }

    #[test]
    fn test_default_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_shipped_config_file() {
        let config = AppConfig::parse(include_str!("../config.toml")).unwrap();
        assert_eq!(config.flow.overflow_policy, OverflowPolicy::Resume);
        assert_eq!(config.simulation.sample_ips.len(), 10);
        assert!(config.filter.enabled_protocols().is_none());
        assert!(config.detection.cumulative_port_tracking);
    }
}

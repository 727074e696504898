// =============================================================================
// display.rs - Iesirea in Terminal cu Culori ANSI
// =============================================================================
//
// Tot ce vede utilizatorul:
//   - Banner-ul de start (praguri de detectie, capacitate fluxuri)
//   - Log-uri de stare cu badge-uri colorate
//   - Anomaliile detectate (observator al clasificatorului)
//   - Linia periodica de statistici
//   - Pachetele procesate (optional, `show_packets`)
//   - Detaliile unui nod (comanda operatorului)
//
// Modulul nu stie nimic despre euristici sau animatie - primeste date
// gata calculate (AnomalyEvent, StatsSnapshot) si le formateaza.
//
// NOTA RUST - CRATE-ul `colored`:
//   "text".red().bold()       -> ColoredString (implementeaza Display)
//   " INFO ".on_green()       -> badge cu fundal colorat
// Culorile sunt dezactivate automat cand iesirea nu este un TTY.
//
// =============================================================================

use crate::classifier::AnomalyEvent;
use crate::config::{AppConfig, DetectionConfig};
use crate::flow::{Vec3, VisualHandle};
use crate::packet::PacketRecord;
use crate::pipeline::{Node, StatsSnapshot};
use crate::stats::format_bytes;
use chrono::Local;
use colored::*;

/// Latimea separatorului orizontal (in caractere).
const SEPARATOR_WIDTH: usize = 100;

// ---------------------------------------------------------------------------
// Banner
// ---------------------------------------------------------------------------

/// Afiseaza banner-ul de start cu setarile active.
pub fn print_banner(config: &AppConfig) {
    let inner_width = SEPARATOR_WIDTH - 2;
    let border = "═".repeat(inner_width);

    println!();
    println!("{}", format!("╔{}╗", border).bold().cyan());
    println!(
        "{}",
        format!(
            "║{:^width$}║",
            "NETFLOW-IDS  ::  TRAFFIC CLASSIFIER & FLOW SIMULATOR",
            width = inner_width
        )
        .bold()
        .cyan()
    );
    println!("{}", format!("╠{}╣", border).bold().cyan());

    let detection = &config.detection;
    let lines = [
        threshold_line(detection),
        format!(
            "  Porturi:   {:<14} Fluxuri: max {} active, overflow {:?}",
            if detection.cumulative_port_tracking {
                "cumulativ"
            } else {
                "pe fereastra"
            },
            config.flow.max_active_packets,
            config.flow.overflow_policy
        ),
        format!(
            "  Trafic:    la {} ms       Rafala: {} pachete / {} s   Anomalii: {:.0}%",
            config.simulation.packet_interval_ms,
            config.simulation.burst_size,
            config.simulation.burst_interval_secs,
            config.simulation.anomaly_probability * 100.0
        ),
    ];
    for line in &lines {
        println!(
            "{}",
            format!("║{:<width$}║", line, width = inner_width).cyan()
        );
    }

    println!("{}", format!("╚{}╝", border).bold().cyan());
    println!();
}

/// Pragurile de declansare; toate euristicile compara strict (`>`).
fn threshold_line(detection: &DetectionConfig) -> String {
    format!(
        "  Port scan: >{} porturi   DDoS: >{} pachete/{}s   Oversized: >{} B",
        detection.port_scan_threshold,
        detection.ddos_threshold,
        detection.time_window_secs,
        detection.unusual_packet_size
    )
}

pub fn print_separator() {
    println!("{}", "─".repeat(SEPARATOR_WIDTH).dimmed());
}

// ---------------------------------------------------------------------------
// Log-uri de stare
// ---------------------------------------------------------------------------

pub fn log_info(message: &str) {
    println!(
        "{} {} {}",
        timestamp().bold().white(),
        " INFO ".on_green().black().bold(),
        message.white()
    );
}

pub fn log_warning(message: &str) {
    println!(
        "{} {} {}",
        timestamp().bold().white(),
        " WARN ".on_yellow().black().bold(),
        message.yellow()
    );
}

pub fn log_error(message: &str) {
    eprintln!(
        "{} {} {}",
        timestamp().bold().white(),
        " ERR  ".on_red().white().bold(),
        message.red()
    );
}

// ---------------------------------------------------------------------------
// Anomalii
// ---------------------------------------------------------------------------

/// Gravitatea unei alerte, dedusa din motivul ei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// Port Scan sau DDoS -> Critical; restul (doar Oversized) -> Warning.
pub fn alert_severity(reason: &str) -> AlertSeverity {
    if reason.contains("DDoS") || reason.contains("Port scan") {
        AlertSeverity::Critical
    } else {
        AlertSeverity::Warning
    }
}

/// Afiseaza o anomalie. Inregistrata ca observator pe clasificator.
///
/// NOTA RUST: `match` pe severitate alege o pereche (sageti, badge) de
/// acelasi tip `ColoredString` pe ambele ramuri.
pub fn log_anomaly(event: &AnomalyEvent) {
    let packet = &event.packet;
    let (arrows, badge, source) = match alert_severity(&event.reason) {
        AlertSeverity::Critical => (
            "▶▶▶".red().bold(),
            " CRITICAL ".on_red().white().bold(),
            format!("[IP: {}]", packet.source()).red().bold(),
        ),
        AlertSeverity::Warning => (
            "▶▶▶".yellow().bold(),
            " WARNING  ".on_yellow().black().bold(),
            format!("[IP: {}]", packet.source()).yellow().bold(),
        ),
    };
    println!(
        "{} {} {} {} -> {} [{} {} B] t={:.2}s",
        timestamp().bold().white(),
        arrows,
        badge,
        source,
        packet.destination(),
        packet.protocol(),
        packet.size(),
        event.detected_at
    );
    println!("  Motiv: {}", event.reason.yellow());
}

/// Un pachet procesat (mod `show_packets`).
pub fn log_packet(packet: &PacketRecord) {
    let badge = if packet.is_anomaly() {
        " PKT! ".on_red().white().bold()
    } else {
        " PKT  ".on_blue().white().bold()
    };
    println!(
        "{} {} {} {}:{} -> {}:{} {} {}",
        timestamp().dimmed(),
        badge,
        packet.id().dimmed(),
        packet.source().bright_blue(),
        packet.source_port(),
        packet.destination().bright_blue(),
        packet.destination_port(),
        packet.protocol().to_string().bright_blue(),
        format_bytes(u64::from(packet.size()))
    );
}

/// Detaliile unui nod (comanda `node <ip>`).
pub fn log_node(node: &Node) {
    let status = if node.suspicious {
        " SUSPECT ".on_red().white().bold()
    } else {
        "   OK    ".on_green().black().bold()
    };
    println!(
        "{} {} {} trimise {} | primite {} | pozitie {}",
        timestamp().bold().white(),
        status,
        node.address.bright_blue().bold(),
        node.packets_sent,
        node.packets_received,
        node.position
    );
}

// ---------------------------------------------------------------------------
// Statistici periodice
// ---------------------------------------------------------------------------

/// Nivelul de alerta al contorului de anomalii.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyLevel {
    Calm,
    Elevated,
    Critical,
}

/// Peste 5 anomalii -> Elevated, peste 10 -> Critical.
pub fn anomaly_level(count: usize) -> AnomalyLevel {
    match count {
        0..=5 => AnomalyLevel::Calm,
        6..=10 => AnomalyLevel::Elevated,
        _ => AnomalyLevel::Critical,
    }
}

/// Format: [ts] STAT 120 pachete (84.2 KB) | fluxuri 37 | overflow 0 ...
pub fn log_stats(snapshot: &StatsSnapshot) {
    let anomalies = snapshot.anomalies.to_string();
    let anomalies = match anomaly_level(snapshot.anomalies) {
        AnomalyLevel::Calm => anomalies.green().bold(),
        AnomalyLevel::Elevated => anomalies.yellow().bold(),
        AnomalyLevel::Critical => anomalies.red().bold(),
    };

    println!(
        "{} {} {} pachete ({}) | fluxuri {} | overflow {} | aruncate {} | anomalii {} (recente {}) | surse {} | suspecte {}",
        timestamp().dimmed(),
        " STAT ".on_cyan().black().bold(),
        snapshot.total_packets.to_string().white().bold(),
        format_bytes(snapshot.total_bytes),
        snapshot.active_flows.to_string().white().bold(),
        snapshot.overflow,
        snapshot.dropped,
        anomalies,
        snapshot.recent_anomalies,
        snapshot.tracked_sources,
        snapshot.suspicious_nodes
    );

    if !snapshot.breakdown.is_empty() {
        let breakdown = snapshot
            .breakdown
            .iter()
            .map(|(protocol, packets, bytes, percent)| {
                format!(
                    "{} {} ({:.1}%, {})",
                    protocol,
                    packets,
                    percent,
                    format_bytes(*bytes)
                )
            })
            .collect::<Vec<_>>()
            .join(" | ");
        println!("       {}", breakdown.dimmed());
    }
}

// ---------------------------------------------------------------------------
// Reprezentare vizuala minimala: pozitia fluxului in log-ul de trace
// ---------------------------------------------------------------------------

/// Marker care raporteaza pozitia unui flux prin `tracing::trace!`.
pub struct TraceMarker {
    packet_id: String,
    updates: u64,
}

impl TraceMarker {
    pub fn new(packet: &PacketRecord, start: Vec3) -> Self {
        tracing::trace!(packet = packet.id(), %start, "Flux pornit");
        Self {
            packet_id: packet.id().to_string(),
            updates: 0,
        }
    }
}

impl VisualHandle for TraceMarker {
    fn set_position(&mut self, position: Vec3) {
        self.updates += 1;
        tracing::trace!(packet = %self.packet_id, %position, "Pozitie flux");
    }

    fn release(&mut self) {
        tracing::trace!(
            packet = %self.packet_id,
            updates = self.updates,
            "Flux eliberat"
        );
    }
}

fn timestamp() -> String {
    Local::now().format("[%Y-%m-%d %H:%M:%S]").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_level_thresholds() {
        assert_eq!(anomaly_level(0), AnomalyLevel::Calm);
        assert_eq!(anomaly_level(5), AnomalyLevel::Calm);
        assert_eq!(anomaly_level(6), AnomalyLevel::Elevated);
        assert_eq!(anomaly_level(10), AnomalyLevel::Elevated);
        assert_eq!(anomaly_level(11), AnomalyLevel::Critical);
    }

    #[test]
    fn test_threshold_line_uses_strict_comparison() {
        let line = threshold_line(&DetectionConfig::default());
        assert!(line.contains("Port scan: >10 porturi"));
        assert!(line.contains("DDoS: >50 pachete/5s"));
        assert!(line.contains("Oversized: >10000 B"));
        assert!(!line.contains(">="));
    }

    #[test]
    fn test_alert_severity() {
        assert_eq!(
            alert_severity("Port scan detected: 11 unique ports accessed"),
            AlertSeverity::Critical
        );
        assert_eq!(
            alert_severity("Potential DDoS: 51 packets in 5s"),
            AlertSeverity::Critical
        );
        assert_eq!(
            alert_severity("Potential DDoS: 51 packets in 5s; Unusually large packet"),
            AlertSeverity::Critical
        );
        assert_eq!(
            alert_severity("Unusually large packet"),
            AlertSeverity::Warning
        );
    }

    #[test]
    fn test_trace_marker_counts_updates() {
        let packet = PacketRecord::new(
            "pkt-1",
            "10.0.0.1",
            "10.0.0.2",
            40000,
            80,
            crate::packet::Protocol::Http,
            100,
            0.0,
        )
        .unwrap();
        let mut marker = TraceMarker::new(&packet, Vec3::default());
        marker.set_position(Vec3::new(1.0, 0.0, 0.0));
        marker.set_position(Vec3::new(2.0, 0.0, 0.0));
        marker.release();
        assert_eq!(marker.updates, 2);
    }
}

// =============================================================================
// packet.rs - Modelul de Date: PacketRecord si Protocol
// =============================================================================
//
// Structura comuna pe care o consuma toate componentele:
//   - clasificatorul (istoric per sursa, euristici)
//   - managerul de fluxuri (animatie sursa -> destinatie)
//   - statisticile per protocol
//
// CONCEPTE RUST EXPLICATE:
//
// 1. VALIDARE LA GRANITA (boundary validation)
//    PacketRecord nu poate fi construit decat prin `PacketRecord::new()`,
//    care verifica adresele, id-ul si timestamp-ul. Odata construit, un
//    pachet este garantat bine-format - restul codului nu mai verifica.
//
// 2. thiserror vs anyhow
//    `anyhow` este pentru aplicatie (main, config): nu ne intereseaza tipul
//    erorii, doar mesajul si contextul. `thiserror` genereaza un enum de
//    erori TIPIZAT - apelantul poate face `match` pe varianta exacta.
//    La granita modelului de date vrem erori tipizate.
//
// =============================================================================

use thiserror::Error;

/// Protocoalele de retea recunoscute de vizualizator.
///
/// NOTA RUST: `Copy` este sigur aici - enum fara date asociate, 1 byte.
/// `Hash` + `Eq` permit folosirea ca cheie in HashMap (statistici).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    Http,
    Https,
    Ftp,
    Ssh,
    Dns,
    Smtp,
    Tcp,
    Udp,
    Icmp,
    Unknown,
}

impl Protocol {
    /// Toate variantele, in ordinea declararii.
    pub const ALL: [Protocol; 10] = [
        Protocol::Http,
        Protocol::Https,
        Protocol::Ftp,
        Protocol::Ssh,
        Protocol::Dns,
        Protocol::Smtp,
        Protocol::Tcp,
        Protocol::Udp,
        Protocol::Icmp,
        Protocol::Unknown,
    ];

    /// Portul destinatie "bine-cunoscut" al protocolului.
    ///
    /// `None` pentru protocoalele de transport generice (TCP, UDP, ICMP,
    /// Unknown) - generatorul alege atunci un port efemer aleator.
    pub fn default_port(self) -> Option<u16> {
        match self {
            Protocol::Http => Some(80),
            Protocol::Https => Some(443),
            Protocol::Ftp => Some(21),
            Protocol::Ssh => Some(22),
            Protocol::Dns => Some(53),
            Protocol::Smtp => Some(25),
            Protocol::Tcp | Protocol::Udp | Protocol::Icmp | Protocol::Unknown => None,
        }
    }

    /// Parseaza numele unui protocol (case-insensitive), ex: din config.toml.
    pub fn from_name(name: &str) -> Option<Protocol> {
        Protocol::ALL
            .iter()
            .copied()
            .find(|p| p.to_string().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Protocol::Http => "HTTP",
            Protocol::Https => "HTTPS",
            Protocol::Ftp => "FTP",
            Protocol::Ssh => "SSH",
            Protocol::Dns => "DNS",
            Protocol::Smtp => "SMTP",
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Icmp => "ICMP",
            Protocol::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

/// Erorile de validare ale unui pachet.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PacketError {
    #[error("packet id must not be empty")]
    EmptyId,

    #[error("source address must not be empty")]
    EmptySource,

    #[error("destination address must not be empty")]
    EmptyDestination,

    #[error("timestamp must be finite and non-negative, got {0}")]
    InvalidTimestamp(f64),
}

/// Inregistrarea unui pachet de retea simulat.
///
/// Toate campurile de identitate sunt imutabile dupa creare (private, cu
/// accesori). Singura stare mutabila este marcajul de anomalie, setat O
/// SINGURA DATA de clasificator prin `mark_anomalous()`.
///
/// NOTA RUST: Campurile sunt OWNED (String, nu &str) - pachetul traieste
/// independent de generatorul care l-a creat si poate fi mutat in Flow.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketRecord {
    id: String,
    source: String,
    destination: String,
    source_port: u16,
    destination_port: u16,
    protocol: Protocol,
    size: u32,
    timestamp: f64,
    is_anomaly: bool,
    anomaly_reason: Option<String>,
}

impl PacketRecord {
    /// Construieste un pachet validat.
    ///
    /// `timestamp` este in secunde monotone (ceasul simularii, nu wall-clock).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
        source_port: u16,
        destination_port: u16,
        protocol: Protocol,
        size: u32,
        timestamp: f64,
    ) -> Result<Self, PacketError> {
        let id = id.into();
        let source = source.into();
        let destination = destination.into();

        if id.trim().is_empty() {
            return Err(PacketError::EmptyId);
        }
        if source.trim().is_empty() {
            return Err(PacketError::EmptySource);
        }
        if destination.trim().is_empty() {
            return Err(PacketError::EmptyDestination);
        }
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err(PacketError::InvalidTimestamp(timestamp));
        }

        Ok(Self {
            id,
            source,
            destination,
            source_port,
            destination_port,
            protocol,
            size,
            timestamp,
            is_anomaly: false,
            anomaly_reason: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn source_port(&self) -> u16 {
        self.source_port
    }

    pub fn destination_port(&self) -> u16 {
        self.destination_port
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn is_anomaly(&self) -> bool {
        self.is_anomaly
    }

    pub fn anomaly_reason(&self) -> Option<&str> {
        self.anomaly_reason.as_deref()
    }

    /// Marcheaza pachetul ca anomalie. Motivul se seteaza o singura data;
    /// apelurile ulterioare sunt ignorate si returneaza `false`.
    pub(crate) fn mark_anomalous(&mut self, reason: String) -> bool {
        if self.anomaly_reason.is_some() {
            return false;
        }
        self.is_anomaly = true;
        self.anomaly_reason = Some(reason);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(source: &str, dest: &str, ts: f64) -> Result<PacketRecord, PacketError> {
        PacketRecord::new("pkt-1", source, dest, 40000, 80, Protocol::Http, 512, ts)
    }

    #[test]
    fn test_valid_packet() {
        let packet = make("10.0.0.1", "10.0.0.2", 1.5).unwrap();
        assert_eq!(packet.source(), "10.0.0.1");
        assert_eq!(packet.destination_port(), 80);
        assert!(!packet.is_anomaly());
        assert!(packet.anomaly_reason().is_none());
    }

    #[test]
    fn test_rejects_empty_addresses() {
        assert_eq!(make("", "10.0.0.2", 0.0), Err(PacketError::EmptySource));
        assert_eq!(make("10.0.0.1", "  ", 0.0), Err(PacketError::EmptyDestination));
        assert_eq!(
            PacketRecord::new("", "a", "b", 1, 2, Protocol::Tcp, 1, 0.0),
            Err(PacketError::EmptyId)
        );
    }

    #[test]
    fn test_rejects_bad_timestamp() {
        assert!(matches!(
            make("a", "b", -1.0),
            Err(PacketError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            make("a", "b", f64::NAN),
            Err(PacketError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_reason_set_only_once() {
        let mut packet = make("a", "b", 0.0).unwrap();
        assert!(packet.mark_anomalous("first".to_string()));
        assert!(!packet.mark_anomalous("second".to_string()));
        assert!(packet.is_anomaly());
        assert_eq!(packet.anomaly_reason(), Some("first"));
    }

    #[test]
    fn test_protocol_names_and_ports() {
        assert_eq!(Protocol::from_name("https"), Some(Protocol::Https));
        assert_eq!(Protocol::from_name(" Unknown "), Some(Protocol::Unknown));
        assert_eq!(Protocol::from_name("gopher"), None);
        assert_eq!(Protocol::Ssh.default_port(), Some(22));
        assert_eq!(Protocol::Icmp.default_port(), None);
    }
}

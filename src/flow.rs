// =============================================================================
// flow.rs - Managerul Ciclului de Viata al Fluxurilor de Pachete
// =============================================================================
//
// Un "flux" este tranzitul animat al unui pachet intre doua puncte din
// spatiu. Managerul:
//   1. Admite pachete intr-un set ACTIV de capacitate limitata
//   2. Pune in coada de overflow (FIFO) ce soseste cand setul e plin
//   3. La fiecare tick: avanseaza progresul, expira fluxurile terminate
//      (progres >= 1 sau varsta >= durata de viata), notifica observatorii
//   4. Elibereaza locuri -> preia din overflow cate o intrare per loc liber
//
// CONCEPTE RUST EXPLICATE:
//
// 1. &mut self
//    Spre deosebire de clasificator, managerul de fluxuri are un SINGUR
//    proprietar (bucla de animatie). Metodele primesc `&mut self` -
//    compilatorul garanteaza exclusivitatea, fara lock-uri.
//
// 2. ELIMINARE IN TIMPUL ITERATIEI
//    Parcurgem `active` de la coada spre cap (indici descrescatori).
//    `Vec::remove(i)` muta doar elementele de DUPA i - cele deja procesate -
//    deci niciun flux nu este sarit sau procesat de doua ori.
//
// 3. TRAIT OBJECTS pentru "visual handle"
//    Nucleul nu stie ce este un obiect vizual. `Box<dyn VisualHandle>`
//    primeste doar pozitia curenta si un semnal de eliberare.
//
// =============================================================================

use crate::config::{FlowConfig, OverflowPolicy};
use crate::packet::PacketRecord;
use std::collections::VecDeque;

/// Punct / vector in spatiul 3D al vizualizarii.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(self, other: Vec3) -> f64 {
        let (dx, dy, dz) = (other.x - self.x, other.y - self.y, other.z - self.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Interpolare liniara: `t = 0` -> self, `t = 1` -> other.
    pub fn lerp(self, other: Vec3, t: f64) -> Vec3 {
        Vec3 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Reprezentarea vizuala (opaca) a unui pachet in tranzit.
///
/// Nucleul apeleaza doar `set_position` la fiecare tick si `release` o
/// singura data, cand fluxul se termina sau intrarea din overflow e aruncata.
pub trait VisualHandle: Send {
    fn set_position(&mut self, position: Vec3);

    fn release(&mut self) {}
}

/// Observator pentru pachetele care si-au terminat tranzitul.
pub type ReceivedObserver = Box<dyn FnMut(&PacketRecord) + Send>;

/// Un pachet in tranzit.
struct Flow {
    packet: PacketRecord,
    source: Vec3,
    destination: Vec3,
    visual: Option<Box<dyn VisualHandle>>,
    speed: f64,
    lifetime: f64,
    progress: f64,
    age: f64,
}

impl Flow {
    fn advance(&mut self, delta_time: f64, min_distance: f64) {
        self.age += delta_time;

        let distance = self.source.distance(self.destination).max(min_distance);
        self.progress = (self.progress + self.speed * delta_time / distance).clamp(0.0, 1.0);

        if let Some(visual) = self.visual.as_mut() {
            visual.set_position(self.source.lerp(self.destination, self.progress));
        }
    }

    fn is_complete(&self) -> bool {
        self.progress >= 1.0 || self.age >= self.lifetime
    }
}

/// Admitere amanata: tot ce e necesar pentru a porni fluxul mai tarziu.
struct OverflowEntry {
    packet: PacketRecord,
    source: Vec3,
    destination: Vec3,
    visual: Option<Box<dyn VisualHandle>>,
}

/// Ce s-a intamplat intr-un tick - pentru statistici si debug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub completed: usize,
    pub resumed: usize,
    pub dropped: usize,
}

/// Managerul fluxurilor de pachete.
pub struct FlowManager {
    active: Vec<Flow>,
    overflow: VecDeque<OverflowEntry>,
    observers: Vec<ReceivedObserver>,
    dropped: u64,
    config: FlowConfig,
}

impl FlowManager {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            active: Vec::with_capacity(config.max_active_packets),
            overflow: VecDeque::new(),
            observers: Vec::new(),
            dropped: 0,
            config,
        }
    }

    /// Inregistreaza un observator "packet received", apelat sincron din
    /// `tick()` in ordinea eliminarii fluxurilor.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&PacketRecord) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Admite un pachet pentru animatie.
    ///
    /// Sub capacitate -> flux nou. La capacitate -> coada de overflow.
    /// Nu esueaza niciodata.
    pub fn admit(
        &mut self,
        packet: PacketRecord,
        source: Vec3,
        destination: Vec3,
        visual: Option<Box<dyn VisualHandle>>,
    ) {
        let entry = OverflowEntry {
            packet,
            source,
            destination,
            visual,
        };

        if self.active.len() < self.config.max_active_packets {
            self.start_flow(entry);
        } else {
            tracing::debug!(
                packet = entry.packet.id(),
                queued = self.overflow.len() + 1,
                "Capacitate atinsa, pachet pus in overflow"
            );
            self.overflow.push_back(entry);
        }
    }

    fn start_flow(&mut self, entry: OverflowEntry) {
        self.active.push(Flow {
            packet: entry.packet,
            source: entry.source,
            destination: entry.destination,
            visual: entry.visual,
            speed: self.config.packet_speed,
            lifetime: self.config.packet_lifetime_secs,
            progress: 0.0,
            age: 0.0,
        });
    }

    /// Avanseaza toate fluxurile cu `delta_time` secunde.
    pub fn tick(&mut self, delta_time: f64) -> TickSummary {
        let mut summary = TickSummary::default();
        let min_distance = self.config.min_distance;

        // --- 1 + 2. Avans si expirare, de la coada spre cap ---
        for i in (0..self.active.len()).rev() {
            self.active[i].advance(delta_time, min_distance);

            if self.active[i].is_complete() {
                let mut flow = self.active.remove(i);
                for observer in self.observers.iter_mut() {
                    observer(&flow.packet);
                }
                if let Some(visual) = flow.visual.as_mut() {
                    visual.release();
                }
                summary.completed += 1;
            }
        }

        // --- 3. Cate o intrare din overflow per loc liber ---
        let free = self
            .config
            .max_active_packets
            .saturating_sub(self.active.len());
        let take = free.min(self.overflow.len());

        for _ in 0..take {
            let Some(mut entry) = self.overflow.pop_front() else {
                break;
            };
            match self.config.overflow_policy {
                OverflowPolicy::Resume => {
                    self.start_flow(entry);
                    summary.resumed += 1;
                }
                OverflowPolicy::Drop => {
                    tracing::debug!(packet = entry.packet.id(), "Pachet din overflow aruncat");
                    if let Some(visual) = entry.visual.as_mut() {
                        visual.release();
                    }
                    self.dropped += 1;
                    summary.dropped += 1;
                }
            }
        }

        summary
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    /// Numarul total de pachete aruncate din overflow (politica `drop`).
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

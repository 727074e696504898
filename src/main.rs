// =============================================================================
// main.rs - Punct de Intrare si Bucla de Simulare
// =============================================================================
//
// Fluxul aplicatiei:
//   1. Initializare tracing + incarcare config.toml
//   2. Clasificator partajat (Arc) cu observator de afisare
//   3. Task de curatare periodica a istoricului (prune)
//   4. Bucla principala (tokio::select!): cadre de animatie, pachete
//      generate, rafale, statistici, comenzi stdin, Ctrl+C si limita
//      de durata
//
// NOTA RUST: modulele sunt declarate aici, in radacina crate-ului binar.
// `mod x;` cauta `src/x.rs`.
//
// =============================================================================

mod classifier;
mod commands;
mod config;
mod display;
mod flow;
mod generator;
mod packet;
mod pipeline;
mod stats;

use classifier::TrafficClassifier;
use commands::Command;
use config::AppConfig;
use flow::{Vec3, VisualHandle};
use generator::SampleGenerator;
use packet::PacketRecord;
use pipeline::Pipeline;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, interval_at, Interval, MissedTickBehavior};

/// Ceasul simularii: secunde (f64) de la pornire.
///
/// Toate timestamp-urile pachetelor si apelurile prune() folosesc acelasi
/// ceas, deci ferestrele de timp ale clasificatorului sunt consistente.
#[derive(Clone, Copy)]
struct SimClock {
    start: Instant,
}

impl SimClock {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Asteapta urmatorul tick; un interval absent nu se declanseaza niciodata.
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Interval periodic al carui prim tick vine dupa o perioada intreaga.
/// `secs == 0` dezactiveaza.
fn delayed_interval(secs: u64) -> Option<Interval> {
    if secs == 0 {
        return None;
    }
    let period = Duration::from_secs(secs);
    Some(interval_at(tokio::time::Instant::now() + period, period))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // =========================================================================
    // 1. TRACING + CONFIG
    // =========================================================================
    //
    // Tracing este pentru diagnostic intern (RUST_LOG=netflow_ids=debug).
    // Iesirea pentru utilizator trece prin `display`.
    //
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("netflow_ids=warn")),
        )
        .with_target(false)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = AppConfig::load(&config_path)?;
    tracing::info!(path = %config_path, "Configuratie incarcata");

    display::print_banner(&config);
    if config.display.debug {
        display::log_warning("Mod DEBUG activ - fluxurile si overflow-ul vor fi afisate");
    }

    // =========================================================================
    // 2. COMPONENTE
    // =========================================================================
    //
    // NOTA RUST: clasificatorul are `&self` pe toate operatiile (DashMap +
    // Mutex in interior), deci Arc este suficient - fara Mutex exterior.
    //
    let clock = SimClock::new();
    let classifier = Arc::new(TrafficClassifier::new(config.detection.clone()));
    classifier.subscribe(display::log_anomaly);

    let mut pipeline = Pipeline::new(&config, classifier);
    if config.display.debug {
        // NOTA RUST: tipurile parametrilor sunt explicite - closure-ul devine
        // `Box<dyn Fn(&PacketRecord, Vec3) -> ...>` abia dupa Box::new().
        pipeline = pipeline.with_visuals(Box::new(
            |packet: &PacketRecord, start: Vec3| -> Box<dyn VisualHandle> {
                Box::new(display::TraceMarker::new(packet, start))
            },
        ));
        pipeline.flows_mut().subscribe(|packet: &PacketRecord| {
            tracing::debug!(
                packet = packet.id(),
                destination = packet.destination(),
                reason = packet.anomaly_reason().unwrap_or("-"),
                "Pachet livrat"
            );
        });
    }

    let mut generator = SampleGenerator::new(&config.simulation);
    display::log_info(&format!(
        "Generator initializat ({} adrese IP)",
        config.simulation.sample_ips.len()
    ));

    // =========================================================================
    // 3. TASK CLEANUP PERIODIC
    // =========================================================================
    //
    // Sleep-first loop: primul prune are loc dupa un interval complet.
    //
    let cleanup_classifier = Arc::clone(pipeline.classifier());
    let cleanup_interval = Duration::from_millis(config.cleanup.interval_ms);

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(cleanup_interval).await;

            let removed = cleanup_classifier.prune(clock.now());
            if removed > 0 {
                tracing::debug!(
                    removed,
                    tracked = cleanup_classifier.tracked_sources(),
                    "Istoric curatat"
                );
            }
        }
    });

    // =========================================================================
    // 4. BUCLA PRINCIPALA
    // =========================================================================

    let frame_period = Duration::from_secs_f64(1.0 / f64::from(config.simulation.frame_rate_hz));
    let mut frames = interval(frame_period);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut packets = interval(Duration::from_millis(config.simulation.packet_interval_ms));
    packets.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut bursts = delayed_interval(config.simulation.burst_interval_secs);
    let mut stats_timer = delayed_interval(config.display.stats_interval_secs);
    let recent_window = config.display.stats_interval_secs as f64;

    let duration_secs = config.simulation.duration_secs;
    let deadline = async move {
        if duration_secs > 0 {
            tokio::time::sleep(Duration::from_secs(duration_secs)).await;
        } else {
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(deadline);

    // Comenzi operator: o comanda per linie. La EOF ramura se dezactiveaza.
    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut paused = false;

    display::log_info("Simulare pornita (Ctrl+C sau 'quit' pentru oprire)");
    display::log_info("Comenzi: burst [ip] | normal [n] | clear | pause | resume | stats | node <ip>");
    display::print_separator();

    let mut last_frame = clock.now();

    loop {
        tokio::select! {
            biased;

            _ = tokio::signal::ctrl_c() => {
                println!();
                display::log_info("Oprire gratiosa... La revedere!");
                break;
            }

            _ = &mut deadline => {
                display::log_info(&format!("Durata de {}s atinsa, oprire", duration_secs));
                break;
            }

            line = stdin_lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        stdin_open = false;
                        continue;
                    }
                    Err(e) => {
                        display::log_error(&format!("Eroare la citirea stdin: {}", e));
                        stdin_open = false;
                        continue;
                    }
                };

                match Command::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => {
                        display::log_info("Oprire la cererea operatorului");
                        break;
                    }
                    Ok(Some(command)) => {
                        run_command(command, &mut pipeline, &mut generator, &mut paused, &config, clock.now());
                    }
                    Err(e) => display::log_warning(&e.to_string()),
                }
            }

            _ = frames.tick() => {
                let now = clock.now();
                let delta = now - last_frame;
                last_frame = now;
                if paused {
                    continue;
                }
                let summary = pipeline.tick(delta);

                if config.display.debug && (summary.resumed > 0 || summary.dropped > 0) {
                    display::log_warning(&format!(
                        "Cadru: {} livrate, {} reluate din overflow, {} aruncate, {} in asteptare",
                        summary.completed,
                        summary.resumed,
                        summary.dropped,
                        pipeline.flows().overflow_len()
                    ));
                }
            }

            _ = packets.tick(), if !paused => {
                match generator.random_packet(clock.now()) {
                    Ok(packet) => {
                        if config.display.show_packets {
                            display::log_packet(&packet);
                        }
                        if let Some(result) = pipeline.process_packet(packet) {
                            if result.is_anomalous {
                                tracing::debug!(reasons = %result.reasons, "Pachet anormal");
                            }
                        }
                    }
                    Err(e) => display::log_error(&format!("Pachet invalid: {}", e)),
                }
            }

            _ = next_tick(&mut bursts), if !paused => {
                inject_burst(&mut pipeline, &mut generator, config.simulation.burst_size, None, clock.now());
            }

            _ = next_tick(&mut stats_timer) => {
                display::log_stats(&pipeline.snapshot(clock.now(), recent_window));
            }
        }
    }

    display::print_separator();
    display::log_stats(&pipeline.snapshot(clock.now(), recent_window));
    let most_common = pipeline
        .stats()
        .most_common()
        .map_or_else(|| "-".to_string(), |protocol| protocol.to_string());
    display::log_info(&format!(
        "Pachete aleatoare generate: {} | protocol dominant: {}",
        generator.packet_count(),
        most_common
    ));

    Ok(())
}

/// Genereaza o rafala si o trece prin pipeline.
fn inject_burst(
    pipeline: &mut Pipeline,
    generator: &mut SampleGenerator,
    size: usize,
    source: Option<&str>,
    now: f64,
) {
    match generator.burst(size, source, now) {
        Ok(burst) => {
            if let Some(first) = burst.first() {
                display::log_warning(&format!(
                    "Rafala de {} pachete de la {}",
                    burst.len(),
                    first.source()
                ));
            }
            for packet in burst {
                pipeline.process_packet(packet);
            }
        }
        Err(e) => display::log_error(&format!("Rafala invalida: {}", e)),
    }
}

/// Executa o comanda a operatorului (mai putin `quit`, tratat in bucla).
fn run_command(
    command: Command,
    pipeline: &mut Pipeline,
    generator: &mut SampleGenerator,
    paused: &mut bool,
    config: &AppConfig,
    now: f64,
) {
    match command {
        Command::Burst(source) => {
            inject_burst(
                pipeline,
                generator,
                config.simulation.burst_size,
                source.as_deref(),
                now,
            );
        }
        Command::Normal(count) => {
            for _ in 0..count {
                match generator.normal_packet(now) {
                    Ok(packet) => {
                        pipeline.process_packet(packet);
                    }
                    Err(e) => {
                        display::log_error(&format!("Pachet invalid: {}", e));
                        return;
                    }
                }
            }
            display::log_info(&format!("{} pachete obisnuite trimise", count));
        }
        Command::Clear => {
            pipeline.reset_statistics();
            generator.reset_count();
            display::log_info("Statistici resetate");
        }
        Command::Pause => {
            *paused = true;
            display::log_info("Simulare in pauza");
        }
        Command::Resume => {
            *paused = false;
            display::log_info("Simulare reluata");
        }
        Command::Stats => {
            display::log_stats(&pipeline.snapshot(now, config.display.stats_interval_secs as f64));
        }
        Command::Node(address) => match pipeline.node(&address) {
            Some(node) => display::log_node(node),
            None => display::log_warning(&format!("Nod necunoscut: {}", address)),
        },
        Command::Quit => {}
    }
}

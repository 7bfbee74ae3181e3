use anyhow::{bail, Context, Result};
use clap::Parser;
use fuel_control::VehicleReport;
use fuel_core::{Station, StationSnapshot, StationStats};
use fuel_world::{build_fleet, build_station, load_config, validate_config, FleetPlan, SimConfig};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "fuel_cli", about = "Space fuel station simulation")]
struct Cli {
    /// Number of consumer vehicles (default 10, at most 20).
    consumers: Option<u32>,
    /// Seed for every vehicle and the station's fill times. Random if omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// JSON file with station and vehicle settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Multiply every delay by this factor (overrides the config file).
    #[arg(long)]
    time_scale: Option<f64>,
    /// Trips per consumer (overrides the config file).
    #[arg(long)]
    trips: Option<u32>,
    /// Abort when the station makes no progress for this many seconds. 0 waits forever.
    #[arg(long, default_value_t = 60)]
    stall_timeout_secs: u64,
    /// Write the final snapshot, station counters and vehicle reports here.
    #[arg(long)]
    summary_json: Option<PathBuf>,
    /// Only log warnings unless RUST_LOG says otherwise.
    #[arg(long)]
    quiet: bool,
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (tests) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

fn resolve_config(cli: &Cli, seed: u64) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    if let Some(scale) = cli.time_scale {
        config.time_scale = scale;
    }
    if let Some(trips) = cli.trips {
        config.vehicles.trips_per_consumer = trips;
    }
    config.station.seed = seed;
    validate_config(&config).context("invalid simulation settings")?;
    config.apply_time_scale();
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let seed = cli.seed.unwrap_or_else(rand::random);
    let config = resolve_config(cli, seed)?;
    let plan = FleetPlan::new(cli.consumers, config.vehicles.trips_per_consumer);
    let station = Arc::new(build_station(&config, &plan));
    let fleet = build_fleet(&config, &plan, seed);
    let fleet_size = fleet.len();

    println!(
        "Starting simulation: consumers={} suppliers={} trips={} seed={seed}",
        plan.consumers,
        plan.suppliers,
        plan.total_consumer_trips(),
    );
    println!("{}", "-".repeat(80));

    let (report_tx, report_rx) = mpsc::channel();
    for mut vehicle in fleet {
        let station = Arc::clone(&station);
        let report_tx = report_tx.clone();
        thread::Builder::new()
            .name(vehicle.id().to_string())
            .spawn(move || {
                let report = vehicle.drive(&station);
                // The receiver only disappears when main has already given up.
                let _ = report_tx.send(report);
            })
            .context("spawning vehicle thread")?;
    }
    drop(report_tx);

    let stall_timeout = (cli.stall_timeout_secs > 0)
        .then(|| Duration::from_secs(cli.stall_timeout_secs));
    let mut reports = collect_reports(&station, &report_rx, fleet_size, stall_timeout)?;
    reports.sort_by_key(|r| (r.vehicle.is_supplier(), r.vehicle.number));

    println!("{}", "-".repeat(80));
    print_summary(&station.snapshot(), &station.stats(), &reports);

    if let Some(path) = &cli.summary_json {
        write_summary(path, seed, &plan, &station, &reports)?;
        println!("Summary written to {}", path.display());
    }
    Ok(())
}

/// Wait for every vehicle to report back, bailing out if the station stops
/// making progress for longer than `stall_timeout`.
fn collect_reports(
    station: &Station,
    reports_rx: &mpsc::Receiver<VehicleReport>,
    expected: usize,
    stall_timeout: Option<Duration>,
) -> Result<Vec<VehicleReport>> {
    let poll = Duration::from_millis(250);
    let mut reports = Vec::with_capacity(expected);
    let mut last_marker = station.stats().progress_marker();
    let mut last_progress = Instant::now();

    loop {
        match reports_rx.recv_timeout(poll) {
            Ok(report) => {
                tracing::debug!(vehicle = %report.vehicle, "vehicle finished");
                reports.push(report);
                last_progress = Instant::now();
            }
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                let marker = station.stats().progress_marker();
                if marker != last_marker {
                    last_marker = marker;
                    last_progress = Instant::now();
                } else if stall_timeout.is_some_and(|limit| last_progress.elapsed() >= limit) {
                    let snapshot = station.snapshot();
                    bail!(
                        "station stalled: no progress for {}s with {} of {expected} vehicles \
                         still running (nitrogen={} quantum={} free_slots={} remaining_trips={})",
                        last_progress.elapsed().as_secs(),
                        expected - reports.len(),
                        snapshot.nitrogen,
                        snapshot.quantum,
                        snapshot.free_slots,
                        snapshot.remaining_consumer_trips,
                    );
                }
            }
        }
    }

    if reports.len() != expected {
        bail!(
            "{} of {expected} vehicle threads exited without reporting",
            expected - reports.len()
        );
    }
    Ok(reports)
}

fn print_summary(snapshot: &StationSnapshot, stats: &StationStats, reports: &[VehicleReport]) {
    println!(
        "Station: nitrogen={:3}  quantum={:3}  free_slots={}/{}  remaining_trips={}",
        snapshot.nitrogen,
        snapshot.quantum,
        snapshot.free_slots,
        snapshot.max_slots,
        snapshot.remaining_consumer_trips,
    );
    println!(
        "Fills: consumer={} supplier={} waited={}  withdrawn n={} q={} shortfall={}",
        stats.consumer_fills,
        stats.supplier_fills,
        stats.admission_waits,
        stats.nitrogen_withdrawn,
        stats.quantum_withdrawn,
        stats.shortfall,
    );
    println!(
        "Deliveries: made={} abandoned={} timed_out_waits={}  delivered n={} q={}",
        stats.deliveries,
        stats.abandoned_deliveries,
        stats.delivery_timeouts,
        stats.nitrogen_delivered,
        stats.quantum_delivered,
    );
    for report in reports {
        let deliveries = if report.vehicle.is_supplier() {
            format!(
                "  deliveries={} abandoned={}",
                report.deliveries, report.abandoned_deliveries
            )
        } else {
            String::new()
        };
        println!(
            "  {:<12} fills={:2}  received n={:4} q={:4}  shortfall={}{deliveries}",
            report.vehicle.to_string(),
            report.fills,
            report.nitrogen_received,
            report.quantum_received,
            report.shortfall(),
        );
    }
}

fn write_summary(
    path: &Path,
    seed: u64,
    plan: &FleetPlan,
    station: &Station,
    reports: &[VehicleReport],
) -> Result<()> {
    let summary = serde_json::json!({
        "seed": seed,
        "plan": plan,
        "station_config": station.config(),
        "station": station.snapshot(),
        "stats": station.stats(),
        "vehicles": reports,
    });
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &summary)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);
    run(&cli)
}

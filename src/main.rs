//! Click Assist CLI
//!
//! Tops up fast physical clicking to a randomized target rate.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use click_assist::{
    collector::{check_permission, permission_help, Collector, CollectorConfig, MouseButton},
    config::Config,
    engine::AssistEngine,
    synthesizer::{platform_synthesizer, DryRunSynthesizer, InputSynthesizer},
    ASSIST_NOTICE, VERSION,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "click-assist")]
#[command(version = VERSION)]
#[command(about = "Adds clicks while you click fast, up to a randomized target CPS", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start listening and assisting
    Run(RunArgs),

    /// Show the effective configuration
    Config {
        /// Read configuration from this file instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check that clicks can be observed on this system
    Check,
}

#[derive(Args)]
struct RunArgs {
    /// Read configuration from this file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// User CPS that must be exceeded before assist starts
    #[arg(long)]
    threshold: Option<f64>,

    /// Seconds without a click before assist stops
    #[arg(long)]
    idle_timeout: Option<f64>,

    /// Lower bound of the left button target range
    #[arg(long)]
    left_min: Option<f64>,

    /// Upper bound of the left button target range
    #[arg(long)]
    left_max: Option<f64>,

    /// Lower bound of the right button target range
    #[arg(long)]
    right_min: Option<f64>,

    /// Upper bound of the right button target range
    #[arg(long)]
    right_max: Option<f64>,

    /// Never assist the left button
    #[arg(long)]
    no_left: bool,

    /// Never assist the right button
    #[arg(long)]
    no_right: bool,

    /// Run the scheduler without injecting clicks
    #[arg(long)]
    dry_run: bool,

    /// Don't draw the CPS meter
    #[arg(long)]
    quiet: bool,
}

impl RunArgs {
    /// Apply command-line overrides through the clamping setters.
    fn apply(&self, config: &mut Config) {
        if let Some(threshold) = self.threshold {
            config.global.set_threshold_cps(threshold);
        }
        if let Some(secs) = self.idle_timeout {
            config.global.set_idle_timeout_secs(secs);
        }
        if let Some(v) = self.left_min {
            config.left.set_min_cps(v);
        }
        if let Some(v) = self.left_max {
            config.left.set_max_cps(v);
        }
        if let Some(v) = self.right_min {
            config.right.set_min_cps(v);
        }
        if let Some(v) = self.right_max {
            config.right.set_max_cps(v);
        }
        if self.no_left {
            config.left.set_enabled(false);
        }
        if self.no_right {
            config.right.set_enabled(false);
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Config { config } => cmd_config(config.as_deref()),
        Commands::Check => {
            cmd_check();
            Ok(())
        }
    }
}

/// Log to stderr so the meter on stdout stays readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("click_assist=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Config::load().context("failed to load config"),
    }
}

fn print_permission_help() {
    eprintln!("Error: {}", permission_help());
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);

    println!("Click Assist v{VERSION}");
    println!("{ASSIST_NOTICE}");

    if !check_permission() {
        print_permission_help();
        bail!("cannot observe mouse clicks");
    }

    for warning in config.warnings() {
        eprintln!("Warning: {warning}");
    }

    println!(
        "  Threshold: {:.1} CPS, idle timeout: {:.2}s",
        config.global.threshold_cps(),
        config.global.idle_timeout().as_secs_f64()
    );
    for button in MouseButton::ALL {
        let assist = config.button(button);
        println!(
            "  {:<5}: {} [{:.0}, {:.0}] CPS",
            button.as_str(),
            if assist.enabled() { "enabled " } else { "disabled" },
            assist.min_cps(),
            assist.max_cps()
        );
    }
    println!();

    let synthesizer: Arc<dyn InputSynthesizer> = if args.dry_run {
        Arc::new(DryRunSynthesizer::new())
    } else {
        platform_synthesizer()
    };
    let engine = Arc::new(AssistEngine::new(&config, synthesizer));
    info!(synthesizer = engine.synthesizer_name(), "engine ready");

    let mut collector = Collector::new(CollectorConfig {
        capture_side_buttons: config.side_button_toggle,
        ..CollectorConfig::default()
    });
    collector.start().context("failed to start click listener")?;
    let ingestion = engine.spawn_ingestion(collector.receiver().clone());

    let handler_engine = Arc::clone(&engine);
    ctrlc::set_handler(move || handler_engine.shutdown())
        .context("failed to set Ctrl+C handler")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    runtime.block_on(async {
        let schedulers = engine.spawn_schedulers();
        run_meter(&engine, config.refresh_interval, args.quiet).await;
        for handle in schedulers {
            if let Err(e) = handle.await {
                error!("scheduler task failed: {e}");
            }
        }
    });

    collector.stop();
    if ingestion.join().is_err() {
        error!("ingestion thread panicked");
    }

    println!();
    println!();
    println!("{}", engine.stats().summary());
    Ok(())
}

/// Redraw the CPS meter until the engine stops.
async fn run_meter(engine: &AssistEngine, refresh: Duration, quiet: bool) {
    let mut interval = tokio::time::interval(refresh);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stdout = std::io::stdout();

    while engine.is_running() {
        interval.tick().await;
        if quiet {
            continue;
        }

        let [left, right] = engine.readouts(engine.now());
        print!(
            "\r{} -> {:.1} | {} -> {:.1}   ",
            left.summary(),
            left.target_cps,
            right.summary(),
            right.target_cps
        );
        let _ = stdout.flush();
    }
}

fn cmd_config(path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(path)?;

    println!("Configuration");
    println!("=============");
    println!();
    match path {
        Some(path) => println!("Config file: {path:?}"),
        None => println!("Config file: {:?}", Config::config_path()),
    }
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("failed to serialize config")?
    );

    let warnings = config.warnings();
    if !warnings.is_empty() {
        println!();
        for warning in warnings {
            println!("Warning: {warning}");
        }
    }
    Ok(())
}

fn cmd_check() {
    println!("Click Assist Status");
    println!("===================");
    println!();

    let has_permission = check_permission();
    println!(
        "Click listener permission: {}",
        if has_permission {
            "Granted ✓"
        } else {
            "Not Granted ✗"
        }
    );
    println!("Click injection: {}", platform_synthesizer().name());

    if !has_permission {
        println!();
        print_permission_help();
    }
}

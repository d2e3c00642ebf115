//! fuzzy-tip
//!
//! Command-line interface for the fuzzy tipping system.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fuzzy_tip::report::{self, ControlSurface, Reporter, Sensitivity};
use fuzzy_tip::{InputPolicy, LogLevel, OutputFormat, TipConfig, TipOutcome, TipSystem};

const LONG_VERSION: &str = concat!(
    env!("FUZZY_TIP_VERSION"),
    " (",
    env!("FUZZY_TIP_TARGET"),
    ")"
);

#[derive(Parser)]
#[command(name = "fuzzy-tip")]
#[command(author = "fuzzy-tip Authors")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Suggests a tip from service and food quality using fuzzy inference", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the standard search paths)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (only errors are logged)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Fail on ratings outside 0..10 instead of clamping them
    #[arg(long, global = true)]
    reject_out_of_range: bool,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Suggest a tip for one pair of ratings
    Eval {
        /// Service quality (0-10)
        #[arg(long, allow_negative_numbers = true)]
        servicio: f64,

        /// Food quality (0-10)
        #[arg(long, allow_negative_numbers = true)]
        comida: f64,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Include the aggregated output curve
        #[arg(long)]
        curve: bool,
    },

    /// Evaluate the configured cases and write every report file
    Report {
        /// Directory for the JSON files
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Print the control surface over both ratings
    Surface {
        /// Grid step
        #[arg(long)]
        step: Option<f64>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Print the tip along each rating with the other one fixed
    Sensitivity {
        /// Value the other rating is held at
        #[arg(long)]
        fixed: Option<f64>,

        /// Sweep step
        #[arg(long)]
        step: Option<f64>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.init_config {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from("./fuzzy-tip.toml"));
        return init_config(&path);
    }

    let config = load_config(&cli)?;
    init_logging(config.general.log_level);

    let system = TipSystem::new(config.engine).context("Failed to build the tipping system")?;
    let format_or = |arg: Option<FormatArg>| arg.map(OutputFormat::from).unwrap_or(config.general.format);

    match cli.command {
        Some(Command::Eval {
            servicio,
            comida,
            format,
            curve,
        }) => {
            let outcome = system
                .evaluate(servicio, comida)
                .with_context(|| format!("Failed to evaluate servicio={} comida={}", servicio, comida))?;
            print_outcome(servicio, comida, &outcome, format_or(format), curve)?;
        }
        Some(Command::Report { output_dir }) => {
            let dir = output_dir.unwrap_or_else(|| config.general.output_dir.clone());
            run_report(&system, &config, &dir)?;
        }
        Some(Command::Surface { step, format }) => {
            let step = step.unwrap_or(config.analysis.surface_step);
            let surface = Reporter::new(&system)
                .control_surface(step)
                .context("Failed to compute the control surface")?;
            print_surface(&surface, format_or(format))?;
        }
        Some(Command::Sensitivity {
            fixed,
            step,
            format,
        }) => {
            let step = step.unwrap_or(config.analysis.sensitivity_step);
            let fixed_servicio = fixed.unwrap_or(config.analysis.fixed_servicio);
            let fixed_comida = fixed.unwrap_or(config.analysis.fixed_comida);
            let sensitivity = Reporter::new(&system)
                .sensitivity(fixed_servicio, fixed_comida, step)
                .context("Failed to compute the sensitivity analysis")?;
            print_sensitivity(&sensitivity, format_or(format))?;
        }
        Some(Command::Config) => {
            print!("{}", config.to_toml().context("Failed to serialize configuration")?);
        }
        None => {
            let dir = config.general.output_dir.clone();
            run_report(&system, &config, &dir)?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<TipConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = TipConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            config.apply_env_overrides();
            config.validate().context("Invalid configuration")?;
            config
        }
        None => TipConfig::load().context("Failed to load configuration")?,
    };

    if cli.verbose {
        config.general.log_level = LogLevel::Verbose;
    }
    if cli.quiet {
        config.general.log_level = LogLevel::Quiet;
    }
    if cli.reject_out_of_range {
        config.engine.input_policy = InputPolicy::Reject;
    }
    Ok(config)
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Refusing to overwrite existing file: {}", path.display());
    }
    fs::write(path, TipConfig::default_config_content())
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));
    // A subscriber may already be installed when embedded; keep that one
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run_report(system: &TipSystem, config: &TipConfig, dir: &Path) -> Result<()> {
    let reporter = Reporter::new(system)
        .with_analysis(config.analysis.clone())
        .with_cases(config.cases.clone());

    println!("{}", "=".repeat(60));
    println!("Sistema de Decisión de Propinas usando Lógica Difusa");
    println!("{}", "=".repeat(60));
    println!();

    let results = reporter
        .evaluate_cases(reporter.cases())
        .context("Failed to evaluate cases")?;
    print!("{}", report::render_cases(&results));

    let written = reporter
        .write_all(dir)
        .with_context(|| format!("Failed to write report to {}", dir.display()))?;
    for path in &written {
        println!("✓ {}", path.display());
    }
    info!(files = written.len(), "report complete");
    Ok(())
}

fn print_outcome(
    servicio: f64,
    comida: f64,
    outcome: &TipOutcome,
    format: OutputFormat,
    with_curve: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut value = serde_json::json!({
                "servicio": servicio,
                "comida": comida,
                "propina": outcome.tip,
                "activations": outcome.activations,
                "clamped": outcome.clamped,
            });
            if with_curve {
                value["curve"] = serde_json::json!(outcome.output_curve);
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            println!("Servicio: {}/10", servicio);
            println!("Comida: {}/10", comida);
            println!("→ Propina sugerida: {:.2}%", outcome.tip);
            if !outcome.clamped.is_empty() {
                println!("(ajustado a 0..10: {})", outcome.clamped.join(", "));
            }
            if with_curve {
                println!();
                for (x, m) in &outcome.output_curve {
                    println!("{:8.3}  {:.4}", x, m);
                }
            }
        }
    }
    Ok(())
}

fn print_surface(surface: &ControlSurface, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(surface)?),
        OutputFormat::Text => {
            print!("{:>6}", "s\\c");
            for comida in &surface.comida {
                print!(" {:>6.1}", comida);
            }
            println!();
            for (servicio, row) in surface.servicio.iter().zip(&surface.propina) {
                print!("{:>6.1}", servicio);
                for tip in row {
                    print!(" {:>6.2}", tip);
                }
                println!();
            }
        }
    }
    Ok(())
}

fn print_sensitivity(sensitivity: &Sensitivity, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(sensitivity)?),
        OutputFormat::Text => {
            for sweep in [&sensitivity.servicio, &sensitivity.comida] {
                println!("{} (other rating fixed at {})", sweep.variable, sweep.fixed);
                for (x, tip) in sweep.inputs.iter().zip(&sweep.propina) {
                    println!("{:6.1}  {:6.2}%", x, tip);
                }
                println!();
            }
        }
    }
    Ok(())
}

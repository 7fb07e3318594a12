//! yalgen CLI - Source scaffolding for yal-family libraries

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use yalgen_core::config::parse_override;
use yalgen_core::probe::{DependencyProber, ProbeEnvironment};
use yalgen_core::{
    FileWriter, FixedEnvironment, GenerationReport, Generator, OutputWriter, ParameterResolver,
    ProbeOutcome, ProjectConfig, StdoutWriter, SystemEnvironment, TemplateCorpus,
    DEFAULT_PROBE_TIMEOUT,
};

#[derive(Parser, Debug)]
#[command(name = "yalgen")]
#[command(about = "CLI for scaffolding yal-family library sources")]
#[command(version)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render every artifact of a project
    Generate(GenerateArgs),
    /// Resolve the project's dependencies and print the outcome
    Probe(ProbeArgs),
    /// Print the tokens available to templates
    Tokens(TokensArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ProbeOptions {
    /// Dependency override, like configure's --with-libNAME=VALUE (auto, yes, no, or a path)
    #[arg(long = "with", value_name = "NAME=VALUE")]
    pub overrides: Vec<String>,

    /// Do not run external tools; every system probe misses
    #[arg(long)]
    pub offline: bool,

    /// Seconds each external probe may take
    #[arg(long = "probe-timeout", value_name = "SECS")]
    pub probe_timeout: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Project configuration file
    pub config: PathBuf,

    /// Directory to write artifacts to; artifacts are printed when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Template directory to use instead of the built-in templates
    #[arg(long)]
    pub templates: Option<PathBuf>,

    #[command(flatten)]
    pub probe: ProbeOptions,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Project configuration file
    pub config: PathBuf,

    #[command(flatten)]
    pub probe: ProbeOptions,
}

#[derive(Parser, Debug)]
pub struct TokensArgs {
    /// Project configuration file
    pub config: PathBuf,

    /// Include the tokens of this library type
    #[arg(short = 't', long = "type")]
    pub type_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // First Ctrl+C stops the run between artifacts, a second one exits at once
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
    })
    .ok();

    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Generate(generate_args) => {
            let report = generate(generate_args, cancel).await?;
            if report.cancelled {
                std::process::exit(130);
            }
            if !report.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Probe(probe_args) => probe(probe_args, cancel).await,
        Command::Tokens(tokens_args) => tokens(tokens_args),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(path: &Path, options: Option<&ProbeOptions>) -> Result<ProjectConfig> {
    let mut config = ProjectConfig::load(path)?;
    if let Some(options) = options {
        let overrides = options
            .overrides
            .iter()
            .map(|arg| parse_override(arg))
            .collect::<Result<Vec<_>>>()?;
        config.apply_overrides(&overrides)?;
    }
    tracing::debug!(
        "Loaded {}: {} type(s), {} dependency(ies)",
        config.library.name,
        config.library.types.len(),
        config.dependencies.len()
    );
    Ok(config)
}

fn probe_timeout(options: &ProbeOptions) -> Duration {
    options
        .probe_timeout
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_PROBE_TIMEOUT)
}

async fn generate(args: GenerateArgs, cancel: Arc<AtomicBool>) -> Result<GenerationReport> {
    let config = load_config(&args.config, Some(&args.probe))?;
    let corpus = match &args.templates {
        Some(dir) => TemplateCorpus::from_dir(dir)?,
        None => TemplateCorpus::builtin().context("Built-in templates are invalid")?,
    };

    let writer: Box<dyn OutputWriter> = match &args.output {
        Some(dir) => Box::new(FileWriter::new(dir)),
        None => Box::new(StdoutWriter::new()),
    };

    let report = if args.probe.offline {
        let generator = Generator::new(corpus, FixedEnvironment::new()).with_cancel_flag(cancel);
        run_generate(&config, generator, writer.as_ref()).await?
    } else {
        let env = SystemEnvironment::new(probe_timeout(&args.probe));
        let generator = Generator::new(corpus, env).with_cancel_flag(cancel);
        run_generate(&config, generator, writer.as_ref()).await?
    };

    print_report(&report, args.output.as_deref());
    Ok(report)
}

async fn run_generate<E: ProbeEnvironment>(
    config: &ProjectConfig,
    mut generator: Generator<E>,
    writer: &dyn OutputWriter,
) -> Result<GenerationReport> {
    let report = generator
        .generate(config, writer)
        .await
        .with_context(|| format!("Generation of {} aborted", config.library.name))?;
    Ok(report)
}

/// Summary goes to stderr so it never mixes with a stdout listing
fn print_report(report: &GenerationReport, output: Option<&Path>) {
    eprintln!();
    for dependency in &report.dependencies {
        eprintln!(
            "  {} {} {}",
            "dependency".dimmed(),
            dependency.descriptor.name,
            outcome_label(dependency.result.outcome)
        );
    }
    for (kind, destination) in &report.written {
        let shown = match output {
            Some(dir) => dir.join(destination),
            None => destination.clone(),
        };
        eprintln!("  {} {} ({})", "✓".green(), shown.display(), kind);
    }
    for failure in &report.failures {
        eprintln!("  {} {}: {}", "✗".red(), failure.unit, failure.error);
    }

    eprintln!();
    if report.cancelled {
        eprintln!(
            "{} after {} artifact(s)",
            "Cancelled".red().bold(),
            report.written.len()
        );
    } else if report.is_success() {
        eprintln!(
            "{} {} artifact(s)",
            "Generated".green().bold(),
            report.written.len()
        );
    } else {
        eprintln!(
            "{} {} artifact(s), {} failed",
            "Generated".yellow().bold(),
            report.written.len(),
            report.failures.len()
        );
    }
}

fn outcome_label(outcome: ProbeOutcome) -> colored::ColoredString {
    let label = outcome.as_str();
    match outcome {
        ProbeOutcome::SystemViaPackageConfig | ProbeOutcome::SystemViaManualProbe => label.green(),
        ProbeOutcome::LocalFallback => label.cyan(),
        ProbeOutcome::Disabled => label.dimmed(),
        ProbeOutcome::Absent => label.yellow(),
    }
}

async fn probe(args: ProbeArgs, cancel: Arc<AtomicBool>) -> Result<()> {
    let config = load_config(&args.config, Some(&args.probe))?;
    if args.probe.offline {
        run_probe(&config, FixedEnvironment::new(), &cancel).await
    } else {
        let env = SystemEnvironment::new(probe_timeout(&args.probe));
        run_probe(&config, env, &cancel).await
    }
}

async fn run_probe<E: ProbeEnvironment>(
    config: &ProjectConfig,
    env: E,
    cancel: &AtomicBool,
) -> Result<()> {
    let mut prober = DependencyProber::new(env);
    for dependency in &config.dependencies {
        if cancel.load(Ordering::SeqCst) {
            std::process::exit(130);
        }
        let result = prober.probe(dependency).await?;

        println!(
            "{} {}",
            dependency.library_id().bold(),
            outcome_label(result.outcome)
        );
        for define in result.define_pairs() {
            println!("  {} {}", "define".dimmed(), define);
        }
        if !result.flags.cppflags.is_empty() {
            println!("  {} {}", "cppflags".dimmed(), result.flags.cppflags.join(" "));
        }
        if !result.flags.ldflags.is_empty() {
            println!("  {} {}", "ldflags".dimmed(), result.flags.ldflags.join(" "));
        }
        if let Some(source) = &result.flags.source {
            println!("  {} {}", "source".dimmed(), source.display());
        }
    }
    Ok(())
}

fn tokens(args: TokensArgs) -> Result<()> {
    let config = load_config(&args.config, None)?;
    let base = match &args.type_name {
        Some(name) => {
            let ty = config.find_type(name).with_context(|| {
                let available: Vec<&str> =
                    config.library.types.iter().map(|t| t.name.as_str()).collect();
                format!(
                    "Type '{}' not found. Available types: {}",
                    name,
                    available.join(", ")
                )
            })?;
            config.type_parameters(ty)
        }
        None => config.library_parameters(),
    };

    let resolved = ParameterResolver::new(base).resolve_available();
    let width = resolved.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, value) in resolved.iter() {
        let padded = format!("{:width$}", name, width = width);
        println!("{}  {}", padded.cyan(), value);
    }
    Ok(())
}

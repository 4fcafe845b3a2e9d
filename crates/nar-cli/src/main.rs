mod shell;

use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nar_core::{ParseError, Reasoner, ReasonerConfig, Report};

#[derive(Parser)]
#[command(name = "nar", about = "Attention-bounded term-logic reasoner")]
struct Cli {
    /// TOML file with reasoner parameters (falls back to NAR_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override concept bag capacity
    #[arg(long, global = true)]
    concept_bag_size: Option<usize>,

    /// Override novel-task buffer capacity
    #[arg(long, global = true)]
    task_buffer_size: Option<usize>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed task files (or stdin) through the reasoner and print reports
    Run {
        /// Input files, one task per line
        files: Vec<PathBuf>,

        /// Cycles to run after the last input line
        #[arg(long, default_value_t = 100)]
        cycles: usize,

        /// Print reports as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Interactive session: read tasks from stdin while cycles tick
    Shell {
        /// Milliseconds between cycles
        #[arg(long, default_value_t = 10)]
        tick_ms: u64,

        /// Print reports as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<ReasonerConfig> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var("NAR_CONFIG").ok().map(PathBuf::from));

    let mut config = match &path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => ReasonerConfig::default(),
    };

    if let Some(size) = cli.concept_bag_size {
        config.concept_bag_size = size;
    }
    if let Some(size) = cli.task_buffer_size {
        config.task_buffer_size = size;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Run {
            files,
            cycles,
            json,
        } => cmd_run(config, files, *cycles, *json, cli.verbose),
        Commands::Shell { tick_ms, json } => {
            let reasoner = Reasoner::with_config(config).context("failed to build reasoner")?;
            shell::run(reasoner, Duration::from_millis(*tick_ms), *json).await
        }
        Commands::Config => cmd_config(&config),
    }
}

/// Apply one input line: blank lines and `//` comments are skipped, a bare
/// integer runs that many cycles, `*reset` clears memory, anything else is
/// a task.
pub(crate) fn apply_line(reasoner: &mut Reasoner, line: &str) -> Result<(), ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
        return Ok(());
    }
    if let Ok(cycles) = line.parse::<usize>() {
        reasoner.run(cycles);
        return Ok(());
    }
    if line == "*reset" {
        reasoner.reset();
        return Ok(());
    }
    reasoner.input_line(line)
}

pub(crate) fn emit(out: &mut impl Write, reports: &[Report], json: bool) -> Result<()> {
    for report in reports {
        if json {
            let line = serde_json::to_string(report).context("failed to serialize report")?;
            writeln!(out, "{line}")?;
        } else {
            writeln!(out, "{report}")?;
        }
    }
    Ok(())
}

fn read_sources(files: &[PathBuf]) -> Result<Vec<(String, String)>> {
    if files.is_empty() {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(vec![("<stdin>".to_string(), text)]);
    }
    files
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok((path.display().to_string(), text))
        })
        .collect()
}

fn cmd_run(
    config: ReasonerConfig,
    files: &[PathBuf],
    cycles: usize,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let mut reasoner = Reasoner::with_config(config).context("failed to build reasoner")?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for (name, text) in read_sources(files)? {
        for (i, line) in text.lines().enumerate() {
            apply_line(&mut reasoner, line)
                .with_context(|| format!("{name}:{}: invalid input line", i + 1))?;
            emit(&mut out, &reasoner.drain_reports(), json)?;
        }
    }

    reasoner.run(cycles);
    emit(&mut out, &reasoner.drain_reports(), json)?;

    if verbose {
        print_stats(&reasoner);
    }
    Ok(())
}

fn print_stats(reasoner: &Reasoner) {
    let memory = reasoner.memory();
    eprintln!(
        "--- stats: clock={}, concepts={}, novel_tasks={}, new_tasks={}, avg_priority={:.3} ---",
        reasoner.clock(),
        memory.concepts().size(),
        memory.novel_tasks().size(),
        memory.new_tasks().len(),
        memory.concepts().average_priority(),
    );
}

fn cmd_config(config: &ReasonerConfig) -> Result<()> {
    let text = toml::to_string_pretty(config).context("failed to render configuration")?;
    print!("{text}");
    Ok(())
}

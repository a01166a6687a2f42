use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use nars_core::{InputLine, Memory, Parameters, Reasoner, parse_task};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "nars", about = "Non-axiomatic reasoning engine driver")]
struct Cli {
    /// Parameter file (TOML). Falls back to NARS_CONFIG, then defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed Narsese input and print the report lines of every tick
    Run {
        /// Input files; stdin when none is given or for `-`
        files: Vec<PathBuf>,

        /// Extra ticks once the input is exhausted
        #[arg(long, default_value_t = 0)]
        steps: u64,

        /// One JSON object per report line
        #[arg(long)]
        json: bool,
    },

    /// Parse a Narsese file and print each sentence in canonical form
    Check {
        /// File to check
        file: PathBuf,
    },

    /// Print the effective parameters as TOML
    Params,
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

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Run { files, steps, json } => cmd_run(&cli, files, *steps, *json).await,
        Commands::Check { file } => cmd_check(&cli, file),
        Commands::Params => cmd_params(&cli),
    }
}

fn load_params(cli: &Cli) -> Result<Parameters> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var("NARS_CONFIG").ok().map(PathBuf::from));
    let Some(path) = path else {
        return Ok(Parameters::default());
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let params: Parameters =
        toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
    params.validate().context("invalid parameters")?;
    tracing::debug!(path = %path.display(), "loaded parameters");
    Ok(params)
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ReportLine<'a> {
    tick: u64,
    kind: &'a str,
    sentence: &'a str,
}

struct Driver {
    reasoner: Reasoner,
    json: bool,
    stop: Arc<AtomicBool>,
}

impl Driver {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn tick(&mut self) -> Result<()> {
        let lines = self.reasoner.tick();
        let tick = self.reasoner.clock();
        for line in &lines {
            self.print(tick, line)?;
        }
        Ok(())
    }

    /// Tick until the queued input is consumed and no walking steps remain.
    fn drain(&mut self) -> Result<()> {
        while !self.reasoner.is_idle() && !self.stopped() {
            self.tick()?;
        }
        Ok(())
    }

    fn print(&self, tick: u64, line: &str) -> Result<()> {
        if !self.json {
            println!("{line}");
            return Ok(());
        }
        let (kind, sentence) = if let Some(rest) = line.strip_prefix("  IN: ") {
            ("in", rest)
        } else if let Some(rest) = line.strip_prefix(" OUT: ") {
            ("out", rest)
        } else {
            ("other", line.trim())
        };
        let json = serde_json::to_string(&ReportLine {
            tick,
            kind,
            sentence,
        })
        .context("failed to serialize report line")?;
        println!("{json}");
        Ok(())
    }
}

async fn cmd_run(cli: &Cli, files: &[PathBuf], steps: u64, json: bool) -> Result<()> {
    let params = load_params(cli)?;
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, stopping after the current tick");
                stop.store(true, Ordering::Relaxed);
            }
        });
    }

    let mut driver = Driver {
        reasoner: Reasoner::new(params),
        json,
        stop,
    };

    let stdin_only = [PathBuf::from("-")];
    let sources = if files.is_empty() { &stdin_only[..] } else { files };
    for source in sources {
        if driver.stopped() {
            break;
        }
        if source.as_os_str() == "-" {
            feed_stdin(&mut driver).await?;
        } else {
            let text = tokio::fs::read_to_string(source)
                .await
                .with_context(|| format!("failed to read {}", source.display()))?;
            driver.reasoner.add_input(&text);
            driver.drain()?;
        }
    }

    for _ in 0..steps {
        if driver.stopped() {
            break;
        }
        driver.tick()?;
    }
    tracing::debug!(ticks = driver.reasoner.clock(), "run finished");
    Ok(())
}

/// Stdin is read line by line; the queued lines run when a step-count line
/// arrives and at end of input, as they would from a file.
async fn feed_stdin(driver: &mut Driver) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let steps = matches!(InputLine::parse(&line), InputLine::Steps(_));
        driver.reasoner.add_input(&line);
        if steps {
            driver.drain()?;
        }
        if driver.stopped() {
            return Ok(());
        }
    }
    driver.drain()
}

// ---------------------------------------------------------------------------
// check / params
// ---------------------------------------------------------------------------

fn cmd_check(cli: &Cli, file: &Path) -> Result<()> {
    let params = load_params(cli)?;
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let mut memory = Memory::new(params);
    let mut failures = 0usize;
    for (number, line) in text.lines().enumerate() {
        let InputLine::Sentence(sentence) = InputLine::parse(line) else {
            continue;
        };
        match parse_task(&sentence, &mut memory) {
            Ok(task) => println!("{}: {}", number + 1, task.sentence().key()),
            Err(e) => {
                println!("{}: error: {e}", number + 1);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} line(s) in {} failed to parse", file.display());
    }
    Ok(())
}

fn cmd_params(cli: &Cli) -> Result<()> {
    let params = load_params(cli)?;
    let text = toml::to_string_pretty(&params).context("failed to serialize parameters")?;
    print!("{text}");
    Ok(())
}

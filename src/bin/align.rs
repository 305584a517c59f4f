use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::PathBuf,
    str::FromStr,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use grammar_aligner::{
    AlignConfig, AlignMode, Checkpoint, HypothesisConfig, Learner, PartPolicy, Seed, Session,
    Treebank, corpus::RunHeader,
};

const PROGRAM: &str = "align";

/// Proposes constituents by aligning the sentences of a corpus
#[derive(Debug, Parser)]
#[command(name = PROGRAM, version, about)]
struct Args {
    /// Alignment method: wm, wb, aa, st1-st4, left, right or both
    #[arg(short, long, value_parser = AlignMode::from_str)]
    align: AlignMode,

    /// Input corpus, `-` for stdin
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    input: PathBuf,

    /// Output corpus, `-` for stdout
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    output: PathBuf,

    /// Which parts of an alignment become hypotheses: equal, unequal or both
    #[arg(short, long, value_parser = PartPolicy::from_str, default_value = "unequal")]
    part: PartPolicy,

    /// Seed index (0-9) for random branching
    #[arg(short, long, default_value_t = 0)]
    seed: usize,

    /// Seconds between checkpoints; no checkpoints are written without it
    #[arg(short, long, value_name = "SECONDS")]
    time: Option<u64>,

    /// Prefix of checkpoint files
    #[arg(short, long, value_name = "PREFIX", default_value = "align")]
    check: PathBuf,

    /// Never hypothesise empty constituents
    #[arg(short, long = "excl-empty")]
    excl_empty: bool,

    /// Give every hypothesis a fresh label instead of reusing existing ones
    #[arg(short, long)]
    nomerge: bool,

    /// Compare every pair of sentences, not only those sharing a token
    #[arg(short = 'x', long)]
    exhaustive: bool,

    /// Report progress
    #[arg(short, long)]
    verbose: bool,

    /// Report every aligned pair
    #[arg(short, long)]
    debug: bool,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One annotated sentence per line
    Text,
    Json,
}

impl Args {
    fn config(&self) -> Result<AlignConfig> {
        let mut config = AlignConfig::new(self.align);
        config.hypotheses = HypothesisConfig {
            part: self.part,
            merge: !self.nomerge,
            exclude_empty: self.excl_empty,
        };
        config.exhaustive = self.exhaustive;
        config.seed = Seed::new(self.seed)?;
        config.checkpoint = self.time.map(|secs| Checkpoint {
            interval: Duration::from_secs(secs),
            prefix: self.check.clone(),
        });
        Ok(config)
    }

    fn init_logging(&self) {
        let level = if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
            .init();
    }
}

fn is_stdio(path: &std::path::Path) -> bool {
    path.as_os_str() == "-"
}

fn read_input(path: &PathBuf) -> Result<String> {
    let mut text = String::new();
    if is_stdio(path) {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("could not read the corpus from stdin")?;
    } else {
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut text))
            .with_context(|| format!("could not read corpus {}", path.display()))?;
    }
    Ok(text)
}

fn open_output(path: &PathBuf) -> Result<Box<dyn Write>> {
    Ok(if is_stdio(path) {
        Box::new(std::io::stdout().lock())
    } else {
        let file = File::create(path)
            .with_context(|| format!("could not create {}", path.display()))?;
        Box::new(file)
    })
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.init_logging();
    log::debug!("{args:?}");

    let config = args.config()?;
    let started = Instant::now();
    let text = read_input(&args.input)?;

    let mut session = Session::new();
    let mut treebank = Treebank::parse(&text, &mut session)
        .with_context(|| format!("could not parse corpus {}", args.input.display()))?;
    let mut out = BufWriter::new(open_output(&args.output)?);

    let hypotheses = Learner::new(config).run(&mut treebank, &mut session);

    match args.format {
        OutputFormat::Text => {
            let header = RunHeader {
                program: PROGRAM.to_string(),
                elapsed: started.elapsed(),
                date: chrono::Local::now()
                    .format("%a %b %e %H:%M:%S %Y")
                    .to_string(),
                command: std::env::args().collect::<Vec<_>>().join(" "),
                hypotheses,
            };
            treebank.write_header(&header, &mut out)?;
            treebank.write(&session.tokens, &mut out)?;
        }
        OutputFormat::Json => {
            treebank.write_json(&session.tokens, &mut out)?;
            writeln!(out)?;
        }
    }
    out.flush().context("could not write the aligned corpus")?;
    Ok(())
}

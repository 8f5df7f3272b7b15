//! pcls: packet classification rule toolkit
//!
//! Usage:
//!   pcls convert  -r <RULES> -o <OUT> [--expand] [--dedup exact|ignore-proto] [--format plain|prefix]
//!   pcls answer   -r <RULES> [-t <TRACES>] -o <OUT> [--engine linear|tuple] [--dims sip,dip]
//!   pcls megaflow -r <RULES> -t <TRACES> -o <OUT>
//!   pcls tse      -o <OUT> [--shuffled <OUT>] [--packets <OUT>]
//!
//! Examples:
//!   # Answer the low-corner traces of every rule, with a quarter of the rules deleted
//!   pcls -v answer -r acl1.rules -o acl1.ans --mode delete-quarter
//!
//!   # Synthesize MegaFlow rules for an observed trace
//!   pcls megaflow -r acl1.rules -t acl1.trace -o acl1.mega
//!
//!   # Exhaustive MegaFlow benchmark set, ordered and shuffled, with its probe packets
//!   pcls tse -o tse.mega --shuffled tse_shuffle.mega --packets tse.packets

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use pclass_internal::prelude::*;

#[derive(Parser)]
#[command(name = "pcls")]
#[command(about = "Packet classification rule toolkit")]
#[command(version)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ReadArgs {
    /// Rule file
    #[arg(short, long)]
    rules: PathBuf,

    /// Keep rules by label: any, only:<label> or except:<label>
    #[arg(long, default_value = "any", value_parser = parse_label_filter)]
    labels: LabelFilter,

    /// Shuffle the rules after reading
    #[arg(long)]
    shuffle: bool,

    /// Seed for --shuffle
    #[arg(long, requires = "shuffle")]
    seed: Option<u64>,

    /// Stop at the first malformed rule
    #[arg(long)]
    strict: bool,
}

impl ReadArgs {
    fn options(&self) -> ReadOptions {
        let shuffle = match (self.shuffle, self.seed) {
            (false, _) => Shuffle::Keep,
            (true, None) => Shuffle::Random,
            (true, Some(seed)) => Shuffle::Seeded(seed),
        };
        ReadOptions {
            filter: self.labels,
            shuffle,
            strict: self.strict,
        }
    }

    fn read(&self) -> Result<Vec<Rule>> {
        let set = read_rules(&self.rules, &self.options())
            .with_context(|| format!("Failed to read rules from {}", self.rules.display()))?;
        Ok(set.rules)
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum DedupMode {
    Exact,
    IgnoreProto,
}

#[derive(Copy, Clone, ValueEnum)]
enum OutputFormat {
    Plain,
    Prefix,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a rule file, optionally expanded and deduplicated
    Convert {
        #[command(flatten)]
        read: ReadArgs,

        /// Output rule file
        #[arg(short, long)]
        output: PathBuf,

        /// Expand port ranges into prefixes
        #[arg(long)]
        expand: bool,

        /// Drop duplicated rules
        #[arg(long, value_enum)]
        dedup: Option<DedupMode>,

        /// Output format (default: plain, prefix when expanding)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Print the priority column
        #[arg(long)]
        priority: bool,
    },

    /// Answer traces with a lookup engine
    Answer {
        #[command(flatten)]
        read: ReadArgs,

        /// Trace file, generated from the rules when absent
        #[arg(short, long)]
        traces: Option<PathBuf>,

        /// Output answer file
        #[arg(short, long)]
        output: PathBuf,

        /// Lookup engine: linear or tuple
        #[arg(long, default_value = "tuple")]
        engine: EngineKind,

        /// Dimensions the tuple engine hashes on
        #[arg(long, default_value = "sip,dip")]
        dims: String,

        /// Answer mode: skip, full or delete-quarter
        #[arg(long, default_value = "full")]
        mode: AnswerMode,

        /// Only keep rules that are the best match of their own generated trace
        #[arg(long)]
        one_match: bool,

        /// Also write the (filtered) rules to this file
        #[arg(long)]
        save_rules: Option<PathBuf>,
    },

    /// Synthesize MegaFlow rules for a trace
    Megaflow {
        #[command(flatten)]
        read: ReadArgs,

        /// Trace file
        #[arg(short, long)]
        traces: PathBuf,

        /// Output MegaFlow rule file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write every MegaFlow prefix-length combination
    Tse {
        /// Output MegaFlow rule file, in generation order
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the rules shuffled to this file
        #[arg(long)]
        shuffled: Option<PathBuf>,

        /// Seed for --shuffled
        #[arg(long, requires = "shuffled")]
        seed: Option<u64>,

        /// Also write the matching probe packets to this file
        #[arg(long)]
        packets: Option<PathBuf>,
    },
}

fn parse_label_filter(s: &str) -> Result<LabelFilter, String> {
    let parse = |l: &str| l.parse::<u32>().map_err(|e| format!("bad label `{l}`: {e}"));
    match s.split_once(':') {
        None if s == "any" => Ok(LabelFilter::Any),
        Some(("only", l)) => Ok(LabelFilter::Only(parse(l)?)),
        Some(("except", l)) => Ok(LabelFilter::Except(parse(l)?)),
        _ => Err(format!(
            "unknown label filter `{s}`, expected any, only:<label> or except:<label>"
        )),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Convert {
            read,
            output,
            expand,
            dedup,
            format,
            priority,
        } => run_convert(read, output, expand, dedup, format, priority),
        Commands::Answer {
            read,
            traces,
            output,
            engine,
            dims,
            mode,
            one_match,
            save_rules,
        } => {
            let config = EngineConfig::with_dims(engine, &dims).context("Invalid --dims")?;
            run_answer(read, traces, output, config, mode, one_match, save_rules)
        }
        Commands::Megaflow {
            read,
            traces,
            output,
        } => run_megaflow(read, traces, output),
        Commands::Tse {
            output,
            shuffled,
            seed,
            packets,
        } => run_tse(output, shuffled, seed, packets),
    }
}

fn run_convert(
    read: ReadArgs,
    output: PathBuf,
    expand: bool,
    dedup_mode: Option<DedupMode>,
    format: Option<OutputFormat>,
    priority: bool,
) -> Result<()> {
    let mut rules = read.read()?;
    if expand {
        rules = expand_all(rules);
    }
    rules = match dedup_mode {
        None => rules,
        Some(DedupMode::Exact) => dedup(rules),
        Some(DedupMode::IgnoreProto) => dedup_ignore_protocol(rules),
    };
    let format = format.unwrap_or(if expand {
        OutputFormat::Prefix
    } else {
        OutputFormat::Plain
    });
    let saved = match format {
        OutputFormat::Plain => save_rules(&output, &rules, &PlainFormat, priority),
        OutputFormat::Prefix => save_rules(&output, &rules, &PrefixFormat, priority),
    };
    saved.with_context(|| format!("Failed to write rules to {}", output.display()))
}

fn run_answer(
    read: ReadArgs,
    traces: Option<PathBuf>,
    output: PathBuf,
    config: EngineConfig,
    mode: AnswerMode,
    one_match: bool,
    rules_out: Option<PathBuf>,
) -> Result<()> {
    let mut rules = read.read()?;
    if one_match {
        rules = one_match_rules(rules, &config);
    }
    if let Some(path) = rules_out {
        save_rules(&path, &rules, &PlainFormat, false)
            .with_context(|| format!("Failed to write rules to {}", path.display()))?;
    }
    let traces = match traces {
        Some(path) => {
            read_traces(&path)
                .with_context(|| format!("Failed to read traces from {}", path.display()))?
                .traces
        }
        None => generate_traces(&rules),
    };
    info!("answering {} traces over {} rules", traces.len(), rules.len());
    let answers = generate_answers(&rules, &traces, &config, mode);
    if mode != AnswerMode::Skip {
        save_answers(&output, &answers)
            .with_context(|| format!("Failed to write answers to {}", output.display()))?;
    }
    Ok(())
}

fn run_megaflow(read: ReadArgs, traces: PathBuf, output: PathBuf) -> Result<()> {
    let rules = expand_all(read.read()?);
    let traces = read_traces(&traces)
        .with_context(|| format!("Failed to read traces from {}", traces.display()))?
        .traces;
    let report = megaflow_rules(&rules, &traces).context("MegaFlow synthesis failed")?;
    report
        .save(&output, false)
        .with_context(|| format!("Failed to write MegaFlow rules to {}", output.display()))
}

fn run_tse(
    output: PathBuf,
    shuffled: Option<PathBuf>,
    seed: Option<u64>,
    packets: Option<PathBuf>,
) -> Result<()> {
    let rules = tse_megaflow_rules(Shuffle::Keep);
    save_rules(&output, &rules, &MegaFlowFormat, false)
        .with_context(|| format!("Failed to write MegaFlow rules to {}", output.display()))?;
    if let Some(path) = shuffled {
        let mut rules = rules;
        seed.map_or(Shuffle::Random, Shuffle::Seeded).apply(&mut rules);
        save_rules(&path, &rules, &MegaFlowFormat, false)
            .with_context(|| format!("Failed to write MegaFlow rules to {}", path.display()))?;
    }
    if let Some(path) = packets {
        save_megaflow_packets(&path)
            .with_context(|| format!("Failed to write packets to {}", path.display()))?;
    }
    Ok(())
}

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use parity_bench::harness::{BenchConfig, Profile};
use parity_bench::normalize::normalize;
use parity_bench::report::format_table;
use parity_bench::schema::{ParityReport, RunMeta, SCHEMA_VERSION};
use parity_bench::suite::{ChannelFailure, ChannelKind, Suite};
use parity_bench::suites::{self, REFERENCE_CHANNEL, WORKER_SEED};
use parity_bench::{aggregate, CargoBuild, Runner};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    Quick,
    Full,
}

impl From<ProfileArg> for Profile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Quick => Profile::Quick,
            ProfileArg::Full => Profile::Full,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
enum Format {
    /// Table on stdout.
    #[default]
    Human,
    /// Pretty JSON report.
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the backward-pass suites on both channels.
    Run {
        /// Only run suites with this name. Can be provided multiple times.
        #[arg(long, value_name = "NAME", action = clap::ArgAction::Append)]
        only: Vec<String>,

        /// Manifest of the crate providing the external worker target.
        #[arg(long, value_name = "FILE")]
        manifest_path: Option<PathBuf>,
    },

    /// List suites, their ids and channels.
    List,

    /// Re-normalize a saved JSON report against a (possibly different) baseline.
    Report {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Parser, Debug)]
#[command(name = "parity-bench")]
#[command(about = "Compare in-process and compiled implementations of the same kernels")]
struct Args {
    #[arg(long, value_enum, default_value_t = ProfileArg::Quick, global = true)]
    profile: ProfileArg,

    /// Seed for in-process inputs. The external worker always uses its fixed
    /// seed (0), so both channels see the same inputs only at the default.
    #[arg(long, default_value_t = WORKER_SEED, global = true)]
    seed: u64,

    /// Measured trials per channel (overrides the profile).
    #[arg(long, global = true)]
    trials: Option<u64>,

    /// Discarded warmup calls per channel (overrides the profile).
    #[arg(long, global = true)]
    warmup: Option<u64>,

    /// Channel every other channel is divided by.
    #[arg(long, default_value = REFERENCE_CHANNEL, global = true)]
    baseline: String,

    #[arg(long, value_enum, default_value_t = Format::Human, global = true)]
    format: Format,

    /// Where to write the JSON report, in addition to the chosen format.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

fn now_utc() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("unix:{secs}")
}

fn git_sha_short() -> Option<String> {
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

fn emit(args: &Args, report: &ParityReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(out) = &args.out {
        fs::write(out, &json).with_context(|| format!("writing {}", out.display()))?;
    }

    match args.format {
        Format::Json => println!("{json}"),
        Format::Human => {
            let agg = aggregate(&report.suites);
            let table = format_table(
                "Autograd Backwards Benchmark",
                &agg,
                report.normalized.as_ref(),
                &report.failures,
            );
            println!("{table}");
        }
    }
    Ok(())
}

fn run(
    args: &Args,
    cfg: BenchConfig,
    only: &[String],
    manifest_path: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let mut suites: Vec<Box<dyn Suite>> = suites::backwards(&cfg)
        .into_iter()
        .filter(|s| only.is_empty() || only.iter().any(|n| n == s.name()))
        .collect();
    if suites.is_empty() {
        anyhow::bail!("no suite matches {only:?}");
    }

    let mut tool = CargoBuild::default();
    if let Some(path) = manifest_path {
        tool = tool.with_manifest_path(path);
    }

    let mut runner = Runner::new(cfg.clone(), tool);
    let outcome = runner.run_all(&mut suites);
    let failures: Vec<ChannelFailure> = outcome.failures().cloned().collect();
    if !failures.is_empty() {
        tracing::warn!(count = failures.len(), "some channels failed");
    }

    let normalized = match normalize(&outcome.aggregate(), &args.baseline) {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(error = %e, "skipping normalization");
            None
        }
    };

    let report = ParityReport {
        run: RunMeta {
            schema_version: SCHEMA_VERSION,
            bench_version: env!("CARGO_PKG_VERSION").to_string(),
            profile: cfg.profile.as_str().to_string(),
            seed: cfg.seed,
            trials: cfg.trials(),
            warmup: cfg.warmup(),
            baseline: args.baseline.clone(),
            unit: "ns".to_string(),
            timestamp_utc: now_utc(),
            git_sha: git_sha_short(),
        },
        suites: outcome.suites,
        failures,
        normalized,
    };
    emit(args, &report)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        "parity_bench=debug"
    } else {
        "parity_bench=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cfg = BenchConfig {
        profile: args.profile.into(),
        seed: args.seed,
        trials: args.trials,
        warmup: args.warmup,
    };

    match &args.cmd {
        Command::Run {
            only,
            manifest_path,
        } => run(&args, cfg, only, manifest_path.as_ref()),
        Command::List => {
            for suite in suites::backwards(&cfg) {
                println!("{:>3}  {}", suite.id(), suite.name());
                for channel in suite.channels() {
                    match channel.kind {
                        ChannelKind::InProcess => println!("       {} (in-process)", channel.name),
                        ChannelKind::External { target } => {
                            println!("       {} (external: {target})", channel.name)
                        }
                    }
                }
            }
            Ok(())
        }
        Command::Report { input } => {
            let raw = fs::read_to_string(input)
                .with_context(|| format!("reading {}", input.display()))?;
            let mut report: ParityReport = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", input.display()))?;
            let agg = aggregate(&report.suites);
            report.normalized = Some(normalize(&agg, &args.baseline)?);
            report.run.baseline = args.baseline.clone();
            emit(&args, &report)
        }
    }
}

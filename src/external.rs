//! External runner protocol.
//!
//! A target is compiled once per [`ExecutableCache`], then invoked as
//! `executable <args..> <trials> <warmup>`. The process owns its own warmup
//! and trial loop and prints one integer sample per line on stdout.

use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::BenchError;
use crate::harness::{Sample, SampleSequence};

/// Compiles a named target and reports where the artifact landed.
pub trait BuildTool {
    fn build(&self, target: &str) -> Result<PathBuf, BenchError>;
}

/// `cargo build --release --bin <target> --message-format=json`.
#[derive(Clone, Debug)]
pub struct CargoBuild {
    pub cargo: PathBuf,
    pub manifest_path: Option<PathBuf>,
}

impl Default for CargoBuild {
    fn default() -> Self {
        Self {
            cargo: env::var_os("CARGO")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("cargo")),
            manifest_path: None,
        }
    }
}

impl CargoBuild {
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }
}

impl BuildTool for CargoBuild {
    fn build(&self, target: &str) -> Result<PathBuf, BenchError> {
        let mut cmd = Command::new(&self.cargo);
        cmd.args(["build", "--release", "--bin", target, "--message-format=json"]);
        if let Some(manifest) = &self.manifest_path {
            cmd.arg("--manifest-path").arg(manifest);
        }

        tracing::debug!(target_name = target, "invoking cargo build");
        let output = cmd
            .output()
            .map_err(|e| BenchError::build(target, format!("failed to spawn cargo: {e}")))?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let errors = compiler_errors(&stdout);
            let reason = if errors.is_empty() {
                format!("cargo exited with {}", output.status)
            } else {
                format!("cargo exited with {}:\n{}", output.status, errors.join("\n"))
            };
            return Err(BenchError::build(target, reason));
        }

        parse_artifact_path(&stdout)
            .ok_or_else(|| BenchError::build(target, "no executable artifact in build output"))
    }
}

#[derive(Debug, Deserialize)]
struct BuildMessage {
    #[serde(default)]
    executable: Option<PathBuf>,
    #[serde(default)]
    message: Option<CompilerMessage>,
}

#[derive(Debug, Deserialize)]
struct CompilerMessage {
    #[serde(default)]
    level: String,
    #[serde(default)]
    rendered: Option<String>,
}

fn records(stream: &str) -> impl Iterator<Item = BuildMessage> + '_ {
    stream
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<BuildMessage>(line) {
            Ok(msg) => Some(msg),
            Err(e) => {
                tracing::trace!(error = %e, "skipping non-record build output line");
                None
            }
        })
}

/// Path of the last record in a line-delimited JSON stream that carries a
/// non-null `executable` field.
pub fn parse_artifact_path(stream: &str) -> Option<PathBuf> {
    records(stream).filter_map(|msg| msg.executable).last()
}

fn compiler_errors(stream: &str) -> Vec<String> {
    records(stream)
        .filter_map(|msg| msg.message)
        .filter(|m| m.level == "error")
        .filter_map(|m| m.rendered)
        .map(|r| r.trim_end().to_string())
        .collect()
}

/// Target name to built executable, for the lifetime of one run.
///
/// Failed builds are not remembered, so a later lookup retries the build.
#[derive(Debug)]
pub struct ExecutableCache<B = CargoBuild> {
    tool: B,
    resolved: HashMap<String, PathBuf>,
}

impl<B: BuildTool> ExecutableCache<B> {
    pub fn new(tool: B) -> Self {
        Self {
            tool,
            resolved: HashMap::new(),
        }
    }

    pub fn tool(&self) -> &B {
        &self.tool
    }

    pub fn resolve_executable(&mut self, target: &str) -> Result<PathBuf, BenchError> {
        if let Some(path) = self.resolved.get(target) {
            tracing::debug!(target_name = target, path = %path.display(), "executable cache hit");
            return Ok(path.clone());
        }

        tracing::info!(target_name = target, "building external target");
        let path = self.tool.build(target)?;
        self.resolved.insert(target.to_string(), path.clone());
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// Invokes `executable` with `args` followed by `trials` and `warmup`, and
/// parses its stdout into exactly `trials` samples.
pub fn run_external<I, S>(
    executable: &Path,
    args: I,
    trials: u64,
    warmup: u64,
) -> Result<SampleSequence, BenchError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(executable)
        .args(args)
        .arg(trials.to_string())
        .arg(warmup.to_string())
        .output()
        .map_err(|e| BenchError::protocol(executable, format!("failed to spawn: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let reason = if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            format!("exited with {}: {stderr}", output.status)
        };
        return Err(BenchError::protocol(executable, reason));
    }

    let stdout = String::from_utf8(output.stdout)
        .map_err(|_| BenchError::protocol(executable, "stdout is not valid UTF-8"))?;
    parse_samples(&stdout, trials).map_err(|reason| BenchError::protocol(executable, reason))
}

/// Parses one integer per line, ignoring blank lines, and checks the count.
pub fn parse_samples(stdout: &str, expected: u64) -> Result<SampleSequence, String> {
    let mut samples = Vec::new();
    for (lineno, line) in stdout.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let sample: Sample = line
            .parse()
            .map_err(|_| format!("line {}: `{line}` is not an integer sample", lineno + 1))?;
        samples.push(sample);
    }

    if samples.len() as u64 != expected {
        return Err(format!(
            "expected {expected} samples, got {}",
            samples.len()
        ));
    }
    Ok(samples)
}

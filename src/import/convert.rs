//! Converting fetched markup into an e-book with an external tool.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::ShelfError;

/// Program used when none is configured (calibre's converter)
pub const DEFAULT_CONVERTER: &str = "ebook-convert";

/// Upper bound on one conversion
pub const DEFAULT_CONVERT_TIMEOUT: Duration = Duration::from_secs(600);

/// Lines of converter stderr carried in a failure message
const STDERR_TAIL_LINES: usize = 10;

/// Turns a markup file into a packaged e-book file.
#[async_trait]
pub trait Converter: Send + Sync + std::fmt::Debug {
    /// Convert `input` into `output`, returning the path of the produced book.
    ///
    /// An existing file at `output` is replaced.
    async fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf, ShelfError>;
}

/// Runs `<program> <input> <output> [extra args...]` and waits for it.
#[derive(Debug, Clone)]
pub struct EbookConvert {
    program: String,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl Default for EbookConvert {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERTER)
    }
}

impl EbookConvert {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            timeout: DEFAULT_CONVERT_TIMEOUT,
        }
    }

    /// Options appended after the two positional paths
    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn failed(&self, message: String) -> ShelfError {
        tracing::warn!(program = %self.program, "{}", message);
        ShelfError::ConversionFailed(message)
    }
}

#[async_trait]
impl Converter for EbookConvert {
    async fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf, ShelfError> {
        match tokio::fs::remove_file(output).await {
            Ok(()) => tracing::debug!(path = %output.display(), "Replacing existing output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(self.failed(format!(
                    "cannot replace {}: {}",
                    output.display(),
                    e
                )))
            }
        }

        tracing::debug!(
            program = %self.program,
            input = %input.display(),
            output = %output.display(),
            "Running converter"
        );

        let run = Command::new(&self.program)
            .arg(input)
            .arg(output)
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result,
            Err(_) => {
                return Err(self.failed(format!(
                    "{} timed out after {}s",
                    self.program,
                    self.timeout.as_secs_f64()
                )))
            }
        };

        let out = match result {
            Ok(out) => out,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(self.failed(format!(
                    "{} not found; is it installed and on PATH?",
                    self.program
                )))
            }
            Err(e) => return Err(self.failed(format!("failed to start {}: {}", self.program, e))),
        };

        let stdout = String::from_utf8_lossy(&out.stdout);
        let stderr = String::from_utf8_lossy(&out.stderr);
        if !stdout.trim().is_empty() {
            tracing::debug!(program = %self.program, "converter stdout:\n{}", stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            tracing::debug!(program = %self.program, "converter stderr:\n{}", stderr.trim_end());
        }

        if !out.status.success() {
            let tail = stderr_tail(&stderr);
            let message = if tail.is_empty() {
                format!("{} exited with {}", self.program, out.status)
            } else {
                format!("{} exited with {}: {}", self.program, out.status, tail)
            };
            return Err(self.failed(message));
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(self.failed(format!(
                "{} reported success but produced no {}",
                self.program,
                output.display()
            )));
        }

        Ok(output.to_path_buf())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

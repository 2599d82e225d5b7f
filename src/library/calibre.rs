//! calibre library store backed by the `calibredb` command.

use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::process::Command;

use crate::error::ShelfError;
use crate::library::{BookFormat, BookMetadata, LibraryEntry, LibraryStore};

/// calibre's command-line database tool
pub const DEFAULT_CALIBREDB: &str = "calibredb";

const CALIBREDB_TIMEOUT: Duration = Duration::from_secs(120);

/// A calibre library at a fixed location on disk.
#[derive(Debug, Clone)]
pub struct CalibreLibrary {
    library_path: PathBuf,
    calibredb: String,
    timeout: Duration,
}

impl CalibreLibrary {
    pub fn new(library_path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: library_path.into(),
            calibredb: DEFAULT_CALIBREDB.to_string(),
            timeout: CALIBREDB_TIMEOUT,
        }
    }

    /// Use a different `calibredb` executable
    pub fn calibredb(mut self, program: impl Into<String>) -> Self {
        self.calibredb = program.into();
        self
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    /// Arguments for `calibredb add` of the first format
    fn add_args(&self, metadata: &BookMetadata, file: &Path) -> Vec<String> {
        let mut args = vec![
            "add".to_string(),
            "--library-path".to_string(),
            self.library_path.display().to_string(),
            "--title".to_string(),
            metadata.title.clone(),
            "--authors".to_string(),
            metadata.authors.join(" & "),
        ];
        if let Some(id) = &metadata.arxiv_id {
            args.push("--identifier".to_string());
            args.push(format!("arxiv:{}", id));
        }
        if !metadata.tags.is_empty() {
            args.push("--tags".to_string());
            args.push(metadata.tags.join(","));
        }
        args.push(file.display().to_string());
        args
    }

    /// Arguments for `calibredb add_format` of any further format
    fn add_format_args(&self, book_id: u64, file: &Path) -> Vec<String> {
        vec![
            "add_format".to_string(),
            "--library-path".to_string(),
            self.library_path.display().to_string(),
            book_id.to_string(),
            file.display().to_string(),
        ]
    }

    async fn run(&self, args: &[String]) -> Result<String, ShelfError> {
        tracing::debug!(program = %self.calibredb, ?args, "Running calibredb");

        let run = Command::new(&self.calibredb)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let out = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(out)) => out,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ShelfError::RegistrationFailed(format!(
                    "{} not found; is calibre installed?",
                    self.calibredb
                )))
            }
            Ok(Err(e)) => {
                return Err(ShelfError::RegistrationFailed(format!(
                    "failed to start {}: {}",
                    self.calibredb, e
                )))
            }
            Err(_) => {
                return Err(ShelfError::RegistrationFailed(format!(
                    "{} timed out after {}s",
                    self.calibredb,
                    self.timeout.as_secs()
                )))
            }
        };

        let stdout = String::from_utf8_lossy(&out.stdout).to_string();
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ShelfError::RegistrationFailed(format!(
                "{} exited with {}: {}",
                self.calibredb,
                out.status,
                stderr.trim()
            )));
        }
        Ok(stdout)
    }
}

/// Book id from `calibredb add` output ("Added book ids: 42")
fn parse_added_id(stdout: &str) -> Option<u64> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"Added book ids?:\s*(\d+)").expect("added-id pattern is valid")
    });
    re.captures(stdout)?.get(1)?.as_str().parse().ok()
}

#[async_trait]
impl LibraryStore for CalibreLibrary {
    fn name(&self) -> &str {
        "calibre"
    }

    async fn add_book(
        &self,
        metadata: &BookMetadata,
        formats: &BTreeMap<BookFormat, PathBuf>,
    ) -> Result<LibraryEntry, ShelfError> {
        let mut files = formats.iter();
        let Some((first_format, first_file)) = files.next() else {
            return Err(ShelfError::RegistrationFailed(
                "no book files to add".to_string(),
            ));
        };

        let stdout = self.run(&self.add_args(metadata, first_file)).await?;
        let book_id = parse_added_id(&stdout).ok_or_else(|| {
            ShelfError::RegistrationFailed(format!(
                "calibredb did not add the book: {}",
                stdout.trim()
            ))
        })?;
        tracing::debug!(book_id, format = %first_format, "Added book to calibre");

        for (format, file) in files {
            self.run(&self.add_format_args(book_id, file)).await?;
            tracing::debug!(book_id, %format, "Added format to calibre book");
        }

        Ok(LibraryEntry {
            location: format!(
                "calibre book {} in {}",
                book_id,
                self.library_path.display()
            ),
        })
    }
}

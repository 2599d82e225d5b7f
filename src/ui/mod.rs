//! Terminal output: result lists, the details view, status lines and spinners.
//!
//! The `*_text` and `*_line` functions return plain strings so they can be
//! tested; the `print_*` functions add color and write to stdout.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::import::ImportEvent;
use crate::models::PaperRecord;
use crate::utils::truncate_chars;

/// Shown while a search is in flight
pub const SEARCHING_MESSAGE: &str = "Searching arXiv...";

/// Shown when a search returns no entries
pub const NO_RESULTS_MESSAGE: &str = "No results found for your query.";

/// Characters of the author list shown in a result line
const AUTHOR_PREVIEW_CHARS: usize = 50;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
    }
}

/// Print a styled status message. Errors and warnings go to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => println!("{} {}", icon.green().bold(), msg),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
    }
}

/// One entry of the result list: the 1-based position and title, then the
/// first 50 characters of the author list on an indented second line.
pub fn result_line(position: usize, record: &PaperRecord) -> String {
    format!(
        "{}. {}\n    by {}...",
        position,
        record.title,
        truncate_chars(&record.authors, AUTHOR_PREVIEW_CHARS)
    )
}

/// Color a result line: bold position and title, cyan author preview
fn styled_result_line(line: &str) -> String {
    match line.split_once('\n') {
        Some((head, authors)) => format!("{}\n{}", head.bold(), authors.cyan()),
        None => line.bold().to_string(),
    }
}

/// Print the numbered result list
pub fn print_results(records: &[PaperRecord]) {
    if records.is_empty() {
        print_status(Status::Info, NO_RESULTS_MESSAGE);
        return;
    }
    for (i, record) in records.iter().enumerate() {
        println!("{}", styled_result_line(&result_line(i + 1, record)));
    }
}

/// Field labels of the details view, in display order
const DETAIL_LABELS: [&str; 4] = ["Authors:", "Published:", "arXiv ID:", "arXiv URL:"];

/// Heading above the abstract in the details view
const ABSTRACT_HEADING: &str = "Abstract";

/// The details view of a record, uncolored
pub fn details_text(record: &PaperRecord) -> String {
    let [authors, published, arxiv_id, arxiv_url] = DETAIL_LABELS;
    format!(
        "{}\n\n{} {}\n{} {}\n{} {}\n{} {}\n\n{}\n{}",
        record.title,
        authors,
        record.authors,
        published,
        record.published,
        arxiv_id,
        record.arxiv_id,
        arxiv_url,
        record.arxiv_url,
        ABSTRACT_HEADING,
        record.summary
    )
}

/// Color a details view: title, field labels and the abstract heading.
/// The abstract itself is left as is.
fn styled_details(text: &str) -> String {
    let mut styled = Vec::new();
    let mut in_abstract = false;
    for (i, line) in text.split('\n').enumerate() {
        let label = DETAIL_LABELS.iter().find(|label| line.starts_with(*label));
        styled.push(match label {
            _ if in_abstract => line.to_string(),
            _ if i == 0 => line.bold().blue().to_string(),
            _ if line == ABSTRACT_HEADING => {
                in_abstract = true;
                line.bold().cyan().to_string()
            }
            Some(label) => format!("{}{}", label.bold(), &line[label.len()..]),
            None => line.to_string(),
        });
    }
    styled.join("\n")
}

/// Print the details view of a record
pub fn print_details(record: &PaperRecord) {
    println!("{}", styled_details(&details_text(record)));
}

/// Spinner message for an import progress event
pub fn import_event_message(event: &ImportEvent) -> String {
    match event {
        ImportEvent::Resolved { url } => format!("Fetching {}", url),
        ImportEvent::Fetched { bytes } => {
            format!("Converting ({} downloaded)", format_file_size(*bytes as u64))
        }
        ImportEvent::Converted { .. } => "Adding to library".to_string(),
        ImportEvent::Registered { location } => format!("Added to {}", location),
    }
}

/// Get a human-readable file size.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn spinner_style(template: &str, ticks: &str) -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(template)
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
        .tick_chars(ticks)
}

/// A loading spinner with a message.
///
/// Hidden when stdout is not a terminal so piped output stays clean.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a spinner with the given message. It is only drawn when
    /// `visible` is set and stdout is a terminal.
    pub fn with_visibility(msg: &str, visible: bool) -> Self {
        let pb = if visible && is_terminal() {
            indicatif::ProgressBar::new_spinner()
        } else {
            indicatif::ProgressBar::hidden()
        };
        pb.set_style(spinner_style("{spinner:.cyan} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.set_style(spinner_style("{spinner:.green} {msg}", "✓✓"));
        self.pb.finish_with_message(msg.to_string());
    }

    pub fn is_hidden(&self) -> bool {
        self.pb.is_hidden()
    }

    /// Remove the spinner without leaving a line behind
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record() -> PaperRecord {
        PaperRecord {
            title: "Attention Is All You Need".to_string(),
            authors: "Ashish Vaswani, Noam Shazeer, Niki Parmar, Jakob Uszkoreit, Llion Jones"
                .to_string(),
            summary: "The dominant sequence transduction models...".to_string(),
            published: "2017-06-12".to_string(),
            arxiv_id: "1706.03762v7".to_string(),
            arxiv_url: "http://arxiv.org/abs/1706.03762v7".to_string(),
        }
    }

    #[test]
    fn test_result_line_truncates_authors() {
        assert_eq!(
            result_line(3, &record()),
            "3. Attention Is All You Need\n    by Ashish Vaswani, Noam Shazeer, Niki Parmar, Jakob U..."
        );
    }

    #[test]
    fn test_result_line_short_authors_still_elided() {
        let line = result_line(1, &PaperRecord::default());
        assert_eq!(line, "1. No title available\n    by Unknown authors...");
    }

    #[test]
    fn test_details_text() {
        let text = details_text(&record());
        assert!(text.starts_with("Attention Is All You Need\n"));
        assert!(text.contains("Published: 2017-06-12"));
        assert!(text.contains("arXiv ID: 1706.03762v7"));
        assert!(text.contains("\narXiv URL: http://arxiv.org/abs/1706.03762v7\n"));
        assert!(text.ends_with("Abstract\nThe dominant sequence transduction models..."));
    }

    fn strip_ansi(text: &str) -> String {
        regex::Regex::new("\x1b\\[[0-9;]*m")
            .unwrap()
            .replace_all(text, "")
            .into_owned()
    }

    #[test]
    fn test_styled_result_line_keeps_text() {
        let line = result_line(3, &record());
        let styled = styled_result_line(&line);
        assert_ne!(styled, line);
        assert_eq!(strip_ansi(&styled), line);
    }

    #[test]
    fn test_styled_details_keeps_text() {
        let mut record = record();
        record.summary = "First line.\nAuthors: not a label here.".to_string();
        let text = details_text(&record);
        let styled = styled_details(&text);
        assert_eq!(strip_ansi(&styled), text);
        assert!(styled.ends_with("\nFirst line.\nAuthors: not a label here."));
        assert!(styled.contains(&format!("{} http://arxiv.org", "arXiv URL:".bold())));
    }

    #[test]
    fn test_spinner_hidden_when_not_visible() {
        let spinner = Spinner::with_visibility("Importing", false);
        assert!(spinner.is_hidden());
        spinner.set_message("Adding to library");
        spinner.clear();
    }

    #[test]
    fn test_import_event_message() {
        assert_eq!(
            import_event_message(&ImportEvent::Fetched { bytes: 2048 }),
            "Converting (2.00 KB downloaded)"
        );
        assert_eq!(
            import_event_message(&ImportEvent::Converted {
                path: PathBuf::from("/tmp/paper.epub")
            }),
            "Adding to library"
        );
    }

    #[test]
    fn test_status_icon() {
        assert_eq!(status_icon(Status::Success), "✓");
        assert_eq!(status_icon(Status::Error), "✗");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(500), "500 B");
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(1048576), "1.00 MB");
    }
}

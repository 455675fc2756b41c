//! CLI output formatting.
//!
//! # Output Format
//!
//! One block per file as it finishes, in completion order, then a summary:
//!
//! ```text
//! Compressing 3 files
//! [ 33%] holiday.jpg → holiday-compressed.jpg
//!     4.21 MB → 198.4 KB (-95%), 1600x1067, quality 0.72
//! [ 67%] logo.png → logo-compressed.png
//!     12.0 KB → 31.6 KB (-0%), 512x512
//!     Note: lossless output cannot be sized to a target; use JPEG or WebP
//! [100%] broken.jpg
//!     Error: could not decode image: unsupported or unrecognized image format
//!
//! Compressed 2 of 3 files, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchReport, FileSummary};

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;

/// Human-readable byte size: KB with one decimal below 1 MB, MB with two above.
pub fn bytes_to_nice(bytes: u64) -> String {
    let b = bytes as f64;
    if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.2} MB", b / MB)
    }
}

/// Format a completion fraction as a fixed-width percentage.
fn format_progress(progress: f64) -> String {
    format!("[{:>3}%]", (progress.clamp(0.0, 1.0) * 100.0).round() as u32)
}

fn file_lines(summary: &FileSummary) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(error) = &summary.error {
        lines.push(format!("    Error: {}", error));
        return lines;
    }

    if let (Some(before), Some(after)) = (summary.original_size, summary.compressed_size) {
        let mut detail = format!(
            "    {} → {} (-{}%)",
            bytes_to_nice(before),
            bytes_to_nice(after as u64),
            summary.saved_percent.unwrap_or(0)
        );
        if let (Some(w), Some(h)) = (summary.width, summary.height) {
            detail.push_str(&format!(", {}x{}", w, h));
        }
        if let Some(q) = summary.quality {
            detail.push_str(&format!(", quality {:.2}", q.value()));
        }
        lines.push(detail);
    }
    if let Some(note) = summary.note {
        lines.push(format!("    Note: {}", note));
    }
    lines
}

/// Format a single batch event.
pub fn format_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            let noun = if *total == 1 { "file" } else { "files" };
            vec![format!("Compressing {} {}", total, noun)]
        }
        BatchEvent::FileFinished { summary, progress } => {
            let header = match &summary.output_name {
                Some(out) => format!("{} {} → {}", format_progress(*progress), summary.name, out),
                None => format!("{} {}", format_progress(*progress), summary.name),
            };
            let mut lines = vec![header];
            lines.extend(file_lines(summary));
            lines
        }
    }
}

/// Format the end-of-batch summary.
pub fn format_summary(report: &BatchReport) -> Vec<String> {
    let total = report.outcomes.len();
    let failed = report.failure_count();
    let succeeded = total - failed;

    let mut line = format!("Compressed {} of {} files", succeeded, total);
    if failed > 0 {
        line.push_str(&format!(", {} failed", failed));
    }

    let before: u64 = report.succeeded().map(|f| f.original_size).sum();
    let after: u64 = report.succeeded().map(|f| f.compressed_size as u64).sum();
    let mut lines = vec![String::new(), line];
    if succeeded > 0 {
        lines.push(format!(
            "Total: {} → {}",
            bytes_to_nice(before),
            bytes_to_nice(after)
        ));
    }
    lines
}

pub fn print_summary(report: &BatchReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{CompressedFile, FileError, FileOutcome};
    use crate::imaging::{CompressionResult, Quality, TargetNote};

    fn compressed(name: &str, before: u64, after: usize) -> FileOutcome {
        FileOutcome {
            name: name.to_string(),
            result: Ok(CompressedFile {
                output_name: crate::naming::output_name(name, crate::imaging::Codec::Jpeg),
                original_size: before,
                compressed_size: after,
                result: CompressionResult {
                    encoded: vec![0; after],
                    width: 1600,
                    height: 1067,
                    quality: Some(Quality::new(0.72)),
                    note: None,
                    reductions: 0,
                    attempts: Vec::new(),
                },
            }),
        }
    }

    fn failed(name: &str) -> FileOutcome {
        FileOutcome {
            name: name.to_string(),
            result: Err(FileError::Decode("bad header".into())),
        }
    }

    // =========================================================================
    // Byte sizes
    // =========================================================================

    #[test]
    fn bytes_below_one_mb_shown_in_kb() {
        assert_eq!(bytes_to_nice(0), "0.0 KB");
        assert_eq!(bytes_to_nice(512), "0.5 KB");
        assert_eq!(bytes_to_nice(200 * 1024), "200.0 KB");
        assert_eq!(bytes_to_nice(1024 * 1024 - 1), "1024.0 KB");
    }

    #[test]
    fn bytes_from_one_mb_shown_in_mb() {
        assert_eq!(bytes_to_nice(1024 * 1024), "1.00 MB");
        assert_eq!(bytes_to_nice(20 * 1024 * 1024), "20.00 MB");
        assert_eq!(bytes_to_nice(4_414_000), "4.21 MB");
    }

    #[test]
    fn progress_is_padded() {
        assert_eq!(format_progress(0.0), "[  0%]");
        assert_eq!(format_progress(1.0 / 3.0), "[ 33%]");
        assert_eq!(format_progress(1.0), "[100%]");
    }

    // =========================================================================
    // Events
    // =========================================================================

    #[test]
    fn started_event() {
        assert_eq!(
            format_event(&BatchEvent::Started { total: 3 }),
            vec!["Compressing 3 files"]
        );
        assert_eq!(
            format_event(&BatchEvent::Started { total: 1 }),
            vec!["Compressing 1 file"]
        );
    }

    #[test]
    fn finished_event_success() {
        let summary = compressed("holiday.jpg", 4_414_000, 203_162).summary();
        let lines = format_event(&BatchEvent::FileFinished {
            summary,
            progress: 1.0 / 3.0,
        });
        assert_eq!(lines[0], "[ 33%] holiday.jpg → holiday-compressed.jpg");
        assert_eq!(
            lines[1],
            "    4.21 MB → 198.4 KB (-95%), 1600x1067, quality 0.72"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn finished_event_with_note() {
        let mut outcome = compressed("logo.png", 12 * 1024, 40_000);
        if let Ok(file) = &mut outcome.result {
            file.result.quality = None;
            file.result.note = Some(TargetNote::LosslessCodec);
        }
        let lines = format_event(&BatchEvent::FileFinished {
            summary: outcome.summary(),
            progress: 1.0,
        });
        assert!(lines[1].contains("(-0%)"));
        assert!(!lines[1].contains("quality"));
        assert_eq!(
            lines[2],
            "    Note: lossless output cannot be sized to a target; use JPEG or WebP"
        );
    }

    #[test]
    fn finished_event_failure() {
        let lines = format_event(&BatchEvent::FileFinished {
            summary: failed("broken.jpg").summary(),
            progress: 1.0,
        });
        assert_eq!(
            lines,
            vec![
                "[100%] broken.jpg",
                "    Error: could not decode image: bad header"
            ]
        );
    }

    // =========================================================================
    // Summary
    // =========================================================================

    #[test]
    fn summary_counts_failures() {
        let report = BatchReport {
            outcomes: vec![
                compressed("a.jpg", 2 * 1024 * 1024, 100 * 1024),
                failed("b.jpg"),
                compressed("c.jpg", 1024 * 1024, 100 * 1024),
            ],
        };
        assert_eq!(
            format_summary(&report),
            vec![
                "",
                "Compressed 2 of 3 files, 1 failed",
                "Total: 3.00 MB → 200.0 KB"
            ]
        );
    }

    #[test]
    fn summary_all_failed_has_no_total() {
        let report = BatchReport {
            outcomes: vec![failed("x.jpg")],
        };
        assert_eq!(
            format_summary(&report),
            vec!["", "Compressed 0 of 1 files, 1 failed"]
        );
    }
}

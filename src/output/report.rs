//! Final category report
//!
//! Rendered once after the key space is exhausted. Plain text, meant for
//! people rather than tools.

use crate::output::stats::CategoryStats;
use crate::output::OutputResult;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the category report to `output_path`
///
/// # Returns
///
/// * `Ok(true)` - Report written
/// * `Ok(false)` - No statistics yet, nothing written
/// * `Err(OutputError)` - Failed to write the file
pub fn write_report(stats: &CategoryStats, output_path: &Path) -> OutputResult<bool> {
    if stats.is_empty() {
        tracing::warn!("No category statistics found, skipping report");
        return Ok(false);
    }

    let report = format_report(stats, Utc::now());

    let mut file = File::create(output_path)?;
    file.write_all(report.as_bytes())?;

    tracing::info!("Category report written to {}", output_path.display());
    Ok(true)
}

/// Formats the category report
pub fn format_report(stats: &CategoryStats, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();

    out.push_str("Categories and article counts\n");
    out.push_str("Sorted by number of articles\n");
    out.push_str(&"=".repeat(40));
    out.push('\n');
    out.push_str(&format!("Generated: {}\n\n", generated_at.to_rfc3339()));

    out.push_str(&format!(
        "TOTAL OBSERVATIONS: {}\n\n",
        stats.total_observations()
    ));

    for (name, entry) in stats.sorted_by_count() {
        let keys: Vec<String> = entry.associated_keys.iter().map(u32::to_string).collect();
        out.push_str(&format!(
            "{}: {} articles (found under keys: [{}])\n",
            capitalize(name),
            entry.count,
            keys.join(", ")
        ));
    }

    out
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn sample_stats() -> CategoryStats {
        let mut stats = CategoryStats::new();
        stats.record_observation("svet", 9);
        for key in [42, 42, 3] {
            stats.record_observation("domaci", key);
        }
        stats
    }

    #[test]
    fn test_format_report() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let report = format_report(&sample_stats(), at);

        assert!(report.contains("TOTAL OBSERVATIONS: 4\n"));
        assert!(report.contains("Generated: 2024-05-01T12:00:00+00:00"));

        let domaci = report
            .find("Domaci: 3 articles (found under keys: [3, 42])")
            .unwrap();
        let svet = report
            .find("Svet: 1 articles (found under keys: [9])")
            .unwrap();
        assert!(domaci < svet);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("domaci"), "Domaci");
        assert_eq!(capitalize("ekonomika/finance"), "Ekonomika/finance");
        assert_eq!(capitalize("čr"), "Čr");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_write_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.txt");

        assert!(write_report(&sample_stats(), &path).unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Categories and article counts\n"));
    }

    #[test]
    fn test_empty_stats_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.txt");

        assert!(!write_report(&CategoryStats::new(), &path).unwrap());
        assert!(!path.exists());
    }
}

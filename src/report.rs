//! Coverage tables built from the Istanbul map embedded in Jest results.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::annotations::relative_path;
use crate::format::truncate_left;
use crate::istanbul::CoverageMap;
use crate::model::{CoverageSummary, Results};

/// Leading text of every coverage comment. Existing comments starting with
/// it are replaced on the next run.
pub const COVERAGE_HEADER: &str = "<!-- jestcheck-coverage -->\n### :loop: Code coverage\n\n";

/// Directory labels longer than this are shortened from the left.
pub const MAX_DIRECTORY_WIDTH: usize = 50;

const COLUMNS: [&str; 4] = ["Statements", "Branches", "Functions", "Lines"];

/// Coverage health bucket for a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Good,
    Ok,
    Poor,
    Critical,
}

impl Level {
    /// Thresholds are strict: exactly 80 is `Ok`, exactly 50 is `Critical`.
    #[must_use]
    pub fn classify(pct: f64) -> Level {
        if pct > 80.0 {
            Level::Good
        } else if pct > 65.0 {
            Level::Ok
        } else if pct > 50.0 {
            Level::Poor
        } else {
            Level::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Good => "good",
            Level::Ok => "ok",
            Level::Poor => "poor",
            Level::Critical => "critical",
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            Level::Good => "🟢",
            Level::Ok => "🟡",
            Level::Poor => "🟠",
            Level::Critical => "🔴",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source file row.
#[derive(Debug, Clone)]
pub struct FileRow {
    /// Base file name, used as the row label.
    pub name: String,
    pub summary: CoverageSummary,
}

/// Files sharing a containing directory, with their combined counts.
#[derive(Debug, Clone)]
pub struct DirectoryGroup {
    pub directory: String,
    pub summary: CoverageSummary,
    pub files: Vec<FileRow>,
}

/// Aggregate plus per-directory/per-file coverage, ready to be formatted.
#[derive(Debug, Clone)]
pub struct CoverageTable {
    pub total: CoverageSummary,
    /// Directories in the order they are first met while scanning files.
    pub directories: Vec<DirectoryGroup>,
}

impl CoverageTable {
    /// Group the files of a coverage map by containing directory.
    #[must_use]
    pub fn from_map(map: &CoverageMap, root: &Path) -> Self {
        let mut directories: Vec<DirectoryGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for file in map.files() {
            let path = relative_path(file, root);
            let rel = Path::new(&path);
            let name = rel
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            let directory = match rel.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_string_lossy().into_owned(),
                _ => ".".to_string(),
            };
            let summary = map.file_summary(file).unwrap_or_default();

            let slot = *index.entry(directory.clone()).or_insert_with(|| {
                directories.push(DirectoryGroup {
                    directory,
                    summary: CoverageSummary::default(),
                    files: Vec::new(),
                });
                directories.len() - 1
            });
            let group = &mut directories[slot];
            group.summary.merge(&summary);
            group.files.push(FileRow { name, summary });
        }

        Self {
            total: map.summary(),
            directories,
        }
    }

    /// Format using a specific formatter.
    #[must_use]
    pub fn format(&self, formatter: &dyn ReportFormatter) -> String {
        formatter.format(self)
    }
}

/// Outcome of building a coverage report.
#[derive(Debug, Clone)]
pub enum CoverageReport {
    /// The run did not collect coverage at all.
    NotCollected,
    /// Coverage was collected but contains no files.
    Empty,
    Table(CoverageTable),
}

impl CoverageReport {
    /// Markdown comment body, or `None` when there is nothing to post.
    #[must_use]
    pub fn comment_body(&self) -> Option<String> {
        match self {
            CoverageReport::Table(table) => Some(table.format(&MarkdownFormatter)),
            CoverageReport::NotCollected | CoverageReport::Empty => None,
        }
    }
}

/// Build the coverage report for a run.
#[must_use]
pub fn build_report(results: &Results, root: &Path) -> CoverageReport {
    let Some(map) = &results.coverage_map else {
        info!("No coverage collected");
        return CoverageReport::NotCollected;
    };
    if map.is_empty() {
        warn!("No entries found in coverage data");
        return CoverageReport::Empty;
    }
    debug!("Coverage collected for {} files", map.len());
    CoverageReport::Table(CoverageTable::from_map(map, root))
}

/// Trait for formatting coverage tables.
pub trait ReportFormatter {
    /// Format the table to a string.
    fn format(&self, table: &CoverageTable) -> String;
}

/// Markdown formatter producing the pull-request comment body.
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    fn cell(pct: Option<f64>) -> String {
        match pct {
            Some(p) => format!("{} {p}%", Level::classify(p).indicator()),
            None => "n/a".to_string(),
        }
    }

    fn row(md: &mut String, label: &str, summary: &CoverageSummary) {
        write!(md, "| {label} |").unwrap();
        for pct in summary.percentages() {
            write!(md, " {} |", Self::cell(pct)).unwrap();
        }
        md.push('\n');
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, table: &CoverageTable) -> String {
        let mut md = String::from(COVERAGE_HEADER);

        writeln!(md, "| {} |", COLUMNS.join(" | ")).unwrap();
        md.push_str("|---:|---:|---:|---:|\n");
        let cells: Vec<String> = table
            .total
            .percentages()
            .into_iter()
            .map(Self::cell)
            .collect();
        writeln!(md, "| {} |", cells.join(" | ")).unwrap();

        md.push_str("\n<details>\n<summary>Coverage by file</summary>\n\n");
        writeln!(md, "| File | {} |", COLUMNS.join(" | ")).unwrap();
        md.push_str("|:-----|---:|---:|---:|---:|\n");

        for group in &table.directories {
            let label = truncate_left(&group.directory, MAX_DIRECTORY_WIDTH);
            Self::row(&mut md, &format!("**{}**", escape_cell(&label)), &group.summary);
            for file in &group.files {
                Self::row(&mut md, &format!("`{}`", escape_cell(&file.name)), &file.summary);
            }
        }

        md.push_str("\n</details>\n");
        md
    }
}

/// Plain text formatter for local previews.
pub struct TextFormatter;

impl TextFormatter {
    fn cell(pct: Option<f64>) -> String {
        match pct {
            Some(p) => format!("{p}%"),
            None => "n/a".to_string(),
        }
    }

    fn row(out: &mut String, label: &str, summary: &CoverageSummary) {
        let [s, b, f, l] = summary.percentages().map(Self::cell);
        writeln!(out, "{label:<52} {s:>10} {b:>10} {f:>10} {l:>10}").unwrap();
    }
}

impl ReportFormatter for TextFormatter {
    fn format(&self, table: &CoverageTable) -> String {
        let mut out = String::new();

        out.push_str("Coverage summary\n");
        for (name, pct) in COLUMNS.iter().zip(table.total.percentages()) {
            match pct {
                Some(p) => writeln!(out, "  {name:<11} {p:>6}% ({})", Level::classify(p)).unwrap(),
                None => writeln!(out, "  {name:<11} {:>7}", "n/a").unwrap(),
            }
        }
        out.push('\n');

        writeln!(
            out,
            "{:<52} {:>10} {:>10} {:>10} {:>10}",
            "FILE", "STMTS", "BRANCHES", "FUNCS", "LINES"
        )
        .unwrap();
        writeln!(out, "{}", "-".repeat(96)).unwrap();
        for group in &table.directories {
            let label = truncate_left(&group.directory, MAX_DIRECTORY_WIDTH);
            Self::row(&mut out, &label, &group.summary);
            for file in &group.files {
                Self::row(&mut out, &format!("  {}", file.name), &file.summary);
            }
        }

        out
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

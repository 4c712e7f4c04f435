/// Istanbul coverage data as embedded by Jest under `coverageMap`.
///
/// Reference: https://github.com/istanbuljs/istanbuljs
///
/// The map is a JSON object keyed by absolute file path. Each value contains:
///   - `statementMap`: `{ "0": { "start": { "line": 1, "column": 0 }, "end": { ... } }, ... }`
///   - `s`:            `{ "0": 5, "1": 0, ... }` — hit counts per statement
///   - `branchMap`:    `{ "0": { "loc": ..., "type": "if", "locations": [...] }, ... }`
///   - `b`:            `{ "0": [5, 0], ... }` — hit counts per branch arm
///   - `fnMap`:        `{ "0": { "name": "foo", "decl": ..., "loc": ... }, ... }`
///   - `f`:            `{ "0": 3, ... }` — hit counts per function
///
/// Only the hit-count tables and statement start lines are needed to
/// summarize, so the location maps for branches and functions are skipped.
use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::model::{CoverageSummary, Metric};

/// Per-file coverage keyed by absolute path. Iteration is in lexicographic
/// path order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CoverageMap(BTreeMap<String, FileCoverage>);

impl CoverageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, file: FileCoverage) {
        self.0.insert(path.into(), file);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// File paths in lexicographic order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Summary across every file in the map.
    #[must_use]
    pub fn summary(&self) -> CoverageSummary {
        let mut total = CoverageSummary::default();
        for file in self.0.values() {
            total.merge(&file.summary());
        }
        total
    }

    /// Summary for a single file, if present.
    #[must_use]
    pub fn file_summary(&self, path: &str) -> Option<CoverageSummary> {
        self.0.get(path).map(FileCoverage::summary)
    }
}

/// Raw hit counts for one source file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    #[serde(default)]
    pub statement_map: BTreeMap<String, Span>,
    #[serde(default)]
    pub s: BTreeMap<String, u64>,
    #[serde(default)]
    pub f: BTreeMap<String, u64>,
    #[serde(default)]
    pub b: BTreeMap<String, Vec<u64>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Span {
    pub start: Position,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Position {
    pub line: u32,
}

impl FileCoverage {
    /// Hit count per source line. Several statements can start on the same
    /// line; the line takes the maximum of their counts.
    #[must_use]
    pub fn line_hits(&self) -> HashMap<u32, u64> {
        let mut lines: HashMap<u32, u64> = HashMap::new();
        for (idx, &count) in &self.s {
            let Some(span) = self.statement_map.get(idx) else {
                continue;
            };
            lines
                .entry(span.start.line)
                .and_modify(|e| *e = (*e).max(count))
                .or_insert(count);
        }
        lines
    }

    #[must_use]
    pub fn summary(&self) -> CoverageSummary {
        let lines = self.line_hits();
        CoverageSummary {
            statements: count_hits(self.s.values().copied()),
            branches: count_hits(self.b.values().flatten().copied()),
            functions: count_hits(self.f.values().copied()),
            lines: count_hits(lines.into_values()),
        }
    }
}

fn count_hits(hits: impl Iterator<Item = u64>) -> Metric {
    let mut metric = Metric::default();
    for hit in hits {
        metric.total += 1;
        if hit > 0 {
            metric.covered += 1;
        }
    }
    metric
}

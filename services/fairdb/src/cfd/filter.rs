//! Line-level filters applied to the miner's raw output before parsing

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn summary_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Mined\s+\d+\b").expect("static regex"))
}

/// Terminal summary such as `Mined 317 cfds in 363 milliseconds`
pub fn is_summary_line(line: &str) -> bool {
    summary_line().is_match(line.trim_start())
}

/// Counts reported by the target filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetFilterCounts {
    pub kept: usize,
    /// Rule lines without the target literal
    pub removed: usize,
    /// Blank and summary lines
    pub skipped: usize,
}

/// Keep only rule lines that mention the target literal (e.g. `income=`).
///
/// Blank and summary lines are skipped and not counted as removed.
pub fn filter_by_target_value(
    lines: &[String],
    target_literal: &str,
) -> (Vec<String>, TargetFilterCounts) {
    let mut counts = TargetFilterCounts::default();
    let mut kept = Vec::new();

    for line in lines {
        if line.trim().is_empty() || is_summary_line(line) {
            counts.skipped += 1;
            continue;
        }
        if line.contains(target_literal) {
            kept.push(line.clone());
        } else {
            counts.removed += 1;
        }
    }
    counts.kept = kept.len();

    debug!(
        "Target {:?}: kept {} lines, removed {}, skipped {}",
        target_literal, counts.kept, counts.removed, counts.skipped
    );

    (kept, counts)
}

/// Collapse `<=` to `<` and `>=` to `>`
pub fn replace_incomparable_symbols(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.replace("<=", "<").replace(">=", ">"))
        .collect()
}

pub fn remove_parentheses(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.replace(['(', ')'], ""))
        .collect()
}

pub fn remove_lines_without_arrow(lines: &[String], arrow: &str) -> Vec<String> {
    lines
        .iter()
        .filter(|line| line.contains(arrow))
        .cloned()
        .collect()
}

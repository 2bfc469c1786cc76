//! Raw miner output → structured rules

use std::path::Path;
use tracing::{debug, info};

use crate::cfd::filter::*;
use crate::cfd::grammar::{parse_cfd, parse_cfd_with_conditions};
use crate::cfd::rule::*;
use crate::config::CfdConfig;
use crate::error::Result;

/// Per-stage counts for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub lines_read: usize,
    pub skipped_lines: usize,
    pub target_kept: usize,
    pub target_removed: usize,
    pub arrow_removed: usize,
    /// Rules dropped by the grammar check or an exclusion
    pub grammar_discarded: usize,
    /// Rules left without a valid token on one side during conversion
    pub conversion_discarded: usize,
    pub rules_emitted: usize,
}

/// Read mined rule text, trimming lines and dropping blanks
pub fn load_raw_cfds<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Structural parse of every line, optionally honouring exclusions
pub fn filter_rules(
    lines: &[String],
    grammar: &RuleGrammar,
    exclusions: &Exclusions,
) -> Result<Vec<TokenizedRule>> {
    let mut kept = Vec::new();
    for line in lines {
        let parsed = if exclusions.is_empty() {
            parse_cfd(line, grammar)?
        } else {
            parse_cfd_with_conditions(line, grammar, exclusions)?
        };
        if let Some(tokens) = parsed {
            kept.push(tokens);
        }
    }
    debug!("{} of {} lines survived the grammar check", kept.len(), lines.len());
    Ok(kept)
}

/// Convert tokenized rules into attribute maps, dropping rules with an empty side
pub fn parse_rules_to_dict(tokenized: &[TokenizedRule]) -> Vec<Rule> {
    tokenized.iter().filter_map(TokenizedRule::to_rule).collect()
}

/// Run every filtering stage over the raw lines, in order
pub fn filter_cfds(raw: &[String], config: &CfdConfig) -> Result<(Vec<Rule>, StageCounts)> {
    let grammar = RuleGrammar::from_config(config);
    let exclusions = Exclusions::from_config(config);
    let mut counts = StageCounts {
        lines_read: raw.len(),
        ..StageCounts::default()
    };

    // 1. Target attribute
    let (lines, target) = filter_by_target_value(raw, &config.target_attribute);
    counts.skipped_lines = target.skipped;
    counts.target_kept = target.kept;
    counts.target_removed = target.removed;

    // 2-4. Textual normalization, then arrow presence
    let lines = replace_incomparable_symbols(&lines);
    let lines = remove_parentheses(&lines);
    let before_arrow = lines.len();
    let lines = remove_lines_without_arrow(&lines, &grammar.arrow);
    counts.arrow_removed = before_arrow - lines.len();

    // 5. Grammar + exclusions
    let tokenized = filter_rules(&lines, &grammar, &exclusions)?;
    counts.grammar_discarded = lines.len() - tokenized.len();

    // 6. Attribute maps
    let rules = parse_rules_to_dict(&tokenized);
    counts.conversion_discarded = tokenized.len() - rules.len();
    counts.rules_emitted = rules.len();

    info!(
        "Based on target {:?}: kept {} lines, removed {} (missing target)",
        config.target_attribute, counts.target_kept, counts.target_removed
    );
    info!(
        "Parsed {} rules ({} without arrow, {} discarded by grammar, {} empty after conversion)",
        counts.rules_emitted, counts.arrow_removed, counts.grammar_discarded, counts.conversion_discarded
    );
    for (i, rule) in rules.iter().take(50).enumerate() {
        debug!("{}) {}", i + 1, rule);
    }

    Ok((rules, counts))
}

/// Write parsed rules as a JSON array
pub fn write_rules_json<P: AsRef<Path>>(path: P, rules: &[Rule]) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path.as_ref())?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), rules)?;
    info!("Wrote {} rules to {:?}", rules.len(), path.as_ref());
    Ok(())
}

pub fn load_rules_json<P: AsRef<Path>>(path: P) -> Result<Vec<Rule>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let rules: Vec<Rule> = serde_json::from_str(&content)?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FairDbError;
    use tempfile::TempDir;

    fn raw(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    fn sample_output() -> Vec<String> {
        raw(&[
            "(sex=Male, race=White) => income=>50K",
            "(age<=30) => income=<=50K",
            "(workclass=) => income=<=50K",
            "(education=Bach) => race=White",
            "(sex=Female, education=HS-grad) => income=<=50K",
            "income=>50K",
            "Mined 6 cfds in 42 milliseconds",
        ])
    }

    #[test]
    fn test_filter_cfds_end_to_end() {
        let config = CfdConfig::default();
        let (rules, counts) = filter_cfds(&sample_output(), &config).unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(
            rules[0],
            Rule::new()
                .with_lhs("sex", "Male")
                .with_lhs("race", "White")
                .with_rhs("income", ">50K")
        );
        assert_eq!(rules[1].lhs["education"], "HS-grad");
        assert_eq!(rules[1].rhs["income"], "<=50K");

        assert_eq!(counts.lines_read, 7);
        assert_eq!(counts.skipped_lines, 1);
        assert_eq!(counts.target_kept, 5);
        assert_eq!(counts.target_removed, 1);
        assert_eq!(counts.arrow_removed, 1);
        assert_eq!(counts.grammar_discarded, 2);
        assert_eq!(counts.rules_emitted, 2);
    }

    #[test]
    fn test_lines_without_arrow_do_not_change_output() {
        let config = CfdConfig::default();
        let (base, _) = filter_cfds(&sample_output(), &config).unwrap();

        let mut noisy = sample_output();
        noisy.push("sex=Male, income=>50K".to_string());
        noisy.push("income=<=50K -> sex=Female".to_string());
        let (with_noise, _) = filter_cfds(&noisy, &config).unwrap();

        assert_eq!(base, with_noise);
    }

    #[test]
    fn test_exclusions_from_config() {
        let config = CfdConfig {
            exclude_lhs: vec!["race=White".to_string()],
            ..CfdConfig::default()
        };
        let (rules, counts) = filter_cfds(&sample_output(), &config).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].lhs["sex"], "Female");
        assert_eq!(counts.grammar_discarded, 3);
    }

    #[test]
    fn test_filter_rules_propagates_malformed() {
        let lines = raw(&["a=1, b=2"]);
        let err = filter_rules(&lines, &RuleGrammar::default(), &Exclusions::default()).unwrap_err();
        assert!(matches!(err, FairDbError::MalformedRuleLine { .. }));
    }

    #[test]
    fn test_load_raw_cfds_trims_and_drops_blanks() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cfds.txt");
        std::fs::write(&path, "  a=1 => income=x  \n\n   \nMined 1 cfds in 1 milliseconds\n").unwrap();

        let lines = load_raw_cfds(&path).unwrap();
        assert_eq!(lines, raw(&["a=1 => income=x", "Mined 1 cfds in 1 milliseconds"]));
    }

    #[test]
    fn test_rules_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/rules.json");
        let rules = vec![
            Rule::new().with_lhs("sex", "Male").with_rhs("income", ">50K"),
            Rule::new().with_lhs("race", "Black").with_rhs("income", "<=50K"),
        ];

        write_rules_json(&path, &rules).unwrap();
        assert!(path.exists());
        assert_eq!(load_rules_json(&path).unwrap(), rules);
    }
}

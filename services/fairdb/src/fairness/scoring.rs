//! Fairness scoring for discovered rules
//!
//! For every rule touching a protected attribute:
//! - `support`: rows matching LHS and RHS over all rows
//! - `confidence`: rows matching LHS and RHS over rows matching LHS
//! - `diff`: confidence minus the confidence with all protected attributes
//!   and the target removed from the LHS
//! - one diff per protected attribute on the LHS, removing only that attribute
//!
//! Zero LHS support always yields a confidence of 0.0.

use polars::prelude::DataFrame;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::cfd::rule::Rule;
use crate::config::FairnessConfig;
use crate::error::Result;
use crate::fairness::dedup::remove_duplicates;
use crate::fairness::table::{OccurrenceCounts, RuleTable};

/// Scored rule, created fresh on every scoring pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRule {
    pub rule_id: String,
    pub rule: Rule,
    pub counts: OccurrenceCounts,
    pub support: f64,
    pub confidence: f64,
    pub confidence_no_protected: f64,
    pub diff: f64,
    /// Only protected attributes present in the LHS have an entry
    pub protected_diffs: BTreeMap<String, f64>,
}

/// Score one rule; `None` when it has no LHS/RHS support or no protected attribute
pub fn score_rule(
    rule: &Rule,
    table: &RuleTable,
    protected: &BTreeSet<String>,
    target: &str,
) -> Result<Option<ScoredRule>> {
    let counts = table.count_occurrences(rule)?;
    let involves_protected = rule.mentions(|attr| protected.contains(attr));

    if counts.lhs == 0 || counts.rhs == 0 || !involves_protected {
        return Ok(None);
    }

    let confidence = counts.confidence();
    let support = counts.both as f64 / table.height() as f64;

    let unconditioned = rule.without_lhs(|attr| protected.contains(attr) || attr == target);
    let confidence_no_protected = table.confidence(&unconditioned)?;

    let mut protected_diffs = BTreeMap::new();
    for attr in protected.iter().filter(|p| rule.lhs.contains_key(p.as_str())) {
        let without = rule.without_lhs(|a| a == attr.as_str());
        protected_diffs.insert(attr.clone(), confidence - table.confidence(&without)?);
    }

    Ok(Some(ScoredRule {
        rule_id: rule.id(),
        rule: rule.clone(),
        counts,
        support,
        confidence,
        confidence_no_protected,
        diff: confidence - confidence_no_protected,
        protected_diffs,
    }))
}

/// Score every rule, keeping input order
pub fn score_rules(
    rules: &[Rule],
    table: &RuleTable,
    protected: &BTreeSet<String>,
    target: &str,
) -> Result<Vec<ScoredRule>> {
    let mut scored = Vec::new();
    for rule in rules {
        match score_rule(rule, table, protected, target)? {
            Some(record) => scored.push(record),
            None => debug!("Skipping rule without protected support: {}", rule),
        }
    }
    Ok(scored)
}

/// Rules whose `diff` is strictly above `min_diff`
pub fn select_unfair(records: &[ScoredRule], min_diff: f64) -> Vec<ScoredRule> {
    records
        .iter()
        .filter(|r| r.diff > min_diff)
        .cloned()
        .collect()
}

/// Result of a full evaluation pass
#[derive(Debug, Clone, Default)]
pub struct FairnessReport {
    pub rules_in: usize,
    pub scored: usize,
    pub duplicates_removed: usize,
    pub selected: Vec<ScoredRule>,
}

/// Score, optionally deduplicate, then apply the `min_diff` threshold
pub fn evaluate(rules: &[Rule], df: &DataFrame, config: &FairnessConfig) -> Result<FairnessReport> {
    let table = RuleTable::from_dataframe(df)?;
    let scored = score_rules(
        rules,
        &table,
        &config.protected_attributes,
        &config.target_attribute,
    )?;
    let scored_count = scored.len();

    let deduped = if config.deduplicate {
        remove_duplicates(scored, config.equality)
    } else {
        scored
    };
    let duplicates_removed = scored_count - deduped.len();

    let selected = select_unfair(&deduped, config.min_diff);
    info!(
        "Scored {} of {} rules ({} duplicates removed), {} above min_diff {}",
        scored_count,
        rules.len(),
        duplicates_removed,
        selected.len(),
        config.min_diff
    );

    Ok(FairnessReport {
        rules_in: rules.len(),
        scored: scored_count,
        duplicates_removed,
        selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleEquality;
    use polars::prelude::*;

    const EPS: f64 = 1e-9;

    fn protected(attrs: &[&str]) -> BTreeSet<String> {
        attrs.iter().map(|s| s.to_string()).collect()
    }

    fn small_table() -> DataFrame {
        df!(
            "sex" => &["M", "M", "F"],
            "income" => &[">50K", ">50K", "<50K"]
        )
        .unwrap()
    }

    fn adult_like() -> DataFrame {
        df!(
            "sex" => &["M", "M", "M", "M", "F", "F", "F", "F"],
            "race" => &["W", "W", "B", "B", "W", "W", "B", "B"],
            "edu" => &["Bach", "Bach", "Bach", "HS", "Bach", "Bach", "HS", "HS"],
            "income" => &[">50K", ">50K", ">50K", "<=50K", ">50K", "<=50K", "<=50K", "<=50K"]
        )
        .unwrap()
    }

    fn config(attrs: &[&str], min_diff: f64) -> FairnessConfig {
        FairnessConfig {
            protected_attributes: protected(attrs),
            target_attribute: "income".to_string(),
            min_diff,
            deduplicate: true,
            equality: RuleEquality::Exact,
        }
    }

    #[test]
    fn test_end_to_end_example() {
        let table = RuleTable::from_dataframe(&small_table()).unwrap();
        let rule = Rule::new().with_lhs("sex", "M").with_rhs("income", ">50K");

        let scored = score_rule(&rule, &table, &protected(&["sex"]), "income")
            .unwrap()
            .unwrap();

        assert_eq!(scored.counts, OccurrenceCounts { lhs: 2, rhs: 2, both: 2 });
        assert!((scored.support - 2.0 / 3.0).abs() < EPS);
        assert!((scored.confidence - 1.0).abs() < EPS);
        // LHS is empty once `sex` is removed, so it matches all three rows
        assert!((scored.confidence_no_protected - 2.0 / 3.0).abs() < EPS);
        assert!((scored.diff - 1.0 / 3.0).abs() < EPS);
        assert!((scored.protected_diffs["sex"] - 1.0 / 3.0).abs() < EPS);
        assert!((0.0..=1.0).contains(&scored.support));
    }

    #[test]
    fn test_rule_without_protected_attribute_skipped() {
        let table = RuleTable::from_dataframe(&adult_like()).unwrap();
        let rule = Rule::new().with_lhs("edu", "Bach").with_rhs("income", ">50K");
        assert!(score_rule(&rule, &table, &protected(&["sex", "race"]), "income")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_protected_on_rhs_only_is_scored_without_attr_diffs() {
        let table = RuleTable::from_dataframe(&adult_like()).unwrap();
        let rule = Rule::new().with_lhs("edu", "HS").with_rhs("race", "B");
        let scored = score_rule(&rule, &table, &protected(&["sex", "race"]), "income")
            .unwrap()
            .unwrap();

        assert_eq!(scored.counts, OccurrenceCounts { lhs: 3, rhs: 4, both: 3 });
        assert!((scored.confidence - 1.0).abs() < EPS);
        // nothing protected on the LHS, so removal changes nothing
        assert!(scored.diff.abs() < EPS);
        assert!(scored.protected_diffs.is_empty());
    }

    #[test]
    fn test_zero_support_skipped() {
        let table = RuleTable::from_dataframe(&adult_like()).unwrap();
        let rule = Rule::new().with_lhs("sex", "X").with_rhs("income", ">50K");
        assert!(score_rule(&rule, &table, &protected(&["sex"]), "income")
            .unwrap()
            .is_none());

        let rule = Rule::new().with_lhs("sex", "M").with_rhs("income", "unknown");
        assert!(score_rule(&rule, &table, &protected(&["sex"]), "income")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_per_attribute_diffs() {
        let table = RuleTable::from_dataframe(&adult_like()).unwrap();
        let rule = Rule::new()
            .with_lhs("sex", "M")
            .with_lhs("edu", "Bach")
            .with_rhs("income", ">50K");

        let scored = score_rule(&rule, &table, &protected(&["sex", "race"]), "income")
            .unwrap()
            .unwrap();

        // M & Bach: rows 0,1,2 all >50K
        assert!((scored.confidence - 1.0).abs() < EPS);
        // Bach alone: rows 0,1,2,4,5 with 4 above 50K
        assert!((scored.confidence_no_protected - 0.8).abs() < EPS);
        assert!((scored.diff - 0.2).abs() < EPS);
        assert!((scored.protected_diffs["sex"] - 0.2).abs() < EPS);
        assert!(!scored.protected_diffs.contains_key("race"));
    }

    #[test]
    fn test_target_removed_only_from_unconditioned_confidence() {
        let table = RuleTable::from_dataframe(&adult_like()).unwrap();
        let rule = Rule::new()
            .with_lhs("sex", "F")
            .with_lhs("income", "<=50K")
            .with_rhs("edu", "HS");

        let scored = score_rule(&rule, &table, &protected(&["sex"]), "income")
            .unwrap()
            .unwrap();

        // F & <=50K: rows 5,6,7, of which 6,7 are HS
        assert!((scored.confidence - 2.0 / 3.0).abs() < EPS);
        // empty LHS: 3 of 8 rows are HS
        assert!((scored.confidence_no_protected - 3.0 / 8.0).abs() < EPS);
        // dropping only `sex` keeps the target: <=50K rows 3,5,6,7, three are HS
        assert!((scored.protected_diffs["sex"] - (2.0 / 3.0 - 0.75)).abs() < EPS);
    }

    #[test]
    fn test_empty_table_scores_nothing() {
        let table = RuleTable::from_dataframe(&DataFrame::default()).unwrap();
        let rules = vec![Rule::new().with_lhs("sex", "M").with_rhs("income", ">50K")];
        let scored = score_rules(&rules, &table, &protected(&["sex"]), "income").unwrap();
        assert!(scored.is_empty());
    }

    #[test]
    fn test_select_unfair_is_strict() {
        let table = RuleTable::from_dataframe(&small_table()).unwrap();
        let rules = vec![Rule::new().with_lhs("sex", "M").with_rhs("income", ">50K")];
        let scored = score_rules(&rules, &table, &protected(&["sex"]), "income").unwrap();

        assert_eq!(select_unfair(&scored, 0.3).len(), 1);
        assert_eq!(select_unfair(&scored, scored[0].diff).len(), 0);
    }

    #[test]
    fn test_evaluate_dedups_and_thresholds() {
        let rules = vec![
            Rule::new().with_lhs("sex", "M").with_lhs("edu", "Bach").with_rhs("income", ">50K"),
            Rule::new().with_lhs("edu", "Bach").with_lhs("sex", "M").with_rhs("income", ">50K"),
            Rule::new().with_lhs("edu", "HS").with_rhs("race", "B"),
            Rule::new().with_lhs("edu", "Bach").with_rhs("income", ">50K"),
        ];

        let report = evaluate(&rules, &adult_like(), &config(&["sex", "race"], 0.1)).unwrap();
        assert_eq!(report.rules_in, 4);
        assert_eq!(report.scored, 3);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.selected.len(), 1);
        assert_eq!(report.selected[0].rule, rules[0]);
    }
}

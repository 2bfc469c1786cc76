//! Duplicate removal over scored rules

use crate::cfd::rule::{Conditions, Rule};
use crate::config::RuleEquality;
use crate::fairness::scoring::ScoredRule;

/// Every pair of `a` exists in `b` with the same value
fn covers(a: &Conditions, b: &Conditions) -> bool {
    a.iter().all(|(attr, value)| b.get(attr) == Some(value))
}

/// Compare two rules under the configured relation.
///
/// `Covering` is one-directional: `a` equals `b` when `b` repeats all of
/// `a`'s conditions, even if `b` has more.
pub fn rules_equal(a: &Rule, b: &Rule, equality: RuleEquality) -> bool {
    match equality {
        RuleEquality::Exact => a.lhs == b.lhs && a.rhs == b.rhs,
        RuleEquality::Covering => covers(&a.lhs, &b.lhs) && covers(&a.rhs, &b.rhs),
    }
}

/// Keep items, in order, whose rule is not equal to an already kept one
pub fn remove_duplicates_by<T, F>(items: Vec<T>, rule_of: F, equality: RuleEquality) -> Vec<T>
where
    F: Fn(&T) -> &Rule,
{
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let duplicate = kept
            .iter()
            .any(|existing| rules_equal(rule_of(&item), rule_of(existing), equality));
        if !duplicate {
            kept.push(item);
        }
    }
    kept
}

pub fn remove_duplicates(records: Vec<ScoredRule>, equality: RuleEquality) -> Vec<ScoredRule> {
    remove_duplicates_by(records, |r| &r.rule, equality)
}

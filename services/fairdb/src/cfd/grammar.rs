//! Parse mined rule lines of the form `a=1, b=2 => c=3`

use crate::cfd::rule::*;
use crate::error::{FairDbError, Result};

/// Outcome of checking a single `attr=value` token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenCheck {
    Valid,
    /// No `=`, more than one `=`, or an empty value
    Uninstantiated,
}

fn check_token(token: &str) -> TokenCheck {
    if token.matches('=').count() != 1 {
        return TokenCheck::Uninstantiated;
    }
    match token.split_once('=') {
        Some((_, value)) if !value.trim().is_empty() => TokenCheck::Valid,
        _ => TokenCheck::Uninstantiated,
    }
}

fn side_is_instantiated(tokens: &[String]) -> bool {
    !tokens.is_empty() && tokens.iter().all(|t| check_token(t) == TokenCheck::Valid)
}

/// Split a line into LHS/RHS tokens and keep it only if every token is instantiated.
///
/// Returns `Ok(None)` for rules that are discarded (a single bad token drops the
/// whole rule). A line without the arrow literal is a caller error.
pub fn parse_cfd(line: &str, grammar: &RuleGrammar) -> Result<Option<TokenizedRule>> {
    let (raw_lhs, raw_rhs) = line.split_once(grammar.arrow.as_str()).ok_or_else(|| {
        FairDbError::MalformedRuleLine {
            line: line.to_string(),
            arrow: grammar.arrow.clone(),
        }
    })?;

    let lhs: Vec<String> = raw_lhs
        .split(grammar.separator.as_str())
        .map(str::to_string)
        .collect();
    let rhs: Vec<String> = raw_rhs
        .split(grammar.separator.as_str())
        .map(str::to_string)
        .collect();

    if !side_is_instantiated(&lhs) || !side_is_instantiated(&rhs) {
        return Ok(None);
    }

    Ok(Some(TokenizedRule { lhs, rhs }))
}

fn contains_excluded(excluded: &[String], side: &[String]) -> bool {
    excluded
        .iter()
        .any(|cond| side.iter().any(|token| token.trim() == cond.trim()))
}

/// Like [`parse_cfd`], additionally dropping rules that contain an excluded token
pub fn parse_cfd_with_conditions(
    line: &str,
    grammar: &RuleGrammar,
    exclusions: &Exclusions,
) -> Result<Option<TokenizedRule>> {
    let Some(tokens) = parse_cfd(line, grammar)? else {
        return Ok(None);
    };

    if contains_excluded(&exclusions.lhs, &tokens.lhs)
        || contains_excluded(&exclusions.rhs, &tokens.rhs)
    {
        return Ok(None);
    }

    Ok(Some(tokens))
}

/// Keep tokens with `=` and a non-empty attribute and value, trimmed
fn split_tokens(tokens: &[String]) -> Vec<(String, String)> {
    tokens
        .iter()
        .filter_map(|token| token.split_once('='))
        .map(|(attr, value)| (attr.trim().to_string(), value.trim().to_string()))
        .filter(|(attr, value)| !attr.is_empty() && !value.is_empty())
        .collect()
}

impl TokenizedRule {
    /// Build the attribute maps, expanding `<` back to `<=` in values.
    ///
    /// Returns `None` when either side has no valid token left.
    pub fn to_rule(&self) -> Option<Rule> {
        let lhs = split_tokens(&self.lhs);
        let rhs = split_tokens(&self.rhs);
        if lhs.is_empty() || rhs.is_empty() {
            return None;
        }

        let expand = |pairs: Vec<(String, String)>| -> Conditions {
            pairs
                .into_iter()
                .map(|(attr, value)| (attr, value.replace('<', "<=")))
                .collect()
        };

        Some(Rule {
            lhs: expand(lhs),
            rhs: expand(rhs),
        })
    }
}

/// Parse one line straight into a [`Rule`]
pub fn parse_rule(line: &str, grammar: &RuleGrammar) -> Result<Option<Rule>> {
    Ok(parse_cfd(line, grammar)?.and_then(|tokens| tokens.to_rule()))
}

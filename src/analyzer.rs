//! This module provides checks over a rule list that point out likely mistakes before a
//! run. None of the findings stop a table from being installed: the machine always uses
//! the rules exactly as written, first match first.

use crate::types::{Rule, StateLabel, Symbol, INITIAL_STATE};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Represents a suspicious construct found in a rule list.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum AnalysisWarning {
    /// Two rules share a guard. Only the earlier one can ever fire.
    /// Indices are 0-based positions in the rule list.
    #[error("Rule {shadowed} ({state}, {symbol}) is unreachable, rule {first} has the same guard")]
    ShadowedRule {
        first: usize,
        shadowed: usize,
        state: StateLabel,
        symbol: Symbol,
    },
    /// No rule is guarded by the initial state, so every run halts on its first step.
    #[error("No rule starts from the initial state {}", INITIAL_STATE)]
    NoInitialRule,
    /// States that rules transition into but that never appear in a guard. Reaching any
    /// of them halts the machine.
    #[error("Halting states: {}", join(.0))]
    HaltingStates(Vec<StateLabel>),
}

impl AnalysisWarning {
    /// Whether this finding is informational rather than a likely mistake.
    pub fn is_informational(&self) -> bool {
        matches!(self, AnalysisWarning::HaltingStates(_))
    }
}

fn join(states: &[StateLabel]) -> String {
    states
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Analyzes a rule list and returns every finding, in a stable order.
///
/// An empty rule list has nothing to analyze and produces no findings.
pub fn analyze(rules: &[Rule]) -> Vec<AnalysisWarning> {
    if rules.is_empty() {
        return Vec::new();
    }

    let mut warnings = check_shadowed_rules(rules);
    warnings.extend(check_initial_rule(rules));
    warnings.extend(check_halting_states(rules));
    warnings
}

/// Reports every rule whose guard is already claimed by an earlier rule.
fn check_shadowed_rules(rules: &[Rule]) -> Vec<AnalysisWarning> {
    let mut first_by_guard: HashMap<(&StateLabel, Symbol), usize> = HashMap::new();
    let mut warnings = Vec::new();

    for (index, rule) in rules.iter().enumerate() {
        match first_by_guard.get(&(&rule.if_state, rule.if_symbol)) {
            Some(&first) => warnings.push(AnalysisWarning::ShadowedRule {
                first,
                shadowed: index,
                state: rule.if_state.clone(),
                symbol: rule.if_symbol,
            }),
            None => {
                first_by_guard.insert((&rule.if_state, rule.if_symbol), index);
            }
        }
    }

    warnings
}

fn check_initial_rule(rules: &[Rule]) -> Option<AnalysisWarning> {
    if rules.iter().any(|rule| rule.if_state == INITIAL_STATE) {
        None
    } else {
        Some(AnalysisWarning::NoInitialRule)
    }
}

fn check_halting_states(rules: &[Rule]) -> Option<AnalysisWarning> {
    let guarded: BTreeSet<&StateLabel> = rules.iter().map(|rule| &rule.if_state).collect();
    let halting: BTreeSet<&StateLabel> = rules
        .iter()
        .map(|rule| &rule.set_state)
        .filter(|state| !guarded.contains(state))
        .collect();

    if halting.is_empty() {
        None
    } else {
        Some(AnalysisWarning::HaltingStates(
            halting.into_iter().cloned().collect(),
        ))
    }
}

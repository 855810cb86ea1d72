//! This module provides the parser for rule tables, utilizing the `pest` crate.
//!
//! A rule table is plain text with one rule per line:
//!
//! ```text
//! q0 B 1 R q1
//! q1 0 0 L q1
//! ```
//!
//! The grammar only splits the text into lines and fields; each line is then decoded with
//! the rule-line encoding. The first bad line aborts the whole table.

use crate::{
    encoder::decode_rule_fields,
    types::{Rule, StateLabel, TuringMachineError},
};
use pest::{iterators::Pair, Parser as PestParser};
use std::collections::HashMap;

mod grammar {
    use pest_derive::Parser as PestParser;

    /// Derives a `PestParser` for the rule table grammar defined in `grammar.pest`.
    #[derive(PestParser)]
    #[grammar = "grammar.pest"]
    pub struct RuleTableParser;
}

use grammar::RuleTableParser;
/// The grammar rules generated by `pest`, named so they don't clash with [`Rule`].
pub use grammar::Rule as GrammarRule;

/// Parses a rule table into an ordered list of rules.
///
/// Empty input is an empty table, and a single newline at the very end is ignored. Any
/// other empty line counts as a rule with no fields.
///
/// Equal state labels in the table share one allocation.
///
/// # Returns
///
/// * `Ok(Vec<Rule>)` with the rules in declaration order.
/// * `Err(TuringMachineError::Encoding)` naming the 1-based line of the first bad rule.
pub fn parse(input: &str) -> Result<Vec<Rule>, TuringMachineError> {
    let table = RuleTableParser::parse(GrammarRule::table, input)
        .map_err(|e| TuringMachineError::ParseError(Box::new(e)))?
        .next()
        .ok_or_else(|| TuringMachineError::ValidationError("Empty parse tree".to_string()))?;

    let lines: Vec<Pair<GrammarRule>> = table
        .into_inner()
        .filter(|pair| pair.as_rule() == GrammarRule::line)
        .collect();
    let count = lines.len();

    let mut labels = Interner::default();
    let mut rules = Vec::with_capacity(count);

    for (index, line) in lines.into_iter().enumerate() {
        // Each `line` pair spans exactly one source line.
        let number = index + 1;
        let fields: Vec<&str> = line.into_inner().map(|field| field.as_str()).collect();

        if fields.is_empty() && index + 1 == count {
            break;
        }

        let rule = decode_rule_fields(&fields, |label| labels.intern(label))
            .map_err(|source| TuringMachineError::Encoding {
                line: number,
                source,
            })?;
        rules.push(rule);
    }

    Ok(rules)
}

/// Hands out one shared [`StateLabel`] per distinct state name.
#[derive(Default)]
struct Interner {
    labels: HashMap<String, StateLabel>,
}

impl Interner {
    fn intern(&mut self, name: &str) -> StateLabel {
        if let Some(label) = self.labels.get(name) {
            return label.clone();
        }

        let label = StateLabel::new(name);
        self.labels.insert(name.to_string(), label.clone());
        label
    }
}

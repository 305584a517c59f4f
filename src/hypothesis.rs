//! Turning alignments into labelled constituents.
use std::str::FromStr;

use crate::{
    ConfigError,
    corpus::{Constituent, Insertion, Nonterminals, Tree},
    edit::EditOperation,
};

///Which runs of an alignment become constituents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PartPolicy {
    ///Runs of matching tokens.
    Equal,
    ///Runs of unmatched or substituted tokens.
    #[default]
    Unequal,
    Both,
}

impl PartPolicy {
    fn permits(&self, run: Run) -> bool {
        matches!(
            (self, run),
            (PartPolicy::Both, _)
                | (PartPolicy::Equal, Run::Same)
                | (PartPolicy::Unequal, Run::Different)
        )
    }
}

impl FromStr for PartPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" | "e" => Ok(PartPolicy::Equal),
            "unequal" | "u" => Ok(PartPolicy::Unequal),
            "both" | "b" => Ok(PartPolicy::Both),
            _ => Err(ConfigError::UnknownPart(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run {
    Same,
    Different,
}

///How hypotheses are inserted into trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HypothesisConfig {
    pub part: PartPolicy,
    ///Reuse labels of constituents already present at the same span.
    pub merge: bool,
    ///Never insert constituents with `begin == end`.
    pub exclude_empty: bool,
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        HypothesisConfig {
            part: PartPolicy::default(),
            merge: true,
            exclude_empty: false,
        }
    }
}

///Inserts a constituent unless it is invalid or an excluded empty span. Returns 1 if a new
///constituent was created and 0 otherwise.
pub fn insert(tree: &mut Tree, constituent: Constituent, config: &HypothesisConfig) -> usize {
    if (config.exclude_empty && constituent.is_empty()) || !constituent.is_valid() {
        return 0;
    }
    match tree.add(constituent) {
        Insertion::New => 1,
        Insertion::Merged => 0,
    }
}

///Inserts two spans hypothesised to share a category, one into each tree.
pub fn insert_pair(
    first: &mut Tree,
    second: &mut Tree,
    (begin1, end1): (usize, usize),
    (begin2, end2): (usize, usize),
    config: &HypothesisConfig,
    nonterminals: &mut Nonterminals,
) -> usize {
    let existing = if config.merge {
        (
            first.find(begin1, end1).map(Constituent::first_label),
            second.find(begin2, end2).map(Constituent::first_label),
        )
    } else {
        (None, None)
    };

    match existing {
        (Some(label1), Some(label2)) => {
            insert(first, Constituent::new(begin1, end1, label2), config)
                + insert(second, Constituent::new(begin2, end2, label1), config)
        }
        (Some(label1), None) => insert(second, Constituent::new(begin2, end2, label1), config),
        (None, Some(label2)) => insert(first, Constituent::new(begin1, end1, label2), config),
        (None, None) => {
            let label = nonterminals.fresh();
            insert(first, Constituent::new(begin1, end1, label), config)
                + insert(second, Constituent::new(begin2, end2, label), config)
        }
    }
}

///Walks an alignment between two trees and inserts the runs selected by `config.part`.
pub fn apply_alignment(
    first: &mut Tree,
    second: &mut Tree,
    alignment: &[EditOperation],
    config: &HypothesisConfig,
    nonterminals: &mut Nonterminals,
) -> usize {
    let mut created = 0;
    let mut run = None;
    let mut begin = (0, 0);
    let mut current = (0, 0);

    for op in alignment {
        let step = if op.is_substitution()
            && first.sentence().tokens()[current.0] == second.sentence().tokens()[current.1]
        {
            Run::Same
        } else {
            Run::Different
        };
        match run {
            Some(r) if r != step => {
                if config.part.permits(r) {
                    created += insert_pair(
                        first,
                        second,
                        (begin.0, current.0),
                        (begin.1, current.1),
                        config,
                        nonterminals,
                    );
                }
                begin = current;
                run = Some(step);
            }
            Some(_) => (),
            None => run = Some(step),
        }
        current = op.next(current);
    }

    let emit_last = match run {
        Some(r) => config.part.permits(r),
        None => config.part == PartPolicy::Both,
    };
    if emit_last {
        created += insert_pair(
            first,
            second,
            (begin.0, first.len()),
            (begin.1, second.len()),
            config,
            nonterminals,
        );
    }
    created
}

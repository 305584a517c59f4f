//! Unsupervised constituent hypotheses for grammar induction.
//!
//! Sentences of a corpus are compared with each other, and the parts they share (or the parts
//! in which they differ) are proposed as constituents with nonterminal labels. Three families
//! of comparison are available: a Wagner-Fisher edit distance, an enumeration of every maximal
//! set of compatible token matches, and generalised suffix/prefix trees over the whole corpus.
//!
//! ```
//! use grammar_aligner::{AlignConfig, AlignMode, Learner, PairMode, Session, Treebank};
//!
//! let mut session = Session::new();
//! let mut treebank = Treebank::parse("the cat sleeps\nthe dog sleeps", &mut session).unwrap();
//! let mut learner = Learner::new(AlignConfig::new(AlignMode::Pairs(PairMode::WagnerMin)));
//! let created = learner.run(&mut treebank, &mut session);
//! assert!(created > 0);
//!
//! //"cat" and "dog" differ in the same context, so both are bracketed.
//! assert!(treebank.trees().iter().all(|t| t.find(1, 2).is_some()));
//! ```
use std::{path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;

pub mod corpora;
pub mod corpus;
pub mod edit;
pub mod hypothesis;
mod learner;
pub mod suffix_tree;

pub use corpus::{Session, Treebank};
pub use hypothesis::{HypothesisConfig, PartPolicy};
pub use learner::{Learner, align_pair, build_suffix_structures};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Left,
    Right,
}

///Aligners that compare two sentences at a time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PairMode {
    ///Wagner-Fisher with plain substitutions.
    WagnerMin,
    ///Wagner-Fisher favouring matches at similar relative positions.
    WagnerBiased,
    ///Every maximal set of compatible matches.
    All,
}

///Which trees are built over the corpus and how their boundaries are used.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SuffixVariant {
    Suffixes,
    Prefixes,
    Both,
    ///Every span between a suffix boundary and a prefix boundary.
    Cross,
}

///Baselines which bracket sentences without comparing them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Branching {
    Left,
    Right,
    ///Left or right, decided per sentence by the seeded generator.
    Random,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AlignMode {
    Pairs(PairMode),
    SuffixTree(SuffixVariant),
    Branching(Branching),
}

impl FromStr for AlignMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "wagner_min" | "wm" => AlignMode::Pairs(PairMode::WagnerMin),
            "wagner_biased" | "wb" => AlignMode::Pairs(PairMode::WagnerBiased),
            "all" | "aa" | "a" => AlignMode::Pairs(PairMode::All),
            "suffix_tree_1" | "st1" => AlignMode::SuffixTree(SuffixVariant::Suffixes),
            "suffix_tree_2" | "st2" => AlignMode::SuffixTree(SuffixVariant::Prefixes),
            "suffix_tree_3" | "st3" => AlignMode::SuffixTree(SuffixVariant::Both),
            "suffix_tree_4" | "st4" => AlignMode::SuffixTree(SuffixVariant::Cross),
            "left" | "l" => AlignMode::Branching(Branching::Left),
            "right" | "r" => AlignMode::Branching(Branching::Right),
            "both" | "b" => AlignMode::Branching(Branching::Random),
            _ => return Err(ConfigError::UnknownMode(s.to_string())),
        })
    }
}

pub const SEEDS: [u64; 10] = [0, 76, 44, 68, 66, 43, 82, 34, 48, 32];

///An index into [`SEEDS`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Seed(usize);

impl Seed {
    pub fn new(index: usize) -> Result<Self, ConfigError> {
        if index < SEEDS.len() {
            Ok(Seed(index))
        } else {
            Err(ConfigError::SeedOutOfRange(index))
        }
    }

    pub fn value(&self) -> u64 {
        SEEDS[self.0]
    }
}

///Periodic dumps of an unfinished run, written to `<prefix>.<cursor>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub interval: Duration,
    pub prefix: PathBuf,
}

impl Checkpoint {
    pub fn path(&self, cursor: usize) -> PathBuf {
        let mut name = self.prefix.clone().into_os_string();
        name.push(format!(".{cursor}"));
        PathBuf::from(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignConfig {
    pub mode: AlignMode,
    pub hypotheses: HypothesisConfig,
    ///Compare every pair of sentences rather than only those sharing a token.
    pub exhaustive: bool,
    pub seed: Seed,
    pub checkpoint: Option<Checkpoint>,
}

impl AlignConfig {
    pub fn new(mode: AlignMode) -> Self {
        AlignConfig {
            mode,
            hypotheses: HypothesisConfig::default(),
            exhaustive: false,
            seed: Seed::default(),
            checkpoint: None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown alignment method {0:?}")]
    UnknownMode(String),
    #[error("unknown part selection {0:?} (expected equal, unequal or both)")]
    UnknownPart(String),
    #[error("seed {0} is out of range (0-9)")]
    SeedOutOfRange(usize),
}

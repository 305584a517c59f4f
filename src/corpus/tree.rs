use ahash::AHashSet;
use itertools::Itertools;
use serde::Serialize;
use std::fmt::Display;

use super::{Interner, Nonterminal, Token};

///A tokenised sentence with its load-time id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    id: usize,
    tokens: Vec<Token>,
    similar: AHashSet<usize>,
}

impl Sentence {
    pub fn new(id: usize, tokens: Vec<Token>) -> Self {
        Sentence {
            id,
            tokens,
            similar: AHashSet::default(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    ///Whether the two sentences share at least one token.
    pub fn is_similar_to(&self, id: usize) -> bool {
        self.similar.contains(&id)
    }

    pub fn similar(&self) -> impl Iterator<Item = usize> + '_ {
        self.similar.iter().copied()
    }

    pub(crate) fn set_similar(&mut self, similar: AHashSet<usize>) {
        self.similar = similar;
    }
}

///A labelled half-open span `[begin, end)` over a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constituent {
    begin: usize,
    end: usize,
    labels: Vec<Nonterminal>,
}

impl Constituent {
    pub fn new(begin: usize, end: usize, label: Nonterminal) -> Self {
        Constituent {
            begin,
            end,
            labels: vec![label],
        }
    }

    ///Returns [`None`] if `labels` is empty, since a constituent always carries at least one label.
    pub fn with_labels(
        begin: usize,
        end: usize,
        labels: impl IntoIterator<Item = Nonterminal>,
    ) -> Option<Self> {
        let mut c = Constituent {
            begin,
            end,
            labels: vec![],
        };
        c.add_labels(labels);
        (!c.labels.is_empty()).then_some(c)
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn span(&self) -> (usize, usize) {
        (self.begin, self.end)
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn is_valid(&self) -> bool {
        self.begin <= self.end
    }

    ///Labels in the order they were attached.
    pub fn labels(&self) -> &[Nonterminal] {
        &self.labels
    }

    pub fn first_label(&self) -> Nonterminal {
        self.labels[0]
    }

    fn add_labels(&mut self, labels: impl IntoIterator<Item = Nonterminal>) {
        for label in labels {
            if !self.labels.contains(&label) {
                self.labels.push(label);
            }
        }
    }
}

impl Display for Constituent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{},[{}])",
            self.begin,
            self.end,
            self.labels.iter().join(",")
        )
    }
}

///Whether [`Tree::add`] created a new constituent or merged labels into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    New,
    Merged,
}

///A sentence together with every constituent hypothesised for it so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    sentence: Sentence,
    constituents: Vec<Constituent>,
}

impl Tree {
    pub fn new(sentence: Sentence) -> Self {
        Tree {
            sentence,
            constituents: vec![],
        }
    }

    pub fn sentence(&self) -> &Sentence {
        &self.sentence
    }

    pub(crate) fn sentence_mut(&mut self) -> &mut Sentence {
        &mut self.sentence
    }

    pub fn len(&self) -> usize {
        self.sentence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentence.is_empty()
    }

    pub fn constituents(&self) -> &[Constituent] {
        &self.constituents
    }

    pub fn find(&self, begin: usize, end: usize) -> Option<&Constituent> {
        self.constituents
            .iter()
            .find(|c| c.begin == begin && c.end == end)
    }

    ///Adds a constituent, merging its labels into an existing one with the same span.
    pub fn add(&mut self, constituent: Constituent) -> Insertion {
        match self
            .constituents
            .iter_mut()
            .find(|c| c.span() == constituent.span())
        {
            Some(existing) => {
                existing.add_labels(constituent.labels);
                Insertion::Merged
            }
            None => {
                self.constituents.push(constituent);
                Insertion::New
            }
        }
    }

    ///Drops every constituent with `begin == end` and returns how many there were.
    pub fn remove_empty(&mut self) -> usize {
        let before = self.constituents.len();
        self.constituents.retain(|c| !c.is_empty());
        before - self.constituents.len()
    }

    pub fn display<'a>(&'a self, tokens: &'a Interner) -> TreeDisplay<'a> {
        TreeDisplay { tree: self, tokens }
    }
}

///Renders a [`Tree`] in the corpus line format.
pub struct TreeDisplay<'a> {
    tree: &'a Tree,
    tokens: &'a Interner,
}

impl Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.tree
                .sentence
                .tokens
                .iter()
                .map(|t| self.tokens.resolve(*t))
                .join(" ")
        )?;
        if !self.tree.constituents.is_empty() {
            write!(f, " {} ", super::format::DELIMITER)?;
            for c in self.tree.constituents.iter() {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

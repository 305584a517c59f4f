//! The shared data model: interned tokens, nonterminal labels, sentences, constituents and the
//! treebank they are collected in.
use ahash::{AHashMap, AHashSet};
use thiserror::Error;

pub mod format;
mod nonterminal;
mod token;
mod tree;

pub use format::RunHeader;
pub use nonterminal::{Nonterminal, Nonterminals};
pub use token::{Interner, Token};
pub use tree::{Constituent, Insertion, Sentence, Tree, TreeDisplay};

///Per-run state shared by every operation that interns tokens or mints labels.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub tokens: Interner,
    pub nonterminals: Nonterminals,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorpusError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: checkpoint marker {marker:?} is not a sentence index")]
    BadCheckpoint { line: usize, marker: String },

    #[error("line {line}: constituents given without a sentence")]
    MissingSentence { line: usize },

    #[error("line {line}: constituent ({begin},{end}) does not fit a sentence of length {len}")]
    SpanOutOfRange {
        line: usize,
        begin: usize,
        end: usize,
        len: usize,
    },

    #[error("checkpoint cursor {cursor} is past the end of a corpus of {len} sentences")]
    CursorOutOfRange { cursor: usize, len: usize },
}

///An ordered collection of [`Tree`]s with the cursor used for resuming an interrupted run.
#[derive(Debug, Clone, Default)]
pub struct Treebank {
    trees: Vec<Tree>,
    comments: Vec<String>,
    cursor: usize,
}

impl Treebank {
    ///Builds a treebank from whitespace separated sentences, one per item.
    pub fn from_sentences<'a>(
        sentences: impl IntoIterator<Item = &'a str>,
        session: &mut Session,
    ) -> Self {
        let trees = sentences
            .into_iter()
            .enumerate()
            .map(|(id, s)| {
                let tokens = s
                    .split_whitespace()
                    .map(|w| session.tokens.intern(w))
                    .collect();
                Tree::new(Sentence::new(id, tokens))
            })
            .collect();
        Treebank::from_parts(trees, vec![], 0)
    }

    pub(crate) fn from_parts(trees: Vec<Tree>, comments: Vec<String>, cursor: usize) -> Self {
        let mut treebank = Treebank {
            trees,
            comments,
            cursor,
        };
        treebank.index_similarity();
        treebank
    }

    fn index_similarity(&mut self) {
        let mut postings: AHashMap<Token, Vec<usize>> = AHashMap::default();
        for tree in self.trees.iter() {
            let id = tree.sentence().id();
            for token in tree.sentence().tokens().iter().collect::<AHashSet<_>>() {
                postings.entry(*token).or_default().push(id);
            }
        }

        for tree in self.trees.iter_mut() {
            let id = tree.sentence().id();
            let similar: AHashSet<usize> = tree
                .sentence()
                .tokens()
                .iter()
                .flat_map(|t| postings[t].iter().copied())
                .filter(|other| *other != id)
                .collect();
            tree.sentence_mut().set_similar(similar);
        }
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn trees_mut(&mut self) -> &mut [Tree] {
        &mut self.trees
    }

    ///Mutable access to two distinct trees at once.
    ///
    ///Panics if `first == second` or either index is out of bounds.
    pub fn pair_mut(&mut self, first: usize, second: usize) -> (&mut Tree, &mut Tree) {
        assert_ne!(first, second, "a tree cannot be aligned with itself");
        if first < second {
            let (head, tail) = self.trees.split_at_mut(second);
            (&mut head[first], &mut tail[0])
        } else {
            let (head, tail) = self.trees.split_at_mut(first);
            (&mut tail[0], &mut head[second])
        }
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    ///Index of the next sentence an alignment pass will process.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    ///Total number of constituents over all trees.
    pub fn constituent_count(&self) -> usize {
        self.trees.iter().map(|t| t.constituents().len()).sum()
    }
}

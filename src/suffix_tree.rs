//! A generalised suffix tree over a whole corpus, built online one sentence at a time.
//!
//! Every edge remembers, for each sentence whose suffixes run through it, the offsets at which
//! the edge's label ends in that sentence. Edges leaving the root that are shared by several
//! sentences are the repeated patterns [`SuffixTree::align`] turns into constituent boundaries.
use ahash::AHashMap;
use itertools::Itertools;
use petgraph::{
    Direction,
    stable_graph::{EdgeIndex, NodeIndex, StableDiGraph},
    visit::{Dfs, EdgeRef},
};
use std::{collections::{BTreeMap, BTreeSet}, fmt::Display};

use crate::corpus::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Symbol {
    Token(Token),
    ///Terminates the sentence with the given id, so that every suffix ends in a leaf.
    End(usize),
}

///Whether a tree is built over sentences as written or reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Suffix,
    Prefix,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    suffix_link: Option<NodeIndex>,
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.suffix_link {
            Some(link) => write!(f, "-> {}", link.index()),
            None => write!(f, ""),
        }
    }
}

///The label of an edge is `start..end` of one sentence's symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    sentence: usize,
    start: usize,
    end: usize,
    occurrences: BTreeMap<usize, BTreeSet<usize>>,
}

impl Edge {
    fn new(sentence: usize, start: usize, end: usize) -> Self {
        Edge {
            sentence,
            start,
            end,
            occurrences: BTreeMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    ///The sentence the label is read from.
    pub fn sentence(&self) -> usize {
        self.sentence
    }

    ///For every sentence passing through this edge, the (inclusive) offsets at which the label
    ///ends in it.
    pub fn occurrences(&self) -> &BTreeMap<usize, BTreeSet<usize>> {
        &self.occurrences
    }

    fn record(&mut self, sentence: usize, offset: usize) {
        self.occurrences.entry(sentence).or_default().insert(offset);
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}..{})", self.sentence, self.start, self.end)
    }
}

///Constituent boundaries proposed for one sentence, each with the patterns that proposed it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boundaries {
    ///Start positions of spans running to the end of the sentence.
    pub suffixes: BTreeMap<usize, BTreeSet<u64>>,
    ///End positions of spans starting at the beginning of the sentence.
    pub prefixes: BTreeMap<usize, BTreeSet<u64>>,
}

///The possibly implicit position construction has reached: an explicit node plus the pending
///symbols `start..` of the current sentence below it.
#[derive(Debug, Clone, Copy)]
struct ActivePoint {
    node: NodeIndex,
    start: usize,
}

#[derive(Debug, Clone)]
pub struct SuffixTree {
    graph: StableDiGraph<Node, Edge>,
    root: NodeIndex,
    transitions: AHashMap<(NodeIndex, Symbol), EdgeIndex>,
    texts: AHashMap<usize, Vec<Symbol>>,
    orientation: Orientation,
}

impl SuffixTree {
    pub fn new(orientation: Orientation) -> Self {
        let mut graph = StableDiGraph::default();
        let root = graph.add_node(Node::default());
        SuffixTree {
            graph,
            root,
            transitions: AHashMap::default(),
            texts: AHashMap::default(),
            orientation,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    ///Number of sentences added so far.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    fn symbol(&self, sentence: usize, position: usize) -> Symbol {
        self.texts[&sentence][position]
    }

    fn edge_symbol(&self, edge: EdgeIndex, depth: usize) -> Symbol {
        let e = &self.graph[edge];
        self.symbol(e.sentence, e.start + depth)
    }

    fn target(&self, edge: EdgeIndex) -> NodeIndex {
        self.graph
            .edge_endpoints(edge)
            .expect("edge indices in the transition table are live")
            .1
    }

    fn incoming(&self, node: NodeIndex) -> Option<EdgeIndex> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .next()
            .map(|e| e.id())
    }

    ///The edge leaving the root whose label starts with `token`.
    pub fn root_edge(&self, token: Token) -> Option<&Edge> {
        self.transitions
            .get(&(self.root, Symbol::Token(token)))
            .map(|e| &self.graph[*e])
    }

    ///Adds every suffix of a sentence to the tree.
    ///
    ///Panics if a sentence with the same id was already added.
    pub fn construct(&mut self, sentence: usize, tokens: &[Token]) {
        let mut text: Vec<Symbol> = match self.orientation {
            Orientation::Suffix => tokens.iter().copied().map(Symbol::Token).collect(),
            Orientation::Prefix => tokens.iter().rev().copied().map(Symbol::Token).collect(),
        };
        text.push(Symbol::End(sentence));
        let len = text.len();
        assert!(
            self.texts.insert(sentence, text).is_none(),
            "sentence {sentence} is already in the tree"
        );

        let mut active = ActivePoint {
            node: self.root,
            start: 0,
        };
        for phase in 0..len {
            self.extend(sentence, &mut active, phase);
        }
    }

    ///Makes the symbol at `phase` explicit after every suffix still pending at the active point.
    fn extend(&mut self, sentence: usize, active: &mut ActivePoint, phase: usize) {
        let symbol = self.symbol(sentence, phase);
        let mut previous: Option<NodeIndex> = None;

        while active.start <= phase {
            let parent = if active.start == phase {
                if self.transitions.contains_key(&(active.node, symbol)) {
                    break;
                }
                active.node
            } else {
                let edge = *self
                    .transitions
                    .get(&(active.node, self.symbol(sentence, active.start)))
                    .expect("the pending span follows an existing edge");
                let depth = phase - active.start;
                if self.edge_symbol(edge, depth) == symbol {
                    break;
                }
                self.split_edge(edge, depth)
            };

            self.add_leaf(sentence, phase, parent);
            if let Some(previous) = previous {
                self.graph[previous].suffix_link = Some(parent);
            }
            previous = (parent != self.root).then_some(parent);

            if active.node == self.root {
                active.start += 1;
            } else {
                active.node = self.graph[active.node]
                    .suffix_link
                    .expect("internal nodes always have a suffix link");
            }
            self.canonicalize(sentence, active, phase);
        }

        if let Some(previous) = previous {
            self.graph[previous].suffix_link = Some(active.node);
        }
        self.canonicalize(sentence, active, phase + 1);
    }

    ///Moves the active point down past every edge the pending span `start..stop` covers.
    fn canonicalize(&mut self, sentence: usize, active: &mut ActivePoint, stop: usize) {
        while active.start < stop {
            let edge = *self
                .transitions
                .get(&(active.node, self.symbol(sentence, active.start)))
                .expect("the pending span follows an existing edge");
            let len = self.graph[edge].len();
            if len > stop - active.start {
                break;
            }
            self.graph[edge].record(sentence, active.start + len - 1);
            active.start += len;
            active.node = self.target(edge);
        }
    }

    ///Splits `edge` after `depth` symbols and returns the new internal node.
    fn split_edge(&mut self, edge: EdgeIndex, depth: usize) -> NodeIndex {
        let (source, target) = self
            .graph
            .edge_endpoints(edge)
            .expect("edge indices in the transition table are live");
        let first = self.edge_symbol(edge, 0);
        let rest = self.edge_symbol(edge, depth);
        let old = self
            .graph
            .remove_edge(edge)
            .expect("edge indices in the transition table are live");

        let shift = old.len() - depth;
        let mut upper = Edge::new(old.sentence, old.start, old.start + depth);
        for (sentence, offsets) in old.occurrences.iter() {
            for offset in offsets {
                upper.record(*sentence, offset - shift);
            }
        }
        let lower = Edge {
            start: old.start + depth,
            ..old
        };

        let middle = self.graph.add_node(Node::default());
        let upper = self.graph.add_edge(source, middle, upper);
        let lower = self.graph.add_edge(middle, target, lower);
        self.transitions.insert((source, first), upper);
        self.transitions.insert((middle, rest), lower);
        middle
    }

    ///Hangs the remainder of the sentence from `parent`, and records the suffix on every edge
    ///between the root and `parent`.
    fn add_leaf(&mut self, sentence: usize, phase: usize, parent: NodeIndex) {
        let len = self.texts[&sentence].len();
        let mut edge = Edge::new(sentence, phase, len);
        edge.record(sentence, len - 1);
        let leaf = self.graph.add_node(Node::default());
        let edge = self.graph.add_edge(parent, leaf, edge);
        self.transitions
            .insert((parent, self.symbol(sentence, phase)), edge);

        let mut end = phase;
        let mut node = parent;
        while let Some(edge) = self.incoming(node) {
            self.graph[edge].record(sentence, end - 1);
            end -= self.graph[edge].len();
            node = self
                .graph
                .edge_endpoints(edge)
                .expect("incoming edges are live")
                .0;
        }
    }

    ///Ids of the sentences containing `tokens`, read in the order they appear in a sentence.
    pub fn sentences_containing(&self, tokens: &[Token]) -> BTreeSet<usize> {
        let pattern: Vec<Symbol> = match self.orientation {
            Orientation::Suffix => tokens.iter().copied().map(Symbol::Token).collect(),
            Orientation::Prefix => tokens.iter().rev().copied().map(Symbol::Token).collect(),
        };

        let mut node = self.root;
        let mut matched = 0;
        while matched < pattern.len() {
            let Some(&edge) = self.transitions.get(&(node, pattern[matched])) else {
                return BTreeSet::default();
            };
            let n = self.graph[edge].len().min(pattern.len() - matched);
            if (0..n).any(|d| self.edge_symbol(edge, d) != pattern[matched + d]) {
                return BTreeSet::default();
            }
            matched += n;
            node = self.target(edge);
        }

        let mut sentences = BTreeSet::default();
        let mut dfs = Dfs::new(&self.graph, node);
        while let Some(nx) = dfs.next(&self.graph) {
            if self
                .graph
                .edges_directed(nx, Direction::Outgoing)
                .next()
                .is_none()
            {
                if let Some(edge) = self.incoming(nx) {
                    sentences.insert(self.graph[edge].sentence);
                }
            }
        }
        sentences
    }

    ///Numbers every edge leaving the root that is shared by more than one sentence, starting
    ///from 1, and records the boundary each of its occurrences implies.
    ///
    ///Suffix trees propose spans starting right after an occurrence; prefix trees propose spans
    ///from the start of the sentence to right before an occurrence. `boundaries` is indexed by
    ///sentence id. Returns the number of patterns found.
    pub fn align(&self, boundaries: &mut [Boundaries]) -> u64 {
        let mut pattern = 0;
        for edge in self
            .graph
            .edges_directed(self.root, Direction::Outgoing)
            .sorted_by_key(|e| self.edge_symbol(e.id(), 0))
        {
            let label = edge.weight();
            if label.occurrences.len() < 2 {
                continue;
            }
            pattern += 1;
            for (sentence, offsets) in label.occurrences.iter() {
                let len = self.texts[sentence].len() - 1;
                let found = &mut boundaries[*sentence];
                for offset in offsets {
                    match self.orientation {
                        Orientation::Suffix => found.suffixes.entry(offset + 1),
                        Orientation::Prefix => found.prefixes.entry(len - (offset + 1)),
                    }
                    .or_default()
                    .insert(pattern);
                }
            }
        }
        log::debug!(
            "{:?} tree over {} sentences has {} nodes and {pattern} shared patterns",
            self.orientation,
            self.len(),
            self.node_count()
        );
        pattern
    }
}

impl Display for SuffixTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", petgraph::dot::Dot::new(&self.graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Interner;

    fn tokenize(interner: &mut Interner, sentences: &[&str]) -> Vec<Vec<Token>> {
        sentences
            .iter()
            .map(|s| s.split_whitespace().map(|w| interner.intern(w)).collect())
            .collect()
    }

    fn build(orientation: Orientation, sentences: &[Vec<Token>]) -> SuffixTree {
        let mut tree = SuffixTree::new(orientation);
        for (i, s) in sentences.iter().enumerate() {
            tree.construct(i, s);
        }
        tree
    }

    #[test]
    fn shared_root_edges() {
        let mut interner = Interner::new();
        let sentences = tokenize(&mut interner, &["a b a", "b a"]);
        let tree = build(Orientation::Suffix, &sentences);
        let (a, b) = (interner.intern("a"), interner.intern("b"));

        let a_edge = tree.root_edge(a).unwrap();
        assert_eq!(a_edge.len(), 1);
        assert_eq!(
            a_edge.occurrences(),
            &BTreeMap::from([(0, BTreeSet::from([0, 2])), (1, BTreeSet::from([1]))])
        );
        let b_edge = tree.root_edge(b).unwrap();
        assert_eq!(b_edge.len(), 2);
        assert_eq!(
            b_edge.occurrences(),
            &BTreeMap::from([(0, BTreeSet::from([2])), (1, BTreeSet::from([1]))])
        );

        let mut boundaries = vec![Boundaries::default(); 2];
        assert_eq!(tree.align(&mut boundaries), 2);
        assert_eq!(
            boundaries[0].suffixes,
            BTreeMap::from([(1, BTreeSet::from([1])), (3, BTreeSet::from([1, 2]))])
        );
        assert_eq!(
            boundaries[1].suffixes,
            BTreeMap::from([(2, BTreeSet::from([1, 2]))])
        );
        assert!(boundaries[0].prefixes.is_empty());

        let mut again = vec![Boundaries::default(); 2];
        tree.align(&mut again);
        assert_eq!(again, boundaries);
    }

    #[test]
    fn prefix_boundaries() {
        let mut interner = Interner::new();
        let sentences = tokenize(&mut interner, &["x a b", "y a b"]);
        let tree = build(Orientation::Prefix, &sentences);
        let mut boundaries = vec![Boundaries::default(); 2];
        assert_eq!(tree.align(&mut boundaries), 2);
        // "a b" and "b" both end the sentences, leaving "x" or "y" before them.
        for found in boundaries {
            assert_eq!(
                found.prefixes,
                BTreeMap::from([(1, BTreeSet::from([1, 2]))])
            );
            assert!(found.suffixes.is_empty());
        }

        let sentences = tokenize(&mut interner, &["a b a", "b a"]);
        let tree = build(Orientation::Prefix, &sentences);
        let mut boundaries = vec![Boundaries::default(); 2];
        assert_eq!(tree.align(&mut boundaries), 2);
        assert_eq!(
            boundaries[0].prefixes,
            BTreeMap::from([
                (0, BTreeSet::from([1])),
                (1, BTreeSet::from([2])),
                (2, BTreeSet::from([1])),
            ])
        );
        assert_eq!(
            boundaries[1].prefixes,
            BTreeMap::from([(0, BTreeSet::from([2])), (1, BTreeSet::from([1]))])
        );
    }

    #[test]
    fn root_is_the_first_node() {
        let mut interner = Interner::new();
        let sentences = tokenize(&mut interner, &["a a a", "a b"]);
        let tree = build(Orientation::Suffix, &sentences);
        assert_eq!(tree.root().index(), 0);
        assert!(tree.incoming(tree.root()).is_none());
        assert!(tree.to_string().contains("digraph"));
    }

    #[test]
    fn every_substring_is_found() {
        let corpus = [
            "the cat sat on the mat",
            "the dog sat on the cat",
            "a cat and a dog",
            "on on on the",
            "mat",
        ];
        for orientation in [Orientation::Suffix, Orientation::Prefix] {
            let mut interner = Interner::new();
            let sentences = tokenize(&mut interner, &corpus);
            let tree = build(orientation, &sentences);
            for s in sentences.iter() {
                for i in 0..s.len() {
                    for j in i + 1..=s.len() {
                        let needle = &s[i..j];
                        let expected: BTreeSet<usize> = sentences
                            .iter()
                            .enumerate()
                            .filter(|(_, other)| other.windows(needle.len()).any(|w| w == needle))
                            .map(|(k, _)| k)
                            .collect();
                        assert_eq!(tree.sentences_containing(needle), expected);
                    }
                }
            }
            let missing = [interner.intern("mat"), interner.intern("the")];
            assert!(tree.sentences_containing(&missing).is_empty());
        }
    }

    #[test]
    fn occurrences_mark_every_start() {
        let corpus = ["a b c a b", "b c a", "c c b a", "d"];
        let mut interner = Interner::new();
        let sentences = tokenize(&mut interner, &corpus);
        let tree = build(Orientation::Suffix, &sentences);
        for token in ["a", "b", "c"].map(|w| interner.intern(w)) {
            let edge = tree.root_edge(token).unwrap();
            for (k, s) in sentences.iter().enumerate() {
                let expected: BTreeSet<usize> = s
                    .iter()
                    .positions(|t| *t == token)
                    .map(|p| p + edge.len() - 1)
                    .collect();
                assert_eq!(
                    edge.occurrences().get(&k).cloned().unwrap_or_default(),
                    expected
                );
            }
        }
        let d = tree.root_edge(interner.intern("d")).unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(d.occurrences().len(), 1);
    }
}

use ahash::AHashMap;
use itertools::iproduct;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{
    fs::File,
    io::{BufWriter, Write},
    time::Instant,
};

use crate::{
    AlignConfig, AlignMode, Branching, Direction, PairMode, SuffixVariant,
    corpus::{Constituent, Nonterminal, Nonterminals, Session, Tree, Treebank},
    edit::{OperationSet, WagnerFisher, all_alignments},
    hypothesis::{HypothesisConfig, apply_alignment, insert},
    suffix_tree::{Boundaries, Orientation, SuffixTree},
};

///Aligns two trees and inserts the resulting hypotheses into both. Returns the number of new
///constituents.
pub fn align_pair(
    first: &mut Tree,
    second: &mut Tree,
    mode: PairMode,
    config: &HypothesisConfig,
    nonterminals: &mut Nonterminals,
) -> usize {
    let (a, b) = (first.sentence().tokens(), second.sentence().tokens());
    let alignments = match mode {
        PairMode::WagnerMin => {
            vec![WagnerFisher::new(a, b, OperationSet::Default).into_alignment()]
        }
        PairMode::WagnerBiased => {
            vec![WagnerFisher::new(a, b, OperationSet::Biased).into_alignment()]
        }
        PairMode::All => all_alignments(a, b),
    };
    log::debug!(
        "sentences {} and {}: {} alignment(s)",
        first.sentence().id(),
        second.sentence().id(),
        alignments.len()
    );
    alignments
        .iter()
        .map(|alignment| apply_alignment(first, second, alignment, config, nonterminals))
        .sum()
}

///Hands out one label per span, so equal spans in different sentences share a label.
#[derive(Debug, Default)]
struct SpanLabels(AHashMap<(usize, usize), Nonterminal>);

impl SpanLabels {
    fn label(&mut self, begin: usize, end: usize, nonterminals: &mut Nonterminals) -> Nonterminal {
        *self
            .0
            .entry((begin, end))
            .or_insert_with(|| nonterminals.fresh())
    }
}

///Builds suffix and/or prefix trees over the whole treebank and inserts the boundaries of the
///patterns they share. Returns the number of new constituents.
pub fn build_suffix_structures(
    treebank: &mut Treebank,
    variant: SuffixVariant,
    config: &HypothesisConfig,
    nonterminals: &mut Nonterminals,
) -> usize {
    let orientations: &[Orientation] = match variant {
        SuffixVariant::Suffixes => &[Orientation::Suffix],
        SuffixVariant::Prefixes => &[Orientation::Prefix],
        SuffixVariant::Both | SuffixVariant::Cross => &[Orientation::Suffix, Orientation::Prefix],
    };

    let mut boundaries = vec![Boundaries::default(); treebank.len()];
    for orientation in orientations {
        let mut tree = SuffixTree::new(*orientation);
        for t in treebank.trees() {
            tree.construct(t.sentence().id(), t.sentence().tokens());
        }
        tree.align(&mut boundaries);
    }

    let start = nonterminals.start().value();
    let mut spans = SpanLabels::default();
    let mut created = 0;
    for (tree, found) in treebank.trees_mut().iter_mut().zip(boundaries.iter_mut()) {
        let len = tree.len();
        found.suffixes.entry(0).or_default().insert(start);
        found.prefixes.entry(len).or_default().insert(start);

        if variant == SuffixVariant::Cross {
            for (&begin, &end) in iproduct!(found.suffixes.keys(), found.prefixes.keys()) {
                if begin > end || (config.exclude_empty && begin == end) {
                    continue;
                }
                let label = if (begin, end) == (0, len) {
                    Nonterminal::START
                } else {
                    spans.label(begin, end, nonterminals)
                };
                created += insert(tree, Constituent::new(begin, end, label), config);
            }
            continue;
        }
        if variant != SuffixVariant::Prefixes {
            for (&begin, patterns) in found.suffixes.iter() {
                for &p in patterns {
                    let c = Constituent::new(begin, len, nonterminals.observe(p));
                    created += insert(tree, c, config);
                }
            }
        }
        if variant != SuffixVariant::Suffixes {
            for (&end, patterns) in found.prefixes.iter() {
                for &p in patterns {
                    let c = Constituent::new(0, end, nonterminals.observe(p));
                    created += insert(tree, c, config);
                }
            }
        }
    }
    created
}

///Brackets a sentence as a purely left or right branching tree.
fn branch(
    tree: &mut Tree,
    direction: Direction,
    config: &HypothesisConfig,
    nonterminals: &mut Nonterminals,
) -> usize {
    let len = tree.len();
    (1..len)
        .map(|i| {
            let label = nonterminals.fresh();
            let c = match direction {
                Direction::Left => Constituent::new(0, i, label),
                Direction::Right => Constituent::new(i, len, label),
            };
            insert(tree, c, config)
        })
        .sum()
}

///Runs an alignment mode over a whole treebank.
#[derive(Debug, Clone)]
pub struct Learner {
    config: AlignConfig,
    rng: ChaCha8Rng,
    last_checkpoint: Instant,
}

impl Learner {
    pub fn new(config: AlignConfig) -> Self {
        Learner {
            rng: ChaCha8Rng::seed_from_u64(config.seed.value()),
            config,
            last_checkpoint: Instant::now(),
        }
    }

    ///Adds hypotheses to every tree and returns how many new constituents were created.
    ///
    ///Sentence-by-sentence modes start at the treebank's cursor and advance it; suffix tree
    ///modes always cover the whole treebank.
    pub fn run(&mut self, treebank: &mut Treebank, session: &mut Session) -> usize {
        if self.config.hypotheses.exclude_empty {
            let removed: usize = treebank
                .trees_mut()
                .iter_mut()
                .map(Tree::remove_empty)
                .sum();
            if removed > 0 {
                log::info!("removed {removed} empty constituents read with the corpus");
            }
        }
        let created = match self.config.mode {
            AlignMode::SuffixTree(variant) => {
                if treebank.cursor() > 0 {
                    log::warn!(
                        "suffix tree alignment covers the whole corpus; ignoring cursor {}",
                        treebank.cursor()
                    );
                }
                build_suffix_structures(
                    treebank,
                    variant,
                    &self.config.hypotheses,
                    &mut session.nonterminals,
                )
            }
            _ => self.sentence_pass(treebank, session),
        };
        log::info!(
            "{:?}: {created} hypotheses over {} sentences",
            self.config.mode,
            treebank.len()
        );
        created
    }

    fn sentence_pass(&mut self, treebank: &mut Treebank, session: &mut Session) -> usize {
        let (mode, config) = (self.config.mode, self.config.hypotheses);
        let mut created = 0;
        for current in treebank.cursor()..treebank.len() {
            treebank.set_cursor(current);
            let tree = &mut treebank.trees_mut()[current];
            let start = Constituent::new(0, tree.len(), session.nonterminals.start());
            created += insert(tree, start, &config);

            match mode {
                AlignMode::Pairs(mode) => {
                    for other in current + 1..treebank.len() {
                        let compare = mode == PairMode::All
                            || self.config.exhaustive
                            || treebank.trees()[current].sentence().is_similar_to(other);
                        if compare {
                            let (a, b) = treebank.pair_mut(current, other);
                            created += align_pair(a, b, mode, &config, &mut session.nonterminals);
                        }
                    }
                }
                AlignMode::Branching(branching) => {
                    let direction = match branching {
                        Branching::Left => Direction::Left,
                        Branching::Right => Direction::Right,
                        Branching::Random if self.rng.random_range(0..100) < 50 => Direction::Right,
                        Branching::Random => Direction::Left,
                    };
                    let tree = &mut treebank.trees_mut()[current];
                    created += branch(tree, direction, &config, &mut session.nonterminals);
                }
                AlignMode::SuffixTree(_) => {
                    unreachable!("suffix tree modes do not run sentence by sentence")
                }
            }

            treebank.set_cursor(current + 1);
            self.checkpoint(treebank, session);
        }
        created
    }

    ///Writes the treebank to the checkpoint file once the configured interval has passed.
    fn checkpoint(&mut self, treebank: &Treebank, session: &Session) {
        let Some(checkpoint) = &self.config.checkpoint else {
            return;
        };
        if self.last_checkpoint.elapsed() < checkpoint.interval {
            return;
        }
        let path = checkpoint.path(treebank.cursor());
        let written = File::create(&path).and_then(|file| {
            let mut w = BufWriter::new(file);
            treebank.write_checkpoint(&session.tokens, &mut w)?;
            w.flush()
        });
        match written {
            Ok(()) => log::info!("checkpoint written to {}", path.display()),
            Err(e) => log::warn!("could not write checkpoint {}: {e}", path.display()),
        }
        self.last_checkpoint = Instant::now();
    }
}

//! Sentence-pair aligners: a Wagner-Fisher edit distance with pluggable substitution costs and
//! an enumerator of every maximal set of compatible token matches.
mod all_alignments;
mod operations;
mod wagner_fisher;

pub use all_alignments::{
    Link, all_alignments, candidate_links, conflicts, links_to_alignment, maximal_link_sets,
};
pub use operations::{Coord, EditOperation, INDEL_COST, OperationSet, SUBSTITUTION_COST};
pub use wagner_fisher::{CostMatrix, WagnerFisher};

///The path through the edit grid from `(0, 0)` to `(len1, len2)`.
pub type Alignment = Vec<EditOperation>;

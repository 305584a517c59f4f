use std::fmt::Display;

///A position in the edit grid: tokens consumed from the first and second sequence.
pub type Coord = (usize, usize);

pub const INDEL_COST: f64 = 1.0;
pub const SUBSTITUTION_COST: f64 = 2.0;

///One step of an [`Alignment`](super::Alignment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOperation {
    ///Consumes a token of the second sequence only.
    Insert,
    ///Consumes a token of the first sequence only.
    Delete,
    Substitute,
    ///A substitution whose matches are cheaper the closer their relative positions are.
    BiasedSubstitute,
}

impl EditOperation {
    ///The cell this operation steps from to reach `coord`, if it lies inside the grid.
    pub fn previous(&self, (i, j): Coord) -> Option<Coord> {
        match self {
            EditOperation::Insert => Some((i, j.checked_sub(1)?)),
            EditOperation::Delete => Some((i.checked_sub(1)?, j)),
            EditOperation::Substitute | EditOperation::BiasedSubstitute => {
                Some((i.checked_sub(1)?, j.checked_sub(1)?))
            }
        }
    }

    pub fn next(&self, (i, j): Coord) -> Coord {
        match self {
            EditOperation::Insert => (i, j + 1),
            EditOperation::Delete => (i + 1, j),
            EditOperation::Substitute | EditOperation::BiasedSubstitute => (i + 1, j + 1),
        }
    }

    pub fn is_substitution(&self) -> bool {
        matches!(
            self,
            EditOperation::Substitute | EditOperation::BiasedSubstitute
        )
    }

    ///The cost of arriving at `(i, j)` with this operation.
    ///
    ///Coordinates are 1-indexed: `(i, j)` compares token `i - 1` of `first` with token `j - 1`
    ///of `second`.
    pub fn cost<T: PartialEq>(&self, first: &[T], second: &[T], (i, j): Coord) -> f64 {
        match self {
            EditOperation::Insert | EditOperation::Delete => INDEL_COST,
            _ if i == 0 || j == 0 => SUBSTITUTION_COST,
            _ if first[i - 1] != second[j - 1] => SUBSTITUTION_COST,
            EditOperation::Substitute => 0.0,
            EditOperation::BiasedSubstitute => {
                let (len1, len2) = (first.len() as f64, second.len() as f64);
                let relative_first = (i - 1) as f64 / len1;
                let relative_second = (j - 1) as f64 / len2;
                (relative_first - relative_second).abs() * (len1 + len2) / 2.0
            }
        }
    }
}

impl Display for EditOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EditOperation::Insert => "ins",
                EditOperation::Delete => "del",
                EditOperation::Substitute => "sub",
                EditOperation::BiasedSubstitute => "sub_dis",
            }
        )
    }
}

///The fixed sets of operations an aligner can be run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationSet {
    Default,
    Biased,
}

impl OperationSet {
    ///The operations in registration order, which is also the order ties are broken in.
    pub fn operations(&self) -> [EditOperation; 3] {
        match self {
            OperationSet::Default => [
                EditOperation::Insert,
                EditOperation::Delete,
                EditOperation::Substitute,
            ],
            OperationSet::Biased => [
                EditOperation::Insert,
                EditOperation::Delete,
                EditOperation::BiasedSubstitute,
            ],
        }
    }
}

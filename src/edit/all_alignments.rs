//! Enumeration of every maximal set of compatible token matches between two sequences.
use std::collections::BTreeSet;

use super::{Alignment, EditOperation};

///A match between position `.0` of the first sequence and position `.1` of the second.
pub type Link = (usize, usize);

///Two links conflict unless one lies strictly after the other in both sequences.
pub fn conflicts((a, b): Link, (c, d): Link) -> bool {
    (a <= c && b >= d) || (a >= c && b <= d)
}

///Every pair of positions holding equal tokens, in row-major order.
pub fn candidate_links<T: PartialEq>(first: &[T], second: &[T]) -> Vec<Link> {
    first
        .iter()
        .enumerate()
        .flat_map(|(i, x)| {
            second
                .iter()
                .enumerate()
                .filter(move |(_, y)| x == *y)
                .map(move |(j, _)| (i, j))
        })
        .collect()
}

///Both arguments must be sorted.
fn is_subset(small: &[Link], large: &[Link]) -> bool {
    let mut large = large.iter();
    small.iter().all(|x| large.any(|y| y == x))
}

fn retain_maximal(lists: BTreeSet<Vec<Link>>) -> BTreeSet<Vec<Link>> {
    lists
        .iter()
        .filter(|list| {
            !lists
                .iter()
                .any(|other| other.len() > list.len() && is_subset(list, other))
        })
        .cloned()
        .collect()
}

///All maximal lists of mutually compatible links, each sorted.
pub fn maximal_link_sets<T: PartialEq>(first: &[T], second: &[T]) -> Vec<Vec<Link>> {
    let mut lists = BTreeSet::from([vec![]]);
    for link in candidate_links(first, second) {
        let mut next = BTreeSet::new();
        let mut competing = BTreeSet::new();
        for list in lists {
            if list.iter().any(|l| conflicts(*l, link)) {
                let mut replaced: Vec<Link> = list
                    .iter()
                    .copied()
                    .filter(|l| !conflicts(*l, link))
                    .collect();
                replaced.push(link);
                competing.insert(replaced);
                next.insert(list);
            } else {
                let mut extended = list;
                extended.push(link);
                next.insert(extended);
            }
        }
        next.extend(competing);
        lists = retain_maximal(next);
    }
    lists.into_iter().collect()
}

///Spells out a link list as a full path through the edit grid.
pub fn links_to_alignment(links: &[Link], len1: usize, len2: usize) -> Alignment {
    let mut alignment = vec![];
    let mut current = (0, 0);
    for &(i, j) in links.iter().chain(std::iter::once(&(len1, len2))) {
        alignment.extend(std::iter::repeat_n(EditOperation::Delete, i - current.0));
        alignment.extend(std::iter::repeat_n(EditOperation::Insert, j - current.1));
        current = (i, j);
        if current != (len1, len2) {
            alignment.push(EditOperation::Substitute);
            current = (i + 1, j + 1);
        }
    }
    alignment
}

///One alignment per maximal link list.
pub fn all_alignments<T: PartialEq>(first: &[T], second: &[T]) -> Vec<Alignment> {
    maximal_link_sets(first, second)
        .into_iter()
        .map(|links| links_to_alignment(&links, first.len(), second.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn crossing_matches() {
        let links = maximal_link_sets(&["a", "b"], &["b", "a"]);
        assert_eq!(links, vec![vec![(0, 1)], vec![(1, 0)]]);

        let alignments = all_alignments(&["a", "b"], &["b", "a"]);
        use EditOperation::*;
        assert_eq!(
            alignments,
            vec![
                vec![Insert, Substitute, Delete],
                vec![Delete, Substitute, Insert]
            ]
        );
    }

    #[test]
    fn no_matches_gives_one_alignment() {
        let alignments = all_alignments(&["a", "b"], &["c"]);
        use EditOperation::*;
        assert_eq!(alignments, vec![vec![Delete, Delete, Insert]]);
    }

    #[test]
    fn results_are_compatible_and_maximal() {
        let first = ["the", "dog", "saw", "the", "cat"];
        let second = ["the", "cat", "saw", "the", "dog"];
        let sets = maximal_link_sets(&first, &second);
        let candidates = candidate_links(&first, &second);
        assert!(!sets.is_empty());
        for set in sets.iter() {
            for (x, y) in set.iter().tuple_combinations() {
                assert!(!conflicts(*x, *y));
            }
            for link in candidates.iter().filter(|l| !set.contains(l)) {
                assert!(set.iter().any(|l| conflicts(*l, *link)));
            }
        }
        for (x, y) in sets.iter().tuple_combinations() {
            assert!(!is_subset(x, y) && !is_subset(y, x));
        }
        // the-saw-the in order is the longest compatible chain.
        assert!(sets.contains(&vec![(0, 0), (2, 2), (3, 3)]));
    }

    #[test]
    fn alignments_cover_both_sequences() {
        let first = ["a", "b", "a", "c"];
        let second = ["c", "a", "b"];
        for (links, alignment) in maximal_link_sets(&first, &second)
            .iter()
            .zip(all_alignments(&first, &second))
        {
            let mut coord = (0, 0);
            let mut matched = vec![];
            for op in alignment {
                if op.is_substitution() {
                    matched.push(coord);
                    assert_eq!(first[coord.0], second[coord.1]);
                }
                coord = op.next(coord);
            }
            assert_eq!(coord, (first.len(), second.len()));
            assert_eq!(&matched, links);
        }
    }
}

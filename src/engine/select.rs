//! Min-group selection
//!
//! Each round the merge looks at the current path of every live cursor and
//! marks the cursors sharing the smallest one. A single left-to-right pass
//! suffices: the first live path is the candidate, and a smaller path found
//! later clears the marks and becomes the new candidate.

use std::cmp::Ordering;

/// Cursors holding the round's smallest path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinGroup {
    marks: Vec<bool>,
    count: usize,
}

impl MinGroup {
    /// Marker per cursor index, `true` for group members
    pub fn marks(&self) -> &[bool] {
        &self.marks
    }

    /// Number of members
    pub fn count(&self) -> usize {
        self.count
    }

    /// An empty group means every cursor is exhausted
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.marks.get(index).copied().unwrap_or(false)
    }

    /// Indices of group members, ascending
    pub fn members(&self) -> impl Iterator<Item = usize> + '_ {
        self.marks
            .iter()
            .enumerate()
            .filter_map(|(i, &marked)| marked.then_some(i))
    }

    /// Indices outside the group, ascending
    pub fn non_members(&self) -> impl Iterator<Item = usize> + '_ {
        self.marks
            .iter()
            .enumerate()
            .filter_map(|(i, &marked)| (!marked).then_some(i))
    }
}

/// Select the cursors whose current path is the smallest
///
/// `heads` yields each cursor's current path in index order, `None` for an
/// exhausted cursor. Paths compare byte-wise.
pub fn select_min_group<'p, I>(heads: I) -> MinGroup
where
    I: IntoIterator<Item = Option<&'p str>>,
{
    let heads = heads.into_iter();
    let mut marks = Vec::with_capacity(heads.size_hint().0);
    let mut count = 0;
    let mut candidate: Option<&str> = None;

    for head in heads {
        let Some(path) = head else {
            marks.push(false);
            continue;
        };

        match candidate {
            None => {
                candidate = Some(path);
                marks.push(true);
                count = 1;
            }
            Some(min) => match path.as_bytes().cmp(min.as_bytes()) {
                Ordering::Equal => {
                    marks.push(true);
                    count += 1;
                }
                Ordering::Greater => marks.push(false),
                Ordering::Less => {
                    marks.iter_mut().for_each(|m| *m = false);
                    marks.push(true);
                    count = 1;
                    candidate = Some(path);
                }
            },
        }
    }

    MinGroup { marks, count }
}

use std::collections::HashSet;
use std::hash::Hash;

/// Edits that bring a stored relation set to a desired one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDiff<T> {
    pub to_add: Vec<T>,
    pub to_remove: Vec<T>,
}

impl<T> RelationDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes `desired - stored` and `stored - desired`.
///
/// Duplicates on either side collapse, so every target appears at most once
/// in the output. Output order follows first appearance in the input.
pub fn diff_relations<T>(desired: &[T], stored: &[T]) -> RelationDiff<T>
where
    T: Eq + Hash + Clone,
{
    let desired_set: HashSet<&T> = desired.iter().collect();
    let stored_set: HashSet<&T> = stored.iter().collect();

    let mut seen = HashSet::new();
    let to_add = desired
        .iter()
        .filter(|target| !stored_set.contains(target) && seen.insert(*target))
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let to_remove = stored
        .iter()
        .filter(|target| !desired_set.contains(target) && seen.insert(*target))
        .cloned()
        .collect();

    RelationDiff { to_add, to_remove }
}

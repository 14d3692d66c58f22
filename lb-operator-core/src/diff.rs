use std::{collections::HashSet, hash::Hash};

/// Returns the elements of `a` that aren't present in `b`.
///
/// Order and multiplicity of `a` are preserved.
pub fn difference<T>(a: &[T], b: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let lookup = b.iter().collect::<HashSet<&T>>();

    a.iter()
        .filter(|item| !lookup.contains(item))
        .cloned()
        .collect()
}

/// Order preserving de-duplication.
pub fn unique<T>(items: impl IntoIterator<Item = T>) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::new();

    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

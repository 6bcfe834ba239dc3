//! Generic rename detection.
//!
//! Objects present only in current (`removed`) and only in target (`added`)
//! are cross-compared by a caller-supplied shape key: the canonical
//! rendering of the object with its identity fields masked and comments
//! stripped. A shape shared by exactly one removed and exactly one added
//! object is a rename; any ambiguity falls back to drop-and-create.

use std::collections::HashMap;

/// Outcome of rename matching over one category.
pub struct RenameMatch<T> {
    pub renames: Vec<(T, T)>,
    pub removed: Vec<T>,
    pub added:   Vec<T>
}

pub fn detect_renames<T>(
    removed: Vec<T>,
    added: Vec<T>,
    shape: impl Fn(&T) -> String
) -> RenameMatch<T> {
    let mut removed_by_shape: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, item) in removed.iter().enumerate() {
        removed_by_shape.entry(shape(item)).or_default().push(i);
    }
    let mut added_by_shape: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, item) in added.iter().enumerate() {
        added_by_shape.entry(shape(item)).or_default().push(i);
    }

    let mut renamed_removed = vec![false; removed.len()];
    let mut renamed_added = vec![false; added.len()];
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    for (key, removed_idx) in &removed_by_shape {
        if let Some(added_idx) = added_by_shape.get(key) {
            if removed_idx.len() == 1 && added_idx.len() == 1 {
                pairs.push((removed_idx[0], added_idx[0]));
                renamed_removed[removed_idx[0]] = true;
                renamed_added[added_idx[0]] = true;
            }
        }
    }
    pairs.sort();

    let mut removed_items: Vec<Option<T>> = removed.into_iter().map(Some).collect();
    let mut added_items: Vec<Option<T>> = added.into_iter().map(Some).collect();

    let renames = pairs
        .into_iter()
        .map(|(r, a)| {
            (
                removed_items[r].take().expect("unique pair"),
                added_items[a].take().expect("unique pair")
            )
        })
        .collect();

    RenameMatch {
        renames,
        removed: removed_items.into_iter().flatten().collect(),
        added: added_items.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_shape_is_a_rename() {
        let result = detect_renames(
            vec![("old", "shape-a")],
            vec![("new", "shape-a")],
            |(_, shape)| shape.to_string()
        );
        assert_eq!(result.renames.len(), 1);
        assert_eq!(result.renames[0].0.0, "old");
        assert_eq!(result.renames[0].1.0, "new");
        assert!(result.removed.is_empty());
        assert!(result.added.is_empty());
    }

    #[test]
    fn ambiguity_falls_back_to_drop_create() {
        let result = detect_renames(
            vec![("old1", "same"), ("old2", "same")],
            vec![("new1", "same")],
            |(_, shape)| shape.to_string()
        );
        assert!(result.renames.is_empty());
        assert_eq!(result.removed.len(), 2);
        assert_eq!(result.added.len(), 1);
    }

    #[test]
    fn mixed_shapes_pair_independently() {
        let result = detect_renames(
            vec![("old_a", "a"), ("old_b", "b"), ("gone", "c")],
            vec![("new_b", "b"), ("new_a", "a"), ("fresh", "d")],
            |(_, shape)| shape.to_string()
        );
        assert_eq!(result.renames.len(), 2);
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.added.len(), 1);
    }
}

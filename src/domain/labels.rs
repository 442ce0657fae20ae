//! Label inheritance.

/// Combines the labels a node inherits with the labels written on it.
///
/// The explicit labels come first, followed by any inherited label not
/// already present. Either side may be absent; if both are, so is the result.
#[must_use]
pub fn merge(inherited: Option<&[String]>, explicit: Option<&[String]>) -> Option<Vec<String>> {
    match (inherited, explicit) {
        (None, None) => None,
        (Some(labels), None) | (None, Some(labels)) => Some(labels.to_vec()),
        (Some(inherited), Some(explicit)) => {
            let mut combined = explicit.to_vec();
            for label in inherited {
                if !combined.contains(label) {
                    combined.push(label.clone());
                }
            }
            Some(combined)
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn nothing_merged_with_nothing_is_nothing() {
        assert_eq!(merge(None, None), None);
    }

    #[test_case(&["a"], &["b"], &["b", "a"]; "disjoint")]
    #[test_case(&["a", "b"], &["b", "c"], &["b", "c", "a"]; "overlapping")]
    #[test_case(&["a", "b"], &["a", "b"], &["a", "b"]; "identical")]
    fn explicit_labels_come_first(inherited: &[&str], explicit: &[&str], expected: &[&str]) {
        let inherited = labels(inherited);
        let explicit = labels(explicit);
        assert_eq!(
            merge(Some(&inherited), Some(&explicit)),
            Some(labels(expected))
        );
    }

    #[test]
    fn a_single_side_is_returned_as_is() {
        let only = labels(&["x", "y"]);
        assert_eq!(merge(Some(&only), None), Some(only.clone()));
        assert_eq!(merge(None, Some(&only)), Some(only));
    }

    #[test]
    fn merging_with_itself_is_idempotent() {
        let set = labels(&["smoke", "slow", "ui"]);
        assert_eq!(merge(Some(&set), Some(&set)), Some(set));
    }
}

//! Chapter and verse key ordering
//!
//! Keys are compared by the integer before the first `-` so that `"2"` comes
//! before `"10"` and a range such as `"3-4"` sorts with `"3"`. Keys without a
//! leading number (`"front"`) sort after every numbered key, and among
//! themselves lexically.

use std::cmp::Ordering;

/// Leading integer of the key's first `-`-separated part
///
/// Mirrors integer-prefix parsing: `"12b"` gives 12, `"front"` gives `None`.
pub fn numeric_prefix(key: &str) -> Option<u64> {
    let head = key.split('-').next().unwrap_or(key).trim_start();
    let digits = head
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(head.len());
    head[..digits].parse().ok()
}

/// Compare two chapter or verse keys
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (numeric_prefix(a), numeric_prefix(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Keys in canonical order
///
/// The sort is stable, so keys with the same numeric prefix keep the order
/// they were given in (lexical, when coming from a `BTreeMap`).
pub fn sorted_keys<'a, I>(keys: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut keys: Vec<&str> = keys.into_iter().map(String::as_str).collect();
    keys.sort_by(|a, b| compare_keys(a, b));
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_prefix() {
        assert_eq!(numeric_prefix("10"), Some(10));
        assert_eq!(numeric_prefix("3-4"), Some(3));
        assert_eq!(numeric_prefix("12b"), Some(12));
        assert_eq!(numeric_prefix("front"), None);
        assert_eq!(numeric_prefix(""), None);
    }

    #[test]
    fn test_numeric_before_non_numeric() {
        assert_eq!(compare_keys("2", "front"), Ordering::Less);
        assert_eq!(compare_keys("front", "2"), Ordering::Greater);
        assert_eq!(compare_keys("intro", "front"), Ordering::Greater);
    }

    #[test]
    fn test_sorted_keys_numeric_and_ranges() {
        let keys: Vec<String> = ["10", "2", "front", "3-4"]
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(sorted_keys(&keys), vec!["2", "3-4", "10", "front"]);
    }

    #[test]
    fn test_sorted_keys_ties_are_stable() {
        let keys: Vec<String> = ["3", "3-4"].iter().map(|k| k.to_string()).collect();
        assert_eq!(sorted_keys(&keys), vec!["3", "3-4"]);
    }
}

//! Include/exclude filtering of container records.
//!
//! A collection config describes the containers it wants with a
//! [`FilterCriteria`]: per category (runtime labels, environment variables,
//! Kubernetes pod labels) an include map and an exclude map, each either
//! literal or regex-valued. [`FilterCriteria::compile`] turns the criteria
//! into a [`Filter`] which is evaluated against records.
//!
//! Semantics:
//!
//! - every key of an include map is required on the record with an equal
//!   (or matching) value; absent or empty include maps impose no constraint,
//! - a record is rejected as soon as any key of any exclude map is present
//!   with an equal (or matching) value; exclusion wins over inclusion,
//! - an invalid regex is reported once at compile time; as an include it
//!   never matches, as an exclude it never excludes.
use std::collections::HashMap;

mod criteria;
mod error;
mod matcher;

pub use criteria::FilterCriteria;
pub use error::{Error, Result};
pub use matcher::Filter;

/// Splits a config map into literal and regex-valued entries. Values written
/// as `^...$` are regular expressions, everything else is compared literally.
///
/// # Examples
///
/// ```
/// # use std::collections::HashMap;
/// # use creo_discovery::filter::split_regex_from_map;
/// let map = HashMap::from([
///     ("app".to_owned(), "web".to_owned()),
///     ("tier".to_owned(), "^front.*$".to_owned()),
/// ]);
/// let (literal, regex) = split_regex_from_map(map);
/// assert_eq!(literal["app"], "web");
/// assert_eq!(regex["tier"], "^front.*$");
/// ```
pub fn split_regex_from_map(
    map: HashMap<String, String>,
) -> (HashMap<String, String>, HashMap<String, String>) {
    let (regex, literal): (HashMap<_, _>, HashMap<_, _>) = map
        .into_iter()
        .partition(|(_, value)| value.len() >= 2 && value.starts_with('^') && value.ends_with('$'));
    (literal, regex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_requires_both_anchors() {
        let map = HashMap::from([
            ("a".to_owned(), "^x$".to_owned()),
            ("b".to_owned(), "^x".to_owned()),
            ("c".to_owned(), "x$".to_owned()),
            ("d".to_owned(), "^".to_owned()),
            ("e".to_owned(), String::new()),
        ]);
        let (literal, regex) = split_regex_from_map(map);
        assert_eq!(regex.len(), 1);
        assert!(regex.contains_key("a"));
        assert_eq!(literal.len(), 4);
    }
}

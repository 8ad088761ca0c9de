//! Path parameters captured by a route match.

use smallvec::SmallVec;

/// Captures kept inline before spilling to the heap.
const INLINE_CAPTURES: usize = 4;

/// Ordered `(name, value)` pairs captured from the request path.
///
/// # Example
///
/// ```rust
/// use hermes_router::Params;
///
/// let mut params = Params::new();
/// params.push("id", "1");
///
/// assert_eq!(params.get("id"), Some("1"));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    captured: SmallVec<[(String, String); INLINE_CAPTURES]>,
}

impl Params {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a param.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.captured.push((name.into(), value.into()));
    }

    /// Returns the first value captured under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.captured
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value.as_str()))
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captured.is_empty()
    }

    /// Returns the number of captured params.
    #[must_use]
    pub fn len(&self) -> usize {
        self.captured.len()
    }

    /// Drops params pushed after `len`; used when a match attempt backtracks.
    pub fn truncate(&mut self, len: usize) {
        self.captured.truncate(len);
    }

    /// Iterates over `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.captured
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<T>(pairs: T) -> Self
    where
        T: IntoIterator<Item = (String, String)>,
    {
        Self {
            captured: pairs.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_capture_wins() {
        let mut params = Params::new();
        params.push("questionId", "7");
        params.push("answerId", "3");
        params.push("questionId", "8");

        assert_eq!(params.get("questionId"), Some("7"));
        assert_eq!(params.get("answerId"), Some("3"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_truncate_after_failed_branch() {
        let mut params = Params::new();
        params.push("category", "books");
        let mark = params.len();
        params.push("slug", "dune");
        params.truncate(mark);

        assert_eq!(params.len(), 1);
        assert!(params.get("slug").is_none());
    }

    #[test]
    fn test_many_captures() {
        let mut params = Params::new();
        for depth in 0..10 {
            params.push(format!("level{depth}"), depth.to_string());
        }
        assert_eq!(params.get("level7"), Some("7"));
        assert!(!params.is_empty());
    }

    #[test]
    fn test_collect_keeps_order() {
        let params: Params = [("year", "2024"), ("month", "05")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            vec![("year", "2024"), ("month", "05")]
        );
    }
}

//! Visited sections guard
//!
//! Keeps the list of sections a user has passed through bounded. Entries are
//! unique; once the cap is reached the oldest entry is dropped before a new
//! one is appended.

use serde::{Deserialize, Deserializer, Serialize};

/// Maximum number of section ids kept per journey
pub const MAX_VISITED_SECTIONS: usize = 500;

/// Record a visited section
///
/// A missing list is treated as empty. Missing or empty ids, and ids already
/// present, leave the list unchanged.
#[must_use]
pub fn update_visited_sections(sections: Option<Vec<String>>, section_id: Option<&str>) -> Vec<String> {
    let mut sections = sections.unwrap_or_default();

    let Some(id) = section_id.filter(|id| !id.is_empty()) else {
        return sections;
    };

    if sections.iter().any(|s| s == id) {
        return sections;
    }

    if sections.len() >= MAX_VISITED_SECTIONS {
        sections.remove(0);
    }
    sections.push(id.to_string());
    sections
}

/// Bounded, de-duplicated list of visited section ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VisitedSections(Vec<String>);

impl VisitedSections {
    /// Create empty list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a section, returning whether the list changed
    pub fn record(&mut self, section_id: &str) -> bool {
        if section_id.is_empty() || self.contains(section_id) {
            return false;
        }
        self.0 = update_visited_sections(Some(std::mem::take(&mut self.0)), Some(section_id));
        true
    }

    /// Whether a section has been visited
    #[inline]
    #[must_use]
    pub fn contains(&self, section_id: &str) -> bool {
        self.0.iter().any(|s| s == section_id)
    }

    /// Number of recorded sections
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sections oldest first
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl FromIterator<String> for VisitedSections {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let sections = iter
            .into_iter()
            .fold(Vec::new(), |acc, id| update_visited_sections(Some(acc), Some(&id)));
        Self(sections)
    }
}

impl<'de> Deserialize<'de> for VisitedSections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
        Ok(raw.unwrap_or_default().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("section-{i}")).collect()
    }

    #[test]
    fn appends_new_section() {
        assert_eq!(update_visited_sections(Some(vec![]), Some("a")), vec!["a"]);
    }

    #[test]
    fn repeat_is_idempotent() {
        let once = update_visited_sections(Some(vec![]), Some("a"));
        let twice = update_visited_sections(Some(once.clone()), Some("a"));
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_list_is_empty() {
        assert_eq!(update_visited_sections(None, Some("a")), vec!["a"]);
        assert!(update_visited_sections(None, None).is_empty());
    }

    #[test]
    fn empty_id_is_ignored() {
        let sections = vec!["a".to_string()];
        assert_eq!(update_visited_sections(Some(sections.clone()), Some("")), sections);
        assert_eq!(update_visited_sections(Some(sections.clone()), None), sections);
    }

    #[test]
    fn evicts_oldest_at_cap() {
        let sections = filled(MAX_VISITED_SECTIONS);
        let updated = update_visited_sections(Some(sections), Some("new"));

        assert_eq!(updated.len(), MAX_VISITED_SECTIONS);
        assert_eq!(updated.first().map(String::as_str), Some("section-1"));
        assert_eq!(updated.last().map(String::as_str), Some("new"));
    }

    #[test]
    fn record_reports_changes() {
        let mut visited = VisitedSections::new();
        assert!(visited.record("a"));
        assert!(!visited.record("a"));
        assert!(!visited.record(""));
        assert_eq!(visited.as_slice(), ["a".to_string()]);
    }

    #[test]
    fn record_at_cap_reports_change() {
        let mut visited: VisitedSections = filled(MAX_VISITED_SECTIONS).into_iter().collect();
        assert!(visited.record("new"));
        assert_eq!(visited.len(), MAX_VISITED_SECTIONS);
        assert!(!visited.contains("section-0"));
    }

    #[test]
    fn deserialize_applies_guard() {
        let visited: VisitedSections =
            serde_json::from_str(r#"["a", "b", "a", "", "c"]"#).unwrap();
        assert_eq!(visited.as_slice(), ["a", "b", "c"].map(String::from));

        let from_null: VisitedSections = serde_json::from_str("null").unwrap();
        assert!(from_null.is_empty());
    }
}

//! Legal-style section labels ("1", "1.2", "1.2.3")

use itertools::Itertools;

/// Dot-joined section counters, outermost first
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionLabel {
    /// Counter values (e.g., [1, 2, 3] for "1.2.3")
    pub parts: Vec<u32>,
}

impl SectionLabel {
    pub fn new(parts: Vec<u32>) -> Self {
        Self { parts }
    }

    /// Nesting depth, 0 for a top-level section
    pub fn depth(&self) -> usize {
        self.parts.len().saturating_sub(1)
    }

    /// Text inserted in front of a heading's content, e.g. "1.2. "
    pub fn heading_prefix(&self) -> String {
        format!("{}. ", self)
    }
}

impl std::fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.parts.iter().join("."))
    }
}

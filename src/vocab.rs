//! Header synonym vocabulary and the tiered matcher
//!
//! Questionnaire templates name the same logical column a dozen ways
//! ("Response", "Answer", "Reply", ...). The vocabulary lives here as
//! static data; matching runs in strict priority order so an exact header
//! is never shadowed by a looser substring hit elsewhere in the row.

/// Question-column synonyms, in preference order
pub const QUESTION_VARIANTS: &[&str] = &["Question", "Questions", "Query", "Q"];

/// Guidance-column synonyms
pub const GUIDANCE_VARIANTS: &[&str] = &[
    "Guidance",
    "Examples",
    "Instructions",
    "Help",
    "Guide",
];

/// Answer-column synonyms; "Response" is preferred and is the name used
/// when the column has to be created
pub const ANSWER_VARIANTS: &[&str] = &[
    "Response",
    "Responses",
    "Answer",
    "Answers",
    "Reply",
    "A",
];

pub const CONFIDENCE_VARIANTS: &[&str] = &["Confidence"];
pub const PROVENANCE_VARIANTS: &[&str] = &["Provenance"];

/// Header name written when no answer-variant column exists
pub const DEFAULT_ANSWER_HEADER: &str = "Response";
pub const CONFIDENCE_HEADER: &str = "Confidence";
pub const PROVENANCE_HEADER: &str = "Provenance";

/// Long-form inventory terms that mark a column-based sheet when at least
/// three appear among the header cells of the leading rows
pub const INVENTORY_TERMS: &[&str] = &[
    "vm hostname",
    "domain",
    "ip address",
    "application name",
    "server function",
    "operating system",
    "vcpu",
    "ram",
    "disks and size",
    "lun id",
    "server environment",
];

/// Short inventory terms used to pick the header row inside a
/// column-based sheet
pub const INVENTORY_HINTS: &[&str] = &[
    "hostname",
    "domain",
    "ip",
    "application",
    "server",
    "operating",
    "vcpu",
    "ram",
    "disk",
    "environment",
];

/// Which tier produced a header match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    CaseInsensitive,
    Substring,
}

/// A resolved header hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch {
    pub column: u32,
    pub header: String,
    pub tier: MatchTier,
}

/// Ordered header-text → column mapping for one row.
///
/// Entries keep sheet column order; duplicate header texts keep the first
/// occurrence so lookups are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderIndex {
    entries: Vec<(String, u32)>,
}

impl HeaderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header cell; whitespace-only text is ignored, and a text
    /// already present keeps its original column
    pub fn push(&mut self, text: &str, column: u32) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        if self.entries.iter().any(|(t, _)| t == trimmed) {
            return;
        }
        self.entries.push((trimmed.to_string(), column));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(t, c)| (t.as_str(), *c))
    }

    /// Exact-text column lookup
    pub fn column_of(&self, header: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(t, _)| t == header)
            .map(|(_, c)| *c)
    }

    /// Three-tier variant lookup, strict priority order:
    /// 1. exact text match, variants tried in preference order;
    /// 2. case-insensitive text match, same variant order;
    /// 3. substring containment in either direction, headers scanned in
    ///    column order.
    ///
    /// The substring tier skips one-character texts: "A" earns its place
    /// in the answer vocabulary as an exact header name, not as a license
    /// to claim every header containing the letter.
    pub fn find(&self, variants: &[&str]) -> Option<HeaderMatch> {
        for variant in variants {
            if let Some((text, col)) = self.entries.iter().find(|(t, _)| t == variant) {
                return Some(HeaderMatch {
                    column: *col,
                    header: text.clone(),
                    tier: MatchTier::Exact,
                });
            }
        }

        for variant in variants {
            let needle = variant.to_lowercase();
            if let Some((text, col)) = self
                .entries
                .iter()
                .find(|(t, _)| t.to_lowercase() == needle)
            {
                return Some(HeaderMatch {
                    column: *col,
                    header: text.clone(),
                    tier: MatchTier::CaseInsensitive,
                });
            }
        }

        for (text, col) in &self.entries {
            let haystack = text.to_lowercase();
            for variant in variants {
                let needle = variant.to_lowercase();
                let forward = needle.len() >= 2 && haystack.contains(&needle);
                let reverse = haystack.len() >= 2 && needle.contains(&haystack);
                if forward || reverse {
                    return Some(HeaderMatch {
                        column: *col,
                        header: text.clone(),
                        tier: MatchTier::Substring,
                    });
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn index_of(headers: &[(&str, u32)]) -> HeaderIndex {
        let mut index = HeaderIndex::new();
        for (text, col) in headers {
            index.push(text, *col);
        }
        index
    }

    #[test]
    fn test_exact_match_wins_over_case_insensitive() {
        // "question" only matches case-insensitively; "Query" is exact
        let index = index_of(&[("question", 1), ("Query", 2)]);
        let hit = index.find(QUESTION_VARIANTS).unwrap();
        assert_eq!(hit.column, 2);
        assert_eq!(hit.tier, MatchTier::Exact);
    }

    #[test]
    fn test_case_insensitive_wins_over_substring() {
        let index = index_of(&[("Your Answers Here", 1), ("RESPONSE", 2)]);
        let hit = index.find(ANSWER_VARIANTS).unwrap();
        assert_eq!(hit.column, 2);
        assert_eq!(hit.tier, MatchTier::CaseInsensitive);
    }

    #[test]
    fn test_substring_matches_either_direction() {
        // Header contains the variant
        let index = index_of(&[("Migration Guidance Notes", 3)]);
        let hit = index.find(GUIDANCE_VARIANTS).unwrap();
        assert_eq!(hit.column, 3);
        assert_eq!(hit.tier, MatchTier::Substring);

        // Variant contains the header
        let index = index_of(&[("Instruction", 4)]);
        let hit = index.find(GUIDANCE_VARIANTS).unwrap();
        assert_eq!(hit.column, 4);
    }

    #[test]
    fn test_single_letter_variant_needs_exact_header() {
        // "Category" contains the letter 'a'; that must not make it the
        // answer column
        let index = index_of(&[("Category", 1)]);
        assert_eq!(index.find(ANSWER_VARIANTS), None);

        // A column literally titled "A" still resolves
        let index = index_of(&[("A", 5)]);
        let hit = index.find(ANSWER_VARIANTS).unwrap();
        assert_eq!(hit.column, 5);
        assert_eq!(hit.tier, MatchTier::Exact);
    }

    #[test]
    fn test_variant_preference_order_within_a_tier() {
        // Both are exact answer variants; "Response" is listed first
        let index = index_of(&[("Answer", 4), ("Response", 7)]);
        let hit = index.find(ANSWER_VARIANTS).unwrap();
        assert_eq!(hit.header, "Response");
        assert_eq!(hit.column, 7);
    }

    #[test]
    fn test_duplicate_header_text_keeps_first_column() {
        let index = index_of(&[("Response", 2), ("Response", 9)]);
        assert_eq!(index.column_of("Response"), Some(2));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_whitespace_only_headers_ignored() {
        let index = index_of(&[("   ", 1), ("Question", 2)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.column_of("Question"), Some(2));
    }
}

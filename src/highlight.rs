use regex::{Regex, RegexBuilder};

/// Literal, case-insensitive matcher for the active filter text.
pub fn build_highlight_regex(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

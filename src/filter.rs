/// Case-insensitive substring filter over item text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    raw: String,
    lowered: String,
}

impl FilterQuery {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            lowered: raw.to_lowercase(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The empty query matches everything.
    pub fn matches(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.lowered)
    }
}

use unicode_segmentation::UnicodeSegmentation;

/// Single-line text field with a grapheme-aware cursor (byte offset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    buffer: String,
    cursor: usize,
}

impl InputField {
    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Replaces the contents and parks the cursor at the end.
    pub fn set(&mut self, value: &str) {
        self.buffer.clear();
        self.buffer.push_str(value);
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch == '\n' || ch == '\r' {
            return false;
        }
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        let next = next_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(self.cursor..next);
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor = next_grapheme_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_home(&mut self) -> bool {
        let moved = self.cursor != 0;
        self.cursor = 0;
        moved
    }

    pub fn move_end(&mut self) -> bool {
        let moved = self.cursor != self.buffer.len();
        self.cursor = self.buffer.len();
        moved
    }

    /// Text left of the cursor, for placing the terminal caret.
    pub fn before_cursor(&self) -> &str {
        &self.buffer[..self.cursor]
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .grapheme_indices(true)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|grapheme| cursor + grapheme.len())
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::InputField;

    #[test]
    fn typing_and_backspace_follow_cursor() {
        let mut input = InputField::default();
        for ch in "eggs".chars() {
            input.insert_char(ch);
        }
        input.move_left();
        assert!(input.backspace());
        assert_eq!(input.value(), "egs");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut input = InputField::default();
        input.set("cafe\u{301}");
        assert!(input.backspace());
        assert_eq!(input.value(), "caf");
    }

    #[test]
    fn delete_at_end_is_noop() {
        let mut input = InputField::default();
        input.set("milk");
        assert!(!input.delete());
        input.move_home();
        assert!(input.delete());
        assert_eq!(input.value(), "ilk");
    }

    #[test]
    fn newlines_are_rejected() {
        let mut input = InputField::default();
        assert!(!input.insert_char('\n'));
        assert!(input.is_empty());
    }
}

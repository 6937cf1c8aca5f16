use std::ops::Range;

/// A replacement of a char range, the unit every keystroke is reduced to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(at..at, text)
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::new(range, String::new())
    }

    pub fn replace_all(text: impl Into<String>) -> Self {
        Self::new(0..usize::MAX, text)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TextBuffer {
    value: String,
    caret: usize,
}

impl TextBuffer {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let caret = value.chars().count();
        Self { value, caret }
    }

    pub fn text(&self) -> &str {
        &self.value
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn move_caret(&mut self, to: usize) {
        self.caret = to.min(self.len());
    }

    pub fn set_text(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.caret = self.len();
    }

    pub fn proposed(&self, edit: &TextEdit) -> String {
        let mut next = self.value.clone();
        let (byte_start, byte_end) = self.byte_range(&edit.range);
        next.replace_range(byte_start..byte_end, &edit.replacement);
        next
    }

    pub fn apply(&mut self, edit: &TextEdit) {
        let start = edit.range.start.min(self.len());
        let (byte_start, byte_end) = self.byte_range(&edit.range);
        self.value
            .replace_range(byte_start..byte_end, &edit.replacement);
        self.caret = (start + edit.replacement.chars().count()).min(self.len());
    }

    pub fn insert_at_caret(&self, text: &str) -> TextEdit {
        TextEdit::insert(self.caret, text)
    }

    pub fn delete_backward(&self) -> Option<TextEdit> {
        (self.caret > 0).then(|| TextEdit::delete(self.caret - 1..self.caret))
    }

    pub fn delete_forward(&self) -> Option<TextEdit> {
        (self.caret < self.len()).then(|| TextEdit::delete(self.caret..self.caret + 1))
    }

    fn byte_range(&self, range: &Range<usize>) -> (usize, usize) {
        let len = self.len();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        (
            byte_index_at_char(&self.value, start),
            byte_index_at_char(&self.value, end),
        )
    }
}

pub fn byte_index_at_char(value: &str, char_index: usize) -> usize {
    value
        .char_indices()
        .nth(char_index)
        .map(|(index, _)| index)
        .unwrap_or(value.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposed_text_does_not_mutate_the_buffer() {
        let buffer = TextBuffer::new("Widget");
        let proposed = buffer.proposed(&buffer.insert_at_caret(" v2"));
        assert_eq!(proposed, "Widget v2");
        assert_eq!(buffer.text(), "Widget");
    }

    #[test]
    fn apply_moves_caret_past_replacement() {
        let mut buffer = TextBuffer::new("Widget");
        buffer.apply(&TextEdit::new(0..1, "Gadg"));
        assert_eq!(buffer.text(), "Gadgidget");
        assert_eq!(buffer.caret(), 4);
    }

    #[test]
    fn ranges_are_char_indexed_and_clamped() {
        let mut buffer = TextBuffer::new("héllo");
        buffer.apply(&TextEdit::delete(1..2));
        assert_eq!(buffer.text(), "hllo");

        buffer.apply(&TextEdit::new(10..20, "!"));
        assert_eq!(buffer.text(), "hllo!");

        buffer.apply(&TextEdit::replace_all(""));
        assert!(buffer.is_empty());
        assert_eq!(buffer.caret(), 0);
    }

    #[test]
    fn deletions_respect_buffer_edges() {
        let mut buffer = TextBuffer::new("ab");
        assert!(buffer.delete_forward().is_none());
        let backward = buffer.delete_backward().expect("caret is after text");
        buffer.apply(&backward);
        assert_eq!(buffer.text(), "a");

        buffer.move_caret(0);
        assert!(buffer.delete_backward().is_none());
        assert_eq!(buffer.delete_forward(), Some(TextEdit::delete(0..1)));
    }
}

/// Single-line character cursor with lookahead, lookbehind and
/// backtracking. Used only by the inline parser.
pub(crate) struct LineCursor {
    chars: Vec<char>,
    pos: usize,
}

impl LineCursor {
    pub(crate) fn new(line: &str) -> Self {
        Self {
            chars: line.chars().collect(),
            pos: 0,
        }
    }

    /// Returns the current character and advances past it.
    #[allow(clippy::should_implement_trait)]
    pub(crate) fn next(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    /// Returns the character at `offset` from the cursor without
    /// advancing. Negative offsets look backward; positions past either
    /// end yield `None`.
    pub(crate) fn peek(&self, offset: isize) -> Option<char> {
        let index = self.pos as isize + offset;
        if index < 0 {
            return None;
        }
        self.chars.get(index as usize).copied()
    }

    pub(crate) fn has_next(&self) -> bool {
        self.pos < self.chars.len()
    }

    pub(crate) fn has_prev(&self) -> bool {
        self.pos > 0
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Rewinds (or fast-forwards) the cursor to an absolute index.
    pub(crate) fn reset(&mut self, index: usize) {
        self.pos = index.min(self.chars.len());
    }
}

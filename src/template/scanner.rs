/// Lexical context of the byte under the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// Byte cursor over a statement with the lookahead helpers extraction needs.
pub(super) struct Scanner<'a> {
    bytes: &'a [u8],
}

impl<'a> Scanner<'a> {
    pub(super) fn new(sql: &'a str) -> Self {
        Self {
            bytes: sql.as_bytes(),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(super) fn at(&self, idx: usize) -> Option<u8> {
        self.bytes.get(idx).copied()
    }

    fn pair(&self, idx: usize, first: u8, second: u8) -> bool {
        self.at(idx) == Some(first) && self.at(idx + 1) == Some(second)
    }

    pub(super) fn line_comment_starts(&self, idx: usize) -> bool {
        self.pair(idx, b'-', b'-')
    }

    pub(super) fn block_comment_starts(&self, idx: usize) -> bool {
        self.pair(idx, b'/', b'*')
    }

    pub(super) fn block_comment_ends(&self, idx: usize) -> bool {
        self.pair(idx, b'*', b'/')
    }

    /// Identifier after a `:` at `colon`; returns the end offset and the name.
    pub(super) fn placeholder_name(&self, colon: usize) -> Option<(usize, &'a str)> {
        let start = colon + 1;
        match self.at(start) {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
            _ => return None,
        }
        let mut end = start + 1;
        while let Some(b) = self.at(end) {
            if b.is_ascii_alphanumeric() || b == b'_' {
                end += 1;
            } else {
                break;
            }
        }
        std::str::from_utf8(&self.bytes[start..end])
            .ok()
            .map(|name| (end, name))
    }

    /// First offset at or after `start` that is not an ASCII digit.
    pub(super) fn digits_end(&self, start: usize) -> usize {
        let mut end = start;
        while self.at(end).is_some_and(|b| b.is_ascii_digit()) {
            end += 1;
        }
        end
    }

    /// Opening `$tag$` at `start`; returns the tag and the offset of its closing `$`.
    pub(super) fn dollar_quote_opens(&self, start: usize) -> Option<(String, usize)> {
        let mut idx = start + 1;
        while let Some(b) = self.at(idx) {
            if b == b'$' {
                let tag = String::from_utf8(self.bytes[start + 1..idx].to_vec()).ok()?;
                return Some((tag, idx));
            }
            if !(b.is_ascii_alphanumeric() || b == b'_') {
                return None;
            }
            idx += 1;
        }
        None
    }

    /// Whether the `$` at `idx` closes a block opened with `tag`.
    pub(super) fn dollar_quote_closes(&self, idx: usize, tag: &str) -> bool {
        let end = idx + 1 + tag.len();
        end < self.bytes.len()
            && &self.bytes[idx + 1..end] == tag.as_bytes()
            && self.at(end) == Some(b'$')
    }
}

//! Query scanner.
//!
//! Splits a raw query into `[-=]key:value` tokens. Whitespace separates
//! chunks; a chunk that does not fit the grammar is skipped rather than
//! reported, so typos and unknown syntax never fail a whole query.

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

/// Single-character prefix in front of a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFlag {
    /// `-key:value`
    Exclude,
    /// `=key:value`
    Exact,
}

impl KeyFlag {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '-' => Some(Self::Exclude),
            '=' => Some(Self::Exact),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Exclude => '-',
            Self::Exact => '=',
        }
    }
}

/// One `key:value` pair borrowed from the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryToken<'a> {
    pub flag: Option<KeyFlag>,
    pub key: &'a str,
    pub value: &'a str,
    /// Byte offset of the token in the query.
    pub position: usize,
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Lazy iterator over the tokens of a query string.
#[derive(Debug, Clone)]
pub struct QueryScanner<'a> {
    input: &'a str,
    cursor: usize,
}

pub fn scan_query(input: &str) -> QueryScanner<'_> {
    QueryScanner { input, cursor: 0 }
}

impl<'a> QueryScanner<'a> {
    /// Returns the next whitespace-delimited chunk and its offset.
    fn next_chunk(&mut self) -> Option<(usize, &'a str)> {
        let rest = &self.input[self.cursor..];
        let skipped = rest.len() - rest.trim_start().len();
        let start = self.cursor + skipped;
        if start >= self.input.len() {
            self.cursor = self.input.len();
            return None;
        }

        let end = self.input[start..]
            .char_indices()
            .find(|(_, ch)| ch.is_whitespace())
            .map(|(offset, _)| start + offset)
            .unwrap_or(self.input.len());
        self.cursor = end;
        Some((start, &self.input[start..end]))
    }
}

impl<'a> Iterator for QueryScanner<'a> {
    type Item = QueryToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((position, chunk)) = self.next_chunk() {
            if let Some(token) = parse_query_token(chunk, position) {
                return Some(token);
            }
            tracing::trace!(position, chunk, "skipping malformed query segment");
        }
        None
    }
}

fn parse_query_token(chunk: &str, position: usize) -> Option<QueryToken<'_>> {
    let first = chunk.chars().next()?;
    let (flag, rest) = match KeyFlag::from_char(first) {
        Some(flag) => (Some(flag), &chunk[first.len_utf8()..]),
        None => (None, chunk),
    };

    let (key, value) = rest.split_once(':')?;
    if key.is_empty() || !key.chars().all(is_word_char) || value.is_empty() {
        return None;
    }

    Some(QueryToken {
        flag,
        key,
        value,
        position,
    })
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

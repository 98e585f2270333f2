//! Delimited value lists (`a+b+c`, `a,b,c`).

/// Separator used between list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListDelimiter {
    Comma,
    Plus,
}

impl ListDelimiter {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            ',' => Some(Self::Comma),
            '+' => Some(Self::Plus),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Plus => '+',
        }
    }
}

/// A parsed list. `delimiter` is `None` for a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueList {
    pub items: Vec<String>,
    pub delimiter: Option<ListDelimiter>,
}

/// Item alphabet for tag names.
pub fn is_tag_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-'
}

/// Item alphabet for category slugs; `:` admits `parent:child`.
pub fn is_category_slug_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == ':'
}

/// Parses `raw` as a list separated by exactly one of `delimiters`.
///
/// The first delimiter seen fixes the separator for the whole list; any other
/// delimiter afterwards, an empty item between two separators, or a character
/// outside `is_item_char` rejects the list. A single trailing separator is
/// tolerated.
pub fn parse_value_list(
    raw: &str,
    delimiters: &[ListDelimiter],
    is_item_char: fn(char) -> bool,
) -> Option<ValueList> {
    let mut delimiter: Option<ListDelimiter> = None;
    let mut items = Vec::new();
    let mut current = String::new();

    for ch in raw.chars() {
        if let Some(found) = ListDelimiter::from_char(ch).filter(|d| delimiters.contains(d)) {
            match delimiter {
                Some(expected) if expected != found => return None,
                _ => delimiter = Some(found),
            }
            if current.is_empty() {
                return None;
            }
            items.push(std::mem::take(&mut current));
            continue;
        }
        if !is_item_char(ch) {
            return None;
        }
        current.push(ch);
    }

    if !current.is_empty() {
        items.push(current);
    }
    if items.is_empty() {
        return None;
    }

    Some(ValueList { items, delimiter })
}

// Splits a serialized selector into the names a purge decision looks at

/// A name a selector depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorWord {
    Class(String),
    Id(String),
    Tag(String),
    Attribute(String),
}

impl SelectorWord {
    pub fn value(&self) -> &str {
        match self {
            SelectorWord::Class(v)
            | SelectorWord::Id(v)
            | SelectorWord::Tag(v)
            | SelectorWord::Attribute(v) => v,
        }
    }
}

/// Words of a single complex selector, in source order.
///
/// CSS escapes are decoded (`.hover\:bg-red` yields `hover:bg-red`).
/// Pseudo-class arguments are skipped entirely.
pub fn selector_words(selector: &str) -> Vec<SelectorWord> {
    let chars: Vec<char> = selector.chars().collect();
    let mut words = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                let (name, next) = read_ident(&chars, i + 1);
                if !name.is_empty() {
                    words.push(SelectorWord::Class(name));
                }
                i = next.max(i + 1);
            }
            '#' => {
                let (name, next) = read_ident(&chars, i + 1);
                if !name.is_empty() {
                    words.push(SelectorWord::Id(name));
                }
                i = next.max(i + 1);
            }
            '[' => {
                let mut start = i + 1;
                while start < chars.len() && chars[start].is_whitespace() {
                    start += 1;
                }
                let (mut name, mut next) = read_ident(&chars, start);
                // namespaced attribute: ns|attr
                if next < chars.len() && chars[next] == '|' && chars.get(next + 1) != Some(&'=') {
                    let (local, after) = read_ident(&chars, next + 1);
                    name = local;
                    next = after;
                }
                if !name.is_empty() {
                    words.push(SelectorWord::Attribute(name));
                }
                i = skip_block(&chars, next, '[', ']', 1);
            }
            ':' => {
                let mut j = i;
                while j < chars.len() && chars[j] == ':' {
                    j += 1;
                }
                let (_, next) = read_ident(&chars, j);
                i = if next < chars.len() && chars[next] == '(' {
                    skip_block(&chars, next + 1, '(', ')', 1)
                } else {
                    next.max(j)
                };
            }
            c if is_ident_start(c) || c == '\\' => {
                let (name, next) = read_ident(&chars, i);
                if !name.is_empty() {
                    words.push(SelectorWord::Tag(name.to_lowercase()));
                }
                i = next.max(i + 1);
            }
            _ => i += 1,
        }
    }

    words
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

/// Read an identifier starting at `start`, decoding escapes.
/// Returns the decoded name and the index after it.
fn read_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut name = String::new();
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            let (decoded, next) = read_escape(chars, i + 1);
            if let Some(decoded) = decoded {
                name.push(decoded);
            }
            i = next;
        } else if is_ident_char(c) {
            name.push(c);
            i += 1;
        } else {
            break;
        }
    }

    (name, i)
}

fn read_escape(chars: &[char], start: usize) -> (Option<char>, usize) {
    let Some(&first) = chars.get(start) else {
        return (None, start);
    };

    if !first.is_ascii_hexdigit() {
        return (Some(first), start + 1);
    }

    let mut end = start;
    while end < chars.len() && end - start < 6 && chars[end].is_ascii_hexdigit() {
        end += 1;
    }
    let hex: String = chars[start..end].iter().collect();
    let decoded = u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER);

    // a single whitespace terminates a hex escape
    if end < chars.len() && chars[end].is_whitespace() {
        end += 1;
    }

    (Some(decoded), end)
}

/// Skip to just past the bracket closing the block whose contents start at `start`
fn skip_block(chars: &[char], start: usize, open: char, close: char, depth: usize) -> usize {
    let mut depth = depth;
    let mut quote: Option<char> = None;
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                if c == '\\' {
                    i += 1;
                } else if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                } else if c == '\\' {
                    i += 1;
                } else if c == open {
                    depth += 1;
                } else if c == close {
                    depth -= 1;
                    if depth == 0 {
                        return i + 1;
                    }
                }
            }
        }
        i += 1;
    }

    chars.len()
}

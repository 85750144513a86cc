//! Disclosure path selectors and their textual form

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step from a node towards a disclosed descendant
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// Raw left child of an internal node
    Left,
    /// Raw right child of an internal node
    Right,
    /// Element of an array
    Index(usize),
    /// Value of a map entry
    Key(String),
}

/// What to disclose once the selectors are exhausted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terminal {
    /// The node reached must be a leaf and is kept verbatim
    #[default]
    Leaf,
    /// The whole subtree below the node reached is kept
    Subtree,
}

/// A route from the root to a disclosed node
///
/// Textual form: dotted map keys and bracketed array indices, e.g.
/// `users[2].name`. `["a.b"]` quotes a key (with `\"` and `\\` escapes),
/// `[L]` / `[R]` step into raw children, and a trailing `.*` discloses the
/// whole subtree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    pub selectors: Vec<Selector>,
    pub terminal: Terminal,
}

impl Path {
    /// The empty path: discloses the root
    pub fn root() -> Self {
        Path::default()
    }

    pub fn new(selectors: Vec<Selector>, terminal: Terminal) -> Self {
        Path { selectors, terminal }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.selectors.push(Selector::Key(key.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.selectors.push(Selector::Index(index));
        self
    }

    pub fn left(mut self) -> Self {
        self.selectors.push(Selector::Left);
        self
    }

    pub fn right(mut self) -> Self {
        self.selectors.push(Selector::Right);
        self
    }

    /// Disclose the whole subtree at the end of this path
    pub fn subtree(mut self) -> Self {
        self.terminal = Terminal::Subtree;
        self
    }

    /// Parse the textual form
    pub fn parse(input: &str) -> Result<Self> {
        let mut path = Path::root();
        let mut rest = input.trim();

        if let Some(stripped) = rest.strip_suffix(".*").or_else(|| {
            if rest == "*" {
                Some("")
            } else {
                None
            }
        }) {
            path.terminal = Terminal::Subtree;
            rest = stripped;
        }

        let bytes = rest.as_bytes();
        let mut pos = 0;
        let mut expect_key = true;
        while pos < bytes.len() {
            match bytes[pos] {
                b'[' => {
                    let close = find_bracket_end(rest, pos)?;
                    let inner = &rest[pos + 1..close];
                    path.selectors.push(parse_bracket(inner)?);
                    pos = close + 1;
                    expect_key = false;
                }
                b'.' => {
                    if expect_key {
                        return Err(Error::InvalidPath(format!(
                            "empty key at offset {} in {:?}",
                            pos, input
                        )));
                    }
                    pos += 1;
                    expect_key = true;
                    if pos == bytes.len() {
                        return Err(Error::InvalidPath(format!("trailing '.' in {:?}", input)));
                    }
                }
                b']' => {
                    return Err(Error::InvalidPath(format!(
                        "unbalanced ']' at offset {} in {:?}",
                        pos, input
                    )))
                }
                _ => {
                    if !expect_key {
                        return Err(Error::InvalidPath(format!(
                            "expected '.' or '[' at offset {} in {:?}",
                            pos, input
                        )));
                    }
                    let end = rest[pos..]
                        .find(['.', '[', ']'])
                        .map(|i| pos + i)
                        .unwrap_or(bytes.len());
                    path.selectors.push(Selector::Key(rest[pos..end].to_string()));
                    pos = end;
                    expect_key = false;
                }
            }
        }

        Ok(path)
    }
}

fn find_bracket_end(s: &str, open: usize) -> Result<usize> {
    let bytes = s.as_bytes();
    if bytes.get(open + 1) == Some(&b'"') {
        // Quoted key: '\' escapes the next byte, the closing quote must be
        // followed by ']'
        let mut quote = open + 2;
        loop {
            match bytes.get(quote) {
                Some(b'\\') => quote += 2,
                Some(b'"') => break,
                Some(_) => quote += 1,
                None => {
                    return Err(Error::InvalidPath(format!("unterminated quote in {:?}", s)))
                }
            }
        }
        return match bytes.get(quote + 1) {
            Some(b']') => Ok(quote + 1),
            _ => Err(Error::InvalidPath(format!("expected ']' after quoted key in {:?}", s))),
        };
    }
    s[open..]
        .find(']')
        .map(|i| open + i)
        .ok_or_else(|| Error::InvalidPath(format!("unterminated '[' in {:?}", s)))
}

fn parse_bracket(inner: &str) -> Result<Selector> {
    if let Some(quoted) = inner.strip_prefix('"').and_then(|k| k.strip_suffix('"')) {
        return unescape_key(quoted).map(Selector::Key);
    }
    match inner {
        "L" | "l" => Ok(Selector::Left),
        "R" | "r" => Ok(Selector::Right),
        digits => digits
            .parse::<usize>()
            .map(Selector::Index)
            .map_err(|_| Error::InvalidPath(format!("invalid index [{}]", inner))),
    }
}

fn unescape_key(quoted: &str) -> Result<String> {
    let mut key = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('"' | '\\')) => key.push(escaped),
                _ => {
                    return Err(Error::InvalidPath(format!(
                        "invalid escape in quoted key {:?}",
                        quoted
                    )))
                }
            },
            c => key.push(c),
        }
    }
    Ok(key)
}

fn needs_quotes(key: &str) -> bool {
    key.is_empty() || key.trim() != key || key.contains(['.', '[', ']', '"', '*'])
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sel) in self.selectors.iter().enumerate() {
            match sel {
                Selector::Left => f.write_str("[L]")?,
                Selector::Right => f.write_str("[R]")?,
                Selector::Index(idx) => write!(f, "[{}]", idx)?,
                Selector::Key(k) if needs_quotes(k) => write!(
                    f,
                    "[\"{}\"]",
                    k.replace('\\', "\\\\").replace('"', "\\\"")
                )?,
                Selector::Key(k) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(k)?
                }
            }
        }
        if self.terminal == Terminal::Subtree {
            if self.selectors.is_empty() {
                f.write_str("*")?;
            } else {
                f.write_str(".*")?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys_and_indices() {
        let p = Path::parse("users[2].name").unwrap();
        assert_eq!(
            p.selectors,
            vec![
                Selector::Key("users".into()),
                Selector::Index(2),
                Selector::Key("name".into())
            ]
        );
        assert_eq!(p.terminal, Terminal::Leaf);
        assert_eq!(p, Path::root().key("users").index(2).key("name"));
    }

    #[test]
    fn test_parse_special_forms() {
        assert_eq!(Path::parse("").unwrap(), Path::root());
        assert_eq!(Path::parse("*").unwrap(), Path::root().subtree());
        assert_eq!(Path::parse("[0][1].*").unwrap(), Path::root().index(0).index(1).subtree());
        assert_eq!(Path::parse("[L][r]").unwrap(), Path::root().left().right());
        assert_eq!(
            Path::parse("[\"a.b\"].c").unwrap(),
            Path::root().key("a.b").key("c")
        );
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "a..b", "a.", ".a", "a[x]", "a[1", "a]", "[0]b", "[\"a]", "[\"a\\\"]", "[\"a\\b\"]",
        ] {
            assert!(Path::parse(bad).is_err(), "{:?} should not parse", bad);
        }
    }

    #[test]
    fn test_display_reparses() {
        let p = Path::root().key("a").index(3).key("x.y").left().subtree();
        assert_eq!(p.to_string(), "a[3][\"x.y\"][L].*");
        assert_eq!(Path::parse(&p.to_string()).unwrap(), p);
    }

    #[test]
    fn test_display_escapes_quoted_keys() {
        let p = Path::root().key("a\"b").key("c\\.d").key(" pad").key("e\\f");
        assert_eq!(p.to_string(), r#"["a\"b"]["c\\.d"][" pad"].e\f"#);
        assert_eq!(Path::parse(&p.to_string()).unwrap(), p);

        assert_eq!(
            Path::parse(r#"["say \"hi\""].x"#).unwrap(),
            Path::root().key("say \"hi\"").key("x")
        );
    }
}

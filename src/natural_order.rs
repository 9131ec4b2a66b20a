//! Identifier ordering
//!
//! Every stream algorithm in this crate walks its inputs in one total order over record
//! identifiers. The default is a natural order: embedded digit runs are compared by length
//! and value instead of character by character, so `"9" < "10"` and `"u99" < "u100"`.
//!
//! Digit runs starting with `'0'` on either side are compared literally, left-aligned, the
//! way a fraction would be: `"07"` sorts after `"008"`. Files sorted by earlier tools depend
//! on this exact behavior, so it is reproduced as is.

use std::cmp::Ordering;
use std::str::Chars;

/// A total order over identifier strings.
///
/// Components take an implementation by value at construction time.
pub trait IdentifierOrder {
    fn compare(&self, a: &str, b: &str) -> Ordering;

    fn equal(&self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// Natural, case-insensitive, whitespace-insensitive order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl IdentifierOrder for NaturalOrder {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        natural_cmp(a, b)
    }
}

/// Plain byte-wise order, for files sorted by tools that know nothing about digit runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexicalOrder;

impl IdentifierOrder for LexicalOrder {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

/// Order selected at run time (config or command line).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    #[default]
    Natural,
    Lexical,
}

impl IdentifierOrder for OrderKind {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Natural => NaturalOrder.compare(a, b),
            Self::Lexical => LexicalOrder.compare(a, b),
        }
    }
}

impl std::str::FromStr for OrderKind {
    type Err = crate::MarcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "natural" => Ok(Self::Natural),
            "lexical" => Ok(Self::Lexical),
            other => Err(crate::MarcError::InvalidConfig(format!(
                "unknown identifier order {other:?} (expected natural or lexical)"
            ))),
        }
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Natural => f.write_str("natural"),
            Self::Lexical => f.write_str("lexical"),
        }
    }
}

/// Compare two identifiers in natural order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars();
    let mut b = b.chars();

    loop {
        skip_whitespace(&mut a);
        skip_whitespace(&mut b);

        let ca = peek(&a);
        let cb = peek(&b);

        if let (Some(x), Some(y)) = (ca, cb) {
            if x.is_ascii_digit() && y.is_ascii_digit() {
                let fractional = x == '0' || y == '0';
                let run = if fractional {
                    compare_left(a.as_str().as_bytes(), b.as_str().as_bytes())
                } else {
                    compare_right(a.as_str().as_bytes(), b.as_str().as_bytes())
                };
                if run != Ordering::Equal {
                    return run;
                }
            }
        }

        match (ca, cb) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let (x, y) = (fold(x), fold(y));
                if x != y {
                    return x.cmp(&y);
                }
            }
        }

        a.next();
        b.next();
    }
}

fn peek(it: &Chars<'_>) -> Option<char> {
    it.clone().next()
}

fn skip_whitespace(it: &mut Chars<'_>) {
    while peek(it).is_some_and(char::is_whitespace) {
        it.next();
    }
}

fn fold(c: char) -> char {
    if c.is_ascii() {
        c.to_ascii_uppercase()
    } else {
        c.to_uppercase().next().unwrap_or(c)
    }
}

fn digit_at(s: &[u8], i: usize) -> Option<u8> {
    s.get(i).copied().filter(u8::is_ascii_digit)
}

/// Left-aligned digit runs: the first differing digit decides, a shorter run sorts first.
fn compare_left(a: &[u8], b: &[u8]) -> Ordering {
    let mut i = 0;
    loop {
        match (digit_at(a, i), digit_at(b, i)) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x != y => return x.cmp(&y),
            _ => {}
        }
        i += 1;
    }
}

/// Right-aligned digit runs: the longer run is larger; equal lengths fall back to the
/// first differing digit (`bias`).
fn compare_right(a: &[u8], b: &[u8]) -> Ordering {
    let mut bias = Ordering::Equal;
    let mut i = 0;
    loop {
        match (digit_at(a, i), digit_at(b, i)) {
            (None, None) => return bias,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if bias == Ordering::Equal {
                    bias = x.cmp(&y);
                }
            }
        }
        i += 1;
    }
}

//! Tokens with join flags, and their string form.
//!
//! A split inside a whitespace-delimited word marks both sides: the left
//! token gets `join_right`, the right token gets `join_left`. Detokenization
//! inserts a single space between two tokens unless either side carries the
//! flag, which reproduces the input up to whitespace normalization.
//!
//! In string form the flags are either dropped or materialized as standalone
//! joiner tokens between the two joined tokens. Parsing also accepts the
//! attached style, where the joiner is a prefix or suffix of a token.
//!
//! A joiner that occurs literally inside a surface is written as `％J` and a
//! literal `％` as `％％`, so string surfaces never contain the joiner.

use compact_str::CompactString;
use std::ops::Range;

/// One output token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Token {
    /// Text of the token
    pub surface: CompactString,
    /// No whitespace separated this token from the previous one
    pub join_left: bool,
    /// No whitespace separated this token from the next one
    pub join_right: bool,
    /// The token is a run of digits
    pub numeric: bool,
}

impl Token {
    /// A token with no join flags.
    pub fn new(surface: impl Into<CompactString>) -> Self {
        Self {
            surface: surface.into(),
            ..Default::default()
        }
    }

    /// Whether detokenization glues this token to `next`.
    #[inline]
    pub fn is_joined_to(&self, next: &Token) -> bool {
        self.join_right || next.join_left
    }

    /// Split into fragments at byte `spans` covering the surface.
    ///
    /// The first fragment keeps `join_left`, the last keeps `join_right`,
    /// and every internal boundary is joined on both sides.
    pub fn split_spans(&self, spans: &[Range<usize>]) -> Vec<Token> {
        if spans.len() <= 1 {
            return vec![self.clone()];
        }
        let last = spans.len() - 1;
        spans
            .iter()
            .enumerate()
            .map(|(i, span)| Token {
                surface: CompactString::new(&self.surface[span.clone()]),
                join_left: if i == 0 { self.join_left } else { true },
                join_right: if i == last { self.join_right } else { true },
                numeric: self.numeric,
            })
            .collect()
    }
}

/// Join tokens back into text.
pub fn detokenize(tokens: &[Token]) -> String {
    let mut text = String::with_capacity(tokens.iter().map(|t| t.surface.len() + 1).sum());
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && !tokens[i - 1].is_joined_to(token) {
            text.push(' ');
        }
        text.push_str(&token.surface);
    }
    text
}

/// Escape character of surfaces in string form.
pub const ESCAPE: char = '％';

/// Escaped form of a literal `joiner`.
const ESCAPED_JOINER: &str = "％J";

/// Escaped form of a literal [`ESCAPE`].
const ESCAPED_ESCAPE: &str = "％％";

/// Surface with literal escapes and joiners protected.
pub fn escape_surface(surface: &str, joiner: &str) -> CompactString {
    let has_joiner = !joiner.is_empty() && surface.contains(joiner);
    if !has_joiner && !surface.contains(ESCAPE) {
        return CompactString::new(surface);
    }
    let escaped = surface.replace(ESCAPE, ESCAPED_ESCAPE);
    if has_joiner {
        CompactString::from(escaped.replace(joiner, ESCAPED_JOINER))
    } else {
        CompactString::from(escaped)
    }
}

/// Inverse of [`escape_surface`]. An escape followed by anything else is
/// kept as is.
pub fn unescape_surface(surface: &str, joiner: &str) -> CompactString {
    if !surface.contains(ESCAPE) {
        return CompactString::new(surface);
    }
    let mut out = CompactString::with_capacity(surface.len());
    let mut chars = surface.chars().peekable();
    while let Some(c) = chars.next() {
        if c != ESCAPE {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(&ESCAPE) => {
                chars.next();
                out.push(ESCAPE);
            }
            Some(&'J') => {
                chars.next();
                out.push_str(joiner);
            }
            _ => out.push(c),
        }
    }
    out
}

/// String form of tokens. With `annotate`, each joined boundary becomes a
/// standalone joiner token; otherwise the flags are dropped. Surfaces are
/// escaped either way.
pub fn to_strings(tokens: &[Token], joiner: &str, annotate: bool) -> Vec<CompactString> {
    let mut out = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        if annotate && i > 0 && tokens[i - 1].is_joined_to(token) {
            out.push(CompactString::new(joiner));
        }
        out.push(escape_surface(&token.surface, joiner));
    }
    out
}

/// Parse the string form produced by [`to_strings`] (or the attached style).
pub fn from_strings<S: AsRef<str>>(strings: &[S], joiner: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::with_capacity(strings.len());
    let mut pending_join = false;

    for s in strings {
        let mut s = s.as_ref();
        if s.is_empty() {
            continue;
        }
        if joiner.is_empty() {
            tokens.push(Token::new(unescape_surface(s, joiner)));
            continue;
        }
        if s.trim_start_matches(joiner).is_empty() {
            if let Some(prev) = tokens.last_mut() {
                prev.join_right = true;
            }
            pending_join = true;
            continue;
        }

        let mut token = Token {
            join_left: pending_join,
            ..Default::default()
        };
        pending_join = false;
        if let Some(rest) = s.strip_prefix(joiner) {
            token.join_left = true;
            s = rest;
        }
        if let Some(rest) = s.strip_suffix(joiner) {
            token.join_right = true;
            pending_join = true;
            s = rest;
        }
        if token.join_left {
            if let Some(prev) = tokens.last_mut() {
                prev.join_right = true;
            }
        }
        token.numeric = s.chars().all(char::is_numeric);
        token.surface = unescape_surface(s, joiner);
        tokens.push(token);
    }
    tokens
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const J: &str = "￭";

    fn joined(surfaces: &[&str]) -> Vec<Token> {
        let whole = Token::new(surfaces.concat());
        let mut spans = Vec::new();
        let mut start = 0;
        for s in surfaces {
            spans.push(start..start + s.len());
            start += s.len();
        }
        whole.split_spans(&spans)
    }

    #[test]
    fn test_detokenize_respects_flags() {
        let mut tokens = joined(&["It", "'", "s"]);
        tokens.push(Token::new("fine"));
        assert_eq!(detokenize(&tokens), "It's fine");
        assert_eq!(detokenize(&[]), "");
    }

    #[test]
    fn test_split_spans_inherits_outer_flags() {
        let mut token = Token::new("abcd");
        token.join_left = true;
        let parts = token.split_spans(&[0..1, 1..4]);
        assert!(parts[0].join_left && parts[0].join_right);
        assert!(parts[1].join_left && !parts[1].join_right);
        assert_eq!(parts[1].surface, "bcd");
    }

    #[test]
    fn test_to_strings_materializes_joiners() {
        let mut tokens = vec![Token::new("say")];
        tokens.extend(joined(&["hi", "!"]));
        assert_eq!(to_strings(&tokens, J, true), vec!["say", "hi", J, "!"]);
        assert_eq!(to_strings(&tokens, J, false), vec!["say", "hi", "!"]);
    }

    #[test]
    fn test_from_strings_inverts_to_strings() {
        let mut tokens = vec![Token::new("x")];
        tokens.extend(joined(&["1", "2", "3"]));
        let strings = to_strings(&tokens, J, true);
        let parsed = from_strings(&strings, J);
        assert_eq!(detokenize(&parsed), "x 123");
        assert_eq!(parsed.len(), 4);
    }

    #[test]
    fn test_from_strings_attached_style() {
        let parsed = from_strings(&["It", "￭'￭", "s", "ok", "￭."], J);
        assert_eq!(detokenize(&parsed), "It's ok.");
    }

    #[test]
    fn test_literal_joiner_is_escaped() {
        let mut tokens = joined(&["a￭b", ","]);
        tokens.push(Token::new("100％"));
        tokens.push(Token::new("％J"));
        let strings = to_strings(&tokens, J, true);
        assert_eq!(strings, vec!["a％Jb", J, ",", "100％％", "％％J"]);
        assert!(strings.iter().filter(|s| s.as_str() != J).all(|s| !s.contains(J)));

        let parsed = from_strings(&strings, J);
        assert_eq!(detokenize(&parsed), "a￭b, 100％ ％J");
        assert_eq!(parsed[0].surface, "a￭b");
    }

    #[test]
    fn test_escape_with_multichar_joiner() {
        assert_eq!(escape_surface("x@@@y", "@@"), "x％J@y");
        assert_eq!(unescape_surface("x％J@y", "@@"), "x@@@y");
        // A stray escape passes through.
        assert_eq!(unescape_surface("50％", "@@"), "50％");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \t b\n"), "a b");
    }
}

//! Rule-based segmentation of a line into tokens.
//!
//! Text is first split on whitespace. Each whitespace-delimited word is then
//! cut at grapheme boundaries according to the mode; every cut marks both
//! neighbours as joined so that detokenization can restore the word.
//!
//! Graphemes are classified by their first character: letters, digits, and
//! everything else (punctuation, symbols, control characters). Control
//! characters other than whitespace become ordinary tokens and are never
//! dropped.

use crate::tokenizer::token::Token;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    Letter,
    Digit,
    Other,
}

impl CharClass {
    pub(crate) fn of(grapheme: &str) -> Self {
        match grapheme.chars().next() {
            Some(c) if c.is_alphabetic() => CharClass::Letter,
            Some(c) if c.is_numeric() => CharClass::Digit,
            _ => CharClass::Other,
        }
    }

    fn is_alnum(self) -> bool {
        self != CharClass::Other
    }
}

/// Word-internal splitting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRule {
    /// Split letters from digits and every punctuation mark from everything
    Aggressive,
    /// Keep alphanumeric runs together, with number separators, hyphens
    /// and apostrophes between them
    Conservative,
    /// Whitespace only
    Space,
}

/// Segment a line. Empty or all-whitespace input yields no tokens.
pub fn segment(text: &str, rule: SegmentRule) -> Vec<Token> {
    let mut tokens = Vec::new();
    for word in text.split_whitespace() {
        match rule {
            SegmentRule::Space => {
                let mut token = Token::new(word);
                token.numeric = is_digits(word);
                tokens.push(token);
            }
            SegmentRule::Aggressive | SegmentRule::Conservative => {
                segment_word(word, rule, &mut tokens);
            }
        }
    }
    tokens
}

fn segment_word(word: &str, rule: SegmentRule, out: &mut Vec<Token>) {
    let graphemes: Vec<(usize, &str)> = word.grapheme_indices(true).collect();
    let classes: Vec<CharClass> = graphemes.iter().map(|(_, g)| CharClass::of(g)).collect();

    // glue[i]: grapheme i continues the token of grapheme i - 1
    let mut glue = vec![false; graphemes.len()];
    for i in 1..graphemes.len() {
        glue[i] |= match rule {
            SegmentRule::Aggressive => classes[i] == classes[i - 1] && classes[i].is_alnum(),
            _ => classes[i].is_alnum() && classes[i - 1].is_alnum(),
        };
        if rule == SegmentRule::Conservative && i + 1 < graphemes.len() {
            let connects = match graphemes[i].1 {
                "." | "," => classes[i - 1] == CharClass::Digit && classes[i + 1] == CharClass::Digit,
                "-" => classes[i - 1].is_alnum() && classes[i + 1].is_alnum(),
                "'" | "\u{2019}" => {
                    classes[i - 1] == CharClass::Letter && classes[i + 1] == CharClass::Letter
                }
                _ => false,
            };
            if connects {
                glue[i] = true;
                glue[i + 1] = true;
            }
        }
    }

    let mut spans: Vec<Range<usize>> = Vec::new();
    for (i, &(start, g)) in graphemes.iter().enumerate() {
        match spans.last_mut() {
            Some(span) if glue[i] => span.end = start + g.len(),
            _ => spans.push(start..start + g.len()),
        }
    }

    for mut token in Token::new(word).split_spans(&spans) {
        token.numeric = is_digits(&token.surface);
        out.push(token);
    }
}

/// Every grapheme of a non-empty string is a digit.
pub fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.graphemes(true).all(|g| CharClass::of(g) == CharClass::Digit)
}

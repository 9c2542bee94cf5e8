//! Digit-run segmentation.

use crate::tokenizer::token::Token;
use std::num::NonZeroUsize;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Split every numeric token into groups of `group_size` digits, counted
/// from the left. Groups are joined to each other; the outer flags are kept.
pub fn segment_numbers(tokens: Vec<Token>, group_size: NonZeroUsize) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        if !token.numeric {
            out.push(token);
            continue;
        }
        let spans = digit_groups(&token.surface, group_size.get());
        out.extend(token.split_spans(&spans));
    }
    out
}

fn digit_groups(digits: &str, group_size: usize) -> Vec<Range<usize>> {
    let mut spans: Vec<Range<usize>> = Vec::new();
    for (i, (start, g)) in digits.grapheme_indices(true).enumerate() {
        let end = start + g.len();
        match spans.last_mut() {
            Some(span) if i % group_size != 0 => span.end = end,
            _ => spans.push(start..end),
        }
    }
    spans
}

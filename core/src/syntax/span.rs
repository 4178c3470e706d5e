//! Token spans.
//!
//! Every AST node covers the inclusive token range `start..=end`. Spans are
//! checked when a node is built: a composite node must contain the spans of
//! all of its children, and children must appear left to right.

use crate::error::{DefectKind, InternalError, Pass};
use crate::format;

use super::token::Token;

/// The inclusive range of tokens a node was parsed from.
#[derive(Debug, Clone, Copy)]
pub struct TokenSpan<'a> {
    pub start: &'a Token<'a>,
    pub end: &'a Token<'a>,
}

impl<'a> TokenSpan<'a> {
    /// Span of a single token.
    pub fn single(token: &'a Token<'a>) -> Self {
        Self {
            start: token,
            end: token,
        }
    }

    /// Build a span, rejecting an end token that precedes the start token.
    pub fn new(start: &'a Token<'a>, end: &'a Token<'a>) -> Result<Self, InternalError> {
        if start.pos.offset > end.pos.offset {
            return Err(InternalError::at(
                Pass::Build,
                DefectKind::SpanError(format!(
                    "span ends at {} before it starts at {}",
                    end.pos, start.pos
                )),
                start.pos,
            ));
        }
        Ok(Self { start, end })
    }

    /// Whether `inner` lies entirely within `self`.
    pub fn contains(&self, inner: &TokenSpan<'_>) -> bool {
        self.start.pos.offset <= inner.start.pos.offset
            && inner.end.pos.offset <= self.end.pos.offset
    }

    /// Whether `self` ends no later than `next` starts.
    pub fn precedes(&self, next: &TokenSpan<'_>) -> bool {
        self.end.pos.offset <= next.start.pos.offset
    }

    /// Byte range covered in the source text.
    pub fn byte_range(&self) -> core::ops::Range<usize> {
        self.start.pos.offset..self.end.end_offset()
    }
}

/// Check that `children` appear left to right and all lie inside `outer`.
pub(crate) fn check_children(
    outer: &TokenSpan<'_>,
    children: &[TokenSpan<'_>],
) -> Result<(), InternalError> {
    let fail = |what: &str| {
        Err(InternalError::at(
            Pass::Build,
            DefectKind::SpanError(format!("{} within span {}..{}", what, outer.start, outer.end)),
            outer.start.pos,
        ))
    };
    for child in children {
        if !outer.contains(child) {
            return fail("child escapes its parent");
        }
    }
    for pair in children.windows(2) {
        if !pair[0].precedes(&pair[1]) {
            return fail("children out of order");
        }
    }
    Ok(())
}

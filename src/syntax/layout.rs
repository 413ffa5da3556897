//! Source layout attached to tree nodes.
//!
//! A parsed node remembers where its own text lives in the original
//! buffer, the trivia in front of it and, inside comma lists, the
//! separator after it. Containers also remember their [`Frame`]. The
//! printer copies these ranges verbatim and only synthesizes text for
//! nodes whose span is gone.

use crate::base::{Span, TextSize};

/// Byte ranges of a node inside the source it was parsed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    /// The node's own text. `None` means the node must be synthesized.
    pub span: Option<Span>,
    /// Whitespace and comments between the previous sibling and this node.
    ///
    /// The first item of a list has no lead; the gap after the list
    /// opener belongs to the list position, see [`Frame`].
    pub lead: Option<Span>,
    /// Text between the end of this node and the end of its `,`, plus a
    /// comment on the rest of the line. Statements only keep the comment.
    pub sep: Option<Span>,
}

impl Layout {
    pub fn is_synthesized(&self) -> bool {
        self.span.is_none()
    }

    /// Layout for a node that replaces this one in place: the position
    /// trivia stays, the text is rendered anew.
    pub fn replaced(&self) -> Self {
        Self {
            span: None,
            lead: self.lead,
            sep: self.sep,
        }
    }
}

/// Shape of a parsed container.
///
/// ```text
/// network:n1 = {  ip = 10.1.1.0/24;  host:h1 = { ... }  }
/// |-- header ---||gap||-- items ------------------------||close|
///               ^header_end         close_start ^
///                    ^first
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub header_end: TextSize,
    pub first: TextSize,
    pub close_start: TextSize,
    /// The last item was followed by a separator.
    pub trailing_sep: bool,
    /// Number of items at parse time.
    pub len: usize,
}

impl Frame {
    /// The container had no items when it was parsed.
    pub fn was_empty(&self) -> bool {
        self.first == self.close_start
    }

    pub fn header(&self, span: Span) -> Span {
        Span::new(span.start(), self.header_end)
    }

    pub fn gap(&self) -> Span {
        Span::new(self.header_end, self.first)
    }

    pub fn close(&self, span: Span) -> Span {
        Span::new(self.close_start, span.end())
    }
}

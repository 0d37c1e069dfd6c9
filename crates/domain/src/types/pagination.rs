//! Cursor pagination types
//!
//! The Graph API wraps list results as
//! `{"data": [...], "paging": {"cursors": {"before": "..", "after": ".."},
//! "next": "..", "previous": ".."}}`. [`GraphEnvelope`] mirrors that shape;
//! [`PageResult`] is what callers get back.
//!
//! Cursor tokens are opaque. Nothing outside this module can build a
//! [`PageCursor`] or [`Cursor`] from a string; they only come out of a
//! decoded response and go back into the next request unmodified.

use serde::{Deserialize, Serialize};

use crate::impl_name_conversions;

/// Which way a cursor moves through the result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    After,
    Before,
}

impl_name_conversions!(Direction {
    After => "after",
    Before => "before",
});

/// Opaque token pair returned with every page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    before: Option<String>,
}

impl PageCursor {
    /// Cursor continuing after this page
    pub fn forward(&self) -> Option<Cursor> {
        self.after.as_ref().map(|token| Cursor { direction: Direction::After, token: token.clone() })
    }

    /// Cursor returning to the page before this one
    pub fn backward(&self) -> Option<Cursor> {
        self.before
            .as_ref()
            .map(|token| Cursor { direction: Direction::Before, token: token.clone() })
    }

    pub fn is_empty(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }
}

/// A position to resume from, taken from a previous [`PageResult`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    direction: Direction,
    token: String,
}

impl Cursor {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Query parameter carrying this cursor, e.g. `("after", "<token>")`
    pub fn query_param(&self) -> (&'static str, &str) {
        let name = match self.direction {
            Direction::After => "after",
            Direction::Before => "before",
        };
        (name, &self.token)
    }
}

/// `paging` object of a list response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub cursors: PageCursor,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// Raw list response as sent by the platform
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GraphEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub has_next: bool,
    pub has_prev: bool,
    pub cursors: PageCursor,
}

impl<T> PageResult<T> {
    /// Cursor for the following page, if there is one
    pub fn next_cursor(&self) -> Option<Cursor> {
        if self.has_next {
            self.cursors.forward()
        } else {
            None
        }
    }

    /// Cursor for the preceding page, if there is one
    pub fn prev_cursor(&self) -> Option<Cursor> {
        if self.has_prev {
            self.cursors.backward()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}

impl<T> From<GraphEnvelope<T>> for PageResult<T> {
    fn from(envelope: GraphEnvelope<T>) -> Self {
        let paging = envelope.paging.unwrap_or_default();
        Self {
            data: envelope.data,
            has_next: paging.next.is_some(),
            has_prev: paging.previous.is_some(),
            cursors: paging.cursors,
        }
    }
}

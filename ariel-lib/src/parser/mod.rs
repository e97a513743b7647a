//! Extractors turning platform pages into [`model`](crate::model) records.
//!
//! Optional sections and fields are tolerated: a missing container yields an empty list and a
//! missing field its default. Rows lacking a mandatory part (a thread date, an activity link, a
//! history cell) abort the whole list with a [`MalformedRowError`](MalformedRowError), which
//! usually means the platform markup changed.

mod activity;
mod course;
mod dom;
mod page;
pub mod text;

use std::fmt;

use thiserror::Error;

pub use activity::{recent_activity, LinkSlot};
pub use course::{course_history, courses, favorite_courses, search_results};
pub use dom::Document;
pub use page::{page, rooms, threads};

/// Represents errors building a [`Document`](Document).
#[derive(Debug, Error)]
pub enum ParseError {
    /// HTML is not valid Utf-8.
    #[error("could not parse HTML due to invalid Utf-8 encoding")]
    HtmlInvalidUtf8(#[from] std::string::FromUtf8Error),
    /// HTML is not in a valid format.
    #[error("could not parse HTML due to invalid format")]
    InvalidHtmlFormat(#[from] tl::errors::ParseError),
}

/// The extractor that hit a malformed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Thread,
    RecentActivity,
    History,
}

impl fmt::Display for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Extractor::Thread => "thread",
            Extractor::RecentActivity => "recent activity",
            Extractor::History => "history",
        })
    }
}

/// What was wrong with a row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Defect {
    #[error("missing {0}")]
    MissingNode(&'static str),
    #[error("unrecognized date `{0}`")]
    InvalidDate(String),
    #[error("missing {0} link")]
    MissingLink(LinkSlot),
    #[error("expected at least {0} cells")]
    MissingCell(usize),
    /// An entry of a thread's edit history, `entry` counting from 0.
    #[error("edit {entry}: expected `date | author`, found `{text}`")]
    InvalidEdit { entry: usize, text: String },
}

/// A row lacked a part its extractor can't do without.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {extractor} row {row}: {defect}")]
pub struct MalformedRowError {
    pub extractor: Extractor,
    /// Position of the row among the rows the extractor walked, starting at 0.
    pub row: usize,
    pub defect: Defect,
}

impl MalformedRowError {
    pub(crate) fn new(extractor: Extractor, row: usize, defect: Defect) -> Self {
        tracing::warn!(%extractor, row, %defect, "malformed row");
        Self {
            extractor,
            row,
            defect,
        }
    }
}

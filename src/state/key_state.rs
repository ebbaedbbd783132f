//! Lifecycle of one enumeration key
//!
//! A key moves `NotStarted -> InProgress(page) -> Completed`. Keys whose
//! first page is empty jump straight from `NotStarted` to `Completed`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// No page of this key has been recorded yet
    NotStarted,

    /// At least one page was processed; pagination resumes at `next_page`
    InProgress { next_page: u32 },

    /// Pagination observed its end (or a malformed page)
    Completed,
}

impl KeyState {
    /// Returns true once no further fetches are needed for the key
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Page the pagination loop should fetch next
    pub fn start_page(&self) -> Option<u32> {
        match self {
            Self::NotStarted => Some(1),
            Self::InProgress { next_page } => Some((*next_page).max(1)),
            Self::Completed => None,
        }
    }
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress { next_page } => write!(f, "in_progress(page {})", next_page),
            Self::Completed => write!(f, "completed"),
        }
    }
}

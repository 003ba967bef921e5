//! Summary of what one harvest did.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the walk through a course's module pages stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum TraversalEnd {
    /// A locked item was reached; later items need prerequisites.
    Locked,
    /// No clickable "Next" control on the last page.
    LastPage,
    /// The per-course page cap was reached.
    PageLimit,
    /// The modules page had no item to start from.
    NoModules,
    /// Navigation broke off; the run moved on to the next course.
    Failed(String),
}

impl fmt::Display for TraversalEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "locked"),
            Self::LastPage => write!(f, "last page"),
            Self::PageLimit => write!(f, "page limit"),
            Self::NoModules => write!(f, "no modules"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Per-course counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseReport {
    pub url: String,
    pub pages_visited: usize,
    pub files_clicked: usize,
    pub videos_requested: usize,
    pub end: TraversalEnd,
}

impl CourseReport {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            pages_visited: 0,
            files_clicked: 0,
            videos_requested: 0,
            end: TraversalEnd::LastPage,
        }
    }
}

/// Report for a whole run, one entry per course in dashboard order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestReport {
    pub courses: Vec<CourseReport>,
}

impl HarvestReport {
    pub fn total_pages(&self) -> usize {
        self.courses.iter().map(|c| c.pages_visited).sum()
    }

    pub fn total_files(&self) -> usize {
        self.courses.iter().map(|c| c.files_clicked).sum()
    }

    pub fn total_videos(&self) -> usize {
        self.courses.iter().map(|c| c.videos_requested).sum()
    }

    /// Courses whose walk broke off with an error.
    pub fn failed(&self) -> usize {
        self.courses
            .iter()
            .filter(|c| matches!(c.end, TraversalEnd::Failed(_)))
            .count()
    }
}

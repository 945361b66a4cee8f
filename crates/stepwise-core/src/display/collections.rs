//! Collection wrapper types for displaying groups of domain objects.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::models::{DiagnosticSession, ProblemSummary};

/// Newtype wrapper for displaying problem listings.
///
/// # Examples
///
/// ```rust
/// use jiff::Timestamp;
/// use stepwise_core::{display::ProblemSummaries, models::ProblemSummary};
///
/// let summaries = ProblemSummaries(vec![ProblemSummary {
///     id: "no-signal".to_string(),
///     device_id: "tv-100".to_string(),
///     title: "No signal".to_string(),
///     category: Some("picture".to_string()),
///     total_steps: 4,
///     estimated_time: 240,
///     updated_at: Timestamp::now(),
/// }]);
/// let output = summaries.to_string();
/// assert!(output.contains("## No signal (tv-100/no-signal)"));
/// assert!(output.contains("4 (~4m 0s)"));
/// ```
pub struct ProblemSummaries(pub Vec<ProblemSummary>);

impl ProblemSummaries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProblemSummary> {
        self.0.iter()
    }
}

impl IntoIterator for ProblemSummaries {
    type Item = ProblemSummary;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ProblemSummaries {
    type Item = &'a ProblemSummary;
    type IntoIter = std::slice::Iter<'a, ProblemSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ProblemSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No problems found.");
        }
        for summary in &self.0 {
            write!(f, "{summary}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying session listings, one line per session.
pub struct Sessions(pub Vec<DiagnosticSession>);

impl Sessions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiagnosticSession> {
        self.0.iter()
    }
}

impl IntoIterator for Sessions {
    type Item = DiagnosticSession;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Sessions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No sessions found.");
        }
        for session in &self.0 {
            write!(
                f,
                "- `{}` {}/{} {} ({}/{}), started {}",
                session.session_id,
                session.device_id,
                session.problem_id,
                session.status().with_icon(),
                session.completed_steps,
                session.total_steps,
                LocalDateTime(&session.start_time)
            )?;
            if let Some(user) = &session.user_id {
                write!(f, " by {user}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

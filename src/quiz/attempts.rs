//! Attempt history for completed quizzes.

use crate::quiz::scorer::ScoreDetail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizKind {
    Unit,
    Grand,
}

impl QuizKind {
    pub const fn label(self) -> &'static str {
        match self {
            QuizKind::Unit => "unit",
            QuizKind::Grand => "grand",
        }
    }
}

/// One completed quiz, as remembered by an attempt store.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub student_id: String,
    pub quiz_kind: QuizKind,
    pub unit_name: Option<String>,
    pub total_score: u32,
    pub max_score: u32,
    pub correct_count: usize,
    pub question_count: usize,
    pub details: Vec<ScoreDetail>,
    pub taken_at: DateTime<Utc>,
}

/// Where attempt records live between quizzes.
///
/// The engine only needs these two operations; storage layout belongs
/// to the implementer.
pub trait AttemptStore {
    fn record_attempt(&mut self, record: AttemptRecord);

    /// Attempts for one student, optionally narrowed to a unit.
    fn history(&self, student_id: &str, unit_name: Option<&str>) -> Vec<&AttemptRecord>;
}

/// Keeps attempts for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    records: Vec<AttemptRecord>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AttemptStore for InMemoryAttemptStore {
    fn record_attempt(&mut self, record: AttemptRecord) {
        self.records.push(record);
    }

    fn history(&self, student_id: &str, unit_name: Option<&str>) -> Vec<&AttemptRecord> {
        self.records
            .iter()
            .filter(|record| record.student_id == student_id)
            .filter(|record| match unit_name {
                Some(unit) => record.unit_name.as_deref() == Some(unit),
                None => true,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(student_id: &str, unit_name: Option<&str>, score: u32) -> AttemptRecord {
        AttemptRecord {
            student_id: student_id.to_string(),
            quiz_kind: if unit_name.is_some() {
                QuizKind::Unit
            } else {
                QuizKind::Grand
            },
            unit_name: unit_name.map(str::to_string),
            total_score: score,
            max_score: 20,
            correct_count: score as usize,
            question_count: 15,
            details: Vec::new(),
            taken_at: Utc::now(),
        }
    }

    #[test]
    fn history_filters_by_student() {
        let mut store = InMemoryAttemptStore::new();
        store.record_attempt(record("alice", Some("Unit-I Descriptive Statistics"), 12));
        store.record_attempt(record("bob", Some("Unit-I Descriptive Statistics"), 18));

        let history = store.history("alice", None);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].total_score, 12);
    }

    #[test]
    fn history_can_narrow_to_one_unit() {
        let mut store = InMemoryAttemptStore::new();
        store.record_attempt(record("alice", Some("Unit-I Descriptive Statistics"), 12));
        store.record_attempt(record("alice", Some("Unit-V Hypothesis Testing"), 16));
        store.record_attempt(record("alice", None, 60));

        let unit_history = store.history("alice", Some("Unit-V Hypothesis Testing"));
        assert_eq!(unit_history.len(), 1);
        assert_eq!(unit_history[0].total_score, 16);

        let all = store.history("alice", None);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn quiz_kind_labels_are_stable() {
        assert_eq!(QuizKind::Unit.label(), "unit");
        assert_eq!(QuizKind::Grand.label(), "grand");
    }
}

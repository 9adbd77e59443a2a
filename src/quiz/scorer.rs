//! Marks a submitted answer sheet against a generated paper.

use crate::engine::question::QuestionInstance;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("submitted {answers} answers for {questions} questions")]
    CountMismatch { questions: usize, answers: usize },
}

/// Outcome of one question on the answer sheet.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreDetail {
    pub template_id: String,
    pub submitted: Option<usize>,
    pub correct_index: usize,
    pub is_correct: bool,
    pub marks_awarded: u32,
    pub marks_possible: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub total_score: u32,
    pub max_score: u32,
    pub correct_count: usize,
    pub question_count: usize,
    pub details: Vec<ScoreDetail>,
}

impl ScoreSummary {
    pub fn percentage(&self) -> f64 {
        if self.max_score == 0 {
            0.0
        } else {
            self.total_score as f64 / self.max_score as f64 * 100.0
        }
    }
}

/// Scores an answer sheet: one entry per question, `None` for a skip.
///
/// Skipped and out-of-range answers score zero; a sheet of the wrong
/// length is the only error.
pub fn score_quiz(
    questions: &[QuestionInstance],
    answers: &[Option<usize>],
) -> Result<ScoreSummary, ScoreError> {
    if questions.len() != answers.len() {
        return Err(ScoreError::CountMismatch {
            questions: questions.len(),
            answers: answers.len(),
        });
    }

    let mut details = Vec::with_capacity(questions.len());
    let mut total_score = 0;
    let mut max_score = 0;
    let mut correct_count = 0;

    for (question, &submitted) in questions.iter().zip(answers) {
        let valid = submitted.filter(|idx| *idx < question.options.len());
        let is_correct = valid == Some(question.correct_index);
        let marks_awarded = if is_correct { question.marks } else { 0 };

        total_score += marks_awarded;
        max_score += question.marks;
        if is_correct {
            correct_count += 1;
        }
        details.push(ScoreDetail {
            template_id: question.template_id.clone(),
            submitted,
            correct_index: question.correct_index,
            is_correct,
            marks_awarded,
            marks_possible: question.marks,
        });
    }

    Ok(ScoreSummary {
        total_score,
        max_score,
        correct_count,
        question_count: questions.len(),
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Classification, DifficultyLevel, DifficultyType};
    use crate::engine::value::Value;

    fn question(id: &str, correct_index: usize, marks: u32) -> QuestionInstance {
        QuestionInstance {
            template_id: id.to_string(),
            classification: Classification {
                unit_name: "Unit-I Descriptive Statistics".to_string(),
                topic_name: "Central Tendency".to_string(),
                subtopic_name: "Mean".to_string(),
                difficulty_level: DifficultyLevel::Easy,
                difficulty_type: DifficultyType::Direct,
            },
            question_text: "placeholder".to_string(),
            options: vec![
                "10".to_string(),
                "20".to_string(),
                "30".to_string(),
                "40".to_string(),
            ],
            correct_index,
            marks,
            explanation: None,
            correct_value: Value::Int(10),
        }
    }

    #[test]
    fn partial_credit_adds_up_by_marks() {
        let questions = vec![question("q1", 1, 1), question("q2", 3, 2)];
        let answers = vec![Some(1), Some(0)];
        let summary = score_quiz(&questions, &answers).expect("sheet matches");

        assert_eq!(summary.total_score, 1);
        assert_eq!(summary.max_score, 3);
        assert_eq!(summary.correct_count, 1);
        assert!(summary.details[0].is_correct);
        assert!(!summary.details[1].is_correct);
    }

    #[test]
    fn skipped_and_out_of_range_answers_score_zero() {
        let questions = vec![question("q1", 0, 2), question("q2", 2, 2)];
        let answers = vec![None, Some(9)];
        let summary = score_quiz(&questions, &answers).expect("sheet matches");

        assert_eq!(summary.total_score, 0);
        assert_eq!(summary.correct_count, 0);
        assert_eq!(summary.details[1].submitted, Some(9));
        assert!(!summary.details[1].is_correct);
    }

    #[test]
    fn mismatched_sheet_length_is_an_error() {
        let questions = vec![question("q1", 0, 1)];
        let answers = vec![Some(0), Some(1)];
        assert!(matches!(
            score_quiz(&questions, &answers),
            Err(ScoreError::CountMismatch {
                questions: 1,
                answers: 2
            })
        ));
    }

    #[test]
    fn percentage_handles_empty_paper() {
        let summary = score_quiz(&[], &[]).expect("empty sheet matches");
        assert_eq!(summary.percentage(), 0.0);
    }
}

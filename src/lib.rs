//! Procedural generation and scoring engine for statistics quizzes.
//!
//! Question templates declare variables, option text, and an answer
//! instruction. The engine resolves the variables, renders the question,
//! computes the correct answer with plausible distractors, and packages
//! everything into gradable quiz instances.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod quiz;
pub mod syllabus;
pub mod telemetry;

pub use catalog::{QuestionTemplate, TemplateCatalog};
pub use engine::question::QuestionInstance;
pub use quiz::{score_quiz, QuizBuilder, ScoreSummary};

//! Quiz assembly and scoring on top of the question engine.

pub mod assembler;
pub mod attempts;
pub mod planner;
pub mod scorer;

pub use assembler::{Quiz, QuizBuilder, QuizError};
pub use attempts::{AttemptRecord, AttemptStore, InMemoryAttemptStore, QuizKind};
pub use planner::{QuotaPlan, GRAND_QUOTA, UNIT_QUOTA};
pub use scorer::{score_quiz, ScoreDetail, ScoreError, ScoreSummary};

pub mod answers;
pub mod distractors;
pub mod generators;
pub mod options;
pub mod question;
pub mod render;
pub mod resolve;
pub mod stats;
pub mod value;

pub use generators::GeneratorKind;
pub use question::{generate_question, QuestionInstance};
pub use value::{Environment, ResolveFault, Value};

//! Builds presentable quizzes from the catalog.

use crate::catalog::TemplateCatalog;
use crate::engine::question::{generate_question, QuestionInstance};
use crate::quiz::planner::{plan_selection, QuotaPlan, GRAND_QUOTA, UNIT_QUOTA};
use crate::syllabus;
use rand::Rng;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("'{0}' is not a syllabus unit")]
    UnknownUnit(String),
    #[error("no templates available for '{0}'")]
    EmptyPool(String),
}

/// A generated paper ready for presentation and scoring.
#[derive(Debug, Clone)]
pub struct Quiz {
    pub title: String,
    pub questions: Vec<QuestionInstance>,
}

impl Quiz {
    pub fn total_marks(&self) -> u32 {
        self.questions.iter().map(|q| q.marks).sum()
    }
}

/// Assembles unit and grand quizzes from a loaded catalog.
pub struct QuizBuilder<'a> {
    catalog: &'a TemplateCatalog,
}

impl<'a> QuizBuilder<'a> {
    pub fn new(catalog: &'a TemplateCatalog) -> Self {
        Self { catalog }
    }

    /// A 15-question paper drawn from one syllabus unit.
    pub fn unit_quiz<R: Rng>(&self, unit_name: &str, rng: &mut R) -> Result<Quiz, QuizError> {
        if !syllabus::is_known_unit(unit_name) {
            return Err(QuizError::UnknownUnit(unit_name.to_string()));
        }
        let pool = self.catalog.for_unit(unit_name);
        if pool.is_empty() {
            return Err(QuizError::EmptyPool(unit_name.to_string()));
        }
        let quiz = self.assemble(format!("{unit_name} Quiz"), &pool, UNIT_QUOTA, rng);
        Ok(quiz)
    }

    /// A 75-question paper drawn across the whole syllabus.
    pub fn grand_quiz<R: Rng>(&self, rng: &mut R) -> Result<Quiz, QuizError> {
        let pool: Vec<_> = self.catalog.templates().iter().collect();
        if pool.is_empty() {
            return Err(QuizError::EmptyPool("grand quiz".to_string()));
        }
        let quiz = self.assemble("Grand Quiz".to_string(), &pool, GRAND_QUOTA, rng);
        Ok(quiz)
    }

    fn assemble<R: Rng>(
        &self,
        title: String,
        pool: &[&crate::catalog::QuestionTemplate],
        quota: QuotaPlan,
        rng: &mut R,
    ) -> Quiz {
        let planned = plan_selection(pool, quota, rng);
        let questions: Vec<QuestionInstance> = planned
            .into_iter()
            .map(|p| {
                let mut question = generate_question(p.template, rng);
                question.marks = p.marks;
                question
            })
            .collect();

        info!(
            title = %title,
            questions = questions.len(),
            marks = questions.iter().map(|q| q.marks).sum::<u32>(),
            "quiz assembled"
        );
        Quiz { title, questions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        Classification, DifficultyLevel, DifficultyType, QuestionTemplate, VarDecl, VarSpec,
    };
    use crate::engine::answers::AnswerLogic;
    use crate::engine::value::Value;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mean_template(id: &str, unit_name: &str, difficulty_type: DifficultyType) -> QuestionTemplate {
        QuestionTemplate {
            id: id.to_string(),
            classification: Classification {
                unit_name: unit_name.to_string(),
                topic_name: "Central Tendency".to_string(),
                subtopic_name: "Mean".to_string(),
                difficulty_level: DifficultyLevel::Easy,
                difficulty_type,
            },
            question: "Find the mean of {data}.".to_string(),
            variables: vec![VarDecl {
                name: "data".to_string(),
                spec: VarSpec::Literal {
                    value: Value::List(vec![Value::Int(4), Value::Int(6), Value::Int(8)]),
                },
            }],
            options: Vec::new(),
            answer: AnswerLogic::Mean {
                dataset_var: "data".to_string(),
            },
            explanation: None,
        }
    }

    fn catalog_for(unit_name: &str) -> TemplateCatalog {
        let mut templates = Vec::new();
        for i in 0..12 {
            templates.push(mean_template(
                &format!("d-{i}"),
                unit_name,
                DifficultyType::Direct,
            ));
        }
        for i in 0..6 {
            templates.push(mean_template(
                &format!("w-{i}"),
                unit_name,
                DifficultyType::Aptitude,
            ));
        }
        TemplateCatalog::new(templates).expect("valid catalog")
    }

    #[test]
    fn unit_quiz_meets_its_quota() {
        let catalog = catalog_for("Unit-I Descriptive Statistics");
        let builder = QuizBuilder::new(&catalog);
        let mut rng = StdRng::seed_from_u64(42);
        let quiz = builder
            .unit_quiz("Unit-I Descriptive Statistics", &mut rng)
            .expect("quiz builds");

        assert_eq!(quiz.questions.len(), 15);
        assert_eq!(quiz.total_marks(), 20);
        for question in &quiz.questions {
            assert_eq!(question.options.len(), 4);
            assert!(question.correct_index < 4);
        }
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let catalog = catalog_for("Unit-I Descriptive Statistics");
        let builder = QuizBuilder::new(&catalog);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            builder.unit_quiz("Unit-IX Astrology", &mut rng),
            Err(QuizError::UnknownUnit(_))
        ));
    }

    #[test]
    fn known_unit_with_no_templates_is_rejected() {
        let catalog = catalog_for("Unit-I Descriptive Statistics");
        let builder = QuizBuilder::new(&catalog);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            builder.unit_quiz("Unit-V Hypothesis Testing", &mut rng),
            Err(QuizError::EmptyPool(_))
        ));
    }

    #[test]
    fn grand_quiz_spans_seventy_five_questions() {
        let catalog = catalog_for("Unit-II Sampling and Distributions");
        let builder = QuizBuilder::new(&catalog);
        let mut rng = StdRng::seed_from_u64(7);
        let quiz = builder.grand_quiz(&mut rng).expect("quiz builds");

        assert_eq!(quiz.questions.len(), 75);
        assert_eq!(quiz.total_marks(), 100);
    }

    #[test]
    fn seeded_builders_produce_identical_papers() {
        let catalog = catalog_for("Unit-I Descriptive Statistics");
        let builder = QuizBuilder::new(&catalog);

        let quiz_a = builder
            .unit_quiz(
                "Unit-I Descriptive Statistics",
                &mut StdRng::seed_from_u64(500),
            )
            .expect("quiz builds");
        let quiz_b = builder
            .unit_quiz(
                "Unit-I Descriptive Statistics",
                &mut StdRng::seed_from_u64(500),
            )
            .expect("quiz builds");

        let ids_a: Vec<_> = quiz_a.questions.iter().map(|q| &q.template_id).collect();
        let ids_b: Vec<_> = quiz_b.questions.iter().map(|q| &q.template_id).collect();
        assert_eq!(ids_a, ids_b);
        for (a, b) in quiz_a.questions.iter().zip(&quiz_b.questions) {
            assert_eq!(a.options, b.options);
            assert_eq!(a.correct_index, b.correct_index);
        }
    }
}

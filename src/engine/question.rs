//! Turns one template into a concrete question instance.

use crate::catalog::{Classification, QuestionTemplate};
use crate::engine::options::OPTION_COUNT;
use crate::engine::render::render_text;
use crate::engine::resolve::resolve_variables;
use crate::engine::value::Value;
use rand::Rng;
use serde::Serialize;
use tracing::warn;

const DEGRADED_OPTION: &str = "Error generating options";

/// A fully generated question, ready to present and score.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionInstance {
    pub template_id: String,
    pub classification: Classification,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub marks: u32,
    pub explanation: Option<String>,
    #[serde(skip)]
    pub correct_value: Value,
}

impl QuestionInstance {
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }
}

/// Generates a question instance from a template.
///
/// This never fails: variable faults and answer computation errors
/// produce a degraded but well-formed instance, so one broken template
/// cannot take down a whole quiz.
pub fn generate_question<R: Rng>(template: &QuestionTemplate, rng: &mut R) -> QuestionInstance {
    let mut env = resolve_variables(&template.variables, rng);

    let (correct_value, mut options, correct_index) =
        match template.answer.compute(&mut env, &template.options, rng) {
            Ok(outcome) => (outcome.correct, outcome.options, outcome.correct_index),
            Err(err) => {
                warn!(template = %template.id, error = %err, "answer computation failed");
                (
                    Value::Text(DEGRADED_OPTION.to_string()),
                    vec![DEGRADED_OPTION.to_string(); OPTION_COUNT],
                    0,
                )
            }
        };

    // Authored fixed-choice lists may be short of the standard four.
    let mut alternative = 1;
    while options.len() < OPTION_COUNT {
        let candidate = format!("Alternative {alternative}");
        if !options.contains(&candidate) {
            options.push(candidate);
        }
        alternative += 1;
    }

    let (correct_index, correct_value) =
        reconcile_correct(&template.id, &options, correct_index, correct_value);

    env.insert("correct_ans", correct_value.clone());
    let question_text = render_text(&template.question, &env);
    let explanation = template
        .explanation
        .as_ref()
        .map(|text| render_text(text, &env));

    let marks = if template.classification.difficulty_type.is_direct() {
        1
    } else {
        2
    };

    QuestionInstance {
        template_id: template.id.clone(),
        classification: template.classification.clone(),
        question_text,
        options,
        correct_index,
        marks,
        explanation,
        correct_value,
    }
}

/// Safety net for a correct index pointing past the option list: fall
/// back to slot 0 and keep the stored value in step with it.
fn reconcile_correct(
    template_id: &str,
    options: &[String],
    correct_index: usize,
    correct_value: Value,
) -> (usize, Value) {
    if correct_index < options.len() {
        return (correct_index, correct_value);
    }
    warn!(
        template = %template_id,
        index = correct_index,
        "correct index out of range, clamping"
    );
    (0, Value::Text(options[0].clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DifficultyLevel, DifficultyType, VarDecl, VarSpec};
    use crate::engine::answers::AnswerLogic;
    use crate::engine::generators::GeneratorKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn classification(difficulty_type: DifficultyType) -> Classification {
        Classification {
            unit_name: "Unit-I Descriptive Statistics".to_string(),
            topic_name: "Central Tendency".to_string(),
            subtopic_name: "Mean".to_string(),
            difficulty_level: DifficultyLevel::Easy,
            difficulty_type,
        }
    }

    fn mean_template() -> QuestionTemplate {
        QuestionTemplate {
            id: "mean-basic".to_string(),
            classification: classification(DifficultyType::Direct),
            question: "Find the mean of the data set {scores}.".to_string(),
            variables: vec![VarDecl {
                name: "scores".to_string(),
                spec: VarSpec::Literal {
                    value: Value::List(vec![
                        Value::Int(10),
                        Value::Int(20),
                        Value::Int(30),
                    ]),
                },
            }],
            options: Vec::new(),
            answer: AnswerLogic::Mean {
                dataset_var: "scores".to_string(),
            },
            explanation: Some(
                "Sum {sum_of_values} over {count_of_values} values gives {correct_ans}."
                    .to_string(),
            ),
        }
    }

    #[test]
    fn generates_complete_instance_with_rendered_text() {
        let template = mean_template();
        let mut rng = StdRng::seed_from_u64(21);
        let instance = generate_question(&template, &mut rng);

        assert_eq!(
            instance.question_text,
            "Find the mean of the data set 10, 20, 30."
        );
        assert_eq!(instance.options.len(), OPTION_COUNT);
        assert_eq!(instance.correct_option(), "20");
        assert_eq!(instance.marks, 1);
        assert_eq!(
            instance.explanation.as_deref(),
            Some("Sum 60 over 3 values gives 20.")
        );
    }

    #[test]
    fn non_direct_templates_carry_two_marks() {
        let mut template = mean_template();
        template.classification = classification(DifficultyType::Aptitude);
        let mut rng = StdRng::seed_from_u64(5);
        let instance = generate_question(&template, &mut rng);
        assert_eq!(instance.marks, 2);
    }

    #[test]
    fn broken_answer_logic_degrades_instead_of_panicking() {
        let mut template = mean_template();
        // dataset variable missing entirely
        template.variables.clear();
        let mut rng = StdRng::seed_from_u64(8);
        let instance = generate_question(&template, &mut rng);

        assert_eq!(instance.options.len(), OPTION_COUNT);
        assert_eq!(instance.correct_index, 0);
        assert_eq!(instance.options[0], DEGRADED_OPTION);
    }

    #[test]
    fn clamped_correct_index_keeps_value_and_option_in_step() {
        let options = vec![
            "12".to_string(),
            "14".to_string(),
            "16".to_string(),
            "18".to_string(),
        ];

        let (index, value) = reconcile_correct("t1", &options, 9, Value::Int(99));
        assert_eq!(index, 0);
        assert_eq!(value, Value::Text("12".to_string()));

        // an in-range index passes through untouched
        let (index, value) = reconcile_correct("t1", &options, 2, Value::Int(16));
        assert_eq!(index, 2);
        assert_eq!(value, Value::Int(16));
    }

    #[test]
    fn degenerate_answer_parameters_degrade_instead_of_panicking() {
        let template = QuestionTemplate {
            id: "ss-zero-alpha".to_string(),
            classification: classification(DifficultyType::Aptitude),
            question: "How many subjects are needed per group?".to_string(),
            variables: vec![
                VarDecl {
                    name: "delta".to_string(),
                    spec: VarSpec::Literal {
                        value: Value::Float(5.0),
                    },
                },
                VarDecl {
                    name: "sigma".to_string(),
                    spec: VarSpec::Literal {
                        value: Value::Float(10.0),
                    },
                },
                VarDecl {
                    name: "alpha".to_string(),
                    spec: VarSpec::Literal {
                        value: Value::Float(0.0),
                    },
                },
                VarDecl {
                    name: "power".to_string(),
                    spec: VarSpec::Literal {
                        value: Value::Float(0.8),
                    },
                },
            ],
            options: Vec::new(),
            answer: AnswerLogic::SampleSizeTwoMeans {
                effect_var: "delta".to_string(),
                std_dev_var: "sigma".to_string(),
                alpha_var: "alpha".to_string(),
                power_var: "power".to_string(),
            },
            explanation: None,
        };
        let mut rng = StdRng::seed_from_u64(13);
        let instance = generate_question(&template, &mut rng);

        assert_eq!(instance.options.len(), OPTION_COUNT);
        assert_eq!(instance.correct_index, 0);
        assert_eq!(instance.options[0], DEGRADED_OPTION);
    }

    #[test]
    fn short_fixed_choice_lists_are_padded_to_four() {
        let template = QuestionTemplate {
            id: "fc-short".to_string(),
            classification: classification(DifficultyType::Aptitude),
            question: "Pick the estimator that is unbiased for the population mean.".to_string(),
            variables: Vec::new(),
            options: vec!["Sample mean".to_string(), "Sample maximum".to_string()],
            answer: AnswerLogic::FixedChoice { correct_index: 0 },
            explanation: None,
        };
        let mut rng = StdRng::seed_from_u64(31);
        let instance = generate_question(&template, &mut rng);
        assert_eq!(instance.options.len(), OPTION_COUNT);
        assert_eq!(instance.correct_option(), "Sample mean");
    }

    #[test]
    fn same_seed_yields_identical_instances() {
        let template = QuestionTemplate {
            id: "z-seeded".to_string(),
            classification: classification(DifficultyType::Direct),
            question: "A value of {x} comes from N({mu}, {sigma}²). Find its z-score.".to_string(),
            variables: vec![
                VarDecl {
                    name: "mu".to_string(),
                    spec: VarSpec::Generated(GeneratorKind::IntRange { min: 40, max: 60 }),
                },
                VarDecl {
                    name: "sigma".to_string(),
                    spec: VarSpec::Generated(GeneratorKind::IntRange { min: 2, max: 10 }),
                },
                VarDecl {
                    name: "x".to_string(),
                    spec: VarSpec::Generated(GeneratorKind::IntRange { min: 30, max: 90 }),
                },
            ],
            options: Vec::new(),
            answer: AnswerLogic::ZScore {
                x_var: "x".to_string(),
                mean_var: "mu".to_string(),
                std_dev_var: "sigma".to_string(),
            },
            explanation: None,
        };

        let a = generate_question(&template, &mut StdRng::seed_from_u64(77));
        let b = generate_question(&template, &mut StdRng::seed_from_u64(77));
        assert_eq!(a.question_text, b.question_text);
        assert_eq!(a.options, b.options);
        assert_eq!(a.correct_index, b.correct_index);
    }
}

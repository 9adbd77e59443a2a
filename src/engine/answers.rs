//! The closed catalog of answer computations.
//!
//! Two families: computed-numeric kinds derive the correct value from
//! resolved variables and surround it with distractors (random ones plus
//! formula-specific common errors), while fixed-choice kinds pick among
//! authored or canned option strings. Every kind returns a `Result`;
//! the question assembler turns failures into a degraded option set.

use crate::engine::distractors::{numeric_distractors, DistractorProfile};
use crate::engine::options::{numeric_options, text_options};
use crate::engine::render::render_text;
use crate::engine::stats;
use crate::engine::value::{Environment, Value, VarError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// An answer computation could not produce a usable outcome.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error(transparent)]
    Var(#[from] VarError),
    #[error("option index {index} out of range for {len} template options")]
    OptionIndexOutOfRange { index: usize, len: usize },
    #[error("template provides {found} options, this answer kind needs {needed}")]
    NotEnoughOptions { needed: usize, found: usize },
    #[error("{0}")]
    Degenerate(&'static str),
    #[error("answer logic kind is not recognized")]
    UnknownKind,
}

/// The computed answer with its display options.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub correct: Value,
    pub options: Vec<String>,
    pub correct_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerLogic {
    // --- fixed-choice family ---
    /// The authored option at a fixed index is correct; order is kept.
    FixedChoice { correct_index: usize },
    /// Correct index depends on a resolved variable matching a value.
    FixedChoiceConditional {
        condition_var: String,
        condition_value: Value,
        index_if_match: usize,
        index_otherwise: usize,
    },
    /// Reject H0 when p <= alpha; first two authored options are the
    /// reject / fail-to-reject texts, shuffled for presentation.
    PValueDecision {
        p_value_var: String,
        alpha_var: String,
    },
    /// Reject H0 when the null mean falls outside the interval.
    CiHypothesisDecision {
        lower_var: String,
        upper_var: String,
        mu_null_var: String,
    },
    InterpretCiDifferenceMeans {
        lower_var: String,
        upper_var: String,
    },
    InterpretCiDifferenceProportions {
        lower_var: String,
        upper_var: String,
    },
    /// The sample with the larger standard deviation has the wider CI.
    CompareCiWidthByStdDev {
        std_dev_a_var: String,
        std_dev_b_var: String,
    },

    // --- descriptive statistics ---
    Mean { dataset_var: String },
    MedianSorted { dataset_var: String },
    Mode { dataset_var: String },
    Range { dataset_var: String },
    Iqr { q1_var: String, q3_var: String },
    SampleVariance { dataset_var: String },
    StdDevFromVariance { variance_var: String },
    RelativeFrequency {
        frequency_var: String,
        total_var: String,
    },
    MissingValueForMean {
        known_var: String,
        target_mean_var: String,
    },
    KthPercentile {
        dataset_var: String,
        k_var: String,
    },
    WeightedMean {
        value1_var: String,
        weight1_var: String,
        value2_var: String,
        weight2_var: String,
    },
    MeanScaleEffect {
        mean_var: String,
        multiplier_var: String,
    },
    MeanShiftEffect {
        mean_var: String,
        addend_var: String,
    },
    MeanSum {
        mean1_var: String,
        mean2_var: String,
    },

    // --- normal distribution and estimation ---
    ZScore {
        x_var: String,
        mean_var: String,
        std_dev_var: String,
    },
    XFromZ {
        mean_var: String,
        std_dev_var: String,
        z_var: String,
    },
    StandardErrorMean {
        variance_var: String,
        size_var: String,
    },
    MarginOfError {
        z_var: String,
        std_dev_var: String,
        size_var: String,
    },
    CiMeanKnownSigma {
        mean_var: String,
        std_dev_var: String,
        size_var: String,
        #[serde(default)]
        z_value: Option<f64>,
    },
    CiProportion {
        successes_var: String,
        size_var: String,
        z_var: String,
    },
    PointEstimateProportion {
        successes_var: String,
        size_var: String,
    },
    FindMeanFromCi {
        lower_var: String,
        upper_var: String,
    },

    // --- discrete distributions ---
    BinomialProbability {
        trials_var: String,
        successes_var: String,
        p_var: String,
    },
    BinomialCumulativeLe {
        trials_var: String,
        max_var: String,
        p_var: String,
    },
    BinomialAtLeastOne {
        trials_var: String,
        p_var: String,
    },
    BinomialMean {
        trials_var: String,
        p_var: String,
    },
    BinomialVariance {
        trials_var: String,
        p_var: String,
    },
    PoissonProbability {
        lambda_var: String,
        k_var: String,
    },
    NormalApproxPoissonGt {
        lambda_var: String,
        k_var: String,
    },

    // --- correlation, covariance, combinations ---
    CovarianceFromCorrelation {
        var_x_var: String,
        var_y_var: String,
        corr_var: String,
    },
    CorrelationFromCovariance {
        cov_var: String,
        var_x_var: String,
        var_y_var: String,
    },
    ExpectedValueProductIndependent {
        ex_var: String,
        ey_var: String,
    },
    VarianceSumIndependent {
        var_x_var: String,
        var_y_var: String,
    },
    VarianceLinearCombination {
        weight1_var: String,
        weight2_var: String,
        var_a_var: String,
        var_b_var: String,
        cov_var: String,
    },

    // --- hypothesis testing ---
    TestStatisticOneMean {
        mean_var: String,
        mu0_var: String,
        std_dev_var: String,
        size_var: String,
    },
    TestStatisticTwoMeans {
        mean1_var: String,
        mean2_var: String,
        var1_var: String,
        var2_var: String,
        n1_var: String,
        n2_var: String,
    },
    TwoTailedPValueFromZ { z_var: String },
    SampleSizeTwoMeans {
        effect_var: String,
        std_dev_var: String,
        alpha_var: String,
        power_var: String,
    },
    SampleSizeProportionNoPrior {
        margin_var: String,
        z_var: String,
    },

    #[serde(other)]
    Unknown,
}

/// A numeric correct value plus its options.
fn numeric_outcome<R: Rng>(
    correct: f64,
    common_errors: Vec<f64>,
    profile: DistractorProfile,
    rng: &mut R,
) -> AnswerOutcome {
    let mut distractors = numeric_distractors(correct, 3, profile, rng);
    distractors.extend(common_errors);
    let (options, correct_index) = numeric_options(correct, &distractors, profile.decimals, rng);
    AnswerOutcome {
        correct: Value::Float(correct),
        options,
        correct_index,
    }
}

fn text_outcome<R: Rng>(
    correct: String,
    distractors: Vec<String>,
    rng: &mut R,
) -> AnswerOutcome {
    let (options, correct_index) = text_options(correct.clone(), distractors, rng);
    AnswerOutcome {
        correct: Value::Text(correct),
        options,
        correct_index,
    }
}

fn profile(range_factor: f64, min_diff: f64, decimals: u8) -> DistractorProfile {
    DistractorProfile {
        range_factor,
        min_diff,
        decimals,
    }
}

fn interval_text(lower: f64, upper: f64) -> String {
    format!("({lower:.3}, {upper:.3})")
}

impl AnswerLogic {
    /// The smallest authored option list this kind can work with.
    pub fn min_template_options(&self) -> usize {
        match self {
            AnswerLogic::FixedChoice { correct_index } => correct_index + 1,
            AnswerLogic::FixedChoiceConditional {
                index_if_match,
                index_otherwise,
                ..
            } => index_if_match.max(index_otherwise) + 1,
            AnswerLogic::PValueDecision { .. } => 2,
            _ => 0,
        }
    }

    /// Computes the correct answer and its option list.
    ///
    /// Intermediate values used by explanation templates are inserted
    /// back into the environment as they are derived.
    pub fn compute<R: Rng>(
        &self,
        env: &mut Environment,
        raw_options: &[String],
        rng: &mut R,
    ) -> Result<AnswerOutcome, AnswerError> {
        use AnswerLogic::*;
        match self {
            FixedChoice { correct_index } => {
                let options = rendered_options(raw_options, env);
                let correct = options.get(*correct_index).cloned().ok_or(
                    AnswerError::OptionIndexOutOfRange {
                        index: *correct_index,
                        len: options.len(),
                    },
                )?;
                Ok(AnswerOutcome {
                    correct: Value::Text(correct),
                    options,
                    correct_index: *correct_index,
                })
            }
            FixedChoiceConditional {
                condition_var,
                condition_value,
                index_if_match,
                index_otherwise,
            } => {
                let actual = env
                    .get(condition_var)
                    .ok_or_else(|| VarError::Missing(condition_var.clone()))?;
                let correct_index = if actual == condition_value {
                    *index_if_match
                } else {
                    *index_otherwise
                };
                let options = rendered_options(raw_options, env);
                let correct = options.get(correct_index).cloned().ok_or(
                    AnswerError::OptionIndexOutOfRange {
                        index: correct_index,
                        len: options.len(),
                    },
                )?;
                Ok(AnswerOutcome {
                    correct: Value::Text(correct),
                    options,
                    correct_index,
                })
            }
            PValueDecision {
                p_value_var,
                alpha_var,
            } => {
                if raw_options.len() < 2 {
                    return Err(AnswerError::NotEnoughOptions {
                        needed: 2,
                        found: raw_options.len(),
                    });
                }
                let p = env.float(p_value_var)?;
                let alpha = env.float(alpha_var)?;
                let options = rendered_options(raw_options, env);
                let correct = if p <= alpha {
                    options[0].clone()
                } else {
                    options[1].clone()
                };
                let mut shuffled = options;
                shuffled.shuffle(rng);
                let correct_index = shuffled
                    .iter()
                    .position(|opt| *opt == correct)
                    .unwrap_or(0);
                Ok(AnswerOutcome {
                    correct: Value::Text(correct),
                    options: shuffled,
                    correct_index,
                })
            }
            CiHypothesisDecision {
                lower_var,
                upper_var,
                mu_null_var,
            } => {
                let lower = env.float(lower_var)?;
                let upper = env.float(upper_var)?;
                let mu_null = env.float(mu_null_var)?;
                let candidates = [
                    "Reject H₀",
                    "Fail to reject H₀",
                    "Accept H₀",
                    "More information is needed",
                ];
                let correct = if mu_null < lower || mu_null > upper {
                    candidates[0]
                } else {
                    candidates[1]
                };
                let distractors = candidates
                    .iter()
                    .filter(|c| **c != correct)
                    .map(|c| c.to_string())
                    .collect();
                Ok(text_outcome(correct.to_string(), distractors, rng))
            }
            InterpretCiDifferenceMeans {
                lower_var,
                upper_var,
            } => {
                let lower = env.float(lower_var)?;
                let upper = env.float(upper_var)?;
                let correct = if lower > 0.0 {
                    "μ₁ is significantly greater than μ₂"
                } else if upper < 0.0 {
                    "μ₂ is significantly greater than μ₁"
                } else {
                    "There is no significant difference between μ₁ and μ₂"
                };
                let pool = choice_pool(
                    raw_options,
                    env,
                    &[
                        "μ₁ is significantly greater than μ₂",
                        "μ₂ is significantly greater than μ₁",
                        "There is no significant difference between μ₁ and μ₂",
                        "The sample sizes were too small to conclude",
                    ],
                );
                let distractors = pool.into_iter().filter(|opt| opt != correct).collect();
                Ok(text_outcome(correct.to_string(), distractors, rng))
            }
            InterpretCiDifferenceProportions {
                lower_var,
                upper_var,
            } => {
                let lower = env.float(lower_var)?;
                let upper = env.float(upper_var)?;
                let significant = lower > 0.0 || upper < 0.0;
                env.insert("ci_includes_zero", Value::Text((!significant).to_string()));
                let correct = if significant {
                    "Yes, there is a significant difference"
                } else {
                    "No, the difference is not significant"
                };
                let pool = choice_pool(
                    raw_options,
                    env,
                    &[
                        "Yes, there is a significant difference",
                        "No, the difference is not significant",
                        "Cannot be determined from the interval",
                        "A p-value is required to decide",
                    ],
                );
                let distractors = pool.into_iter().filter(|opt| opt != correct).collect();
                Ok(text_outcome(correct.to_string(), distractors, rng))
            }
            CompareCiWidthByStdDev {
                std_dev_a_var,
                std_dev_b_var,
            } => {
                let sd_a = env.float(std_dev_a_var)?;
                let sd_b = env.float(std_dev_b_var)?;
                let correct = if sd_a > sd_b {
                    "Sample A"
                } else if sd_b > sd_a {
                    "Sample B"
                } else {
                    "Both will have the same width"
                };
                let pool = choice_pool(
                    raw_options,
                    env,
                    &[
                        "Sample A",
                        "Sample B",
                        "Both will have the same width",
                        "Cannot be determined",
                    ],
                );
                let distractors = pool.into_iter().filter(|opt| opt != correct).collect();
                Ok(text_outcome(correct.to_string(), distractors, rng))
            }
            Mean { dataset_var } => {
                let data = env.numeric_list(dataset_var)?;
                if data.is_empty() {
                    return Err(AnswerError::Degenerate("dataset is empty"));
                }
                let correct = stats::mean(&data);
                let sum: f64 = data.iter().sum();
                env.insert("sum_of_values", Value::Float(sum));
                env.insert("count_of_values", Value::Int(data.len() as i64));

                let decimals = if is_int_list(env, dataset_var) && correct.fract() == 0.0 {
                    0
                } else {
                    2
                };
                let mut common = Vec::new();
                if data.len() > 1 {
                    // dividing by n-1 is the classic slip
                    common.push(sum / (data.len() - 1) as f64);
                }
                Ok(numeric_outcome(
                    correct,
                    common,
                    DistractorProfile::with_decimals(decimals),
                    rng,
                ))
            }
            MedianSorted { dataset_var } => {
                let mut data = env.numeric_list(dataset_var)?;
                if data.is_empty() {
                    return Err(AnswerError::Degenerate("dataset is empty"));
                }
                data.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let n = data.len();
                let correct = if n % 2 == 1 {
                    data[n / 2]
                } else {
                    (data[n / 2 - 1] + data[n / 2]) / 2.0
                };
                let decimals = if correct.fract() == 0.0 { 0 } else { 1 };
                let mut common = Vec::new();
                if n > 1 {
                    common.push(data[(n / 2).saturating_sub(1)]);
                }
                if n > 2 {
                    common.push(data[(n / 2 + 1).min(n - 1)]);
                }
                Ok(numeric_outcome(
                    correct,
                    common,
                    DistractorProfile::with_decimals(decimals),
                    rng,
                ))
            }
            Mode { dataset_var } => compute_mode(env, dataset_var, rng),
            Range { dataset_var } => {
                let data = env.numeric_list(dataset_var)?;
                if data.is_empty() {
                    return Err(AnswerError::Degenerate("dataset is empty"));
                }
                let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                env.insert("min_val_range", Value::Float(min));
                env.insert("max_val_range", Value::Float(max));
                let correct = max - min;
                let decimals = if is_int_list(env, dataset_var) { 0 } else { 2 };
                Ok(numeric_outcome(
                    correct,
                    vec![max, min],
                    DistractorProfile::with_decimals(decimals),
                    rng,
                ))
            }
            Iqr { q1_var, q3_var } => {
                let q1 = env.float(q1_var)?;
                let q3 = env.float(q3_var)?;
                let correct = q3 - q1;
                Ok(numeric_outcome(
                    correct,
                    vec![q1 + q3, q1, q3],
                    profile(0.5, 1.0, 0),
                    rng,
                ))
            }
            SampleVariance { dataset_var } => {
                let data = env.numeric_list(dataset_var)?;
                let Some(correct) = stats::sample_variance(&data) else {
                    return Err(AnswerError::Degenerate(
                        "sample variance needs at least two data points",
                    ));
                };
                let n = data.len();
                let mean = stats::mean(&data);
                let sum_sq: f64 = data.iter().map(|x| (x - mean).powi(2)).sum();
                env.insert("sample_mean_calc", Value::Float(round3(mean)));
                env.insert("sum_sq_dev_calc", Value::Float(round3(sum_sq)));
                env.insert("n_minus_1", Value::Int((n - 1) as i64));
                Ok(numeric_outcome(
                    correct,
                    vec![sum_sq / n as f64, correct.sqrt()],
                    DistractorProfile::with_decimals(3),
                    rng,
                ))
            }
            StdDevFromVariance { variance_var } => {
                let variance = env.float(variance_var)?;
                if variance < 0.0 {
                    return Err(AnswerError::Degenerate("variance must be non-negative"));
                }
                let correct = variance.sqrt();
                Ok(numeric_outcome(
                    correct,
                    vec![variance, correct * correct / 2.0],
                    profile(0.5, 0.1, 2),
                    rng,
                ))
            }
            RelativeFrequency {
                frequency_var,
                total_var,
            } => {
                let frequency = env.float(frequency_var)?;
                let total = env.float(total_var)?;
                if total == 0.0 {
                    return Err(AnswerError::Degenerate("total observations is zero"));
                }
                let correct = frequency / total;
                let mut common = vec![frequency];
                if frequency != 0.0 {
                    common.insert(0, total / frequency);
                }
                Ok(numeric_outcome(correct, common, profile(0.5, 0.01, 3), rng))
            }
            MissingValueForMean {
                known_var,
                target_mean_var,
            } => {
                let known = env.numeric_list(known_var)?;
                if known.is_empty() {
                    return Err(AnswerError::Degenerate("no known values provided"));
                }
                let target_mean = env.float(target_mean_var)?;
                let total_count = known.len() + 1;
                let sum_known: f64 = known.iter().sum();
                env.insert("sum_known_values", Value::Float(sum_known));
                let correct = target_mean * total_count as f64 - sum_known;

                let is_int = is_int_list(env, known_var) && target_mean.fract() == 0.0;
                let decimals = if is_int { 0 } else { 2 };
                let common = vec![
                    target_mean * known.len() as f64 - sum_known,
                    target_mean - sum_known / known.len() as f64,
                ];
                Ok(numeric_outcome(
                    correct,
                    common,
                    DistractorProfile::with_decimals(decimals),
                    rng,
                ))
            }
            KthPercentile { dataset_var, k_var } => {
                let data = env.numeric_list(dataset_var)?;
                let k = env.int(k_var)?;
                if data.is_empty() {
                    return Err(AnswerError::Degenerate("dataset is empty"));
                }
                if !(0 < k && k < 100) {
                    return Err(AnswerError::Degenerate("percentile must be in (0, 100)"));
                }
                let n = data.len();
                let rank = (k as f64 / 100.0) * (n - 1) as f64;
                let correct = if rank.fract() == 0.0 {
                    let idx = rank as usize;
                    if idx >= 1 {
                        (data[idx - 1] + data[idx]) / 2.0
                    } else {
                        data[0]
                    }
                } else {
                    let idx = (rank.ceil() as usize).saturating_sub(1).min(n - 1);
                    data[idx]
                };
                let decimals = if is_int_list(env, dataset_var) && correct.fract() == 0.0 {
                    0
                } else {
                    1
                };
                let mut common = Vec::new();
                let naive_idx = (((k as f64 / 100.0) * n as f64).round() as usize)
                    .saturating_sub(1)
                    .min(n - 1);
                if data[naive_idx] != correct {
                    common.push(data[naive_idx]);
                }
                if k == 50 {
                    common.push(stats::mean(&data));
                }
                Ok(numeric_outcome(
                    correct,
                    common,
                    DistractorProfile::with_decimals(decimals),
                    rng,
                ))
            }
            WeightedMean {
                value1_var,
                weight1_var,
                value2_var,
                weight2_var,
            } => {
                let v1 = env.float(value1_var)?;
                let w1 = env.float(weight1_var)?;
                let v2 = env.float(value2_var)?;
                let w2 = env.float(weight2_var)?;
                let correct = v1 * w1 + v2 * w2;
                Ok(numeric_outcome(
                    correct,
                    vec![(v1 + v2) / 2.0],
                    DistractorProfile::with_decimals(2),
                    rng,
                ))
            }
            MeanScaleEffect {
                mean_var,
                multiplier_var,
            } => {
                let mean = env.float(mean_var)?;
                let multiplier = env.float(multiplier_var)?;
                let correct = mean * multiplier;
                let decimals = if correct.fract() == 0.0 { 0 } else { 1 };
                let mut common = vec![mean + multiplier];
                if multiplier != 0.0 {
                    common.push(mean / multiplier);
                }
                Ok(numeric_outcome(
                    correct,
                    common,
                    DistractorProfile::with_decimals(decimals),
                    rng,
                ))
            }
            MeanShiftEffect { mean_var, addend_var } => {
                let mean = env.float(mean_var)?;
                let addend = env.float(addend_var)?;
                let correct = mean + addend;
                let decimals = if correct.fract() == 0.0 { 0 } else { 1 };
                Ok(numeric_outcome(
                    correct,
                    vec![mean * addend, (mean - addend).abs()],
                    DistractorProfile::with_decimals(decimals),
                    rng,
                ))
            }
            MeanSum {
                mean1_var,
                mean2_var,
            } => {
                let m1 = env.float(mean1_var)?;
                let m2 = env.float(mean2_var)?;
                let correct = m1 + m2;
                let decimals = if correct.fract() == 0.0 { 0 } else { 1 };
                Ok(numeric_outcome(
                    correct,
                    vec![m1 * m2, (m1 - m2).abs()],
                    DistractorProfile::with_decimals(decimals),
                    rng,
                ))
            }
            ZScore {
                x_var,
                mean_var,
                std_dev_var,
            } => {
                let x = env.float(x_var)?;
                let mean = env.float(mean_var)?;
                let sd = env.float(std_dev_var)?;
                if sd == 0.0 {
                    return Err(AnswerError::Degenerate("standard deviation is zero"));
                }
                let correct = (x - mean) / sd;
                Ok(numeric_outcome(
                    correct,
                    vec![(mean - x) / sd, (x - mean) * sd],
                    profile(0.5, 0.1, 2),
                    rng,
                ))
            }
            XFromZ {
                mean_var,
                std_dev_var,
                z_var,
            } => {
                let mean = env.float(mean_var)?;
                let sd = env.float(std_dev_var)?;
                let z = env.float(z_var)?;
                let correct = mean + z * sd;
                let decimals = if correct.fract() == 0.0 { 0 } else { 2 };
                let mut common = vec![mean - z * sd];
                if sd != 0.0 {
                    common.push(z);
                }
                Ok(numeric_outcome(
                    correct,
                    common,
                    DistractorProfile::with_decimals(decimals),
                    rng,
                ))
            }
            StandardErrorMean {
                variance_var,
                size_var,
            } => {
                let variance = env.float(variance_var)?;
                let n = env.int(size_var)?;
                if n <= 0 {
                    return Err(AnswerError::Degenerate("sample size must be positive"));
                }
                let correct = (variance / n as f64).sqrt();
                Ok(numeric_outcome(
                    correct,
                    vec![variance / n as f64, variance.sqrt() / n as f64],
                    profile(0.5, 0.1, 3),
                    rng,
                ))
            }
            MarginOfError {
                z_var,
                std_dev_var,
                size_var,
            } => {
                let z = env.float(z_var)?;
                let sd = env.float(std_dev_var)?;
                let n = env.int(size_var)?;
                if n <= 0 {
                    return Err(AnswerError::Degenerate("sample size must be positive"));
                }
                let correct = z * sd / (n as f64).sqrt();
                Ok(numeric_outcome(
                    correct,
                    Vec::new(),
                    DistractorProfile::with_decimals(2),
                    rng,
                ))
            }
            CiMeanKnownSigma {
                mean_var,
                std_dev_var,
                size_var,
                z_value,
            } => {
                let mean = env.float(mean_var)?;
                let sd = env.float(std_dev_var)?;
                let n = env.int(size_var)?;
                if n <= 0 {
                    return Err(AnswerError::Degenerate("sample size must be positive"));
                }
                let z = z_value.unwrap_or(1.96);
                let margin = z * sd / (n as f64).sqrt();
                let lower = mean - margin;
                let upper = mean + margin;
                env.insert("ci_lower_calc", Value::Float(round3(lower)));
                env.insert("ci_upper_calc", Value::Float(round3(upper)));
                let correct = interval_text(lower, upper);

                // Shifted centers keep the interval width believable.
                let centers =
                    numeric_distractors(mean, 3, DistractorProfile::with_decimals(2), rng);
                let distractors = centers
                    .into_iter()
                    .map(|c| interval_text(c - margin, c + margin))
                    .collect();
                Ok(text_outcome(correct, distractors, rng))
            }
            CiProportion {
                successes_var,
                size_var,
                z_var,
            } => {
                let successes = env.float(successes_var)?;
                let n = env.int(size_var)?;
                let z = env.float(z_var)?;
                if n <= 0 {
                    return Err(AnswerError::Degenerate("sample size must be positive"));
                }
                let p_hat = successes / n as f64;
                env.insert("p_hat_calc", Value::Float((p_hat * 1e4).round() / 1e4));
                let se = (p_hat * (1.0 - p_hat) / n as f64).sqrt();
                let margin = z * se;
                let lower = p_hat - margin;
                let upper = p_hat + margin;
                env.insert("correct_lower_bound", Value::Float(round3(lower)));
                env.insert("correct_upper_bound", Value::Float(round3(upper)));
                let correct = interval_text(lower, upper);

                let mut distractors = vec![
                    // z forgotten entirely
                    interval_text(p_hat - se, p_hat + se),
                    // square root dropped from the standard error
                    {
                        let bad_margin = z * (p_hat * (1.0 - p_hat) / n as f64);
                        interval_text(p_hat - bad_margin, p_hat + bad_margin)
                    },
                ];
                let shift = rng.gen_range(0.02..0.05);
                distractors.push(interval_text(lower + shift, upper + shift));
                Ok(text_outcome(correct, distractors, rng))
            }
            PointEstimateProportion {
                successes_var,
                size_var,
            } => {
                let successes = env.float(successes_var)?;
                let n = env.int(size_var)?;
                if n <= 0 {
                    return Err(AnswerError::Degenerate("sample size must be positive"));
                }
                let correct = successes / n as f64;
                let common = vec![
                    successes / (n + 1) as f64,
                    (successes + 1.0) / n as f64,
                ];
                Ok(numeric_outcome(correct, common, profile(0.3, 0.01, 3), rng))
            }
            FindMeanFromCi {
                lower_var,
                upper_var,
            } => {
                let lower = env.float(lower_var)?;
                let upper = env.float(upper_var)?;
                let correct = (lower + upper) / 2.0;
                env.insert("estimated_mean_from_ci", Value::Float(round3(correct)));
                Ok(numeric_outcome(
                    correct,
                    Vec::new(),
                    DistractorProfile::with_decimals(1),
                    rng,
                ))
            }
            BinomialProbability {
                trials_var,
                successes_var,
                p_var,
            } => {
                let n = non_negative(env.int(trials_var)?)?;
                let k = non_negative(env.int(successes_var)?)?;
                let p = env.float(p_var)?;
                if k > n || !(0.0..=1.0).contains(&p) {
                    return Err(AnswerError::Degenerate("invalid binomial parameters"));
                }
                let correct = stats::binomial_pmf(k, n, p);
                let mut common = Vec::new();
                if k > 0 {
                    common.push(stats::binomial_pmf(k - 1, n, p));
                }
                if n > 0 {
                    common.push(k as f64 / n as f64);
                }
                Ok(numeric_outcome(correct, common, profile(0.8, 0.001, 4), rng))
            }
            BinomialCumulativeLe {
                trials_var,
                max_var,
                p_var,
            } => {
                let n = non_negative(env.int(trials_var)?)?;
                let k = non_negative(env.int(max_var)?)?;
                let p = env.float(p_var)?;
                if k > n || !(0.0..=1.0).contains(&p) {
                    return Err(AnswerError::Degenerate("invalid binomial parameters"));
                }
                let correct = stats::binomial_cdf(k, n, p);
                let mut common = vec![stats::binomial_pmf(k, n, p)];
                if k < n {
                    common.push(1.0 - correct);
                }
                Ok(numeric_outcome(correct, common, profile(0.5, 0.01, 4), rng))
            }
            BinomialAtLeastOne { trials_var, p_var } => {
                let n = non_negative(env.int(trials_var)?)?;
                let p = env.float(p_var)?;
                if n == 0 || !(0.0..=1.0).contains(&p) {
                    return Err(AnswerError::Degenerate("invalid binomial parameters"));
                }
                let prob_zero = stats::binomial_pmf(0, n, p);
                let correct = 1.0 - prob_zero;
                env.insert("prob_zero_successes", Value::Float((prob_zero * 1e4).round() / 1e4));
                let common = vec![prob_zero, stats::binomial_pmf(1, n, p)];
                Ok(numeric_outcome(correct, common, profile(0.4, 0.01, 4), rng))
            }
            BinomialMean { trials_var, p_var } => {
                let n = env.float(trials_var)?;
                let p = env.float(p_var)?;
                let correct = n * p;
                let common = vec![n * p * (1.0 - p), n * (1.0 - p)];
                Ok(numeric_outcome(
                    correct,
                    common,
                    DistractorProfile::with_decimals(2),
                    rng,
                ))
            }
            BinomialVariance { trials_var, p_var } => {
                let n = env.float(trials_var)?;
                let p = env.float(p_var)?;
                if n <= 0.0 || !(0.0..=1.0).contains(&p) {
                    return Err(AnswerError::Degenerate("invalid binomial parameters"));
                }
                let correct = n * p * (1.0 - p);
                let common = vec![n * p, correct.max(0.0).sqrt()];
                Ok(numeric_outcome(
                    correct,
                    common,
                    DistractorProfile::with_decimals(3),
                    rng,
                ))
            }
            PoissonProbability { lambda_var, k_var } => {
                let lambda = env.float(lambda_var)?;
                let k = non_negative(env.int(k_var)?)?;
                if lambda <= 0.0 {
                    return Err(AnswerError::Degenerate("lambda must be positive"));
                }
                let correct = stats::poisson_pmf(k, lambda);
                let mut common = Vec::new();
                if k > 0 {
                    common.push(stats::poisson_pmf(k - 1, lambda));
                }
                let cumulative: f64 = (0..=k).map(|i| stats::poisson_pmf(i, lambda)).sum();
                common.push(cumulative);
                Ok(numeric_outcome(correct, common, profile(0.8, 0.0001, 4), rng))
            }
            NormalApproxPoissonGt { lambda_var, k_var } => {
                let lambda = env.float(lambda_var)?;
                let k = env.float(k_var)?;
                if lambda <= 0.0 {
                    return Err(AnswerError::Degenerate("lambda must be positive"));
                }
                let sigma = lambda.sqrt();
                // continuity correction: P(X > k) ~ P(Z > (k + 0.5 - mu) / sigma)
                let z = (k + 0.5 - lambda) / sigma;
                let correct = 1.0 - stats::normal_cdf(z);
                env.insert("z_score_calc", Value::Float(round3(z)));
                let z_no_correction = (k - lambda) / sigma;
                let common = vec![
                    stats::normal_cdf(z),
                    1.0 - stats::normal_cdf(z_no_correction),
                ];
                Ok(numeric_outcome(correct, common, profile(0.6, 0.001, 4), rng))
            }
            CovarianceFromCorrelation {
                var_x_var,
                var_y_var,
                corr_var,
            } => {
                let var_x = env.float(var_x_var)?;
                let var_y = env.float(var_y_var)?;
                let corr = env.float(corr_var)?;
                if var_x < 0.0 || var_y < 0.0 {
                    return Err(AnswerError::Degenerate("variance must be non-negative"));
                }
                let correct = corr * var_x.sqrt() * var_y.sqrt();
                Ok(numeric_outcome(
                    correct,
                    vec![corr * var_x * var_y],
                    DistractorProfile::with_decimals(2),
                    rng,
                ))
            }
            CorrelationFromCovariance {
                cov_var,
                var_x_var,
                var_y_var,
            } => {
                let cov = env.float(cov_var)?;
                let var_x = env.float(var_x_var)?;
                let var_y = env.float(var_y_var)?;
                if var_x <= 0.0 || var_y <= 0.0 {
                    return Err(AnswerError::Degenerate("variances must be positive"));
                }
                let sd_x = var_x.sqrt();
                let sd_y = var_y.sqrt();
                let correct = (cov / (sd_x * sd_y)).clamp(-1.0, 1.0);
                let common = vec![cov / (var_x * var_y), cov * sd_x * sd_y];
                Ok(numeric_outcome(correct, common, profile(0.4, 0.05, 2), rng))
            }
            ExpectedValueProductIndependent { ex_var, ey_var } => {
                let ex = env.float(ex_var)?;
                let ey = env.float(ey_var)?;
                let correct = ex * ey;
                let decimals = if correct.fract() == 0.0 { 0 } else { 1 };
                Ok(numeric_outcome(
                    correct,
                    vec![ex + ey, ex - ey],
                    DistractorProfile::with_decimals(decimals),
                    rng,
                ))
            }
            VarianceSumIndependent {
                var_x_var,
                var_y_var,
            } => {
                let correct = env.float(var_x_var)? + env.float(var_y_var)?;
                Ok(numeric_outcome(
                    correct,
                    Vec::new(),
                    DistractorProfile::with_decimals(0),
                    rng,
                ))
            }
            VarianceLinearCombination {
                weight1_var,
                weight2_var,
                var_a_var,
                var_b_var,
                cov_var,
            } => {
                let w1 = env.float(weight1_var)?;
                let w2 = env.float(weight2_var)?;
                let var_a = env.float(var_a_var)?;
                let var_b = env.float(var_b_var)?;
                let cov = env.float(cov_var)?;
                let correct = w1 * w1 * var_a + w2 * w2 * var_b + 2.0 * w1 * w2 * cov;
                let common = vec![
                    // the factor of two on the covariance term is the usual slip
                    w1 * w1 * var_a + w2 * w2 * var_b + w1 * w2 * cov,
                    w1 * var_a + w2 * var_b,
                ];
                Ok(numeric_outcome(
                    correct,
                    common,
                    DistractorProfile::with_decimals(4),
                    rng,
                ))
            }
            TestStatisticOneMean {
                mean_var,
                mu0_var,
                std_dev_var,
                size_var,
            } => {
                let mean = env.float(mean_var)?;
                let mu0 = env.float(mu0_var)?;
                let sd = env.float(std_dev_var)?;
                let n = env.int(size_var)?;
                if n <= 0 || sd <= 0.0 {
                    return Err(AnswerError::Degenerate(
                        "sample size and standard deviation must be positive",
                    ));
                }
                let se = sd / (n as f64).sqrt();
                let correct = (mean - mu0) / se;
                env.insert("se_val", Value::Float(round3(se)));
                env.insert("test_stat_val", Value::Float(round3(correct)));
                Ok(numeric_outcome(
                    correct,
                    Vec::new(),
                    DistractorProfile::with_decimals(2),
                    rng,
                ))
            }
            TestStatisticTwoMeans {
                mean1_var,
                mean2_var,
                var1_var,
                var2_var,
                n1_var,
                n2_var,
            } => {
                let m1 = env.float(mean1_var)?;
                let m2 = env.float(mean2_var)?;
                let v1 = env.float(var1_var)?;
                let v2 = env.float(var2_var)?;
                let n1 = env.int(n1_var)?;
                let n2 = env.int(n2_var)?;
                if n1 <= 0 || n2 <= 0 {
                    return Err(AnswerError::Degenerate("sample sizes must be positive"));
                }
                let se = (v1 / n1 as f64 + v2 / n2 as f64).sqrt();
                if se == 0.0 {
                    return Err(AnswerError::Degenerate("standard error is zero"));
                }
                let correct = (m1 - m2) / se;
                env.insert("se_val", Value::Float(round3(se)));
                env.insert("t_stat_val", Value::Float(round3(correct)));
                Ok(numeric_outcome(
                    correct,
                    Vec::new(),
                    DistractorProfile::with_decimals(2),
                    rng,
                ))
            }
            TwoTailedPValueFromZ { z_var } => {
                let z = env.float(z_var)?;
                let correct = 2.0 * (1.0 - stats::normal_cdf(z.abs()));
                Ok(numeric_outcome(
                    correct,
                    Vec::new(),
                    DistractorProfile::with_decimals(3),
                    rng,
                ))
            }
            SampleSizeTwoMeans {
                effect_var,
                std_dev_var,
                alpha_var,
                power_var,
            } => {
                let effect = env.float(effect_var)?;
                let sd = env.float(std_dev_var)?;
                let alpha = env.float(alpha_var)?;
                let power = env.float(power_var)?;
                if effect == 0.0 {
                    return Err(AnswerError::Degenerate("effect size is zero"));
                }
                if alpha <= 0.0 || alpha >= 1.0 || power <= 0.0 || power >= 1.0 {
                    return Err(AnswerError::Degenerate("alpha and power must be in (0, 1)"));
                }
                let z_alpha_half = stats::normal_ppf(1.0 - alpha / 2.0);
                let z_beta = stats::normal_ppf(power);
                env.insert("z_alpha_half_val", Value::Float(round3(z_alpha_half)));
                env.insert("z_beta_val", Value::Float(round3(z_beta)));

                let n = 2.0 * ((z_alpha_half + z_beta) * sd / effect).powi(2);
                let correct = n.ceil();

                let z_alpha_one_sided = stats::normal_ppf(1.0 - alpha);
                let common = vec![
                    (2.0 * ((z_alpha_one_sided + z_beta) * sd / effect).powi(2)).ceil(),
                    (((z_alpha_half + z_beta) * sd / effect).powi(2)).ceil(),
                ];
                Ok(numeric_outcome(
                    correct,
                    common,
                    DistractorProfile::with_decimals(0),
                    rng,
                ))
            }
            SampleSizeProportionNoPrior { margin_var, z_var } => {
                let margin = env.float(margin_var)?;
                let z = env.float(z_var)?;
                if margin <= 0.0 {
                    return Err(AnswerError::Degenerate("margin of error must be positive"));
                }
                // p = 0.5 maximizes variance when no prior estimate exists
                let correct = (z * z * 0.25 / (margin * margin)).ceil();
                Ok(numeric_outcome(
                    correct,
                    Vec::new(),
                    DistractorProfile::with_decimals(0),
                    rng,
                ))
            }
            Unknown => Err(AnswerError::UnknownKind),
        }
    }
}

fn rendered_options(raw_options: &[String], env: &Environment) -> Vec<String> {
    raw_options.iter().map(|opt| render_text(opt, env)).collect()
}

/// Authored options when present, canned fallbacks otherwise.
fn choice_pool(raw_options: &[String], env: &Environment, canned: &[&str]) -> Vec<String> {
    if raw_options.is_empty() {
        canned.iter().map(|c| c.to_string()).collect()
    } else {
        rendered_options(raw_options, env)
    }
}

fn is_int_list(env: &Environment, name: &str) -> bool {
    env.get(name)
        .and_then(Value::as_list)
        .is_some_and(|items| items.iter().all(|v| matches!(v, Value::Int(_))))
}

fn non_negative(value: i64) -> Result<u64, AnswerError> {
    u64::try_from(value)
        .map_err(|_| AnswerError::Degenerate("count parameters must be non-negative"))
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn compute_mode<R: Rng>(
    env: &mut Environment,
    dataset_var: &str,
    rng: &mut R,
) -> Result<AnswerOutcome, AnswerError> {
    let data: Vec<i64> = env
        .numeric_list(dataset_var)?
        .iter()
        .map(|v| v.round() as i64)
        .collect();
    if data.is_empty() {
        return Err(AnswerError::Degenerate("dataset is empty"));
    }

    let mut counts: Vec<(i64, usize)> = Vec::new();
    for value in &data {
        match counts.iter_mut().find(|(v, _)| v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((*value, 1)),
        }
    }
    let max_freq = counts.iter().map(|(_, c)| *c).max().unwrap_or(0);

    if max_freq <= 1 {
        let mean = stats::mean(&data.iter().map(|v| *v as f64).collect::<Vec<_>>());
        let distractors = vec![
            data[rng.gen_range(0..data.len())].to_string(),
            format!("{:.1}", mean),
            "Multiple modes".to_string(),
        ];
        return Ok(text_outcome("No mode".to_string(), distractors, rng));
    }

    let modes: Vec<i64> = counts
        .iter()
        .filter(|(_, c)| *c == max_freq)
        .map(|(v, _)| *v)
        .collect();
    let mode = modes[0];
    env.insert("mode_frequency_val", Value::Int(max_freq as i64));
    env.insert("is_multimodal", Value::Text((modes.len() > 1).to_string()));

    let display = if modes.len() > 1 {
        format!("{mode} (one of multiple modes)")
    } else {
        mode.to_string()
    };

    let mut distractors = Vec::new();
    let non_modes: Vec<i64> = data
        .iter()
        .copied()
        .filter(|v| !modes.contains(v))
        .collect();
    if let Some(other) = non_modes.choose(rng) {
        distractors.push(other.to_string());
    }
    for d in numeric_distractors(
        mode as f64,
        3 - distractors.len().min(3),
        DistractorProfile::with_decimals(0),
        rng,
    ) {
        distractors.push(format!("{}", d.round() as i64));
    }

    let mut outcome = text_outcome(display, distractors, rng);
    outcome.correct = Value::Int(mode);
    Ok(outcome)
}

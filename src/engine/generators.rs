//! The closed catalog of variable generators templates may reference.
//!
//! Each variant carries its own parameter struct, so malformed parameters
//! are rejected while the catalog loads instead of surfacing mid-quiz.
//! Unrecognized kind tags deserialize to `Unknown` and resolve to a fault
//! sentinel, keeping one bad template from blocking the rest.

use crate::engine::stats;
use crate::engine::value::{Environment, Value, VarError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A generator invocation failed.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error(transparent)]
    Var(#[from] VarError),
    #[error("choice list is empty after exclusions")]
    EmptyChoices,
    #[error("invalid bounds: min {min} exceeds max {max}")]
    InvalidBounds { min: f64, max: f64 },
    #[error("step must be positive")]
    InvalidStep,
    #[error("index {index} out of bounds for {len} choices")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("variable '{0}' must be positive")]
    NonPositive(String),
    #[error("no case matched condition value and no default was given")]
    NoMatchingCase,
    #[error("generator kind is not recognized")]
    UnknownKind,
}

/// One branch of a `conditional_value` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionCase {
    pub when: Value,
    pub then: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Uniform integer in `[min, max]`.
    IntRange { min: i64, max: i64 },
    /// Uniform integer in `[min, max]` restricted to multiples of `step`.
    IntRangeStep { min: i64, max: i64, step: i64 },
    /// Uniform integer bounded above by another variable.
    IntRangeUpTo {
        max_var: String,
        #[serde(default)]
        min: i64,
        #[serde(default)]
        max_offset: i64,
    },
    /// Uniform float in `[min, max)`, rounded.
    FloatRange {
        min: f64,
        max: f64,
        decimals: Option<u8>,
    },
    /// Another variable plus a uniform float offset.
    FloatAbove {
        base_var: String,
        min_add: f64,
        max_add: f64,
        decimals: Option<u8>,
    },
    Fixed { value: Value },
    /// Copies another variable verbatim.
    Identity { source_var: String },
    Choice { choices: Vec<Value> },
    /// Picks a choice that differs from an already-resolved variable.
    ChoiceExcluding {
        choices: Vec<Value>,
        exclude_var: String,
    },
    /// Selects text by the integer value of another variable.
    IndexedText {
        index_var: String,
        choices: Vec<String>,
    },
    /// Maps a condition variable onto per-case values.
    ConditionalValue {
        condition_var: String,
        cases: Vec<ConditionCase>,
        #[serde(default)]
        default: Option<Value>,
    },
    Sum { terms: Vec<String> },
    Product {
        factors: Vec<String>,
        decimals: Option<u8>,
    },
    Difference {
        minuend: String,
        subtrahend: String,
        decimals: Option<u8>,
    },
    SubtractFromConstant {
        constant: f64,
        source_var: String,
        decimals: Option<u8>,
    },
    Square {
        source_var: String,
        decimals: Option<u8>,
    },
    OneMinus {
        source_var: String,
        decimals: Option<u8>,
    },
    AbsValue { source_var: String },
    PercentToDecimal { source_var: String },
    DecimalToPercent { source_var: String },
    /// A random perfect square, handy for clean standard deviations.
    PerfectSquare { min_base: i64, max_base: i64 },
    IntArray { size: usize, min: i64, max: i64 },
    SortedIntArray { size: usize, min: i64, max: i64 },
    /// An array with a guaranteed single most-frequent value.
    ArrayWithMode {
        size: usize,
        min: i64,
        max: i64,
        #[serde(default)]
        mode_var: Option<String>,
        #[serde(default)]
        min_frequency: Option<usize>,
    },
    SortArray { source_var: String },
    ShuffleArray { source_var: String },
    /// Joins a list into comma-separated display text.
    JoinArray { source_var: String },
    Pluralize { source_var: String },
    Singularize { source_var: String },
    /// Critical z-value for a confidence level variable.
    ZForConfidence { confidence_var: String },
    /// x = mean + z * sd.
    XFromZ {
        mean_var: String,
        std_dev_var: String,
        z_var: String,
        decimals: Option<u8>,
    },
    /// Mean of known values plus one missing value.
    MeanWithMissing {
        known_var: String,
        missing_var: String,
    },
    /// Back-solves a sample mean that produces a target test statistic.
    MeanForTargetStatistic {
        mu0_var: String,
        std_dev_var: String,
        size_var: String,
        target: Box<GeneratorKind>,
        decimals: Option<u8>,
    },
    /// A p-value placed on the requested side of alpha.
    PValueNearAlpha {
        alpha_var: String,
        scenario_var: String,
    },
    /// Success count implied by a sample size and proportion.
    SuccessesFromProportion {
        size_var: String,
        proportion_var: String,
    },
    /// Sampling interval k = N / n for systematic sampling.
    SystematicInterval {
        population_var: String,
        sample_var: String,
    },
    /// A null-hypothesis mean inside or outside a confidence interval.
    MuNullForCi {
        scenario_var: String,
        lower_var: String,
        upper_var: String,
        center_var: String,
    },
    #[serde(other)]
    Unknown,
}

fn round_to(value: f64, decimals: u8) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

fn is_int(env: &Environment, name: &str) -> bool {
    matches!(env.get(name), Some(Value::Int(_)))
}

impl GeneratorKind {
    pub const fn is_unknown(&self) -> bool {
        matches!(self, GeneratorKind::Unknown)
    }

    /// Names of variables that must resolve before this generator can run.
    pub fn dependencies(&self) -> Vec<&str> {
        use GeneratorKind::*;
        match self {
            IntRange { .. }
            | IntRangeStep { .. }
            | FloatRange { .. }
            | Fixed { .. }
            | Choice { .. }
            | PerfectSquare { .. }
            | IntArray { .. }
            | SortedIntArray { .. }
            | Unknown => Vec::new(),
            IntRangeUpTo { max_var, .. } => vec![max_var],
            FloatAbove { base_var, .. } => vec![base_var],
            Identity { source_var }
            | Square { source_var, .. }
            | OneMinus { source_var, .. }
            | AbsValue { source_var }
            | PercentToDecimal { source_var }
            | DecimalToPercent { source_var }
            | SubtractFromConstant { source_var, .. }
            | SortArray { source_var }
            | ShuffleArray { source_var }
            | JoinArray { source_var }
            | Pluralize { source_var }
            | Singularize { source_var } => vec![source_var],
            ChoiceExcluding { exclude_var, .. } => vec![exclude_var],
            IndexedText { index_var, .. } => vec![index_var],
            ConditionalValue { condition_var, .. } => vec![condition_var],
            Sum { terms } => terms.iter().map(String::as_str).collect(),
            Product { factors, .. } => factors.iter().map(String::as_str).collect(),
            Difference {
                minuend,
                subtrahend,
                ..
            } => vec![minuend, subtrahend],
            ArrayWithMode { mode_var, .. } => {
                mode_var.iter().map(String::as_str).collect()
            }
            ZForConfidence { confidence_var } => vec![confidence_var],
            XFromZ {
                mean_var,
                std_dev_var,
                z_var,
                ..
            } => vec![mean_var, std_dev_var, z_var],
            MeanWithMissing {
                known_var,
                missing_var,
            } => vec![known_var, missing_var],
            MeanForTargetStatistic {
                mu0_var,
                std_dev_var,
                size_var,
                target,
                ..
            } => {
                let mut deps = vec![mu0_var.as_str(), std_dev_var.as_str(), size_var.as_str()];
                deps.extend(target.dependencies());
                deps
            }
            PValueNearAlpha {
                alpha_var,
                scenario_var,
            } => vec![alpha_var, scenario_var],
            SuccessesFromProportion {
                size_var,
                proportion_var,
            } => vec![size_var, proportion_var],
            SystematicInterval {
                population_var,
                sample_var,
            } => vec![population_var, sample_var],
            MuNullForCi {
                scenario_var,
                lower_var,
                upper_var,
                center_var,
            } => vec![scenario_var, lower_var, upper_var, center_var],
        }
    }

    /// Produces one value from already-resolved variables.
    pub fn run<R: Rng>(&self, env: &Environment, rng: &mut R) -> Result<Value, GenError> {
        use GeneratorKind::*;
        match self {
            IntRange { min, max } => {
                if min > max {
                    return Err(GenError::InvalidBounds {
                        min: *min as f64,
                        max: *max as f64,
                    });
                }
                Ok(Value::Int(rng.gen_range(*min..=*max)))
            }
            IntRangeStep { min, max, step } => {
                if *step <= 0 {
                    return Err(GenError::InvalidStep);
                }
                if min > max {
                    return Err(GenError::InvalidBounds {
                        min: *min as f64,
                        max: *max as f64,
                    });
                }
                let steps = (max - min) / step;
                Ok(Value::Int(min + step * rng.gen_range(0..=steps)))
            }
            IntRangeUpTo {
                max_var,
                min,
                max_offset,
            } => {
                let max = env.int(max_var)? + max_offset;
                if *min > max {
                    return Ok(Value::Int(*min));
                }
                Ok(Value::Int(rng.gen_range(*min..=max)))
            }
            FloatRange { min, max, decimals } => {
                if min > max {
                    return Err(GenError::InvalidBounds {
                        min: *min,
                        max: *max,
                    });
                }
                let value = if min == max {
                    *min
                } else {
                    rng.gen_range(*min..*max)
                };
                Ok(Value::Float(round_to(value, decimals.unwrap_or(2))))
            }
            FloatAbove {
                base_var,
                min_add,
                max_add,
                decimals,
            } => {
                if min_add > max_add {
                    return Err(GenError::InvalidBounds {
                        min: *min_add,
                        max: *max_add,
                    });
                }
                let base = env.float(base_var)?;
                let offset = if min_add == max_add {
                    *min_add
                } else {
                    rng.gen_range(*min_add..*max_add)
                };
                Ok(Value::Float(round_to(base + offset, decimals.unwrap_or(2))))
            }
            Fixed { value } => Ok(value.clone()),
            Identity { source_var } => Ok(env
                .get(source_var)
                .cloned()
                .ok_or_else(|| VarError::Missing(source_var.clone()))?),
            Choice { choices } => choices
                .choose(rng)
                .cloned()
                .ok_or(GenError::EmptyChoices),
            ChoiceExcluding {
                choices,
                exclude_var,
            } => {
                let excluded = env
                    .get(exclude_var)
                    .ok_or_else(|| VarError::Missing(exclude_var.clone()))?;
                let eligible: Vec<&Value> =
                    choices.iter().filter(|c| *c != excluded).collect();
                eligible
                    .choose(rng)
                    .map(|v| (*v).clone())
                    .ok_or(GenError::EmptyChoices)
            }
            IndexedText { index_var, choices } => {
                let index = env.int(index_var)?;
                let slot = usize::try_from(index).ok().and_then(|i| choices.get(i));
                slot.map(|text| Value::Text(text.clone()))
                    .ok_or(GenError::IndexOutOfBounds {
                        index,
                        len: choices.len(),
                    })
            }
            ConditionalValue {
                condition_var,
                cases,
                default,
            } => {
                let actual = env
                    .get(condition_var)
                    .ok_or_else(|| VarError::Missing(condition_var.clone()))?;
                for case in cases {
                    if case.when == *actual {
                        return Ok(case.then.clone());
                    }
                }
                default.clone().ok_or(GenError::NoMatchingCase)
            }
            Sum { terms } => {
                let mut total = 0.0;
                for term in terms {
                    total += env.float(term)?;
                }
                if terms.iter().all(|t| is_int(env, t)) {
                    Ok(Value::Int(total as i64))
                } else {
                    Ok(Value::Float(total))
                }
            }
            Product { factors, decimals } => {
                let mut product = 1.0;
                for factor in factors {
                    product *= env.float(factor)?;
                }
                if factors.iter().all(|f| is_int(env, f)) && decimals.is_none() {
                    Ok(Value::Int(product as i64))
                } else {
                    Ok(Value::Float(round_to(product, decimals.unwrap_or(4))))
                }
            }
            Difference {
                minuend,
                subtrahend,
                decimals,
            } => {
                let value = env.float(minuend)? - env.float(subtrahend)?;
                if is_int(env, minuend) && is_int(env, subtrahend) && decimals.is_none() {
                    Ok(Value::Int(value as i64))
                } else {
                    Ok(Value::Float(round_to(value, decimals.unwrap_or(2))))
                }
            }
            SubtractFromConstant {
                constant,
                source_var,
                decimals,
            } => {
                let value = constant - env.float(source_var)?;
                Ok(Value::Float(round_to(value, decimals.unwrap_or(2))))
            }
            Square {
                source_var,
                decimals,
            } => {
                let base = env.float(source_var)?;
                if is_int(env, source_var) && decimals.is_none() {
                    Ok(Value::Int((base * base) as i64))
                } else {
                    Ok(Value::Float(round_to(base * base, decimals.unwrap_or(4))))
                }
            }
            OneMinus {
                source_var,
                decimals,
            } => {
                let value = 1.0 - env.float(source_var)?;
                Ok(Value::Float(round_to(value, decimals.unwrap_or(4))))
            }
            AbsValue { source_var } => {
                let value = env.float(source_var)?;
                if is_int(env, source_var) {
                    Ok(Value::Int(value.abs() as i64))
                } else {
                    Ok(Value::Float(value.abs()))
                }
            }
            PercentToDecimal { source_var } => {
                Ok(Value::Float(env.float(source_var)? / 100.0))
            }
            DecimalToPercent { source_var } => {
                Ok(Value::Float(env.float(source_var)? * 100.0))
            }
            PerfectSquare { min_base, max_base } => {
                if min_base > max_base {
                    return Err(GenError::InvalidBounds {
                        min: *min_base as f64,
                        max: *max_base as f64,
                    });
                }
                let base = rng.gen_range(*min_base..=*max_base);
                Ok(Value::Int(base * base))
            }
            IntArray { size, min, max } => {
                Ok(Value::List(random_int_list(*size, *min, *max, rng)?))
            }
            SortedIntArray { size, min, max } => {
                let mut items = random_int_list(*size, *min, *max, rng)?;
                items.sort_by_key(|v| v.as_i64().unwrap_or(0));
                Ok(Value::List(items))
            }
            ArrayWithMode {
                size,
                min,
                max,
                mode_var,
                min_frequency,
            } => build_array_with_mode(env, rng, *size, *min, *max, mode_var, *min_frequency),
            SortArray { source_var } => {
                let mut items = env.list(source_var)?.to_vec();
                items.sort_by(|a, b| {
                    a.as_f64()
                        .partial_cmp(&b.as_f64())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                Ok(Value::List(items))
            }
            ShuffleArray { source_var } => {
                let mut items = env.list(source_var)?.to_vec();
                items.shuffle(rng);
                Ok(Value::List(items))
            }
            JoinArray { source_var } => {
                let items = env.list(source_var)?;
                let joined = items
                    .iter()
                    .map(crate::engine::render::format_value)
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(Value::Text(joined))
            }
            Pluralize { source_var } => {
                Ok(Value::Text(pluralize(env.text(source_var)?)))
            }
            Singularize { source_var } => {
                Ok(Value::Text(singularize(env.text(source_var)?)))
            }
            ZForConfidence { confidence_var } => {
                let level = env.int(confidence_var)?;
                Ok(Value::Float(stats::z_for_confidence(level)))
            }
            XFromZ {
                mean_var,
                std_dev_var,
                z_var,
                decimals,
            } => {
                let x = env.float(mean_var)? + env.float(z_var)? * env.float(std_dev_var)?;
                if is_int(env, mean_var) && is_int(env, std_dev_var) && decimals.is_none() {
                    Ok(Value::Int(x.round() as i64))
                } else {
                    Ok(Value::Float(round_to(x, decimals.unwrap_or(2))))
                }
            }
            MeanWithMissing {
                known_var,
                missing_var,
            } => {
                let known = env.numeric_list(known_var)?;
                let missing = env.float(missing_var)?;
                let count = known.len() + 1;
                let total: f64 = known.iter().sum::<f64>() + missing;
                Ok(Value::Float(total / count as f64))
            }
            MeanForTargetStatistic {
                mu0_var,
                std_dev_var,
                size_var,
                target,
                decimals,
            } => {
                let mu0 = env.float(mu0_var)?;
                let sd = env.float(std_dev_var)?;
                let n = env.int(size_var)?;
                if n <= 0 {
                    return Err(GenError::NonPositive(size_var.clone()));
                }
                let statistic = target
                    .run(env, rng)?
                    .as_f64()
                    .ok_or(GenError::NoMatchingCase)?;
                let x_bar = mu0 + statistic * (sd / (n as f64).sqrt());
                Ok(Value::Float(round_to(x_bar, decimals.unwrap_or(2))))
            }
            PValueNearAlpha {
                alpha_var,
                scenario_var,
            } => {
                let alpha = env.float(alpha_var)?;
                if alpha <= 0.001 {
                    return Err(GenError::NonPositive(alpha_var.clone()));
                }
                let scenario = env.text(scenario_var)?;
                let p = if matches!(scenario, "less_than_alpha" | "significant") {
                    rng.gen_range(0.0001..alpha * 0.9)
                } else {
                    rng.gen_range(alpha * 1.1..alpha + 0.2)
                };
                Ok(Value::Float(round_to(p, 4)))
            }
            SuccessesFromProportion {
                size_var,
                proportion_var,
            } => {
                let size = env.float(size_var)?;
                let proportion = env.float(proportion_var)?;
                Ok(Value::Int((size * proportion).round() as i64))
            }
            SystematicInterval {
                population_var,
                sample_var,
            } => {
                let population = env.int(population_var)?;
                let sample = env.int(sample_var)?;
                if sample <= 0 {
                    return Err(GenError::NonPositive(sample_var.clone()));
                }
                let interval = ((population as f64) / (sample as f64)).round() as i64;
                Ok(Value::Int(interval.max(1)))
            }
            MuNullForCi {
                scenario_var,
                lower_var,
                upper_var,
                center_var,
            } => {
                let scenario = env.text(scenario_var)?;
                let lower = env.float(lower_var)?;
                let upper = env.float(upper_var)?;
                let center = env.float(center_var)?;
                let width = upper - lower;
                if width <= 0.0 {
                    return Err(GenError::InvalidBounds {
                        min: lower,
                        max: upper,
                    });
                }
                let mu = if scenario == "inside_ci" {
                    rng.gen_range(lower + 0.1 * width..upper - 0.1 * width)
                } else {
                    let sign = *[-1.0, 1.0].choose(rng).expect("non-empty");
                    center + sign * width
                };
                Ok(Value::Float(round_to(mu, 2)))
            }
            Unknown => Err(GenError::UnknownKind),
        }
    }
}

fn random_int_list<R: Rng>(
    size: usize,
    min: i64,
    max: i64,
    rng: &mut R,
) -> Result<Vec<Value>, GenError> {
    if min > max {
        return Err(GenError::InvalidBounds {
            min: min as f64,
            max: max as f64,
        });
    }
    Ok((0..size)
        .map(|_| Value::Int(rng.gen_range(min..=max)))
        .collect())
}

fn build_array_with_mode<R: Rng>(
    env: &Environment,
    rng: &mut R,
    size: usize,
    min: i64,
    max: i64,
    mode_var: &Option<String>,
    min_frequency: Option<usize>,
) -> Result<Value, GenError> {
    if min > max {
        return Err(GenError::InvalidBounds {
            min: min as f64,
            max: max as f64,
        });
    }
    let mode_value = match mode_var {
        Some(name) => env.int(name)?,
        None => rng.gen_range(min..=max),
    };
    let frequency = min_frequency
        .unwrap_or(2)
        .max(2)
        .min(size.saturating_sub(1).max(1));

    let mut items: Vec<i64> = vec![mode_value; frequency];
    while items.len() < size {
        let mut candidate = rng.gen_range(min..=max);
        let mut attempts = 0;
        // Keep the intended mode strictly most frequent.
        while attempts < 50
            && (candidate == mode_value
                || items.iter().filter(|v| **v == candidate).count() + 1 >= frequency)
        {
            candidate = rng.gen_range(min..=max);
            attempts += 1;
        }
        // Narrow ranges can run out of distinct fillers; another copy of
        // the mode keeps it strictly most frequent.
        if candidate == mode_value
            || items.iter().filter(|v| **v == candidate).count() + 1 >= frequency
        {
            candidate = mode_value;
        }
        items.push(candidate);
    }
    items.shuffle(rng);
    Ok(Value::List(items.into_iter().map(Value::Int).collect()))
}

const IRREGULAR_PLURALS: [(&str, &str); 16] = [
    ("battery", "batteries"),
    ("city", "cities"),
    ("company", "companies"),
    ("child", "children"),
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("mouse", "mice"),
    ("analysis", "analyses"),
    ("hypothesis", "hypotheses"),
    ("datum", "data"),
    ("quiz", "quizzes"),
    ("sheep", "sheep"),
    ("series", "series"),
];

/// Pluralizes a singular noun for narrative question text.
pub fn pluralize(noun: &str) -> String {
    let lower = noun.to_lowercase();
    if let Some((_, plural)) = IRREGULAR_PLURALS.iter().find(|(s, _)| *s == lower) {
        return match_case(noun, plural);
    }
    if let Some(stem) = lower.strip_suffix('y') {
        if !stem.is_empty() && !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{}ies", &noun[..noun.len() - 1]);
        }
    }
    if ["s", "sh", "ch", "x", "z"].iter().any(|sfx| lower.ends_with(sfx)) {
        return format!("{noun}es");
    }
    format!("{noun}s")
}

/// Best-effort inverse of `pluralize`.
pub fn singularize(noun: &str) -> String {
    let lower = noun.to_lowercase();
    if let Some((singular, _)) = IRREGULAR_PLURALS.iter().find(|(_, p)| *p == lower) {
        return match_case(noun, singular);
    }
    if lower.ends_with("ies") && noun.len() > 3 {
        return format!("{}y", &noun[..noun.len() - 3]);
    }
    if lower.ends_with('s') && noun.len() > 1 {
        return noun[..noun.len() - 1].to_string();
    }
    noun.to_string()
}

fn match_case(original: &str, replacement: &str) -> String {
    if original.chars().next().is_some_and(|c| c.is_uppercase()) {
        let mut chars = replacement.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    } else {
        replacement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn int_range_respects_bounds() {
        let gen = GeneratorKind::IntRange { min: 5, max: 9 };
        let env = Environment::new();
        let mut rng = rng();
        for _ in 0..50 {
            let value = gen.run(&env, &mut rng).expect("in-range draw");
            let v = value.as_i64().expect("integer");
            assert!((5..=9).contains(&v));
        }
    }

    #[test]
    fn int_range_step_lands_on_multiples() {
        let gen = GeneratorKind::IntRangeStep {
            min: 10,
            max: 50,
            step: 5,
        };
        let env = Environment::new();
        let mut rng = rng();
        for _ in 0..50 {
            let v = gen.run(&env, &mut rng).expect("draw").as_i64().expect("int");
            assert_eq!((v - 10) % 5, 0);
            assert!((10..=50).contains(&v));
        }
    }

    #[test]
    fn choice_excluding_avoids_prior_value() {
        let gen = GeneratorKind::ChoiceExcluding {
            choices: vec![Value::from("red"), Value::from("blue")],
            exclude_var: "first".to_string(),
        };
        let mut env = Environment::new();
        env.insert("first", Value::from("red"));
        let mut rng = rng();
        for _ in 0..20 {
            let value = gen.run(&env, &mut rng).expect("one choice remains");
            assert_eq!(value, Value::from("blue"));
        }
    }

    #[test]
    fn sum_of_ints_stays_integer() {
        let gen = GeneratorKind::Sum {
            terms: vec!["a".to_string(), "b".to_string()],
        };
        let mut env = Environment::new();
        env.insert("a", Value::Int(3));
        env.insert("b", Value::Int(4));
        let mut rng = rng();
        assert_eq!(gen.run(&env, &mut rng).expect("sum"), Value::Int(7));

        env.insert("b", Value::Float(4.5));
        assert_eq!(gen.run(&env, &mut rng).expect("sum"), Value::Float(7.5));
    }

    #[test]
    fn z_for_confidence_reads_table() {
        let gen = GeneratorKind::ZForConfidence {
            confidence_var: "level".to_string(),
        };
        let mut env = Environment::new();
        env.insert("level", Value::Int(99));
        let mut rng = rng();
        assert_eq!(gen.run(&env, &mut rng).expect("z"), Value::Float(2.576));
    }

    #[test]
    fn array_with_mode_has_unique_most_frequent_value() {
        let gen = GeneratorKind::ArrayWithMode {
            size: 9,
            min: 1,
            max: 20,
            mode_var: Some("target".to_string()),
            min_frequency: Some(3),
        };
        let mut env = Environment::new();
        env.insert("target", Value::Int(7));
        let mut rng = rng();
        for _ in 0..10 {
            let list = gen.run(&env, &mut rng).expect("array builds");
            let items = list.as_list().expect("list");
            let mode_count = items.iter().filter(|v| **v == Value::Int(7)).count();
            assert_eq!(mode_count, 3);
            for candidate in items {
                if *candidate != Value::Int(7) {
                    let count = items.iter().filter(|v| *v == candidate).count();
                    assert!(count < mode_count, "competing mode {candidate:?}");
                }
            }
        }
    }

    #[test]
    fn array_with_mode_keeps_strict_mode_in_a_two_value_range() {
        // Only one non-mode value exists, so fillers run out after a
        // single occurrence and the remainder must fall back to the mode.
        let gen = GeneratorKind::ArrayWithMode {
            size: 8,
            min: 5,
            max: 6,
            mode_var: Some("target".to_string()),
            min_frequency: None,
        };
        let mut env = Environment::new();
        env.insert("target", Value::Int(5));
        let mut rng = rng();
        for _ in 0..10 {
            let list = gen.run(&env, &mut rng).expect("array builds");
            let items = list.as_list().expect("list");
            assert_eq!(items.len(), 8);
            let mode_count = items.iter().filter(|v| **v == Value::Int(5)).count();
            let other_count = items.iter().filter(|v| **v == Value::Int(6)).count();
            assert!(
                other_count < mode_count,
                "mode 5 x{mode_count} must beat 6 x{other_count}"
            );
        }
    }

    #[test]
    fn dependencies_include_nested_target() {
        let gen = GeneratorKind::MeanForTargetStatistic {
            mu0_var: "mu0".to_string(),
            std_dev_var: "sd".to_string(),
            size_var: "n".to_string(),
            target: Box::new(GeneratorKind::Identity {
                source_var: "target_z".to_string(),
            }),
            decimals: None,
        };
        let deps = gen.dependencies();
        assert!(deps.contains(&"mu0"));
        assert!(deps.contains(&"target_z"));
    }

    #[test]
    fn unknown_kind_round_trips_from_unrecognized_tag() {
        let gen: GeneratorKind =
            serde_json::from_str(r#"{"kind": "frobnicate", "min": 1}"#).expect("falls back");
        assert!(gen.is_unknown());
        let env = Environment::new();
        assert!(matches!(
            gen.run(&env, &mut rng()),
            Err(GenError::UnknownKind)
        ));
    }

    #[test]
    fn known_kind_with_bad_params_fails_deserialization() {
        let result = serde_json::from_str::<GeneratorKind>(r#"{"kind": "int_range", "min": 1}"#);
        assert!(result.is_err(), "missing max must be rejected at load");
    }

    #[test]
    fn pluralize_handles_rules_and_irregulars() {
        assert_eq!(pluralize("bulb"), "bulbs");
        assert_eq!(pluralize("battery"), "batteries");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("Person"), "People");
    }

    #[test]
    fn singularize_reverses_common_forms() {
        assert_eq!(singularize("bulbs"), "bulb");
        assert_eq!(singularize("batteries"), "battery");
        assert_eq!(singularize("people"), "person");
    }
}

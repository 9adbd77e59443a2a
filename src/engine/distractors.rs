//! Synthesis of plausible wrong answers for numeric questions.

use rand::seq::SliceRandom;
use rand::Rng;

const SCALE_FACTORS: [f64; 6] = [0.5, 0.75, 1.25, 1.5, 1.75, 0.25];

/// Tuning knobs for distractor synthesis around one correct value.
#[derive(Debug, Clone, Copy)]
pub struct DistractorProfile {
    /// Fraction of the correct value used as the typical perturbation size.
    pub range_factor: f64,
    /// Smallest meaningful gap between a distractor and the correct value.
    pub min_diff: f64,
    /// Decimal places options will be rounded to before comparison.
    pub decimals: u8,
}

impl Default for DistractorProfile {
    fn default() -> Self {
        Self {
            range_factor: 0.3,
            min_diff: 0.1,
            decimals: 2,
        }
    }
}

impl DistractorProfile {
    pub fn with_decimals(decimals: u8) -> Self {
        Self {
            decimals,
            ..Self::default()
        }
    }
}

fn round_to(value: f64, decimals: u8) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Generates `count` numeric distractors near `correct`.
///
/// Three perturbation styles are mixed: a scaled offset proportional to
/// the answer's magnitude, a small additive nudge, and a multiplicative
/// factor. Candidates that round onto the correct answer are rejected;
/// if random attempts run out, deterministic offsets pad the remainder.
pub fn numeric_distractors<R: Rng>(
    correct: f64,
    count: usize,
    profile: DistractorProfile,
    rng: &mut R,
) -> Vec<f64> {
    let decimals = profile.decimals;
    let effective_min_diff = profile.min_diff.max(0.1 * 10f64.powi(-(decimals as i32)));
    let mut typical_offset = if correct == 0.0 {
        10f64.powi(-(decimals as i32))
    } else {
        (correct * profile.range_factor).abs()
    };
    if typical_offset < effective_min_diff {
        typical_offset = effective_min_diff;
    }

    let rounded_correct = round_to(correct, decimals);
    let mut found: Vec<f64> = Vec::with_capacity(count);

    let mut attempts = 0;
    while found.len() < count && attempts < count * 15 {
        attempts += 1;

        let sign = *[-1.0, 1.0].choose(rng).expect("non-empty");
        let candidate = match rng.gen::<f64>() {
            x if x < 0.4 => correct + sign * rng.gen_range(0.5..2.0) * typical_offset,
            x if x < 0.7 => {
                correct + sign * rng.gen_range(effective_min_diff..effective_min_diff * 5.0)
            }
            _ if correct != 0.0 => correct * *SCALE_FACTORS.choose(rng).expect("non-empty"),
            _ => sign * rng.gen_range(effective_min_diff..effective_min_diff * 5.0),
        };

        let rounded = round_to(candidate, decimals);
        if (rounded - rounded_correct).abs() >= effective_min_diff / 2.0
            && !found.contains(&rounded)
        {
            found.push(rounded);
        }
    }

    // Deterministic padding when random attempts could not fill the set.
    let mut pad_index = 1;
    while found.len() < count && pad_index <= count * 5 {
        let offset = ((correct * 0.1).abs() + effective_min_diff) * (pad_index as f64 + rng.gen::<f64>());
        let candidate = if pad_index % 2 == 0 {
            correct + offset
        } else {
            correct - offset
        };
        let rounded = round_to(candidate, decimals);

        let near_duplicate = 10f64.powi(-(decimals as i32 + 1));
        let clashes = found
            .iter()
            .any(|existing| (rounded - existing).abs() < near_duplicate)
            || (rounded - rounded_correct).abs() < near_duplicate;
        if !clashes {
            found.push(rounded);
        }
        pad_index += 1;
    }

    found.truncate(count);
    found
}

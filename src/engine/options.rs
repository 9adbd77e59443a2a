//! Formatting, deduplication, and shuffling of answer options.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

pub const OPTION_COUNT: usize = 4;

/// Formats a numeric option for display: whole numbers when no decimals
/// are requested, fixed precision otherwise.
pub fn format_numeric(value: f64, decimals: u8) -> String {
    if decimals == 0 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.prec$}", prec = decimals as usize)
    }
}

/// Builds the shuffled four-option list for a numeric answer and returns
/// it with the index of the correct entry.
pub fn numeric_options<R: Rng>(
    correct: f64,
    distractors: &[f64],
    decimals: u8,
    rng: &mut R,
) -> (Vec<String>, usize) {
    let correct_str = format_numeric(correct, decimals);
    let distractor_strs: Vec<String> = distractors
        .iter()
        .map(|d| format_numeric(*d, decimals))
        .collect();
    assemble(correct_str, distractor_strs, NumericPadding { decimals }, rng)
}

/// Builds the shuffled four-option list for a text answer.
pub fn text_options<R: Rng>(
    correct: String,
    distractors: Vec<String>,
    rng: &mut R,
) -> (Vec<String>, usize) {
    assemble(correct, distractors, TextPadding, rng)
}

trait PaddingStyle {
    fn synthesize<R: Rng>(&self, index: usize, rng: &mut R) -> String;
}

struct NumericPadding {
    decimals: u8,
}

impl PaddingStyle for NumericPadding {
    fn synthesize<R: Rng>(&self, index: usize, rng: &mut R) -> String {
        format_numeric(rng.gen_range(100.0..200.0) + index as f64, self.decimals)
    }
}

struct TextPadding;

impl PaddingStyle for TextPadding {
    fn synthesize<R: Rng>(&self, index: usize, _rng: &mut R) -> String {
        format!("Alternative {index}")
    }
}

fn assemble<R: Rng>(
    correct: String,
    distractors: Vec<String>,
    padding: impl PaddingStyle,
    rng: &mut R,
) -> (Vec<String>, usize) {
    let mut options = vec![correct.clone()];
    for d in distractors {
        if options.len() >= OPTION_COUNT {
            break;
        }
        if !options.contains(&d) {
            options.push(d);
        }
    }

    let mut pad_index = 1;
    while options.len() < OPTION_COUNT && pad_index <= 10 {
        let candidate = padding.synthesize(pad_index, rng);
        if !options.contains(&candidate) {
            options.push(candidate);
        }
        pad_index += 1;
    }
    while options.len() < OPTION_COUNT {
        let candidate = format!("Alternative {}", rng.gen_range(1000..9999));
        if !options.contains(&candidate) {
            options.push(candidate);
        }
    }

    options.truncate(OPTION_COUNT);
    options.shuffle(rng);

    let correct_index = match options.iter().position(|opt| *opt == correct) {
        Some(index) => index,
        None => {
            // Deduplication dropped the correct entry; that points at a
            // distractor bug upstream, so log it and force it back in.
            warn!(%correct, "correct option missing after formatting, reinserting");
            let slot = rng.gen_range(0..OPTION_COUNT);
            options[slot] = correct;
            slot
        }
    };

    (options, correct_index)
}

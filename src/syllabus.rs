//! The fixed five-unit probability and statistics syllabus.

/// Unit names in teaching order.
pub const UNIT_NAMES: [&str; 5] = [
    "Unit-I Descriptive Statistics",
    "Unit-II Sampling and Distributions",
    "Unit-III Correlation, Covariance and Independent Random Variables",
    "Unit-IV Large Sample Estimation",
    "Unit-V Hypothesis Testing",
];

pub fn unit_names() -> &'static [&'static str] {
    &UNIT_NAMES
}

pub fn is_known_unit(name: &str) -> bool {
    UNIT_NAMES.contains(&name)
}

/// Resolves a unit by its 1-based position, as shown in listings.
pub fn unit_by_number(number: usize) -> Option<&'static str> {
    (1..=UNIT_NAMES.len())
        .contains(&number)
        .then(|| UNIT_NAMES[number - 1])
}

//! Template selection against per-paper quotas.
//!
//! A paper mixes a one-mark pool (direct questions) with a two-mark pool
//! (aptitude and logical-reasoning questions). Small catalogs are handled
//! by layered fallback: unique picks first, then repeats within the same
//! pool, then repeats from the whole unit pool.

use crate::catalog::QuestionTemplate;
use rand::seq::SliceRandom;
use rand::Rng;

/// Question counts for one paper, split by mark weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPlan {
    pub one_mark: usize,
    pub two_mark: usize,
}

impl QuotaPlan {
    pub const fn question_count(self) -> usize {
        self.one_mark + self.two_mark
    }

    pub const fn total_marks(self) -> u32 {
        (self.one_mark + 2 * self.two_mark) as u32
    }
}

/// Unit paper: 15 questions worth 20 marks.
pub const UNIT_QUOTA: QuotaPlan = QuotaPlan {
    one_mark: 10,
    two_mark: 5,
};

/// Grand paper across the whole syllabus: 75 questions worth 100 marks.
pub const GRAND_QUOTA: QuotaPlan = QuotaPlan {
    one_mark: 50,
    two_mark: 25,
};

/// A template chosen for a paper slot, with the marks that slot carries.
#[derive(Debug, Clone, Copy)]
pub struct PlannedQuestion<'a> {
    pub template: &'a QuestionTemplate,
    pub marks: u32,
}

/// Picks templates from `pool` to satisfy `quota`.
///
/// The returned plan is shuffled, so one-mark and two-mark questions are
/// interleaved. An empty pool yields an empty plan.
pub fn plan_selection<'a, R: Rng>(
    pool: &[&'a QuestionTemplate],
    quota: QuotaPlan,
    rng: &mut R,
) -> Vec<PlannedQuestion<'a>> {
    let direct: Vec<&QuestionTemplate> = pool
        .iter()
        .copied()
        .filter(|t| t.classification.difficulty_type.is_direct())
        .collect();
    let weighted: Vec<&QuestionTemplate> = pool
        .iter()
        .copied()
        .filter(|t| !t.classification.difficulty_type.is_direct())
        .collect();

    let mut planned = fill_slot(&direct, pool, quota.one_mark, 1, rng);
    planned.extend(fill_slot(&weighted, pool, quota.two_mark, 2, rng));
    planned.shuffle(rng);
    planned
}

fn fill_slot<'a, R: Rng>(
    pool: &[&'a QuestionTemplate],
    whole: &[&'a QuestionTemplate],
    quota: usize,
    marks: u32,
    rng: &mut R,
) -> Vec<PlannedQuestion<'a>> {
    let mut shuffled = pool.to_vec();
    shuffled.shuffle(rng);

    let mut planned: Vec<PlannedQuestion<'a>> = shuffled
        .into_iter()
        .take(quota)
        .map(|template| PlannedQuestion { template, marks })
        .collect();

    // Repeats come from the matching pool when it has anything at all,
    // and from the whole paper pool otherwise.
    let repeat_source = if pool.is_empty() { whole } else { pool };
    while planned.len() < quota {
        let Some(template) = repeat_source.choose(rng) else {
            break;
        };
        planned.push(PlannedQuestion { template, marks });
    }

    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        Classification, DifficultyLevel, DifficultyType, QuestionTemplate,
    };
    use crate::engine::answers::AnswerLogic;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn template(id: &str, difficulty_type: DifficultyType) -> QuestionTemplate {
        QuestionTemplate {
            id: id.to_string(),
            classification: Classification {
                unit_name: "Unit-I Descriptive Statistics".to_string(),
                topic_name: "Central Tendency".to_string(),
                subtopic_name: "Mean".to_string(),
                difficulty_level: DifficultyLevel::Easy,
                difficulty_type,
            },
            question: "placeholder".to_string(),
            variables: Vec::new(),
            options: Vec::new(),
            answer: AnswerLogic::FixedChoice { correct_index: 0 },
            explanation: None,
        }
    }

    fn pool(direct: usize, weighted: usize) -> Vec<QuestionTemplate> {
        let mut templates = Vec::new();
        for i in 0..direct {
            templates.push(template(&format!("d-{i}"), DifficultyType::Direct));
        }
        for i in 0..weighted {
            templates.push(template(&format!("w-{i}"), DifficultyType::Aptitude));
        }
        templates
    }

    #[test]
    fn unit_quota_adds_up_to_twenty_marks() {
        assert_eq!(UNIT_QUOTA.question_count(), 15);
        assert_eq!(UNIT_QUOTA.total_marks(), 20);
        assert_eq!(GRAND_QUOTA.question_count(), 75);
        assert_eq!(GRAND_QUOTA.total_marks(), 100);
    }

    #[test]
    fn large_pool_fills_quota_without_repeats() {
        let templates = pool(20, 12);
        let refs: Vec<&QuestionTemplate> = templates.iter().collect();
        let mut rng = StdRng::seed_from_u64(1);
        let planned = plan_selection(&refs, UNIT_QUOTA, &mut rng);

        assert_eq!(planned.len(), 15);
        let mut ids: Vec<&str> = planned.iter().map(|p| p.template.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 15, "no repeats needed from a large pool");

        let one_mark = planned.iter().filter(|p| p.marks == 1).count();
        let two_mark = planned.iter().filter(|p| p.marks == 2).count();
        assert_eq!((one_mark, two_mark), (10, 5));
    }

    #[test]
    fn small_pool_repeats_to_fill_quota() {
        let templates = pool(3, 2);
        let refs: Vec<&QuestionTemplate> = templates.iter().collect();
        let mut rng = StdRng::seed_from_u64(2);
        let planned = plan_selection(&refs, UNIT_QUOTA, &mut rng);

        assert_eq!(planned.len(), 15);
        let total: u32 = planned.iter().map(|p| p.marks).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn missing_category_borrows_from_whole_pool() {
        // no direct templates at all
        let templates = pool(0, 4);
        let refs: Vec<&QuestionTemplate> = templates.iter().collect();
        let mut rng = StdRng::seed_from_u64(3);
        let planned = plan_selection(&refs, UNIT_QUOTA, &mut rng);

        assert_eq!(planned.len(), 15);
        // slots keep their mark weight even when borrowed
        assert_eq!(planned.iter().filter(|p| p.marks == 1).count(), 10);
    }

    #[test]
    fn empty_pool_yields_empty_plan() {
        let mut rng = StdRng::seed_from_u64(4);
        let planned = plan_selection(&[], UNIT_QUOTA, &mut rng);
        assert!(planned.is_empty());
    }

    #[test]
    fn one_mark_and_two_mark_questions_are_interleaved() {
        let templates = pool(30, 15);
        let refs: Vec<&QuestionTemplate> = templates.iter().collect();
        let mut rng = StdRng::seed_from_u64(5);
        let planned = plan_selection(&refs, UNIT_QUOTA, &mut rng);

        // the shuffle should break the one-mark block at least once
        let first_two_mark = planned.iter().position(|p| p.marks == 2);
        assert!(first_two_mark.is_some_and(|pos| pos < 10));
    }
}

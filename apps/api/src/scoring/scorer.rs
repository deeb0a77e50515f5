//! Trait Scorer: turns one student's 50 answers into per-trait scores.
//!
//! Two views of the same per-item contributions:
//! - `score` → integer sums per trait (persisted, used for class bands)
//! - `averages` → sum ÷ item count per trait (per-student display)

use crate::scoring::items::{items_per_trait, ItemAssignment, ITEM_ASSIGNMENTS, ITEM_COUNT};
use crate::scoring::round2;
use crate::scoring::traits::{Trait, TraitMap};

/// Contribution of every item, in item order, paired with its assignment.
pub fn item_contributions<'a>(
    answers: &'a [u8; ITEM_COUNT],
    table: &'a [ItemAssignment; ITEM_COUNT],
) -> impl Iterator<Item = (&'a ItemAssignment, u32)> + 'a {
    table
        .iter()
        .map(move |a| (a, a.polarity.contribution(answers[usize::from(a.item) - 1])))
}

/// Per-trait totals using an explicit assignment table.
pub fn score_with(answers: &[u8; ITEM_COUNT], table: &[ItemAssignment; ITEM_COUNT]) -> TraitMap<u32> {
    let mut totals = TraitMap::<u32>::default();
    for (assignment, contribution) in item_contributions(answers, table) {
        totals[assignment.scale] += contribution;
    }
    totals
}

/// Per-trait totals using the questionnaire key.
pub fn score(answers: &[u8; ITEM_COUNT]) -> TraitMap<u32> {
    score_with(answers, &ITEM_ASSIGNMENTS)
}

/// Per-trait mean item score, rounded to two decimals.
pub fn averages(answers: &[u8; ITEM_COUNT]) -> TraitMap<f64> {
    let totals = score(answers);
    totals.map(|t: Trait, total| match items_per_trait(t) {
        0 => 0.0,
        n => round2(f64::from(*total) / f64::from(n)),
    })
}

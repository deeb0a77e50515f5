//! Aggregator: class/subject level statistics over per-student trait totals.

use serde::{Deserialize, Serialize};

use crate::scoring::dominant::{resolve, resolve_lowest, DominantTraits};
use crate::scoring::round2;
use crate::scoring::scorer::score;
use crate::scoring::traits::{Trait, TraitMap};
use crate::survey::SurveyResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    Low,
    Moderate,
    High,
}

/// Inclusive upper bounds for the Low and Moderate bands of a summed trait score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub low_max: u32,
    pub moderate_max: u32,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            low_max: 30,
            moderate_max: 40,
        }
    }
}

impl BandThresholds {
    pub fn classify(&self, score: u32) -> Band {
        if score <= self.low_max {
            Band::Low
        } else if score <= self.moderate_max {
            Band::Moderate
        } else {
            Band::High
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateProfile {
    pub respondents: usize,
    /// Mean of the per-student totals, two decimals.
    pub mean_scores: TraitMap<f64>,
    /// Mean totals rounded half-to-even; the banded "class score".
    pub class_scores: TraitMap<u32>,
    pub bands: TraitMap<Band>,
    /// Highest traits, resolved over `class_scores`.
    pub dominant: DominantTraits,
    /// Lowest traits, resolved over `class_scores`.
    pub lowest: DominantTraits,
    /// How many students count each trait among their dominant traits.
    pub dominant_tally: TraitMap<u32>,
    pub most_common: DominantTraits,
}

/// Counts dominant-trait occurrences. A tied student counts once for every tied trait.
pub fn tally<'a>(dominants: impl IntoIterator<Item = &'a DominantTraits>) -> TraitMap<u32> {
    let mut counts = TraitMap::<u32>::default();
    for d in dominants {
        for &t in d.traits() {
            counts[t] += 1;
        }
    }
    counts
}

/// Aggregates trait totals with the configured band thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    thresholds: BandThresholds,
}

impl Aggregator {
    pub fn new(thresholds: BandThresholds) -> Self {
        Self { thresholds }
    }

    /// Scores each response then aggregates. `None` for an empty group.
    pub fn aggregate<'a>(
        &self,
        responses: impl IntoIterator<Item = &'a SurveyResponse>,
    ) -> Option<AggregateProfile> {
        self.aggregate_profiles(responses.into_iter().map(|r| {
            let totals = score(&r.answers);
            let dominant = resolve(&totals);
            (totals, dominant)
        }))
    }

    /// Aggregates already-scored students, e.g. persisted profiles.
    pub fn aggregate_profiles(
        &self,
        profiles: impl IntoIterator<Item = (TraitMap<u32>, DominantTraits)>,
    ) -> Option<AggregateProfile> {
        let mut sums = TraitMap::<u64>::default();
        let mut dominants = Vec::new();

        for (totals, dominant) in profiles {
            for (t, value) in totals.iter() {
                sums[t] += u64::from(*value);
            }
            dominants.push(dominant);
        }

        if dominants.is_empty() {
            return None;
        }

        let respondents = dominants.len();
        let means = sums.map(|_, sum| *sum as f64 / respondents as f64);
        let class_scores = means.map(|_, mean| mean.round_ties_even() as u32);
        let bands = class_scores.map(|_, score| self.thresholds.classify(*score));
        let dominant_tally = tally(&dominants);

        Some(AggregateProfile {
            respondents,
            mean_scores: means.map(|_, mean| round2(*mean)),
            class_scores,
            bands,
            dominant: resolve(&class_scores),
            lowest: resolve_lowest(&class_scores),
            most_common: resolve(&dominant_tally),
            dominant_tally,
        })
    }
}

/// Traits in enumeration order with a non-zero count.
pub fn observed_counts(counts: &TraitMap<u32>) -> Vec<(Trait, u32)> {
    counts
        .iter()
        .filter(|(_, c)| **c > 0)
        .map(|(t, c)| (t, *c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::items::ITEM_COUNT;

    fn response(id: &str, answers: [u8; ITEM_COUNT]) -> SurveyResponse {
        SurveyResponse {
            student_id: id.to_string(),
            name: format!("Student {id}"),
            age: None,
            gender: None,
            year_level: "10".to_string(),
            section: None,
            date: None,
            answers,
        }
    }

    fn totals(values: [u32; 5]) -> TraitMap<u32> {
        TraitMap::from_fn(|t| values[t as usize])
    }

    #[test]
    fn test_empty_group_is_none() {
        let aggregator = Aggregator::default();
        assert!(aggregator.aggregate(&Vec::<SurveyResponse>::new()).is_none());
        assert!(aggregator.aggregate_profiles(Vec::new()).is_none());
    }

    #[test]
    fn test_single_student_means_equal_own_totals() {
        let mut answers = [3; ITEM_COUNT];
        answers[1] = 5; // item 2, Openness direct
        let student = response("S1", answers);
        let own = score(&student.answers);

        let profile = Aggregator::default().aggregate([&student]).unwrap();
        assert_eq!(profile.respondents, 1);
        for t in Trait::ALL {
            assert_eq!(profile.mean_scores[t], f64::from(own[t]), "{t}");
            assert_eq!(profile.class_scores[t], own[t], "{t}");
        }
        assert_eq!(profile.dominant, resolve(&own));
        assert_eq!(profile.dominant.traits(), &[Trait::Openness]);
    }

    #[test]
    fn test_uniform_answers_give_uniform_tie() {
        let group = [response("A", [3; ITEM_COUNT]), response("B", [3; ITEM_COUNT])];
        let profile = Aggregator::default().aggregate(&group).unwrap();
        assert_eq!(profile.dominant.traits(), &Trait::ALL);
        assert_eq!(profile.dominant_tally, TraitMap::from_fn(|_| 2));
        assert_eq!(profile.most_common.traits(), &Trait::ALL);
        assert!(profile.bands.values().all(|b| *b == Band::Low));
    }

    #[test]
    fn test_tied_students_count_in_every_bucket() {
        let profiles = vec![
            (
                totals([40, 10, 40, 10, 10]),
                DominantTraits::from_traits([Trait::Extraversion, Trait::Agreeableness]),
            ),
            (
                totals([10, 10, 42, 10, 10]),
                DominantTraits::from_traits([Trait::Agreeableness]),
            ),
            (
                totals([10, 10, 10, 10, 45]),
                DominantTraits::from_traits([Trait::Openness]),
            ),
        ];
        let profile = Aggregator::default().aggregate_profiles(profiles).unwrap();
        assert_eq!(profile.dominant_tally[Trait::Agreeableness], 2);
        assert_eq!(profile.dominant_tally[Trait::Extraversion], 1);
        assert_eq!(profile.dominant_tally[Trait::Openness], 1);
        assert_eq!(profile.most_common.traits(), &[Trait::Agreeableness]);
        assert_eq!(
            observed_counts(&profile.dominant_tally),
            vec![(Trait::Extraversion, 1), (Trait::Agreeableness, 2), (Trait::Openness, 1)]
        );
    }

    #[test]
    fn test_means_and_class_scores() {
        let profiles = vec![
            (
                totals([30, 30, 30, 30, 41]),
                DominantTraits::from_traits([Trait::Openness]),
            ),
            (
                totals([31, 30, 30, 30, 40]),
                DominantTraits::from_traits([Trait::Openness]),
            ),
        ];
        let profile = Aggregator::default().aggregate_profiles(profiles).unwrap();
        // 30.5 rounds to even
        assert_eq!(profile.mean_scores[Trait::Extraversion], 30.5);
        assert_eq!(profile.class_scores[Trait::Extraversion], 30);
        assert_eq!(profile.bands[Trait::Extraversion], Band::Low);
        // 40.5 rounds to even
        assert_eq!(profile.class_scores[Trait::Openness], 40);
        assert_eq!(profile.bands[Trait::Openness], Band::Moderate);
        assert_eq!(profile.dominant.traits(), &[Trait::Openness]);
        assert_eq!(
            profile.lowest.traits(),
            &[
                Trait::Extraversion,
                Trait::Neuroticism,
                Trait::Agreeableness,
                Trait::Conscientiousness
            ]
        );
    }

    #[test]
    fn test_dominant_ties_on_reported_class_scores() {
        // Openness averages 40.5, which is reported as 40 next to Agreeableness.
        let profiles = vec![
            (
                totals([20, 20, 40, 20, 41]),
                DominantTraits::from_traits([Trait::Openness]),
            ),
            (
                totals([20, 20, 40, 20, 40]),
                DominantTraits::from_traits([Trait::Agreeableness, Trait::Openness]),
            ),
        ];
        let profile = Aggregator::default().aggregate_profiles(profiles).unwrap();
        assert_eq!(profile.class_scores[Trait::Openness], 40);
        assert_eq!(profile.class_scores[Trait::Agreeableness], 40);
        assert_eq!(
            profile.dominant.traits(),
            &[Trait::Agreeableness, Trait::Openness]
        );
        assert_eq!(profile.dominant, resolve(&profile.class_scores));
    }

    #[test]
    fn test_one_outlier_in_a_large_class_still_ties() {
        let mut profiles = vec![(
            totals([31, 30, 20, 20, 20]),
            DominantTraits::from_traits([Trait::Extraversion]),
        )];
        profiles.extend((0..200).map(|_| {
            (
                totals([30, 30, 20, 20, 20]),
                DominantTraits::from_traits([Trait::Extraversion, Trait::Neuroticism]),
            )
        }));
        let profile = Aggregator::default().aggregate_profiles(profiles).unwrap();
        assert_eq!(profile.class_scores[Trait::Extraversion], 30);
        assert_eq!(profile.dominant.to_string(), "Extraversion & Neuroticism");
        assert_eq!(
            profile.lowest.traits(),
            &[Trait::Agreeableness, Trait::Conscientiousness, Trait::Openness]
        );
    }

    #[test]
    fn test_band_boundaries() {
        let bands = BandThresholds::default();
        assert_eq!(bands.classify(0), Band::Low);
        assert_eq!(bands.classify(30), Band::Low);
        assert_eq!(bands.classify(31), Band::Moderate);
        assert_eq!(bands.classify(40), Band::Moderate);
        assert_eq!(bands.classify(41), Band::High);
    }

    #[test]
    fn test_custom_thresholds() {
        let aggregator = Aggregator::new(BandThresholds {
            low_max: 20,
            moderate_max: 25,
        });
        let profile = aggregator
            .aggregate_profiles([(totals([21; 5]), DominantTraits::from_traits(Trait::ALL))])
            .unwrap();
        assert!(profile.bands.values().all(|b| *b == Band::Moderate));
    }
}

//! Dominant-Trait Resolver.
//!
//! A student (or a class) can be tied across several traits. Ties are kept
//! as a set internally and only joined into `"A & B"` at the API/DB boundary.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::scoring::traits::{Trait, TraitMap, UnknownTrait};

pub const TIE_SEPARATOR: &str = " & ";

/// Traits sharing the extreme score, in enumeration order, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DominantTraits(Vec<Trait>);

impl DominantTraits {
    pub fn from_traits(traits: impl IntoIterator<Item = Trait>) -> Self {
        let mut traits: Vec<Trait> = traits.into_iter().collect();
        traits.sort();
        traits.dedup();
        Self(traits)
    }

    pub fn traits(&self) -> &[Trait] {
        &self.0
    }

    #[cfg(test)]
    pub fn contains(&self, t: Trait) -> bool {
        self.0.contains(&t)
    }

    #[cfg(test)]
    pub fn is_tie(&self) -> bool {
        self.0.len() > 1
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a stored label, dropping segments that are not trait names.
    pub fn parse_lenient(label: &str) -> Self {
        Self::from_traits(label.split('&').filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            match part.parse::<Trait>() {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!("Ignoring dominant trait segment: {e}");
                    None
                }
            }
        }))
    }
}

impl fmt::Display for DominantTraits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(TIE_SEPARATOR)?;
            }
            f.write_str(t.name())?;
        }
        Ok(())
    }
}

impl FromStr for DominantTraits {
    type Err = UnknownTrait;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let traits = s
            .split('&')
            .map(str::parse::<Trait>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_traits(traits))
    }
}

impl Serialize for DominantTraits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DominantTraits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// Every trait tied at the maximum value.
pub fn resolve<V: PartialOrd + Copy>(scores: &TraitMap<V>) -> DominantTraits {
    extremum(scores, Ordering::Greater)
}

/// Every trait tied at the minimum value.
pub fn resolve_lowest<V: PartialOrd + Copy>(scores: &TraitMap<V>) -> DominantTraits {
    extremum(scores, Ordering::Less)
}

fn extremum<V: PartialOrd + Copy>(scores: &TraitMap<V>, wanted: Ordering) -> DominantTraits {
    let mut best: Option<V> = None;
    let mut traits = Vec::with_capacity(Trait::ALL.len());

    for (t, &value) in scores.iter() {
        let ordering = match best {
            None => wanted,
            Some(current) => match value.partial_cmp(&current) {
                Some(o) => o,
                None => continue, // NaN
            },
        };
        if ordering == wanted {
            best = Some(value);
            traits.clear();
            traits.push(t);
        } else if ordering == Ordering::Equal {
            traits.push(t);
        }
    }

    DominantTraits(traits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: [u32; 5]) -> TraitMap<u32> {
        let mut map = TraitMap::default();
        for (t, v) in Trait::ALL.into_iter().zip(values) {
            map[t] = v;
        }
        map
    }

    #[test]
    fn test_single_dominant() {
        let d = resolve(&scores([30, 22, 35, 28, 31]));
        assert_eq!(d.traits(), &[Trait::Agreeableness]);
        assert!(!d.is_tie());
        assert_eq!(d.to_string(), "Agreeableness");
    }

    #[test]
    fn test_ties_are_all_reported_in_order() {
        let d = resolve(&scores([40, 12, 40, 18, 40]));
        assert_eq!(
            d.traits(),
            &[Trait::Extraversion, Trait::Agreeableness, Trait::Openness]
        );
        assert_eq!(d.to_string(), "Extraversion & Agreeableness & Openness");
    }

    #[test]
    fn test_all_zero_is_five_way_tie() {
        let d = resolve(&scores([0; 5]));
        assert_eq!(d.traits(), &Trait::ALL);
    }

    #[test]
    fn test_lowest() {
        let d = resolve_lowest(&scores([20, 12, 40, 12, 33]));
        assert_eq!(d.traits(), &[Trait::Neuroticism, Trait::Conscientiousness]);
    }

    #[test]
    fn test_works_on_averages() {
        let mut avg = TraitMap::<f64>::default();
        avg[Trait::Openness] = 3.4;
        avg[Trait::Neuroticism] = 3.4;
        avg[Trait::Extraversion] = 2.9;
        let d = resolve(&avg);
        assert_eq!(d.to_string(), "Neuroticism & Openness");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let first = resolve(&scores([35, 35, 10, 20, 35]));
        // Re-resolve over an indicator map of the resolved set.
        let indicator = TraitMap::from_fn(|t| u32::from(first.contains(t)));
        assert_eq!(resolve(&indicator), first);
        assert_eq!(first.to_string().parse::<DominantTraits>().unwrap(), first);
    }

    #[test]
    fn test_parse_label() {
        let d: DominantTraits = "Openness & Extraversion".parse().unwrap();
        assert_eq!(d.traits(), &[Trait::Extraversion, Trait::Openness]);
        assert!("Openness & Grit".parse::<DominantTraits>().is_err());
        assert!("".parse::<DominantTraits>().is_err());
    }

    #[test]
    fn test_parse_lenient_skips_unknown() {
        let d = DominantTraits::parse_lenient("Grit & Openness &");
        assert_eq!(d.traits(), &[Trait::Openness]);
        assert!(DominantTraits::parse_lenient("").is_empty());
    }

    #[test]
    fn test_serializes_as_joined_string() {
        let d = DominantTraits::from_traits([Trait::Openness, Trait::Neuroticism]);
        assert_eq!(
            serde_json::to_string(&d).unwrap(),
            r#""Neuroticism & Openness""#
        );
    }
}

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The five Big Five (OCEAN) personality traits.
///
/// Declaration order is the natural enumeration order used everywhere a
/// tie has to be reported: stored JSON, dominant-trait strings, dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Trait {
    Extraversion,
    Neuroticism,
    Agreeableness,
    Conscientiousness,
    Openness,
}

impl Trait {
    pub const ALL: [Trait; 5] = [
        Trait::Extraversion,
        Trait::Neuroticism,
        Trait::Agreeableness,
        Trait::Conscientiousness,
        Trait::Openness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Trait::Extraversion => "Extraversion",
            Trait::Neuroticism => "Neuroticism",
            Trait::Agreeableness => "Agreeableness",
            Trait::Conscientiousness => "Conscientiousness",
            Trait::Openness => "Openness",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown personality trait: '{0}'")]
pub struct UnknownTrait(pub String);

impl FromStr for Trait {
    type Err = UnknownTrait;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Trait::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownTrait(needle.to_string()))
    }
}

impl Serialize for Trait {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// One value per trait. Serialized as a JSON object keyed by trait name in
/// enumeration order, which is also the shape stored in
/// `student_profiles.trait_scores`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TraitMap<V> {
    values: [V; 5],
}

impl<V> TraitMap<V> {
    pub fn from_fn(f: impl FnMut(Trait) -> V) -> Self {
        Self {
            values: Trait::ALL.map(f),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Trait, &V)> {
        Trait::ALL.into_iter().zip(self.values.iter())
    }

    #[cfg(test)]
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.values.iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(Trait, &V) -> U) -> TraitMap<U> {
        TraitMap::from_fn(|t| f(t, &self.values[t.index()]))
    }
}

impl<V> Index<Trait> for TraitMap<V> {
    type Output = V;

    fn index(&self, t: Trait) -> &V {
        &self.values[t.index()]
    }
}

impl<V> IndexMut<Trait> for TraitMap<V> {
    fn index_mut(&mut self, t: Trait) -> &mut V {
        &mut self.values[t.index()]
    }
}

impl<V: Serialize> Serialize for TraitMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Trait::ALL.len()))?;
        for (t, value) in self.iter() {
            map.serialize_entry(t.name(), value)?;
        }
        map.end()
    }
}

impl<'de, V> Deserialize<'de> for TraitMap<V>
where
    V: Deserialize<'de> + Default,
{
    /// Unknown keys are skipped and absent traits take `V::default()`.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TraitMapVisitor<V>(PhantomData<V>);

        impl<'de, V> Visitor<'de> for TraitMapVisitor<V>
        where
            V: Deserialize<'de> + Default,
        {
            type Value = TraitMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object keyed by Big Five trait names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = TraitMap::<V>::default();
                while let Some(key) = access.next_key::<String>()? {
                    match key.parse::<Trait>() {
                        Ok(t) => out[t] = access.next_value()?,
                        Err(_) => {
                            access.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(TraitMapVisitor(PhantomData))
    }
}

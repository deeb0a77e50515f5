//! The fixed 50-item questionnaire key.
//!
//! Each item loads on exactly one trait, either directly or reverse-keyed.
//! This table is the only definition of the key; every upload path and
//! dashboard scores through it.

use serde::Serialize;

use crate::scoring::traits::Trait;
use crate::scoring::traits::Trait::{
    Agreeableness, Conscientiousness, Extraversion, Neuroticism, Openness,
};

pub const ITEM_COUNT: usize = 50;

/// Likert answers are 1..=5; anything else is treated as unanswered.
pub const LIKERT_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Direct,
    Reverse,
}

impl Polarity {
    /// Score contributed by one raw answer. Out-of-range answers contribute 0.
    pub fn contribution(self, raw: u8) -> u32 {
        if !LIKERT_RANGE.contains(&raw) {
            return 0;
        }
        match self {
            Polarity::Direct => u32::from(raw),
            Polarity::Reverse => 6 - u32::from(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemAssignment {
    /// 1-based questionnaire item number.
    pub item: u8,
    pub scale: Trait,
    pub polarity: Polarity,
}

const fn item(item: u8, scale: Trait, polarity: Polarity) -> ItemAssignment {
    ItemAssignment {
        item,
        scale,
        polarity,
    }
}

use Polarity::{Direct, Reverse};

pub static ITEM_ASSIGNMENTS: [ItemAssignment; ITEM_COUNT] = [
    item(1, Neuroticism, Reverse),
    item(2, Openness, Direct),
    item(3, Extraversion, Reverse),
    item(4, Agreeableness, Direct),
    item(5, Conscientiousness, Direct),
    item(6, Neuroticism, Direct),
    item(7, Openness, Reverse),
    item(8, Extraversion, Direct),
    item(9, Agreeableness, Reverse),
    item(10, Conscientiousness, Reverse),
    item(11, Neuroticism, Reverse),
    item(12, Openness, Direct),
    item(13, Extraversion, Reverse),
    item(14, Agreeableness, Direct),
    item(15, Conscientiousness, Direct),
    item(16, Neuroticism, Direct),
    item(17, Openness, Reverse),
    item(18, Extraversion, Direct),
    item(19, Agreeableness, Reverse),
    item(20, Conscientiousness, Reverse),
    item(21, Neuroticism, Reverse),
    item(22, Openness, Direct),
    item(23, Extraversion, Reverse),
    item(24, Agreeableness, Direct),
    item(25, Conscientiousness, Direct),
    item(26, Neuroticism, Direct),
    item(27, Openness, Reverse),
    item(28, Extraversion, Direct),
    item(29, Agreeableness, Reverse),
    item(30, Conscientiousness, Reverse),
    item(31, Neuroticism, Reverse),
    item(32, Openness, Direct),
    item(33, Extraversion, Reverse),
    item(34, Agreeableness, Direct),
    item(35, Conscientiousness, Direct),
    item(36, Neuroticism, Direct),
    item(37, Openness, Reverse),
    item(38, Extraversion, Direct),
    item(39, Agreeableness, Reverse),
    item(40, Conscientiousness, Reverse),
    item(41, Neuroticism, Reverse),
    item(42, Openness, Direct),
    item(43, Extraversion, Reverse),
    item(44, Agreeableness, Direct),
    item(45, Conscientiousness, Direct),
    item(46, Neuroticism, Direct),
    item(47, Openness, Reverse),
    item(48, Extraversion, Direct),
    item(49, Agreeableness, Reverse),
    item(50, Conscientiousness, Reverse),
];

/// Number of items keyed to `scale`.
pub fn items_per_trait(scale: Trait) -> u32 {
    ITEM_ASSIGNMENTS
        .iter()
        .filter(|a| a.scale == scale)
        .count() as u32
}

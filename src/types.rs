use std::fmt;

use serde::{Deserialize, Serialize};

use crate::services::scheduler::ReviewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum CefrLevel {
    #[default]
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Unknown labels fall back to A1.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "A2" => Self::A2,
            "B1" => Self::B1,
            "B2" => Self::B2,
            "C1" => Self::C1,
            "C2" => Self::C2,
            _ => Self::A1,
        }
    }

    /// Moves up (`+`) or down (`-`) the ladder, saturating at A1 and C2.
    pub fn shift(self, steps: i32) -> Self {
        let target = (self.index() as i32 + steps).clamp(0, Self::ALL.len() as i32 - 1);
        Self::from_index(target as usize)
    }

    pub fn distance(self, other: CefrLevel) -> usize {
        self.index().abs_diff(other.index())
    }

    pub fn xp_multiplier(self) -> f64 {
        match self {
            Self::A1 => 1.0,
            Self::A2 => 1.2,
            Self::B1 => 1.5,
            Self::B2 => 2.0,
            Self::C1 => 2.5,
            Self::C2 => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed interest categories a topic tag is folded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    News,
    Sports,
    Entertainment,
    Technology,
    Food,
    Travel,
    Culture,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::News,
        Category::Sports,
        Category::Entertainment,
        Category::Technology,
        Category::Food,
        Category::Travel,
        Category::Culture,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::News => &["news", "politics", "current", "events", "breaking"],
            Self::Sports => &[
                "sport", "football", "soccer", "basketball", "tennis", "athlete", "game", "team",
            ],
            Self::Entertainment => &[
                "music", "movie", "celebrity", "entertainment", "film", "show", "series", "actor",
            ],
            Self::Technology => &[
                "tech", "computer", "software", "ai", "digital", "internet", "app", "smartphone",
            ],
            Self::Food => &[
                "food", "cooking", "recipe", "restaurant", "cuisine", "chef", "meal", "dish",
            ],
            Self::Travel => &[
                "travel", "destination", "vacation", "tourism", "trip", "adventure", "explore",
            ],
            Self::Culture => &[
                "culture", "tradition", "history", "art", "museum", "heritage", "festival",
            ],
        }
    }

    /// Keyword substring match in declaration order; first hit wins, Culture otherwise.
    pub fn from_topic(topic: &str) -> Self {
        let lower = topic.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.keywords().iter().any(|k| lower.contains(k)))
            .unwrap_or(Self::Culture)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LengthPreference {
    #[default]
    Short,
    Medium,
    Long,
}

impl LengthPreference {
    /// short < 30s, medium 30..120s, long >= 120s
    pub fn matches(self, duration_seconds: u32) -> bool {
        match self {
            Self::Short => duration_seconds < 30,
            Self::Medium => (30..120).contains(&duration_seconds),
            Self::Long => duration_seconds >= 120,
        }
    }
}

/// Recall grade on the SM-2 scale: 0 = blackout, 5 = perfect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ReviewQuality(u8);

impl ReviewQuality {
    pub const MAX: u8 = 5;

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 >= 3
    }
}

impl TryFrom<u8> for ReviewQuality {
    type Error = ReviewError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            return Err(ReviewError::InvalidQuality(value));
        }
        Ok(Self(value))
    }
}

impl From<ReviewQuality> for u8 {
    fn from(value: ReviewQuality) -> Self {
        value.0
    }
}

//! Study set selection: frequency buckets, day groups and the missed set.

use crate::dataset::Dataset;
use crate::models::{Idiom, IdiomId, Progress};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Idioms per day group.
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Frequency-derived category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    #[default]
    All,
    /// Frequency 12 and above.
    High,
    /// Frequency 6 to 11.
    Mid,
    /// Frequency below 6.
    Low,
}

impl Bucket {
    /// Every bucket in display order.
    pub const ALL: [Bucket; 4] = [Bucket::All, Bucket::High, Bucket::Mid, Bucket::Low];

    /// The concrete bucket a frequency score falls in.
    pub fn of(frequency: u32) -> Self {
        match frequency {
            12.. => Self::High,
            6..=11 => Self::Mid,
            _ => Self::Low,
        }
    }

    pub fn contains(&self, idiom: &Idiom) -> bool {
        match self {
            Self::All => true,
            bucket => Self::of(idiom.frequency) == *bucket,
        }
    }

    /// Label used in config files and selection flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::High => "high",
            Self::Mid => "mid",
            Self::Low => "low",
        }
    }

    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::High => "High (12+)",
            Self::Mid => "Mid (6-11)",
            Self::Low => "Low (<6)",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|b| *b == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|b| *b == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "high" => Ok(Self::High),
            "mid" => Ok(Self::Mid),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown frequency bucket '{other}'")),
        }
    }
}

/// Idioms in `bucket`, in dataset order.
pub fn by_frequency_bucket(dataset: &[Idiom], bucket: Bucket) -> Vec<&Idiom> {
    dataset.iter().filter(|idiom| bucket.contains(idiom)).collect()
}

/// The 1-indexed `day` page of `filtered`. Day 0 reads as day 1 and pages
/// past the end are empty.
pub fn paginate_by_day<T>(filtered: &[T], day: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let start = (day.max(1) - 1).saturating_mul(page_size).min(filtered.len());
    let end = start.saturating_add(page_size).min(filtered.len());
    &filtered[start..end]
}

/// Number of day groups for `len` items. An empty set still has one (empty) day.
pub fn day_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

pub fn clamp_day(day: usize, len: usize, page_size: usize) -> usize {
    day.clamp(1, day_count(len, page_size))
}

/// Idioms whose latest quiz attempt was wrong, most-missed first.
/// Ties keep dataset order.
pub fn missed_set<'a>(dataset: &'a [Idiom], progress: &[Progress]) -> Vec<&'a Idiom> {
    let wrong_counts: HashMap<IdiomId, u32> = progress
        .iter()
        .filter(|p| p.is_missed())
        .map(|p| (p.idiom_id, p.quiz_wrong_count))
        .collect();

    let mut missed: Vec<&Idiom> = dataset
        .iter()
        .filter(|idiom| wrong_counts.contains_key(&idiom.id))
        .collect();
    missed.sort_by_key(|idiom| Reverse(wrong_counts[&idiom.id]));
    missed
}

/// What a study or quiz screen works through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// One day group of a frequency bucket.
    Day { bucket: Bucket, day: usize },
    /// The missed set.
    Missed,
    /// A single idiom, e.g. opened from the missed list.
    Single(IdiomId),
}

impl Selection {
    /// Whether resolving needs the progress table.
    pub fn needs_progress(&self) -> bool {
        matches!(self, Self::Missed)
    }

    /// The ordered idioms this selection names. May be empty.
    pub fn resolve(&self, dataset: &Dataset, progress: &[Progress], page_size: usize) -> Vec<Idiom> {
        match *self {
            Self::Day { bucket, day } => {
                let filtered = by_frequency_bucket(dataset.idioms(), bucket);
                paginate_by_day(&filtered, day, page_size)
                    .iter()
                    .map(|idiom| (*idiom).clone())
                    .collect()
            }
            Self::Missed => missed_set(dataset.idioms(), progress)
                .into_iter()
                .cloned()
                .collect(),
            Self::Single(id) => dataset.get(id).cloned().into_iter().collect(),
        }
    }

    /// Short description for headers.
    pub fn describe(&self) -> String {
        match self {
            Self::Day { bucket, day } => format!("{} - day {}", bucket.name(), day),
            Self::Missed => "Missed".to_string(),
            Self::Single(_) => "Single idiom".to_string(),
        }
    }
}

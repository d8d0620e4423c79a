//! Data models for the idiom trainer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Idiom identifier, also the progress store key.
pub type IdiomId = i64;

/// An entry of the reference dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idiom {
    /// Unique identifier.
    pub id: IdiomId,
    /// Display text.
    pub word: String,
    /// Usage-frequency score. Missing scores count as zero.
    #[serde(default)]
    pub frequency: u32,
    /// Explanatory text.
    pub definition: String,
    /// Optional romanization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinyin: Option<String>,
    /// Precomputed definition options, correct one included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Idiom {
    /// Create an idiom without pinyin or precomputed options.
    pub fn new(
        id: IdiomId,
        word: impl Into<String>,
        frequency: u32,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            id,
            word: word.into(),
            frequency,
            definition: definition.into(),
            pinyin: None,
            options: None,
        }
    }

    /// Set precomputed definition options.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Set pinyin.
    pub fn with_pinyin(mut self, pinyin: impl Into<String>) -> Self {
        self.pinyin = Some(pinyin.into());
        self
    }

    /// Precomputed options, if present and non-empty.
    pub fn precomputed_options(&self) -> Option<&[String]> {
        self.options.as_deref().filter(|opts| !opts.is_empty())
    }
}

/// Learning status of an idiom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Never studied or quizzed.
    #[default]
    New,
    /// Seen at least once.
    Learning,
    /// Marked as mastered by the user.
    Mastered,
}

impl Status {
    /// Storage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Mastered => "mastered",
        }
    }

    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Learning => "Learning",
            Self::Mastered => "Mastered",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "learning" => Ok(Self::Learning),
            "mastered" => Ok(Self::Mastered),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Per-idiom study statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Idiom this record belongs to.
    pub idiom_id: IdiomId,
    /// Current status.
    pub status: Status,
    /// Last study or quiz interaction.
    pub last_reviewed: Option<DateTime<Utc>>,
    /// Study reveals plus quiz answers.
    pub review_count: u32,
    /// Flashcard definition reveals.
    pub study_count: u32,
    /// Correct quiz answers.
    pub quiz_correct_count: u32,
    /// Wrong quiz answers.
    pub quiz_wrong_count: u32,
    /// Outcome of the latest quiz attempt.
    pub last_quiz_result: Option<bool>,
    /// Option picked in the latest quiz attempt.
    pub last_selected_option_idx: Option<usize>,
}

impl Progress {
    /// The record an idiom has before any interaction.
    pub fn new(idiom_id: IdiomId) -> Self {
        Self {
            idiom_id,
            status: Status::New,
            last_reviewed: None,
            review_count: 0,
            study_count: 0,
            quiz_correct_count: 0,
            quiz_wrong_count: 0,
            last_quiz_result: None,
            last_selected_option_idx: None,
        }
    }

    /// Whether the latest quiz attempt was wrong.
    pub fn is_missed(&self) -> bool {
        self.last_quiz_result == Some(false)
    }

    /// Record an interaction at `now`, promoting `New` to `Learning`.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.review_count += 1;
        self.last_reviewed = Some(now);
        if self.status == Status::New {
            self.status = Status::Learning;
        }
    }
}

/// Aggregate counts over all progress records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSummary {
    /// Records with status `Mastered`.
    pub mastered: usize,
    /// Records with status `Learning`.
    pub learning: usize,
    /// Records whose latest quiz attempt was wrong.
    pub missed: usize,
}

impl ProgressSummary {
    /// Tally a set of records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Progress>) -> Self {
        records.into_iter().fold(Self::default(), |mut acc, p| {
            match p.status {
                Status::Mastered => acc.mastered += 1,
                Status::Learning => acc.learning += 1,
                Status::New => {}
            }
            if p.is_missed() {
                acc.missed += 1;
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_progress() {
        let p = Progress::new(7);
        assert_eq!(p.status, Status::New);
        assert_eq!(p.review_count, 0);
        assert_eq!(p.last_quiz_result, None);
        assert!(!p.is_missed());
    }

    #[test]
    fn test_status_labels() {
        for status in [Status::New, Status::Learning, Status::Mastered] {
            assert_eq!(status.as_str().parse::<Status>(), Ok(status));
        }
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn test_idiom_missing_frequency() {
        let idiom: Idiom =
            serde_json::from_str(r#"{"id": 1, "word": "画蛇添足", "definition": "多此一举"}"#)
                .unwrap();
        assert_eq!(idiom.frequency, 0);
        assert!(idiom.precomputed_options().is_none());
    }

    #[test]
    fn test_empty_options_are_ignored() {
        let idiom = Idiom::new(1, "a", 3, "b").with_options(Vec::<String>::new());
        assert!(idiom.precomputed_options().is_none());
    }

    #[test]
    fn test_summary() {
        let mut a = Progress::new(1);
        a.status = Status::Mastered;
        let mut b = Progress::new(2);
        b.status = Status::Learning;
        b.last_quiz_result = Some(false);
        let c = Progress::new(3);

        let summary = ProgressSummary::from_records([&a, &b, &c]);
        assert_eq!(
            summary,
            ProgressSummary {
                mastered: 1,
                learning: 1,
                missed: 1
            }
        );
    }
}

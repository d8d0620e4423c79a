//! # idiom-core
//!
//! Study and quiz engine for the idiom trainer.
//!
//! ## Features
//!
//! - Read-only reference dataset loaded from JSON
//! - SQLite-backed progress store keyed by idiom id
//! - Progress service applying study, quiz and mastery updates
//! - Frequency buckets, day groups and the missed set
//! - Multiple-choice quiz generation with an injectable random source

mod dataset;
mod error;
mod models;
mod quiz;
mod selection;
mod service;
mod store;

pub use dataset::{Dataset, BUNDLED_DATASET};
pub use error::{DatasetError, DatasetResult, StoreError, StoreResult};
pub use models::{Idiom, IdiomId, Progress, ProgressSummary, Status};
pub use quiz::{AnswerState, Question, QuizGenerator, QuizMode, QuizOption, QuizSession};
pub use selection::{
    by_frequency_bucket, clamp_day, day_count, missed_set, paginate_by_day, Bucket, Selection,
    DEFAULT_PAGE_SIZE,
};
pub use service::ProgressService;
pub use store::ProgressStore;

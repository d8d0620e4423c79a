//! Progress update rules on top of the store.

use crate::error::StoreResult;
use crate::models::{IdiomId, Progress, ProgressSummary, Status};
use crate::store::ProgressStore;
use chrono::Utc;
use std::collections::HashMap;

/// Business operations over a borrowed [`ProgressStore`].
///
/// Reads synthesize [`Progress::new`] for idioms without a record. Every
/// mutation is a single atomic read-modify-write of one record.
#[derive(Clone, Copy)]
pub struct ProgressService<'a> {
    store: &'a ProgressStore,
}

impl<'a> ProgressService<'a> {
    pub fn new(store: &'a ProgressStore) -> Self {
        Self { store }
    }

    /// Stored record or the default. The default is not persisted.
    pub fn get_by_id(&self, id: IdiomId) -> StoreResult<Progress> {
        Ok(self.store.get(id)?.unwrap_or_else(|| Progress::new(id)))
    }

    /// Records for `ids`, filled with defaults, from a single table scan.
    pub fn get_batch(&self, ids: &[IdiomId]) -> StoreResult<HashMap<IdiomId, Progress>> {
        let mut stored: HashMap<IdiomId, Progress> = self
            .store
            .get_all()?
            .into_iter()
            .map(|p| (p.idiom_id, p))
            .collect();

        Ok(ids
            .iter()
            .map(|&id| (id, stored.remove(&id).unwrap_or_else(|| Progress::new(id))))
            .collect())
    }

    pub fn get_all(&self) -> StoreResult<Vec<Progress>> {
        self.store.get_all()
    }

    /// Count a flashcard definition reveal.
    pub fn record_study(&self, id: IdiomId) -> StoreResult<Progress> {
        let updated = self.store.update(id, |current| {
            let mut p = current.unwrap_or_else(|| Progress::new(id));
            p.study_count += 1;
            p.touch(Utc::now());
            p
        })?;
        tracing::debug!(idiom_id = id, study_count = updated.study_count, "recorded study");
        Ok(updated)
    }

    /// Count a quiz answer. Only the latest outcome and selection are kept.
    pub fn record_quiz_result(
        &self,
        id: IdiomId,
        is_correct: bool,
        selected_idx: usize,
    ) -> StoreResult<Progress> {
        let updated = self.store.update(id, |current| {
            let mut p = current.unwrap_or_else(|| Progress::new(id));
            if is_correct {
                p.quiz_correct_count += 1;
            } else {
                p.quiz_wrong_count += 1;
            }
            p.last_quiz_result = Some(is_correct);
            p.last_selected_option_idx = Some(selected_idx);
            p.touch(Utc::now());
            p
        })?;
        tracing::debug!(idiom_id = id, is_correct, selected_idx, "recorded quiz result");
        Ok(updated)
    }

    /// Flip between `Mastered` and `Learning`; any non-mastered status
    /// becomes `Mastered`. Returns whether the idiom is now mastered.
    pub fn toggle_mastered(&self, id: IdiomId) -> StoreResult<bool> {
        let updated = self.store.update(id, |current| {
            let mut p = current.unwrap_or_else(|| Progress::new(id));
            p.status = match p.status {
                Status::Mastered => Status::Learning,
                Status::New | Status::Learning => Status::Mastered,
            };
            p.last_reviewed = Some(Utc::now());
            p
        })?;
        let mastered = updated.status == Status::Mastered;
        tracing::debug!(idiom_id = id, mastered, "toggled mastery");
        Ok(mastered)
    }

    /// Mastered, learning and missed counts over the whole table.
    pub fn summary(&self) -> StoreResult<ProgressSummary> {
        Ok(ProgressSummary::from_records(&self.store.get_all()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ProgressStore {
        ProgressStore::in_memory().unwrap()
    }

    #[test]
    fn test_untouched_idiom_has_default_record() {
        let store = store();
        let service = ProgressService::new(&store);

        let p = service.get_by_id(11).unwrap();
        assert_eq!(p, Progress::new(11));
        assert_eq!(p.status, Status::New);
        assert_eq!(p.last_quiz_result, None);
        // Reading never persists the default.
        assert!(store.get(11).unwrap().is_none());
    }

    #[test]
    fn test_record_study_twice() {
        let store = store();
        let service = ProgressService::new(&store);

        let first = service.record_study(1).unwrap();
        assert_eq!(first.status, Status::Learning);

        service.record_study(1).unwrap();
        let p = service.get_by_id(1).unwrap();
        assert_eq!(p.study_count, 2);
        assert_eq!(p.review_count, 2);
        assert_eq!(p.status, Status::Learning);
        assert!(p.last_reviewed.is_some());
    }

    #[test]
    fn test_record_study_keeps_mastered() {
        let store = store();
        let service = ProgressService::new(&store);

        assert!(service.toggle_mastered(1).unwrap());
        service.record_study(1).unwrap();
        assert_eq!(service.get_by_id(1).unwrap().status, Status::Mastered);
    }

    #[test]
    fn test_quiz_results_keep_only_latest_outcome() {
        let store = store();
        let service = ProgressService::new(&store);

        service.record_quiz_result(4, true, 2).unwrap();
        service.record_quiz_result(4, false, 1).unwrap();

        let p = service.get_by_id(4).unwrap();
        assert_eq!(p.quiz_correct_count, 1);
        assert_eq!(p.quiz_wrong_count, 1);
        assert_eq!(p.last_quiz_result, Some(false));
        assert_eq!(p.last_selected_option_idx, Some(1));
        assert_eq!(p.review_count, 2);
        assert_eq!(p.study_count, 0);
        assert_eq!(p.status, Status::Learning);
    }

    #[test]
    fn test_toggle_from_new() {
        let store = store();
        let service = ProgressService::new(&store);

        assert!(service.toggle_mastered(3).unwrap());
        assert_eq!(service.get_by_id(3).unwrap().status, Status::Mastered);
        assert!(!service.toggle_mastered(3).unwrap());
        assert_eq!(service.get_by_id(3).unwrap().status, Status::Learning);
    }

    #[test]
    fn test_toggle_twice_from_mastered() {
        let store = store();
        let service = ProgressService::new(&store);
        let mut p = Progress::new(8);
        p.status = Status::Mastered;
        store.put(&p).unwrap();

        service.toggle_mastered(8).unwrap();
        service.toggle_mastered(8).unwrap();
        assert_eq!(service.get_by_id(8).unwrap().status, Status::Mastered);
    }

    #[test]
    fn test_toggle_does_not_count_review() {
        let store = store();
        let service = ProgressService::new(&store);

        service.toggle_mastered(2).unwrap();
        let p = service.get_by_id(2).unwrap();
        assert_eq!(p.review_count, 0);
        assert!(p.last_reviewed.is_some());
    }

    #[test]
    fn test_get_batch_fills_defaults() {
        let store = store();
        let service = ProgressService::new(&store);
        service.record_study(1).unwrap();
        service.record_study(99).unwrap();

        let batch = service.get_batch(&[1, 2]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[&1].study_count, 1);
        assert_eq!(batch[&2], Progress::new(2));
    }

    #[test]
    fn test_summary_counts() {
        let store = store();
        let service = ProgressService::new(&store);
        service.record_study(1).unwrap();
        service.record_quiz_result(2, false, 0).unwrap();
        service.toggle_mastered(3).unwrap();

        let summary = service.summary().unwrap();
        assert_eq!(summary.learning, 2);
        assert_eq!(summary.mastered, 1);
        assert_eq!(summary.missed, 1);
    }
}

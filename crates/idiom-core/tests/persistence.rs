use idiom_core::{
    missed_set, Dataset, ProgressService, ProgressStore, Selection, Status, StoreError,
    DEFAULT_PAGE_SIZE,
};

#[test]
fn progress_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("progress.db");

    {
        let store = ProgressStore::open(&path).unwrap();
        let service = ProgressService::new(&store);
        service.record_study(1).unwrap();
        service.record_quiz_result(2, false, 3).unwrap();
        service.toggle_mastered(3).unwrap();
        store.close().unwrap();
    }

    let store = ProgressStore::open(&path).unwrap();
    let service = ProgressService::new(&store);
    assert_eq!(service.get_by_id(1).unwrap().study_count, 1);
    assert_eq!(service.get_by_id(2).unwrap().last_selected_option_idx, Some(3));
    assert_eq!(service.get_by_id(3).unwrap().status, Status::Mastered);
    assert_eq!(store.get_all().unwrap().len(), 3);
}

#[test]
fn unusable_path_reports_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let result = ProgressStore::open(&blocker.join("progress.db"));
    assert!(matches!(result, Err(StoreError::Directory { .. })));
}

#[test]
fn missed_quiz_answers_feed_missed_selection() {
    let dataset = Dataset::bundled().unwrap();
    let store = ProgressStore::in_memory().unwrap();
    let service = ProgressService::new(&store);
    let first = dataset.idioms()[0].id;
    let second = dataset.idioms()[1].id;

    service.record_quiz_result(second, false, 0).unwrap();
    service.record_quiz_result(first, false, 0).unwrap();
    service.record_quiz_result(first, false, 1).unwrap();

    let progress = service.get_all().unwrap();
    let missed: Vec<i64> = missed_set(dataset.idioms(), &progress)
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(missed, vec![first, second]);

    // A correct answer takes the idiom out of the missed set.
    service.record_quiz_result(first, true, 2).unwrap();
    let progress = service.get_all().unwrap();
    let resolved = Selection::Missed.resolve(&dataset, &progress, DEFAULT_PAGE_SIZE);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, second);
}

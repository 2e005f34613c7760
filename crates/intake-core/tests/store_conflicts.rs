use intake_core::errors::StoreError;
use intake_core::storage::Store;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::tempdir;

fn envelope(run_id: &str, submitted: &str) -> Value {
    json!({
        "schema_version": "3.0",
        "result_data": {
            "run_identity": {
                "tool_name": "forgecli",
                "run_id": run_id,
                "run_number": 1
            },
            "submission": {
                "submitted_timestamp": submitted,
                "submitted_by": "runner-bot",
                "submission_method": "automated"
            }
        }
    })
}

fn files_under(root: &Path) -> Vec<std::path::PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

#[test]
fn partition_is_derived_from_the_submission_timestamp() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let store = Store::new(dir.path().join("submissions"));

    let report = store
        .store(&envelope("forgecli_A_1", "2025-03-02T00:00:00Z"))
        .expect("store succeeds");

    assert_eq!(report.partition_year, 2025);
    assert_eq!(report.partition_month, 3);
    assert!(report
        .absolute_path
        .ends_with("2025/03/forgecli_A_1.json"));
    assert!(!report.duplicate_removed);
    Ok(())
}

#[test]
fn stored_record_round_trips_byte_identical() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let store = Store::new(dir.path().join("submissions"));
    let record = envelope("forgecli_A_rt", "2025-03-02T08:00:00Z");

    let report = store.store(&record).expect("store succeeds");
    let on_disk = std::fs::read_to_string(&report.absolute_path)?;
    let parsed: Value = serde_json::from_str(&on_disk)?;
    assert_eq!(parsed, record);

    // Re-storing the same record reproduces the same bytes.
    let report2 = store.store(&record).expect("idempotent re-store");
    let on_disk2 = std::fs::read_to_string(&report2.absolute_path)?;
    assert_eq!(on_disk, on_disk2);
    Ok(())
}

#[test]
fn newer_submission_replaces_the_older_one() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("submissions");
    let store = Store::new(&root);

    let older = envelope("forgecli_A_2", "2025-01-10T00:00:00Z");
    let newer = envelope("forgecli_A_2", "2025-02-20T00:00:00Z");

    store.store(&older).expect("older stores cleanly");
    let second = store.store(&newer).expect("newer replaces older");

    assert!(second.duplicate_removed);
    let removed = second.removed_file.as_deref().expect("removed file path");
    assert!(removed.ends_with("2025/01/forgecli_A_2.json"));

    let files = files_under(&root);
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("2025/02/forgecli_A_2.json"));

    let kept: Value = serde_json::from_str(&std::fs::read_to_string(&files[0])?)?;
    assert_eq!(kept, newer);
    Ok(())
}

#[test]
fn stale_submission_is_rejected_and_the_store_is_untouched() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("submissions");
    let store = Store::new(&root);

    let newer = envelope("forgecli_A_3", "2025-02-20T00:00:00Z");
    let older = envelope("forgecli_A_3", "2025-01-10T00:00:00Z");

    store.store(&newer).expect("newer stores cleanly");
    let before = files_under(&root);

    let err = store.store(&older).expect_err("older must be rejected");
    match err {
        StoreError::StaleSubmission {
            run_id,
            existing_timestamp,
            ..
        } => {
            assert_eq!(run_id, "forgecli_A_3");
            assert_eq!(existing_timestamp, "2025-02-20T00:00:00Z");
        }
        other => panic!("expected StaleSubmission, got {:?}", other),
    }

    let after = files_under(&root);
    assert_eq!(before, after);
    let kept: Value = serde_json::from_str(&std::fs::read_to_string(&after[0])?)?;
    assert_eq!(kept, newer);
    Ok(())
}

#[test]
fn equal_timestamps_replace_rather_than_reject() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let store = Store::new(dir.path().join("submissions"));
    let record = envelope("forgecli_A_4", "2025-05-05T05:05:05Z");

    store.store(&record).expect("first store");
    let report = store.store(&record).expect("equal timestamp replaces");
    assert!(report.duplicate_removed);
    Ok(())
}

#[test]
fn misfiled_duplicates_in_other_partitions_are_cleared() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("submissions");

    // Simulate a historical misfiling: an older copy sitting in 2024/12.
    let misfiled_dir = root.join("2024").join("12");
    std::fs::create_dir_all(&misfiled_dir)?;
    let misfiled = misfiled_dir.join("forgecli_A_5.json");
    std::fs::write(
        &misfiled,
        serde_json::to_string_pretty(&envelope("forgecli_A_5", "2024-12-01T00:00:00Z"))?,
    )?;

    let store = Store::new(&root);
    let report = store
        .store(&envelope("forgecli_A_5", "2025-06-15T00:00:00Z"))
        .expect("newer submission stores");

    assert!(report.duplicate_removed);
    assert_eq!(report.removed_file.as_deref(), Some(misfiled.display().to_string().as_str()));
    assert!(!misfiled.exists());

    let files = files_under(&root);
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("2025/06/forgecli_A_5.json"));
    Ok(())
}

#[test]
fn unreadable_duplicates_count_as_older() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("submissions");

    let junk_dir = root.join("2025").join("01");
    std::fs::create_dir_all(&junk_dir)?;
    std::fs::write(junk_dir.join("forgecli_A_6.json"), "not json at all")?;

    let store = Store::new(&root);
    let report = store
        .store(&envelope("forgecli_A_6", "2025-01-02T00:00:00Z"))
        .expect("corrupt duplicate never blocks a valid write");
    assert!(report.duplicate_removed);
    assert_eq!(files_under(&root).len(), 1);
    Ok(())
}

#[test]
fn unparseable_timestamp_is_a_structured_error() {
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path().join("submissions"));

    let err = store
        .store(&envelope("forgecli_A_7", "02/03/2025 10:00"))
        .expect_err("bad timestamp");
    assert!(matches!(err, StoreError::TimestampUnparseable { .. }));

    let err = store
        .store(&json!({"result_data": {}}))
        .expect_err("missing identity");
    assert!(matches!(err, StoreError::MissingField { .. }));
}

use std::fs;
use std::sync::Arc;
use std::thread;

use checklists::item::MAX_NESTING_LEVEL;
use checklists::storage::{Storage, DATA_FILE_NAME};
use checklists::{Document, DocumentStore, Error, TickMode};

fn store_in(dir: &tempfile::TempDir) -> DocumentStore {
    DocumentStore::new(Storage::new(dir.path().join(DATA_FILE_NAME)), 5000)
}

#[test]
fn concurrent_updates_are_not_lost() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = Arc::new(store_in(&dir));
    let id = store
        .update(|document| document.create("Shared", &[], None))?
        .value;

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for step in 0..5 {
                    store
                        .update(|document| {
                            document
                                .get_mut(id)?
                                .add_item(&format!("w{worker}-{step}"), None)
                        })
                        .expect("update");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker");
    }

    let document = store.snapshot();
    assert_eq!(document.get(id)?.items.len(), 40);
    Ok(())
}

#[test]
fn failed_mutation_leaves_file_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = store_in(&dir);
    store.update(|document| Ok(document.seed_sample_if_empty()))?;
    let before = fs::read_to_string(store.storage().data_file())?;

    let err = store
        .update(|document| {
            let id = document.checklists[0].id;
            let checklist = document.get_mut(id)?;
            let bag = checklist.items[0].id;
            let sock = checklist.items[0].children[3].id;
            checklist.title = "changed before failing".to_string();
            checklist.move_item(bag, Some(sock))
        })
        .expect_err("cycle");
    assert!(matches!(err, Error::InvalidMove { .. }));
    assert_eq!(fs::read_to_string(store.storage().data_file())?, before);
    Ok(())
}

#[test]
fn corrupt_file_is_backed_up_before_overwrite() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = store_in(&dir);
    fs::write(store.storage().data_file(), "{ not json")?;

    assert!(store.snapshot().is_empty());
    let outcome = store.update(|document| document.create("Fresh start", &[], None))?;
    assert!(outcome.warning.is_none());

    let backups: Vec<_> = fs::read_dir(dir.path())?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().contains(".corrupt-"))
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(backups[0].path())?, "{ not json");
    assert_eq!(store.snapshot().checklists[0].title, "Fresh start");
    Ok(())
}

#[test]
fn persisted_document_reloads_equal() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = store_in(&dir);
    store.update(|document| {
        document.seed_sample_if_empty();
        let id = document.checklists[1].id;
        let checklist = document.get_mut(id)?;
        let milk = checklist.resolve_item("Milk")?;
        checklist.toggle_first_tick(milk, TickMode::Manual)?;
        let dairy = checklist.resolve_item("Dairy")?;
        checklist.toggle_expanded(dairy)?;
        Ok(())
    })?;

    let text = fs::read_to_string(store.storage().data_file())?;
    let reloaded = Document::from_json(&text)?;
    assert_eq!(reloaded, store.snapshot());
    assert!(!reloaded.checklists[1].items[1].is_expanded);
    Ok(())
}

#[test]
fn deepest_allowed_chain_survives_reload() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = store_in(&dir);
    let id = store
        .update(|document| document.create("Deep", &[], None))?
        .value;

    let mut parent = None;
    for level in 0..=MAX_NESTING_LEVEL {
        let outcome = store.update(|document| {
            document
                .get_mut(id)?
                .add_item(&format!("level {level}"), parent)
        })?;
        assert!(outcome.warning.is_none());
        parent = Some(outcome.value);

        let reloaded = store.snapshot();
        assert_eq!(reloaded.get(id)?.item_count(), level as usize + 1);
    }

    let err = store
        .update(|document| document.get_mut(id)?.add_item("one too many", parent))
        .expect_err("past the cap");
    assert!(matches!(err, Error::NestingTooDeep { max, .. } if max == MAX_NESTING_LEVEL));

    let text = fs::read_to_string(store.storage().data_file())?;
    let reloaded = Document::from_json(&text)?;
    assert_eq!(reloaded.get(id)?.items[0].height(), MAX_NESTING_LEVEL);
    Ok(())
}

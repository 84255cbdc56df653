//! Multi-step store scenarios through the public API: ordering, optimistic
//! mutations settling out of order, and persistence across a restart.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use todo_core::{
    DateFilter, FileStorage, ManualClock, MemoryStorage, NewTodo, SortKey, SortOrder, TodoPatch,
    TodoStore,
};

fn store() -> (TodoStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()));
    (TodoStore::new(clock.clone()), clock)
}

fn names(store: &TodoStore) -> Vec<String> {
    store.visible().into_iter().map(|t| t.name).collect()
}

#[test]
fn created_at_desc_survives_a_delete() {
    let (mut store, clock) = store();
    let mut ids = Vec::new();
    for name in ["First", "Second", "Third"] {
        ids.push(store.add(NewTodo::named(name)).unwrap());
        clock.advance(Duration::minutes(1));
    }
    store.set_sort(SortKey::CreatedAt, SortOrder::Desc);
    assert_eq!(names(&store), vec!["Third", "Second", "First"]);

    store.delete(&ids[1]);
    assert_eq!(names(&store), vec!["Third", "First"]);
}

#[test]
fn name_sort_is_case_insensitive() {
    let (mut store, _) = store();
    for name in ["banana", "Apple", "cherry"] {
        store.add(NewTodo::named(name)).unwrap();
    }
    store.set_sort(SortKey::Name, SortOrder::Asc);
    assert_eq!(names(&store), vec!["Apple", "banana", "cherry"]);
}

#[test]
fn overdue_filter_follows_completion() {
    let (mut store, clock) = store();
    let id = store
        .add(NewTodo::named("Pay rent").with_due_date(NaiveDate::from_ymd_opt(2024, 1, 12).unwrap()))
        .unwrap();
    store.add(NewTodo::named("Someday")).unwrap();
    store.set_date_filter(DateFilter::Overdue);
    assert!(names(&store).is_empty());

    clock.advance(Duration::days(5));
    assert_eq!(names(&store), vec!["Pay rent"]);

    store.toggle(&id);
    assert!(names(&store).is_empty());
}

#[test]
fn out_of_order_settlement_keeps_later_work() {
    let (mut store, clock) = store();
    let id = store.add(NewTodo::named("Draft")).unwrap();
    clock.advance(Duration::seconds(1));

    let rename = store
        .begin_update(&id, TodoPatch::default().name("Final"))
        .unwrap()
        .unwrap();
    clock.advance(Duration::seconds(1));
    let complete = store
        .begin_update(&id, TodoPatch::default().completed(true))
        .unwrap()
        .unwrap();
    let create = store.begin_create(NewTodo::named("Another")).unwrap();

    // The completion lands first, then the rename fails, then the create lands.
    assert!(store.commit(complete, None));
    store.rollback(rename);
    let mut server = store.get(create.id()).unwrap().clone();
    server.id = "55".into();
    assert!(store.commit(create, Some(&server)));

    let todo = store.get(&id).unwrap();
    assert_eq!(todo.name, "Draft");
    assert!(todo.completed);
    assert_eq!(store.get("55").unwrap().name, "Another");
}

#[test]
fn only_the_collection_is_persisted() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();

    let (mut before, _) = store();
    before.add(NewTodo::named("Survives restart").with_time("06:30")).unwrap();
    before.add(NewTodo::named("Also survives")).unwrap();
    before.set_sort(SortKey::Name, SortOrder::Asc);
    before.set_search_query("also");
    before.save(&storage).unwrap();

    let (mut after, _) = store();
    assert!(after.load(&storage).unwrap());
    assert_eq!(after.todos(), before.todos());
    assert_eq!(after.filters().search_query, "");
    assert_eq!(after.filters().sort_by, SortKey::CreatedAt);
    assert_eq!(after.pagination().total_items, 2);
}

#[test]
fn loading_from_empty_storage_keeps_store_untouched() {
    let storage = MemoryStorage::new();
    let (mut store, _) = store();
    store.add(NewTodo::named("Local only")).unwrap();
    assert!(!store.load(&storage).unwrap());
    assert_eq!(store.todos().len(), 1);
}

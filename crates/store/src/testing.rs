use bytes::Bytes;
use chrono::Duration;

use ephemera_core::{
    Clock, ContentBody, ContentEntry, ContentError, ContentId, FileContent, ManualClock,
    TextContent,
};

use crate::store::ContentStore;

const TTL_MINUTES: i64 = 10;

fn text_entry(clock: &ManualClock, id: &str) -> ContentEntry {
    ContentEntry::new(
        ContentId::new(id),
        clock.now(),
        Duration::minutes(TTL_MINUTES),
        ContentBody::Text(TextContent {
            raw_content: format!("text for {id}"),
            rendered_content: format!("text for {id}"),
            is_markdown: false,
            link_metadata: None,
        }),
    )
}

fn file_entry(clock: &ManualClock, id: &str, payload: &'static [u8]) -> ContentEntry {
    ContentEntry::new(
        ContentId::new(id),
        clock.now(),
        Duration::minutes(TTL_MINUTES),
        ContentBody::File(FileContent {
            filename: format!("{id}.bin"),
            mime_type: "application/octet-stream".into(),
            size_bytes: payload.len() as u64,
            payload: Bytes::from_static(payload),
        }),
    )
}

/// Run the full content store conformance test suite.
///
/// `store` must be empty and read its time from `clock`. The suite moves
/// the clock forward, so give it a dedicated instance.
///
/// # Errors
///
/// Returns an error if a store operation fails unexpectedly. Assertion
/// failures panic.
pub fn run_store_conformance_tests(
    store: &dyn ContentStore,
    clock: &ManualClock,
) -> Result<(), ContentError> {
    test_get_missing(store)?;
    test_insert_and_get(store, clock)?;
    test_duplicate_insert(store, clock)?;
    test_remove(store, clock)?;
    test_list_newest_first(store, clock)?;
    test_lazy_eviction(store, clock)?;
    test_sweep_idempotent(store, clock)?;
    test_list_live_at_matches_sweep(store, clock)?;
    test_payload_survives_lookup(store, clock)?;
    Ok(())
}

fn test_get_missing(store: &dyn ContentStore) -> Result<(), ContentError> {
    let id = ContentId::new("conf-missing");
    assert_eq!(store.get(&id), Err(ContentError::NotFound(id.clone())));
    Ok(())
}

fn test_insert_and_get(store: &dyn ContentStore, clock: &ManualClock) -> Result<(), ContentError> {
    let entry = text_entry(clock, "conf-insert");
    let id = store.insert(entry.clone())?;
    assert_eq!(id.as_str(), "conf-insert");
    let found = store.get(&id)?;
    assert_eq!(*found, entry);
    assert!(store.remove(&id));
    Ok(())
}

fn test_duplicate_insert(store: &dyn ContentStore, clock: &ManualClock) -> Result<(), ContentError> {
    let id = store.insert(text_entry(clock, "conf-dup"))?;
    let err = store.insert(text_entry(clock, "conf-dup")).unwrap_err();
    assert_eq!(err, ContentError::DuplicateId(id.clone()));
    assert!(store.remove(&id));
    Ok(())
}

fn test_remove(store: &dyn ContentStore, clock: &ManualClock) -> Result<(), ContentError> {
    let id = store.insert(text_entry(clock, "conf-remove"))?;
    assert!(store.remove(&id), "remove should report an existing entry");
    assert!(!store.remove(&id), "second remove should be a no-op");
    assert_eq!(store.get(&id), Err(ContentError::NotFound(id)));
    Ok(())
}

fn test_list_newest_first(store: &dyn ContentStore, clock: &ManualClock) -> Result<(), ContentError> {
    let a = store.insert(text_entry(clock, "conf-list-a"))?;
    clock.advance(Duration::seconds(1));
    let b = store.insert(text_entry(clock, "conf-list-b"))?;
    clock.advance(Duration::seconds(1));
    let c = store.insert(text_entry(clock, "conf-list-c"))?;

    let listed: Vec<ContentId> = store.list_all().iter().map(|e| e.id().clone()).collect();
    assert_eq!(listed, vec![c.clone(), b.clone(), a.clone()]);

    for id in [a, b, c] {
        store.remove(&id);
    }
    assert!(store.is_empty());
    Ok(())
}

fn test_lazy_eviction(store: &dyn ContentStore, clock: &ManualClock) -> Result<(), ContentError> {
    let id = store.insert(text_entry(clock, "conf-lazy"))?;
    clock.advance(Duration::minutes(TTL_MINUTES));

    assert!(
        store.list_all().is_empty(),
        "expired entry should be hidden from listings"
    );
    assert_eq!(store.len(), 1, "listing must not evict");

    assert_eq!(store.get(&id), Err(ContentError::Expired(id.clone())));
    assert_eq!(store.get(&id), Err(ContentError::NotFound(id)));
    assert!(store.is_empty());
    Ok(())
}

fn test_sweep_idempotent(store: &dyn ContentStore, clock: &ManualClock) -> Result<(), ContentError> {
    let old = store.insert(text_entry(clock, "conf-sweep-old"))?;
    clock.advance(Duration::minutes(TTL_MINUTES / 2));
    let young = store.insert(text_entry(clock, "conf-sweep-young"))?;
    clock.advance(Duration::minutes(TTL_MINUTES / 2));

    let now = clock.now();
    assert_eq!(store.sweep_expired(now), vec![old]);
    assert!(store.sweep_expired(now).is_empty(), "second sweep removes nothing");

    assert!(store.get(&young).is_ok());
    assert!(store.remove(&young));
    Ok(())
}

fn test_list_live_at_matches_sweep(
    store: &dyn ContentStore,
    clock: &ManualClock,
) -> Result<(), ContentError> {
    let id = store.insert(text_entry(clock, "conf-live-at"))?;
    let expires_at = clock.now() + Duration::minutes(TTL_MINUTES);
    let just_before = expires_at - Duration::milliseconds(1);

    // Independent of the store's own clock.
    clock.advance(Duration::minutes(TTL_MINUTES * 2));
    assert!(store.list_all().is_empty());
    let listed: Vec<ContentId> = store
        .list_live_at(just_before)
        .iter()
        .map(|e| e.id().clone())
        .collect();
    assert_eq!(listed, vec![id.clone()]);
    assert!(store.list_live_at(expires_at).is_empty());

    // Whatever survives a sweep at `now` is listed at `now`.
    assert!(store.sweep_expired(just_before).is_empty());
    assert_eq!(store.list_live_at(just_before).len(), 1);
    assert_eq!(store.sweep_expired(expires_at), vec![id]);
    assert!(store.is_empty());
    Ok(())
}

fn test_payload_survives_lookup(
    store: &dyn ContentStore,
    clock: &ManualClock,
) -> Result<(), ContentError> {
    let id = store.insert(file_entry(clock, "conf-file", b"\x00\x01\x02"))?;
    let found = store.get(&id)?;
    assert_eq!(found.payload().map(|p| p.as_ref()), Some(&b"\x00\x01\x02"[..]));

    let listed = store.list_all();
    assert_eq!(listed.len(), 1);
    assert!(store.remove(&id));
    Ok(())
}

//! End-to-end tests for `SearchEngine` against in-process fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures::future::{BoxFuture, FutureExt};
use stockfinder_core::{
    Coordinates, Item, ItemIndexQuery, QueryError, StoreDirectoryQuery, StoreId, StoreRecord,
    StoreRef, StoreStatus,
};
use stockfinder_search::{MemoryKeyValueStore, SearchConfig, SearchEngine, SearchError};

#[derive(Default)]
struct FakeItemIndex {
    items: Mutex<Vec<Item>>,
    calls: AtomicUsize,
    failures_remaining: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeItemIndex {
    fn with(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail_next(&self, n: usize) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }
}

impl ItemIndexQuery for FakeItemIndex {
    fn search_by_text<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<Item>, QueryError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let failing = self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(QueryError::ItemIndex("connection reset".to_string()));
            }
            let needle = query.to_lowercase();
            let items = self.items.lock().unwrap();
            Ok(items
                .iter()
                .filter(|item| item.name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }
        .boxed()
    }
}

#[derive(Default)]
struct FakeStoreDirectory {
    stores: Mutex<Vec<StoreRecord>>,
    calls: AtomicUsize,
    failures_remaining: AtomicUsize,
}

impl FakeStoreDirectory {
    fn with(stores: Vec<StoreRecord>) -> Self {
        Self {
            stores: Mutex::new(stores),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail_next(&self, n: usize) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    fn set_status(&self, id: &str, status: StoreStatus) {
        for store in self.stores.lock().unwrap().iter_mut() {
            if store.id.as_str() == id {
                store.status = status;
            }
        }
    }
}

impl StoreDirectoryQuery for FakeStoreDirectory {
    fn list_by_status(
        &self,
        status: StoreStatus,
    ) -> BoxFuture<'_, Result<Vec<StoreRecord>, QueryError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        async move {
            let failing = self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(QueryError::StoreDirectory("timeout".to_string()));
            }
            let stores = self.stores.lock().unwrap();
            Ok(stores
                .iter()
                .filter(|store| store.status == status)
                .cloned()
                .collect())
        }
        .boxed()
    }
}

struct Harness {
    items: Arc<FakeItemIndex>,
    stores: Arc<FakeStoreDirectory>,
    kv: Arc<MemoryKeyValueStore>,
    engine: SearchEngine,
}

fn harness(items: FakeItemIndex, stores: FakeStoreDirectory) -> Harness {
    let items = Arc::new(items);
    let stores = Arc::new(stores);
    let kv = Arc::new(MemoryKeyValueStore::new());
    let engine = SearchEngine::new(
        items.clone(),
        stores.clone(),
        kv.clone(),
        &SearchConfig::default(),
    );
    Harness {
        items,
        stores,
        kv,
        engine,
    }
}

fn item(id: &str, name: &str, store_id: &str) -> Item {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Item {
        id: id.to_string(),
        name: name.to_string(),
        category: Some("Dairy".to_string()),
        store_id: StoreRef::parse(store_id),
        image_url: None,
        shelf_position: Some("Aisle 2".to_string()),
        price: None,
        verified: false,
        verified_at: None,
        report_count: 0,
        created_at: created,
        updated_at: created,
    }
}

fn store(id: &str, status: StoreStatus, at: Option<(f64, f64)>) -> StoreRecord {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    StoreRecord {
        id: StoreId::new(id),
        name: format!("Store {id}"),
        address: format!("{id} Main St"),
        latitude: at.map(|(lat, _)| lat),
        longitude: at.map(|(_, lng)| lng),
        owner_id: "owner-1".to_string(),
        status,
        created_at: created,
        updated_at: created,
    }
}

fn user() -> Coordinates {
    Coordinates {
        latitude: 40.0,
        longitude: -74.0,
    }
}

#[tokio::test]
async fn provisional_item_in_approved_store_two_km_away() {
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "virtual_S1")]),
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, Some((40.018, -74.0)))]),
    );

    let results = h.engine.search_items("milk", Some(user())).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].resolved_store_id.as_str(), "S1");
    let km = results[0].distance_km.expect("distance present");
    assert!((km - 2.0).abs() < 0.01, "got {km}");
}

#[tokio::test]
async fn item_in_pending_store_is_hidden() {
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "virtual_S1")]),
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Pending, Some((40.018, -74.0)))]),
    );

    let results = h.engine.search_items("milk", Some(user())).await.unwrap();
    assert!(results.is_empty());
    assert_eq!(h.engine.recent_queries(None).await, vec!["milk"]);
}

#[tokio::test]
async fn blank_query_makes_no_upstream_calls() {
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "S1")]),
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, None)]),
    );

    let results = h.engine.search_items("   ", None).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(h.items.calls(), 0);
    assert_eq!(h.stores.calls(), 0);
    assert!(h.engine.recent_queries(None).await.is_empty());
}

#[tokio::test]
async fn verified_item_ranks_first() {
    let mut verified = item("i-2", "Milk", "S2");
    verified.verified = true;
    verified.verified_at = Some(Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap());
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "S1"), verified]),
        FakeStoreDirectory::with(vec![
            store("S1", StoreStatus::Approved, None),
            store("S2", StoreStatus::Approved, None),
        ]),
    );

    let results = h.engine.search_items("milk", None).await.unwrap();

    let ids: Vec<&str> = results.iter().map(|r| r.item.id.as_str()).collect();
    assert_eq!(ids, vec!["i-2", "i-1"]);
    assert!(results.iter().all(|r| r.distance_km.is_none()));
}

#[tokio::test]
async fn repeated_search_is_served_from_cache() {
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "S1")]),
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, None)]),
    );

    let first = h.engine.search_items("Milk", None).await.unwrap();
    let second = h.engine.search_items("  milk ", None).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.items.calls(), 1);
    assert_eq!(h.stores.calls(), 1);
    assert_eq!(h.engine.cached_result_sets(), 1);
}

#[tokio::test]
async fn different_location_is_a_separate_cache_entry() {
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "S1")]),
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, Some((40.018, -74.0)))]),
    );

    h.engine.search_items("milk", Some(user())).await.unwrap();
    let elsewhere = Coordinates {
        latitude: 41.0,
        longitude: -74.0,
    };
    let far = h.engine.search_items("milk", Some(elsewhere)).await.unwrap();

    assert_eq!(h.items.calls(), 2);
    assert!(far[0].distance_km.unwrap() > 100.0);
}

#[tokio::test]
async fn clearing_cache_picks_up_revoked_approval() {
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "S1")]),
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, None)]),
    );

    assert_eq!(h.engine.search_items("milk", None).await.unwrap().len(), 1);
    h.stores.set_status("S1", StoreStatus::Rejected);

    // Still cached.
    assert_eq!(h.engine.search_items("milk", None).await.unwrap().len(), 1);

    h.engine.clear_result_cache();
    assert_eq!(h.engine.cached_result_sets(), 0);
    assert!(h.engine.search_items("milk", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_identical_searches_share_one_upstream_call() {
    let items = FakeItemIndex {
        delay: Some(Duration::from_millis(20)),
        ..FakeItemIndex::with(vec![item("i-1", "Milk", "S1")])
    };
    let h = harness(
        items,
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, None)]),
    );

    let (a, b) = tokio::join!(
        h.engine.search_items("milk", None),
        h.engine.search_items("MILK", None),
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(h.items.calls(), 1);
    assert_eq!(h.stores.calls(), 1);
}

#[tokio::test]
async fn abandoned_search_still_finishes_upstream_and_fills_cache() {
    let items = FakeItemIndex {
        delay: Some(Duration::from_millis(20)),
        ..FakeItemIndex::with(vec![item("i-1", "Milk", "S1")])
    };
    let h = harness(
        items,
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, None)]),
    );

    let abandoned =
        tokio::time::timeout(Duration::from_millis(1), h.engine.search_items("milk", None)).await;
    assert!(abandoned.is_err());

    for _ in 0..100 {
        if h.engine.cached_result_sets() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(h.engine.cached_result_sets(), 1);

    let results = h.engine.search_items("milk", None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(h.items.calls(), 1);
}

#[tokio::test]
async fn fallback_recovers_from_transient_upstream_failure() {
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "S1")]),
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, None)]),
    );
    h.items.fail_next(1);

    let results = h.engine.search_items("milk", None).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(h.items.calls(), 2);
    // The fallback stage never writes to the cache.
    assert_eq!(h.engine.cached_result_sets(), 0);
    assert_eq!(h.engine.recent_queries(None).await, vec!["milk"]);
}

#[tokio::test]
async fn both_stages_failing_is_unavailable_and_not_recorded() {
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "S1")]),
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, None)]),
    );
    h.stores.fail_next(2);

    let err = h.engine.search_items("milk", None).await.unwrap_err();

    assert_eq!(err, SearchError::Unavailable);
    assert!(h.engine.recent_queries(None).await.is_empty());

    // Upstream recovered; the failure was not cached.
    assert_eq!(h.engine.search_items("milk", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn successful_searches_build_history() {
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "S1")]),
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, None)]),
    );

    for q in ["milk", "bread", "Milk", "eggs", "jam", "tea", "rice"] {
        h.engine.search_items(q, None).await.unwrap();
    }

    assert_eq!(
        h.engine.recent_queries(None).await,
        vec!["rice", "tea", "jam", "eggs", "Milk"]
    );
    assert_eq!(h.engine.recent_queries(Some(2)).await, vec!["rice", "tea"]);

    h.engine.clear_history().await;
    assert!(h.engine.recent_queries(None).await.is_empty());
}

#[tokio::test]
async fn history_survives_a_new_engine_over_the_same_store() {
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "S1")]),
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, None)]),
    );
    h.engine.search_items("milk", None).await.unwrap();

    let reopened = SearchEngine::new(
        h.items.clone(),
        h.stores.clone(),
        h.kv.clone(),
        &SearchConfig::default(),
    );
    assert_eq!(reopened.recent_queries(None).await, vec!["milk"]);
    // Caches are per instance.
    assert_eq!(reopened.cached_result_sets(), 0);
}

#[tokio::test]
async fn malformed_store_coordinates_leave_distance_absent() {
    let h = harness(
        FakeItemIndex::with(vec![item("i-1", "Milk", "S1")]),
        FakeStoreDirectory::with(vec![store("S1", StoreStatus::Approved, Some((123.0, -74.0)))]),
    );

    let results = h.engine.search_items("milk", Some(user())).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].distance_km.is_none());
    assert!(results[0].store_coordinates.is_none());
}

//! Cache slot and cache manager tests: TTL, invalidation, concurrency.

mod common;

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use price_history_sdk::cache::SlotState;
use price_history_sdk::{CacheSlot, PriceHistoryError, PriceHistorySdk, SourceKind};

fn counting_loader(counter: &AtomicUsize) -> impl FnOnce() -> price_history_sdk::Result<String> + '_ {
    move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("load #{n}"))
    }
}

// ---------------------------------------------------------------------------
// CacheSlot TTL
// ---------------------------------------------------------------------------

#[test]
fn empty_slot_loads_on_first_read() {
    let slot: CacheSlot<String> = CacheSlot::new(Some(Duration::from_secs(60)));
    assert_eq!(slot.state(), SlotState::Empty);

    let calls = AtomicUsize::new(0);
    let value = slot.get_or_load(counting_loader(&calls)).unwrap();
    assert_eq!(*value, "load #1");
    assert_eq!(slot.load_count(), 1);
    assert_eq!(slot.state(), SlotState::Fresh);
}

#[test]
fn reads_within_ttl_reuse_the_same_value() {
    let slot: CacheSlot<String> = CacheSlot::new(Some(Duration::from_secs(60)));
    let calls = AtomicUsize::new(0);
    let t0 = Instant::now();

    let first = slot.get_or_load_at(t0, counting_loader(&calls)).unwrap();
    let second = slot
        .get_or_load_at(t0 + Duration::from_secs(59), counting_loader(&calls))
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(slot.load_count(), 1);
}

#[test]
fn read_after_ttl_reloads_exactly_once() {
    let slot: CacheSlot<String> = CacheSlot::new(Some(Duration::from_secs(60)));
    let calls = AtomicUsize::new(0);
    let t0 = Instant::now();

    slot.get_or_load_at(t0, counting_loader(&calls)).unwrap();
    assert_eq!(slot.state_at(t0 + Duration::from_secs(60)), SlotState::Stale);

    let later = t0 + Duration::from_secs(60);
    let reloaded = slot.get_or_load_at(later, counting_loader(&calls)).unwrap();
    let again = slot
        .get_or_load_at(later + Duration::from_secs(1), counting_loader(&calls))
        .unwrap();

    assert_eq!(*reloaded, "load #2");
    assert!(Arc::ptr_eq(&reloaded, &again));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn unbounded_ttl_never_expires() {
    let slot: CacheSlot<String> = CacheSlot::new(None);
    let calls = AtomicUsize::new(0);
    let t0 = Instant::now();

    slot.get_or_load_at(t0, counting_loader(&calls)).unwrap();
    slot.get_or_load_at(t0 + Duration::from_secs(365 * 24 * 3600), counting_loader(&calls))
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn invalidate_forces_one_reload() {
    let slot: CacheSlot<String> = CacheSlot::new(None);
    let calls = AtomicUsize::new(0);

    slot.get_or_load(counting_loader(&calls)).unwrap();
    slot.invalidate();
    assert_eq!(slot.state(), SlotState::Stale);
    // The old entry stays published until the reload replaces it.
    assert_eq!(**slot.entry().unwrap().value(), "load #1");

    assert_eq!(*slot.get_or_load(counting_loader(&calls)).unwrap(), "load #2");
    assert_eq!(*slot.get_or_load(counting_loader(&calls)).unwrap(), "load #2");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_reload_keeps_previous_entry_and_retries() {
    let slot: CacheSlot<String> = CacheSlot::new(Some(Duration::from_secs(10)));
    let t0 = Instant::now();
    slot.get_or_load_at(t0, || Ok("good".to_string())).unwrap();

    let later = t0 + Duration::from_secs(11);
    let err = slot
        .get_or_load_at(later, || {
            Err(PriceHistoryError::InvalidArgument("boom".into()))
        })
        .unwrap_err();
    assert!(matches!(err, PriceHistoryError::InvalidArgument(_)));
    assert_eq!(**slot.entry().unwrap().value(), "good");
    assert_eq!(slot.state_at(later), SlotState::Stale);

    let value = slot.get_or_load_at(later, || Ok("recovered".to_string())).unwrap();
    assert_eq!(*value, "recovered");
    assert_eq!(slot.load_count(), 2);
}

#[test]
fn failed_reload_after_invalidate_stays_stale() {
    let slot: CacheSlot<String> = CacheSlot::new(None);
    slot.get_or_load(|| Ok("v1".to_string())).unwrap();
    slot.invalidate();

    assert!(slot
        .get_or_load(|| Err(PriceHistoryError::InvalidArgument("boom".into())))
        .is_err());
    assert_eq!(slot.state(), SlotState::Stale);
    assert_eq!(*slot.get_or_load(|| Ok("v2".to_string())).unwrap(), "v2");
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_readers_trigger_a_single_load() {
    let slot: Arc<CacheSlot<String>> = Arc::new(CacheSlot::new(Some(Duration::from_secs(60))));
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let slot = slot.clone();
            let calls = calls.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                slot.get_or_load(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(50));
                    Ok("shared".to_string())
                })
                .unwrap()
            })
        })
        .collect();

    let values: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
}

// ---------------------------------------------------------------------------
// Modification watching
// ---------------------------------------------------------------------------

#[test]
fn watched_file_change_marks_slot_stale() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("source.csv");
    fs::write(&path, "v1").unwrap();

    let slot: CacheSlot<String> = CacheSlot::new(None).watching(&path);
    let read = || fs::read_to_string(&path).map_err(PriceHistoryError::from);

    assert_eq!(*slot.get_or_load(read).unwrap(), "v1");
    assert_eq!(slot.state(), SlotState::Fresh);

    fs::write(&path, "v2").unwrap();
    let file = fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000))
        .unwrap();
    drop(file);

    assert_eq!(slot.state(), SlotState::Stale);
    assert_eq!(*slot.get_or_load(read).unwrap(), "v2");
    assert_eq!(slot.load_count(), 2);
}

#[test]
fn watched_file_appearing_marks_slot_stale() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("late.csv");

    let slot: CacheSlot<Option<String>> = CacheSlot::new(None).watching(&path);
    let read = || Ok(fs::read_to_string(&path).ok());

    assert_eq!(*slot.get_or_load(read).unwrap(), None);
    fs::write(&path, "arrived").unwrap();
    assert_eq!(
        *slot.get_or_load(read).unwrap(),
        Some("arrived".to_string())
    );
}

// ---------------------------------------------------------------------------
// CacheManager through the SDK
// ---------------------------------------------------------------------------

#[test]
fn repeated_queries_load_each_source_once() {
    let tmp = common::setup_sample_dir();
    let sdk = common::sdk_for(tmp.path());

    let first = sdk.prices().load().unwrap();
    let second = sdk.prices().load().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    sdk.catalog().resolve_all().unwrap();
    sdk.catalog().resolve_all().unwrap();

    for stats in sdk.cache_stats() {
        assert_eq!(stats.loads, 1, "{} loaded more than once", stats.source);
        assert_eq!(stats.state, SlotState::Fresh);
    }
}

#[test]
fn short_ttl_reloads_price_source() {
    let tmp = common::setup_sample_dir();
    let sdk = PriceHistorySdk::builder()
        .data_dir(tmp.path())
        .price_ttl(Some(Duration::from_millis(20)))
        .build()
        .unwrap();

    sdk.prices().load().unwrap();
    thread::sleep(Duration::from_millis(40));
    sdk.prices().load().unwrap();

    let prices = sdk
        .cache_stats()
        .into_iter()
        .find(|s| s.source == SourceKind::Prices)
        .unwrap();
    assert_eq!(prices.loads, 2);
}

#[test]
fn refresh_invalidates_every_loaded_source() {
    let tmp = common::setup_sample_dir();
    let sdk = common::sdk_for(tmp.path());
    sdk.catalog().resolve_all().unwrap();

    sdk.refresh();
    assert!(sdk.cache_stats().iter().all(|s| s.state == SlotState::Stale));

    sdk.catalog().resolve_all().unwrap();
    assert!(sdk.cache_stats().iter().all(|s| s.loads == 2));
}

#[test]
fn sdk_clones_share_one_cache() {
    let tmp = common::setup_sample_dir();
    let sdk = common::sdk_for(tmp.path());
    let other = PriceHistorySdk::builder()
        .shared_cache(sdk.cache().clone())
        .build()
        .unwrap();

    sdk.prices().items().unwrap();
    other.prices().items().unwrap();
    sdk.clone().prices().items().unwrap();

    let prices = other
        .cache_stats()
        .into_iter()
        .find(|s| s.source == SourceKind::Prices)
        .unwrap();
    assert_eq!(prices.loads, 1);
}

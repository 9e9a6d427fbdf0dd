//! Integration Tests for Cache-Aside Reads
//!
//! Storefront read paths end to end: fetch-on-miss, expiry, concurrent misses,
//! invalidation after writes and the telemetry those reads produce.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storefront_cache::cache::{Efficiency, ManualClock};
use storefront_cache::keys::{self, FilterSet};
use storefront_cache::{Cache, Config};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Product {
    slug: String,
    price_cents: u64,
}

// == Helper Functions ==

fn cache_with_clock(single_flight: bool) -> (Cache, Arc<ManualClock>) {
    let config = Config {
        single_flight,
        ..Config::default()
    };
    let clock = Arc::new(ManualClock::new(0));
    (Cache::with_clock(&config, clock.clone()), clock)
}

fn product(slug: &str, price_cents: u64) -> Product {
    Product {
        slug: slug.to_string(),
        price_cents,
    }
}

/// Cache-aside product read counting backing-store calls.
async fn load_product(cache: &Cache, calls: &AtomicUsize, slug: &str) -> Result<Product, String> {
    cache
        .cached(&keys::product_key(slug), Some(keys::ttl::PRODUCT), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(product(slug, 4_999))
        })
        .await
}

// == Fetch on Miss ==

#[tokio::test]
async fn test_second_read_is_served_from_cache() {
    let (cache, _) = cache_with_clock(true);
    let calls = AtomicUsize::new(0);

    let first = load_product(&cache, &calls, "runner-2").await.unwrap();
    let second = load_product(&cache, &calls, "runner-2").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.ttl_remaining(&keys::product_key("runner-2")), Some(keys::ttl::PRODUCT));
}

#[tokio::test]
async fn test_category_expires_after_its_ttl() {
    let (cache, clock) = cache_with_clock(true);
    let calls = AtomicUsize::new(0);
    let key = keys::category_key("electronics");

    let fetch_category = || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>("Electronics".to_string())
    };

    cache
        .cached(&key, Some(keys::ttl::CATEGORY), fetch_category)
        .await
        .unwrap();
    clock.advance_secs(7_199);
    cache
        .cached(&key, Some(keys::ttl::CATEGORY), fetch_category)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance_secs(2);
    let value = cache
        .cached(&key, Some(keys::ttl::CATEGORY), fetch_category)
        .await
        .unwrap();

    assert_eq!(value, "Electronics");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fetch_error_is_not_cached() {
    let (cache, _) = cache_with_clock(true);
    let key = keys::search_key("boots", &FilterSet::new());

    let failed: Result<Vec<Product>, String> = cache
        .cached(&key, Some(keys::ttl::SEARCH), || async {
            Err("search index offline".to_string())
        })
        .await;
    assert_eq!(failed, Err("search index offline".to_string()));

    let recovered: Result<Vec<Product>, String> = cache
        .cached(&key, Some(keys::ttl::SEARCH), || async { Ok(vec![product("boot", 8_000)]) })
        .await;
    assert_eq!(recovered.unwrap().len(), 1);
    assert!(cache.contains(&key));
}

#[tokio::test]
async fn test_missing_record_is_refetched() {
    let (cache, _) = cache_with_clock(true);
    let calls = AtomicUsize::new(0);
    let calls = &calls;

    for _ in 0..2 {
        let found: Result<Option<Product>, String> = cache
            .cached(&keys::product_key("ghost"), None, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .await;
        assert_eq!(found, Ok(None));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// == Concurrent Misses ==

#[tokio::test]
async fn test_concurrent_misses_share_one_fetch() {
    let (cache, _) = cache_with_clock(true);
    let calls = AtomicUsize::new(0);
    let calls = &calls;
    let key = keys::products_key(1, 12, &FilterSet::new());

    let fetch = move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok::<_, String>(vec![product("runner-2", 4_999)])
    };

    let (a, b) = tokio::join!(
        cache.cached(&key, None, fetch),
        cache.cached(&key, None, fetch)
    );

    assert_eq!(a, b);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_misses_without_single_flight_each_fetch() {
    let (cache, _) = cache_with_clock(false);
    let calls = AtomicUsize::new(0);
    let calls = &calls;
    let key = keys::products_key(1, 12, &FilterSet::new());

    let fetch = move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok::<_, String>(vec![product("runner-2", 4_999)])
    };

    let (a, b) = tokio::join!(
        cache.cached(&key, None, fetch),
        cache.cached(&key, None, fetch)
    );

    assert_eq!(a, b);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(cache.contains(&key));
}

#[tokio::test]
async fn test_failed_leader_does_not_fail_waiters() {
    let (cache, _) = cache_with_clock(true);
    let calls = AtomicUsize::new(0);
    let calls = &calls;
    let key = keys::search_key("boots", &FilterSet::new());

    let failing = move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Err::<Vec<String>, _>("timeout".to_string())
    };
    let working = move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(vec!["boot".to_string()])
    };

    let (leader, waiter) = tokio::join!(
        cache.cached(&key, None, failing),
        cache.cached(&key, None, working)
    );

    assert_eq!(leader, Err("timeout".to_string()));
    assert_eq!(waiter, Ok(vec!["boot".to_string()]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_misses_across_tasks() {
    let (cache, _) = cache_with_clock(true);
    let calls = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .cached(&keys::categories_key(), None, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok::<_, String>(vec!["shoes".to_string()])
                    })
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok(vec!["shoes".to_string()]));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// == Invalidation After Writes ==

#[tokio::test]
async fn test_product_update_is_visible_after_invalidation() {
    let (cache, _) = cache_with_clock(true);
    let calls = AtomicUsize::new(0);
    cache.set(&keys::featured_products_key(4), &vec![product("runner-2", 4_999)], None);

    load_product(&cache, &calls, "runner-2").await.unwrap();
    let removed = cache.invalidate_product("runner-2");
    load_product(&cache, &calls, "runner-2").await.unwrap();

    assert_eq!(removed, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!cache.contains(&keys::featured_products_key(4)));
}

#[tokio::test]
async fn test_user_invalidation_is_scoped() {
    let (cache, _) = cache_with_clock(true);
    cache.set(&keys::user_cart_key(1), &json_cart(), Some(keys::ttl::USER));
    cache.set(&keys::user_orders_key(1, 1), &json_cart(), Some(keys::ttl::USER));
    cache.set(&keys::user_cart_key(12), &json_cart(), Some(keys::ttl::USER));

    assert_eq!(cache.invalidate_user(1), 2);
    assert!(cache.contains(&keys::user_cart_key(12)));
}

fn json_cart() -> serde_json::Value {
    serde_json::json!({"items": []})
}

// == Telemetry ==

#[tokio::test]
async fn test_cold_then_warm_reads_drive_hit_rate() {
    let (cache, _) = cache_with_clock(true);
    let calls = AtomicUsize::new(0);
    let slugs = ["a", "b", "c"];

    for slug in slugs {
        load_product(&cache, &calls, slug).await.unwrap();
    }
    for _ in 0..3 {
        for slug in slugs {
            load_product(&cache, &calls, slug).await.unwrap();
        }
    }

    let report = cache.performance();
    assert_eq!(report.misses, 3);
    assert_eq!(report.hits, 9);
    assert_eq!(report.hit_rate, 0.75);
    assert_eq!(report.efficiency, Efficiency::Good);

    cache.reset_stats();
    let report = cache.performance();
    assert_eq!((report.hits, report.misses), (0, 0));
    assert_eq!(report.efficiency, Efficiency::NeedsImprovement);
}

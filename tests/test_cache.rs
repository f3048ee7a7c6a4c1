//! Bounded caches and the cache manager.

use finroute::application::cache::bounded::BoundedCache;
use finroute::application::cache::{CacheKind, CacheManager, CachedReply, MetricsKey};
use finroute::config::{CacheConfig, CacheSettings};
use finroute::domain::values::period::Period;
use std::time::{Duration, Instant};

#[test]
fn test_entry_expires_after_ttl() {
    let mut cache: BoundedCache<String, u32> = BoundedCache::new(Duration::from_secs(60), 4);
    let t0 = Instant::now();
    cache.put_at("a".into(), 1, t0);

    assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(60)), Some(1));
    assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(61)), None);
    assert!(cache.is_empty(), "stale entry is dropped on lookup");

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.expirations, 1);
}

#[test]
fn test_overflow_evicts_least_recently_used() {
    let mut cache: BoundedCache<u32, &str> = BoundedCache::new(Duration::from_secs(60), 3);
    cache.put(1, "one");
    cache.put(2, "two");
    cache.put(3, "three");

    // touching 1 makes 2 the oldest
    assert_eq!(cache.get(&1), Some("one"));
    cache.put(4, "four");

    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get(&2), None);
    assert_eq!(cache.get(&1), Some("one"));
    assert_eq!(cache.get(&3), Some("three"));
    assert_eq!(cache.get(&4), Some("four"));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_overwrite_does_not_grow() {
    let mut cache: BoundedCache<&str, u32> = BoundedCache::new(Duration::from_secs(60), 2);
    cache.put("k", 1);
    cache.put("k", 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(&"k"), Some(2));
}

fn small_manager() -> CacheManager {
    CacheManager::new(&CacheConfig {
        reply: CacheSettings::new(300, 2),
        context: CacheSettings::new(300, 2),
        metrics: CacheSettings::new(300, 2),
        summary: CacheSettings::new(300, 2),
    })
}

#[test]
fn test_manager_caches_are_independent() {
    let caches = small_manager();
    caches.put_reply(
        "metrics AAPL",
        CachedReply {
            reply: "AAPL revenue (2023): 1".into(),
            payload: None,
            command: None,
        },
    );
    caches.put_context(&["MSFT", "AAPL"], "ctx".into());
    caches.put_metrics(MetricsKey::new("AAPL", Period::year(2023).filters()), vec![]);
    caches.put_summary("AAPL", "narrative".into());

    for kind in CacheKind::ALL {
        assert_eq!(caches.len(kind), 1, "{kind}");
    }

    // context keys ignore ticker order and duplicates
    assert_eq!(caches.get_context(&["AAPL", "MSFT", "AAPL"]).as_deref(), Some("ctx"));

    caches.clear(CacheKind::Summary);
    assert_eq!(caches.len(CacheKind::Summary), 0);
    assert_eq!(caches.len(CacheKind::Reply), 1);

    caches.clear_all();
    for kind in CacheKind::ALL {
        assert_eq!(caches.len(kind), 0, "{kind}");
    }
}

#[test]
fn test_manager_respects_bounds() {
    let caches = small_manager();
    for ticker in ["AAPL", "MSFT", "NVDA"] {
        caches.put_summary(ticker, format!("{ticker} narrative"));
    }
    assert_eq!(caches.len(CacheKind::Summary), 2);
    assert!(caches.get_summary("AAPL").is_none());
    assert_eq!(caches.get_summary("NVDA").as_deref(), Some("NVDA narrative"));

    let stats = caches.stats();
    assert_eq!(stats.summary.evictions, 1);
    assert_eq!(stats.summary.hits, 1);
    assert_eq!(stats.summary.misses, 1);
}

#[test]
fn test_cache_kind_names() {
    for kind in CacheKind::ALL {
        assert_eq!(kind.to_string().parse::<CacheKind>().unwrap(), kind);
    }
    assert!("bogus".parse::<CacheKind>().is_err());
}

#[test]
fn test_manager_stays_bounded_under_parallel_use() {
    let caches = small_manager();
    let threads = 4;
    let rounds = 200;

    std::thread::scope(|s| {
        for t in 0..threads {
            let caches = &caches;
            s.spawn(move || {
                for n in 0..rounds {
                    let key = format!("fact T{t} {n} revenue");
                    caches.put_reply(
                        &key,
                        CachedReply {
                            reply: key.clone(),
                            payload: None,
                            command: None,
                        },
                    );
                    if let Some(hit) = caches.get_reply(&key) {
                        assert_eq!(hit.reply, key);
                    }
                    caches.put_summary(&format!("T{t}-{n}"), "narrative".into());
                    assert!(caches.len(CacheKind::Reply) <= 2);
                    assert!(caches.len(CacheKind::Summary) <= 2);
                }
            });
        }
    });

    let puts = (threads * rounds) as u64;
    let stats = caches.stats();
    assert_eq!(caches.len(CacheKind::Reply), 2);
    assert_eq!(stats.reply.hits + stats.reply.misses, puts, "every lookup counted once");
    assert_eq!(stats.reply.evictions + 2, puts, "every overflow evicted exactly one entry");
    assert_eq!(stats.summary.evictions + 2, puts);
}

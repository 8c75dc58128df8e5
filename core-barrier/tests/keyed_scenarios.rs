//! Integration tests for keyed scopes sharing one dispenser.

use core_async::{task, time};
use core_barrier::{Barrier, CountingBarrier, KeyedBarrierDispenser, KeyedScopedGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use time::{Duration, Instant};

type ZoneDispenser = KeyedBarrierDispenser<String>;

fn zone(id: u32) -> String {
    format!("zone-{id}")
}

#[core_async::test]
async fn test_contended_zone_handover() {
    let dispenser = Arc::new(ZoneDispenser::new());
    let mut scope_a = KeyedScopedGuard::new(Arc::clone(&dispenser));
    let mut scope_b = KeyedScopedGuard::new(Arc::clone(&dispenser));

    assert!(scope_a.try_enter(zone(1), Duration::from_millis(1000)).await);

    let start = Instant::now();
    assert!(!scope_b.try_enter(zone(1), Duration::from_millis(100)).await);
    assert!(start.elapsed() >= Duration::from_millis(90));

    scope_a.try_leave(&zone(1));
    assert!(scope_b.try_enter(zone(1), Duration::from_millis(100)).await);
    assert!(scope_b.is_entered(&zone(1)));
    assert!(!scope_a.is_entered(&zone(1)));
}

#[core_async::test(multi_thread)]
async fn test_disjoint_zones_do_not_interfere() {
    let dispenser = Arc::new(ZoneDispenser::new());
    let (entered_tx, entered_rx) = core_async::sync::oneshot::channel();
    let (release_tx, release_rx) = core_async::sync::oneshot::channel::<()>();

    let first = Arc::clone(&dispenser);
    let holder = task::spawn(async move {
        let mut scope = KeyedScopedGuard::new(first);
        assert!(scope.try_enter(zone(1), Duration::ZERO).await);
        let _ = entered_tx.send(());
        let _ = release_rx.await;
    });
    entered_rx.await.unwrap();

    // Zone 1 is still held; zone 2 must admit immediately.
    let second = Arc::clone(&dispenser);
    let held = task::spawn(async move {
        let mut scope = KeyedScopedGuard::new(second);
        assert!(scope.try_enter(zone(2), Duration::ZERO).await);
        let zones = scope.dispenser();
        (zones.is_in_use(&zone(1)), zones.is_in_use(&zone(2)))
    })
    .await
    .unwrap();

    assert_eq!(held, (true, true));

    release_tx.send(()).unwrap();
    holder.await.unwrap();
    assert_eq!(dispenser.active_scopes(), 0);
    assert!(dispenser.is_empty());
}

#[core_async::test]
async fn test_teardown_releases_every_key_and_purges() {
    let dispenser = Arc::new(ZoneDispenser::new());

    {
        let mut scope = KeyedScopedGuard::new(Arc::clone(&dispenser));
        for id in 1..=3 {
            assert!(scope.try_enter(zone(id), Duration::ZERO).await);
        }
        assert_eq!(scope.entered_count(), 3);
        assert!((1..=3).all(|id| dispenser.is_in_use(&zone(id))));
    }

    assert!((1..=3).all(|id| !dispenser.is_in_use(&zone(id))));
    assert_eq!(dispenser.active_scopes(), 0);
    assert_eq!(dispenser.len(), 0);
}

#[core_async::test]
async fn test_purge_spares_barriers_referenced_elsewhere() {
    let dispenser = Arc::new(ZoneDispenser::new());

    let observed = {
        let mut scope = KeyedScopedGuard::new(Arc::clone(&dispenser));
        for id in 1..=3 {
            assert!(scope.try_enter(zone(id), Duration::ZERO).await);
        }
        dispenser.try_get(&zone(2)).unwrap()
    };

    // Released by teardown, but still mapped because a handle outlived it.
    assert!(!observed.in_use());
    assert_eq!(dispenser.len(), 1);

    let again = dispenser.get_or_add(zone(2), CountingBarrier::new);
    assert!(Arc::ptr_eq(&observed, &again));
}

#[core_async::test]
async fn test_purge_waits_for_all_active_scopes() {
    const SCOPES: u32 = 5;
    let dispenser = Arc::new(ZoneDispenser::new());

    let mut scopes = Vec::new();
    for id in 0..SCOPES {
        let mut scope = KeyedScopedGuard::new(Arc::clone(&dispenser));
        assert!(scope.try_enter(zone(id), Duration::ZERO).await);
        scopes.push(scope);
    }

    while scopes.len() > 1 {
        scopes.pop();
        assert_eq!(dispenser.len(), SCOPES as usize);
        assert_eq!(dispenser.active_scopes(), scopes.len());
    }

    scopes.pop();
    assert_eq!(dispenser.active_scopes(), 0);
    assert!(dispenser.is_empty());

    let fresh = dispenser.get_or_add(zone(0), CountingBarrier::new);
    assert!(!fresh.in_use());
}

#[core_async::test]
async fn test_provisioning_picks_first_free_location() {
    let dispenser = Arc::new(KeyedBarrierDispenser::<(u32, u32)>::new());
    let item = 7;
    let locations = [(item, 1), (item, 2), (item, 3)];

    let mut first_order = KeyedScopedGuard::new(Arc::clone(&dispenser));
    let mut second_order = KeyedScopedGuard::new(Arc::clone(&dispenser));
    let mut third_order = KeyedScopedGuard::new(Arc::clone(&dispenser));

    let timeout = Duration::from_millis(10);
    assert_eq!(first_order.try_enter_any(locations, timeout).await, Some((item, 1)));
    assert_eq!(second_order.try_enter_any(locations, timeout).await, Some((item, 2)));
    assert_eq!(third_order.try_enter_any(locations, timeout).await, Some((item, 3)));

    let mut fourth_order = KeyedScopedGuard::new(Arc::clone(&dispenser));
    assert_eq!(fourth_order.try_enter_any(locations, timeout).await, None);

    second_order.dispose();
    assert_eq!(fourth_order.try_enter_any(locations, timeout).await, Some((item, 2)));
}

#[core_async::test(multi_thread)]
async fn test_concurrent_churn_keeps_exclusion_and_cleans_up() {
    const KEYS: usize = 4;
    let dispenser = Arc::new(KeyedBarrierDispenser::<usize>::new());
    let holders: Arc<Vec<AtomicUsize>> = Arc::new((0..KEYS).map(|_| AtomicUsize::new(0)).collect());
    let violations = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for worker in 0..16 {
        let dispenser = Arc::clone(&dispenser);
        let holders = Arc::clone(&holders);
        let violations = Arc::clone(&violations);

        handles.push(task::spawn(async move {
            for round in 0..25 {
                let key = (worker + round) % KEYS;
                let mut scope = KeyedScopedGuard::new(Arc::clone(&dispenser));

                if scope.try_enter(key, Duration::from_secs(10)).await {
                    if holders[key].fetch_add(1, Ordering::SeqCst) != 0 {
                        violations.fetch_add(1, Ordering::SeqCst);
                    }
                    task::yield_now().await;
                    holders[key].fetch_sub(1, Ordering::SeqCst);
                }
            }
        }));
    }

    for result in futures::future::join_all(handles).await {
        result.unwrap();
    }

    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert_eq!(dispenser.active_scopes(), 0);
    assert!(dispenser.is_empty());
}

#[core_async::test(multi_thread)]
async fn test_keyed_guard_released_after_migration() {
    let dispenser = Arc::new(ZoneDispenser::new());
    let (entered_tx, entered_rx) = core_async::sync::oneshot::channel();
    let (release_tx, release_rx) = core_async::sync::oneshot::channel::<()>();

    let scoped = Arc::clone(&dispenser);
    let holder = task::spawn(async move {
        let mut scope = KeyedScopedGuard::new(scoped);
        assert!(scope.try_enter(zone(9), Duration::ZERO).await);
        let _ = entered_tx.send(());
        let _ = release_rx.await;
        task::yield_now().await;
    });

    entered_rx.await.unwrap();
    assert!(dispenser.is_in_use(&zone(9)));

    release_tx.send(()).unwrap();
    holder.await.unwrap();

    assert_eq!(dispenser.active_scopes(), 0);
    assert!(!dispenser.is_in_use(&zone(9)));
}

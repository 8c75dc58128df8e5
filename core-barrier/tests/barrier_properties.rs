//! Integration tests for single barriers and scope-bound guards.
//!
//! The multi-threaded tests run on several workers so tasks can resume on a
//! different thread after each `.await`.

use core_async::{task, time};
use core_barrier::{Barrier, BarrierError, CountingBarrier, ScopedGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use time::Duration;

#[core_async::test(multi_thread)]
async fn test_admits_one_holder_at_a_time() {
    let barrier = Arc::new(CountingBarrier::named("counter"));
    let holders = Arc::new(AtomicUsize::new(0));
    let max_holders = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let barrier = Arc::clone(&barrier);
        let holders = Arc::clone(&holders);
        let max_holders = Arc::clone(&max_holders);

        handles.push(task::spawn(async move {
            for _ in 0..20 {
                assert!(barrier.enter(Duration::from_secs(10)).await);
                let now = holders.fetch_add(1, Ordering::SeqCst) + 1;
                max_holders.fetch_max(now, Ordering::SeqCst);

                task::yield_now().await;

                holders.fetch_sub(1, Ordering::SeqCst);
                barrier.leave();
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(max_holders.load(Ordering::SeqCst), 1);
    assert!(!barrier.in_use());
}

#[core_async::test]
async fn test_second_caller_sees_in_use_and_fails() {
    let barrier = Arc::new(CountingBarrier::new());
    assert!(barrier.enter(Duration::from_millis(100)).await);

    for timeout_ms in [0, 1, 30] {
        let contender = Arc::clone(&barrier);
        let result = task::spawn(async move {
            let observed = contender.in_use();
            let entered = contender.enter(Duration::from_millis(timeout_ms)).await;
            (observed, entered)
        })
        .await
        .unwrap();

        assert_eq!(result, (true, false));
    }

    barrier.leave();
    assert!(barrier.enter(Duration::ZERO).await);
}

#[core_async::test(multi_thread)]
async fn test_release_from_another_thread() {
    let barrier = Arc::new(CountingBarrier::new());
    assert!(barrier.enter(Duration::ZERO).await);

    let releaser = Arc::clone(&barrier);
    let entered_on = std::thread::current().id();
    let released_on = std::thread::spawn(move || {
        releaser.leave();
        std::thread::current().id()
    })
    .join()
    .unwrap();

    assert_ne!(entered_on, released_on);
    assert!(!barrier.in_use());
    assert!(barrier.enter(Duration::ZERO).await);
}

#[core_async::test(multi_thread)]
async fn test_guard_survives_worker_migration() {
    let barrier = Arc::new(CountingBarrier::new());

    let scoped = Arc::clone(&barrier);
    task::spawn(async move {
        let mut guard = ScopedGuard::new(scoped);
        assert!(guard.try_enter(Duration::from_secs(1)).await);

        for _ in 0..10 {
            time::sleep(Duration::from_millis(1)).await;
            task::yield_now().await;
        }

        assert!(guard.is_entered());
    })
    .await
    .unwrap();

    assert!(!barrier.in_use());
}

#[core_async::test]
async fn test_idempotent_reentry_holds_once() {
    let barrier = Arc::new(CountingBarrier::new());
    let mut guard = ScopedGuard::new(Arc::clone(&barrier));

    assert!(guard.try_enter(Duration::from_millis(50)).await);
    assert!(guard.try_enter(Duration::from_millis(50)).await);

    // One leave frees it, so it was only taken once.
    guard.try_leave();
    assert!(!barrier.in_use());
    assert!(barrier.enter(Duration::ZERO).await);
    barrier.leave();
}

#[core_async::test]
async fn test_teardown_releases_without_explicit_leave() {
    let barrier = Arc::new(CountingBarrier::new());

    {
        let mut guard = ScopedGuard::new(Arc::clone(&barrier));
        assert!(guard.try_enter(Duration::ZERO).await);
        assert!(barrier.in_use());
    }

    assert!(!barrier.in_use());
}

async fn reserve_then_fail(barrier: Arc<CountingBarrier>) -> Result<(), BarrierError> {
    let mut guard = ScopedGuard::new(barrier);
    guard.enter(Duration::ZERO).await?;
    Err(BarrierError::Cancelled)
}

#[core_async::test]
async fn test_teardown_on_early_error_return() {
    let barrier = Arc::new(CountingBarrier::new());
    assert!(reserve_then_fail(Arc::clone(&barrier)).await.is_err());
    assert!(!barrier.in_use());
}

#[core_async::test(multi_thread)]
async fn test_teardown_on_panic() {
    let barrier = Arc::new(CountingBarrier::new());

    let scoped = Arc::clone(&barrier);
    let result = task::spawn(async move {
        let mut guard = ScopedGuard::new(scoped);
        assert!(guard.try_enter(Duration::ZERO).await);
        panic!("protected work failed");
    })
    .await;

    assert!(result.unwrap_err().is_panic());
    assert!(!barrier.in_use());
}

#[core_async::test(multi_thread)]
async fn test_teardown_on_task_abort() {
    let barrier = Arc::new(CountingBarrier::new());
    let (entered_tx, entered_rx) = core_async::sync::oneshot::channel();

    let scoped = Arc::clone(&barrier);
    let handle = task::spawn(async move {
        let mut guard = ScopedGuard::new(scoped);
        assert!(guard.try_enter(Duration::ZERO).await);
        let _ = entered_tx.send(());
        time::sleep(Duration::from_secs(3600)).await;
    });

    entered_rx.await.unwrap();
    assert!(barrier.in_use());

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
    assert!(!barrier.in_use());
}

#[core_async::test]
async fn test_waiter_enters_after_release() {
    let barrier = Arc::new(CountingBarrier::new());
    let mut holder = ScopedGuard::new(Arc::clone(&barrier));
    assert!(holder.try_enter(Duration::ZERO).await);

    let waiter_barrier = Arc::clone(&barrier);
    let waiter = task::spawn(async move {
        let mut guard = ScopedGuard::new(waiter_barrier);
        guard.try_enter(Duration::from_secs(5)).await
    });

    time::sleep(Duration::from_millis(20)).await;
    holder.dispose();

    assert!(waiter.await.unwrap());
    assert!(!barrier.in_use());
}

//! Process-wide instances, one per type.
//!
//! A non-keyed critical section is identified by its barrier type (see
//! [`declare_barrier!`](crate::declare_barrier)); a keyed one by its
//! (key, barrier) type pair. Hosts without their own lifetime container can
//! resolve the shared instance here and build a guard per scope from it.
//!
//! ```
//! use core_barrier::{declare_barrier, registry};
//! use core_async::time::Duration;
//!
//! declare_barrier!(pub PayoutBarrier);
//!
//! # core_async::runtime::block_on(async {
//! let mut scope = registry::scope::<PayoutBarrier>();
//! assert!(scope.try_enter(Duration::ZERO).await);
//!
//! let mut other = registry::scope::<PayoutBarrier>();
//! assert!(!other.try_enter(Duration::ZERO).await);
//! # });
//! ```

use crate::barrier::Barrier;
use crate::dispenser::{BarrierKey, KeyedBarrierDispenser};
use crate::keyed::KeyedScopedGuard;
use crate::scoped::ScopedGuard;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

type Instance = Arc<dyn Any + Send + Sync>;

static INSTANCES: OnceLock<DashMap<TypeId, Instance>> = OnceLock::new();

fn shared<T, F>(init: F) -> Arc<T>
where
    T: Any + Send + Sync,
    F: FnOnce() -> T,
{
    let instances = INSTANCES.get_or_init(DashMap::new);
    let type_id = TypeId::of::<T>();

    let instance = match instances.get(&type_id) {
        Some(existing) => Arc::clone(existing.value()),
        None => {
            // Built outside the shard lock so `init` may itself resolve
            // other shared instances. A losing racer's value is dropped.
            let fresh: Instance = Arc::new(init());
            Arc::clone(instances.entry(type_id).or_insert(fresh).value())
        }
    };

    instance
        .downcast::<T>()
        .unwrap_or_else(|_| unreachable!("registry entries are keyed by their own TypeId"))
}

/// The process-wide instance of barrier type `B`.
pub fn shared_barrier<B: Barrier + Default>() -> Arc<B> {
    shared(B::default)
}

/// The process-wide dispenser for the (`K`, `B`) pair.
pub fn shared_dispenser<K: BarrierKey, B: Barrier>() -> Arc<KeyedBarrierDispenser<K, B>> {
    shared(KeyedBarrierDispenser::<K, B>::new)
}

/// A fresh scope guard over the shared instance of `B`.
pub fn scope<B: Barrier + Default>() -> ScopedGuard<B> {
    ScopedGuard::new(shared_barrier::<B>())
}

/// A fresh keyed scope guard over the shared (`K`, `B`) dispenser.
pub fn keyed_scope<K: BarrierKey, B: Barrier>() -> KeyedScopedGuard<K, B> {
    KeyedScopedGuard::new(shared_dispenser::<K, B>())
}

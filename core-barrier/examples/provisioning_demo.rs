//! # Provisioning Example
//!
//! Several order-picking tasks compete for inventory locations that all hold
//! the same item. Each task takes the first location that admits it within a
//! short timeout instead of queueing on one location, works there, and lets
//! scope teardown release it.
//!
//! Run with: `cargo run --example provisioning_demo --package core-barrier`

use anyhow::Context;
use core_async::{task, time};
use core_barrier::{registry, BarrierConfig, KeyedBarrierDispenser, KeyedScopedGuard};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::sync::Arc;
use time::Duration;

/// (item id, location id)
type LocationKey = (u32, u32);

const ITEM: u32 = 4711;
const LOCATIONS: [LocationKey; 3] = [(ITEM, 1), (ITEM, 2), (ITEM, 3)];

core_barrier::declare_barrier! {
    /// Serialises restocking runs across the whole warehouse.
    pub RestockBarrier
}

async fn pick_order(
    order: u32,
    dispenser: Arc<KeyedBarrierDispenser<LocationKey>>,
) -> Option<LocationKey> {
    let mut scope = KeyedScopedGuard::new(dispenser);
    let location = scope
        .try_enter_any(LOCATIONS, Duration::from_millis(25))
        .await?;

    tracing::info!(order, location = ?location, "picking");
    time::sleep(Duration::from_millis(40)).await;
    Some(location)
}

#[core_async::main(multi_thread)]
async fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )
    .context("initializing logging")?;

    let config = BarrierConfig::default()
        .with_default_enter_timeout_ms(200)
        .with_slow_enter_warn_ms(50);
    config.validate().context("validating barrier config")?;
    let dispenser = Arc::new(KeyedBarrierDispenser::with_config(config));

    let handles: Vec<_> = (1..=6)
        .map(|order| task::spawn(pick_order(order, Arc::clone(&dispenser))))
        .collect();

    for (order, handle) in (1..=6).zip(handles) {
        match handle.await.context("picking task failed")? {
            Some(location) => tracing::info!(order, location = ?location, "order picked"),
            None => tracing::warn!(order, "no location free, order deferred"),
        }
    }

    let mut restock = registry::scope::<RestockBarrier>();
    if restock.try_enter_default().await {
        tracing::info!(
            idle_locations = dispenser.len(),
            active_scopes = dispenser.active_scopes(),
            "restocking"
        );
    }

    Ok(())
}

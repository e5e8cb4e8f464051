//! End-to-end watch lifecycle: register, watch, update, delete.

mod support;

use std::time::{Duration, Instant};

use vsensors::families::demo::DemoFamily;
use vsensors::{Context, ContextFlags, SearchFlags, UpdateBatch, WatchParams};

#[test]
fn demo_family_registers_two_sensors() {
    let ctx = Context::init(vec![Box::new(DemoFamily::new())], ContextFlags::empty()).unwrap();
    assert_eq!(ctx.sensor_count(), 2);
    assert_eq!(ctx.registered_families(), vec!["common".to_string(), "demo".to_string()]);
    ctx.free().unwrap();
}

#[test]
fn watch_add_then_update_get_reports_change() {
    let ctx = Context::init(vec![Box::new(DemoFamily::new())], ContextFlags::empty()).unwrap();

    let added = ctx
        .watch_add("demo/tick", SearchFlags::default(), WatchParams::new(Duration::from_millis(1), None))
        .unwrap();
    assert_eq!(added, 1);
    assert_eq!(ctx.watch_count(), 1);

    // tick's family implementation reports UPDATED directly every call.
    match vsensors::update_get(&ctx, Instant::now()).unwrap() {
        UpdateBatch::Updated(keys) => assert_eq!(keys.len(), 1),
        UpdateBatch::Reloaded => panic!("unexpected reload"),
    }

    ctx.free().unwrap();
}

#[test]
fn watch_del_removes_the_watch_but_not_the_descriptor() {
    let ctx = Context::init(vec![Box::new(DemoFamily::new())], ContextFlags::empty()).unwrap();
    ctx.watch_add("demo/*", SearchFlags::default(), WatchParams::new(Duration::from_secs(1), None))
        .unwrap();
    assert_eq!(ctx.watch_count(), 2);

    let removed = ctx.watch_del("demo/uptime", SearchFlags::default()).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(ctx.watch_count(), 1);
    // The descriptor itself stays registered; only the watch is gone.
    assert_eq!(ctx.sensor_count(), 2);

    ctx.free().unwrap();
}

#[test]
fn repeated_watch_add_on_same_pattern_is_idempotent() {
    let ctx = Context::init(vec![Box::new(DemoFamily::new())], ContextFlags::empty()).unwrap();
    let params = WatchParams::new(Duration::from_millis(50), None);

    ctx.watch_add("demo/*", SearchFlags::default(), params.clone()).unwrap();
    ctx.watch_add("demo/*", SearchFlags::default(), params).unwrap();

    assert_eq!(ctx.watch_count(), 2, "re-adding the same pattern must replace, not duplicate");
    ctx.free().unwrap();
}

#[test]
fn a_change_fires_the_registered_callback() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use vsensors::WatchCallback;

    let ctx = Context::init(vec![Box::new(DemoFamily::new())], ContextFlags::empty()).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let fired_in_cb = fired.clone();

    ctx.watch_add(
        "demo/tick",
        SearchFlags::default(),
        WatchParams::new(Duration::from_millis(1), Some(WatchCallback::new(move |_sample| {
            fired_in_cb.fetch_add(1, Ordering::SeqCst);
        }))),
    )
    .unwrap();

    vsensors::update_get(&ctx, Instant::now()).unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1, "tick always reports UPDATED, callback must run once");

    ctx.free().unwrap();
}

#[test]
fn watch_pgcd_reflects_the_interned_intervals() {
    let ctx = Context::init(vec![Box::new(DemoFamily::new())], ContextFlags::empty()).unwrap();
    ctx.watch_add("demo/uptime", SearchFlags::default(), WatchParams::new(Duration::from_millis(250), None))
        .unwrap();
    ctx.watch_add("demo/tick", SearchFlags::default(), WatchParams::new(Duration::from_millis(100), None))
        .unwrap();

    assert_eq!(vsensors::watch_pgcd(&ctx, 1.0), Some(50));
    ctx.free().unwrap();
}

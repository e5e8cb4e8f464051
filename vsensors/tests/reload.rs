//! Family reload protocol: `RELOAD_FAMILY` mid-iteration, loading
//! placeholders resolved via `init_wait`.

mod support;

use std::time::{Duration, Instant};

use support::{LoadingFamily, ScriptedFamily};
use vsensors::{Context, ContextFlags, NotifyEvent, SearchFlags, Status, UpdateBatch, WatchParams};

#[test]
fn update_get_surfaces_reload_and_discards_the_partial_batch() {
    let family = ScriptedFamily::new("scripted", vec![Status::UPDATED, Status::RELOAD_FAMILY, Status::UPDATED]);
    let notifications = family.notifications_handle();

    let ctx = Context::init(vec![Box::new(family)], ContextFlags::empty()).unwrap();
    ctx.watch_add("scripted/value", SearchFlags::default(), WatchParams::new(Duration::from_millis(1), None))
        .unwrap();

    // First call: UPDATED.
    match vsensors::update_get(&ctx, Instant::now()).unwrap() {
        UpdateBatch::Updated(keys) => assert_eq!(keys.len(), 1),
        UpdateBatch::Reloaded => panic!("unexpected reload on first call"),
    }

    // Second call: the family reports RELOAD_FAMILY; the whole batch must
    // come back as `Reloaded`, never a partial `Updated` list.
    match vsensors::update_get(&ctx, Instant::now()).unwrap() {
        UpdateBatch::Reloaded => {}
        UpdateBatch::Updated(_) => panic!("a mid-batch reload must discard partial results"),
    }

    // The registry is usable again afterwards: the sensor and its watch
    // survive the reload (re-populated by list()).
    assert_eq!(ctx.sensor_count(), 1);
    assert_eq!(ctx.watch_count(), 1);
    match vsensors::update_get(&ctx, Instant::now()).unwrap() {
        UpdateBatch::Updated(keys) => assert_eq!(keys.len(), 1),
        UpdateBatch::Reloaded => panic!("should not reload again"),
    }

    assert!(notifications.lock().unwrap().contains(&NotifyEvent::FAMILY_RELOADED));
    ctx.free().unwrap();
}

#[test]
fn init_wait_drains_a_loading_placeholder_to_a_live_sensor() {
    let family = LoadingFamily::new("loader", 3);
    let notifications = family.notifications_handle();

    let ctx = Context::init(vec![Box::new(family)], ContextFlags::empty()).unwrap();
    // Only a pending placeholder exists until the family finishes loading.
    assert_eq!(ctx.sensor_count(), 1);

    let added = ctx
        .watch_add("loader/*", SearchFlags::default(), WatchParams::new(Duration::from_millis(10), None))
        .unwrap();
    assert_eq!(added, 1);

    vsensors::init_wait(&ctx, true).unwrap();

    // After init_wait, the placeholder has been replaced by the real
    // sensor, with the watch carried across the reload.
    assert_eq!(ctx.sensor_count(), 1);
    assert_eq!(ctx.watch_count(), 1);
    assert!(notifications.lock().unwrap().contains(&NotifyEvent::FAMILY_WAIT_LOAD));
    assert!(notifications.lock().unwrap().contains(&NotifyEvent::FAMILY_RELOADED));

    match vsensors::update_get(&ctx, Instant::now()).unwrap() {
        UpdateBatch::Updated(keys) => assert_eq!(keys.len(), 1, "the now-live sensor should report its first value"),
        UpdateBatch::Reloaded => panic!("should be fully loaded by now"),
    }

    ctx.free().unwrap();
}

#[test]
fn init_wait_is_a_no_op_with_nothing_pending() {
    let family = ScriptedFamily::new("scripted", vec![Status::UPDATED]);
    let ctx = Context::init(vec![Box::new(family)], ContextFlags::empty()).unwrap();
    vsensors::init_wait(&ctx, false).unwrap();
    assert_eq!(ctx.sensor_count(), 1);
    ctx.free().unwrap();
}

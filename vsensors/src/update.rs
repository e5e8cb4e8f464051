//! The update engine (spec §4.8).
//!
//! Deviation from spec §5's "at least a reader lock" wording: `Family`'s
//! `update`/`write` take `&mut self`, and a `parking_lot::RwLock`'s shared
//! guard only ever hands out `&T`. Rather than wrap every family's
//! private state in its own interior-mutability cell just to satisfy a
//! reader-lock call site, the update engine always takes the writer side
//! — see `RegistryLock` in `crate::lock`. This serializes updates across
//! unrelated families that a reader lock would have let run concurrently,
//! but every other guarantee in §5 (recursive acquisition, upgrade
//! semantics preserved for callers still doing their own `lock(Read)`/
//! `lock_upgrade`-style dance) still holds.

use std::time::Instant;

use log::warn;
use vsensors_sys::Status;

use crate::context::{Context, RegistryState};
use crate::descriptor::Descriptor;
use crate::error::{SensorError, SensorResult};
use crate::family::{Deadline, NotifyEvent};
use crate::index::StorageKey;
use crate::lock::LockMode;
use crate::params::WatchParams;
use crate::pattern::SearchFlags;
use crate::value::Value;
use crate::watch_ops::watch_add;

/// Result of a bulk [`update_get`] call.
#[derive(Debug)]
pub enum UpdateBatch {
    /// Every due sample was checked; these changed.
    Updated(Vec<StorageKey>),
    /// A family reloaded mid-iteration (spec §4.8): the caller must
    /// discard everything collected so far and re-fetch the watch list.
    Reloaded,
}

/// Check and, if due, refresh a single sample (spec §4.8 `update_check`).
pub fn update_check(ctx: &Context, desc_key: &StorageKey, deadline: Deadline) -> SensorResult<Status> {
    let mut guard = ctx.lock(LockMode::Write);
    update_check_locked(&mut guard, desc_key, deadline, ctx.log_target())
}

fn update_check_locked(
    state: &mut RegistryState,
    desc_key: &StorageKey,
    deadline: Deadline,
    log_target: &str,
) -> SensorResult<Status> {
    let Some(family_name) = state.sensors.get(desc_key).map(|d| d.family().to_string()) else {
        return Ok(Status::NOT_SUPPORTED);
    };
    let Some(family_idx) = state.family_index(&family_name) else {
        return Ok(Status::NOT_SUPPORTED);
    };

    if let Deadline::At(now) = deadline {
        let due = state.watches.get(desc_key).map(|s| s.is_due(now)).unwrap_or(false);
        if !due {
            return Ok(Status::WAIT_TIMER);
        }
    }

    let is_first_time = state
        .watches
        .get(desc_key)
        .map(|s| s.next_update_time.is_none())
        .unwrap_or(true);
    let sensor_key = match state.sensors.get(desc_key) {
        Some(Descriptor::Live(d)) => d.key,
        _ => 0,
    };
    snapshot_scratch(state, desc_key);

    let status = {
        let Some(sample) = state.watches.get_mut(desc_key) else {
            return Ok(Status::NOT_SUPPORTED);
        };
        state.families[family_idx].update(sensor_key, &mut sample.value, deadline)
    };

    let final_status = match status {
        Status::UPDATED => {
            advance_timer(state, desc_key, deadline);
            Status::UPDATED
        }
        Status::UNCHANGED => {
            advance_timer(state, desc_key, deadline);
            Status::UNCHANGED
        }
        Status::SUCCESS | Status::LOADING => {
            let differs = is_first_time || !scratch_matches_current(state, desc_key);
            if status == Status::SUCCESS {
                advance_timer(state, desc_key, deadline);
            }
            if differs {
                Status::UPDATED
            } else {
                Status::UNCHANGED
            }
        }
        Status::RELOAD_FAMILY => {
            reload_family(state, &family_name)?;
            notify_all_families(state, NotifyEvent::FAMILY_RELOADED);
            return Ok(Status::RELOAD_FAMILY);
        }
        Status::WAIT_TIMER => return Ok(Status::WAIT_TIMER),
        other => {
            let reported = if other.is_error() { other } else { Status::ERROR };
            warn!(
                target: log_target,
                "update_check: family {family_name:?} reported {reported:?} for {desc_key:?}"
            );
            return Ok(reported);
        }
    };

    if final_status == Status::UPDATED {
        run_callback(state, desc_key);
    }
    Ok(final_status)
}

fn snapshot_scratch(state: &mut RegistryState, desc_key: &StorageKey) {
    let Some(sample) = state.watches.get(desc_key) else { return };
    match &sample.value {
        Value::Buffer(_) => state.scratch_buffer.copy_from(&sample.value),
        _ => state.scratch_scalar.copy_from(&sample.value),
    }
}

fn scratch_matches_current(state: &RegistryState, desc_key: &StorageKey) -> bool {
    let Some(sample) = state.watches.get(desc_key) else {
        return true;
    };
    match &sample.value {
        Value::Buffer(_) => state.scratch_buffer.equal(&sample.value),
        _ => state.scratch_scalar.equal(&sample.value),
    }
}

fn advance_timer(state: &mut RegistryState, desc_key: &StorageKey, deadline: Deadline) {
    let now = deadline.instant().unwrap_or_else(Instant::now);
    let interval = state
        .watches
        .get(desc_key)
        .and_then(|s| state.params.get(s.watch))
        .map(|p| p.update_interval);
    if let Some(interval) = interval {
        if let Some(sample) = state.watches.get_mut(desc_key) {
            sample.next_update_time = Some(now + interval);
        }
    }
}

fn run_callback(state: &mut RegistryState, desc_key: &StorageKey) {
    let Some(param_key) = state.watches.get(desc_key).map(|s| s.watch) else {
        return;
    };
    let Some(callback) = state.params.get(param_key).and_then(|p| p.callback.clone()) else {
        return;
    };
    if let Some(sample) = state.watches.get(desc_key) {
        (callback.0)(sample);
    }
}

fn notify_all_families(state: &mut RegistryState, event: NotifyEvent) {
    for idx in 0..state.families.len() {
        let _ = state.families[idx].notify(event, None);
    }
}

/// The family reload protocol (spec §4.8 "Family reload protocol").
pub fn reload_family(state: &mut RegistryState, family_name: &str) -> SensorResult<()> {
    let family_lower = family_name.to_lowercase();

    let mut placeholder_entries: Vec<(u64, String, WatchParams)> = Vec::new();
    let mut live_entries: Vec<(String, WatchParams)> = Vec::new();

    for key in state.watches.list().to_vec() {
        let Some(desc) = state.sensors.get(&key) else { continue };
        if desc.family().to_lowercase() != family_lower {
            continue;
        }
        let Some(sample) = state.watches.get(&key) else { continue };
        let Some(params) = state.params.get(sample.watch).cloned() else {
            continue;
        };
        match desc {
            Descriptor::Live(d) => live_entries.push((format!("{}/{}", d.family, d.label), params)),
            Descriptor::Pending(p) => placeholder_entries.push((p.id, p.pattern.clone(), params)),
        }
    }
    placeholder_entries.sort_by_key(|(id, _, _)| *id);

    let family_desc_keys: Vec<StorageKey> = state
        .sensors
        .iter()
        .filter(|(_, d)| d.family().eq_ignore_ascii_case(family_name))
        .map(|(k, _)| k.clone())
        .collect();
    for key in &family_desc_keys {
        if let Some(sample) = state.watches.remove(key) {
            state.params.release(sample.watch);
        }
    }
    state.sensors.remove_family(family_name);

    let Some(family_idx) = state.family_index(family_name) else {
        return Err(SensorError::NotSupported);
    };
    state.populate_family(family_idx);

    let replay = placeholder_entries
        .into_iter()
        .map(|(_, pattern, params)| (pattern, params))
        .chain(live_entries);
    for (pattern, params) in replay {
        watch_add(state, &pattern, SearchFlags::default(), params)?;
    }
    Ok(())
}

/// Bulk update over every active watch (spec §4.8 `update_get`).
pub fn update_get(ctx: &Context, now: Instant) -> SensorResult<UpdateBatch> {
    let mut guard = ctx.lock(LockMode::Write);
    let keys: Vec<StorageKey> = guard.watches.list().to_vec();
    let mut updated = Vec::new();
    for key in keys {
        match update_check_locked(&mut guard, &key, Deadline::At(now), ctx.log_target()) {
            Ok(Status::UPDATED) => updated.push(key),
            Ok(Status::RELOAD_FAMILY) => {
                return Ok(UpdateBatch::Reloaded);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(target: ctx.log_target(), "update_get: sample update failed: {e}");
            }
        }
    }
    Ok(UpdateBatch::Updated(updated))
}

/// Synchronously drain every loading placeholder (spec §4.8 `init_wait`).
///
/// If `watched_only` is set, only placeholders with at least one active
/// watch are driven; unwatched placeholders are left for a future
/// `update_get` to resolve lazily.
pub fn init_wait(ctx: &Context, watched_only: bool) -> SensorResult<()> {
    loop {
        let mut guard = ctx.lock(LockMode::Write);
        let next = guard
            .sensors
            .iter()
            .find(|(k, d)| d.is_pending() && (!watched_only || guard.watches.contains(k)))
            .map(|(k, _)| k.clone());
        let Some(key) = next else {
            return Ok(());
        };
        let family_name = guard.sensors.get(&key).expect("key from iter").family().to_string();
        let Some(family_idx) = guard.family_index(&family_name) else {
            if let Some(sample) = guard.watches.remove(&key) {
                guard.params.release(sample.watch);
            }
            guard.sensors.remove(&key);
            continue;
        };
        let _ = guard.families[family_idx].notify(NotifyEvent::FAMILY_WAIT_LOAD, None);

        loop {
            let status = {
                let Some(sample) = guard.watches.get_mut(&key) else {
                    break;
                };
                guard.families[family_idx].update(0, &mut sample.value, Deadline::Force)
            };
            match status {
                Status::LOADING => {
                    std::thread::yield_now();
                    continue;
                }
                Status::RELOAD_FAMILY => {
                    reload_family(&mut guard, &family_name)?;
                    notify_all_families(&mut guard, NotifyEvent::FAMILY_RELOADED);
                    break;
                }
                _ => break,
            }
        }
    }
}

/// GCD of every interned watch interval, in milliseconds (spec §4.8
/// `watch_pgcd`).
pub fn watch_pgcd(ctx: &Context, precision_ms: f64) -> Option<u64> {
    ctx.lock(LockMode::Read).params.pgcd_millis(precision_ms)
}

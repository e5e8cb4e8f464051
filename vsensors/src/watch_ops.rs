//! Watch add/delete (spec §4.7).

use std::collections::HashSet;

use crate::context::{loading_placeholder_value, RegistryState, DEFAULT_SCRATCH_BUFFER_SIZE};
use crate::descriptor::{Descriptor, PendingDescriptor};
use crate::error::SensorResult;
use crate::family::{NotifyEvent, WatchNotifyInfo};
use crate::index::StorageKey;
use crate::params::WatchParams;
use crate::pattern::{placeholder_matches, Pattern, SearchFlags};
use crate::sample::Sample;
use crate::value::Value;

fn notify_family(state: &mut RegistryState, family_name: &str, event: NotifyEvent, label: &str) {
    if let Some(idx) = state.family_index(family_name) {
        let _ = state.families[idx].notify(event, Some(WatchNotifyInfo { label, key: 0 }));
    }
}

/// Add or replace the watch on a single descriptor, interning `params`
/// freshly for this sample. Returns `true` if an existing sample was
/// replaced, `false` if a new one was created.
pub fn watch_add_desc(state: &mut RegistryState, desc_key: StorageKey, params: WatchParams) -> SensorResult<bool> {
    let desc = state
        .sensors
        .get(&desc_key)
        .cloned()
        .ok_or(crate::error::SensorError::NotSupported)?;
    let value_type = desc.value_type();
    let family_name = desc.family().to_string();
    let label = desc.label().to_string();

    if state.watches.contains(&desc_key) {
        let existing = state.watches.get(&desc_key).expect("just checked contains");
        let prior_key = existing.watch;
        let prior_capacity = match &existing.value {
            Value::Buffer(b) => Some(b.capacity()),
            _ => None,
        };
        state.params.release(prior_key);
        let param_key = state.params.acquire(params);
        let sample = state.watches.get_mut(&desc_key).expect("just checked contains");
        sample.watch = param_key;
        sample.next_update_time = None;
        sample.value = Value::zeroed(value_type, prior_capacity.unwrap_or(DEFAULT_SCRATCH_BUFFER_SIZE));
        sample.value.mark_never_updated();
        notify_family(state, &family_name, NotifyEvent::WATCH_REPLACED, &label);
        Ok(true)
    } else {
        let param_key = state.params.acquire(params);
        let value = Value::zeroed(value_type, DEFAULT_SCRATCH_BUFFER_SIZE);
        let sample = Sample::new_armed(desc_key.clone(), param_key, value);
        state.watches.insert(desc_key.clone(), sample);
        notify_family(state, &family_name, NotifyEvent::WATCH_ADDED, &label);
        Ok(false)
    }
}

/// Expand `pattern` into concrete watches (spec §4.7).
pub fn watch_add(
    state: &mut RegistryState,
    pattern_text: &str,
    flags: SearchFlags,
    params: WatchParams,
) -> SensorResult<usize> {
    let pattern = Pattern::parse(pattern_text, flags)?;
    let (lo, hi) = pattern.probe_bounds();

    let matched: Vec<StorageKey> = state
        .sensors
        .range(lo, hi)
        .filter(|(_, desc)| descriptor_matches(&pattern, desc, flags))
        .map(|(k, _)| k.clone())
        .collect();

    let mut count = 0usize;
    for desc_key in matched {
        watch_add_desc(state, desc_key, params.clone())?;
        count += 1;
    }

    count += materialize_placeholders(state, &pattern, flags, &params)?;
    Ok(count)
}

fn descriptor_matches(pattern: &Pattern, desc: &Descriptor, flags: SearchFlags) -> bool {
    match desc {
        Descriptor::Live(d) => pattern.matches(&d.family, &d.label),
        Descriptor::Pending(d) => {
            placeholder_matches(&d.pattern, pattern.raw(), flags.contains(SearchFlags::CASEFOLD))
        }
    }
}

fn materialize_placeholders(
    state: &mut RegistryState,
    pattern: &Pattern,
    _flags: SearchFlags,
    params: &WatchParams,
) -> SensorResult<usize> {
    let candidate_families: HashSet<String> = state
        .sensors
        .iter()
        .filter_map(|(_, d)| d.as_pending())
        .filter(|p| pattern.family_could_match(&p.family))
        .map(|p| p.family.clone())
        .collect();

    let mut created = 0usize;
    for family in candidate_families {
        let already_stored = state.sensors.iter().any(|(_, d)| {
            matches!(d, Descriptor::Pending(p)
                if p.family == family && p.pattern.eq_ignore_ascii_case(pattern.raw()))
        });
        if already_stored {
            continue;
        }

        let id = state.next_placeholder_id;
        state.next_placeholder_id += 1;
        let label = match pattern.raw().split_once('/') {
            Some((_, suffix)) => suffix.to_string(),
            None => pattern.raw().to_string(),
        };
        let pending = Descriptor::Pending(PendingDescriptor {
            family: family.clone(),
            label: label.clone(),
            pattern: pattern.raw().to_string(),
            id,
        });
        let desc_key = state.sensors.insert(pending);
        let param_key = state.params.acquire(params.clone());
        let sample = Sample::new_with_value(desc_key.clone(), param_key, loading_placeholder_value());
        state.watches.insert(desc_key, sample);
        notify_family(state, &family, NotifyEvent::WATCH_ADDED, &label);
        created += 1;
    }
    Ok(created)
}

/// Remove every watch matching `pattern` (spec §4.7).
pub fn watch_del(state: &mut RegistryState, pattern_text: &str, flags: SearchFlags) -> SensorResult<usize> {
    let pattern = Pattern::parse(pattern_text, flags)?;
    let (lo, hi) = pattern.probe_bounds();

    let matched: Vec<StorageKey> = state
        .sensors
        .range(lo, hi)
        .filter(|(k, desc)| state.watches.contains(k) && descriptor_matches(&pattern, desc, flags))
        .map(|(k, _)| k.clone())
        .collect();

    let mut count = 0usize;
    for key in matched {
        if let Some(desc) = state.sensors.get(&key).cloned() {
            notify_family(state, desc.family(), NotifyEvent::WATCH_DELETING, desc.label());
        }
        if let Some(sample) = state.watches.remove(&key) {
            state.params.release(sample.watch);
            count += 1;
        }
    }
    Ok(count)
}

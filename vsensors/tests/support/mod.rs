//! Controllable `Family` implementations for driving scenarios unit
//! tests can't reach: multi-step `LOADING`, mid-iteration
//! `RELOAD_FAMILY`, and notification auditing.

use std::sync::{Arc, Mutex};

use vsensors::{
    Deadline, Descriptor, Family, LiveDescriptor, NotifyEvent, PendingDescriptor, SensorKey,
    Status, Value, ValueType, WatchNotifyInfo,
};

/// Returns a fixed sequence of statuses from `update`, repeating the last
/// one forever once the sequence is exhausted. Always reports a single
/// live `UINT64` sensor named `<name>/value`.
pub struct ScriptedFamily {
    name: String,
    responses: Vec<Status>,
    cursor: usize,
    counter: u64,
    notifications: Arc<Mutex<Vec<NotifyEvent>>>,
    last_write: Arc<Mutex<Option<Value>>>,
}

impl ScriptedFamily {
    pub fn new(name: &str, responses: Vec<Status>) -> Self {
        assert!(!responses.is_empty(), "ScriptedFamily needs at least one response");
        ScriptedFamily {
            name: name.to_string(),
            responses,
            cursor: 0,
            counter: 0,
            notifications: Arc::new(Mutex::new(Vec::new())),
            last_write: Arc::new(Mutex::new(None)),
        }
    }

    pub fn notifications_handle(&self) -> Arc<Mutex<Vec<NotifyEvent>>> {
        self.notifications.clone()
    }

    /// Shared handle observing the most recent value passed to `write`.
    pub fn last_write_handle(&self) -> Arc<Mutex<Option<Value>>> {
        self.last_write.clone()
    }

    fn next_status(&mut self) -> Status {
        let status = self.responses[self.cursor];
        if self.cursor + 1 < self.responses.len() {
            self.cursor += 1;
        }
        status
    }
}

impl Family for ScriptedFamily {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&mut self) -> Vec<Descriptor> {
        vec![Descriptor::Live(LiveDescriptor {
            family: self.name.clone(),
            label: "value".to_string(),
            key: 1,
            value_type: ValueType::UINT64,
            properties: Vec::new(),
        })]
    }

    fn update(&mut self, _key: SensorKey, value: &mut Value, _deadline: Deadline) -> Status {
        self.counter += 1;
        *value = Value::UInt64(self.counter);
        self.next_status()
    }

    fn notify(&mut self, event: NotifyEvent, _info: Option<WatchNotifyInfo<'_>>) -> Status {
        self.notifications.lock().unwrap().push(event);
        Status::SUCCESS
    }

    fn write(&mut self, _key: SensorKey, value: &Value) -> Status {
        *self.last_write.lock().unwrap() = Some(value.clone());
        Status::SUCCESS
    }
}

/// Starts out enumerating a single pending placeholder; answers the
/// placeholder's probe `update` calls with `LOADING` `polls_before_ready
/// - 1` times, then `RELOAD_FAMILY` once, after which `list` reports a
/// real live sensor.
pub struct LoadingFamily {
    name: String,
    polls_before_ready: u32,
    polled: u32,
    ready: bool,
    notifications: Arc<Mutex<Vec<NotifyEvent>>>,
}

impl LoadingFamily {
    pub fn new(name: &str, polls_before_ready: u32) -> Self {
        LoadingFamily {
            name: name.to_string(),
            polls_before_ready,
            polled: 0,
            ready: false,
            notifications: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn notifications_handle(&self) -> Arc<Mutex<Vec<NotifyEvent>>> {
        self.notifications.clone()
    }
}

impl Family for LoadingFamily {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&mut self) -> Vec<Descriptor> {
        if self.ready {
            vec![Descriptor::Live(LiveDescriptor {
                family: self.name.clone(),
                label: "level".to_string(),
                key: 1,
                value_type: ValueType::F64,
                properties: Vec::new(),
            })]
        } else {
            vec![Descriptor::Pending(PendingDescriptor {
                family: self.name.clone(),
                label: "*".to_string(),
                pattern: format!("{}/*", self.name),
                id: 0,
            })]
        }
    }

    fn update(&mut self, key: SensorKey, value: &mut Value, _deadline: Deadline) -> Status {
        if key == 0 {
            self.polled += 1;
            if self.polled < self.polls_before_ready {
                return Status::LOADING;
            }
            self.ready = true;
            return Status::RELOAD_FAMILY;
        }
        *value = Value::F64(42.0);
        Status::UPDATED
    }

    fn notify(&mut self, event: NotifyEvent, _info: Option<WatchNotifyInfo<'_>>) -> Status {
        self.notifications.lock().unwrap().push(event);
        Status::SUCCESS
    }
}

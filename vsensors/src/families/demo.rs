//! A portable demo family (`demo/uptime`, `demo/tick`) built from
//! `std::time`, standing in for a real hardware-sampling backend in
//! examples and integration tests.

use std::time::Instant;

use vsensors_sys::{Status, ValueType};

use crate::descriptor::{Descriptor, LiveDescriptor};
use crate::family::{Deadline, Family, SensorKey};
use crate::value::Value;

const SENSOR_UPTIME: SensorKey = 1;
const SENSOR_TICK: SensorKey = 2;

/// Exposes `demo/uptime` (seconds since the family was initialized, as
/// `f64`) and `demo/tick` (a counter incremented once per update call).
#[derive(Default)]
pub struct DemoFamily {
    start: Option<Instant>,
    ticks: u64,
}

impl DemoFamily {
    pub fn new() -> Self {
        DemoFamily::default()
    }
}

impl Family for DemoFamily {
    fn name(&self) -> &str {
        "demo"
    }

    fn init(&mut self) -> Status {
        self.start = Some(Instant::now());
        Status::SUCCESS
    }

    fn free(&mut self) {
        self.start = None;
    }

    fn list(&mut self) -> Vec<Descriptor> {
        vec![
            Descriptor::Live(LiveDescriptor {
                family: "demo".to_string(),
                label: "uptime".to_string(),
                key: SENSOR_UPTIME,
                value_type: ValueType::F64,
                properties: Vec::new(),
            }),
            Descriptor::Live(LiveDescriptor {
                family: "demo".to_string(),
                label: "tick".to_string(),
                key: SENSOR_TICK,
                value_type: ValueType::UINT64,
                properties: Vec::new(),
            }),
        ]
    }

    fn update(&mut self, key: SensorKey, value: &mut Value, _deadline: Deadline) -> Status {
        match key {
            SENSOR_UPTIME => {
                let secs = self.start.map(|s| s.elapsed().as_secs_f64()).unwrap_or(0.0);
                *value = Value::F64(secs);
                Status::SUCCESS
            }
            SENSOR_TICK => {
                self.ticks += 1;
                *value = Value::UInt64(self.ticks);
                Status::UPDATED
            }
            _ => Status::NOT_SUPPORTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_two_sensors() {
        let mut f = DemoFamily::new();
        f.init();
        let descs = f.list();
        assert_eq!(descs.len(), 2);
        assert_eq!(descs[0].label(), "uptime");
        assert_eq!(descs[1].label(), "tick");
    }

    #[test]
    fn tick_increments_and_reports_updated() {
        let mut f = DemoFamily::new();
        f.init();
        let mut v = Value::UInt64(0);
        assert_eq!(f.update(SENSOR_TICK, &mut v, Deadline::Force), Status::UPDATED);
        assert_eq!(f.update(SENSOR_TICK, &mut v, Deadline::Force), Status::UPDATED);
        assert_eq!(v.to_int().unwrap().value, 2);
    }

    #[test]
    fn unknown_key_not_supported() {
        let mut f = DemoFamily::new();
        f.init();
        let mut v = Value::Null;
        assert_eq!(f.update(999, &mut v, Deadline::Force), Status::NOT_SUPPORTED);
    }
}

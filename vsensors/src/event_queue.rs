//! Process-wide FIFO of hotplug-style device events (spec §4.9).

use std::collections::VecDeque;

use parking_lot::Mutex;
use vsensors_sys::Status;

/// What happened to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    Add,
    Remove,
    Change,
}

/// A hotplug event. Reserved for future expansion beyond `Device`.
#[derive(Debug, Clone)]
pub enum Event {
    Device {
        name: String,
        device_type: String,
        action: DeviceAction,
    },
}

/// FIFO of events pushed by backends, drained cooperatively by consumers
/// via [`EventQueue::process`].
#[derive(Default)]
pub struct EventQueue {
    queue: Mutex<VecDeque<Event>>,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue::default()
    }

    /// Hand ownership of `event` to the queue.
    pub fn push(&self, event: Event) {
        self.queue.lock().push_back(event);
    }

    /// Drain events front-to-back, calling `consume` on each.
    ///
    /// `consume` returning [`Status::SUCCESS`] removes the event;
    /// [`Status::NOT_SUPPORTED`] leaves it in the queue (in place) for a
    /// future consumer; anything else — in particular [`Status::ERROR`] —
    /// stops iteration immediately and keeps the current event plus every
    /// event after it, in original order.
    pub fn process(&self, mut consume: impl FnMut(&Event) -> Status) {
        let mut queue = self.queue.lock();
        let mut drained = std::mem::take(&mut *queue);
        let mut kept = VecDeque::with_capacity(drained.len());
        while let Some(event) = drained.pop_front() {
            match consume(&event) {
                Status::SUCCESS => {}
                Status::NOT_SUPPORTED => kept.push_back(event),
                _ => {
                    kept.push_back(event);
                    kept.extend(drained.drain(..));
                    break;
                }
            }
        }
        *queue = kept;
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev(name: &str) -> Event {
        Event::Device {
            name: name.to_string(),
            device_type: "disk".to_string(),
            action: DeviceAction::Add,
        }
    }

    #[test]
    fn success_consumes_event() {
        let q = EventQueue::new();
        q.push(dev("sda"));
        q.process(|_| Status::SUCCESS);
        assert!(q.is_empty());
    }

    #[test]
    fn not_supported_keeps_event_in_place() {
        let q = EventQueue::new();
        q.push(dev("sda"));
        q.push(dev("sdb"));
        let mut seen = Vec::new();
        q.process(|e| {
            if let Event::Device { name, .. } = e {
                seen.push(name.clone());
            }
            Status::NOT_SUPPORTED
        });
        assert_eq!(seen, vec!["sda", "sdb"]);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn error_stops_iteration_and_keeps_remainder() {
        let q = EventQueue::new();
        q.push(dev("sda"));
        q.push(dev("sdb"));
        q.push(dev("sdc"));
        let mut seen = Vec::new();
        q.process(|e| {
            if let Event::Device { name, .. } = e {
                seen.push(name.clone());
            }
            if seen.len() == 2 {
                Status::ERROR
            } else {
                Status::SUCCESS
            }
        });
        assert_eq!(seen, vec!["sda", "sdb"]);
        assert_eq!(q.len(), 2); // sdb (kept on ERROR) + sdc
    }
}

//! The reserved "common" family: shared services for the rest of the
//! registry — currently the event queue and (behind the `worker` Cargo
//! feature) a background thread draining an [`EventSource`] (spec §4.9,
//! "Process-wide log and family-common services").

use std::sync::Arc;

use vsensors_sys::Status;

use crate::descriptor::Descriptor;
use crate::event_queue::EventQueue;
use crate::family::{Deadline, Family, SensorKey};
use crate::value::Value;

/// Seam a caller implements to feed the event queue from an OS-level
/// hotplug source (udev, IOKit notifications, ...). `poll` is called
/// repeatedly from the worker thread; implementations are expected to
/// block internally until something is available, or to return quickly
/// if nothing is ready.
pub trait EventSource: Send {
    fn poll(&mut self, queue: &EventQueue);
}

#[cfg(feature = "worker")]
struct WorkerHandle {
    running: Arc<std::sync::atomic::AtomicBool>,
    join: Option<std::thread::JoinHandle<()>>,
}

#[cfg(feature = "worker")]
impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.running.store(false, std::sync::atomic::Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// The always-present "common" family. Exposes no sensors of its own; it
/// exists so other families can reach shared services through a
/// `Family`-shaped handle instead of a global.
pub struct CommonFamily {
    queue: Arc<EventQueue>,
    #[cfg(feature = "worker")]
    worker: Option<WorkerHandle>,
}

impl CommonFamily {
    pub fn new(queue: Arc<EventQueue>) -> Self {
        CommonFamily {
            queue,
            #[cfg(feature = "worker")]
            worker: None,
        }
    }

    /// Start the background worker thread polling `source` into the
    /// event queue. Requires the `worker` feature; a no-op build without
    /// it simply never schedules the thread.
    #[cfg(feature = "worker")]
    pub fn start_worker(&mut self, mut source: Box<dyn EventSource>) {
        if self.worker.is_some() {
            return;
        }
        let queue = self.queue.clone();
        let running = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let running_thread = running.clone();
        let join = std::thread::spawn(move || {
            while running_thread.load(std::sync::atomic::Ordering::Relaxed) {
                source.poll(&queue);
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
        });
        self.worker = Some(WorkerHandle {
            running,
            join: Some(join),
        });
    }

    /// Stop the worker thread, if running, joining it before returning.
    #[cfg(feature = "worker")]
    pub fn stop_worker(&mut self) {
        self.worker = None;
    }
}

impl Family for CommonFamily {
    fn name(&self) -> &str {
        "common"
    }

    fn list(&mut self) -> Vec<Descriptor> {
        Vec::new()
    }

    fn update(&mut self, _key: SensorKey, _value: &mut Value, _deadline: Deadline) -> Status {
        Status::NOT_SUPPORTED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_queue::{DeviceAction, Event};

    struct OnceSource {
        pushed: bool,
    }

    impl EventSource for OnceSource {
        fn poll(&mut self, queue: &EventQueue) {
            if !self.pushed {
                queue.push(Event::Device {
                    name: "sda".to_string(),
                    device_type: "disk".to_string(),
                    action: DeviceAction::Add,
                });
                self.pushed = true;
            }
        }
    }

    #[test]
    fn exposes_no_sensors() {
        let mut f = CommonFamily::new(Arc::new(EventQueue::new()));
        assert!(f.list().is_empty());
    }

    #[cfg(feature = "worker")]
    #[test]
    fn worker_feeds_queue() {
        let queue = Arc::new(EventQueue::new());
        let mut f = CommonFamily::new(queue.clone());
        f.start_worker(Box::new(OnceSource { pushed: false }));
        std::thread::sleep(std::time::Duration::from_millis(250));
        assert!(!queue.is_empty());
        f.stop_worker();
    }
}

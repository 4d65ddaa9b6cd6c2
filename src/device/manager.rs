// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::device::DeviceQueue;
use crate::errors::{SplaError, SplaResult};
use crate::observability::messages::engine::CommandPanicked;
use crate::observability::messages::StructuredLog;

/// Opaque identifier of a device owned by a [`DeviceManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

pub(crate) type Command = Box<dyn FnOnce() + Send + 'static>;

/// Counters for commands pushed through a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStats {
    pub submitted: u64,
    pub completed: u64,
}

/// A single host-emulated device with its own worker thread.
pub struct Device {
    id: DeviceId,
    name: String,
    sender: mpsc::UnboundedSender<Command>,
    submitted: AtomicU64,
    completed: Arc<AtomicU64>,
}

impl Device {
    fn spawn(id: DeviceId, name: String) -> SplaResult<Arc<Self>> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Command>();
        let completed = Arc::new(AtomicU64::new(0));
        let worker_completed = completed.clone();
        let worker_name = name.clone();

        std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                // Commands run strictly in submission order.
                while let Some(command) = receiver.blocking_recv() {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(command)) {
                        CommandPanicked {
                            device: &worker_name,
                            message: &panic_message(payload.as_ref()),
                        }
                        .log();
                    }
                    worker_completed.fetch_add(1, Ordering::Release);
                }
            })
            .map_err(|e| {
                SplaError::invalid_state(format!("Failed to start worker for {}: {}", name, e))
            })?;

        Ok(Arc::new(Self {
            id,
            name,
            sender,
            submitted: AtomicU64::new(0),
            completed,
        }))
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            submitted: self.submitted.load(Ordering::Acquire),
            completed: self.completed.load(Ordering::Acquire),
        }
    }

    pub(crate) fn submit(&self, command: Command) -> SplaResult<()> {
        self.submitted.fetch_add(1, Ordering::AcqRel);
        self.sender.send(command).map_err(|_| {
            SplaError::from(crate::errors::ExecutionError::DeviceLost { device: self.id.0 })
        })
    }
}

/// Text of a panic payload raised by `panic!` with a literal or a formatted message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Owns every device available to the library and hands them out to nodes.
///
/// Devices are assigned round-robin, so independent nodes of one expression spread
/// across all devices.
#[derive(Debug)]
pub struct DeviceManager {
    devices: Vec<Arc<Device>>,
    next: AtomicUsize,
}

impl DeviceManager {
    /// Start `count` devices named `{name_prefix}-{index}`.
    pub fn new(count: usize, name_prefix: &str) -> SplaResult<Self> {
        if count == 0 {
            return Err(SplaError::invalid_argument("Device count must be at least 1"));
        }

        let devices = (0..count)
            .map(|i| Device::spawn(DeviceId(i), format!("{}-{}", name_prefix, i)))
            .collect::<SplaResult<Vec<_>>>()?;

        Ok(Self {
            devices,
            next: AtomicUsize::new(0),
        })
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn device_ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.devices.iter().map(|d| d.id())
    }

    /// Next device in round-robin order.
    pub fn fetch_device(&self) -> DeviceId {
        let slot = self.next.fetch_add(1, Ordering::Relaxed);
        DeviceId(slot % self.devices.len())
    }

    pub fn device(&self, id: DeviceId) -> SplaResult<&Arc<Device>> {
        self.devices.get(id.0).ok_or_else(|| {
            SplaError::invalid_argument(format!(
                "Unknown {} (library has {} devices)",
                id,
                self.devices.len()
            ))
        })
    }

    /// Acquire a command queue on the given device.
    pub fn queue(&self, id: DeviceId) -> SplaResult<DeviceQueue> {
        Ok(DeviceQueue::new(self.device(id)?.clone()))
    }
}

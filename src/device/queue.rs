// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::device::manager::{panic_message, Device};
use crate::device::DeviceId;
use crate::errors::{ExecutionError, SplaError, SplaResult};
use crate::observability::messages::engine::QueueFinished;
use crate::observability::messages::StructuredLog;

/// In-order command queue on one device.
///
/// Commands run on the device worker thread in the order they were enqueued.
/// [`finish`](Self::finish) blocks the calling thread until every command enqueued
/// before it has completed. It must not be called from inside an async task; run
/// device-bound work from a blocking context.
#[derive(Debug, Clone)]
pub struct DeviceQueue {
    device: Arc<Device>,
}

impl DeviceQueue {
    pub(crate) fn new(device: Arc<Device>) -> Self {
        Self { device }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device.id()
    }

    pub fn enqueue(&self, command: impl FnOnce() + Send + 'static) -> SplaResult<()> {
        self.device.submit(Box::new(command))
    }

    /// Run `f` on the device and wait for its result.
    ///
    /// Everything enqueued earlier completes first. A panic inside `f` is returned
    /// as [`ExecutionError::DevicePanic`] and leaves the device usable.
    pub fn run<R, F>(&self, f: F) -> SplaResult<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        self.enqueue(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(f))
                .map_err(|payload| panic_message(payload.as_ref()));
            let _ = sender.send(outcome);
        })?;

        match receiver.blocking_recv() {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(message)) => Err(SplaError::from(ExecutionError::DevicePanic {
                device: self.device.id().0,
                message,
            })),
            Err(_) => Err(self.lost()),
        }
    }

    /// Block until all previously enqueued commands have completed.
    pub fn finish(&self) -> SplaResult<()> {
        self.run(|| ())
    }

    fn lost(&self) -> SplaError {
        SplaError::from(ExecutionError::DeviceLost {
            device: self.device.id().0,
        })
    }
}

/// Finishes the wrapped queue when dropped.
///
/// Hold one for the whole body of a device-bound sub-task so that pending device
/// work is complete on every exit path, including early returns.
pub struct QueueFinisher<'a> {
    queue: &'a DeviceQueue,
}

impl<'a> QueueFinisher<'a> {
    pub fn new(queue: &'a DeviceQueue) -> Self {
        Self { queue }
    }
}

impl Drop for QueueFinisher<'_> {
    fn drop(&mut self) {
        let result = self.queue.finish();
        let stats = self.queue.device.stats();
        QueueFinished {
            device: self.queue.device.name(),
            submitted: stats.submitted,
            completed: stats.completed,
            ok: result.is_ok(),
        }
        .log();
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compute devices and their in-order command queues.
//!
//! Each device is emulated on the host by a dedicated worker thread that drains an
//! in-order command queue. Sub-tasks acquire a [`DeviceQueue`] for the duration of
//! their work and must force it to completion before reporting done; wrap the queue
//! in a [`QueueFinisher`] so this also happens on early returns and error paths.

mod manager;
mod queue;

pub use manager::{Device, DeviceId, DeviceManager, DeviceStats};
pub use queue::{DeviceQueue, QueueFinisher};

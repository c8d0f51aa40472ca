// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Environmental Sensing Service for a single-link BLE peripheral.
//!
//! Tracks the connection and the client's notification subscriptions, caches the
//! last pressure and temperature values and decides when a new reading is written
//! to the attribute table and notified to the connected central.
//! The BLE stack is reached only through [`AttributeRegistry`] and [`StackEvent`].

#![no_std]

#[macro_use]
mod fmt;

mod characteristic;
pub mod codec;
mod connection;
mod error;
mod event;
mod registry;
mod service;
mod subscription;

#[cfg(test)]
mod tests;

pub use characteristic::Characteristic;
pub use connection::ConnectionState;
pub use error::Error;
pub use event::{EssEvent, EventSink, StackEvent};
pub use registry::{
    AttributeRegistry, CharacteristicDef, CharacteristicHandles, LinkId, Permissions, SecurityMode, ServiceHandle,
};
pub use service::{Config, EssService};
pub use subscription::SubscriptionTracker;

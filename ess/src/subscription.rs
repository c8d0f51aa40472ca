// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::characteristic::Characteristic;
use crate::codec::Cccd;
use crate::event::EssEvent;

/// Notification state of each characteristic, as last written by the client.
///
/// Flags survive a disconnect; re-subscription on reconnect is up to the stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SubscriptionTracker {
    subscribed: [bool; Characteristic::COUNT],
}

impl SubscriptionTracker {
    pub const fn new() -> Self {
        Self {
            subscribed: [false; Characteristic::COUNT],
        }
    }

    pub fn is_subscribed(&self, characteristic: Characteristic) -> bool {
        self.subscribed[characteristic.index()]
    }

    /// Apply a client write to the CCCD of `characteristic`.
    ///
    /// Returns the event to raise, or `None` if `payload` is not a CCCD value.
    /// Every valid write yields an event, even when the state does not change.
    pub fn on_configuration_write(&mut self, characteristic: Characteristic, payload: &[u8]) -> Option<EssEvent> {
        let Some(cccd) = Cccd::decode(payload) else {
            trace!("ignoring {}-byte CCCD write", payload.len());
            return None;
        };

        self.subscribed[characteristic.index()] = cccd.notifications;
        info!(
            "{:?} notifications: {}, indications: {}",
            characteristic, cccd.notifications, cccd.indications
        );

        Some(if cccd.notifications {
            EssEvent::NotificationEnabled { characteristic }
        } else {
            EssEvent::NotificationDisabled { characteristic }
        })
    }
}

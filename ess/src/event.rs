// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::characteristic::Characteristic;
use crate::registry::LinkId;

/// Events delivered by the BLE stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StackEvent<'a> {
    /// A central connected.
    Connected { link: LinkId },
    /// The active link was closed.
    Disconnected,
    /// The client wrote `data` to the attribute at `handle`.
    Write { handle: u16, data: &'a [u8] },
    /// Any other stack event, identified by its raw event id.
    Other { id: u16 },
}

/// Events raised to the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EssEvent {
    NotificationEnabled { characteristic: Characteristic },
    NotificationDisabled { characteristic: Characteristic },
}

impl EssEvent {
    pub fn characteristic(&self) -> Characteristic {
        match *self {
            Self::NotificationEnabled { characteristic } | Self::NotificationDisabled { characteristic } => {
                characteristic
            }
        }
    }
}

/// Receiver of [`EssEvent`]s.
pub trait EventSink {
    fn on_event(&mut self, event: EssEvent);
}

impl<F: FnMut(EssEvent)> EventSink for F {
    fn on_event(&mut self, event: EssEvent) {
        self(event)
    }
}

// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::registry::LinkId;

/// The single link a central may hold on the peripheral.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionState {
    link: Option<LinkId>,
}

impl ConnectionState {
    pub const fn new() -> Self {
        Self { link: None }
    }

    /// A new link replaces whatever link was recorded before.
    pub fn on_connect(&mut self, link: LinkId) {
        self.link = Some(link);
    }

    pub fn on_disconnect(&mut self) {
        self.link = None;
    }

    pub fn link(&self) -> Option<LinkId> {
        self.link
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }
}

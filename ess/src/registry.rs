// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! The attribute table and link layer the service is built on.
//! On the target this is the SoftDevice; tests provide a recording fake.

/// Connection handle of the active link, as assigned by the stack.
pub type LinkId = u16;

/// Handle of a registered primary service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceHandle(pub u16);

/// Handles assigned to a characteristic when it is added to the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharacteristicHandles {
    pub value_handle: u16,
    pub cccd_handle: u16,
}

/// Link security required to access an attribute.
/// Only passed through to the table, never checked by the service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityMode {
    NoAccess,
    #[default]
    Open,
    JustWorks,
    Mitm,
    LescMitm,
    Signed,
    SignedMitm,
}

/// Access rules of a characteristic value and its CCCD.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Permissions {
    pub read: SecurityMode,
    pub write: SecurityMode,
    pub cccd_write: SecurityMode,
}

impl Default for Permissions {
    /// Readable and subscribable by anyone, never writable.
    fn default() -> Self {
        Self {
            read: SecurityMode::Open,
            write: SecurityMode::NoAccess,
            cccd_write: SecurityMode::Open,
        }
    }
}

/// A readable + notifiable characteristic to add to a service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacteristicDef<'a> {
    /// 16-bit Bluetooth SIG UUID.
    pub uuid: u16,
    pub permissions: Permissions,
    pub max_len: usize,
    /// Value stored in the table at registration.
    pub initial_value: &'a [u8],
}

pub trait AttributeRegistry {
    type Error;

    /// Add a primary service with a 16-bit UUID.
    fn register_service(&mut self, uuid: u16) -> Result<ServiceHandle, Self::Error>;

    /// Add a characteristic with a CCCD to `service`.
    fn register_characteristic(
        &mut self,
        service: ServiceHandle,
        characteristic: &CharacteristicDef<'_>,
    ) -> Result<CharacteristicHandles, Self::Error>;

    /// Replace the value stored in the table for `value_handle`.
    fn update_value(&mut self, value_handle: u16, value: &[u8]) -> Result<(), Self::Error>;

    /// Push `value` to the client on `link` as a notification.
    ///
    /// Returns the number of bytes the link layer actually queued.
    fn notify(&mut self, link: LinkId, value_handle: u16, value: &[u8]) -> Result<usize, Self::Error>;
}

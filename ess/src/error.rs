// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

/// Errors returned by the service. `E` is the error type of the attribute registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Adding the service or one of its characteristics to the table failed.
    RegistrationFailed(E),
    /// Writing a new value into the table failed.
    TableUpdateFailed(E),
    /// The value was stored but no central is connected to notify.
    NotConnected,
    /// The link layer refused the notification.
    LinkRejected(E),
    /// The link layer queued a different number of bytes than requested.
    DataSizeMismatch { requested: usize, sent: usize },
    /// The operation is only allowed while no central is connected.
    ConnectionActive,
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RegistrationFailed(e) => write!(f, "service registration failed: {e:?}"),
            Self::TableUpdateFailed(e) => write!(f, "attribute table update failed: {e:?}"),
            Self::NotConnected => write!(f, "no central connected"),
            Self::LinkRejected(e) => write!(f, "notification rejected by the link: {e:?}"),
            Self::DataSizeMismatch { requested, sent } => {
                write!(f, "notification sent {sent} bytes, should be {requested}")
            }
            Self::ConnectionActive => write!(f, "not allowed while a central is connected"),
        }
    }
}

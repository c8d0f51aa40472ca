// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fixed-width little-endian encoding of the values exchanged over the air.

use consts::CCCD_LEN;

/// A value stored in one of the service's characteristics.
pub trait CharacteristicValue: Copy + PartialEq {
    /// Encoded width in bytes, also the characteristic's maximum length.
    const LEN: usize;

    type Bytes: AsRef<[u8]>;

    fn encode(self) -> Self::Bytes;

    /// Decode from exactly [`Self::LEN`] bytes.
    fn decode(bytes: &[u8]) -> Option<Self>;
}

impl CharacteristicValue for u32 {
    const LEN: usize = 4;
    type Bytes = [u8; 4];

    fn encode(self) -> [u8; 4] {
        self.to_le_bytes()
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(u32::from_le_bytes)
    }
}

impl CharacteristicValue for i16 {
    const LEN: usize = 2;
    type Bytes = [u8; 2];

    fn encode(self) -> [u8; 2] {
        self.to_le_bytes()
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(i16::from_le_bytes)
    }
}

/// Pressure in 0.1 Pa, as sent on the wire.
pub fn encode_pressure(pressure: u32) -> [u8; 4] {
    pressure.encode()
}

pub fn decode_pressure(bytes: &[u8]) -> Option<u32> {
    u32::decode(bytes)
}

/// Temperature in 0.01 degrees Celsius, as sent on the wire.
pub fn encode_temperature(temperature: i16) -> [u8; 2] {
    temperature.encode()
}

pub fn decode_temperature(bytes: &[u8]) -> Option<i16> {
    i16::decode(bytes)
}

/// Client Characteristic Configuration Descriptor value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cccd {
    pub notifications: bool,
    pub indications: bool,
}

impl Cccd {
    const NOTIFY: u16 = 1 << 0;
    const INDICATE: u16 = 1 << 1;

    /// Decode a client write. Anything but exactly [`CCCD_LEN`] bytes is rejected.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; CCCD_LEN] = bytes.try_into().ok()?;
        let bits = u16::from_le_bytes(raw);
        Some(Self {
            notifications: bits & Self::NOTIFY != 0,
            indications: bits & Self::INDICATE != 0,
        })
    }

    pub fn encode(self) -> [u8; CCCD_LEN] {
        let mut bits: u16 = 0;
        if self.notifications {
            bits |= Self::NOTIFY;
        }
        if self.indications {
            bits |= Self::INDICATE;
        }
        bits.to_le_bytes()
    }
}

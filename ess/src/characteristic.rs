// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use consts::{PRESSURE_UUID, TEMPERATURE_UUID};

use crate::codec::CharacteristicValue;

/// The characteristics exposed by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Characteristic {
    Pressure,
    Temperature,
}

impl Characteristic {
    pub const COUNT: usize = 2;
    pub const ALL: [Characteristic; Self::COUNT] = [Self::Pressure, Self::Temperature];

    pub const fn uuid(self) -> u16 {
        match self {
            Self::Pressure => PRESSURE_UUID,
            Self::Temperature => TEMPERATURE_UUID,
        }
    }

    /// Width of the encoded value.
    pub const fn value_len(self) -> usize {
        match self {
            Self::Pressure => u32::LEN,
            Self::Temperature => i16::LEN,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

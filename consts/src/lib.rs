// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

#![no_std]

/// ATT MTU negotiated with the central.
/// The largest value pushed by the service is 4 bytes, so the default MTU is enough.
pub const ATT_MTU: usize = 23;

/// Full device name advertised over BLE.
/// Used in scan response data since it's longer than the short name.
pub const DEVICE_NAME: &str = "Environment Sensor";

/// Short device name used in limited advertising data.
pub const SHORT_NAME: &str = "EnvSense";

/// Bluetooth SIG assigned number of the Environmental Sensing Service.
pub const ESS_UUID: u16 = 0x181A;

/// Pressure characteristic, unsigned 32-bit in units of 0.1 Pa.
pub const PRESSURE_UUID: u16 = 0x2A6D;

/// Temperature characteristic, signed 16-bit in units of 0.01 degrees Celsius.
pub const TEMPERATURE_UUID: u16 = 0x2A6E;

/// Width of a Client Characteristic Configuration Descriptor value.
pub const CCCD_LEN: usize = 2;

/// Pressure value seeded into the attribute table at registration.
pub const PRESSURE_TABLE_INITIAL: u32 = 98;

/// Temperature value seeded into the attribute table at registration.
pub const TEMPERATURE_TABLE_INITIAL: i16 = 9;

/// Last pressure value assumed before anything has been sent.
pub const PRESSURE_UNKNOWN: u32 = 0;

/// Last temperature value assumed before anything has been sent ("no reading yet").
pub const TEMPERATURE_UNKNOWN: i16 = -32767;

/// Period between two sensor samples pushed to the service.
pub const SAMPLE_PERIOD_MS: u64 = 1000;

/// Number of application events buffered between the GATT server and the event task.
pub const ESS_EVENT_QUEUE_LEN: usize = 4;

/// Advertising interval in units of 625us (about 50ms with 80 units).
pub const ADV_INTERVAL: u32 = 80;

/// Standard sea-level atmosphere in 0.1 Pa, reported while no barometer is fitted.
pub const STANDARD_PRESSURE: u32 = 1_013_250;

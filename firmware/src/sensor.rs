// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Periodic sampling pushed into the environmental sensing service.

use consts::{SAMPLE_PERIOD_MS, STANDARD_PRESSURE};
use defmt::{debug, warn};
use embassy_time::{Duration, Ticker};
use fixed::types::I30F2;
use nrf_softdevice::{raw, RawError};

use crate::server::Server;

/// Die temperature in 0.01 degrees Celsius.
fn die_temperature() -> Result<i16, RawError> {
    let mut quarter_degrees: i32 = 0;
    // The TEMP peripheral belongs to the SoftDevice while it is enabled.
    let ret = unsafe { raw::sd_temp_get(&mut quarter_degrees) };
    RawError::convert(ret)?;

    let celsius = I30F2::from_bits(quarter_degrees);
    Ok((celsius * 100).saturating_to_num::<i16>())
}

fn report(what: &str, result: Result<(), ess::Error<RawError>>) {
    match result {
        Ok(()) => {}
        Err(ess::Error::NotConnected) => debug!("{} stored, no central connected", what),
        Err(e) => warn!("{} not sent: {:?}", what, e),
    }
}

#[embassy_executor::task]
pub async fn sensor_task(server: &'static Server) {
    let mut ticker = Ticker::every(Duration::from_millis(SAMPLE_PERIOD_MS));

    loop {
        match die_temperature() {
            Ok(temperature) => report("temperature", server.send_temperature(temperature)),
            Err(e) => warn!("sd_temp_get failed: {:?}", e),
        }

        // TODO: read a barometer once the board carries one.
        report("pressure", server.send_pressure(STANDARD_PRESSURE));

        ticker.next().await;
    }
}

// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

#![no_std]
#![no_main]

mod sensor;
mod server;
mod table;

#[cfg(feature = "debug")]
use defmt_rtt as _;
// global logger
use embassy_nrf as _;
// time driver
use panic_probe as _;

use consts::ESS_EVENT_QUEUE_LEN;
use defmt::{info, *};
use embassy_executor::Spawner;
use embassy_nrf::interrupt;
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::Channel;
use ess::EssEvent;
use nrf_softdevice::Softdevice;
use sensor::sensor_task;
use server::{initialize_sd, run_bluetooth, Server};
use static_cell::StaticCell;

#[cfg(not(feature = "debug"))]
mod dummy_logging {
    #[defmt::global_logger]
    struct Logger;

    unsafe impl defmt::Logger for Logger {
        fn acquire() {}

        unsafe fn flush() {}

        unsafe fn release() {}

        unsafe fn write(_bytes: &[u8]) {}
    }
}

/// Subscription changes raised by the service, consumed by `ess_event_task`.
static ESS_EVENTS: Channel<ThreadModeRawMutex, EssEvent, ESS_EVENT_QUEUE_LEN> = Channel::new();

static SERVER: StaticCell<Server> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    info!("SD is running");
    sd.run().await
}

#[embassy_executor::task]
async fn ess_event_task() {
    loop {
        match ESS_EVENTS.receive().await {
            EssEvent::NotificationEnabled { characteristic } => {
                info!("{:?} notifications enabled", characteristic)
            }
            EssEvent::NotificationDisabled { characteristic } => {
                info!("{:?} notifications disabled", characteristic)
            }
        }
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut conf = embassy_nrf::config::Config::default();
    conf.gpiote_interrupt_priority = interrupt::Priority::P2;
    conf.time_interrupt_priority = interrupt::Priority::P2;
    let _p = embassy_nrf::init(conf);

    let sd = initialize_sd();

    let server: &'static Server = SERVER.init(unwrap!(
        Server::new(sd),
        "Registering the environmental sensing service failed"
    ));
    let sd: &'static Softdevice = sd;

    unwrap!(spawner.spawn(softdevice_task(sd)), "Spawning the softdevice failed");
    unwrap!(spawner.spawn(ess_event_task()));
    unwrap!(spawner.spawn(sensor_task(server)));
    info!("Init tasks");

    run_bluetooth(sd, server).await
}

// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use core::cell::RefCell;
use core::mem;

use consts::{ADV_INTERVAL, ATT_MTU, DEVICE_NAME, ESS_UUID, SHORT_NAME};
use defmt::{error, info, warn};
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Timer;
use ess::{Config, EssEvent, EssService, StackEvent};
use nrf_softdevice::ble::advertisement_builder::{
    ExtendedAdvertisementBuilder, ExtendedAdvertisementPayload, Flag, ServiceList, ServiceUuid16,
};
use nrf_softdevice::ble::gatt_server::{self, WriteOp};
use nrf_softdevice::ble::{peripheral, Connection};
use nrf_softdevice::{raw, RawError, Softdevice};

use crate::table::SoftdeviceTable;
use crate::ESS_EVENTS;

pub type Ess = EssService<SoftdeviceTable, fn(EssEvent)>;

/// GATT server hosting the environmental sensing service.
///
/// The service is only ever touched from the thread-mode executor, the mutex
/// keeps GATT callbacks and the sampling task from interleaving inside it.
pub struct Server {
    ess: Mutex<ThreadModeRawMutex, RefCell<Ess>>,
}

pub fn initialize_sd() -> &'static mut Softdevice {
    let config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: ATT_MTU as u16 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(raw::BLE_GATTS_VLOC_STACK as u8),
        }),
        conn_gatts: Some(raw::ble_gatts_conn_cfg_t { hvn_tx_queue_size: 3 }),

        ..Default::default()
    };

    Softdevice::enable(&config)
}

/// Hands application events over to the event task.
fn forward_event(event: EssEvent) {
    if ESS_EVENTS.try_send(event).is_err() {
        warn!("ESS event queue full, dropping {:?}", event);
    }
}

impl Server {
    pub fn new(sd: &mut Softdevice) -> Result<Self, ess::Error<RawError>> {
        let config = Config {
            event_sink: Some(forward_event as fn(EssEvent)),
            ..Config::default()
        };
        let ess = EssService::init(SoftdeviceTable::new(sd), config)?;

        Ok(Self {
            ess: Mutex::new(RefCell::new(ess)),
        })
    }

    fn dispatch(&self, event: StackEvent<'_>) {
        self.ess.lock(|ess| ess.borrow_mut().dispatch(event));
    }

    pub fn send_pressure(&self, pressure: u32) -> Result<(), ess::Error<RawError>> {
        self.ess.lock(|ess| ess.borrow_mut().send_pressure(pressure))
    }

    pub fn send_temperature(&self, temperature: i16) -> Result<(), ess::Error<RawError>> {
        self.ess.lock(|ess| ess.borrow_mut().send_temperature(temperature))
    }
}

impl gatt_server::Server for Server {
    type Event = ();

    fn on_write(&self, _conn: &Connection, handle: u16, _op: WriteOp, _offset: usize, data: &[u8]) -> Option<()> {
        self.dispatch(StackEvent::Write { handle, data });
        None
    }

    fn on_notify_tx_complete(&self, _conn: &Connection, _count: u8) -> Option<()> {
        self.dispatch(StackEvent::Other {
            id: raw::BLE_GATTS_EVTS_BLE_GATTS_EVT_HVN_TX_COMPLETE as u16,
        });
        None
    }
}

/// Advertise, serve one central at a time and feed link changes to the service.
pub async fn run_bluetooth(sd: &'static Softdevice, server: &Server) -> ! {
    static ADV_DATA: ExtendedAdvertisementPayload = ExtendedAdvertisementBuilder::new()
        .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
        .services_16(ServiceList::Complete, &[ServiceUuid16::from_u16(ESS_UUID)])
        .short_name(SHORT_NAME)
        .build();

    static SCAN_DATA: ExtendedAdvertisementPayload = ExtendedAdvertisementBuilder::new().full_name(DEVICE_NAME).build();

    let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
        adv_data: &ADV_DATA,
        scan_data: &SCAN_DATA,
    };

    loop {
        let config = peripheral::Config {
            interval: ADV_INTERVAL,
            ..Default::default()
        };

        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                error!("advertising failed: {:?}", e);
                Timer::after_secs(1).await;
                continue;
            }
        };

        let Some(link) = conn.handle() else {
            // Disconnected before we got to look at it.
            continue;
        };
        info!("connected, link {}", link);
        server.dispatch(StackEvent::Connected { link });

        // Returns when the connection gets disconnected.
        let e = gatt_server::run(&conn, server, |_| {}).await;
        info!("gatt_server run exited: {:?}", e);

        server.dispatch(StackEvent::Disconnected);
    }
}

// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Attribute table and notifications backed by the SoftDevice GATT server.

use core::mem;

use ess::{AttributeRegistry, CharacteristicDef, CharacteristicHandles, LinkId, SecurityMode, ServiceHandle};
use nrf_softdevice::{raw, RawError, Softdevice};

pub struct SoftdeviceTable {
    _private: (),
}

impl SoftdeviceTable {
    /// Attributes can only be added once the SoftDevice is enabled and before it runs.
    pub fn new(_sd: &mut Softdevice) -> Self {
        Self { _private: () }
    }
}

fn sec_mode(mode: SecurityMode) -> raw::ble_gap_conn_sec_mode_t {
    let (sm, lv) = match mode {
        SecurityMode::NoAccess => (0, 0),
        SecurityMode::Open => (1, 1),
        SecurityMode::JustWorks => (1, 2),
        SecurityMode::Mitm => (1, 3),
        SecurityMode::LescMitm => (1, 4),
        SecurityMode::Signed => (2, 1),
        SecurityMode::SignedMitm => (2, 2),
    };
    let mut perm: raw::ble_gap_conn_sec_mode_t = unsafe { mem::zeroed() };
    perm._bitfield_1 = raw::ble_gap_conn_sec_mode_t::new_bitfield_1(sm, lv);
    perm
}

fn attr_md(read: SecurityMode, write: SecurityMode, variable_len: bool) -> raw::ble_gatts_attr_md_t {
    let mut md: raw::ble_gatts_attr_md_t = unsafe { mem::zeroed() };
    md.read_perm = sec_mode(read);
    md.write_perm = sec_mode(write);
    // vlen, vloc, rd_auth, wr_auth
    md._bitfield_1 =
        raw::ble_gatts_attr_md_t::new_bitfield_1(variable_len as u8, raw::BLE_GATTS_VLOC_STACK as u8, 0, 0);
    md
}

fn ble_uuid(uuid: u16) -> raw::ble_uuid_t {
    raw::ble_uuid_t {
        uuid,
        type_: raw::BLE_UUID_TYPE_BLE as u8,
    }
}

impl AttributeRegistry for SoftdeviceTable {
    type Error = RawError;

    fn register_service(&mut self, uuid: u16) -> Result<ServiceHandle, RawError> {
        let uuid = ble_uuid(uuid);
        let mut handle: u16 = 0;
        let ret = unsafe { raw::sd_ble_gatts_service_add(raw::BLE_GATTS_SRVC_TYPE_PRIMARY as u8, &uuid, &mut handle) };
        RawError::convert(ret)?;
        Ok(ServiceHandle(handle))
    }

    fn register_characteristic(
        &mut self,
        service: ServiceHandle,
        characteristic: &CharacteristicDef<'_>,
    ) -> Result<CharacteristicHandles, RawError> {
        let uuid = ble_uuid(characteristic.uuid);
        let permissions = characteristic.permissions;

        let cccd_md = attr_md(SecurityMode::Open, permissions.cccd_write, false);
        let value_md = attr_md(permissions.read, permissions.write, true);

        let mut char_md: raw::ble_gatts_char_md_t = unsafe { mem::zeroed() };
        // broadcast, read, write_wo_resp, write, notify, indicate, auth_signed_wr
        char_md.char_props._bitfield_1 = raw::ble_gatts_char_props_t::new_bitfield_1(0, 1, 0, 0, 1, 0, 0);
        char_md.p_cccd_md = &cccd_md;

        let value = raw::ble_gatts_attr_t {
            p_uuid: &uuid,
            p_attr_md: &value_md,
            init_len: characteristic.initial_value.len() as u16,
            init_offs: 0,
            max_len: characteristic.max_len as u16,
            // Copied into the SoftDevice's own storage (BLE_GATTS_VLOC_STACK).
            p_value: characteristic.initial_value.as_ptr() as *mut u8,
        };

        let mut handles: raw::ble_gatts_char_handles_t = unsafe { mem::zeroed() };
        let ret = unsafe { raw::sd_ble_gatts_characteristic_add(service.0, &char_md, &value, &mut handles) };
        RawError::convert(ret)?;

        Ok(CharacteristicHandles {
            value_handle: handles.value_handle,
            cccd_handle: handles.cccd_handle,
        })
    }

    fn update_value(&mut self, value_handle: u16, value: &[u8]) -> Result<(), RawError> {
        let mut value = raw::ble_gatts_value_t {
            len: value.len() as u16,
            offset: 0,
            p_value: value.as_ptr() as *mut u8,
        };
        let ret = unsafe { raw::sd_ble_gatts_value_set(raw::BLE_CONN_HANDLE_INVALID as u16, value_handle, &mut value) };
        RawError::convert(ret)
    }

    fn notify(&mut self, link: LinkId, value_handle: u16, value: &[u8]) -> Result<usize, RawError> {
        let mut len = value.len() as u16;
        let params = raw::ble_gatts_hvx_params_t {
            handle: value_handle,
            type_: raw::BLE_GATT_HVX_NOTIFICATION as u8,
            offset: 0,
            p_len: &mut len,
            p_data: value.as_ptr(),
        };
        let ret = unsafe { raw::sd_ble_gatts_hvx(link, &params) };
        RawError::convert(ret)?;
        Ok(usize::from(len))
    }
}

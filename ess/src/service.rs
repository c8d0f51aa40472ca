// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use consts::{
    ESS_UUID, PRESSURE_TABLE_INITIAL, PRESSURE_UNKNOWN, TEMPERATURE_TABLE_INITIAL, TEMPERATURE_UNKNOWN,
};

use crate::characteristic::Characteristic;
use crate::codec::CharacteristicValue;
use crate::connection::ConnectionState;
use crate::error::Error;
use crate::event::{EssEvent, EventSink, StackEvent};
use crate::registry::{AttributeRegistry, CharacteristicDef, CharacteristicHandles, LinkId, Permissions, ServiceHandle};
use crate::subscription::SubscriptionTracker;

/// Service setup passed to [`EssService::init`].
#[derive(Clone, Copy, Debug)]
pub struct Config<S = fn(EssEvent)> {
    /// Receives subscription changes. `None` drops them.
    pub event_sink: Option<S>,
    pub sensor_contact_supported: bool,
    pub pressure_permissions: Permissions,
    pub temperature_permissions: Permissions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_sink: None,
            sensor_contact_supported: false,
            pressure_permissions: Permissions::default(),
            temperature_permissions: Permissions::default(),
        }
    }
}

impl<S> Config<S> {
    pub fn with_event_sink<T: EventSink>(self, sink: T) -> Config<T> {
        Config {
            event_sink: Some(sink),
            sensor_contact_supported: self.sensor_contact_supported,
            pressure_permissions: self.pressure_permissions,
            temperature_permissions: self.temperature_permissions,
        }
    }
}

/// A characteristic's table handles and the last value written to the table.
#[derive(Debug)]
struct Slot<T> {
    characteristic: Characteristic,
    handles: CharacteristicHandles,
    last: T,
}

impl<T: CharacteristicValue> Slot<T> {
    fn register<R: AttributeRegistry>(
        registry: &mut R,
        service: ServiceHandle,
        characteristic: Characteristic,
        permissions: Permissions,
        table_initial: T,
        last: T,
    ) -> Result<Self, Error<R::Error>> {
        let initial = table_initial.encode();
        let handles = registry
            .register_characteristic(
                service,
                &CharacteristicDef {
                    uuid: characteristic.uuid(),
                    permissions,
                    max_len: T::LEN,
                    initial_value: initial.as_ref(),
                },
            )
            .map_err(|e| {
                warn!("failed to add {:?} characteristic", characteristic);
                Error::RegistrationFailed(e)
            })?;

        debug!(
            "{:?} value handle {}, CCCD handle {}",
            characteristic, handles.value_handle, handles.cccd_handle
        );
        Ok(Self {
            characteristic,
            handles,
            last,
        })
    }

    /// Store `value` and notify it on `link`, unless it equals the last value sent.
    fn send<R: AttributeRegistry>(
        &mut self,
        registry: &mut R,
        link: Option<LinkId>,
        value: T,
    ) -> Result<(), Error<R::Error>> {
        if value == self.last {
            return Ok(());
        }

        let bytes = value.encode();
        let bytes = bytes.as_ref();

        // Table and cache stay in step: a failed table write keeps the old value.
        if let Err(e) = registry.update_value(self.handles.value_handle, bytes) {
            warn!("{:?} table update failed", self.characteristic);
            return Err(Error::TableUpdateFailed(e));
        }
        self.last = value;

        let Some(link) = link else {
            return Err(Error::NotConnected);
        };

        let sent = registry
            .notify(link, self.handles.value_handle, bytes)
            .map_err(|e| {
                warn!("{:?} notification rejected on link {}", self.characteristic, link);
                Error::LinkRejected(e)
            })?;

        if sent != bytes.len() {
            warn!("{:?} notified {} of {} bytes", self.characteristic, sent, bytes.len());
            return Err(Error::DataSizeMismatch {
                requested: bytes.len(),
                sent,
            });
        }

        Ok(())
    }
}

/// Environmental Sensing Service with a pressure and a temperature characteristic.
///
/// Owns the attribute registry it was registered with. All calls must come from
/// one execution context; the service does no locking.
pub struct EssService<R, S = fn(EssEvent)> {
    registry: R,
    event_sink: Option<S>,
    service_handle: ServiceHandle,
    connection: ConnectionState,
    subscriptions: SubscriptionTracker,
    pressure: Slot<u32>,
    temperature: Slot<i16>,
    sensor_contact_supported: bool,
    sensor_contact_detected: bool,
}

impl<R: AttributeRegistry, S: EventSink> EssService<R, S> {
    /// Add the service and its characteristics to `registry`.
    ///
    /// Any registration failure aborts and is returned as [`Error::RegistrationFailed`].
    pub fn init(mut registry: R, config: Config<S>) -> Result<Self, Error<R::Error>> {
        let service_handle = registry.register_service(ESS_UUID).map_err(|e| {
            warn!("failed to add the environmental sensing service");
            Error::RegistrationFailed(e)
        })?;

        let pressure = Slot::register(
            &mut registry,
            service_handle,
            Characteristic::Pressure,
            config.pressure_permissions,
            PRESSURE_TABLE_INITIAL,
            PRESSURE_UNKNOWN,
        )?;
        let temperature = Slot::register(
            &mut registry,
            service_handle,
            Characteristic::Temperature,
            config.temperature_permissions,
            TEMPERATURE_TABLE_INITIAL,
            TEMPERATURE_UNKNOWN,
        )?;

        info!("environmental sensing service ready, handle {}", service_handle.0);

        Ok(Self {
            registry,
            event_sink: config.event_sink,
            service_handle,
            connection: ConnectionState::new(),
            subscriptions: SubscriptionTracker::new(),
            pressure,
            temperature,
            sensor_contact_supported: config.sensor_contact_supported,
            sensor_contact_detected: false,
        })
    }

    /// Feed one event from the BLE stack.
    pub fn dispatch(&mut self, event: StackEvent<'_>) {
        match event {
            StackEvent::Connected { link } => {
                debug!("connected on link {}", link);
                self.connection.on_connect(link);
            }
            StackEvent::Disconnected => {
                debug!("disconnected");
                self.connection.on_disconnect();
            }
            StackEvent::Write { handle, data } => self.on_write(handle, data),
            StackEvent::Other { id } => trace!("ignoring stack event {}", id),
        }
    }

    fn on_write(&mut self, handle: u16, data: &[u8]) {
        let Some(characteristic) = self.characteristic_by_cccd(handle) else {
            return;
        };

        if let Some(event) = self.subscriptions.on_configuration_write(characteristic, data) {
            if let Some(sink) = self.event_sink.as_mut() {
                sink.on_event(event);
            }
        }
    }

    fn characteristic_by_cccd(&self, handle: u16) -> Option<Characteristic> {
        Characteristic::ALL
            .into_iter()
            .find(|&characteristic| self.handles(characteristic).cccd_handle == handle)
    }

    /// Publish a pressure reading in 0.1 Pa.
    ///
    /// Sending the value sent last is a no-op. With no central connected the value
    /// is still stored in the table and [`Error::NotConnected`] is returned.
    pub fn send_pressure(&mut self, pressure: u32) -> Result<(), Error<R::Error>> {
        self.pressure.send(&mut self.registry, self.connection.link(), pressure)
    }

    /// Publish a temperature reading in 0.01 degrees Celsius.
    ///
    /// Same rules as [`Self::send_pressure`].
    pub fn send_temperature(&mut self, temperature: i16) -> Result<(), Error<R::Error>> {
        self.temperature.send(&mut self.registry, self.connection.link(), temperature)
    }

    /// Change whether sensor contact detection is supported.
    /// Refused while a central is connected.
    pub fn set_sensor_contact_supported(&mut self, supported: bool) -> Result<(), Error<R::Error>> {
        if self.connection.is_connected() {
            return Err(Error::ConnectionActive);
        }
        self.sensor_contact_supported = supported;
        Ok(())
    }

    pub fn update_sensor_contact_detected(&mut self, detected: bool) {
        self.sensor_contact_detected = detected;
    }
}

impl<R, S> EssService<R, S> {
    pub fn service_handle(&self) -> ServiceHandle {
        self.service_handle
    }

    pub fn handles(&self, characteristic: Characteristic) -> CharacteristicHandles {
        match characteristic {
            Characteristic::Pressure => self.pressure.handles,
            Characteristic::Temperature => self.temperature.handles,
        }
    }

    pub fn connection(&self) -> Option<LinkId> {
        self.connection.link()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn is_subscribed(&self, characteristic: Characteristic) -> bool {
        self.subscriptions.is_subscribed(characteristic)
    }

    pub fn last_pressure(&self) -> u32 {
        self.pressure.last
    }

    pub fn last_temperature(&self) -> i16 {
        self.temperature.last
    }

    pub fn sensor_contact_supported(&self) -> bool {
        self.sensor_contact_supported
    }

    pub fn sensor_contact_detected(&self) -> bool {
        self.sensor_contact_detected
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }
}

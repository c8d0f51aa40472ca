extern crate std;

use core::cell::{Cell, RefCell};
use std::string::ToString;

use heapless::Vec;

use super::*;

type Bytes = Vec<u8, 4>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    RegisterService { uuid: u16 },
    RegisterCharacteristic { uuid: u16, max_len: usize, initial: Bytes, permissions: Permissions },
    UpdateValue { handle: u16, value: Bytes },
    Notify { link: LinkId, handle: u16, value: Bytes },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockError {
    Registration,
    Table,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotifyOutcome {
    Sent,
    Rejected,
    Truncated(usize),
}

struct MockRegistry {
    next_handle: u16,
    calls: Vec<Call, 32>,
    fail_service: bool,
    fail_characteristic: Option<u16>,
    fail_update: Cell<bool>,
    notify_outcome: Cell<NotifyOutcome>,
}

impl MockRegistry {
    fn new() -> Self {
        Self {
            next_handle: 0x000C,
            calls: Vec::new(),
            fail_service: false,
            fail_characteristic: None,
            fail_update: Cell::new(false),
            notify_outcome: Cell::new(NotifyOutcome::Sent),
        }
    }

    fn record(&mut self, call: Call) {
        self.calls.push(call).unwrap();
    }

    fn runtime_calls(&self) -> impl Iterator<Item = &Call> {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::UpdateValue { .. } | Call::Notify { .. }))
    }

    fn runtime_call_count(&self) -> usize {
        self.runtime_calls().count()
    }

    fn last_call(&self) -> Option<&Call> {
        self.calls.last()
    }
}

fn bytes(value: &[u8]) -> Bytes {
    Vec::from_slice(value).unwrap()
}

impl AttributeRegistry for MockRegistry {
    type Error = MockError;

    fn register_service(&mut self, uuid: u16) -> Result<ServiceHandle, MockError> {
        self.record(Call::RegisterService { uuid });
        if self.fail_service {
            return Err(MockError::Registration);
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        Ok(ServiceHandle(handle))
    }

    fn register_characteristic(
        &mut self,
        _service: ServiceHandle,
        characteristic: &CharacteristicDef<'_>,
    ) -> Result<CharacteristicHandles, MockError> {
        self.record(Call::RegisterCharacteristic {
            uuid: characteristic.uuid,
            max_len: characteristic.max_len,
            initial: bytes(characteristic.initial_value),
            permissions: characteristic.permissions,
        });
        if self.fail_characteristic == Some(characteristic.uuid) {
            return Err(MockError::Registration);
        }
        // Declaration, value and CCCD attributes.
        let handles = CharacteristicHandles {
            value_handle: self.next_handle + 1,
            cccd_handle: self.next_handle + 2,
        };
        self.next_handle += 3;
        Ok(handles)
    }

    fn update_value(&mut self, value_handle: u16, value: &[u8]) -> Result<(), MockError> {
        if self.fail_update.get() {
            return Err(MockError::Table);
        }
        self.record(Call::UpdateValue {
            handle: value_handle,
            value: bytes(value),
        });
        Ok(())
    }

    fn notify(&mut self, link: LinkId, value_handle: u16, value: &[u8]) -> Result<usize, MockError> {
        self.record(Call::Notify {
            link,
            handle: value_handle,
            value: bytes(value),
        });
        match self.notify_outcome.get() {
            NotifyOutcome::Sent => Ok(value.len()),
            NotifyOutcome::Rejected => Err(MockError::Link),
            NotifyOutcome::Truncated(len) => Ok(len),
        }
    }
}

type Events = RefCell<Vec<EssEvent, 8>>;

fn service() -> EssService<MockRegistry> {
    EssService::init(MockRegistry::new(), Config::default()).unwrap()
}

fn service_with_events(events: &Events) -> EssService<MockRegistry, impl FnMut(EssEvent) + '_> {
    let config = Config::default().with_event_sink(move |event: EssEvent| events.borrow_mut().push(event).unwrap());
    EssService::init(MockRegistry::new(), config).unwrap()
}

fn cccd_write<R: AttributeRegistry, S: EventSink>(
    service: &mut EssService<R, S>,
    characteristic: Characteristic,
    data: &[u8],
) {
    let handle = service.handles(characteristic).cccd_handle;
    service.dispatch(StackEvent::Write { handle, data });
}

#[test]
fn init_registers_service_and_characteristics() {
    let service = service();
    let calls = &service.registry().calls;

    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], Call::RegisterService { uuid: 0x181A });
    assert_eq!(
        calls[1],
        Call::RegisterCharacteristic {
            uuid: 0x2A6D,
            max_len: Characteristic::Pressure.value_len(),
            initial: bytes(&98u32.to_le_bytes()),
            permissions: Permissions::default(),
        }
    );
    assert_eq!(
        calls[2],
        Call::RegisterCharacteristic {
            uuid: 0x2A6E,
            max_len: Characteristic::Temperature.value_len(),
            initial: bytes(&9i16.to_le_bytes()),
            permissions: Permissions::default(),
        }
    );

    assert_eq!(service.service_handle(), ServiceHandle(0x000C));
    assert_eq!(
        service.handles(Characteristic::Pressure),
        CharacteristicHandles {
            value_handle: 0x000E,
            cccd_handle: 0x000F
        }
    );
    assert_eq!(
        service.handles(Characteristic::Temperature),
        CharacteristicHandles {
            value_handle: 0x0011,
            cccd_handle: 0x0012
        }
    );
}

#[test]
fn init_starts_idle() {
    let service = service();

    assert_eq!(service.connection(), None);
    assert!(!service.is_subscribed(Characteristic::Pressure));
    assert!(!service.is_subscribed(Characteristic::Temperature));
    assert_eq!(service.last_pressure(), 0);
    assert_eq!(service.last_temperature(), -32767);
    assert!(!service.sensor_contact_supported());
    assert!(!service.sensor_contact_detected());
}

#[test]
fn init_passes_permissions_through() {
    let pressure_permissions = Permissions {
        read: SecurityMode::JustWorks,
        write: SecurityMode::NoAccess,
        cccd_write: SecurityMode::Mitm,
    };
    let temperature_permissions = Permissions {
        read: SecurityMode::Open,
        write: SecurityMode::LescMitm,
        cccd_write: SecurityMode::SignedMitm,
    };
    let config = Config {
        sensor_contact_supported: true,
        pressure_permissions,
        temperature_permissions,
        ..Config::default()
    };
    let service = EssService::init(MockRegistry::new(), config).unwrap();

    assert!(service.sensor_contact_supported());
    let calls = &service.registry().calls;
    assert!(matches!(
        &calls[1],
        Call::RegisterCharacteristic { permissions, .. } if *permissions == pressure_permissions
    ));
    assert!(matches!(
        &calls[2],
        Call::RegisterCharacteristic { permissions, .. } if *permissions == temperature_permissions
    ));
}

#[test]
fn init_aborts_when_service_registration_fails() {
    let mut registry = MockRegistry::new();
    registry.fail_service = true;

    let result = EssService::init(registry, Config::default());
    assert!(matches!(result, Err(Error::RegistrationFailed(MockError::Registration))));
}

#[test]
fn init_aborts_when_characteristic_registration_fails() {
    for uuid in [0x2A6D, 0x2A6E] {
        let mut registry = MockRegistry::new();
        registry.fail_characteristic = Some(uuid);

        let result = EssService::init(registry, Config::default());
        assert!(matches!(result, Err(Error::RegistrationFailed(MockError::Registration))));
    }
}

#[test]
fn connect_send_repeat_disconnect_scenario() {
    let mut service = service();
    let pressure = service.handles(Characteristic::Pressure).value_handle;

    service.dispatch(StackEvent::Connected { link: 1 });
    assert_eq!(service.send_pressure(100), Ok(()));
    assert_eq!(service.registry().runtime_call_count(), 2);
    let mut calls = service.registry().runtime_calls();
    assert_eq!(
        calls.next(),
        Some(&Call::UpdateValue {
            handle: pressure,
            value: bytes(&[100, 0, 0, 0])
        })
    );
    assert_eq!(
        calls.next(),
        Some(&Call::Notify {
            link: 1,
            handle: pressure,
            value: bytes(&[100, 0, 0, 0])
        })
    );
    drop(calls);

    assert_eq!(service.send_pressure(100), Ok(()));
    assert_eq!(service.registry().runtime_call_count(), 2);

    service.dispatch(StackEvent::Disconnected);
    assert_eq!(service.send_pressure(101), Err(Error::NotConnected));
    assert_eq!(service.registry().runtime_call_count(), 3);
    assert_eq!(
        service.registry().last_call(),
        Some(&Call::UpdateValue {
            handle: pressure,
            value: bytes(&[101, 0, 0, 0])
        })
    );
    assert_eq!(service.last_pressure(), 101);
}

#[test]
fn identical_values_are_sent_once() {
    let mut service = service();
    service.dispatch(StackEvent::Connected { link: 3 });

    for value in [5, 5, 5, 6, 6, 5] {
        assert_eq!(service.send_pressure(value), Ok(()));
    }
    // Three changes (5, 6, 5), each an update plus a notification.
    assert_eq!(service.registry().runtime_call_count(), 6);
}

#[test]
fn initial_cached_values_are_not_sent() {
    let mut service = service();
    service.dispatch(StackEvent::Connected { link: 1 });

    assert_eq!(service.send_pressure(0), Ok(()));
    assert_eq!(service.send_temperature(-32767), Ok(()));
    assert_eq!(service.registry().runtime_call_count(), 0);
}

#[test]
fn send_without_link_still_updates_table() {
    let mut service = service();
    let temperature = service.handles(Characteristic::Temperature).value_handle;

    assert_eq!(service.send_temperature(2150), Err(Error::NotConnected));
    assert_eq!(service.send_pressure(1_013_250), Err(Error::NotConnected));
    assert_eq!(service.last_temperature(), 2150);
    assert_eq!(service.last_pressure(), 1_013_250);
    assert_eq!(service.registry().runtime_call_count(), 2);
    assert!(service
        .registry()
        .runtime_calls()
        .all(|call| matches!(call, Call::UpdateValue { .. })));
    assert!(service.registry().runtime_calls().any(|call| *call
        == Call::UpdateValue {
            handle: temperature,
            value: bytes(&2150i16.to_le_bytes())
        }));

    // Unchanged value is a no-op even without a link.
    assert_eq!(service.send_temperature(2150), Ok(()));
}

#[test]
fn temperature_compares_as_signed() {
    let mut service = service();
    service.dispatch(StackEvent::Connected { link: 1 });

    assert_eq!(service.send_temperature(-1), Ok(()));
    assert_eq!(service.send_temperature(-1), Ok(()));
    assert_eq!(service.send_temperature(i16::MIN), Ok(()));
    assert_eq!(service.last_temperature(), i16::MIN);
    assert_eq!(
        service.registry().last_call(),
        Some(&Call::Notify {
            link: 1,
            handle: service.handles(Characteristic::Temperature).value_handle,
            value: bytes(&[0x00, 0x80])
        })
    );
    assert_eq!(service.registry().runtime_call_count(), 4);
}

#[test]
fn notify_is_attempted_without_subscription() {
    let mut service = service();
    service.dispatch(StackEvent::Connected { link: 7 });
    assert!(!service.is_subscribed(Characteristic::Temperature));

    assert_eq!(service.send_temperature(100), Ok(()));
    assert!(matches!(
        service.registry().last_call(),
        Some(Call::Notify { link: 7, .. })
    ));
}

#[test]
fn link_rejection_is_reported() {
    let mut service = service();
    service.dispatch(StackEvent::Connected { link: 1 });
    service.registry().notify_outcome.set(NotifyOutcome::Rejected);

    assert_eq!(service.send_pressure(42), Err(Error::LinkRejected(MockError::Link)));
    // The table was updated before the notification was attempted.
    assert_eq!(service.last_pressure(), 42);
    assert_eq!(service.send_pressure(42), Ok(()));
}

#[test]
fn short_transmission_is_a_size_mismatch() {
    let mut service = service();
    service.dispatch(StackEvent::Connected { link: 1 });
    service.registry().notify_outcome.set(NotifyOutcome::Truncated(2));

    assert_eq!(
        service.send_pressure(42),
        Err(Error::DataSizeMismatch { requested: 4, sent: 2 })
    );

    service.registry().notify_outcome.set(NotifyOutcome::Truncated(1));
    assert_eq!(
        service.send_temperature(42),
        Err(Error::DataSizeMismatch { requested: 2, sent: 1 })
    );
}

#[test]
fn table_failure_skips_notify_and_keeps_previous_value() {
    let mut service = service();
    service.dispatch(StackEvent::Connected { link: 1 });
    assert_eq!(service.send_pressure(10), Ok(()));
    let before = service.registry().runtime_call_count();

    service.registry().fail_update.set(true);
    assert_eq!(service.send_pressure(11), Err(Error::TableUpdateFailed(MockError::Table)));
    assert_eq!(service.registry().runtime_call_count(), before);
    assert_eq!(service.last_pressure(), 10);

    // The failed value is not considered sent, so retrying it goes through.
    service.registry().fail_update.set(false);
    assert_eq!(service.send_pressure(11), Ok(()));
    assert_eq!(service.last_pressure(), 11);
    assert_eq!(service.registry().runtime_call_count(), before + 2);
}

#[test]
fn table_failure_without_link_keeps_initial_value() {
    let mut service = service();

    service.registry().fail_update.set(true);
    assert_eq!(service.send_temperature(25), Err(Error::TableUpdateFailed(MockError::Table)));
    assert_eq!(service.last_temperature(), -32767);
    assert_eq!(service.registry().runtime_call_count(), 0);

    service.registry().fail_update.set(false);
    assert_eq!(service.send_temperature(25), Err(Error::NotConnected));
    assert_eq!(service.last_temperature(), 25);
    assert_eq!(service.registry().runtime_call_count(), 1);
}

#[test]
fn cccd_write_enables_notifications_once() {
    let events = Events::default();
    let mut service = service_with_events(&events);

    cccd_write(&mut service, Characteristic::Pressure, &[0x01, 0x00]);

    assert!(service.is_subscribed(Characteristic::Pressure));
    assert!(!service.is_subscribed(Characteristic::Temperature));
    assert_eq!(
        events.borrow().as_slice(),
        &[EssEvent::NotificationEnabled {
            characteristic: Characteristic::Pressure
        }]
    );
}

#[test]
fn cccd_write_reannounces_unchanged_state() {
    let events = Events::default();
    let mut service = service_with_events(&events);

    cccd_write(&mut service, Characteristic::Temperature, &[0x00, 0x00]);
    cccd_write(&mut service, Characteristic::Temperature, &[0x00, 0x00]);
    cccd_write(&mut service, Characteristic::Temperature, &[0x01, 0x00]);
    cccd_write(&mut service, Characteristic::Temperature, &[0x01, 0x00]);

    let disabled = EssEvent::NotificationDisabled {
        characteristic: Characteristic::Temperature,
    };
    let enabled = EssEvent::NotificationEnabled {
        characteristic: Characteristic::Temperature,
    };
    assert_eq!(events.borrow().as_slice(), &[disabled, disabled, enabled, enabled]);
    assert!(events
        .borrow()
        .iter()
        .all(|event| event.characteristic() == Characteristic::Temperature));
    assert!(service.is_subscribed(Characteristic::Temperature));
}

#[test]
fn malformed_cccd_write_is_ignored() {
    let events = Events::default();
    let mut service = service_with_events(&events);
    cccd_write(&mut service, Characteristic::Pressure, &[0x01, 0x00]);
    events.borrow_mut().clear();

    cccd_write(&mut service, Characteristic::Pressure, &[0x00]);
    cccd_write(&mut service, Characteristic::Pressure, &[0x00, 0x00, 0x00]);
    cccd_write(&mut service, Characteristic::Pressure, &[]);

    assert!(service.is_subscribed(Characteristic::Pressure));
    assert!(events.borrow().is_empty());
}

#[test]
fn writes_to_other_handles_are_ignored() {
    let events = Events::default();
    let mut service = service_with_events(&events);
    let value_handle = service.handles(Characteristic::Pressure).value_handle;

    service.dispatch(StackEvent::Write {
        handle: value_handle,
        data: &[0x01, 0x00],
    });
    service.dispatch(StackEvent::Write {
        handle: 0x0100,
        data: &[0x01, 0x00],
    });

    assert!(!service.is_subscribed(Characteristic::Pressure));
    assert!(!service.is_subscribed(Characteristic::Temperature));
    assert!(events.borrow().is_empty());
}

#[test]
fn other_stack_events_are_ignored() {
    let events = Events::default();
    let mut service = service_with_events(&events);
    service.dispatch(StackEvent::Connected { link: 4 });

    // BLE_GATTS_EVT_HVN_TX_COMPLETE and BLE_GAP_EVT_CONN_PARAM_UPDATE
    service.dispatch(StackEvent::Other { id: 0x57 });
    service.dispatch(StackEvent::Other { id: 0x12 });

    assert_eq!(service.connection(), Some(4));
    assert!(events.borrow().is_empty());
}

#[test]
fn cccd_write_without_sink_still_tracks() {
    let mut service = service();
    cccd_write(&mut service, Characteristic::Temperature, &[0x01, 0x00]);
    assert!(service.is_subscribed(Characteristic::Temperature));
}

#[test]
fn reconnect_keeps_subscriptions() {
    let mut service = service();
    service.dispatch(StackEvent::Connected { link: 1 });
    cccd_write(&mut service, Characteristic::Pressure, &[0x01, 0x00]);

    service.dispatch(StackEvent::Disconnected);
    assert_eq!(service.connection(), None);
    assert!(service.is_subscribed(Characteristic::Pressure));

    service.dispatch(StackEvent::Connected { link: 2 });
    assert_eq!(service.connection(), Some(2));
    assert!(service.is_subscribed(Characteristic::Pressure));
    assert!(!service.is_subscribed(Characteristic::Temperature));
}

#[test]
fn new_connection_replaces_previous_link() {
    let mut service = service();
    service.dispatch(StackEvent::Connected { link: 1 });
    service.dispatch(StackEvent::Connected { link: 9 });

    assert_eq!(service.send_pressure(1), Ok(()));
    assert!(matches!(
        service.registry().last_call(),
        Some(Call::Notify { link: 9, .. })
    ));
}

#[test]
fn service_stays_usable_after_errors() {
    let mut service = service();
    assert_eq!(service.send_pressure(1), Err(Error::NotConnected));

    service.dispatch(StackEvent::Connected { link: 1 });
    service.registry().notify_outcome.set(NotifyOutcome::Rejected);
    assert!(service.send_pressure(2).is_err());

    service.registry().notify_outcome.set(NotifyOutcome::Sent);
    assert_eq!(service.send_pressure(3), Ok(()));
}

#[test]
fn sensor_contact_support_is_locked_while_connected() {
    let mut service = service();
    assert_eq!(service.set_sensor_contact_supported(true), Ok(()));
    assert!(service.sensor_contact_supported());

    service.dispatch(StackEvent::Connected { link: 1 });
    assert_eq!(service.set_sensor_contact_supported(false), Err(Error::ConnectionActive));
    assert!(service.sensor_contact_supported());

    service.dispatch(StackEvent::Disconnected);
    assert_eq!(service.set_sensor_contact_supported(false), Ok(()));
    assert!(!service.sensor_contact_supported());
}

#[test]
fn sensor_contact_detection_is_recorded() {
    let mut service = service();
    service.dispatch(StackEvent::Connected { link: 1 });

    service.update_sensor_contact_detected(true);
    assert!(service.sensor_contact_detected());
    service.update_sensor_contact_detected(false);
    assert!(!service.sensor_contact_detected());
}

#[test]
fn errors_display() {
    assert_eq!(Error::<MockError>::NotConnected.to_string(), "no central connected");
    assert_eq!(
        Error::<MockError>::DataSizeMismatch { requested: 4, sent: 2 }.to_string(),
        "notification sent 2 bytes, should be 4"
    );
    assert_eq!(
        Error::TableUpdateFailed(MockError::Table).to_string(),
        "attribute table update failed: Table"
    );
}

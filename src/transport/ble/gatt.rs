//! GATT server implementation

use bluer::{
    Adapter,
    gatt::local::{
        Application, ApplicationHandle, Characteristic, CharacteristicNotify,
        CharacteristicNotifyMethod, CharacteristicRead, CharacteristicWrite,
        CharacteristicWriteMethod, ReqError, Service,
    },
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::transport::hub::NotificationHub;

use super::{
    characteristics::{CharacteristicHandler, NotifyCharacteristic, forward_notifications},
    uuids::*,
};

type ReadFn = fn(&CharacteristicHandler) -> Result<Vec<u8>, ReqError>;

/// GATT application exposing the Improv service
pub struct GattServer {
    handler: Arc<CharacteristicHandler>,
    hub: NotificationHub,
}

impl GattServer {
    pub fn new(handler: CharacteristicHandler, hub: NotificationHub) -> Self {
        Self {
            handler: Arc::new(handler),
            hub,
        }
    }

    /// Build the GATT application
    pub fn build_application(&self) -> Application {
        Application {
            services: vec![Service {
                uuid: IMPROV_SERVICE_UUID,
                primary: true,
                characteristics: vec![
                    self.readable(
                        CURRENT_STATE_CHAR_UUID,
                        CharacteristicHandler::handle_state_read,
                        Some(NotifyCharacteristic::State),
                    ),
                    self.readable(
                        ERROR_STATE_CHAR_UUID,
                        CharacteristicHandler::handle_error_read,
                        Some(NotifyCharacteristic::Error),
                    ),
                    self.rpc_command(),
                    self.readable(
                        RPC_RESULT_CHAR_UUID,
                        CharacteristicHandler::handle_result_read,
                        Some(NotifyCharacteristic::RpcResult),
                    ),
                    self.readable(
                        CAPABILITIES_CHAR_UUID,
                        CharacteristicHandler::handle_capabilities_read,
                        None,
                    ),
                ],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn rpc_command(&self) -> Characteristic {
        let handler = self.handler.clone();
        Characteristic {
            uuid: RPC_COMMAND_CHAR_UUID,
            write: Some(CharacteristicWrite {
                write: true,
                write_without_response: true,
                method: CharacteristicWriteMethod::Fun(Box::new(move |new_value, _req| {
                    let handler = handler.clone();
                    Box::pin(async move { handler.handle_rpc_write(new_value).await })
                })),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn readable(
        &self,
        uuid: Uuid,
        read: ReadFn,
        notify: Option<NotifyCharacteristic>,
    ) -> Characteristic {
        let handler = self.handler.clone();
        Characteristic {
            uuid,
            read: Some(CharacteristicRead {
                read: true,
                fun: Box::new(move |_req| {
                    let result = read(&handler);
                    Box::pin(async move { result })
                }),
                ..Default::default()
            }),
            notify: notify.map(|kind| self.notify(kind)),
            ..Default::default()
        }
    }

    fn notify(&self, kind: NotifyCharacteristic) -> CharacteristicNotify {
        let hub = self.hub.clone();
        CharacteristicNotify {
            notify: true,
            method: CharacteristicNotifyMethod::Fun(Box::new(move |notifier| {
                let events = hub.subscribe();
                Box::pin(forward_notifications(kind, notifier, events))
            })),
            ..Default::default()
        }
    }

    /// Register the application; it stays registered while the handle lives
    pub async fn register(&self, adapter: &Adapter) -> Result<ApplicationHandle, bluer::Error> {
        info!("Registering GATT application");
        let handle = adapter
            .serve_gatt_application(self.build_application())
            .await?;
        info!("GATT application registered");
        Ok(handle)
    }
}

//! BLE adapter management and advertising

use bluer::{
    Adapter, AdapterEvent,
    adv::{Advertisement, AdvertisementHandle, Type},
};
use futures::StreamExt;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    future::Future,
    time::Duration,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::{
    codec::status::STATUS_PAYLOAD_LEN,
    transport::{
        ble::{
            gatt::GattServer,
            uuids::{IMPROV_SERVICE_UUID, SERVICE_DATA_UUID},
        },
        hub::TransportEvent,
    },
};

/// Advertisement carrying the Improv service and status service data
pub fn advertisement(device_name: &str, status: [u8; STATUS_PAYLOAD_LEN]) -> Advertisement {
    Advertisement {
        advertisement_type: Type::Peripheral,
        service_uuids: BTreeSet::from([IMPROV_SERVICE_UUID]),
        service_data: BTreeMap::from([(SERVICE_DATA_UUID, status.to_vec())]),
        discoverable: Some(true),
        local_name: Some(device_name.to_string()),
        ..Default::default()
    }
}

const ADVERTISE_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Replace the current advertisement with a fresh one
///
/// On failure the slot stays empty and the error is only logged, so the
/// caller keeps serving GATT and can retry later.
async fn refresh_advertisement<H, E, F, Fut>(current: &mut Option<H>, advertise: F)
where
    E: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<H, E>>,
{
    drop(current.take());
    match advertise().await {
        Ok(handle) => *current = Some(handle),
        Err(e) => warn!("Failed to advertise, will retry: {}", e),
    }
}

/// BLE transport adapter
pub struct BleAdapter {
    adapter: Adapter,
    device_name: String,
}

impl BleAdapter {
    /// Open the default adapter
    pub async fn new(device_name: String) -> Result<Self, bluer::Error> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;

        info!("Using BLE adapter: {}", adapter.name());

        Ok(Self {
            adapter,
            device_name,
        })
    }

    async fn power_up(&self) -> Result<(), bluer::Error> {
        self.adapter.set_powered(true).await?;
        self.adapter.set_alias(self.device_name.clone()).await?;
        self.adapter.set_pairable(false).await?;
        Ok(())
    }

    async fn advertise(
        &self,
        status: [u8; STATUS_PAYLOAD_LEN],
    ) -> Result<AdvertisementHandle, bluer::Error> {
        debug!("Advertising status {}", hex::encode(status));
        self.adapter
            .advertise(advertisement(&self.device_name, status))
            .await
    }

    /// Serve the GATT application and keep advertising until the hub closes
    ///
    /// Every broadcast event from the hub replaces the current advertisement.
    /// A failed advertisement is retried until one succeeds.
    pub async fn run(
        &self,
        gatt_server: &GattServer,
        initial_status: [u8; STATUS_PAYLOAD_LEN],
        mut hub_events: broadcast::Receiver<TransportEvent>,
    ) -> Result<(), bluer::Error> {
        self.power_up().await?;
        let _application = gatt_server.register(&self.adapter).await?;
        let mut status = initial_status;
        let mut advertisement = None;
        refresh_advertisement(&mut advertisement, || self.advertise(status)).await;

        info!("BLE transport serving as '{}'", self.device_name);

        let mut events = self.adapter.events().await?;

        loop {
            tokio::select! {
                event = events.next() => match event {
                    Some(AdapterEvent::DeviceAdded(addr)) => {
                        debug!("Device added: {}", addr);
                    }
                    Some(AdapterEvent::DeviceRemoved(addr)) => {
                        debug!("Device removed: {}", addr);
                    }
                    Some(AdapterEvent::PropertyChanged(_prop)) => {}
                    None => {
                        warn!("BLE adapter event stream ended");
                        break;
                    }
                },
                event = hub_events.recv() => match event {
                    Ok(TransportEvent::Broadcast(update)) => {
                        status = update;
                        refresh_advertisement(&mut advertisement, || self.advertise(status)).await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(n)) => {
                        warn!("BLE advertising lagged by {} events", n);
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::time::sleep(ADVERTISE_RETRY_DELAY), if advertisement.is_none() => {
                    refresh_advertisement(&mut advertisement, || self.advertise(status)).await;
                }
            }
        }

        info!("BLE transport stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advertisement_contents() {
        let adv = advertisement("improv-dev", [0x02, 0x01, 0, 0, 0, 0]);

        assert_eq!(adv.local_name.as_deref(), Some("improv-dev"));
        assert!(adv.service_uuids.contains(&IMPROV_SERVICE_UUID));
        assert_eq!(
            adv.service_data.get(&SERVICE_DATA_UUID),
            Some(&vec![0x02, 0x01, 0, 0, 0, 0])
        );
        assert_eq!(adv.discoverable, Some(true));
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_slot_empty() {
        let mut current = Some(1u8);

        refresh_advertisement(&mut current, || async { Err::<u8, _>("adapter busy") }).await;
        assert_eq!(current, None);

        refresh_advertisement(&mut current, || async { Ok::<_, &str>(2u8) }).await;
        assert_eq!(current, Some(2));
    }
}

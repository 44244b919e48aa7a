//! [`GattTransport`] and [`Connector`] on top of btleplug.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ble_ota_protocol::{Channel, OTA_SERVICE_UUID};
use btleplug::api::{Central, Characteristic, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Peripheral, PeripheralId};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::transport::{Connector, GattTransport, TransportError, discard};

fn backend(e: btleplug::Error) -> TransportError {
    match e {
        btleplug::Error::NotConnected => TransportError::Disconnected,
        btleplug::Error::TimedOut(_) => TransportError::Timeout,
        other => TransportError::Backend(other.to_string()),
    }
}

/// Connected peripheral with its OTA characteristics resolved.
pub struct BtleplugTransport {
    peripheral: Peripheral,
    device_id: String,
    characteristics: HashMap<Channel, Characteristic>,
}

impl BtleplugTransport {
    /// Wrap a peripheral that is connected and has discovered its services.
    ///
    /// # Errors
    ///
    /// [`TransportError::CharacteristicNotFound`] if the OTA service or any
    /// of its characteristics is missing.
    pub fn attach(peripheral: Peripheral) -> Result<Self, TransportError> {
        if !peripheral
            .services()
            .iter()
            .any(|s| s.uuid == OTA_SERVICE_UUID)
        {
            return Err(TransportError::CharacteristicNotFound(OTA_SERVICE_UUID));
        }

        let discovered = peripheral.characteristics();
        let mut characteristics = HashMap::with_capacity(Channel::ALL.len());
        for channel in Channel::ALL {
            let characteristic = discovered
                .iter()
                .find(|c| c.uuid == channel.uuid())
                .cloned()
                .ok_or(TransportError::CharacteristicNotFound(channel.uuid()))?;
            characteristics.insert(channel, characteristic);
        }

        Ok(Self {
            device_id: peripheral.id().to_string(),
            peripheral,
            characteristics,
        })
    }

    fn characteristic(&self, channel: Channel) -> Result<&Characteristic, TransportError> {
        self.characteristics
            .get(&channel)
            .ok_or(TransportError::CharacteristicNotFound(channel.uuid()))
    }
}

#[async_trait]
impl GattTransport for BtleplugTransport {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn write(&mut self, channel: Channel, payload: &[u8]) -> Result<(), TransportError> {
        let write_type = if channel.write_with_response() {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };
        let characteristic = self.characteristic(channel)?;
        self.peripheral
            .write(characteristic, payload, write_type)
            .await
            .map_err(backend)
    }

    async fn read(&mut self, channel: Channel) -> Result<Vec<u8>, TransportError> {
        let characteristic = self.characteristic(channel)?;
        self.peripheral.read(characteristic).await.map_err(backend)
    }

    async fn disconnect(&mut self) {
        if let Err(err) = self.peripheral.disconnect().await {
            warn!(device = %self.device_id, %err, "Failed to disconnect peripheral");
        }
    }
}

/// Opens connections to one peripheral through a btleplug adapter.
pub struct BtleplugConnector {
    adapter: Adapter,
    id: PeripheralId,
    connect_timeout: Duration,
    discovery_timeout: Duration,
    rescan_window: Duration,
}

impl BtleplugConnector {
    /// Connector for the peripheral `id` on `adapter`.
    pub fn new(adapter: Adapter, id: PeripheralId) -> Self {
        Self {
            adapter,
            id,
            connect_timeout: Duration::from_secs(15),
            discovery_timeout: Duration::from_secs(10),
            rescan_window: Duration::from_secs(3),
        }
    }

    /// Bound on the link-layer connect.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// How long to scan when the peripheral dropped out of the adapter cache.
    pub fn with_rescan_window(mut self, rescan_window: Duration) -> Self {
        self.rescan_window = rescan_window;
        self
    }

    async fn cached_peripheral(&self) -> Result<Option<Peripheral>, TransportError> {
        let peripherals = self.adapter.peripherals().await.map_err(backend)?;
        Ok(peripherals.into_iter().find(|p| p.id() == self.id))
    }

    /// Look the peripheral up in the adapter cache, scanning briefly when a
    /// reboot has evicted it.
    async fn find_peripheral(&self) -> Result<Peripheral, TransportError> {
        if let Some(peripheral) = self.cached_peripheral().await? {
            return Ok(peripheral);
        }

        debug!(device = %self.id, "Peripheral not cached, rescanning");
        let mut filter = ScanFilter::default();
        filter.services.push(OTA_SERVICE_UUID);
        discard("start scan", self.adapter.start_scan(filter).await);
        tokio::time::sleep(self.rescan_window).await;
        discard("stop scan", self.adapter.stop_scan().await);

        self.cached_peripheral()
            .await?
            .ok_or_else(|| TransportError::ConnectFailed(format!("device {} not found", self.id)))
    }
}

#[async_trait]
impl Connector for BtleplugConnector {
    async fn connect(&self) -> Result<Box<dyn GattTransport>, TransportError> {
        let peripheral = self.find_peripheral().await?;

        info!(device = %self.id, "Connecting");
        match timeout(self.connect_timeout, peripheral.connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(TransportError::ConnectFailed(e.to_string())),
            Err(_elapsed) => {
                discard("disconnect", peripheral.disconnect().await);
                return Err(TransportError::Timeout);
            }
        }

        let discovered = match timeout(self.discovery_timeout, peripheral.discover_services()).await
        {
            Ok(Ok(())) => BtleplugTransport::attach(peripheral.clone()),
            Ok(Err(e)) => Err(backend(e)),
            Err(_elapsed) => Err(TransportError::Timeout),
        };

        match discovered {
            Ok(transport) => Ok(Box::new(transport)),
            Err(e) => {
                discard("disconnect", peripheral.disconnect().await);
                Err(e)
            }
        }
    }
}

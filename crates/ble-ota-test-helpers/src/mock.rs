//! Scripted in-memory OTA peripheral.
//!
//! [`MockOtaDevice`] behaves like the controller firmware: `START` opens a
//! receive buffer, Data packets append to it, `END` compares the received
//! length against the announced size, and `REBOOT` drops the link and swaps
//! in the new version. Faults are injected by builder methods and every
//! interaction is recorded for assertions.

use std::sync::Arc;

use async_trait::async_trait;
use ble_ota_protocol::{Channel, Command, DataPacket, DeviceState, DeviceStatus, ErrorCode};
use ble_ota_update::{Connector, GattTransport, InterruptHandle, TransportError};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct DeviceModel {
    version: String,
    rebooted_version: Option<String>,
    connected: bool,
    status: DeviceStatus,
    expected_size: Option<u32>,
    received: Vec<u8>,
    streams: Vec<Vec<u16>>,
    attempted_commands: Vec<Command>,
    delivered_commands: Vec<Command>,
    data_packets: usize,
    status_reads: usize,
    connect_attempts: u32,

    status_after_start: Option<DeviceStatus>,
    status_after_end: Option<DeviceStatus>,
    data_faults: Vec<(usize, usize)>,
    status_read_fault: Option<usize>,
    reboot_write_fails: bool,
    failing_connects: u32,
    empty_version_after_reboot: bool,
    interrupt_after: Option<(usize, InterruptHandle)>,
}

impl DeviceModel {
    fn control(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let command =
            Command::decode(bytes).map_err(|e| TransportError::Backend(e.to_string()))?;
        self.attempted_commands.push(command);
        if !self.connected {
            return Err(TransportError::Disconnected);
        }

        match command {
            Command::Start { size } => {
                self.expected_size = Some(size);
                self.received.clear();
                self.streams.push(Vec::new());
                self.status = self
                    .status_after_start
                    .unwrap_or(DeviceStatus::new(DeviceState::Receiving, ErrorCode::None));
            }
            Command::End => {
                let complete = self.expected_size
                    == u32::try_from(self.received.len()).ok();
                self.status = self.status_after_end.unwrap_or(if complete {
                    DeviceStatus::new(DeviceState::Completed, ErrorCode::None)
                } else {
                    DeviceStatus::new(DeviceState::Error, ErrorCode::FileSizeMismatch)
                });
            }
            Command::Abort => {
                self.expected_size = None;
                self.received.clear();
                self.status = DeviceStatus::default();
            }
            Command::Reboot => {
                self.connected = false;
                self.status = DeviceStatus::default();
                if let Some(version) = self.rebooted_version.take() {
                    self.version = version;
                }
                if self.empty_version_after_reboot {
                    self.version.clear();
                }
                if self.reboot_write_fails {
                    return Err(TransportError::Disconnected);
                }
            }
        }

        self.delivered_commands.push(command);
        Ok(())
    }

    fn data(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }
        let packet = DataPacket::decode(bytes).map_err(|e| TransportError::Backend(e.to_string()))?;
        let stream_no = self.streams.len();
        let Some(stream) = self.streams.last_mut() else {
            return Err(TransportError::Backend("data before START".to_string()));
        };
        if self.data_faults.contains(&(stream_no, stream.len())) {
            return Err(TransportError::Backend(format!(
                "injected data fault at stream {stream_no} packet {}",
                stream.len()
            )));
        }

        stream.push(packet.seq);
        self.received.extend_from_slice(packet.payload);
        self.data_packets += 1;

        if let Some((after, handle)) = &self.interrupt_after
            && self.data_packets == *after
        {
            handle.interrupt();
        }
        Ok(())
    }

    fn read(&mut self, channel: Channel) -> Result<Vec<u8>, TransportError> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }
        match channel {
            Channel::Status => {
                self.status_reads += 1;
                if self.status_read_fault == Some(self.status_reads) {
                    return Err(TransportError::Backend("injected status read fault".to_string()));
                }
                Ok(self.status.encode().to_vec())
            }
            Channel::Version => {
                // Firmware pads the characteristic with NULs.
                let mut bytes = self.version.clone().into_bytes();
                bytes.extend_from_slice(&[0, 0]);
                Ok(bytes)
            }
            Channel::Control | Channel::Data => Err(TransportError::Backend(format!(
                "{channel} is not readable"
            ))),
        }
    }
}

/// In-memory OTA peripheral shared by its transports and connector.
#[derive(Debug, Clone)]
pub struct MockOtaDevice {
    id: String,
    model: Arc<Mutex<DeviceModel>>,
}

impl MockOtaDevice {
    /// Connected, idle device running version `1.0.0`.
    pub fn new(id: impl Into<String>) -> Self {
        let model = DeviceModel {
            version: "1.0.0".to_string(),
            connected: true,
            ..DeviceModel::default()
        };
        Self {
            id: id.into(),
            model: Arc::new(Mutex::new(model)),
        }
    }

    /// Version reported before reboot.
    pub fn with_version(self, version: impl Into<String>) -> Self {
        self.model.lock().version = version.into();
        self
    }

    /// Version reported after `REBOOT`.
    pub fn with_rebooted_version(self, version: impl Into<String>) -> Self {
        self.model.lock().rebooted_version = Some(version.into());
        self
    }

    /// Report an empty version string after `REBOOT`.
    pub fn with_empty_version_after_reboot(self) -> Self {
        self.model.lock().empty_version_after_reboot = true;
        self
    }

    /// Status the device reports after accepting `START`.
    pub fn with_status_after_start(self, status: DeviceStatus) -> Self {
        self.model.lock().status_after_start = Some(status);
        self
    }

    /// Status the device reports after `END`, overriding the size check.
    pub fn with_status_after_end(self, status: DeviceStatus) -> Self {
        self.model.lock().status_after_end = Some(status);
        self
    }

    /// Fail the Data write of `packet` (0-based) in the `stream`-th transfer
    /// (1-based; each `START` opens a new one).
    pub fn fail_data_packet(self, stream: usize, packet: usize) -> Self {
        self.model.lock().data_faults.push((stream, packet));
        self
    }

    /// Fail the `nth` (1-based) Status read.
    pub fn fail_status_read(self, nth: usize) -> Self {
        self.model.lock().status_read_fault = Some(nth);
        self
    }

    /// Drop the link before acknowledging `REBOOT`. The device still reboots.
    pub fn fail_reboot_write(self) -> Self {
        self.model.lock().reboot_write_fails = true;
        self
    }

    /// Refuse the next `n` connection attempts.
    pub fn fail_reconnects(self, n: u32) -> Self {
        self.model.lock().failing_connects = n;
        self
    }

    /// Start with the link down.
    pub fn disconnected(self) -> Self {
        self.model.lock().connected = false;
        self
    }

    /// Fire `handle` once `packets` Data packets have been delivered.
    pub fn interrupt_after_packets(self, packets: usize, handle: InterruptHandle) -> Self {
        self.model.lock().interrupt_after = Some((packets, handle));
        self
    }

    /// Transport over the current link.
    pub fn transport(&self) -> Box<dyn GattTransport> {
        Box::new(MockTransport {
            id: self.id.clone(),
            model: Arc::clone(&self.model),
        })
    }

    /// Connector that opens new links to this device.
    pub fn connector(&self) -> Box<dyn Connector> {
        Box::new(MockConnector {
            id: self.id.clone(),
            model: Arc::clone(&self.model),
        })
    }

    /// Every Control command written, including ones that failed.
    pub fn control_commands(&self) -> Vec<Command> {
        self.model.lock().attempted_commands.clone()
    }

    /// Control commands the device acknowledged.
    pub fn delivered_commands(&self) -> Vec<Command> {
        self.model.lock().delivered_commands.clone()
    }

    /// Sequence numbers received, one list per `START`.
    pub fn streams(&self) -> Vec<Vec<u16>> {
        self.model.lock().streams.clone()
    }

    /// Bytes assembled since the last `START`.
    pub fn received_image(&self) -> Vec<u8> {
        self.model.lock().received.clone()
    }

    /// Connection attempts through the connector.
    pub fn connect_attempts(&self) -> u32 {
        self.model.lock().connect_attempts
    }

    /// Status reads served or failed.
    pub fn status_reads(&self) -> usize {
        self.model.lock().status_reads
    }

    /// Whether a link is up.
    pub fn is_connected(&self) -> bool {
        self.model.lock().connected
    }

    /// Version currently reported.
    pub fn version(&self) -> String {
        self.model.lock().version.clone()
    }
}

struct MockTransport {
    id: String,
    model: Arc<Mutex<DeviceModel>>,
}

#[async_trait]
impl GattTransport for MockTransport {
    fn device_id(&self) -> &str {
        &self.id
    }

    async fn is_connected(&self) -> bool {
        self.model.lock().connected
    }

    async fn write(&mut self, channel: Channel, payload: &[u8]) -> Result<(), TransportError> {
        let mut model = self.model.lock();
        match channel {
            Channel::Control => model.control(payload),
            Channel::Data => model.data(payload),
            Channel::Status | Channel::Version => Err(TransportError::Backend(format!(
                "{channel} is not writable"
            ))),
        }
    }

    async fn read(&mut self, channel: Channel) -> Result<Vec<u8>, TransportError> {
        self.model.lock().read(channel)
    }

    async fn disconnect(&mut self) {
        self.model.lock().connected = false;
    }
}

struct MockConnector {
    id: String,
    model: Arc<Mutex<DeviceModel>>,
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn GattTransport>, TransportError> {
        let mut model = self.model.lock();
        model.connect_attempts += 1;
        if model.failing_connects > 0 {
            model.failing_connects -= 1;
            return Err(TransportError::ConnectFailed(format!(
                "{} not advertising",
                self.id
            )));
        }
        model.connected = true;
        Ok(Box::new(MockTransport {
            id: self.id.clone(),
            model: Arc::clone(&self.model),
        }))
    }
}

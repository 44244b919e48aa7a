//! GATT OTA protocol: channel identifiers, control commands, status decoding
//! and data-packet framing.
//!
//! This crate is intentionally I/O-free. It provides pure functions and types
//! that can be tested without a radio or an OS-level BLE stack; the update
//! engine in `ble-ota-update` drives them over a transport.
//!
//! # Wire summary
//!
//! | Channel | Direction | Payload |
//! |---|---|---|
//! | Control | write with response | opcode, plus LE `u32` size for `START` |
//! | Data | write without response | LE `u16` sequence + up to 500 payload bytes |
//! | Status | read | state byte, error byte |
//! | Version | read | UTF-8 string, NUL padded |

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod command;
pub mod error;
pub mod ids;
pub mod packet;
pub mod status;
pub mod version;

pub use command::{Command, MAX_COMMAND_LEN, opcodes};
pub use error::ProtocolError;
pub use ids::{
    Channel, OTA_CONTROL_CHAR_UUID, OTA_DATA_CHAR_UUID, OTA_SERVICE_UUID, OTA_STATUS_CHAR_UUID,
    OTA_VERSION_CHAR_UUID,
};
pub use packet::{
    DEFAULT_CHUNK_SIZE, DataPacket, MAX_PAYLOAD_LEN, Packetizer, SEQ_HEADER_LEN, packet_count,
    packetize,
};
pub use status::{DeviceState, DeviceStatus, ErrorCode};
pub use version::decode_version;

//! Snapshot tests for the OTA wire format.
//!
//! These pin the exact bytes written to the Control and Data characteristics
//! so that any framing change shows up as a snapshot diff.

use ble_ota_protocol::{
    Channel, Command, DataPacket, DeviceState, DeviceStatus, ErrorCode, packetize,
};
use insta::assert_snapshot;

// ── Control payloads ─────────────────────────────────────────────────────────

#[test]
fn test_snapshot_start_small_image() {
    let bytes = Command::Start { size: 1234 }.to_bytes();
    assert_snapshot!(format!("{bytes:02X?}"), @"[01, D2, 04, 00, 00]");
}

#[test]
fn test_snapshot_start_one_megabyte() {
    let bytes = Command::Start { size: 1_048_576 }.to_bytes();
    assert_snapshot!(format!("{bytes:02X?}"), @"[01, 00, 00, 10, 00]");
}

#[test]
fn test_snapshot_single_byte_commands() {
    let all: Vec<Vec<u8>> = [Command::End, Command::Abort, Command::Reboot]
        .into_iter()
        .map(Command::to_bytes)
        .collect();
    assert_snapshot!(format!("{all:02X?}"), @"[[02], [03], [04]]");
}

// ── Data payloads ────────────────────────────────────────────────────────────

#[test]
fn test_snapshot_data_packet_headers() -> Result<(), Box<dyn std::error::Error>> {
    let data: Vec<u8> = (0u8..=9).collect();
    let headers: Vec<String> = packetize(&data, 4)?
        .map(|p| {
            let bytes = p.encode();
            format!("{bytes:02X?}")
        })
        .collect();
    assert_snapshot!(
        headers.join("\n"),
        @r"
    [00, 00, 00, 01, 02, 03]
    [01, 00, 04, 05, 06, 07]
    [02, 00, 08, 09]
    "
    );
    Ok(())
}

#[test]
fn test_snapshot_wrapped_sequence() {
    let packet = DataPacket {
        seq: u16::MAX,
        payload: &[0xEE],
    };
    assert_snapshot!(format!("{:02X?}", packet.encode()), @"[FF, FF, EE]");
}

// ── Status rendering ─────────────────────────────────────────────────────────

#[test]
fn test_snapshot_status_rendering() {
    let rendered: Vec<String> = [
        DeviceStatus::new(DeviceState::Receiving, ErrorCode::None),
        DeviceStatus::new(DeviceState::Error, ErrorCode::FileSizeMismatch),
        DeviceStatus::new(DeviceState::Error, ErrorCode::Unknown(0x2A)),
        DeviceStatus::new(DeviceState::Unknown(0x10), ErrorCode::None),
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    assert_snapshot!(
        rendered.join("\n"),
        @r"
    RECEIVING
    ERROR (File size mismatch)
    ERROR (Unknown error: 0x2A)
    0x10
    "
    );
}

#[test]
fn test_snapshot_channel_table() {
    let table: Vec<String> = Channel::ALL
        .iter()
        .map(|c| format!("{c} {}", c.uuid()))
        .collect();
    assert_snapshot!(
        table.join("\n"),
        @r"
    control fb1e4002-54ae-4a28-9f74-dfccb248601d
    data fb1e4003-54ae-4a28-9f74-dfccb248601d
    status fb1e4004-54ae-4a28-9f74-dfccb248601d
    version fb1e4005-54ae-4a28-9f74-dfccb248601d
    "
    );
}

use ble_ota_protocol::{
    Command, DataPacket, DeviceState, DeviceStatus, ErrorCode, MAX_PAYLOAD_LEN, packet_count,
    packetize,
};
use proptest::prelude::*;

// ── Packetizer: coverage and ordering ───────────────────────────────────────

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(200))]

    /// Concatenating packet payloads in order reproduces the image exactly,
    /// and sequence numbers count up from zero.
    #[test]
    fn prop_packets_cover_image_in_order(
        data in prop::collection::vec(any::<u8>(), 1..4096),
        chunk in 1usize..=MAX_PAYLOAD_LEN,
    ) {
        let packets: Vec<_> = packetize(&data, chunk)
            .map_err(|e| TestCaseError::fail(e.to_string()))?
            .collect();

        prop_assert_eq!(packets.len(), packet_count(data.len(), chunk));

        let mut rebuilt = Vec::with_capacity(data.len());
        for (i, p) in packets.iter().enumerate() {
            prop_assert_eq!(usize::from(p.seq), i);
            prop_assert!(p.payload.len() <= chunk);
            rebuilt.extend_from_slice(p.payload);
        }
        prop_assert_eq!(rebuilt, data);
    }

    /// Only the final packet may be short.
    #[test]
    fn prop_only_last_packet_short(
        len in 1usize..5000,
        chunk in 1usize..=MAX_PAYLOAD_LEN,
    ) {
        let data = vec![0x5Au8; len];
        let packets: Vec<_> = packetize(&data, chunk)
            .map_err(|e| TestCaseError::fail(e.to_string()))?
            .collect();
        let (last, body) = packets
            .split_last()
            .ok_or_else(|| TestCaseError::fail("no packets"))?;
        prop_assert!(body.iter().all(|p| p.payload.len() == chunk));
        prop_assert!(!last.payload.is_empty());
    }

    /// Encoded packets decode back to the same sequence and payload.
    #[test]
    fn prop_packet_header_decodes(
        seq in any::<u16>(),
        payload in prop::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_LEN),
    ) {
        let bytes = DataPacket { seq, payload: &payload }.encode();
        let decoded = DataPacket::decode(&bytes)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(decoded.seq, seq);
        prop_assert_eq!(decoded.payload, payload.as_slice());
    }

    /// Any size that fits in 32 bits survives the START encoding.
    #[test]
    fn prop_start_size_preserved(size in any::<u32>()) {
        let bytes = Command::Start { size }.to_bytes();
        prop_assert_eq!(bytes.len(), 5);
        prop_assert_eq!(Command::decode(&bytes), Ok(Command::Start { size }));
    }

    /// Status bytes are never coerced: every byte pair re-encodes identically.
    #[test]
    fn prop_status_bytes_preserved(state in any::<u8>(), error in any::<u8>()) {
        let status = DeviceStatus::decode(&[state, error]);
        prop_assert_eq!(status.encode(), [state, error]);
        prop_assert_eq!(status.is_error(), state == 0xFF);
    }

    /// Undocumented error codes always render generically with the raw byte.
    #[test]
    fn prop_unknown_error_message(code in 0x07u8..=0xFF) {
        let message = ErrorCode::from_byte(code).message().into_owned();
        prop_assert_eq!(message, format!("Unknown error: 0x{code:02X}"));
    }

    /// Undocumented state bytes keep their value.
    #[test]
    fn prop_unknown_state_preserved(raw in 0x05u8..0xFF) {
        prop_assert_eq!(DeviceState::from_byte(raw), DeviceState::Unknown(raw));
    }
}

//! Data-channel framing.
//!
//! Every Data write is a little-endian `u16` sequence number followed by one
//! chunk of the image. Sequence numbers start at zero for each transfer
//! attempt and wrap at `u16::MAX`.

use crate::error::ProtocolError;

/// Length of the sequence-number prefix.
pub const SEQ_HEADER_LEN: usize = 2;

/// Largest payload the peripheral accepts in a single Data write.
pub const MAX_PAYLOAD_LEN: usize = 500;

/// Chunk size used unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = MAX_PAYLOAD_LEN;

/// One framed Data-channel packet, borrowing its payload from the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPacket<'a> {
    /// Sequence number within the current attempt
    pub seq: u16,
    /// Image bytes carried by this packet
    pub payload: &'a [u8],
}

impl<'a> DataPacket<'a> {
    /// Size of the encoded packet.
    pub fn encoded_len(&self) -> usize {
        SEQ_HEADER_LEN.saturating_add(self.payload.len())
    }

    /// Encode into a fresh buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    /// Encode into `out`, replacing its contents. Lets the sender reuse one
    /// buffer across a whole transfer.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.clear();
        out.extend_from_slice(&self.seq.to_le_bytes());
        out.extend_from_slice(self.payload);
    }

    /// Decode a Data write. Used by peripheral simulators and captures.
    ///
    /// # Errors
    ///
    /// Fails when the packet is shorter than the sequence header or the
    /// payload exceeds [`MAX_PAYLOAD_LEN`].
    pub fn decode(bytes: &'a [u8]) -> Result<Self, ProtocolError> {
        let [lo, hi, payload @ ..] = bytes else {
            return Err(ProtocolError::PacketTooShort(bytes.len()));
        };
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }
        Ok(Self {
            seq: u16::from_le_bytes([*lo, *hi]),
            payload,
        })
    }
}

/// Iterator over the framed packets of an image.
#[derive(Debug, Clone)]
pub struct Packetizer<'a> {
    chunks: std::slice::Chunks<'a, u8>,
    next_seq: u16,
    total: usize,
}

impl<'a> Packetizer<'a> {
    /// Number of packets this iterator yields in total.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl<'a> Iterator for Packetizer<'a> {
    type Item = DataPacket<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let payload = self.chunks.next()?;
        let seq = self.next_seq;
        self.next_seq = seq.wrapping_add(1);
        Some(DataPacket { seq, payload })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Packetizer<'_> {}

/// Split `data` into framed packets of at most `chunk_size` payload bytes,
/// numbered from zero.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidChunkSize`] when `chunk_size` is zero or
/// larger than [`MAX_PAYLOAD_LEN`].
pub fn packetize(data: &[u8], chunk_size: usize) -> Result<Packetizer<'_>, ProtocolError> {
    if chunk_size == 0 || chunk_size > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::InvalidChunkSize(chunk_size));
    }
    Ok(Packetizer {
        chunks: data.chunks(chunk_size),
        next_seq: 0,
        total: packet_count(data.len(), chunk_size),
    })
}

/// Number of packets an image of `len` bytes produces. Zero for a zero
/// `chunk_size`.
pub fn packet_count(len: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    len.div_ceil(chunk_size)
}

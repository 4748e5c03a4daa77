//! Radio frame codec
//!
//! Every frame starts with a 2-byte header: a type discriminator (`'d'` for data,
//! `'a'` for acknowledgement) followed by the packet id. Data frames carry the
//! payload directly after the header, acknowledgements carry nothing.

use static_assertions as sa;

/// Type byte + id byte
pub const HEADER_LEN: usize = 2;
/// Maximum length of an encoded frame
pub const MAX_PACKET_LEN: usize = 160;
/// Maximum number of payload bytes in a single data frame
pub const MAX_PAYLOAD_LEN: usize = MAX_PACKET_LEN - HEADER_LEN;

sa::const_assert!(MAX_PACKET_LEN <= u8::MAX as usize);
sa::const_assert_eq!(MAX_PAYLOAD_LEN, 158);

/// Buffer large enough for any encoded frame
pub type Frame = heapless::Vec<u8, MAX_PACKET_LEN>;

pub type PacketId = u8;

/// Frame type discriminator
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Kind {
    Data = b'd',
    Ack = b'a',
}

impl TryFrom<u8> for Kind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'd' => Ok(Kind::Data),
            b'a' => Ok(Kind::Ack),
            other => Err(other),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Packet<'a> {
    Data { id: PacketId, payload: &'a [u8] },
    Ack { id: PacketId },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecodeError {
    /// Frame too short to contain the header
    TooShort(usize),
    /// Unknown type byte
    Unrecognized(u8),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EncodeError {
    /// Payload does not fit in a single frame
    PayloadTooLong(usize),
    /// Output buffer is smaller than the encoded frame
    BufferTooSmall { needed: usize, available: usize },
}

impl<'a> Packet<'a> {
    pub fn kind(&self) -> Kind {
        match self {
            Packet::Data { .. } => Kind::Data,
            Packet::Ack { .. } => Kind::Ack,
        }
    }

    pub fn id(&self) -> PacketId {
        match *self {
            Packet::Data { id, .. } | Packet::Ack { id } => id,
        }
    }

    pub fn payload(&self) -> &'a [u8] {
        match *self {
            Packet::Data { payload, .. } => payload,
            Packet::Ack { .. } => &[],
        }
    }

    /// Number of bytes the frame takes on the air
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload().len()
    }

    /// Parse a received frame
    ///
    /// Trailing bytes after an acknowledgement header are ignored.
    pub fn decode(frame: &'a [u8]) -> Result<Self, DecodeError> {
        if frame.len() < HEADER_LEN {
            return Err(DecodeError::TooShort(frame.len()));
        }
        let id = frame[1];
        match Kind::try_from(frame[0]).map_err(DecodeError::Unrecognized)? {
            Kind::Data => Ok(Packet::Data { id, payload: &frame[HEADER_LEN..] }),
            Kind::Ack => Ok(Packet::Ack { id }),
        }
    }

    /// Serialize into `buf`, returning the used part of it
    pub fn to_slice<'b>(&self, buf: &'b mut [u8]) -> Result<&'b [u8], EncodeError> {
        let payload = self.payload();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(EncodeError::PayloadTooLong(payload.len()));
        }
        let len = self.encoded_len();
        if buf.len() < len {
            return Err(EncodeError::BufferTooSmall { needed: len, available: buf.len() });
        }
        buf[0] = self.kind() as u8;
        buf[1] = self.id();
        buf[HEADER_LEN..len].copy_from_slice(payload);
        Ok(&buf[..len])
    }

    /// Serialize into a new [`Frame`]
    pub fn to_frame(&self) -> Result<Frame, EncodeError> {
        let mut buf = [0u8; MAX_PACKET_LEN];
        let encoded = self.to_slice(&mut buf)?;
        // Cannot fail, encoded length is bounded by MAX_PACKET_LEN
        Frame::from_slice(encoded)
            .map_err(|_| EncodeError::PayloadTooLong(self.payload().len()))
    }
}

//! # Frame
//!
//! The `frame` module implements WebSocket frames as defined in [RFC 6455 Section 5.2](https://datatracker.ietf.org/doc/html/rfc6455#section-5.2).
//! A [`Frame`] owns the raw bytes of exactly one frame as they appear on the wire; every header
//! field is computed from those bytes on demand, so the buffer is the only state there is.
//!
//! ### Frame Binary Format
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |         (16 or 64 bits)       |
//! |N|V|V|V|       |S|             |                               |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |        Extended payload length continued, if payload len == 127|
//! +---------------------------------------------------------------+
//! |                               |   Masking-key, if MASK set to 1|
//! +-------------------------------+-------------------------------+
//! |     Masking-key (continued)       |          Payload Data      |
//! +-----------------------------------+ - - - - - - - - - - - - - -+
//! :                     Payload Data continued ...                :
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Decoding
//!
//! A decode-path frame starts empty and is fed with [`Frame::add`] until
//! [`Frame::is_complete`] holds. Completeness is staged: two bytes make the header readable,
//! then the 16 or 64-bit extended length must be present, and only then is the buffer length
//! compared against [`Frame::total_frame_size`]. Bytes past the end of the frame are returned
//! from `add` so the caller can start the next frame with them.
//!
//! ## Encoding
//!
//! [`Frame::encode`] serializes an opcode, a payload and an optional masking key into a single
//! final (`FIN = 1`) frame, picking the shortest length encoding for the payload.
//!
//! ## Opcodes
//!
//! Reserved opcode nibbles are not an error at this layer. They decode to [`OpCode::Invalid`]
//! and it is up to the caller to reject such frames.
use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::mask::apply_mask;

/// FIN flag in the first header byte.
pub(crate) const FIN_BIT: u8 = 0b1000_0000;
/// First reserved bit, used by extensions such as permessage-deflate.
pub(crate) const RSV1_BIT: u8 = 0b0100_0000;
pub(crate) const RSV2_BIT: u8 = 0b0010_0000;
pub(crate) const RSV3_BIT: u8 = 0b0001_0000;
/// Opcode nibble in the first header byte.
pub(crate) const OPCODE_BITS: u8 = 0b0000_1111;
/// MASK flag in the second header byte.
pub(crate) const MASK_BIT: u8 = 0b1000_0000;
/// 7-bit payload length selector in the second header byte.
pub(crate) const PAYLOAD_LEN_BITS: u8 = 0b0111_1111;

/// Length selector announcing a 16-bit extended payload length.
pub(crate) const LEN_SELECTOR_16: u8 = 126;
/// Length selector announcing a 64-bit extended payload length.
pub(crate) const LEN_SELECTOR_64: u8 = 127;
/// Largest payload whose length fits in the 7-bit field.
pub(crate) const MAX_SHORT_LEN: usize = 125;

/// Size of the masking key in bytes.
pub(crate) const MASK_KEY_SIZE: usize = 4;
/// Longest possible header: 2 bytes, 8 bytes of extended length and the masking key.
pub(crate) const MAX_HEAD_SIZE: usize = 14;

/// Largest payload a control frame may carry.
pub const MAX_CONTROL_PAYLOAD: usize = 125;

/// WebSocket operation code (OpCode) that determines the semantic meaning and handling of a frame.
///
/// # Data Frame OpCodes
/// - `Continuation`: Continues a fragmented message started by another data frame
/// - `Text`: Contains UTF-8 encoded text data
/// - `Binary`: Contains raw binary data
///
/// # Control Frame OpCodes
/// - `Close`: Initiates or confirms connection closure
/// - `Ping`: Tests connection liveness, requiring a `Pong` response
/// - `Pong`: Responds to a `Ping` frame
///
/// # Reserved OpCodes
/// The ranges 0x3-0x7 and 0xB-0xF are reserved for future protocol extensions and decode to
/// `Invalid`. Decoding never fails because of them; callers must branch on `Invalid` themselves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OpCode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
    Invalid,
}

impl OpCode {
    /// Returns `true` for `Close`, `Ping` and `Pong`.
    ///
    /// Control frames cannot be fragmented and carry at most 125 bytes of payload.
    pub fn is_control(&self) -> bool {
        matches!(*self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }

    /// Returns `true` for `Continuation`, `Text` and `Binary`.
    pub fn is_data(&self) -> bool {
        matches!(*self, OpCode::Continuation | OpCode::Text | OpCode::Binary)
    }

    /// Returns `true` if the opcode nibble was one of the reserved values.
    pub fn is_invalid(&self) -> bool {
        *self == OpCode::Invalid
    }
}

impl From<u8> for OpCode {
    /// Maps the low nibble of `value` to an opcode. The high nibble is ignored so the first
    /// header byte can be passed as-is.
    fn from(value: u8) -> Self {
        match value & OPCODE_BITS {
            0x0 => Self::Continuation,
            0x1 => Self::Text,
            0x2 => Self::Binary,
            0x8 => Self::Close,
            0x9 => Self::Ping,
            0xA => Self::Pong,
            _ => Self::Invalid,
        }
    }
}

impl From<OpCode> for u8 {
    /// Converts an `OpCode` into its nibble value.
    ///
    /// `Invalid` has no single wire value; it encodes as `0x3`, the first reserved opcode, so
    /// that a frame built from it decodes back to `Invalid`.
    fn from(val: OpCode) -> Self {
        match val {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
            OpCode::Invalid => 0x3,
        }
    }
}

/// A single WebSocket frame backed by its raw wire bytes.
///
/// The struct holds nothing but the byte buffer. Header fields are read from fixed bit
/// positions each time an accessor is called, so a frame that is still being fed can never
/// disagree with itself. Header bytes that have not arrived yet read as zero bits.
///
/// # Decoding
/// ```rust
/// use wsframe::{Frame, OpCode};
///
/// let mut frame = Frame::new();
/// let leftover = frame.add(&[0x81, 0x05, b'H', b'e', b'l', b'l', b'o']);
///
/// assert!(frame.is_complete());
/// assert!(leftover.is_empty());
/// assert!(frame.fin());
/// assert_eq!(frame.opcode(), OpCode::Text);
/// assert_eq!(&frame.payload()[..], b"Hello");
/// ```
///
/// # Encoding
/// ```rust
/// use wsframe::{Frame, OpCode};
///
/// let frame = Frame::encode(OpCode::Binary, &[1, 2, 3], &[0xAA, 0xBB, 0xCC, 0xDD]);
/// assert!(frame.masked());
/// assert_eq!(&frame.payload()[..], &[1, 2, 3]);
/// ```
///
/// A completed frame is only read from, so `&Frame` can be shared across threads freely.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Frame {
    data: BytesMut,
}

impl Frame {
    /// Creates an empty frame, ready to be fed with [`Frame::add`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes a final frame carrying `payload`.
    ///
    /// The frame is masked only when `mask_key` is exactly four bytes long. A key of any other
    /// length, including an empty slice, is treated as "no key" and the frame is sent unmasked.
    ///
    /// RSV bits are always zero and FIN is always set: outbound fragmentation is done by the
    /// caller, not here.
    pub fn encode(opcode: OpCode, payload: &[u8], mask_key: &[u8]) -> Self {
        let key = <[u8; MASK_KEY_SIZE]>::try_from(mask_key).ok();
        Self::encode_with(true, opcode, payload, key)
    }

    /// Serializes a final frame masked with `key`.
    pub fn encode_masked(opcode: OpCode, payload: &[u8], key: [u8; 4]) -> Self {
        Self::encode_with(true, opcode, payload, Some(key))
    }

    /// Serializes a final, unmasked frame.
    pub fn encode_unmasked(opcode: OpCode, payload: &[u8]) -> Self {
        Self::encode_with(true, opcode, payload, None)
    }

    fn encode_with(fin: bool, opcode: OpCode, payload: &[u8], key: Option<[u8; 4]>) -> Self {
        let mut head = [0u8; MAX_HEAD_SIZE];
        let size = fmt_head(fin, opcode, payload.len(), key, &mut head);

        let mut data = BytesMut::with_capacity(size + payload.len());
        data.extend_from_slice(&head[..size]);
        data.extend_from_slice(payload);
        if let Some(key) = key {
            apply_mask(&mut data[size..], key);
        }

        Self { data }
    }

    /// Decodes the first complete frame in `buf`.
    ///
    /// Returns the frame and the number of bytes it occupies, or `None` if `buf` does not yet
    /// hold a whole frame.
    pub fn parse(buf: &[u8]) -> Option<(Frame, usize)> {
        let mut frame = Frame::new();
        let leftover = frame.add(buf);
        frame
            .is_complete()
            .then(|| (frame, buf.len() - leftover.len()))
    }

    /// Appends `data` to the frame and returns the bytes that belong to the next frame.
    ///
    /// While the frame is incomplete the whole input is buffered and an empty buffer is
    /// returned. As soon as the frame is complete the buffer is cut at exactly
    /// [`Frame::total_frame_size`] bytes and everything after that point is handed back. Feeding
    /// a frame that is already complete returns the input untouched.
    pub fn add(&mut self, data: &[u8]) -> Bytes {
        if self.is_complete() {
            return Bytes::copy_from_slice(data);
        }

        self.data.extend_from_slice(data);
        let Some(size) = self.complete_size() else {
            return Bytes::new();
        };

        let leftover = self.data.split_off(size).freeze();

        #[cfg(feature = "logging")]
        log::trace!(
            "frame complete: fin={} opcode={:?} masked={} size={} leftover={}",
            self.fin(),
            self.opcode(),
            self.masked(),
            size,
            leftover.len()
        );

        leftover
    }

    /// Returns `true` once the buffer holds every byte of the frame.
    pub fn is_complete(&self) -> bool {
        self.complete_size().is_some()
    }

    /// Size of the complete frame, if the buffer already holds all of it.
    ///
    /// The 64-bit total is narrowed to `usize` only after checking it against the buffer
    /// length, so oversized lengths on narrow platforms simply stay incomplete.
    fn complete_size(&self) -> Option<usize> {
        let len = self.data.len();
        if len < 2 {
            return None;
        }
        match self.payload_length() {
            LEN_SELECTOR_16 if len < 4 => return None,
            LEN_SELECTOR_64 if len < 10 => return None,
            _ => {}
        }

        usize::try_from(self.total_frame_size())
            .ok()
            .filter(|&size| size <= len)
    }

    #[inline]
    fn byte(&self, index: usize) -> u8 {
        self.data.get(index).copied().unwrap_or(0)
    }

    /// Final fragment of a message.
    #[inline]
    pub fn fin(&self) -> bool {
        self.byte(0) & FIN_BIT != 0
    }

    #[inline]
    pub fn rsv1(&self) -> bool {
        self.byte(0) & RSV1_BIT != 0
    }

    #[inline]
    pub fn rsv2(&self) -> bool {
        self.byte(0) & RSV2_BIT != 0
    }

    #[inline]
    pub fn rsv3(&self) -> bool {
        self.byte(0) & RSV3_BIT != 0
    }

    #[inline]
    pub fn opcode(&self) -> OpCode {
        OpCode::from(self.byte(0))
    }

    /// Whether the payload is XOR-masked on the wire.
    #[inline]
    pub fn masked(&self) -> bool {
        self.byte(1) & MASK_BIT != 0
    }

    /// The raw 7-bit length field.
    ///
    /// This is a selector rather than a length when it equals 126 or 127; see
    /// [`Frame::extended_payload_length`] for the real payload size.
    #[inline]
    pub fn payload_length(&self) -> u8 {
        self.byte(1) & PAYLOAD_LEN_BITS
    }

    /// Number of extended length bytes following the first two header bytes.
    #[inline]
    fn extended_length_size(&self) -> usize {
        match self.payload_length() {
            LEN_SELECTOR_16 => 2,
            LEN_SELECTOR_64 => 8,
            _ => 0,
        }
    }

    /// The true payload length in bytes.
    ///
    /// Equal to [`Frame::payload_length`] up to 125, otherwise read as a big-endian 16-bit or
    /// 64-bit integer right after the second header byte. No upper bound is enforced.
    pub fn extended_payload_length(&self) -> u64 {
        let size = self.extended_length_size();
        if size == 0 {
            return u64::from(self.payload_length());
        }

        (2..2 + size).fold(0u64, |acc, i| (acc << 8) | u64::from(self.byte(i)))
    }

    /// Header size in bytes, including the masking key.
    pub fn header_size(&self) -> usize {
        let mask_size = if self.masked() { MASK_KEY_SIZE } else { 0 };
        2 + self.extended_length_size() + mask_size
    }

    /// The masking key, if the frame is masked and the key has been received.
    pub fn mask_key(&self) -> Option<[u8; 4]> {
        if !self.masked() {
            return None;
        }

        let start = 2 + self.extended_length_size();
        self.data
            .get(start..start + MASK_KEY_SIZE)
            .and_then(|key| key.try_into().ok())
    }

    /// Exact number of bytes the complete frame occupies in the stream.
    ///
    /// Saturates at `u64::MAX` for lengths that would overflow once the header is added; such
    /// a frame can never complete.
    pub fn total_frame_size(&self) -> u64 {
        (self.header_size() as u64).saturating_add(self.extended_payload_length())
    }

    /// Payload bytes as stored in the buffer, still masked if the frame is masked.
    ///
    /// On an incomplete frame this is whatever part of the payload has arrived so far.
    pub fn raw_payload(&self) -> &[u8] {
        let len = self.data.len();
        let start = self.header_size().min(len);
        let end = usize::try_from(self.total_frame_size()).map_or(len, |size| size.min(len));
        &self.data[start..end]
    }

    /// The unmasked application data.
    ///
    /// Computed on every call: the stored bytes are copied and, for masked frames, XORed with
    /// the key re-read from the header.
    pub fn payload(&self) -> Bytes {
        let mut payload = BytesMut::from(self.raw_payload());
        if let Some(key) = self.mask_key() {
            apply_mask(&mut payload, key);
        }
        payload.freeze()
    }

    /// The raw frame bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the frame, returning its raw bytes.
    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }

    /// Number of bytes currently buffered.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Writes a frame header into `head` and returns its size.
///
/// # Panics
/// Panics if `head` is shorter than [`MAX_HEAD_SIZE`].
fn fmt_head(
    fin: bool,
    opcode: OpCode,
    len: usize,
    key: Option<[u8; 4]>,
    head: &mut [u8],
) -> usize {
    head[0] = (u8::from(fin) << 7) | u8::from(opcode);

    let size = if len > u16::MAX as usize {
        head[1] = LEN_SELECTOR_64;
        head[2..10].copy_from_slice(&(len as u64).to_be_bytes());
        10
    } else if len > MAX_SHORT_LEN {
        head[1] = LEN_SELECTOR_16;
        head[2..4].copy_from_slice(&(len as u16).to_be_bytes());
        4
    } else {
        head[1] = len as u8;
        2
    };

    if let Some(key) = key {
        head[1] |= MASK_BIT;
        head[size..size + MASK_KEY_SIZE].copy_from_slice(&key);
        size + MASK_KEY_SIZE
    } else {
        size
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("fin", &self.fin())
            .field("opcode", &self.opcode())
            .field("masked", &self.masked())
            .field("payload_len", &self.extended_payload_length())
            .field("buffered", &self.data.len())
            .field("complete", &self.is_complete())
            .finish()
    }
}

/// An owned, unmasked snapshot of a frame: the opcode, FIN bit and payload.
///
/// This is the shape higher layers usually want. Converting a [`Frame`] into a view unmasks
/// the payload once; converting a view back into a [`Frame`] encodes it unmasked. The
/// constructors all build final (`fin = true`) views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameView {
    /// The operation code indicating the type of frame.
    pub opcode: OpCode,
    /// Whether this is the final fragment of a message.
    pub fin: bool,
    /// The payload, already unmasked.
    pub payload: Bytes,
}

impl FrameView {
    fn final_frame(opcode: OpCode, payload: Bytes) -> Self {
        Self {
            opcode,
            fin: true,
            payload,
        }
    }

    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self::final_frame(OpCode::Text, payload.into())
    }

    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self::final_frame(OpCode::Binary, payload.into())
    }

    pub fn ping(payload: impl Into<Bytes>) -> Self {
        Self::final_frame(OpCode::Ping, payload.into())
    }

    pub fn pong(payload: impl Into<Bytes>) -> Self {
        Self::final_frame(OpCode::Pong, payload.into())
    }

    /// Creates a close frame view with a raw payload.
    ///
    /// The payload is not checked for a valid close code or reason.
    pub fn close(payload: impl Into<Bytes>) -> Self {
        Self::final_frame(OpCode::Close, payload.into())
    }

    /// Encodes the view, masked when `key` is given.
    ///
    /// Unlike [`Frame::encode`], the FIN bit follows [`FrameView::fin`], so a caller that splits
    /// a message itself can emit the non-final fragments.
    pub fn encode(&self, key: Option<[u8; 4]>) -> Frame {
        Frame::encode_with(self.fin, self.opcode, &self.payload, key)
    }
}

impl From<&Frame> for FrameView {
    fn from(frame: &Frame) -> Self {
        Self {
            opcode: frame.opcode(),
            fin: frame.fin(),
            payload: frame.payload(),
        }
    }
}

impl From<Frame> for FrameView {
    fn from(frame: Frame) -> Self {
        Self::from(&frame)
    }
}

impl From<FrameView> for Frame {
    fn from(view: FrameView) -> Self {
        view.encode(None)
    }
}

impl From<FrameView> for (OpCode, Bytes) {
    fn from(val: FrameView) -> Self {
        (val.opcode, val.payload)
    }
}

impl From<(OpCode, Bytes)> for FrameView {
    fn from((opcode, payload): (OpCode, Bytes)) -> Self {
        Self::final_frame(opcode, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OPCODES: [OpCode; 7] = [
        OpCode::Continuation,
        OpCode::Text,
        OpCode::Binary,
        OpCode::Close,
        OpCode::Ping,
        OpCode::Pong,
        OpCode::Invalid,
    ];

    /// Feeds `chunks` into a fresh frame, collecting every byte handed back.
    fn feed<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> (Frame, Vec<u8>) {
        let mut frame = Frame::new();
        let mut leftover = Vec::new();
        for chunk in chunks {
            leftover.extend_from_slice(&frame.add(chunk));
        }
        (frame, leftover)
    }

    mod opcode_tests {
        use super::*;

        #[test]
        fn test_is_control() {
            assert!(OpCode::Close.is_control());
            assert!(OpCode::Ping.is_control());
            assert!(OpCode::Pong.is_control());

            assert!(!OpCode::Continuation.is_control());
            assert!(!OpCode::Text.is_control());
            assert!(!OpCode::Binary.is_control());
            assert!(!OpCode::Invalid.is_control());
        }

        #[test]
        fn test_is_data() {
            assert!(OpCode::Continuation.is_data());
            assert!(OpCode::Text.is_data());
            assert!(OpCode::Binary.is_data());
            assert!(!OpCode::Ping.is_data());
            assert!(!OpCode::Invalid.is_data());
        }

        #[test]
        fn test_from_u8_known() {
            assert_eq!(OpCode::from(0x0), OpCode::Continuation);
            assert_eq!(OpCode::from(0x1), OpCode::Text);
            assert_eq!(OpCode::from(0x2), OpCode::Binary);
            assert_eq!(OpCode::from(0x8), OpCode::Close);
            assert_eq!(OpCode::from(0x9), OpCode::Ping);
            assert_eq!(OpCode::from(0xA), OpCode::Pong);
        }

        #[test]
        fn test_from_u8_reserved() {
            for code in [0x3, 0x4, 0x5, 0x6, 0x7, 0xB, 0xC, 0xD, 0xE, 0xF] {
                assert_eq!(OpCode::from(code), OpCode::Invalid, "nibble {:#x}", code);
            }
        }

        #[test]
        fn test_from_u8_ignores_high_nibble() {
            assert_eq!(OpCode::from(0x81), OpCode::Text);
            assert_eq!(OpCode::from(0xF8), OpCode::Close);
        }

        #[test]
        fn test_nibble_round_trip() {
            for opcode in ALL_OPCODES {
                assert_eq!(OpCode::from(u8::from(opcode)), opcode);
            }
        }
    }

    mod decode_tests {
        use super::*;

        #[test]
        fn test_unmasked_text_hello() {
            let (frame, leftover) = feed([&b"\x81\x05Hello"[..]]);

            assert!(frame.is_complete());
            assert!(leftover.is_empty());
            assert!(frame.fin());
            assert!(!frame.rsv1() && !frame.rsv2() && !frame.rsv3());
            assert_eq!(frame.opcode(), OpCode::Text);
            assert!(!frame.masked());
            assert_eq!(frame.mask_key(), None);
            assert_eq!(frame.payload_length(), 5);
            assert_eq!(frame.extended_payload_length(), 5);
            assert_eq!(frame.total_frame_size(), 7);
            assert_eq!(&frame.payload()[..], b"Hello");
        }

        #[test]
        fn test_masked_rfc_example() {
            let bytes = [
                0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58,
            ];
            let (frame, leftover) = feed([&bytes[..]]);

            assert!(frame.is_complete());
            assert!(leftover.is_empty());
            assert!(frame.masked());
            assert_eq!(frame.mask_key(), Some([0x37, 0xfa, 0x21, 0x3d]));
            assert_eq!(frame.header_size(), 6);
            assert_eq!(frame.raw_payload(), &[0x7f, 0x9f, 0x4d, 0x51, 0x58]);
            assert_eq!(&frame.payload()[..], b"Hello");
        }

        #[test]
        fn test_reserved_bits_reported() {
            let (frame, _) = feed([&[0xF1, 0x00][..]]);

            assert!(frame.is_complete());
            assert!(frame.fin());
            assert!(frame.rsv1());
            assert!(frame.rsv2());
            assert!(frame.rsv3());
            assert_eq!(frame.opcode(), OpCode::Text);
        }

        #[test]
        fn test_invalid_opcode_is_data_not_error() {
            let (frame, leftover) = feed([&[0b1000_0101, 0x02, 0xAB, 0xCD][..]]);

            assert!(frame.is_complete());
            assert!(leftover.is_empty());
            assert_eq!(frame.opcode(), OpCode::Invalid);
            assert_eq!(&frame.payload()[..], &[0xAB, 0xCD]);
        }

        #[test]
        fn test_empty_buffer() {
            let frame = Frame::new();
            assert!(frame.is_empty());
            assert!(!frame.is_complete());
            assert!(frame.payload().is_empty());
        }

        #[test]
        fn test_staged_completeness() {
            // header not readable
            let (frame, _) = feed([&[0x82][..]]);
            assert!(!frame.is_complete());

            // 16-bit length announced but not readable
            let (frame, _) = feed([&[0x82, 126, 0x00][..]]);
            assert!(!frame.is_complete());

            // 64-bit length announced but only 7 of 8 bytes present
            let (frame, _) = feed([&[0x82, 127, 0, 0, 0, 0, 0, 0, 0][..]]);
            assert!(!frame.is_complete());

            // 16-bit length of zero is a complete (if oddly encoded) frame
            let (frame, _) = feed([&[0x82, 126, 0x00, 0x00][..]]);
            assert!(frame.is_complete());
            assert_eq!(frame.extended_payload_length(), 0);

            // mask bit set, key still missing
            let (frame, _) = feed([&[0x82, 0x80, 0x01, 0x02][..]]);
            assert!(!frame.is_complete());
            assert_eq!(frame.mask_key(), None);
        }

        #[test]
        fn test_sixteen_bit_length() {
            let mut bytes = vec![0x82, 126, 0x01, 0x00];
            bytes.extend(std::iter::repeat(0x5A).take(256));

            let (frame, _) = feed([&bytes[..255]]);
            assert!(!frame.is_complete());
            assert_eq!(frame.extended_payload_length(), 256);
            assert_eq!(frame.total_frame_size(), 260);

            let (frame, leftover) = feed([&bytes[..]]);
            assert!(frame.is_complete());
            assert!(leftover.is_empty());
            assert_eq!(frame.payload().len(), 256);
        }

        #[test]
        fn test_huge_length_accepted_but_never_complete() {
            let mut bytes = vec![0x82, 0x80 | 127];
            bytes.extend_from_slice(&[0xFF; 8]);
            bytes.extend_from_slice(&[1, 2, 3, 4]);
            bytes.extend_from_slice(b"some payload");

            let (frame, leftover) = feed([&bytes[..]]);
            assert!(!frame.is_complete());
            assert!(leftover.is_empty());
            assert_eq!(frame.extended_payload_length(), u64::MAX);
            assert_eq!(frame.total_frame_size(), u64::MAX);
            assert_eq!(frame.mask_key(), Some([1, 2, 3, 4]));
            assert_eq!(frame.payload().len(), b"some payload".len());
        }

        #[test]
        fn test_parse() {
            let mut bytes = Frame::encode(OpCode::Ping, b"abc", &[]).into_bytes().to_vec();
            bytes.extend_from_slice(&[0x8A, 0x00]);

            let (frame, consumed) = Frame::parse(&bytes).expect("complete frame");
            assert_eq!(consumed, 5);
            assert_eq!(frame.opcode(), OpCode::Ping);
            assert_eq!(&frame.payload()[..], b"abc");

            assert!(Frame::parse(&bytes[..4]).is_none());
        }
    }

    mod encode_tests {
        use super::*;

        #[test]
        fn test_close_empty_unmasked() {
            let frame = Frame::encode(OpCode::Close, b"", &[]);
            assert_eq!(frame.as_bytes(), &[0x88, 0x00]);
        }

        #[test]
        fn test_length_boundary_125() {
            let payload = vec![7u8; 125];
            let frame = Frame::encode(OpCode::Binary, &payload, &[]);

            assert_eq!(frame.as_bytes()[1], 125);
            assert_eq!(frame.header_size(), 2);
            assert_eq!(frame.len(), 127);
        }

        #[test]
        fn test_length_boundary_126() {
            let payload = vec![7u8; 126];
            let frame = Frame::encode(OpCode::Binary, &payload, &[]);

            assert_eq!(frame.as_bytes()[1], 126);
            assert_eq!(&frame.as_bytes()[2..4], &126u16.to_be_bytes());
            assert_eq!(frame.extended_payload_length(), 126);
            assert_eq!(frame.len(), 4 + 126);
        }

        #[test]
        fn test_length_boundary_65535() {
            let payload = vec![7u8; 65535];
            let frame = Frame::encode(OpCode::Binary, &payload, &[]);

            assert_eq!(frame.as_bytes()[1], 126);
            assert_eq!(&frame.as_bytes()[2..4], &[0xFF, 0xFF]);
        }

        #[test]
        fn test_length_boundary_65536() {
            let payload = vec![7u8; 65536];
            let frame = Frame::encode(OpCode::Binary, &payload, &[]);

            assert_eq!(frame.as_bytes()[1], 127);
            assert_eq!(&frame.as_bytes()[2..10], &65536u64.to_be_bytes());
            assert_eq!(frame.extended_payload_length(), 65536);
            assert_eq!(frame.len(), 10 + 65536);
        }

        #[test]
        fn test_masked_header_layout() {
            let key = [0xAA, 0xBB, 0xCC, 0xDD];
            let frame = Frame::encode(OpCode::Text, b"Header test", &key);

            assert_eq!(frame.as_bytes()[0], 0x81);
            assert_eq!(frame.as_bytes()[1], 0x80 | 11);
            assert_eq!(&frame.as_bytes()[2..6], &key);
            assert_eq!(frame.header_size(), 6);
        }

        #[test]
        fn test_mask_key_position_per_length_encoding() {
            let key = [1, 2, 3, 4];
            for (len, offset) in [(10usize, 2usize), (300, 4), (70_000, 10)] {
                let payload = vec![0u8; len];
                let frame = Frame::encode(OpCode::Binary, &payload, &key);
                assert_eq!(&frame.as_bytes()[offset..offset + 4], &key, "len {}", len);
                assert_eq!(frame.mask_key(), Some(key));
            }
        }

        #[test]
        fn test_encode_unmasked_matches_empty_key() {
            let frame = Frame::encode_unmasked(OpCode::Pong, b"pong");
            assert_eq!(frame, Frame::encode(OpCode::Pong, b"pong", &[]));
            assert_eq!(frame.as_bytes(), b"\x8A\x04pong");
        }

        #[test]
        fn test_wrong_key_length_means_unmasked() {
            for key in [&[][..], &[1][..], &[1, 2, 3][..], &[1, 2, 3, 4, 5][..]] {
                let frame = Frame::encode(OpCode::Text, b"plain", key);
                assert!(!frame.masked());
                assert_eq!(frame.raw_payload(), b"plain");
            }
        }

        #[test]
        fn test_rsv_bits_always_clear_and_fin_set() {
            for opcode in ALL_OPCODES {
                let frame = Frame::encode(opcode, b"x", &[9, 9, 9, 9]);
                assert!(frame.fin());
                assert!(!frame.rsv1() && !frame.rsv2() && !frame.rsv3());
            }
        }

        #[test]
        fn test_mask_applied_exactly_once() {
            let key = [0x11, 0x22, 0x33, 0x44];
            let original = b"mask me exactly once".to_vec();
            let frame = Frame::encode_masked(OpCode::Binary, &original, key);

            // stored bytes differ from the payload, unmasking restores it
            assert_ne!(frame.raw_payload(), &original[..]);
            assert_eq!(&frame.payload()[..], &original[..]);

            // applying the key to the already unmasked payload scrambles it again
            let mut unmasked_twice = frame.payload().to_vec();
            apply_mask(&mut unmasked_twice, key);
            assert_ne!(unmasked_twice, original);
            assert_eq!(&unmasked_twice[..], frame.raw_payload());
        }

        #[test]
        fn test_round_trip() {
            let keys: [&[u8]; 2] = [&[], &[0xde, 0xad, 0xbe, 0xef]];
            for opcode in ALL_OPCODES {
                for len in [0usize, 1, 5, 125, 126, 1000, 65535, 65536] {
                    let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
                    for key in keys {
                        let encoded = Frame::encode(opcode, &payload, key);
                        let (decoded, leftover) = feed([encoded.as_bytes()]);

                        assert!(decoded.is_complete());
                        assert!(leftover.is_empty());
                        assert_eq!(decoded.opcode(), opcode);
                        assert_eq!(decoded.masked(), !key.is_empty());
                        assert_eq!(&decoded.payload()[..], &payload[..]);
                    }
                }
            }
        }
    }

    mod feed_tests {
        use super::*;

        fn stream() -> (Vec<u8>, usize) {
            let payload: Vec<u8> = (0..300u32).map(|i| (i * 3) as u8).collect();
            let first = Frame::encode(OpCode::Binary, &payload, &[5, 6, 7, 8]);
            let second = Frame::encode(OpCode::Text, b"next", &[]);

            let mut bytes = first.as_bytes().to_vec();
            let split = bytes.len();
            bytes.extend_from_slice(second.as_bytes());
            (bytes, split)
        }

        #[test]
        fn test_one_call_two_calls_and_bytewise_agree() {
            let (bytes, split) = stream();
            let (whole, whole_leftover) = feed([&bytes[..]]);

            assert!(whole.is_complete());
            assert_eq!(whole.len(), split);
            assert_eq!(&whole_leftover[..], &bytes[split..]);

            for offset in 0..=bytes.len() {
                let (frame, leftover) = feed([&bytes[..offset], &bytes[offset..]]);
                assert_eq!(frame, whole, "split at {}", offset);
                assert_eq!(leftover, whole_leftover, "split at {}", offset);
            }

            let (bytewise, bytewise_leftover) = feed(bytes.chunks(1));
            assert_eq!(bytewise, whole);
            assert_eq!(bytewise_leftover, whole_leftover);
        }

        #[test]
        fn test_leftover_starts_next_frame() {
            let (bytes, split) = stream();

            let mut frame = Frame::new();
            let leftover = frame.add(&bytes);
            assert!(frame.is_complete());
            assert_eq!(frame.total_frame_size(), split as u64);
            assert_eq!(&leftover[..], &bytes[split..]);

            let mut next = Frame::new();
            assert!(next.add(&leftover).is_empty());
            assert!(next.is_complete());
            assert_eq!(next.opcode(), OpCode::Text);
            assert_eq!(&next.payload()[..], b"next");
        }

        #[test]
        fn test_incomplete_returns_nothing() {
            let (bytes, split) = stream();
            let mut frame = Frame::new();
            assert!(frame.add(&bytes[..split - 1]).is_empty());
            assert!(!frame.is_complete());
            assert_eq!(frame.len(), split - 1);
        }

        #[test]
        fn test_complete_frame_is_frozen() {
            let mut frame = Frame::new();
            frame.add(&[0x89, 0x00]);
            assert!(frame.is_complete());

            let extra = frame.add(&[0x8A, 0x00]);
            assert_eq!(&extra[..], &[0x8A, 0x00]);
            assert_eq!(frame.as_bytes(), &[0x89, 0x00]);
        }

        #[test]
        fn test_many_frames_from_one_chunk() {
            let mut bytes = Vec::new();
            for word in ["a", "bb", "ccc"] {
                let frame = Frame::encode(OpCode::Text, word.as_bytes(), &[]);
                bytes.extend_from_slice(frame.as_bytes());
            }

            let mut payloads = Vec::new();
            let mut pending = Bytes::from(bytes);
            while !pending.is_empty() {
                let mut frame = Frame::new();
                pending = frame.add(&pending);
                assert!(frame.is_complete());
                payloads.push(frame.payload());
            }

            assert_eq!(payloads, vec!["a", "bb", "ccc"]);
        }
    }

    mod frameview_tests {
        use super::*;

        #[test]
        fn test_constructors() {
            assert_eq!(FrameView::text("t").opcode, OpCode::Text);
            assert_eq!(FrameView::binary(vec![1]).opcode, OpCode::Binary);
            assert_eq!(FrameView::ping("p").opcode, OpCode::Ping);
            assert_eq!(FrameView::pong("p").opcode, OpCode::Pong);

            let close = FrameView::close(vec![0x03, 0xE8]);
            assert_eq!(close.opcode, OpCode::Close);
            assert_eq!(close.payload, Bytes::from_static(&[0x03, 0xE8]));

            for view in [FrameView::text("t"), FrameView::ping("p"), close] {
                assert!(view.fin);
            }
        }

        #[test]
        fn test_from_masked_frame_unmasks() {
            let frame = Frame::encode(OpCode::Binary, b"secret", &[4, 3, 2, 1]);
            let view = FrameView::from(&frame);

            assert_eq!(view.opcode, OpCode::Binary);
            assert!(view.fin);
            assert_eq!(view.payload, Bytes::from_static(b"secret"));

            let mut bytes = Frame::encode(OpCode::Text, b"part", &[9, 9, 9, 9])
                .as_bytes()
                .to_vec();
            bytes[0] &= !FIN_BIT;
            let (fragment, _) = Frame::parse(&bytes).unwrap();
            let view = FrameView::from(fragment);

            assert!(!view.fin);
            assert_eq!(view.opcode, OpCode::Text);
            assert_eq!(view.payload, Bytes::from_static(b"part"));
        }

        #[test]
        fn test_view_encode() {
            let view = FrameView::text("Hello");
            let frame = Frame::from(view.clone());
            assert_eq!(frame.as_bytes(), b"\x81\x05Hello");

            let masked = view.encode(Some([1, 2, 3, 4]));
            assert!(masked.masked());
            assert_eq!(FrameView::from(masked), view);
        }

        #[test]
        fn test_non_final_view_encodes_without_fin() {
            let view = FrameView {
                opcode: OpCode::Binary,
                fin: false,
                payload: Bytes::from_static(&[1, 2]),
            };
            let frame = view.encode(None);

            assert_eq!(frame.as_bytes(), &[0x02, 0x02, 1, 2]);
            assert!(!frame.fin());
            assert_eq!(FrameView::from(&frame), view);
        }

        #[test]
        fn test_tuple_conversions() {
            let view = FrameView::from((OpCode::Pong, Bytes::from_static(b"x")));
            let (opcode, payload): (OpCode, Bytes) = view.into();
            assert_eq!(opcode, OpCode::Pong);
            assert_eq!(payload, Bytes::from_static(b"x"));
        }
    }
}

//! Reassembly of fragmented messages.
//!
//! A logical message is one initial data frame followed by zero or more `Continuation` frames,
//! the last of which has FIN set. Three entry points are provided:
//!
//! - [`concat_payloads`] joins the unmasked payloads of any frame sequence without checking it.
//! - [`Message::assemble`] does the same after verifying the sequence is one well-formed message.
//! - [`Assembler`] validates frame by frame as they come off the wire, letting control frames
//!   through while a fragmented message is in progress.

use bytes::{Bytes, BytesMut};

use crate::{
    frame::{Frame, FrameView, OpCode, MAX_CONTROL_PAYLOAD, OPCODE_BITS},
    mask::apply_mask,
    options::Options,
    Result, WebSocketError,
};

/// Appends the unmasked payload of `frame` to `dst`.
fn append_payload(dst: &mut BytesMut, frame: &Frame) {
    let start = dst.len();
    dst.extend_from_slice(frame.raw_payload());
    if let Some(key) = frame.mask_key() {
        apply_mask(&mut dst[start..], key);
    }
}

/// Concatenates the unmasked payloads of `frames` in order.
///
/// No validation is performed: opcodes, FIN bits and completeness are ignored. Use
/// [`Message::assemble`] when the sequence comes from an untrusted peer.
pub fn concat_payloads<'a, I>(frames: I) -> Bytes
where
    I: IntoIterator<Item = &'a Frame>,
{
    let mut payload = BytesMut::new();
    for frame in frames {
        append_payload(&mut payload, frame);
    }
    payload.freeze()
}

/// A complete logical message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The opcode of the initial frame. Never `Continuation` or `Invalid`.
    pub opcode: OpCode,
    /// The concatenated, unmasked payload.
    pub payload: Bytes,
}

impl Message {
    /// Validates `frames` as exactly one message and joins their payloads.
    ///
    /// The sequence must be either a single complete control frame, or a text/binary frame
    /// followed by continuation frames where only the last frame has FIN set. Control frames
    /// interleaved in the middle are rejected here; use [`Assembler`] to handle them on a live
    /// stream.
    ///
    /// # Errors
    /// - [`WebSocketError::EmptyMessage`] for an empty slice.
    /// - [`WebSocketError::IncompleteFrame`] if any frame is still missing bytes.
    /// - [`WebSocketError::InvalidOpCode`] for reserved opcodes.
    /// - [`WebSocketError::InvalidContinuationFrame`] if the sequence starts with a continuation.
    /// - [`WebSocketError::InvalidFragment`] for any other ordering or FIN violation.
    /// - [`WebSocketError::ControlFrameFragmented`] / [`WebSocketError::ControlFrameTooLarge`]
    ///   for malformed control frames.
    pub fn assemble(frames: &[Frame]) -> Result<Message> {
        let (last, init) = frames.split_last().ok_or(WebSocketError::EmptyMessage)?;

        let mut assembler = Assembler::new();
        for frame in init {
            if assembler.push(frame)?.is_some() {
                // a message ended before the sequence did
                return Err(WebSocketError::InvalidFragment);
            }
        }

        assembler.push(last)?.ok_or(WebSocketError::InvalidFragment)
    }

    #[inline]
    pub fn is_control(&self) -> bool {
        self.opcode.is_control()
    }
}

impl From<Message> for FrameView {
    fn from(message: Message) -> Self {
        Self {
            opcode: message.opcode,
            fin: true,
            payload: message.payload,
        }
    }
}

/// Frame-at-a-time message reassembly.
///
/// Feed complete frames in stream order with [`Assembler::push`]. Data frames that end a
/// message and control frames are returned as [`Message`]s; fragments are buffered until the
/// final continuation arrives. After an error the in-progress message is left untouched and
/// the caller is expected to fail the connection or call [`Assembler::reset`].
#[derive(Debug, Default)]
pub struct Assembler {
    /// Opcode of the message currently being reassembled.
    fragment: Option<OpCode>,
    /// Unmasked payload gathered so far.
    accumulated: BytesMut,
    max_message_size: Option<usize>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(opts: &Options) -> Self {
        Self {
            max_message_size: opts.max_message_size,
            ..Self::default()
        }
    }

    /// Returns `true` while a fragmented message is waiting for more continuation frames.
    pub fn is_fragmented(&self) -> bool {
        self.fragment.is_some()
    }

    /// Drops any partially reassembled message.
    pub fn reset(&mut self) {
        self.fragment = None;
        self.accumulated.clear();
    }

    /// Processes the next frame of the stream.
    ///
    /// # Returns
    /// - `Ok(Some(Message))` for a control frame or the frame that completes a data message.
    /// - `Ok(None)` if the frame is a fragment of a message that is not finished yet.
    /// - `Err(WebSocketError)` if the frame cannot appear at this point of the stream.
    pub fn push(&mut self, frame: &Frame) -> Result<Option<Message>> {
        if !frame.is_complete() {
            return Err(WebSocketError::IncompleteFrame);
        }

        match frame.opcode() {
            OpCode::Text | OpCode::Binary => {
                if self.fragment.is_some() {
                    return Err(WebSocketError::InvalidFragment);
                }
                self.check_size(frame)?;

                if frame.fin() {
                    return Ok(Some(Message {
                        opcode: frame.opcode(),
                        payload: frame.payload(),
                    }));
                }

                #[cfg(feature = "logging")]
                log::debug!("fragmented {:?} message started", frame.opcode());

                self.fragment = Some(frame.opcode());
                append_payload(&mut self.accumulated, frame);

                Ok(None)
            }
            OpCode::Continuation => {
                let opcode = self
                    .fragment
                    .ok_or(WebSocketError::InvalidContinuationFrame)?;
                self.check_size(frame)?;

                append_payload(&mut self.accumulated, frame);
                if !frame.fin() {
                    return Ok(None);
                }

                let payload = std::mem::take(&mut self.accumulated).freeze();
                self.fragment = None;

                #[cfg(feature = "logging")]
                log::debug!(
                    "fragmented {:?} message complete ({} bytes)",
                    opcode,
                    payload.len()
                );

                Ok(Some(Message { opcode, payload }))
            }
            OpCode::Invalid => Err(WebSocketError::InvalidOpCode(
                frame.as_bytes()[0] & OPCODE_BITS,
            )),
            opcode => {
                if !frame.fin() {
                    return Err(WebSocketError::ControlFrameFragmented);
                }
                if frame.extended_payload_length() > MAX_CONTROL_PAYLOAD as u64 {
                    return Err(WebSocketError::ControlFrameTooLarge);
                }

                Ok(Some(Message {
                    opcode,
                    payload: frame.payload(),
                }))
            }
        }
    }

    fn check_size(&self, frame: &Frame) -> Result<()> {
        let Some(max) = self.max_message_size else {
            return Ok(());
        };

        let size = (self.accumulated.len() as u64).saturating_add(frame.extended_payload_length());
        if size > max as u64 {
            return Err(WebSocketError::MessageTooLarge);
        }
        Ok(())
    }
}

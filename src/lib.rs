//! # wsframe
//! Incremental implementation of the WebSocket (RFC 6455) framing layer: recognizing frame
//! boundaries in an untrusted byte stream, removing and applying the four-byte masking cipher,
//! encoding outbound frames and reassembling fragmented messages.
//!
//! The crate performs no I/O. Bytes arriving from a transport are fed into a [`Frame`] with
//! [`Frame::add`]; once the frame is complete, any bytes belonging to the next frame are handed
//! back to the caller. The [`codec`] module wraps that loop for use with `tokio_util::codec`.
//!
//! # Features
//! - `logging`: Enables trace/debug logging of frame boundaries and message reassembly using
//!   the `log` crate.
//!
//! # Decoding Example
//! ```rust
//! use wsframe::{Frame, OpCode};
//!
//! let mut frame = Frame::new();
//! let leftover = frame.add(&[0x81, 0x05, b'H', b'e', b'l']);
//! assert!(!frame.is_complete());
//! assert!(leftover.is_empty());
//!
//! // the tail of the first frame plus the start of the next one
//! let leftover = frame.add(&[b'l', b'o', 0x89, 0x00]);
//! assert!(frame.is_complete());
//! assert_eq!(frame.opcode(), OpCode::Text);
//! assert_eq!(&frame.payload()[..], b"Hello");
//! assert_eq!(&leftover[..], &[0x89, 0x00]);
//! ```
//!
//! # Encoding Example
//! ```rust
//! use wsframe::{Frame, OpCode};
//!
//! let frame = Frame::encode(OpCode::Close, b"", &[]);
//! assert_eq!(frame.as_bytes(), &[0x88, 0x00]);
//! ```
//!
//! # Memory Safety
//! Frames accept any 64-bit extended length. Limits are opt-in at the adaptor level through
//! [`Options::with_max_payload_read`] and [`Options::with_max_message_size`]; callers that feed
//! [`Frame`] directly must cap lengths themselves.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
pub mod frame;
mod mask;
pub mod message;
mod options;

use thiserror::Error;

pub use frame::{Frame, FrameView, OpCode};
pub use message::{concat_payloads, Assembler, Message};
pub use options::{Options, Role};

/// A result type for framing operations, using `WebSocketError` as the error type.
pub type Result<T> = std::result::Result<T, WebSocketError>;

/// Errors raised above the raw frame level.
///
/// Decoding a single frame never fails: reserved opcodes surface as [`OpCode::Invalid`] and any
/// byte sequence is interpretable. Errors come from validating frame *sequences*, from opt-in
/// size limits, and from the transport when the [`codec`] adaptor is used.
#[derive(Error, Debug)]
pub enum WebSocketError {
    /// A frame carried one of the reserved opcodes (0x3-0x7, 0xB-0xF).
    #[error("Invalid opcode (byte={0})")]
    InvalidOpCode(u8),

    /// A data frame arrived while a fragmented message was still in progress, or a
    /// non-final frame was followed by nothing.
    #[error("Invalid fragment")]
    InvalidFragment,

    /// A continuation frame arrived without a preceding initial data frame.
    #[error("Invalid continuation frame")]
    InvalidContinuationFrame,

    /// A control frame (ping, pong or close) had the FIN bit cleared.
    #[error("Control frame must not be fragmented")]
    ControlFrameFragmented,

    /// A control frame carried more than 125 bytes of payload.
    #[error("Control frame too large")]
    ControlFrameTooLarge,

    /// A frame handed to message assembly was still missing bytes.
    #[error("Incomplete frame")]
    IncompleteFrame,

    /// Message assembly was asked to combine an empty frame sequence.
    #[error("Empty message")]
    EmptyMessage,

    /// A frame's declared payload length exceeds the configured maximum.
    #[error("Frame too large")]
    FrameTooLarge,

    /// The accumulated fragments of a message exceed the configured maximum.
    #[error("Message too large")]
    MessageTooLarge,

    /// Wraps I/O errors surfaced by the transport when driving the [`codec`].
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

//! `tokio_util::codec` adaptor.
//!
//! [`Decoder`] drives [`Frame::add`] from a `Framed`/`FramedRead` read buffer and yields one
//! complete [`Frame`] at a time. [`Encoder`] writes frames, masking [`FrameView`]s with a fresh
//! random key when running as a client.
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use tokio::net::TcpStream;
//! use tokio_util::codec::FramedRead;
//! use wsframe::{codec::Decoder, Options};
//!
//! # async fn run(stream: TcpStream) -> wsframe::Result<()> {
//! let options = Options::default().with_max_payload_read(1024 * 1024);
//! let mut frames = FramedRead::new(stream, Decoder::new(&options));
//! while let Some(frame) = frames.next().await {
//!     let frame = frame?;
//!     println!("{:?}: {} bytes", frame.opcode(), frame.payload().len());
//! }
//! # Ok(())
//! # }
//! ```

use std::io;

use bytes::BytesMut;
use tokio_util::codec;

use crate::{
    frame::{Frame, FrameView},
    options::{Options, Role},
    Result, WebSocketError,
};

/// A combined codec that provides both encoding and decoding of WebSocket frames.
pub struct Codec {
    decoder: Decoder,
    encoder: Encoder,
}

impl Codec {
    pub fn new(opts: &Options) -> Self {
        Self {
            decoder: Decoder::new(opts),
            encoder: Encoder::new(opts.role),
        }
    }
}

impl From<(Decoder, Encoder)> for Codec {
    fn from((decoder, encoder): (Decoder, Encoder)) -> Self {
        Self { decoder, encoder }
    }
}

impl codec::Decoder for Codec {
    type Item = <Decoder as codec::Decoder>::Item;
    type Error = <Decoder as codec::Decoder>::Error;

    #[inline]
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.decoder.decode(src)
    }

    #[inline]
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.decoder.decode_eof(src)
    }
}

impl codec::Encoder<Frame> for Codec {
    type Error = WebSocketError;

    #[inline]
    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        self.encoder.encode(item, dst)
    }
}

impl codec::Encoder<FrameView> for Codec {
    type Error = WebSocketError;

    #[inline]
    fn encode(&mut self, item: FrameView, dst: &mut BytesMut) -> Result<()> {
        self.encoder.encode(item, dst)
    }
}

/// Splits a byte stream into frames.
///
/// Bytes are moved from the read buffer into the in-progress frame only up to the frame's
/// end, so whatever follows stays in the read buffer for the next call.
pub struct Decoder {
    /// The frame currently being filled.
    frame: Frame,
    /// Maximum allowed payload length per frame.
    max_payload_read: Option<usize>,
}

impl Decoder {
    pub fn new(opts: &Options) -> Self {
        Self {
            frame: Frame::new(),
            max_payload_read: opts.max_payload_read,
        }
    }

    /// Number of bytes the in-progress frame can take without running past its end.
    fn wanted(&self) -> usize {
        let len = self.frame.len();
        if len < 2 {
            return 2 - len;
        }

        let header_size = self.frame.header_size();
        if len < header_size {
            return header_size - len;
        }

        usize::try_from(self.frame.total_frame_size())
            .map_or(usize::MAX, |size| size.saturating_sub(len))
    }

    /// Rejects the frame once its full header is buffered and the length exceeds the limit.
    fn check_limit(&self) -> Result<()> {
        let Some(max) = self.max_payload_read else {
            return Ok(());
        };

        if self.frame.len() >= self.frame.header_size()
            && self.frame.extended_payload_length() > max as u64
        {
            #[cfg(feature = "logging")]
            log::debug!(
                "rejecting frame: payload length {} exceeds {}",
                self.frame.extended_payload_length(),
                max
            );

            return Err(WebSocketError::FrameTooLarge);
        }
        Ok(())
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

impl codec::Decoder for Decoder {
    type Item = Frame;
    type Error = WebSocketError;

    /// Feeds the read buffer into the in-progress frame.
    ///
    /// # Returns
    /// - `Ok(Some(Frame))` once a frame is complete.
    /// - `Ok(None)` if more data is needed.
    /// - `Err(WebSocketError::FrameTooLarge)` if the frame exceeds `max_payload_read`.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        while !self.frame.is_complete() {
            if src.is_empty() {
                return Ok(None);
            }

            let chunk = src.split_to(self.wanted().min(src.len()));
            let leftover = self.frame.add(&chunk);
            debug_assert!(leftover.is_empty());

            self.check_limit()?;
        }

        let frame = std::mem::take(&mut self.frame);

        #[cfg(feature = "logging")]
        log::trace!(
            "<<fin={} {:?} len={}",
            frame.fin(),
            frame.opcode(),
            frame.extended_payload_length()
        );

        Ok(Some(frame))
    }

    /// Like `decode`, but fails if the stream ends in the middle of a frame.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if self.frame.is_empty() => Ok(None),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended in the middle of a frame",
            )
            .into()),
        }
    }
}

/// Serializes frames into the write buffer.
pub struct Encoder {
    role: Role,
}

impl Encoder {
    pub fn new(role: Role) -> Self {
        Self { role }
    }
}

impl codec::Encoder<Frame> for Encoder {
    type Error = WebSocketError;

    /// Writes an already encoded frame as-is.
    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(frame.as_bytes());
        Ok(())
    }
}

impl codec::Encoder<FrameView> for Encoder {
    type Error = WebSocketError;

    /// Encodes the view with its own FIN bit, masked with a random key when the role is
    /// [`Role::Client`].
    fn encode(&mut self, view: FrameView, dst: &mut BytesMut) -> Result<()> {
        let key = (self.role == Role::Client).then(rand::random::<[u8; 4]>);
        let frame = view.encode(key);

        #[cfg(feature = "logging")]
        log::trace!(
            ">>{} {:?} len={}",
            self.role,
            view.opcode,
            view.payload.len()
        );

        dst.extend_from_slice(frame.as_bytes());
        Ok(())
    }
}

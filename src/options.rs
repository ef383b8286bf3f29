//! Framing configuration.

use std::fmt;

/// Which end of the connection this side is.
///
/// Clients must mask every frame they send; servers must not. The [`crate::codec::Encoder`]
/// uses the role to decide whether outgoing frames get a fresh random masking key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Client,
    #[default]
    Server,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
        }
    }
}

/// Configuration for the [`crate::codec`] adaptor and the message [`crate::Assembler`].
///
/// [`crate::Frame`] itself enforces no limits. A declared 64-bit payload length can request
/// far more memory than any real message needs, so a transport reading from an untrusted peer
/// should set at least [`Options::with_max_payload_read`].
///
/// ```rust
/// use wsframe::{Options, Role};
///
/// let options = Options::default()
///     .with_role(Role::Client)
///     .with_limits(1024 * 1024, 4 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Maximum payload length accepted for a single frame, in bytes.
    ///
    /// Checked as soon as the extended length field is readable, before the payload is
    /// buffered.
    ///
    /// Default: `None` (no limit)
    pub max_payload_read: Option<usize>,

    /// Maximum size of a reassembled message, in bytes.
    ///
    /// Default: `None` (no limit)
    pub max_message_size: Option<usize>,

    /// Default: [`Role::Server`]
    pub role: Role,
}

impl Options {
    /// Sets both the per-frame and the per-message limit.
    pub fn with_limits(self, max_payload: usize, max_message: usize) -> Self {
        Self {
            max_payload_read: Some(max_payload),
            max_message_size: Some(max_message),
            ..self
        }
    }

    /// Sets the maximum payload length accepted for a single incoming frame.
    pub fn with_max_payload_read(self, size: usize) -> Self {
        Self {
            max_payload_read: Some(size),
            ..self
        }
    }

    /// Sets the maximum size of a message reassembled from fragments.
    pub fn with_max_message_size(self, size: usize) -> Self {
        Self {
            max_message_size: Some(size),
            ..self
        }
    }

    pub fn with_role(self, role: Role) -> Self {
        Self { role, ..self }
    }
}

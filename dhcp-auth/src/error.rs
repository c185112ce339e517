// SPDX-License-Identifier: Apache-2.0

//! Error kinds raised by [`crate::validator::validate`] and [`crate::encoder::encode`].
//!
//! Modeled on `s2n_quic_core::transport::error::TransportError`: a small
//! enumerable kind plus a static reason string, rather than a dynamically
//! parameterized error.

/// The seven ways a `validate`/`encode` call can fail.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum AuthErrorKind {
    /// Option too short, wrong fixed length for RECONF_KEY, protocol byte
    /// invalid for the configured policy.
    #[error("malformed authentication option")]
    Malformed,
    /// Option slice not contained in the message buffer.
    #[error("authentication option out of range")]
    OutOfRange,
    /// Replay not fresh, policy mismatch, token pin mismatch, or MAC/key
    /// mismatch.
    #[error("authentication denied")]
    Denied,
    /// Unknown protocol, algorithm, or replay detection method.
    #[error("unsupported authentication parameter")]
    Unsupported,
    /// No token matches `(secret_id, realm)`.
    #[error("no matching token")]
    NotFound,
    /// The matched token's expiry has passed.
    #[error("token expired")]
    Expired,
    /// The encode target buffer cannot hold the option.
    #[error("buffer too small for authentication option")]
    BufferTooSmall,
}

/// An authentication failure, carrying its [`AuthErrorKind`] and a static
/// reason describing which check failed.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {reason}")]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub reason: &'static str,
}

impl AuthError {
    #[inline]
    pub const fn new(kind: AuthErrorKind, reason: &'static str) -> Self {
        Self { kind, reason }
    }

    #[inline]
    pub const fn malformed(reason: &'static str) -> Self {
        Self::new(AuthErrorKind::Malformed, reason)
    }

    #[inline]
    pub const fn out_of_range(reason: &'static str) -> Self {
        Self::new(AuthErrorKind::OutOfRange, reason)
    }

    #[inline]
    pub const fn denied(reason: &'static str) -> Self {
        Self::new(AuthErrorKind::Denied, reason)
    }

    #[inline]
    pub const fn unsupported(reason: &'static str) -> Self {
        Self::new(AuthErrorKind::Unsupported, reason)
    }

    #[inline]
    pub const fn not_found(reason: &'static str) -> Self {
        Self::new(AuthErrorKind::NotFound, reason)
    }

    #[inline]
    pub const fn expired(reason: &'static str) -> Self {
        Self::new(AuthErrorKind::Expired, reason)
    }

    #[inline]
    pub const fn buffer_too_small(reason: &'static str) -> Self {
        Self::new(AuthErrorKind::BufferTooSmall, reason)
    }
}

impl From<wire_codec::DecoderError> for AuthError {
    #[inline]
    fn from(error: wire_codec::DecoderError) -> Self {
        match error {
            wire_codec::DecoderError::UnexpectedEof(_) => {
                Self::malformed("authentication option shorter than its fixed header")
            }
            wire_codec::DecoderError::UnexpectedBytes(_) => {
                Self::malformed("authentication option has trailing bytes")
            }
            wire_codec::DecoderError::LengthCapacityExceeded => {
                Self::malformed("length prefix exceeds usize capacity")
            }
            wire_codec::DecoderError::InvariantViolation(msg) => Self::malformed(msg),
        }
    }
}

pub type Result<T> = core::result::Result<T, AuthError>;

// SPDX-License-Identifier: Apache-2.0

//! The negotiated authentication policy: which protocol, algorithm, and
//! replay detection method a client/server pair has committed to.

use crate::error::AuthError;

//= https://www.rfc-editor.org/rfc/rfc3118#section-3
//# A new DHCP option is added to the protocol to support authentication
//# of the message.
/// The authentication protocol carried in byte 0 of the option, as an
/// unparameterized tag. Parsed payloads take the richer
/// [`crate::protocol::Candidate`] shape, which carries the per-protocol
/// fields the tag alone can't.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum AuthProtocol {
    Token = 0,
    Delayed = 1,
    ReconfKey = 2,
    DelayedRealm = 3,
}

impl AuthProtocol {
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_u8(value: u8) -> core::result::Result<Self, AuthError> {
        match value {
            0 => Ok(Self::Token),
            1 => Ok(Self::Delayed),
            2 => Ok(Self::ReconfKey),
            3 => Ok(Self::DelayedRealm),
            _ => Err(AuthError::unsupported("unknown authentication protocol")),
        }
    }
}

/// The MAC algorithm carried in byte 1 of the option.
///
/// Only `HMAC_MD5` is defined by RFC 3118; the digest itself is delegated
/// to the `hmac`/`md-5` crates (primitives are out of scope for this
/// crate).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Algorithm {
    HmacMd5 = 1,
}

impl Algorithm {
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_u8(value: u8) -> core::result::Result<Self, AuthError> {
        match value {
            1 => Ok(Self::HmacMd5),
            _ => Err(AuthError::unsupported("unsupported MAC algorithm")),
        }
    }
}

/// The replay detection method carried in byte 2 of the option. Only the
/// monotonic counter method is implemented; RFC 3118 reserves the value
/// space for others this client never negotiates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ReplayDetectionMethod {
    Monotonic = 0,
}

impl ReplayDetectionMethod {
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_u8(value: u8) -> core::result::Result<Self, AuthError> {
        match value {
            0 => Ok(Self::Monotonic),
            _ => Err(AuthError::unsupported(
                "unsupported replay detection method",
            )),
        }
    }
}

bitflags::bitflags! {
    /// Behavioral flags for an [`AuthPolicy`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct AuthOptions: u8 {
        /// The client actively authenticates the messages it sends. When
        /// clear, the client never emits authentication and only accepts
        /// inbound `RECONF_KEY` options.
        const SEND = 0b0000_0001;
    }
}

impl Default for AuthOptions {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

/// The authentication parameters a client and server have committed to,
/// negotiated out of band (configuration, not this crate's concern).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthPolicy {
    pub protocol: AuthProtocol,
    pub algorithm: Algorithm,
    pub rdm: ReplayDetectionMethod,
    pub options: AuthOptions,
}

impl AuthPolicy {
    #[inline]
    pub const fn new(
        protocol: AuthProtocol,
        algorithm: Algorithm,
        rdm: ReplayDetectionMethod,
        options: AuthOptions,
    ) -> Self {
        Self {
            protocol,
            algorithm,
            rdm,
            options,
        }
    }

    #[inline]
    pub const fn sends(&self) -> bool {
        self.options.contains(AuthOptions::SEND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_round_trips_wire_values() {
        assert_eq!(AuthProtocol::from_u8(0).unwrap(), AuthProtocol::Token);
        assert_eq!(AuthProtocol::from_u8(1).unwrap(), AuthProtocol::Delayed);
        assert_eq!(AuthProtocol::from_u8(2).unwrap(), AuthProtocol::ReconfKey);
        assert_eq!(
            AuthProtocol::from_u8(3).unwrap(),
            AuthProtocol::DelayedRealm
        );
        assert!(AuthProtocol::from_u8(4).is_err());
    }

    #[test]
    fn algorithm_rejects_unknown_values() {
        assert_eq!(Algorithm::from_u8(1).unwrap(), Algorithm::HmacMd5);
        assert!(Algorithm::from_u8(0).is_err());
        assert!(Algorithm::from_u8(2).is_err());
    }

    #[test]
    fn send_flag_gates_sends() {
        let policy = AuthPolicy::new(
            AuthProtocol::Token,
            Algorithm::HmacMd5,
            ReplayDetectionMethod::Monotonic,
            AuthOptions::SEND,
        );
        assert!(policy.sends());

        let silent = AuthPolicy::new(
            AuthProtocol::Token,
            Algorithm::HmacMd5,
            ReplayDetectionMethod::Monotonic,
            AuthOptions::empty(),
        );
        assert!(!silent.sends());
    }
}

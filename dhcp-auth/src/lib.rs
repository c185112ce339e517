// SPDX-License-Identifier: Apache-2.0

//! Authentication option validation and encoding for a DHCP client, per
//! the DHCP authentication framework: RFC 3118 for DHCPv4 and RFC 3315
//! §21 for DHCPv6.
//!
//! This crate owns three things: a [`token::TokenStore`] of shared
//! secrets, a durable [`replay::ReplayCounter`], and the
//! [`validator::validate`]/[`encoder::encode`] pair that read and write
//! the authentication option itself. Everything around those — DHCP
//! option/packet framing, MAC primitives, key negotiation, lease
//! persistence, CLI/config parsing — is the caller's concern.
//!
//! Unlike `wire-codec`, this crate is not `no_std`: the durable replay
//! counter needs `std::fs`.

pub mod encoder;
pub mod error;
pub mod mac;
pub mod message;
pub mod policy;
pub mod protocol;
pub mod replay;
pub mod state;
pub mod token;
pub mod validator;

pub use encoder::{encode, encoded_size};
pub use error::{AuthError, AuthErrorKind, Result};
pub use message::{MessageType, MessageVariant};
pub use policy::{Algorithm, AuthOptions, AuthPolicy, AuthProtocol, ReplayDetectionMethod};
pub use replay::ReplayCounter;
pub use state::AuthState;
pub use token::{Token, TokenConfig, TokenStore};
pub use validator::validate;

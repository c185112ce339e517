// SPDX-License-Identifier: Apache-2.0

//! Validates an inbound authentication option against a session's
//! [`AuthState`] and a [`TokenStore`].

use byteorder::{BigEndian, ByteOrder};

use crate::error::{AuthError, Result};
use crate::mac::{ct_eq, hmac_md5, MAC_LEN};
use crate::message::{MessageType, MessageVariant};
use crate::policy::{AuthOptions, AuthPolicy, AuthProtocol};
use crate::protocol::{self, Candidate, ReconfPayload};
use crate::state::AuthState;
use crate::token::{Token, TokenStore};

/// Fixed header length: protocol + algorithm + rdm + 8-byte replay.
const HEADER_LEN: usize = 11;

/// Validates the authentication option at `message[option_offset..][..option_len]`
/// against `policy` and `store`, updating `state` on success.
///
/// `variant`/`message_type` identify the enclosing DHCP message, needed
/// for the v4 MAC normalization rule and the RECONF_KEY delivery gate.
pub fn validate<'store>(
    state: &'store mut AuthState,
    policy: &AuthPolicy,
    store: &'store TokenStore,
    message: &[u8],
    variant: MessageVariant,
    message_type: MessageType,
    option_offset: usize,
    option_len: usize,
) -> Result<&'store Token> {
    tracing::debug!(
        protocol = ?policy.protocol,
        mp = ?variant,
        mt = ?message_type,
        "validating authentication option"
    );

    if option_len < HEADER_LEN {
        return reject(AuthError::malformed(
            "authentication option shorter than its fixed header",
        ));
    }
    let end = option_offset
        .checked_add(option_len)
        .ok_or_else(|| reject_log(AuthError::out_of_range("authentication option offset overflows")))?;
    if end > message.len() {
        return reject(AuthError::out_of_range(
            "authentication option is not contained in the message",
        ));
    }

    let option = &message[option_offset..end];
    let protocol_byte = option[0];
    let replay = BigEndian::read_u64(&option[3..HEADER_LEN]);

    let protocol = if !policy.sends() {
        if protocol_byte != AuthProtocol::ReconfKey.as_u8() {
            return reject(AuthError::malformed(
                "a non-sending policy accepts only RECONF_KEY",
            ));
        }
        AuthProtocol::ReconfKey
    } else {
        let algorithm_byte = option[1];
        let rdm_byte = option[2];
        let protocol = AuthProtocol::from_u8(protocol_byte).map_err(reject_log)?;
        let algorithm = crate::policy::Algorithm::from_u8(algorithm_byte).map_err(reject_log)?;
        let rdm = crate::policy::ReplayDetectionMethod::from_u8(rdm_byte).map_err(reject_log)?;
        if protocol != policy.protocol || algorithm != policy.algorithm || rdm != policy.rdm {
            return reject(AuthError::denied(
                "protocol/algorithm/rdm do not match the negotiated policy",
            ));
        }
        protocol
    };

    if state.is_pinned() && replay <= state.replay() {
        return reject(AuthError::denied("replay counter is not fresh"));
    }

    let payload = &option[HEADER_LEN..];
    let candidate = protocol::parse(protocol, payload).map_err(reject_log)?;

    match candidate {
        Candidate::Token { key } => {
            let token = lookup(store, 0, &[])?;
            check_expired(token)?;
            if !state.pin_allows(0, &[]) {
                return reject(AuthError::denied("token pin mismatch"));
            }
            if !ct_eq(key, token.key()) {
                return reject(AuthError::denied("token key mismatch"));
            }
            commit_and_log(state, replay, 0, Vec::new());
            Ok(token)
        }

        Candidate::Delayed { secret_id, mac } => {
            let token = lookup(store, secret_id, &[])?;
            check_expired(token)?;
            if !state.pin_allows(secret_id, &[]) {
                return reject(AuthError::denied("token pin mismatch"));
            }
            verify_hmac(token.key(), message, option_offset, option_len, variant, &mac)?;
            commit_and_log(state, replay, secret_id, Vec::new());
            Ok(token)
        }

        Candidate::DelayedRealm {
            realm,
            secret_id,
            mac,
        } => {
            let token = lookup(store, secret_id, realm)?;
            check_expired(token)?;
            if !state.pin_allows(secret_id, realm) {
                return reject(AuthError::denied("token pin mismatch"));
            }
            verify_hmac(token.key(), message, option_offset, option_len, variant, &mac)?;
            commit_and_log(state, replay, secret_id, realm.to_vec());
            Ok(token)
        }

        Candidate::ReconfKey(ReconfPayload::Deliver { key }) => {
            let permitted = matches!(
                (variant, message_type),
                (MessageVariant::V4, MessageType::Ack) | (MessageVariant::V6, MessageType::Ack)
            );
            if !permitted {
                return reject(AuthError::malformed(
                    "reconfigure key delivery only accepted on ACK/REPLY",
                ));
            }
            let reconf = Token::new(0, Vec::new(), key.to_vec(), None);
            state.set_reconf(reconf);
            tracing::info!("reconfigure key delivered");
            Ok(state.reconf().expect("just set"))
        }

        Candidate::ReconfKey(ReconfPayload::Request { mac }) => {
            // Copy the key out before mutating `state`: `reconf` borrows
            // from `state`, and holding it across `commit_and_log`'s
            // mutable borrow would not typecheck.
            let reconf_key = state
                .reconf()
                .ok_or_else(|| reject_log(AuthError::denied("no reconfigure key negotiated yet")))?
                .key()
                .to_vec();
            if !state.pin_allows(0, &[]) {
                return reject(AuthError::denied("token pin mismatch"));
            }
            verify_hmac(&reconf_key, message, option_offset, option_len, variant, &mac)?;
            // Pin the reconfigure token the same way any other protocol's
            // success path does, so the freshness check at the top of
            // this function rejects a replayed reconfigure request.
            commit_and_log(state, replay, 0, Vec::new());
            Ok(state.reconf().expect("checked Some above"))
        }
    }
}

fn lookup<'store>(
    store: &'store TokenStore,
    secret_id: u32,
    realm: &[u8],
) -> Result<&'store Token> {
    store
        .find(secret_id, realm)
        .ok_or_else(|| reject_log(AuthError::not_found("no token matches secret_id/realm")))
}

fn check_expired(token: &Token) -> Result<()> {
    if token.is_expired(std::time::SystemTime::now()) {
        return Err(reject_log(AuthError::expired("token has expired")));
    }
    Ok(())
}

fn verify_hmac(
    key: &[u8],
    message: &[u8],
    option_offset: usize,
    option_len: usize,
    variant: MessageVariant,
    received_mac: &[u8; MAC_LEN],
) -> Result<()> {
    let mut working = message.to_vec();
    let mac_start = option_offset + option_len - MAC_LEN;
    working[mac_start..mac_start + MAC_LEN].fill(0);
    if variant == MessageVariant::V4 {
        crate::message::v4_zero_header_fields(&mut working);
    }
    let computed = hmac_md5(key, &working);
    if !ct_eq(&computed, received_mac) {
        return Err(reject_log(AuthError::denied("MAC mismatch")));
    }
    Ok(())
}

fn commit_and_log(state: &mut AuthState, replay: u64, secret_id: u32, realm: Vec<u8>) {
    let first_pin = !state.is_pinned();
    state.commit(replay, secret_id, realm);
    if first_pin {
        tracing::info!(secret_id, "authentication token pinned");
    }
}

fn reject<T>(error: AuthError) -> Result<T> {
    Err(reject_log(error))
}

fn reject_log(error: AuthError) -> AuthError {
    tracing::warn!(kind = ?error.kind, reason = error.reason, "authentication rejected");
    error
}

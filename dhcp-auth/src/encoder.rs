// SPDX-License-Identifier: Apache-2.0

//! Builds an outgoing authentication option, either in size-query mode
//! (no target buffer: report how many bytes would be written) or emit
//! mode (write into a caller-provided slice of the outgoing message).

use wire_codec::{Encoder as _, EncoderBuffer};

use crate::error::{AuthError, Result};
use crate::mac::{hmac_md5, MAC_LEN};
use crate::message::{MessageType, MessageVariant};
use crate::policy::{AuthPolicy, AuthProtocol};
use crate::replay::ReplayCounter;
use crate::token::{Token, TokenStore};

const HEADER_LEN: usize = 11;

/// Returns the number of bytes the authentication option will occupy for
/// a capability-announcement message (DISCOVER/SOLICIT-style): the fixed
/// 11-byte header plus whatever `policy.protocol` and `token` add.
pub fn encoded_size(policy: &AuthPolicy, token: &Token) -> usize {
    HEADER_LEN
        + match policy.protocol {
            AuthProtocol::Token => token.key().len(),
            AuthProtocol::Delayed => 4 + MAC_LEN,
            AuthProtocol::DelayedRealm => token.realm.len() + 4 + MAC_LEN,
            AuthProtocol::ReconfKey => 1 + MAC_LEN,
        }
}

/// Writes the authentication option for `message` into
/// `message[option_offset..][..option_len]`, per §4.2.
///
/// `token` is `None` when the caller is re-emitting a saved lease
/// without authentication (step 7): the option is left as a bare header
/// announcing capability, or the call returns `0` if the message type
/// doesn't even call for that. It is also `None` for the common
/// TOKEN-protocol case where the caller leaves selection to this
/// function; `store` is then consulted for the default secret_id==0/
/// empty-realm token.
///
/// Returns the number of bytes left unused at the end of the option
/// slice (`0` for a correctly sized caller-allocated slice).
pub fn encode(
    policy: &AuthPolicy,
    token: Option<&Token>,
    store: &TokenStore,
    replay_counter: &ReplayCounter,
    message: &mut [u8],
    variant: MessageVariant,
    message_type: MessageType,
    option_offset: usize,
    option_len: usize,
) -> Result<usize> {
    // Step 1: token selection. If the policy's protocol is TOKEN (0) and
    // the caller passed no explicit token, auto-select the unique
    // secret_id==0/empty-realm token from `store`, the way the original
    // resolves the default token inline before falling into the same
    // encode path as an explicit caller token.
    let token = if token.is_none() && policy.protocol == AuthProtocol::Token {
        Some(
            store
                .default_token()
                .ok_or_else(|| AuthError::malformed("no default secret_id==0 token configured"))?,
        )
    } else {
        token
    };

    if let Some(token) = token {
        if token.is_expired(std::time::SystemTime::now()) {
            return Err(AuthError::denied("selected token has already expired"));
        }
    }

    // Step 2: policy sanity.
    if !matches!(
        policy.protocol,
        AuthProtocol::Token | AuthProtocol::Delayed | AuthProtocol::DelayedRealm
    ) {
        return Err(AuthError::unsupported(
            "the client never emits a RECONF_KEY option",
        ));
    }

    // Step 3: capacity.
    if option_len < HEADER_LEN {
        return Err(AuthError::buffer_too_small(
            "authentication option buffer shorter than the fixed header",
        ));
    }
    let end = option_offset
        .checked_add(option_len)
        .filter(|&end| end <= message.len())
        .ok_or_else(|| AuthError::out_of_range("authentication option is not contained in the message"))?;

    // Step 4: write header.
    let replay = replay_counter.next();
    tracing::debug!(replay, "encoding authentication option");

    {
        let mut encoder = EncoderBuffer::new(&mut message[option_offset..end]);
        encoder.encode(&policy.protocol.as_u8());
        encoder.encode(&policy.algorithm.as_u8());
        encoder.encode(&policy.rdm.as_u8());
        encoder.encode(&replay);
    }

    let remaining_after_header = option_len - HEADER_LEN;

    if policy.protocol == AuthProtocol::Token {
        let token = token.ok_or_else(|| AuthError::malformed("no token selected for TOKEN protocol"))?;
        let key = token.key();
        if remaining_after_header < key.len() {
            return Err(AuthError::buffer_too_small(
                "authentication option buffer too small for the token key",
            ));
        }
        let mut encoder = EncoderBuffer::new(&mut message[option_offset..end]);
        encoder.set_position(HEADER_LEN);
        encoder.encode(&key);
        return Ok(remaining_after_header - key.len());
    }

    if message_type.is_capability_only() {
        return Ok(remaining_after_header);
    }

    let token = match token {
        Some(token) => token,
        None => return Ok(0),
    };

    let mut cursor = option_offset + HEADER_LEN;

    if policy.protocol == AuthProtocol::DelayedRealm {
        let realm = &token.realm;
        if end.saturating_sub(cursor) < realm.len() + 4 + MAC_LEN {
            return Err(AuthError::buffer_too_small(
                "authentication option buffer too small for realm + secret_id + MAC",
            ));
        }
        let mut encoder = EncoderBuffer::new(&mut message[cursor..end]);
        encoder.encode(&realm.as_slice());
        cursor += realm.len();
    }

    if end.saturating_sub(cursor) < 4 + MAC_LEN {
        return Err(AuthError::buffer_too_small(
            "authentication option buffer too small for secret_id + MAC",
        ));
    }
    {
        let mut encoder = EncoderBuffer::new(&mut message[cursor..end]);
        encoder.encode(&token.secret_id);
    }
    cursor += 4;

    let mac_start = cursor;
    {
        let mut encoder = EncoderBuffer::new(&mut message[mac_start..end]);
        encoder.write_repeated(end - mac_start, 0);
    }

    let saved_v4 = (variant == MessageVariant::V4).then(|| crate::message::v4_zero_header_fields(message));

    let mac = hmac_md5(token.key(), message);
    message[mac_start..mac_start + MAC_LEN].copy_from_slice(&mac);

    if let Some((hops, giaddr)) = saved_v4 {
        crate::message::v4_restore_header_fields(message, hops, giaddr);
    }

    Ok(end - (mac_start + MAC_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Algorithm, AuthOptions, ReplayDetectionMethod};
    use crate::token::{Token, TokenConfig, TokenStore};

    fn zero_secret_store(key: &[u8]) -> TokenStore {
        TokenStore::from_configs([TokenConfig {
            secret_id: 0,
            realm: Vec::new(),
            key: key.to_vec(),
            expire: None,
        }])
        .unwrap()
    }

    #[test]
    fn size_query_accounts_for_protocol_overhead() {
        let token = Token::new(0, Vec::new(), vec![0u8; 6], None);
        let policy = AuthPolicy::new(
            AuthProtocol::Token,
            Algorithm::HmacMd5,
            ReplayDetectionMethod::Monotonic,
            AuthOptions::SEND,
        );
        assert_eq!(encoded_size(&policy, &token), 11 + 6);

        let delayed = AuthPolicy::new(
            AuthProtocol::Delayed,
            Algorithm::HmacMd5,
            ReplayDetectionMethod::Monotonic,
            AuthOptions::SEND,
        );
        assert_eq!(encoded_size(&delayed, &token), 11 + 4 + 16);
    }

    #[test]
    fn emits_token_protocol_option_and_round_trips_through_validate() {
        let store = zero_secret_store(b"sharedsecret");
        let policy = AuthPolicy::new(
            AuthProtocol::Token,
            Algorithm::HmacMd5,
            ReplayDetectionMethod::Monotonic,
            AuthOptions::SEND,
        );
        let token = store.default_token().unwrap();

        let dir = std::env::temp_dir().join(format!(
            "dhcp-auth-encoder-test-{}-{}",
            std::process::id(),
            line!()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let counter = ReplayCounter::new(dir.join("replay.counter"));

        let option_len = encoded_size(&policy, token);
        let mut message = vec![0u8; 20 + option_len];
        let option_offset = 20;

        let leftover = encode(
            &policy,
            Some(token),
            &store,
            &counter,
            &mut message,
            MessageVariant::V4,
            MessageType::Other,
            option_offset,
            option_len,
        )
        .unwrap();
        assert_eq!(leftover, 0);

        let mut state = crate::state::AuthState::new();
        let result = crate::validator::validate(
            &mut state,
            &policy,
            &store,
            &message,
            MessageVariant::V4,
            MessageType::Other,
            option_offset,
            option_len,
        );
        assert!(result.is_ok());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn token_none_auto_selects_the_default_secret_from_the_store() {
        let store = zero_secret_store(b"sharedsecret");
        let policy = AuthPolicy::new(
            AuthProtocol::Token,
            Algorithm::HmacMd5,
            ReplayDetectionMethod::Monotonic,
            AuthOptions::SEND,
        );
        let option_len = encoded_size(&policy, store.default_token().unwrap());
        let mut message = vec![0u8; 20 + option_len];
        let option_offset = 20;

        let dir = std::env::temp_dir().join(format!(
            "dhcp-auth-encoder-test-autoselect-{}-{}",
            std::process::id(),
            line!()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let counter = ReplayCounter::new(dir.join("replay.counter"));

        let leftover = encode(
            &policy,
            None,
            &store,
            &counter,
            &mut message,
            MessageVariant::V4,
            MessageType::Other,
            option_offset,
            option_len,
        )
        .unwrap();
        assert_eq!(leftover, 0);
        assert_eq!(&message[option_offset + 11..], b"sharedsecret");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn token_none_without_a_default_secret_is_malformed() {
        let store = TokenStore::new();
        let policy = AuthPolicy::new(
            AuthProtocol::Token,
            Algorithm::HmacMd5,
            ReplayDetectionMethod::Monotonic,
            AuthOptions::SEND,
        );
        let mut message = vec![0u8; 20 + 11];

        let dir = std::env::temp_dir().join(format!(
            "dhcp-auth-encoder-test-autoselect-missing-{}-{}",
            std::process::id(),
            line!()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let counter = ReplayCounter::new(dir.join("replay.counter"));

        let result = encode(
            &policy,
            None,
            &store,
            &counter,
            &mut message,
            MessageVariant::V4,
            MessageType::Other,
            20,
            11,
        );
        assert_eq!(
            result.unwrap_err().kind,
            crate::error::AuthErrorKind::Malformed
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn capability_only_message_types_skip_the_mac() {
        let store = zero_secret_store(b"sharedsecret");
        let policy = AuthPolicy::new(
            AuthProtocol::Delayed,
            Algorithm::HmacMd5,
            ReplayDetectionMethod::Monotonic,
            AuthOptions::SEND,
        );
        let token = store.find(0, b"").unwrap();

        let dir = std::env::temp_dir().join(format!(
            "dhcp-auth-encoder-test-cap-{}-{}",
            std::process::id(),
            line!()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let counter = ReplayCounter::new(dir.join("replay.counter"));

        let mut message = vec![0u8; 20 + 11];
        let leftover = encode(
            &policy,
            Some(token),
            &store,
            &counter,
            &mut message,
            MessageVariant::V4,
            MessageType::Discover,
            20,
            11,
        )
        .unwrap();
        assert_eq!(leftover, 0);
        assert_eq!(message[20], AuthProtocol::Delayed.as_u8());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_undersized_buffer() {
        let token = Token::new(0, Vec::new(), vec![0u8; 6], None);
        let store = TokenStore::new();
        let policy = AuthPolicy::new(
            AuthProtocol::Token,
            Algorithm::HmacMd5,
            ReplayDetectionMethod::Monotonic,
            AuthOptions::SEND,
        );
        let dir = std::env::temp_dir().join(format!(
            "dhcp-auth-encoder-test-small-{}-{}",
            std::process::id(),
            line!()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let counter = ReplayCounter::new(dir.join("replay.counter"));

        let mut message = vec![0u8; 30];
        let result = encode(
            &policy,
            Some(&token),
            &store,
            &counter,
            &mut message,
            MessageVariant::V4,
            MessageType::Other,
            20,
            5,
        );
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}

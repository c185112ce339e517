// SPDX-License-Identifier: Apache-2.0

//! Tagged-variant decode of the authentication option's protocol-specific
//! payload (§9 design note: "the 'realm present?' decision moves from
//! control-flow to data shape").

use wire_codec::DecoderBuffer;

use crate::error::AuthError;
use crate::mac::MAC_LEN;
use crate::policy::AuthProtocol;

/// A decoded, not-yet-verified candidate, borrowing from the option
/// payload. Each variant carries exactly the fields its protocol
/// defines; there is no shared "secret_id" field threaded through
/// unrelated variants by convention.
#[derive(Debug)]
pub enum Candidate<'a> {
    /// TOKEN: the remaining bytes are the candidate shared secret itself.
    Token { key: &'a [u8] },
    /// DELAYED: a looked-up secret plus a trailing computed MAC.
    Delayed { secret_id: u32, mac: [u8; MAC_LEN] },
    /// DELAYED_REALM: as DELAYED, with a realm scoping the secret id.
    DelayedRealm {
        realm: &'a [u8],
        secret_id: u32,
        mac: [u8; MAC_LEN],
    },
    /// RECONF_KEY: a one-byte subtype plus, for key delivery, a raw key.
    ReconfKey(ReconfPayload),
}

#[derive(Debug)]
pub enum ReconfPayload {
    /// Subtype 1: key delivery.
    Deliver { key: [u8; MAC_LEN] },
    /// Subtype 2: reconfigure request, authenticated like DELAYED but
    /// against the previously delivered reconfigure key.
    Request { mac: [u8; MAC_LEN] },
}

fn fixed_mac(bytes: &[u8]) -> [u8; MAC_LEN] {
    let mut mac = [0u8; MAC_LEN];
    mac.copy_from_slice(bytes);
    mac
}

/// Parses `payload` (the bytes of the authentication option following
/// the 11-byte protocol/algorithm/rdm/replay header) according to
/// `protocol`, per spec §4.1's per-protocol length rules, using
/// `wire-codec`'s `DecoderBuffer` the way the enclosing packet framer
/// reads its own fixed-width fields.
pub fn parse<'a>(protocol: AuthProtocol, payload: &'a [u8]) -> Result<Candidate<'a>, AuthError> {
    let bad_length = |reason: &'static str| move |_| AuthError::malformed(reason);

    match protocol {
        AuthProtocol::Token => Ok(Candidate::Token { key: payload }),

        AuthProtocol::Delayed => {
            if payload.len() < 4 + MAC_LEN {
                return Err(AuthError::malformed(
                    "DELAYED payload shorter than secret_id + MAC",
                ));
            }
            let buffer = DecoderBuffer::new(payload);
            let (secret_id, buffer) = buffer
                .decode::<u32>()
                .map_err(bad_length("DELAYED payload has a malformed secret_id"))?;
            let (mac_slice, buffer) = buffer
                .decode_slice(MAC_LEN)
                .map_err(bad_length("DELAYED payload has unexpected length"))?;
            buffer
                .ensure_empty()
                .map_err(bad_length("DELAYED payload has trailing bytes"))?;
            Ok(Candidate::Delayed {
                secret_id,
                mac: fixed_mac(mac_slice.into_less_safe_slice()),
            })
        }

        AuthProtocol::DelayedRealm => {
            if payload.len() < 4 + MAC_LEN {
                return Err(AuthError::malformed(
                    "DELAYED_REALM payload shorter than secret_id + MAC",
                ));
            }
            let realm_len = payload.len() - 4 - MAC_LEN;
            let buffer = DecoderBuffer::new(payload);
            let (realm, buffer) = buffer
                .decode_slice(realm_len)
                .map_err(bad_length("DELAYED_REALM payload has a malformed realm"))?;
            let (secret_id, buffer) = buffer
                .decode::<u32>()
                .map_err(bad_length("DELAYED_REALM payload has a malformed secret_id"))?;
            let (mac_slice, buffer) = buffer
                .decode_slice(MAC_LEN)
                .map_err(bad_length("DELAYED_REALM payload has unexpected length"))?;
            buffer
                .ensure_empty()
                .map_err(bad_length("DELAYED_REALM payload has trailing bytes"))?;
            Ok(Candidate::DelayedRealm {
                realm: realm.into_less_safe_slice(),
                secret_id,
                mac: fixed_mac(mac_slice.into_less_safe_slice()),
            })
        }

        AuthProtocol::ReconfKey => {
            if payload.len() != 1 + MAC_LEN {
                return Err(AuthError::malformed(
                    "RECONF_KEY payload must be exactly type + 16-byte key",
                ));
            }
            let buffer = DecoderBuffer::new(payload);
            let (subtype, buffer) = buffer
                .decode::<u8>()
                .map_err(bad_length("RECONF_KEY payload has a malformed subtype"))?;
            let (key_slice, buffer) = buffer
                .decode_slice(MAC_LEN)
                .map_err(bad_length("RECONF_KEY payload has unexpected length"))?;
            buffer
                .ensure_empty()
                .map_err(bad_length("RECONF_KEY payload has trailing bytes"))?;
            let key = fixed_mac(key_slice.into_less_safe_slice());
            match subtype {
                1 => Ok(Candidate::ReconfKey(ReconfPayload::Deliver { key })),
                2 => Ok(Candidate::ReconfKey(ReconfPayload::Request { mac: key })),
                _ => Err(AuthError::malformed("unknown RECONF_KEY subtype")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_payload_as_opaque_key() {
        let payload = [1, 2, 3, 4];
        match parse(AuthProtocol::Token, &payload).unwrap() {
            Candidate::Token { key } => assert_eq!(key, &payload),
            other => panic!("unexpected candidate: {other:?}"),
        }
    }

    #[test]
    fn parses_delayed_secret_id_and_mac() {
        let mut payload = vec![0, 0, 0, 7];
        payload.extend_from_slice(&[0xaa; MAC_LEN]);
        match parse(AuthProtocol::Delayed, &payload).unwrap() {
            Candidate::Delayed { secret_id, mac } => {
                assert_eq!(secret_id, 7);
                assert_eq!(mac, [0xaa; MAC_LEN]);
            }
            other => panic!("unexpected candidate: {other:?}"),
        }
    }

    #[test]
    fn delayed_rejects_short_payload() {
        let payload = [0u8; 4];
        assert!(parse(AuthProtocol::Delayed, &payload).is_err());
    }

    #[test]
    fn parses_delayed_realm_splits_leading_realm_bytes() {
        let mut payload = b"example.org".to_vec();
        payload.extend_from_slice(&[0, 0, 0, 9]);
        payload.extend_from_slice(&[0xbb; MAC_LEN]);
        match parse(AuthProtocol::DelayedRealm, &payload).unwrap() {
            Candidate::DelayedRealm {
                realm,
                secret_id,
                mac,
            } => {
                assert_eq!(realm, b"example.org");
                assert_eq!(secret_id, 9);
                assert_eq!(mac, [0xbb; MAC_LEN]);
            }
            other => panic!("unexpected candidate: {other:?}"),
        }
    }

    #[test]
    fn reconf_key_requires_exact_length_and_known_subtype() {
        let mut deliver = vec![1];
        deliver.extend_from_slice(&[0xcc; MAC_LEN]);
        assert!(matches!(
            parse(AuthProtocol::ReconfKey, &deliver).unwrap(),
            Candidate::ReconfKey(ReconfPayload::Deliver { .. })
        ));

        let mut request = vec![2];
        request.extend_from_slice(&[0xdd; MAC_LEN]);
        assert!(matches!(
            parse(AuthProtocol::ReconfKey, &request).unwrap(),
            Candidate::ReconfKey(ReconfPayload::Request { .. })
        ));

        let mut bad = vec![3];
        bad.extend_from_slice(&[0xee; MAC_LEN]);
        assert!(parse(AuthProtocol::ReconfKey, &bad).is_err());

        assert!(parse(AuthProtocol::ReconfKey, &[1, 2, 3]).is_err());
    }
}

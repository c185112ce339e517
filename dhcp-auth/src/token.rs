// SPDX-License-Identifier: Apache-2.0

//! Authentication keys and the store that holds them.
//!
//! Modeled on `s2n_quic_core::stateless_reset::token::Token`: a small
//! fixed-shape secret, compared in constant time, plus a lookup table
//! keyed on the fields the wire format actually carries.

use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use zeroize::Zeroize;

/// A shared secret identified by `secret_id` and an opaque realm.
///
/// `realm` is a byte string, not necessarily UTF-8 (RFC 3118 doesn't
/// constrain its encoding). `key` is scrubbed from memory on drop;
/// `Debug` never prints it.
pub struct Token {
    pub secret_id: u32,
    pub realm: Vec<u8>,
    key: Vec<u8>,
    pub expire: Option<SystemTime>,
}

impl Token {
    #[inline]
    pub fn new(secret_id: u32, realm: Vec<u8>, key: Vec<u8>, expire: Option<SystemTime>) -> Self {
        Self {
            secret_id,
            realm,
            key,
            expire,
        }
    }

    #[inline]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// `true` once `expire` has passed relative to `now`.
    #[inline]
    pub fn is_expired(&self, now: SystemTime) -> bool {
        matches!(self.expire, Some(expire) if now >= expire)
    }
}

impl Drop for Token {
    #[inline]
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl core::fmt::Debug for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Token")
            .field("secret_id", &self.secret_id)
            .field("realm", &self.realm)
            .field("key", &"<redacted>")
            .field("expire", &self.expire)
            .finish()
    }
}

/// The serializable shape of a [`Token`], the only surface this crate
/// exposes for constructing tokens from configuration. Parsing the
/// configuration file or CLI itself is outside this crate's scope; the
/// caller deserializes a `TokenConfig` however it likes and hands it to
/// [`TokenStore::from_configs`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenConfig {
    pub secret_id: u32,
    #[serde(default)]
    pub realm: Vec<u8>,
    pub key: Vec<u8>,
    /// An RFC 3339 UTC timestamp (`"2026-07-27T00:00:00Z"`), or absent
    /// for a token that never expires.
    #[serde(default)]
    pub expire: Option<String>,
}

impl TokenConfig {
    fn into_token(self) -> core::result::Result<Token, AuthError> {
        let expire = self
            .expire
            .as_deref()
            .map(parse_rfc3339_utc)
            .transpose()?
            .map(|secs| SystemTime::UNIX_EPOCH + core::time::Duration::from_secs(secs));
        Ok(Token::new(self.secret_id, self.realm, self.key, expire))
    }
}

/// Parses the narrow `YYYY-MM-DDTHH:MM:SSZ` subset of RFC 3339 used by
/// [`TokenConfig::expire`], without pulling in a full `humantime`
/// dependency for one conversion.
fn parse_rfc3339_utc(s: &str) -> core::result::Result<u64, AuthError> {
    let bad = || AuthError::malformed("token expire is not a valid RFC 3339 UTC timestamp");

    let s = s.strip_suffix('Z').ok_or_else(bad)?;
    let (date, time) = s.split_once('T').ok_or_else(bad)?;

    let mut date_parts = date.split('-');
    let year: i64 = date_parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let month: u32 = date_parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let day: u32 = date_parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    if date_parts.next().is_some() {
        return Err(bad());
    }

    let mut time_parts = time.split(':');
    let hour: u64 = time_parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let minute: u64 = time_parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let second: u64 = time_parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    if time_parts.next().is_some() {
        return Err(bad());
    }

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) || hour >= 24 || minute >= 60 || second >= 60 {
        return Err(bad());
    }

    // Days since the epoch via the civil_from_days inverse (Howard Hinnant's
    // algorithm), valid for the proleptic Gregorian calendar.
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as i64;
    let mp = (month as i64 + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    let days_since_epoch = era * 146097 + doe - 719468;

    let days_secs = days_since_epoch.checked_mul(86_400).ok_or_else(bad)?;
    let day_secs = u64::try_from(days_secs).map_err(|_| bad())?;
    Ok(day_secs + hour * 3600 + minute * 60 + second)
}

/// A lookup table of [`Token`]s keyed by `(secret_id, realm)`.
///
/// Linear scan: token sets in this protocol are small (a handful of
/// active secrets per client), so no index is warranted.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: Vec<Token>,
}

impl TokenStore {
    #[inline]
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn from_configs(
        configs: impl IntoIterator<Item = TokenConfig>,
    ) -> core::result::Result<Self, AuthError> {
        let tokens = configs
            .into_iter()
            .map(TokenConfig::into_token)
            .collect::<core::result::Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }

    #[inline]
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Finds the token matching `secret_id` and `realm` (empty realms
    /// match only empty).
    pub fn find(&self, secret_id: u32, realm: &[u8]) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|token| token.secret_id == secret_id && token.realm == realm)
    }

    /// The unique token with `secret_id == 0` and an empty realm, used as
    /// the default TOKEN-protocol secret when the caller selects no
    /// explicit token.
    pub fn default_token(&self) -> Option<&Token> {
        self.find(0, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_finds_by_secret_id_and_realm() {
        let store = TokenStore::from_configs([
            TokenConfig {
                secret_id: 1,
                realm: Vec::new(),
                key: vec![0xaa],
                expire: None,
            },
            TokenConfig {
                secret_id: 2,
                realm: b"example.org".to_vec(),
                key: vec![0xbb],
                expire: None,
            },
        ])
        .unwrap();

        assert!(store.find(1, b"").is_some());
        assert!(store.find(2, b"example.org").is_some());
        assert!(store.find(2, b"").is_none());
        assert!(store.find(3, b"").is_none());
    }

    #[test]
    fn default_token_requires_zero_secret_id_and_empty_realm() {
        let store = TokenStore::from_configs([TokenConfig {
            secret_id: 0,
            realm: Vec::new(),
            key: vec![0xaa],
            expire: None,
        }])
        .unwrap();
        assert!(store.default_token().is_some());
    }

    #[test]
    fn expiry_is_relative_to_now() {
        let token = Token::new(
            1,
            Vec::new(),
            vec![0u8],
            Some(SystemTime::UNIX_EPOCH + core::time::Duration::from_secs(100)),
        );
        assert!(!token.is_expired(SystemTime::UNIX_EPOCH + core::time::Duration::from_secs(50)));
        assert!(token.is_expired(SystemTime::UNIX_EPOCH + core::time::Duration::from_secs(150)));
    }

    #[test]
    fn parses_rfc3339_utc_timestamp() {
        // 2020-01-01T00:00:00Z is a known fixed point: 1577836800.
        assert_eq!(parse_rfc3339_utc("2020-01-01T00:00:00Z").unwrap(), 1_577_836_800);
    }

    #[test]
    fn rejects_malformed_timestamp() {
        assert!(parse_rfc3339_utc("not-a-date").is_err());
        assert!(parse_rfc3339_utc("2020-01-01T00:00:00").is_err());
        assert!(parse_rfc3339_utc("2020-13-01T00:00:00Z").is_err());
    }
}

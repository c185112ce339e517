// SPDX-License-Identifier: Apache-2.0

//! Per-session authentication state: the pinned token identity, the
//! replay high-water mark, and an optionally negotiated reconfigure key.

use crate::token::Token;

/// The `(secret_id, realm)` identity of a pinned token. `AuthState` does
/// not own the `Token` itself — tokens live in the caller's
/// [`crate::token::TokenStore`] for the process lifetime — it only
/// remembers which one it has pinned to, and [`crate::validator::validate`]
/// re-resolves the identity against the store on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenId {
    pub secret_id: u32,
    pub realm: Vec<u8>,
}

/// Mutable per server-client binding state.
///
/// Invariants upheld by [`crate::validator::validate`], never by this
/// type directly (it is plain data, mutated only through `validate`'s
/// success path):
/// - once `pinned` is set, it is never replaced by a *different*
///   identity;
/// - `replay` is monotonically non-decreasing;
/// - if `reconf` is set, its realm is empty and its key is 16 bytes.
#[derive(Debug, Default)]
pub struct AuthState {
    pinned: Option<TokenId>,
    replay: u64,
    reconf: Option<Token>,
}

impl AuthState {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn pinned(&self) -> Option<&TokenId> {
        self.pinned.as_ref()
    }

    #[inline]
    pub fn replay(&self) -> u64 {
        self.replay
    }

    #[inline]
    pub fn reconf(&self) -> Option<&Token> {
        self.reconf.as_ref()
    }

    /// `true` once a token identity has been pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// Returns `true` if `secret_id`/`realm` identifies the already
    /// pinned token, or no token is pinned yet.
    #[inline]
    pub(crate) fn pin_allows(&self, secret_id: u32, realm: &[u8]) -> bool {
        match &self.pinned {
            Some(pinned) => pinned.secret_id == secret_id && pinned.realm == realm,
            None => true,
        }
    }

    /// Records a successful validation. Only called by
    /// [`crate::validator::validate`] on its success path.
    pub(crate) fn commit(&mut self, replay: u64, secret_id: u32, realm: Vec<u8>) {
        self.replay = replay;
        self.pinned = Some(TokenId { secret_id, realm });
    }

    /// Records a delivered reconfigure key (RECONF_KEY type 1).
    pub(crate) fn set_reconf(&mut self, key: Token) {
        self.reconf = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_accepts_any_pin() {
        let state = AuthState::new();
        assert!(!state.is_pinned());
        assert!(state.pin_allows(7, b"realm"));
    }

    #[test]
    fn pinned_state_rejects_other_identities() {
        let mut state = AuthState::new();
        state.commit(42, 1, Vec::new());

        assert!(state.is_pinned());
        assert!(state.pin_allows(1, b""));
        assert!(!state.pin_allows(2, b""));
        assert_eq!(state.replay(), 42);
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Keyed-MAC computation and constant-time comparison.
//!
//! The digest itself is delegated to the `hmac`/`md-5` crates (MAC
//! primitives are an explicit non-goal of this crate); the constant-time
//! compare mirrors `s2n_quic_core::stateless_reset::token::Token`'s use
//! of `subtle::ConstantTimeEq`.

use hmac::{Hmac, Mac};
use md5::Md5;
use subtle::ConstantTimeEq;

pub const MAC_LEN: usize = 16;

type HmacMd5 = Hmac<Md5>;

/// Computes `HMAC_MD5(key, message)`, per RFC 3118 §4 / RFC 3315 §21.3.
///
/// `key` of any length is accepted; `hmac` handles the
/// key-block-padding per RFC 2104 internally.
pub fn hmac_md5(key: &[u8], message: &[u8]) -> [u8; MAC_LEN] {
    let mut mac = <HmacMd5 as Mac>::new_from_slice(key)
        .expect("HMAC accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Constant-time comparison of two MAC (or raw key) values. Returns
/// `false` on length mismatch without a timing-sensitive short-circuit
/// on content, matching `subtle`'s guidance of comparing only
/// same-length buffers.
#[inline]
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 2202 test case 1.
    #[test]
    fn hmac_md5_matches_rfc2202_vector() {
        let key = [0x0bu8; 16];
        let data = b"Hi There";
        let expected = [
            0x92, 0x94, 0x72, 0x7a, 0x36, 0x38, 0xbb, 0x1c, 0x13, 0xf4, 0x8e, 0xf8, 0x15, 0x8b,
            0xfc, 0x9d,
        ];
        assert_eq!(hmac_md5(&key, data), expected);
    }

    #[test]
    fn ct_eq_matches_equal_slices() {
        assert!(ct_eq(b"abc", b"abc"));
        assert!(!ct_eq(b"abc", b"abd"));
        assert!(!ct_eq(b"abc", b"ab"));
    }
}

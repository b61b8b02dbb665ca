//! Hash bucketing of caller tokens onto users.
//!
//! [`IdentityResolver`] does not authenticate or look anything up. Every
//! caller token, including tokens that never belonged to a real account and
//! the empty string, lands on exactly one member of the [`UserUniverse`]:
//!
//! ```text
//! user = 1 + (SHA-1(utf8(token)) as big-endian integer) mod N
//! ```
//!
//! The 160-bit digest is reduced one byte at a time in `u128` arithmetic.
//! Since `N` fits in a `u64`, the running remainder shifted left by eight bits
//! always fits in 72 bits, and the result is identical to reducing the full
//! digest as a big integer.

use crate::{UserId, UserUniverse};
use sha1::{Digest, Sha1};

/// Deterministic, uniform mapping from caller tokens to [`UserId`]s.
#[derive(Clone, Copy, Debug)]
pub struct IdentityResolver {
    universe: UserUniverse,
}

impl IdentityResolver {
    pub const fn new(universe: UserUniverse) -> Self {
        Self { universe }
    }

    pub const fn universe(&self) -> UserUniverse {
        self.universe
    }

    /// Resolves `token` to a member of the universe.
    ///
    /// Total over all strings: the same token always yields the same user for
    /// a given universe size.
    pub fn resolve(&self, token: &str) -> UserId {
        let digest = Sha1::digest(token.as_bytes());
        let n = u128::from(self.universe.len().get());
        let remainder = digest
            .iter()
            .fold(0_u128, |acc, &byte| ((acc << 8) | u128::from(byte)) % n);
        // remainder < n <= u64::MAX
        self.universe.from_remainder(remainder as u64)
    }
}

use crate::{Error, Result};
use core::fmt;
use core::num::NonZeroU64;

/// Internal user key in `1..=N`, where `N` is the size of the owning
/// [`UserUniverse`].
///
/// Values are only handed out by [`UserUniverse::user`] and
/// [`IdentityResolver`](crate::IdentityResolver), so a `UserId` obtained from
/// a universe is always a member of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(NonZeroU64);

impl UserId {
    /// The raw 1-based key.
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Zero-based position of this user, for row-indexed model storage.
    pub const fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The immutable set of known users, `1..=N`.
///
/// Established once at startup by whoever built the ranking model and never
/// renumbered afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserUniverse {
    size: NonZeroU64,
}

impl UserUniverse {
    /// Creates a universe of `size` users.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyUniverse`] when `size` is zero.
    pub fn new(size: u64) -> Result<Self> {
        NonZeroU64::new(size)
            .map(|size| Self { size })
            .ok_or(Error::EmptyUniverse)
    }

    /// Number of users, `N`.
    pub const fn len(&self) -> NonZeroU64 {
        self.size
    }

    /// Returns the user with the given 1-based key, if it is a member.
    pub fn user(&self, key: u64) -> Option<UserId> {
        NonZeroU64::new(key)
            .filter(|k| *k <= self.size)
            .map(UserId)
    }

    pub fn contains(&self, user: UserId) -> bool {
        user.0 <= self.size
    }

    /// Iterates over every member in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = UserId> + use<> {
        (1..=self.size.get()).filter_map(NonZeroU64::new).map(UserId)
    }

    /// Maps a remainder in `0..N` onto the member `remainder + 1`.
    ///
    /// Callers guarantee `remainder < N`.
    pub(crate) fn from_remainder(&self, remainder: u64) -> UserId {
        debug_assert!(remainder < self.size.get());
        // `remainder + 1` is at least 1 and at most N, so never zero.
        UserId(NonZeroU64::MIN.saturating_add(remainder))
    }
}

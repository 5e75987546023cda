//! Session numbering for transmitted frames.
//!
//! Every frame travels as one session. Session numbers occupy a single header
//! byte and wrap from `255` back to `0`, so they only disambiguate frames that
//! are close together in time.

use derive_more::{Display, From, Into};

/// Eight-bit, wrapping identifier of one frame transmission.
///
/// # Examples
///
/// ```
/// use slicecast::fragment::SessionId;
/// let id = SessionId::new(255);
/// assert_eq!(id.next(), SessionId::new(0));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, From, Into)]
#[display("{_0}")]
pub struct SessionId(u8);

impl SessionId {
    /// Create a session identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self { Self(value) }

    /// Return the raw header byte.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }

    /// Return the following session number, wrapping after `255`.
    #[must_use]
    pub const fn next(self) -> Self { Self(self.0.wrapping_add(1)) }
}

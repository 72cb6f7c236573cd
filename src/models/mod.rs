//! Domain models for notekeeper.
//!
//! - [`Note`]: a short text note addressed by a unique, immutable slug and
//!   owned by exactly one [`User`].
//! - [`User`]: an account that signs in and owns notes.
//! - [`FormErrors`]: field-level validation messages returned for rejected
//!   form submissions.

mod form;
mod note;
mod user;

pub use form::*;
pub use note::*;
pub use user::*;

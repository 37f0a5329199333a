//! Request decoration: attach the broker's `Authorization` header to outbound requests.
//!
//! Decoration is a pure step. It never triggers an acquisition, so callers acquire first and
//! thread the resulting [`Acquisition`](crate::flows::Acquisition) into [`decorate`].

pub mod request_signer;

pub use request_signer::*;

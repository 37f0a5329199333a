//! Cached token values and the redacting secret wrapper they are built from.

pub mod cached;
pub mod secret;

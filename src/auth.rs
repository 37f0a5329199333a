//! Auth-domain cache keys and token models.

pub mod key;
pub mod token;

pub use key::*;
pub use token::{cached::*, secret::*};

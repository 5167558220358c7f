//! Data models for the travel back-office.
//!
//! Every entity serializes with camelCase field names, matching the JSON
//! stored under its list key.

mod promo;
mod review;
mod session;
mod social;
mod stats;
pub(crate) mod user;

pub use promo::*;
pub use review::*;
pub use session::*;
pub use social::*;
pub use stats::*;
pub use user::*;

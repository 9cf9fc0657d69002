//! Slaw value model: immutable, self-describing, recursively-typed
//! values, the protein envelope built from them, and a lossless tagged
//! JSON text codec.
//!
//! A slaw is frozen at construction. Handles are cheap to clone and safe
//! to share across threads; every edit operation returns a new slaw.

mod algebra;
mod emit;
mod error;
mod json;
mod numeric;
mod protein;
mod slaw;
mod tag;

pub use emit::Emitted;
pub use error::SlawError;
pub use numeric::{Numeric, Vector};
pub use protein::{Origin, Protein};
pub use slaw::Slaw;
pub use tag::{NumTag, TagSpec, TypeTag};

//! Hashid encoding of numeric keys and the entity-side plumbing around it.

mod codec;
mod entity;
mod filter;

pub use codec::HashidCodec;
pub use entity::HasHashid;
pub use filter::{scope_hashid, HashidFilter};

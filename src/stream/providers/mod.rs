//! Video host resolvers

pub mod generic;
pub mod rumble;

pub use generic::IdentityResolver;
pub use rumble::RumbleResolver;

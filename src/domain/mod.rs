//! Domain layer containing the relay's pure logic and types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identifiers, errors)
//! - `relay` - Channel naming, envelope codec, packets and room membership

pub mod foundation;
pub mod relay;

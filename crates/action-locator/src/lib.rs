//! L3 Locator & Self-heal - Fallback element resolution
//!
//! This crate implements element location and healing support:
//! - Primary selector resolution with a bounded wait
//! - Ordered fallback chain, stopping at the first hit
//! - Healing oracle capability with strict validation of its suggestions

pub mod errors;
pub mod healer;
pub mod resolver;
pub mod types;

pub use errors::*;
pub use healer::*;
pub use resolver::*;
pub use types::*;

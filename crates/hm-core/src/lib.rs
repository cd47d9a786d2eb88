//! haymarket/crates/hm-core/src/lib.rs
//!
//! The central domain logic and interface definitions for the Haymarket
//! Woodshop catalog: filter URL codec, product projection, and the ports
//! plugins implement.

pub mod catalog;
pub mod contact;
pub mod error;
pub mod filters;
pub mod models;
pub mod money;
pub mod projection;
pub mod traits;

// Re-exporting for easier access in other crates
pub use catalog::*;
pub use contact::*;
pub use error::*;
pub use filters::*;
pub use models::*;
pub use money::*;
pub use projection::*;
pub use traits::*;

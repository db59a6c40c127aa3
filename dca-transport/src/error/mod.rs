//! Error types

mod api;
mod transport;

pub use api::*;
pub use transport::*;

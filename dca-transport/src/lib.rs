//! DCA API transport
//!
//! One shared async client for the DCA backend: credential injection,
//! request timeouts as cancellation handles, precision-preserving body
//! decoding and status-envelope interpretation.

pub mod body;
pub mod cancel;
pub mod error;
pub mod interceptor;
pub mod navigate;
pub mod storage;

mod client;
mod config;
mod credentials;
mod envelope;
mod request;
mod response;

pub use body::ResponseBody;
pub use cancel::CancelHandle;
pub use cancel::CancelReason;
pub use client::*;
pub use config::TransportConfig;
pub use credentials::CredentialProvider;
pub use credentials::StaticCredentials;
pub use envelope::Envelope;
pub use error::ApiCode;
pub use error::Error;
pub use navigate::Navigator;
pub use request::RequestConfig;
pub use response::HttpResponse;

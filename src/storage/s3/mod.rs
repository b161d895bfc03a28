//! S3-compatible bucket storage
//!
//! Requests are signed with AWS Signature V4 over reqwest; no SDK is used.

pub mod client;
pub mod objects;
pub mod post_policy;
pub mod provider;
pub mod signer;

pub use client::Client;
pub use provider::S3Storage;

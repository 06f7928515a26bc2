//! # Service Layer
//!
//! The transaction submitter, composing the RPC port with the domain
//! codecs.

pub mod submitter;

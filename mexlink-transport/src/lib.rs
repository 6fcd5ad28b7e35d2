//! # mexlink Transport
//!
//! Network transport layer for the matching-engine protocol.
//!
//! This crate provides:
//! - [`tcp::FrameCodec`] - length-prefixed, type-tagged stream framing
//! - [`tcp::TcpClient`] - outbound connection with socket tuning
//! - [`tcp::TcpServer`] - listener used by engine simulators and tests

pub mod error;
pub mod tcp;

pub use error::TransportError;

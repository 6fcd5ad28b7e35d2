//! TCP transport module.
//!
//! Provides TCP client and server implementations with frame codec.

pub mod client;
pub mod framing;
pub mod server;

pub use client::{FrameReader, TcpClient, TcpClientConfig};
pub use framing::FrameCodec;
pub use server::{TcpConnection, TcpServer, TcpServerConfig};

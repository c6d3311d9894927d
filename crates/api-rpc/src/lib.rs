//! JSON-RPC API Layer
//!
//! Cross-context messaging for Jobsweep: page state, page loads, settings
//! and cache administration over JSON-RPC 2.0 on localhost.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};

//! Demo MCP server with a request-admission shim.
//!
//! Exposes a fixed set of MCP tools/resources/prompts over the streamable
//! HTTP transport, fronted by a thin shim that classifies requests by path,
//! optionally enforces a bearer-token check against an in-memory table, and
//! serves the OAuth-style discovery endpoints MCP clients expect.
//!
//! ## HTTP surface
//!
//! - `GET /.well-known/oauth-protected-resource[/stdio]`
//! - `GET /.well-known/oauth-authorization-server[/stdio]`
//! - `GET /authorize[/stdio]`, `POST /token[/stdio]`, `POST /register[/stdio]`
//! - `ALL /mcp`, `/stdio`, `/config` — MCP transport (`/config` skips auth)
//! - `GET /health`
//!
//! ## Usage
//!
//! ```bash
//! # Serve over HTTP (default, 127.0.0.1:6277)
//! mcp-demo
//!
//! # Require bearer tokens on the MCP paths
//! mcp-demo --require-auth
//!
//! # Serve over stdio instead
//! mcp-demo --stdio
//! ```

pub mod auth;
pub mod config;
pub mod gateway;
pub mod oauth;
pub mod server;

pub use auth::{AuthError, TokenRecord, TokenStore};
pub use config::ServerConfig;
pub use gateway::{AppState, TransportMode, build_router};
pub use server::DemoServer;

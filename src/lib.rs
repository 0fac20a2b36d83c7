//! Model Context Protocol weather tutorial.
//!
//! Two halves share this crate:
//!
//! - the `weather-server` binary exposes the National Weather Service API as
//!   MCP tools ([`service::Weather`]), over stdio or streamable HTTP;
//! - the `weather-client` binary connects to an MCP server and lets an
//!   OpenAI-compatible chat model call its tools ([`relay::Relay`]).

pub mod chat;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod formatters;
pub mod http;
pub mod logging;
pub mod models;
pub mod relay;
pub mod service;
pub mod session;

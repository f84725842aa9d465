//! Inbound adapters: HTTP and WebSocket surfaces driving the domain ports.

pub mod http;
pub mod ws;

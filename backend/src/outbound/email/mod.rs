//! HTTP email delivery adapter.
//!
//! Implements the `EmailSender` port against an HTTP email function. The
//! adapter is deliberately fire-and-forget: one POST per notification, no
//! retry queue, with failures reported back to the delivery service for
//! logging only.

mod http_sender;

pub use http_sender::HttpEmailSender;

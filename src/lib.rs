//! Notify rate limit emulator
//!
//! This crate implements an HTTP intermediary for the GOV.UK Notify
//! send-email API. Requests addressed to a test recipient are answered with
//! a synthetic notification while a per-caller sliding minute window and
//! UTC daily counter are enforced; all other requests are forwarded to the
//! real API and the response relayed.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod notify;
pub mod ratelimit;
pub mod reload;

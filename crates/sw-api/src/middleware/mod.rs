//! Middleware modules
//!
//! Contains the bearer-token gate.

pub mod auth;

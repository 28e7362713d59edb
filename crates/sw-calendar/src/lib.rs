//! sw-calendar: Google Calendar gateway for slotwise
//!
//! Implements [`sw_core::CalendarGateway`] on top of the Calendar v3 REST API.
//!
//! ## Features
//!
//! - Free/busy queries for a single calendar
//! - Timed event creation with attendees
//! - Service-account (RS256 JWT bearer) or static-token authentication
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sw_calendar::GoogleCalendarClient;
//!
//! let config = sw_core::Config::load()?;
//! let gateway = Arc::new(GoogleCalendarClient::from_config(&config.calendar)?);
//! let busy = gateway.free_busy("team@example.com", &window).await?;
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod models;

pub use auth::{
    MissingCredentials, ServiceAccountKey, ServiceAccountTokenSource, StaticTokenSource,
    TokenSource,
};
pub use client::GoogleCalendarClient;
pub use error::{CalendarError, Result};

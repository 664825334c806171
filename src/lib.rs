//! Statusboard - client engine for a self-hosted uptime dashboard.
//!
//! Polls the status backend, classifies service health, aggregates uptime
//! history into fixed windows, normalizes host resource metrics, and gates
//! admin controls behind a session with CSRF protection.

pub mod client;
pub mod clock;
pub mod config;
pub mod model;
pub mod resources;
pub mod scheduler;
pub mod session;
pub mod status;
pub mod uptime;

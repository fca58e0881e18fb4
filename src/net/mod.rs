//! Networking modules for the REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `http` is the single intercepting client, `types` defines the wire
//! schema, and the remaining modules wrap one endpoint family each.

pub mod auth;
pub mod http;
pub mod notifications;
pub mod projects;
pub mod tasks;
pub mod types;

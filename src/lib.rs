//! Procurement portal backend and API client.
//!
//! The binary serves the REST API (`routes`) over PostgreSQL; `client` is the
//! typed wrapper the portal front-ends use to call it.

pub mod api;
pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;

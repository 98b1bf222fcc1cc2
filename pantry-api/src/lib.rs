//! # Pantry API Server Library
//!
//! HTTP layer of the household inventory service: routing, request
//! extraction, response envelopes and error mapping. Persistence and domain
//! rules live in `pantry-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `envelope`: The `{status, data, errors}` response body
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors with envelope-shaped rejections
//! - `middleware`: Bearer authentication and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;

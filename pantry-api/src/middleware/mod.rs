/// Middleware modules for the API server
///
/// - `auth`: bearer token authentication for the resource routes
/// - `security`: security response headers

pub mod auth;
pub mod security;

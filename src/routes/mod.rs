// # Routes Module
//
// HTTP route handlers, organized by API domain.

/// Health check and monitoring endpoints
pub mod health;

/// Market intelligence endpoints
pub mod intelligence;

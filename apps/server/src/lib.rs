//! Model conversion service library.
//!
//! Accepts uploaded 3D models, converts them with an external tool and keeps
//! the results in a local file repository addressed by derived URLs.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;

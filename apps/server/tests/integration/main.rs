//! Integration tests for the model conversion service.
//!
//! The external converter is replaced by `sh -c` one-liners, so these tests
//! only run on unix hosts.
//!
//! Run with: cargo test --test integration


#[cfg(unix)]
mod convert_tests;
#[cfg(unix)]
mod files_tests;

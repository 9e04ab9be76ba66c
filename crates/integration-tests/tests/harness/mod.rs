//! Shared fixtures for the integration tests
//!
//! Each test binary uses a subset of the harness.
#![allow(dead_code)]

pub mod config;
pub mod mock_auth;
pub mod mock_backend;

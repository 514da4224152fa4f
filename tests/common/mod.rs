//! Shared test utilities for ThyroScan
//!
//! - SQLite-backed stores in a temporary directory
//! - Fixed identities, timestamps and image bytes
//! - A fake analysis service served by axum

pub mod fake_service;
pub mod fixtures;

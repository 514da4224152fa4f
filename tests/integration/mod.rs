//! Integration tests for ThyroScan
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod http_service;
pub mod profile_flow;
pub mod scan_flow;

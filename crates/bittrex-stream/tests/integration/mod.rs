//! Shared fixtures for application tests.

pub mod common;

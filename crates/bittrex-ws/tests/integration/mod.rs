//! Shared fixtures for hub session tests.

pub mod common;

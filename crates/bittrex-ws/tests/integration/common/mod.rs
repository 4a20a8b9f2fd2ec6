#![allow(dead_code)]

pub mod fake_hub;
pub mod fixtures;
pub mod mock_hub;

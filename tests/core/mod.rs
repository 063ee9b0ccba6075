//! Core module tests for:
//! - Unit conversion and unit systems
//! - Series and metadata tables
//! - Model variable references

pub mod frame_tests;
pub mod model_tests;

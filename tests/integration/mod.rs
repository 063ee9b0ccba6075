//! End-to-end tests for:
//! - Mapping renamed tags onto model variables
//! - Unit conversion of whole tables, including gauge columns
//! - Pass-through of unmatched columns and unknown units

pub mod read_data_tests;

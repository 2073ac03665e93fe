//! Integration tests module
//!
//! Contains tests that require a database and test the full API.

mod api_test;

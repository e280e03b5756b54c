//! Test module for query-kit
//!
//! Property-based tests (proptest) and async scenario tests that exercise
//! several modules together. Unit tests live next to the code they test.

pub(crate) mod support;

mod accessor_tests;
mod key_tests;

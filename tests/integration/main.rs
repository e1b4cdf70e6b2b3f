//! Integration test entry point

mod unfurl_tests;

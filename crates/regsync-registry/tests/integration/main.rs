//! Integration tests for regsync-registry
//!
//! Uses wiremock to simulate the registry's REST surface and verifies the
//! HTTP client, error classification, paging, and the hierarchy ensure
//! running end to end over HTTP.

mod common;

mod test_hierarchy;
mod test_list;
mod test_resources;

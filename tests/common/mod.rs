//! Common test utilities for pointcast.
//!
//! This module provides shared utilities for testing the pointcast server.

#![allow(dead_code)]

pub mod assertions;
pub mod http_client;
pub mod test_data;

//! Shared test utilities for conceptweave integration tests.
//!
//! This module provides:
//! - `TestHarness` running the full service against a temp upload directory
//!   and a scripted text generator
//! - Builders for PPTX, DOCX and PDF fixture bytes

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;

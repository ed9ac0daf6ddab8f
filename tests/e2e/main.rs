//! E2E test suite entry point.

mod batch_workflow;
mod fixture;
mod search_workflow;

//! Snapshot tests for user-facing text: error messages and rendered predicates.

mod error_messages;
mod predicates;

//! Consolidated integration tests for certflow-core.
//!
//! One test binary with submodules keeps link time down and shares the
//! fake collaborators in `support`.

mod retrieval;
mod support;
mod verification;

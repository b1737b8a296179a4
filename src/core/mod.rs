// LogSlice - core/mod.rs
//
// Core business logic layer: timestamps, membership, line boundaries and
// extraction planning.
// Must NOT depend on: platform, app, or perform file content I/O.

pub mod boundary;
pub mod discovery;
pub mod membership;
pub mod model;
pub mod plan;
pub mod timestamp;

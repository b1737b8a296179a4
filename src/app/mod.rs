// LogSlice - app/mod.rs
//
// Application layer: extraction orchestration on a worker pool.
// Dependencies: core and platform layers.

pub mod assemble;
pub mod context;
pub mod extract;
pub mod locator;

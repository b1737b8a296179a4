// LogSlice - platform/mod.rs
//
// Platform abstraction layer: segment file I/O and configuration.
// Dependencies: standard library, memmap2, directories, toml.
// Must NOT depend on: core, app.

pub mod config;
pub mod fs;

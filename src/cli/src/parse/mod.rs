//! Parsers for the sub-configurations handed to the build engine.
//!
//! Each parser reads one group of raw flags and produces one typed value from
//! `a3s_build_core`.

pub mod additional_context;
pub mod auth;
pub mod common;
pub mod idmap;
pub mod ignore;
pub mod isolation;
pub mod namespace;
pub mod output;
pub mod platform;
pub mod system;

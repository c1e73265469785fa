//! A3S Build CLI - build configuration resolver.

pub mod build;
pub mod commands;
pub mod output;
pub mod parse;

//! Loads the image targets of a project from `devloop.toml` and admits them into a
//! [`BuildPlan`](plan::BuildPlan): validated, deduplicated and ordered so that dependencies are
//! built first.
//!
//! The target model itself lives in [`devloop_model`], re-exported here as [`model`].

// Enable rustc and Clippy lints that are disabled by default.
// https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html#unused-crate-dependencies
#![warn(unused_crate_dependencies)]
// https://rust-lang.github.io/rust-clippy/stable/index.html
#![warn(clippy::pedantic)]
// This lint is too noisy and enforces a style that reduces readability in many cases.
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod plan;
pub mod target_graph;
mod toml_file;

pub use toml_file::*;

#[doc(inline)]
pub use devloop_model as model;


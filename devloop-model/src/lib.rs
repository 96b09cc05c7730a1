//! Build-target model of devloop: how to produce a container image.
//!
//! An [`ImageTarget`](image_target::ImageTarget) names an image and owns exactly one
//! [`BuildDetails`](build_details::BuildDetails) strategy. The acceleration features (fast builds
//! and live updates) are queried uniformly through
//! [`any_fast_build_info`](image_target::ImageTarget::any_fast_build_info) and
//! [`any_live_update_info`](image_target::ImageTarget::any_live_update_info), which return an
//! empty sentinel instead of failing when a strategy lacks the feature.

// Enable rustc and Clippy lints that are disabled by default.
// https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html#unused-crate-dependencies
#![warn(unused_crate_dependencies)]
// https://rust-lang.github.io/rust-clippy/stable/index.html
#![warn(clippy::pedantic)]
// This lint is too noisy and enforces a style that reduces readability in many cases.
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod build_details;
pub mod cmd;
pub mod image_target;
pub mod live_update;
pub mod reference;
pub mod target;

#[doc(hidden)]
pub mod internals;


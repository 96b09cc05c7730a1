// `image_ref!` expands to a call of this macro in the user's crate, so it has to be reachable
// through `devloop_model` even though it is not part of the public API. A crate cannot name
// `devloop_proc_macros` directly unless it depends on it itself.
pub use devloop_proc_macros::verify_literal;

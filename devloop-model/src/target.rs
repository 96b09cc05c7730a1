use crate::reference::ImageSelector;
use std::fmt::{self, Display, Formatter};

/// Identifies a target within a target set, e.g. `image:gcr.io/foo/bar`.
///
/// Image target IDs are derived from the normalized selector, so `redis` and
/// `docker.io/library/redis` name the same target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(String);

impl TargetId {
    pub fn image(selector: &ImageSelector) -> Self {
        Self(format!("image:{selector}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TargetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

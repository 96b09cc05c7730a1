use serde::Deserialize;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Registry used for references without an explicit domain.
pub const DEFAULT_DOMAIN: &str = "docker.io";
const LEGACY_DEFAULT_DOMAIN: &str = "index.docker.io";
const OFFICIAL_REPOSITORY_PREFIX: &str = "library/";

// Defines the runtime pattern and the `image_ref!` literal macro from a single literal.
macro_rules! reference_pattern {
    ($pattern:literal) => {
        const REFERENCE_PATTERN: &str = $pattern;

        /// Construct an [`ImageRef`] value at compile time.
        ///
        /// Passing a string that is not a valid image reference yields a compilation error.
        ///
        /// # Examples:
        /// ```
        /// use devloop_model::image_ref;
        /// use devloop_model::reference::ImageRef;
        ///
        /// let image: ImageRef = image_ref!("gcr.io/foo/bar:v1");
        /// ```
        #[macro_export]
        macro_rules! image_ref {
            ($value:expr) => {
                $crate::internals::verify_literal!(
                    $value,
                    $pattern,
                    "a valid image reference",
                    $crate::reference::ImageRef::new_unchecked($value)
                )
            };
        }
    };
}

reference_pattern!(
    r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*(?::[0-9]+)?/)?[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*(?:/[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*)*(?::[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,127})?(?:@[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9a-fA-F]{32,})?$"
);

/// A container image reference, e.g. `redis`, `gcr.io/foo/bar:v1` or
/// `localhost:5000/app@sha256:…`.
///
/// The raw value is kept as written. Use [`ImageRef::normalized_name`] and friends for the
/// fully qualified form.
///
/// # Examples
/// ```
/// use devloop_model::reference::ImageRef;
///
/// let image: ImageRef = "redis:7".parse().unwrap();
/// assert_eq!(image.normalized(), "docker.io/library/redis:7");
///
/// let invalid: Result<ImageRef, _> = "Not/A/Reference".parse();
/// assert!(invalid.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ImageRef(String);

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum ImageRefError {
    #[error("Invalid image reference: `{0}`")]
    InvalidValue(String),
}

impl FromStr for ImageRef {
    type Err = ImageRefError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let matches = fancy_regex::Regex::new(REFERENCE_PATTERN)
            .and_then(|regex| regex.is_match(value))
            .unwrap_or(false);

        if matches {
            Ok(Self(String::from(value)))
        } else {
            Err(ImageRefError::InvalidValue(String::from(value)))
        }
    }
}

impl TryFrom<String> for ImageRef {
    type Error = ImageRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl AsRef<str> for ImageRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ImageRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ImageRef {
    /// Wraps a value without validating it, for `image_ref!` only.
    #[doc(hidden)]
    #[must_use]
    pub fn new_unchecked(value: &str) -> Self {
        Self(String::from(value))
    }

    /// The registry part, `docker.io` when the reference has none.
    pub fn domain(&self) -> &str {
        match split_domain(self.name()) {
            (Some(LEGACY_DEFAULT_DOMAIN) | None, _) => DEFAULT_DOMAIN,
            (Some(domain), _) => domain,
        }
    }

    /// The repository path below the domain, including the `library/` prefix of official
    /// images on the default registry.
    pub fn path(&self) -> Cow<'_, str> {
        let (_, remainder) = split_domain(self.name());

        if self.domain() == DEFAULT_DOMAIN && !remainder.contains('/') {
            Cow::Owned(format!("{OFFICIAL_REPOSITORY_PREFIX}{remainder}"))
        } else {
            Cow::Borrowed(remainder)
        }
    }

    pub fn tag(&self) -> Option<&str> {
        let without_digest = self.without_digest();
        let last_component = without_digest
            .rfind('/')
            .map_or(without_digest, |index| &without_digest[index + 1..]);

        last_component.split_once(':').map(|(_, tag)| tag)
    }

    pub fn digest(&self) -> Option<&str> {
        self.0.split_once('@').map(|(_, digest)| digest)
    }

    /// `domain/path`, without tag or digest.
    pub fn normalized_name(&self) -> String {
        format!("{}/{}", self.domain(), self.path())
    }

    /// The fully qualified reference including tag and digest, if present.
    pub fn normalized(&self) -> String {
        let mut normalized = self.normalized_name();

        if let Some(tag) = self.tag() {
            normalized.push(':');
            normalized.push_str(tag);
        }

        if let Some(digest) = self.digest() {
            normalized.push('@');
            normalized.push_str(digest);
        }

        normalized
    }

    /// The shortest form that normalizes back to the same reference, e.g. `redis:7` for
    /// `docker.io/library/redis:7`.
    pub fn familiar(&self) -> String {
        let normalized = self.normalized();
        let Some(rest) = normalized.strip_prefix(&format!("{DEFAULT_DOMAIN}/")) else {
            return normalized;
        };

        String::from(rest.strip_prefix(OFFICIAL_REPOSITORY_PREFIX).unwrap_or(rest))
    }

    fn without_digest(&self) -> &str {
        self.0.split_once('@').map_or(self.0.as_str(), |(name, _)| name)
    }

    fn name(&self) -> &str {
        let without_digest = self.without_digest();

        match self.tag() {
            Some(tag) => &without_digest[..without_digest.len() - tag.len() - 1],
            None => without_digest,
        }
    }
}

// The first component is a domain only if it looks like a hostname; `foo/bar` is a repository
// path on the default registry.
fn split_domain(name: &str) -> (Option<&str>, &str) {
    match name.split_once('/') {
        Some((first, rest))
            if first.contains(['.', ':'])
                || first == "localhost"
                || first.chars().any(|c| c.is_ascii_uppercase()) =>
        {
            (Some(first), rest)
        }
        _ => (None, name),
    }
}

/// Selects images by reference.
///
/// An exact selector matches only the same fully qualified reference. A name selector matches
/// every tag and digest of the same repository. Selectors built from a reference that carries a
/// tag or digest are exact.
///
/// # Examples
/// ```
/// use devloop_model::image_ref;
/// use devloop_model::reference::ImageSelector;
///
/// let selector = ImageSelector::from(image_ref!("gcr.io/foo/bar"));
/// assert!(selector.matches(&image_ref!("gcr.io/foo/bar:tilt-123")));
/// assert!(!selector.matches(&image_ref!("gcr.io/foo/baz")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ImageSelector {
    reference: ImageRef,
    match_exact: bool,
}

impl ImageSelector {
    pub fn exact(reference: ImageRef) -> Self {
        Self {
            reference,
            match_exact: true,
        }
    }

    pub fn by_name(reference: ImageRef) -> Self {
        Self {
            reference,
            match_exact: false,
        }
    }

    pub fn reference(&self) -> &ImageRef {
        &self.reference
    }

    pub fn is_exact(&self) -> bool {
        self.match_exact
    }

    pub fn matches(&self, image: &ImageRef) -> bool {
        if self.match_exact {
            self.reference.normalized() == image.normalized()
        } else {
            self.reference.normalized_name() == image.normalized_name()
        }
    }
}

impl From<ImageRef> for ImageSelector {
    fn from(reference: ImageRef) -> Self {
        if reference.tag().is_some() || reference.digest().is_some() {
            Self::exact(reference)
        } else {
            Self::by_name(reference)
        }
    }
}

impl FromStr for ImageSelector {
    type Err = ImageRefError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.parse::<ImageRef>().map(Self::from)
    }
}

impl TryFrom<String> for ImageSelector {
    type Error = ImageRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for ImageSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference.normalized())
    }
}

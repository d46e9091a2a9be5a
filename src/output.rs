//! Utilities for deriving output artifact paths.
//!
//! This module contains the [`Scheme`] struct, which holds the explicit
//! path-derivation settings for a build, and the [`Artifact`] descriptor,
//! which names a single generated drawing.

use camino::Utf8PathBuf;

/// Default directory collecting generated artifacts.
pub const BUILD_DIR: &str = "_build";

/// Environment binding for the optional client prefix.
pub const CLIENT_ENV: &str = "BOXES_CLIENT_ID";

/// Path-derivation settings shared by every artifact of a build.
///
/// A `Scheme` is assembled once at startup and passed down explicitly, so
/// path derivation stays a pure function of the descriptor and the scheme.
/// The only environment access happens in [`Scheme::from_env`].
#[derive(Debug, Clone)]
pub struct Scheme {
    /// Directory the derived paths are rooted at.
    pub dir: Utf8PathBuf,
    /// Optional client identifier prefixed to every filename.
    pub client: Option<String>,
}

impl Scheme {
    /// Creates a scheme rooted at `dir` with no client prefix.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            client: None,
        }
    }

    /// Sets the client identifier prefixed to every filename.
    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    /// Creates a scheme with the client identifier taken from the
    /// environment. An unset or empty binding means no prefix.
    pub fn from_env(dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            client: client_from(std::env::var(CLIENT_ENV).ok()),
        }
    }

    /// Derives the full output path for an artifact.
    ///
    /// The filename concatenates the slug, a thickness marker and the
    /// extension, e.g. `_build/card-box_3mm.svg`. With a client set the
    /// filename gains a prefix, e.g. `_build/acme_card-box_3mm.svg`.
    pub fn resolve(&self, artifact: &Artifact) -> Utf8PathBuf {
        let name = artifact.file_name();

        let name = match &self.client {
            Some(client) => format!("{client}_{name}"),
            None => name,
        };

        self.dir.join(name)
    }
}

impl Default for Scheme {
    fn default() -> Self {
        Self::new(BUILD_DIR)
    }
}

fn client_from(raw: Option<String>) -> Option<String> {
    raw.filter(|id| !id.is_empty())
}

/// Names a single generated drawing file.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Short identifier for the design.
    pub slug: String,
    /// Material thickness in millimeters.
    pub thickness: f64,
    /// Drawing format extension.
    pub extension: String,
}

impl Artifact {
    /// Creates a descriptor with the default thickness (3 mm) and the
    /// default drawing format (`svg`).
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            thickness: 3.0,
            extension: String::from("svg"),
        }
    }

    /// Sets the material thickness in millimeters.
    pub fn thickness(mut self, millimeters: f64) -> Self {
        self.thickness = millimeters;
        self
    }

    /// Sets the drawing format extension.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    fn file_name(&self) -> String {
        format!("{}_{}mm.{}", self.slug, self.thickness, self.extension)
    }
}

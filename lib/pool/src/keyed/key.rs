use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Identifies a pooled handle.
///
/// A key is derived from a URI (for example the URI of a concept). The URI is normalized into a
/// name that is safe to use as a single path segment: it is lower-cased and every character
/// outside of `[a-z0-9._-]` is replaced with `_`. The location of the handle is the name appended
/// to a base path.
///
/// Two keys are equal if their names are equal. Different URIs that normalize to the same name
/// (e.g., `http://ex.com/A` and `http://ex.com/a`) therefore share a handle.
#[derive(Clone, Debug)]
pub struct PoolKey {
    name: String,
    location: PathBuf,
}

impl PoolKey {
    /// Derives the key of `uri` below `base`.
    ///
    /// ```
    /// use rdf_dal_pool::PoolKey;
    ///
    /// let key = PoolKey::derive("./data", "http://example.com/Concept#1");
    /// assert_eq!(key.name(), "http___example.com_concept_1");
    /// ```
    pub fn derive(base: impl AsRef<Path>, uri: &str) -> Self {
        let name = normalize(uri);
        let location = base.as_ref().join(&name);
        Self { name, location }
    }

    /// The normalized name of the key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The location of the handle, i.e., the name below the base path.
    pub fn location(&self) -> &Path {
        &self.location
    }
}

impl PartialEq for PoolKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PoolKey {}

impl Hash for PoolKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Display for PoolKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

fn normalize(uri: &str) -> String {
    let name = uri
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect::<String>();

    // "", "." and ".." do not name a directory below the base path.
    if name.chars().all(|c| c == '.') {
        return "_".repeat(name.len().max(1));
    }
    name
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared identity of a dependency module.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
pub struct PackageIdentity {
    pub name: String,
    /// Empty when the dependency carries no version metadata (e.g. vendored).
    #[serde(default)]
    pub version: String,
}

impl PackageIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn has_version(&self) -> bool {
        !self.version.trim().is_empty()
    }
}

/// Module path -> declared identity, for every dependency of the project.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(transparent)]
pub struct DependencyGraph {
    modules: BTreeMap<String, PackageIdentity>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module_path: impl Into<String>, identity: PackageIdentity) {
        self.modules.insert(module_path.into(), identity);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Finds the module owning `package_path` by longest `/`-bounded prefix.
    pub fn lookup(&self, package_path: &str) -> Option<(&str, &PackageIdentity)> {
        self.modules
            .iter()
            .filter(|(module, _)| is_path_prefix(module, package_path))
            .max_by_key(|(module, _)| module.len())
            .map(|(module, identity)| (module.as_str(), identity))
    }
}

impl FromIterator<(String, PackageIdentity)> for DependencyGraph {
    fn from_iter<T: IntoIterator<Item = (String, PackageIdentity)>>(iter: T) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}

/// True when `prefix` equals `path` or names one of its parent directories.
pub fn is_path_prefix(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

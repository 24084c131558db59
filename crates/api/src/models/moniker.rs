use super::package::PackageIdentity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MonikerKind {
    Export,
    Import,
    Local,
}

/// A name for a symbol that stays meaningful outside the current run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, JsonSchema)]
pub struct Moniker {
    pub kind: MonikerKind,
    pub scheme: String,
    pub identifier: String,
    /// Owning module, attached as package information when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageIdentity>,
}

impl Moniker {
    /// Key under which identifiers must be unique.
    pub fn key(&self) -> (String, String) {
        (self.scheme.clone(), self.identifier.clone())
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Opaque identity of one declared entity, assigned by the facts provider.
///
/// Two declarations never share an id, even when their names collide.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema,
)]
#[serde(transparent)]
pub struct SymbolId(pub u64);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Package,
    Type,
    Function,
    Method,
    Field,
    Variable,
    Constant,
    Parameter,
}

impl SymbolKind {
    /// Keyword used when a hover has nothing better than kind and name.
    pub fn keyword(&self) -> &'static str {
        match self {
            SymbolKind::Package => "package",
            SymbolKind::Type => "type",
            SymbolKind::Function | SymbolKind::Method => "func",
            SymbolKind::Field => "field",
            SymbolKind::Variable | SymbolKind::Parameter => "var",
            SymbolKind::Constant => "const",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Package => "package",
            SymbolKind::Type => "type",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Parameter => "parameter",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    /// Name within the declaring package, e.g. `Server.Start` for a method.
    pub qualified_name: String,
    pub kind: SymbolKind,
    /// Import path of the declaring package.
    pub package: String,
    pub exported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl Symbol {
    /// Portion of the qualified name before the last `.`, if any.
    pub fn receiver(&self) -> Option<&str> {
        self.qualified_name.rsplit_once('.').map(|(owner, _)| owner)
    }
}

/// Zero-based source span; columns count UTF-16 code units.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceRole {
    Definition,
    Reference,
}

#[derive(Debug, Clone)]
pub struct Occurrence {
    pub symbol: Arc<Symbol>,
    /// Document the span lives in, relative to the project root.
    pub path: PathBuf,
    pub span: Span,
    pub role: OccurrenceRole,
}

impl Occurrence {
    pub fn is_definition(&self) -> bool {
        self.role == OccurrenceRole::Definition
    }
}

/// One compilation unit as reported by the facts provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    /// Document path relative to the project root.
    pub path: PathBuf,
    pub package: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiver_is_prefix_of_qualified_name() {
        let sym = Symbol {
            id: SymbolId(7),
            name: "Start".to_string(),
            qualified_name: "Server.Start".to_string(),
            kind: SymbolKind::Method,
            package: "example.com/app/server".to_string(),
            exported: true,
            documentation: None,
        };
        assert_eq!(sym.receiver(), Some("Server"));
    }
}

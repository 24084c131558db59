//! LSIF record shapes.
//!
//! Every record is one JSON object carrying an `id`, a `type` (`vertex` or
//! `edge`) and a `label`. Vertices must be written before any edge that names
//! them; beyond that, records may appear in any order.

use crate::models::{MonikerKind, PackageIdentity, Span};
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "0.4.3";
pub const POSITION_ENCODING: &str = "utf-16";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Default for ToolInfo {
    fn default() -> Self {
        Self {
            name: "lsifkit".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MarkedString {
    Code { language: String, value: String },
    Markdown(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HoverContents {
    pub contents: Vec<MarkedString>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "label")]
pub enum Vertex {
    #[serde(rename = "metaData", rename_all = "camelCase")]
    MetaData {
        version: String,
        project_root: String,
        position_encoding: String,
        tool_info: ToolInfo,
    },
    #[serde(rename = "project")]
    Project { kind: String },
    #[serde(rename = "document", rename_all = "camelCase")]
    Document { uri: String, language_id: String },
    #[serde(rename = "range")]
    Range { start: Position, end: Position },
    #[serde(rename = "resultSet")]
    ResultSet,
    #[serde(rename = "hoverResult")]
    HoverResult { result: HoverContents },
    #[serde(rename = "definitionResult")]
    DefinitionResult,
    #[serde(rename = "referenceResult")]
    ReferenceResult,
    #[serde(rename = "moniker")]
    Moniker {
        kind: MonikerKind,
        scheme: String,
        identifier: String,
    },
    #[serde(rename = "packageInformation")]
    PackageInformation {
        name: String,
        manager: String,
        version: String,
    },
}

impl Vertex {
    pub fn range(span: &Span) -> Self {
        Vertex::Range {
            start: Position {
                line: span.start_line,
                character: span.start_col,
            },
            end: Position {
                line: span.end_line,
                character: span.end_col,
            },
        }
    }

    pub fn package_information(identity: &PackageIdentity, manager: &str) -> Self {
        Vertex::PackageInformation {
            name: identity.name.clone(),
            manager: manager.to_string(),
            version: identity.version.clone(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Vertex::MetaData { .. } => "metaData",
            Vertex::Project { .. } => "project",
            Vertex::Document { .. } => "document",
            Vertex::Range { .. } => "range",
            Vertex::ResultSet => "resultSet",
            Vertex::HoverResult { .. } => "hoverResult",
            Vertex::DefinitionResult => "definitionResult",
            Vertex::ReferenceResult => "referenceResult",
            Vertex::Moniker { .. } => "moniker",
            Vertex::PackageInformation { .. } => "packageInformation",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemProperty {
    References,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "label")]
pub enum Edge {
    #[serde(rename = "contains")]
    Contains {
        #[serde(rename = "outV")]
        out_v: u64,
        #[serde(rename = "inVs")]
        in_vs: Vec<u64>,
    },
    #[serde(rename = "item")]
    Item {
        #[serde(rename = "outV")]
        out_v: u64,
        #[serde(rename = "inVs")]
        in_vs: Vec<u64>,
        document: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        property: Option<ItemProperty>,
    },
    #[serde(rename = "next")]
    Next {
        #[serde(rename = "outV")]
        out_v: u64,
        #[serde(rename = "inV")]
        in_v: u64,
    },
    #[serde(rename = "textDocument/definition")]
    Definition {
        #[serde(rename = "outV")]
        out_v: u64,
        #[serde(rename = "inV")]
        in_v: u64,
    },
    #[serde(rename = "textDocument/references")]
    References {
        #[serde(rename = "outV")]
        out_v: u64,
        #[serde(rename = "inV")]
        in_v: u64,
    },
    #[serde(rename = "textDocument/hover")]
    Hover {
        #[serde(rename = "outV")]
        out_v: u64,
        #[serde(rename = "inV")]
        in_v: u64,
    },
    #[serde(rename = "moniker")]
    Moniker {
        #[serde(rename = "outV")]
        out_v: u64,
        #[serde(rename = "inV")]
        in_v: u64,
    },
    #[serde(rename = "packageInformation")]
    PackageInformation {
        #[serde(rename = "outV")]
        out_v: u64,
        #[serde(rename = "inV")]
        in_v: u64,
    },
}

impl Edge {
    pub fn label(&self) -> &'static str {
        match self {
            Edge::Contains { .. } => "contains",
            Edge::Item { .. } => "item",
            Edge::Next { .. } => "next",
            Edge::Definition { .. } => "textDocument/definition",
            Edge::References { .. } => "textDocument/references",
            Edge::Hover { .. } => "textDocument/hover",
            Edge::Moniker { .. } => "moniker",
            Edge::PackageInformation { .. } => "packageInformation",
        }
    }

    /// Every vertex id the edge names, source first.
    pub fn endpoints(&self) -> Vec<u64> {
        match self {
            Edge::Contains { out_v, in_vs } => {
                std::iter::once(*out_v).chain(in_vs.iter().copied()).collect()
            }
            Edge::Item {
                out_v,
                in_vs,
                document,
                ..
            } => std::iter::once(*out_v)
                .chain(in_vs.iter().copied())
                .chain(std::iter::once(*document))
                .collect(),
            Edge::Next { out_v, in_v }
            | Edge::Definition { out_v, in_v }
            | Edge::References { out_v, in_v }
            | Edge::Hover { out_v, in_v }
            | Edge::Moniker { out_v, in_v }
            | Edge::PackageInformation { out_v, in_v } => vec![*out_v, *in_v],
        }
    }
}

/// One serialized line of output.
#[derive(Serialize, Debug)]
pub struct Record<'a, T: Serialize> {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(flatten)]
    pub element: &'a T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_record_carries_id_type_and_label() {
        let vertex = Vertex::Document {
            uri: "file:///repo/a.go".to_string(),
            language_id: "go".to_string(),
        };
        let record = Record {
            id: 3,
            kind: "vertex",
            element: &vertex,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 3,
                "type": "vertex",
                "label": "document",
                "uri": "file:///repo/a.go",
                "languageId": "go"
            })
        );
    }

    #[test]
    fn unit_vertices_serialize_as_bare_labels() {
        let record = Record {
            id: 9,
            kind: "vertex",
            element: &Vertex::ResultSet,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": 9, "type": "vertex", "label": "resultSet"})
        );
    }

    #[test]
    fn item_edge_uses_lsif_field_names() {
        let edge = Edge::Item {
            out_v: 4,
            in_vs: vec![7, 8],
            document: 2,
            property: Some(ItemProperty::References),
        };
        let value = serde_json::to_value(Record {
            id: 10,
            kind: "edge",
            element: &edge,
        })
        .unwrap();
        assert_eq!(value["label"], "item");
        assert_eq!(value["outV"], 4);
        assert_eq!(value["inVs"], serde_json::json!([7, 8]));
        assert_eq!(value["property"], "references");
        assert_eq!(edge.endpoints(), vec![4, 7, 8, 2]);
    }
}

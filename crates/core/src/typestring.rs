//! Hover text for symbols.
//!
//! Type strings arrive on one line, with struct and interface members split by
//! `; `. [`expand_members`] puts each member on its own indented line.

use lsifkit_api::{HoverContents, MarkedString, Symbol, SymbolKind};

/// Indentation for one level of struct or interface members.
pub const INDENT: &str = "    ";

/// Signature line plus an optional expanded body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDisplay {
    pub signature: String,
    /// Expanded struct or interface body; empty when there is none.
    pub extra: String,
}

/// Builds the hover text for `symbol`. Without a declared type the signature
/// still names the kind and the symbol.
pub fn describe(symbol: &Symbol, declared: Option<&str>) -> TypeDisplay {
    let declared = declared.map(str::trim).filter(|ty| !ty.is_empty());
    let name = symbol.name.as_str();

    let Some(ty) = declared else {
        return TypeDisplay {
            signature: format!("{} {}", symbol.kind.keyword(), name),
            extra: String::new(),
        };
    };

    match symbol.kind {
        SymbolKind::Package => TypeDisplay {
            signature: format!("package {name}"),
            extra: String::new(),
        },
        SymbolKind::Type => describe_type(name, ty),
        SymbolKind::Function => TypeDisplay {
            signature: format!("func {name}{}", strip_func(ty)),
            extra: String::new(),
        },
        SymbolKind::Method => {
            let signature = match symbol.receiver() {
                Some(receiver) => format!("func ({receiver}).{name}{}", strip_func(ty)),
                None => format!("func {name}{}", strip_func(ty)),
            };
            TypeDisplay {
                signature,
                extra: String::new(),
            }
        }
        SymbolKind::Field => TypeDisplay {
            signature: format!("struct field {name} {ty}"),
            extra: String::new(),
        },
        SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Constant => TypeDisplay {
            signature: format!("{} {name} {ty}", symbol.kind.keyword()),
            extra: String::new(),
        },
    }
}

fn describe_type(name: &str, ty: &str) -> TypeDisplay {
    for composite in ["struct", "interface"] {
        if let Some(rest) = ty.strip_prefix(composite)
            && rest.trim_start().starts_with('{')
        {
            return TypeDisplay {
                signature: format!("type {name} {composite}"),
                extra: expand_members(ty),
            };
        }
    }
    TypeDisplay {
        signature: format!("type {name} {ty}"),
        extra: String::new(),
    }
}

fn strip_func(ty: &str) -> &str {
    ty.strip_prefix("func").unwrap_or(ty)
}

/// Puts each `;`-separated member of a struct or interface literal on its own
/// line, indenting nested bodies one [`INDENT`] per level. Empty bodies stay
/// as `{}`.
pub fn expand_members(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 16);
    let mut depth = 0usize;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ';' => {
                out.push('\n');
                push_indent(&mut out, depth);
                if chars.peek() == Some(&' ') {
                    chars.next();
                }
            }
            '{' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push_str("{}");
            }
            '{' => {
                depth += 1;
                if !out.ends_with(' ') {
                    out.push(' ');
                }
                out.push_str("{\n");
                push_indent(&mut out, depth);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                out.push('\n');
                push_indent(&mut out, depth);
                out.push('}');
            }
            other => out.push(other),
        }
    }

    out
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Assembles hover contents: the signature, the expanded body when present,
/// then any documentation as markdown.
pub fn hover_contents(language: &str, display: &TypeDisplay, docs: Option<&str>) -> HoverContents {
    let mut contents = vec![MarkedString::Code {
        language: language.to_string(),
        value: display.signature.clone(),
    }];
    if !display.extra.is_empty() {
        contents.push(MarkedString::Code {
            language: language.to_string(),
            value: display.extra.clone(),
        });
    }
    if let Some(docs) = docs.map(str::trim).filter(|d| !d.is_empty()) {
        contents.push(MarkedString::Markdown(docs.to_string()));
    }
    HoverContents { contents }
}

use crate::config::IndexerConfig;
use lsifkit_api::{
    DependencyGraph, Moniker, MonikerKind, PackageIdentity, Symbol, SymbolKind, is_path_prefix,
};
use std::collections::HashSet;
use tracing::debug;

/// Decides which moniker, if any, a symbol gets.
///
/// Project packages are the module path and everything beneath it, plus the
/// package of every listed unit. Exported project symbols get an `export`
/// moniker. Symbols from a dependency with a version get an `import` moniker
/// carrying that dependency. Dependencies that cannot be resolved, or that
/// have no version, fall back to a `local` moniker.
#[derive(Debug, Clone)]
pub struct MonikerResolver {
    scheme: String,
    module: PackageIdentity,
    project_packages: HashSet<String>,
}

impl MonikerResolver {
    pub fn new(
        scheme: impl Into<String>,
        module: PackageIdentity,
        project_packages: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            module,
            project_packages: project_packages.into_iter().collect(),
        }
    }

    pub fn from_config(
        config: &IndexerConfig,
        project_packages: impl IntoIterator<Item = String>,
    ) -> Self {
        Self::new(
            config.moniker_scheme.clone(),
            PackageIdentity::new(config.module_name.clone(), config.module_version.clone()),
            project_packages,
        )
    }

    pub fn is_project_package(&self, package: &str) -> bool {
        (!self.module.name.is_empty() && is_path_prefix(&self.module.name, package))
            || self.project_packages.contains(package)
    }

    pub fn resolve(&self, symbol: &Symbol, dependencies: &DependencyGraph) -> Option<Moniker> {
        if !symbol.exported {
            return None;
        }
        let identifier = identifier(symbol);

        if self.is_project_package(&symbol.package) {
            let package = (!self.module.name.is_empty()).then(|| self.module.clone());
            return Some(self.moniker(MonikerKind::Export, identifier, package));
        }

        match dependencies.lookup(&symbol.package) {
            Some((_, dependency)) if dependency.has_version() => Some(self.moniker(
                MonikerKind::Import,
                identifier,
                Some(dependency.clone()),
            )),
            Some((module, _)) => {
                debug!(
                    "dependency {} of {} has no version; using a local moniker",
                    module, symbol.qualified_name
                );
                Some(self.moniker(MonikerKind::Local, identifier, None))
            }
            None => {
                debug!(
                    "no dependency declares package {}; using a local moniker for {}",
                    symbol.package, symbol.qualified_name
                );
                Some(self.moniker(MonikerKind::Local, identifier, None))
            }
        }
    }

    fn moniker(
        &self,
        kind: MonikerKind,
        identifier: String,
        package: Option<PackageIdentity>,
    ) -> Moniker {
        Moniker {
            kind,
            scheme: self.scheme.clone(),
            identifier,
            package,
        }
    }
}

/// `package:QualifiedName`, or just the package path for package symbols.
pub fn identifier(symbol: &Symbol) -> String {
    match symbol.kind {
        SymbolKind::Package => symbol.package.clone(),
        _ => format!("{}:{}", symbol.package, symbol.qualified_name),
    }
}

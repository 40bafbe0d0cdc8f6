use serde::{Deserialize, Serialize};
use std::fmt;

/// Locator references starting with this prefix are graph-internal bookkeeping
/// entries (peer-dependency instances), not installable packages.
pub const VIRTUAL_PREFIX: &str = "virtual:";

/// Package identity: optional scope plus name.
///
/// The scope is stored without its leading `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ident {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub name: String,
}

impl Ident {
    pub fn new(scope: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            scope: scope
                .map(|s| s.trim_start_matches('@').to_string())
                .filter(|s| !s.is_empty()),
            name: name.into(),
        }
    }

    /// Parse `@scope/name` or `name`.
    pub fn parse(s: &str) -> Self {
        if let Some(rest) = s.strip_prefix('@')
            && let Some((scope, name)) = rest.split_once('/')
        {
            return Self::new(Some(scope), name);
        }
        Self::new(None, s)
    }

    /// `@scope/name` when a scope exists, else `name`.
    pub fn normalized(&self) -> String {
        match &self.scope {
            Some(scope) => format!("@{}/{}", scope, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "@{}/{}", scope, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A package name plus the version range requested somewhere in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(flatten)]
    pub ident: Ident,
    pub range: String,
}

impl Descriptor {
    pub fn new(ident: Ident, range: impl Into<String>) -> Self {
        Self {
            ident,
            range: range.into(),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ident, self.range)
    }
}

/// A package name plus one concrete resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locator {
    #[serde(flatten)]
    pub ident: Ident,
    /// Graph reference, e.g. `npm:1.2.3` or `virtual:<hash>#npm:1.2.3`.
    pub reference: String,
    /// Concrete resolved version (may carry pre-release and build metadata).
    pub version: String,
}

impl Locator {
    pub fn new(ident: Ident, reference: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            ident,
            reference: reference.into(),
            version: version.into(),
        }
    }

    /// Registry locator for `version`, i.e. reference `npm:<version>`.
    pub fn npm(ident: Ident, version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            ident,
            reference: format!("npm:{}", version),
            version,
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.reference.starts_with(VIRTUAL_PREFIX)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ident, self.reference)
    }
}

/// The graph's recorded resolution of one descriptor to one locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub descriptor: Descriptor,
    pub locator: Locator,
}

impl Binding {
    pub fn new(descriptor: Descriptor, locator: Locator) -> Self {
        Self {
            descriptor,
            locator,
        }
    }

    /// Normalized package identity of the bound descriptor.
    pub fn package(&self) -> String {
        self.descriptor.ident.normalized()
    }
}

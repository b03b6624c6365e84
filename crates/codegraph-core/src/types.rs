use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language a file or symbol belongs to. `Other` carries the raw name so
/// adapters for languages we have no first-class variant for still round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Rust,
    TypeScript,
    JavaScript,
    Python,
    Go,
    Java,
    Cpp,
    Swift,
    CSharp,
    Ruby,
    Php,
    Other(String),
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Rust => write!(f, "rust"),
            Language::TypeScript => write!(f, "typescript"),
            Language::JavaScript => write!(f, "javascript"),
            Language::Python => write!(f, "python"),
            Language::Go => write!(f, "go"),
            Language::Java => write!(f, "java"),
            Language::Cpp => write!(f, "cpp"),
            Language::Swift => write!(f, "swift"),
            Language::CSharp => write!(f, "csharp"),
            Language::Ruby => write!(f, "ruby"),
            Language::Php => write!(f, "php"),
            Language::Other(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "rust" | "rs" => Language::Rust,
            "typescript" | "ts" => Language::TypeScript,
            "javascript" | "js" => Language::JavaScript,
            "python" | "py" => Language::Python,
            "go" | "golang" => Language::Go,
            "java" => Language::Java,
            "cpp" | "c++" | "cxx" => Language::Cpp,
            "swift" => Language::Swift,
            "csharp" | "c#" | "cs" => Language::CSharp,
            "ruby" | "rb" => Language::Ruby,
            "php" => Language::Php,
            other => Language::Other(other.to_string()),
        })
    }
}

impl Language {
    /// Default file extensions recognized for this language, matching the
    /// extension map the parser's file discovery layer globs against.
    pub fn default_extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["rs"],
            Language::TypeScript => &["ts", "tsx"],
            Language::JavaScript => &["js", "jsx", "mjs"],
            Language::Python => &["py", "pyi"],
            Language::Go => &["go"],
            Language::Java => &["java"],
            Language::Cpp => &["cpp", "cxx", "cc", "hpp", "hxx", "h"],
            Language::Swift => &["swift"],
            Language::CSharp => &["cs"],
            Language::Ruby => &["rb", "rake", "gemspec"],
            Language::Php => &["php", "phtml"],
            Language::Other(_) => &[],
        }
    }
}

/// Closed set of symbol kinds. `File` and `Module`/`ExternalModule` are
/// synthetic kinds the resolver mints so every relationship has a concrete
/// endpoint (see virtual-symbol synthesis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Struct,
    Interface,
    Namespace,
    Field,
    Variable,
    Module,
    ExternalModule,
    File,
    Enum,
    TypeAlias,
    Constant,
}

impl SymbolKind {
    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }

    pub fn is_field_like(&self) -> bool {
        matches!(self, SymbolKind::Field | SymbolKind::Variable | SymbolKind::Constant)
    }
}

/// Visibility of a symbol as reported by its defining language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

/// Closed set of relationship (edge) types between two symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Calls,
    Inherits,
    Uses,
    Imports,
    ReadsField,
    WritesField,
    InitializesField,
    Spawns,
    DataFlow,
    Overrides,
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationshipType::Calls => "calls",
            RelationshipType::Inherits => "inherits",
            RelationshipType::Uses => "uses",
            RelationshipType::Imports => "imports",
            RelationshipType::ReadsField => "reads_field",
            RelationshipType::WritesField => "writes_field",
            RelationshipType::InitializesField => "initializes_field",
            RelationshipType::Spawns => "spawns",
            RelationshipType::DataFlow => "data_flow",
            RelationshipType::Overrides => "overrides",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_round_trips_through_other() {
        let lang: Language = "kotlin".parse().unwrap();
        assert_eq!(lang, Language::Other("kotlin".to_string()));
        assert_eq!(lang.to_string(), "kotlin");
    }

    #[test]
    fn known_language_extensions_are_non_empty() {
        assert!(Language::Rust.default_extensions().contains(&"rs"));
        assert!(Language::Cpp.default_extensions().contains(&"hpp"));
    }
}

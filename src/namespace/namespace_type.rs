use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Content format of a namespace.
///
/// Everything but `Properties` is addressed on the wire as `name.ext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceType {
    #[default]
    Properties,
    Json,
    Yaml,
    Yml,
    Xml,
    Txt,
}

impl NamespaceType {
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            NamespaceType::Properties => None,
            NamespaceType::Json => Some("json"),
            NamespaceType::Yaml => Some("yaml"),
            NamespaceType::Yml => Some("yml"),
            NamespaceType::Xml => Some("xml"),
            NamespaceType::Txt => Some("txt"),
        }
    }

    /// Wire name of namespace `name` with this type
    pub fn identifier(
        &self,
        name: &str,
    ) -> String {
        match self.extension() {
            None => name.to_string(),
            Some(ext) => format!("{name}.{ext}"),
        }
    }
}

impl fmt::Display for NamespaceType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.extension().unwrap_or("properties"))
    }
}

impl FromStr for NamespaceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "properties" => Ok(NamespaceType::Properties),
            "json" => Ok(NamespaceType::Json),
            "yaml" => Ok(NamespaceType::Yaml),
            "yml" => Ok(NamespaceType::Yml),
            "xml" => Ok(NamespaceType::Xml),
            "txt" => Ok(NamespaceType::Txt),
            other => Err(format!("unknown namespace type {other:?}")),
        }
    }
}

//! The `Gather.toml` manifest listing sources to gather in one go.
//!
//! ```toml
//! [sources]
//! syn = { source = "https://github.com/dtolnay/syn.git", destination = "vendor/syn" }
//! readme = { source = "https://example.com/README.md" }
//! ```
//!
//! An entry without a `destination` is gathered into a path named after the entry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "Gather.toml";
const SOURCES_TABLE: &str = "sources";

/// Errors encountered when parsing a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The `[sources]` table was not found.
    #[error("required table 'sources' not found in manifest")]
    SourcesTableNotFound,

    /// A toml value was expected to be a table.
    #[error("expected value '{name}' to be a toml table")]
    ValueNotTable { name: String },

    /// An entry name is empty.
    #[error("source names must not be empty")]
    EmptyName,

    /// An entry is not a valid source definition.
    #[error("invalid source '{name}'")]
    EntryInvalid {
        name: String,
        #[source]
        err: toml::de::Error,
    },

    /// A toml deserialisation error occurred.
    #[error(transparent)]
    TomlInvalid(#[from] toml::de::Error),
}

/// One entry in the `[sources]` table.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Entry {
    pub source: String,
    #[serde(default)]
    pub destination: Option<PathBuf>,
}

impl Entry {
    /// Where this entry should be gathered to, relative to `out_dir`.
    pub fn destination_in<P: AsRef<Path>>(&self, name: &str, out_dir: P) -> PathBuf {
        match &self.destination {
            Some(dest) => out_dir.as_ref().join(dest),
            None => out_dir.as_ref().join(name),
        }
    }
}

/// Entries keyed by name, in name order.
pub type Entries = BTreeMap<String, Entry>;

/// Parse the contents of a manifest into its entries.
pub fn try_parse_toml<S: AsRef<str>>(toml_str: S) -> Result<Entries, ManifestError> {
    let table = toml_str.as_ref().parse::<toml::Table>()?;
    let sources = table
        .get(SOURCES_TABLE)
        .and_then(|v| v.as_table())
        .ok_or(ManifestError::SourcesTableNotFound)?;
    sources
        .iter()
        .map(|(name, value)| {
            if name.is_empty() {
                return Err(ManifestError::EmptyName);
            }
            let table = value.as_table().ok_or_else(|| ManifestError::ValueNotTable {
                name: name.to_owned(),
            })?;
            let entry = toml::Value::Table(table.to_owned())
                .try_into::<Entry>()
                .map_err(|err| ManifestError::EntryInvalid {
                    name: name.to_owned(),
                    err,
                })?;
            Ok((name.to_owned(), entry))
        })
        .collect()
}

#[cfg(test)]
use ManifestError::*;

#[cfg(test)]
mod test_parse_manifest {
    use super::*;

    #[test]
    fn parse_entries() {
        let document = r#"
            [sources]
            syn = { source = "https://github.com/dtolnay/syn.git", destination = "vendor/syn" }
            readme = { source = "https://example.com/README.md" }
        "#;
        let entries = try_parse_toml(document).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries["syn"],
            Entry {
                source: "https://github.com/dtolnay/syn.git".to_string(),
                destination: Some(PathBuf::from("vendor/syn")),
            }
        );
        assert_eq!(entries["readme"].destination, None);
        assert_eq!(
            entries.keys().collect::<Vec<_>>(),
            vec!["readme", "syn"]
        );
    }

    #[test]
    fn destination_defaults_to_name() {
        let entry = Entry {
            source: "./x".to_string(),
            destination: None,
        };
        assert_eq!(entry.destination_in("docs", "/out"), PathBuf::from("/out/docs"));
        let entry = Entry {
            destination: Some(PathBuf::from("a/b")),
            ..entry
        };
        assert_eq!(entry.destination_in("docs", "/out"), PathBuf::from("/out/a/b"));
    }

    #[test]
    fn empty_sources_table_is_fine() {
        assert!(try_parse_toml("[sources]\n").unwrap().is_empty());
    }
}

#[cfg(test)]
mod test_parse_manifest_failure_modes {
    use super::*;

    #[test]
    fn invalid_toml() {
        let result = try_parse_toml("this is not a valid toml document :( uh-oh!");
        assert!(matches!(result, Err(TomlInvalid(_))));
    }

    #[test]
    fn missing_sources_table() {
        let document = r#"
            [package]
            name = "something"
        "#;
        assert!(matches!(try_parse_toml(document), Err(SourcesTableNotFound)));
    }

    #[test]
    fn value_not_a_table() {
        let document = r#"
            [sources]
            not-a-table = "actually a string"
        "#;
        assert!(matches!(
            try_parse_toml(document),
            Err(ValueNotTable { name }) if name == "not-a-table"
        ));
    }

    #[test]
    fn missing_source_key() {
        let document = r#"
            [sources]
            broken = { destination = "somewhere" }
        "#;
        assert!(matches!(
            try_parse_toml(document),
            Err(EntryInvalid { name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let document = r#"
            [sources]
            typo = { sorce = "./x" }
        "#;
        assert!(matches!(
            try_parse_toml(document),
            Err(EntryInvalid { name, .. }) if name == "typo"
        ));
    }

    #[test]
    fn empty_name() {
        let document = r#"
            [sources]
            "" = { source = "./x" }
        "#;
        assert!(matches!(try_parse_toml(document), Err(EmptyName)));
    }
}

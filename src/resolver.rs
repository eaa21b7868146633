//! Template identifier parsing and namespace-to-path resolution.
//!
//! Identifiers follow the `namespace::path` convention. The namespace selects a
//! registered root directory and the path is taken relative to that root, with
//! the configured extension appended:
//!
//! ```text
//! layouts::admin/base  ->  <root of "layouts">/admin/base.tmpl
//! ```

use std::fs::File;
use std::path::PathBuf;
use std::sync::LazyLock;

use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use crate::constants::{DEFAULT_EXTENSION, NAMESPACE_SEPARATOR};
use crate::error::{Error, Result};

static TEMPLATE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]+)::(.+)$").expect("template name pattern is valid"));

/// A validated template identifier split into its two segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateName<'a> {
    /// Registered namespace, never contains `:`
    pub namespace: &'a str,
    /// Path relative to the namespace root, slashes trimmed on both ends
    pub path: &'a str,
}

impl<'a> TemplateName<'a> {
    /// Parses an identifier of the form `namespace::path`.
    ///
    /// # Errors
    /// * `Error::InvalidTemplateName` if the grammar does not match, or if the
    ///   path is empty once slashes are trimmed
    pub fn parse(name: &'a str) -> Result<Self> {
        let invalid = || Error::InvalidTemplateName {
            name: name.to_string(),
        };

        let captures = TEMPLATE_NAME.captures(name).ok_or_else(invalid)?;
        let namespace = captures.get(1).ok_or_else(invalid)?.as_str();
        let path = captures.get(2).ok_or_else(invalid)?.as_str();

        if path.starts_with(NAMESPACE_SEPARATOR) {
            return Err(invalid());
        }
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(invalid());
        }

        Ok(Self { namespace, path })
    }
}

/// Maps namespaces to template root directories.
///
/// The registry is fixed at construction and only read afterwards.
#[derive(Debug, Clone)]
pub struct PathResolver {
    namespaces: IndexMap<String, String>,
    extension: String,
}

impl PathResolver {
    /// Creates a resolver over the given namespace roots.
    ///
    /// The extension may be given with or without its leading dot.
    pub fn new<S: AsRef<str>>(namespaces: IndexMap<String, String>, extension: S) -> Self {
        let extension = match extension.as_ref().trim_start_matches('.') {
            "" => DEFAULT_EXTENSION,
            ext => ext,
        };
        Self {
            namespaces,
            extension: extension.to_string(),
        }
    }

    /// Converts a template identifier to the path of an existing template file.
    ///
    /// # Errors
    /// * `Error::InvalidTemplateName` if the identifier is malformed
    /// * `Error::TemplateNotFound` if the namespace is unknown or the file is
    ///   missing or unreadable
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let TemplateName { namespace, path } = TemplateName::parse(name)?;

        let root = self.namespaces.get(namespace).ok_or_else(|| {
            Error::not_found(format!("The {namespace} namespace has not been registered"))
        })?;

        let template_path = PathBuf::from(format!(
            "{}/{}.{}",
            root.trim_end_matches('/'),
            path,
            self.extension
        ));

        let is_readable_file = File::open(&template_path)
            .and_then(|file| file.metadata())
            .map(|metadata| metadata.is_file())
            .unwrap_or(false);
        if !is_readable_file {
            return Err(Error::not_found(format!(
                "There is no template at the path: {}",
                template_path.display()
            )));
        }

        debug!("Resolved template '{}' to '{}'.", name, template_path.display());
        Ok(template_path)
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        PathResolver::new(IndexMap::new(), DEFAULT_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_splits_on_first_separator() {
        let name = TemplateName::parse("views::admin/users::list").unwrap();
        assert_eq!(name.namespace, "views");
        assert_eq!(name.path, "admin/users::list");
    }

    #[test]
    fn test_parse_trims_slashes() {
        let name = TemplateName::parse("views::/pages/home/").unwrap();
        assert_eq!(name.path, "pages/home");
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        for name in [":bar", "::bar", "foo:bar", "foo", "foo::", "foo::/", "foo::::bar", "a:b::c"] {
            match TemplateName::parse(name) {
                Err(Error::InvalidTemplateName { name: reported }) => assert_eq!(reported, name),
                other => panic!("expected InvalidTemplateName for {name:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_resolve_normalizes_separators() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("pages")).unwrap();
        std::fs::write(temp_dir.path().join("pages/home.tmpl"), "home").unwrap();

        let root = format!("{}///", temp_dir.path().display());
        let resolver =
            PathResolver::new(IndexMap::from([("site".to_string(), root)]), ".tmpl");

        let path = resolver.resolve("site::/pages/home").unwrap();
        assert_eq!(
            path,
            PathBuf::from(format!("{}/pages/home.tmpl", temp_dir.path().display()))
        );
    }

    #[test]
    fn test_resolve_rejects_directories() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("pages.tmpl")).unwrap();

        let root = temp_dir.path().display().to_string();
        let resolver = PathResolver::new(IndexMap::from([("site".to_string(), root)]), "tmpl");

        match resolver.resolve("site::pages") {
            Err(Error::TemplateNotFound { reason }) => {
                assert!(reason.contains("There is no template at the path"))
            }
            other => panic!("expected TemplateNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_extension_falls_back_to_default() {
        let resolver = PathResolver::new(IndexMap::new(), "");
        assert_eq!(resolver.extension, DEFAULT_EXTENSION);
    }
}

//! Configuration of a datastore.

use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::collection::{IdGenerator, RandomIdGenerator};
use crate::common::{DB_FILE_EXTENSION, DEFAULT_DB_NAME};
use crate::errors::{ErrorKind, QuillError, QuillResult};

/// Settings of a [Datastore](crate::Datastore).
///
/// - `root`: directory holding the backing file. Without a root the
///   datastore is memory-only and never touches the file system.
/// - `name`: database name; the backing file is `<root>/<name>.db`.
/// - `autoload`: load the backing file when the datastore is opened.
/// - `strict`: selects the strict branch wherever validation can either
///   fail the whole operation or skip the offending record (batch insert,
///   load, persist).
/// - `id_generator`: source of identifiers for documents inserted without
///   an `_id`.
///
/// A config is usually assembled through
/// [DatastoreBuilder](crate::DatastoreBuilder) and is read-only once the
/// datastore is open.
#[derive(Clone)]
pub struct DatastoreConfig {
    root: Option<PathBuf>,
    name: String,
    autoload: bool,
    strict: bool,
    id_generator: Arc<dyn IdGenerator>,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DatastoreConfig {
    pub fn new() -> Self {
        DatastoreConfig {
            root: None,
            name: DEFAULT_DB_NAME.to_string(),
            autoload: true,
            strict: false,
            id_generator: Arc::new(RandomIdGenerator::default()),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn autoload(&self) -> bool {
        self.autoload
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn id_generator(&self) -> &Arc<dyn IdGenerator> {
        &self.id_generator
    }

    /// Path of the backing file, or `None` for a memory-only datastore.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join(format!("{}.{}", self.name, DB_FILE_EXTENSION)))
    }

    pub fn is_memory_only(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn set_root<P: AsRef<Path>>(&mut self, root: P) -> QuillResult<()> {
        let root = root.as_ref();
        if root.as_os_str().is_empty() {
            log::error!("Datastore root cannot be empty");
            return Err(QuillError::new(
                "Datastore root cannot be empty",
                ErrorKind::ConfigurationError,
            ));
        }
        self.root = Some(root.to_path_buf());
        Ok(())
    }

    pub(crate) fn set_name(&mut self, name: &str) -> QuillResult<()> {
        if name.is_empty() {
            log::error!("Datastore name cannot be empty");
            return Err(QuillError::new(
                "Datastore name cannot be empty",
                ErrorKind::ConfigurationError,
            ));
        }

        if name.contains(['/', '\\']) || name == "." || name == ".." {
            log::error!("Datastore name '{}' is not a plain file name", name);
            return Err(QuillError::new(
                &format!("Datastore name '{}' is not a plain file name", name),
                ErrorKind::ConfigurationError,
            ));
        }

        self.name = name.to_string();
        Ok(())
    }

    pub(crate) fn set_autoload(&mut self, autoload: bool) {
        self.autoload = autoload;
    }

    pub(crate) fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub(crate) fn set_id_generator(&mut self, id_generator: Arc<dyn IdGenerator>) {
        self.id_generator = id_generator;
    }
}

impl Debug for DatastoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatastoreConfig")
            .field("root", &self.root)
            .field("name", &self.name)
            .field("autoload", &self.autoload)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatastoreConfig::new();
        assert!(config.is_memory_only());
        assert_eq!(config.name(), "quill");
        assert!(config.autoload());
        assert!(!config.strict());
        assert_eq!(config.db_path(), None);
    }

    #[test]
    fn test_db_path() {
        let mut config = DatastoreConfig::new();
        config.set_root("/tmp/data").unwrap();
        config.set_name("relations").unwrap();
        assert_eq!(config.db_path(), Some(PathBuf::from("/tmp/data/relations.db")));
    }

    #[test]
    fn test_invalid_names() {
        let mut config = DatastoreConfig::new();
        for name in ["", "a/b", "a\\b", ".", ".."] {
            let err = config.set_name(name).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ConfigurationError, "name {:?}", name);
        }
        assert_eq!(config.name(), "quill");
    }

    #[test]
    fn test_empty_root() {
        let mut config = DatastoreConfig::new();
        assert!(config.set_root("").is_err());
        assert!(config.is_memory_only());
    }
}

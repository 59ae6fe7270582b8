use std::path::Path;
use std::sync::Arc;

use crate::collection::IdGenerator;
use crate::datastore::Datastore;
use crate::datastore_config::DatastoreConfig;
use crate::errors::{QuillError, QuillResult};

/// Builder for a [Datastore].
///
/// Setters can be chained freely; the first invalid setting is remembered
/// and returned by [DatastoreBuilder::open].
///
/// ```rust,ignore
/// let store = Datastore::builder()
///     .root("/var/lib/app")
///     .name("relations")
///     .strict(true)
///     .open()?;
/// ```
#[derive(Default)]
pub struct DatastoreBuilder {
    error: Option<QuillError>,
    config: DatastoreConfig,
}

impl DatastoreBuilder {
    pub fn new() -> Self {
        DatastoreBuilder {
            error: None,
            config: DatastoreConfig::new(),
        }
    }

    /// Directory of the backing file. Without it the datastore is
    /// memory-only.
    pub fn root<P: AsRef<Path>>(mut self, root: P) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_root(root) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_name(name) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn autoload(mut self, autoload: bool) -> Self {
        self.config.set_autoload(autoload);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config.set_strict(strict);
        self
    }

    pub fn id_generator<T: IdGenerator + 'static>(mut self, id_generator: T) -> Self {
        self.config.set_id_generator(Arc::new(id_generator));
        self
    }

    /// Opens the datastore, loading the backing file first when the config
    /// asks for it.
    pub fn open(self) -> QuillResult<Datastore> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Datastore::open(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_open_in_memory() {
        let store = DatastoreBuilder::new().strict(true).open().unwrap();
        assert!(store.config().is_memory_only());
        assert!(store.config().strict());
        assert!(store.is_empty());
    }

    #[test]
    fn test_first_error_wins() {
        let err = DatastoreBuilder::new()
            .name("")
            .root("")
            .open()
            .err()
            .unwrap();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
        assert!(err.message().contains("name"));
    }

    #[test]
    fn test_custom_id_generator() {
        struct Fixed;
        impl IdGenerator for Fixed {
            fn generate(&self) -> String {
                "fixed".to_string()
            }
        }

        let mut store = DatastoreBuilder::new().id_generator(Fixed).open().unwrap();
        let stored = store.insert(crate::doc! { a: 1 }).unwrap();
        assert_eq!(stored.get("_id"), Some(&crate::common::Value::from("fixed")));
    }
}

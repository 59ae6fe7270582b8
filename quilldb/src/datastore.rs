use std::collections::HashSet;

use crate::collection::{Document, DocumentId};
use crate::common::{project, validate_document, DOC_ID, MAX_ID_ATTEMPTS};
use crate::datastore_builder::DatastoreBuilder;
use crate::datastore_config::DatastoreConfig;
use crate::errors::{ErrorKind, QuillError, QuillResult};
use crate::filter::{compile, Filter};
use crate::store::{DocumentIndex, LoadReport, PersistenceLog};
use crate::update::UpdatePlan;

/// An embeddable document store.
///
/// A datastore owns an ordered index of schemaless documents keyed by their
/// `_id`. Documents are selected with query documents (see
/// [compile](crate::filter::compile)) or with [Filter]s, changed with update
/// documents (see [ModifierEngine](crate::update::ModifierEngine)) and
/// soft-deleted with tombstones. When configured with a root directory, the
/// datastore mirrors its index to a line log through [Datastore::load] and
/// [Datastore::persist].
///
/// Every operation runs to completion before returning. Writers take
/// `&mut self`, so sharing a datastore across threads needs an outer lock
/// such as `Arc<parking_lot::Mutex<Datastore>>`.
///
/// Reads take an optional projection: `None` returns whole documents,
/// `Some(fields)` keeps only the listed top level fields (`_id` included
/// only when listed), and unknown names are ignored.
///
/// # Examples
///
/// ```rust,ignore
/// use quilldb::{doc, Datastore};
///
/// let mut store = Datastore::in_memory();
/// store.insert_many(vec![
///     doc! { "_id": 1, kind: "normal" },
///     doc! { "_id": 2, kind: "normal", important: true },
/// ])?;
///
/// let important = store.find(&doc! { important: true }, None)?;
/// store.update(&doc! {}, &doc! { "$set": { value: 3 } }, None)?;
/// store.delete(&doc! { "_id": 2 })?;
/// ```
#[derive(Debug)]
pub struct Datastore {
    config: DatastoreConfig,
    index: DocumentIndex,
    log: Option<PersistenceLog>,
    last_load_report: Option<LoadReport>,
}

impl Datastore {
    pub fn builder() -> DatastoreBuilder {
        DatastoreBuilder::new()
    }

    /// Creates a memory-only datastore with default settings.
    pub fn in_memory() -> Datastore {
        Datastore {
            config: DatastoreConfig::new(),
            index: DocumentIndex::new(),
            log: None,
            last_load_report: None,
        }
    }

    pub(crate) fn open(config: DatastoreConfig) -> QuillResult<Datastore> {
        let log = config.db_path().map(PersistenceLog::new);
        let autoload = config.autoload() && log.is_some();
        let mut store = Datastore {
            config,
            index: DocumentIndex::new(),
            log,
            last_load_report: None,
        };

        if autoload {
            store.load()?;
        }
        Ok(store)
    }

    pub fn config(&self) -> &DatastoreConfig {
        &self.config
    }

    /// Raw number of records in the index, tombstoned records included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Report of the most recent [Datastore::load], including the one run
    /// on open.
    pub fn last_load_report(&self) -> Option<&LoadReport> {
        self.last_load_report.as_ref()
    }

    /// Inserts a document and returns it as stored, with its `_id`.
    ///
    /// A document without `_id` gets one from the configured
    /// [IdGenerator](crate::collection::IdGenerator).
    ///
    /// # Errors
    ///
    /// `InvalidDocumentShape` for an illegal field name, an `Unknown` value
    /// or an invalid `_id`; `DuplicateIdentifier` if a live document already
    /// uses the `_id`.
    pub fn insert(&mut self, document: Document) -> QuillResult<Document> {
        let (id, document) = self.prepare(document, &HashSet::new())?;
        self.index.insert(id, document.clone());
        Ok(document)
    }

    /// Inserts a batch of documents and returns them as stored.
    ///
    /// The whole batch is validated before the index changes, including
    /// `_id` collisions between documents of the batch. In strict mode the
    /// first invalid document fails the call and nothing is inserted;
    /// otherwise invalid documents are skipped and the rest inserted.
    pub fn insert_many(&mut self, documents: Vec<Document>) -> QuillResult<Vec<Document>> {
        let mut batch_ids = HashSet::with_capacity(documents.len());
        let mut prepared = Vec::with_capacity(documents.len());

        for (position, document) in documents.into_iter().enumerate() {
            match self.prepare(document, &batch_ids) {
                Ok((id, document)) => {
                    batch_ids.insert(id.clone());
                    prepared.push((id, document));
                }
                Err(e) if self.config.strict() => return Err(e),
                Err(e) => {
                    log::warn!("Skipping document {} of insert batch: {}", position, e);
                }
            }
        }

        let mut inserted = Vec::with_capacity(prepared.len());
        for (id, document) in prepared {
            self.index.insert(id, document.clone());
            inserted.push(document);
        }
        log::debug!("Inserted {} documents", inserted.len());
        Ok(inserted)
    }

    /// Finds live documents matching a query document, in index order.
    pub fn find(
        &self,
        query: &Document,
        projection: Option<&[&str]>,
    ) -> QuillResult<Vec<Document>> {
        self.find_filter(&compile(query)?, projection)
    }

    pub fn find_filter(
        &self,
        filter: &Filter,
        projection: Option<&[&str]>,
    ) -> QuillResult<Vec<Document>> {
        let mut results = Vec::new();
        for (_, document) in self.index.iter_live() {
            if filter.apply(document)? {
                results.push(project(document, projection));
            }
        }
        Ok(results)
    }

    pub fn find_by_id(
        &self,
        id: &DocumentId,
        projection: Option<&[&str]>,
    ) -> QuillResult<Option<Document>> {
        Ok(self.index.get(id).map(|document| project(document, projection)))
    }

    /// Finds documents by identifier, in the order requested. Unknown and
    /// deleted identifiers are skipped.
    pub fn find_by_ids(
        &self,
        ids: &[DocumentId],
        projection: Option<&[&str]>,
    ) -> QuillResult<Vec<Document>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.index.get(id))
            .map(|document| project(document, projection))
            .collect())
    }

    pub fn count(&self, query: &Document) -> QuillResult<usize> {
        self.count_filter(&compile(query)?)
    }

    pub fn count_filter(&self, filter: &Filter) -> QuillResult<usize> {
        let mut count = 0;
        for (_, document) in self.index.iter_live() {
            if filter.apply(document)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Updates every live document matching `query` and returns the updated
    /// documents.
    ///
    /// Either every match is updated or none is: all new documents are
    /// computed before the first one is swapped into the index.
    pub fn update(
        &mut self,
        query: &Document,
        update: &Document,
        projection: Option<&[&str]>,
    ) -> QuillResult<Vec<Document>> {
        let filter = compile(query)?;
        self.update_filter(&filter, update, projection)
    }

    pub fn update_filter(
        &mut self,
        filter: &Filter,
        update: &Document,
        projection: Option<&[&str]>,
    ) -> QuillResult<Vec<Document>> {
        let plan = UpdatePlan::parse(update)?;

        let mut pending = Vec::new();
        for (id, document) in self.index.iter_live() {
            if filter.apply(document)? {
                pending.push((id.clone(), plan.apply(document)?));
            }
        }

        let mut results = Vec::with_capacity(pending.len());
        for (id, document) in pending {
            results.push(project(&document, projection));
            self.index.replace(&id, document);
        }
        log::debug!("Updated {} documents", results.len());
        Ok(results)
    }

    /// Updates the live document with the given identifier, if any.
    pub fn update_by_id(
        &mut self,
        id: &DocumentId,
        update: &Document,
        projection: Option<&[&str]>,
    ) -> QuillResult<Option<Document>> {
        let plan = UpdatePlan::parse(update)?;
        let document = match self.index.get(id) {
            Some(document) => plan.apply(document)?,
            None => return Ok(None),
        };

        let result = project(&document, projection);
        self.index.replace(id, document);
        Ok(Some(result))
    }

    /// Tombstones every live document matching `query` and returns how many
    /// were deleted.
    ///
    /// Deleted documents disappear from reads at once but stay in the raw
    /// index, see [Datastore::len], until the next [Datastore::persist].
    pub fn delete(&mut self, query: &Document) -> QuillResult<usize> {
        let filter = compile(query)?;
        self.delete_filter(&filter)
    }

    pub fn delete_filter(&mut self, filter: &Filter) -> QuillResult<usize> {
        let mut matched = Vec::new();
        for (id, document) in self.index.iter_live() {
            if filter.apply(document)? {
                matched.push(id.clone());
            }
        }

        let deleted = matched
            .iter()
            .filter(|id| self.index.tombstone(id))
            .count();
        log::debug!("Deleted {} documents", deleted);
        Ok(deleted)
    }

    pub fn delete_by_id(&mut self, id: &DocumentId) -> QuillResult<usize> {
        Ok(usize::from(self.index.tombstone(id)))
    }

    /// Removes every record. A file-backed datastore writes the empty state
    /// to its log right away.
    pub fn drop_all(&mut self) -> QuillResult<()> {
        self.index.clear();
        if let Some(log) = &self.log {
            log.persist(&mut self.index, self.config.strict())?;
        }
        Ok(())
    }

    /// Replaces the index with the content of the backing file.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for a memory-only datastore; in strict mode,
    /// `CorruptRecord` for the first line that cannot be restored.
    pub fn load(&mut self) -> QuillResult<LoadReport> {
        let log = self.require_log("load")?;
        let report = log.load(&mut self.index, self.config.strict())?;
        self.last_load_report = Some(report.clone());
        Ok(report)
    }

    /// Writes the live documents to the backing file and purges
    /// tombstones from the index.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for a memory-only datastore; in strict mode,
    /// `CorruptRecord` for a document that cannot be serialized, in which
    /// case neither the index nor the file change.
    pub fn persist(&mut self) -> QuillResult<()> {
        let log = self.require_log("persist")?;
        log.persist(&mut self.index, self.config.strict())
    }

    fn require_log(&self, operation: &str) -> QuillResult<PersistenceLog> {
        match &self.log {
            Some(log) => Ok(log.clone()),
            None => {
                log::error!("Cannot {} a memory-only datastore", operation);
                Err(QuillError::new(
                    &format!("Cannot {} a memory-only datastore", operation),
                    ErrorKind::ConfigurationError,
                ))
            }
        }
    }

    fn prepare(
        &self,
        document: Document,
        batch_ids: &HashSet<DocumentId>,
    ) -> QuillResult<(DocumentId, Document)> {
        let document = if document.has_id() {
            document
        } else {
            let id = self.generate_id(batch_ids)?;
            let mut with_id = Document::new();
            with_id.put(DOC_ID, id.to_value());
            for (key, value) in document {
                with_id.put(key, value);
            }
            with_id
        };

        let id = validate_document(&document)?;
        if self.index.contains_live(&id) || batch_ids.contains(&id) {
            log::error!("Duplicate _id {}", id);
            return Err(QuillError::new(
                &format!("A document with _id {} already exists", id),
                ErrorKind::DuplicateIdentifier,
            ));
        }
        Ok((id, document))
    }

    fn generate_id(&self, batch_ids: &HashSet<DocumentId>) -> QuillResult<DocumentId> {
        let generator = self.config.id_generator();
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = generator.generate();
            if candidate.is_empty() {
                continue;
            }
            let id = DocumentId::Text(candidate);
            if !self.index.contains_live(&id) && !batch_ids.contains(&id) {
                return Ok(id);
            }
        }

        log::error!("Failed to generate a free _id in {} attempts", MAX_ID_ATTEMPTS);
        Err(QuillError::new(
            &format!("Failed to generate a free _id in {} attempts", MAX_ID_ATTEMPTS),
            ErrorKind::InternalError,
        ))
    }
}

use indexmap::IndexMap;

use crate::collection::{Document, DocumentId};

/// An index entry: a stored document and its tombstone flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    document: Document,
    deleted: bool,
}

impl Record {
    pub fn new(document: Document) -> Self {
        Record {
            document,
            deleted: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Whether the record has been soft-deleted and awaits compaction.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// The in-memory index of a datastore.
///
/// Keeps identifiers in insertion order together with their records in one
/// map, so the ordered sequence of identifiers and the identifier to record
/// mapping can never disagree. Tombstoned records stay in the index, and
/// count towards [DocumentIndex::len], until they are purged.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    records: IndexMap<DocumentId, Record>,
}

impl DocumentIndex {
    pub fn new() -> Self {
        DocumentIndex {
            records: IndexMap::new(),
        }
    }

    /// Raw number of records, tombstones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a live record holds `id`.
    pub fn contains_live(&self, id: &DocumentId) -> bool {
        self.records.get(id).is_some_and(|record| !record.deleted)
    }

    /// Returns the live document stored under `id`.
    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.records
            .get(id)
            .filter(|record| !record.deleted)
            .map(|record| &record.document)
    }

    /// Inserts a new record at the end of the index.
    ///
    /// A tombstoned record with the same identifier is dropped first, so the
    /// new record takes the last position rather than the old one.
    pub(crate) fn insert(&mut self, id: DocumentId, document: Document) {
        self.records.shift_remove(&id);
        self.records.insert(id, Record::new(document));
    }

    /// Restores a record read from the log.
    ///
    /// A repeated identifier replaces the earlier record in place.
    pub(crate) fn restore(&mut self, id: DocumentId, document: Document) {
        self.records.insert(id, Record::new(document));
    }

    /// Replaces the document of a live record, keeping its position.
    pub(crate) fn replace(&mut self, id: &DocumentId, document: Document) -> bool {
        match self.records.get_mut(id) {
            Some(record) if !record.deleted => {
                record.document = document;
                true
            }
            _ => false,
        }
    }

    /// Tombstones a live record. Returns `false` if there was nothing live
    /// to delete.
    pub(crate) fn tombstone(&mut self, id: &DocumentId) -> bool {
        match self.records.get_mut(id) {
            Some(record) if !record.deleted => {
                record.deleted = true;
                true
            }
            _ => false,
        }
    }

    /// Drops every record matching `predicate`, keeping the order of the rest.
    pub(crate) fn purge<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&DocumentId, &Record) -> bool,
    {
        let before = self.records.len();
        self.records.retain(|id, record| !predicate(id, record));
        before - self.records.len()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// Iterates over live records in index order.
    pub fn iter_live(&self) -> impl Iterator<Item = (&DocumentId, &Document)> {
        self.records
            .iter()
            .filter(|(_, record)| !record.deleted)
            .map(|(id, record)| (id, &record.document))
    }

    /// Iterates over every record in index order, tombstones included.
    pub fn iter(&self) -> indexmap::map::Iter<'_, DocumentId, Record> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn index() -> DocumentIndex {
        let mut index = DocumentIndex::new();
        index.insert(DocumentId::from(1), doc! { "_id": 1, v: "a" });
        index.insert(DocumentId::from(2), doc! { "_id": 2, v: "b" });
        index.insert(DocumentId::from(3), doc! { "_id": 3, v: "c" });
        index
    }

    fn live_ids(index: &DocumentIndex) -> Vec<DocumentId> {
        index.iter_live().map(|(id, _)| id.clone()).collect()
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let index = index();
        assert_eq!(
            live_ids(&index),
            vec![DocumentId::from(1), DocumentId::from(2), DocumentId::from(3)]
        );
    }

    #[test]
    fn test_tombstone_hides_but_keeps_raw_size() {
        let mut index = index();
        assert!(index.tombstone(&DocumentId::from(2)));
        assert!(!index.tombstone(&DocumentId::from(2)));
        assert_eq!(index.len(), 3);
        assert!(index.get(&DocumentId::from(2)).is_none());
        assert!(!index.contains_live(&DocumentId::from(2)));
        assert_eq!(live_ids(&index), vec![DocumentId::from(1), DocumentId::from(3)]);
    }

    #[test]
    fn test_insert_over_tombstone_moves_to_end() {
        let mut index = index();
        index.tombstone(&DocumentId::from(1));
        index.insert(DocumentId::from(1), doc! { "_id": 1, v: "new" });
        assert_eq!(index.len(), 3);
        assert_eq!(
            live_ids(&index),
            vec![DocumentId::from(2), DocumentId::from(3), DocumentId::from(1)]
        );
    }

    #[test]
    fn test_restore_replaces_in_place() {
        let mut index = index();
        index.restore(DocumentId::from(1), doc! { "_id": 1, v: "again" });
        assert_eq!(live_ids(&index)[0], DocumentId::from(1));
        assert_eq!(
            index.get(&DocumentId::from(1)).unwrap().get("v"),
            Some(&crate::common::Value::from("again"))
        );
    }

    #[test]
    fn test_replace_skips_tombstones() {
        let mut index = index();
        assert!(index.replace(&DocumentId::from(1), doc! { "_id": 1, v: "z" }));
        index.tombstone(&DocumentId::from(2));
        assert!(!index.replace(&DocumentId::from(2), doc! { "_id": 2 }));
        assert!(!index.replace(&DocumentId::from(9), doc! { "_id": 9 }));
    }

    #[test]
    fn test_purge_keeps_order() {
        let mut index = index();
        index.tombstone(&DocumentId::from(2));
        assert_eq!(index.purge(|_, record| record.is_deleted()), 1);
        assert_eq!(index.len(), 2);
        assert_eq!(live_ids(&index), vec![DocumentId::from(1), DocumentId::from(3)]);
    }
}

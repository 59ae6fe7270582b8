use quilldb::errors::{ErrorKind, QuillError, QuillResult};
use quilldb::{Datastore, DatastoreBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::{env, fs};

/// Runs a test between a setup and a teardown step.
///
/// `after` runs even when `test` fails or panics, so temporary database
/// directories never outlive a failing test.
pub fn run_test<B, T, A>(before: B, test: T, after: A)
where
    B: FnOnce() -> QuillResult<TestContext>,
    T: FnOnce(&mut TestContext) -> QuillResult<()>,
    A: FnOnce(TestContext) -> QuillResult<()>,
{
    let mut ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| test(&mut ctx)));
    let after_result = after(ctx);

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic) => panic::resume_unwind(panic),
    }

    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

/// A file-backed datastore living in its own temporary directory.
pub struct TestContext {
    root: PathBuf,
    store: Datastore,
}

impl TestContext {
    pub fn new(root: PathBuf, store: Datastore) -> Self {
        Self { root, store }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&mut self) -> &mut Datastore {
        &mut self.store
    }

    /// Path of the backing file of the context's datastore.
    pub fn db_path(&self) -> QuillResult<PathBuf> {
        self.store.config().db_path().ok_or_else(|| {
            QuillError::new("Test datastore has no backing file", ErrorKind::InternalError)
        })
    }

    /// A builder pointing at the same backing file as the context's
    /// datastore.
    pub fn builder(&self) -> DatastoreBuilder {
        Datastore::builder()
            .root(&self.root)
            .name(self.store.config().name())
            .strict(self.store.config().strict())
    }

    /// Opens the backing file again in a fresh datastore and makes it the
    /// context's datastore.
    pub fn reopen(&mut self) -> QuillResult<()> {
        self.store = self.builder().open()?;
        Ok(())
    }

    /// Overwrites the backing file with raw text.
    pub fn write_log(&self, content: &str) -> QuillResult<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.db_path()?, content)?;
        Ok(())
    }

    pub fn read_log(&self) -> QuillResult<String> {
        Ok(fs::read_to_string(self.db_path()?)?)
    }
}

pub fn random_path() -> PathBuf {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join(format!("quilldb-{}", id))
}

pub fn create_test_context() -> QuillResult<TestContext> {
    let root = random_path();
    let store = Datastore::builder().root(&root).name("test").open()?;
    Ok(TestContext::new(root, store))
}

pub fn create_strict_test_context() -> QuillResult<TestContext> {
    let root = random_path();
    let store = Datastore::builder()
        .root(&root)
        .name("test")
        .strict(true)
        .open()?;
    Ok(TestContext::new(root, store))
}

pub fn cleanup(ctx: TestContext) -> QuillResult<()> {
    if ctx.root.exists() {
        fs::remove_dir_all(&ctx.root)?;
    }
    Ok(())
}

use crate::memory::MemoryStore;
use async_trait::async_trait;
use rdf_dal_common::error::StorageError;
use rdf_dal_common::{QuerySolution, SparqlStore};
use rdf_dal_model::io::{parse_ntriples, write_ntriples};
use rdf_dal_model::Graph;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

const DATA_FILE: &str = "data.nt";
const TEMPORARY_DATA_FILE: &str = "data.nt.tmp";

/// A [MemoryStore] that is persisted as N-Triples in a directory.
///
/// The data is loaded from `<location>/data.nt` when the store is opened and written back on
/// [DirectoryStore::flush] and [SparqlStore::close]. Changes that have not been flushed are lost
/// if the process terminates.
pub struct DirectoryStore {
    location: PathBuf,
    inner: MemoryStore,
    /// Serializes writers of the data file.
    flush_lock: Mutex<()>,
}

impl DirectoryStore {
    /// Opens the store in `location`.
    ///
    /// If the directory does not exist, it is created if `create_missing` is set. Otherwise,
    /// [StorageError::MissingLocation] is returned.
    pub fn open(location: impl Into<PathBuf>, create_missing: bool) -> Result<Self, StorageError> {
        let location = location.into();
        if !location.is_dir() {
            if !create_missing {
                return Err(StorageError::MissingLocation(location));
            }
            fs::create_dir_all(&location)?;
        }

        let inner = MemoryStore::new(location.display().to_string())?;
        let data_file = location.join(DATA_FILE);
        if data_file.is_file() {
            let graph = parse_ntriples(BufReader::new(File::open(&data_file)?))
                .map_err(StorageError::other)?;
            inner.insert_graph(&graph)?;
        }

        info!(
            location = %location.display(),
            statements = inner.len()?,
            "Opened directory store"
        );
        Ok(Self {
            location,
            inner,
            flush_lock: Mutex::new(()),
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Returns the number of statements in the store.
    pub fn len(&self) -> Result<usize, StorageError> {
        self.inner.len()
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        self.inner.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Writes the current statements to the data file.
    ///
    /// The data is written to a temporary file first and then moved over the data file, so that
    /// an interrupted flush never leaves a truncated data file behind.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let _guard = self.flush_lock.lock().await;
        self.write_data_file()
    }

    fn write_data_file(&self) -> Result<(), StorageError> {
        let graph = self.inner.default_graph()?;
        let temporary = self.location.join(TEMPORARY_DATA_FILE);
        let mut writer = write_ntriples(&graph, BufWriter::new(File::create(&temporary)?))?;
        writer.flush()?;
        fs::rename(&temporary, self.location.join(DATA_FILE))?;

        info!(
            location = %self.location.display(),
            statements = graph.len(),
            "Flushed directory store"
        );
        Ok(())
    }
}

#[async_trait]
impl SparqlStore for DirectoryStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn execute_update(&self, update: &str) -> Result<(), StorageError> {
        self.inner.execute_update(update).await
    }

    async fn execute_select(&self, query: &str) -> Result<Vec<QuerySolution>, StorageError> {
        self.inner.execute_select(query).await
    }

    async fn execute_construct(&self, query: &str) -> Result<Graph, StorageError> {
        self.inner.execute_construct(query).await
    }

    /// Flushes the store and closes it.
    async fn close(&self) -> Result<(), StorageError> {
        let _guard = self.flush_lock.lock().await;
        if self.inner.is_closed() {
            return Ok(());
        }
        self.write_data_file()?;
        self.inner.close().await
    }
}

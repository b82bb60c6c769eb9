use crate::errors::StoreError;
use crate::models::{Counter, LocalCounters, TributeUpdate};
use crate::remote::{RestTable, TributeTable};
use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{error, warn};

/// String key/value storage the counters are mirrored into.
#[allow(async_fn_in_trait)]
pub trait KeyValueBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object file of string-encoded values, read fresh on every access.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unparseable file reads as empty. Only I/O failures are
    /// errors.
    async fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                error!("ignoring unreadable data file {}: {err}", self.path.display());
                Ok(BTreeMap::new())
            }
        }
    }
}

impl KeyValueBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.read_entries().await?;
        Ok(entries.remove(key))
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(&entries)?;
        fs::write(&self.path, payload).await?;
        Ok(())
    }
}

/// Exposes the remote tribute row through the local key names.
#[derive(Debug, Clone)]
pub struct RowBackend<T> {
    table: T,
}

impl<T: TributeTable> RowBackend<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }
}

fn counter_for(key: &str) -> Result<Counter, StoreError> {
    Counter::from_key(key).ok_or_else(|| StoreError::UnknownKey(key.to_string()))
}

impl<T: TributeTable> KeyValueBackend for RowBackend<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let counter = counter_for(key)?;
        let record = self.table.fetch_row().await?;
        Ok(Some(record.get(counter).to_string()))
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let counter = counter_for(key)?;
        let count = parse_count(key, value)?;
        self.table
            .update_row(TributeUpdate::set(counter, count))
            .await?;
        Ok(())
    }
}

/// Backend chosen at server startup.
#[derive(Clone)]
pub enum Backend {
    File(FileBackend),
    Remote(RowBackend<RestTable>),
}

impl KeyValueBackend for Backend {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            Backend::File(backend) => backend.get(key).await,
            Backend::Remote(backend) => backend.get(key).await,
        }
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            Backend::File(backend) => backend.set(key, value).await,
            Backend::Remote(backend) => backend.set(key, value).await,
        }
    }
}

/// Strict base-10 parse of a stored count.
pub fn parse_count(key: &str, raw: &str) -> Result<u64, StoreError> {
    raw.trim().parse::<u64>().map_err(|_| StoreError::Parse {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// In-memory tribute counters mirrored to a persistence backend.
///
/// A counter whose last read failed is stale: its in-memory value is not
/// known to match the backend, so it is re-read before the next write.
pub struct CounterStore<B> {
    backend: B,
    counters: LocalCounters,
    stale: HashSet<Counter>,
}

impl<B: KeyValueBackend> CounterStore<B> {
    /// Creates the store and loads both counters from the backend.
    pub async fn open(backend: B) -> Self {
        let mut store = Self {
            backend,
            counters: LocalCounters::default(),
            stale: HashSet::new(),
        };
        store.load_all().await;
        store
    }

    pub fn counters(&self) -> LocalCounters {
        self.counters
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_stale(&self, counter: Counter) -> bool {
        self.stale.contains(&counter)
    }

    /// Last persisted value, or the counter's default when the entry is
    /// absent or not a count. Backend read failures are returned.
    pub async fn try_load(&self, counter: Counter) -> Result<u64, StoreError> {
        let key = counter.key();
        let Some(raw) = self.backend.get(key).await? else {
            return Ok(counter.default_count());
        };

        match parse_count(key, &raw) {
            Ok(count) => Ok(count),
            Err(err) => {
                warn!("{err}, using default {}", counter.default_count());
                Ok(counter.default_count())
            }
        }
    }

    /// Like `try_load`, with the default standing in for a failed read.
    pub async fn load(&self, counter: Counter) -> u64 {
        self.try_load(counter).await.unwrap_or_else(|err| {
            warn!("failed to read {}: {err}", counter.key());
            counter.default_count()
        })
    }

    /// Refreshes both counters. A counter that cannot be read keeps its
    /// current value and is marked stale.
    pub async fn load_all(&mut self) -> LocalCounters {
        for counter in Counter::ALL {
            match self.try_load(counter).await {
                Ok(count) => {
                    *self.counters.slot(counter) = count;
                    self.stale.remove(&counter);
                }
                Err(err) => {
                    warn!(
                        "failed to read {}: {err}, keeping {}",
                        counter.key(),
                        self.counters.get(counter)
                    );
                    self.stale.insert(counter);
                }
            }
        }
        self.counters
    }

    /// Adds one tribute and persists the new value. A stale counter is re-read
    /// first and nothing is written if that read fails. The in-memory count
    /// stays advanced when the write itself fails.
    pub async fn increment(&mut self, counter: Counter) -> Result<u64, StoreError> {
        if self.is_stale(counter) {
            let count = self.try_load(counter).await?;
            *self.counters.slot(counter) = count;
            self.stale.remove(&counter);
        }

        let slot = self.counters.slot(counter);
        *slot = slot.saturating_add(1);
        let value = *slot;

        self.backend
            .set(counter.key(), &value.to_string())
            .await?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RemoteError;
    use crate::models::{TributeRecord, TributeUpdate};
    use crate::remote::MemoryTable;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    /// Row table whose next `failures` fetches fail as if the host were down.
    #[derive(Clone)]
    struct FlakyTable {
        inner: MemoryTable,
        failures: Arc<AtomicUsize>,
    }

    impl FlakyTable {
        fn new(inner: MemoryTable) -> Self {
            Self {
                inner,
                failures: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn fail_next(&self, fetches: usize) {
            self.failures.store(fetches, Ordering::SeqCst);
        }

        fn take_failure(&self) -> bool {
            self.failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok()
        }
    }

    impl TributeTable for FlakyTable {
        async fn ensure_schema(&self) -> Result<TributeRecord, RemoteError> {
            self.inner.ensure_schema().await
        }

        async fn fetch_row(&self) -> Result<TributeRecord, RemoteError> {
            if self.take_failure() {
                return Err(RemoteError::Api {
                    status: 503,
                    message: "upstream unavailable".to_string(),
                });
            }
            self.inner.fetch_row().await
        }

        async fn update_row(&self, update: TributeUpdate) -> Result<TributeRecord, RemoteError> {
            self.inner.update_row(update).await
        }

        async fn ping(&self) -> Result<Option<u64>, RemoteError> {
            self.inner.ping().await
        }

        async fn insert_seed(&self) -> Result<TributeRecord, RemoteError> {
            self.inner.insert_seed().await
        }
    }

    struct FailingBackend;

    impl KeyValueBackend for FailingBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(std::io::Error::other("quota exceeded").into())
        }
    }

    fn unique_data_path() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("tribute_wall_store_{}_{}", std::process::id(), nanos));
        path.push("tributes.json");
        path
    }

    #[tokio::test]
    async fn empty_storage_loads_defaults() {
        let store = CounterStore::open(MemoryBackend::new()).await;
        assert_eq!(store.counters(), LocalCounters { candles: 50, flowers: 20 });
    }

    #[tokio::test]
    async fn stored_values_override_defaults() {
        let backend = MemoryBackend::new()
            .with_entry("yzn_candles", "7")
            .with_entry("yzn_flowers", "0");
        let store = CounterStore::open(backend).await;
        assert_eq!(store.counters(), LocalCounters { candles: 7, flowers: 0 });
    }

    #[tokio::test]
    async fn increment_persists_and_survives_reload() {
        let mut store = CounterStore::open(MemoryBackend::new()).await;
        assert_eq!(store.increment(Counter::Candles).await.unwrap(), 51);
        assert_eq!(
            store.backend().get("yzn_candles").await.unwrap().as_deref(),
            Some("51")
        );

        let reloaded = CounterStore::open(store.backend().clone()).await;
        assert_eq!(reloaded.counters().candles, 51);
        assert_eq!(reloaded.counters().flowers, 20);
    }

    #[tokio::test]
    async fn increments_are_additive() {
        let backend = MemoryBackend::new().with_entry("yzn_flowers", "100");
        let mut store = CounterStore::open(backend).await;
        for _ in 0..25 {
            store.increment(Counter::Flowers).await.unwrap();
        }
        assert_eq!(store.counters().flowers, 125);
        assert_eq!(store.load(Counter::Flowers).await, 125);
        assert_eq!(store.counters().candles, 50);
    }

    #[tokio::test]
    async fn corrupted_values_fail_closed_to_defaults() {
        let backend = MemoryBackend::new()
            .with_entry("yzn_candles", "51abc")
            .with_entry("yzn_flowers", "-3");
        let store = CounterStore::open(backend).await;
        assert_eq!(store.counters(), LocalCounters::default());
    }

    #[test]
    fn parse_count_reports_parse_error() {
        assert_eq!(parse_count("yzn_candles", " 12 ").unwrap(), 12);
        let err = parse_count("yzn_candles", "NaN").unwrap_err();
        assert!(matches!(err, StoreError::Parse { ref key, .. } if key == "yzn_candles"));
    }

    #[tokio::test]
    async fn failed_write_still_advances_memory() {
        let mut store = CounterStore::open(FailingBackend).await;
        assert_eq!(store.counters(), LocalCounters::default());

        assert!(store.increment(Counter::Candles).await.is_err());
        assert_eq!(store.counters().candles, 51);
    }

    #[tokio::test]
    async fn file_backend_round_trips_across_instances() {
        let path = unique_data_path();
        let mut store = CounterStore::open(FileBackend::new(&path)).await;
        store.increment(Counter::Candles).await.unwrap();
        store.increment(Counter::Flowers).await.unwrap();

        let reopened = CounterStore::open(FileBackend::new(&path)).await;
        assert_eq!(reopened.counters(), LocalCounters { candles: 51, flowers: 21 });

        let raw: BTreeMap<String, String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw.get("yzn_candles").map(String::as_str), Some("51"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn corrupted_file_falls_back_and_is_rewritten() {
        let path = unique_data_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not json").unwrap();

        let mut store = CounterStore::open(FileBackend::new(&path)).await;
        assert_eq!(store.counters(), LocalCounters::default());
        assert_eq!(store.increment(Counter::Flowers).await.unwrap(), 21);

        let reopened = CounterStore::open(FileBackend::new(&path)).await;
        assert_eq!(reopened.counters().flowers, 21);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn row_backend_maps_keys_to_columns() {
        let table = MemoryTable::with_row(3, 8);
        let mut store = CounterStore::open(RowBackend::new(table.clone())).await;
        assert_eq!(store.counters(), LocalCounters { candles: 3, flowers: 8 });

        store.increment(Counter::Flowers).await.unwrap();
        let row = table.fetch_row().await.unwrap();
        assert_eq!((row.candles, row.flowers), (3, 9));
    }

    #[tokio::test]
    async fn row_backend_without_row_uses_defaults() {
        let store = CounterStore::open(RowBackend::new(MemoryTable::new())).await;
        assert_eq!(store.counters(), LocalCounters::default());
    }

    #[tokio::test]
    async fn row_backend_rejects_unknown_keys() {
        let backend = RowBackend::new(MemoryTable::with_row(0, 0));
        assert!(matches!(
            backend.get("yzn_incense").await,
            Err(StoreError::UnknownKey(_))
        ));
    }

    #[tokio::test]
    async fn failed_read_at_open_does_not_overwrite_remote_counts() {
        let table = MemoryTable::with_row(1000, 5);
        let flaky = FlakyTable::new(table.clone());
        flaky.fail_next(1);

        let mut store = CounterStore::open(RowBackend::new(flaky)).await;
        assert!(store.is_stale(Counter::Candles));
        assert!(!store.is_stale(Counter::Flowers));
        assert_eq!(store.counters().flowers, 5);

        assert_eq!(store.increment(Counter::Candles).await.unwrap(), 1001);
        assert!(!store.is_stale(Counter::Candles));
        let row = table.fetch_row().await.unwrap();
        assert_eq!((row.candles, row.flowers), (1001, 5));
    }

    #[tokio::test]
    async fn increment_refuses_to_write_while_reads_fail() {
        let table = MemoryTable::with_row(1000, 5);
        let flaky = FlakyTable::new(table.clone());
        flaky.fail_next(usize::MAX);

        let mut store = CounterStore::open(RowBackend::new(flaky.clone())).await;
        assert!(matches!(
            store.increment(Counter::Candles).await,
            Err(StoreError::Remote(RemoteError::Api { status: 503, .. }))
        ));
        assert_eq!(table.fetch_row().await.unwrap().candles, 1000);

        flaky.fail_next(0);
        assert_eq!(store.increment(Counter::Candles).await.unwrap(), 1001);
        assert_eq!(table.fetch_row().await.unwrap().candles, 1001);
    }

    #[tokio::test]
    async fn failed_reload_keeps_last_known_counts() {
        let table = MemoryTable::with_row(1000, 5);
        let flaky = FlakyTable::new(table.clone());
        let mut store = CounterStore::open(RowBackend::new(flaky.clone())).await;
        assert_eq!(store.counters(), LocalCounters { candles: 1000, flowers: 5 });

        flaky.fail_next(2);
        assert_eq!(
            store.load_all().await,
            LocalCounters { candles: 1000, flowers: 5 }
        );

        assert_eq!(store.increment(Counter::Flowers).await.unwrap(), 6);
        let row = table.fetch_row().await.unwrap();
        assert_eq!((row.candles, row.flowers), (1000, 6));
    }
}

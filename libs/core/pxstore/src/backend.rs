use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

// -----------------------------------------------------------------------------
// KvBackend
// -----------------------------------------------------------------------------
/// The host-provided key/value surface the settings blob lives behind.
///
/// Values are opaque text; structured records go through
/// [`encode_record`](crate::encode_record) / [`decode_record`](crate::decode_record)
/// on their way in and out. Writes are last-writer-wins; concurrent writers
/// are not guarded against.
pub trait KvBackend {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn delete(&mut self, key: &str);
}

// -----------------------------------------------------------------------------
// MemoryBackend
// -----------------------------------------------------------------------------
/// In-process backend for tests and hosts without durable storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
}

impl MemoryBackend {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

// -----------------------------------------------------------------------------
// FileBackend
// -----------------------------------------------------------------------------
/// Backend persisting the whole store as a single JSON object file.
///
/// Every read goes to disk and every write rewrites the file; no state is
/// held in process. IO and parse failures are logged and surface as missing
/// keys.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(err) => {
                log::warn!("cannot read store file {}: {err}", self.path.display());
                return BTreeMap::new();
            }
        };
        match serde_json::from_str(&text) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!(
                    "store file {} is not a JSON object, starting empty: {err}",
                    self.path.display()
                );
                BTreeMap::new()
            }
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) {
        let text = match serde_json::to_string_pretty(entries) {
            Ok(text) => text,
            Err(err) => {
                log::error!("cannot serialize store file: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, text) {
            log::error!("cannot write store file {}: {err}", self.path.display());
        }
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        let mut entries = self.read_all();
        entries.insert(key.to_owned(), value);
        self.write_all(&entries);
    }

    fn delete(&mut self, key: &str) {
        let mut entries = self.read_all();
        if entries.remove(key).is_some() {
            self.write_all(&entries);
        }
    }
}

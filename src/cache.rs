//! Contexts and the currently selected context are kept as small JSON files on disk.
//!
//! To use the cache system, implement the Cacheable and CacheKey traits, then you can
//! use the read(), write(), and read_all() functions. The `_from`/`_to` variants take the cache
//! root explicitly, for callers that don't keep their files under $HOME.
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// You need a cache key in order to read something from the cache.
pub trait CacheKey {
    fn as_path(&self) -> String;
}

/// Anything that can be cached needs to implement this trait.
///
/// Cacheable has an associated type so that we can always pair up a struct to be cached with its
/// cache key. Trying to read() a struct using some other struct's key type won't compile.
pub trait Cacheable {
    type CacheKey;

    fn cache_key(&self) -> Self::CacheKey;

    /// All structs of the same type are saved in the same folder, named after the type id. This
    /// is what lets read_all() work. Type ids should be unique.
    fn type_id() -> &'static str;
}

pub fn read<D, K>(cache_key: &K) -> Result<D, crate::Error>
where
    D: Cacheable<CacheKey = K> + DeserializeOwned,
    K: CacheKey,
{
    read_from(&cache_root()?, cache_key)
}

pub fn write<D, K>(data: &D) -> Result<(), crate::Error>
where
    D: Cacheable<CacheKey = K> + Serialize,
    K: CacheKey,
{
    write_to(&cache_root()?, data)
}

pub fn read_all<D>() -> Result<Vec<D>, crate::Error>
where
    D: Cacheable + DeserializeOwned,
{
    read_all_from(&cache_root()?)
}

pub fn read_from<D, K>(root: &Path, cache_key: &K) -> Result<D, crate::Error>
where
    D: Cacheable<CacheKey = K> + DeserializeOwned,
    K: CacheKey,
{
    let file_location = get_cache_path(root, D::type_id(), cache_key.as_path().as_str())?;

    let data = serde_json::from_reader(fs::File::open(file_location)?)?;

    Ok(data)
}

pub fn write_to<D, K>(root: &Path, data: &D) -> Result<(), crate::Error>
where
    D: Cacheable<CacheKey = K> + Serialize,
    K: CacheKey,
{
    let file_location = get_cache_path(root, D::type_id(), data.cache_key().as_path().as_str())?;

    let data = serde_json::to_string(&data)?;

    fs::write(file_location, data)?;

    Ok(())
}

pub fn read_all_from<D>(root: &Path) -> Result<Vec<D>, crate::Error>
where
    D: Cacheable + DeserializeOwned,
{
    let folder = require_cache_folder(root, D::type_id())?;

    let mut all = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() {
            all.push(serde_json::from_reader(fs::File::open(path)?)?);
        }
    }

    Ok(all)
}

fn get_cache_path(root: &Path, type_id: &'static str, cache_key: &str) -> Result<PathBuf, crate::Error> {
    let mut location = require_cache_folder(root, type_id)?;

    location.push(cache_key);

    Ok(location)
}

fn require_cache_folder(root: &Path, type_id: &'static str) -> Result<PathBuf, crate::Error> {
    let path = root.join(type_id);

    // we have to make sure it exists, right?
    fs::create_dir_all(&path)?;

    Ok(path)
}

/// `$HOME/.cache/agent-query/cache/v1`
pub fn cache_root() -> Result<PathBuf, crate::Error> {
    let home = std::env::var("HOME")?;

    let mut path = PathBuf::from(home);
    path.push(".cache");
    path.push("agent-query");
    path.push("cache");
    path.push("v1");

    Ok(path)
}

/// Used for things that only have a single instance, like the current context.
pub struct SharedCacheKey(String);

impl CacheKey for SharedCacheKey {
    fn as_path(&self) -> String {
        self.0.clone()
    }
}

impl SharedCacheKey {
    pub fn of<D: Cacheable>() -> Self {
        SharedCacheKey(D::type_id().to_owned())
    }
}

#[cfg(test)]
mod test {
    use super::{read_all_from, read_from, write_to, SharedCacheKey};
    use crate::analyze::{DBType, DatabaseName, ServerParams};
    use crate::context::{Context, ContextName};
    
    fn context(name: &str) -> Context {
        Context {
            name: name.into(),
            server_params: ServerParams {
                db_type: DBType::PostgresSQL,
                hostname: "db.internal".to_string(),
                port: 5432,
                user: "agents".to_string(),
                database: DatabaseName("crm".to_string()),
            },
        }
    }

    #[test]
    fn test_write_then_read() {
        let root = tempfile::tempdir().unwrap();

        write_to(root.path(), &context("crm")).unwrap();
        let found: Context = read_from(root.path(), &ContextName::from("crm")).unwrap();

        assert_eq!(context("crm"), found);
    }

    #[test]
    fn test_read_all() {
        let root = tempfile::tempdir().unwrap();

        write_to(root.path(), &context("one")).unwrap();
        write_to(root.path(), &context("two")).unwrap();
        // stored in a different folder, must not show up
        write_to(root.path(), &ContextName::from("one")).unwrap();

        let mut names: Vec<String> = read_all_from::<Context>(root.path())
            .unwrap()
            .into_iter()
            .map(|context| context.name.as_str().to_string())
            .collect();
        names.sort();

        assert_eq!(vec!["one", "two"], names);
    }

    #[test]
    fn test_current_context_uses_a_shared_key() {
        let root = tempfile::tempdir().unwrap();

        write_to(root.path(), &ContextName::from("first")).unwrap();
        write_to(root.path(), &ContextName::from("second")).unwrap();

        let current: ContextName =
            read_from(root.path(), &SharedCacheKey::of::<ContextName>()).unwrap();

        assert_eq!(ContextName::from("second"), current);
    }

    #[test]
    fn test_missing_entries_are_errors() {
        let root = tempfile::tempdir().unwrap();

        let found = read_from::<Context, _>(root.path(), &ContextName::from("nope"));

        assert!(found.is_err());
    }
}

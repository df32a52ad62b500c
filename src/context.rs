//! Saved database connections.
//!
//! A context is a named set of server parameters. One of them can be marked as current, that's
//! the one the CLI runs queries against. The server addresses contexts by name instead, the web
//! client calls that name a connection id.
use crate::analyze::{Schema, ServerParams};
use crate::cache::{self, CacheKey, Cacheable, SharedCacheKey};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub name: ContextName,
    pub server_params: ServerParams,
}

/// Names are free text, they only have to be unique.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextName(String);

/// The schema last read through a context, so browsing it doesn't need a database round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSchema {
    pub context: ContextName,
    pub schema: Schema,
}

pub struct SchemaKey(ContextName);

impl Context {
    pub fn named(name: &ContextName) -> Result<Context, crate::Error> {
        cache::read(name)
    }

    pub fn current() -> Result<Context, crate::Error> {
        ContextName::current().and_then(|name| Context::named(&name))
    }

    /// Every saved context, sorted by name.
    pub fn all() -> Result<Vec<Context>, crate::Error> {
        Ok(by_name(cache::read_all()?))
    }

    pub fn all_in(root: &Path) -> Result<Vec<Context>, crate::Error> {
        Ok(by_name(cache::read_all_from(root)?))
    }
}

fn by_name(mut contexts: Vec<Context>) -> Vec<Context> {
    contexts.sort_by(|left, right| left.name.cmp(&right.name));

    contexts
}

impl SavedSchema {
    /// The saved schema of a context, `None` when it was never read.
    pub fn load(root: &Path, name: &ContextName) -> Result<Option<SavedSchema>, crate::Error> {
        match cache::read_from(root, &name.schema_key()) {
            Ok(saved) => Ok(Some(saved)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl ContextName {
    pub fn new(name: impl Into<String>) -> Self {
        ContextName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn current() -> Result<ContextName, crate::Error> {
        cache::read(&SharedCacheKey::of::<ContextName>())
    }

    pub fn make_current(&self) -> Result<(), crate::Error> {
        cache::write(self)
    }

    pub fn schema_key(&self) -> SchemaKey {
        SchemaKey(self.clone())
    }
}

impl From<&str> for ContextName {
    fn from(value: &str) -> Self {
        ContextName::new(value)
    }
}

impl From<String> for ContextName {
    fn from(value: String) -> Self {
        ContextName::new(value)
    }
}

impl AsRef<str> for ContextName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for ContextName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Cacheable for Context {
    type CacheKey = ContextName;

    fn cache_key(&self) -> ContextName {
        self.name.clone()
    }

    fn type_id() -> &'static str {
        "context"
    }
}

impl CacheKey for ContextName {
    fn as_path(&self) -> String {
        format!("context_{self}.json")
    }
}

/// The current context is a single file holding just a name.
impl Cacheable for ContextName {
    type CacheKey = SharedCacheKey;

    fn cache_key(&self) -> SharedCacheKey {
        SharedCacheKey::of::<ContextName>()
    }

    fn type_id() -> &'static str {
        "current_context"
    }
}

impl Cacheable for SavedSchema {
    type CacheKey = SchemaKey;

    fn cache_key(&self) -> SchemaKey {
        self.context.schema_key()
    }

    fn type_id() -> &'static str {
        "schema"
    }
}

impl CacheKey for SchemaKey {
    fn as_path(&self) -> String {
        format!("schema_{}.json", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::{Context, ContextName, SavedSchema};
    use crate::analyze::{DBType, DatabaseName, Schema, ServerParams};
    use crate::cache::{read_from, write_to};

    fn context(name: &str, database: &str) -> Context {
        Context {
            name: ContextName::new(name),
            server_params: ServerParams {
                db_type: DBType::MariaDB,
                hostname: "localhost".to_string(),
                port: 3306,
                user: "agents".to_string(),
                database: DatabaseName(database.to_string()),
            },
        }
    }

    #[test]
    fn test_names_read_as_text() {
        let name = ContextName::from("school db".to_string());

        assert_eq!("school db", name.as_str());
        assert_eq!("school db", name.to_string());
        assert_eq!("\"school db\"", serde_json::to_string(&name).unwrap());
    }

    #[test]
    fn test_all_contexts_are_sorted_by_name() {
        let root = tempfile::tempdir().unwrap();

        write_to(root.path(), &context("staging", "school")).unwrap();
        write_to(root.path(), &context("local", "school_dev")).unwrap();
        write_to(root.path(), &context("production", "school")).unwrap();

        let names: Vec<_> = Context::all_in(root.path())
            .unwrap()
            .into_iter()
            .map(|context| context.name)
            .collect();

        assert_eq!(
            vec![
                ContextName::new("local"),
                ContextName::new("production"),
                ContextName::new("staging")
            ],
            names
        );
    }

    #[test]
    fn test_schemas_are_saved_per_context() {
        let root = tempfile::tempdir().unwrap();
        let saved = SavedSchema {
            context: ContextName::new("local"),
            schema: Schema::from_columns(vec![("students".to_string(), "id".to_string())]),
        };

        write_to(root.path(), &saved).unwrap();

        let found: SavedSchema =
            read_from(root.path(), &ContextName::new("local").schema_key()).unwrap();
        assert_eq!(saved, found);

        let staging = ContextName::new("staging");
        let other = read_from::<SavedSchema, _>(root.path(), &staging.schema_key());
        assert!(other.unwrap_err().is_not_found());
        assert_eq!(None, SavedSchema::load(root.path(), &staging).unwrap());
        assert_eq!(
            Some(saved),
            SavedSchema::load(root.path(), &ContextName::new("local")).unwrap()
        );

        // schemas live in their own folder, they never show up as contexts
        assert!(Context::all_in(root.path()).unwrap().is_empty());
    }
}

//! File-backed bookmark collection.
//!
//! Bookmarks are schema-free JSON objects. The only field the store looks at is
//! `Link`, which identifies records for removal. The whole collection lives behind
//! a single lock and is rewritten in full after every mutation.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{GatewayError, StoreError};

pub type Bookmark = Map<String, Value>;

pub const LINK_FIELD: &str = "Link";

pub struct BookmarkStore {
    inner: Arc<Collection>,
}

struct Collection {
    path: PathBuf,
    items: RwLock<Vec<Bookmark>>,
}

impl BookmarkStore {
    /// Loads the collection from `path`.
    ///
    /// A missing file, an empty file and a `null` document all yield an empty
    /// collection. Any other content must be a JSON array of objects.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let items = match tokio::fs::read(&path).await {
            Ok(data) => Self::decode(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = ?path, "no bookmarks file, starting empty");
                Vec::new()
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        tracing::info!(path = ?path, count = items.len(), "loaded bookmarks");
        Ok(Self {
            inner: Arc::new(Collection {
                path,
                items: RwLock::new(items),
            }),
        })
    }

    fn decode(data: &[u8]) -> Result<Vec<Bookmark>, StoreError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let items: Option<Vec<Bookmark>> = serde_json::from_slice(data).map_err(StoreError::Deserialize)?;
        Ok(items.unwrap_or_default())
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub async fn list(&self) -> Vec<Bookmark> {
        self.inner.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.items.read().await.len()
    }

    /// Validates a raw request body as a JSON object and appends it.
    pub async fn add_raw(&self, body: &[u8]) -> Result<(), GatewayError> {
        let record: Bookmark = serde_json::from_slice(body)
            .map_err(|e| GatewayError::Validation(format!("bookmark is not a JSON object: {}", e)))?;
        self.add(record).await
    }

    /// Appends `record` and persists the collection.
    ///
    /// The mutation runs on its own task, so it completes even when the caller
    /// stops waiting (a client disconnect drops the handler future). Memory is
    /// only updated after the file write succeeds.
    pub async fn add(&self, record: Bookmark) -> Result<(), GatewayError> {
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.add(record).await })
            .await
            .map_err(join_error)?
    }

    /// Removes every record whose `Link` equals `link` and returns how many went.
    /// Runs to completion like [`BookmarkStore::add`].
    pub async fn remove(&self, link: &str) -> Result<usize, GatewayError> {
        if link.is_empty() {
            return Err(GatewayError::Validation("missing Link".to_string()));
        }

        let inner = self.inner.clone();
        let link = link.to_string();
        tokio::spawn(async move { inner.remove(&link).await })
            .await
            .map_err(join_error)?
    }
}

impl Collection {
    async fn add(&self, record: Bookmark) -> Result<(), GatewayError> {
        let mut items = self.items.write().await;
        let mut next = items.clone();
        next.push(record);

        if let Err(e) = self.persist(&next).await {
            tracing::error!(error = %crate::unpack_error(&e), path = ?self.path, "failed to persist bookmark, collection unchanged");
            return Err(e.into());
        }

        *items = next;
        tracing::info!(count = items.len(), "bookmark added");
        Ok(())
    }

    async fn remove(&self, link: &str) -> Result<usize, GatewayError> {
        let mut items = self.items.write().await;
        let kept: Vec<Bookmark> = items
            .iter()
            .filter(|b| !matches_link(b, link))
            .cloned()
            .collect();
        let removed = items.len() - kept.len();

        if removed == 0 {
            tracing::debug!(link, "no bookmark matched, nothing to remove");
            return Ok(0);
        }

        if let Err(e) = self.persist(&kept).await {
            tracing::error!(error = %crate::unpack_error(&e), path = ?self.path, "failed to persist removal, collection unchanged");
            return Err(e.into());
        }

        *items = kept;
        tracing::info!(link, removed, count = items.len(), "bookmarks removed");
        Ok(removed)
    }

    // Writes to a sibling temp file, then renames over the target.
    async fn persist(&self, items: &[Bookmark]) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(items).map_err(StoreError::Serialize)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &data).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "bookmarks.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn join_error(e: tokio::task::JoinError) -> GatewayError {
    tracing::error!(error = %e, "bookmark write task failed");
    GatewayError::Persistence(StoreError::Task(e.to_string()))
}

fn matches_link(bookmark: &Bookmark, link: &str) -> bool {
    matches!(bookmark.get(LINK_FIELD), Some(Value::String(s)) if s == link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::future::Future;
    use std::task::Poll;
    use std::time::Duration;

    fn bookmark(v: Value) -> Bookmark {
        match v {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_load_absent_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();

        let absent = BookmarkStore::load(dir.path().join("missing.json")).await.unwrap();
        assert_eq!(absent.len().await, 0);

        for (name, content) in [("empty.json", ""), ("array.json", "[]"), ("null.json", "null"), ("blank.json", " \n")] {
            let path = dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            let store = BookmarkStore::load(&path).await.unwrap();
            assert_eq!(store.len().await, 0, "{} should load empty", name);
        }
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.json");

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(BookmarkStore::load(&path).await, Err(StoreError::Deserialize(_))));

        std::fs::write(&path, r#"[1, 2]"#).unwrap();
        assert!(matches!(BookmarkStore::load(&path).await, Err(StoreError::Deserialize(_))));
    }

    #[tokio::test]
    async fn test_add_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.json");

        let store = BookmarkStore::load(&path).await.unwrap();
        let record = bookmark(json!({
            "Title": "Moth",
            "Link": "https://example.com/art/moth",
            "Tags": ["night", "wings"],
            "Rating": 4.5,
            "Extra": {"nested": true}
        }));
        store.add(record.clone()).await.unwrap();

        let reloaded = BookmarkStore::load(&path).await.unwrap();
        assert_eq!(reloaded.list().await, vec![record]);

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("\n  {"), "file should be indented: {}", on_disk);
        assert!(!dir.path().join("bookmarks.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_add_raw_rejects_non_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookmarkStore::load(dir.path().join("b.json")).await.unwrap();

        let bodies: [&[u8]; 4] = [b"not json", b"[1,2]", b"\"Link\"", b""];
        for body in bodies {
            let err = store.add_raw(body).await.unwrap_err();
            assert!(matches!(err, GatewayError::Validation(_)));
        }
        assert_eq!(store.len().await, 0);
        assert!(!store.path().exists());

        store.add_raw(br#"{"Link": "a", "Title": "A"}"#).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_deletes_all_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.json");
        let store = BookmarkStore::load(&path).await.unwrap();

        store.add(bookmark(json!({"Link": "a", "n": 1}))).await.unwrap();
        store.add(bookmark(json!({"Link": "b", "n": 2}))).await.unwrap();
        store.add(bookmark(json!({"Link": "a", "n": 3}))).await.unwrap();
        store.add(bookmark(json!({"Link": 7, "n": 4}))).await.unwrap();

        assert_eq!(store.remove("a").await.unwrap(), 2);
        let remaining = store.list().await;
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0]["Link"], json!("b"));
        assert_eq!(remaining[1]["Link"], json!(7));

        let reloaded = BookmarkStore::load(&path).await.unwrap();
        assert_eq!(reloaded.list().await, remaining);
    }

    #[tokio::test]
    async fn test_remove_unknown_link_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookmarkStore::load(dir.path().join("b.json")).await.unwrap();
        store.add(bookmark(json!({"Link": "a"}))).await.unwrap();

        assert_eq!(store.remove("zzz").await.unwrap(), 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_requires_link() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookmarkStore::load(dir.path().join("b.json")).await.unwrap();
        assert!(matches!(store.remove("").await, Err(GatewayError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_add_leaves_collection_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone").join("bookmarks.json");
        let store = BookmarkStore::load(&path).await.unwrap();

        let err = store.add(bookmark(json!({"Link": "a"}))).await.unwrap_err();
        assert!(matches!(err, GatewayError::Persistence(StoreError::Io(_))));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_removed_records() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir(&data).unwrap();
        let store = BookmarkStore::load(data.join("bookmarks.json")).await.unwrap();
        store.add(bookmark(json!({"Link": "a", "n": 1}))).await.unwrap();
        store.add(bookmark(json!({"Link": "a", "n": 2}))).await.unwrap();

        std::fs::remove_dir_all(&data).unwrap();

        let err = store.remove("a").await.unwrap_err();
        assert!(matches!(err, GatewayError::Persistence(StoreError::Io(_))));
        let remaining = store.list().await;
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0]["n"], json!(1));
        assert_eq!(remaining[1]["n"], json!(2));
    }

    #[tokio::test]
    async fn test_dropped_add_still_reaches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.json");
        let store = BookmarkStore::load(&path).await.unwrap();

        // Polled once, then dropped before the write finishes.
        let mut add = Box::pin(store.add(bookmark(json!({"Link": "a"}))));
        let first = std::future::poll_fn(|cx| Poll::Ready(add.as_mut().poll(cx))).await;
        assert!(first.is_pending());
        drop(add);

        for _ in 0..100 {
            if store.len().await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.len().await, 1);

        let reloaded = BookmarkStore::load(&path).await.unwrap();
        assert_eq!(reloaded.list().await, store.list().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.json");
        let store = Arc::new(BookmarkStore::load(&path).await.unwrap());

        let n = 50;
        let mut handles = Vec::new();
        for i in 0..n {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .add(bookmark(json!({"Link": format!("https://example.com/{}", i)})))
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(store.len().await, n);
        let reloaded = BookmarkStore::load(&path).await.unwrap();
        assert_eq!(reloaded.len().await, n);
    }
}

use crate::storage::session::Session;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

const MAX_SESSION_ID_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session '{0}' not found")]
    NotFound(String),

    #[error("session store I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session record at {path} is not valid: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session '{session_id}' could not be serialized: {source}")]
    Serialize {
        session_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{0}' is not a valid session id")]
    InvalidId(String),
}

/// File-backed session records, one `{id}.json` per session.
///
/// Every operation takes the same store-wide lock, so a read never observes a
/// half-written record and `update_json` is a single read-modify-write.
#[derive(Debug)]
pub struct SessionStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl SessionStore {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| StoreError::Io {
                path: root.clone(),
                source,
            })?;

        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn write(&self, session: &Session) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(session).await
    }

    pub async fn read(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_unlocked(session_id).await
    }

    pub async fn update_json(
        &self,
        session_id: &str,
        json_text: String,
    ) -> Result<Session, StoreError> {
        let _guard = self.lock.lock().await;
        let mut session = self
            .read_unlocked(session_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;
        session.json_text = json_text;
        self.write_unlocked(&session).await?;
        Ok(session)
    }

    pub async fn is_ready(&self) -> bool {
        tokio::fs::metadata(&self.root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    async fn write_unlocked(&self, session: &Session) -> Result<(), StoreError> {
        let Some(path) = self.path_for(&session.session_id) else {
            return Err(StoreError::InvalidId(session.session_id.clone()));
        };
        let bytes =
            serde_json::to_vec_pretty(session).map_err(|source| StoreError::Serialize {
                session_id: session.session_id.clone(),
                source,
            })?;

        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: staging.clone(),
                source,
            })?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(session_id = %session.session_id, bytes = bytes.len(), "session record written");
        Ok(())
    }

    async fn read_unlocked(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let Some(path) = self.path_for(session_id) else {
            return Ok(None);
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let session = serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Corrupt { path, source })?;
        Ok(Some(session))
    }

    fn path_for(&self, session_id: &str) -> Option<PathBuf> {
        is_valid_session_id(session_id).then(|| self.root.join(format!("{}.json", session_id)))
    }
}

/// Ids become file names, so only a conservative character set is accepted.
fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::session::SourceFormat;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample_session(json_text: &str) -> Session {
        Session::create(
            json_text.to_string(),
            SourceFormat::Json,
            Some("sample.json".to_string()),
        )
    }

    #[tokio::test]
    async fn open_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("sessions");
        let store = SessionStore::open(&root).await.unwrap();

        assert!(root.is_dir());
        assert!(store.is_ready().await);
    }

    #[tokio::test]
    async fn write_then_read_returns_same_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::open(temp_dir.path()).await.unwrap();
        let session = sample_session("{\n  \"hello\": \"world\"\n}");

        store.write(&session).await.unwrap();
        let loaded = store.read(&session.session_id).await.unwrap().unwrap();

        assert_eq!(loaded, session);
        assert!(
            temp_dir
                .path()
                .join(format!("{}.json", session.session_id))
                .is_file()
        );
    }

    #[tokio::test]
    async fn write_overwrites_existing_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::open(temp_dir.path()).await.unwrap();
        let mut session = sample_session("{}");
        store.write(&session).await.unwrap();

        session.json_text = "[]".to_string();
        store.write(&session).await.unwrap();

        let loaded = store.read(&session.session_id).await.unwrap().unwrap();
        assert_eq!(loaded.json_text, "[]");
    }

    #[tokio::test]
    async fn read_missing_session_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::open(temp_dir.path()).await.unwrap();

        assert!(store.read("doesnotexist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_replaces_payload_only() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::open(temp_dir.path()).await.unwrap();
        let session = sample_session("{}");
        store.write(&session).await.unwrap();

        let updated = store
            .update_json(&session.session_id, "{\"a\": 1}".to_string())
            .await
            .unwrap();

        assert_eq!(updated.json_text, "{\"a\": 1}");
        assert_eq!(updated.filename, session.filename);
        assert_eq!(updated.source_format, session.source_format);
        let loaded = store.read(&session.session_id).await.unwrap().unwrap();
        assert_eq!(loaded, updated);
    }

    #[tokio::test]
    async fn update_missing_session_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::open(temp_dir.path()).await.unwrap();

        let result = store.update_json("missing", "{}".to_string()).await;
        assert!(matches!(result, Err(StoreError::NotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn path_escaping_ids_are_treated_as_absent() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("sessions");
        let store = SessionStore::open(&root).await.unwrap();
        std::fs::write(temp_dir.path().join("secret.json"), "{}").unwrap();

        assert!(store.read("../secret").await.unwrap().is_none());
        assert!(store.read("").await.unwrap().is_none());
        assert!(matches!(
            store.update_json("../secret", "{}".to_string()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn write_with_invalid_id_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("sessions");
        let store = SessionStore::open(&root).await.unwrap();
        let mut session = sample_session("{}");
        session.session_id = "../escape".to_string();

        let result = store.write(&session).await;
        assert!(matches!(result, Err(StoreError::InvalidId(id)) if id == "../escape"));
        assert!(!temp_dir.path().join("escape.json").exists());
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn corrupt_record_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::open(temp_dir.path()).await.unwrap();
        std::fs::write(temp_dir.path().join("broken.json"), "{oops").unwrap();

        assert!(matches!(
            store.read("broken").await,
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_updates_leave_a_valid_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SessionStore::open(temp_dir.path()).await.unwrap());
        let session = sample_session("{}");
        store.write(&session).await.unwrap();

        let mut handles = Vec::new();
        for index in 0..16 {
            let store = Arc::clone(&store);
            let session_id = session.session_id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update_json(&session_id, format!("{{\"n\": {}}}", index))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let loaded = store.read(&session.session_id).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&loaded.json_text).unwrap();
        assert!(value["n"].is_number());
    }
}

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use {
    serde::Serialize,
    serde_json::Value,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Result, StoreError},
    kind::{DocumentKind, Shape},
    metadata::{SESSION_INFO_FILE, SessionInfo, StorageInfo, now_rfc3339},
};

/// Field stamped on appended object records that don't already carry it.
pub const ADDED_AT_FIELD: &str = "added_at";

/// Directory-per-session JSON document store.
///
/// Layout: `<base_path>/<session_id>/<kind>.json`, plus a
/// `session_info.json` per session. Each document is written atomically
/// (temp file + rename) but there is no locking and no atomicity across
/// documents: two writers racing on the same document means the last
/// rename wins.
#[derive(Debug, Clone)]
pub struct SessionStore {
    base_path: PathBuf,
    pretty: bool,
}

impl SessionStore {
    /// Open a store rooted at `base_path`, creating the directory if needed.
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| StoreError::io(&base_path, e))?;
        info!(base_path = %base_path.display(), "initialized session store");
        Ok(Self {
            base_path,
            pretty: true,
        })
    }

    /// Toggle pretty-printed output (on by default).
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory holding a session's documents. Does not create it.
    pub fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.base_path.join(session_id))
    }

    pub fn document_path(&self, session_id: &str, kind: DocumentKind) -> Result<PathBuf> {
        Ok(self.session_path(session_id)?.join(kind.file_name()))
    }

    // ── sessions ────────────────────────────────────────────────────────

    /// Create a session under a fresh UUID and return its id.
    pub fn create_session(&self) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();
        self.ensure_session(&session_id)?;
        Ok(session_id)
    }

    /// Create the session directory and its info file if absent.
    ///
    /// Idempotent: an existing session and its documents are left untouched.
    pub fn ensure_session(&self, session_id: &str) -> Result<()> {
        let dir = self.session_path(session_id)?;
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let info_path = dir.join(SESSION_INFO_FILE);
        if !info_path.exists() {
            self.write_json(&info_path, &SessionInfo::new(session_id), SESSION_INFO_FILE)?;
            info!(session_id, "created session");
        }
        Ok(())
    }

    /// Load a session's info record.
    pub fn session_info(&self, session_id: &str) -> Result<SessionInfo> {
        let path = self.session_path(session_id)?.join(SESSION_INFO_FILE);
        match fs::read_to_string(&path) {
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|source| StoreError::Parse { path, source })
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::SessionNotFound(session_id.to_string()))
            },
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Ids of every session under the base path, oldest first.
    ///
    /// Directories without a readable `session_info.json` are skipped.
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.base_path, e)),
        };

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.base_path, e))?;
            let path = entry.path();
            if !path.is_dir() || !path.join(SESSION_INFO_FILE).exists() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match self.session_info(name) {
                Ok(info) => sessions.push(info),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable session")
                },
            }
        }

        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions.into_iter().map(|s| s.session_id).collect())
    }

    /// Document kinds that currently exist on disk for a session.
    pub fn data_kinds(&self, session_id: &str) -> Result<Vec<DocumentKind>> {
        let dir = self.session_path(session_id)?;
        Ok(DocumentKind::ALL
            .into_iter()
            .filter(|kind| dir.join(kind.file_name()).is_file())
            .collect())
    }

    pub fn storage_info(&self) -> Result<StorageInfo> {
        Ok(StorageInfo {
            backend: "json",
            base_path: self.base_path.display().to_string(),
            sessions: self.list_sessions()?,
        })
    }

    // ── documents ───────────────────────────────────────────────────────

    /// Read a document, or its empty default if it has never been written.
    ///
    /// Invalid JSON or the wrong top-level shape is an error, never a
    /// silent default.
    pub fn read(&self, session_id: &str, kind: DocumentKind) -> Result<Value> {
        let path = self.document_path(session_id, kind)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(session_id, %kind, "document not found, using empty default");
                return Ok(kind.empty());
            },
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let value: Value =
            serde_json::from_str(&raw).map_err(|source| StoreError::Parse { path, source })?;
        kind.check_shape(&value)?;
        debug!(session_id, %kind, "loaded document");
        Ok(value)
    }

    /// Replace a document, creating the session on first write.
    pub fn write(&self, session_id: &str, kind: DocumentKind, data: &Value) -> Result<()> {
        kind.check_shape(data)?;
        self.ensure_session(session_id)?;
        // A corrupt info file must fail the write before the document changes.
        let mut info = self.session_info(session_id)?;

        let path = self.document_path(session_id, kind)?;
        self.write_json(&path, data, kind.as_str())?;

        info.touch();
        let info_path = self.session_path(session_id)?.join(SESSION_INFO_FILE);
        if let Err(e) = self.write_json(&info_path, &info, SESSION_INFO_FILE) {
            warn!(session_id, error = %e, "document saved but last_updated not bumped");
        }
        debug!(session_id, %kind, "saved document");
        Ok(())
    }

    /// Append `record` to an array document and return the new length.
    ///
    /// Object records get an `added_at` timestamp unless they already have
    /// one. This is a read-modify-write with no locking.
    pub fn append(&self, session_id: &str, kind: DocumentKind, mut record: Value) -> Result<usize> {
        if kind.shape() != Shape::Array {
            return Err(StoreError::NotAppendable(kind));
        }

        if let Value::Object(fields) = &mut record {
            fields
                .entry(ADDED_AT_FIELD)
                .or_insert_with(|| Value::String(now_rfc3339()));
        }

        let mut doc = self.read(session_id, kind)?;
        let len = match &mut doc {
            Value::Array(records) => {
                records.push(record);
                records.len()
            },
            // read() has already checked the shape.
            other => {
                return Err(StoreError::Shape {
                    kind,
                    expected: Shape::Array,
                    found: crate::kind::json_type_name(other),
                });
            },
        };
        self.write(session_id, kind, &doc)?;
        Ok(len)
    }

    // ── internals ───────────────────────────────────────────────────────

    /// Serialize to a temp file in the target directory, fsync, then rename
    /// over `path`.
    fn write_json<T: Serialize>(&self, path: &Path, value: &T, label: &str) -> Result<()> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .map_err(|source| StoreError::Serialize {
            kind: label.to_string(),
            source,
        })?;

        let dir = path.parent().unwrap_or(self.base_path.as_path());
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(&bytes).map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
        Ok(())
    }
}

/// Session ids become directory names, so they must be a single plain
/// path component.
fn validate_session_id(session_id: &str) -> Result<()> {
    let bad = session_id.is_empty()
        || session_id == "."
        || session_id == ".."
        || session_id
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0');
    if bad {
        return Err(StoreError::InvalidSessionId(session_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use {rstest::rstest, serde_json::json};

    use super::*;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("sessions")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_write_then_read_profile() {
        let (_dir, store) = store();
        let profile = json!({"name": "Alex", "age": 7});

        store.write("s1", DocumentKind::UserProfile, &profile).unwrap();

        assert_eq!(store.read("s1", DocumentKind::UserProfile).unwrap(), profile);
    }

    #[test]
    fn test_write_then_read_nested() {
        let (_dir, store) = store();
        let progress = json!({
            "user_id": "u1",
            "skills": {"Creativity": {"score": 30, "history": [], "tags": [null, true, 1.5]}}
        });

        store.write("s1", DocumentKind::Progress, &progress).unwrap();

        assert_eq!(store.read("s1", DocumentKind::Progress).unwrap(), progress);
    }

    #[rstest]
    #[case(DocumentKind::UserProfile, json!({}))]
    #[case(DocumentKind::Progress, json!({}))]
    #[case(DocumentKind::Activities, json!([]))]
    #[case(DocumentKind::Feedback, json!([]))]
    #[case(DocumentKind::Feed, json!([]))]
    fn test_read_unwritten_returns_default(#[case] kind: DocumentKind, #[case] expected: Value) {
        let (_dir, store) = store();
        assert_eq!(store.read("never-written", kind).unwrap(), expected);
        // Reading must not create the session.
        assert!(!store.session_path("never-written").unwrap().exists());
    }

    #[test]
    fn test_append_preserves_order() {
        let (_dir, store) = store();
        for i in 0..5 {
            let len = store
                .append("s1", DocumentKind::Activities, json!({"n": i}))
                .unwrap();
            assert_eq!(len, i + 1);
        }

        let doc = store.read("s1", DocumentKind::Activities).unwrap();
        let records = doc.as_array().unwrap();
        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record["n"], json!(i));
            assert!(record[ADDED_AT_FIELD].is_string());
        }
    }

    #[test]
    fn test_append_keeps_caller_timestamp_and_scalars() {
        let (_dir, store) = store();
        store
            .append(
                "s1",
                DocumentKind::Feedback,
                json!({"added_at": "2024-01-01T00:00:00Z"}),
            )
            .unwrap();
        store.append("s1", DocumentKind::Feedback, json!("plain")).unwrap();

        let doc = store.read("s1", DocumentKind::Feedback).unwrap();
        assert_eq!(
            doc,
            json!([{"added_at": "2024-01-01T00:00:00Z"}, "plain"])
        );
    }

    #[test]
    fn test_append_to_object_kind_rejected() {
        let (_dir, store) = store();
        let err = store
            .append("s1", DocumentKind::UserProfile, json!({"x": 1}))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotAppendable(DocumentKind::UserProfile)));
        assert_eq!(err.to_string(), "userprofile is an object document and cannot be appended to");
        assert!(!store.session_path("s1").unwrap().exists());
    }

    #[test]
    fn test_ensure_session_idempotent() {
        let (_dir, store) = store();
        store.write("s1", DocumentKind::UserProfile, &json!({"name": "Alex"})).unwrap();
        let info_before = store.session_info("s1").unwrap();

        store.ensure_session("s1").unwrap();
        store.ensure_session("s1").unwrap();

        assert_eq!(
            store.read("s1", DocumentKind::UserProfile).unwrap(),
            json!({"name": "Alex"})
        );
        assert_eq!(store.session_info("s1").unwrap(), info_before);
    }

    #[test]
    fn test_invalid_json_is_data_error() {
        let (_dir, store) = store();
        store.ensure_session("s1").unwrap();
        let path = store.document_path("s1", DocumentKind::Activities).unwrap();
        fs::write(&path, "[{\"n\": 1},").unwrap();

        let err = store.read("s1", DocumentKind::Activities).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert!(err.is_data_error());
        assert!(err.to_string().contains("activities.json"));
    }

    #[test]
    fn test_wrong_shape_on_disk_is_data_error() {
        let (_dir, store) = store();
        store.ensure_session("s1").unwrap();
        let path = store.document_path("s1", DocumentKind::Feed).unwrap();
        fs::write(&path, r#"{"feed_items": []}"#).unwrap();

        let err = store.read("s1", DocumentKind::Feed).unwrap_err();
        assert!(matches!(err, StoreError::Shape { found: "object", .. }));
        // Append must not clobber the unreadable document.
        assert!(store.append("s1", DocumentKind::Feed, json!({})).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"feed_items": []}"#);
    }

    #[test]
    fn test_write_rejects_wrong_shape() {
        let (_dir, store) = store();
        let err = store
            .write("s1", DocumentKind::Activities, &json!({"not": "a list"}))
            .unwrap_err();
        assert!(err.is_data_error());
        assert!(!store.session_path("s1").unwrap().exists());
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("../escape")]
    #[case("a/b")]
    #[case("a\\b")]
    fn test_invalid_session_ids(#[case] id: &str) {
        let (_dir, store) = store();
        assert!(matches!(
            store.read(id, DocumentKind::UserProfile),
            Err(StoreError::InvalidSessionId(_))
        ));
        assert!(store.ensure_session(id).is_err());
    }

    #[test]
    fn test_write_overwrites_and_leaves_no_temp_files() {
        let (_dir, store) = store();
        store.write("s1", DocumentKind::Progress, &json!({"v": 1})).unwrap();
        store.write("s1", DocumentKind::Progress, &json!({"v": 2})).unwrap();

        assert_eq!(store.read("s1", DocumentKind::Progress).unwrap(), json!({"v": 2}));
        let mut names: Vec<String> = fs::read_dir(store.session_path("s1").unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["progress.json", SESSION_INFO_FILE]);
    }

    #[test]
    fn test_write_bumps_last_updated() {
        let (_dir, store) = store();
        store.ensure_session("s1").unwrap();
        let before = store.session_info("s1").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));

        store.write("s1", DocumentKind::UserProfile, &json!({})).unwrap();

        let after = store.session_info("s1").unwrap();
        assert_eq!(after.created_at, before.created_at);
        assert!(after.last_updated > before.last_updated);
    }

    #[test]
    fn test_create_and_list_sessions() {
        let (_dir, store) = store();
        let first = store.create_session().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = store.create_session().unwrap();
        // A stray directory without session info is not a session.
        fs::create_dir_all(store.base_path().join("stray")).unwrap();

        assert_eq!(store.list_sessions().unwrap(), vec![first.clone(), second]);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_list_sessions_skips_corrupt_info() {
        let (_dir, store) = store();
        let good = store.create_session().unwrap();
        store.ensure_session("broken").unwrap();
        fs::write(
            store.session_path("broken").unwrap().join(SESSION_INFO_FILE),
            "not json",
        )
        .unwrap();

        assert_eq!(store.list_sessions().unwrap(), vec![good]);
    }

    #[test]
    fn test_corrupt_session_info_leaves_documents_untouched() {
        let (_dir, store) = store();
        store.write("s1", DocumentKind::UserProfile, &json!({"name": "Alex"})).unwrap();
        let info_path = store.session_path("s1").unwrap().join(SESSION_INFO_FILE);
        fs::write(&info_path, "garbage").unwrap();

        let err = store
            .write("s1", DocumentKind::UserProfile, &json!({"name": "Sam"}))
            .unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert!(store.append("s1", DocumentKind::Activities, json!({"n": 1})).is_err());

        assert_eq!(
            store.read("s1", DocumentKind::UserProfile).unwrap(),
            json!({"name": "Alex"})
        );
        assert!(!store.document_path("s1", DocumentKind::Activities).unwrap().exists());
    }

    #[test]
    fn test_unreadable_document_is_io_error() {
        let (_dir, store) = store();
        store.ensure_session("s1").unwrap();
        // A directory where the file should be cannot be read as text.
        fs::create_dir(store.document_path("s1", DocumentKind::Feed).unwrap()).unwrap();

        let err = store.read("s1", DocumentKind::Feed).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!err.is_data_error());
        assert!(err.to_string().contains("feed.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_is_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store();
        store.ensure_session("s1").unwrap();
        let session_dir = store.session_path("s1").unwrap();
        fs::set_permissions(&session_dir, fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores directory permissions; nothing to observe there.
        let writable = tempfile::NamedTempFile::new_in(&session_dir).is_ok();
        let result = store.write("s1", DocumentKind::UserProfile, &json!({"name": "Alex"}));
        fs::set_permissions(&session_dir, fs::Permissions::from_mode(0o755)).unwrap();
        if writable {
            return;
        }

        let err = result.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!err.is_data_error());
    }

    #[test]
    fn test_session_info_missing() {
        let (_dir, store) = store();
        let err = store.session_info("nope").unwrap_err();
        assert!(matches!(err, StoreError::SessionNotFound(_)));
        assert!(!err.is_data_error());
    }

    #[test]
    fn test_data_kinds() {
        let (_dir, store) = store();
        assert!(store.data_kinds("s1").unwrap().is_empty());

        store.write("s1", DocumentKind::Feed, &json!([])).unwrap();
        store.write("s1", DocumentKind::UserProfile, &json!({})).unwrap();

        assert_eq!(
            store.data_kinds("s1").unwrap(),
            vec![DocumentKind::UserProfile, DocumentKind::Feed]
        );
    }

    #[test]
    fn test_storage_info() {
        let (_dir, store) = store();
        let id = store.create_session().unwrap();

        let info = store.storage_info().unwrap();
        assert_eq!(info.backend, "json");
        assert_eq!(info.sessions, vec![id]);
        let as_json = serde_json::to_value(&info).unwrap();
        assert_eq!(as_json["type"], "json");
    }

    #[test]
    fn test_compact_output() {
        let (_dir, store) = store();
        let store = store.with_pretty(false);
        store.write("s1", DocumentKind::UserProfile, &json!({"a": 1})).unwrap();

        let raw = fs::read_to_string(store.document_path("s1", DocumentKind::UserProfile).unwrap())
            .unwrap();
        assert_eq!(raw, r#"{"a":1}"#);
    }
}

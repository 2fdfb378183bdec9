//! Session storage.
//!
//! Each session is a directory of JSON documents at
//! `<base_path>/<session_id>/<kind>.json`. Documents are independent: there
//! are no cross-document transactions and no locking.

pub mod error;
pub mod kind;
pub mod metadata;
pub mod store;

pub use {
    error::{Result, StoreError},
    kind::{DocumentKind, Shape},
    metadata::{SessionInfo, StorageInfo, now_rfc3339},
    store::SessionStore,
};

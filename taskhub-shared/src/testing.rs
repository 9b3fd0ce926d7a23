/// Recording fakes for the external collaborators
///
/// Used by the unit and integration tests of both crates to assert on how
/// often, and with what, the blob store and notifier were called.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::notify::{AssignmentNotice, NotificationOutcome, Notifier};
use crate::storage::{validate_key, BlobError, BlobStore, StoredBlob};

/// In-memory [`BlobStore`] that counts every call
#[derive(Default)]
pub struct RecordingBlobStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    presigns: AtomicUsize,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl RecordingBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts(&self, failing: bool) {
        self.fail_puts.store(failing, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, failing: bool) {
        self.fail_deletes.store(failing, Ordering::SeqCst);
    }

    pub fn put_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn presign_calls(&self) -> usize {
        self.presigns.load(Ordering::SeqCst)
    }

    /// Total calls of any kind
    pub fn total_calls(&self) -> usize {
        self.put_calls() + self.delete_calls() + self.presign_calls()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<StoredBlob, BlobError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        validate_key(key)?;

        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(BlobError::Unavailable("put failure injected".to_string()));
        }

        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), (bytes.to_vec(), content_type.to_string()));

        Ok(StoredBlob {
            key: key.to_string(),
            url: format!("memory://blobs/{}", key),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobError::Unavailable("delete failure injected".to_string()));
        }

        self.objects.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, BlobError> {
        self.presigns.fetch_add(1, Ordering::SeqCst);
        Ok(format!("memory://blobs/{}?ttl={}", key, ttl.as_secs()))
    }
}

/// [`Notifier`] that records every notice it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<AssignmentNotice>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent sends report failure
    pub fn fail_sends(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<AssignmentNotice> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_assignment_notice(&self, notice: &AssignmentNotice) -> NotificationOutcome {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(notice.clone());

        if self.fail.load(Ordering::SeqCst) {
            NotificationOutcome::failed("send failure injected")
        } else {
            NotificationOutcome::sent("recorded")
        }
    }
}

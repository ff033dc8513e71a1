use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;

/// Registry of in-flight `MsgCheck` hashes awaiting a `MsgCheckResp`,
/// shared between the writer that sends heavy messages and the reader
/// that dispatches incoming responses. Keyed by the same SHA-256 hex hash
/// used by the dedup pool.
#[derive(Default)]
pub struct PendingHashes {
    inner: Mutex<HashMap<String, oneshot::Sender<bool>>>,
}

impl PendingHashes {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, hash: String) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().insert(hash, tx);
        rx
    }

    /// Called from the reader on an inbound `MsgCheckResp`. A miss is not
    /// an error: the response may arrive after the sender already gave up
    /// and dropped its receiver.
    pub fn resolve(&self, hash: &str, accept: bool) {
        if let Some(tx) = self.inner.lock().unwrap().remove(hash) {
            let _ = tx.send(accept);
        }
    }

    fn abandon(&self, hash: &str) {
        self.inner.lock().unwrap().remove(hash);
    }
}

/// Gates a heavy message behind the `MsgCheck`/`MsgCheckResp` handshake.
/// `send_check` is called once per attempt (up to `max_retries + 1` times)
/// and should transmit a fresh `MsgCheck` frame carrying `hash`. Returns
/// `true` once the peer accepts, `false` if every attempt timed out
/// (SPEC_FULL.md §4.2: after the final timeout the message is dropped,
/// not queued indefinitely).
pub async fn negotiate_send<F, Fut>(
    pending: &PendingHashes,
    hash: &str,
    mut send_check: F,
    timeout: Duration,
    max_retries: u32,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    for attempt in 0..=max_retries {
        let rx = pending.register(hash.to_string());
        send_check().await;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(accept)) => return accept,
            Ok(Err(_)) => {
                // Sender side dropped without a reply; treat as a miss and retry.
            }
            Err(_elapsed) => {
                pending.abandon(hash);
            }
        }
        tracing::debug!(hash, attempt, "msgcheck timed out, retrying");
    }
    false
}

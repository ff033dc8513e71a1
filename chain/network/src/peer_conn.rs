use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Notify, RwLock};

use crate::dedup::{hash_bytes, DedupPool};
use crate::error::{ConnError, FrameError};
use crate::framing::{decode_frame, encode_frame, DELIMITER};
use crate::lmn::{negotiate_send, PendingHashes};
use crate::message::{
    CommandType, ForwardType, Header, MsgCheckPayload, MsgCheckRespPayload, PeerMessage,
};

/// Connection lifecycle, mirroring the original's `connState` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Pending,
    Connected,
    CanceledPending,
    Failed,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// What this node is for the purposes of the §4.1 forwarding gate: a
/// specific shard committee member, or the beacon committee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Shard(u8),
    Beacon,
}

/// Where a frame this node only forwards (rather than handling locally)
/// gets pushed: one outbound fan-out sink per shard, one for the beacon
/// committee. A real node backs this with its own peer pool; tests use a
/// recording stub.
pub trait ForwardSink: Send + Sync {
    fn forward_to_shard(&self, shard_id: u8, raw: &[u8]);
    fn forward_to_beacon(&self, raw: &[u8]);
}

/// `forward_type`/`forward_value` name a destination other than "this
/// connection's peer"; this decides whether `role` is that destination or
/// whether the frame must be rerouted instead of dispatched locally.
fn should_reroute(role: NodeRole, forward_type: ForwardType, forward_value: u8) -> bool {
    match forward_type {
        ForwardType::Peer => false,
        ForwardType::Shard => !matches!(role, NodeRole::Shard(id) if id == forward_value),
        ForwardType::Beacon => !matches!(role, NodeRole::Beacon),
    }
}

#[derive(Debug, Clone)]
pub struct PeerConnConfig {
    pub spam_limit: usize,
    pub max_payload: usize,
    pub heavy_message_size: usize,
    pub lmn_timeout: Duration,
    pub lmn_max_retries: u32,
}

impl Default for PeerConnConfig {
    fn default() -> Self {
        Self {
            spam_limit: 32 * 1024 * 1024,
            max_payload: 8 * 1024 * 1024,
            heavy_message_size: 1024 * 1024,
            lmn_timeout: Duration::from_secs(10),
            lmn_max_retries: 3,
        }
    }
}

/// Everything about a `PeerConn` that changes at runtime, behind one lock
/// rather than the original's per-field mutexes (SPEC_FULL.md §9).
#[derive(Debug, Clone)]
pub struct PeerConnState {
    pub conn_state: ConnState,
    pub ver_ack_received: bool,
    pub retry_count: u32,
}

impl Default for PeerConnState {
    fn default() -> Self {
        Self { conn_state: ConnState::Pending, ver_ack_received: false, retry_count: 0 }
    }
}

/// A message queued for the writer task. `Typed` goes through the LMN gate
/// when large enough; `Raw` is written verbatim (used for re-broadcasting
/// frames this node only forwards without deserializing).
pub enum OutgoingMessage {
    Typed { message: PeerMessage, forward_type: ForwardType, forward_value: u8, done: Option<oneshot::Sender<()>> },
    Raw { frame: Vec<u8>, done: Option<oneshot::Sender<()>> },
}

/// Receives dispatched, already-forward-gated application messages. One
/// impl per node role (shard vs beacon); tests use a channel-backed sink.
pub trait Dispatch: Send + Sync {
    fn on_message(&self, remote_peer_id: &str, message: PeerMessage);
}

pub struct PeerConn {
    pub remote_peer_id: String,
    pub direction: Direction,
    role: NodeRole,
    forward_sink: Arc<dyn ForwardSink>,
    state: Arc<RwLock<PeerConnState>>,
    send_tx: mpsc::Sender<OutgoingMessage>,
    close_notify: Arc<Notify>,
    force_closed: Arc<AtomicBool>,
    dedup: Arc<DedupPool>,
    pending_hashes: Arc<PendingHashes>,
    config: PeerConnConfig,
    disconnect_hook: StdMutex<Option<Box<dyn Fn() + Send + Sync>>>,
    disconnect_fired: AtomicBool,
}

impl PeerConn {
    pub fn new(
        remote_peer_id: String,
        direction: Direction,
        role: NodeRole,
        forward_sink: Arc<dyn ForwardSink>,
        dedup: Arc<DedupPool>,
        config: PeerConnConfig,
        queue_capacity: usize,
    ) -> (Self, mpsc::Receiver<OutgoingMessage>) {
        let (send_tx, send_rx) = mpsc::channel(queue_capacity);
        let conn = Self {
            remote_peer_id,
            direction,
            role,
            forward_sink,
            state: Arc::new(RwLock::new(PeerConnState::default())),
            send_tx,
            close_notify: Arc::new(Notify::new()),
            force_closed: Arc::new(AtomicBool::new(false)),
            dedup,
            pending_hashes: Arc::new(PendingHashes::new()),
            config,
            disconnect_hook: StdMutex::new(None),
            disconnect_fired: AtomicBool::new(false),
        };
        (conn, send_rx)
    }

    /// Registers the callback fired exactly once when this connection
    /// transitions to `Disconnected` (§4.1, §8 invariant 6).
    pub fn set_disconnect_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.disconnect_hook.lock().unwrap() = Some(Box::new(hook));
    }

    fn fire_disconnect_hook(&self) {
        if self.disconnect_fired.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(hook) = self.disconnect_hook.lock().unwrap().as_ref() {
            hook();
        }
    }

    pub async fn state(&self) -> PeerConnState {
        self.state.read().await.clone()
    }

    pub async fn set_conn_state(&self, conn_state: ConnState) {
        self.state.write().await.conn_state = conn_state;
    }

    pub fn is_connected(&self) -> bool {
        !self.force_closed.load(Ordering::SeqCst)
    }

    /// Idempotent close: a second call is a no-op, matching the original's
    /// receive-then-close pattern on `cClose`.
    pub fn close(&self) {
        if !self.force_closed.swap(true, Ordering::SeqCst) {
            self.close_notify.notify_waiters();
        }
    }

    /// Queues `message` for transmission, gating it through the LMN
    /// handshake first if its encoded size is at or above
    /// `heavy_message_size` (MsgCheck/MsgCheckResp themselves are never
    /// gated, matching SPEC_FULL.md §4.2).
    pub async fn queue_message(
        &self,
        message: PeerMessage,
        forward_type: ForwardType,
        forward_value: u8,
    ) -> Result<(), ConnError> {
        if !self.is_connected() {
            return Err(ConnError::ForceClosed);
        }
        let command = message.command_type();
        let body = message.to_json_body().map_err(|_| ConnError::QueueClosed)?;
        let is_control = matches!(command, CommandType::MsgCheck | CommandType::MsgCheckResp);

        if !is_control && body.len() >= self.config.heavy_message_size {
            let hash = hash_bytes(&body);
            let accepted = negotiate_send(
                &self.pending_hashes,
                &hash,
                || {
                    let tx = self.send_tx.clone();
                    let hash = hash.clone();
                    async move {
                        let _ = tx
                            .send(OutgoingMessage::Typed {
                                message: PeerMessage::MsgCheck(MsgCheckPayload { hash }),
                                forward_type: ForwardType::Peer,
                                forward_value: 0,
                                done: None,
                            })
                            .await;
                    }
                },
                self.config.lmn_timeout,
                self.config.lmn_max_retries,
            )
            .await;
            if !accepted {
                return Ok(());
            }
        }

        self.send_tx
            .send(OutgoingMessage::Typed { message, forward_type, forward_value, done: None })
            .await
            .map_err(|_| ConnError::QueueClosed)
    }

    pub fn pending_hashes(&self) -> Arc<PendingHashes> {
        self.pending_hashes.clone()
    }

    pub fn dedup(&self) -> Arc<DedupPool> {
        self.dedup.clone()
    }
}

/// Drives the inbound side of a connection: reads delimited frames,
/// dedups, decodes, handles `VerAck`/`MsgCheck`/`MsgCheckResp` inline, and
/// forwards everything else to `dispatch`. Returns on read error or a
/// clean EOF; never panics on a malformed frame.
pub async fn reader_loop<R>(
    reader: R,
    conn: Arc<PeerConn>,
    dispatch: Arc<dyn Dispatch>,
) -> Result<(), ConnError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = lines
            .read_until(DELIMITER, &mut buf)
            .await
            .map_err(ConnError::ReadClosed)?;
        if n == 0 {
            return Ok(());
        }
        if buf.last() == Some(&DELIMITER) {
            buf.pop();
        }
        if buf.is_empty() {
            continue;
        }
        if let Err(err) = handle_frame(&buf, &conn, &dispatch).await {
            tracing::warn!(peer = %conn.remote_peer_id, %err, "dropping malformed frame");
            portal_o11y::metrics::FRAMES_DROPPED_TOTAL.with_label_values(&["decode_error"]).inc();
        }
    }
}

async fn handle_frame(
    raw: &[u8],
    conn: &Arc<PeerConn>,
    dispatch: &Arc<dyn Dispatch>,
) -> Result<(), FrameError> {
    let raw_hash = hash_bytes(raw);
    if conn.dedup.seen_or_insert(&raw_hash) {
        portal_o11y::metrics::FRAMES_DROPPED_TOTAL.with_label_values(&["duplicate"]).inc();
        return Ok(());
    }

    let (header, body) = decode_frame(raw, conn.config.spam_limit, conn.config.max_payload)?;

    if should_reroute(conn.role, header.forward_type, header.forward_value) {
        match header.forward_type {
            ForwardType::Shard => conn.forward_sink.forward_to_shard(header.forward_value, raw),
            ForwardType::Beacon => conn.forward_sink.forward_to_beacon(raw),
            ForwardType::Peer => unreachable!("should_reroute never reroutes a Peer-scoped frame"),
        }
        return Ok(());
    }

    let message = PeerMessage::from_json_body(header.command, &body)?;

    match &message {
        PeerMessage::VerAck => {
            let mut state = conn.state.write().await;
            state.ver_ack_received = true;
            if state.conn_state == ConnState::Pending {
                state.conn_state = ConnState::Connected;
            }
        }
        PeerMessage::MsgCheck(payload) => {
            let accept = !conn.dedup.contains(&payload.hash);
            let resp = PeerMessage::MsgCheckResp(MsgCheckRespPayload { hash: payload.hash.clone(), accept });
            let _ = conn
                .send_tx
                .send(OutgoingMessage::Typed {
                    message: resp,
                    forward_type: ForwardType::Peer,
                    forward_value: 0,
                    done: None,
                })
                .await;
        }
        PeerMessage::MsgCheckResp(payload) => {
            conn.pending_hashes.resolve(&payload.hash, payload.accept);
        }
        _ => {
            portal_o11y::metrics::DISPATCH_TOTAL
                .with_label_values(&[<&'static str>::from(header.command)])
                .inc();
            dispatch.on_message(&conn.remote_peer_id, message);
        }
    }
    Ok(())
}

/// Drives the outbound side: writes whatever the send queue produces until
/// the queue is closed or `close()` fires. Write errors are logged and
/// skipped rather than tearing down the loop, matching the original's
/// `OutMessageHandler`, which keeps selecting on the queue after a failed
/// write.
pub async fn writer_loop<W>(mut writer: W, mut rx: mpsc::Receiver<OutgoingMessage>, conn: Arc<PeerConn>) -> Result<(), ConnError>
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;
            _ = conn.close_notify.notified() => {
                conn.set_conn_state(ConnState::Disconnected).await;
                conn.fire_disconnect_hook();
                return Ok(());
            }
            msg = rx.recv() => {
                let Some(msg) = msg else {
                    conn.set_conn_state(ConnState::Disconnected).await;
                    conn.fire_disconnect_hook();
                    return Ok(());
                };
                let (frame, done) = match msg {
                    OutgoingMessage::Raw { frame, done } => (frame, done),
                    OutgoingMessage::Typed { message, forward_type, forward_value, done } => {
                        let header = Header { command: message.command_type(), forward_type, forward_value };
                        let body = match message.to_json_body() {
                            Ok(b) => b,
                            Err(err) => {
                                tracing::warn!(%err, "failed to serialize outgoing message");
                                continue;
                            }
                        };
                        (encode_frame(header, &body), done)
                    }
                };
                if let Err(err) = write_frame(&mut writer, &frame).await {
                    tracing::warn!(%err, "write failed, continuing");
                    continue;
                }
                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
        }
    }
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> Result<(), ConnError> {
    writer.write_all(frame).await.map_err(ConnError::WriteClosed)?;
    writer.write_all(&[DELIMITER]).await.map_err(ConnError::WriteClosed)?;
    writer.flush().await.map_err(ConnError::WriteClosed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct RecordingDispatch {
        seen: StdMutex<Vec<PeerMessage>>,
    }

    impl Dispatch for RecordingDispatch {
        fn on_message(&self, _remote_peer_id: &str, message: PeerMessage) {
            self.seen.lock().unwrap().push(message);
        }
    }

    #[derive(Default)]
    struct RecordingForwardSink {
        shard: StdMutex<Vec<(u8, Vec<u8>)>>,
        beacon: StdMutex<Vec<Vec<u8>>>,
    }

    impl ForwardSink for RecordingForwardSink {
        fn forward_to_shard(&self, shard_id: u8, raw: &[u8]) {
            self.shard.lock().unwrap().push((shard_id, raw.to_vec()));
        }

        fn forward_to_beacon(&self, raw: &[u8]) {
            self.beacon.lock().unwrap().push(raw.to_vec());
        }
    }

    fn new_conn(
        remote_peer_id: &str,
        role: NodeRole,
        sink: Arc<dyn ForwardSink>,
    ) -> (Arc<PeerConn>, mpsc::Receiver<OutgoingMessage>) {
        let dedup = Arc::new(DedupPool::new(16));
        let (conn, rx) = PeerConn::new(
            remote_peer_id.to_string(),
            Direction::Inbound,
            role,
            sink,
            dedup,
            PeerConnConfig::default(),
            8,
        );
        (Arc::new(conn), rx)
    }

    #[tokio::test]
    async fn reader_drops_duplicate_frames_silently() {
        let (conn, _rx) = new_conn("peerA", NodeRole::Shard(0), Arc::new(RecordingForwardSink::default()));
        let recording = Arc::new(RecordingDispatch { seen: StdMutex::new(Vec::new()) });
        let dispatch: Arc<dyn Dispatch> = recording.clone();

        let header = Header { command: CommandType::VerAck, forward_type: ForwardType::Peer, forward_value: 0 };
        let frame = encode_frame(header, b"null");

        handle_frame(&frame, &conn, &dispatch).await.unwrap();
        assert!(conn.state().await.ver_ack_received);

        // A second, identical frame must be swallowed by the dedup pool
        // and never reach dispatch or re-flip any state.
        handle_frame(&frame, &conn, &dispatch).await.unwrap();
        assert!(recording.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ver_ack_transitions_pending_to_connected() {
        let (conn, _rx) = new_conn("peerA", NodeRole::Shard(0), Arc::new(RecordingForwardSink::default()));
        let recording = Arc::new(RecordingDispatch { seen: StdMutex::new(Vec::new()) });
        let dispatch: Arc<dyn Dispatch> = recording;

        assert_eq!(conn.state().await.conn_state, ConnState::Pending);
        let header = Header { command: CommandType::VerAck, forward_type: ForwardType::Peer, forward_value: 0 };
        let frame = encode_frame(header, b"null");
        handle_frame(&frame, &conn, &dispatch).await.unwrap();
        assert_eq!(conn.state().await.conn_state, ConnState::Connected);
    }

    #[tokio::test]
    async fn scenario_s6_frame_for_another_shard_is_rerouted_not_dispatched() {
        // Node role = shard 0. A frame with forwardType=Shard, forwardValue=1
        // must be forwarded to shard 1's sink with no local handler firing.
        let sink = Arc::new(RecordingForwardSink::default());
        let (conn, _rx) = new_conn("peerA", NodeRole::Shard(0), sink.clone());
        let recording = Arc::new(RecordingDispatch { seen: StdMutex::new(Vec::new()) });
        let dispatch: Arc<dyn Dispatch> = recording.clone();

        let header = Header { command: CommandType::BlockSignature, forward_type: ForwardType::Shard, forward_value: 1 };
        let body = serde_json::to_vec(&serde_json::json!({"block_hash":"h","validator":"v","signature":"s"})).unwrap();
        let frame = encode_frame(header, &body);

        handle_frame(&frame, &conn, &dispatch).await.unwrap();

        assert!(recording.seen.lock().unwrap().is_empty());
        let forwarded = sink.shard.lock().unwrap();
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0].0, 1);
    }

    #[tokio::test]
    async fn frame_addressed_to_our_own_shard_dispatches_locally() {
        let sink = Arc::new(RecordingForwardSink::default());
        let (conn, _rx) = new_conn("peerA", NodeRole::Shard(1), sink.clone());
        let recording = Arc::new(RecordingDispatch { seen: StdMutex::new(Vec::new()) });
        let dispatch: Arc<dyn Dispatch> = recording.clone();

        let header = Header { command: CommandType::BlockSignature, forward_type: ForwardType::Shard, forward_value: 1 };
        let body = serde_json::to_vec(&serde_json::json!({"block_hash":"h","validator":"v","signature":"s"})).unwrap();
        let frame = encode_frame(header, &body);

        handle_frame(&frame, &conn, &dispatch).await.unwrap();

        assert_eq!(recording.seen.lock().unwrap().len(), 1);
        assert!(sink.shard.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (conn, _rx) = new_conn("peerB", NodeRole::Beacon, Arc::new(RecordingForwardSink::default()));
        assert!(conn.is_connected());
        conn.close();
        conn.close();
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn writer_loop_fires_disconnect_hook_exactly_once_on_close() {
        let (conn, rx) = new_conn("peerC", NodeRole::Beacon, Arc::new(RecordingForwardSink::default()));
        let fired = Arc::new(AtomicBool::new(false));
        let fire_count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        {
            let fired = fired.clone();
            let fire_count = fire_count.clone();
            conn.set_disconnect_hook(move || {
                fired.store(true, Ordering::SeqCst);
                fire_count.fetch_add(1, Ordering::SeqCst);
            });
        }

        let (writer, _reader) = tokio::io::duplex(1024);
        conn.close();
        writer_loop(writer, rx, conn.clone()).await.unwrap();

        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(fire_count.load(Ordering::SeqCst), 1);
        assert_eq!(conn.state().await.conn_state, ConnState::Disconnected);

        // A second close() (e.g. a racing ForceClose) must not re-fire it.
        conn.close();
        conn.fire_disconnect_hook();
        assert_eq!(fire_count.load(Ordering::SeqCst), 1);
    }
}

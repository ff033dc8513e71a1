//! Peer-to-peer transport: length-delimited hex/gzip framing, a bounded
//! dedup pool, the Large-Message Negotiator, and per-connection
//! reader/writer tasks dispatching a closed set of typed peer messages.

pub mod dedup;
pub mod error;
pub mod framing;
pub mod lmn;
pub mod message;
pub mod peer_conn;

pub use dedup::{hash_bytes, DedupPool};
pub use error::{ConnError, FrameError};
pub use framing::{decode_frame, encode_frame};
pub use lmn::{negotiate_send, PendingHashes};
pub use message::{
    BlockSignaturePayload, CommandType, ForwardType, Header, InstructionPayload, MsgCheckPayload,
    MsgCheckRespPayload, PeerMessage, HEADER_SIZE,
};
pub use peer_conn::{
    reader_loop, writer_loop, ConnState, Dispatch, Direction, ForwardSink, NodeRole,
    OutgoingMessage, PeerConn, PeerConnConfig, PeerConnState,
};

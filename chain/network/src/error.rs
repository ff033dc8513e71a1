/// Errors raised while parsing a single inbound frame. A `FrameError` never
/// tears down the connection: the caller drops the offending frame, logs
/// it, bumps `portal_network_frames_dropped_total`, and keeps reading.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("frame exceeds spam limit of {limit} bytes (got {got})")]
    TooLarge { limit: usize, got: usize },

    #[error("hex decode failed")]
    HexDecode(#[source] hex::FromHexError),

    #[error("gzip decompression failed")]
    Gunzip(#[source] std::io::Error),

    #[error("frame shorter than header size {header_size} (got {got})")]
    ShortFrame { header_size: usize, got: usize },

    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("payload of {got} bytes exceeds MaxPayloadLength of {limit}")]
    PayloadTooLarge { limit: usize, got: usize },

    #[error("json decode of typed message body failed")]
    Json(#[source] serde_json::Error),
}

/// Errors that terminate a `PeerConn`'s read or write side. Never
/// propagated past the single connection; logged at `warn` and the
/// connection is closed.
#[derive(thiserror::Error, Debug)]
pub enum ConnError {
    #[error("read side closed")]
    ReadClosed(#[source] std::io::Error),

    #[error("write side closed")]
    WriteClosed(#[source] std::io::Error),

    #[error("connection force-closed")]
    ForceClosed,

    #[error("outbound queue closed")]
    QueueClosed,
}

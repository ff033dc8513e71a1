/// Mirrors the discriminant-coded error family of the original KV accessor
/// layer (`NewRawdbError(code, err)` over `BlockExisted`, `LvdbGet/Put/
/// Delete/HasError`, `JsonMarshalError`, `BinaryReaderError`,
/// `UnexpectedError`), wrapped with `#[source]` the way `near-network`'s
/// `ParsePeerMessageError` wraps its inner causes.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("block already exists under key {0:?}")]
    BlockExisted(Vec<u8>),

    #[error("get failed for key {key:?}")]
    LvdbGetError {
        key: Vec<u8>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("put failed for key {key:?}")]
    LvdbPutError {
        key: Vec<u8>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("delete failed for key {key:?}")]
    LvdbDeleteError {
        key: Vec<u8>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("has-check failed for key {key:?}")]
    LvdbHasError {
        key: Vec<u8>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("json marshal failed")]
    JsonMarshalError(#[source] serde_json::Error),

    #[error("json unmarshal failed")]
    JsonUnmarshalError(#[source] serde_json::Error),

    #[error("binary reader error")]
    BinaryReaderError(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("unexpected persistence error: {0}")]
    UnexpectedError(String),
}

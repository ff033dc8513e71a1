use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Total header size in bytes: 12-byte command, 1-byte forward type, 1-byte
/// forward value, 10 reserved zero bytes.
pub const HEADER_SIZE: usize = 24;
const COMMAND_SIZE: usize = 12;

/// Routing hint carried in every frame's header: whether the payload is
/// meant for the immediate peer only, or should additionally be forwarded
/// to a shard or to the beacon committee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ForwardType {
    Peer = 0,
    Shard = 1,
    Beacon = 2,
}

impl ForwardType {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Peer),
            1 => Some(Self::Shard),
            2 => Some(Self::Beacon),
            _ => None,
        }
    }
}

/// The fixed set of wire commands this node understands. Closed and tagged
/// rather than dispatched by reflection (see the redesign note in
/// SPEC_FULL.md §9): an unrecognized command is a `FrameError`, not a
/// silently-ignored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr)]
pub enum CommandType {
    #[strum(serialize = "verack")]
    VerAck,
    #[strum(serialize = "msgcheck")]
    MsgCheck,
    #[strum(serialize = "msgcheckresp")]
    MsgCheckResp,
    #[strum(serialize = "instruct")]
    Instruction,
    #[strum(serialize = "blocksig")]
    BlockSignature,
}

impl CommandType {
    /// Encodes the command as a 12-byte, NUL-padded ASCII field.
    pub fn to_header_bytes(self) -> [u8; COMMAND_SIZE] {
        let name: &'static str = self.into();
        let mut buf = [0u8; COMMAND_SIZE];
        let bytes = name.as_bytes();
        buf[..bytes.len()].copy_from_slice(bytes);
        buf
    }

    pub fn from_header_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let name = std::str::from_utf8(&bytes[..end]).map_err(|_| {
            FrameError::UnknownCommand(String::from_utf8_lossy(bytes).into_owned())
        })?;
        name.parse().map_err(|_| FrameError::UnknownCommand(name.to_string()))
    }
}

/// The 24-byte header prepended to every frame body before compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub command: CommandType,
    pub forward_type: ForwardType,
    pub forward_value: u8,
}

impl Header {
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[..COMMAND_SIZE].copy_from_slice(&self.command.to_header_bytes());
        buf[COMMAND_SIZE] = self.forward_type as u8;
        buf[COMMAND_SIZE + 1] = self.forward_value;
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FrameError::ShortFrame { header_size: HEADER_SIZE, got: bytes.len() });
        }
        let command = CommandType::from_header_bytes(&bytes[..COMMAND_SIZE])?;
        let forward_type = ForwardType::from_byte(bytes[COMMAND_SIZE])
            .ok_or_else(|| FrameError::UnknownCommand(format!("forward_type={}", bytes[COMMAND_SIZE])))?;
        let forward_value = bytes[COMMAND_SIZE + 1];
        Ok(Self { command, forward_type, forward_value })
    }
}

/// `MsgCheck` payload: announces the hash of a heavy message about to be
/// sent, so the receiver can say whether it already has it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCheckPayload {
    pub hash: String,
}

/// `MsgCheckResp` payload: `accept = false` means the receiver already
/// holds a message with this hash in its dedup pool and the sender should
/// not bother transmitting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCheckRespPayload {
    pub hash: String,
    pub accept: bool,
}

/// Carries one beacon-produced `Instruction` tuple to a shard or peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionPayload {
    pub meta_type: String,
    pub shard_id: String,
    pub status: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSignaturePayload {
    pub block_hash: String,
    pub validator: String,
    pub signature: String,
}

/// The closed set of typed messages a peer connection can dispatch.
/// Replaces the original's reflection-keyed dispatch table with a single
/// tagged enum matched exhaustively at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerMessage {
    VerAck,
    MsgCheck(MsgCheckPayload),
    MsgCheckResp(MsgCheckRespPayload),
    Instruction(InstructionPayload),
    BlockSignature(BlockSignaturePayload),
}

impl PeerMessage {
    pub fn command_type(&self) -> CommandType {
        match self {
            PeerMessage::VerAck => CommandType::VerAck,
            PeerMessage::MsgCheck(_) => CommandType::MsgCheck,
            PeerMessage::MsgCheckResp(_) => CommandType::MsgCheckResp,
            PeerMessage::Instruction(_) => CommandType::Instruction,
            PeerMessage::BlockSignature(_) => CommandType::BlockSignature,
        }
    }

    pub fn to_json_body(&self) -> Result<Vec<u8>, FrameError> {
        let json = match self {
            PeerMessage::VerAck => serde_json::Value::Null,
            PeerMessage::MsgCheck(p) => serde_json::to_value(p).map_err(FrameError::Json)?,
            PeerMessage::MsgCheckResp(p) => serde_json::to_value(p).map_err(FrameError::Json)?,
            PeerMessage::Instruction(p) => serde_json::to_value(p).map_err(FrameError::Json)?,
            PeerMessage::BlockSignature(p) => serde_json::to_value(p).map_err(FrameError::Json)?,
        };
        serde_json::to_vec(&json).map_err(FrameError::Json)
    }

    pub fn from_json_body(command: CommandType, body: &[u8]) -> Result<Self, FrameError> {
        Ok(match command {
            CommandType::VerAck => PeerMessage::VerAck,
            CommandType::MsgCheck => {
                PeerMessage::MsgCheck(serde_json::from_slice(body).map_err(FrameError::Json)?)
            }
            CommandType::MsgCheckResp => {
                PeerMessage::MsgCheckResp(serde_json::from_slice(body).map_err(FrameError::Json)?)
            }
            CommandType::Instruction => {
                PeerMessage::Instruction(serde_json::from_slice(body).map_err(FrameError::Json)?)
            }
            CommandType::BlockSignature => {
                PeerMessage::BlockSignature(serde_json::from_slice(body).map_err(FrameError::Json)?)
            }
        })
    }
}

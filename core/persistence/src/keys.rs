//! Key-construction helpers for the shard/beacon KV schema (spec.md §6),
//! mirroring `dataaccessobject/rawdb/accessor_shard.go`'s key scheme:
//! block bodies under `b-{hash}`, shard indirection under
//! `s-{shardID}b-{hash}`, block indices under `i-{hash}` and
//! `{index8LE}{shardID}`, best-state under `best-{shardID}`, and per-shard
//! committee snapshots under `{shardPrefix}{shardID}{height8LE}`.

const BLOCK_PREFIX: &[u8] = b"b-";
const SHARD_BLOCK_PREFIX: &[u8] = b"s-";
const BLOCK_INDEX_PREFIX: &[u8] = b"i-";
const BEST_STATE_PREFIX: &[u8] = b"best-";
const SHARD_COMMITTEE_PREFIX: &[u8] = b"shard-committee-";

pub fn block_key(hash: &[u8]) -> Vec<u8> {
    [BLOCK_PREFIX, hash].concat()
}

pub fn shard_block_key(shard_id: u8, hash: &[u8]) -> Vec<u8> {
    let mut key = SHARD_BLOCK_PREFIX.to_vec();
    key.push(shard_id);
    key.extend_from_slice(BLOCK_PREFIX);
    key.extend_from_slice(hash);
    key
}

pub fn block_index_key(hash: &[u8]) -> Vec<u8> {
    [BLOCK_INDEX_PREFIX, hash].concat()
}

/// 9-byte reverse index value: an 8-byte little-endian block height
/// followed by the 1-byte shard id.
pub fn block_index_value(height: u64, shard_id: u8) -> [u8; 9] {
    let mut buf = [0u8; 9];
    buf[..8].copy_from_slice(&height.to_le_bytes());
    buf[8] = shard_id;
    buf
}

/// Inverse of `block_index_key`'s target: `{height8LE}{shardID}` -> hash.
pub fn height_shard_key(height: u64, shard_id: u8) -> Vec<u8> {
    let mut key = height.to_le_bytes().to_vec();
    key.push(shard_id);
    key
}

pub fn best_state_key(shard_id: u8) -> Vec<u8> {
    let mut key = BEST_STATE_PREFIX.to_vec();
    key.push(shard_id);
    key
}

pub fn shard_committee_key(shard_id: u8, height: u64) -> Vec<u8> {
    let mut key = SHARD_COMMITTEE_PREFIX.to_vec();
    key.push(shard_id);
    key.extend_from_slice(&height.to_le_bytes());
    key
}

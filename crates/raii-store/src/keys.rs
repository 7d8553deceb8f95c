//! Composite key encoding for the edge tables.
//!
//! Edge tables have no single natural scalar key, so we pack the
//! endpoints into one NUL-separated byte string — the same "pack
//! several fields into one ordered key" approach `storage_core` uses
//! for its adjacency indices (`out_edge_key` / `in_edge_key`), minus
//! the fixed-width requirement since our endpoints are variable-length
//! host-assigned ids rather than 128-bit integers.

const SEP: u8 = 0;

pub fn pack2(a: &str, b: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(a.len() + b.len() + 1);
    key.extend_from_slice(a.as_bytes());
    key.push(SEP);
    key.extend_from_slice(b.as_bytes());
    key
}

pub fn pack3(a: &str, b: &str, c: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(a.len() + b.len() + c.len() + 2);
    key.extend_from_slice(a.as_bytes());
    key.push(SEP);
    key.extend_from_slice(b.as_bytes());
    key.push(SEP);
    key.extend_from_slice(c.as_bytes());
    key
}

/// Prefix for scanning all `pack2` keys beginning with `a`.
pub fn task_prefix(a: &str) -> Vec<u8> {
    let mut prefix = a.as_bytes().to_vec();
    prefix.push(SEP);
    prefix
}

pub fn unpack2(key: &[u8]) -> Option<(&str, &str)> {
    let idx = key.iter().position(|&b| b == SEP)?;
    let a = std::str::from_utf8(&key[..idx]).ok()?;
    let b = std::str::from_utf8(&key[idx + 1..]).ok()?;
    Some((a, b))
}

/// Key for the `chunks_by_created_at` secondary index: `created_at`
/// (nanoseconds since epoch, big-endian so byte order == numeric
/// order) followed by the chunk id, so iterating the index in key
/// order yields ascending-`created_at` chunk ids (spec §3: `list_all`
/// must return chunks in non-decreasing `created_at` order).
pub fn created_at_index_key(created_at_nanos: i64, chunk_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + chunk_id.len());
    // Shift into an unsigned range before encoding so big-endian byte
    // order matches numeric order even for (theoretical) negative
    // timestamps.
    let biased = (created_at_nanos as i128 - i64::MIN as i128) as u64;
    key.extend_from_slice(&biased.to_be_bytes());
    key.extend_from_slice(chunk_id.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip() {
        let key = pack2("task-1", "chunk-2");
        assert_eq!(unpack2(&key), Some(("task-1", "chunk-2")));
    }

    #[test]
    fn created_at_index_key_orders_by_timestamp() {
        let earlier = created_at_index_key(100, "z");
        let later = created_at_index_key(200, "a");
        assert!(earlier < later);
    }
}

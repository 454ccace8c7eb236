use super::engine::Collation;

/// Map a user key into the engine's key space.
///
/// Engines that compare bytes as signed values get every byte's high bit
/// flipped, so that their native order equals unsigned lexicographic order
/// of the user keys. Unsigned engines store keys unchanged.
pub fn to_engine_key(collation: Collation, key: &[u8]) -> Vec<u8> {
    match collation {
        Collation::Unsigned => key.to_vec(),
        Collation::Signed => flip(key),
    }
}

/// Inverse of [`to_engine_key`].
pub fn from_engine_key(collation: Collation, key: &[u8]) -> Vec<u8> {
    match collation {
        Collation::Unsigned => key.to_vec(),
        Collation::Signed => flip(key),
    }
}

fn flip(key: &[u8]) -> Vec<u8> {
    key.iter().map(|b| b ^ 0x80).collect()
}

/// Byte-wise comparison treating each byte as `i8`.
pub fn signed_cmp(a: &[u8], b: &[u8]) -> std::cmp::Ordering {
    a.iter()
        .map(|&x| x as i8)
        .cmp(b.iter().map(|&x| x as i8))
}

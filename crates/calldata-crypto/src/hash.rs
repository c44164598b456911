//! The one digest the codec needs: Keccak-256, for selectors and topics.

use calldata_primitives::H256;
use sha3::{Digest, Keccak256};

/// Keccak-256 of `data`
pub fn keccak256(data: &[u8]) -> H256 {
    H256::from_bytes(Keccak256::digest(data).into())
}

/// First four bytes of the Keccak-256 digest of `preimage`
pub fn selector_of(preimage: &[u8]) -> [u8; 4] {
    let digest = Keccak256::digest(preimage);
    [digest[0], digest[1], digest[2], digest[3]]
}

use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, TxMerkleNode};
use hex::FromHex;

/// Convert a hex string in internal (little-endian) byte order to a
/// BlockHash. Display formatting reverses it back.
pub fn hex_to_blockhash(hex: &str) -> Result<BlockHash, hex::FromHexError> {
    let bytes = <[u8; 32]>::from_hex(hex)?;
    Ok(BlockHash::from_byte_array(bytes))
}

/// Convert a hex string in internal (little-endian) byte order to a merkle
/// node.
pub fn hex_to_merkle_node(hex: &str) -> Result<TxMerkleNode, hex::FromHexError> {
    let bytes = <[u8; 32]>::from_hex(hex)?;
    Ok(TxMerkleNode::from_byte_array(bytes))
}

/// Convert a display-order (big-endian) hex string to a BlockHash.
pub fn display_hex_to_blockhash(hex: &str) -> Result<BlockHash, hex::FromHexError> {
    let mut bytes = <[u8; 32]>::from_hex(hex)?;
    bytes.reverse();
    Ok(BlockHash::from_byte_array(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_order_round_trips_through_display() {
        let hex = "6fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000";
        let hash = hex_to_blockhash(hex).unwrap();
        // Bitcoin hashes display in reverse byte order.
        assert_eq!(
            hash.to_string(),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
    }

    #[test]
    fn display_order_parses_to_same_hash() {
        let a = hex_to_blockhash("6fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000")
            .unwrap();
        let b = display_hex_to_blockhash(
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f",
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(hex_to_blockhash("not hex").is_err());
        assert!(display_hex_to_blockhash("abcd").is_err());
    }
}

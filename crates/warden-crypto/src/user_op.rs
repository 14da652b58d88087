//! Typed-data digest for packed user operations.
//!
//! The digest is what the key-custody layer signs:
//!
//! ```text
//! keccak256(0x19 0x01 ‖ domainSeparator ‖ structHash)
//! ```
//!
//! The domain binds the digest to a chain id and an entry point contract, so
//! a signature for one deployment cannot be replayed on another.

use crate::abi::{self, AbiPacker, WORD_LEN};
use crate::address::Address;
use crate::hash::ContentHash;

/// Canonical type string of a packed user operation.
pub const PACKED_USER_OP_TYPE: &str = "PackedUserOperation(address sender,uint256 nonce,bytes initCode,bytes callData,bytes32 accountGasLimits,uint256 preVerificationGas,bytes32 gasFees,bytes paymasterAndData)";

/// Canonical type string of the typed-data domain.
pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Domain name used by the entry point.
pub const DOMAIN_NAME: &str = "ERC4337";

/// Domain version used by the entry point.
pub const DOMAIN_VERSION: &str = "1";

/// Entry point contract used when none is configured.
pub const DEFAULT_ENTRY_POINT: Address = Address::from_bytes([
    0x43, 0x37, 0x08, 0x4d, 0x9e, 0x25, 0x5f, 0xf0, 0x70, 0x24, 0x61, 0xcf, 0x88, 0x95, 0xce, 0x9e,
    0x3b, 0x5f, 0xf1, 0x08,
]);

/// A packed user operation, laid out the way the entry point hashes it.
///
/// `nonce` and `pre_verification_gas` are full 256-bit big-endian values.
/// `account_gas_limits` and `gas_fees` each pack two 128-bit values; see
/// [`PackedUserOperation::pack_gas_limits`] and
/// [`PackedUserOperation::pack_gas_fees`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedUserOperation {
    /// Smart account sending the operation.
    pub sender: Address,
    /// Account nonce (uint256, big-endian).
    pub nonce: [u8; WORD_LEN],
    /// Factory call for first-time deployment, empty otherwise.
    pub init_code: Vec<u8>,
    /// Call the account executes.
    pub call_data: Vec<u8>,
    /// `verificationGasLimit ‖ callGasLimit`, 16 bytes each.
    pub account_gas_limits: [u8; WORD_LEN],
    /// Pre-verification gas (uint256, big-endian).
    pub pre_verification_gas: [u8; WORD_LEN],
    /// `maxPriorityFeePerGas ‖ maxFeePerGas`, 16 bytes each.
    pub gas_fees: [u8; WORD_LEN],
    /// Paymaster address and data, empty when self-funded.
    pub paymaster_and_data: Vec<u8>,
}

impl PackedUserOperation {
    /// Keccak-256 of [`PACKED_USER_OP_TYPE`].
    #[must_use]
    pub fn typehash() -> ContentHash {
        ContentHash::hash(PACKED_USER_OP_TYPE.as_bytes())
    }

    /// Keccak-256 of [`EIP712_DOMAIN_TYPE`].
    #[must_use]
    pub fn domain_typehash() -> ContentHash {
        ContentHash::hash(EIP712_DOMAIN_TYPE.as_bytes())
    }

    /// Domain separator for a chain and entry point.
    #[must_use]
    pub fn domain_separator(chain_id: u64, entry_point: &Address) -> ContentHash {
        AbiPacker::with_words(5)
            .hash(&Self::domain_typehash())
            .bytes_hash(DOMAIN_NAME.as_bytes())
            .bytes_hash(DOMAIN_VERSION.as_bytes())
            .uint(chain_id)
            .address(entry_point)
            .digest()
    }

    /// Struct hash of this operation.
    ///
    /// Dynamic fields contribute their own Keccak-256 hash.
    #[must_use]
    pub fn struct_hash(&self) -> ContentHash {
        let packer = AbiPacker::with_words(9)
            .hash(&Self::typehash())
            .address(&self.sender)
            .word(&self.nonce)
            .bytes_hash(&self.init_code)
            .bytes_hash(&self.call_data)
            .word(&self.account_gas_limits)
            .word(&self.pre_verification_gas)
            .word(&self.gas_fees)
            .bytes_hash(&self.paymaster_and_data);
        debug_assert_eq!(packer.len(), 288);
        packer.digest()
    }

    /// The digest to sign for this operation on `chain_id` via `entry_point`.
    #[must_use]
    pub fn hash(&self, entry_point: &Address, chain_id: u64) -> ContentHash {
        AbiPacker::new()
            .raw(&[0x19, 0x01])
            .hash(&Self::domain_separator(chain_id, entry_point))
            .hash(&self.struct_hash())
            .digest()
    }

    /// Pack `verificationGasLimit` (high half) and `callGasLimit` (low half).
    #[must_use]
    pub fn pack_gas_limits(verification_gas_limit: u128, call_gas_limit: u128) -> [u8; WORD_LEN] {
        pack_halves(verification_gas_limit, call_gas_limit)
    }

    /// Pack `maxPriorityFeePerGas` (high half) and `maxFeePerGas` (low half).
    #[must_use]
    pub fn pack_gas_fees(max_priority_fee_per_gas: u128, max_fee_per_gas: u128) -> [u8; WORD_LEN] {
        pack_halves(max_priority_fee_per_gas, max_fee_per_gas)
    }

    /// Set the nonce from a `u64`.
    #[must_use]
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = abi::pack_uint(nonce);
        self
    }
}

fn pack_halves(high: u128, low: u128) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[..16].copy_from_slice(&high.to_be_bytes());
    word[16..].copy_from_slice(&low.to_be_bytes());
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_op() -> PackedUserOperation {
        PackedUserOperation {
            sender: Address::parse("0x1234567890abcdef1234567890abcdef12345678").unwrap(),
            nonce: abi::pack_uint(3),
            init_code: Vec::new(),
            call_data: vec![0xb6, 0x1d, 0x27, 0xf6, 0x00, 0x01],
            account_gas_limits: PackedUserOperation::pack_gas_limits(150_000, 300_000),
            pre_verification_gas: abi::pack_uint(50_000),
            gas_fees: PackedUserOperation::pack_gas_fees(1_000_000, 2_000_000_000),
            paymaster_and_data: Vec::new(),
        }
    }

    #[test]
    fn test_typehash_is_hash_of_type_string() {
        assert_eq!(
            PackedUserOperation::typehash(),
            ContentHash::hash(PACKED_USER_OP_TYPE.as_bytes())
        );
    }

    #[test]
    fn test_domain_typehash_vector() {
        assert_eq!(
            PackedUserOperation::domain_typehash().to_hex(),
            "8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f"
        );
    }

    #[test]
    fn test_version_hash_vector() {
        assert_eq!(
            ContentHash::hash(DOMAIN_VERSION.as_bytes()).to_hex(),
            "c89efdaa54c0f20c7adf612882df0950f5a951637e0307cdcb4c672f298b8bc6"
        );
    }

    #[test]
    fn test_typehash_vector() {
        assert_eq!(
            PackedUserOperation::typehash().to_hex(),
            "29a0bca4af4be3421398da00295e58e6d7de38cb492214754cb6a47507dd6f8e"
        );
    }

    #[test]
    fn test_name_hash_vector() {
        assert_eq!(
            ContentHash::hash(DOMAIN_NAME.as_bytes()).to_hex(),
            "364da28a5c92bcc87fe97c8813a6c6b8a3a049b0ea0a328fcb0b4f0e00337586"
        );
    }

    #[test]
    fn test_domain_separator_vector() {
        assert_eq!(
            PackedUserOperation::domain_separator(8453, &DEFAULT_ENTRY_POINT).to_hex(),
            "32d3d9470df728b0d14d164308641c85a39d325b72281e775cc8d113c59a1201"
        );
    }

    #[test]
    fn test_struct_hash_and_digest_vectors() {
        let op = sample_op();
        assert_eq!(
            op.struct_hash().to_hex(),
            "3b0bd80282c06d90b4b507442869c473cbad7881e0a2ecb34224f5f1e167ffaa"
        );
        assert_eq!(
            op.hash(&DEFAULT_ENTRY_POINT, 8453).to_hex(),
            "ad7b7bc3444d3a840aaad85b01307914161bb24a19c7eb7079d346a4ec6fff38"
        );
    }

    #[test]
    fn test_digest_layout() {
        let op = sample_op();
        let ep = DEFAULT_ENTRY_POINT;

        let mut preimage = vec![0x19, 0x01];
        preimage.extend_from_slice(PackedUserOperation::domain_separator(8453, &ep).as_bytes());
        preimage.extend_from_slice(op.struct_hash().as_bytes());

        assert_eq!(op.hash(&ep, 8453), ContentHash::hash(&preimage));
    }

    #[test]
    fn test_struct_hash_commits_to_dynamic_fields_by_hash() {
        let op = sample_op();
        let mut manual = Vec::new();
        manual.extend_from_slice(PackedUserOperation::typehash().as_bytes());
        manual.extend_from_slice(&abi::pack_address(&op.sender));
        manual.extend_from_slice(&op.nonce);
        manual.extend_from_slice(ContentHash::hash(&op.init_code).as_bytes());
        manual.extend_from_slice(ContentHash::hash(&op.call_data).as_bytes());
        manual.extend_from_slice(&op.account_gas_limits);
        manual.extend_from_slice(&op.pre_verification_gas);
        manual.extend_from_slice(&op.gas_fees);
        manual.extend_from_slice(ContentHash::hash(&op.paymaster_and_data).as_bytes());
        assert_eq!(op.struct_hash(), ContentHash::hash(&manual));
    }

    #[test]
    fn test_deterministic() {
        let op = sample_op();
        assert_eq!(
            op.hash(&DEFAULT_ENTRY_POINT, 1),
            op.clone().hash(&DEFAULT_ENTRY_POINT, 1)
        );
    }

    #[test]
    fn test_chain_id_changes_digest() {
        let op = sample_op();
        assert_ne!(
            op.hash(&DEFAULT_ENTRY_POINT, 1),
            op.hash(&DEFAULT_ENTRY_POINT, 8453)
        );
    }

    #[test]
    fn test_entry_point_changes_digest() {
        let op = sample_op();
        let other = Address::parse("0x0000000071727de22e5e9d8baf0edac6f37da032").unwrap();
        assert_ne!(op.hash(&DEFAULT_ENTRY_POINT, 8453), op.hash(&other, 8453));
    }

    #[test]
    fn test_any_field_changes_digest() {
        let base = sample_op();
        let digest = base.hash(&DEFAULT_ENTRY_POINT, 8453);

        let mut op = base.clone();
        op.call_data.push(0);
        assert_ne!(op.hash(&DEFAULT_ENTRY_POINT, 8453), digest);

        let op = base.clone().with_nonce(4);
        assert_ne!(op.hash(&DEFAULT_ENTRY_POINT, 8453), digest);

        let mut op = base;
        op.paymaster_and_data = vec![0x01];
        assert_ne!(op.hash(&DEFAULT_ENTRY_POINT, 8453), digest);
    }

    #[test]
    fn test_pack_gas_limits_halves() {
        let word = PackedUserOperation::pack_gas_limits(1, 2);
        assert_eq!(word[15], 1);
        assert_eq!(word[31], 2);
        assert!(word[..15].iter().all(|b| *b == 0));
        assert!(word[16..31].iter().all(|b| *b == 0));
    }
}

//! Calldata builders.
//!
//! These produce standard ABI encodings so decoder tests exercise the same
//! byte layouts a real client would submit.

use warden_crypto::Address;
use warden_crypto::abi::{WORD_LEN, pack_address, pack_bool, pack_uint};

/// Universal Router command: exact-input V3 swap.
pub const CMD_V3_SWAP_EXACT_IN: u8 = 0x00;

/// Universal Router command: wrap native ETH into WETH.
pub const CMD_WRAP_ETH: u8 = 0x0b;

/// Universal Router command: sweep tokens out of the router.
pub const CMD_SWEEP: u8 = 0x04;

/// `transfer(address to, uint256 amount)`
#[must_use]
pub fn encode_transfer(to: &Address, amount: u64) -> Vec<u8> {
    let mut out = vec![0xa9, 0x05, 0x9c, 0xbb];
    out.extend_from_slice(&pack_address(to));
    out.extend_from_slice(&pack_uint(amount));
    out
}

/// `approve(address spender, uint256 amount)`
#[must_use]
pub fn encode_approve(spender: &Address, amount: u64) -> Vec<u8> {
    let mut out = vec![0x09, 0x5e, 0xa7, 0xb3];
    out.extend_from_slice(&pack_address(spender));
    out.extend_from_slice(&pack_uint(amount));
    out
}

/// A V3 path: `tokenIn ‖ fee (3 bytes) ‖ tokenOut`, with any number of hops.
///
/// `tokens` must be one longer than `fees`.
#[must_use]
pub fn encode_path(tokens: &[Address], fees: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        out.extend_from_slice(token.as_bytes());
        if let Some(fee) = fees.get(i) {
            out.extend_from_slice(&fee.to_be_bytes()[1..]);
        }
    }
    out
}

/// Input for `V3_SWAP_EXACT_IN`:
/// `abi.encode(recipient, amountIn, amountOutMin, path, payerIsUser)`.
#[must_use]
pub fn encode_v3_swap_exact_in(
    recipient: &Address,
    amount_in: u64,
    amount_out_min: u64,
    path: &[u8],
    payer_is_user: bool,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&pack_address(recipient));
    out.extend_from_slice(&pack_uint(amount_in));
    out.extend_from_slice(&pack_uint(amount_out_min));
    out.extend_from_slice(&pack_uint(0xa0));
    out.extend_from_slice(&pack_bool(payer_is_user));
    append_bytes(&mut out, path);
    out
}

/// Input for `WRAP_ETH`: `abi.encode(recipient, amountMin)`.
#[must_use]
pub fn encode_wrap_eth(recipient: &Address, amount_min: u64) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&pack_address(recipient));
    out.extend_from_slice(&pack_uint(amount_min));
    out
}

/// `execute(bytes commands, bytes[] inputs, uint256 deadline)`
#[must_use]
pub fn encode_execute(commands: &[u8], inputs: &[Vec<u8>], deadline: u64) -> Vec<u8> {
    let mut commands_tail = Vec::new();
    append_bytes(&mut commands_tail, commands);

    let mut inputs_tail = Vec::new();
    inputs_tail.extend_from_slice(&pack_uint(len_u64(inputs.len())));
    let mut offset = inputs.len().saturating_mul(WORD_LEN);
    let mut bodies = Vec::new();
    for input in inputs {
        inputs_tail.extend_from_slice(&pack_uint(len_u64(offset)));
        let before = bodies.len();
        append_bytes(&mut bodies, input);
        offset = offset.saturating_add(bodies.len().saturating_sub(before));
    }
    inputs_tail.extend_from_slice(&bodies);

    let head_len = WORD_LEN.saturating_mul(3);
    let mut out = vec![0x35, 0x93, 0x56, 0x4c];
    out.extend_from_slice(&pack_uint(len_u64(head_len)));
    out.extend_from_slice(&pack_uint(len_u64(
        head_len.saturating_add(commands_tail.len()),
    )));
    out.extend_from_slice(&pack_uint(deadline));
    out.extend_from_slice(&commands_tail);
    out.extend_from_slice(&inputs_tail);
    out
}

/// A single-hop token-to-token swap paid from the wallet.
#[must_use]
pub fn encode_token_swap(
    recipient: &Address,
    token_in: &Address,
    token_out: &Address,
    fee: u32,
    amount_in: u64,
    amount_out_min: u64,
) -> Vec<u8> {
    let path = encode_path(&[*token_in, *token_out], &[fee]);
    encode_execute(
        &[CMD_V3_SWAP_EXACT_IN],
        &[encode_v3_swap_exact_in(
            recipient,
            amount_in,
            amount_out_min,
            &path,
            true,
        )],
        u64::MAX,
    )
}

/// A single-hop ETH-to-token swap: `WRAP_ETH` then `V3_SWAP_EXACT_IN` paid by the router.
#[must_use]
pub fn encode_eth_swap(
    recipient: &Address,
    weth: &Address,
    token_out: &Address,
    fee: u32,
    amount_in: u64,
    amount_out_min: u64,
) -> Vec<u8> {
    let path = encode_path(&[*weth, *token_out], &[fee]);
    let router_self = Address::from_bytes([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2,
    ]);
    encode_execute(
        &[CMD_WRAP_ETH, CMD_V3_SWAP_EXACT_IN],
        &[
            encode_wrap_eth(&router_self, amount_in),
            encode_v3_swap_exact_in(recipient, amount_in, amount_out_min, &path, false),
        ],
        u64::MAX,
    )
}

fn append_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&pack_uint(len_u64(bytes.len())));
    out.extend_from_slice(bytes);
    let rem = bytes.len() % WORD_LEN;
    if rem != 0 {
        out.resize(out.len().saturating_add(WORD_LEN.saturating_sub(rem)), 0);
    }
}

fn len_u64(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

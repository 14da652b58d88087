//! Calldata classification.
//!
//! [`decode`] turns raw calldata into a typed [`DecodedIntent`] with a
//! human-readable summary. Rules, first match wins:
//!
//! 1. Empty calldata is a native transfer and is always known.
//! 2. `transfer(address,uint256)` with a full payload is a token transfer,
//!    known only when the target is a registered stablecoin.
//! 3. The Universal Router `execute` selector on a registered router is a
//!    swap, known only when its command/input encoding parses.
//! 4. Any other registered protocol method is a known protocol call.
//! 5. Everything else is unknown; the summary carries the selector.
//!
//! Decoding never fails. Anything that does not parse cleanly comes back as
//! [`ActionKind::Unknown`], which the engine treats as needing approval.

use serde::{Deserialize, Serialize};

use warden_crypto::Address;
use warden_crypto::abi::{self, WORD_LEN};

use crate::intent::Intent;
use crate::registry::{ProtocolMethod, ProtocolRegistry, StablecoinRegistry};
use crate::selector::{ERC20_TRANSFER, ROUTER_EXECUTE, Selector};

/// Router recipient sentinel meaning "send output to `msg.sender`".
pub const MSG_SENDER: Address = Address::from_bytes([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
]);

/// Universal Router command bytes the policy understands.
pub mod commands {
    /// Exact-input swap through V3 pools.
    pub const V3_SWAP_EXACT_IN: u8 = 0x00;
    /// Wrap native ETH into WETH held by the router.
    pub const WRAP_ETH: u8 = 0x0b;
}

/// Length of an ERC-20 `transfer` call: selector plus two words.
const TOKEN_TRANSFER_LEN: usize = 68;

/// `tokenIn ‖ fee ‖ tokenOut`
const SINGLE_HOP_PATH_LEN: usize = 43;

/// Each additional hop adds `fee ‖ token`.
const HOP_LEN: usize = 23;

/// Parameters of a Universal Router exact-input swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    /// First token of the path.
    pub token_in: Address,
    /// Last token of the path.
    pub token_out: Address,
    /// Exact input amount.
    pub amount_in: u64,
    /// Minimum acceptable output.
    pub amount_out_min: u64,
    /// Pool fee tier of the first hop (hundredths of a bip).
    pub fee: u32,
    /// Where the swap output goes.
    pub recipient: Address,
    /// Router commands, in execution order.
    pub commands: Vec<u8>,
    /// Whether the wallet pays the input directly.
    pub payer_is_user: bool,
    /// Whether the path has more than one hop.
    pub is_multi_hop: bool,
}

impl SwapParams {
    /// Whether the command stream wraps native ETH.
    #[must_use]
    pub fn wraps_eth(&self) -> bool {
        self.commands.contains(&commands::WRAP_ETH)
    }
}

/// What a call does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// Bare native transfer to `target`.
    Transfer,
    /// ERC-20 `transfer` on the `token` contract.
    TokenTransfer {
        /// Token contract (the intent target).
        token: Address,
        /// Recipient decoded from calldata.
        recipient: Address,
        /// Amount in token base units.
        amount: u64,
    },
    /// Universal Router swap.
    Swap(SwapParams),
    /// Any other registered protocol method.
    ProtocolCall(ProtocolMethod),
    /// Anything the decoder does not understand.
    Unknown,
}

impl ActionKind {
    /// Short name of the action.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer => "Transfer",
            Self::TokenTransfer { .. } => "TokenTransfer",
            Self::Swap(_) => "Swap",
            Self::ProtocolCall(_) => "ProtocolCall",
            Self::Unknown => "Unknown",
        }
    }
}

/// Result of decoding an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedIntent {
    /// Classified action.
    pub action: ActionKind,
    /// Whether the call is fully understood.
    pub is_known: bool,
    /// Human-readable description.
    pub summary: String,
    /// Selector, when the calldata has one.
    pub selector: Option<Selector>,
}

impl DecodedIntent {
    fn known(action: ActionKind, summary: String, selector: Option<Selector>) -> Self {
        Self {
            action,
            is_known: true,
            summary,
            selector,
        }
    }

    fn unknown(action: ActionKind, summary: String, selector: Option<Selector>) -> Self {
        Self {
            action,
            is_known: false,
            summary,
            selector,
        }
    }
}

/// Classify an intent's calldata.
#[must_use]
pub fn decode(
    intent: &Intent,
    stablecoins: &dyn StablecoinRegistry,
    protocols: &dyn ProtocolRegistry,
) -> DecodedIntent {
    let target = &intent.target;

    if intent.calldata.is_empty() {
        return DecodedIntent::known(
            ActionKind::Transfer,
            format!(
                "Send {} ETH to {}",
                format_wei(intent.value),
                shorten_address(target)
            ),
            None,
        );
    }

    let Some(selector) = Selector::from_calldata(&intent.calldata) else {
        return DecodedIntent::unknown(
            ActionKind::Unknown,
            format!(
                "Malformed calldata ({} bytes) to {}",
                intent.calldata.len(),
                shorten_address(target)
            ),
            None,
        );
    };

    if selector == ERC20_TRANSFER && intent.calldata.len() >= TOKEN_TRANSFER_LEN {
        return decode_token_transfer(intent, selector, stablecoins);
    }

    if let Some(method) = protocols.lookup(intent.chain_id, target, selector) {
        if selector == ROUTER_EXECUTE {
            return match extract_swap_params(&intent.calldata) {
                Some(swap) => {
                    let summary = swap_summary(&swap, intent.value);
                    DecodedIntent::known(ActionKind::Swap(swap), summary, Some(selector))
                },
                None => DecodedIntent::unknown(
                    ActionKind::Unknown,
                    format!(
                        "Undecodable router call {selector} to {}",
                        shorten_address(target)
                    ),
                    Some(selector),
                ),
            };
        }

        let mut summary = format!(
            "{} {} on {}",
            method.protocol,
            method.method,
            shorten_address(target)
        );
        if intent.value > 0 {
            summary.push_str(&format!(" with {} ETH", format_wei(intent.value)));
        }
        return DecodedIntent::known(ActionKind::ProtocolCall(method), summary, Some(selector));
    }

    DecodedIntent::unknown(
        ActionKind::Unknown,
        format!("Unknown call {selector} to {}", shorten_address(target)),
        Some(selector),
    )
}

fn decode_token_transfer(
    intent: &Intent,
    selector: Selector,
    stablecoins: &dyn StablecoinRegistry,
) -> DecodedIntent {
    let token = intent.target;
    let (Some(recipient), Some(amount)) = (
        abi::read_address(&intent.calldata, 4),
        abi::read_u64(&intent.calldata, 36),
    ) else {
        return DecodedIntent::unknown(
            ActionKind::Unknown,
            format!("Malformed token transfer on {}", shorten_address(&token)),
            Some(selector),
        );
    };

    let action = ActionKind::TokenTransfer {
        token,
        recipient,
        amount,
    };

    if stablecoins.is_stablecoin(intent.chain_id, &token) {
        DecodedIntent::known(
            action,
            format!(
                "Send {} USDC to {}",
                format_usdc(amount),
                shorten_address(&recipient)
            ),
            Some(selector),
        )
    } else {
        DecodedIntent::unknown(
            action,
            format!(
                "Transfer {amount} units of unregistered token {} to {}",
                shorten_address(&token),
                shorten_address(&recipient)
            ),
            Some(selector),
        )
    }
}

fn swap_summary(swap: &SwapParams, value: u64) -> String {
    let input = if swap.wraps_eth() {
        format!("{} ETH", format_wei(value))
    } else {
        format!("{} of {}", swap.amount_in, shorten_address(&swap.token_in))
    };
    let hops = if swap.is_multi_hop { " (multi-hop)" } else { "" };
    format!(
        "Swap {input} for at least {} of {} via Uniswap{hops}",
        swap.amount_out_min,
        shorten_address(&swap.token_out)
    )
}

/// Extract the exact-input swap from a Universal Router `execute` call.
///
/// Returns `None` unless the call carries exactly one `V3_SWAP_EXACT_IN`
/// command, one input per command, a well-formed path and amounts that fit
/// in 64 bits. Command bytes are reported unmasked, so flag bits such as
/// allow-revert make a command count as a different command.
#[must_use]
pub fn extract_swap_params(calldata: &[u8]) -> Option<SwapParams> {
    if Selector::from_calldata(calldata)? != ROUTER_EXECUTE {
        return None;
    }
    let args = calldata.get(4..)?;

    let commands = read_bytes(args, 0, abi::read_usize(args, 0)?)?.to_vec();
    let inputs = read_bytes_array(args, abi::read_usize(args, WORD_LEN)?)?;
    if inputs.len() != commands.len() {
        return None;
    }

    let mut swaps = commands
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == commands::V3_SWAP_EXACT_IN)
        .map(|(i, _)| i);
    let index = swaps.next()?;
    if swaps.next().is_some() {
        return None;
    }
    let input = *inputs.get(index)?;

    let recipient = abi::read_address(input, 0)?;
    let amount_in = abi::read_u64(input, 32)?;
    let amount_out_min = abi::read_u64(input, 64)?;
    let path = read_bytes(input, 0, abi::read_usize(input, 96)?)?;
    let payer_is_user = abi::read_bool(input, 128)?;
    let (token_in, fee, token_out, is_multi_hop) = parse_path(path)?;

    Some(SwapParams {
        token_in,
        token_out,
        amount_in,
        amount_out_min,
        fee,
        recipient,
        commands,
        payer_is_user,
        is_multi_hop,
    })
}

/// Read a dynamic `bytes` value whose head sits at `base + offset`.
fn read_bytes(data: &[u8], base: usize, offset: usize) -> Option<&[u8]> {
    let start = base.checked_add(offset)?;
    let len = abi::read_usize(data, start)?;
    let body = start.checked_add(WORD_LEN)?;
    data.get(body..body.checked_add(len)?)
}

/// Read a `bytes[]` whose length word sits at `offset`.
fn read_bytes_array(data: &[u8], offset: usize) -> Option<Vec<&[u8]>> {
    let count = abi::read_usize(data, offset)?;
    let head = offset.checked_add(WORD_LEN)?;
    (0..count)
        .map(|i| {
            let slot = head.checked_add(i.checked_mul(WORD_LEN)?)?;
            read_bytes(data, head, abi::read_usize(data, slot)?)
        })
        .collect()
}

fn parse_path(path: &[u8]) -> Option<(Address, u32, Address, bool)> {
    let extra = path.len().checked_sub(SINGLE_HOP_PATH_LEN)?;
    if extra % HOP_LEN != 0 {
        return None;
    }
    let token_in = Address::try_from_slice(path.get(..20)?)?;
    let fee = match path.get(20..23)? {
        [a, b, c] => u32::from_be_bytes([0, *a, *b, *c]),
        _ => return None,
    };
    let token_out = Address::try_from_slice(path.get(path.len().checked_sub(20)?..)?)?;
    Some((token_in, fee, token_out, extra > 0))
}

/// Format wei as ETH with four decimals (truncated).
#[must_use]
pub fn format_wei(wei: u64) -> String {
    const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;
    const WEI_PER_TEN_THOUSANDTH: u64 = 100_000_000_000_000;
    let whole = wei / WEI_PER_ETH;
    let frac = (wei % WEI_PER_ETH) / WEI_PER_TEN_THOUSANDTH;
    format!("{whole}.{frac:04}")
}

/// Format USDC base units with two decimals (truncated).
#[must_use]
pub fn format_usdc(units: u64) -> String {
    const UNITS_PER_USDC: u64 = 1_000_000;
    const UNITS_PER_CENT: u64 = 10_000;
    let whole = units / UNITS_PER_USDC;
    let frac = (units % UNITS_PER_USDC) / UNITS_PER_CENT;
    format!("{whole}.{frac:02}")
}

/// Abbreviate an address as `0x1234…5678`.
#[must_use]
pub fn shorten_address(address: &Address) -> String {
    address.short()
}

//! The policy decision engine.
//!
//! [`PolicyEngine::evaluate`] is the single authorization entry point. It is
//! default-deny: an intent is allowed only when a rule positively proves it
//! safe, and every external failure maps to `RequireApproval`.
//!
//! # Evaluation order
//!
//! 1. Frozen -> `Deny`
//! 2. Blocklisted selector -> `RequireApproval`
//! 3. Token transfer on an unregistered token -> `RequireApproval`
//! 4. Anything the decoder does not fully understand -> `RequireApproval`
//! 5. Router swap: recipient, command set and payer checks, then slippage
//!    against a fresh quote, then spend limits
//! 6. Other registered protocol calls: spend limits
//! 7. Native or stablecoin transfers: spend limits, then the allowlist
//!
//! Swaps check slippage before spend limits while transfers check spend
//! limits before the allowlist. The asymmetry is long-standing behavior and
//! is kept as is.
//!
//! A swap spends `value` against the native caps. When its input token is a
//! registered stablecoin, `amount_in` also counts against the stablecoin
//! caps. Counting only `value` would let a stablecoin swap of any size pass
//! the spend gate, so this is a deliberate tightening.
//!
//! Swap output must go to the router's `MSG_SENDER` marker or to the wallet
//! set with [`PolicyEngine::with_wallet`]. The intent's own `wallet` field is
//! caller-supplied and is never trusted for this check.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use warden_crypto::Address;

use crate::blocklist;
use crate::decision::Decision;
use crate::decoder::{self, ActionKind, DecodedIntent, MSG_SENDER, SwapParams, commands};
use crate::intent::Intent;
use crate::profile::SecurityProfile;
use crate::quote::{QuoteError, QuoteSource, SlippageCheck};
use crate::registry::{KnownProtocols, KnownStablecoins, ProtocolRegistry, StablecoinRegistry};
use crate::spending::{RemainingBudgets, SpendCheck, SpendingSnapshot, SpendingTracker};

/// Default time allowed for a quote before failing closed.
pub const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Router commands a swap may contain.
const ALLOWED_COMMANDS: [u8; 2] = [commands::V3_SWAP_EXACT_IN, commands::WRAP_ETH];

const FROZEN: &str = "Wallet is frozen";

#[derive(Debug, Clone)]
struct PolicyState {
    profile: SecurityProfile,
    allowlist: HashSet<Address>,
    frozen: bool,
}

/// Default-deny policy engine.
///
/// Profile, allowlist and frozen flag live behind one lock and are replaced
/// copy-on-write, so an evaluation works from a consistent snapshot. Only
/// the quote await suspends; the frozen flag is re-read after it.
pub struct PolicyEngine {
    state: RwLock<Arc<PolicyState>>,
    spending: Arc<SpendingTracker>,
    stablecoins: Arc<dyn StablecoinRegistry>,
    protocols: Arc<dyn ProtocolRegistry>,
    quoter: Option<Arc<dyn QuoteSource>>,
    quote_timeout: Duration,
    wallet: Option<Address>,
    home_chain_id: Option<u64>,
}

impl PolicyEngine {
    /// Create an engine for `profile` with the built-in registries.
    ///
    /// The protocol registry is chosen from the profile name here and stays
    /// fixed across [`update_profile`](Self::update_profile).
    #[must_use]
    pub fn new(profile: SecurityProfile) -> Self {
        let protocols = KnownProtocols::for_profile(&profile.name);
        Self {
            state: RwLock::new(Arc::new(PolicyState {
                profile,
                allowlist: HashSet::new(),
                frozen: false,
            })),
            spending: Arc::new(SpendingTracker::new()),
            stablecoins: Arc::new(KnownStablecoins::default()),
            protocols: Arc::new(protocols),
            quoter: None,
            quote_timeout: DEFAULT_QUOTE_TIMEOUT,
            wallet: None,
            home_chain_id: None,
        }
    }

    /// Bind the engine to the smart account it guards.
    ///
    /// Swap output may go only to this address or to the router's
    /// `MSG_SENDER` marker. Without a wallet only the marker is accepted.
    #[must_use]
    pub fn with_wallet(mut self, wallet: Address) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Quote swaps on this chain instead of the intent's.
    #[must_use]
    pub fn with_home_chain_id(mut self, chain_id: u64) -> Self {
        self.home_chain_id = Some(chain_id);
        self
    }

    /// Seed the allowlist.
    #[must_use]
    pub fn with_allowlist(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.state_mut().allowlist.extend(addresses);
        self
    }

    /// Start frozen or unfrozen.
    #[must_use]
    pub fn with_frozen(mut self, frozen: bool) -> Self {
        self.state_mut().frozen = frozen;
        self
    }

    /// Attach a quote source for swap slippage checks.
    #[must_use]
    pub fn with_quote_source(mut self, quoter: Arc<dyn QuoteSource>) -> Self {
        self.quoter = Some(quoter);
        self
    }

    /// Override the quote timeout.
    #[must_use]
    pub fn with_quote_timeout(mut self, timeout: Duration) -> Self {
        self.quote_timeout = timeout;
        self
    }

    /// Share an existing spending tracker.
    #[must_use]
    pub fn with_spending_tracker(mut self, tracker: Arc<SpendingTracker>) -> Self {
        self.spending = tracker;
        self
    }

    /// Replace the stablecoin registry.
    #[must_use]
    pub fn with_stablecoin_registry(mut self, registry: Arc<dyn StablecoinRegistry>) -> Self {
        self.stablecoins = registry;
        self
    }

    /// Replace the protocol registry.
    #[must_use]
    pub fn with_protocol_registry(mut self, registry: Arc<dyn ProtocolRegistry>) -> Self {
        self.protocols = registry;
        self
    }

    fn state_mut(&mut self) -> &mut PolicyState {
        let arc = self
            .state
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::make_mut(arc)
    }

    fn snapshot(&self) -> Arc<PolicyState> {
        let guard = self.state.read().unwrap_or_else(|e| {
            tracing::warn!("PolicyEngine lock poisoned, recovering");
            e.into_inner()
        });
        Arc::clone(&guard)
    }

    fn update<R>(&self, f: impl FnOnce(&mut PolicyState) -> R) -> R {
        let mut guard = self.state.write().unwrap_or_else(|e| {
            tracing::warn!("PolicyEngine lock poisoned, recovering");
            e.into_inner()
        });
        f(Arc::make_mut(&mut guard))
    }

    /// Decide whether `intent` may be signed.
    pub async fn evaluate(&self, intent: &Intent) -> Decision {
        tracing::debug!(
            chain_id = intent.chain_id,
            contract = %intent.target,
            value = intent.value,
            calldata_len = intent.calldata.len(),
            "Evaluating intent"
        );

        let decision = self.decide(intent).await;
        match &decision {
            Decision::Allow => tracing::debug!(contract = %intent.target, "Intent allowed"),
            Decision::RequireApproval(reason) => {
                tracing::info!(contract = %intent.target, reason = %reason, "Intent requires approval");
            },
            Decision::Deny(reason) => {
                tracing::info!(contract = %intent.target, reason = %reason, "Intent denied");
            },
        }
        decision
    }

    async fn decide(&self, intent: &Intent) -> Decision {
        let state = self.snapshot();
        if state.frozen {
            return Decision::Deny(FROZEN.to_string());
        }

        if let Some(blocked) = blocklist::check_calldata(&intent.calldata) {
            return Decision::RequireApproval(format!(
                "Blocked selector {} ({}) requires explicit approval",
                blocked.selector, blocked.signature
            ));
        }

        let decoded = self.decode(intent);
        if matches!(decoded.action, ActionKind::TokenTransfer { .. }) && !decoded.is_known {
            return Decision::RequireApproval(format!(
                "Unknown token transfer requires approval: {}",
                decoded.summary
            ));
        }
        if !decoded.is_known {
            return Decision::RequireApproval(format!("Unknown calldata: {}", decoded.summary));
        }

        match decoded.action {
            ActionKind::Swap(swap) => self.evaluate_swap(intent, &swap).await,
            ActionKind::ProtocolCall(_) => self.spend_gate(intent.value, 0, &state.profile),
            ActionKind::Transfer => {
                self.evaluate_transfer(intent.value, 0, &intent.target, &state)
            },
            ActionKind::TokenTransfer {
                recipient, amount, ..
            } => self.evaluate_transfer(intent.value, amount, &recipient, &state),
            ActionKind::Unknown => {
                Decision::RequireApproval(format!("Action requires approval: {}", decoded.summary))
            },
        }
    }

    async fn evaluate_swap(&self, intent: &Intent, swap: &SwapParams) -> Decision {
        if swap.recipient != MSG_SENDER && Some(swap.recipient) != self.wallet {
            return Decision::RequireApproval(format!(
                "Swap recipient {} is not the wallet; possible output diversion",
                swap.recipient.short()
            ));
        }

        let disallowed: Vec<String> = swap
            .commands
            .iter()
            .filter(|c| !ALLOWED_COMMANDS.contains(c))
            .map(|c| format!("0x{c:02x}"))
            .collect();
        if !disallowed.is_empty() {
            return Decision::RequireApproval(format!(
                "Swap contains disallowed commands [{}]; approval required",
                disallowed.join(", ")
            ));
        }

        // ETH in: the router holds WETH after wrapping and pays the pool.
        // Token in: the wallet pays directly.
        let wraps = swap.wraps_eth();
        if wraps && swap.payer_is_user {
            return Decision::RequireApproval(
                "ETH swap with payerIsUser=true is unexpected; approval required".to_string(),
            );
        }
        if !wraps && !swap.payer_is_user {
            return Decision::RequireApproval(
                "Token swap with payerIsUser=false is unexpected; approval required".to_string(),
            );
        }

        if swap.is_multi_hop {
            return Decision::RequireApproval(
                "Multi-hop swap; cannot verify slippage".to_string(),
            );
        }

        let quote_chain = self.home_chain_id.unwrap_or(intent.chain_id);
        let quote = match self.fetch_quote(quote_chain, swap).await {
            Ok(quote) => quote,
            Err(e) => {
                return Decision::RequireApproval(format!(
                    "Cannot verify slippage ({e}); approval required"
                ));
            },
        };

        // The await above may have raced a freeze or profile change.
        let state = self.snapshot();
        if state.frozen {
            return Decision::Deny(FROZEN.to_string());
        }

        let slippage =
            SlippageCheck::evaluate(quote, swap.amount_out_min, state.profile.max_slippage_bps);
        tracing::debug!(quote, amount_out_min = swap.amount_out_min, bps = slippage.bps(), "Swap slippage");
        if !slippage.is_within() {
            return Decision::RequireApproval(slippage.to_string());
        }

        let stablecoin = if self.stablecoins.is_stablecoin(intent.chain_id, &swap.token_in) {
            swap.amount_in
        } else {
            0
        };
        self.spend_gate(intent.value, stablecoin, &state.profile)
    }

    async fn fetch_quote(&self, chain_id: u64, swap: &SwapParams) -> Result<u64, QuoteError> {
        let Some(quoter) = &self.quoter else {
            return Err(QuoteError::Unavailable { chain_id });
        };

        let call = quoter.quote_exact_input_single(
            chain_id,
            swap.token_in,
            swap.token_out,
            swap.amount_in,
            swap.fee,
        );
        let result = match tokio::time::timeout(self.quote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(QuoteError::Timeout {
                timeout_ms: u64::try_from(self.quote_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        match result {
            Ok(0) => Err(QuoteError::ZeroQuote),
            Ok(quote) => Ok(quote),
            Err(e) => {
                tracing::warn!(chain_id, error = %e, "Quote failed, failing closed");
                Err(e)
            },
        }
    }

    fn evaluate_transfer(
        &self,
        native: u64,
        stablecoin: u64,
        recipient: &Address,
        state: &PolicyState,
    ) -> Decision {
        match self.spending.check(native, stablecoin, &state.profile) {
            SpendCheck::Allowed => {
                if state.allowlist.contains(recipient) || (native == 0 && stablecoin == 0) {
                    Decision::Allow
                } else {
                    Decision::RequireApproval(format!(
                        "Transfer to non-allowlisted address {}",
                        recipient.short()
                    ))
                }
            },
            SpendCheck::Denied(violation) => {
                Decision::RequireApproval(format!("Spending limit: {violation}"))
            },
        }
    }

    fn spend_gate(&self, native: u64, stablecoin: u64, profile: &SecurityProfile) -> Decision {
        match self.spending.check(native, stablecoin, profile) {
            SpendCheck::Allowed => Decision::Allow,
            SpendCheck::Denied(violation) => {
                Decision::RequireApproval(format!("Spending limit: {violation}"))
            },
        }
    }

    /// Decode an intent without deciding anything, for previews.
    #[must_use]
    pub fn decode(&self, intent: &Intent) -> DecodedIntent {
        decoder::decode(intent, self.stablecoins.as_ref(), self.protocols.as_ref())
    }

    /// Record a signed transaction against the spend limits.
    ///
    /// Call this after a signature is produced, not when a decision is made.
    pub fn record_transaction(&self, native: u64, stablecoin: u64) {
        self.spending.record(native, stablecoin);
    }

    /// Budgets left today under the active profile.
    #[must_use]
    pub fn remaining_budgets(&self) -> RemainingBudgets {
        self.spending.remaining_budgets(&self.snapshot().profile)
    }

    /// Current spend counters.
    #[must_use]
    pub fn spending_snapshot(&self) -> SpendingSnapshot {
        self.spending.snapshot()
    }

    /// Block all signing.
    pub fn freeze(&self) {
        self.update(|s| s.frozen = true);
        tracing::warn!("Wallet frozen");
    }

    /// Resume signing.
    pub fn unfreeze(&self) {
        self.update(|s| s.frozen = false);
        tracing::info!("Wallet unfrozen");
    }

    /// Whether signing is blocked.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.snapshot().frozen
    }

    /// Add an address to the allowlist. Returns `false` if already present.
    pub fn add_to_allowlist(&self, address: Address) -> bool {
        let added = self.update(|s| s.allowlist.insert(address));
        tracing::info!(address = %address, added, "Allowlist add");
        added
    }

    /// Remove an address from the allowlist. Returns `false` if absent.
    pub fn remove_from_allowlist(&self, address: &Address) -> bool {
        let removed = self.update(|s| s.allowlist.remove(address));
        tracing::info!(address = %address, removed, "Allowlist remove");
        removed
    }

    /// Whether `address` is allowlisted.
    #[must_use]
    pub fn is_allowlisted(&self, address: &Address) -> bool {
        self.snapshot().allowlist.contains(address)
    }

    /// The allowlist, sorted.
    #[must_use]
    pub fn allowlist(&self) -> Vec<Address> {
        let mut out: Vec<Address> = self.snapshot().allowlist.iter().copied().collect();
        out.sort();
        out
    }

    /// Swap in a new effective profile.
    pub fn update_profile(&self, profile: SecurityProfile) {
        tracing::info!(profile = %profile.name, "Security profile updated");
        self.update(|s| s.profile = profile);
    }

    /// The active profile.
    #[must_use]
    pub fn profile(&self) -> SecurityProfile {
        self.snapshot().profile.clone()
    }

    /// Name of the active profile.
    #[must_use]
    pub fn profile_name(&self) -> String {
        self.snapshot().profile.name.clone()
    }

    /// Slippage limit of the active profile, in basis points.
    #[must_use]
    pub fn max_slippage_bps(&self) -> u32 {
        self.snapshot().profile.max_slippage_bps
    }

    /// Configured quote timeout.
    #[must_use]
    pub fn quote_timeout(&self) -> Duration {
        self.quote_timeout
    }

    /// The configured smart account, if any.
    #[must_use]
    pub fn wallet(&self) -> Option<Address> {
        self.wallet
    }

    /// The configured home chain, if any.
    #[must_use]
    pub fn home_chain_id(&self) -> Option<u64> {
        self.home_chain_id
    }
}

impl fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.snapshot();
        f.debug_struct("PolicyEngine")
            .field("profile", &state.profile.name)
            .field("frozen", &state.frozen)
            .field("allowlist", &state.allowlist.len())
            .field("wallet", &self.wallet)
            .field("home_chain_id", &self.home_chain_id)
            .field("has_quoter", &self.quoter.is_some())
            .field("quote_timeout", &self.quote_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::MockQuoteSource;
    use chrono::{TimeZone, Utc};
    use warden_test::prelude::*;
    use warden_test::calldata::{CMD_SWEEP, CMD_V3_SWAP_EXACT_IN, CMD_WRAP_ETH};

    const FEE: u32 = 500;

    fn tracker() -> Arc<SpendingTracker> {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        Arc::new(SpendingTracker::with_clock(Arc::new(clock)))
    }

    fn engine() -> PolicyEngine {
        PolicyEngine::new(SecurityProfile::balanced())
            .with_spending_tracker(tracker())
            .with_allowlist([RECIPIENT])
            .with_wallet(WALLET)
    }

    fn engine_with_quote(quote: u64) -> (Arc<MockQuoteSource>, PolicyEngine) {
        let quoter = Arc::new(MockQuoteSource::returning(quote));
        let engine = engine().with_quote_source(quoter.clone());
        (quoter, engine)
    }

    fn send(target: Address, value: u64) -> Intent {
        Intent::new(BASE_CHAIN_ID, WALLET, target, value)
    }

    fn call(target: Address, value: u64, calldata: Vec<u8>) -> Intent {
        send(target, value).with_calldata(calldata)
    }

    fn usdc_swap(recipient: &Address, amount_in: u64, min: u64) -> Intent {
        call(
            ROUTER,
            0,
            encode_token_swap(recipient, &USDC_BASE, &WETH_BASE, FEE, amount_in, min),
        )
    }

    fn reason(decision: &Decision) -> &str {
        decision.reason().unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Gates ahead of decoding
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_frozen_denies_everything() {
        let engine = engine().with_frozen(true);
        for intent in [
            send(RECIPIENT, 0),
            call(USDC_BASE, 0, encode_transfer(&RECIPIENT, ONE_USDC)),
            call(Address::ZERO, 0, encode_approve(&STRANGER, 1)),
        ] {
            let decision = engine.evaluate(&intent).await;
            assert!(decision.is_denied());
            assert!(reason(&decision).contains("frozen"));
        }

        engine.unfreeze();
        assert!(engine.evaluate(&send(RECIPIENT, CENTI_ETH)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_blocked_selector_requires_approval() {
        let engine = engine();
        let decision = engine
            .evaluate(&call(Address::ZERO, 0, encode_approve(&RECIPIENT, 0)))
            .await;
        assert!(decision.requires_approval());
        assert!(reason(&decision).contains("approve(address,uint256)"));
    }

    #[tokio::test]
    async fn test_unknown_calldata() {
        let decision = engine()
            .evaluate(&call(UNKNOWN_CONTRACT, 0, vec![0xde, 0xad, 0xbe, 0xef]))
            .await;
        assert!(decision.requires_approval());
        assert!(reason(&decision).starts_with("Unknown calldata:"));
        assert!(reason(&decision).contains("0xdeadbeef"));
    }

    #[tokio::test]
    async fn test_unknown_token_transfer() {
        let decision = engine()
            .evaluate(&call(UNKNOWN_TOKEN, 0, encode_transfer(&RECIPIENT, 1)))
            .await;
        assert!(decision.requires_approval());
        assert!(reason(&decision).starts_with("Unknown token transfer requires approval: "));
        assert!(
            reason(&decision).contains("unregistered token"),
            "{decision}"
        );
    }

    // -----------------------------------------------------------------------
    // Transfers
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_native_transfer_to_allowlisted() {
        assert!(engine().evaluate(&send(RECIPIENT, CENTI_ETH)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_native_transfer_to_stranger() {
        let decision = engine().evaluate(&send(STRANGER, CENTI_ETH)).await;
        assert!(reason(&decision).contains("non-allowlisted"));
    }

    #[tokio::test]
    async fn test_zero_value_transfer_allowed_anywhere() {
        assert!(engine().evaluate(&send(STRANGER, 0)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_native_over_per_tx_cap() {
        let decision = engine()
            .evaluate(&send(RECIPIENT, CENTI_ETH.saturating_mul(6)))
            .await;
        assert_eq!(
            decision,
            Decision::RequireApproval(
                "Spending limit: ETH amount 0.0600 exceeds per-tx cap 0.0500".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_stablecoin_transfer_uses_decoded_recipient() {
        let engine = engine();
        let to_recipient = call(USDC_BASE, 0, encode_transfer(&RECIPIENT, ONE_USDC.saturating_mul(50)));
        assert!(engine.evaluate(&to_recipient).await.is_allowed());

        let to_stranger = call(USDC_BASE, 0, encode_transfer(&STRANGER, ONE_USDC.saturating_mul(50)));
        assert!(reason(&engine.evaluate(&to_stranger).await).contains("non-allowlisted"));
    }

    #[tokio::test]
    async fn test_stablecoin_over_cap() {
        let decision = engine()
            .evaluate(&call(
                USDC_BASE,
                0,
                encode_transfer(&RECIPIENT, ONE_USDC.saturating_mul(150)),
            ))
            .await;
        assert!(reason(&decision).starts_with("Spending limit: Stablecoin amount 150.00"));
    }

    #[tokio::test]
    async fn test_allowlist_edits() {
        let engine = engine();
        assert!(engine.add_to_allowlist(STRANGER));
        assert!(!engine.add_to_allowlist(STRANGER));
        assert!(engine.evaluate(&send(STRANGER, CENTI_ETH)).await.is_allowed());

        assert!(engine.remove_from_allowlist(&STRANGER));
        assert!(!engine.is_allowlisted(&STRANGER));
        assert!(engine.evaluate(&send(STRANGER, CENTI_ETH)).await.requires_approval());
        assert_eq!(engine.allowlist(), vec![RECIPIENT]);
    }

    // -----------------------------------------------------------------------
    // Protocol calls
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_weth_deposit_checks_spend_only() {
        let engine = engine();
        let deposit = call(WETH_BASE, CENTI_ETH, vec![0xd0, 0xe3, 0x0d, 0xb0]);
        assert!(engine.evaluate(&deposit).await.is_allowed());

        let big = call(WETH_BASE, CENTI_ETH.saturating_mul(10), vec![0xd0, 0xe3, 0x0d, 0xb0]);
        assert!(reason(&engine.evaluate(&big).await).starts_with("Spending limit:"));
    }

    #[tokio::test]
    async fn test_registry_fixed_across_profile_update() {
        let engine = engine();
        engine.update_profile(SecurityProfile::autonomous());
        assert_eq!(engine.profile_name(), "autonomous");
        assert_eq!(engine.max_slippage_bps(), 200);

        // Aave is only registered for engines built on the autonomous profile.
        let supply = call(
            crate::registry::AAVE_POOL_BASE,
            0,
            vec![0x61, 0x7b, 0xa0, 0x37],
        );
        assert!(!engine.decode(&supply).is_known);
    }

    // -----------------------------------------------------------------------
    // Swaps
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_token_swap_within_slippage() {
        let (quoter, engine) = engine_with_quote(1_000_000);
        let decision = engine
            .evaluate(&usdc_swap(&MSG_SENDER, ONE_USDC.saturating_mul(50), 995_000))
            .await;
        assert!(decision.is_allowed(), "{decision}");

        let calls = quoter.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].token_in, USDC_BASE);
        assert_eq!(calls[0].token_out, WETH_BASE);
        assert_eq!(calls[0].amount_in, ONE_USDC.saturating_mul(50));
        assert_eq!(calls[0].fee, FEE);
    }

    #[tokio::test]
    async fn test_swap_to_wallet_is_fine() {
        let (_, engine) = engine_with_quote(1_000_000);
        let decision = engine
            .evaluate(&usdc_swap(&WALLET, ONE_USDC, 999_000))
            .await;
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn test_swap_recipient_ignores_intent_wallet() {
        let (quoter, engine) = engine_with_quote(1_000_000);
        let spoofed = Intent::new(BASE_CHAIN_ID, STRANGER, ROUTER, 0).with_calldata(
            encode_token_swap(&STRANGER, &USDC_BASE, &WETH_BASE, FEE, ONE_USDC, 999_000),
        );
        let decision = engine.evaluate(&spoofed).await;
        assert!(decision.requires_approval());
        assert!(reason(&decision).contains("possible output diversion"));
        assert_eq!(quoter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_configured_wallet_accepts_only_msg_sender() {
        let quoter = Arc::new(MockQuoteSource::returning(1_000_000));
        let engine = PolicyEngine::new(SecurityProfile::balanced())
            .with_spending_tracker(tracker())
            .with_quote_source(quoter);
        assert_eq!(engine.wallet(), None);

        let to_wallet = engine
            .evaluate(&usdc_swap(&WALLET, ONE_USDC, 999_000))
            .await;
        assert!(reason(&to_wallet).contains("possible output diversion"));

        let to_sender = engine
            .evaluate(&usdc_swap(&MSG_SENDER, ONE_USDC, 999_000))
            .await;
        assert!(to_sender.is_allowed(), "{to_sender}");
    }

    #[tokio::test]
    async fn test_quote_uses_home_chain() {
        let (quoter, engine) = engine_with_quote(1_000_000);
        let engine = engine.with_home_chain_id(MAINNET_CHAIN_ID);
        assert_eq!(engine.home_chain_id(), Some(MAINNET_CHAIN_ID));

        let decision = engine
            .evaluate(&usdc_swap(&MSG_SENDER, ONE_USDC, 999_000))
            .await;
        assert!(decision.is_allowed(), "{decision}");
        assert_eq!(quoter.calls()[0].chain_id, MAINNET_CHAIN_ID);
    }

    #[tokio::test]
    async fn test_swap_slippage_exceeded() {
        let (_, engine) = engine_with_quote(1_000_000);
        let decision = engine
            .evaluate(&usdc_swap(&MSG_SENDER, ONE_USDC, 900_000))
            .await;
        assert_eq!(
            decision,
            Decision::RequireApproval("Slippage 10.0% exceeds limit 1.0%".to_string())
        );
    }

    #[tokio::test]
    async fn test_swap_min_above_quote_is_safe() {
        let (_, engine) = engine_with_quote(1_000_000);
        assert!(
            engine
                .evaluate(&usdc_swap(&MSG_SENDER, ONE_USDC, 2_000_000))
                .await
                .is_allowed()
        );
    }

    #[tokio::test]
    async fn test_swap_output_diversion() {
        let (quoter, engine) = engine_with_quote(1_000_000);
        let decision = engine
            .evaluate(&usdc_swap(&STRANGER, ONE_USDC, 999_000))
            .await;
        assert!(reason(&decision).contains("possible output diversion"));
        assert_eq!(quoter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_swap_disallowed_commands() {
        let (_, engine) = engine_with_quote(1_000_000);
        let path = encode_path(&[USDC_BASE, WETH_BASE], &[FEE]);
        let calldata = encode_execute(
            &[CMD_V3_SWAP_EXACT_IN, CMD_SWEEP],
            &[
                encode_v3_swap_exact_in(&MSG_SENDER, ONE_USDC, 999_000, &path, true),
                encode_wrap_eth(&STRANGER, 0),
            ],
            u64::MAX,
        );
        let decision = engine.evaluate(&call(ROUTER, 0, calldata)).await;
        assert!(reason(&decision).contains("disallowed commands [0x04]"));
    }

    #[tokio::test]
    async fn test_swap_payer_inconsistency() {
        let (_, engine) = engine_with_quote(1_000_000);
        let path = encode_path(&[USDC_BASE, WETH_BASE], &[FEE]);

        let token_swap_router_pays = encode_execute(
            &[CMD_V3_SWAP_EXACT_IN],
            &[encode_v3_swap_exact_in(&MSG_SENDER, ONE_USDC, 999_000, &path, false)],
            u64::MAX,
        );
        let decision = engine.evaluate(&call(ROUTER, 0, token_swap_router_pays)).await;
        assert!(reason(&decision).contains("payerIsUser=false"));

        let eth_swap_user_pays = encode_execute(
            &[CMD_WRAP_ETH, CMD_V3_SWAP_EXACT_IN],
            &[
                encode_wrap_eth(&MSG_SENDER, CENTI_ETH),
                encode_v3_swap_exact_in(&MSG_SENDER, CENTI_ETH, 999_000, &path, true),
            ],
            u64::MAX,
        );
        let decision = engine
            .evaluate(&call(ROUTER, CENTI_ETH, eth_swap_user_pays))
            .await;
        assert!(reason(&decision).contains("payerIsUser=true"));
    }

    #[tokio::test]
    async fn test_eth_swap_counts_native_value() {
        let (_, engine) = engine_with_quote(1_000_000);
        let small = call(
            ROUTER,
            CENTI_ETH,
            encode_eth_swap(&MSG_SENDER, &WETH_BASE, &USDC_BASE, FEE, CENTI_ETH, 995_000),
        );
        assert!(engine.evaluate(&small).await.is_allowed());

        let large_value = CENTI_ETH.saturating_mul(10);
        let large = call(
            ROUTER,
            large_value,
            encode_eth_swap(&MSG_SENDER, &WETH_BASE, &USDC_BASE, FEE, large_value, 995_000),
        );
        assert!(reason(&engine.evaluate(&large).await).starts_with("Spending limit: ETH amount"));
    }

    #[tokio::test]
    async fn test_stablecoin_swap_counts_against_stablecoin_cap() {
        let (_, engine) = engine_with_quote(1_000_000);
        let decision = engine
            .evaluate(&usdc_swap(&MSG_SENDER, ONE_USDC.saturating_mul(150), 999_000))
            .await;
        assert!(reason(&decision).starts_with("Spending limit: Stablecoin amount"));
    }

    #[tokio::test]
    async fn test_multi_hop_requires_approval() {
        let (quoter, engine) = engine_with_quote(1_000_000);
        let path = encode_path(&[USDC_BASE, WETH_BASE, UNKNOWN_TOKEN], &[FEE, 3000]);
        let calldata = encode_execute(
            &[CMD_V3_SWAP_EXACT_IN],
            &[encode_v3_swap_exact_in(&MSG_SENDER, ONE_USDC, 1, &path, true)],
            u64::MAX,
        );
        let decision = engine.evaluate(&call(ROUTER, 0, calldata)).await;
        assert!(reason(&decision).contains("Multi-hop"));
        assert_eq!(quoter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_quoter_fails_closed() {
        let decision = engine()
            .evaluate(&usdc_swap(&MSG_SENDER, ONE_USDC, 999_000))
            .await;
        assert!(decision.requires_approval());
        assert!(reason(&decision).contains("no quoter available"));
    }

    #[tokio::test]
    async fn test_quote_error_fails_closed() {
        let engine = engine().with_quote_source(Arc::new(MockQuoteSource::failing(
            QuoteError::Rpc("connection refused".into()),
        )));
        let decision = engine
            .evaluate(&usdc_swap(&MSG_SENDER, ONE_USDC, 999_000))
            .await;
        assert!(decision.requires_approval());
        assert!(reason(&decision).contains("connection refused"));
    }

    #[tokio::test]
    async fn test_zero_quote_fails_closed() {
        let (_, engine) = engine_with_quote(0);
        let decision = engine
            .evaluate(&usdc_swap(&MSG_SENDER, ONE_USDC, 0))
            .await;
        assert!(decision.requires_approval());
        assert!(reason(&decision).contains("zero output"));
    }

    #[tokio::test]
    async fn test_quote_timeout_fails_closed() {
        let quoter =
            Arc::new(MockQuoteSource::returning(1_000_000).with_delay(Duration::from_secs(5)));
        let engine = engine()
            .with_quote_source(quoter)
            .with_quote_timeout(Duration::from_millis(20));
        let decision = engine
            .evaluate(&usdc_swap(&MSG_SENDER, ONE_USDC, 999_000))
            .await;
        assert!(decision.requires_approval());
        assert!(reason(&decision).contains("timed out after 20ms"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_freeze_during_quote_denies() {
        let quoter =
            Arc::new(MockQuoteSource::returning(1_000_000).with_delay(Duration::from_millis(200)));
        let engine = Arc::new(engine().with_quote_source(quoter));

        let pending = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .evaluate(&usdc_swap(&MSG_SENDER, ONE_USDC, 999_000))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.freeze();

        let decision = pending.await.unwrap();
        assert!(decision.is_denied());
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_record_and_budgets() {
        let engine = engine();
        engine.record_transaction(CENTI_ETH, ONE_USDC);
        let budgets = engine.remaining_budgets();
        assert_eq!(budgets.native, 240_000_000_000_000_000);
        assert_eq!(budgets.stablecoin, ONE_USDC.saturating_mul(499));
        assert_eq!(engine.spending_snapshot().tx_last_hour, 1);

        // Cooldown now applies to the next transfer.
        let decision = engine.evaluate(&send(RECIPIENT, CENTI_ETH)).await;
        assert!(reason(&decision).contains("Cooldown active"));
    }

    #[test]
    fn test_debug_output() {
        let debug = format!("{:?}", engine());
        assert!(debug.contains("balanced"));
        assert!(debug.contains("has_quoter: false"));
    }
}

// File: terrapin/src/transaction_builder.rs
//
// Transaction Builder
//
// Records the steps of a transaction a test intends to send and simulates
// its submission: the wallet is asked to wait for the pending transaction,
// then a random digest stands in for the real one. The digest is not derived
// from the steps.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, log_enabled, Level};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{Display, EnumString};
use tortoise_common::config::DEFAULT_GAS_BUDGET;

use crate::error::Result;
use crate::orchestrator::{Clock, DeterministicTestEnv, SystemClock, TestRng};
use crate::wallet::WalletHelpers;

/// Length in bytes of a generated digest
pub const DIGEST_BYTES: usize = 32;

/// Options of a transaction builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionBuilderOptions {
    /// Bound given to the wallet while waiting for the transaction
    #[serde(with = "crate::config::millis")]
    pub timeout: Duration,
    /// Gas budget in MIST
    pub gas_budget: u64,
    /// Delay per confirmation in `execute_and_wait`
    #[serde(with = "crate::config::millis")]
    pub confirmation_delay: Duration,
}

impl Default for TransactionBuilderOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            gas_budget: DEFAULT_GAS_BUDGET,
            confirmation_delay: Duration::from_secs(1),
        }
    }
}

/// Kind of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum StepKind {
    /// Coin transfer
    Transfer,
    /// Coin split
    Split,
    /// Coin merge
    Merge,
    /// Move function call
    MoveCall,
    /// User supplied step
    Custom,
}

/// Step supplied as a function over the transaction under construction
#[derive(Clone)]
pub struct CustomStep(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl CustomStep {
    /// Wrap a step function
    pub fn new<F>(step: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(step))
    }

    /// Run the step function
    pub fn apply(&self, tx: Value) -> Value {
        (self.0)(tx)
    }
}

impl fmt::Debug for CustomStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomStep(..)")
    }
}

// Same function, same step
impl PartialEq for CustomStep {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// One recorded step
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionStep {
    /// Send `amount` MIST to `recipient`
    Transfer {
        /// Recipient address
        recipient: String,
        /// Amount in MIST
        amount: u64,
    },
    /// Split `coin_id` into coins of `amounts`
    Split {
        /// Coin object to split
        coin_id: String,
        /// Amount of each new coin
        amounts: Vec<u64>,
    },
    /// Merge `source_coin_ids` into `target_coin_id`
    Merge {
        /// Coin receiving the balance
        target_coin_id: String,
        /// Coins merged into the target
        source_coin_ids: Vec<String>,
    },
    /// Call `target` (`package::module::function`)
    MoveCall {
        /// Function to call
        target: String,
        /// Type arguments
        type_args: Vec<String>,
        /// Call arguments
        args: Vec<Value>,
    },
    /// User supplied step
    Custom(CustomStep),
}

impl TransactionStep {
    /// Kind of the step
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Transfer { .. } => StepKind::Transfer,
            Self::Split { .. } => StepKind::Split,
            Self::Merge { .. } => StepKind::Merge,
            Self::MoveCall { .. } => StepKind::MoveCall,
            Self::Custom(_) => StepKind::Custom,
        }
    }

    /// Parameters of the step as JSON, for diagnostics
    pub fn params(&self) -> Value {
        match self {
            Self::Transfer { recipient, amount } => json!({
                "recipient": recipient,
                "amount": amount,
            }),
            Self::Split { coin_id, amounts } => json!({
                "coinId": coin_id,
                "amounts": amounts,
            }),
            Self::Merge {
                target_coin_id,
                source_coin_ids,
            } => json!({
                "targetCoinId": target_coin_id,
                "sourceCoinIds": source_coin_ids,
            }),
            Self::MoveCall {
                target,
                type_args,
                args,
            } => json!({
                "target": target,
                "typeArgs": type_args,
                "args": args,
            }),
            Self::Custom(_) => json!({ "stepFn": "<function>" }),
        }
    }
}

/// Fluent recorder of transaction steps
///
/// ```rust,ignore
/// let mut builder = create_transaction_builder(wallet, TransactionBuilderOptions::default());
/// let digest = builder
///     .transfer("0x123", 100_000_000)
///     .split("0xcoin", vec![50_000_000, 50_000_000])
///     .execute()
///     .await?;
/// ```
pub struct TransactionBuilder {
    steps: Vec<TransactionStep>,
    options: TransactionBuilderOptions,
    wallet: Arc<dyn WalletHelpers>,
    clock: Arc<dyn Clock>,
    // Drawn from the environment on first use unless `with_env` supplies one
    rng: Option<Arc<TestRng>>,
    last_digest: Option<String>,
}

impl TransactionBuilder {
    /// Builder waiting on `wallet` on the system clock
    ///
    /// Without `with_env`, the digest RNG is seeded from `TERRAPIN_TEST_SEED`
    /// or randomly on the first `execute`.
    pub fn new(wallet: Arc<dyn WalletHelpers>, options: TransactionBuilderOptions) -> Self {
        Self {
            steps: Vec::new(),
            options,
            wallet,
            clock: Arc::new(SystemClock),
            rng: None,
            last_digest: None,
        }
    }

    /// Share the clock and RNG of `env`
    pub fn with_env(mut self, env: &DeterministicTestEnv) -> Self {
        self.clock = env.clock.clone();
        self.rng = Some(env.rng.clone());
        self
    }

    /// Builder options
    pub fn options(&self) -> &TransactionBuilderOptions {
        &self.options
    }

    /// Send `amount` MIST to `recipient`
    pub fn transfer(&mut self, recipient: impl Into<String>, amount: u64) -> &mut Self {
        self.steps.push(TransactionStep::Transfer {
            recipient: recipient.into(),
            amount,
        });
        self
    }

    /// Split `coin_id` into coins of `amounts`
    pub fn split(&mut self, coin_id: impl Into<String>, amounts: Vec<u64>) -> &mut Self {
        self.steps.push(TransactionStep::Split {
            coin_id: coin_id.into(),
            amounts,
        });
        self
    }

    /// Merge `source_coin_ids` into `target_coin_id`
    pub fn merge(
        &mut self,
        target_coin_id: impl Into<String>,
        source_coin_ids: Vec<String>,
    ) -> &mut Self {
        self.steps.push(TransactionStep::Merge {
            target_coin_id: target_coin_id.into(),
            source_coin_ids,
        });
        self
    }

    /// Call a Move function
    pub fn move_call(
        &mut self,
        target: impl Into<String>,
        type_args: Vec<String>,
        args: Vec<Value>,
    ) -> &mut Self {
        self.steps.push(TransactionStep::MoveCall {
            target: target.into(),
            type_args,
            args,
        });
        self
    }

    /// Append a user supplied step
    pub fn custom<F>(&mut self, step: F) -> &mut Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.steps.push(TransactionStep::Custom(CustomStep::new(step)));
        self
    }

    /// Copy of the recorded steps, in order
    pub fn get_steps(&self) -> Vec<TransactionStep> {
        self.steps.clone()
    }

    /// Simulate the submission of the recorded steps
    ///
    /// Steps are kept, so executing twice submits them twice.
    ///
    /// # Errors
    ///
    /// Whatever the wallet reports while waiting, typically `Timeout`. The
    /// previous digest is kept in that case.
    pub async fn execute(&mut self) -> Result<String> {
        info!(
            "Executing transaction with {} steps (gas budget: {})",
            self.steps.len(),
            self.options.gas_budget
        );

        if log_enabled!(Level::Debug) {
            for (index, step) in self.steps.iter().enumerate() {
                debug!("Step {}: {} {}", index + 1, step.kind(), step.params());
            }
        }

        self.wallet.wait_for_transaction(self.options.timeout).await?;

        let rng = self
            .rng
            .get_or_insert_with(|| Arc::new(TestRng::new_from_env_or_random()));
        let digest = format!("0x{}", rng.gen_hex(DIGEST_BYTES));
        info!("Transaction completed: {}", digest);

        self.last_digest = Some(digest.clone());
        Ok(digest)
    }

    /// `execute`, then wait `confirmations` times the confirmation delay
    pub async fn execute_and_wait(&mut self, confirmations: u32) -> Result<String> {
        let digest = self.execute().await?;

        info!("Waiting for {} confirmations...", confirmations);
        let delay = self.options.confirmation_delay.saturating_mul(confirmations);
        self.clock.sleep(delay).await;

        Ok(digest)
    }

    /// Forget the steps and the last digest
    pub fn reset(&mut self) -> &mut Self {
        self.steps.clear();
        self.last_digest = None;
        self
    }

    /// Digest of the last successful `execute` since the last `reset`
    pub fn get_digest(&self) -> Option<&str> {
        self.last_digest.as_deref()
    }
}

/// Create a transaction builder waiting on `wallet`
pub fn create_transaction_builder(
    wallet: Arc<dyn WalletHelpers>,
    options: TransactionBuilderOptions,
) -> TransactionBuilder {
    TransactionBuilder::new(wallet, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::SimulatedWallet;

    async fn connected_builder(seed: u64) -> TransactionBuilder {
        let wallet = SimulatedWallet::new("0x123");
        wallet.connect().await.unwrap();
        create_transaction_builder(Arc::new(wallet), TransactionBuilderOptions::default())
            .with_env(&DeterministicTestEnv::with_seed(seed))
    }

    #[test]
    fn test_step_kinds() {
        assert_eq!(StepKind::MoveCall.to_string(), "moveCall");
        assert_eq!("split".parse::<StepKind>().unwrap(), StepKind::Split);

        let step = TransactionStep::Merge {
            target_coin_id: "0x1".into(),
            source_coin_ids: vec!["0x2".into()],
        };
        assert_eq!(step.kind(), StepKind::Merge);
        assert_eq!(step.params()["sourceCoinIds"], json!(["0x2"]));
    }

    #[test]
    fn test_custom_step_identity() {
        let step = CustomStep::new(|tx| json!({ "wrapped": tx }));
        assert_eq!(step.apply(json!(1)), json!({ "wrapped": 1 }));
        assert_eq!(step, step.clone());
        assert_ne!(step, CustomStep::new(|tx| tx));
        assert_eq!(format!("{:?}", step), "CustomStep(..)");
    }

    #[tokio::test]
    async fn test_steps_recorded_in_order() {
        let mut builder = connected_builder(1).await;
        builder
            .transfer("0xabc", 100)
            .split("0xcoin", vec![50, 50])
            .merge("0xcoin", vec!["0xa".into(), "0xb".into()])
            .move_call("0x2::coin::join", vec!["0x2::sui::SUI".into()], vec![json!("0xa")])
            .custom(|tx| tx);

        let kinds: Vec<StepKind> = builder.get_steps().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Transfer,
                StepKind::Split,
                StepKind::Merge,
                StepKind::MoveCall,
                StepKind::Custom,
            ]
        );

        // Snapshot is a copy
        let mut steps = builder.get_steps();
        steps.clear();
        assert_eq!(builder.get_steps().len(), 5);
    }

    #[tokio::test]
    async fn test_execute_produces_digest_and_keeps_steps() {
        let mut builder = connected_builder(7).await;
        assert!(builder.get_digest().is_none());

        let digest = builder.transfer("0xabc", 100).execute().await.unwrap();
        assert!(digest.starts_with("0x"));
        assert_eq!(digest.len(), 2 + DIGEST_BYTES * 2);
        assert!(digest[2..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(builder.get_digest(), Some(digest.as_str()));
        assert_eq!(builder.get_steps().len(), 1);

        let second = builder.execute().await.unwrap();
        assert_ne!(digest, second);

        builder.reset();
        assert!(builder.get_steps().is_empty());
        assert!(builder.get_digest().is_none());
    }

    #[tokio::test]
    async fn test_same_seed_same_digest() {
        let mut a = connected_builder(42).await;
        let mut b = connected_builder(42).await;
        assert_eq!(a.execute().await.unwrap(), b.execute().await.unwrap());
    }

    #[tokio::test]
    async fn test_wallet_failure_keeps_previous_digest() {
        let wallet = SimulatedWallet::new("0x123");
        let mut builder = create_transaction_builder(
            Arc::new(wallet.clone()),
            TransactionBuilderOptions::default(),
        )
        .with_env(&DeterministicTestEnv::with_seed(3));

        wallet.connect().await.unwrap();
        let digest = builder.execute().await.unwrap();

        wallet.disconnect().await.unwrap();
        assert!(builder.execute().await.is_err());
        assert_eq!(builder.get_digest(), Some(digest.as_str()));
    }

    #[tokio::test]
    async fn test_rng_is_taken_from_env_not_built_eagerly() {
        let wallet = SimulatedWallet::new("0x123");
        wallet.connect().await.unwrap();

        let builder = TransactionBuilder::new(Arc::new(wallet.clone()), Default::default());
        assert!(builder.rng.is_none());

        let env = DeterministicTestEnv::with_seed(0xabc);
        let mut builder = builder.with_env(&env);
        assert_eq!(builder.rng.as_ref().map(|rng| rng.seed()), Some(0xabc));

        let mut fresh = TransactionBuilder::new(Arc::new(wallet), Default::default());
        fresh.execute().await.unwrap();
        assert!(fresh.rng.is_some());

        let expected = format!("0x{}", TestRng::with_seed(0xabc).gen_hex(DIGEST_BYTES));
        assert_eq!(builder.execute().await.unwrap(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_and_wait_sleeps_per_confirmation() {
        let mut builder = connected_builder(9).await;
        let start = tokio::time::Instant::now();

        builder.transfer("0xabc", 1).execute_and_wait(3).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}

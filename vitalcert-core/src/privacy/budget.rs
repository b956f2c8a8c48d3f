//! Differential-privacy epsilon budget ledger.
//!
//! The ledger is the only shared mutable state in the crate. Every debit
//! runs inside a single critical section, so concurrent callers can
//! never overspend and a retried query id is never charged twice.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::{Result, VitalCertError};

/// Slack allowed when comparing spent epsilon against the total.
pub const EPSILON_TOLERANCE: f64 = 1e-12;

/// Lifecycle state of a budget ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerState {
    /// Nothing spent yet
    Init,
    /// Budget partially spent
    Active,
    /// No further debit will succeed until reset
    Exhausted,
}

/// Receipt for a successful (or replayed) debit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebitReceipt {
    pub query_id: String,
    pub epsilon_cost: f64,
    /// Total spent right after this debit
    pub epsilon_spent: f64,
    /// Budget left right after this debit
    pub remaining_budget: f64,
    /// Set when the query id was already charged and nothing was debited
    #[serde(default)]
    pub replayed: bool,
}

/// Point-in-time view of a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub total_budget: f64,
    pub epsilon_spent: f64,
    pub remaining: f64,
    pub query_count: usize,
    pub state: LedgerState,
}

/// Epsilon budget accounting.
///
/// Implementations must make `check_and_debit` atomic: the check and the
/// debit happen under one lock, and a query id already recorded returns
/// its original receipt without charging again.
pub trait BudgetLedger: Send + Sync + fmt::Debug {
    /// Charges `epsilon_cost` for `query_id` if the budget allows it.
    ///
    /// # Errors
    /// - `Configuration` for a non-positive or non-finite cost
    /// - `BudgetExceeded` when the ledger is exhausted or the cost does not
    ///   fit in the remaining budget
    fn check_and_debit(&self, query_id: &str, epsilon_cost: f64) -> Result<DebitReceipt>;

    /// Returns the ledger to its initial state.
    fn reset(&self);

    /// Current ledger totals.
    fn snapshot(&self) -> LedgerSnapshot;
}

#[derive(Debug)]
struct LedgerInner {
    epsilon_spent: f64,
    receipts: HashMap<String, DebitReceipt>,
    state: LedgerState,
}

impl LedgerInner {
    fn new() -> Self {
        Self {
            epsilon_spent: 0.0,
            receipts: HashMap::new(),
            state: LedgerState::Init,
        }
    }
}

/// Mutex-guarded in-process ledger.
#[derive(Debug)]
pub struct InMemoryBudgetLedger {
    total_budget: f64,
    inner: Mutex<LedgerInner>,
}

impl InMemoryBudgetLedger {
    /// Creates a ledger with the given total epsilon.
    ///
    /// # Errors
    /// Returns a configuration error unless `total_budget` is positive and
    /// finite.
    pub fn new(total_budget: f64) -> Result<Self> {
        if !(total_budget.is_finite() && total_budget > 0.0) {
            return Err(VitalCertError::configuration(format!(
                "total epsilon budget must be positive and finite, got {}",
                total_budget
            )));
        }
        Ok(Self {
            total_budget,
            inner: Mutex::new(LedgerInner::new()),
        })
    }

    /// Total epsilon this ledger can spend.
    pub fn total_budget(&self) -> f64 {
        self.total_budget
    }

    // A panic while holding the lock cannot leave the totals half-written:
    // every mutation is a single assignment after all checks pass.
    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remaining(&self, spent: f64) -> f64 {
        (self.total_budget - spent).max(0.0)
    }
}

impl BudgetLedger for InMemoryBudgetLedger {
    fn check_and_debit(&self, query_id: &str, epsilon_cost: f64) -> Result<DebitReceipt> {
        if !(epsilon_cost.is_finite() && epsilon_cost > 0.0) {
            return Err(VitalCertError::configuration(format!(
                "epsilon cost for query '{}' must be positive and finite, got {}",
                query_id, epsilon_cost
            )));
        }

        let mut inner = self.lock();

        if let Some(receipt) = inner.receipts.get(query_id) {
            tracing::debug!("Query '{}' already charged, returning receipt", query_id);
            return Ok(DebitReceipt {
                replayed: true,
                ..receipt.clone()
            });
        }

        let remaining = self.remaining(inner.epsilon_spent);
        if inner.state == LedgerState::Exhausted
            || inner.epsilon_spent + epsilon_cost > self.total_budget + EPSILON_TOLERANCE
        {
            inner.state = LedgerState::Exhausted;
            tracing::warn!(
                "Privacy budget exhausted: query '{}' requested epsilon={:.4}, remaining={:.4}",
                query_id,
                epsilon_cost,
                remaining
            );
            return Err(VitalCertError::budget_exceeded(
                query_id,
                epsilon_cost,
                remaining,
            ));
        }

        let epsilon_spent = inner.epsilon_spent + epsilon_cost;
        let remaining_budget = self.remaining(epsilon_spent);
        let receipt = DebitReceipt {
            query_id: query_id.to_string(),
            epsilon_cost,
            epsilon_spent,
            remaining_budget,
            replayed: false,
        };

        inner.epsilon_spent = epsilon_spent;
        inner.state = if remaining_budget <= EPSILON_TOLERANCE {
            LedgerState::Exhausted
        } else {
            LedgerState::Active
        };
        inner
            .receipts
            .insert(query_id.to_string(), receipt.clone());

        tracing::debug!(
            "Charged epsilon={:.4} for query '{}', remaining={:.4}",
            epsilon_cost,
            query_id,
            remaining_budget
        );
        Ok(receipt)
    }

    fn reset(&self) {
        let mut inner = self.lock();
        *inner = LedgerInner::new();
        tracing::info!("Privacy budget ledger reset");
    }

    fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.lock();
        LedgerSnapshot {
            total_budget: self.total_budget,
            epsilon_spent: inner.epsilon_spent,
            remaining: self.remaining(inner.epsilon_spent),
            query_count: inner.receipts.len(),
            state: inner.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_debits_then_exhausted() {
        let ledger = InMemoryBudgetLedger::new(1.0).unwrap();
        assert_eq!(ledger.snapshot().state, LedgerState::Init);

        for i in 0..10 {
            let receipt = ledger.check_and_debit(&format!("q-{}", i), 0.1).unwrap();
            assert!(receipt.remaining_budget >= 0.0);
        }

        let err = ledger.check_and_debit("q-10", 0.1).unwrap_err();
        assert!(err.is_budget_exhaustion());

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.state, LedgerState::Exhausted);
        assert_eq!(snapshot.query_count, 10);
        assert!(snapshot.epsilon_spent <= 1.0 + EPSILON_TOLERANCE);
    }

    #[test]
    fn test_retry_is_not_double_charged() {
        let ledger = InMemoryBudgetLedger::new(1.0).unwrap();
        let first = ledger.check_and_debit("export-1", 0.3).unwrap();
        let second = ledger.check_and_debit("export-1", 0.3).unwrap();

        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.epsilon_spent, second.epsilon_spent);
        assert_eq!(first.remaining_budget, second.remaining_budget);
        let snapshot = ledger.snapshot();
        assert!((snapshot.epsilon_spent - 0.3).abs() < 1e-12);
        assert_eq!(snapshot.query_count, 1);
        assert_eq!(snapshot.state, LedgerState::Active);
    }

    #[test]
    fn test_replay_returns_receipt_even_when_exhausted() {
        let ledger = InMemoryBudgetLedger::new(0.5).unwrap();
        let receipt = ledger.check_and_debit("q-a", 0.5).unwrap();
        assert_eq!(ledger.snapshot().state, LedgerState::Exhausted);

        let replay = ledger.check_and_debit("q-a", 0.5).unwrap();
        assert!(replay.replayed);
        assert_eq!(replay.epsilon_spent, receipt.epsilon_spent);
        assert!(ledger.check_and_debit("q-b", 0.01).is_err());
    }

    #[test]
    fn test_oversized_request_exhausts_ledger() {
        let ledger = InMemoryBudgetLedger::new(1.0).unwrap();
        ledger.check_and_debit("small", 0.2).unwrap();

        match ledger.check_and_debit("large", 0.9) {
            Err(VitalCertError::BudgetExceeded {
                requested,
                remaining,
                ..
            }) => {
                assert_eq!(requested, 0.9);
                assert!((remaining - 0.8).abs() < 1e-12);
            }
            other => panic!("expected BudgetExceeded, got {:?}", other),
        }

        // Exhausted is terminal until reset, even for a request that would fit
        assert!(ledger.check_and_debit("tiny", 0.1).is_err());
    }

    #[test]
    fn test_reset_returns_to_init() {
        let ledger = InMemoryBudgetLedger::new(1.0).unwrap();
        ledger.check_and_debit("q", 1.0).unwrap();
        ledger.reset();

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.state, LedgerState::Init);
        assert_eq!(snapshot.epsilon_spent, 0.0);
        assert_eq!(snapshot.query_count, 0);
        assert!(ledger.check_and_debit("q", 0.4).is_ok());
    }

    #[test]
    fn test_invalid_costs_rejected() {
        let ledger = InMemoryBudgetLedger::new(1.0).unwrap();
        for cost in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ledger.check_and_debit("q", cost),
                Err(VitalCertError::Configuration { .. })
            ));
        }
        assert_eq!(ledger.snapshot().state, LedgerState::Init);
    }

    #[test]
    fn test_invalid_total_budget() {
        assert!(InMemoryBudgetLedger::new(0.0).is_err());
        assert!(InMemoryBudgetLedger::new(f64::NAN).is_err());
    }
}

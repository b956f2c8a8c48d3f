//! Differential-privacy accounting for an assessment's queries.

use std::collections::BTreeSet;

use super::budget::{BudgetLedger, LedgerSnapshot};
use super::models::{DifferentialPrivacyResult, PrivacyLevel, QueryCost};
use crate::Result;

/// Charges every query to the ledger and builds the report block.
///
/// Queries are charged in order; a query id repeated within the batch or
/// already recorded in the ledger is not charged again and adds nothing to
/// the reported epsilon. The first failed
/// debit aborts the batch, leaving earlier debits recorded so that a retry
/// with the same ids charges only what is missing.
///
/// # Errors
/// Propagates `BudgetExceeded` and invalid-cost configuration errors from
/// the ledger.
pub fn charge_queries(
    ledger: &dyn BudgetLedger,
    queries: &[QueryCost],
    delta: f64,
) -> Result<DifferentialPrivacyResult> {
    let mut seen = BTreeSet::new();
    let mut epsilon = 0.0;

    for query in queries {
        if !seen.insert(query.query_id.as_str()) {
            continue;
        }
        let receipt = ledger.check_and_debit(&query.query_id, query.epsilon_cost)?;
        if !receipt.replayed {
            epsilon += receipt.epsilon_cost;
        }
    }

    let snapshot = ledger.snapshot();
    tracing::debug!(
        queries = seen.len(),
        epsilon,
        cumulative = snapshot.epsilon_spent,
        "Differential privacy queries charged"
    );
    Ok(summarize(epsilon, delta, &snapshot))
}

/// Builds the report block from a ledger snapshot.
pub fn summarize(epsilon: f64, delta: f64, snapshot: &LedgerSnapshot) -> DifferentialPrivacyResult {
    let privacy_level = PrivacyLevel::from_epsilon(snapshot.epsilon_spent);
    DifferentialPrivacyResult {
        epsilon,
        delta,
        query_count: snapshot.query_count,
        cumulative_epsilon: snapshot.epsilon_spent,
        privacy_level,
        remaining_budget: snapshot.remaining,
        recommendation: recommendation(privacy_level, snapshot),
    }
}

fn recommendation(level: PrivacyLevel, snapshot: &LedgerSnapshot) -> String {
    if snapshot.total_budget > 0.0 && snapshot.remaining / snapshot.total_budget < 0.1 {
        return format!(
            "Privacy budget nearly exhausted ({:.4} of {:.4} remaining); stop issuing queries until the budget is reset",
            snapshot.remaining, snapshot.total_budget
        );
    }
    match level {
        PrivacyLevel::VeryStrong | PrivacyLevel::Strong => {
            "Cumulative epsilon is within strong privacy guarantees".to_string()
        }
        PrivacyLevel::Moderate => {
            "Cumulative epsilon offers moderate protection; limit further queries".to_string()
        }
        PrivacyLevel::Weak | PrivacyLevel::Minimal => {
            "Cumulative epsilon is high; privacy guarantees are weak".to_string()
        }
    }
}

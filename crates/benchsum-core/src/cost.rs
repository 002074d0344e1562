//! Token cost estimation on top of the [`PriceTable`].
//!
//! Estimation is best effort: a model name that does not resolve costs 0.0.

use serde::{Deserialize, Serialize};

use crate::pricing::PriceTable;

const TOKENS_PER_PRICE_UNIT: f64 = 1_000_000.0;

/// Outcome of a cost estimation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostEstimate {
    /// Price table key the model name resolved to, if any.
    pub price_key: Option<String>,
    pub cost_usd: f64,
}

/// Estimate the cost of a run from its token counts. Missing counts are zero.
pub fn estimate_cost(
    table: &PriceTable,
    model_name: &str,
    input_tokens: Option<f64>,
    output_tokens: Option<f64>,
) -> CostEstimate {
    let Some((key, price)) = table.resolve(model_name) else {
        tracing::debug!(event = "cost.unresolved", model = %model_name);
        return CostEstimate {
            price_key: None,
            cost_usd: 0.0,
        };
    };

    let input_cost = input_tokens.unwrap_or(0.0) * (price.input_per_million / TOKENS_PER_PRICE_UNIT);
    let output_cost =
        output_tokens.unwrap_or(0.0) * (price.output_per_million / TOKENS_PER_PRICE_UNIT);

    CostEstimate {
        price_key: Some(key.to_string()),
        cost_usd: input_cost + output_cost,
    }
}

/// Shorthand for [`estimate_cost`] when only the amount matters.
pub fn compute_cost_usd(
    table: &PriceTable,
    model_name: &str,
    input_tokens: Option<f64>,
    output_tokens: Option<f64>,
) -> f64 {
    estimate_cost(table, model_name, input_tokens, output_tokens).cost_usd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PriceEntry;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn cost_for_known_model() {
        let table = PriceTable::default();
        // gpt-4o-mini: 0.15 in / 0.60 out per million.
        let estimate = estimate_cost(&table, "gpt-4o-mini", Some(1_000_000.0), Some(500_000.0));
        assert_eq!(estimate.price_key.as_deref(), Some("gpt-4o-mini"));
        assert!(approx(estimate.cost_usd, 0.15 + 0.30));
    }

    #[test]
    fn unknown_model_costs_zero() {
        let table = PriceTable::default();
        let estimate = estimate_cost(&table, "mistral-large", Some(10_000.0), Some(10_000.0));
        assert_eq!(estimate.price_key, None);
        assert_eq!(estimate.cost_usd, 0.0);
    }

    #[test]
    fn missing_token_counts_are_zero() {
        let table = PriceTable::empty().with_entry("m", PriceEntry::new(2.0, 4.0));
        assert!(approx(compute_cost_usd(&table, "m", None, Some(1_000.0)), 0.004));
        assert!(approx(compute_cost_usd(&table, "m", Some(1_000.0), None), 0.002));
        assert_eq!(compute_cost_usd(&table, "m", None, None), 0.0);
    }

    #[test]
    fn image_model_output_is_free() {
        let table = PriceTable::default();
        let cost = compute_cost_usd(&table, "gpt-image-1", Some(1_000_000.0), Some(1_000_000.0));
        assert!(approx(cost, 5.0));
    }
}

//! In-memory calculation history keyed by an opaque user id.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::core::{CalculatorInput, CalculatorOutput};

/// A stored subset of one calculation's input and output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCalculation {
    pub id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub current_age: i32,
    pub retirement_age: i32,
    pub current_savings: f64,
    pub monthly_contribution: f64,
    pub expected_annual_return_rate: f64,
    pub current_monthly_expense: f64,
    pub annual_inflation_rate: f64,
    pub post_retirement_nominal_return: f64,
    pub retirement_corpus: f64,
    pub future_monthly_expense: f64,
    pub retirement_duration_years: f64,
}

/// Per-user history in creation order, keeping only the newest `limit`
/// records for each user.
#[derive(Debug)]
pub struct CalculationStore {
    by_user: DashMap<String, VecDeque<SavedCalculation>>,
    limit: usize,
}

impl CalculationStore {
    pub fn new(limit: usize) -> Self {
        Self {
            by_user: DashMap::new(),
            limit,
        }
    }

    pub fn save(
        &self,
        user_id: &str,
        input: &CalculatorInput,
        output: &CalculatorOutput,
    ) -> SavedCalculation {
        let record = SavedCalculation {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            current_age: input.current_age,
            retirement_age: input.retirement_age,
            current_savings: input.current_savings,
            monthly_contribution: input.monthly_contribution,
            expected_annual_return_rate: input.expected_annual_return_rate,
            current_monthly_expense: input.current_monthly_expense,
            annual_inflation_rate: input.annual_inflation_rate,
            post_retirement_nominal_return: input.post_retirement_nominal_return_rate,
            retirement_corpus: output.retirement_corpus,
            future_monthly_expense: output.future_monthly_expense,
            retirement_duration_years: output.retirement_duration_years,
        };

        let mut records = self.by_user.entry(user_id.to_string()).or_default();
        records.push_back(record.clone());
        while records.len() > self.limit {
            records.pop_front();
        }
        debug!(user_id, id = %record.id, retained = records.len(), "saved calculation");
        record
    }

    /// Most recent first.
    pub fn recent(&self, user_id: &str) -> Vec<SavedCalculation> {
        self.by_user
            .get(user_id)
            .map(|records| records.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    #[cfg(test)]
    fn count(&self, user_id: &str) -> usize {
        self.by_user.get(user_id).map(|r| r.len()).unwrap_or(0)
    }
}

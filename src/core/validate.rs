use super::types::{CalculatorInput, ValidationResult};

pub const MIN_HORIZON_MONTHS: i64 = 12;
pub const MONTHLY_RATE_GUARDRAIL: f64 = 0.02;
pub const MAX_EXPECTED_ANNUAL_RETURN: f64 = 0.30;
pub const MAX_ANNUAL_INFLATION: f64 = 0.15;

/// Checks the input against the hard rules and soft guardrails.
///
/// Every rule is evaluated; errors and warnings come back in rule order so
/// callers can surface the full set in one pass.
pub fn validate_inputs(input: &CalculatorInput) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if input.current_age <= 0 {
        errors.push("Current age must be positive".to_string());
    }

    if input.retirement_age <= input.current_age {
        errors.push("Retirement age must be greater than current age".to_string());
    }

    let total_months = horizon_months(input);
    if total_months < MIN_HORIZON_MONTHS {
        errors.push(format!(
            "Investment horizon must be at least {MIN_HORIZON_MONTHS} months"
        ));
    }

    let monthly_rate = input.expected_annual_return_rate / 12.0;
    if monthly_rate >= MONTHLY_RATE_GUARDRAIL {
        warnings.push(
            "Monthly return rate exceeds 2% guardrail - verify annual rate is correct (e.g., 0.12 for 12%)"
                .to_string(),
        );
    }

    // Explicit comparisons so a NaN rate does not trip the range warnings.
    if input.expected_annual_return_rate < 0.0
        || input.expected_annual_return_rate > MAX_EXPECTED_ANNUAL_RETURN
    {
        warnings.push("Expected annual return rate should be between 0% and 30%".to_string());
    }

    if input.annual_inflation_rate < 0.0 || input.annual_inflation_rate > MAX_ANNUAL_INFLATION {
        warnings.push("Annual inflation rate should be between 0% and 15%".to_string());
    }

    if input.monthly_contribution < 0.0 {
        errors.push("Monthly contribution cannot be negative".to_string());
    }

    if input.current_savings < 0.0 {
        errors.push("Current savings cannot be negative".to_string());
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn horizon_months(input: &CalculatorInput) -> i64 {
    (i64::from(input.retirement_age) - i64::from(input.current_age)) * 12
}

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorInput {
    pub current_age: i32,
    pub retirement_age: i32,
    pub current_savings: f64,
    pub monthly_contribution: f64,
    /// Fractional, e.g. 0.12 for 12%.
    pub expected_annual_return_rate: f64,
    pub current_monthly_expense: f64,
    /// Fractional, e.g. 0.06 for 6%.
    pub annual_inflation_rate: f64,
    pub post_retirement_nominal_return_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorOutput {
    pub years_to_retirement: u32,
    pub total_months: u32,
    pub monthly_return_rate: f64,

    // Accumulation phase
    pub fv_sip: f64,
    pub fv_current: f64,
    pub retirement_corpus: f64,

    // Withdrawal phase
    pub future_monthly_expense: f64,
    pub real_post_ret_return: f64,
    pub retirement_duration_months: u32,
    pub retirement_duration_years: f64,

    pub is_valid: bool,
    pub warnings: Vec<String>,
}

impl CalculatorOutput {
    /// All-zero record returned when validation refuses the input.
    pub fn rejected(messages: Vec<String>) -> Self {
        Self {
            is_valid: false,
            warnings: messages,
            ..Self::default()
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SustainabilityLevel {
    Excellent,
    Good,
    Moderate,
    Poor,
    AtRisk,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SustainabilityRating {
    pub level: SustainabilityLevel,
    pub message: &'static str,
}

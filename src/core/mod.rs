mod engine;
mod types;
mod validate;

pub use engine::{
    MAX_DEPLETION_MONTHS, calculate_retirement, future_value_of_contributions,
    future_value_of_savings, inflate_expense, real_return, simulate_corpus_depletion,
    sustainability_rating,
};
pub use types::{
    CalculatorInput, CalculatorOutput, SustainabilityLevel, SustainabilityRating,
    ValidationResult,
};
pub use validate::validate_inputs;

use super::types::{
    CalculatorInput, CalculatorOutput, SustainabilityLevel, SustainabilityRating,
};
use super::validate::validate_inputs;

/// Hard upper bound on the depletion loop: 100 years of monthly steps.
pub const MAX_DEPLETION_MONTHS: u32 = 1200;

const DEPLETION_RISK_YEARS: f64 = 10.0;
const CORPUS_HEURISTIC_MULTIPLIER: f64 = 2.0;

/// Runs the full two-phase projection.
///
/// Accumulation compounds at the nominal pre-retirement rate; the withdrawal
/// phase draws an inflation-adjusted expense from a corpus growing at the
/// real post-retirement rate. Invalid input yields an all-zero record whose
/// `warnings` hold the validation errors followed by the validation warnings.
pub fn calculate_retirement(input: &CalculatorInput) -> CalculatorOutput {
    let validation = validate_inputs(input);
    if !validation.is_valid {
        let mut messages = validation.errors;
        messages.extend(validation.warnings);
        return CalculatorOutput::rejected(messages);
    }

    // Validation guarantees retirement_age > current_age > 0.
    let years_to_retirement = input.retirement_age.abs_diff(input.current_age);
    let total_months = years_to_retirement.saturating_mul(12);
    let monthly_return_rate = input.expected_annual_return_rate / 12.0;

    let fv_sip = future_value_of_contributions(
        input.monthly_contribution,
        monthly_return_rate,
        total_months,
    );
    let fv_current =
        future_value_of_savings(input.current_savings, monthly_return_rate, total_months);
    let retirement_corpus = fv_sip + fv_current;

    let future_monthly_expense = inflate_expense(
        input.current_monthly_expense,
        input.annual_inflation_rate,
        years_to_retirement,
    );
    let real_post_ret_return = real_return(
        input.post_retirement_nominal_return_rate,
        input.annual_inflation_rate,
    );

    let retirement_duration_months = simulate_corpus_depletion(
        retirement_corpus,
        future_monthly_expense,
        real_post_ret_return / 12.0,
    );
    let retirement_duration_years = f64::from(retirement_duration_months) / 12.0;

    let mut output = CalculatorOutput {
        years_to_retirement,
        total_months,
        monthly_return_rate,
        fv_sip,
        fv_current,
        retirement_corpus,
        future_monthly_expense,
        real_post_ret_return,
        retirement_duration_months,
        retirement_duration_years,
        is_valid: true,
        warnings: validation.warnings,
    };

    let sanity = sanity_warnings(input, &output);
    output.warnings.extend(sanity);
    output
}

/// Future value of an ordinary annuity: each contribution lands at period end.
pub fn future_value_of_contributions(
    monthly_contribution: f64,
    monthly_rate: f64,
    total_months: u32,
) -> f64 {
    if monthly_rate == 0.0 {
        return monthly_contribution * f64::from(total_months);
    }

    let growth_factor = (1.0 + monthly_rate).powf(f64::from(total_months));
    monthly_contribution * ((growth_factor - 1.0) / monthly_rate)
}

pub fn future_value_of_savings(current_savings: f64, monthly_rate: f64, total_months: u32) -> f64 {
    current_savings * (1.0 + monthly_rate).powf(f64::from(total_months))
}

/// Inflation compounds yearly over a whole number of years.
pub fn inflate_expense(current_monthly_expense: f64, inflation_rate: f64, years: u32) -> f64 {
    current_monthly_expense * (1.0 + inflation_rate).powf(f64::from(years))
}

/// Fisher relation between a nominal rate and inflation.
pub fn real_return(nominal_rate: f64, inflation_rate: f64) -> f64 {
    ((1.0 + nominal_rate) / (1.0 + inflation_rate)) - 1.0
}

/// Counts the months a corpus survives, growing first and then withdrawing
/// each month. Stops once the corpus is no longer positive or after
/// [`MAX_DEPLETION_MONTHS`]; reaching the cap is not reported separately.
pub fn simulate_corpus_depletion(
    initial_corpus: f64,
    monthly_withdrawal: f64,
    monthly_real_return: f64,
) -> u32 {
    let mut corpus = initial_corpus;
    let mut months = 0;

    while corpus > 0.0 && months < MAX_DEPLETION_MONTHS {
        corpus *= 1.0 + monthly_real_return;
        corpus -= monthly_withdrawal;
        months += 1;
    }

    months
}

/// Advisory checks on a finished projection. Never blocks a result.
fn sanity_warnings(input: &CalculatorInput, output: &CalculatorOutput) -> Vec<String> {
    let mut warnings = Vec::new();

    let simple_growth =
        1.0 + input.expected_annual_return_rate * f64::from(output.years_to_retirement) / 2.0;
    let expected_corpus =
        input.monthly_contribution * f64::from(output.total_months) * simple_growth;

    if output.retirement_corpus > CORPUS_HEURISTIC_MULTIPLIER * expected_corpus {
        warnings.push(
            "Calculated corpus seems unusually high - please verify inputs".to_string(),
        );
    }

    if output.retirement_duration_years < DEPLETION_RISK_YEARS {
        warnings.push(
            "Corpus depletion risk is high - consider increasing contributions or reducing expected expenses"
                .to_string(),
        );
    }

    warnings
}

pub fn sustainability_rating(retirement_duration_years: f64) -> SustainabilityRating {
    let (level, message) = if retirement_duration_years >= 30.0 {
        (
            SustainabilityLevel::Excellent,
            "Excellent - Corpus should last 30+ years",
        )
    } else if retirement_duration_years >= 20.0 {
        (
            SustainabilityLevel::Good,
            "Good - Corpus should last 20-30 years",
        )
    } else if retirement_duration_years >= 15.0 {
        (
            SustainabilityLevel::Moderate,
            "Moderate - Consider increasing contributions",
        )
    } else if retirement_duration_years >= 10.0 {
        (
            SustainabilityLevel::Poor,
            "Warning - Corpus may not last through retirement",
        )
    } else {
        (
            SustainabilityLevel::AtRisk,
            "Risk - Corpus depletion likely within 10 years",
        )
    };
    SustainabilityRating { level, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_rel(actual: f64, expected: f64, rel: f64) {
        let tol = expected.abs() * rel;
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, relative tolerance {rel}"
        );
    }

    fn sample_input() -> CalculatorInput {
        CalculatorInput {
            current_age: 30,
            retirement_age: 60,
            current_savings: 500_000.0,
            monthly_contribution: 10_000.0,
            expected_annual_return_rate: 0.12,
            current_monthly_expense: 30_000.0,
            annual_inflation_rate: 0.06,
            post_retirement_nominal_return_rate: 0.08,
        }
    }

    fn oracle_input() -> CalculatorInput {
        CalculatorInput {
            current_age: 30,
            retirement_age: 31,
            current_savings: 1_000.0,
            monthly_contribution: 100.0,
            expected_annual_return_rate: 0.0,
            current_monthly_expense: 100.0,
            annual_inflation_rate: 0.0,
            post_retirement_nominal_return_rate: 0.0,
        }
    }

    #[test]
    fn reference_scenario_matches_formulas() {
        let output = calculate_retirement(&sample_input());

        assert!(output.is_valid);
        assert_eq!(output.years_to_retirement, 30);
        assert_eq!(output.total_months, 360);
        assert_approx(output.monthly_return_rate, 0.01);

        assert_approx_rel(output.fv_sip, 34_949_641.327_685_04, 1e-9);
        assert_approx_rel(output.fv_current, 17_974_820.663_842_52, 1e-9);
        assert_eq!(output.retirement_corpus, output.fv_sip + output.fv_current);
        assert_approx_rel(output.future_monthly_expense, 172_304.735_187_397_75, 1e-9);
        assert_approx(output.real_post_ret_return, 1.08 / 1.06 - 1.0);

        assert_eq!(output.retirement_duration_months, 420);
        assert_approx(output.retirement_duration_years, 35.0);
        assert_eq!(
            output.warnings,
            vec!["Calculated corpus seems unusually high - please verify inputs".to_string()]
        );
    }

    #[test]
    fn oracle_zero_rates_match_hand_calculation() {
        // Hand calculation:
        // SIP: 100 * 12 = 1200; savings stay at 1000; corpus = 2200
        // Expense stays 100/month with no real growth -> 22 months
        let output = calculate_retirement(&oracle_input());

        assert!(output.is_valid);
        assert_eq!(output.total_months, 12);
        assert_approx(output.fv_sip, 1_200.0);
        assert_approx(output.fv_current, 1_000.0);
        assert_approx(output.retirement_corpus, 2_200.0);
        assert_approx(output.future_monthly_expense, 100.0);
        assert_approx(output.real_post_ret_return, 0.0);
        assert_eq!(output.retirement_duration_months, 22);
        assert_approx(output.retirement_duration_years, 22.0 / 12.0);
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].starts_with("Corpus depletion risk is high"));
    }

    #[test]
    fn oracle_two_month_annuity_compounds_at_period_end() {
        // Two months at 1%: 100 * 1.01 + 100 = 201
        assert_approx(future_value_of_contributions(100.0, 0.01, 2), 201.0);
        assert_approx(future_value_of_savings(1_000.0, 0.01, 2), 1_020.1);
    }

    #[test]
    fn expense_inflation_compounds_yearly() {
        assert_approx(inflate_expense(1_000.0, 0.10, 2), 1_210.0);
        assert_approx(inflate_expense(1_000.0, 0.10, 0), 1_000.0);
    }

    #[test]
    fn real_return_uses_post_retirement_rate_not_accumulation_rate() {
        let mut input = sample_input();
        let baseline = calculate_retirement(&input);
        input.expected_annual_return_rate = 0.05;
        let changed = calculate_retirement(&input);
        assert_eq!(baseline.real_post_ret_return, changed.real_post_ret_return);

        input.post_retirement_nominal_return_rate = 0.06;
        let flat = calculate_retirement(&input);
        assert_approx(flat.real_post_ret_return, 0.0);
    }

    #[test]
    fn invalid_input_returns_zeroed_output_with_errors_then_warnings() {
        let mut input = sample_input();
        input.current_savings = -1.0;
        input.annual_inflation_rate = 0.2;
        let output = calculate_retirement(&input);

        assert!(!output.is_valid);
        assert_eq!(
            output.warnings,
            vec![
                "Current savings cannot be negative".to_string(),
                "Annual inflation rate should be between 0% and 15%".to_string(),
            ]
        );
        assert_eq!(
            output,
            CalculatorOutput::rejected(output.warnings.clone())
        );
        assert_eq!(output.retirement_corpus, 0.0);
        assert_eq!(output.total_months, 0);
        assert_eq!(output.retirement_duration_months, 0);
    }

    #[test]
    fn equal_ages_are_rejected() {
        let mut input = sample_input();
        input.retirement_age = input.current_age;
        let output = calculate_retirement(&input);
        assert!(!output.is_valid);
        assert!(output.warnings[0].contains("Retirement age"));
    }

    #[test]
    fn depletion_of_non_positive_corpus_is_zero_months() {
        assert_eq!(simulate_corpus_depletion(0.0, 100.0, 0.01), 0);
        assert_eq!(simulate_corpus_depletion(-50.0, 100.0, 0.01), 0);
    }

    #[test]
    fn depletion_grows_before_withdrawing() {
        // 100 * 1.1 - 105 = 5 survives the first month; 5 * 1.1 - 105 < 0 ends the second.
        assert_eq!(simulate_corpus_depletion(100.0, 105.0, 0.1), 2);
        assert_eq!(simulate_corpus_depletion(100.0, 100.0, 0.0), 1);
        assert_eq!(simulate_corpus_depletion(100.0, 50.0, 0.0), 2);
    }

    #[test]
    fn depletion_is_capped_at_one_hundred_years() {
        assert_eq!(simulate_corpus_depletion(1.0, 0.0, 0.0), MAX_DEPLETION_MONTHS);
        assert_eq!(simulate_corpus_depletion(1_000.0, -10.0, 0.05), MAX_DEPLETION_MONTHS);
        assert_eq!(simulate_corpus_depletion(f64::INFINITY, 1.0, 0.0), MAX_DEPLETION_MONTHS);
    }

    #[test]
    fn sanity_flags_unusually_high_corpus_from_large_savings() {
        let mut input = oracle_input();
        input.current_savings = 10_000_000.0;
        let output = calculate_retirement(&input);
        assert!(output.is_valid);
        assert!(
            output
                .warnings
                .iter()
                .any(|w| w.contains("unusually high"))
        );
        // Corpus of ~10M against 100/month lasts past the cap.
        assert_eq!(output.retirement_duration_months, MAX_DEPLETION_MONTHS);
        assert_approx(output.retirement_duration_years, 100.0);
    }

    #[test]
    fn validation_warnings_precede_sanity_warnings() {
        let mut input = oracle_input();
        input.annual_inflation_rate = 0.5;
        let output = calculate_retirement(&input);
        assert!(output.is_valid);
        assert_eq!(output.warnings.len(), 2);
        assert!(output.warnings[0].contains("inflation"));
        assert!(output.warnings[1].contains("depletion risk"));
    }

    #[test]
    fn sustainability_rating_thresholds() {
        assert_eq!(sustainability_rating(35.0).level, SustainabilityLevel::Excellent);
        assert_eq!(sustainability_rating(30.0).level, SustainabilityLevel::Excellent);
        assert_eq!(sustainability_rating(29.9).level, SustainabilityLevel::Good);
        assert_eq!(sustainability_rating(15.0).level, SustainabilityLevel::Moderate);
        assert_eq!(sustainability_rating(10.0).level, SustainabilityLevel::Poor);
        assert_eq!(sustainability_rating(9.99).level, SustainabilityLevel::AtRisk);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_valid_outputs_satisfy_identities_and_are_repeatable(
            current_age in 1i32..80,
            span in 1i32..50,
            savings in 0u32..5_000_000,
            contribution in 0u32..200_000,
            return_bp in -500i32..3000,
            expense in 0u32..500_000,
            inflation_bp in 0i32..1500,
            post_bp in -500i32..1500,
        ) {
            let input = CalculatorInput {
                current_age,
                retirement_age: current_age + span,
                current_savings: f64::from(savings),
                monthly_contribution: f64::from(contribution),
                expected_annual_return_rate: f64::from(return_bp) / 10_000.0,
                current_monthly_expense: f64::from(expense),
                annual_inflation_rate: f64::from(inflation_bp) / 10_000.0,
                post_retirement_nominal_return_rate: f64::from(post_bp) / 10_000.0,
            };

            let first = calculate_retirement(&input);
            let second = calculate_retirement(&input);

            prop_assert!(first.is_valid);
            prop_assert_eq!(first.retirement_corpus, first.fv_sip + first.fv_current);
            prop_assert_eq!(
                first.retirement_duration_years,
                f64::from(first.retirement_duration_months) / 12.0
            );
            prop_assert!(first.retirement_duration_months <= MAX_DEPLETION_MONTHS);
            prop_assert_eq!(first.total_months, first.years_to_retirement * 12);
            prop_assert_eq!(first, second);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_zero_rate_sip_is_contribution_times_months(
            current_age in 18i32..70,
            span in 1i32..40,
            contribution in 0u32..1_000_000,
        ) {
            let mut input = sample_input();
            input.current_age = current_age;
            input.retirement_age = current_age + span;
            input.monthly_contribution = f64::from(contribution);
            input.expected_annual_return_rate = 0.0;

            let output = calculate_retirement(&input);
            prop_assert!(output.is_valid);
            prop_assert_eq!(
                output.fv_sip,
                f64::from(contribution) * f64::from(output.total_months)
            );
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_higher_contributions_do_not_reduce_corpus(
            span in 1i32..45,
            savings in 0u32..2_000_000,
            low in 0u32..100_000,
            extra in 0u32..100_000,
            return_bp in -3000i32..3000,
        ) {
            let mut lower = sample_input();
            lower.retirement_age = lower.current_age + span;
            lower.current_savings = f64::from(savings);
            lower.monthly_contribution = f64::from(low);
            lower.expected_annual_return_rate = f64::from(return_bp) / 10_000.0;

            let mut higher = lower;
            higher.monthly_contribution = f64::from(low) + f64::from(extra);

            let lower_out = calculate_retirement(&lower);
            let higher_out = calculate_retirement(&higher);
            prop_assert!(higher_out.retirement_corpus >= lower_out.retirement_corpus);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(96))]

        #[test]
        fn prop_depletion_always_terminates_within_cap(
            corpus in -1.0e12f64..1.0e12,
            withdrawal in 0.0f64..1.0e9,
            monthly_real_return in -2.0f64..2.0,
        ) {
            let months = simulate_corpus_depletion(corpus, withdrawal, monthly_real_return);
            prop_assert!(months <= MAX_DEPLETION_MONTHS);
            if corpus <= 0.0 {
                prop_assert_eq!(months, 0);
            }
        }
    }
}

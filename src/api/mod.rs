use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    body::Bytes,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::core::{CalculatorInput, CalculatorOutput, calculate_retirement, validate_inputs};
use crate::error::ApiError;
use crate::store::{CalculationStore, SavedCalculation};

const SERVICE_NAME: &str = "sr-calculator";

const REQUIRED_FIELDS: [&str; 8] = [
    "currentAge",
    "retirementAge",
    "currentSavings",
    "monthlyContribution",
    "expectedAnnualReturnRate",
    "currentMonthlyExpense",
    "annualInflationRate",
    "postRetirementNominalReturnRate",
];

pub struct AppState {
    store: CalculationStore,
    started_at: Instant,
}

impl AppState {
    pub fn new(history_limit: usize) -> Self {
        Self {
            store: CalculationStore::new(history_limit),
            started_at: Instant::now(),
        }
    }
}

/// Loosely typed request body; every field is coerced to a number.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    current_age: Value,
    retirement_age: Value,
    current_savings: Value,
    monthly_contribution: Value,
    expected_annual_return_rate: Value,
    current_monthly_expense: Value,
    annual_inflation_rate: Value,
    #[serde(alias = "postRetirementNominalReturn")]
    post_retirement_nominal_return_rate: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SaveCalculationPayload {
    user_id: Value,
    #[serde(flatten)]
    calculation: CalculatePayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HistoryQuery {
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: String,
    version: &'static str,
    uptime: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateInfoResponse {
    message: &'static str,
    endpoint: &'static str,
    method: &'static str,
    required_fields: [&'static str; 8],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputSummary {
    years_to_retirement: u32,
    total_months: u32,
    monthly_return_rate: f64,
    retirement_corpus: f64,
    fv_sip: f64,
    fv_current: f64,
    future_monthly_expense: f64,
    retirement_duration_years: f64,
    retirement_duration_months: u32,
    real_post_ret_return: f64,
}

impl From<&CalculatorOutput> for OutputSummary {
    fn from(value: &CalculatorOutput) -> Self {
        Self {
            years_to_retirement: value.years_to_retirement,
            total_months: value.total_months,
            monthly_return_rate: value.monthly_return_rate,
            retirement_corpus: value.retirement_corpus,
            fv_sip: value.fv_sip,
            fv_current: value.fv_current,
            future_monthly_expense: value.future_monthly_expense,
            retirement_duration_years: value.retirement_duration_years,
            retirement_duration_months: value.retirement_duration_months,
            real_post_ret_return: value.real_post_ret_return,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateData {
    input: CalculatorInput,
    output: OutputSummary,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    success: bool,
    data: CalculateData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedCalculationBody {
    id: Uuid,
    #[serde(flatten)]
    result: CalculatorOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveCalculationResponse {
    success: bool,
    message: &'static str,
    calculation: SavedCalculationBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    success: bool,
    calculations: Vec<SavedCalculation>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/calculate",
            get(calculate_info_handler).post(calculate_handler),
        )
        .route(
            "/api/calculations",
            get(list_calculations_handler).post(save_calculation_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let state = Arc::new(AppState::new(config.history_limit));
    let app = router(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "retirement calculator API listening");
    info!("Local access: http://127.0.0.1:{}/api/health", addr.port());

    axum::serve(listener, app).await
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            service: SERVICE_NAME,
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            uptime: state.started_at.elapsed().as_secs(),
        },
    )
}

async fn calculate_info_handler() -> Response {
    json_response(
        StatusCode::OK,
        CalculateInfoResponse {
            message: "SR Calculator API",
            endpoint: "/api/calculate",
            method: "POST",
            required_fields: REQUIRED_FIELDS,
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_handler(body: Bytes) -> Result<Response, ApiError> {
    let payload = parse_body::<CalculatePayload>(&body).inspect_err(log_internal)?;
    let input = input_from_payload(&payload);

    let validation = validate_inputs(&input);
    if !validation.is_valid {
        warn!(errors = ?validation.errors, "calculation refused");
        return Err(ApiError::Validation {
            details: validation.errors,
            warnings: validation.warnings,
        });
    }

    let output = calculate_retirement(&input);
    debug!(
        corpus = output.retirement_corpus,
        months = output.retirement_duration_months,
        "calculation complete"
    );
    Ok(json_response(StatusCode::OK, build_calculate_response(input, &output)))
}

async fn save_calculation_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = parse_body::<SaveCalculationPayload>(&body).inspect_err(log_internal)?;
    let user_id = user_id_from_value(&payload.user_id)
        .ok_or_else(|| ApiError::BadRequest("User ID is required".to_string()))?;

    let input = input_from_payload(&payload.calculation);
    let output = calculate_retirement(&input);
    let saved = state.store.save(&user_id, &input, &output);

    Ok(json_response(
        StatusCode::OK,
        SaveCalculationResponse {
            success: true,
            message: "Calculation saved successfully",
            calculation: SavedCalculationBody {
                id: saved.id,
                result: output,
            },
        },
    ))
}

async fn list_calculations_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let user_id = query
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("User ID is required".to_string()))?;

    Ok(json_response(
        StatusCode::OK,
        HistoryResponse {
            success: true,
            calculations: state.store.recent(&user_id),
        },
    ))
}

fn log_internal(err: &ApiError) {
    error!(error = %err, "failed to process calculation request");
}

/// Parses a JSON body. Unparseable or `null` bodies are faults; any other
/// non-object value behaves like an object with every field missing.
fn parse_body<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: Default + for<'de> Deserialize<'de>,
{
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::Internal(format!("invalid JSON body: {e}")))?;
    match value {
        Value::Null => Err(ApiError::Internal("request body is null".to_string())),
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|e| ApiError::Internal(format!("invalid request payload: {e}"))),
        _ => Ok(T::default()),
    }
}

fn input_from_payload(payload: &CalculatePayload) -> CalculatorInput {
    CalculatorInput {
        current_age: coerce_age(&payload.current_age),
        retirement_age: coerce_age(&payload.retirement_age),
        current_savings: coerce_number(&payload.current_savings),
        monthly_contribution: coerce_number(&payload.monthly_contribution),
        expected_annual_return_rate: coerce_number(&payload.expected_annual_return_rate),
        current_monthly_expense: coerce_number(&payload.current_monthly_expense),
        annual_inflation_rate: coerce_number(&payload.annual_inflation_rate),
        post_retirement_nominal_return_rate: coerce_number(
            &payload.post_retirement_nominal_return_rate,
        ),
    }
}

/// Coerces a loosely typed field the way a browser form value is turned into
/// a number: numeric strings (decimal, `0x`/`0o`/`0b`, `Infinity`) are parsed,
/// booleans become 1/0, a single-element array yields its element, and
/// anything that does not form a number becomes 0.
fn coerce_number(value: &Value) -> f64 {
    let number = loose_number(value);
    if number.is_nan() { 0.0 } else { number }
}

fn loose_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_numeric_string(s),
        Value::Bool(true) => 1.0,
        Value::Bool(false) | Value::Null => 0.0,
        // Arrays are read through their joined text form.
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [Value::Bool(_) | Value::Object(_)] => f64::NAN,
            [single] => loose_number(single),
            _ => f64::NAN,
        },
        Value::Object(_) => f64::NAN,
    }
}

fn parse_numeric_string(raw: &str) -> f64 {
    let text = raw.trim();
    if text.is_empty() {
        return 0.0;
    }

    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &text[2..];
        if digits.is_empty() {
            return f64::NAN;
        }
        return digits
            .chars()
            .try_fold(0.0, |acc: f64, c| {
                c.to_digit(radix)
                    .map(|d| acc * f64::from(radix) + f64::from(d))
            })
            .unwrap_or(f64::NAN);
    }

    // Rust's float grammar also admits `inf` and `nan`; only plain decimal
    // literals count here.
    if !text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

fn coerce_age(value: &Value) -> i32 {
    // `as` saturates out-of-range values.
    coerce_number(value).trunc() as i32
}

fn user_id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn build_calculate_response(input: CalculatorInput, output: &CalculatorOutput) -> CalculateResponse {
    CalculateResponse {
        success: true,
        data: CalculateData {
            input,
            output: output.into(),
            warnings: output.warnings.clone(),
        },
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

mod output;

use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    Adjustments, AffordabilityQuote, AmortizationSchedule, DEFAULT_GOVERNMENT_SUPPORT, LoanInputs,
    DomainError, LoanQuote, LoanSummary, RepaymentMode, quote, quote_affordability,
};
use crate::export::{format_money, schedule_to_csv};

pub use output::OutputFormat;

pub const MIN_TERM_YEARS: u32 = 1;
pub use crate::core::MAX_TERM_YEARS;
pub const MAX_ANNUAL_RATE_PERCENT: f64 = 100.0;

const SCHEDULE_CSV_FILENAME: &str = "amortization_schedule.csv";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliRepaymentMode {
    SimpleInterest,
    Amortizing,
}

impl From<CliRepaymentMode> for RepaymentMode {
    fn from(value: CliRepaymentMode) -> Self {
        match value {
            CliRepaymentMode::SimpleInterest => RepaymentMode::SimpleInterest,
            CliRepaymentMode::Amortizing => RepaymentMode::Amortizing,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRepaymentMode {
    #[serde(alias = "simpleInterest", alias = "simple_interest", alias = "simple")]
    SimpleInterest,
    #[serde(alias = "standard", alias = "compound")]
    Amortizing,
}

impl From<ApiRepaymentMode> for CliRepaymentMode {
    fn from(value: ApiRepaymentMode) -> Self {
        match value {
            ApiRepaymentMode::SimpleInterest => CliRepaymentMode::SimpleInterest,
            ApiRepaymentMode::Amortizing => CliRepaymentMode::Amortizing,
        }
    }
}

/// Rate, term, mode and price adjustments shared by every calculation.
#[derive(Args, Debug, Clone)]
pub struct TermArgs {
    #[arg(long, default_value_t = 1.0, help = "Annual interest rate in percent, e.g. 3.5")]
    pub rate: f64,
    #[arg(long, default_value_t = 5, help = "Loan term in whole years (1-30)")]
    pub years: u32,
    #[arg(
        long,
        value_enum,
        default_value_t = CliRepaymentMode::SimpleInterest,
        help = "Flat simple interest or a standard amortizing loan"
    )]
    pub mode: CliRepaymentMode,
    #[arg(long, default_value_t = 0.0, help = "Down payment deducted from the principal")]
    pub down_payment: f64,
    #[arg(long, help = "Deduct the government support amount from the principal")]
    pub government_support: bool,
    #[arg(
        long,
        default_value_t = DEFAULT_GOVERNMENT_SUPPORT,
        help = "Subsidy deducted when --government-support is set"
    )]
    pub government_support_amount: f64,
}

#[derive(Args, Debug, Clone)]
pub struct LoanArgs {
    #[arg(long, default_value_t = 100_000.0, help = "Loan amount or purchase price")]
    pub principal: f64,
    #[command(flatten)]
    pub terms: TermArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AffordArgs {
    #[arg(long, help = "Desired monthly payment")]
    pub monthly_payment: f64,
    #[command(flatten)]
    pub terms: TermArgs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AffordabilityInputs {
    pub monthly_payment: f64,
    pub annual_rate_percent: f64,
    pub term_years: u32,
    pub mode: RepaymentMode,
    pub adjustments: Adjustments,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct QuotePayload {
    principal: Option<f64>,
    #[serde(alias = "rate")]
    annual_rate: Option<f64>,
    years: Option<u32>,
    mode: Option<ApiRepaymentMode>,
    down_payment: Option<f64>,
    government_support: Option<bool>,
    government_support_amount: Option<f64>,
    include_schedule: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AffordPayload {
    monthly_payment: Option<f64>,
    #[serde(alias = "rate")]
    annual_rate: Option<f64>,
    years: Option<u32>,
    mode: Option<ApiRepaymentMode>,
    down_payment: Option<f64>,
    government_support: Option<bool>,
    government_support_amount: Option<f64>,
}

#[derive(Debug)]
struct QuoteRequest {
    inputs: LoanInputs,
    include_schedule: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteResponse {
    mode: RepaymentMode,
    principal: f64,
    down_payment: f64,
    government_support: f64,
    financed_principal: f64,
    annual_rate_percent: f64,
    term_years: u32,
    summary: LoanSummary,
    payoff_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<AmortizationSchedule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AffordabilityResponse {
    annual_rate_percent: f64,
    term_years: u32,
    down_payment: f64,
    government_support: f64,
    #[serde(flatten)]
    quote: AffordabilityQuote,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn validate_terms(terms: &TermArgs) -> Result<Adjustments, String> {
    if !terms.rate.is_finite() || !(0.0..=MAX_ANNUAL_RATE_PERCENT).contains(&terms.rate) {
        return Err(format!(
            "--rate must be between 0 and {MAX_ANNUAL_RATE_PERCENT}"
        ));
    }

    if !(MIN_TERM_YEARS..=MAX_TERM_YEARS).contains(&terms.years) {
        return Err(format!(
            "--years must be between {MIN_TERM_YEARS} and {MAX_TERM_YEARS}"
        ));
    }

    if !terms.down_payment.is_finite() || terms.down_payment < 0.0 {
        return Err("--down-payment must be >= 0".to_string());
    }

    if !terms.government_support_amount.is_finite() || terms.government_support_amount < 0.0 {
        return Err("--government-support-amount must be >= 0".to_string());
    }

    Ok(Adjustments {
        down_payment: terms.down_payment,
        government_support: terms.government_support,
        government_support_amount: terms.government_support_amount,
    })
}

pub fn build_inputs(args: LoanArgs) -> Result<LoanInputs, String> {
    if !args.principal.is_finite() || args.principal < 0.0 {
        return Err("--principal must be >= 0".to_string());
    }

    let adjustments = validate_terms(&args.terms)?;
    if adjustments.total() > args.principal {
        return Err(
            "--down-payment plus government support must not exceed --principal".to_string(),
        );
    }

    Ok(LoanInputs {
        principal: args.principal,
        annual_rate_percent: args.terms.rate,
        term_years: args.terms.years,
        mode: args.terms.mode.into(),
        adjustments,
    })
}

pub fn build_affordability_inputs(args: AffordArgs) -> Result<AffordabilityInputs, String> {
    if !args.monthly_payment.is_finite() || args.monthly_payment < 0.0 {
        return Err("--monthly-payment must be >= 0".to_string());
    }

    let adjustments = validate_terms(&args.terms)?;
    Ok(AffordabilityInputs {
        monthly_payment: args.monthly_payment,
        annual_rate_percent: args.terms.rate,
        term_years: args.terms.years,
        mode: args.terms.mode.into(),
        adjustments,
    })
}

pub fn quote_loan(inputs: &LoanInputs) -> Result<LoanQuote, String> {
    let quote = quote(inputs).map_err(|e| e.to_string())?;
    debug!(
        principal = inputs.principal,
        financed = quote.financed_principal,
        rate = inputs.annual_rate_percent,
        years = inputs.term_years,
        mode = ?inputs.mode,
        monthly_payment = quote.summary.monthly_payment,
        "computed loan quote"
    );
    Ok(quote)
}

pub fn quote_payment(inputs: &AffordabilityInputs) -> Result<AffordabilityQuote, String> {
    let quote = quote_affordability(
        inputs.monthly_payment,
        inputs.annual_rate_percent,
        inputs.term_years,
        inputs.mode,
        &inputs.adjustments,
    )
    .map_err(|e| match e {
        DomainError::AdjustmentsExceedPrincipal {
            principal,
            adjustments,
        } => format!(
            "--down-payment plus government support ({}) must not exceed the {} \
             that --monthly-payment {} supports",
            format_money(adjustments),
            format_money(principal),
            format_money(inputs.monthly_payment),
        ),
        other => other.to_string(),
    })?;
    debug!(
        monthly_payment = inputs.monthly_payment,
        rate = inputs.annual_rate_percent,
        years = inputs.term_years,
        mode = ?inputs.mode,
        supported = quote.supported_principal,
        "computed affordability quote"
    );
    Ok(quote)
}

pub fn run_quote_command(
    args: LoanArgs,
    include_schedule: bool,
    format: OutputFormat,
) -> Result<String, String> {
    let inputs = build_inputs(args)?;
    let quote = quote_loan(&inputs)?;
    output::render_quote(&inputs, &quote, include_schedule, format)
}

pub fn run_schedule_command(args: LoanArgs, format: OutputFormat) -> Result<String, String> {
    let inputs = build_inputs(args)?;
    let quote = quote_loan(&inputs)?;
    output::render_schedule(&quote.schedule, format)
}

pub fn run_afford_command(args: AffordArgs, format: OutputFormat) -> Result<String, String> {
    let inputs = build_affordability_inputs(args)?;
    let quote = quote_payment(&inputs)?;
    output::render_affordability(&inputs, &quote, format)
}

pub(crate) fn build_quote_response(
    inputs: &LoanInputs,
    quote: &LoanQuote,
    include_schedule: bool,
) -> QuoteResponse {
    QuoteResponse {
        mode: quote.mode,
        principal: inputs.principal,
        down_payment: inputs.adjustments.down_payment,
        government_support: inputs.adjustments.applied_support(),
        financed_principal: quote.financed_principal,
        annual_rate_percent: inputs.annual_rate_percent,
        term_years: inputs.term_years,
        summary: quote.summary,
        payoff_month: quote.schedule.payoff_month(),
        schedule: include_schedule.then(|| quote.schedule.clone()),
    }
}

pub(crate) fn build_affordability_response(
    inputs: &AffordabilityInputs,
    quote: &AffordabilityQuote,
) -> AffordabilityResponse {
    AffordabilityResponse {
        annual_rate_percent: inputs.annual_rate_percent,
        term_years: inputs.term_years,
        down_payment: inputs.adjustments.down_payment,
        government_support: inputs.adjustments.applied_support(),
        quote: *quote,
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/quote", get(quote_get_handler).post(quote_post_handler))
        .route(
            "/api/affordability",
            get(affordability_get_handler).post(affordability_post_handler),
        )
        .route("/api/schedule.csv", get(schedule_csv_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("loan calculator API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{}/api/quote", addr.port());

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn quote_get_handler(payload: Result<Query<QuotePayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => quote_handler_impl(payload),
        Err(rejection) => rejected(&rejection.body_text()),
    }
}

async fn quote_post_handler(payload: Result<Json<QuotePayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => quote_handler_impl(payload),
        Err(rejection) => rejected(&rejection.body_text()),
    }
}

async fn affordability_get_handler(
    payload: Result<Query<AffordPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => affordability_handler_impl(payload),
        Err(rejection) => rejected(&rejection.body_text()),
    }
}

async fn affordability_post_handler(
    payload: Result<Json<AffordPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => affordability_handler_impl(payload),
        Err(rejection) => rejected(&rejection.body_text()),
    }
}

fn quote_handler_impl(payload: QuotePayload) -> Response {
    let request = match quote_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return rejected(&msg),
    };
    let quote = match quote_loan(&request.inputs) {
        Ok(quote) => quote,
        Err(msg) => return rejected(&msg),
    };
    json_response(
        StatusCode::OK,
        build_quote_response(&request.inputs, &quote, request.include_schedule),
    )
}

fn affordability_handler_impl(payload: AffordPayload) -> Response {
    let inputs = match affordability_inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return rejected(&msg),
    };
    let quote = match quote_payment(&inputs) {
        Ok(quote) => quote,
        Err(msg) => return rejected(&msg),
    };
    json_response(StatusCode::OK, build_affordability_response(&inputs, &quote))
}

async fn schedule_csv_handler(payload: Result<Query<QuotePayload>, QueryRejection>) -> Response {
    let payload = match payload {
        Ok(Query(payload)) => payload,
        Err(rejection) => return rejected(&rejection.body_text()),
    };
    let request = match quote_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return rejected(&msg),
    };
    let quote = match quote_loan(&request.inputs) {
        Ok(quote) => quote,
        Err(msg) => return rejected(&msg),
    };
    let csv = match schedule_to_csv(&quote.schedule) {
        Ok(csv) => csv,
        Err(e) => {
            warn!(error = %e, "schedule export failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Schedule export failed");
        }
    };

    with_cache_control((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SCHEDULE_CSV_FILENAME}\""),
            ),
        ],
        csv,
    ))
}

fn rejected(msg: &str) -> Response {
    warn!(reason = msg, "rejected request");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn quote_request_from_json(json: &str) -> Result<QuoteRequest, String> {
    let payload = serde_json::from_str::<QuotePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    quote_request_from_payload(payload)
}

fn apply_term_overrides(
    terms: &mut TermArgs,
    annual_rate: Option<f64>,
    years: Option<u32>,
    mode: Option<ApiRepaymentMode>,
    down_payment: Option<f64>,
    government_support: Option<bool>,
    government_support_amount: Option<f64>,
) {
    if let Some(v) = annual_rate {
        terms.rate = v;
    }
    if let Some(v) = years {
        terms.years = v;
    }
    if let Some(v) = mode {
        terms.mode = v.into();
    }
    if let Some(v) = down_payment {
        terms.down_payment = v;
    }
    if let Some(v) = government_support {
        terms.government_support = v;
    }
    if let Some(v) = government_support_amount {
        terms.government_support_amount = v;
    }
}

fn quote_request_from_payload(payload: QuotePayload) -> Result<QuoteRequest, String> {
    let mut args = default_loan_args();
    if let Some(v) = payload.principal {
        args.principal = v;
    }
    apply_term_overrides(
        &mut args.terms,
        payload.annual_rate,
        payload.years,
        payload.mode,
        payload.down_payment,
        payload.government_support,
        payload.government_support_amount,
    );

    let inputs = build_inputs(args)?;
    Ok(QuoteRequest {
        inputs,
        include_schedule: payload.include_schedule.unwrap_or(true),
    })
}

fn affordability_inputs_from_payload(
    payload: AffordPayload,
) -> Result<AffordabilityInputs, String> {
    let Some(monthly_payment) = payload.monthly_payment else {
        return Err("--monthly-payment is required".to_string());
    };
    let mut args = AffordArgs {
        monthly_payment,
        terms: default_term_args(),
    };
    apply_term_overrides(
        &mut args.terms,
        payload.annual_rate,
        payload.years,
        payload.mode,
        payload.down_payment,
        payload.government_support,
        payload.government_support_amount,
    );
    build_affordability_inputs(args)
}

fn default_term_args() -> TermArgs {
    TermArgs {
        rate: 1.0,
        years: 5,
        mode: CliRepaymentMode::SimpleInterest,
        down_payment: 0.0,
        government_support: false,
        government_support_amount: DEFAULT_GOVERNMENT_SUPPORT,
    }
}

fn default_loan_args() -> LoanArgs {
    LoanArgs {
        principal: 100_000.0,
        terms: default_term_args(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_args() -> LoanArgs {
        default_loan_args()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Response) {
        let response = router()
            .oneshot(request)
            .await
            .expect("router is infallible");
        (response.status(), response)
    }

    async fn get(uri: &str) -> (StatusCode, Response) {
        send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
    }

    async fn post_json(uri: &str, body: &'static str) -> (StatusCode, Response) {
        send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .expect("valid request"),
        )
        .await
    }

    fn cache_control(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
    }

    async fn error_text(response: Response) -> String {
        body_json(response).await["error"]
            .as_str()
            .expect("error message")
            .to_string()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[test]
    fn build_inputs_accepts_defaults() {
        let inputs = build_inputs(sample_args()).expect("valid inputs");
        assert_approx(inputs.principal, 100_000.0);
        assert_approx(inputs.annual_rate_percent, 1.0);
        assert_eq!(inputs.term_years, 5);
        assert_eq!(inputs.mode, RepaymentMode::SimpleInterest);
        assert_eq!(inputs.adjustments, Adjustments::none());
    }

    #[test]
    fn build_inputs_rejects_term_outside_range() {
        for years in [0, 31] {
            let mut args = sample_args();
            args.terms.years = years;
            let err = build_inputs(args).expect_err("must reject term");
            assert!(err.contains("--years"));
        }
    }

    #[test]
    fn build_inputs_rejects_negative_principal_and_rate() {
        let mut args = sample_args();
        args.principal = -1.0;
        let err = build_inputs(args).expect_err("must reject principal");
        assert!(err.contains("--principal"));

        let mut args = sample_args();
        args.terms.rate = -0.1;
        let err = build_inputs(args).expect_err("must reject rate");
        assert!(err.contains("--rate"));

        let mut args = sample_args();
        args.terms.rate = f64::INFINITY;
        assert!(build_inputs(args).is_err());
    }

    #[test]
    fn build_inputs_rejects_adjustments_above_principal() {
        let mut args = sample_args();
        args.terms.government_support = true;
        args.terms.down_payment = 1.0;
        let err = build_inputs(args).expect_err("must reject adjustments");
        assert!(err.contains("--down-payment"));
    }

    #[test]
    fn build_affordability_inputs_rejects_negative_payment() {
        let args = AffordArgs {
            monthly_payment: -10.0,
            terms: default_term_args(),
        };
        let err = build_affordability_inputs(args).expect_err("must reject payment");
        assert!(err.contains("--monthly-payment"));
    }

    #[test]
    fn quote_request_from_json_parses_web_keys() {
        let json = r#"{
          "principal": 450000,
          "annualRate": 3.5,
          "years": 15,
          "mode": "standard",
          "downPayment": 50000,
          "governmentSupport": true,
          "includeSchedule": false
        }"#;
        let request = quote_request_from_json(json).expect("json should parse");
        let inputs = request.inputs;

        assert_approx(inputs.principal, 450_000.0);
        assert_approx(inputs.annual_rate_percent, 3.5);
        assert_eq!(inputs.term_years, 15);
        assert_eq!(inputs.mode, RepaymentMode::Amortizing);
        assert_approx(inputs.adjustments.down_payment, 50_000.0);
        assert!(inputs.adjustments.government_support);
        assert_approx(
            inputs.adjustments.government_support_amount,
            DEFAULT_GOVERNMENT_SUPPORT,
        );
        assert!(!request.include_schedule);
    }

    #[test]
    fn quote_request_from_json_accepts_mode_aliases() {
        for (raw, expected) in [
            ("simple-interest", RepaymentMode::SimpleInterest),
            ("simpleInterest", RepaymentMode::SimpleInterest),
            ("simple", RepaymentMode::SimpleInterest),
            ("amortizing", RepaymentMode::Amortizing),
            ("compound", RepaymentMode::Amortizing),
        ] {
            let json = format!(r#"{{"mode": "{raw}", "rate": 2}}"#);
            let request = quote_request_from_json(&json).expect("json should parse");
            assert_eq!(request.inputs.mode, expected, "alias {raw}");
            assert_approx(request.inputs.annual_rate_percent, 2.0);
            assert!(request.include_schedule);
        }
    }

    #[test]
    fn quote_request_from_json_rejects_unknown_mode() {
        let err = quote_request_from_json(r#"{"mode": "balloon"}"#).expect_err("must reject");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn affordability_payload_requires_monthly_payment() {
        let err = affordability_inputs_from_payload(AffordPayload::default())
            .expect_err("must require payment");
        assert!(err.contains("--monthly-payment"));
    }

    #[test]
    fn quote_response_serialization_contains_expected_fields() {
        let inputs = build_inputs(sample_args()).expect("valid inputs");
        let quote = quote_loan(&inputs).expect("valid quote");

        let json = serde_json::to_string(&build_quote_response(&inputs, &quote, true))
            .expect("response should serialize");
        assert!(json.contains("\"mode\":\"simple-interest\""));
        assert!(json.contains("\"financedPrincipal\""));
        assert!(json.contains("\"totalLoanCost\""));
        assert!(json.contains("\"monthlyPayment\""));
        assert!(json.contains("\"payoffMonth\""));
        assert!(json.contains("\"schedule\":[{\"month\":1"));

        let json = serde_json::to_string(&build_quote_response(&inputs, &quote, false))
            .expect("response should serialize");
        assert!(!json.contains("\"schedule\""));
    }

    #[tokio::test]
    async fn health_route_reports_ok() {
        let (status, response) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn quote_route_computes_default_scenario() {
        let (status, response) =
            get("/api/quote?principal=100000&annualRate=1&years=5&includeSchedule=false").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some("no-store")
        );

        let body = body_json(response).await;
        let summary = &body["summary"];
        assert_approx(summary["totalInterest"].as_f64().expect("number"), 5_000.0);
        assert_approx(summary["totalLoanCost"].as_f64().expect("number"), 105_000.0);
        assert_approx(summary["monthlyPayment"].as_f64().expect("number"), 1_750.0);
        assert!(body.get("schedule").is_none());
    }

    #[tokio::test]
    async fn quote_route_rejects_invalid_term() {
        let (status, response) = get("/api/quote?years=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(
            body["error"]
                .as_str()
                .expect("error message")
                .contains("--years")
        );
    }

    #[tokio::test]
    async fn affordability_route_inverts_payment() {
        let (status, response) =
            get("/api/affordability?monthlyPayment=1750&rate=1&years=5").await;
        assert_eq!(status, StatusCode::OK);
        let body = body_json(response).await;
        assert_approx(
            body["supportedPrincipal"].as_f64().expect("number"),
            100_000.0,
        );
        assert_approx(
            body["financedPrincipal"].as_f64().expect("number"),
            100_000.0,
        );
        assert_eq!(body["mode"], "simple-interest");
    }

    #[tokio::test]
    async fn schedule_csv_route_returns_attachment() {
        let (status, response) = get("/api/schedule.csv?principal=12000&rate=0&years=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/csv; charset=utf-8")
        );
        assert!(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains(SCHEDULE_CSV_FILENAME))
        );

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let csv = String::from_utf8(bytes.to_vec()).expect("utf-8 csv");
        assert_eq!(csv.lines().count(), 13);
        assert!(csv.starts_with("Month,Payment,Principal,Interest,Balance\n"));
    }

    #[tokio::test]
    async fn quote_post_accepts_json_body() {
        let (status, response) = post_json(
            "/api/quote",
            r#"{"principal": 12000, "annualRate": 0, "years": 1, "mode": "amortizing"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control(&response), Some("no-store"));
        let body = body_json(response).await;
        assert_approx(
            body["summary"]["monthlyPayment"].as_f64().expect("number"),
            1_000.0,
        );
    }

    #[tokio::test]
    async fn malformed_json_body_is_a_json_bad_request() {
        for uri in ["/api/quote", "/api/affordability"] {
            let (status, response) = post_json(uri, "{bad").await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(cache_control(&response), Some("no-store"));
            assert!(!error_text(response).await.is_empty());
        }
    }

    #[tokio::test]
    async fn mistyped_query_value_is_a_json_bad_request() {
        for uri in [
            "/api/quote?years=abc",
            "/api/affordability?monthlyPayment=lots",
            "/api/schedule.csv?principal=many",
        ] {
            let (status, response) = get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(cache_control(&response), Some("no-store"));
            assert!(!error_text(response).await.is_empty());
        }
    }

    #[test]
    fn quote_payment_names_flags_when_adjustments_exceed_supported_principal() {
        let inputs = AffordabilityInputs {
            monthly_payment: 1_750.0,
            annual_rate_percent: 1.0,
            term_years: 5,
            mode: RepaymentMode::SimpleInterest,
            adjustments: Adjustments {
                down_payment: 150_000.0,
                ..Adjustments::none()
            },
        };
        let err = quote_payment(&inputs).expect_err("adjustments above principal");
        assert!(err.starts_with("--down-payment"), "{err}");
        assert!(err.contains("--monthly-payment $1,750.00"), "{err}");
        assert!(err.contains("($150,000.00)"), "{err}");
        assert!(err.contains("$100,000.00"), "{err}");
    }

    #[tokio::test]
    async fn affordability_route_reports_adjustments_with_flag_names() {
        let (status, response) =
            get("/api/affordability?monthlyPayment=100&years=5&downPayment=1000000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err = error_text(response).await;
        assert!(err.contains("--down-payment"), "{err}");
        assert!(err.contains("$1,000,000.00"), "{err}");
    }

    #[tokio::test]
    async fn unknown_route_returns_json_not_found() {
        let (status, response) = get("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not found");
    }
}

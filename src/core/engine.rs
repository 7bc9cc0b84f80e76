use super::error::{DomainError, ensure_non_negative, ensure_representable, ensure_term};
use super::types::{
    Adjustments, AffordabilityQuote, AmortizationSchedule, LoanInputs, LoanQuote, LoanSummary,
    PaymentCapacity, RepaymentMode, ScheduleRow,
};

const MONTHS_PER_YEAR: u32 = 12;
const ZERO_RATE_EPS: f64 = 1e-12;

// Callers validate `years` with `ensure_term` first, so this cannot overflow.
fn total_months(years: u32) -> u32 {
    years * MONTHS_PER_YEAR
}

fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 12.0 / 100.0
}

fn validate_terms(
    amount_field: &'static str,
    amount: f64,
    annual_rate_percent: f64,
    years: u32,
) -> Result<(), DomainError> {
    ensure_term(years)?;
    ensure_non_negative(amount_field, amount)?;
    ensure_non_negative("annual rate", annual_rate_percent)
}

/// Flat interest on the original principal for the whole term.
pub fn compute_simple_interest(
    principal: f64,
    annual_rate_percent: f64,
    years: u32,
) -> Result<LoanSummary, DomainError> {
    validate_terms("principal", principal, annual_rate_percent, years)?;

    let total_interest = ensure_representable(
        "total interest",
        principal * (annual_rate_percent / 100.0) * years as f64,
    )?;
    let total_loan_cost = ensure_representable("total loan cost", principal + total_interest)?;
    let monthly_payment = total_loan_cost / total_months(years) as f64;
    Ok(LoanSummary {
        total_interest,
        total_loan_cost,
        monthly_payment,
    })
}

/// Inverse of [`compute_simple_interest`]: the principal a monthly payment can carry.
pub fn compute_loan_amount_from_payment(
    monthly_payment: f64,
    annual_rate_percent: f64,
    years: u32,
) -> Result<PaymentCapacity, DomainError> {
    validate_terms("monthly payment", monthly_payment, annual_rate_percent, years)?;

    let months = total_months(years) as f64;
    let total_interest_rate = (annual_rate_percent / 100.0) * years as f64;
    let total_loan_cost = ensure_representable("total loan cost", monthly_payment * months)?;
    let principal = total_loan_cost / (1.0 + total_interest_rate);
    Ok(PaymentCapacity {
        principal,
        total_interest: principal * total_interest_rate,
        total_loan_cost,
    })
}

pub fn compute_amortizing_monthly_payment(
    principal: f64,
    annual_rate_percent: f64,
    years: u32,
) -> Result<f64, DomainError> {
    validate_terms("principal", principal, annual_rate_percent, years)?;

    let rate = monthly_rate(annual_rate_percent);
    let n = total_months(years) as f64;
    if rate.abs() < ZERO_RATE_EPS {
        return Ok(principal / n);
    }

    let growth = (1.0 + rate).powf(n);
    ensure_representable("monthly payment", principal * rate * growth / (growth - 1.0))
}

pub fn compute_amortizing_summary(
    principal: f64,
    annual_rate_percent: f64,
    years: u32,
) -> Result<LoanSummary, DomainError> {
    let monthly_payment =
        compute_amortizing_monthly_payment(principal, annual_rate_percent, years)?;
    let total_loan_cost = ensure_representable(
        "total loan cost",
        monthly_payment * total_months(years) as f64,
    )?;
    Ok(LoanSummary {
        total_interest: total_loan_cost - principal,
        total_loan_cost,
        monthly_payment,
    })
}

/// Present value of a level monthly annuity over the term.
pub fn compute_amortizing_loan_amount_from_payment(
    monthly_payment: f64,
    annual_rate_percent: f64,
    years: u32,
) -> Result<PaymentCapacity, DomainError> {
    validate_terms("monthly payment", monthly_payment, annual_rate_percent, years)?;

    let rate = monthly_rate(annual_rate_percent);
    let n = total_months(years) as f64;
    let principal = if rate.abs() < ZERO_RATE_EPS {
        monthly_payment * n
    } else {
        monthly_payment * (1.0 - (1.0 + rate).powf(-n)) / rate
    };
    let total_loan_cost = ensure_representable("total loan cost", monthly_payment * n)?;
    Ok(PaymentCapacity {
        principal,
        total_interest: total_loan_cost - principal,
        total_loan_cost,
    })
}

pub fn compute_summary(
    principal: f64,
    annual_rate_percent: f64,
    years: u32,
    mode: RepaymentMode,
) -> Result<LoanSummary, DomainError> {
    match mode {
        RepaymentMode::SimpleInterest => {
            compute_simple_interest(principal, annual_rate_percent, years)
        }
        RepaymentMode::Amortizing => {
            compute_amortizing_summary(principal, annual_rate_percent, years)
        }
    }
}

pub fn compute_capacity(
    monthly_payment: f64,
    annual_rate_percent: f64,
    years: u32,
    mode: RepaymentMode,
) -> Result<PaymentCapacity, DomainError> {
    match mode {
        RepaymentMode::SimpleInterest => {
            compute_loan_amount_from_payment(monthly_payment, annual_rate_percent, years)
        }
        RepaymentMode::Amortizing => {
            compute_amortizing_loan_amount_from_payment(monthly_payment, annual_rate_percent, years)
        }
    }
}

/// Builds one row per month of the term.
///
/// Simple-interest schedules charge the same flat interest every month: one
/// year of interest on the original principal divided by the number of
/// months. The balance never feeds back into it, so long terms pay off before
/// the last row. Amortizing schedules charge interest on the opening balance
/// of each month. Closing balances are floored at zero.
pub fn generate_amortization_schedule(
    principal: f64,
    annual_rate_percent: f64,
    years: u32,
    monthly_payment: f64,
    mode: RepaymentMode,
) -> Result<AmortizationSchedule, DomainError> {
    validate_terms("principal", principal, annual_rate_percent, years)?;
    ensure_non_negative("monthly payment", monthly_payment)?;

    let months = total_months(years);
    let rate = monthly_rate(annual_rate_percent);
    let flat_interest = (principal * annual_rate_percent / 100.0) / months as f64;

    let mut balance = principal;
    let mut rows = Vec::with_capacity(months as usize);
    for month in 1..=months {
        let interest = match mode {
            RepaymentMode::SimpleInterest => flat_interest,
            RepaymentMode::Amortizing => balance * rate,
        };
        let principal_portion = monthly_payment - interest;
        balance = (balance - principal_portion).max(0.0);
        rows.push(ScheduleRow {
            month,
            payment: monthly_payment,
            principal: principal_portion,
            interest,
            balance,
        });
    }

    Ok(AmortizationSchedule::from_rows(rows))
}

/// Subtracts the down payment and, when flagged, the government support.
pub fn apply_adjustments(
    base_principal: f64,
    down_payment: f64,
    government_support: bool,
    government_support_amount: f64,
) -> Result<f64, DomainError> {
    ensure_non_negative("principal", base_principal)?;
    ensure_non_negative("down payment", down_payment)?;
    ensure_non_negative("government support", government_support_amount)?;

    let adjustments = Adjustments {
        down_payment,
        government_support,
        government_support_amount,
    }
    .total();
    let adjusted = base_principal - adjustments;
    if adjusted < 0.0 {
        return Err(DomainError::AdjustmentsExceedPrincipal {
            principal: base_principal,
            adjustments,
        });
    }
    Ok(adjusted)
}

fn apply(base_principal: f64, adjustments: &Adjustments) -> Result<f64, DomainError> {
    apply_adjustments(
        base_principal,
        adjustments.down_payment,
        adjustments.government_support,
        adjustments.government_support_amount,
    )
}

/// Forward path: price in, summary and schedule out.
pub fn quote(inputs: &LoanInputs) -> Result<LoanQuote, DomainError> {
    let financed_principal = apply(inputs.principal, &inputs.adjustments)?;
    let summary = compute_summary(
        financed_principal,
        inputs.annual_rate_percent,
        inputs.term_years,
        inputs.mode,
    )?;
    let schedule = generate_amortization_schedule(
        financed_principal,
        inputs.annual_rate_percent,
        inputs.term_years,
        summary.monthly_payment,
        inputs.mode,
    )?;
    Ok(LoanQuote {
        mode: inputs.mode,
        financed_principal,
        summary,
        schedule,
    })
}

/// Inverse path: the payment determines the supported principal, and the
/// adjustments are then subtracted from it the same way as on the forward path.
pub fn quote_affordability(
    monthly_payment: f64,
    annual_rate_percent: f64,
    years: u32,
    mode: RepaymentMode,
    adjustments: &Adjustments,
) -> Result<AffordabilityQuote, DomainError> {
    let capacity = compute_capacity(monthly_payment, annual_rate_percent, years, mode)?;
    let financed_principal = apply(capacity.principal, adjustments)?;
    Ok(AffordabilityQuote {
        mode,
        monthly_payment,
        supported_principal: capacity.principal,
        financed_principal,
        total_interest: capacity.total_interest,
        total_loan_cost: capacity.total_loan_cost,
    })
}

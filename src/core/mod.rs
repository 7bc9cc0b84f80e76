mod engine;
mod error;
mod types;

pub use engine::{
    apply_adjustments, compute_amortizing_loan_amount_from_payment,
    compute_amortizing_monthly_payment, compute_amortizing_summary, compute_capacity,
    compute_loan_amount_from_payment, compute_simple_interest, compute_summary,
    generate_amortization_schedule, quote, quote_affordability,
};
pub use error::DomainError;
pub use types::{
    Adjustments, AffordabilityQuote, AmortizationSchedule, DEFAULT_GOVERNMENT_SUPPORT, LoanInputs,
    LoanQuote, LoanSummary, MAX_TERM_YEARS, PaymentCapacity, RepaymentMode, ScheduleRow,
};

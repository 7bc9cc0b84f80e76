use serde::Serialize;

/// Subsidy deducted from the financed price when government support applies.
pub const DEFAULT_GOVERNMENT_SUPPORT: f64 = 100_000.0;

/// Longest term any calculation accepts.
pub const MAX_TERM_YEARS: u32 = 30;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepaymentMode {
    SimpleInterest,
    Amortizing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustments {
    pub down_payment: f64,
    pub government_support: bool,
    pub government_support_amount: f64,
}

impl Adjustments {
    pub fn none() -> Self {
        Self {
            down_payment: 0.0,
            government_support: false,
            government_support_amount: DEFAULT_GOVERNMENT_SUPPORT,
        }
    }

    /// Support actually deducted, zero unless the flag is set.
    pub fn applied_support(&self) -> f64 {
        if self.government_support {
            self.government_support_amount
        } else {
            0.0
        }
    }

    pub fn total(&self) -> f64 {
        self.down_payment + self.applied_support()
    }
}

impl Default for Adjustments {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoanInputs {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub term_years: u32,
    pub mode: RepaymentMode,
    pub adjustments: Adjustments,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub total_interest: f64,
    pub total_loan_cost: f64,
    pub monthly_payment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCapacity {
    pub principal: f64,
    pub total_interest: f64,
    pub total_loan_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub month: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

/// Month-by-month rows in chronological order, one per month of the term.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AmortizationSchedule {
    rows: Vec<ScheduleRow>,
}

impl AmortizationSchedule {
    pub(crate) fn from_rows(rows: Vec<ScheduleRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ScheduleRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_principal(&self) -> f64 {
        self.rows.iter().map(|row| row.principal).sum()
    }

    pub fn total_interest(&self) -> f64 {
        self.rows.iter().map(|row| row.interest).sum()
    }

    pub fn final_balance(&self) -> Option<f64> {
        self.rows.last().map(|row| row.balance)
    }

    /// First month whose closing balance is zero, if the loan pays off.
    pub fn payoff_month(&self) -> Option<u32> {
        self.rows
            .iter()
            .find(|row| row.balance <= 0.0)
            .map(|row| row.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuote {
    pub mode: RepaymentMode,
    pub financed_principal: f64,
    pub summary: LoanSummary,
    pub schedule: AmortizationSchedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityQuote {
    pub mode: RepaymentMode,
    pub monthly_payment: f64,
    pub supported_principal: f64,
    pub financed_principal: f64,
    pub total_interest: f64,
    pub total_loan_cost: f64,
}

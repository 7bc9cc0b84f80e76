use clap::ValueEnum;
use tabled::{Table, builder::Builder};

use super::{AffordabilityInputs, build_affordability_response, build_quote_response};
use crate::core::{AffordabilityQuote, AmortizationSchedule, LoanInputs, LoanQuote, RepaymentMode};
use crate::export::{format_money, schedule_to_csv};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

fn mode_label(mode: RepaymentMode) -> &'static str {
    match mode {
        RepaymentMode::SimpleInterest => "Simple interest",
        RepaymentMode::Amortizing => "Amortizing",
    }
}

fn field_table(fields: &[(&str, String)]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field".to_string(), "Value".to_string()]);
    for (name, value) in fields {
        builder.push_record([name.to_string(), value.clone()]);
    }
    Table::from(builder).to_string()
}

fn field_csv(fields: &[(&str, String)]) -> Result<String, String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let write = |wtr: &mut csv::Writer<Vec<u8>>| -> Result<(), csv::Error> {
        wtr.write_record(["field", "value"])?;
        for (name, value) in fields {
            wtr.write_record([*name, value.as_str()])?;
        }
        Ok(())
    };
    write(&mut wtr).map_err(|e| format!("csv write failed: {e}"))?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| format!("csv buffer flush failed: {}", e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| format!("csv output was not valid UTF-8: {e}"))
}

fn schedule_table(schedule: &AmortizationSchedule) -> String {
    let mut builder = Builder::default();
    builder.push_record(
        ["Month", "Payment", "Principal", "Interest", "Balance"].map(str::to_string),
    );
    for row in schedule.rows() {
        builder.push_record([
            row.month.to_string(),
            format_money(row.payment),
            format_money(row.principal),
            format_money(row.interest),
            format_money(row.balance),
        ]);
    }
    Table::from(builder).to_string()
}

fn quote_fields(inputs: &LoanInputs, quote: &LoanQuote) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Mode", mode_label(quote.mode).to_string()),
        ("Principal", format_money(inputs.principal)),
    ];
    if inputs.adjustments.down_payment > 0.0 {
        fields.push(("Down payment", format_money(inputs.adjustments.down_payment)));
    }
    if inputs.adjustments.government_support {
        fields.push((
            "Government support",
            format_money(inputs.adjustments.government_support_amount),
        ));
    }
    fields.extend([
        ("Financed principal", format_money(quote.financed_principal)),
        ("Annual rate", format!("{:.2}%", inputs.annual_rate_percent)),
        ("Term", format!("{} years", inputs.term_years)),
        ("Total interest", format_money(quote.summary.total_interest)),
        ("Total loan cost", format_money(quote.summary.total_loan_cost)),
        ("Monthly payment", format_money(quote.summary.monthly_payment)),
    ]);
    fields
}

pub(super) fn render_quote(
    inputs: &LoanInputs,
    quote: &LoanQuote,
    include_schedule: bool,
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&build_quote_response(inputs, quote, include_schedule))
                .map_err(|e| format!("failed to serialize quote: {e}"))
        }
        OutputFormat::Table => {
            let mut out = field_table(&quote_fields(inputs, quote));
            if include_schedule {
                out.push_str("\n\n");
                out.push_str(&schedule_table(&quote.schedule));
            }
            Ok(out)
        }
        OutputFormat::Csv if include_schedule => {
            schedule_to_csv(&quote.schedule).map_err(|e| e.to_string())
        }
        OutputFormat::Csv => field_csv(&quote_fields(inputs, quote)),
    }
}

pub(super) fn render_schedule(
    schedule: &AmortizationSchedule,
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(schedule)
            .map_err(|e| format!("failed to serialize schedule: {e}")),
        OutputFormat::Table => Ok(schedule_table(schedule)),
        OutputFormat::Csv => schedule_to_csv(schedule).map_err(|e| e.to_string()),
    }
}

pub(super) fn render_affordability(
    inputs: &AffordabilityInputs,
    quote: &AffordabilityQuote,
    format: OutputFormat,
) -> Result<String, String> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(&build_affordability_response(inputs, quote))
            .map_err(|e| format!("failed to serialize affordability quote: {e}"));
    }

    let mut fields = vec![
        ("Mode", mode_label(quote.mode).to_string()),
        ("Monthly payment", format_money(quote.monthly_payment)),
        ("Annual rate", format!("{:.2}%", inputs.annual_rate_percent)),
        ("Term", format!("{} years", inputs.term_years)),
        ("Supported principal", format_money(quote.supported_principal)),
    ];
    if inputs.adjustments.total() > 0.0 {
        fields.push(("Financed principal", format_money(quote.financed_principal)));
    }
    fields.extend([
        ("Total interest", format_money(quote.total_interest)),
        ("Total loan cost", format_money(quote.total_loan_cost)),
    ]);

    match format {
        OutputFormat::Csv => field_csv(&fields),
        _ => Ok(field_table(&fields)),
    }
}

use super::ui;
use crate::core::comparison::{ComparisonReport, ComparisonRequest, run_comparison};
use crate::core::{CurrencyRateProvider, PriceProvider};
use anyhow::{Context, Result};
use comfy_table::Table;

pub async fn run(
    request: &ComparisonRequest,
    price_provider: &(dyn PriceProvider + Send + Sync),
    rate_provider: &(dyn CurrencyRateProvider + Send + Sync),
    json: bool,
) -> Result<()> {
    // Rate series are only known once prices report their currency, so the
    // bar grows as downloads finish.
    let pb = ui::new_progress_bar(request.strategy.components.len() as u64);
    pb.set_message("Fetching monthly history");
    let on_fetch = || {
        if pb.position() >= pb.length().unwrap_or(0) {
            pb.inc_length(1);
        }
        pb.inc(1);
    };
    let report = run_comparison(request, price_provider, rate_provider, &on_fetch).await;
    pb.finish_and_clear();
    let report = report?;

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{out}");
        return Ok(());
    }

    println!(
        "\n{} vs savings at {:.2}% ({})",
        ui::style_text(&report.strategy, ui::StyleType::Title),
        request.savings.annual_rate * 100.0,
        request.home_currency.to_uppercase()
    );
    println!("{}", report_table(&report));
    for holding in &report.holdings {
        if let (Some(units), Some(value)) = (holding.units.last(), holding.values.last()) {
            println!(
                "{}",
                ui::style_text(
                    &format!(
                        "  {} ({:.0}%): {:.4} units worth {}",
                        holding.symbol,
                        holding.weight * 100.0,
                        units,
                        ui::format_money(*value)
                    ),
                    ui::StyleType::Subtle
                )
            );
        }
    }
    ui::print_separator();
    println!("{}", gap_summary(&report));
    Ok(())
}

fn report_table(report: &ComparisonReport) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Month"),
        ui::header_cell("Contributed"),
        ui::header_cell("Savings"),
        ui::header_cell("Strategy"),
        ui::header_cell("Gap"),
    ]);

    for (i, date) in report.dates.iter().enumerate() {
        let savings = report.savings[i];
        let strategy = report.strategy_value[i];
        table.add_row(vec![
            comfy_table::Cell::new(date.format("%Y-%m")),
            ui::money_cell(report.contributed[i]),
            ui::money_cell(savings),
            ui::money_cell(strategy),
            ui::gap_cell(strategy - savings),
        ]);
    }
    table
}

fn gap_summary(report: &ComparisonReport) -> String {
    let gap = report.terminal_gap;
    if gap > 0.0 {
        ui::style_text(
            &format!(
                "{} is ahead of savings by {}",
                report.strategy,
                ui::format_money(gap)
            ),
            ui::StyleType::Ahead,
        )
    } else {
        ui::style_text(
            &format!(
                "{} trails savings by {}",
                report.strategy,
                ui::format_money(-gap)
            ),
            ui::StyleType::Behind,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn report(gap: f64) -> ComparisonReport {
        ComparisonReport {
            strategy: "S&P 500".to_string(),
            dates: vec![
                NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
            ],
            contributed: vec![1000.0, 2000.0],
            savings: vec![1001.67, 2005.01],
            strategy_value: vec![1000.0, 2005.01 + gap],
            holdings: Vec::new(),
            terminal_gap: gap,
        }
    }

    #[test]
    fn test_report_table_has_row_per_month() {
        let mut table = report_table(&report(120.0));
        table.set_width(120);
        assert_eq!(table.row_iter().count(), 2);

        let rendered = table.to_string();
        assert!(rendered.contains("2021-02"));
        assert!(rendered.contains("2,005.01"));
    }

    #[test]
    fn test_gap_summary_wording() {
        console::set_colors_enabled(false);
        assert_eq!(
            gap_summary(&report(1500.0)),
            "S&P 500 is ahead of savings by 1,500.00"
        );
        assert_eq!(
            gap_summary(&report(-42.5)),
            "S&P 500 trails savings by 42.50"
        );
    }
}

use super::ui;
use crate::core::strategy::Strategy;
use comfy_table::{Cell, Table};

pub fn run(strategies: &[Strategy], default_key: &str) {
    if strategies.is_empty() {
        println!("No strategies configured.");
        return;
    }
    println!("{}", strategies_table(strategies, default_key));
}

fn strategies_table(strategies: &[Strategy], default_key: &str) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Key"),
        ui::header_cell("Name"),
        ui::header_cell("Components"),
    ]);

    for strategy in strategies {
        let key = if strategy.key.eq_ignore_ascii_case(default_key) {
            format!("{} (default)", strategy.key)
        } else {
            strategy.key.clone()
        };
        let components = strategy
            .components
            .iter()
            .map(|c| match &c.currency {
                Some(currency) => format!("{:.0}% {} [{}]", c.weight * 100.0, c.symbol, currency),
                None => format!("{:.0}% {}", c.weight * 100.0, c.symbol),
            })
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![Cell::new(key), Cell::new(&strategy.name), Cell::new(components)]);
    }
    table
}

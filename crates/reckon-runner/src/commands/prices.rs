use crate::cli::PricesArgs;
use crate::commands::table;
use crate::error::CliError;
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use reckon_core::config::Config;
use reckon_core::errors::DomainError;
use reckon_core::pricing::{core_count, PriceTable};

pub fn handle_prices(args: PricesArgs, config: &Config) -> Result<(), CliError> {
    let prices = config.price_table()?;
    if let Some(machine) = &args.machine {
        if !prices.machines.contains_key(machine) {
            return Err(DomainError::MissingPriceEntry {
                machine_class: machine.clone(),
                preemptible: false,
            }
            .into());
        }
    }
    println!(
        "Price table {} ({} per hour)",
        prices.version.cyan(),
        prices.currency
    );
    println!("{}", price_table(&prices, args.machine.as_deref()));
    Ok(())
}

pub(crate) fn price_table(prices: &PriceTable, machine: Option<&str>) -> Table {
    let mut t = table(&["Machine", "Cores", "Standard", "Preemptible"]);
    for (class, price) in &prices.machines {
        if machine.is_some_and(|m| m != class.as_str()) {
            continue;
        }
        t.add_row(vec![
            Cell::new(class).fg(Color::Yellow),
            Cell::new(
                core_count(class)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "?".to_string()),
            ),
            Cell::new(format!("{:.4}", price.standard)),
            Cell::new(format!("{:.4}", price.preemptible)),
        ]);
    }
    t
}

mod aggregate;
mod cli;
mod config;
mod currency;
mod db;
mod domain;
mod error;
mod listing;
mod period;
mod report;
mod store;
#[cfg(test)]
mod testutil;

use anyhow::{Result, bail};
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use crate::cli::{AddCmd, Cli, CloseCmd, Command, ListCmd, ReportArgs};
use crate::config::{AppConfig, app_paths, load_or_init_config, resolve_data_file};
use crate::db::Db;
use crate::domain::{normalize_currency, round_money, sign_factor};
use crate::error::ReportError;
use crate::period::{Accepts, DateWindow, parse_full_date, parse_month, resolve_window};
use crate::report::ReportRequest;
use crate::store::{AccountFilter, BudgetFilter, LedgerStore};

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MONETA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = app_paths(cli.home.clone())?;
    let (cfg, _) = load_or_init_config(&paths)?;
    let data_file = resolve_data_file(&paths, &cfg, cli.file.clone());
    let today = Local::now().date_naive();
    tracing::debug!(data_file = %data_file.display(), %today, "resolved ledger");

    match cli.command {
        Command::Init => {
            Db::init(&data_file)?;
            println!("Initialized ledger at {}", data_file.display());
        }
        Command::Add(args) => {
            let db = Db::open(&data_file)?;
            handle_add(&db, &cfg, args.cmd, today)?;
        }
        Command::Close(args) => {
            let db = Db::open(&data_file)?;
            handle_close(&db, args.cmd)?;
        }
        Command::List(args) => {
            let db = Db::open(&data_file)?;
            print_lines(&handle_list(&db, args.cmd, today)?);
        }
        Command::Report(args) => {
            let db = Db::open(&data_file)?;
            let kind = args.name.into();
            let req = report_request(args, &cfg);
            // The whole report is built before anything reaches stdout.
            let lines = report::run(&db, kind, &req, today)?;
            print_lines(&lines);
        }
    }
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn report_request(args: ReportArgs, cfg: &AppConfig) -> ReportRequest {
    ReportRequest {
        currency: args.currency.or_else(|| cfg.default_currency.clone()),
        date: args.date,
        account: args.account,
        category: args.category,
        main_category: args.main_category,
        main_category_type: args.main_category_type,
        account_currency: args.account_currency,
    }
}

fn required_currency(raw: Option<String>, cfg: &AppConfig) -> Result<String> {
    let currency = raw
        .or_else(|| cfg.default_currency.clone())
        .map(|c| normalize_currency(&c))
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ReportError::MissingRequiredParameter {
            name: "currency",
            hint: "Pass --currency or set default_currency in the config file.".to_string(),
        })?;
    Ok(currency)
}

fn handle_add(db: &Db, cfg: &AppConfig, cmd: AddCmd, today: NaiveDate) -> Result<()> {
    match cmd {
        AddCmd::Account {
            name,
            account_type,
            currency,
            description,
            institution,
        } => {
            let currency = required_currency(Some(currency), cfg)?;
            let id = db.add_account(&name, &description, &institution, account_type, &currency)?;
            println!("Added account '{name}' ({account_type}, {currency}) with id {id}.");
        }
        AddCmd::MainCategory { name, kind } => {
            let id = db.add_main_category(&name, kind)?;
            println!("Added main category '{name}' ({kind}) with id {id}.");
        }
        AddCmd::Category {
            name,
            main_category,
        } => {
            let main_id = db.resolve_main_category_id(&main_category)?;
            let id = db.add_category(&name, main_id)?;
            println!("Added category '{name}' with id {id}.");
        }
        AddCmd::Transaction {
            value,
            account,
            category,
            date,
            description,
        } => {
            let date = date
                .as_deref()
                .map(parse_full_date)
                .transpose()?
                .unwrap_or(today);
            let account_id = db.resolve_account_id(&account)?;
            let category_id = db.resolve_category_id(&category)?;
            let category = db.category(category_id)?;
            let signed = round_money(value * sign_factor(category.main_category_kind));
            let id = db.add_transaction(date, account_id, category_id, &description, signed)?;
            println!(
                "Added transaction {id}: {signed} on {} ({}).",
                date.format("%Y-%m-%d"),
                category.name
            );
        }
        AddCmd::Budget {
            value,
            category,
            month,
            currency,
        } => {
            let (year, month) = match month.as_deref() {
                Some(raw) => parse_month(raw)?,
                None => (today.year(), today.month()),
            };
            let currency = required_currency(currency, cfg)?;
            let category_id = db.resolve_category_id(&category)?;
            let category = db.category(category_id)?;
            let signed = round_money(value * sign_factor(category.main_category_kind));
            db.set_budget(year, month, category_id, signed, &currency)?;
            println!(
                "Set budget {year}-{month:02} for '{}': {signed} {currency}.",
                category.name
            );
        }
        AddCmd::Rate { from, to, rate } => {
            let from = normalize_currency(&from);
            let to = normalize_currency(&to);
            if from.is_empty() || to.is_empty() {
                bail!("Currency codes must not be empty");
            }
            if from == to {
                bail!("A rate needs two different currencies (got {from} twice)");
            }
            if rate <= Decimal::ZERO {
                bail!("Exchange rate must be > 0 (got {rate})");
            }
            db.set_rate(&from, &to, rate)?;
            println!("Set rate: 1 {from} = {rate} {to}.");
        }
    }
    Ok(())
}

fn handle_close(db: &Db, cmd: CloseCmd) -> Result<()> {
    match cmd {
        CloseCmd::Account { name } => {
            let id = db.resolve_account_id(&name)?;
            db.close_account(id)?;
            println!("Closed account {id}.");
        }
        CloseCmd::Category { name } => {
            let id = db.resolve_category_id(&name)?;
            db.close_category(id)?;
            println!("Closed category {id}.");
        }
        CloseCmd::MainCategory { name } => {
            let id = db.resolve_main_category_id(&name)?;
            db.close_main_category(id)?;
            println!("Closed main category {id}.");
        }
    }
    Ok(())
}

fn handle_list(db: &Db, cmd: ListCmd, today: NaiveDate) -> Result<Vec<String>> {
    let lines = match cmd {
        ListCmd::Accounts {
            all,
            account_type,
            currency,
            institution,
        } => {
            let filter = AccountFilter {
                account_type,
                currency: currency.as_deref().map(normalize_currency),
                institution,
                include_closed: all,
            };
            listing::accounts(&db.list_accounts(&filter)?)
        }
        ListCmd::MainCategories { all } => listing::main_categories(&db.list_main_categories(all)?),
        ListCmd::Categories { all } => listing::categories(&db.list_categories(all)?),
        ListCmd::Rates => listing::rates(&db.list_all_rates()?),
        ListCmd::Budgets { date, category } => {
            let window = resolve_window(
                date.as_deref(),
                Accepts::MonthOrYear,
                DateWindow::current_month(today),
            )?;
            let category_id = category
                .as_deref()
                .map(|p| db.resolve_category_id(p))
                .transpose()?;
            listing::budgets(&db.list_budgets(&BudgetFilter {
                category_id,
                window,
            })?)
        }
    };
    Ok(lines)
}

use crate::domain::{AccountType, MainCategoryType};
use crate::report::ReportKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "moneta")]
#[command(about = "Personal finance ledger with multi-currency reports", long_about = None)]
pub struct Cli {
    /// Override Moneta home directory (config/data subdirs will be created inside it).
    #[arg(long, env = "MONETA_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Ledger file to use instead of the configured one.
    #[arg(long, short = 'f', env = "MONETA_FILE", global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the ledger file, or bring an existing one up to date.
    Init,
    Add(AddArgs),
    Close(CloseArgs),
    List(ListArgs),
    Report(ReportArgs),
}

#[derive(Debug, Subcommand)]
pub enum AddCmd {
    Account {
        name: String,
        /// t/transactional, s/saving, p/property, i/investment, l/loan.
        #[arg(long = "type", short = 't', default_value = "transactional")]
        account_type: AccountType,
        #[arg(long, short = 'j')]
        currency: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, short = 'b', default_value = "")]
        institution: String,
    },
    MainCategory {
        name: String,
        /// c/cost, t/transfer, i/income.
        #[arg(long = "type", short = 'o')]
        kind: MainCategoryType,
    },
    Category {
        name: String,
        /// Part of the main category name; must match exactly one open main category.
        #[arg(long, short = 'm')]
        main_category: String,
    },
    /// Values are entered as positive amounts; costs are stored negative.
    Transaction {
        #[arg(allow_negative_numbers = true)]
        value: Decimal,
        #[arg(long, short = 'a')]
        account: String,
        #[arg(long, short = 'c')]
        category: String,
        /// YYYY-MM-DD. Defaults to today.
        #[arg(long, short = 'd')]
        date: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Sets the limit of a category for one month (replaces an existing one).
    Budget {
        #[arg(allow_negative_numbers = true)]
        value: Decimal,
        #[arg(long, short = 'c')]
        category: String,
        /// YYYY-MM. Defaults to the current month.
        #[arg(long, short = 'd')]
        month: Option<String>,
        /// Defaults to `default_currency` from the config.
        #[arg(long, short = 'j')]
        currency: Option<String>,
    },
    /// Sets how many units of TO one unit of FROM is worth.
    Rate { from: String, to: String, rate: Decimal },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[command(subcommand)]
    pub cmd: AddCmd,
}

#[derive(Debug, Subcommand)]
pub enum CloseCmd {
    Account { name: String },
    Category { name: String },
    MainCategory { name: String },
}

#[derive(Debug, Args)]
pub struct CloseArgs {
    #[command(subcommand)]
    pub cmd: CloseCmd,
}

#[derive(Debug, Subcommand)]
pub enum ListCmd {
    Accounts {
        /// Include closed accounts.
        #[arg(long)]
        all: bool,
        #[arg(long = "type", short = 't')]
        account_type: Option<AccountType>,
        #[arg(long, short = 'j')]
        currency: Option<String>,
        #[arg(long, short = 'b')]
        institution: Option<String>,
    },
    MainCategories {
        #[arg(long)]
        all: bool,
    },
    Categories {
        #[arg(long)]
        all: bool,
    },
    Rates,
    Budgets {
        /// YYYY-MM or YYYY. Defaults to the current month.
        #[arg(long, short = 'd')]
        date: Option<String>,
        #[arg(long, short = 'c')]
        category: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(subcommand)]
    pub cmd: ListCmd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportName {
    #[value(aliases = ["ab", "accounts-balance"])]
    Accounts,
    #[value(aliases = ["as", "assets-summary"])]
    Assets,
    #[value(aliases = ["tb", "transactions-balance"])]
    Transactions,
    #[value(aliases = ["cb", "categories-balance"])]
    Categories,
    #[value(aliases = ["mcb", "main-categories-balance"])]
    MainCategories,
    #[value(aliases = ["bc"])]
    BudgetCategories,
    #[value(aliases = ["bmc"])]
    BudgetMainCategories,
    #[value(aliases = ["nv"])]
    NetValue,
}

impl From<ReportName> for ReportKind {
    fn from(name: ReportName) -> Self {
        match name {
            ReportName::Accounts => ReportKind::Accounts,
            ReportName::Assets => ReportKind::Assets,
            ReportName::Transactions => ReportKind::Transactions,
            ReportName::Categories => ReportKind::Categories,
            ReportName::MainCategories => ReportKind::MainCategories,
            ReportName::BudgetCategories => ReportKind::BudgetCategories,
            ReportName::BudgetMainCategories => ReportKind::BudgetMainCategories,
            ReportName::NetValue => ReportKind::NetValue,
        }
    }
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    pub name: ReportName,

    /// YYYY-MM-DD, YYYY-MM or YYYY, depending on the report.
    #[arg(long, short = 'd')]
    pub date: Option<String>,

    /// Reporting currency. Defaults to `default_currency` from the config.
    #[arg(long, short = 'j')]
    pub currency: Option<String>,

    /// Part of an account name.
    #[arg(long, short = 'a')]
    pub account: Option<String>,

    /// Part of a category name.
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Part of a main category name.
    #[arg(long, short = 'm')]
    pub main_category: Option<String>,

    #[arg(long = "main-category-type", short = 'o')]
    pub main_category_type: Option<MainCategoryType>,

    /// Only transactions of accounts held in this currency.
    #[arg(long)]
    pub account_currency: Option<String>,
}

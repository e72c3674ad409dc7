use allowance_ledger::{
    config::{database, settings},
    core::{
        account::AccountId,
        category::{CategoryCatalog, TransactionKind},
        cycle::{Cycle, Frequency},
        goal::goal_icon,
        ledger::LedgerEngine,
        summary::CycleSummary,
        transaction::{IncomeFrequency, NewTransaction, Transaction},
    },
    errors::Result,
    store::SqliteStore,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Personal allowance ledger with weekly, biweekly or monthly cycles.
#[derive(Debug, Parser)]
#[command(name = "allowance-ledger", version, about)]
struct Cli {
    /// Account to operate on
    #[arg(long, global = true, env = "LEDGER_ACCOUNT")]
    account: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open a ledger for the account, starting its first cycle today
    Open {
        /// weekly, biweekly or monthly (defaults to the configured frequency)
        #[arg(long)]
        frequency: Option<Frequency>,
    },
    /// Record an income or expense
    Record {
        /// income or expense
        #[arg(long)]
        kind: TransactionKind,
        /// Positive amount, e.g. 12.50
        #[arg(long)]
        amount: Decimal,
        /// Category code or display name
        #[arg(long)]
        category: String,
        /// Transaction date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        note: Option<String>,
        /// once, weekly or monthly; income only
        #[arg(long)]
        income_frequency: Option<IncomeFrequency>,
    },
    /// Show the current cycle, rolling it over first if its period has ended
    Summary {
        /// Number of recent transactions to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List transactions, newest first
    List {
        /// Only transactions of this cycle
        #[arg(long)]
        cycle: Option<String>,
    },
    /// List cycles, or show one
    Cycles {
        #[arg(long)]
        id: Option<String>,
    },
    /// Close the current cycle if the given date lies in a later period
    Rollover {
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List the categories accepted for a kind
    Categories {
        #[arg(long)]
        kind: Option<TransactionKind>,
    },
    /// Show the icon for a savings-goal category
    Icon { category: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env before clap reads LEDGER_ACCOUNT
    dotenv().ok();
    let cli = Cli::parse();

    // 3. Load the application configuration
    let app_config = settings::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let catalog = app_config.catalog()?;

    // Commands that need neither an account nor the database
    match &cli.command {
        Command::Categories { kind } => {
            print_categories(&catalog, *kind);
            return Ok(());
        }
        Command::Icon { category } => {
            println!("{}", goal_icon(category));
            return Ok(());
        }
        _ => {}
    }

    let account = AccountId::from_session(cli.account.as_deref())
        .inspect_err(|_| error!("No account given; pass --account or set LEDGER_ACCOUNT"))?;

    // 4. Initialize database
    let database_url = database::get_database_url();
    let store = SqliteStore::connect(&database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    let engine = LedgerEngine::new(store, catalog);

    // 5. Run the command
    match cli.command {
        Command::Open { frequency } => {
            let frequency = frequency.unwrap_or(app_config.default_frequency);
            let cycle = engine.open_account(&account, frequency).await?;
            println!("Opened {account} with {frequency} cycles");
            print_cycle(&cycle);
        }
        Command::Record {
            kind,
            amount,
            category,
            date,
            note,
            income_frequency,
        } => {
            let new = NewTransaction {
                kind,
                amount,
                category,
                date,
                note,
                income_frequency,
            };
            let tx = engine.record_transaction(&account, new).await?;
            println!("Recorded #{} in {}", tx.id, tx.cycle_id);
            print_transaction(engine.catalog(), &tx);
        }
        Command::Summary { limit } => {
            let summary = engine.current_cycle_summary(&account).await?;
            print_summary(engine.catalog(), &summary, limit.unwrap_or(app_config.recent_limit));
        }
        Command::List { cycle } => {
            let transactions = engine.list_transactions(&account, cycle.as_deref()).await?;
            if transactions.is_empty() {
                println!("No transactions");
            }
            for tx in &transactions {
                print_transaction(engine.catalog(), tx);
            }
        }
        Command::Cycles { id: Some(id) } => {
            print_cycle(&engine.find_cycle(&account, &id).await?);
        }
        Command::Cycles { id: None } => {
            for cycle in engine.list_cycles(&account).await? {
                print_cycle(&cycle);
            }
        }
        Command::Rollover { date } => {
            let now = date.unwrap_or_else(|| engine.today());
            let rollover = engine.check_and_rollover_cycle(&account, now).await?;
            match (rollover.closed_cycle, rollover.new_cycle) {
                (Some(closed), Some(opened)) => {
                    println!("Closed {} with balance {}", closed.id, closed.balance);
                    print_cycle(&opened);
                }
                _ => println!("Current cycle is still open for {now}"),
            }
        }
        Command::Categories { .. } | Command::Icon { .. } => {}
    }

    Ok(())
}

fn print_cycle(cycle: &Cycle) {
    println!(
        "{:<28} {:<6} {} .. {}  income {:>10}  expenses {:>10}  balance {:>10}  ({})",
        cycle.id,
        if cycle.is_open() { "open" } else { "closed" },
        cycle.start_date,
        cycle.end_date(),
        cycle.total_income,
        cycle.total_expenses,
        cycle.balance,
        cycle.period_name(),
    );
}

fn print_transaction(catalog: &CategoryCatalog, tx: &Transaction) {
    println!(
        "#{:<5} {}  {:>10}  {:<14} {}",
        tx.id,
        tx.date,
        tx.signed_amount(),
        catalog.display_name(&tx.category).unwrap_or(&tx.category),
        tx.note.as_deref().unwrap_or(""),
    );
}

fn print_summary(catalog: &CategoryCatalog, summary: &CycleSummary, limit: usize) {
    let cycle = &summary.cycle;
    println!(
        "{} ({} .. {})",
        cycle.period_name, cycle.start_date, cycle.end_date
    );
    println!("  Income:   {}", summary.total_income);
    println!("  Expenses: {}", summary.total_expenses);
    println!("  Balance:  {}", summary.balance);

    if !summary.spending_by_category.is_empty() {
        println!("Spending by category:");
        for (category, amount) in &summary.spending_by_category {
            let name = catalog.display_name(category).unwrap_or(category);
            println!("  {name:<14} {amount:>10}");
        }
    }

    if !summary.recent_transactions.is_empty() {
        println!("Recent transactions:");
        for tx in summary.recent_transactions.iter().take(limit) {
            print_transaction(catalog, tx);
        }
    }
}

fn print_categories(catalog: &CategoryCatalog, kind: Option<TransactionKind>) {
    for category in catalog.sorted(kind) {
        let kind = catalog
            .kind_of(&category.code)
            .map_or("", TransactionKind::as_str);
        println!("{:<14} {:<8} {}", category.code, kind, category.display_name);
    }
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use signal_board_core::errors::CoreError;
use signal_board_core::logging::init_logging;
use signal_board_core::models::settings::BoardSettings;
use signal_board_core::models::table::{PageItem, SortDirection, SortField, TableView};
use signal_board_core::services::scanner_service::ScannerService;
use signal_board_core::storage::manager::StorageManager;
use signal_board_core::storage::memory::MemoryStore;
use signal_board_core::SignalBoard;

#[derive(Parser)]
#[command(name = "signal-board", version, about = "Browse stock signal files from the terminal")]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Folder holding the data tree (overrides the settings file)
    #[arg(long, global = true, env = "SIGNAL_BOARD_DATA")]
    data_root: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the directory listing as JSON
    Scan,
    /// Print one page of the signal table
    View(ViewArgs),
}

#[derive(Args)]
struct ViewArgs {
    /// File to show as <directory path>/<file>; defaults to All Data
    #[arg(long)]
    file: Option<String>,

    /// Only this signal type
    #[arg(long, default_value = "All")]
    signal: String,

    /// Ticker substring (case-insensitive)
    #[arg(long)]
    ticker: Option<String>,

    /// Only these dates (repeatable)
    #[arg(long = "date")]
    dates: Vec<String>,

    #[arg(long)]
    min_price: Option<f64>,

    #[arg(long)]
    max_price: Option<f64>,

    /// Sort column: ticker, signal, price or date
    #[arg(long)]
    sort: Option<SortField>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,

    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CoreError> {
    let mut settings = match &cli.config {
        Some(path) => StorageManager::load_settings(path)?,
        None => BoardSettings::default(),
    };
    if let Some(root) = cli.data_root {
        settings.data_root = root;
    }

    match cli.command {
        Command::Scan => scan(&settings),
        Command::View(args) => view(settings, args).await,
    }
}

fn scan(settings: &BoardSettings) -> Result<(), CoreError> {
    let listing = ScannerService::new(settings).listing(&settings.data_root)?;
    let json = serde_json::to_string_pretty(&listing)
        .map_err(|e| CoreError::Serialization(e.to_string()))?;
    println!("{json}");
    Ok(())
}

async fn view(settings: BoardSettings, args: ViewArgs) -> Result<(), CoreError> {
    let mut board = SignalBoard::with_local_files(settings, Arc::new(MemoryStore::new()))?;
    board.refresh_directories().await?;

    if let Some(path) = &args.file {
        let (directory, file) = path.rsplit_once('/').ok_or_else(|| {
            CoreError::ValidationError(format!("'{path}' is not <directory>/<file>"))
        })?;
        board.select_file(directory, file);
    }
    board.reload_data().await;

    let table = board.table_mut();
    table.set_signal_type(args.signal);
    if let Some(ticker) = args.ticker {
        table.set_ticker_search(ticker);
    }
    if !args.dates.is_empty() {
        table.set_dates(args.dates);
    }
    if args.min_price.is_some() || args.max_price.is_some() {
        let bounds = table.price_bounds();
        table.set_price_range(
            args.min_price.unwrap_or(bounds.low),
            args.max_price.unwrap_or(bounds.high),
        );
    }
    if let Some(field) = args.sort {
        table.toggle_sort(field);
        if args.desc {
            table.toggle_sort(field);
        }
    }
    table.set_page(args.page);

    println!("{}", board.selection().label());
    print_table(&board.view(), board.table().page_size(), board.table().sort_state().active());
    Ok(())
}

fn print_table(view: &TableView, page_size: usize, sort: Option<(SortField, SortDirection)>) {
    let header: Vec<String> = SortField::ALL
        .iter()
        .map(|f| match sort {
            Some((field, SortDirection::Asc)) if field == *f => format!("{} ^", f.label()),
            Some((field, SortDirection::Desc)) if field == *f => format!("{} v", f.label()),
            _ => f.label().to_string(),
        })
        .collect();
    println!(
        "   {:<12} {:<16} {:>12}  {:<12} Source",
        header[0], header[1], header[2], header[3]
    );

    if view.rows.is_empty() {
        println!("No data available");
        return;
    }
    for row in &view.rows {
        let r = &row.record;
        println!(
            "{}  {:<12} {:<16} {:>12}  {:<12} {}",
            if row.is_picked { '*' } else { ' ' },
            r.ticker_name,
            r.signal_type,
            format!("${}", r.stock_price),
            r.date,
            r.source_file.as_deref().unwrap_or("")
        );
    }

    if let Some(summary) = view.summary(page_size) {
        println!("{summary}");
    }
    if view.total_pages > 1 {
        let pages: Vec<String> = view
            .page_items
            .iter()
            .map(|item| match item {
                PageItem::Page(p) if *p == view.current_page => format!("[{p}]"),
                PageItem::Page(p) => p.to_string(),
                PageItem::Ellipsis => "...".to_string(),
            })
            .collect();
        println!("Pages: {}", pages.join(" "));
    }
}

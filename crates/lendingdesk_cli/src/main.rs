//! Lending desk command-line front end.
//!
//! # Responsibility
//! - Resolve configuration from the environment and command-line overrides.
//! - Drive roster, notification and statistics use cases against the backend.
//!
//! # Invariants
//! - Every notification attempt is printed with its outcome.
//! - An empty bulk selection is rejected before any send.

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use lendingdesk_core::notify::template::format_book_line;
use lendingdesk_core::{
    filter_roster, init_logging, ApiClient, ArchiveQuery, ArchivedNotification, Config,
    EmailTemplate, HttpBookRepository, HttpLendingRepository, HttpNotificationArchive,
    HttpNotificationChannel, HttpReaderRepository, LendingStatus, NotificationArchive,
    NotificationDispatcher, NotificationRecord, OverdueReader, RosterSelection, RosterService,
    StatusFilter,
};
use log::{error, info};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Overdue lending desk for the library backend")]
struct Cli {
    /// Backend API root; overrides LENDINGDESK_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token; overrides LENDINGDESK_ACCESS_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Librarian login email, used together with --password.
    #[arg(long, global = true, env = "LENDINGDESK_EMAIL")]
    email: Option<String>,

    #[arg(long, global = true, env = "LENDINGDESK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Rolling log directory; overrides LENDINGDESK_LOG_DIR.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error; overrides LENDINGDESK_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List readers holding overdue books.
    Roster {
        /// Case-insensitive match on name, email or book title.
        #[arg(long)]
        search: Option<String>,
    },
    /// Show the notice a reader would receive.
    Preview {
        reader_id: String,
        #[command(flatten)]
        template: TemplateArgs,
    },
    /// Send an overdue notice to one reader.
    Notify {
        reader_id: String,
        #[command(flatten)]
        template: TemplateArgs,
    },
    /// Send overdue notices to several readers in one batch.
    NotifyBulk {
        reader_ids: Vec<String>,
        /// Select every reader on the roster.
        #[arg(long, conflicts_with = "reader_ids")]
        all: bool,
        #[command(flatten)]
        template: TemplateArgs,
    },
    /// Send a test email to check the backend mail configuration.
    TestEmail {
        to: String,
        #[arg(long, default_value = "Library Staff")]
        name: String,
    },
    /// Print desk dashboard counters.
    Stats,
    /// List lending transactions by derived status.
    Lendings {
        /// all|active|returned|overdue
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Case-insensitive match on book id or reader id.
        #[arg(long)]
        search: Option<String>,
    },
    /// Inspect the backend's archive of sent notices.
    Archive {
        #[command(subcommand)]
        command: ArchiveCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ArchiveCommand {
    /// Print backend send counters and the most recent notices.
    Stats,
    /// List one page of archived notices.
    List {
        #[arg(long, default_value_t = ArchiveQuery::default().page)]
        page: u32,
        #[arg(long, default_value_t = ArchiveQuery::default().limit)]
        limit: u32,
    },
    /// Remove an archived notice.
    Delete { id: String },
    /// Ask the backend to resend an archived notice.
    Retry { id: String },
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Replaces the default subject line.
    #[arg(long)]
    subject: Option<String>,

    /// File whose contents replace the default message body.
    #[arg(long)]
    message_file: Option<PathBuf>,
}

impl TemplateArgs {
    fn resolve(&self) -> CliResult<EmailTemplate> {
        let mut template = EmailTemplate::default();
        if let Some(subject) = &self.subject {
            template.subject = subject.clone();
        }
        if let Some(path) = &self.message_file {
            template.message = fs::read_to_string(path)
                .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
        }
        Ok(template)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={}", err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        let log_dir = if log_dir.is_absolute() {
            log_dir.clone()
        } else {
            std::env::current_dir()?.join(log_dir)
        };
        init_logging(&config.log_level, &log_dir)?;
    }

    let client = ApiClient::from_config(&config)?;
    if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
        client.login(email, password)?;
    }
    info!(
        "event=cli_command module=cli status=start command={:?}",
        cli.command
    );

    let service = RosterService::new(
        HttpReaderRepository::new(&client),
        HttpBookRepository::new(&client),
        HttpLendingRepository::new(&client),
    );
    let channel = HttpNotificationChannel::new(&client);
    let mut dispatcher = NotificationDispatcher::new(&channel);

    match &cli.command {
        Command::Roster { search } => {
            let roster = service.overdue_roster(Utc::now())?;
            let shown = filter_roster(&roster, search.as_deref().unwrap_or_default());
            if shown.is_empty() {
                println!("No readers with overdue books.");
            }
            for reader in shown {
                print_reader(reader);
            }
        }
        Command::Preview {
            reader_id,
            template,
        } => {
            let roster = service.overdue_roster(Utc::now())?;
            let reader = find_reader(&roster, reader_id)?;
            let rendered = dispatcher.preview(reader, &template.resolve()?);
            println!("To: {} <{}>", reader.reader_name, reader.reader_email);
            println!("Subject: {}", rendered.subject);
            println!();
            println!("{}", rendered.message);
        }
        Command::Notify {
            reader_id,
            template,
        } => {
            let template = template.resolve()?;
            let roster = service.overdue_roster(Utc::now())?;
            let reader = find_reader(&roster, reader_id)?;
            let record = dispatcher.send_one(reader, &template);
            print_record(&record);
        }
        Command::NotifyBulk {
            reader_ids,
            all,
            template,
        } => {
            let template = template.resolve()?;
            let roster = service.overdue_roster(Utc::now())?;
            let selection = if *all {
                RosterSelection::all(&roster)
            } else {
                reader_ids.iter().cloned().collect()
            };
            let readers = selection.resolve(&roster)?;
            for record in dispatcher.send_many(&readers, &template) {
                print_record(&record);
            }
            let summary = dispatcher.summary();
            println!(
                "{} sent, {} failed, {} total",
                summary.sent, summary.failed, summary.total
            );
        }
        Command::TestEmail { to, name } => {
            let receipt = dispatcher
                .send_test(to, name)
                .map_err(|err| err.user_message())?;
            println!(
                "Test email sent to {to} (message id: {})",
                receipt.message_id.as_deref().unwrap_or("-")
            );
        }
        Command::Stats => {
            let stats = service.dashboard_stats(Utc::now())?;
            println!("Books:                {}", stats.total_books);
            println!("Readers:              {}", stats.registered_readers);
            println!("Lending transactions: {}", stats.lending_transactions);
            println!("Overdue:              {}", stats.overdue_transactions);
        }
        Command::Lendings { status, search } => {
            let now = Utc::now();
            let term = search.as_deref().unwrap_or_default();
            for transaction in service.search_lendings(*status, term, now)? {
                let state: LendingStatus = transaction.status_at(now);
                println!(
                    "{}  reader={} book={} due={} status={}",
                    transaction.id,
                    transaction.reader_id,
                    transaction.book_id,
                    transaction.due_date.format("%-m/%-d/%Y"),
                    state
                );
            }
        }
        Command::Archive { command } => {
            run_archive(&HttpNotificationArchive::new(&client), command)?;
        }
    }
    Ok(())
}

fn run_archive(archive: &impl NotificationArchive, command: &ArchiveCommand) -> CliResult<()> {
    match command {
        ArchiveCommand::Stats => {
            let stats = archive.stats()?;
            println!("Sent:       {}", stats.total_sent);
            println!("Failed:     {}", stats.total_failed);
            println!("Sent today: {}", stats.sent_today);
            for entry in &stats.recent_notifications {
                print_archived(entry);
            }
        }
        ArchiveCommand::List { page, limit } => {
            let result = archive.history(ArchiveQuery::new(*page, *limit))?;
            if result.notifications.is_empty() {
                println!("No archived notices on this page.");
            }
            for entry in &result.notifications {
                print_archived(entry);
            }
            println!(
                "page {} of {} ({} total)",
                result.page, result.total_pages, result.total
            );
        }
        ArchiveCommand::Delete { id } => {
            archive.delete(id)?;
            println!("Deleted notice {id}");
        }
        ArchiveCommand::Retry { id } => {
            let receipt = archive.retry(id).map_err(|err| err.user_message())?;
            println!(
                "Notice {id} resent (message id: {})",
                receipt.message_id.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> CliResult<Config> {
    let mut config = Config::from_env()?;
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(token) = &cli.token {
        config.access_token = Some(token.clone());
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }
    Ok(config)
}

fn find_reader<'a>(roster: &'a [OverdueReader], reader_id: &str) -> CliResult<&'a OverdueReader> {
    roster
        .iter()
        .find(|reader| reader.reader_id == reader_id)
        .ok_or_else(|| format!("reader `{reader_id}` has no overdue books").into())
}

fn print_reader(reader: &OverdueReader) {
    println!(
        "{}  {} <{}>  {} overdue",
        reader.reader_id, reader.reader_name, reader.reader_email, reader.total_overdue_books
    );
    for book in &reader.overdue_books {
        println!("    {}", format_book_line(book));
    }
}

fn print_archived(entry: &ArchivedNotification) {
    let sent_at = entry
        .sent_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}  [{}] {} <{}>  {}  {}",
        entry.id, entry.status, entry.reader_name, entry.reader_email, sent_at, entry.subject
    );
    if let Some(message) = &entry.error_message {
        println!("    {message}");
    }
}

fn print_record(record: &NotificationRecord) {
    match &record.error_message {
        Some(message) => println!(
            "[{}] {} <{}>: {}",
            record.status, record.reader_name, record.reader_email, message
        ),
        None => println!(
            "[{}] {} <{}>: {} book(s)",
            record.status,
            record.reader_name,
            record.reader_email,
            record.book_titles.len()
        ),
    }
}

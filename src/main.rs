//! CLI entry point for `mailkpi`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use clap::{Args, CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mailkpi::config::{self, Config};
use mailkpi::error::MailKpiError;
use mailkpi::export::table::ConsoleTable;
use mailkpi::mailbox::local::LocalMailStore;
use mailkpi::mailbox::{fetch_messages, parse_folder_filter, MailClient, MessageLimit};
use mailkpi::model::mail::MessageRecord;
use mailkpi::model::outgoing::OutgoingMail;
use mailkpi::report::selector::NamePattern;
use mailkpi::report::{generate_monthly_report, ReportRequest};

#[derive(Parser)]
#[command(
    name = "mailkpi",
    version,
    about = "Mail utilities and monthly support KPI reports from a local mail store"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Mail store root (one sub-directory per account)
    #[arg(long, global = true, env = "MAILKPI_MAIL_ROOT", value_name = "DIR")]
    mail_root: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Options shared by every command that reads mail.
#[derive(Args)]
struct MailboxArgs {
    /// Email address (account) to read from
    #[arg(long, value_name = "ADDR")]
    email_addr: Option<String>,

    /// Maximum number of emails, -1 means no limit
    #[arg(long, allow_negative_numbers = true, value_name = "N")]
    max_emails: Option<i64>,

    /// Filter by email folders (comma-separated)
    #[arg(long, value_name = "FOLDERS")]
    filter_by_folder: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an email through the mail store's outbox
    SendEmail {
        /// Recipient addresses, separated by ';'
        #[arg(long, value_name = "ADDRS")]
        to_addr: String,
        /// CC addresses, separated by ';' (defaults to the recipients)
        #[arg(long, value_name = "ADDRS")]
        cc_addr: Option<String>,
        /// Send on behalf of this address
        #[arg(long, value_name = "ADDR")]
        from_addr: Option<String>,
        /// Email subject
        #[arg(long)]
        subject: Option<String>,
        /// Email content (wrapped in HTML)
        #[arg(long)]
        content: Option<String>,
        /// File to attach
        #[arg(long, value_name = "PATH")]
        attachment: Option<PathBuf>,
    },
    /// List the subjects of recent emails
    GetEmailsSubject {
        #[command(flatten)]
        mailbox: MailboxArgs,
    },
    /// Summarize recent emails: subject, sender, recipients and received time
    GetEmailsSummary {
        #[command(flatten)]
        mailbox: MailboxArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Generate the monthly support KPI report from mailed extracts
    GenerateSfMonthlyReport {
        #[command(flatten)]
        mailbox: MailboxArgs,
        /// Attachment name prefix of the raw cases report
        /// (<report_name>-%Y-%m-%d-%H-%M-%S.csv)
        #[arg(long, value_name = "PREFIX")]
        raw_cases_report: Option<String>,
        /// Attachment name prefix of the raw survey report
        /// (<report_name>-%Y-%m-%d-%H-%M-%S.csv)
        #[arg(long, value_name = "PREFIX")]
        raw_survey_report: Option<String>,
        /// Month offset, zero or negative; 0 is the current month
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        month_offset: i32,
        /// Save the report as CSV at this path
        #[arg(long, value_name = "PATH")]
        output_file: Option<PathBuf>,
    },
    /// Write a configuration file with the default settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = config::load_config();
    if let Some(root) = cli.mail_root.clone() {
        config.mailbox.root = Some(root);
    }

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::SendEmail {
            to_addr,
            cc_addr,
            from_addr,
            subject,
            content,
            attachment,
        } => {
            let mail = OutgoingMail::new(
                &to_addr,
                cc_addr.as_deref(),
                from_addr.as_deref(),
                subject.as_deref().unwrap_or(&config.compose.subject),
                content.as_deref().unwrap_or(&config.compose.content),
                attachment,
            );
            cmd_send(&config, &mail)
        }
        Commands::GetEmailsSubject { mailbox } => cmd_subjects(&config, &mailbox),
        Commands::GetEmailsSummary { mailbox, json } => cmd_summary(&config, &mailbox, json),
        Commands::GenerateSfMonthlyReport {
            mailbox,
            raw_cases_report,
            raw_survey_report,
            month_offset,
            output_file,
        } => cmd_report(
            &config,
            &mailbox,
            raw_cases_report.or_else(|| config.report.case_prefix.clone()),
            raw_survey_report.or_else(|| config.report.survey_prefix.clone()),
            month_offset,
            output_file.as_deref(),
        ),
        Commands::InitConfig { force } => cmd_init_config(force),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailkpi.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn open_store(config: &Config) -> anyhow::Result<LocalMailStore> {
    Ok(LocalMailStore::open(config::mail_root(config))?)
}

/// Account, folders and limit for a retrieval, CLI values over config.
fn resolve_mailbox(
    config: &Config,
    args: &MailboxArgs,
) -> anyhow::Result<(String, Vec<String>, MessageLimit)> {
    let account = args
        .email_addr
        .clone()
        .or_else(|| config.mailbox.account.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("--email-addr is required (or set mailbox.account in the config)")
        })?;
    let folders = parse_folder_filter(
        args.filter_by_folder
            .as_deref()
            .unwrap_or(&config.mailbox.folders),
    );
    let limit = MessageLimit::from_arg(args.max_emails.unwrap_or(config.mailbox.max_emails))?;
    Ok((account, folders, limit))
}

/// Read messages with a spinner on stderr.
fn load_messages(
    client: &dyn MailClient,
    config: &Config,
    args: &MailboxArgs,
) -> anyhow::Result<Vec<MessageRecord>> {
    let (account, folders, limit) = resolve_mailbox(config, args)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(format!("Reading mail for {account}"));
    pb.enable_steady_tick(Duration::from_millis(100));

    let messages = fetch_messages(client, &account, &folders, limit);
    pb.finish_and_clear();
    Ok(messages?)
}

/// Compose and send one message.
fn cmd_send(config: &Config, mail: &OutgoingMail) -> anyhow::Result<()> {
    let store = open_store(config)?;
    store.send(mail)?;
    println!(
        "  Sent '{}' to {} ({})",
        mail.subject,
        mail.to.join("; "),
        store.outbox_path().display()
    );
    Ok(())
}

/// Print an `ID | Subject` table.
fn cmd_subjects(config: &Config, args: &MailboxArgs) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let messages = load_messages(&store, config, args)?;

    let mut table = ConsoleTable::new(["ID", "Subject"]);
    for (i, mail) in messages.iter().enumerate() {
        table.add_row([(i + 1).to_string(), mail.subject.clone()]);
    }
    println!("{table}");
    Ok(())
}

/// Print subject, sender, recipients and received time per message.
fn cmd_summary(config: &Config, args: &MailboxArgs, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let messages = load_messages(&store, config, args)?;
    let date_format = config.general.date_format.as_str();

    if json {
        let items: Vec<serde_json::Value> = messages
            .iter()
            .enumerate()
            .map(|(i, mail)| {
                serde_json::json!({
                    "id": i + 1,
                    "subject": mail.subject,
                    "sender_name": mail.sender_name,
                    "recipients": mail.recipients,
                    "received": mail.received.to_rfc3339(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    let mut table = ConsoleTable::new(["ID", "Subject", "SenderName", "Recipients", "ReceivedTime"]);
    for (i, mail) in messages.iter().enumerate() {
        table.add_row([
            (i + 1).to_string(),
            mail.subject.clone(),
            mail.sender_name.clone(),
            mail.recipient_list(),
            mail.received
                .with_timezone(&Local)
                .format(date_format)
                .to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Build the monthly report and print it or save it as CSV.
fn cmd_report(
    config: &Config,
    args: &MailboxArgs,
    case_prefix: Option<String>,
    survey_prefix: Option<String>,
    month_offset: i32,
    output_file: Option<&Path>,
) -> anyhow::Result<()> {
    if case_prefix.is_none() && survey_prefix.is_none() {
        println!("{}", MailKpiError::NoReportSpecified);
        return Ok(());
    }

    let request = ReportRequest {
        case_pattern: case_prefix.as_deref().map(NamePattern::new).transpose()?,
        survey_pattern: survey_prefix.as_deref().map(NamePattern::new).transpose()?,
        month_offset,
    };

    let store = open_store(config)?;
    let messages = load_messages(&store, config, args)?;
    let today = Local::now().date_naive();

    let report = match generate_monthly_report(
        &store,
        &messages,
        &request,
        today,
        config.report.work_dir.as_deref(),
    ) {
        Ok(report) => report,
        Err(e) if e.is_benign() => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match output_file {
        Some(path) => {
            let written = mailkpi::export::csv::export_report_csv(&report, path)?;
            println!("  Report saved to {}", written.display());
        }
        None => println!("{}", ConsoleTable::from(&report)),
    }
    Ok(())
}

/// Write the default configuration to the standard location.
fn cmd_init_config(force: bool) -> anyhow::Result<()> {
    let path = config::config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    config::save_config(&Config::default())?;
    println!("  Wrote {}", path.display());
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailkpi", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

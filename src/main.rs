use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use lexportal::config::PortalConfig;
use lexportal::portal::{PageOutcome, PageScope, Portal};
use lexportal::records::{Dispute, Document, NewCase, Record, Reminder, Report};
use lexportal::session::{Access, Role, Session};
use lexportal::settings::Settings;
use lexportal::store::RecordCollection;

/// Exit code used when the session check sends the user to login.
const EXIT_REDIRECT: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "lexportal", version, about = "Legal-services portal client")]
struct Cli {
    /// Settings file (TOML). Defaults to <config_dir>/lexportal/config.toml.
    #[arg(long, env = "LEXPORTAL_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store a session token obtained from the portal login.
    Login {
        #[arg(long, env = "LEXPORTAL_TOKEN", hide_env_values = true)]
        token: String,
        #[arg(long)]
        role: Role,
    },
    /// Log out on the backend and clear the stored session.
    Logout,
    /// Load the dashboard for a role.
    Dashboard {
        #[arg(long)]
        role: Role,
    },
    #[command(subcommand)]
    Profile(ProfileCommand),
    #[command(subcommand)]
    Cases(CaseCommand),
    /// List lawyers in the directory.
    Lawyers,
    #[command(subcommand)]
    Chat(ChatCommand),
    #[command(subcommand)]
    Reports(ReportCommand),
    #[command(subcommand)]
    Reminders(ReminderCommand),
    #[command(subcommand)]
    Disputes(DisputeCommand),
    #[command(subcommand)]
    Documents(DocumentCommand),
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    Show,
    /// Update profile fields, e.g. `--field phone=555-0100`.
    Update {
        #[arg(long = "field", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },
}

#[derive(Debug, Subcommand)]
enum CaseCommand {
    List,
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "general")]
        category: String,
    },
}

#[derive(Debug, Args)]
struct RoleArg {
    #[arg(long)]
    role: Role,
}

#[derive(Debug, Subcommand)]
enum ChatCommand {
    Send {
        text: String,
        #[command(flatten)]
        role: RoleArg,
    },
    History(RoleArg),
    Clear(RoleArg),
}

#[derive(Debug, Subcommand)]
enum ReportCommand {
    List,
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long)]
        case_id: Option<String>,
    },
    Finalize { id: String },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum ReminderCommand {
    List {
        /// Only pending reminders due within this many hours (overdue included).
        #[arg(long = "due-within-hours", value_parser = parse_hours)]
        due_within: Option<Duration>,
    },
    Add {
        #[arg(long)]
        title: String,
        /// RFC 3339 timestamp, e.g. 2026-03-02T09:00:00Z.
        #[arg(long, value_parser = parse_rfc3339)]
        due: DateTime<Utc>,
        #[arg(long)]
        notes: Option<String>,
    },
    Complete { id: String },
    Dismiss { id: String },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum DisputeCommand {
    List,
    Add {
        #[arg(long)]
        title: String,
        #[arg(long = "party")]
        parties: Vec<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    Advance { id: String },
    Close { id: String },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum DocumentCommand {
    List,
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        kind: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    Sign { id: String },
    Archive { id: String },
    Delete { id: String },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("field name must not be empty".to_string());
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{raw}': {e}"))
}

fn parse_hours(raw: &str) -> Result<Duration, String> {
    let hours: i64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("invalid hour count '{raw}': {e}"))?;
    Duration::try_hours(hours).ok_or_else(|| format!("hour count {hours} is out of range"))
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lexportal=info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Why the command stopped before doing its work.
enum Halt {
    Redirect(String),
}

fn redirect(to: &str, reason: impl std::fmt::Display) -> Halt {
    eprintln!("Not signed in ({reason}). Please log in at {to}.");
    Halt::Redirect(to.to_string())
}

/// Any stored session, regardless of role.
fn require_session(portal: &Portal) -> Result<Session, Halt> {
    portal
        .guard()
        .current()
        .ok_or_else(|| redirect(portal.guard().login_route(), "no valid session"))
}

fn require_role(portal: &Portal, role: Role) -> Result<Session, Halt> {
    match portal.guard().check_session(role) {
        Access::Authorized(session) => Ok(session),
        Access::Redirect { to, reason } => Err(redirect(&to, reason)),
    }
}

fn mutate<T, F>(collection: &mut RecordCollection<T>, id: &str, change: F) -> anyhow::Result<()>
where
    T: Record + Serialize,
    F: FnOnce(&mut T) -> Result<(), lexportal::error::RecordError>,
{
    let updated = collection.update(id, change)?;
    print_json(updated)
}

async fn run(cli: Cli) -> anyhow::Result<Result<(), Halt>> {
    let settings_path = cli.config.clone().or_else(Settings::default_path);
    let settings = match &settings_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let config = PortalConfig::resolve(&settings).context("invalid configuration")?;
    let portal = Portal::from_config(config);

    macro_rules! session {
        ($e:expr) => {
            match $e {
                Ok(session) => session,
                Err(halt) => return Ok(Err(halt)),
            }
        };
    }

    match cli.command {
        Command::Login { token, role } => {
            portal
                .guard()
                .login(&SecretString::from(token), role)
                .context("failed to store session")?;
            println!("Signed in as {role}.");
        }
        Command::Logout => {
            portal.logout().await.context("failed to clear session")?;
            println!("Signed out.");
        }
        Command::Dashboard { role } => {
            let scope = PageScope::new();
            match portal.mount(role, &scope).await {
                PageOutcome::Ready(dashboard) => print_json(&dashboard)?,
                PageOutcome::Redirect { to, reason } => return Ok(Err(redirect(&to, reason))),
                PageOutcome::Failed(panel) => {
                    anyhow::bail!("{} (retry by running the command again)", panel.message)
                }
                PageOutcome::Cancelled => anyhow::bail!("dashboard load was cancelled"),
            }
        }
        Command::Profile(cmd) => {
            let session = session!(require_session(&portal));
            let client = portal.api_client(&session);
            match cmd {
                ProfileCommand::Show => print_json(&client.get_profile().await?)?,
                ProfileCommand::Update { fields } => {
                    let changes = fields
                        .into_iter()
                        .map(|(k, v)| (k, serde_json::Value::String(v)))
                        .collect();
                    print_json(&client.update_profile(&changes).await?)?;
                }
            }
        }
        Command::Cases(cmd) => {
            let session = session!(require_session(&portal));
            let client = portal.api_client(&session);
            match cmd {
                CaseCommand::List => print_json(&client.list_cases().await?)?,
                CaseCommand::Create {
                    title,
                    description,
                    category,
                } => {
                    let case = NewCase {
                        title,
                        description,
                        category,
                    };
                    print_json(&client.create_case(&case).await?)?;
                }
            }
        }
        Command::Lawyers => {
            let session = session!(require_session(&portal));
            print_json(&portal.api_client(&session).list_lawyers().await?)?;
        }
        Command::Chat(cmd) => match cmd {
            ChatCommand::Send { text, role } => {
                let session = session!(require_role(&portal, role.role));
                let chat = portal.assistant(&session);
                let reply = chat.send(&text).await?;
                println!("{}", reply.content);
            }
            ChatCommand::History(role) => {
                let session = session!(require_role(&portal, role.role));
                for msg in portal.assistant(&session).messages() {
                    println!("[{}] {}: {}", msg.timestamp, msg.role.as_str(), msg.content);
                }
            }
            ChatCommand::Clear(role) => {
                let session = session!(require_role(&portal, role.role));
                portal.assistant(&session).clear_history();
                println!("Chat history cleared.");
            }
        },
        Command::Reports(cmd) => {
            session!(require_session(&portal));
            let mut reports = portal.reports();
            match cmd {
                ReportCommand::List => print_json(reports.list())?,
                ReportCommand::Add {
                    title,
                    body,
                    case_id,
                } => print_json(reports.insert(Report::draft(title, body, case_id))?)?,
                ReportCommand::Finalize { id } => mutate(&mut reports, &id, Report::finalize)?,
                ReportCommand::Delete { id } => print_json(&reports.remove(&id)?)?,
            }
        }
        Command::Reminders(cmd) => {
            session!(require_session(&portal));
            let mut reminders = portal.reminders();
            match cmd {
                ReminderCommand::List { due_within } => match due_within {
                    Some(window) => {
                        let now = Utc::now();
                        let due: Vec<&Reminder> = reminders
                            .list()
                            .iter()
                            .filter(|r| r.due_within(now, window))
                            .collect();
                        print_json(&due)?;
                    }
                    None => print_json(reminders.list())?,
                },
                ReminderCommand::Add { title, due, notes } => {
                    print_json(reminders.insert(Reminder::new(title, due, notes))?)?
                }
                ReminderCommand::Complete { id } => mutate(&mut reminders, &id, Reminder::complete)?,
                ReminderCommand::Dismiss { id } => mutate(&mut reminders, &id, Reminder::dismiss)?,
                ReminderCommand::Delete { id } => print_json(&reminders.remove(&id)?)?,
            }
        }
        Command::Disputes(cmd) => {
            session!(require_session(&portal));
            let mut disputes = portal.disputes();
            match cmd {
                DisputeCommand::List => print_json(disputes.list())?,
                DisputeCommand::Add {
                    title,
                    parties,
                    description,
                } => print_json(disputes.insert(Dispute::open(title, parties, description))?)?,
                DisputeCommand::Advance { id } => mutate(&mut disputes, &id, Dispute::advance)?,
                DisputeCommand::Close { id } => mutate(&mut disputes, &id, Dispute::close)?,
                DisputeCommand::Delete { id } => print_json(&disputes.remove(&id)?)?,
            }
        }
        Command::Documents(cmd) => {
            session!(require_session(&portal));
            let mut documents = portal.documents();
            match cmd {
                DocumentCommand::List => print_json(documents.list())?,
                DocumentCommand::Add {
                    title,
                    kind,
                    content,
                } => print_json(documents.insert(Document::draft(title, kind, content))?)?,
                DocumentCommand::Sign { id } => mutate(&mut documents, &id, Document::sign)?,
                DocumentCommand::Archive { id } => mutate(&mut documents, &id, Document::archive)?,
                DocumentCommand::Delete { id } => print_json(&documents.remove(&id)?)?,
            }
        }
    }

    Ok(Ok(()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(Halt::Redirect(to))) => {
            tracing::debug!(to = %to, "Redirected to login");
            ExitCode::from(EXIT_REDIRECT)
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use chrono::Duration;

    use super::{Cli, Command, parse_field, parse_hours, parse_rfc3339};
    use lexportal::session::Role;

    #[test]
    fn login_parses_role() {
        let cli = Cli::try_parse_from(["lexportal", "login", "--token", "t", "--role", "lawyer"])
            .expect("parse");
        let Command::Login { role, .. } = cli.command else {
            panic!("expected login");
        };
        assert_eq!(role, Role::Lawyer);
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Cli::try_parse_from(["lexportal", "dashboard", "--role", "judge"]).is_err());
    }

    #[test]
    fn parse_field_splits_on_first_equals() {
        assert_eq!(
            parse_field("address=1 Main St, Apt=4").expect("valid"),
            ("address".to_string(), "1 Main St, Apt=4".to_string())
        );
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn parse_rfc3339_normalizes_to_utc() {
        let dt = parse_rfc3339("2026-03-02T10:00:00+02:00").expect("valid");
        assert_eq!(dt.to_rfc3339(), "2026-03-02T08:00:00+00:00");
        assert!(parse_rfc3339("tomorrow").is_err());
    }

    #[test]
    fn parse_hours_rejects_out_of_range_windows() {
        assert_eq!(parse_hours("48").expect("valid"), Duration::hours(48));
        assert!(parse_hours("3000000000000").is_err());
        assert!(parse_hours("soon").is_err());
    }

    #[test]
    fn due_within_hours_flag_is_parsed_before_use() {
        assert!(
            Cli::try_parse_from(["lexportal", "reminders", "list", "--due-within-hours", "24"])
                .is_ok()
        );
        assert!(
            Cli::try_parse_from([
                "lexportal",
                "reminders",
                "list",
                "--due-within-hours",
                "9223372036854775807",
            ])
            .is_err()
        );
    }
}

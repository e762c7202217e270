#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use clap::{Args, Parser, Subcommand};
use projello_client::config::Config;
use projello_client::domain::project::{NewProject, NewTask, ProjectUpdate, TaskPriority, TaskQuery};
use projello_client::domain::user::UserPayload;
use projello_client::{AppError, Client, telemetry};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Parser)]
#[command(name = "projello", version, about = "Command-line client for the Projello board backend")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        email: String,
        #[arg(long, env = "PROJELLO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Drop the stored session and notification cache
    Logout,
    /// Create an account (does not log in)
    Register(ProfileArgs),
    /// Exchange the refresh token for a new pair
    Refresh,
    /// Print the stored profile
    Whoami,
    /// Print session and notification status
    Status,
    /// Update the profile of the logged-in user
    EditProfile(ProfileArgs),
    /// Change the password of the logged-in user
    ChangePassword {
        #[arg(long, env = "PROJELLO_OLD_PASSWORD", hide_env_values = true)]
        old: String,
        #[arg(long, env = "PROJELLO_NEW_PASSWORD", hide_env_values = true)]
        new: String,
    },
    #[command(subcommand)]
    Project(ProjectCommand),
    #[command(subcommand)]
    Phase(PhaseCommand),
    #[command(subcommand)]
    Task(TaskCommand),
    #[command(subcommand)]
    Notify(NotifyCommand),
    /// Show or set the collapsed sidebar flag
    Sidebar {
        #[arg(long)]
        collapsed: Option<bool>,
    },
}

#[derive(Debug, Args)]
struct ProfileArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "PROJELLO_PASSWORD", hide_env_values = true, default_value = "")]
    password: String,
    #[arg(long)]
    username: String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
}

impl From<ProfileArgs> for UserPayload {
    fn from(args: ProfileArgs) -> Self {
        Self {
            email: args.email,
            password: args.password,
            username: args.username,
            first_name: args.first_name,
            last_name: args.last_name,
        }
    }
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    List,
    Show { id: String },
    Create {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum PhaseCommand {
    List { project_id: String },
    Create { project_id: String, title: String },
    Rename { project_id: String, phase_id: String, title: String },
    Delete { phase_id: String },
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    List {
        project_id: String,
        #[arg(long)]
        phase: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    Show { id: String },
    Create {
        project_id: String,
        phase_id: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
    },
    /// Move a task to a position within a phase of its project's board
    Move {
        project_id: String,
        task_id: String,
        phase_id: String,
        #[arg(long, default_value_t = 0)]
        position: u32,
    },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum NotifyCommand {
    /// Print the cached notifications
    List,
    /// Fetch notifications from the backend into the cache
    Sync,
    Read { id: String },
    ReadAll,
    Delete { id: String },
    /// Remove the cached list
    Clear,
}

fn parse_priority(raw: &str) -> Result<TaskPriority, String> {
    match raw.to_ascii_lowercase().as_str() {
        "low" => Ok(TaskPriority::Low),
        "medium" => Ok(TaskPriority::Medium),
        "high" => Ok(TaskPriority::High),
        other => Err(format!("unknown priority '{other}' (expected low, medium or high)")),
    }
}

#[allow(clippy::print_stdout)]
fn emit<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(client: &Client, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => emit(&client.session.login(&email, &password).await?),
        Command::Logout => {
            client.session.logout();
            emit(&json!({ "loggedIn": false }))
        }
        Command::Register(profile) => {
            client.session.register(&profile.into()).await?;
            emit(&json!({ "registered": true }))
        }
        Command::Refresh => {
            if !client.session.refresh_tokens().await {
                return Err(AppError::RefreshFailed.into());
            }
            emit(&json!({ "refreshed": true, "user": client.session.current_user() }))
        }
        Command::Whoami => emit(&client.session.current_user()),
        Command::Status => {
            let expiry = client
                .session
                .token_expiry()
                .and_then(|at| at.format(&time::format_description::well_known::Rfc3339).ok());
            emit(&json!({
                "loggedIn": client.session.is_logged_in(),
                "user": client.session.current_user(),
                "tokenExpiry": expiry,
                "unread": client.notifications.cache().unread_count(),
            }))
        }
        Command::EditProfile(profile) => {
            let reply = client.session.edit_user(&profile.into()).await?;
            emit(&json!({ "message": reply, "user": client.session.current_user() }))
        }
        Command::ChangePassword { old, new } => {
            let reply = client.session.change_password(&old, &new).await?;
            emit(&json!({ "message": reply }))
        }
        Command::Project(command) => run_project(client, command).await,
        Command::Phase(command) => run_phase(client, command).await,
        Command::Task(command) => run_task(client, command).await,
        Command::Notify(command) => run_notify(client, command).await,
        Command::Sidebar { collapsed } => {
            if let Some(collapsed) = collapsed {
                client.preferences.set_sidebar_collapsed(collapsed);
            }
            emit(&json!({ "sidebarCollapsed": client.preferences.sidebar_collapsed() }))
        }
    }
}

async fn run_project(client: &Client, command: ProjectCommand) -> anyhow::Result<()> {
    let projects = &client.projects;
    match command {
        ProjectCommand::List => emit(&projects.list().await?),
        ProjectCommand::Show { id } => emit(&projects.get(&id).await?),
        ProjectCommand::Create { title, description } => {
            emit(&projects.create(&NewProject { title, description }).await?)
        }
        ProjectCommand::Update { id, title, description } => {
            emit(&projects.update(&id, &ProjectUpdate { title, description }).await?)
        }
        ProjectCommand::Delete { id } => {
            projects.delete(&id).await?;
            emit(&json!({ "deleted": id }))
        }
    }
}

async fn run_phase(client: &Client, command: PhaseCommand) -> anyhow::Result<()> {
    let phases = &client.phases;
    match command {
        PhaseCommand::List { project_id } => emit(&phases.list(&project_id).await?),
        PhaseCommand::Create { project_id, title } => emit(&phases.create(&project_id, &title).await?),
        PhaseCommand::Rename { project_id, phase_id, title } => {
            emit(&phases.rename(&project_id, &phase_id, &title).await?)
        }
        PhaseCommand::Delete { phase_id } => {
            phases.delete(&phase_id).await?;
            emit(&json!({ "deleted": phase_id }))
        }
    }
}

async fn run_task(client: &Client, command: TaskCommand) -> anyhow::Result<()> {
    let tasks = &client.tasks;
    match command {
        TaskCommand::List { project_id, phase, search } => {
            emit(&tasks.list(&TaskQuery { project_id, phase_id: phase, q: search }).await?)
        }
        TaskCommand::Show { id } => emit(&tasks.get(&id).await?),
        TaskCommand::Create { project_id, phase_id, title, description, due, priority } => {
            let task = NewTask { project_id, phase_id, title, description, expiration_date: due, priority };
            emit(&tasks.create(&task).await?)
        }
        TaskCommand::Move { project_id, task_id, phase_id, position } => {
            let mut board = client.boards.load(&project_id).await?;
            let moved = client.boards.move_task(&mut board, &task_id, &phase_id, position).await?;
            emit(&moved)
        }
        TaskCommand::Delete { id } => {
            tasks.delete(&id).await?;
            emit(&json!({ "deleted": id }))
        }
    }
}

async fn run_notify(client: &Client, command: NotifyCommand) -> anyhow::Result<()> {
    let notifications = &client.notifications;
    let cache = notifications.cache();
    match command {
        NotifyCommand::List => emit(&json!({
            "notifications": cache.local_notifications(),
            "readIds": cache.read_ids(),
            "unread": cache.unread_count(),
        })),
        NotifyCommand::Sync => emit(&notifications.sync().await?),
        NotifyCommand::Read { id } => {
            cache.mark_read(&id);
            emit(&json!({ "unread": cache.unread_count() }))
        }
        NotifyCommand::ReadAll => {
            cache.mark_all_read();
            emit(&json!({ "unread": cache.unread_count() }))
        }
        NotifyCommand::Delete { id } => {
            notifications.delete(&id).await?;
            emit(&json!({ "deleted": id, "unread": cache.unread_count() }))
        }
        NotifyCommand::Clear => {
            cache.delete_all_notifications();
            emit(&json!({ "cleared": true }))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let telemetry_guard = telemetry::init_telemetry(&cli.config.telemetry)?;

    let client = Client::new(&cli.config.api, &cli.config.storage)?;
    tracing::debug!(api_url = %cli.config.api.api_url, "client ready");

    let outcome = run(&client, cli.command).await;
    if let Err(e) = &outcome {
        tracing::debug!(error = %e, "command failed");
    }

    telemetry_guard.shutdown();
    outcome
}

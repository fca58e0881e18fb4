use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use taskboard_client::net::auth::{AuthService, Credentials, Registration};
use taskboard_client::net::notifications::NotificationService;
use taskboard_client::net::projects::ProjectService;
use taskboard_client::net::tasks::{TaskFilters, TaskService};
use taskboard_client::net::types::{EntityId, TaskStatus};
use taskboard_client::router::{Navigation, Router, resolve};
use taskboard_client::session::{FileTokenStore, LogNavigator};
use taskboard_client::state::auth::AuthStore;
use taskboard_client::state::notifications::NotificationStore;
use taskboard_client::state::projects::ProjectStore;
use taskboard_client::state::tasks::TaskStore;
use taskboard_client::{ApiClient, ApiError, ClientConfig, SessionContext};

const DEFAULT_TOKEN_FILE: &str = ".taskboard/token";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0}")]
    Request(String),
    #[error("not logged in; run `taskboard login` first")]
    NotLoggedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "taskboard", about = "Taskboard project and task API CLI")]
struct Cli {
    /// Overrides `TASKBOARD_API_URL`.
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long, env = "TASKBOARD_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKBOARD_PASSWORD", hide_env_values = true)]
        password: String,
        /// Defaults to `--password`.
        #[arg(long)]
        password_confirmation: Option<String>,
    },
    Logout,
    Whoami,
    Refresh,
    /// Show how the navigation guard treats a path.
    Route {
        path: String,
    },
    Projects(ProjectsCommand),
    Tasks(TasksCommand),
    Notifications(NotificationsCommand),
}

#[derive(Args, Debug)]
struct ProjectsCommand {
    #[command(subcommand)]
    command: ProjectsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProjectsSubcommand {
    List,
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: String,
    },
    AddMember {
        project_id: String,
        user_id: String,
    },
    RemoveMember {
        project_id: String,
        user_id: String,
    },
}

#[derive(Args, Debug)]
struct TasksCommand {
    #[command(subcommand)]
    command: TasksSubcommand,
}

#[derive(Subcommand, Debug)]
enum TasksSubcommand {
    List(TaskFilterArgs),
    /// Task counts per status column.
    Board(TaskFilterArgs),
    Show {
        id: String,
    },
    Create {
        #[arg(long, help = "Task fields as a JSON object")]
        data: String,
    },
    Update {
        id: String,
        #[arg(long, help = "Task fields as a JSON object")]
        data: String,
    },
    Status {
        id: String,
        status: TaskStatus,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct TaskFilterArgs {
    #[arg(long)]
    project_id: Option<String>,
    #[arg(long)]
    status: Option<TaskStatus>,
    #[arg(long)]
    assigned_to: Option<String>,
}

impl From<TaskFilterArgs> for TaskFilters {
    fn from(args: TaskFilterArgs) -> Self {
        Self {
            project_id: args.project_id.as_deref().map(entity_id),
            status: args.status,
            assigned_to: args.assigned_to.as_deref().map(entity_id),
        }
    }
}

#[derive(Args, Debug)]
struct NotificationsCommand {
    #[command(subcommand)]
    command: NotificationsSubcommand,
}

#[derive(Subcommand, Debug)]
enum NotificationsSubcommand {
    List {
        #[arg(long, default_value_t = false)]
        unread: bool,
    },
    Read {
        id: String,
    },
    ReadAll,
    Delete {
        id: String,
    },
}

struct CliContext {
    session: Arc<SessionContext>,
    api: ApiClient,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config.base_url = ClientConfig::with_base_url(base_url)?.base_url;
    }
    let token_file = cli.token_file.unwrap_or_else(default_token_file);
    let session = Arc::new(SessionContext::new(
        Arc::new(FileTokenStore::new(token_file)),
        Arc::new(LogNavigator),
        config.auth_failure.clone(),
    ));
    let api = ApiClient::new(&config, session.clone())?;
    let ctx = CliContext { session, api };

    match cli.command {
        Command::Login { email, password } => {
            let auth = AuthStore::new(AuthService::new(ctx.api.clone()));
            auth.login_user(&Credentials::new(email, password)).await?;
            print_user(&auth)
        }
        Command::Register { name, email, password, password_confirmation } => {
            let auth = AuthStore::new(AuthService::new(ctx.api.clone()));
            let password_confirmation = password_confirmation.unwrap_or_else(|| password.clone());
            auth.register_user(&Registration { name, email, password, password_confirmation }).await?;
            print_user(&auth)
        }
        Command::Logout => {
            AuthStore::new(AuthService::new(ctx.api.clone())).logout_user().await;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => run_whoami(&ctx).await,
        Command::Refresh => {
            AuthService::new(ctx.api.clone()).refresh_token().await?;
            println!("token refreshed");
            Ok(())
        }
        Command::Route { path } => {
            run_route(&ctx, &path);
            Ok(())
        }
        Command::Projects(projects) => run_projects(&ctx, projects).await,
        Command::Tasks(tasks) => run_tasks(&ctx, tasks).await,
        Command::Notifications(notifications) => run_notifications(&ctx, notifications).await,
    }
}

fn default_token_file() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(DEFAULT_TOKEN_FILE)
}

async fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    let auth = AuthStore::new(AuthService::new(ctx.api.clone()));
    if !auth.is_authenticated() {
        return Err(CliError::NotLoggedIn);
    }
    if auth.fetch_current_user().await.is_none() {
        return Err(failure(auth.snapshot().error));
    }
    print_user(&auth)
}

fn run_route(ctx: &CliContext, path: &str) {
    let name = resolve(path).map_or("(unknown)", |m| m.route.name);
    match Router::new(ctx.session.clone()).navigate(path) {
        Navigation::Proceed => println!("{path} [{name}] -> proceed"),
        Navigation::Redirect(target) => println!("{path} [{name}] -> redirect {target}"),
    }
}

async fn run_projects(ctx: &CliContext, projects: ProjectsCommand) -> Result<(), CliError> {
    let store = ProjectStore::new(ProjectService::new(ctx.api.clone()));
    match projects.command {
        ProjectsSubcommand::List => {
            store.fetch_projects().await;
            let state = store.snapshot();
            check(state.error)?;
            print_json(&state.projects)
        }
        ProjectsSubcommand::Show { id } => {
            let project = store.fetch_project(&entity_id(&id)).await;
            let project = project.ok_or_else(|| failure(store.snapshot().error))?;
            print_json(&project)
        }
        ProjectsSubcommand::Create { name, description } => {
            let body = fields([("name", Some(name)), ("description", description)]);
            print_json(&store.create_project(&body).await?)
        }
        ProjectsSubcommand::Update { id, name, description } => {
            let body = fields([("name", name), ("description", description)]);
            print_json(&store.update_project(&entity_id(&id), &body).await?)
        }
        ProjectsSubcommand::Delete { id } => {
            store.delete_project(&entity_id(&id)).await?;
            println!("deleted project {id}");
            Ok(())
        }
        ProjectsSubcommand::AddMember { project_id, user_id } => {
            let member = store.add_member(&entity_id(&project_id), &entity_id(&user_id)).await?;
            print_json(&member)
        }
        ProjectsSubcommand::RemoveMember { project_id, user_id } => {
            store.remove_member(&entity_id(&project_id), &entity_id(&user_id)).await?;
            println!("removed user {user_id} from project {project_id}");
            Ok(())
        }
    }
}

async fn run_tasks(ctx: &CliContext, tasks: TasksCommand) -> Result<(), CliError> {
    let store = TaskStore::new(TaskService::new(ctx.api.clone()));
    match tasks.command {
        TasksSubcommand::List(filters) => {
            store.fetch_tasks(&filters.into()).await;
            let state = store.snapshot();
            check(state.error)?;
            print_json(&state.tasks)
        }
        TasksSubcommand::Board(filters) => {
            store.fetch_tasks(&filters.into()).await;
            let state = store.snapshot();
            check(state.error.clone())?;
            println!("todo         {}", state.todo_tasks().len());
            println!("in_progress  {}", state.in_progress_tasks().len());
            println!("completed    {}", state.completed_tasks().len());
            Ok(())
        }
        TasksSubcommand::Show { id } => {
            let task = store.fetch_task(&entity_id(&id)).await;
            let task = task.ok_or_else(|| failure(store.snapshot().error))?;
            print_json(&task)
        }
        TasksSubcommand::Create { data } => {
            let body = serde_json::from_str::<Value>(&data)?;
            print_json(&store.create_task(&body).await?)
        }
        TasksSubcommand::Update { id, data } => {
            let body = serde_json::from_str::<Value>(&data)?;
            print_json(&store.update_task(&entity_id(&id), &body).await?)
        }
        TasksSubcommand::Status { id, status } => {
            print_json(&store.update_task_status(&entity_id(&id), status).await?)
        }
        TasksSubcommand::Delete { id } => {
            store.delete_task(&entity_id(&id)).await?;
            println!("deleted task {id}");
            Ok(())
        }
    }
}

async fn run_notifications(ctx: &CliContext, notifications: NotificationsCommand) -> Result<(), CliError> {
    let store = NotificationStore::new(NotificationService::new(ctx.api.clone()));
    match notifications.command {
        NotificationsSubcommand::List { unread } => {
            if unread {
                store.fetch_unread_notifications().await;
            } else {
                store.fetch_notifications().await;
            }
            let state = store.snapshot();
            check(state.error.clone())?;
            eprintln!("{} unread", state.unread_count());
            print_json(&state.notifications)
        }
        NotificationsSubcommand::Read { id } => print_json(&store.mark_as_read(&entity_id(&id)).await?),
        NotificationsSubcommand::ReadAll => {
            store.mark_all_as_read().await?;
            println!("all notifications marked read");
            Ok(())
        }
        NotificationsSubcommand::Delete { id } => {
            store.delete_notification(&entity_id(&id)).await?;
            println!("deleted notification {id}");
            Ok(())
        }
    }
}

/// JSON object holding only the fields that were given.
fn fields<const N: usize>(pairs: [(&str, Option<String>); N]) -> Value {
    let map: Map<String, Value> = pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_owned(), Value::String(v))))
        .collect();
    Value::Object(map)
}

fn check(error: Option<String>) -> Result<(), CliError> {
    error.map_or(Ok(()), |message| Err(CliError::Request(message)))
}

fn failure(error: Option<String>) -> CliError {
    CliError::Request(error.unwrap_or_else(|| "request failed".to_owned()))
}

fn print_user(auth: &AuthStore) -> Result<(), CliError> {
    match auth.user() {
        Some(user) => {
            print_json(&user)?;
            println!("admin: {}  manager: {}", auth.is_admin(), auth.is_manager());
        }
        None => println!("logged in"),
    }
    Ok(())
}

/// Ids typed on the command line go out as numbers when they look like one.
fn entity_id(raw: &str) -> EntityId {
    let Ok(id) = raw.parse();
    id
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    page::ProjectDraft,
    store::{DataAccess, SqliteStore, StoreError},
    types::{Session, Task},
};

const SCHEMA_VERSION: &str = "cli.v1";

#[derive(Debug, Clone, Subcommand)]
pub enum RootCommand {
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProjectCommand {
    List,
    Create(ProjectCreateArgs),
    Edit(ProjectEditArgs),
    Delete(ProjectDeleteArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum TaskCommand {
    List(TaskListArgs),
    Add(TaskAddArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ProjectCreateArgs {
    #[arg(long, value_name = "TEXT")]
    pub name: String,

    #[arg(long, value_name = "TEXT", default_value = "")]
    pub description: String,
}

#[derive(Debug, Clone, Args)]
pub struct ProjectEditArgs {
    #[arg(long, value_name = "PROJECT_ID")]
    pub id: Uuid,

    #[arg(long, value_name = "TEXT")]
    pub name: Option<String>,

    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ProjectDeleteArgs {
    #[arg(long, value_name = "PROJECT_ID")]
    pub id: Uuid,
}

#[derive(Debug, Clone, Args)]
pub struct TaskListArgs {
    #[arg(long, value_name = "NAME")]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TaskAddArgs {
    #[arg(long, value_name = "TEXT")]
    pub title: String,

    #[arg(long, value_name = "NAME")]
    pub project: String,

    #[arg(long, value_name = "TEXT", default_value = "")]
    pub description: String,
}

pub async fn run(
    store: &SqliteStore,
    session: Option<&Session>,
    command: RootCommand,
    json_output: bool,
    quiet: bool,
) -> i32 {
    let user = session.map(|session| session.uid.clone());
    match execute(store, session, command).await {
        Ok(output) => {
            print_success(output, user.as_deref(), json_output, quiet);
            0
        }
        Err(err) => {
            print_error(&err, json_output);
            err.exit_code
        }
    }
}

#[derive(Debug)]
struct CommandOutput {
    command: &'static str,
    data: Value,
    text: String,
}

#[derive(Debug)]
struct CliError {
    exit_code: i32,
    code: &'static str,
    message: String,
}

type CliResult<T> = Result<T, CliError>;

async fn execute(
    store: &SqliteStore,
    session: Option<&Session>,
    command: RootCommand,
) -> CliResult<CommandOutput> {
    let Some(session) = session else {
        return Err(usage_error(
            "USER_REQUIRED",
            "no user configured; pass --user or set `user` in settings",
        ));
    };

    match command {
        RootCommand::Project { command } => match command {
            ProjectCommand::List => project_list(store, session).await,
            ProjectCommand::Create(args) => project_create(store, session, args).await,
            ProjectCommand::Edit(args) => project_edit(store, session, args).await,
            ProjectCommand::Delete(args) => project_delete(store, session, args).await,
        },
        RootCommand::Task { command } => match command {
            TaskCommand::List(args) => task_list(store, session, args).await,
            TaskCommand::Add(args) => task_add(store, session, args).await,
        },
    }
}

async fn project_list(store: &SqliteStore, session: &Session) -> CliResult<CommandOutput> {
    let projects = store.list_projects(session).await.map_err(store_error)?;
    let tasks = store.list_tasks(session).await.map_err(store_error)?;

    let rows = projects
        .iter()
        .map(|project| {
            let task_count = tasks.iter().filter(|task| task.belongs_to(project)).count();
            vec![
                short_id(project.id),
                project.name.clone(),
                task_count.to_string(),
                single_line(&project.description),
            ]
        })
        .collect::<Vec<_>>();

    let text = if rows.is_empty() {
        "No projects found.".to_string()
    } else {
        render_text_table(&["ID", "Name", "Tasks", "Description"], &rows)
    };

    Ok(CommandOutput {
        command: "project list",
        data: json!({ "projects": to_json(&projects)? }),
        text,
    })
}

async fn project_create(
    store: &SqliteStore,
    session: &Session,
    args: ProjectCreateArgs,
) -> CliResult<CommandOutput> {
    let name = args.name.as_str();
    store
        .create_project(session, name, &args.description)
        .await
        .map_err(store_error)?;

    // Mutations return nothing; the newest project with this name is ours.
    let created = store
        .list_projects(session)
        .await
        .map_err(store_error)?
        .into_iter()
        .rev()
        .find(|project| project.name == name)
        .ok_or_else(|| runtime_error("created project was not found on re-read"))?;
    info!(project_id = %created.id, "project created from cli");

    Ok(CommandOutput {
        command: "project create",
        text: format!("Created project {} ({})", created.name, created.id),
        data: json!({ "project": to_json(&created)? }),
    })
}

async fn project_edit(
    store: &SqliteStore,
    session: &Session,
    args: ProjectEditArgs,
) -> CliResult<CommandOutput> {
    if args.name.is_none() && args.description.is_none() {
        return Err(usage_error(
            "NOTHING_TO_UPDATE",
            "pass --name and/or --description",
        ));
    }

    let current = store
        .get_project(session, args.id)
        .await
        .map_err(store_error)?;
    // Same fallback as the TUI edit form: an empty value keeps the stored one.
    let draft = ProjectDraft {
        name: args.name.unwrap_or_default(),
        description: args.description.unwrap_or_default(),
    };
    let (name, description) = draft.resolve_against(&current);

    store
        .edit_project(session, args.id, name, description)
        .await
        .map_err(store_error)?;
    let updated = store
        .get_project(session, args.id)
        .await
        .map_err(store_error)?;

    Ok(CommandOutput {
        command: "project edit",
        text: format!("Updated project {} ({})", updated.name, updated.id),
        data: json!({ "project": to_json(&updated)? }),
    })
}

async fn project_delete(
    store: &SqliteStore,
    session: &Session,
    args: ProjectDeleteArgs,
) -> CliResult<CommandOutput> {
    let existed = match store.get_project(session, args.id).await {
        Ok(_) => true,
        Err(err) if err.is_not_found() => false,
        Err(err) => return Err(store_error(err)),
    };

    store
        .delete_project(session, args.id)
        .await
        .map_err(store_error)?;

    let text = if existed {
        format!("Deleted project {}", args.id)
    } else {
        format!("Project {} did not exist; nothing deleted", args.id)
    };

    Ok(CommandOutput {
        command: "project delete",
        data: json!({ "id": args.id, "deleted": existed }),
        text,
    })
}

async fn task_list(
    store: &SqliteStore,
    session: &Session,
    args: TaskListArgs,
) -> CliResult<CommandOutput> {
    let tasks = store.list_tasks(session).await.map_err(store_error)?;
    let filtered = tasks
        .into_iter()
        .filter(|task| {
            args.project
                .as_deref()
                .is_none_or(|project| task.project == project)
        })
        .collect::<Vec<Task>>();

    let rows = filtered
        .iter()
        .map(|task| {
            vec![
                short_id(task.id),
                task.project.clone(),
                if task.completed { "done" } else { "open" }.to_string(),
                single_line(&task.title),
            ]
        })
        .collect::<Vec<_>>();

    let text = if rows.is_empty() {
        "No tasks found.".to_string()
    } else {
        render_text_table(&["ID", "Project", "State", "Title"], &rows)
    };

    Ok(CommandOutput {
        command: "task list",
        data: json!({ "tasks": to_json(&filtered)? }),
        text,
    })
}

async fn task_add(
    store: &SqliteStore,
    session: &Session,
    args: TaskAddArgs,
) -> CliResult<CommandOutput> {
    let title = args.title.trim();
    if title.is_empty() {
        return Err(usage_error("TITLE_REQUIRED", "task title cannot be empty"));
    }

    let projects = store.list_projects(session).await.map_err(store_error)?;
    if !projects.iter().any(|project| project.name == args.project) {
        return Err(not_found_error(
            "PROJECT_NOT_FOUND",
            format!("no project named '{}'", args.project),
        ));
    }

    let task = store
        .add_task(session, title, &args.description, &args.project)
        .await
        .map_err(store_error)?;

    Ok(CommandOutput {
        command: "task add",
        text: format!("Added task {} to {}", task.title, task.project),
        data: json!({ "task": to_json(&task)? }),
    })
}

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn single_line(text: &str) -> String {
    text.replace('\n', " ")
}

fn to_json(value: &impl Serialize) -> CliResult<Value> {
    serde_json::to_value(value).map_err(runtime_error)
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = vec![format_table_row(headers.iter().copied(), &widths)];
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(format_table_row(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn format_table_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn usage_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 2,
        code,
        message: message.into(),
    }
}

fn not_found_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 3,
        code,
        message: message.into(),
    }
}

fn runtime_error(err: impl std::fmt::Display) -> CliError {
    CliError {
        exit_code: 1,
        code: "RUNTIME_ERROR",
        message: err.to_string(),
    }
}

fn store_error(err: StoreError) -> CliError {
    match err {
        StoreError::ProjectNotFound(_) => not_found_error("PROJECT_NOT_FOUND", err.to_string()),
        other => runtime_error(other),
    }
}

fn success_payload(output: &CommandOutput, user: Option<&str>) -> Value {
    json!({
        "schema_version": SCHEMA_VERSION,
        "ok": true,
        "command": output.command,
        "user": user,
        "data": output.data
    })
}

fn error_payload(err: &CliError) -> Value {
    json!({
        "schema_version": SCHEMA_VERSION,
        "ok": false,
        "error": {
            "code": err.code,
            "message": err.message
        }
    })
}

fn print_success(output: CommandOutput, user: Option<&str>, json_output: bool, quiet: bool) {
    if json_output {
        let payload = success_payload(&output, user);
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => println!("{value}"),
            Err(_) => println!("{payload}"),
        }
        return;
    }

    if quiet {
        return;
    }

    if output.text.is_empty() {
        println!("ok");
    } else {
        println!("{}", output.text);
    }
}

fn print_error(err: &CliError, json_output: bool) {
    error!(code = err.code, message = %err.message, "cli command failed");

    if json_output {
        let payload = error_payload(err);
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => eprintln!("{value}"),
            Err(_) => eprintln!("{payload}"),
        }
        return;
    }

    eprintln!("error[{}]: {}", err.code, err.message);
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::open_in_memory().await.expect("store")
    }

    fn ada() -> Session {
        Session::new("ada")
    }

    fn create(name: &str, description: &str) -> RootCommand {
        RootCommand::Project {
            command: ProjectCommand::Create(ProjectCreateArgs {
                name: name.to_string(),
                description: description.to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn create_then_list_reports_project() {
        let store = store().await;
        let output = execute(&store, Some(&ada()), create("Garden", "veg"))
            .await
            .expect("create should succeed");
        assert_eq!(output.command, "project create");
        assert_eq!(output.data["project"]["name"], "Garden");

        let listed = execute(
            &store,
            Some(&ada()),
            RootCommand::Project {
                command: ProjectCommand::List,
            },
        )
        .await
        .expect("list should succeed");
        assert_eq!(listed.data["projects"].as_array().map(Vec::len), Some(1));
        assert!(listed.text.contains("Garden"));
    }

    #[tokio::test]
    async fn missing_user_is_usage_error() {
        let store = store().await;
        let err = execute(&store, None, create("Garden", ""))
            .await
            .expect_err("should require a user");
        assert_eq!(err.exit_code, 2);
        assert_eq!(err.code, "USER_REQUIRED");
    }

    #[tokio::test]
    async fn names_are_stored_as_given() {
        let store = store().await;
        let blank = execute(&store, Some(&ada()), create("", ""))
            .await
            .expect("empty name is accepted");
        assert_eq!(blank.data["project"]["name"], "");

        let padded = execute(&store, Some(&ada()), create("  Garden ", ""))
            .await
            .expect("padded name is accepted");
        assert_eq!(padded.data["project"]["name"], "  Garden ");
        assert_eq!(store.list_projects(&ada()).await.expect("list").len(), 2);
    }

    #[tokio::test]
    async fn edit_with_empty_values_keeps_stored_fields() {
        let store = store().await;
        let created = execute(&store, Some(&ada()), create("Garden", "veg"))
            .await
            .expect("create");
        let id: Uuid = serde_json::from_value(created.data["project"]["id"].clone()).expect("id");

        let output = execute(
            &store,
            Some(&ada()),
            RootCommand::Project {
                command: ProjectCommand::Edit(ProjectEditArgs {
                    id,
                    name: Some(String::new()),
                    description: Some(String::new()),
                }),
            },
        )
        .await
        .expect("edit");
        assert_eq!(output.data["project"]["name"], "Garden");
        assert_eq!(output.data["project"]["description"], "veg");

        let output = execute(
            &store,
            Some(&ada()),
            RootCommand::Project {
                command: ProjectCommand::Edit(ProjectEditArgs {
                    id,
                    name: Some(" Shed ".to_string()),
                    description: None,
                }),
            },
        )
        .await
        .expect("edit");
        assert_eq!(output.data["project"]["name"], " Shed ");
        assert_eq!(output.data["project"]["description"], "veg");
    }

    #[tokio::test]
    async fn edit_unknown_project_is_not_found() {
        let store = store().await;
        let err = execute(
            &store,
            Some(&ada()),
            RootCommand::Project {
                command: ProjectCommand::Edit(ProjectEditArgs {
                    id: Uuid::new_v4(),
                    name: Some("x".to_string()),
                    description: None,
                }),
            },
        )
        .await
        .expect_err("unknown id should fail");
        assert_eq!(err.exit_code, 3);
        assert_eq!(err.code, "PROJECT_NOT_FOUND");
    }

    #[tokio::test]
    async fn edit_keeps_fields_that_were_not_passed() {
        let store = store().await;
        let created = execute(&store, Some(&ada()), create("Garden", "veg"))
            .await
            .expect("create");
        let id: Uuid = serde_json::from_value(created.data["project"]["id"].clone()).expect("id");

        let output = execute(
            &store,
            Some(&ada()),
            RootCommand::Project {
                command: ProjectCommand::Edit(ProjectEditArgs {
                    id,
                    name: None,
                    description: Some("herbs".to_string()),
                }),
            },
        )
        .await
        .expect("edit");
        assert_eq!(output.data["project"]["name"], "Garden");
        assert_eq!(output.data["project"]["description"], "herbs");
    }

    #[tokio::test]
    async fn delete_missing_project_is_ok() {
        let store = store().await;
        let output = execute(
            &store,
            Some(&ada()),
            RootCommand::Project {
                command: ProjectCommand::Delete(ProjectDeleteArgs { id: Uuid::new_v4() }),
            },
        )
        .await
        .expect("delete should succeed");
        assert_eq!(output.data["deleted"], false);
    }

    #[tokio::test]
    async fn task_add_requires_existing_project_name() {
        let store = store().await;
        let add = |project: &str| RootCommand::Task {
            command: TaskCommand::Add(TaskAddArgs {
                title: "Plant beans".to_string(),
                project: project.to_string(),
                description: String::new(),
            }),
        };

        let err = execute(&store, Some(&ada()), add("Garden"))
            .await
            .expect_err("no such project yet");
        assert_eq!(err.exit_code, 3);

        execute(&store, Some(&ada()), create("Garden", ""))
            .await
            .expect("create");
        execute(&store, Some(&ada()), add("Garden"))
            .await
            .expect("add task");

        let listed = execute(
            &store,
            Some(&ada()),
            RootCommand::Task {
                command: TaskCommand::List(TaskListArgs {
                    project: Some("garden".to_string()),
                }),
            },
        )
        .await
        .expect("list");
        assert_eq!(listed.text, "No tasks found.");
    }

    #[test]
    fn store_errors_map_to_exit_codes() {
        let not_found = store_error(StoreError::ProjectNotFound(Uuid::nil()));
        assert_eq!(not_found.exit_code, 3);

        let runtime = store_error(StoreError::fetch("projects", "disk on fire"));
        assert_eq!(runtime.exit_code, 1);
        assert_eq!(runtime.code, "RUNTIME_ERROR");
    }

    #[test]
    fn payloads_carry_envelope_fields() {
        let output = CommandOutput {
            command: "project list",
            data: json!({ "projects": [] }),
            text: String::new(),
        };
        let success = success_payload(&output, Some("ada"));
        assert_eq!(success["schema_version"], SCHEMA_VERSION);
        assert_eq!(success["ok"], true);
        assert_eq!(success["user"], "ada");

        let failure = error_payload(&usage_error("USER_REQUIRED", "nope"));
        assert_eq!(failure["ok"], false);
        assert_eq!(failure["error"]["code"], "USER_REQUIRED");
    }

    #[test]
    fn text_table_aligns_columns() {
        let table = render_text_table(
            &["ID", "Name"],
            &[vec!["abc".to_string(), "Garden".to_string()]],
        );
        let lines = table.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "ID   Name");
        assert_eq!(lines[1], "---  ------");
        assert_eq!(lines[2], "abc  Garden");
    }
}

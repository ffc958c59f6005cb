use std::fmt::Write as _;

use anyhow::{Result, anyhow, bail};
use taskflow_app::{Session, UserProfile, avatar_url};
use taskflow_core::{
    CompletionFilter, Priority, SortKey, Task, TaskDraft, TaskFilter, TaskId, TaskPatch,
    TaskQuery, TaskStats,
};
use time::macros::format_description;
use time::{Date, UtcOffset};

use super::AppContext;
use crate::{Command, OutputFormat};

pub async fn run(command: Command, ctx: &AppContext) -> Result<()> {
    match command {
        Command::Signup {
            name,
            email,
            password,
        } => {
            ctx.account.register(&name, &email, &password).await?;
            println!("Registration successful! You can now log in.");
        }
        Command::Login {
            email,
            password,
            remember,
        } => {
            let remember = remember.unwrap_or(ctx.config.session.remember);
            let session = ctx.account.login(&email, &password, remember).await?;
            println!("Logged in as {} <{}>", session.name, session.email);
        }
        Command::Logout => {
            ctx.account.logout()?;
            println!("Logged out");
        }
        Command::Whoami { format } => {
            signed_in(ctx).await?;
            let profile = ctx.account.profile().await?;
            match format {
                OutputFormat::Table => print!("{}", render_profile(&profile)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
            }
        }
        Command::Profile { name, email } => {
            signed_in(ctx).await?;
            ctx.account.update_profile(&name, &email).await?;
            println!("Profile updated");
        }
        Command::Password {
            current,
            new,
            confirm,
        } => {
            signed_in(ctx).await?;
            ctx.account.change_password(&current, &new, &confirm).await?;
            println!("Password changed");
        }
        Command::Dashboard { filter, recent } => handle_dashboard(ctx, filter, recent).await?,
        Command::Ls {
            filter,
            status,
            sort,
            format,
        } => handle_ls(ctx, filter, status, sort, format).await?,
        Command::Stats { format } => {
            load_board(ctx).await?;
            let stats = ctx.board.stats();
            match format {
                OutputFormat::Table => print!("{}", render_stats(&stats)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            }
        }
        Command::Add {
            title,
            description,
            priority,
            due,
            completed,
        } => handle_add(ctx, title, description, priority, due, completed).await?,
        Command::Edit {
            id,
            title,
            description,
            priority,
            due,
            completed,
        } => {
            let patch = TaskPatch {
                title,
                description,
                priority,
                due_date: due,
                completed,
            };
            if patch.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            signed_in(ctx).await?;
            ctx.board.update(&id, &patch).await?;
            println!("updated task: {id}");
        }
        Command::Rm { id } => {
            signed_in(ctx).await?;
            ctx.board.delete(&id).await?;
            println!("deleted task: {id}");
        }
        Command::Toggle { id } => handle_toggle(ctx, &id).await?,
    }
    Ok(())
}

async fn signed_in(ctx: &AppContext) -> Result<Session> {
    ctx.account
        .restore()
        .await?
        .ok_or_else(|| anyhow!("not logged in; run `taskflow login --remember true` first"))
}

async fn load_board(ctx: &AppContext) -> Result<()> {
    signed_in(ctx).await?;
    ctx.board.refresh().await?;
    Ok(())
}

async fn handle_dashboard(ctx: &AppContext, filter: TaskFilter, recent: usize) -> Result<()> {
    let session = signed_in(ctx).await?;
    ctx.board.refresh().await?;
    let offset = ctx.board.clock().offset;

    println!("Welcome back, {}", session.name);
    print!("{}", render_stats(&ctx.board.stats()));

    let tasks = ctx.board.query(&TaskQuery::new().filter(filter));
    println!();
    println!("{} ({})", filter.label(), tasks.len());
    print!("{}", render_task_table(&tasks, offset));

    println!();
    println!("Recent activity");
    print!("{}", render_task_table(&ctx.board.recent(recent), offset));
    Ok(())
}

async fn handle_ls(
    ctx: &AppContext,
    filter: TaskFilter,
    status: CompletionFilter,
    sort: Option<SortKey>,
    format: OutputFormat,
) -> Result<()> {
    load_board(ctx).await?;
    let query = TaskQuery::new().completion(status).filter(filter).sort(sort);
    let tasks = ctx.board.query(&query);
    match format {
        OutputFormat::Table => print!("{}", render_task_table(&tasks, ctx.board.clock().offset)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
    }
    Ok(())
}

async fn handle_add(
    ctx: &AppContext,
    title: String,
    description: Option<String>,
    priority: Priority,
    due: Date,
    completed: bool,
) -> Result<()> {
    signed_in(ctx).await?;
    let draft = TaskDraft {
        title,
        description: description.unwrap_or_default(),
        priority,
        due_date: due,
        completed,
    };
    match ctx.board.create(&draft).await? {
        Some(task) => println!("created task: {}", task.id),
        None => println!("created task: {}", draft.title),
    }
    Ok(())
}

async fn handle_toggle(ctx: &AppContext, id: &TaskId) -> Result<()> {
    load_board(ctx).await?;
    let completed = ctx.board.toggle_complete(id).await?;
    let state = if completed { "completed" } else { "pending" };
    println!("task {id} marked {state}");
    Ok(())
}

fn render_profile(profile: &UserProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} <{}>", profile.name, profile.email);
    if !profile.id.is_empty() {
        let _ = writeln!(out, "id: {}", profile.id);
    }
    let _ = writeln!(out, "avatar: {}", avatar_url(&profile.name));
    out
}

fn render_stats(stats: &TaskStats) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Total: {} | Completed: {} | Pending: {} | Completion: {}%",
        stats.total, stats.completed, stats.pending, stats.completion_percentage
    );
    let by_priority: Vec<_> = Priority::ALL
        .iter()
        .rev()
        .map(|&priority| format!("{priority}: {}", stats.by_priority(priority)))
        .collect();
    let _ = writeln!(out, "{}", by_priority.join(" | "));
    out
}

fn render_task_table(tasks: &[Task], offset: UtcOffset) -> String {
    if tasks.is_empty() {
        return "No tasks found\n".to_owned();
    }

    let mut out = String::new();
    out.push_str("ID | Status | Priority | Due | Title | Subtasks\n");
    out.push_str("-- | ------ | -------- | --- | ----- | --------\n");
    for task in tasks {
        let status = if task.completed { "done" } else { "pending" };
        let priority = task.priority.map_or("-", Priority::as_str);
        let due = task
            .due_day(offset)
            .and_then(|day| day.format(format_description!("[year]-[month]-[day]")).ok())
            .unwrap_or_else(|| "-".to_owned());
        let subtasks = if task.subtasks.is_empty() {
            "-".to_owned()
        } else {
            let done = task.subtasks.iter().filter(|sub| sub.completed).count();
            format!(
                "{done}/{} ({}%)",
                task.subtasks.len(),
                task.subtask_progress()
            )
        };
        let _ = writeln!(
            out,
            "{} | {status} | {priority} | {due} | {} | {subtasks}",
            task.id, task.title
        );
    }
    out
}

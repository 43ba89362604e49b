use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dashboard_core::{
    creation::FormField,
    item_edit::DELETE_PROMPT,
    load_settings, ConfirmDelete, Dashboard, DashboardEvent, DeleteOutcome, HttpSpyCatApi,
    RefreshOutcome,
};
use shared::domain::SpyCatId;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "spy-cats", about = "Manage the spy cat roster")]
struct Args {
    /// Base origin of the spy cat API; overrides dashboard.toml and env.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the roster and total team salary.
    List {
        /// Retry once without asking when the fetch fails.
        #[arg(long)]
        retry: bool,
    },
    /// Show a single spy cat.
    Show { id: i64 },
    /// Add a spy cat.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        breed: String,
        #[arg(long = "years")]
        years_of_experience: String,
        #[arg(long)]
        salary: String,
    },
    /// Change a spy cat's salary.
    SetSalary { id: i64, salary: String },
    /// Remove a spy cat.
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

/// A delete decision collected before the delete flow starts.
struct Answered(bool);

impl ConfirmDelete for Answered {
    fn confirm(&self, _cat: SpyCatId, _prompt: &str) -> bool {
        self.0
    }
}

/// Runs a blocking question on the blocking pool so no runtime worker waits
/// on the terminal.
async fn off_runtime<F>(question: F) -> Result<bool>
where
    F: FnOnce() -> bool + Send + 'static,
{
    tokio::task::spawn_blocking(question)
        .await
        .context("prompt task failed")
}

fn ask(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_notices(rx: &mut broadcast::Receiver<DashboardEvent>) {
    while let Ok(event) = rx.try_recv() {
        if let DashboardEvent::Notice(notice) = event {
            eprintln!("{}", render::render_notice(&notice));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }

    let api = HttpSpyCatApi::new(&settings).context("failed to set up api client")?;
    tracing::debug!(api_url = %api.server_url(), "using spy cat api");
    let dashboard = Dashboard::new(Arc::new(api));
    let mut events = dashboard.subscribe_events();

    let result = run(&dashboard, args.command.unwrap_or(Command::List { retry: false })).await;
    print_notices(&mut events);
    result
}

async fn run(dashboard: &Dashboard, command: Command) -> Result<()> {
    match command {
        Command::List { retry } => {
            let mut outcome = dashboard.mount().await;
            while outcome == RefreshOutcome::Failed {
                print!("{}", render::render_view(&dashboard.view().await));
                if !(retry || off_runtime(|| ask("Try again?")).await?) {
                    bail!("could not load spy cats");
                }
                outcome = dashboard.retry().await;
                if retry && outcome == RefreshOutcome::Failed {
                    bail!("could not load spy cats");
                }
            }
            print!("{}", render::render_view(&dashboard.view().await));
        }
        Command::Show { id } => match dashboard.get_one(SpyCatId(id)).await {
            Ok(cat) => println!("{}", render::render_cat(&cat)),
            Err(err) if err.is_not_found() => bail!("spy cat {id} not found: {err}"),
            Err(err) => return Err(err).context(format!("failed to load spy cat {id}")),
        },
        Command::Add {
            name,
            breed,
            years_of_experience,
            salary,
        } => {
            dashboard.mount().await;
            dashboard.open_creation().await;
            for (field, value) in [
                (FormField::Name, name),
                (FormField::Breed, breed),
                (FormField::YearsOfExperience, years_of_experience),
                (FormField::Salary, salary),
            ] {
                dashboard.set_creation_field(field, value).await?;
            }
            let created = dashboard.submit_creation().await?;
            println!("added spy cat #{}", created.id);
            print!("{}", render::render_view(&dashboard.view().await));
        }
        Command::SetSalary { id, salary } => {
            let id = SpyCatId(id);
            dashboard.mount().await;
            dashboard.begin_edit(id).await?;
            dashboard.set_salary_draft(id, salary).await?;
            dashboard.save_salary(id).await?;
            print!("{}", render::render_view(&dashboard.view().await));
        }
        Command::Delete { id, yes } => {
            let id = SpyCatId(id);
            dashboard.mount().await;
            let answer = yes || off_runtime(|| ask(DELETE_PROMPT)).await?;
            match dashboard.delete(id, &Answered(answer)).await? {
                DeleteOutcome::Deleted => {
                    print!("{}", render::render_view(&dashboard.view().await))
                }
                DeleteOutcome::Declined => println!("delete cancelled"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc;

    #[tokio::test(flavor = "current_thread")]
    async fn blocking_question_leaves_the_runtime_free() {
        let (tx, rx) = mpsc::channel();
        tokio::spawn(async move {
            let _ = tx.send(true);
        });
        let answer = off_runtime(move || rx.recv().unwrap_or(false))
            .await
            .expect("answer");
        assert!(answer);
    }

    #[test]
    fn answered_decision_is_replayed_to_the_delete_flow() {
        assert!(Answered(true).confirm(SpyCatId(1), DELETE_PROMPT));
        assert!(!Answered(false).confirm(SpyCatId(1), DELETE_PROMPT));
    }
}

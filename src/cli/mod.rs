//! Command-line interface.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::api::models::{ListQuery, ListResponse, ResultResponse};
use crate::api::{serve, AppState};
use crate::config;
use crate::core::{JobStore, Orchestrator};

#[derive(Parser)]
#[command(name = "tubecheck", about = "AI-authorship analysis for YouTube videos", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Submit a video for analysis
    Analyze {
        /// YouTube watch or share URL
        url: String,

        /// Owner identity to record on the job
        #[arg(long)]
        owner: Option<String>,

        /// Block until the job reaches a terminal state
        #[arg(long)]
        wait: bool,
    },

    /// Print one analysis as JSON
    Status {
        /// Job id
        id: Uuid,
    },

    /// List analyses, newest first
    List {
        /// Only jobs belonging to this owner
        #[arg(long)]
        owner: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = config::config()?;
        let store = Arc::new(JobStore::new(config.jobs_dir()));
        let orchestrator = Arc::new(Orchestrator::from_config(config, Arc::clone(&store)));

        match self.command {
            Command::Serve { port } => {
                let state = AppState::new(orchestrator, store);
                serve(state, port.unwrap_or(config.port)).await
            }

            Command::Analyze { url, owner, wait } => {
                let job = orchestrator.submit(&url, owner).await?;
                println!("{}", job.id);

                if wait {
                    let done = wait_for_terminal(&store, job.id).await?;
                    print_json(&ResultResponse::from_job(&done))?;
                }
                Ok(())
            }

            Command::Status { id } => {
                let job = store.load(id).await?;
                print_json(&ResultResponse::from_job(&job))
            }

            Command::List { owner, page, limit } => {
                let jobs = match owner {
                    Some(ref owner) => store.list_for_owner(owner).await?,
                    None => store.list().await?,
                };
                let query = ListQuery {
                    page: Some(page),
                    limit: Some(limit),
                };
                print_json(&ListResponse::paginate(&jobs, &query))
            }
        }
    }
}

async fn wait_for_terminal(store: &JobStore, id: Uuid) -> Result<crate::domain::AnalysisJob> {
    loop {
        let job = store.load(id).await?;
        if job.state.is_terminal() {
            return Ok(job);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", body);
    Ok(())
}

use crate::cli::Commands;
use crate::config::AirConfig;
use crate::crucible::CrucibleClient;
use crate::external::{CommandExecutor, ProcessCommandExecutor, SvnClient};
use crate::jira::{IssueKind, JiraClient};
use crate::workflows::{require_ticket, RefreshSettings};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

pub mod complete;
pub mod init;
pub mod review;
pub mod tickets;
pub mod work;

/// Everything a subcommand needs from the outside world, built once in `main`.
pub struct CommandContext<'a> {
    pub config: &'a AirConfig,
    pub executor: Arc<dyn CommandExecutor>,
    pub cwd: PathBuf,
}

impl<'a> CommandContext<'a> {
    pub fn new(config: &'a AirConfig) -> Result<Self> {
        Ok(Self {
            config,
            executor: Arc::new(ProcessCommandExecutor),
            cwd: std::env::current_dir().context("cannot determine current directory")?,
        })
    }

    pub fn jira(&self) -> Result<JiraClient> {
        let settings = self.config.jira()?;
        JiraClient::new(settings, &self.config.http).context("failed to set up Jira client")
    }

    pub fn crucible(&self) -> Result<CrucibleClient> {
        let settings = self.config.crucible()?;
        CrucibleClient::new(settings, &self.config.http)
            .context("failed to set up Crucible client")
    }

    pub fn svn(&self) -> SvnClient {
        SvnClient::new(self.executor.clone())
    }

    pub fn svn_settings(&self) -> Result<RefreshSettings> {
        Ok(RefreshSettings::from(self.config.svn()?))
    }

    /// Ticket from the command line, or inferred from the working copy.
    pub async fn ticket(&self, explicit: Option<&str>) -> Result<String> {
        Ok(require_ticket(explicit, self.executor.as_ref(), &self.cwd).await?)
    }
}

/// Run one parsed subcommand, writing user-facing output to `out`.
pub async fn execute(ctx: &CommandContext<'_>, command: &Commands, out: &mut dyn Write) -> Result<()> {
    let explicit = command.explicit_ticket();

    match command {
        Commands::Init => init::init(&ctx.cwd, out).await,
        Commands::ListTickets => {
            let jira = ctx.jira()?;
            let query = &ctx.config.jira()?.list;
            tickets::list_issues(&jira, query, tickets::DEFAULT_LIST_JQL, out).await
        }
        Commands::ListReviews => {
            let jira = ctx.jira()?;
            let query = &ctx.config.jira()?.review;
            tickets::list_issues(&jira, query, tickets::DEFAULT_REVIEW_JQL, out).await
        }
        Commands::CreateBug { text } => {
            tickets::create_issue(&ctx.jira()?, IssueKind::Bug, &text.join(" "), out)
                .await
                .map(|_| ())
        }
        Commands::CreateTask { text } => {
            tickets::create_issue(&ctx.jira()?, IssueKind::Task, &text.join(" "), out)
                .await
                .map(|_| ())
        }
        Commands::MakeBranch(_) => {
            let ticket = ctx.ticket(explicit).await?;
            work::make_branch(&ctx.jira()?, &ctx.svn(), &ctx.svn_settings()?, &ticket, out)
                .await
                .map(|_| ())
        }
        Commands::StartWork(_) => {
            let ticket = ctx.ticket(explicit).await?;
            work::start_work(&ctx.jira()?, &ctx.svn(), &ctx.svn_settings()?, &ticket, out).await
        }
        Commands::FinishWork(_) => {
            let ticket = ctx.ticket(explicit).await?;
            tickets::finish_work(&ctx.jira()?, &ticket, out).await
        }
        Commands::Refresh(_) => {
            let ticket = ctx.ticket(explicit).await?;
            work::refresh(&ctx.jira()?, &ctx.svn(), &ctx.svn_settings()?, &ticket, out).await
        }
        Commands::StartReview { persons, open, .. } => {
            let ticket = ctx.ticket(explicit).await?;
            review::StartReviewCommand::new(&ticket, persons.clone())
                .with_open_browser(*open)
                .execute(
                    &ctx.jira()?,
                    &ctx.crucible()?,
                    &ctx.svn(),
                    &ctx.svn_settings()?,
                    out,
                )
                .await
        }
        Commands::FinishReview(_) => {
            let ticket = ctx.ticket(explicit).await?;
            review::finish_review(
                &ctx.jira()?,
                &ctx.crucible()?,
                &ctx.svn(),
                &ctx.svn_settings()?,
                &ticket,
                out,
            )
            .await
        }
        Commands::RejectTicket(_) => {
            let ticket = ctx.ticket(explicit).await?;
            tickets::reject_ticket(&ctx.jira()?, &ticket, out).await
        }
        Commands::CloseTicket(_) => {
            let ticket = ctx.ticket(explicit).await?;
            let status = &ctx.config.jira()?.close_status;
            tickets::close_ticket(&ctx.jira()?, &ticket, status, out).await
        }
        Commands::Assign { person, .. } => {
            let ticket = ctx.ticket(explicit).await?;
            tickets::assign(&ctx.jira()?, &ticket, person, out).await
        }
        Commands::Take(_) => {
            let ticket = ctx.ticket(explicit).await?;
            let me = &ctx.config.jira()?.username;
            tickets::assign(&ctx.jira()?, &ticket, me, out).await
        }
        Commands::AddWatcher { person, .. } => {
            let ticket = ctx.ticket(explicit).await?;
            tickets::add_watcher(&ctx.jira()?, &ticket, person, out).await
        }
        Commands::AddComment { comment, .. } => {
            let ticket = ctx.ticket(explicit).await?;
            tickets::add_comment(&ctx.jira()?, &ticket, &comment.join(" "), out).await
        }
        Commands::CompleteTickets => {
            let query = &ctx.config.jira()?.list;
            complete::complete_tickets(&ctx.jira()?, query, out).await
        }
        Commands::CompleteSubcommands => complete::complete_subcommands(&ctx.config.aliases, out),
        Commands::CompletePersons => complete::complete_persons(&ctx.jira()?, out).await,
    }
}

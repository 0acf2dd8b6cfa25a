use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod aliases;
pub mod commands;

#[derive(Parser, Debug)]
#[command(name = "air", version)]
#[command(about = "Ticket-driven branch workflow for Jira, Subversion and Crucible")]
#[command(long_about = "air ties a Jira ticket to a Subversion feature branch and a Crucible review. \
                       Start with 'air init' to write a sample .airrc, then 'air start-work TICKET'.")]
pub struct Cli {
    /// Read configuration from this file in addition to ~/.airrc and ./.airrc
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Ticket given on the command line. Either form may be used; when both are
/// missing the ticket is inferred from the working copy.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketArgs {
    /// Ticket key, e.g. PROJ-123
    #[arg(short, long, value_name = "TICKET")]
    pub ticket: Option<String>,

    #[arg(value_name = "TICKET", conflicts_with = "ticket")]
    pub ticket_arg: Option<String>,
}

impl TicketArgs {
    pub fn explicit(&self) -> Option<&str> {
        self.ticket.as_deref().or(self.ticket_arg.as_deref())
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write a sample .airrc into the current directory
    Init,
    /// List tickets assigned to me
    ListTickets,
    /// List tickets waiting for review
    ListReviews,
    /// Create a bug in Jira
    CreateBug {
        /// Bug summary
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Create a task in Jira
    CreateTask {
        /// Task summary
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Create a feature branch for a ticket
    MakeBranch(TicketArgs),
    /// Create the branch, mark the ticket in progress and record the branch URL
    StartWork(TicketArgs),
    /// Mark the ticket ready for review
    FinishWork(TicketArgs),
    /// Merge trunk into the ticket's branch
    Refresh(TicketArgs),
    /// Create a Crucible review of the ticket's branch
    StartReview {
        #[command(flatten)]
        ticket: TicketArgs,
        /// Reviewer to add (repeatable)
        #[arg(short, long = "person", value_name = "USER", help = "Add a reviewer; repeat for more than one")]
        persons: Vec<String>,
        /// Open the review in a browser
        #[arg(short, long, help = "Open the new review in the default browser")]
        open: bool,
    },
    /// Close the ticket's review and reintegrate its branch into trunk
    FinishReview(TicketArgs),
    /// Send the ticket back for rework
    RejectTicket(TicketArgs),
    /// Close the ticket
    CloseTicket(TicketArgs),
    /// Assign the ticket to someone
    Assign {
        /// Jira user name
        #[arg(short, long, value_name = "USER")]
        person: String,
        #[command(flatten)]
        ticket: TicketArgs,
    },
    /// Assign the ticket to myself
    Take(TicketArgs),
    /// Add a watcher to the ticket
    AddWatcher {
        /// Jira user name
        #[arg(short, long, value_name = "USER")]
        person: String,
        #[command(flatten)]
        ticket: TicketArgs,
    },
    /// Comment on the ticket
    AddComment {
        /// Ticket key, e.g. PROJ-123
        #[arg(short, long, value_name = "TICKET")]
        ticket: Option<String>,
        /// Comment text
        #[arg(required = true, num_args = 1..)]
        comment: Vec<String>,
    },
    #[command(hide = true)]
    CompleteTickets,
    #[command(hide = true)]
    CompleteSubcommands,
    #[command(hide = true)]
    CompletePersons,
}

impl Commands {
    /// Subcommand name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Init => "init",
            Commands::ListTickets => "list-tickets",
            Commands::ListReviews => "list-reviews",
            Commands::CreateBug { .. } => "create-bug",
            Commands::CreateTask { .. } => "create-task",
            Commands::MakeBranch(_) => "make-branch",
            Commands::StartWork(_) => "start-work",
            Commands::FinishWork(_) => "finish-work",
            Commands::Refresh(_) => "refresh",
            Commands::StartReview { .. } => "start-review",
            Commands::FinishReview(_) => "finish-review",
            Commands::RejectTicket(_) => "reject-ticket",
            Commands::CloseTicket(_) => "close-ticket",
            Commands::Assign { .. } => "assign",
            Commands::Take(_) => "take",
            Commands::AddWatcher { .. } => "add-watcher",
            Commands::AddComment { .. } => "add-comment",
            Commands::CompleteTickets => "complete-tickets",
            Commands::CompleteSubcommands => "complete-subcommands",
            Commands::CompletePersons => "complete-persons",
        }
    }

    /// Ticket named on the command line, if any
    pub fn explicit_ticket(&self) -> Option<&str> {
        match self {
            Commands::MakeBranch(t)
            | Commands::StartWork(t)
            | Commands::FinishWork(t)
            | Commands::Refresh(t)
            | Commands::FinishReview(t)
            | Commands::RejectTicket(t)
            | Commands::CloseTicket(t)
            | Commands::Take(t)
            | Commands::StartReview { ticket: t, .. }
            | Commands::Assign { ticket: t, .. }
            | Commands::AddWatcher { ticket: t, .. } => t.explicit(),
            Commands::AddComment { ticket, .. } => ticket.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ticket_flag_and_positional() {
        let cli = Cli::parse_from(["air", "make-branch", "-t", "PROJ-1"]);
        assert_eq!(cli.command.explicit_ticket(), Some("PROJ-1"));

        let cli = Cli::parse_from(["air", "refresh", "PROJ-2"]);
        assert_eq!(cli.command.explicit_ticket(), Some("PROJ-2"));

        let cli = Cli::parse_from(["air", "finish-work"]);
        assert_eq!(cli.command.explicit_ticket(), None);
    }

    #[test]
    fn test_start_review_collects_persons() {
        let cli = Cli::parse_from([
            "air", "start-review", "-t", "PROJ-3", "-p", "ann", "-p", "bob", "-o",
        ]);
        match cli.command {
            Commands::StartReview { ticket, persons, open } => {
                assert_eq!(ticket.explicit(), Some("PROJ-3"));
                assert_eq!(persons, vec!["ann", "bob"]);
                assert!(open);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_comment_words_are_collected() {
        let cli = Cli::parse_from(["air", "add-comment", "-t", "PROJ-4", "looks", "good"]);
        assert_eq!(
            cli.command,
            Commands::AddComment {
                ticket: Some("PROJ-4".to_string()),
                comment: vec!["looks".to_string(), "good".to_string()],
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["air", "list-tickets", "-vv", "--config", "x.toml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert_eq!(cli.command.name(), "list-tickets");
    }
}

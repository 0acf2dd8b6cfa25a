pub mod refresh;
pub mod reintegrate;
pub mod resolver;
pub mod ticket;
pub mod workdir;

pub use refresh::{
    has_conflicts, MergeReport, RefreshError, RefreshOrchestrator, RefreshSettings, RefreshStage,
};
pub use reintegrate::{reintegrate, ReintegrateError, ReintegrateReport};
pub use resolver::{select_unique_branch, BranchResolver, ResolveError};
pub use ticket::{make_branch_name, parse_ticket, require_ticket, TicketError};
pub use workdir::ScratchWorkdir;

//! External tool abstractions
//!
//! This module provides trait-based abstractions for external CLI tools like
//! Subversion, enabling testable code through dependency injection and fake
//! implementations.

pub mod command;
pub mod svn;

pub use command::{CommandError, CommandExecutor, CommandOutput, ProcessCommandExecutor};
pub use svn::{BranchName, MergeMode, SvnClient, Transcript, VcsError, VersionControl};

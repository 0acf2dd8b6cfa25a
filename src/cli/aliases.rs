//! User-defined subcommand aliases, applied to argv before clap sees it.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;

/// Aliases every installation gets, merged under the `[aliases]` table.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("ls", "list_tickets"),
    ("start", "start_work"),
    ("mkticket", "create_bug"),
    ("mkbug", "create_bug"),
    ("mktask", "create_task"),
    ("mkbranch", "make_branch"),
    ("comment", "add_comment"),
];

/// Global options that take a separate value.
const VALUE_FLAGS: &[&str] = &["-c", "--config"];

/// Defaults overlaid with the configured aliases.
pub fn effective_aliases(configured: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut aliases: BTreeMap<String, String> = DEFAULT_ALIASES
        .iter()
        .map(|(alias, target)| (alias.to_string(), target.to_string()))
        .collect();
    aliases.extend(configured.iter().map(|(k, v)| (k.clone(), v.clone())));
    aliases
}

/// Accept `list_tickets` and `_complete_tickets` spellings for `list-tickets`
/// and `complete-tickets`.
pub fn normalize_command_name(name: &str) -> String {
    name.trim_start_matches('_').replace('_', "-")
}

/// Position of the subcommand word in `args`, skipping global options.
fn subcommand_index(args: &[OsString]) -> Option<usize> {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].to_string_lossy();
        if VALUE_FLAGS.contains(&arg.as_ref()) {
            i += 2;
            continue;
        }
        if arg == "--" {
            return None;
        }
        if !arg.starts_with('-') {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Rewrite the subcommand word through `aliases`, then normalize its spelling.
pub fn expand_alias(mut args: Vec<OsString>, aliases: &BTreeMap<String, String>) -> Vec<OsString> {
    let Some(index) = subcommand_index(&args) else {
        return args;
    };
    let word = args[index].to_string_lossy().into_owned();
    let target = match aliases.get(&word) {
        Some(target) => {
            debug!(alias = %word, command = %target, "expanding alias");
            target.as_str()
        }
        None => word.as_str(),
    };
    args[index] = OsString::from(normalize_command_name(target));
    args
}

/// The `--config` value, found before clap parses so aliases can be loaded.
pub fn config_path_from_args(args: &[OsString]) -> Option<PathBuf> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let text = arg.to_string_lossy();
        if VALUE_FLAGS.contains(&text.as_ref()) {
            return iter.next().map(PathBuf::from);
        }
        if let Some(value) = text.strip_prefix("--config=") {
            return Some(PathBuf::from(value));
        }
        if text == "--" {
            break;
        }
    }
    None
}

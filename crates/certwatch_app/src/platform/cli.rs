use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};
use certwatch_core::{CertStatus, Msg, SiteId, SiteSelection, StatusFilter};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

/// Watch TLS certificate expiry for a list of websites.
#[derive(Debug, Parser)]
#[command(name = "certwatch", version)]
pub struct Cli {
    /// Directory holding the site list and the log file.
    #[arg(long, env = "CERTWATCH_STATE_DIR", default_value = ".", global = true)]
    pub state_dir: PathBuf,
    /// Upper bound in seconds for one certificate check.
    #[arg(long, env = "CERTWATCH_TIMEOUT", default_value_t = 10, global = true)]
    pub timeout_secs: u64,
    /// Check service to ask instead of probing sites directly.
    #[arg(long, env = "CERTWATCH_ENDPOINT", global = true)]
    pub endpoint: Option<String>,
    #[arg(long, value_enum, default_value_t = LogTarget::File, global = true)]
    pub log: LogTarget,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show monitored sites, optionally only one status (or `ignored`).
    List {
        #[arg(long, value_parser = parse_filter)]
        filter: Option<StatusFilter>,
    },
    /// Start monitoring a URL and check it.
    Add { url: String },
    /// Change a site's URL and check it again.
    Update { id: SiteId, url: String },
    Remove { id: SiteId },
    /// Remove every site.
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Toggle whether a site is skipped by bulk rechecks.
    Ignore { id: SiteId },
    /// Put sites in the given order; every id must be listed exactly once.
    Reorder {
        #[arg(required = true)]
        ids: Vec<SiteId>,
    },
    Recheck { id: SiteId },
    /// Recheck every site that is not ignored.
    RecheckAll,
    /// Recheck the sites a status filter shows.
    RecheckFiltered {
        #[arg(value_parser = parse_filter)]
        filter: StatusFilter,
    },
    /// Add the URLs of a text file, one per line.
    Import { file: PathBuf },
    /// Write the URL list, one per line, to a file or stdout.
    Export { file: Option<PathBuf> },
    /// Read commands from stdin while checks complete in the background.
    Shell,
}

/// What the application loop does with one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Dispatch(Msg),
    List(Option<StatusFilter>),
    Export(Option<PathBuf>),
    Shell,
    Quit,
}

impl Command {
    /// Import files are read here, so a bad path never reaches the state.
    pub fn into_action(self, at: DateTime<Utc>) -> anyhow::Result<Action> {
        let msg = match self {
            Command::List { filter } => return Ok(Action::List(filter)),
            Command::Export { file } => return Ok(Action::Export(file)),
            Command::Shell => return Ok(Action::Shell),
            Command::Add { url } => Msg::AddRequested { raw_url: url, at },
            Command::Update { id, url } => Msg::UpdateRequested {
                site_id: id,
                raw_url: url,
                at,
            },
            Command::Remove { id } => Msg::RemoveRequested { site_id: id },
            Command::Clear { yes } => {
                if !yes {
                    bail!("refusing to remove every site without --yes");
                }
                Msg::RemoveAllRequested
            }
            Command::Ignore { id } => Msg::ToggleIgnoreRequested { site_id: id },
            Command::Reorder { ids } => Msg::Reordered { order: ids },
            Command::Recheck { id } => Msg::RecheckRequested { site_id: id },
            Command::RecheckAll => Msg::RecheckManyRequested {
                selection: SiteSelection::NotIgnored,
            },
            Command::RecheckFiltered { filter } => Msg::RecheckManyRequested {
                selection: SiteSelection::Filter(filter),
            },
            Command::Import { file } => {
                let text = fs::read_to_string(&file)
                    .with_context(|| format!("failed to read import file {}", file.display()))?;
                Msg::ImportRequested { text, at }
            }
        };
        Ok(Action::Dispatch(msg))
    }
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, name = "certwatch shell")]
struct ShellLine {
    #[command(subcommand)]
    verb: ShellVerb,
}

#[derive(Debug, Subcommand)]
enum ShellVerb {
    #[command(flatten)]
    Site(Command),
    /// Leave the shell once outstanding checks have settled.
    #[command(alias = "exit")]
    Quit,
}

/// `Ok(None)` for blank lines.
pub fn parse_shell_line(line: &str, at: DateTime<Utc>) -> anyhow::Result<Option<Action>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    let parsed = ShellLine::try_parse_from(words)?;
    match parsed.verb {
        ShellVerb::Quit => Ok(Some(Action::Quit)),
        ShellVerb::Site(Command::Shell) => bail!("already in the shell"),
        ShellVerb::Site(command) => command.into_action(at).map(Some),
    }
}

/// A status wire name such as `expires-soon`, or `ignored`.
pub fn parse_filter(text: &str) -> Result<StatusFilter, String> {
    let text = text.trim().to_ascii_lowercase();
    if text == "ignored" {
        return Ok(StatusFilter::Ignored);
    }
    CertStatus::from_str(&text)
        .map(StatusFilter::Status)
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("certwatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn global_options_parse_after_the_subcommand() {
        let cli = parse(&["list", "--timeout-secs", "3", "--log", "both"]);
        assert_eq!(cli.timeout_secs, 3);
        assert_eq!(cli.log, LogTarget::Both);
        assert_eq!(cli.command, Command::List { filter: None });
    }

    #[test]
    fn filters_accept_status_names_and_ignored() {
        assert_eq!(parse_filter("ignored"), Ok(StatusFilter::Ignored));
        assert_eq!(
            parse_filter("Expires-Soon"),
            Ok(StatusFilter::Status(CertStatus::ExpiresSoon))
        );
        assert!(parse_filter("fine").is_err());

        let cli = parse(&["recheck-filtered", "expired"]);
        assert_eq!(
            cli.command,
            Command::RecheckFiltered {
                filter: StatusFilter::Status(CertStatus::Expired)
            }
        );
    }

    #[test]
    fn commands_map_to_messages() {
        let action = parse(&["update", "4", "example.org"])
            .command
            .into_action(at())
            .unwrap();
        assert_eq!(
            action,
            Action::Dispatch(Msg::UpdateRequested {
                site_id: 4,
                raw_url: "example.org".to_string(),
                at: at(),
            })
        );

        let action = parse(&["reorder", "3", "1", "2"])
            .command
            .into_action(at())
            .unwrap();
        assert_eq!(
            action,
            Action::Dispatch(Msg::Reordered {
                order: vec![3, 1, 2]
            })
        );

        let action = parse(&["recheck-all"]).command.into_action(at()).unwrap();
        assert_eq!(
            action,
            Action::Dispatch(Msg::RecheckManyRequested {
                selection: SiteSelection::NotIgnored
            })
        );
    }

    #[test]
    fn clear_requires_confirmation() {
        assert!(parse(&["clear"]).command.into_action(at()).is_err());
        assert_eq!(
            parse(&["clear", "--yes"]).command.into_action(at()).unwrap(),
            Action::Dispatch(Msg::RemoveAllRequested)
        );
    }

    #[test]
    fn import_reads_the_file_up_front() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a.example\nb.example").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let action = parse(&["import", path.as_str()]).command.into_action(at()).unwrap();
        assert_eq!(
            action,
            Action::Dispatch(Msg::ImportRequested {
                text: "a.example\nb.example\n".to_string(),
                at: at(),
            })
        );

        let missing = Command::Import {
            file: PathBuf::from("/nonexistent/certwatch/import.txt"),
        };
        assert!(missing.into_action(at()).is_err());
    }

    #[test]
    fn shell_lines() {
        assert_eq!(parse_shell_line("   ", at()).unwrap(), None);
        assert_eq!(parse_shell_line("quit", at()).unwrap(), Some(Action::Quit));
        assert_eq!(parse_shell_line("exit", at()).unwrap(), Some(Action::Quit));
        assert_eq!(
            parse_shell_line("list --filter ignored", at()).unwrap(),
            Some(Action::List(Some(StatusFilter::Ignored)))
        );
        assert_eq!(
            parse_shell_line("  add   https://example.com/ ", at()).unwrap(),
            Some(Action::Dispatch(Msg::AddRequested {
                raw_url: "https://example.com/".to_string(),
                at: at(),
            }))
        );
        assert!(parse_shell_line("shell", at()).is_err());
        assert!(parse_shell_line("frobnicate", at()).is_err());
        assert!(parse_shell_line("remove not-a-number", at()).is_err());
    }
}

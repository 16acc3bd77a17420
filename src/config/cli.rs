use crate::core::output::ExportFormat;
use crate::app::pipelines::sort::DEFAULT_SORT_FIELD;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "thought")]
#[command(about = "Sync bookmarks into Notion and tidy up Notion databases")]
#[command(version)]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "thought.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Archive exact duplicate rows of a collection
    Dedupe {
        /// Collection URL or id
        collection: String,

        /// Field to compare on (repeatable). Defaults to every field
        #[arg(short, long = "field")]
        fields: Vec<String>,

        /// Keep the last row of each duplicate group instead of the first
        #[arg(long)]
        keep_last: bool,

        /// Report duplicates without archiving them
        #[arg(long)]
        dry_run: bool,

        /// Also write a CSV of the surviving rows to this directory
        #[arg(long, value_name = "DIR")]
        export: Option<String>,
    },

    /// Sort the options of a select or multi-select property
    Sort {
        /// Collection URL or id
        collection: String,

        #[arg(short, long, default_value = DEFAULT_SORT_FIELD)]
        field: String,

        /// Also sort the multi-select values stored on each row
        #[arg(long)]
        record_values: bool,

        #[arg(long)]
        dry_run: bool,
    },

    /// Append the output of a service action to its Notion database
    Sync {
        /// Registered service, e.g. instapaper
        service: String,

        /// Action of the service, e.g. bookmarks
        action: String,

        /// Page holding the destination databases. Defaults to sync.services_page
        #[arg(long)]
        target: Option<String>,

        /// Shorthand for --param folder=<FOLDER>
        #[arg(long)]
        folder: Option<String>,

        /// Extra action argument as key=value (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Write a collection to a JSON or CSV file
    Export {
        /// Collection URL or id
        collection: String,

        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Column to keep (repeatable), by its final name
        #[arg(short = 'c', long = "column")]
        columns: Vec<String>,

        /// Rename `properties.<Field>...` columns to `<Field>`
        #[arg(long)]
        clean_columns: bool,

        /// Flatten rich text and multi-select cells to plain values
        #[arg(long)]
        plain_text: bool,

        /// Query filter as a JSON object
        #[arg(long, value_name = "JSON")]
        filter: Option<String>,

        /// Output directory. Defaults to export.output_dir
        #[arg(short, long, value_name = "DIR")]
        output: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dedupe_flags() {
        let cli = Cli::try_parse_from([
            "thought", "dedupe", "abc", "-f", "Name", "-f", "URL", "--keep-last", "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Command::Dedupe {
                collection,
                fields,
                keep_last,
                dry_run,
                export,
            } => {
                assert_eq!(collection, "abc");
                assert_eq!(fields, vec!["Name", "URL"]);
                assert!(keep_last && dry_run);
                assert_eq!(export, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from("thought.toml"));
    }

    #[test]
    fn test_parse_sync_params_and_global_flags() {
        let cli = Cli::try_parse_from([
            "thought", "sync", "instapaper", "bookmarks", "--param", "folder=starred", "-v",
            "--log-format", "json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Command::Sync { service, action, params, target, .. } => {
                assert_eq!(service, "instapaper");
                assert_eq!(action, "bookmarks");
                assert_eq!(params, vec!["folder=starred"]);
                assert_eq!(target, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_sort_and_export_defaults() {
        let cli = Cli::try_parse_from(["thought", "sort", "abc"]).unwrap();
        assert!(matches!(cli.command, Command::Sort { ref field, .. } if field == "tags"));

        let cli = Cli::try_parse_from(["thought", "export", "abc", "--format", "json", "-c", "Name"])
            .unwrap();
        match cli.command {
            Command::Export { format, columns, .. } => {
                assert_eq!(format, ExportFormat::Json);
                assert_eq!(columns, vec!["Name"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["thought", "export", "abc", "--format", "xlsx"]).is_err());
    }
}

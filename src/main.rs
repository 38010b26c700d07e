use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use preview_host::data::{AppStateStore, Database};
use preview_host::preview::{
    FrameTape, FrameTapeEntry, HeadlessFrameFactory, HostEffect, Intent, MemoryBackend,
    PreferenceRecordStore, RecordingTape, ViewStateStore, STORAGE_RECORD_LIVE_PREVIEW_FLAGS,
};
use preview_host::{util, Config};

#[derive(Debug, Parser)]
#[command(name = "preview-host", version, about = "Live preview session host")]
struct Cli {
    /// Data directory (defaults to ~/.preview-host)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a frame tape through a headless session and print the final state
    Replay {
        tape: PathBuf,
        /// Keep preferences in memory instead of the database
        #[arg(long)]
        ephemeral: bool,
        /// Export the resulting recording into the recordings directory
        #[arg(long)]
        export: bool,
    },
    /// Print an exported recording
    Inspect {
        recording: PathBuf,
        /// Print the whole tape as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Read or write stored view preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Debug, Subcommand)]
enum PrefsAction {
    /// Print one preference, or every preference of a document
    Get {
        document_id: String,
        name: Option<String>,
    },
    /// Store a preference; VALUE is parsed as JSON, falling back to a string
    Set {
        document_id: String,
        name: String,
        value: String,
    },
    /// Forget stored preferences of every document
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir);

    // Initialize logging to file (~/.preview-host/logs/preview-host.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false) // Disable ANSI colors in log file
        .init();

    match cli.command {
        Command::Replay {
            tape,
            ephemeral,
            export,
        } => replay(tape, ephemeral, export),
        Command::Inspect { recording, json } => inspect(recording, json),
        Command::Prefs { action } => prefs(action),
    }
}

fn open_store() -> Result<PreferenceRecordStore<AppStateStore>> {
    let db = Database::open_default().context("failed to open preference database")?;
    Ok(PreferenceRecordStore::new(AppStateStore::new(db.connection())))
}

fn replay(path: PathBuf, ephemeral: bool, export: bool) -> Result<()> {
    let config = Config::load();
    let mut tape = FrameTape::read_jsonl_from_path(&path)
        .with_context(|| format!("failed to read tape {}", path.display()))?;

    let export_target = if export {
        fs::create_dir_all(util::recordings_dir())?;
        let target = util::recordings_dir().join(format!("{}.jsonl", uuid::Uuid::new_v4()));
        tape.push(FrameTapeEntry::Intent {
            intent: Intent::ExportRecording {
                path: target.clone(),
            },
        });
        Some(target)
    } else {
        None
    };

    let store: Arc<dyn ViewStateStore> = if ephemeral {
        Arc::new(PreferenceRecordStore::new(MemoryBackend::new()))
    } else {
        Arc::new(open_store()?)
    };

    let outcome = tape.replay(&config, store, Box::new(HeadlessFrameFactory))?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    let errors: Vec<&str> = outcome
        .effects
        .iter()
        .filter_map(|effect| match effect {
            HostEffect::Error { message } => Some(message.as_str()),
            _ => None,
        })
        .collect();
    if !errors.is_empty() {
        anyhow::bail!("replay reported errors: {}", errors.join("; "));
    }
    if let Some(target) = export_target {
        eprintln!("Exported recording to {}", target.display());
    }
    Ok(())
}

fn inspect(path: PathBuf, json: bool) -> Result<()> {
    let tape = RecordingTape::read_jsonl_from_path(&path)
        .with_context(|| format!("failed to read recording {}", path.display()))?;

    if json {
        let value = serde_json::json!({
            "recordingId": tape.recording_id,
            "documentId": tape.document_id,
            "createdAtMs": tape.created_at_ms,
            "initCount": tape.init_count,
            "graph": tape.graph,
            "actions": tape.entries,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let created = chrono::DateTime::from_timestamp_millis(tape.created_at_ms as i64)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| tape.created_at_ms.to_string());
    println!("recording: {}", tape.recording_id);
    println!("document:  {}", tape.document_id);
    println!("created:   {created}");
    println!("actions:   {}", tape.entries.len());
    for (idx, entry) in tape.entries.iter().enumerate() {
        println!("{:>4}  {}", idx + 1, serde_json::to_string(entry)?);
    }
    Ok(())
}

fn prefs(action: PrefsAction) -> Result<()> {
    let store = open_store()?;
    match action {
        PrefsAction::Reset => {
            store.backend().delete(STORAGE_RECORD_LIVE_PREVIEW_FLAGS)?;
        }
        PrefsAction::Get { document_id, name } => match name {
            Some(name) => match store.get_value(&document_id, &name) {
                Some(value) => println!("{value}"),
                None => println!("null"),
            },
            None => {
                let flags = store
                    .load_record()
                    .remove(&document_id)
                    .unwrap_or_else(|| serde_json::json!({}));
                println!("{}", serde_json::to_string_pretty(&flags)?);
            }
        },
        PrefsAction::Set {
            document_id,
            name,
            value,
        } => {
            anyhow::ensure!(!document_id.is_empty(), "document id must not be empty");
            let value = serde_json::from_str(&value)
                .unwrap_or(serde_json::Value::String(value));
            store
                .write_value(&document_id, &name, value)
                .context("failed to store preference")?;
        }
    }
    Ok(())
}

use std::fs;
use std::path::Path;

use chrono::Local;

use crate::cli::commands::InitArgs;
use crate::io::config_io::CONFIG_FILE;
use crate::io::lock::FileLock;
use crate::io::snapshot_io::{JsonFileStore, SnapshotStore};
use crate::model::snapshot::Snapshot;
use crate::ops::rollover;

const CONFIG_TEMPLATE: &str = r##"[planner]
name = {name}

# --- Text service ---
# Used by `pri breakdown`, `pri suggest` and `pri review`.
# The API key is read from the environment variable named here.

[transform]
endpoint = "https://generativelanguage.googleapis.com/v1beta"
model = "gemini-2.0-flash"
api_key_env = "GEMINI_API_KEY"
timeout_secs = 30

# --- Focus timer ---

[timer]
# ring the terminal bell when an interval ends
bell = true
"##;

/// Infer a planner name from a directory name: hyphens and underscores
/// become spaces, words are title-cased.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_config(name: &str) -> String {
    // quoted and escaped as a TOML string
    let quoted = toml::Value::String(name.to_string()).to_string();
    CONFIG_TEMPLATE.replace("{name}", &quoted)
}

pub fn cmd_init(data_dir: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = data_dir.join(CONFIG_FILE);
    if config_path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }

    fs::create_dir_all(data_dir)?;
    let name = args.name.unwrap_or_else(|| {
        fs::canonicalize(data_dir)
            .ok()
            .and_then(|p| p.file_name().and_then(|n| n.to_str()).map(infer_name))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Priority".to_string())
    });

    let _lock = FileLock::acquire_default(data_dir)?;
    fs::write(&config_path, render_config(&name))?;

    let store = JsonFileStore::new(data_dir);
    if store.load()?.is_none() {
        let snapshot = Snapshot {
            last_visited_date: Some(rollover::today_str(Local::now().date_naive())),
            ..Snapshot::new()
        };
        store.save(&snapshot)?;
    }

    println!("Initialized planner: {}", name);
    println!("  data: {}", data_dir.display());
    Ok(())
}

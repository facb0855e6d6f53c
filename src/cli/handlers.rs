use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use super::picker::TerminalPicker;
use crate::autosave::AutosaveCoordinator;
use crate::config::{Config, DATA_DIR};
use crate::entity::{create_scrip, Scrip, TimeSpan};
use crate::error::{Result, ScripError};
use crate::gateway::SqliteGateway;
use crate::store::Store;
use crate::warnings::{check_all, format_warning};

/// Where the store lives, from the global command-line flags.
pub struct Context {
    data_dir: PathBuf,
    database: Option<String>,
}

/// An opened, loaded store plus the config it was opened with.
struct App {
    store: Arc<Store>,
    config: Config,
}

impl Context {
    pub fn new(data_dir: Option<PathBuf>, database: Option<String>) -> Self {
        Self {
            data_dir: data_dir.unwrap_or_else(|| PathBuf::from(DATA_DIR)),
            database,
        }
    }

    fn config(&self) -> Result<Config> {
        let mut config = Config::load(&self.data_dir)?;
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        Ok(config)
    }

    async fn open(&self) -> Result<App> {
        if !self.data_dir.is_dir() {
            return Err(ScripError::NotInitialized);
        }
        let config = self.config()?;
        let target = config.database_target(&self.data_dir);
        debug!(target = %target, "opening store");
        let store = Store::new(SqliteGateway::new(target))
            .with_export_file_name(config.export_file_name.clone());
        store.initialize().await?;
        Ok(App {
            store: Arc::new(store),
            config,
        })
    }
}

fn require(store: &Store, id: i64) -> Result<Scrip> {
    store
        .scrip_by_id(id)
        .ok_or_else(|| ScripError::NotFound(format!("{:03}", id)))
}

fn id_label(scrip: &Scrip) -> String {
    scrip
        .id
        .map(|id| format!("{:03}", id))
        .unwrap_or_else(|| "---".to_string())
}

fn span_label(scrip: &Scrip) -> String {
    scrip
        .time_span
        .map(|span| span.to_string())
        .unwrap_or_else(|| "no time span".to_string())
}

fn print_warnings(scrips: &[Scrip]) {
    for warning in check_all(scrips) {
        eprintln!("{}", format_warning(&warning));
    }
}

pub async fn handle_init(ctx: &Context) -> Result<()> {
    if ctx.data_dir.join("config.yaml").exists() {
        return Err(ScripError::AlreadyInitialized);
    }
    fs::create_dir_all(&ctx.data_dir)?;
    Config::default().save(&ctx.data_dir)?;

    let app = ctx.open().await?;
    info!(data_dir = %ctx.data_dir.display(), "initialized");
    println!(
        "Initialized scrip store in {} ({} scrips)",
        ctx.data_dir.display(),
        app.store.scrips().len()
    );
    Ok(())
}

pub async fn handle_add(
    ctx: &Context,
    name: String,
    description: String,
    kinds: Vec<String>,
    start: NaiveDate,
    end: NaiveDate,
    json: bool,
) -> Result<()> {
    let app = ctx.open().await?;
    let scrip = create_scrip(name, description, kinds, start, end, Local::now().date_naive());
    let scrips = app.store.create(scrip).await?;
    let created = scrips
        .first()
        .ok_or_else(|| ScripError::Statement("insert returned no rows".to_string()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(created)?);
    } else {
        println!("Created scrip {} - {}", id_label(created), created.name);
    }
    print_warnings(std::slice::from_ref(created));
    Ok(())
}

pub async fn handle_list(ctx: &Context, json: bool) -> Result<()> {
    let app = ctx.open().await?;
    let scrips = app.store.scrips();

    if json {
        println!("{}", serde_json::to_string_pretty(&scrips)?);
    } else if scrips.is_empty() {
        println!("No scrips found.");
    } else {
        println!("Scrips:\n");
        for s in &scrips {
            println!(
                "  {} [{}] {}  ({}, streak: {} days)",
                id_label(s),
                s.primary_kind().unwrap_or("-"),
                s.name,
                span_label(s),
                s.streak.len()
            );
        }
    }
    print_warnings(&scrips);
    Ok(())
}

pub async fn handle_get(ctx: &Context, id: i64, json: bool) -> Result<()> {
    let app = ctx.open().await?;
    let scrip = require(&app.store, id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&scrip)?);
        return Ok(());
    }

    println!("{} {}", id_label(&scrip), scrip.name);
    if !scrip.description.is_empty() {
        println!("  {}", scrip.description);
    }
    println!("  type:    {}", scrip.kind.join(", "));
    println!("  span:    {}", span_label(&scrip));
    println!("  created: {}", scrip.created_at);
    println!("  streak:  {} days", scrip.streak.len());

    let mut entries = scrip.streak.clone();
    entries.sort_by_key(|e| e.date);
    for entry in entries {
        if entry.note.is_empty() {
            println!("    {}", entry.date);
        } else {
            println!("    {}  {}", entry.date, entry.note.replace('\n', "\n                "));
        }
    }
    print_warnings(std::slice::from_ref(&scrip));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn handle_edit(
    ctx: &Context,
    id: i64,
    name: Option<String>,
    description: Option<String>,
    kinds: Vec<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let app = ctx.open().await?;
    let mut scrip = require(&app.store, id)?;

    if let Some(name) = name {
        scrip.name = name;
    }
    if let Some(description) = description {
        scrip.description = description;
    }
    if !kinds.is_empty() {
        scrip.kind = kinds;
    }
    if start.is_some() || end.is_some() {
        let current = scrip.time_span;
        let start = start.or(current.map(|s| s.start));
        let end = end.or(current.map(|s| s.end));
        match (start, end) {
            (Some(start), Some(end)) => scrip.time_span = Some(TimeSpan::new(start, end)),
            _ => {
                return Err(ScripError::InvalidInput(
                    "this scrip has no time span; pass both --start and --end".to_string(),
                ))
            }
        }
    }

    app.store.update(scrip).await?;
    let updated = require(&app.store, id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("Updated scrip {} - {}", id_label(&updated), updated.name);
    }
    print_warnings(std::slice::from_ref(&updated));
    Ok(())
}

pub async fn handle_delete(ctx: &Context, id: i64, force: bool) -> Result<()> {
    let app = ctx.open().await?;
    let scrip = require(&app.store, id)?;

    // Confirm deletion unless --force is used
    if !force {
        eprintln!("Delete scrip {} - {}? [y/N] ", id_label(&scrip), scrip.name);

        if atty::is(atty::Stream::Stdin) {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Ok(());
            }
        } else {
            return Err(ScripError::InvalidInput(
                "Use --force to delete in non-interactive mode".to_string(),
            ));
        }
    }

    let remaining = app.store.delete(id).await?;
    println!(
        "Deleted scrip {} - {} ({} left)",
        id_label(&scrip),
        scrip.name,
        remaining.len()
    );
    Ok(())
}

pub async fn handle_mark(ctx: &Context, id: i64, date: NaiveDate) -> Result<()> {
    let app = ctx.open().await?;
    let outcome = app.store.toggle_day(id, date).await?;
    let scrip = require(&app.store, id)?;
    println!(
        "{}: {} {} (streak: {} days)",
        id_label(&scrip),
        date,
        outcome,
        scrip.streak.len()
    );
    Ok(())
}

pub async fn handle_note(
    ctx: &Context,
    id: i64,
    date: NaiveDate,
    text: Option<String>,
    stdin: bool,
) -> Result<()> {
    let app = ctx.open().await?;
    require(&app.store, id)?;

    let autosave = AutosaveCoordinator::new(Arc::clone(&app.store), id, app.config.autosave_delay());
    let Some(entry) = autosave.select_day(date).await? else {
        return Err(ScripError::NotFound(format!(
            "{} on scrip {:03} is not marked; run 'scrip mark {} {}' first",
            date, id, id, date
        )));
    };

    if let Some(text) = text {
        autosave.edit_note(text);
        autosave.teardown().await?;
        println!("Saved note for {} on scrip {:03}", date, id);
    } else if stdin {
        let saved = edit_from_stdin(autosave, entry.note).await?;
        if saved {
            println!("Saved note for {} on scrip {:03}", date, id);
        }
    } else if entry.note.is_empty() {
        println!("No note for {}.", date);
    } else {
        println!("{}", entry.note);
    }
    Ok(())
}

/// Append stdin lines to the note, letting the coordinator save in the
/// background. EOF tears the view down; Ctrl-C flushes before exiting.
async fn edit_from_stdin(autosave: AutosaveCoordinator, initial: String) -> Result<bool> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut note = initial;
    let mut edited = false;

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !note.is_empty() {
                        note.push('\n');
                    }
                    note.push_str(&line);
                    autosave.edit_note(note.clone());
                    edited = true;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, saving note");
                break;
            }
        }
    }

    autosave.teardown().await?;
    Ok(edited)
}

pub async fn handle_export(ctx: &Context, output: Option<PathBuf>) -> Result<()> {
    let app = ctx.open().await?;
    let picker = TerminalPicker::new(output);
    match app.store.export(&picker).await? {
        Some(path) => println!(
            "Exported {} scrips to {}",
            app.store.scrips().len(),
            path.display()
        ),
        None => println!("Export cancelled."),
    }
    Ok(())
}

pub async fn handle_import(ctx: &Context, input: Option<PathBuf>) -> Result<()> {
    let app = ctx.open().await?;
    let picker = TerminalPicker::new(input);
    match app.store.import(&picker).await? {
        Some(scrips) => {
            println!("Imported {} scrips; previous rows were replaced.", scrips.len());
            print_warnings(&scrips);
        }
        None => println!("Import cancelled."),
    }
    Ok(())
}

//! CLI entry point for the CRM core.

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use crm_core::aggregate::{DashboardMetrics, PipelineBoard, move_deal, tasks};
use crm_core::email::{self, EmailDraft};
use crm_core::export::export_to_dir;
use crm_core::filter::{FileStore, FilterPresets, FilterSpec, Selection, apply, search_deals, search_leads};
use crm_core::import::{ClosureProgressReporter, ContactField, FieldMapping, ProgressUpdate};
use crm_core::{
    BulkImporter, CrmConfig, CrmEvent, CrmStore, DealStage, EmailTemplate, EventBus, ImportSession,
    LeadStatus, Repository,
};
use dotenv::dotenv;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    author = "CRM Core Team",
    version,
    about = "Contacts, deals and pipeline from the command line",
    long_about = "Manage a local CRM workspace: import and export contacts, filter deals, \
                  move deals through the pipeline, view dashboard metrics and draft emails from templates.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  CRM_DATA_DIR    Workspace directory (overridden by --data-dir)\n\n\
                  EXAMPLES:\n  \
                  # Preview an import without creating anything\n  \
                  crm import contacts.csv --dry-run\n\n  \
                  # Override an auto-mapped column\n  \
                  crm import contacts.csv --map email=\"Work Email\"\n\n  \
                  # Deals worth at least 150 in the proposal stage\n  \
                  crm deals --stage Proposal --min 150"
)]
struct Cli {
    /// Workspace directory holding records and presets
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Only show warnings, errors and results
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print results as JSON; disables logging
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import contacts from a CSV file
    Import {
        /// CSV file to import
        file: PathBuf,

        /// Map a contact field to a column, e.g. `--map email="Work Email"`.
        /// An empty column unmaps the field.
        #[arg(long = "map", value_parser = parse_mapping)]
        mappings: Vec<(ContactField, String)>,

        /// Show the mapping and preview without creating contacts
        #[arg(long)]
        dry_run: bool,
    },

    /// Export all contacts to `<prefix>_<date>.csv`
    Export {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// List deals matching a search and filters
    Deals {
        #[command(flatten)]
        filters: FilterArgs,

        /// Apply a saved filter preset before the other filters
        #[arg(long)]
        preset: Option<String>,
    },

    /// List leads by search text and status
    Leads {
        /// Text to find in name, company or email
        #[arg(short, long, default_value = "")]
        search: String,

        /// "All" or one lead status
        #[arg(long, default_value = "All")]
        status: Selection<LeadStatus>,
    },

    /// Show the deal pipeline by stage
    Board,

    /// Move a deal to another stage
    MoveDeal {
        id: i64,
        stage: DealStage,
    },

    /// Show dashboard metrics
    Dashboard,

    /// Manage saved deal filter presets
    Presets {
        #[command(subcommand)]
        action: PresetAction,
    },

    /// List tasks
    Tasks {
        /// Only tasks that are overdue
        #[arg(long)]
        overdue: bool,

        /// Mark a task complete
        #[arg(long, value_name = "ID")]
        complete: Option<i64>,
    },

    /// Manage email templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Compose an email draft, optionally from a template, and check it
    Compose {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Template id to start from
        #[arg(long)]
        template: Option<i64>,

        /// Recipient name for the `[Contact Name]` placeholder
        #[arg(long, default_value = "")]
        name: String,

        /// Subject; overrides the template's
        #[arg(long)]
        subject: Option<String>,

        /// Message body; overrides the template's
        #[arg(long)]
        message: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TemplateAction {
    /// List templates
    List,
    /// Add a template
    Add {
        name: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
        #[arg(long, default_value = "")]
        category: String,
    },
    /// Delete a template
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum PresetAction {
    /// List saved presets
    List,
    /// Save the given filters under a name
    Save {
        name: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Delete a preset
    Delete { name: String },
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Text to find in deal name or notes
    #[arg(short, long, default_value = "")]
    search: String,

    /// "All" or one deal stage
    #[arg(long, default_value = "All")]
    stage: Selection<DealStage>,

    /// Created on or after this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Created on or before this date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Minimum deal value
    #[arg(long)]
    min: Option<f64>,

    /// Maximum deal value
    #[arg(long)]
    max: Option<f64>,

    /// Last contacted on or after this date (YYYY-MM-DD)
    #[arg(long)]
    contacted_since: Option<NaiveDate>,

    /// Field must contain text, e.g. `--field notes=renewal`
    #[arg(long = "field", value_parser = parse_key_value)]
    fields: Vec<(String, String)>,
}

impl FilterArgs {
    /// Overlay these arguments onto `base`.
    fn to_spec(&self, base: FilterSpec) -> FilterSpec {
        let mut spec = base;
        if self.from.is_some() || self.to.is_some() {
            spec = spec.date_range(self.from, self.to);
        }
        if self.min.is_some() || self.max.is_some() {
            spec = spec.value_range(self.min, self.max);
        }
        if let Some(date) = self.contacted_since {
            spec = spec.last_contact_since(date);
        }
        for (key, needle) in &self.fields {
            spec = spec.custom_field(key, needle);
        }
        spec
    }
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn parse_mapping(s: &str) -> std::result::Result<(ContactField, String), String> {
    let (field, column) = parse_key_value(s)?;
    Ok((field.parse()?, column))
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<CrmConfig> {
    let mut config = match &cli.config {
        Some(path) => CrmConfig::from_file(path)
            .with_context(|| format!("Loading config {}", path.display()))?,
        None => CrmConfig::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    } else if let Ok(dir) = std::env::var("CRM_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }

    config.validate()?;
    debug!(?config, "Configuration loaded");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.quiet, cli.json);

    // Load environment variables from .env file
    dotenv().ok();

    let config = load_config(&cli)?;
    let store = CrmStore::load(&config.snapshot_path())?;

    let events = EventBus::new();
    events.subscribe(|event| {
        if let CrmEvent::Error { code, message } = event {
            error!(code = code.as_str(), "{message}");
        }
    });

    match &cli.command {
        Command::Import {
            file,
            mappings,
            dry_run,
        } => run_import(&cli, &config, &store, &events, file, mappings, *dry_run),
        Command::Export { output } => {
            let contacts = store.contacts.list()?;
            let _loading = events.loading("Exporting contacts...");
            let path = export_to_dir(
                &contacts,
                output,
                &config.export_prefix,
                Utc::now().date_naive(),
            )?;
            emit(&cli, &path.display().to_string(), || {
                println!("Exported {} contacts to {}", contacts.len(), path.display());
            })
        }
        Command::Deals { filters, preset } => {
            let mut base = FilterSpec::default();
            if let Some(name) = preset {
                let presets = FilterPresets::load(FileStore::new(&config.data_dir))?;
                base = presets
                    .get(name)
                    .ok_or_else(|| anyhow!("No filter preset named '{name}'"))?
                    .filters
                    .clone();
            }
            let spec = filters.to_spec(base);
            let searched = search_deals(&store.deals.list()?, &filters.search, filters.stage);
            let deals = apply(&searched, &spec);
            emit(&cli, &deals, || {
                println!("{:<6} {:<30} {:<12} {:>12}", "Id", "Name", "Stage", "Value");
                println!("{}", "-".repeat(63));
                for deal in &deals {
                    println!(
                        "{:<6} {:<30} {:<12} {:>12.2}",
                        deal.id,
                        truncate_str(&deal.name, 29),
                        deal.stage,
                        deal.value.unwrap_or(0.0)
                    );
                }
                println!("{} deals", deals.len());
            })
        }
        Command::Leads { search, status } => {
            let leads = search_leads(&store.leads.list()?, search, *status);
            emit(&cli, &leads, || {
                for lead in &leads {
                    println!(
                        "{:<6} {:<24} {:<20} {:<12}",
                        lead.id,
                        truncate_str(&lead.name, 23),
                        truncate_str(&lead.company, 19),
                        lead.status
                    );
                }
                println!("{} leads", leads.len());
            })
        }
        Command::Board => {
            let board = PipelineBoard::from_deals(&store.deals.list()?);
            emit(&cli, &board, || {
                for column in &board.columns {
                    println!(
                        "{:<12} {:>3} deals  {:>12.2}",
                        column.stage,
                        column.deals.len(),
                        column.total_value
                    );
                    for deal in &column.deals {
                        println!("    #{} {}", deal.id, deal.name);
                    }
                }
            })
        }
        Command::MoveDeal { id, stage } => {
            let deal = move_deal(&store.deals, *id, *stage, Some(&events))?;
            store.save(&config.snapshot_path())?;
            emit(&cli, &deal, || println!("Deal #{} is now {}", deal.id, deal.stage))
        }
        Command::Dashboard => {
            let metrics = DashboardMetrics::from_store(&store, Utc::now(), &config)?;
            emit(&cli, &metrics, || print_dashboard(&metrics))
        }
        Command::Presets { action } => run_presets(&cli, &config, action),
        Command::Tasks { overdue, complete } => {
            if let Some(id) = complete {
                tasks::mark_complete(&store.tasks, *id, Utc::now())?;
                store.save(&config.snapshot_path())?;
            }
            let all = store.tasks.list()?;
            let listed = if *overdue {
                tasks::overdue(&all, Utc::now())
            } else {
                tasks::pending(&all)
            };
            emit(&cli, &listed, || {
                for task in &listed {
                    println!(
                        "{:<6} {:<36} due {}",
                        task.id,
                        truncate_str(&task.title, 35),
                        task.due_date.format("%Y-%m-%d")
                    );
                }
                println!("{} tasks", listed.len());
            })
        }
        Command::Templates { action } => run_templates(&cli, &config, &store, action),
        Command::Compose {
            to,
            template,
            name,
            subject,
            message,
        } => {
            let mut draft = match template {
                Some(id) => EmailDraft::from_template(to.as_str(), &store.templates.require(*id)?, name),
                None => EmailDraft::new(to.as_str(), "", ""),
            };
            if let Some(subject) = subject {
                draft.subject = subject.clone();
            }
            if let Some(message) = message {
                draft.message = message.clone();
            }
            draft.validate()?;
            emit(&cli, &draft, || {
                println!("To:      {}", draft.to);
                println!("Subject: {}", draft.subject);
                println!("{}", "-".repeat(40));
                println!("{}", draft.message);
            })
        }
    }
}

fn run_import(
    cli: &Cli,
    config: &CrmConfig,
    store: &CrmStore,
    events: &EventBus,
    file: &Path,
    mappings: &[(ContactField, String)],
    dry_run: bool,
) -> Result<()> {
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Not a file: {}", file.display()))?;
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Reading {}", file.display()))?;

    let mut session = ImportSession::new(config.preview_rows);
    session.load(&file_name, &text)?;

    let mut overrides = FieldMapping::new();
    for (field, column) in mappings {
        if column.is_empty() {
            session.clear_mapping(*field)?;
        } else {
            overrides.set(*field, column.as_str());
        }
    }
    session.apply_mapping(&overrides)?;

    let preview = session.preview()?;
    if dry_run {
        return emit(cli, &preview, || {
            println!("\n{}", "=".repeat(60));
            println!("DRY RUN - {} rows in {}", preview.total_rows, file_name);
            println!("{}\n", "=".repeat(60));
            println!("MAPPING");
            println!("{}", "-".repeat(40));
            for (field, column) in session.mapping().iter() {
                println!("  {:<16} <- {}", field.label(), column);
            }
            println!("\nPREVIEW");
            println!("{}", "-".repeat(40));
            for (index, candidate) in preview.candidates.iter().enumerate() {
                let name = candidate.get(ContactField::Name).unwrap_or_default();
                let email = candidate.get(ContactField::Email).unwrap_or_default();
                println!("  {}. {} <{}>", index + 1, name, email);
            }
            for warning in &preview.warnings {
                println!("  WARNING row {}: {}", warning.row, warning.message);
            }
        });
    }

    let show_progress = !cli.quiet && !cli.json;
    let reporter = ClosureProgressReporter::new(move |update: ProgressUpdate| {
        if show_progress {
            println!("[{:>3.0}%] {}", update.progress * 100.0, update.message);
        }
    });
    let importer = BulkImporter::new(config)
        .with_progress(&reporter)
        .with_events(events);
    // Rows created before a failed create are saved too.
    let outcome = session.commit(&store.contacts, &importer);
    let report = store.save_with(&config.snapshot_path(), outcome)?;
    info!(created = report.created_count(), "Import saved");

    emit(cli, &report, || {
        println!("Imported {} contacts", report.created_count());
        for warning in &report.warnings {
            println!("  WARNING {warning}");
        }
    })
}

fn run_templates(cli: &Cli, config: &CrmConfig, store: &CrmStore, action: &TemplateAction) -> Result<()> {
    match action {
        TemplateAction::List => {
            let templates = store.templates.list()?;
            emit(cli, &templates, || {
                for template in &templates {
                    println!(
                        "{:<6} {:<24} {:<12} {}",
                        template.id,
                        truncate_str(&template.name, 23),
                        template.category,
                        template.subject
                    );
                }
            })
        }
        TemplateAction::Add {
            name,
            subject,
            body,
            category,
        } => {
            let mut template = EmailTemplate::new(name.as_str(), subject.as_str(), body.as_str());
            template.category = category.clone();
            let created = email::create_template(&store.templates, template)?;
            store.save(&config.snapshot_path())?;
            emit(cli, &created, || println!("Template #{} saved", created.id))
        }
        TemplateAction::Delete { id } => {
            store.templates.delete(*id)?;
            store.save(&config.snapshot_path())?;
            emit(cli, id, || println!("Deleted template #{id}"))
        }
    }
}

fn run_presets(cli: &Cli, config: &CrmConfig, action: &PresetAction) -> Result<()> {
    let mut presets = FilterPresets::load(FileStore::new(&config.data_dir))?;
    match action {
        PresetAction::List => emit(cli, &presets.list(), || {
            for preset in presets.list() {
                println!("{}", preset.name);
            }
        }),
        PresetAction::Save { name, filters } => {
            presets.save(name, filters.to_spec(FilterSpec::default()))?;
            emit(cli, &presets.list(), || println!("Saved preset '{}'", name.trim()))
        }
        PresetAction::Delete { name } => {
            let removed = presets.delete(name)?;
            emit(cli, &removed, || {
                if removed {
                    println!("Deleted preset '{name}'");
                } else {
                    println!("No preset named '{name}'");
                }
            })
        }
    }
}

/// Print `value` as JSON under `--json`, otherwise run the human-readable printer.
///
/// Uses `println!` deliberately: results are the command's output, not log lines.
fn emit<T: Serialize + ?Sized>(cli: &Cli, value: &T, human: impl FnOnce()) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}

fn print_dashboard(metrics: &DashboardMetrics) {
    println!("\n{}", "=".repeat(60));
    println!("DASHBOARD");
    println!("{}\n", "=".repeat(60));
    println!(
        "  Contacts: {}  Companies: {}  Leads: {}  Deals: {}  Tasks: {}",
        metrics.counts.contacts,
        metrics.counts.companies,
        metrics.counts.leads,
        metrics.counts.deals,
        metrics.counts.tasks
    );
    println!("  Total deal value:   {:>12.2}", metrics.total_deal_value);
    println!(
        "  Active deal value:  {:>12.2} ({} deals)",
        metrics.active_deal_value, metrics.active_deal_count
    );
    println!("  Average deal size:  {:>12.2}", metrics.average_deal_size);
    println!("  Win rate:           {:>11.1}%", metrics.win_rate * 100.0);
    println!("  Conversion rate:    {:>11.1}%", metrics.conversion_rate * 100.0);

    println!("\nPIPELINE");
    println!("{}", "-".repeat(40));
    for (stage, count) in &metrics.deal_stage_counts {
        let share = metrics.deal_stage_share.get(stage).copied().unwrap_or(0.0);
        println!("  {:<12} {:>4} ({:.0}%)", stage, count, share * 100.0);
    }

    println!("\nRECENT ACTIVITY");
    println!("{}", "-".repeat(40));
    for entry in &metrics.recent_activities {
        println!(
            "  {} {:?} with {} ({})",
            entry.activity.date.format("%Y-%m-%d"),
            entry.activity.activity_type,
            entry.entity_name,
            entry.entity_type
        );
    }

    println!("\nUPCOMING FOLLOW-UPS");
    println!("{}", "-".repeat(40));
    for entry in &metrics.upcoming_follow_ups {
        println!(
            "  {} {}",
            entry.activity.date.format("%Y-%m-%d %H:%M"),
            entry.entity_name
        );
    }

    println!("\nOVERDUE TASKS");
    println!("{}", "-".repeat(40));
    for task in &metrics.overdue_tasks {
        println!("  {} (due {})", task.title, task.due_date.format("%Y-%m-%d"));
    }
}

/// Truncate a string to `max_len` characters, adding "…" when cut.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

//! Energo Control CLI
//!
//! Command-line host for the incident record engine. Every command opens the
//! workspace database, calls one session operation and prints the result as
//! JSON on stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use energo_core::analytics::{AggregationKind, DateWindow};
use energo_core::domain::{
    BrigadePatch, DeleteConfirmation, EquipmentPatch, IncidentPatch, IncidentStatus, NewBrigade,
    NewEquipment, NewIncident,
};
use energo_core::export::render_incidents_csv;
use energo_core::query::{EntityKind, FilterSpec, SortDirection, SortSpec};
use energo_core::workspace::{OpenMode, WorkspaceConfig};
use energo_core::Session;

/// Energo Control - register, triage and report on grid incidents
#[derive(Parser, Debug)]
#[command(name = "energo")]
#[command(about = "Track grid incidents, brigades and equipment", long_about = None)]
#[command(version)]
struct Cli {
    /// Workspace database file
    #[arg(long, global = true, env = "ENERGO_DB", default_value = "energo_control.db")]
    db: PathBuf,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a fresh workspace database
    Init,
    /// Show workspace path and row counts
    Info,
    /// Fill the workspace with a deterministic demo dataset
    SeedDemo,
    #[command(subcommand)]
    Incidents(IncidentCommand),
    #[command(subcommand)]
    Brigades(BrigadeCommand),
    #[command(subcommand)]
    Equipment(EquipmentCommand),
    /// Aggregate incidents registered within a date window
    Report {
        #[arg(value_enum)]
        kind: ReportKind,
        /// First registration date included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Last registration date included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Write the filtered incident list to a CSV file
    Export {
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
        #[command(flatten)]
        list: ListArgs,
        #[command(flatten)]
        filter: IncidentFilterArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct ListArgs {
    /// Case-sensitive text searched in the entity's text columns
    #[arg(long)]
    search: Option<String>,
    /// Column to sort by
    #[arg(long)]
    sort: Option<String>,
    /// Sort descending
    #[arg(long)]
    desc: bool,
}

#[derive(Args, Debug, Clone, Default)]
struct IncidentFilterArgs {
    #[arg(long, value_enum)]
    status: Option<StatusArg>,
    #[arg(long = "type")]
    incident_type: Option<String>,
    /// Include resolved incidents (hidden by default unless --status is given)
    #[arg(long)]
    all: bool,
}

impl IncidentFilterArgs {
    fn to_filter(&self, list: &ListArgs) -> FilterSpec {
        FilterSpec {
            search: list.search.clone(),
            status: self.status.map(IncidentStatus::from),
            incident_type: self.incident_type.clone(),
            active_only: !self.all && self.status.is_none(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum IncidentCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
        #[command(flatten)]
        filter: IncidentFilterArgs,
    },
    Show {
        id: i64,
    },
    Add {
        #[arg(long = "type")]
        incident_type: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        consumers: Option<String>,
        #[arg(long)]
        brigade: Option<String>,
    },
    /// Change editable fields; pass an empty string to clear an optional one
    Edit {
        id: i64,
        #[arg(long = "type")]
        incident_type: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        consumers: Option<String>,
        #[arg(long)]
        brigade: Option<String>,
    },
    /// Move an incident to a new status
    Status {
        id: i64,
        #[arg(value_enum)]
        target: StatusArg,
    },
    Delete {
        id: i64,
        /// Confirm the irreversible delete
        #[arg(long)]
        yes: bool,
    },
    /// List distinct incident types
    Types,
}

#[derive(Subcommand, Debug)]
enum BrigadeCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    Show {
        id: i64,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        specialization: Option<String>,
        #[arg(long)]
        contact: Option<String>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        specialization: Option<String>,
        #[arg(long)]
        contact: Option<String>,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum EquipmentCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    Show {
        id: i64,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long = "type")]
        equipment_type: String,
        #[arg(long)]
        serial: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        installed: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        maintained: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        equipment_type: Option<String>,
        #[arg(long)]
        serial: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        installed: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        maintained: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum StatusArg {
    Registered,
    InProgress,
    Resolved,
}

impl From<StatusArg> for IncidentStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Registered => IncidentStatus::Registered,
            StatusArg::InProgress => IncidentStatus::InProgress,
            StatusArg::Resolved => IncidentStatus::Resolved,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ReportKind {
    ByType,
    ByStatus,
    Daily,
    ByBrigade,
    Duration,
}

impl From<ReportKind> for AggregationKind {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::ByType => AggregationKind::ByType,
            ReportKind::ByStatus => AggregationKind::ByStatus,
            ReportKind::Daily => AggregationKind::DailyRegistrations,
            ReportKind::ByBrigade => AggregationKind::ByBrigade,
            ReportKind::Duration => AggregationKind::ResolutionDuration,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    log::debug!("Energo Control CLI v{}", env!("CARGO_PKG_VERSION"));

    let mode = match cli.command {
        Command::Init => OpenMode::CreateNew,
        _ => OpenMode::OpenOrCreate,
    };
    let config = WorkspaceConfig::new(&cli.db).with_mode(mode);
    let mut session = Session::open(&config)
        .with_context(|| format!("Cannot open workspace {}", cli.db.display()))?;

    run(&mut session, &cli.db, cli.command)
}

fn run(session: &mut Session, db: &std::path::Path, command: Command) -> Result<()> {
    match command {
        Command::Init | Command::Info => print_json(&session.metadata(db)?),
        Command::SeedDemo => print_json(&session.seed_demo()?),
        Command::Incidents(cmd) => run_incidents(session, cmd),
        Command::Brigades(cmd) => run_brigades(session, cmd),
        Command::Equipment(cmd) => run_equipment(session, cmd),
        Command::Report { kind, from, to } => {
            let window = DateWindow { start: from, end: to };
            print_json(&session.aggregate_incidents(&window, kind.into())?)
        }
        Command::Export { out, list, filter } => {
            let filter = filter.to_filter(&list);
            let rows = session.export_incidents(&filter, &sort_spec(EntityKind::Incident, &list))?;
            let csv = render_incidents_csv(&rows)?;
            std::fs::write(&out, csv)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            log::info!("Exported {} incidents to {}", rows.len(), out.display());
            Ok(())
        }
    }
}

fn run_incidents(session: &mut Session, cmd: IncidentCommand) -> Result<()> {
    match cmd {
        IncidentCommand::List { list, filter } => {
            let spec = filter.to_filter(&list);
            print_json(&session.list_incidents(&spec, &sort_spec(EntityKind::Incident, &list))?)
        }
        IncidentCommand::Show { id } => print_json(&session.get_incident(id)?),
        IncidentCommand::Add {
            incident_type,
            description,
            location,
            consumers,
            brigade,
        } => print_json(&session.create_incident(NewIncident {
            incident_type,
            description,
            location,
            affected_consumers: consumers,
            assigned_brigade: brigade,
        })?),
        IncidentCommand::Edit {
            id,
            incident_type,
            description,
            location,
            consumers,
            brigade,
        } => print_json(&session.update_incident(
            id,
            IncidentPatch {
                incident_type,
                description,
                location,
                affected_consumers: consumers,
                assigned_brigade: brigade,
            },
        )?),
        IncidentCommand::Status { id, target } => {
            print_json(&session.transition_incident_status(id, target.into())?)
        }
        IncidentCommand::Delete { id, yes } => {
            session.delete_incident(id, confirm(yes)?)?;
            Ok(())
        }
        IncidentCommand::Types => print_json(&session.list_distinct_incident_types()?),
    }
}

fn run_brigades(session: &mut Session, cmd: BrigadeCommand) -> Result<()> {
    match cmd {
        BrigadeCommand::List { list } => print_json(&session.list_brigades(
            &FilterSpec {
                search: list.search.clone(),
                ..FilterSpec::default()
            },
            &sort_spec(EntityKind::Brigade, &list),
        )?),
        BrigadeCommand::Show { id } => print_json(&session.get_brigade(id)?),
        BrigadeCommand::Add {
            name,
            specialization,
            contact,
        } => print_json(&session.create_brigade(NewBrigade {
            name,
            specialization,
            contact_info: contact,
        })?),
        BrigadeCommand::Edit {
            id,
            name,
            specialization,
            contact,
        } => print_json(&session.update_brigade(
            id,
            BrigadePatch {
                name,
                specialization,
                contact_info: contact,
            },
        )?),
        BrigadeCommand::Delete { id, yes } => {
            session.delete_brigade(id, confirm(yes)?)?;
            Ok(())
        }
    }
}

fn run_equipment(session: &mut Session, cmd: EquipmentCommand) -> Result<()> {
    match cmd {
        EquipmentCommand::List { list } => print_json(&session.list_equipment(
            &FilterSpec {
                search: list.search.clone(),
                ..FilterSpec::default()
            },
            &sort_spec(EntityKind::Equipment, &list),
        )?),
        EquipmentCommand::Show { id } => print_json(&session.get_equipment(id)?),
        EquipmentCommand::Add {
            name,
            equipment_type,
            serial,
            model,
            installed,
            status,
            maintained,
            location,
        } => print_json(&session.create_equipment(NewEquipment {
            name,
            equipment_type,
            model,
            serial_number: serial,
            installation_date: installed,
            status,
            last_maintenance_date: maintained,
            location,
        })?),
        EquipmentCommand::Edit {
            id,
            name,
            equipment_type,
            serial,
            model,
            installed,
            status,
            maintained,
            location,
        } => print_json(&session.update_equipment(
            id,
            EquipmentPatch {
                name,
                equipment_type,
                model,
                serial_number: serial,
                installation_date: installed,
                status,
                last_maintenance_date: maintained,
                location,
            },
        )?),
        EquipmentCommand::Delete { id, yes } => {
            session.delete_equipment(id, confirm(yes)?)?;
            Ok(())
        }
    }
}

fn sort_spec(kind: EntityKind, list: &ListArgs) -> SortSpec {
    match &list.sort {
        Some(column) => {
            let direction = if list.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            SortSpec::new(column.clone(), direction)
        }
        None => SortSpec::default_for(kind),
    }
}

fn confirm(yes: bool) -> Result<DeleteConfirmation> {
    if !yes {
        anyhow::bail!("Delete is irreversible; pass --yes to confirm");
    }
    Ok(DeleteConfirmation::confirmed())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize logging based on verbosity
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

//! genmeta CLI - browse a database structure graph
//!
//! Usage:
//!   genmeta tree (--source <name> | --sqlite <path> | --snapshot <path>) [--columns]
//!   genmeta table (--source <name> | --sqlite <path> | --snapshot <path>) <table>
//!   genmeta types (--source <name> | --sqlite <path> | --snapshot <path>)
//!
//! Examples:
//!   genmeta tree --sqlite ./shop.db --columns
//!   genmeta table --source crm sales.orders
//!   genmeta types --snapshot fixtures/crm.json --dialect mysql

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use genmeta::config::{Settings, SourceKind};
use genmeta::datasource::{DataSource, DataSourceConfig, Topology};
use genmeta::dialect::{self, Dialect};
use genmeta::model::{Container, Table};
use genmeta::monitor::{LoggingMonitor, ProgressMonitor};
use genmeta::session::ContextProvider;
use genmeta::sources::{SnapshotSource, SqliteSource};
use genmeta::MetaResult;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genmeta")]
#[command(about = "genmeta - Browse database structure reconciled from driver metadata")]
#[command(version)]
struct Cli {
    /// Config file (defaults to GENMETA_CONFIG, ./genmeta.toml, ~/.genmeta/genmeta.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the catalog/schema/table tree
    Tree {
        #[command(flatten)]
        source: SourceArgs,

        /// Include columns under each table
        #[arg(long)]
        columns: bool,
    },

    /// Describe one table: columns, keys, indexes, references, triggers
    Table {
        #[command(flatten)]
        source: SourceArgs,

        /// Table name, optionally qualified as catalog.schema.table
        name: String,
    },

    /// List the table types reported by the source
    Types {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Named data source from the settings file
    #[arg(long, short = 's')]
    source: Option<String>,

    /// Open an SQLite database directly
    #[arg(long, conflicts_with_all = ["source", "snapshot"])]
    sqlite: Option<PathBuf>,

    /// Open a JSON metadata snapshot directly
    #[arg(long, conflicts_with_all = ["source", "sqlite"])]
    snapshot: Option<PathBuf>,

    /// Dialect for direct sources ("generic", "mysql")
    #[arg(long, default_value = "generic")]
    dialect: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings.logging.level);

    let result = match cli.command {
        Commands::Tree { source, columns } => cmd_tree(&settings, &source, columns),
        Commands::Table { source, name } => cmd_table(&settings, &source, &name),
        Commands::Types { source } => cmd_types(&settings, &source),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` first, then the configured level, then `info`.
fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn open_data_source(settings: &Settings, args: &SourceArgs) -> CliResult<Arc<DataSource>> {
    let (config, provider, dialect_name) = if let Some(path) = &args.sqlite {
        let provider: Arc<dyn ContextProvider> = Arc::new(SqliteSource::open(path)?);
        (DataSourceConfig::new(file_stem(path)), provider, args.dialect.clone())
    } else if let Some(path) = &args.snapshot {
        let provider: Arc<dyn ContextProvider> = Arc::new(SnapshotSource::open(path)?);
        (DataSourceConfig::new(file_stem(path)), provider, args.dialect.clone())
    } else {
        let name = args
            .source
            .as_deref()
            .ok_or("no data source given; use --source, --sqlite or --snapshot")?;
        let ds = settings.data_source(name)?;
        let path = ds.resolved_path()?;
        let provider: Arc<dyn ContextProvider> = match ds.source {
            SourceKind::Sqlite => Arc::new(SqliteSource::open(&path)?),
            SourceKind::Snapshot => Arc::new(SnapshotSource::open(&path)?),
        };
        (ds.to_config(name), provider, ds.dialect_name().to_string())
    };

    let dialect: Arc<dyn Dialect> = dialect::by_name(&dialect_name)
        .ok_or_else(|| format!("unsupported dialect: {}", dialect_name))?;
    let data_source = DataSource::new(config, provider, dialect);
    data_source.initialize(&LoggingMonitor::new())?;
    Ok(data_source)
}

fn file_stem(path: &std::path::Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "default".to_string())
}

fn cmd_tree(settings: &Settings, args: &SourceArgs, columns: bool) -> CliResult<()> {
    let data_source = open_data_source(settings, args)?;
    let monitor = LoggingMonitor::new();
    print!("{}", render_tree(&data_source, &monitor, columns)?);
    data_source.close();
    Ok(())
}

fn cmd_table(settings: &Settings, args: &SourceArgs, name: &str) -> CliResult<()> {
    let data_source = open_data_source(settings, args)?;
    let monitor = LoggingMonitor::new();

    let parts: Vec<&str> = name.split('.').collect();
    let (catalog, schema, table_name) = match parts.as_slice() {
        [table] => (None, None, *table),
        [schema, table] => (None, Some(*schema), *table),
        [catalog, schema, table] => (Some(*catalog), Some(*schema), *table),
        _ => return Err(format!("invalid table name: {}", name).into()),
    };
    let table = data_source
        .find_table(&monitor, catalog, schema, table_name)?
        .ok_or_else(|| format!("table not found: {}", name))?;

    print!("{}", render_table(&table, &monitor)?);
    data_source.close();
    Ok(())
}

fn cmd_types(settings: &Settings, args: &SourceArgs) -> CliResult<()> {
    let data_source = open_data_source(settings, args)?;
    for table_type in data_source.table_types()? {
        println!("{}", table_type);
    }
    data_source.close();
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

fn render_tree(
    data_source: &Arc<DataSource>,
    monitor: &dyn ProgressMonitor,
    columns: bool,
) -> MetaResult<String> {
    let mut out = String::new();
    let (label, containers) = match data_source.topology()? {
        Topology::Catalogs(containers) => ("catalogs", containers),
        Topology::Schemas(containers) => ("schemas", containers),
        Topology::Flat(container) => ("flat", vec![container]),
    };
    out.push_str(&format!("{} [{}]\n", data_source.name(), label));
    for container in &containers {
        render_container(&mut out, container, monitor, columns, 1)?;
    }
    Ok(out)
}

fn render_container(
    out: &mut String,
    container: &Arc<Container>,
    monitor: &dyn ProgressMonitor,
    columns: bool,
    depth: usize,
) -> MetaResult<()> {
    let indent = "  ".repeat(depth);
    out.push_str(&format!("{}{:?} {}\n", indent, container.kind(), container.name()));
    for schema in container.schemas(monitor)?.iter() {
        render_container(out, schema, monitor, columns, depth + 1)?;
    }
    for table in container.tables(monitor)?.iter() {
        out.push_str(&format!(
            "{}  {} ({})\n",
            indent,
            table.name(),
            table.descriptor().table_type
        ));
        if columns {
            for column in table.columns(monitor)?.iter() {
                out.push_str(&format!(
                    "{}    {} {}{}\n",
                    indent,
                    column.name,
                    column.type_name,
                    if column.nullable { "" } else { " NOT NULL" }
                ));
            }
        }
    }
    Ok(())
}

fn render_table(table: &Arc<Table>, monitor: &dyn ProgressMonitor) -> MetaResult<String> {
    let mut out = format!("{} ({})\n", table.full_name(), table.descriptor().table_type);
    if let Some(description) = table.description() {
        out.push_str(&format!("  -- {}\n", description));
    }

    out.push_str("columns:\n");
    for column in table.columns(monitor)?.iter() {
        out.push_str(&format!(
            "  {} {} {}{}\n",
            column.ordinal,
            column.name,
            column.type_name,
            if column.nullable { "" } else { " NOT NULL" }
        ));
    }

    out.push_str("keys:\n");
    for key in table.constraints(monitor)?.iter() {
        out.push_str(&format!(
            "  {} {:?} ({})\n",
            key.name.as_deref().unwrap_or("<unnamed>"),
            key.kind,
            key.column_names().join(", ")
        ));
    }

    out.push_str("indexes:\n");
    for index in table.indexes(monitor)?.iter() {
        out.push_str(&format!(
            "  {}{} ({})\n",
            index.name,
            if index.unique { " UNIQUE" } else { "" },
            index.column_names().join(", ")
        ));
    }

    out.push_str("foreign keys:\n");
    for fk in table.foreign_keys(monitor)?.iter() {
        out.push_str(&format!("  {}\n", describe_foreign_key(fk)));
    }

    out.push_str("referenced by:\n");
    for fk in table.references(monitor)? {
        let owner = fk.table().map(|t| t.full_name()).unwrap_or_default();
        out.push_str(&format!("  {}: {}\n", owner, describe_foreign_key(&fk)));
    }

    let triggers = table.triggers(monitor)?;
    if !triggers.is_empty() {
        out.push_str("triggers:\n");
        for trigger in triggers.iter() {
            out.push_str(&format!(
                "  {} {} {}\n",
                trigger.name,
                trigger.timing.as_deref().unwrap_or("?"),
                trigger.event.as_deref().unwrap_or("?")
            ));
        }
    }
    Ok(out)
}

fn describe_foreign_key(fk: &genmeta::model::ForeignKey) -> String {
    let columns: Vec<&str> = fk.columns.iter().map(|c| c.column.name.as_str()).collect();
    let referenced: Vec<&str> = fk
        .columns
        .iter()
        .map(|c| c.referenced_column.name.as_str())
        .collect();
    let target = fk
        .referenced_table()
        .map(|t| t.full_name())
        .unwrap_or_default();
    format!(
        "{} ({}) -> {} ({}) ON DELETE {} ON UPDATE {}",
        fk.name.as_deref().unwrap_or("<unnamed>"),
        columns.join(", "),
        target,
        referenced.join(", "),
        fk.delete_rule.as_sql(),
        fk.update_rule.as_sql()
    )
}

//! mdsheet CLI
//!
//! Command-line tool for inspecting, exporting and patching Markdown table workbooks.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mdsheet_core::convert::row_fields;
use mdsheet_core::{
    apply_patch, generate_workbook_markdown, parse_table, parse_workbook, scan_tables, Edit,
    MultiTableParsingSchema, PatchFile, RowFields, SchemaConfig, Table, Workbook,
};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mdsheet")]
#[command(about = "Markdown table workbook tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Parsing schema (JSON)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Log structural decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the first table in a file and print it as JSON
    Table {
        /// Markdown file
        file: PathBuf,
    },

    /// Print every table in a file as a JSON array, ignoring workbook structure
    Scan {
        /// Markdown file
        file: PathBuf,
    },

    /// Parse a workbook and print it as JSON
    Workbook {
        /// Markdown file
        file: PathBuf,
    },

    /// Show one table as tab-separated text
    Show {
        /// Markdown file
        file: PathBuf,

        /// Sheet name; without it tables are counted across the whole file
        #[arg(short, long)]
        sheet: Option<String>,

        /// Table index
        #[arg(short, long, default_value_t = 0)]
        table: usize,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,

        /// Columns to display (comma-separated)
        #[arg(short, long)]
        columns: Option<String>,
    },

    /// Regenerate a workbook in normalised form
    Format {
        /// Markdown file
        file: PathBuf,

        /// Output file path (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export one table to CSV or JSON
    Export {
        /// Markdown file
        file: PathBuf,

        /// Sheet name; without it tables are counted across the whole file
        #[arg(short, long)]
        sheet: Option<String>,

        /// Table index
        #[arg(short, long, default_value_t = 0)]
        table: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output file path (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply a patch file and write the regenerated workbook
    Patch {
        /// Markdown file
        file: PathBuf,

        /// Path to patch file (JSON)
        #[arg(short, long)]
        patch: PathBuf,

        /// Output file path (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a patch file template
    CreatePatch {
        /// Output path for the patch file
        #[arg(short, long)]
        output: PathBuf,

        /// Example edits to include (sheet:row:column:value)
        #[arg(short, long)]
        example: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let schema = load_schema(cli.schema.as_deref())?;

    match cli.command {
        Commands::Table { file } => cmd_table(&file, &schema),
        Commands::Scan { file } => cmd_scan(&file, &schema),
        Commands::Workbook { file } => cmd_workbook(&file, &schema),
        Commands::Show {
            file,
            sheet,
            table,
            limit,
            columns,
        } => cmd_show(&file, &schema, sheet.as_deref(), table, limit, columns),
        Commands::Format { file, output } => cmd_format(&file, &schema, output.as_deref()),
        Commands::Export {
            file,
            sheet,
            table,
            format,
            output,
        } => cmd_export(&file, &schema, sheet.as_deref(), table, format, output.as_deref()),
        Commands::Patch {
            file,
            patch,
            output,
        } => cmd_patch(&file, &schema, &patch, output.as_deref()),
        Commands::CreatePatch { output, example } => cmd_create_patch(&output, &example),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_schema(path: Option<&Path>) -> Result<MultiTableParsingSchema> {
    let Some(path) = path else {
        return Ok(MultiTableParsingSchema::default());
    };

    let text = read_file(path)?;
    let config = SchemaConfig::from_json(&text)
        .with_context(|| format!("invalid schema file {}", path.display()))?;
    Ok(MultiTableParsingSchema::try_from(config)?)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Write to a file, or to stdout when no path is given
fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    })
}

fn load_workbook(file: &Path, schema: &MultiTableParsingSchema) -> Result<Workbook> {
    let workbook = parse_workbook(&read_file(file)?, schema);
    if workbook.name.is_none() {
        match schema.root_marker() {
            Some(marker) => bail!(
                "no workbook root marker '{}' found in {}",
                marker,
                file.display()
            ),
            None => bail!("no workbook root detected in {}", file.display()),
        }
    }
    Ok(workbook)
}

/// Pick a table by sheet and index, or by index across the whole file
fn select_table(
    file: &Path,
    schema: &MultiTableParsingSchema,
    sheet: Option<&str>,
    index: usize,
) -> Result<Table> {
    let mut tables = match sheet {
        Some(name) => {
            let mut workbook = load_workbook(file, schema)?;
            let position = workbook
                .sheets
                .iter()
                .position(|s| s.name == name)
                .ok_or_else(|| mdsheet_core::Error::SheetNotFound(name.to_string()))?;
            workbook.sheets.swap_remove(position).tables
        }
        None => scan_tables(&read_file(file)?, schema),
    };

    if index >= tables.len() {
        bail!(
            "table {} out of range ({} table(s) found)",
            index,
            tables.len()
        );
    }
    Ok(tables.swap_remove(index))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_table(file: &Path, schema: &MultiTableParsingSchema) -> Result<()> {
    let table = parse_table(&read_file(file)?, schema.table());
    if table.is_empty() {
        tracing::warn!("no table found in {}", file.display());
    }
    print_json(&table)
}

fn cmd_scan(file: &Path, schema: &MultiTableParsingSchema) -> Result<()> {
    let tables = scan_tables(&read_file(file)?, schema);
    print_json(&tables)
}

fn cmd_workbook(file: &Path, schema: &MultiTableParsingSchema) -> Result<()> {
    let workbook = load_workbook(file, schema)?;
    print_json(&workbook)
}

fn cmd_show(
    file: &Path,
    schema: &MultiTableParsingSchema,
    sheet: Option<&str>,
    index: usize,
    limit: Option<usize>,
    columns: Option<String>,
) -> Result<()> {
    let table = select_table(file, schema, sheet, index)?;

    // Filter columns if specified
    let display_cols: Vec<usize> = match &columns {
        Some(filter) => {
            let wanted: Vec<&str> = filter.split(',').map(str::trim).collect();
            (0..table.column_count())
                .filter(|&i| wanted.contains(&table.headers[i].as_str()))
                .collect()
        }
        None => (0..table.column_count()).collect(),
    };

    if let Some(name) = &table.name {
        println!("Table: {}", name);
    }

    let header: Vec<&str> = display_cols
        .iter()
        .map(|&i| table.headers[i].as_str())
        .collect();
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    let row_limit = limit.unwrap_or(table.row_count());
    for row in table.rows.iter().take(row_limit) {
        let values: Vec<&str> = display_cols.iter().map(|&i| row[i].as_str()).collect();
        println!("{}", values.join("\t"));
    }

    if table.row_count() > row_limit {
        println!("... ({} more rows)", table.row_count() - row_limit);
    }

    Ok(())
}

fn cmd_format(file: &Path, schema: &MultiTableParsingSchema, output: Option<&Path>) -> Result<()> {
    let workbook = load_workbook(file, schema)?;
    let markdown = generate_workbook_markdown(&workbook, schema);

    let mut writer = open_output(output)?;
    writer.write_all(markdown.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn cmd_export(
    file: &Path,
    schema: &MultiTableParsingSchema,
    sheet: Option<&str>,
    index: usize,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let table = select_table(file, schema, sheet, index)?;
    if table.headers.is_empty() {
        bail!("table {} has no columns", index);
    }

    let writer = open_output(output)?;
    match format {
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(writer);
            writer.write_record(&table.headers)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        ExportFormat::Json => {
            let records: Vec<RowFields> = table
                .rows
                .iter()
                .map(|row| row_fields(&table.headers, row))
                .collect();
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, &records)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }

    if let Some(path) = output {
        println!("Exported {} rows to {}", table.row_count(), path.display());
    }

    Ok(())
}

fn cmd_patch(
    file: &Path,
    schema: &MultiTableParsingSchema,
    patch_path: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let patch = PatchFile::from_json(&read_file(patch_path)?)
        .with_context(|| format!("invalid patch file {}", patch_path.display()))?;
    tracing::info!("loaded patch with {} edits", patch.edits.len());

    let mut workbook = load_workbook(file, schema)?;
    let result = apply_patch(&mut workbook, &patch)?;

    let markdown = generate_workbook_markdown(&workbook, schema);
    let mut writer = open_output(output)?;
    writer.write_all(markdown.as_bytes())?;
    writer.flush()?;

    // stdout may carry the workbook itself
    eprintln!("Applied {} edits", result.edits_applied);
    if !result.modified_sheets.is_empty() {
        eprintln!("Sheets modified: {}", result.modified_sheets.join(", "));
    }

    Ok(())
}

fn cmd_create_patch(output: &Path, examples: &[String]) -> Result<()> {
    let mut patch = PatchFile::new();

    // Parse example edits: "sheet:row:column:value"
    for example in examples {
        let parts: Vec<&str> = example.splitn(4, ':').collect();
        if parts.len() != 4 {
            eprintln!(
                "Warning: Invalid example format '{}', expected 'sheet:row:column:value'",
                example
            );
            continue;
        }

        let row: usize = match parts[1].parse() {
            Ok(row) => row,
            Err(_) => {
                eprintln!("Warning: Invalid row '{}' in example", parts[1]);
                continue;
            }
        };

        patch.add_edit(Edit::update_cell(parts[0], row, parts[2], parts[3]));
    }

    // If no examples provided, add a placeholder
    if patch.edits.is_empty() {
        patch.add_edit(Edit::update_cell("Sheet1", 0, "ColumnName", "NewValue"));
    }

    fs::write(output, patch.to_json()?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Created patch file: {}", output.display());
    println!("Edits: {}", patch.edits.len());
    println!();
    println!("Edit the file to add your changes, then run:");
    println!(
        "  mdsheet patch <file.md> --patch {} --output <out.md>",
        output.display()
    );

    Ok(())
}

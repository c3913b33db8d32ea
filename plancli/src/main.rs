use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use plancraft_core::import::{
    ColumnMapper, TEMPLATE_FILE_NAME, persist_import, read_table, save_import_template,
};
use plancraft_core::records::{
    EquipmentRepository, MemoryRepository, NewEquipment, NewProject, ProjectRepository,
};
use plancraft_core::{
    CellUpdateRequest, JsonDirStore, PlanConfig, PlanWorkspace, Sheet, formulas, rst, tax,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

mod formatter;
mod logger;

const DEFAULT_CONFIG_FILE: &str = "plancraft.toml";
const RECORDS_FILE: &str = "records.json";

#[derive(Parser)]
#[command(name = "plancli")]
#[command(about = "Financial plan sheets: edit, recalculate and import line items", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print a sheet (its default layout when nothing is stored)
    Show { sheet: String },
    /// Upsert one cell, recalculate and print the derived values
    Set {
        sheet: String,
        row: String,
        column: i64,
        value: String,
    },
    /// Print the derived values of a stored sheet
    Calc { sheet: String },
    /// Replace a whole sheet with the contents of a JSON file
    Save { sheet: String, file: PathBuf },
    /// Treasury safety reserve per year
    Rst {
        /// Take revenue from this sheet's revenue rows
        #[arg(long, conflicts_with = "revenue")]
        sheet: Option<String>,
        /// Explicit yearly revenue as KEY=VALUE
        #[arg(long, value_name = "KEY=VALUE", value_parser = parse_revenue)]
        revenue: Vec<(String, f64)>,
        /// Share of revenue in percent; 0 uses 1.5 months of revenue
        #[arg(long)]
        percentage: Option<f64>,
    },
    /// Parse a spreadsheet of line items, optionally saving them to a project
    Import {
        file: PathBuf,
        #[arg(long)]
        project_id: Option<u64>,
        #[arg(long)]
        sheet_key: Option<String>,
    },
    /// Write a sample workbook in the layout `import` expects
    Template {
        #[arg(default_value = TEMPLATE_FILE_NAME)]
        file: PathBuf,
    },
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Inspect or replace equipment records
    #[command(subcommand)]
    Equipment(EquipmentCommand),
    /// Print tax and depreciation settings
    Tax {
        #[arg(default_value = "angola")]
        context: String,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    Create {
        name: String,
        #[arg(long)]
        first_year: i32,
        #[arg(long, default_value_t = 5)]
        num_years: u32,
        #[arg(long)]
        currency: Option<String>,
    },
    List,
    Show { id: u64 },
    Delete { id: u64 },
    /// Show the project currently being worked on
    Current,
    /// Make a project the current one
    Use { id: u64 },
}

#[derive(Subcommand)]
enum EquipmentCommand {
    List { project_id: u64, sheet_key: String },
    /// Replace every item of one sheet with the items of a JSON file
    Replace {
        project_id: u64,
        sheet_key: String,
        file: PathBuf,
    },
}

fn parse_revenue(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let parsed = plancraft_core::number::parse_number(value);
    if !parsed.valid {
        return Err(format!("invalid revenue value '{}'", value));
    }
    Ok((key.trim().to_string(), parsed.value))
}

fn load_config(path: Option<&Path>) -> Result<PlanConfig> {
    let config = if let Some(config_path) = path {
        PlanConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Fall back to a config in the current directory if it exists
        let default_config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_config_path.exists() {
            PlanConfig::from_file(&default_config_path).with_context(|| {
                format!(
                    "Failed to load config from {}",
                    default_config_path.display()
                )
            })?
        } else {
            PlanConfig::default()
        }
    };

    let known = formulas::registry::all_formula_ids();
    config.validate(&known).context("Invalid configuration")?;
    Ok(config)
}

fn open_workspace(config: PlanConfig) -> Result<PlanWorkspace<JsonDirStore>> {
    let dir = &config.storage.data_dir;
    let store = JsonDirStore::open(dir)
        .with_context(|| format!("Failed to open data directory {}", dir.display()))?;
    Ok(PlanWorkspace::with_config(store, config))
}

fn records_path(config: &PlanConfig) -> Result<PathBuf> {
    let dir = &config.storage.data_dir;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    Ok(dir.join(RECORDS_FILE))
}

fn load_records(path: &Path) -> Result<MemoryRepository> {
    MemoryRepository::load(path)
        .with_context(|| format!("Failed to load records from {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(logger::level_for(cli.verbose, cli.quiet));

    let config = load_config(cli.config.as_deref())?;
    let format = cli.format;

    match cli.command {
        Command::Show { sheet } => {
            let workspace = open_workspace(config)?;
            let loaded = workspace.sheet(&sheet)?;
            match format {
                OutputFormat::Human => formatter::print_sheet(&sheet, &loaded),
                OutputFormat::Json => formatter::print_json(&loaded)?,
            }
        }
        Command::Set {
            sheet,
            row,
            column,
            value,
        } => {
            let workspace = open_workspace(config)?;
            let outcome = workspace.apply_update(CellUpdateRequest {
                sheet: Some(sheet.clone()),
                row_name: Some(row.clone()),
                column_index: Some(column),
                value: Some(value.into()),
            })?;
            match format {
                OutputFormat::Human => {
                    formatter::print_update(&sheet, &row, column as usize, &outcome)
                }
                OutputFormat::Json => formatter::print_json(&serde_json::json!({
                    "success": true,
                    "calculatedValues": outcome.calculated_values,
                    "upsert": outcome.upsert,
                    "rowIndex": outcome.row_index,
                }))?,
            }
        }
        Command::Calc { sheet } => {
            let workspace = open_workspace(config)?;
            let derived = workspace.calculate(&sheet)?;
            match format {
                OutputFormat::Human => formatter::print_derived(&derived),
                OutputFormat::Json => formatter::print_json(&derived)?,
            }
        }
        Command::Save { sheet, file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let parsed: Sheet = serde_json::from_str(&content)
                .with_context(|| format!("Invalid sheet JSON in {}", file.display()))?;
            let workspace = open_workspace(config)?;
            workspace.save_sheet(&sheet, &parsed)?;
            log::info!("Saved {} rows to '{}'", parsed.rows.len(), sheet);
            match format {
                OutputFormat::Human => println!("Saved sheet '{}'", sheet),
                OutputFormat::Json => {
                    formatter::print_json(&serde_json::json!({ "success": true }))?
                }
            }
        }
        Command::Rst {
            sheet,
            revenue,
            percentage,
        } => {
            let percentage = percentage.unwrap_or(config.rst.percentage);
            let decimals = config.rst.decimals;
            let revenues: BTreeMap<String, f64> = match sheet {
                Some(name) => rst::revenues_from_sheet(&open_workspace(config)?.sheet(&name)?),
                None if revenue.is_empty() => bail!("Provide --sheet or at least one --revenue"),
                None => revenue.into_iter().collect(),
            };
            let values = rst::format_rst(&rst::calculate_rst(&revenues, percentage), decimals);
            match format {
                OutputFormat::Human => formatter::print_rst(&values, percentage),
                OutputFormat::Json => formatter::print_json(&values)?,
            }
        }
        Command::Import {
            file,
            project_id,
            sheet_key,
        } => {
            let table = read_table(&file)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            let mapper = ColumnMapper::new(config.import.clone());
            let report = mapper.map(&table)?;

            let summary = match project_id {
                Some(project_id) => {
                    let path = records_path(&config)?;
                    let mut repo = load_records(&path)?;
                    let key = sheet_key.unwrap_or_else(|| config.import.default_sheet_key.clone());
                    let summary = persist_import(&report, &mut repo, project_id, &key)?;
                    repo.save(&path)?;
                    Some(summary)
                }
                None => None,
            };

            match format {
                OutputFormat::Human => formatter::print_import(&report, summary.as_ref()),
                OutputFormat::Json => {
                    formatter::print_json(&formatter::import_json(&report, summary.as_ref()))?
                }
            }
        }
        Command::Template { file } => {
            save_import_template(&file)?;
            match format {
                OutputFormat::Human => println!("Wrote import template to {}", file.display()),
                OutputFormat::Json => formatter::print_json(&serde_json::json!({
                    "success": true,
                    "path": file.display().to_string(),
                }))?,
            }
        }
        Command::Project(command) => {
            let path = records_path(&config)?;
            let mut repo = load_records(&path)?;
            match command {
                ProjectCommand::Create {
                    name,
                    first_year,
                    num_years,
                    currency,
                } => {
                    let project = repo.create_project(NewProject {
                        name,
                        first_year,
                        num_years,
                        currency,
                    })?;
                    repo.save(&path)?;
                    match format {
                        OutputFormat::Human => formatter::print_project(&project),
                        OutputFormat::Json => formatter::print_json(&project)?,
                    }
                }
                ProjectCommand::List => {
                    let projects = repo.list_projects()?;
                    match format {
                        OutputFormat::Human => formatter::print_projects(&projects),
                        OutputFormat::Json => formatter::print_json(&projects)?,
                    }
                }
                ProjectCommand::Show { id } => {
                    let project = repo.get_project(id)?;
                    match format {
                        OutputFormat::Human => formatter::print_project(&project),
                        OutputFormat::Json => formatter::print_json(&project)?,
                    }
                }
                ProjectCommand::Delete { id } => {
                    repo.delete_project(id)?;
                    repo.save(&path)?;
                    match format {
                        OutputFormat::Human => println!("Deleted project {}", id),
                        OutputFormat::Json => {
                            formatter::print_json(&serde_json::json!({ "success": true }))?
                        }
                    }
                }
                ProjectCommand::Current => {
                    let project = repo.current_project()?;
                    match format {
                        OutputFormat::Human => match &project {
                            Some(project) => formatter::print_project(project),
                            None => println!("No projects"),
                        },
                        OutputFormat::Json => formatter::print_json(&project)?,
                    }
                }
                ProjectCommand::Use { id } => {
                    let project = repo.set_current_project(id)?;
                    repo.save(&path)?;
                    match format {
                        OutputFormat::Human => formatter::print_project(&project),
                        OutputFormat::Json => formatter::print_json(&project)?,
                    }
                }
            }
        }
        Command::Equipment(EquipmentCommand::List {
            project_id,
            sheet_key,
        }) => {
            let repo = load_records(&records_path(&config)?)?;
            let items = repo.list_equipment(project_id, &sheet_key)?;
            match format {
                OutputFormat::Human => formatter::print_equipment(&items),
                OutputFormat::Json => formatter::print_json(&items)?,
            }
        }
        Command::Equipment(EquipmentCommand::Replace {
            project_id,
            sheet_key,
            file,
        }) => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let items: Vec<NewEquipment> = serde_json::from_str(&content)
                .with_context(|| format!("Invalid equipment JSON in {}", file.display()))?;

            let path = records_path(&config)?;
            let mut repo = load_records(&path)?;
            let saved = repo.replace_equipment(project_id, &sheet_key, items)?;
            repo.save(&path)?;
            match format {
                OutputFormat::Human => formatter::print_replaced(&saved),
                OutputFormat::Json => formatter::print_json(&serde_json::json!({
                    "success": true,
                    "message": formatter::replaced_message(saved.len()),
                    "equipments": saved,
                }))?,
            }
        }
        Command::Tax { context } => {
            let settings = tax::tax_settings(&context);
            match format {
                OutputFormat::Human => formatter::print_tax(settings),
                OutputFormat::Json => formatter::print_json(settings)?,
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_revenue() {
        assert_eq!(
            parse_revenue("Ano 1=120.000,50").unwrap(),
            ("Ano 1".to_string(), 120000.5)
        );
        assert!(parse_revenue("Ano 1").is_err());
        assert!(parse_revenue("Ano 1=abc").is_err());
    }

    #[test]
    fn test_set_arguments() {
        let cli = Cli::try_parse_from([
            "plancli", "--format", "json", "set", "pressupostos", "Taxa de Inflação", "2", "2,5",
        ])
        .unwrap();
        match cli.command {
            Command::Set { column, value, .. } => {
                assert_eq!(column, 2);
                assert_eq!(value, "2,5");
            }
            _ => panic!("expected set"),
        }
    }

    #[test]
    fn test_template_defaults_file_name() {
        let cli = Cli::try_parse_from(["plancli", "template"]).unwrap();
        match cli.command {
            Command::Template { file } => assert_eq!(file, PathBuf::from(TEMPLATE_FILE_NAME)),
            _ => panic!("expected template"),
        }
    }

    #[test]
    fn test_equipment_replace_arguments() {
        let cli = Cli::try_parse_from([
            "plancli", "equipment", "replace", "3", "basico", "itens.json",
        ])
        .unwrap();
        match cli.command {
            Command::Equipment(EquipmentCommand::Replace {
                project_id,
                sheet_key,
                file,
            }) => {
                assert_eq!(project_id, 3);
                assert_eq!(sheet_key, "basico");
                assert_eq!(file, PathBuf::from("itens.json"));
            }
            _ => panic!("expected equipment replace"),
        }
    }
}

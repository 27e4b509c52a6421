// ==========================================
// 房产 CRM 线索导入 - 命令行入口
// ==========================================
// 子命令: fields / inspect / import / profile
// 错误: anyhow 汇总,退出码非 0
// ==========================================

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use lead_importer::api::{list_fields, ErrorBody, ImportApi, MappingView, PreviewResponse};
use lead_importer::importer::JsonFileProfileStore;
use lead_importer::{logging, ApiError, ConfigManager, HttpLeadImportClient, ImportConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lead-importer", version, about = "Bulk lead import for the CRM")]
struct Cli {
    /// 配置文件路径（默认: <config dir>/lead-importer/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 以 JSON 行格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every lead field a column can be mapped to
    Fields {
        #[arg(long)]
        json: bool,
    },
    /// Parse a file and show the guessed mapping with a preview
    Inspect {
        file: PathBuf,
        /// Preview rows (defaults to the configured value)
        #[arg(long)]
        rows: Option<usize>,
        #[command(flatten)]
        mapping: MappingArgs,
        #[arg(long)]
        json: bool,
    },
    /// Map, transform and commit a file to the import endpoint
    Import(ImportArgs),
    /// Manage saved column mappings
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Args)]
struct MappingArgs {
    /// Apply a saved mapping profile before overrides
    #[arg(long)]
    profile: Option<String>,

    /// Override one column: "Header=field_key" or "Header=skip"
    #[arg(long = "map", value_name = "HEADER=FIELD")]
    overrides: Vec<String>,
}

#[derive(Args)]
struct ImportArgs {
    file: PathBuf,
    #[arg(long)]
    owner_id: Option<String>,
    /// Stage for leads without one (defaults to the configured value)
    #[arg(long)]
    stage: Option<String>,
    #[arg(long)]
    no_dashboard: bool,
    #[command(flatten)]
    mapping: MappingArgs,
    /// Transform only, do not send
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Save the mapping guessed for a file (plus overrides) under a name
    Save {
        name: String,
        #[arg(long)]
        from: PathBuf,
        #[arg(long = "map", value_name = "HEADER=FIELD")]
        overrides: Vec<String>,
    },
    List,
    Delete { name: String },
}

type Api = ImportApi<HttpLeadImportClient>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    let manager = ConfigManager::load(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Fields { json } => print_fields(json),
        Command::Inspect {
            file,
            rows,
            mapping,
            json,
        } => {
            let mut config = manager.config().clone();
            if let Some(rows) = rows {
                config.preview_rows = rows.max(1);
            }
            let mut api = build_api(&manager, config)?;
            let view = open_and_map(&mut api, &file, &mapping)?;
            print_inspect(&view, &api.preview(), json)
        }
        Command::Import(args) => run_import(&manager, args).await,
        Command::Profile(cmd) => run_profile(&manager, cmd),
    }
}

fn build_api(manager: &ConfigManager, config: ImportConfig) -> Result<Api> {
    let client = HttpLeadImportClient::new(
        &config.api_base_url,
        &config.import_path,
        config.request_timeout(),
    )?;
    let store = JsonFileProfileStore::new(manager.profile_store_path());
    Ok(ImportApi::new(config, client, Box::new(store)))
}

fn open_and_map(api: &mut Api, file: &Path, args: &MappingArgs) -> Result<MappingView> {
    api.open_file(file)?;

    if let Some(name) = &args.profile {
        let applied = api.apply_profile(name)?;
        tracing::info!(profile = %name, applied, "已套用映射模板");
    }

    for raw in &args.overrides {
        let (header, target) = split_override(raw)?;
        api.set_column(header, target)?;
    }

    Ok(api.mapping_view())
}

fn split_override(raw: &str) -> Result<(&str, &str)> {
    match raw.rsplit_once('=') {
        Some((header, target)) if !header.trim().is_empty() => Ok((header.trim(), target)),
        _ => bail!("invalid --map value '{}', expected HEADER=FIELD", raw),
    }
}

async fn run_import(manager: &ConfigManager, args: ImportArgs) -> Result<()> {
    let mut api = build_api(manager, manager.config().clone())?;
    let view = open_and_map(&mut api, &args.file, &args.mapping)?;

    if args.dry_run {
        let preview = PreviewResponse {
            total_rows: view.row_count,
            rows: api.session().transformed_rows(),
        };
        return print_inspect(&view, &preview, args.json);
    }

    let meta = api.build_meta(
        args.owner_id.as_deref(),
        args.stage.as_deref(),
        args.no_dashboard.then_some(false),
    )?;

    match api.commit(&meta).await {
        Ok(report) => {
            if args.json {
                print_json(&report)
            } else {
                println!("{}", report.render());
                Ok(())
            }
        }
        Err(err) => report_failure(err, args.json),
    }
}

fn report_failure(err: ApiError, json: bool) -> Result<()> {
    if json {
        print_json(&ErrorBody::from(&err))?;
    }
    Err(err.into())
}

fn run_profile(manager: &ConfigManager, cmd: ProfileCommand) -> Result<()> {
    let mut api = build_api(manager, manager.config().clone())?;

    match cmd {
        ProfileCommand::Save {
            name,
            from,
            overrides,
        } => {
            let args = MappingArgs {
                profile: None,
                overrides,
            };
            open_and_map(&mut api, &from, &args)?;
            let profile = api.save_profile(&name)?;
            println!(
                "Saved profile '{}' ({} columns, {} mapped)",
                profile.name,
                profile.mapping.len(),
                profile.mapping.mapped_count()
            );
        }
        ProfileCommand::List => {
            let profiles = api.list_profiles()?;
            if profiles.is_empty() {
                println!("No saved profiles");
            }
            for profile in profiles {
                println!(
                    "{}\t{} columns\t{}",
                    profile.name,
                    profile.mapping.len(),
                    profile.saved_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        ProfileCommand::Delete { name } => {
            api.delete_profile(&name)?;
            println!("Deleted profile '{}'", name);
        }
    }
    Ok(())
}

// ==========================================
// 输出
// ==========================================

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_fields(json: bool) -> Result<()> {
    let fields = list_fields();
    if json {
        return print_json(&fields);
    }
    for field in fields {
        println!("{:<18} {:<20} {}", field.key.as_str(), field.label, field.kind);
    }
    Ok(())
}

fn print_inspect(view: &MappingView, preview: &PreviewResponse, json: bool) -> Result<()> {
    if json {
        #[derive(Serialize)]
        struct Inspect<'a> {
            mapping: &'a MappingView,
            preview: &'a PreviewResponse,
        }
        return print_json(&Inspect {
            mapping: view,
            preview,
        });
    }

    println!(
        "{} ({} rows)",
        view.file_name.as_deref().unwrap_or("-"),
        view.row_count
    );
    for column in &view.columns {
        let target = column
            .field
            .map(|key| format!("{} ({})", key, key.label()))
            .unwrap_or_else(|| "skip".to_string());
        println!("  {:<28} -> {}", column.header, target);
    }
    for dup in &view.duplicates {
        println!(
            "  warning: {} is fed by {} (last column wins)",
            dup.field,
            dup.headers.join(", ")
        );
    }

    println!();
    println!("Preview ({} of {} rows):", preview.rows.len(), preview.total_rows);
    for row in &preview.rows {
        println!("  {}", serde_json::to_string(row)?);
    }
    Ok(())
}

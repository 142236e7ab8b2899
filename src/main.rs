use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use velocitrack::data::filter::{Query1D, Query3D, DEFAULT_LIMIT};
use velocitrack::data::loader;
use velocitrack::data::model::WaveType;
use velocitrack::data::store::ImportReport;
use velocitrack::server::{self, AppState};
use velocitrack::{discovery, query, Catalog, Config, QueryError};

#[derive(Parser)]
#[command(name = "velocitrack", version)]
#[command(about = "Query and serve seismic velocity models")]
struct Cli {
    #[arg(short, long, env = "VELOCITRACK_CONFIG", default_value = "velocitrack.toml")]
    config: PathBuf,

    /// Snapshot file, overriding `data.snapshot`.
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the REST API.
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Import rows into the snapshot, skipping duplicates.
    Import {
        #[command(subcommand)]
        kind: ImportKind,
    },
    /// Print a 1D model in VELEST format.
    Query1d {
        #[arg(long)]
        author: String,
        #[arg(long)]
        nfo: String,
        #[arg(long, default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
        limit: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
    },
    /// Print a 3D model in delimited format.
    Query3d {
        #[arg(long)]
        wave_type: String,
        #[arg(long)]
        author: String,
        #[arg(long, default_value = "")]
        nfo: String,
        #[arg(long)]
        include_r: bool,
        #[arg(long, default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
        limit: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
    },
    /// List distinct authors.
    Authors,
    /// List distinct NFOs.
    Nfos,
}

#[derive(Subcommand)]
enum ImportKind {
    /// Columns: Depth (km), Velocity (km/s), Type, NFO, Author
    #[command(name = "1d")]
    OneD { file: PathBuf },
    /// Columns: Longitude, Latitude, Depth, Vp|Vs, NFO, Author, optional R
    #[command(name = "3d")]
    ThreeD { file: PathBuf, wave_type: String },
    /// Columns: Author, Bibref
    Bibref { file: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load(&cli.config)?;
    if let Some(snapshot) = cli.snapshot {
        config.data.snapshot = snapshot;
    }

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Import { kind } => {
            import(&config.data.snapshot, kind)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Query1d {
            author,
            nfo,
            limit,
            offset,
        } => {
            let catalog = Catalog::open(&config.data.snapshot)?;
            let session = catalog.session()?;
            let request = Query1D {
                author,
                nfo,
                limit,
                offset,
            };
            emit(query::query_1d(&*session, &request, config.output.header_style))
        }
        Command::Query3d {
            wave_type,
            author,
            nfo,
            include_r,
            limit,
            offset,
        } => {
            let catalog = Catalog::open(&config.data.snapshot)?;
            let session = catalog.session()?;
            let request = Query3D {
                wave_type,
                author,
                nfo,
                include_r,
                limit,
                offset,
            };
            emit(query::query_3d(&*session, &request, config.output.header_style))
        }
        Command::Authors => {
            let catalog = Catalog::open(&config.data.snapshot)?;
            print!("{}", discovery::authors(&*catalog.session()?)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Nfos => {
            let catalog = Catalog::open(&config.data.snapshot)?;
            print!("{}", discovery::nfos(&*catalog.session()?)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Body to stdout, or `{"detail": ...}` to stderr with a failing exit code.
fn emit(result: Result<String, QueryError>) -> Result<ExitCode> {
    match result {
        Ok(body) => {
            println!("{body}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string(&err.detail())?);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn serve(config: &Config) -> Result<()> {
    let catalog = Catalog::open(&config.data.snapshot)?;
    let state = AppState {
        catalog: Arc::new(catalog),
        header_style: config.output.header_style,
    };
    let bind_addr = config.bind_addr()?;

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(server::serve(bind_addr, state))
}

fn import(snapshot: &Path, kind: ImportKind) -> Result<()> {
    let catalog = Catalog::open(snapshot)?;

    let (what, file, report): (String, PathBuf, ImportReport) = match kind {
        ImportKind::OneD { file } => {
            let rows = loader::load_1d(&file)
                .with_context(|| format!("importing 1D data from {}", file.display()))?;
            ("1D velocity model".into(), file, catalog.import_1d(rows)?)
        }
        ImportKind::ThreeD { file, wave_type } => {
            let wave_type: WaveType = wave_type.to_ascii_uppercase().parse()?;
            let rows = loader::load_3d(&file, wave_type).with_context(|| {
                format!("importing 3D {wave_type} data from {}", file.display())
            })?;
            (
                format!("3D {wave_type} velocity model"),
                file,
                catalog.import_3d(wave_type, rows)?,
            )
        }
        ImportKind::Bibref { file } => {
            let rows = loader::load_bibrefs(&file)
                .with_context(|| format!("importing bibref data from {}", file.display()))?;
            ("author-bibref".into(), file, catalog.import_bibrefs(rows)?)
        }
    };

    log::info!(
        "Imported {} {what} records from {}",
        report.imported,
        file.display()
    );
    if report.skipped > 0 {
        log::info!("Skipped {} duplicate records", report.skipped);
    }
    if report.updated > 0 {
        log::info!("Updated {} existing records", report.updated);
    }
    {
        let session = catalog.session()?;
        log::info!(
            "Catalog now holds {} 1D rows, {} 3D VP rows, {} 3D VS rows",
            session.len_1d(),
            session.len_3d(WaveType::Vp),
            session.len_3d(WaveType::Vs)
        );
    }

    catalog.save(snapshot)?;
    log::info!("Snapshot written to {}", snapshot.display());
    Ok(())
}

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use portalmap_builder::build::artifacts::{render_artifacts, ArtifactRequest};
use portalmap_builder::build::options::NormalCoverage;
use portalmap_builder::build::script::load_script;
use portalmap_builder::build::{compile, CompileOptions};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Normals {
    All,
    Walls,
}

impl From<Normals> for NormalCoverage {
    fn from(n: Normals) -> Self {
        match n {
            Normals::All => NormalCoverage::AllEdges,
            Normals::Walls => NormalCoverage::WallsOnly,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "portalmap-builder", version, about = "Compile a portal level script into packed runtime tables")]
struct Args {
    /// Level script (`.lvl` text or `.json` command list)
    #[arg(long = "script", value_name = "PATH")]
    script: PathBuf,

    /// Optional JSON compile options
    #[arg(long = "options", value_name = "PATH")]
    options: Option<PathBuf>,

    /// Override which edges get wall normals
    #[arg(long = "normals", value_enum)]
    normals: Option<Normals>,

    /// C header output; stdout when omitted
    #[arg(long = "out-header", value_name = "PATH")]
    out_header: Option<PathBuf>,

    /// Binary table image output
    #[arg(long = "out-table", value_name = "PATH")]
    out_table: Option<PathBuf>,

    /// JSON geometry dump for diagram tools
    #[arg(long = "out-view", value_name = "PATH")]
    out_view: Option<PathBuf>,

    /// Decode the table image and check every record before writing
    #[arg(long = "verify", requires = "out_table")]
    verify: bool,
}

fn run(args: &Args) -> Result<()> {
    let mut opts = match &args.options {
        Some(path) => CompileOptions::from_json_file(path)?,
        None => CompileOptions::default(),
    };
    if let Some(n) = args.normals {
        opts.normal_coverage = n.into();
    }

    let script = load_script(&args.script)?;
    let compiled = compile(&script, &opts).with_context(|| format!("compiling {:?}", args.script))?;

    // nothing is written until every output rendered and verified
    let req = ArtifactRequest {
        table: args.out_table.is_some(),
        verify: args.verify,
        view: args.out_view.is_some(),
    };
    let out = render_artifacts(&compiled, req)?;

    match &args.out_header {
        Some(path) => {
            fs::write(path, &out.header).with_context(|| format!("writing {:?}", path))?;
            info!(path = ?path, "wrote header");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(out.header.as_bytes())?;
            stdout.flush()?;
        }
    }

    if let (Some(path), Some(bytes)) = (&args.out_table, &out.table) {
        fs::write(path, bytes).with_context(|| format!("writing {:?}", path))?;
        let hash = out.table_hash.map(|h| hex(&h)).unwrap_or_default();
        info!(path = ?path, bytes = bytes.len(), hash = %hash, verified = args.verify, "wrote table");
    }

    if let (Some(path), Some(view)) = (&args.out_view, &out.view) {
        fs::write(path, view).with_context(|| format!("writing {:?}", path))?;
        info!(path = ?path, "wrote view");
    }
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .json()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();
    info!(?args, core = portalmap_core::version(), "starting builder");

    if let Err(e) = run(&args) {
        error!(error = %format!("{e:#}"), "build failed");
        return Err(e);
    }
    Ok(())
}

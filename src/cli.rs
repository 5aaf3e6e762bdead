use crate::{
    archive,
    config::Config,
    pipeline::SplitPipeline,
    report::JobContext,
    util::{ensure_dir, now_rfc3339, sha256_file, sha256_hex},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "doc-stitch")]
#[command(about = "Deterministic document segmentation from OCR + classification archives")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./doc-stitch.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the entries of a classification archive.
    Inspect {
        #[arg(long)]
        archive: PathBuf,
    },
    /// Segment an archive into documents and write the result envelope.
    Split {
        #[arg(long)]
        archive: PathBuf,
        /// Execution identifier copied into every document. Defaults to the
        /// computed job id.
        #[arg(long)]
        execution_id: Option<String>,
        /// Source-file reference copied into every document.
        #[arg(long, default_value = "")]
        source: String,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref())?;
    let cfg = Config::load(&cfg_path)?;

    match &args.cmd {
        Command::Inspect { archive } => {
            let log_path = resolve_log_path(&cfg, None);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            inspect(&cfg, archive)
        }
        Command::Split {
            archive,
            execution_id,
            source,
            out_dir,
        } => split(
            &args,
            &cfg,
            archive,
            execution_id.as_deref(),
            source,
            out_dir.as_deref(),
        ),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = user {
        return Ok(p.to_path_buf());
    }
    let default = PathBuf::from("doc-stitch.toml");
    if default.exists() {
        Ok(default)
    } else {
        Ok(PathBuf::from("doc-stitch.example.toml"))
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn inspect(cfg: &Config, input: &Path) -> Result<()> {
    let file =
        File::open(input).with_context(|| format!("opening archive: {}", input.display()))?;

    let mut entries = Vec::new();
    archive::read_entries(BufReader::new(file), |entry| {
        let kind = if entry.name.ends_with(&cfg.archive.manifest_suffix) {
            "manifest"
        } else {
            "page"
        };
        entries.push(serde_json::json!({
            "name": entry.name,
            "bytes": entry.contents.len(),
            "kind": kind,
        }));
        Ok(())
    })?;

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn split(
    args: &Args,
    cfg: &Config,
    input: &Path,
    execution_id: Option<&str>,
    source: &str,
    out_override: Option<&Path>,
) -> Result<()> {
    validate_input(cfg, input)?;

    let cfg_hash = sha256_hex(cfg.normalized_for_hash().as_bytes());
    let input_hash =
        sha256_file(input).with_context(|| format!("hashing input: {}", input.display()))?;
    let job_id = sha256_hex(format!("{cfg_hash}:{input_hash}").as_bytes());

    let out_root = out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir));
    let job_dir = out_root.join(&job_id);

    if job_dir.exists() && !cfg.global.resume {
        return Err(anyhow!(
            "job_dir already exists and resume=false: {}",
            job_dir.display()
        ));
    }

    ensure_dir(&job_dir)?;
    ensure_dir(&job_dir.join("logs"))?;

    let log_path = resolve_log_path(cfg, Some(&job_dir));
    let _guard = init_logging(args, cfg, log_path.as_deref())?;

    info!("job_id={job_id} out={}", job_dir.display());

    let job = JobContext {
        execution_id: execution_id
            .map(str::to_string)
            .unwrap_or_else(|| job_id.clone()),
        source: source.to_string(),
    };

    let file =
        File::open(input).with_context(|| format!("opening archive: {}", input.display()))?;
    let pipeline = SplitPipeline::new(cfg);

    let started = now_rfc3339();
    let result = pipeline.run(&job, BufReader::new(file));

    if cfg.output.write_result_json {
        let raw = if cfg.output.pretty {
            serde_json::to_string_pretty(&result)?
        } else {
            serde_json::to_string(&result)?
        };
        std::fs::write(job_dir.join(&cfg.output.result_filename), raw)?;
    }

    if cfg.output.write_index_json {
        let index = serde_json::json!({
            "job_id": job_id,
            "started": started,
            "finished": now_rfc3339(),
            "result": cfg.output.result_filename,
        });
        std::fs::write(
            job_dir.join("index.json"),
            serde_json::to_string_pretty(&index)?,
        )?;
    }

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "job_id": job_id,
                "job_dir": job_dir,
                "outcome": result.outcome,
            }))?
        );
    }

    Ok(())
}

fn validate_input(cfg: &Config, input: &Path) -> Result<()> {
    let input_str = input.display().to_string();

    if cfg.security.reject_url_inputs && looks_like_url(&input_str) {
        return Err(anyhow!("URL inputs are disabled: {input_str}"));
    }

    if !input.exists() {
        return Err(anyhow!("archive does not exist: {}", input.display()));
    }

    if !(input_str.ends_with(".tar.gz") || input_str.ends_with(".tgz")) {
        warn!("archive does not look like a .tar.gz: {}", input.display());
    }

    Ok(())
}

fn looks_like_url(s: &str) -> bool {
    let s = s.to_ascii_lowercase();
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://")
}

fn resolve_log_path(cfg: &Config, job_dir: Option<&Path>) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    if let Some(job_dir) = job_dir {
        return Some(job_dir.join("logs").join("doc-stitch.log"));
    }

    Some(PathBuf::from(&cfg.paths.out_dir).join("doc-stitch.log"))
}

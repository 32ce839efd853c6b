use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gce_instances::compute::{self, wait_for_named_operation};
use gce_instances::config::Config;
use gce_instances::gcp::http::format_gcp_error;
use gce_instances::{
    AggregatedListInstancesRequest, ComputeError, DeleteInstanceRequest, InsertInstanceRequest,
    ListInstancesRequest,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage Compute Engine VM instances
#[derive(Parser, Debug)]
#[command(name = "gce-instances", version, about, long_about = None)]
struct Args {
    /// GCP project to use
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Compute zone to use
    #[arg(short, long, global = true)]
    zone: Option<String>,

    /// Compute API endpoint (defaults to https://compute.googleapis.com)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Bearer token to use instead of Application Default Credentials
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Maximum seconds to wait for an operation
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an instance and wait for it to be provisioned
    Create {
        /// Instance name (unique within the zone)
        name: String,
        #[arg(long, default_value = "n1-standard-1")]
        machine_type: String,
        #[arg(long, default_value = "projects/debian-cloud/global/images/family/debian-11")]
        source_image: String,
        #[arg(long, default_value = "global/networks/default")]
        network: String,
        /// Boot disk size in GB
        #[arg(long, default_value_t = 10)]
        disk_size_gb: u64,
    },
    /// Delete an instance and wait for it to be removed
    Delete {
        /// Instance name
        name: String,
    },
    /// List the instances of one zone
    List {
        /// Server-side filter expression
        #[arg(long)]
        filter: Option<String>,
    },
    /// List instances across every zone of the project
    ListAll {
        /// Server-side filter expression
        #[arg(long)]
        filter: Option<String>,
        /// Skip unreachable zones instead of failing
        #[arg(long)]
        partial: bool,
    },
    /// Wait for an existing zonal operation to finish
    Wait {
        /// Operation name
        operation: String,
    },
    /// Store the resolved project and zone as defaults
    Configure,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gce-instances started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gce-instances").join("gce-instances.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gce-instances").join("gce-instances.log");
    }
    PathBuf::from("gce-instances.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err:?}");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ComputeError>() {
                Some(compute_err) => eprintln!("Error: {}", format_gcp_error(compute_err)),
                None => eprintln!("Error: {err:?}"),
            }
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load();
    let project = config.effective_project(args.project.as_deref())?;
    let client_config = config.client_config(
        args.endpoint.as_deref(),
        args.access_token.as_deref(),
        args.timeout.map(Duration::from_secs),
    )?;

    tracing::info!("Using project: {}", project);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Create {
            name,
            machine_type,
            source_image,
            network,
            disk_size_gb,
        } => {
            let zone = config.effective_zone(args.zone.as_deref())?;
            let request = InsertInstanceRequest::new(
                &project,
                &zone,
                &name,
                &machine_type,
                &source_image,
                &network,
            )
            .with_disk_size_gb(disk_size_gb);
            compute::create_instance(&mut out, &client_config, &request)
                .await
                .with_context(|| format!("Failed to create instance {}", name))?;
        }
        Command::Delete { name } => {
            let zone = config.effective_zone(args.zone.as_deref())?;
            let request = DeleteInstanceRequest::new(&project, &zone, &name);
            compute::delete_instance(&mut out, &client_config, &request)
                .await
                .with_context(|| format!("Failed to delete instance {}", name))?;
        }
        Command::List { filter } => {
            let zone = config.effective_zone(args.zone.as_deref())?;
            let mut request = ListInstancesRequest::new(&project, &zone);
            if let Some(filter) = filter.as_deref() {
                request = request.with_filter(filter);
            }
            compute::list_instances(&mut out, &client_config, &request)
                .await
                .with_context(|| format!("Failed to list instances in {}", zone))?;
        }
        Command::ListAll { filter, partial } => {
            let mut request = AggregatedListInstancesRequest::new(&project).with_partial_success(partial);
            if let Some(filter) = filter.as_deref() {
                request = request.with_filter(filter);
            }
            compute::list_all_instances(&mut out, &client_config, &request)
                .await
                .context("Failed to list instances")?;
        }
        Command::Wait { operation } => {
            let zone = config.effective_zone(args.zone.as_deref())?;
            wait_for_named_operation(&mut out, &client_config, &project, &zone, &operation)
                .await
                .with_context(|| format!("Failed to wait for operation {}", operation))?;
        }
        Command::Configure => {
            let mut saved = config.clone();
            saved.project_id = Some(project.clone());
            if let Some(zone) = args.zone.as_deref() {
                saved.zone = Some(zone.to_string());
            }
            saved.save().context("Failed to save config")?;
            writeln!(out, "Defaults saved for project {}", project)?;
        }
    }

    out.flush()?;
    Ok(())
}

use clap::{Parser, Subcommand};
use openstack_inventory::{
    InventoryClient, InventoryConfig, OpenStackError, OpenStackResult, ProgressEvent, Report,
    ResourceType,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(
    name = "openstack-inventory",
    about = "Collects a point-in-time inventory of OpenStack resources",
    long_about = "Collects servers, volumes, floating IPs, routers, networks, load balancers,\n\
VPN connections and container clusters across every visible project.\n
Credentials are read from the usual OS_* environment variables, or from a .env file."
)]
struct Cli {
    /// Directory holding the JSON snapshot and its backups
    #[arg(short, long, default_value = "data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Collect a fresh report, save it and print its summary
    Collect {
        /// Buffered progress events before new ones are dropped
        #[arg(long, default_value_t = 64)]
        progress_buffer: usize,
    },
    /// Print the summary of the saved report, collecting one if none exists
    Show,
    /// Report whether a snapshot exists and how old it is
    Status,
    /// Delete snapshot backups older than the given age
    Prune {
        #[arg(long, default_value_t = 168)]
        max_age_hours: u64,
    },
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        eprintln!("unable to install the logging subscriber");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> OpenStackResult<()> {
    let client = || -> OpenStackResult<InventoryClient> {
        InventoryClient::builder()
            .config(InventoryConfig::from_env()?)
            .data_dir(cli.data_dir.clone())
            .build()
    };

    match cli.command {
        Command::Collect { progress_buffer } => {
            let client = client()?;
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupted, finishing the current request");
                    on_interrupt.cancel();
                }
            });

            let (handle, mut events) = client.spawn_refresh(progress_buffer, cancel);
            while let Some(event) = events.recv().await {
                print_event(&event);
            }
            let report = handle
                .await
                .map_err(|e| OpenStackError::DataUnavailable(format!("collection task failed: {}", e)))??;
            print_summary(&report);
        }
        Command::Show => {
            let report = client()?.get_all().await?;
            print_summary(&report);
        }
        Command::Status => {
            let status = client()?.status().await?;
            match status.age {
                Some(age) => println!(
                    "{}: saved {} ago",
                    status.path.display(),
                    format_age(age)
                ),
                None => println!("{}: no snapshot", status.path.display()),
            }
        }
        Command::Prune { max_age_hours } => {
            let max_age = Duration::from_secs(max_age_hours * 60 * 60);
            let removed = client()?.prune(max_age).await?;
            info!(removed, max_age_hours, "prune finished");
            println!("{} backup(s) removed", removed);
        }
    }
    Ok(())
}

fn print_event(event: &ProgressEvent) {
    let mut line = format!("[{:?}]", event.kind);
    if let Some(project) = &event.project {
        line.push_str(&format!(" {}", project));
    }
    if event.total_steps > 0 {
        line.push_str(&format!(" ({}/{})", event.current_step, event.total_steps));
    }
    println!("{} {}", line, event.message);
}

fn print_summary(report: &Report) {
    let summary = report.summary();
    println!("Report generated at {}", report.generated_at().to_rfc3339());
    println!("{:<18}{:>8}", "projects", summary.total_projects);
    for kind in ResourceType::ALL {
        println!("{:<18}{:>8}", kind.label(), summary.count(kind));
    }
    println!("{:<18}{:>8}", "total", summary.total_resources());
}

fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..60 => format!("{}s", secs),
        60..3600 => format!("{}m", secs / 60),
        _ => format!("{}h{}m", secs / 3600, (secs % 3600) / 60),
    }
}

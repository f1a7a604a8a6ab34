//! ticketfs - Zammad tickets as a filesystem
//!
//! Usage:
//!   ticketfs init                  - Write a configuration file
//!   ticketfs mount <mount_point>   - Mount the ticket tree
//!   ticketfs unmount <mount_point> - Unmount it again
//!   ticketfs states                - Show the ticket states known to Zammad

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ticketfs::{
    config::Config,
    fs::{FsContext, TicketFs},
    states::StateTable,
    zammad::{TicketBackend, ZammadClient},
    Error, Result,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "ticketfs")]
#[command(author = "ticketfs Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Zammad tickets as a filesystem")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "~/.config/ticketfs/config.json")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Token to use for Zammad authentication
    #[arg(short, long)]
    token: Option<String>,

    /// URL of the Zammad instance
    #[arg(short, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file from flags and environment
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Mount the filesystem
    Mount {
        /// Mount point directory (defaults to the configured one)
        mount_point: Option<PathBuf>,

        /// Allow other users to access the mount
        #[arg(long)]
        allow_other: bool,
    },

    /// Unmount the filesystem
    Unmount {
        /// Mount point to unmount
        mount_point: PathBuf,
    },

    /// List ticket states
    States,
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let config_path = expand_tilde(&cli.config);

    if let Err(e) = run_command(cli.command, &config_path, cli.token, cli.url) {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_command(
    command: Commands,
    config_path: &Path,
    token: Option<String>,
    url: Option<String>,
) -> Result<()> {
    match command {
        Commands::Init { force } => cmd_init(config_path, token, url, force),
        Commands::Mount {
            mount_point,
            allow_other,
        } => {
            let config = load_config(config_path, token, url)?;
            cmd_mount(config, mount_point, allow_other)
        }
        Commands::Unmount { mount_point } => cmd_unmount(&mount_point),
        Commands::States => {
            let config = load_config(config_path, token, url)?;
            cmd_states(&config)
        }
    }
}

/// Config file (or defaults when absent), then environment, then flags
fn load_config(path: &Path, token: Option<String>, url: Option<String>) -> Result<Config> {
    let mut config = if path.exists() {
        Config::read(path)?
    } else {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    if let Some(token) = token {
        config.zammad.token = token;
    }
    if let Some(url) = url {
        config.zammad.url = url;
    }

    config.validate()?;
    Ok(config)
}

fn cmd_init(
    config_path: &Path,
    token: Option<String>,
    url: Option<String>,
    force: bool,
) -> Result<()> {
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "{:?} already exists, use --force to overwrite",
            config_path
        )));
    }

    let mut config = Config::default();
    config.apply_env_overrides();
    if let Some(token) = token {
        config.zammad.token = token;
    }
    if let Some(url) = url {
        config.zammad.url = url;
    }
    config.validate()?;

    config.save(config_path)?;
    info!("Configuration written to {:?}", config_path);
    Ok(())
}

fn cmd_mount(mut config: Config, mount_point: Option<PathBuf>, allow_other: bool) -> Result<()> {
    if let Some(mount_point) = mount_point {
        config.mount.mount_point = mount_point;
    }
    config.mount.allow_other |= allow_other;
    let mount_point = config.mount.mount_point.clone();

    // Build mount options
    let mut options = vec![
        fuser::MountOption::FSName(config.mount.fs_name.clone()),
        fuser::MountOption::Subtype("ticketfs".to_string()),
    ];

    if config.mount.auto_unmount {
        options.push(fuser::MountOption::AutoUnmount);
    }

    if config.mount.allow_other {
        options.push(fuser::MountOption::AllowOther);
    }

    // Ensure mount point exists
    std::fs::create_dir_all(&mount_point)?;

    info!("Starting ticketfs against {}...", config.base_url());

    let backend: Arc<dyn TicketBackend> = Arc::new(ZammadClient::new(&config.zammad)?);

    // States are loaded once; they are not refreshed while mounted
    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal(e.to_string()))?;
    let states = runtime.block_on(StateTable::load(backend.as_ref()))?;

    let ctx = FsContext::from_config(&config, backend, Arc::new(states));
    let fs = TicketFs::new(ctx, runtime);

    info!("Mounting at {:?}", mount_point);
    fuser::mount2(fs, &mount_point, &options).map_err(|e| Error::Internal(e.to_string()))?;

    info!("Unmounted {:?}", mount_point);
    Ok(())
}

fn cmd_unmount(mount_point: &Path) -> Result<()> {
    info!("Unmounting {:?}...", mount_point);

    // Use fusermount/umount
    #[cfg(target_os = "linux")]
    let output = std::process::Command::new("fusermount")
        .arg("-u")
        .arg(mount_point)
        .output()?;

    #[cfg(not(target_os = "linux"))]
    let output = std::process::Command::new("umount")
        .arg(mount_point)
        .output()?;

    if output.status.success() {
        info!("Unmounted successfully");
        Ok(())
    } else {
        Err(Error::Internal(format!(
            "Failed to unmount: {}",
            String::from_utf8_lossy(&output.stderr)
        )))
    }
}

fn cmd_states(config: &Config) -> Result<()> {
    let client = ZammadClient::new(&config.zammad)?;
    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal(e.to_string()))?;
    let states = runtime.block_on(StateTable::load(&client))?;

    println!("{:>4}  NAME", "ID");
    for (id, name) in states.entries() {
        println!("{:>4}  {}", id, name);
    }

    Ok(())
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

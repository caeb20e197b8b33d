// attendance-api/src/main.rs

use clap::Parser;
use rocket::error;
use rocket::info;
use std::env;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Parser)]
#[command(name = "attendance-api")]
#[command(about = "QR attendance check-in API server")]
#[command(version)]
struct Cli {
    /// Show extended version information
    #[arg(long, action = clap::ArgAction::SetTrue)]
    version_info: bool,

    /// Load environment variables from this file instead of `.env`
    #[arg(long, value_name = "PATH")]
    env_file: Option<std::path::PathBuf>,
}

#[rocket::main]
async fn main() {
    let cli = Cli::parse();

    if cli.version_info {
        println!("attendance-api {}", built_info::PKG_VERSION);
        println!("Built: {}", built_info::BUILT_TIME_UTC);
        if let Some(commit) = built_info::GIT_COMMIT_HASH {
            println!("Git commit: {}", commit);
        }
        return;
    }

    let loaded = match &cli.env_file {
        Some(path) => dotenvy::from_path(path).map(|_| path.clone()),
        None => dotenvy::dotenv(),
    };

    match env::current_dir() {
        Ok(path) => info!("Current directory: {}", path.display()),
        Err(e) => error!("Error getting current directory: {}", e),
    };
    match loaded {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => info!("No environment file loaded: {}", e),
    }

    info!("attendance-api v{} starting", built_info::PKG_VERSION);
    info!("Built: {}", built_info::BUILT_TIME_UTC);

    if let Err(e) = attendance_api::rocket().launch().await {
        error!("Rocket server failed to launch: {}", e);
        std::process::exit(1);
    }
}

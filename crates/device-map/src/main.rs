use clap::{Parser, Subcommand};
use device_map::{parse_device_list, render_device_info, DeviceDetail, DeviceId, DisplayRecord, Endpoints};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "device-map", about = "Inspect device map requests and popups offline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the URLs the map layer requests
    Urls {
        /// Base URL of the device API
        #[arg(long, default_value = device_map::config::DEFAULT_API_ROOT)]
        api_root: String,

        /// Also print the detail URL for this device
        #[arg(long)]
        device_id: Option<String>,
    },
    /// List the markers a device list response would produce
    Markers {
        /// JSON file holding a list-devices response
        input: PathBuf,
    },
    /// Render the popup HTML for a device-info response
    Render {
        /// JSON file holding a device-info response
        input: PathBuf,
    },
}

fn read_input(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()))
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Urls { api_root, device_id } => {
            let endpoints = Endpoints::new(&api_root);
            println!("{}", endpoints.list_devices());
            if let Some(raw) = device_id {
                let value: serde_json::Value =
                    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
                let id = DeviceId::try_from(&value).map_err(|e| e.to_string())?;
                println!("{}", endpoints.device_info(&id));
            }
        }
        Command::Markers { input } => {
            let devices = parse_device_list(&read_input(&input)?).map_err(|e| e.to_string())?;
            log::info!("{} devices in {}", devices.len(), input.display());
            for device in &devices {
                let position = device.position();
                println!("{}\t{}\t{}", device.title(), position.lat, position.lng);
            }
        }
        Command::Render { input } => {
            let detail = DeviceDetail::from_json(&read_input(&input)?).map_err(|e| e.to_string())?;
            let record = DisplayRecord::from_detail(detail);
            println!("{}", render_device_info(&record).to_html());
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

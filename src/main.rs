// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};
use soundmngr::backend;
use soundmngr::config::SoundConfig;
use soundmngr::SoundMngr;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A sound effect manager."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Loads the sound effects tree and lists every sound with its size.
    Sounds {
        /// The path to the sound config.
        config_path: String,
        /// Only load sounds below this subfolder of the sound effects directory.
        subfolder: Option<String>,
    },
    /// Prints the backend device strings and global settings.
    Info {
        /// The path to the sound config.
        config_path: String,
    },
}

fn open(config_path: &str) -> Result<SoundMngr, Box<dyn Error>> {
    let config = SoundConfig::deserialize(&PathBuf::from(config_path))?;
    let mngr = SoundMngr::open(&config);
    if !mngr.is_working() {
        return Err(format!("unable to open sound device {}", config.device()).into());
    }
    Ok(mngr)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = backend::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Sounds {
            config_path,
            subfolder,
        } => {
            let mut mngr = open(&config_path)?;
            mngr.prefetch_all(subfolder.as_deref().unwrap_or(""))?;

            let Some(cache) = mngr.cache() else {
                return Ok(());
            };
            if cache.is_empty() {
                println!("No sounds found in {}.", cache.sfx_dir().display());
                return Ok(());
            }

            println!("Sounds (count: {}):", cache.len());
            for (name, sound) in cache.sorted() {
                println!(
                    "- {} ({} KB, {} ms)",
                    name,
                    sound.size_bytes() / 1024,
                    sound.duration().as_millis()
                );
            }
            println!("Total: {} KB", cache.memory_usage() / 1024);
        }
        Commands::Info { config_path } => {
            let mngr = open(&config_path)?;
            let unknown = || "unknown".to_string();

            println!("Vendor: {}", mngr.vendor().unwrap_or_else(unknown));
            println!("Version: {}", mngr.version().unwrap_or_else(unknown));
            println!("Renderer: {}", mngr.renderer().unwrap_or_else(unknown));
            println!("Extensions: {}", mngr.extensions().unwrap_or_else(unknown));
            println!(
                "Sources: {}",
                mngr.pool().map_or(0, |pool| pool.capacity())
            );
            println!("Doppler velocity: {}", mngr.doppler_velocity());
            println!("Doppler factor: {}", mngr.doppler_factor());
            println!("Distance model: {}", mngr.distance_model());
            mngr.log_memory_usage();
        }
    }

    Ok(())
}

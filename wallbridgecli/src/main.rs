use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wallbridge_core::{Conf, WallpaperDestination};
use wallbridgecli::{parse_size, WallbridgeCliApp};

#[derive(Parser)]
#[command(name = "wallbridgecli", version, about = "Set, clear and inspect the desktop wallpaper")]
struct Cli {
    /// Config file (defaults to wallbridge.json in the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the desired wallpaper size, e.g. 2560x1440
    #[arg(long, global = true)]
    desired: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the host platform version
    Version,
    /// Cover-fit an image to the desired size and apply it
    Set {
        file: PathBuf,
        /// home, lock, both or a raw integer flag
        #[arg(long, default_value = "both", value_parser = parse_destination)]
        location: WallpaperDestination,
    },
    /// Revert to the configured default wallpaper
    Clear,
    /// Print the desired minimum wallpaper width
    MinWidth,
    /// Print the desired minimum wallpaper height
    MinHeight,
    /// Cover-fit an image into a file without applying it
    Fit {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        size: String,
    },
    /// Send a raw method call and print the response envelope
    Call {
        method: String,
        /// JSON arguments object
        arguments: Option<String>,
    },
}

fn parse_destination(s: &str) -> Result<WallpaperDestination, String> {
    WallpaperDestination::parse(s).ok_or_else(|| format!("unknown location {:?}", s))
}

fn load_conf(cli: &Cli) -> Result<Conf> {
    let mut conf = match &cli.config {
        Some(path) => Conf::load(path)?,
        None => Conf::new()?,
    };
    if let Some(desired) = &cli.desired {
        let size = parse_size(desired).context("--desired")?;
        conf.desired_width = size.width;
        conf.desired_height = size.height;
    }
    Ok(conf)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let conf = load_conf(&cli)?;
    let app = WallbridgeCliApp::new(conf);

    match cli.command {
        None => app.run()?,
        Some(Command::Version) => println!("{}", app.platform_version()?),
        Some(Command::Set { file, location }) => {
            let status = app.set_wallpaper(&file, location)?;
            println!("{}", status);
            if status != wallbridge_core::STATUS_SUCCESS as i64 {
                std::process::exit(1);
            }
        }
        Some(Command::Clear) => {
            let cleared = app.clear_wallpaper()?;
            println!("{}", cleared);
            if !cleared {
                std::process::exit(1);
            }
        }
        Some(Command::MinWidth) => println!("{}", app.desired_size()?.0),
        Some(Command::MinHeight) => println!("{}", app.desired_size()?.1),
        Some(Command::Fit { input, output, size }) => {
            let (width, height) = app.fit_to_file(&input, &output, parse_size(&size)?)?;
            println!("Wrote {}x{} to {}", width, height, output.display());
        }
        Some(Command::Call { method, arguments }) => {
            println!("{}", app.call_raw(&method, arguments.as_deref())?);
        }
    }

    Ok(())
}

use std::{
    error::Error as StdError,
    fs,
    path::{Path, PathBuf},
};

use classroom_kiosk::{
    alarm_edit::{add_time, remove_time},
    config::Config,
    error::Error,
    store::{AlarmStore, SqliteStore},
    Kiosk,
};
use clap::{command, Parser, Subcommand};
use eframe::{egui::ViewportBuilder, run_native};
use log::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Use this config file instead of the one in the config dir
    #[clap(long, short)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default config and create the sound dir and database
    Init {
        #[clap(long, short)]
        force: bool,
    },
    AddAlarm {
        time: String,
    },
    RemoveAlarm {
        time: String,
    },
    ListAlarms,
}

fn main() -> Result<(), Box<dyn StdError>> {
    if let Err(err) = simple_file_logger::init_logger!("classroom_kiosk") {
        eprintln!("couldn't initialize logger: {err:?}");
    }

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match args.command {
        Some(Command::Init { force }) => init(&config_path, force)?,
        Some(Command::AddAlarm { time }) => {
            let store = open_store(&Config::load_or_default(&config_path)?)?;
            println!("added {}", add_time(&store, &time)?);
        }
        Some(Command::RemoveAlarm { time }) => {
            let store = open_store(&Config::load_or_default(&config_path)?)?;
            println!("removed {}", remove_time(&store, &time)?);
        }
        Some(Command::ListAlarms) => {
            let store = open_store(&Config::load_or_default(&config_path)?)?;
            for time in store.list().map_err(Error::from)? {
                println!("{time}");
            }
        }
        None => run(&Config::load_or_default(&config_path)?)?,
    }
    Ok(())
}

fn init(config_path: &Path, force: bool) -> Result<(), Error> {
    let config = if force || !config_path.exists() {
        let config = Config::new();
        config.save(config_path)?;
        info!("wrote default config to {}", config_path.display());
        config
    } else {
        warn!(
            "config {} already present, use --force to overwrite",
            config_path.display()
        );
        Config::load(config_path)?
    };
    create_sound_dir(&config)?;
    open_store(&config)?;
    println!("config: {}", config_path.display());
    println!("database: {}", config.database.display());
    println!("sounds: {}", config.sounds.dir.display());
    Ok(())
}

fn create_sound_dir(config: &Config) -> Result<(), Error> {
    fs::create_dir_all(&config.sounds.dir).map_err(|source| Error::SoundDir {
        path: config.sounds.dir.clone(),
        source,
    })
}

fn open_store(config: &Config) -> Result<SqliteStore, Error> {
    Ok(SqliteStore::open(&config.database)?)
}

fn run(config: &Config) -> Result<(), Error> {
    create_sound_dir(config)?;
    let store = open_store(config)?;
    info!("starting kiosk with database {}", store.path().display());

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("Classroom Kiosk")
            .with_fullscreen(true)
            .with_decorations(false)
            .with_always_on_top(),
        ..Default::default()
    };
    let config = config.clone();
    run_native(
        "Classroom Kiosk",
        native_options,
        Box::new(move |cc| Ok(Box::new(Kiosk::new(&config, store, &cc.egui_ctx)))),
    )
    .map_err(|err| Error::Gui(err.to_string()))
}

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use giveaway_cli::{commands, logging, readline, tasks};
use giveaway_core::config::{EngineLimits, default_config_path, load_config};
use giveaway_core::{
    AppConfig, ChannelSink, GiveawayId, LifecycleEngine, LoggingSink, Moderators, TokioScheduler,
    UserId,
};
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Run timed giveaways from the terminal")]
struct Args {
    /// Config file to use instead of the platform default
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref()).map_err(|e| e.to_string())?;
    let _log_guard = logging::init_logging(&config.log);
    let config_path = args.config.or_else(default_config_path);

    let (sink, events) = ChannelSink::channel();
    let engine = LifecycleEngine::builder(TokioScheduler::current())
        .authorizer(Moderators::from_config(&config))
        .config(config.engine.clone())
        .sink(LoggingSink)
        .sink(sink)
        .build();
    info!(moderators = config.moderators.len(), "Giveaway host ready");

    let renderer = tasks::spawn_renderer(events);
    let evictor = config
        .engine
        .eviction_retention()
        .map(|retention| tasks::spawn_evictor(engine.clone(), retention));

    let session = Session {
        engine,
        config,
        config_path,
    };

    loop {
        let Some(line) = readline()? else {
            commands::exit(&session.engine);
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &session) {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    if let Some(evictor) = evictor {
        evictor.abort();
        let _ = evictor.await;
    }
    // Dropping the last engine handle closes the event channel
    drop(session);
    let _ = renderer.await;
    Ok(())
}

struct Session {
    engine: LifecycleEngine,
    config: AppConfig,
    config_path: Option<PathBuf>,
}

#[derive(Parser)]
#[command(version, about = "giveaway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a new giveaway
    Start {
        #[arg(long)]
        host: UserId,
        #[arg(short, long)]
        prize: String,
        /// e.g. `30m`, `1h30m`, `2 days`
        #[arg(short, long)]
        duration: String,
        #[arg(short, long, default_value_t = 1)]
        winners: u32,
        /// Use this id instead of allocating one
        #[arg(long)]
        id: Option<GiveawayId>,
    },
    /// Toggle a user's entry
    Join {
        #[arg(long)]
        id: GiveawayId,
        #[arg(short, long)]
        user: UserId,
    },
    End {
        #[arg(long)]
        id: GiveawayId,
        #[arg(short, long)]
        actor: UserId,
    },
    Cancel {
        #[arg(long)]
        id: GiveawayId,
        #[arg(short, long)]
        actor: UserId,
    },
    Reroll {
        #[arg(long)]
        id: GiveawayId,
        #[arg(short, long)]
        winners: Option<u32>,
    },
    Show {
        #[arg(long)]
        id: GiveawayId,
        #[arg(long)]
        json: bool,
    },
    List,
    /// Show the active config
    Config {
        /// Write it to the config file instead of printing it
        #[arg(long)]
        save: bool,
    },
    Exit,
}

fn respond(line: &str, session: &Session) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "giveaway".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    let engine = &session.engine;
    let output = match cli.command {
        Some(Commands::Start {
            host,
            prize,
            duration,
            winners,
            id,
        }) => commands::start(engine, id, host, &prize, &duration, winners)?,
        Some(Commands::Join { id, user }) => commands::join(engine, id, user)?,
        Some(Commands::End { id, actor }) => commands::end(engine, id, actor)?,
        Some(Commands::Cancel { id, actor }) => commands::cancel(engine, id, actor)?,
        Some(Commands::Reroll { id, winners }) => commands::reroll(engine, id, winners)?,
        Some(Commands::Show { id, json }) => commands::show(engine, id, json)?,
        Some(Commands::List) => commands::list(engine)?,
        Some(Commands::Config { save: false }) => {
            commands::show_config(&session.config, session.config_path.as_deref())?
        }
        Some(Commands::Config { save: true }) => {
            commands::store_config(&session.config, session.config_path.as_deref())?
        }
        Some(Commands::Exit) => {
            commands::exit(engine);
            return Ok(true);
        }
        None => None,
    };

    if let Some(output) = output {
        println!("{output}");
    }
    Ok(false)
}

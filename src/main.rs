use clap::{Parser, Subcommand};
use dialoguer::Input;
use kodi_control::{
    Config, KodiControlError, MatchPolicy, MediaItem, MediaKind, ProgressEvent, Remote,
    parse_content_kind,
};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = "\
MOVIE, TV, and EPISODE commands can optionally specify the show or movie
you want to play:
    kodi movie 'The Avengers'
    kodi -t 'Game of Thrones'
    kodi -e 'Arrow - 3x04'

To get a list of movies or TV shows based on a search term, use:
    kodi find 'movies:The Avengers'
    kodi -f tv:Suits";

/// A simple program to control the Kodi media player.
#[derive(Debug, Parser)]
#[command(name = "kodi", after_help = AFTER_HELP, disable_version_flag = true)]
struct Cli {
    /// Config file (defaults to config.toml in the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Kodi host, overrides the config file
    #[arg(long, global = true)]
    host: Option<String>,

    /// Kodi web server port, overrides the config file
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Kodi web server username, overrides the config file
    #[arg(long, global = true)]
    username: Option<String>,

    /// Kodi web server password, overrides the config file
    #[arg(long, global = true)]
    password: Option<String>,

    /// Log requests and lookup decisions to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Continue playback
    #[command(short_flag = 'c')]
    Play,

    /// Pause playback
    #[command(short_flag = 'w')]
    Pause,

    /// Toggle between play and pause
    #[command(short_flag = 'p')]
    Toggle,

    /// Stop playback
    #[command(short_flag = 's')]
    Stop,

    /// Display on-screen info and what is playing
    #[command(short_flag = 'i')]
    Info,

    /// Show what is playing
    Status,

    /// Go to the home screen
    Home,

    /// Find and play a movie
    #[command(short_flag = 'm')]
    Movie {
        /// Title to search for
        title: Option<String>,

        /// Only play a movie whose title matches exactly
        #[arg(long)]
        exact: bool,
    },

    /// Play the next unwatched episode of a TV show
    #[command(short_flag = 't', visible_alias = "show")]
    Tv {
        /// Show to search for
        show: Option<String>,
    },

    /// Find and play a specific episode, e.g. 'Arrow - 3x04'
    #[command(short_flag = 'e')]
    Episode {
        /// Show and episode as 'Show Name - 1x01'
        query: Option<String>,
    },

    /// List the episodes of a TV show
    Episodes {
        /// Show to list
        show: String,
    },

    /// Find movies or TV shows, e.g. 'movies:The Avengers' or 'tv:Suits'
    #[command(short_flag = 'f')]
    Find {
        /// Content and search term as 'movies:Title' or 'tv:Title'
        query: Option<String>,
    },

    /// List movies or TV shows
    #[command(short_flag = 'l')]
    List {
        /// 'movies' or 'tv'
        kind: Option<String>,
    },

    /// Scan and update the video library
    #[command(short_flag = 'u', visible_alias = "update")]
    Scan,

    /// Display version and about information
    #[command(short_flag = 'v', visible_alias = "version")]
    About,
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::LookingFor { query, kind } => match kind {
            Some(MediaKind::Movie) => println!("Looking for '{}' in MOVIES...", query),
            Some(MediaKind::Show) => println!("Looking for '{}' in TV...", query),
            _ => println!("Looking for '{}'...", query),
        },
        ProgressEvent::Found { title } => {
            println!("Found '{}'", title);
        }
        ProgressEvent::LookingForEpisode { token } => {
            println!("Looking for episode '{}'...", token);
        }
        ProgressEvent::FetchingNextEpisode => {
            println!("Getting next episode...");
        }
    }
}

fn print_version_info() {
    println!(
        "
     Kodi-Control v. {}
           ---
A simple program to control
   the Kodi media player.
",
        env!("CARGO_PKG_VERSION")
    );
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "kodi_control=debug,kodi=debug"
    } else {
        "kodi_control=warn,kodi=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the configuration from the config file and command line overrides
fn load_config(cli: &Cli) -> Result<Config, KodiControlError> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(ref host) = cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(ref username) = cli.username {
        config.username = username.clone();
    }
    if let Some(ref password) = cli.password {
        config.password = Some(password.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Uses the given argument, or asks for one interactively
fn argument_or_prompt(value: Option<String>, prompt: &str) -> Option<String> {
    let value = match value {
        Some(value) => value,
        None => match Input::<String>::new().with_prompt(prompt).interact_text() {
            Ok(value) => value,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
    };

    let value = value.trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

fn print_titles(items: &[MediaItem]) {
    for item in items {
        println!("{}", item.display_name().unwrap_or(&item.file));
    }
}

fn run(remote: &Remote<kodi_control::HttpTransport>, command: Command) -> Result<(), KodiControlError> {
    match command {
        Command::Play => println!("{}", remote.play()?),
        Command::Pause => println!("{}", remote.pause()?),
        Command::Toggle => println!("{}", remote.toggle()?),
        Command::Stop => println!("{}", remote.stop()?),
        Command::Scan => println!("{}", remote.scan()?),
        Command::Info => println!("{}", remote.info()),
        Command::Status => println!("{}", remote.status()),
        Command::Home => println!("{}", remote.home()),
        Command::Movie { title, exact } => {
            if let Some(title) = argument_or_prompt(title, "Enter the movie to search for") {
                let policy = if exact {
                    MatchPolicy::Exact
                } else {
                    MatchPolicy::FirstMatch
                };
                println!("{}", remote.play_movie(&title, policy, handle_progress_event)?);
            }
        }
        Command::Tv { show } => {
            if let Some(show) = argument_or_prompt(show, "Enter the show to search for") {
                println!("{}", remote.play_next_episode(&show, handle_progress_event)?);
            }
        }
        Command::Episode { query } => {
            if let Some(query) = argument_or_prompt(query, "Enter the episode to search for") {
                println!("{}", remote.play_episode(&query, handle_progress_event)?);
            }
        }
        Command::Episodes { show } => {
            for label in remote.list_episodes(&show, handle_progress_event)? {
                println!("{}", label);
            }
        }
        Command::Find { query } => {
            if let Some(query) = argument_or_prompt(query, "What do you want to find?") {
                print_titles(&remote.find(&query, handle_progress_event)?);
            }
        }
        Command::List { kind } => {
            let Some(kind) = argument_or_prompt(kind, "List movies or TV shows? [MOVIES/TV]") else {
                return Ok(());
            };
            match parse_content_kind(&kind) {
                Some(MediaKind::Show) => {
                    println!("Listing TV shows.\n---");
                    print_titles(&remote.list_shows()?);
                }
                Some(_) => {
                    println!("Listing movies.\n---");
                    print_titles(&remote.list_movies()?);
                }
                None => {
                    eprintln!("[{}] is not something that can be listed.", kind.to_uppercase());
                    eprintln!("Try 'movies' or 'tv'.");
                    process::exit(1);
                }
            }
        }
        Command::About => print_version_info(),
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // About works without a reachable Kodi
    if matches!(cli.command, Command::About) {
        print_version_info();
        return;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let remote = match Remote::connect(&config) {
        Ok(remote) => remote,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&remote, cli.command) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

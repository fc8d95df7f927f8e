use clap::{Parser, Subcommand};
use guardian_rust::config::ClientOptions;
use guardian_rust::error::{Error, Notice};
use guardian_rust::session::{Route, SessionState};
use guardian_rust::sos::{Coordinates, Dispatch, FixedLocation, TriggerSource};
use guardian_rust::Guardian;

/// Session file used when GUARDIAN_SESSION_PATH is not set
const DEFAULT_SESSION_PATH: &str = ".guardian/session.json";

#[derive(Parser)]
#[clap(name = "guardian", version, about = "Guardian personal-safety client")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show whether a session is stored and where the app would route
    Status,
    /// Log in and store the session
    Login {
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    /// Remove the stored session
    Logout,
    /// Print the cached profile
    Whoami,
    /// Send an SOS alert from the given position
    Sos {
        #[clap(long, allow_hyphen_values = true)]
        lat: f64,
        #[clap(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// List community posts
    Posts,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        match err.notice() {
            Some(notice) => eprintln!("{}", notice),
            None => eprintln!("{}", err),
        }
        log::debug!("{:?}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let mut options = ClientOptions::from_env()?;
    if options.session_path.is_none() {
        options = options.with_session_path(DEFAULT_SESSION_PATH);
    }
    let guardian = Guardian::new(options)?;

    match cli.command {
        Command::Status => {
            let state = guardian.gate().check_session().await;
            let label = match state {
                SessionState::Authenticated => "signed in",
                SessionState::Unauthenticated => "signed out",
                SessionState::Unknown => "unknown",
            };
            println!("Session: {}", label);
            println!("Home: {:?}", guardian.gate().enter(Route::Home));
        }
        Command::Login { email, password } => {
            let session = guardian.login(&email, &password).await?;
            println!("Logged in as {}", session.profile.name);
        }
        Command::Logout => {
            guardian.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => match guardian.current_user().await? {
            Some(profile) => {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            }
            None => println!("Not logged in"),
        },
        Command::Sos { lat, lon } => {
            let trigger = guardian.sos()?;
            trigger
                .mount(&FixedLocation(Coordinates::new(lat, lon)))
                .await?;
            match trigger.activate(TriggerSource::Button).await? {
                Dispatch::Sent(sent) => {
                    println!("{}", Notice::sos_sent());
                    println!("{}", sent.alert.message);
                }
                Dispatch::InFlight => println!("An SOS is already being sent"),
            }
        }
        Command::Posts => {
            for post in guardian.community().list_posts().await? {
                println!(
                    "{}  {}  ({} comments)",
                    post.created_at.format("%Y-%m-%d %H:%M"),
                    post.title,
                    post.comments.len()
                );
            }
        }
    }

    Ok(())
}

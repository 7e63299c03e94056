//! Interactive terminal client for a team-chat service.
//!
//! # Usage
//!
//! ```bash
//! # Use ./bot.ini from the working directory
//! hubbub
//!
//! # Name a config file explicitly
//! hubbub my-bot.ini
//!
//! # Disable colors (useful for piping output)
//! hubbub --no-color
//! ```
//!
//! The config file is INI-style with an `[OAuth]` section carrying
//! `client_id`, `client_secret`, and `port`. On startup the ngrok agent is
//! spawned against the port so the service can deliver the OAuth callback,
//! the caller's identity is fetched (with one retry), and the menu loop
//! starts. Exit status is 0 on a normal exit and 1 when bootstrap fails.

use arrrg::CommandLine;
use arrrg_derive::CommandLine;

use hubbub::bootstrap;
use hubbub::config::DEFAULT_CONFIG_PATH;
use hubbub::input::Prompter;
use hubbub::monitor::MonitorRegistry;
use hubbub::render::Presenter;
use hubbub::session::Session;
use hubbub::tunnel::NgrokTunnel;

/// Command-line arguments for the hubbub binary.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
struct HubbubArgs {
    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    no_color: bool,
}

#[tokio::main]
async fn main() {
    let (args, free) = HubbubArgs::from_command_line_relaxed("hubbub [OPTIONS] [CONFIG]");
    let config_path = free
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);

    let tunnel = NgrokTunnel::new();
    let (client, identity) = match bootstrap::run(config_path, &tunnel).await {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("Exiting...");
            std::process::exit(1);
        }
    };

    let presenter = Presenter::with_color(!args.no_color);
    presenter.identity(&identity);

    let registry = MonitorRegistry::new();

    // Ctrl-C lands here only between prompts (the line editor owns the
    // terminal while reading); release the watchers before dying.
    let interrupted = registry.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        interrupted.stop_all();
        std::process::exit(130);
    }) {
        eprintln!("Failed to install the interrupt handler: {err}");
    }

    let prompter = match Prompter::console() {
        Ok(prompter) => prompter,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let mut session = Session::new(client, identity, prompter, presenter, registry);
    session.run().await;
    println!("Goodbye!");
}

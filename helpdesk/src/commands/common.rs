use std::io::IsTerminal;

use tracing::*;

/// Exits unless stdin is a terminal, since the command prompts for a password.
pub(crate) fn assert_interactive_terminal() {
    if !std::io::stdin().is_terminal() {
        error!("Please run this command from an interactive terminal.");
        if std::env::var("DOCKER").is_ok() {
            info!("(have you forgotten `docker run -it`?)");
        }
        std::process::exit(1);
    }
}

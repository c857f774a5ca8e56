pub mod config_cmd;
pub mod status;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Dispatch a command that talks to a receiver.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    tracing::debug!(
        profile = %resolved.profile_name,
        address = %resolved.address(),
        mode = %resolved.config.connection_mode(),
        "resolved receiver"
    );
    match cmd {
        Command::Status(args) => status::handle(args, resolved, global).await,
        Command::Watch(args) => watch::handle(args, resolved, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a receiver connection".into(),
        )),
    }
}

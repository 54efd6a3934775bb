//! `kruzic`: command-line access to the Kružić platform's SDK API.
//!
//! Uses a game's API key to do what a game backend would:
//!
//! - **`validate-key`**: check that the key is accepted for the game.
//! - **`get`** / **`set`** / **`delete`**: read or change one stored value.
//! - **`list`**: list a user's stored keys.
//!
//! Results are printed to stdout as pretty JSON. Credentials come from flags
//! or the `KRUZIC_API_KEY` / `KRUZIC_GAME_ID` / `KRUZIC_BASE_URL` variables.

use std::process;

use clap::{Parser, Subcommand};
use kruzic_server::{KruzicServer, ServerOptions};
use serde_json::Value;
use tracing::debug;

/// kruzic: Kružić platform SDK CLI
#[derive(Parser)]
#[command(name = "kruzic", version, about, long_about = None)]
struct Cli {
    /// Secret API key issued for the game.
    #[arg(long, env = "KRUZIC_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Game the API key belongs to.
    #[arg(long, env = "KRUZIC_GAME_ID")]
    game_id: String,

    /// Platform origin; `/api/sdk` is appended.
    #[arg(long, env = "KRUZIC_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the API key is valid for the game.
    ValidateKey,

    /// Print the value stored under KEY for USER, or `null` when unset.
    Get { user: String, key: String },

    /// Store VALUE under KEY for USER.
    ///
    /// VALUE is parsed as JSON; anything that is not valid JSON is stored as
    /// a string, so `kruzic set u1 name Mila` works without quoting.
    Set {
        user: String,
        key: String,
        value: String,
    },

    /// Delete the value stored under KEY for USER.
    Delete { user: String, key: String },

    /// List the keys stored for USER.
    List { user: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kruzic=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut options = ServerOptions::new(cli.api_key, cli.game_id);
    options.base_url = cli.base_url;
    let server = KruzicServer::new(options);
    debug!(api_base = server.api_base(), "using platform");

    let output = match cli.command {
        Command::ValidateKey => {
            let validation = server.validate_key().await.unwrap_or_else(|e| fatal(&e));
            if !validation.valid {
                let reason = validation.error.as_deref().unwrap_or("key rejected");
                fatal(&format!("invalid key: {reason}"));
            }
            to_json(&validation)
        }
        Command::Get { user, key } => {
            let value = server
                .get_user_data(&user, &key)
                .await
                .unwrap_or_else(|e| fatal(&e));
            value.unwrap_or(Value::Null)
        }
        Command::Set { user, key, value } => {
            let value = parse_value(value);
            server
                .set_user_data(&user, &key, &value)
                .await
                .unwrap_or_else(|e| fatal(&e));
            serde_json::json!({ "success": true })
        }
        Command::Delete { user, key } => {
            server
                .delete_user_data(&user, &key)
                .await
                .unwrap_or_else(|e| fatal(&e));
            serde_json::json!({ "success": true })
        }
        Command::List { user } => {
            let keys = server
                .list_user_data(&user)
                .await
                .unwrap_or_else(|e| fatal(&e));
            to_json(&keys)
        }
    };

    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{text}"),
        Err(e) => fatal(&e),
    }
}

/// Parse a command-line value as JSON, keeping it as a string otherwise.
fn parse_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| fatal(&e))
}

/// Print an error message to stderr and exit with code 1.
fn fatal(msg: &dyn std::fmt::Display) -> ! {
    eprintln!("kruzic: {msg}");
    process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn values_parse_as_json_or_fall_back_to_strings() {
        assert_eq!(parse_value("42".into()), json!(42));
        assert_eq!(parse_value(r#"{"a":[1,2]}"#.into()), json!({ "a": [1, 2] }));
        assert_eq!(parse_value("\"quoted\"".into()), json!("quoted"));
        assert_eq!(parse_value("Mila".into()), json!("Mila"));
        assert_eq!(parse_value("{broken".into()), json!("{broken"));
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from([
            "kruzic", "--api-key", "sk", "--game-id", "snake", "set", "u1", "best", "1200",
        ])
        .unwrap();
        match cli.command {
            Command::Set { user, key, value } => {
                assert_eq!((user.as_str(), key.as_str(), value.as_str()), ("u1", "best", "1200"));
            }
            _ => panic!("expected set"),
        }
        assert_eq!(cli.game_id, "snake");
    }
}

use crate::config::{config_dir, ApiConfig};

/// Try to run a CLI command and capture stdout as a token
fn try_cli_token(command: &str) -> Option<String> {
    let output = std::process::Command::new("sh")
        .args(["-c", command])
        .output()
        .ok()?;

    if output.status.success() {
        return non_empty(&String::from_utf8_lossy(&output.stdout));
    }
    None
}

fn non_empty(raw: &str) -> Option<String> {
    let token = raw.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Stored token path: ~/.config/repolens/token
fn token_path() -> Option<std::path::PathBuf> {
    Some(config_dir()?.join("token"))
}

fn load_stored_token() -> Option<String> {
    let path = token_path()?;
    let token = std::fs::read_to_string(path).ok()?;
    non_empty(&token)
}

/// Find an API token, trying in order:
/// 1. Env var from config
/// 2. Stored token from ~/.config/repolens/token
/// 3. CLI command from config
///
/// Returns None when nothing is found; public repositories work anonymously.
pub fn load_token(config: &ApiConfig) -> Option<String> {
    if let Some(env_var) = &config.token_env {
        if let Some(token) = std::env::var(env_var).ok().as_deref().and_then(non_empty) {
            return Some(token);
        }
    }

    if let Some(token) = load_stored_token() {
        return Some(token);
    }

    if let Some(cmd) = &config.token_command {
        if let Some(token) = try_cli_token(cmd) {
            return Some(token);
        }
    }

    tracing::info!("no API token found, using anonymous access");
    None
}

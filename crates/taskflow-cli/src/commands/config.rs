use std::env;
use std::path::Path;

use crate::cli::ConfigCommands;
use crate::commands::common::resolve_sync_settings;
use crate::config_profiles::{
    default_config_path, is_http_url, normalize_text_option, CliProfile, CliProfilesConfig,
};
use crate::error::CliError;

pub fn run_config(
    command: ConfigCommands,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            remote_url,
            api_key,
            user_id,
            no_activate,
        } => run_config_init(profile, remote_url, api_key, user_id, no_activate),
        ConfigCommands::Show => run_config_show(profile, db_path),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    remote_url: Option<String>,
    api_key: Option<String>,
    user_id: Option<String>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    let profile = config.profile_mut_or_default(&profile_name);
    merge_profile(
        profile,
        remote_url.or_else(|| env::var("TASKFLOW_REMOTE_URL").ok()),
        api_key.or_else(|| env::var("TASKFLOW_API_KEY").ok()),
        user_id.or_else(|| env::var("TASKFLOW_USER_ID").ok()),
    );
    validate_profile(profile)?;
    let is_remote_ready = profile.remote_config().is_some();

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }
    let path = config.save().map_err(CliError::Config)?;
    println!("Saved profile '{profile_name}' to {}", path.display());

    if is_remote_ready {
        println!("Remote sync is configured. Run `taskflow sync test` to check the connection.");
    } else {
        println!("Profile '{profile_name}' has no remote_url; TaskFlow will run local-only.");
    }
    Ok(())
}

/// Apply non-empty values over the stored profile.
pub fn merge_profile(
    profile: &mut CliProfile,
    remote_url: Option<String>,
    api_key: Option<String>,
    user_id: Option<String>,
) {
    if let Some(url) = normalize_text_option(remote_url) {
        profile.remote_url = Some(url.trim_end_matches('/').to_string());
    }
    if let Some(key) = normalize_text_option(api_key) {
        profile.api_key = Some(key);
    }
    if let Some(user_id) = normalize_text_option(user_id) {
        profile.user_id = Some(user_id);
    }
}

pub fn validate_profile(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = normalize_text_option(profile.remote_url.clone()) {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "remote_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}

fn run_config_show(profile_name: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let resolved_name = config.resolve_profile_name(profile_name);
    let settings = resolve_sync_settings(Some(&resolved_name))?;

    println!("config file: {}", default_config_path().display());
    println!("profile:     {resolved_name}");
    println!("database:    {}", db_path.display());
    match settings.remote {
        Some(remote) => {
            println!("remote url:  {}", remote.base_url);
            println!(
                "api key:     {}",
                if remote.api_key.is_some() { "set" } else { "not set" }
            );
        }
        None => println!("remote url:  not configured (local-only)"),
    }
    println!("user id:     {}", settings.config.user_id);
    Ok(())
}

use crate::output::Output;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_tracker_config::{Config, Environment, PathManager, API_URL_ENV};
use owo_colors::OwoColorize;
use serde_json::json;

pub fn run_config(cmd: crate::ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show => show_config(output),
        crate::ConfigCommands::Init { force, production } => init_config(force, production, output),
    }
}

fn show_config(output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    let exists = config_file.exists();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let base_url = config.resolved_base_url();
    let env_override = std::env::var(API_URL_ENV).ok();

    if !output.is_human() {
        output.json(&json!({
            "type": "config",
            "config_file": config_file.display().to_string(),
            "exists": exists,
            "preferences_file": path_manager.preferences_file().display().to_string(),
            "log_file": path_manager.log_file().display().to_string(),
            "gateway": {
                "environment": config.gateway.environment,
                "base_url": base_url,
                "base_url_from_env": env_override.is_some(),
                "request_timeout_secs": config.gateway.request_timeout_secs,
                "user_agent": config.gateway.user_agent,
            },
            "ui": {
                "default_category": config.ui.default_category.to_string(),
                "show_recommendations": config.ui.show_recommendations,
            },
        }));
        return Ok(());
    }

    if output.is_quiet() {
        return Ok(());
    }

    if !exists {
        output.warn(format!("No configuration file at {}; showing defaults", config_file.display()));
        output.info("Create one with 'mediatracker config init'.");
        println!();
    }

    println!("{}", "Configuration".bright_cyan().bold());

    let mut paths_table = Table::new();
    paths_table.set_header(vec![
        Cell::new("Paths").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new(""),
    ]);
    paths_table.add_row(vec![Cell::new("Config file"), Cell::new(config_file.display().to_string())]);
    paths_table.add_row(vec![
        Cell::new("Preferences"),
        Cell::new(path_manager.preferences_file().display().to_string()),
    ]);
    paths_table.add_row(vec![Cell::new("Log file"), Cell::new(path_manager.log_file().display().to_string())]);
    paths_table.load_preset(comfy_table::presets::UTF8_FULL);
    paths_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", paths_table);
    println!();

    let mut gateway_table = Table::new();
    gateway_table.set_header(vec![
        Cell::new("Catalog Service").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new(""),
    ]);
    let environment = match config.gateway.environment {
        Environment::Development => "development",
        Environment::Production => "production",
    };
    gateway_table.add_row(vec![Cell::new("Environment"), Cell::new(environment)]);
    let source = if env_override.is_some() {
        format!("{} (from {})", base_url, API_URL_ENV)
    } else {
        base_url
    };
    gateway_table.add_row(vec![Cell::new("Base URL"), Cell::new(source)]);
    gateway_table.add_row(vec![
        Cell::new("Request timeout"),
        Cell::new(
            config
                .gateway
                .request_timeout_secs
                .map(|secs| format!("{}s", secs))
                .unwrap_or_else(|| "none".to_string()),
        ),
    ]);
    gateway_table.add_row(vec![Cell::new("User agent"), Cell::new(&config.gateway.user_agent)]);
    gateway_table.load_preset(comfy_table::presets::UTF8_FULL);
    gateway_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", gateway_table);
    println!();

    let mut ui_table = Table::new();
    ui_table.set_header(vec![
        Cell::new("Display").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new(""),
    ]);
    ui_table.add_row(vec![Cell::new("Default status filter"), Cell::new(config.ui.default_category)]);
    ui_table.add_row(vec![
        Cell::new("Show recommendations"),
        Cell::new(if config.ui.show_recommendations { "yes" } else { "no" }),
    ]);
    ui_table.load_preset(comfy_table::presets::UTF8_FULL);
    ui_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", ui_table);

    if let Err(e) = config.validate() {
        println!();
        output.warn(format!("Configuration problem: {}", e));
    }

    Ok(())
}

fn init_config(force: bool, production: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if config_file.exists() && !force {
        output.warn(format!("Configuration already exists at {}", config_file.display()));
        output.info("Pass --force to overwrite it with defaults.");
        return Ok(());
    }

    let mut config = Config::default();
    if production {
        config.gateway.environment = Environment::Production;
    }
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Default configuration is invalid: {}", e))?;

    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create {}: {}", path_manager.config_dir().display(), e))?;
    config
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    tracing::info!(path = %config_file.display(), "Configuration written");
    if output.is_human() {
        output.success(format!("Configuration written to {}", config_file.display()));
        output.println(format!("  Catalog service: {}", config.resolved_base_url()));
    } else {
        output.json(&json!({
            "type": "config_written",
            "config_file": config_file.display().to_string(),
            "base_url": config.resolved_base_url(),
        }));
    }
    Ok(())
}

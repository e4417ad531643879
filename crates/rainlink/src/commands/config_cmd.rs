//! Config subcommand handlers.

use dialoguer::{Confirm, Input};

use rainlink_config::{Config, Profile};
use rainlink_core::default_zones;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn validate_endpoint(raw: &str) -> Result<String, CliError> {
    rainlink_api::parse_endpoint(raw).map_err(|e| CliError::Validation {
        field: "endpoint".into(),
        reason: e.to_string(),
    })?;
    Ok(raw.trim().to_owned())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, mut cfg: Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("rainlink configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let endpoint: String = Input::new()
                .with_prompt("Controller address (host:port or ws:// URL)")
                .default(Profile::default().endpoint)
                .validate_with(|input: &String| {
                    rainlink_api::parse_endpoint(input)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(prompt_err)?;

            let write_zones = Confirm::new()
                .with_prompt("Write the factory zone layout so it can be edited?")
                .default(true)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile {
                endpoint: validate_endpoint(&endpoint)?,
                ..Profile::default()
            };
            if write_zones {
                profile.set_zones(&default_zones());
            }

            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            let path = config::save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: rainlink zones --live 5");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let out = match global.output_format() {
                OutputFormat::Table | OutputFormat::Plain => {
                    toml::to_string_pretty(&cfg).map_err(|e| CliError::Validation {
                        field: "config".into(),
                        reason: format!("failed to serialize config: {e}"),
                    })?
                }
                ref format => output::render_single(format, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Set endpoint ────────────────────────────────────────────
        ConfigCommand::SetEndpoint { endpoint } => {
            let endpoint = validate_endpoint(&endpoint)?;
            let profile_name = config::active_profile_name(global, &cfg);

            cfg.profiles
                .entry(profile_name.clone())
                .or_default()
                .endpoint
                .clone_from(&endpoint);
            let path = config::save_config(&cfg)?;

            if !global.quiet {
                eprintln!(
                    "Profile '{profile_name}' now uses {endpoint} ({})",
                    path.display()
                );
            }
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let active = config::active_profile_name(global, &cfg);
            let names: Vec<&String> = cfg.profiles.keys().collect();

            let out = match global.output_format() {
                OutputFormat::Table => names
                    .iter()
                    .map(|name| {
                        let marker = if **name == active { "*" } else { " " };
                        format!("{marker} {name}")
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
                OutputFormat::Plain => names
                    .iter()
                    .map(|name| name.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
                ref format => output::render_single(format, &names, |_| String::new(), |_| String::new())?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            if !cfg.profiles.contains_key(&name) {
                return Err(config::profile_not_found(name, &cfg));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;

            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

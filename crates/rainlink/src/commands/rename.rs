//! `rainlink rename`: rename a zone and persist it to the active profile.
//!
//! Renames are local to the dashboard; the board is never contacted.

use rainlink_config::Config;
use rainlink_core::{Dashboard, ZoneId};

use crate::cli::{GlobalOpts, RenameArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: RenameArgs, mut cfg: Config, global: &GlobalOpts) -> Result<(), CliError> {
    // `--endpoint` is ignored here; it must not leak into the saved profile.
    let (name, mut profile) = config::resolve_profile(global, &cfg)?;

    let dashboard = Dashboard::new(rainlink_config::profile_to_dashboard_config(&profile)?)?;
    let id = ZoneId::new(args.id);
    dashboard.rename_zone(id, &args.name)?;

    let snapshot = dashboard.zones_snapshot();
    profile.set_zones(snapshot.zones());
    cfg.profiles.insert(name.clone(), profile);
    let path = config::save_config(&cfg)?;
    tracing::debug!(path = %path.display(), profile = %name, "zone layout saved");

    let Some(zone) = snapshot.get(id) else {
        return Err(CliError::ZoneNotFound { id: id.to_string() });
    };
    let out = output::render_single(
        &global.output_format(),
        zone,
        |z| format!("Zone {} renamed to \"{}\"", z.id, z.name),
        |z| z.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

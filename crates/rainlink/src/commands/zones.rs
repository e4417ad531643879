//! `rainlink zones`: zone table plus summary.

use std::time::Duration;

use rainlink_config::Config;
use rainlink_core::{Dashboard, MoistureLevel, Zone, ZoneFilter};

use crate::cli::{GlobalOpts, OutputFormat, ZoneFilterArg, ZonesArgs};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output::{self, ZoneRow};

impl From<ZoneFilterArg> for ZoneFilter {
    fn from(arg: ZoneFilterArg) -> Self {
        match arg {
            ZoneFilterArg::All => Self::All,
            ZoneFilterArg::Active => Self::Active,
            ZoneFilterArg::Inactive => Self::Inactive,
            ZoneFilterArg::Low => Self::ByLevel(MoistureLevel::Low),
            ZoneFilterArg::Normal => Self::ByLevel(MoistureLevel::Normal),
            ZoneFilterArg::Excellent => Self::ByLevel(MoistureLevel::Excellent),
        }
    }
}

pub async fn handle(args: ZonesArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let dashboard = Dashboard::new(config::build_dashboard_config(global, cfg)?)?;

    if let Some(secs) = args.live {
        util::listen(&dashboard, Duration::from_secs(secs), global).await?;
    }

    let snapshot = dashboard.zones_snapshot();
    let filter = ZoneFilter::from(args.filter);
    let zones: Vec<Zone> = snapshot.zones().filter(|z| filter.matches(z)).cloned().collect();

    let format = global.output_format();
    let color = output::should_color(&global.color_mode());
    let out = output::render_list(
        &format,
        &zones,
        |z| ZoneRow::new(z, color),
        |z| z.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);

    if format == OutputFormat::Table && !global.quiet {
        println!("\n{}", output::summary_detail(&snapshot.summary(), color));
    }
    Ok(())
}

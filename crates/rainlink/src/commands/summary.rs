//! `rainlink summary`: the dashboard's header cards.

use std::time::Duration;

use rainlink_config::Config;
use rainlink_core::Dashboard;

use crate::cli::{GlobalOpts, SummaryArgs};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: SummaryArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let dashboard = Dashboard::new(config::build_dashboard_config(global, cfg)?)?;

    if let Some(secs) = args.live {
        util::listen(&dashboard, Duration::from_secs(secs), global).await?;
    }

    let color = output::should_color(&global.color_mode());
    let out = output::render_single(
        &global.output_format(),
        &dashboard.summary(),
        |s| output::summary_detail(s, color),
        |s| format!("{}/{}", s.active_count, s.total),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

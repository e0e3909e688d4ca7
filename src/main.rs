mod chart;
mod chat;
mod clients;
mod config;
mod dashboard;
mod filters;
mod models;
mod notify;
mod report;
mod selection;
mod stats;
mod tasks;

use chart::surface::SvgSurface;
use chat::{ChatWidget, LogChatWidget};
use clients::{EnvIdentity, HttpPollSource, HttpReportGenerator};
use config::Config;
use dashboard::{Collaborators, Dashboard, DashboardError};
use log::{error, info, warn};
use selection::RevealStage;
use std::sync::Arc;
use std::time::Duration;

const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(50);
const MAX_SETTLE_POLLS: u32 = 200;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    if config.report_api_token.is_none() {
        warn!("REPORT_API_TOKEN is not set; report generation will fail");
    }

    let identity = Arc::new(EnvIdentity::new(
        &config.user_email,
        config.user_password.clone(),
        config.user_groups.clone(),
        config.user_attributes(),
    ));
    // The container has no width until the first resize.
    let dashboard = Dashboard::new(
        Collaborators {
            polls: Arc::new(HttpPollSource::new(&config.poll_api_url)),
            reports: Arc::new(HttpReportGenerator::new(&config.report_api_url, config.report_api_token.clone())),
            identity,
        },
        Box::new(SvgSurface::new(0.0)),
    );

    if let Err(e) = run(&dashboard, &config).await {
        error!("Dashboard session failed: {}", e);
    }

    if let Err(e) = dashboard.sign_out().await {
        error!("Error signing out: {}", e);
        dashboard.shutdown().await;
    }
    info!("{} notice(s) shown this session", dashboard.notices().all().len());
}

// One headless pass over the dashboard: sign in, load, filter, select, render, report.
async fn run(dashboard: &Dashboard, config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let password = config.user_password.as_deref().unwrap_or_default();
    let caller = dashboard.sign_in(&config.user_email, password).await?;
    info!("Dashboard for {}", caller.email().unwrap_or("unknown user"));

    match dashboard.load(caller).await {
        Ok(count) => info!("{} poll(s) available", count),
        Err(DashboardError::AccessDenied) => {
            warn!("No polls are sponsored by any of the user's groups");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }
    info!("Poll list {:?}", dashboard.fetch_state().await);

    match dashboard.resize(config.chart_width).await {
        Ok(_) => {}
        Err(DashboardError::GeometryPrecondition(width)) => warn!("CHART_WIDTH {} is too small to draw", width),
        Err(e) => return Err(e.into()),
    }

    if config.chat {
        let widget: Arc<dyn ChatWidget> = Arc::new(LogChatWidget::new());
        if let Some(widget) = dashboard.attach_chat(|| Some(Arc::clone(&widget))).await {
            widget.open();
            widget.close();
        }
    }

    if let Some(term) = &config.search {
        dashboard.set_search(term).await;
    }
    let rows = dashboard.rows().await;
    for poll in &rows {
        info!(
            "{} | {} | {} ({}) vs {} ({})",
            poll.post_id, poll.caption, poll.option1, poll.response_count1, poll.option2, poll.response_count2
        );
    }
    dashboard.reset_search().await;

    let Some(post_id) = config.select.clone().or_else(|| rows.first().map(|p| p.post_id.clone())) else {
        info!("No poll to select");
        return Ok(());
    };
    dashboard.select(&post_id).await?;
    wait_until_settled(dashboard).await;

    let view = dashboard.view().await;
    info!("[{}] {}", view.title_size.class(), view.title);
    if let (Some(p1), Some(p2)) = (&view.percent1, &view.percent2) {
        info!("{}: {} | {}: {}", view.option1.unwrap_or_default(), p1, view.option2.unwrap_or_default(), p2);
    }
    if let Some(annotation) = &view.annotation {
        info!("{}", annotation);
    }
    if let Some(significance) = &view.significance {
        info!("{}", significance);
    }
    info!("{}", view.questions_left);

    if let Some(path) = &config.chart_output {
        let svg = dashboard.surface().lock().await.export();
        match svg {
            Some(svg) => match std::fs::write(path, svg) {
                Ok(()) => info!("Chart written to {}", path.display()),
                Err(e) => error!("Failed to write chart to {}: {}", path.display(), e),
            },
            None => warn!("Chart was not rendered; nothing written to {}", path.display()),
        }
    }

    if config.generate_report {
        dashboard.toggle_report_view().await?;
        if let Some(report) = dashboard.view().await.report_text {
            println!("{}", report);
        }
        dashboard.close_report().await;
    }

    Ok(())
}

async fn wait_until_settled(dashboard: &Dashboard) {
    for _ in 0..MAX_SETTLE_POLLS {
        let settled = dashboard.view().await.stage == RevealStage::AnnotationShown;
        if settled && !dashboard.is_chart_animating().await {
            return;
        }
        tokio::time::sleep(SETTLE_POLL_INTERVAL).await;
    }
    warn!("Reveal did not settle in time");
}

pub mod view;

use crate::chart::geometry::ChartGeometry;
use crate::chart::surface::Surface;
use crate::chart::{ChartEngine, ChartTiming};
use crate::chat::{ChatBridge, ChatWidget};
use crate::clients::{IdentityError, IdentityProvider, PollSource, ReportGenerator};
use crate::filters::{matching, visible_polls};
use crate::models::{CallerContext, FetchState, PollRecord};
use crate::notify::{Notice, NoticeLog, Notifier};
use crate::report::{ReportOrchestrator, ReportView};
use crate::selection::Timings;
use crate::tasks::chart_animation::{ChartCanvas, SharedSurface};
use crate::tasks::reveal::{RevealHooks, RevealScheduler};
use async_trait::async_trait;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::Mutex;
use view::{compose, DashboardView, ViewInputs};

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Failed to load poll data: {0}")]
    FetchFailure(String),
    #[error("No polls match the user's groups")]
    AccessDenied,
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailure(String),
    #[error("Chart container has no usable width ({0})")]
    GeometryPrecondition(f64),
    #[error("No question selected")]
    NoSelection,
    #[error("Unknown poll {0}")]
    UnknownPoll(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

pub struct Collaborators {
    pub polls: Arc<dyn PollSource>,
    pub reports: Arc<dyn ReportGenerator>,
    pub identity: Arc<dyn IdentityProvider>,
}

#[derive(Default)]
struct PollStore {
    fetch_state: FetchState,
    polls: Vec<PollRecord>,
    search_term: String,
}

// Reveal side effects on the chart and the report pane.
struct DashboardHooks {
    reports: ReportOrchestrator,
    canvas: Arc<ChartCanvas>,
}

#[async_trait]
impl RevealHooks for DashboardHooks {
    async fn on_fade_out(&self) {
        self.canvas.stop().await;
    }

    async fn on_swap(&self, poll: &PollRecord) {
        self.reports.reset_for(&poll.post_id).await;
        self.reports.preload(poll).await;
    }

    async fn on_chart_building(&self, poll: &PollRecord) {
        if !self.canvas.show(poll).await {
            debug!("Chart container not measured yet; poll {} drawn on resize", poll.post_id);
        }
    }
}

pub struct Dashboard {
    polls: Arc<dyn PollSource>,
    identity: Arc<dyn IdentityProvider>,
    notices: Arc<NoticeLog>,
    store: Mutex<PollStore>,
    caller: Mutex<CallerContext>,
    scheduler: RevealScheduler,
    canvas: Arc<ChartCanvas>,
    reports: ReportOrchestrator,
    chat: ChatBridge,
}

impl Dashboard {
    pub fn new(collaborators: Collaborators, surface: Box<dyn Surface>) -> Self {
        let notices = Arc::new(NoticeLog::default());
        let reports = ReportOrchestrator::new(collaborators.reports, notices.clone());
        let canvas = Arc::new(ChartCanvas::new(ChartEngine::new(ChartTiming::default()), Arc::new(Mutex::new(surface))));
        let hooks = Arc::new(DashboardHooks { reports: reports.clone(), canvas: Arc::clone(&canvas) });

        Self {
            polls: collaborators.polls,
            identity: collaborators.identity,
            notices,
            store: Mutex::new(PollStore::default()),
            caller: Mutex::new(CallerContext::default()),
            scheduler: RevealScheduler::new(Timings::default(), hooks),
            canvas,
            reports,
            chat: ChatBridge::new(),
        }
    }

    pub fn surface(&self) -> SharedSurface {
        self.canvas.surface()
    }

    pub fn notices(&self) -> Arc<NoticeLog> {
        Arc::clone(&self.notices)
    }

    pub async fn resolve_caller(&self) -> Result<CallerContext, DashboardError> {
        let groups = self.identity.current_user_groups().await?;
        let attributes = self.identity.current_user_attributes().await?;
        info!("User groups: {:?}", groups);
        Ok(CallerContext::new(groups, attributes))
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<CallerContext, DashboardError> {
        self.identity.sign_in(username, password).await?;
        self.resolve_caller().await
    }

    // Number of visible polls. Without groups nothing is fetched and the load
    // can run again later.
    pub async fn load(&self, caller: CallerContext) -> Result<usize, DashboardError> {
        self.chat.update_attributes(caller.attributes.clone());
        *self.caller.lock().await = caller.clone();

        {
            let mut store = self.store.lock().await;
            if !store.fetch_state.can_start() {
                return Ok(store.polls.len());
            }
            if caller.groups.is_empty() {
                info!("Waiting for user groups before loading polls");
                return Ok(0);
            }
            store.fetch_state = FetchState::Loading;
        }

        let fetched = self.polls.fetch_poll_data().await;

        let mut store = self.store.lock().await;
        match fetched {
            Ok(all) => {
                store.polls = visible_polls(&all, &caller.groups);
                store.fetch_state = FetchState::Loaded;
                if store.polls.is_empty() {
                    return Err(DashboardError::AccessDenied);
                }
                info!("Loaded {} of {} poll(s)", store.polls.len(), all.len());
                Ok(store.polls.len())
            }
            Err(e) => {
                error!("Error fetching poll data: {}", e);
                store.polls.clear();
                store.fetch_state = FetchState::Failed;
                Err(DashboardError::FetchFailure(e.to_string()))
            }
        }
    }

    pub async fn fetch_state(&self) -> FetchState {
        self.store.lock().await.fetch_state
    }

    pub async fn set_search(&self, term: &str) {
        self.store.lock().await.search_term = term.to_string();
    }

    pub async fn reset_search(&self) {
        self.store.lock().await.search_term.clear();
    }

    pub async fn rows(&self) -> Vec<PollRecord> {
        let store = self.store.lock().await;
        matching(&store.polls, &store.search_term)
    }

    // Ok(false) when the poll is already selected.
    pub async fn select(&self, post_id: &str) -> Result<bool, DashboardError> {
        let poll = self
            .store
            .lock()
            .await
            .polls
            .iter()
            .find(|p| p.post_id == post_id)
            .cloned()
            .ok_or_else(|| DashboardError::UnknownPoll(post_id.to_string()))?;
        Ok(self.select_poll(poll).await)
    }

    pub async fn select_poll(&self, poll: PollRecord) -> bool {
        self.scheduler.select(poll).await
    }

    pub async fn selected(&self) -> Option<PollRecord> {
        self.scheduler.state().lock().await.selected().cloned()
    }

    pub async fn resize(&self, width: f64) -> Result<bool, DashboardError> {
        let drawn = self.canvas.resize(width).await;
        if ChartGeometry::for_width(width).is_none() {
            debug!("Skipping chart render for width {}", width);
            return Err(DashboardError::GeometryPrecondition(width));
        }
        Ok(drawn)
    }

    pub async fn is_chart_animating(&self) -> bool {
        self.canvas.is_animating().await
    }

    pub async fn view(&self) -> DashboardView {
        let (fetch_state, rows, search_term) = {
            let store = self.store.lock().await;
            (store.fetch_state, matching(&store.polls, &store.search_term), store.search_term.clone())
        };
        let selection = self.scheduler.state().lock().await.clone();
        let report = self.reports.snapshot().await;
        let caller = self.caller.lock().await.clone();

        compose(ViewInputs {
            fetch_state,
            rows,
            search_term: &search_term,
            selection: &selection,
            report: &report,
            caller: &caller,
            notice: self.notices.latest(),
        })
    }

    pub async fn request_report(&self) -> Result<String, DashboardError> {
        let Some(poll) = self.selected().await else {
            self.notices.notify(Notice::error("Please select a question before generating a report"));
            return Err(DashboardError::NoSelection);
        };
        self.reports
            .generate(&poll)
            .await
            .map_err(|e| DashboardError::ReportGenerationFailure(e.to_string()))
    }

    pub async fn close_report(&self) {
        self.reports.close().await;
    }

    // "View Report" / "Show Surveys"
    pub async fn toggle_report_view(&self) -> Result<ReportView, DashboardError> {
        if self.reports.snapshot().await.view == ReportView::Report {
            self.reports.close().await;
            return Ok(ReportView::SurveyList);
        }
        if self.selected().await.is_none() {
            self.notices.notify(Notice::error("Please select a question before viewing the report"));
            return Err(DashboardError::NoSelection);
        }
        self.request_report().await?;
        Ok(self.reports.snapshot().await.view)
    }

    pub async fn attach_chat<F>(&self, lookup: F) -> Option<Arc<dyn ChatWidget>>
    where
        F: Fn() -> Option<Arc<dyn ChatWidget>>,
    {
        self.chat.attach_when_available(lookup).await
    }

    pub async fn sign_out(&self) -> Result<(), DashboardError> {
        self.shutdown().await;
        self.canvas.clear().await;
        self.scheduler.reset().await;
        self.reports.clear().await;
        *self.store.lock().await = PollStore::default();
        *self.caller.lock().await = CallerContext::default();
        self.chat.detach();

        self.identity.sign_out().await?;
        self.notices.notify(Notice::info("Signed out"));
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.scheduler.cancel().await;
        self.canvas.stop().await;
        self.reports.abort_preloads().await;
    }
}

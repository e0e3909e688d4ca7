pub mod prompt;

use crate::clients::{ReportError, ReportGenerator};
use crate::models::PollRecord;
use crate::notify::{Notice, Notifier};
use log::{debug, error, info};
use prompt::build_prompt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportView {
    #[default]
    SurveyList,
    Report,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preloaded {
    pub post_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReportState {
    pub post_id: Option<String>,
    pub content: Option<String>,
    pub preloaded: Option<Preloaded>,
    pub is_generating: bool,
    pub view: ReportView,
}

impl ReportState {
    fn is_current(&self, post_id: &str) -> bool {
        self.post_id.as_deref() == Some(post_id)
    }

    // Single use.
    fn take_preloaded(&mut self, post_id: &str) -> Option<String> {
        match self.preloaded.take() {
            Some(p) if p.post_id == post_id => Some(p.text),
            other => {
                self.preloaded = other;
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct ReportOrchestrator {
    generator: Arc<dyn ReportGenerator>,
    notifier: Arc<dyn Notifier>,
    state: Arc<Mutex<ReportState>>,
    preloads: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ReportOrchestrator {
    pub fn new(generator: Arc<dyn ReportGenerator>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            generator,
            notifier,
            state: Arc::new(Mutex::new(ReportState::default())),
            preloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn snapshot(&self) -> ReportState {
        self.state.lock().await.clone()
    }

    // New poll committed: drop the old report and show the survey list.
    pub async fn reset_for(&self, post_id: &str) {
        let mut state = self.state.lock().await;
        state.post_id = Some(post_id.to_string());
        state.content = None;
        state.preloaded = None;
        state.is_generating = false;
        state.view = ReportView::SurveyList;
    }

    // Kept only if `poll` is still current when it arrives. Failures stay in the log.
    pub async fn preload(&self, poll: &PollRecord) {
        let generator = Arc::clone(&self.generator);
        let state = Arc::clone(&self.state);
        let poll = poll.clone();

        let handle = tokio::spawn(async move {
            info!("Preloading AI report for poll: {}", poll.caption);
            match generator.generate_report(&build_prompt(&poll)).await {
                Ok(text) => {
                    let mut state = state.lock().await;
                    if state.is_current(&poll.post_id) {
                        info!("Preloaded AI report generated successfully");
                        state.preloaded = Some(Preloaded { post_id: poll.post_id.clone(), text });
                    } else {
                        debug!("Discarding preloaded report for poll {}", poll.post_id);
                    }
                }
                Err(e) => error!("Error preloading AI report: {}", e),
            }
        });

        let mut preloads = self.preloads.lock().await;
        preloads.retain(|h| !h.is_finished());
        preloads.push(handle);
    }

    pub async fn generate(&self, poll: &PollRecord) -> Result<String, ReportError> {
        {
            let mut state = self.state.lock().await;
            if state.post_id.is_none() {
                state.post_id = Some(poll.post_id.clone());
            }
            if let Some(text) = state.take_preloaded(&poll.post_id) {
                info!("Using preloaded report");
                state.content = Some(text.clone());
                state.view = ReportView::Report;
                state.is_generating = false;
                return Ok(text);
            }
            state.is_generating = true;
        }

        info!("Generating AI report for poll: {}", poll.caption);
        let result = self.generator.generate_report(&build_prompt(poll)).await;

        let mut state = self.state.lock().await;
        // A newer selection owns the flag and the pane from here on.
        let current = state.is_current(&poll.post_id);
        if current {
            state.is_generating = false;
        }
        match result {
            Ok(text) => {
                if current {
                    state.content = Some(text.clone());
                    state.view = ReportView::Report;
                } else {
                    debug!("Discarding report for poll {}; selection changed", poll.post_id);
                }
                Ok(text)
            }
            Err(e) => {
                error!("Error generating AI report: {}", e);
                if current {
                    self.notifier.notify(Notice::error("Error generating report"));
                }
                Err(e)
            }
        }
    }

    pub async fn close(&self) {
        self.state.lock().await.view = ReportView::SurveyList;
    }

    pub async fn clear(&self) {
        self.abort_preloads().await;
        *self.state.lock().await = ReportState::default();
    }

    pub async fn abort_preloads(&self) {
        for handle in self.preloads.lock().await.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_poll;
    use crate::notify::{NoticeLevel, NoticeLog};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeGenerator {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl FakeGenerator {
        fn new(delay: Duration, fail: bool) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), delay, fail })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReportGenerator for FakeGenerator {
        async fn generate_report(&self, prompt: &str) -> Result<String, ReportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(ReportError::Status(500));
            }
            let data = prompt.strip_prefix(super::prompt::PROMPT_INTRO).unwrap_or(prompt);
            let caption = data.split(',').nth(5).unwrap_or_default();
            Ok(format!("Report on {}", caption))
        }
    }

    fn orchestrator(generator: Arc<FakeGenerator>) -> (ReportOrchestrator, Arc<NoticeLog>) {
        let notices = Arc::new(NoticeLog::default());
        (ReportOrchestrator::new(generator, notices.clone()), notices)
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_without_preload_makes_one_call() {
        let generator = FakeGenerator::new(Duration::from_millis(200), false);
        let (reports, _) = orchestrator(generator.clone());
        let poll = sample_poll("a", "acme");
        reports.reset_for(&poll.post_id).await;

        let text = reports.generate(&poll).await.unwrap();
        assert_eq!(text, "Report on Question a");
        assert_eq!(generator.calls(), 1);

        let state = reports.snapshot().await;
        assert_eq!(state.content.as_deref(), Some("Report on Question a"));
        assert_eq!(state.view, ReportView::Report);
        assert!(!state.is_generating);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolved_preload_is_used_once() {
        let generator = FakeGenerator::new(Duration::from_millis(200), false);
        let (reports, _) = orchestrator(generator.clone());
        let poll = sample_poll("a", "acme");
        reports.reset_for(&poll.post_id).await;
        reports.preload(&poll).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(generator.calls(), 1);

        reports.generate(&poll).await.unwrap();
        assert_eq!(generator.calls(), 1);
        assert!(reports.snapshot().await.preloaded.is_none());

        reports.generate(&poll).await.unwrap();
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_preload_is_discarded() {
        let generator = FakeGenerator::new(Duration::from_millis(500), false);
        let (reports, _) = orchestrator(generator.clone());
        let a = sample_poll("a", "acme");
        reports.reset_for(&a.post_id).await;
        reports.preload(&a).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        reports.reset_for("b").await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let state = reports.snapshot().await;
        assert!(state.preloaded.is_none());
        assert!(state.content.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_notifies_and_resets_loading() {
        let generator = FakeGenerator::new(Duration::from_millis(50), true);
        let (reports, notices) = orchestrator(generator.clone());
        let poll = sample_poll("a", "acme");
        reports.reset_for(&poll.post_id).await;

        assert!(reports.generate(&poll).await.is_err());
        let state = reports.snapshot().await;
        assert!(!state.is_generating);
        assert_eq!(state.view, ReportView::SurveyList);

        let notice = notices.latest().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Error generating report");
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_generating_while_request_in_flight() {
        let generator = FakeGenerator::new(Duration::from_millis(500), false);
        let (reports, _) = orchestrator(generator.clone());
        let poll = sample_poll("a", "acme");

        let task = {
            let reports = reports.clone();
            let poll = poll.clone();
            tokio::spawn(async move { reports.generate(&poll).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(reports.snapshot().await.is_generating);

        task.await.unwrap().unwrap();
        assert!(!reports.snapshot().await.is_generating);
    }

    #[tokio::test]
    async fn test_close_keeps_content() {
        let generator = FakeGenerator::new(Duration::ZERO, false);
        let (reports, _) = orchestrator(generator);
        let poll = sample_poll("a", "acme");
        reports.generate(&poll).await.unwrap();

        reports.close().await;
        let state = reports.snapshot().await;
        assert_eq!(state.view, ReportView::SurveyList);
        assert!(state.content.is_some());
    }

    #[tokio::test]
    async fn test_new_selection_returns_to_survey_list() {
        let generator = FakeGenerator::new(Duration::ZERO, false);
        let (reports, _) = orchestrator(generator);
        let a = sample_poll("a", "acme");
        reports.reset_for(&a.post_id).await;
        reports.generate(&a).await.unwrap();
        assert_eq!(reports.snapshot().await.view, ReportView::Report);

        reports.reset_for("b").await;
        let state = reports.snapshot().await;
        assert_eq!(state.view, ReportView::SurveyList);
        assert!(state.content.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_report_for_previous_poll_is_dropped() {
        let generator = FakeGenerator::new(Duration::from_millis(500), false);
        let (reports, notices) = orchestrator(generator.clone());
        let a = sample_poll("a", "acme");
        let b = sample_poll("b", "acme");
        reports.reset_for(&a.post_id).await;

        let stale = {
            let reports = reports.clone();
            tokio::spawn(async move { reports.generate(&a).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        reports.reset_for(&b.post_id).await;

        // B's own request is still running when A's answer arrives.
        let current = {
            let reports = reports.clone();
            tokio::spawn(async move { reports.generate(&b).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(reports.snapshot().await.is_generating);

        assert_eq!(stale.await.unwrap().unwrap(), "Report on Question a");
        let state = reports.snapshot().await;
        assert!(state.content.is_none());
        assert_eq!(state.view, ReportView::SurveyList);
        assert!(state.is_generating);

        current.await.unwrap().unwrap();
        let state = reports.snapshot().await;
        assert_eq!(state.content.as_deref(), Some("Report on Question b"));
        assert_eq!(state.view, ReportView::Report);
        assert!(!state.is_generating);
        assert!(notices.all().is_empty());
    }
}

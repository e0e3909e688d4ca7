use crate::models::{percent_label, CallerContext, FetchState, PollRecord};
use crate::notify::Notice;
use crate::report::{ReportState, ReportView};
use crate::selection::{RevealStage, SelectionState};
use crate::stats::{preference_annotation, significance_label};

pub const PLACEHOLDER_TITLE: &str = "Click a row to see detailed results";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSize {
    ThreeXl,
    TwoXl,
    Xl,
    Lg,
}

impl TitleSize {
    // Words are split on single spaces.
    pub fn for_text(text: &str) -> Self {
        match text.split(' ').count() {
            0..=10 => TitleSize::ThreeXl,
            11..=15 => TitleSize::TwoXl,
            16..=20 => TitleSize::Xl,
            _ => TitleSize::Lg,
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            TitleSize::ThreeXl => "text-3xl",
            TitleSize::TwoXl => "text-2xl",
            TitleSize::Xl => "text-xl",
            TitleSize::Lg => "text-lg",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub fetch_state: FetchState,
    pub rows: Vec<PollRecord>,
    pub search_term: String,
    pub selected_post_id: Option<String>,
    pub title: String,
    pub title_size: TitleSize,
    pub stage: RevealStage,
    pub is_transitioning: bool,
    pub show_chart: bool,
    pub show_title: bool,
    pub show_percentages: bool,
    pub show_annotation: bool,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub percent1: Option<String>,
    pub percent2: Option<String>,
    pub annotation: Option<String>,
    pub significance: Option<String>,
    pub is_generating_report: bool,
    pub report_view: ReportView,
    pub report_text: Option<String>,
    pub questions_left: String,
    pub notice: Option<Notice>,
}

pub(crate) struct ViewInputs<'a> {
    pub fetch_state: FetchState,
    pub rows: Vec<PollRecord>,
    pub search_term: &'a str,
    pub selection: &'a SelectionState,
    pub report: &'a ReportState,
    pub caller: &'a CallerContext,
    pub notice: Option<Notice>,
}

pub(crate) fn compose(inputs: ViewInputs<'_>) -> DashboardView {
    let selection = inputs.selection;
    let stage = selection.reveal_stage();
    let selected = selection.selected();

    let title = selected.map_or_else(|| PLACEHOLDER_TITLE.to_string(), |p| p.caption.clone());
    let title_size = TitleSize::for_text(&title);

    DashboardView {
        fetch_state: inputs.fetch_state,
        rows: inputs.rows,
        search_term: inputs.search_term.to_string(),
        selected_post_id: selected.map(|p| p.post_id.clone()),
        title,
        title_size,
        stage,
        is_transitioning: selection.is_transitioning(),
        show_chart: stage >= RevealStage::ChartReady,
        show_title: stage >= RevealStage::TitleShown,
        show_percentages: stage >= RevealStage::PercentagesShown,
        show_annotation: stage >= RevealStage::AnnotationShown,
        option1: selected.map(|p| p.option1.clone()),
        option2: selected.map(|p| p.option2.clone()),
        percent1: selected.map(|p| percent_label(p.percent1)),
        percent2: selected.map(|p| percent_label(p.percent2)),
        annotation: selected.map(preference_annotation),
        significance: selected.and_then(significance_label),
        is_generating_report: inputs.report.is_generating,
        report_view: inputs.report.view,
        report_text: inputs.report.content.clone(),
        questions_left: match inputs.caller.remaining_questions {
            Some(n) => format!("Questions Left: {}", n),
            None => "Loading...".to_string(),
        },
        notice: inputs.notice,
    }
}

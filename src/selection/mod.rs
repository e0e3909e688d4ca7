use crate::models::PollRecord;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub fade_out: Duration,
    pub layout: Duration,
    pub title: Duration,
    pub percentages: Duration,
    pub annotation: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            fade_out: Duration::from_millis(300),
            layout: Duration::from_millis(50),
            title: Duration::from_millis(100),
            percentages: Duration::from_millis(150),
            annotation: Duration::from_millis(150),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    FadingOut,
    Swapping,
    ChartBuilding,
    TitleShown,
    PercentagesShown,
    Settled,
}

impl Phase {
    pub fn next(self, timings: &Timings) -> Option<(Duration, Phase)> {
        match self {
            Phase::Idle | Phase::Settled => None,
            Phase::FadingOut => Some((timings.fade_out, Phase::Swapping)),
            Phase::Swapping => Some((timings.layout, Phase::ChartBuilding)),
            Phase::ChartBuilding => Some((timings.title, Phase::TitleShown)),
            Phase::TitleShown => Some((timings.percentages, Phase::PercentagesShown)),
            Phase::PercentagesShown => Some((timings.annotation, Phase::Settled)),
        }
    }

    pub fn reveal_stage(self) -> RevealStage {
        match self {
            Phase::Idle | Phase::FadingOut | Phase::Swapping => RevealStage::Hidden,
            Phase::ChartBuilding => RevealStage::ChartReady,
            Phase::TitleShown => RevealStage::TitleShown,
            Phase::PercentagesShown => RevealStage::PercentagesShown,
            Phase::Settled => RevealStage::AnnotationShown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RevealStage {
    Hidden,
    ChartReady,
    TitleShown,
    PercentagesShown,
    AnnotationShown,
}

// Delayed steps carry the token they were scheduled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceToken(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub phase: Phase,
    pub poll: PollRecord,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: Option<PollRecord>,
    pending: Option<PollRecord>,
    phase: Phase,
    token: SequenceToken,
}

impl SelectionState {
    pub fn selected(&self) -> Option<&PollRecord> {
        self.selected.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reveal_stage(&self) -> RevealStage {
        self.phase().reveal_stage()
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase(), Phase::FadingOut | Phase::Swapping)
    }

    pub fn token(&self) -> SequenceToken {
        self.token
    }

    // None when `poll` is already selected or about to be committed.
    pub fn begin(&mut self, poll: PollRecord) -> Option<SequenceToken> {
        let target = self.pending.as_ref().or(self.selected.as_ref());
        if target.is_some_and(|current| current.post_id == poll.post_id) {
            return None;
        }

        self.token = SequenceToken(self.token.0 + 1);
        self.pending = Some(poll);
        self.phase = Phase::FadingOut;
        Some(self.token)
    }

    pub fn advance(&mut self, token: SequenceToken, timings: &Timings) -> Option<Step> {
        if token != self.token {
            return None;
        }
        let (_, next) = self.phase().next(timings)?;
        if next == Phase::Swapping {
            self.selected = Some(self.pending.take()?);
        }
        self.phase = next;
        let poll = self.selected.clone()?;
        Some(Step { phase: next, poll })
    }

    pub fn cancel(&mut self) {
        self.token = SequenceToken(self.token.0 + 1);
        if self.pending.take().is_some() {
            self.phase = if self.selected.is_some() { Phase::Settled } else { Phase::Idle };
        }
    }

    pub fn reset(&mut self) {
        self.cancel();
        self.selected = None;
        self.phase = Phase::Idle;
    }
}

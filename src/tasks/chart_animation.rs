use crate::chart::surface::Surface;
use crate::chart::{ChartEngine, ChartLayout};
use crate::models::PollRecord;
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub type SharedSurface = Arc<Mutex<Box<dyn Surface>>>;

pub struct ChartCanvas {
    engine: ChartEngine,
    surface: SharedSurface,
    shown: Mutex<Option<PollRecord>>,
    animation: Mutex<Option<JoinHandle<()>>>,
}

impl ChartCanvas {
    pub fn new(engine: ChartEngine, surface: SharedSurface) -> Self {
        Self {
            engine,
            surface,
            shown: Mutex::new(None),
            animation: Mutex::new(None),
        }
    }

    pub fn surface(&self) -> SharedSurface {
        Arc::clone(&self.surface)
    }

    // false while the container has no width; the next resize draws the poll.
    pub async fn show(&self, poll: &PollRecord) -> bool {
        *self.shown.lock().await = Some(poll.clone());
        self.stop().await;

        let layout = {
            let mut surface = self.surface.lock().await;
            self.engine.render(poll, &mut **surface)
        };
        let Some(layout) = layout else {
            return false;
        };

        let engine = self.engine.clone();
        let surface = Arc::clone(&self.surface);
        *self.animation.lock().await = Some(tokio::spawn(animate(engine, layout, surface)));
        true
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.animation.lock().await.take() {
            handle.abort();
        }
    }

    pub async fn resize(&self, width: f64) -> bool {
        self.surface.lock().await.set_width(width);
        let shown = self.shown.lock().await.clone();
        match shown {
            Some(poll) => self.show(&poll).await,
            None => false,
        }
    }

    pub async fn clear(&self) {
        self.stop().await;
        *self.shown.lock().await = None;
        self.surface.lock().await.clear();
    }

    pub async fn is_animating(&self) -> bool {
        self.animation.lock().await.as_ref().is_some_and(|h| !h.is_finished())
    }
}

async fn animate(engine: ChartEngine, layout: ChartLayout, surface: SharedSurface) {
    let started = Instant::now();
    let mut ticker = interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let elapsed = started.elapsed().min(engine.timing.total());
        {
            let mut surface = surface.lock().await;
            engine.draw_frame(&layout, &mut **surface, elapsed);
        }
        if engine.is_complete(elapsed) {
            break;
        }
    }
    debug!("Chart animation for poll {} complete", layout.post_id);
}

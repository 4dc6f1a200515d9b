use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::data::images::ImageUrls;
use crate::data::types::{Base, BattingLine, GameDetail, Person};

/// Runner details shown when an occupied base is selected.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerCard {
    pub base: Base,
    pub runner: Person,
    pub jersey_number: Option<String>,
    pub batting: Option<BattingLine>,
    pub headshot_url: String,
}

/// Build the card for the runner on `base`. `None` for an empty base.
pub fn runner_card(detail: &GameDetail, base: Base, images: &ImageUrls) -> Option<RunnerCard> {
    let runner = detail.linescore.bases.runner(base)?.clone();
    let entry = detail.boxscore.player(runner.id);

    Some(RunnerCard {
        base,
        jersey_number: entry.and_then(|p| p.jersey_number.clone()),
        batting: entry.and_then(|p| p.batting.clone()),
        headshot_url: images.headshot(Some(runner.id)),
        runner,
    })
}

/// At most one open card with one pending dismiss timer.
///
/// Each open bumps a generation number. The timer reports the generation it was
/// started for, so an expiry from a replaced card is ignored even if it raced the abort.
pub struct Tooltip {
    dismiss_after: Duration,
    card: Option<RunnerCard>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Tooltip {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            dismiss_after,
            card: None,
            generation: 0,
            timer: None,
        }
    }

    /// Show `card` and schedule its dismissal. `on_expire` builds the event sent back
    /// when the delay runs out.
    pub fn open<E>(&mut self, card: RunnerCard, tx: mpsc::Sender<E>, on_expire: fn(u64) -> E) -> u64
    where
        E: Send + 'static,
    {
        self.cancel_timer();
        self.generation += 1;
        self.card = Some(card);

        let generation = self.generation;
        let delay = self.dismiss_after;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(on_expire(generation)).await;
        }));

        generation
    }

    /// Handle a timer firing. Returns true if it closed the current card.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.card.is_none() {
            return false;
        }
        self.card = None;
        self.timer = None;
        true
    }

    pub fn close(&mut self) {
        self.cancel_timer();
        self.card = None;
    }

    pub fn card(&self) -> Option<&RunnerCard> {
        self.card.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.card.is_some()
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for Tooltip {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

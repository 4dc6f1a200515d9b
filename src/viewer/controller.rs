use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Datelike, FixedOffset, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::cache::FeedCache;
use crate::data::images::ImageUrls;
use crate::data::lookahead::ScheduleProbe;
use crate::data::stats_api::{standing_for, StatsSource};
use crate::data::types::{GameDetail, GamePk, ScheduleSnapshot, Team, TeamId, TeamStanding};
use crate::display::{self, summary, Screen};
use crate::monitoring::metrics::PollMetrics;
use crate::selection::policy::{decide, retain_cursor, PolicyConfig};
use crate::selection::types::{FavoriteSet, SelectionState};
use crate::viewer::access::AccessLevel;
use crate::viewer::commands::{Command, HELP};
use crate::viewer::poller::{spawn_poller, PollHandle, PollSpec};
use crate::viewer::preferences::PreferenceStore;
use crate::viewer::tooltip::{runner_card, Tooltip};

const INBOX_CAPACITY: usize = 64;

/// Everything that can change what the viewer shows.
#[derive(Debug)]
pub enum ViewerEvent {
    Schedule(ScheduleSnapshot),
    Teams(Vec<Team>),
    Detail(GameDetail),
    Standings(TeamId, Vec<TeamStanding>),
    TooltipExpired(u64),
    Command(Command),
}

/// Result of handling one event
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub redraw: bool,
    pub message: Option<String>,
    pub quit: bool,
}

impl Outcome {
    fn redraw() -> Self {
        Self {
            redraw: true,
            ..Self::default()
        }
    }

    fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerSettings {
    pub schedule_interval: Duration,
    pub detail_interval: Duration,
    pub tooltip_dismiss: Duration,
    pub lookahead_cache_ttl: Duration,
    pub detail_cache_ttl: Duration,
    pub policy: PolicyConfig,
    pub offset: FixedOffset,
    pub images: ImageUrls,
}

impl ViewerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            schedule_interval: config.schedule_interval(),
            detail_interval: config.detail_interval(),
            tooltip_dismiss: config.tooltip_dismiss(),
            lookahead_cache_ttl: Duration::from_secs(config.polling.lookahead_cache_ttl_secs),
            detail_cache_ttl: Duration::from_secs(config.polling.detail_cache_ttl_secs),
            policy: config.policy(),
            offset: config.utc_offset(),
            images: ImageUrls::new(&config.api.logo_base_url, &config.api.headshot_base_url),
        }
    }
}

/// Owns all viewer state. Poll loops and timers only send events into its inbox, so
/// every state change happens in [`Viewer::handle`].
pub struct Viewer<S: StatsSource> {
    source: Arc<S>,
    probe: Arc<ScheduleProbe<S>>,
    cache: Arc<FeedCache>,
    store: PreferenceStore,
    metrics: Arc<PollMetrics>,
    settings: ViewerSettings,
    access: AccessLevel,
    clock: fn() -> DateTime<Utc>,

    tx: mpsc::Sender<ViewerEvent>,
    rx: mpsc::Receiver<ViewerEvent>,

    favorites: FavoriteSet,
    selection: SelectionState,
    schedule: Option<ScheduleSnapshot>,
    teams: Vec<Team>,
    detail: Option<GameDetail>,
    tooltip: Tooltip,

    schedule_poll: Option<PollHandle>,
    teams_poll: Option<PollHandle>,
    detail_poll: Option<(GamePk, PollHandle)>,
}

impl<S: StatsSource> Viewer<S> {
    pub fn new(
        source: Arc<S>,
        store: PreferenceStore,
        metrics: Arc<PollMetrics>,
        settings: ViewerSettings,
        access: AccessLevel,
    ) -> Result<Self> {
        let favorites = store.load_favorites()?;
        let cache = Arc::new(FeedCache::new(settings.lookahead_cache_ttl, settings.detail_cache_ttl));
        let probe = Arc::new(ScheduleProbe::new(
            source.clone(),
            cache.clone(),
            settings.policy.lookahead_days,
        ));
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);

        info!(favorites = favorites.len(), ?access, "Viewer ready");

        Ok(Self {
            source,
            probe,
            cache,
            store,
            metrics,
            tooltip: Tooltip::new(settings.tooltip_dismiss),
            settings,
            access,
            clock: Utc::now,
            tx,
            rx,
            favorites,
            selection: SelectionState::Loading,
            schedule: None,
            teams: Vec::new(),
            detail: None,
            schedule_poll: None,
            teams_poll: None,
            detail_poll: None,
        })
    }

    /// Inbox for events produced outside the viewer, such as typed commands.
    pub fn sender(&self) -> mpsc::Sender<ViewerEvent> {
        self.tx.clone()
    }

    /// Game whose detail loop is running, if any.
    pub fn detail_target(&self) -> Option<GamePk> {
        self.detail_poll.as_ref().map(|(pk, _)| *pk)
    }

    /// Start the schedule and team catalog loops.
    pub fn start(&mut self) {
        let probe = self.probe.clone();
        let clock = self.clock;
        let offset = self.settings.offset;
        self.schedule_poll = Some(spawn_poller(
            PollSpec::every("schedule", self.settings.schedule_interval),
            self.metrics.clone(),
            self.tx.clone(),
            move || {
                let probe = probe.clone();
                async move {
                    let today = clock().with_timezone(&offset).date_naive();
                    probe.fetch(today).await.map(ViewerEvent::Schedule)
                }
            },
        ));

        let source = self.source.clone();
        self.teams_poll = Some(spawn_poller(
            PollSpec::until_success("teams", self.settings.schedule_interval),
            self.metrics.clone(),
            self.tx.clone(),
            move || {
                let source = source.clone();
                async move { source.teams().await.map(ViewerEvent::Teams) }
            },
        ));
    }

    /// Stop every loop and timer. Results still in flight are discarded.
    pub fn stop(&mut self) {
        for handle in [self.schedule_poll.take(), self.teams_poll.take()].into_iter().flatten() {
            handle.stop();
        }
        if let Some((_, handle)) = self.detail_poll.take() {
            handle.stop();
        }
        self.tooltip.close();
    }

    /// Wait for the next event and handle it.
    pub async fn step(&mut self) -> Option<Outcome> {
        let event = self.rx.recv().await?;
        Some(self.handle(event))
    }

    /// Start polling and process events until `quit`. `draw` receives every frame and message.
    pub async fn run<F: FnMut(&str)>(&mut self, mut draw: F) -> Result<()> {
        self.start();
        draw(&self.render());

        while let Some(outcome) = self.step().await {
            if let Some(message) = &outcome.message {
                draw(message);
            }
            if outcome.redraw {
                draw(&self.render());
            }
            if outcome.quit {
                break;
            }
        }

        self.stop();
        Ok(())
    }

    pub fn handle(&mut self, event: ViewerEvent) -> Outcome {
        match event {
            ViewerEvent::Schedule(snapshot) => {
                debug!(date = %snapshot.date, games = snapshot.games.len(), "Schedule updated");
                self.schedule = Some(snapshot);
                self.reselect();
                Outcome::redraw()
            }
            ViewerEvent::Teams(teams) => {
                info!(teams = teams.len(), "Team catalog loaded");
                self.teams = teams;
                Outcome::redraw()
            }
            ViewerEvent::Detail(detail) => {
                if self.detail_target() != Some(detail.game_pk) {
                    debug!(game_pk = detail.game_pk, "Ignoring detail for game no longer shown");
                    return Outcome::default();
                }
                self.cache.insert_detail(detail.clone());
                self.detail = Some(detail);
                Outcome::redraw()
            }
            ViewerEvent::Standings(team_id, standings) => {
                let name = self.team_name(team_id);
                let standing = standing_for(&standings, team_id);
                Outcome::message(summary::standings_card(team_id, name, &standing))
            }
            ViewerEvent::TooltipExpired(generation) => {
                if self.tooltip.expire(generation) {
                    Outcome::redraw()
                } else {
                    Outcome::default()
                }
            }
            ViewerEvent::Command(command) => self.handle_command(command),
        }
    }

    fn handle_command(&mut self, command: Command) -> Outcome {
        match command {
            Command::Next => self.navigate(1),
            Command::Prev => self.navigate(-1),
            Command::Watch(game_pk) => self.watch(game_pk),
            Command::ToggleFavorite(team_id) => self.toggle_favorite(team_id),
            Command::SelectBase(base) => {
                let card = self
                    .current_detail()
                    .and_then(|detail| runner_card(detail, base, &self.settings.images));
                match card {
                    Some(card) => {
                        self.tooltip.open(card, self.tx.clone(), ViewerEvent::TooltipExpired);
                        Outcome::redraw()
                    }
                    // Empty base or nothing loaded
                    None => Outcome::default(),
                }
            }
            Command::CloseTooltip => {
                self.tooltip.close();
                Outcome::redraw()
            }
            Command::Standings(team_id) => {
                self.request_standings(team_id);
                Outcome::default()
            }
            Command::Teams => Outcome::message(summary::teams_list(&self.teams, &self.favorites)),
            Command::Stats => Outcome::message(self.stats()),
            Command::Help => Outcome::message(HELP),
            Command::Quit => Outcome {
                quit: true,
                ..Outcome::default()
            },
        }
    }

    pub fn render(&self) -> String {
        display::render(&Screen {
            selection: &self.selection,
            schedule: self.schedule.as_ref(),
            detail: self.current_detail(),
            tooltip: self.tooltip.card(),
            favorites: &self.favorites,
            teams: &self.teams,
            access: self.access,
            offset: self.settings.offset,
        })
    }

    fn reselect(&mut self) {
        let Some(snapshot) = &self.schedule else {
            return;
        };
        let next = decide(
            snapshot,
            &self.favorites,
            &self.selection,
            (self.clock)(),
            &self.settings.policy,
        );
        let next = retain_cursor(&self.selection, next);
        self.apply_selection(next);
    }

    fn apply_selection(&mut self, next: SelectionState) {
        let before = self.selection.current_game_pk();
        if self.selection.kind() != next.kind() {
            info!(from = self.selection.kind(), to = next.kind(), "Selection changed");
        }
        self.selection = next;
        self.on_current_game_changed(before);
    }

    fn on_current_game_changed(&mut self, before: Option<GamePk>) {
        let after = self.selection.current_game_pk();
        if before == after {
            return;
        }
        self.tooltip.close();
        self.switch_detail(after);
    }

    /// Replace the detail loop. The old loop is stopped before the new one starts.
    fn switch_detail(&mut self, target: Option<GamePk>) {
        if let Some((game_pk, handle)) = self.detail_poll.take() {
            debug!(game_pk, "Stopping detail loop");
            handle.stop();
        }
        self.detail = None;

        let Some(game_pk) = target else {
            return;
        };
        if !self.access.allows_detail() {
            return;
        }

        self.detail = self.cache.detail(game_pk);
        info!(game_pk, "Following game");

        let source = self.source.clone();
        let handle = spawn_poller(
            PollSpec::every("detail", self.settings.detail_interval),
            self.metrics.clone(),
            self.tx.clone(),
            move || {
                let source = source.clone();
                async move { source.game_detail(game_pk).await.map(ViewerEvent::Detail) }
            },
        );
        self.detail_poll = Some((game_pk, handle));
    }

    fn current_detail(&self) -> Option<&GameDetail> {
        let shown = self.selection.current_game_pk()?;
        self.detail.as_ref().filter(|d| d.game_pk == shown)
    }

    fn navigate(&mut self, step: isize) -> Outcome {
        let before = self.selection.current_game_pk();
        self.selection.navigate(step);
        self.on_current_game_changed(before);
        Outcome::redraw()
    }

    fn watch(&mut self, game_pk: GamePk) -> Outcome {
        // Already in the live list: just move there
        if let SelectionState::ShowingLive { games, current } = &self.selection {
            if let Some(pos) = games.iter().position(|g| g.game_pk == game_pk) {
                let before = games.get(*current).map(|g| g.game_pk);
                if let SelectionState::ShowingLive { current, .. } = &mut self.selection {
                    *current = pos;
                }
                self.on_current_game_changed(before);
                return Outcome::redraw();
            }
        }

        let game = self
            .schedule
            .as_ref()
            .and_then(|s| s.game(game_pk))
            .filter(|g| g.is_live())
            .cloned();
        match game {
            Some(game) => {
                self.apply_selection(SelectionState::live(vec![game]));
                Outcome::redraw()
            }
            None => Outcome::message(format!("Game {} is not live", game_pk)),
        }
    }

    fn toggle_favorite(&mut self, team_id: TeamId) -> Outcome {
        if !self.favorites.contains(team_id) && self.favorites.is_full() {
            return Outcome::message("Already following 3 teams, remove one first");
        }
        let updated = self.favorites.toggle(team_id);

        let added = updated.contains(team_id);
        if let Err(e) = self.store.save_favorites(&updated) {
            warn!(team_id, error = %e, "Failed to save favorites");
        }
        self.favorites = updated;
        info!(team_id, added, favorites = ?self.favorites.ids(), "Favorites changed");
        self.reselect();

        let name = self
            .team_name(team_id)
            .map(str::to_string)
            .unwrap_or_else(|| team_id.to_string());
        Outcome {
            redraw: true,
            message: Some(if added {
                format!("Following {}", name)
            } else {
                format!("Stopped following {}", name)
            }),
            quit: false,
        }
    }

    fn request_standings(&self, team_id: TeamId) {
        let source = self.source.clone();
        let tx = self.tx.clone();
        let season = (self.clock)().year();

        tokio::spawn(async move {
            match source.standings(season).await {
                Ok(standings) => {
                    let _ = tx.send(ViewerEvent::Standings(team_id, standings)).await;
                }
                Err(e) => warn!(team_id, season, error = %e, "Standings fetch failed"),
            }
        });
    }

    fn stats(&self) -> String {
        let running: Vec<&str> = [self.schedule_poll.as_ref(), self.teams_poll.as_ref()]
            .into_iter()
            .chain([self.detail_poll.as_ref().map(|(_, handle)| handle)])
            .flatten()
            .filter(|handle| handle.is_alive())
            .map(|handle| handle.name())
            .collect();
        let running = if running.is_empty() { "none".to_string() } else { running.join(", ") };

        format!(
            "{}\nRunning loops: {}\nCached feeds: {}",
            self.metrics.summary(),
            running,
            self.cache.len()
        )
    }

    fn team_name(&self, team_id: TeamId) -> Option<&str> {
        self.teams
            .iter()
            .find(|t| t.id == team_id)
            .map(|t| t.name.as_str())
    }
}

#[cfg(test)]
impl<S: StatsSource> Viewer<S> {
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn favorites(&self) -> &FavoriteSet {
        &self.favorites
    }

    pub fn detail(&self) -> Option<&GameDetail> {
        self.detail.as_ref()
    }

    pub fn is_tooltip_open(&self) -> bool {
        self.tooltip.is_open()
    }
}

impl<S: StatsSource> Drop for Viewer<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Game Session
//!
//! Owns everything a run needs: state machine, track, player, scheduler,
//! RNG, scoreboard, event listeners and the collaborator handles. The host
//! drives it by calling [`GameSession::update`] once per frame.
//!
//! ## Frame order
//!
//! 1. Advance the scheduler and run due tasks (recycle, ramps, timers, birds)
//! 2. Player update: steer, move, edge checks
//! 3. Camera follow
//! 4. Trigger scan (walls, rocks, pickups)
//! 5. Pre-crash probe
//!
//! Player signals are reduced as soon as they are produced, so a death in
//! step 2 turns the state to `GameOver` before step 4 runs.

use std::collections::BTreeMap;

use tracing::{debug, info};
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::config::{ConfigError, GameConfig};
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::observer::{Observers, SubscriptionId};
use crate::core::rng::{derive_run_seed, DeterministicRng};
use crate::core::scheduler::{Scheduler, TaskId};
use crate::game::collision::{probe_ahead, scan_triggers};
use crate::game::environment::{CharacterId, EnvironmentCatalog, EnvironmentProfile};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::player::{PlayerController, PlayerSignal};
use crate::game::pool::DecorationHandle;
use crate::game::score::Scoreboard;
use crate::game::services::{Music, Services, Sound};
use crate::game::state::{GameState, StateChange, StateMachine};
use crate::game::track::{BirdStep, RecycleReport, Track};

/// Timed work owned by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    /// Poll the track for segments to recycle
    Recycle,
    /// Hide the landmark once it scrolled away
    LandmarkCheck,
    /// Ramp forward speed and steer acceleration
    SpeedRamp,
    /// Ramp the crash impulse
    CollisionForceRamp,
    /// Grace window countdown elapsed
    GraceExpiry,
    /// Stop the music and play the game-over sting
    StopMusic,
    /// Back to the menu loop
    MenuMusic,
    /// Rebuild and start a new run
    Restart,
    /// Move a bird one frame
    BirdFlight(DecorationHandle),
    /// Play a bird chirp
    BirdChirp,
}

/// One player session: a sequence of runs over the same configuration.
pub struct GameSession {
    config: GameConfig,
    environment: EnvironmentProfile,
    services: Services,

    machine: StateMachine,
    events: Observers<GameEvent>,
    scheduler: Scheduler<Task>,

    rng: DeterministicRng,
    run_seed: u64,
    track: Track,
    player: PlayerController,
    score: Scoreboard,

    game_count: u32,
    frame: u64,
    bird_tasks: BTreeMap<u32, TaskId>,
    restart_pending: bool,
}

impl GameSession {
    /// Validate the configuration, pick the character's environment and
    /// prepare the first run.
    pub fn new(
        config: GameConfig,
        catalog: &EnvironmentCatalog,
        character: Option<&CharacterId>,
        services: Services,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let environment = catalog.select(character).clone();
        environment.validate()?;

        let run_seed = derive_run_seed(config.seed, 0);
        let mut rng = DeterministicRng::new(run_seed);
        let track = Track::build(&config.track, &environment, &mut rng);
        let player = PlayerController::new(&config.motion);
        let score = Scoreboard::load(services.preferences.as_ref());

        let mut session = Self {
            config,
            environment,
            services,
            machine: StateMachine::new(),
            events: Observers::new(),
            scheduler: Scheduler::new(),
            rng,
            run_seed,
            track,
            player,
            score,
            game_count: 0,
            frame: 0,
            bird_tasks: BTreeMap::new(),
            restart_pending: false,
        };
        session.prepare();

        info!(
            "session ready: environment {}, seed {:#018x}",
            session.environment.name, run_seed
        );
        Ok(session)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current state.
    pub fn state(&self) -> GameState {
        self.machine.state()
    }

    /// Frames updated so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Seed of the current run.
    pub fn run_seed(&self) -> u64 {
        self.run_seed
    }

    /// Finished runs.
    pub fn game_count(&self) -> u32 {
        self.game_count
    }

    /// Scores of the current run.
    pub fn scoreboard(&self) -> &Scoreboard {
        &self.score
    }

    /// Generated world.
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Player motion state.
    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    /// Selected environment.
    pub fn environment(&self) -> &EnvironmentProfile {
        &self.environment
    }

    /// Session configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Collaborators.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Whether the grace window is armed.
    pub fn is_grace_armed(&self) -> bool {
        self.machine.is_grace_armed()
    }

    /// Pending timed tasks.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Listen to state changes.
    pub fn subscribe_state<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StateChange) + 'static,
    {
        self.machine.subscribe(listener)
    }

    /// Stop listening to state changes.
    pub fn unsubscribe_state(&mut self, id: SubscriptionId) -> bool {
        self.machine.unsubscribe(id)
    }

    /// Listen to gameplay events.
    pub fn subscribe_events<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Stop listening to gameplay events.
    pub fn unsubscribe_events(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit(&mut self, data: GameEventData) {
        let event = GameEvent::new(self.frame, data);
        #[cfg(feature = "debug-tracing")]
        trace!("event {:?}", event);
        self.events.emit(&event);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Enter `Prepare` on a freshly built run and start the background
    /// tasks.
    fn prepare(&mut self) {
        self.transition(GameState::Prepare);
        self.services.audio.play_music(Music::Menu);

        let recycle_interval = self.config.timing.recycle_interval;
        self.scheduler.repeat(0.0, recycle_interval, Task::Recycle);
        if self.track.landmark().is_some() {
            self.scheduler.every(0.0, Task::LandmarkCheck);
        }
        self.scheduler.every(0.0, Task::SpeedRamp);
        self.scheduler.every(0.0, Task::CollisionForceRamp);
    }

    /// Start the run, or restart it if the last one is over.
    pub fn start_game(&mut self) {
        if self.machine.state() == GameState::GameOver {
            self.restart(0.0);
            return;
        }

        self.transition(GameState::Playing);
        let music = match self.environment.music_override() {
            Some(track) => Music::Custom(track.to_string()),
            None => Music::InGame,
        };
        self.services.audio.play_music(music);
    }

    /// Suspend a run in progress.
    pub fn pause(&mut self) -> bool {
        self.machine.pause()
    }

    /// Continue a paused run.
    pub fn resume(&mut self) -> bool {
        self.machine.resume()
    }

    /// End the run.
    pub fn game_over(&mut self) {
        self.transition(GameState::GameOver);
        self.game_count += 1;

        let score = self.score.score();
        let new_high_score = self.score.has_new_high_score();
        self.services.analytics.report_score(score);
        if new_high_score {
            self.services.analytics.report_high_score();
        }

        let run_ended = GameEvent::run_ended(self.frame, score, self.score.high_score(), new_high_score);
        self.emit(run_ended.data);
        self.scheduler.after(self.config.timing.music_stop_delay, Task::StopMusic);

        info!(
            "run {} over: score {}, high score {}{}",
            self.game_count,
            score,
            self.score.high_score(),
            if new_high_score { " (new)" } else { "" }
        );
    }

    /// Rebuild the world and start a new run after `delay` seconds.
    pub fn restart(&mut self, delay: f32) {
        if self.restart_pending {
            return;
        }
        self.restart_pending = true;
        self.scheduler.after(delay, Task::Restart);
    }

    fn restart_now(&mut self) {
        self.scheduler.cancel_all();
        self.bird_tasks.clear();
        self.restart_pending = false;
        self.machine.disarm_grace();

        self.run_seed = derive_run_seed(self.config.seed, self.game_count);
        self.rng = DeterministicRng::new(self.run_seed);
        self.track = Track::build(&self.config.track, &self.environment, &mut self.rng);
        self.player = PlayerController::new(&self.config.motion);
        self.score = Scoreboard::load(self.services.preferences.as_ref());
        self.services.viewport.reset();

        info!("restarting: run {} seed {:#018x}", self.game_count + 1, self.run_seed);
        self.prepare();
        self.start_game();
    }

    /// `set_state` plus the reactions the session owns.
    fn transition(&mut self, new: GameState) {
        let old = self.machine.state();
        if !self.machine.set_state(new) {
            return;
        }

        if old == GameState::Prepare && new == GameState::Playing {
            self.player.start_run();
            info!("run started");
            self.emit(GameEventData::RunStarted { run_seed: self.run_seed });
        }
    }

    /// Heading toward an edge or about to crash.
    fn hazard(&mut self) {
        if self.machine.arm_grace() {
            debug!("grace window armed");
            self.scheduler.after(self.config.timing.grace_window, Task::GraceExpiry);
        }
    }

    // ========================================================================
    // Per-frame update
    // ========================================================================

    /// Advance the session by one frame. `steering` is whether the steer
    /// input is held. Does nothing while paused.
    pub fn update(&mut self, dt: f32, steering: bool) {
        if self.machine.state() == GameState::Paused {
            return;
        }
        self.frame += 1;

        self.scheduler.advance(dt);
        while let Some((id, task)) = self.scheduler.pop_due() {
            self.run_task(id, task, dt);
        }

        let mut signals = Vec::new();
        self.player.update(
            dt,
            steering,
            self.machine.state(),
            self.services.viewport.as_ref(),
            &mut signals,
        );
        self.reduce(&mut signals);

        let state = self.machine.state();
        if self.player.is_started() && state != GameState::Prepare && state != GameState::GameOver {
            self.services.viewport.follow(dt, self.player.forward_speed());
        }

        if self.machine.state() != GameState::GameOver && self.player.triggers_enabled() {
            let hits = scan_triggers(&self.track, self.player.position, self.player.radius());
            for hit in hits {
                let state = self.machine.state();
                self.player.on_trigger(hit, state, self.track.pools_mut(), &mut signals);
                self.reduce(&mut signals);
            }
        }

        if self.player.is_started()
            && !self.player.is_stopped()
            && self.machine.state() != GameState::GameOver
            && probe_ahead(
                &self.track,
                self.player.position,
                self.player.velocity,
                self.player.radius(),
                self.config.motion.pre_crash_lookahead,
            )
        {
            self.emit(GameEventData::PreCrash);
            self.hazard();
        }
    }

    fn reduce(&mut self, signals: &mut Vec<PlayerSignal>) {
        for signal in signals.drain(..) {
            match signal {
                PlayerSignal::HeadingTowardEdge => {
                    self.emit(GameEventData::HeadingTowardEdge);
                    self.hazard();
                }
                PlayerSignal::CameraShake => {
                    self.services.viewport.shake();
                    self.emit(GameEventData::CameraShake);
                }
                PlayerSignal::CrashSound => {
                    self.services.audio.play_sound(Sound::Crash, true);
                }
                PlayerSignal::CollisionImpulse(impulse) => {
                    self.emit(GameEventData::CollisionImpulse { impulse });
                }
                PlayerSignal::Collected(pickup) => {
                    self.services.audio.play_sound(Sound::Coin, false);
                    let prefs = self.services.preferences.as_mut();
                    let score = self.score.add_score(1, prefs);
                    let coins = self.score.add_coins(1, prefs);
                    self.emit(GameEventData::PickupCollected { pickup });
                    self.emit(GameEventData::ScoreIncrement { score });
                    self.emit(GameEventData::CoinIncrement { coins });
                }
                PlayerSignal::Died(cause) => {
                    self.emit(GameEventData::PlayerDied { cause });
                    if self.machine.state() != GameState::GameOver {
                        self.game_over();
                    }
                }
            }
        }
    }

    fn run_task(&mut self, id: TaskId, task: Task, dt: f32) {
        let state = self.machine.state();
        match task {
            Task::Recycle => {
                if state == GameState::GameOver {
                    self.scheduler.cancel(id);
                    return;
                }
                let report = self.track.recycle(self.services.viewport.as_ref(), &mut self.rng);
                self.on_recycled(report);
            }
            Task::LandmarkCheck => {
                if state == GameState::GameOver
                    || !self.track.check_landmark(self.services.viewport.as_ref())
                {
                    self.scheduler.cancel(id);
                }
            }
            Task::SpeedRamp => {
                if !self.player.ramp_speed(dt, state) {
                    self.scheduler.cancel(id);
                }
            }
            Task::CollisionForceRamp => {
                if !self.player.ramp_collision_force(dt, state) {
                    self.scheduler.cancel(id);
                }
            }
            Task::GraceExpiry => {
                if self.machine.expire_grace() {
                    debug!("grace window expired, back to {:?}", self.machine.state());
                }
            }
            Task::StopMusic => {
                self.services.audio.stop_music();
                self.services.audio.play_sound(Sound::GameOver, false);
                self.scheduler.after(self.config.timing.menu_music_delay, Task::MenuMusic);
            }
            Task::MenuMusic => {
                self.services.audio.play_music(Music::Menu);
            }
            Task::Restart => self.restart_now(),
            Task::BirdFlight(bird) => {
                let step = self.track.step_bird(bird, dt, self.services.viewport.as_ref());
                if step == BirdStep::Landed {
                    self.scheduler.cancel(id);
                    self.bird_tasks.remove(&bird.index);
                }
            }
            Task::BirdChirp => {
                self.services.audio.play_sound(Sound::BirdChirp, false);
            }
        }
    }

    fn on_recycled(&mut self, report: RecycleReport) {
        if let Some(index) = report.walls {
            self.emit(GameEventData::WallsRecycled {
                index,
                deviation: report.deviation,
            });
        }

        if let Some(launch) = report.bird {
            let bird = launch.handle;
            let flight = self.scheduler.every(0.0, Task::BirdFlight(bird));
            if let Some(previous) = self.bird_tasks.insert(bird.index, flight) {
                self.scheduler.cancel(previous);
            }
            if launch.chirp {
                let timing = &self.config.timing;
                let delay = self.rng.range_f32(timing.chirp_delay_min, timing.chirp_delay_max);
                self.scheduler.after(delay, Task::BirdChirp);
            }
            self.emit(GameEventData::BirdLaunched { bird });
        }
    }

    // ========================================================================
    // Hashing
    // ========================================================================

    /// Digest of the whole session state.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.frame, self.run_seed, |hasher| {
            hasher.update_u8(self.machine.state() as u8);
            hasher.update_bool(self.machine.is_grace_armed());
            hasher.update_u32(self.game_count);
            hasher.update_u32(self.score.score());
            hasher.update_u32(self.score.coins());
            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
            self.player.hash_into(hasher);
            self.track.hash_into(hasher);
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

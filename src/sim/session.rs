//! One game from construction to outcome
//!
//! A `Session` owns the validated settings, the world state and the asset
//! load tracker. Commands are buffered and applied at the start of the next
//! tick; `advance` runs exactly one tick and says when the next should run.

use std::mem;
use std::time::Duration;

use thiserror::Error;

use super::state::{GameEvent, GamePhase, GameState, TickInput};
use super::tick::tick;
use crate::assets::{AssetEvent, AssetLoadState, AssetResolver};
use crate::render::Snapshot;
use crate::settings::{ConfigError, GameOptions, Settings};

/// Command misuse. Construction failures are [`ConfigError`]s.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("assets are still loading ({pending} pending)")]
    AssetsPending { pending: usize },
    #[error("cannot {command} while {phase:?}")]
    InvalidPhase {
        command: &'static str,
        phase: GamePhase,
    },
}

/// What the scheduler should do after `advance`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Run the next tick after `delay`
    Continue { delay: Duration },
    /// Terminal phase reached; schedule nothing further
    Finished(GamePhase),
    /// Not started yet
    Idle,
}

#[derive(Debug)]
pub struct Session {
    settings: Settings,
    state: GameState,
    assets: AssetLoadState,
    input: TickInput,
}

impl Session {
    /// Build with the configured seed, or a random one
    pub fn new(settings: Settings) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        Self::with_seed(settings, seed)
    }

    pub fn with_seed(settings: Settings, seed: u64) -> Self {
        let state = GameState::new(&settings, seed);
        let assets = AssetLoadState::new(settings.assets.len());
        log::info!(
            "Session created (seed {seed}, {} assets to resolve)",
            settings.assets.len()
        );
        let mut session = Self {
            settings,
            state,
            assets,
            input: TickInput::default(),
        };
        if session.assets.is_settled() {
            session.mark_initialized();
        }
        session
    }

    pub fn from_options(options: &GameOptions) -> Result<Self, ConfigError> {
        Ok(Self::new(Settings::from_options(options)?))
    }

    /// Record one settled asset. Settling the last one initializes the session.
    pub fn asset_settled(&mut self, event: AssetEvent) {
        if self.assets.record(&event) {
            self.mark_initialized();
        }
    }

    /// Resolve every manifest entry through `resolver`
    pub fn load_assets(&mut self, resolver: &mut impl AssetResolver) {
        let events: Vec<_> = self
            .settings
            .assets
            .iter()
            .map(|asset| resolver.resolve(asset))
            .collect();
        for event in events {
            self.asset_settled(event);
        }
    }

    fn mark_initialized(&mut self) {
        if self.state.phase != GamePhase::Uninitialized {
            return;
        }
        self.state.phase = GamePhase::Initialized;
        self.state.events.push(GameEvent::Inited);
        let failed = self.assets.failed().len();
        if failed > 0 {
            log::warn!("Session initialized with {failed} placeholder assets");
        } else {
            log::info!("Session initialized");
        }
    }

    /// Begin ticking
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state.phase {
            GamePhase::Initialized => {}
            GamePhase::Uninitialized => {
                return Err(SessionError::AssetsPending {
                    pending: self.assets.pending(),
                });
            }
            phase => {
                return Err(SessionError::InvalidPhase {
                    command: "start",
                    phase,
                });
            }
        }
        self.state.phase = GamePhase::Playing;
        self.state.protagonist.start();
        self.state.events.push(GameEvent::Started);
        log::info!("Session started");
        Ok(())
    }

    /// Jump with the configured power on the next tick
    pub fn jump(&mut self) -> Result<(), SessionError> {
        self.jump_with(None)
    }

    /// Jump with an explicit power override
    pub fn jump_with(&mut self, power: Option<f64>) -> Result<(), SessionError> {
        self.require_playing("jump")?;
        self.input.jump = true;
        self.input.jump_power = power;
        Ok(())
    }

    /// Start charging a jump, adding `rate` power per tick while held
    pub fn start_jump(&mut self, rate: f64) -> Result<(), SessionError> {
        self.require_playing("start_jump")?;
        self.input.start_charge = Some(rate);
        Ok(())
    }

    /// Release a charged jump
    pub fn stop_jump(&mut self) -> Result<(), SessionError> {
        self.require_playing("stop_jump")?;
        self.input.release_charge = true;
        Ok(())
    }

    /// Stop from outside. No further tick runs.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        if self.state.phase.is_terminal() {
            return Err(SessionError::InvalidPhase {
                command: "stop",
                phase: self.state.phase,
            });
        }
        self.state.phase = GamePhase::Stopped;
        self.state.events.push(GameEvent::Stopped);
        self.input = TickInput::default();
        log::info!("Session stopped at tick {}", self.state.time_ticks);
        Ok(())
    }

    /// Run one tick if playing
    pub fn advance(&mut self) -> TickOutcome {
        match self.state.phase {
            GamePhase::Playing => {
                let input = mem::take(&mut self.input);
                tick(&mut self.state, &self.settings, &input);
                if self.state.phase.is_terminal() {
                    TickOutcome::Finished(self.state.phase)
                } else {
                    TickOutcome::Continue {
                        delay: self.next_delay(),
                    }
                }
            }
            phase if phase.is_terminal() => TickOutcome::Finished(phase),
            _ => TickOutcome::Idle,
        }
    }

    /// Delay before the next tick, from the live fps curve
    pub fn next_delay(&self) -> Duration {
        let difficulty = self
            .settings
            .difficulty(self.state.score, self.state.elapsed_ms);
        Duration::from_secs_f64(difficulty.frame_ms() / 1000.0)
    }

    /// Rebuild the world with a new seed. Loaded assets are kept.
    pub fn reset(&mut self, seed: u64) {
        self.state = GameState::new(&self.settings, seed);
        self.input = TickInput::default();
        if self.assets.is_settled() {
            self.mark_initialized();
        }
        log::info!("Session reset with seed {seed}");
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state, &self.settings)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        mem::take(&mut self.state.events)
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn asset_state(&self) -> &AssetLoadState {
        &self.assets
    }

    fn require_playing(&self, command: &'static str) -> Result<(), SessionError> {
        if self.state.phase == GamePhase::Playing {
            Ok(())
        } else {
            Err(SessionError::InvalidPhase {
                command,
                phase: self.state.phase,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Bounds, Curve};
    use crate::settings::{HeightTier, WinCondition};
    use crate::assets::AssetRef;
    use crate::sim::enemy::{Enemy, EnemyStatus};
    use crate::sim::kinematics::JumpArc;
    use crate::sim::protagonist::ProtagonistStatus;
    use crate::sim::state::{Award, AwardStatus, Direction, TileKind};

    /// Demo settings without random spawns, ground at height 0
    fn quiet_settings() -> Settings {
        let mut options = GameOptions::demo();
        for award in &mut options.config.awards {
            award.probability = 0.0;
        }
        options.config.enemies[0].probability = 0.0;
        options.config.flags.clear();
        options.size.as_mut().unwrap().flags.clear();
        options.assets.as_mut().unwrap().flags.clear();
        options.size.as_mut().unwrap().tiles = vec![
            HeightTier { height: 0.0 },
            HeightTier { height: 32.0 },
            HeightTier { height: 64.0 },
        ];
        options.config.win = WinCondition::default();
        Settings::from_options(&options).unwrap()
    }

    fn settled(settings: Settings) -> Session {
        let mut session = Session::with_seed(settings, 42);
        session.load_assets(&mut |asset: &AssetRef| {
            AssetEvent::Loaded(asset.id.clone())
        });
        session
    }

    fn playing(settings: Settings) -> Session {
        let mut session = settled(settings);
        session.start().unwrap();
        session
    }

    fn run_until_finished(session: &mut Session, max_ticks: usize) -> Option<GamePhase> {
        for _ in 0..max_ticks {
            if let TickOutcome::Finished(phase) = session.advance() {
                return Some(phase);
            }
        }
        None
    }

    #[test]
    fn test_start_waits_for_assets() {
        let mut session = Session::with_seed(quiet_settings(), 1);
        let pending = session.asset_state().pending();
        assert!(pending > 0);
        assert_eq!(
            session.start(),
            Err(SessionError::AssetsPending { pending })
        );
        assert_eq!(session.advance(), TickOutcome::Idle);

        // Failures count toward settlement
        session.load_assets(&mut |asset: &AssetRef| AssetEvent::Failed {
            id: asset.id.clone(),
            reason: "offline".into(),
        });
        assert_eq!(session.phase(), GamePhase::Initialized);
        assert!(session.drain_events().contains(&GameEvent::Inited));
        assert!(session.start().is_ok());
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_commands_rejected_outside_playing() {
        let mut session = settled(quiet_settings());
        assert!(matches!(
            session.jump(),
            Err(SessionError::InvalidPhase { command: "jump", .. })
        ));
        session.start().unwrap();
        assert!(session.jump().is_ok());
        session.stop().unwrap();
        assert_eq!(session.phase(), GamePhase::Stopped);
        assert_eq!(session.advance(), TickOutcome::Finished(GamePhase::Stopped));
        assert!(session.stop().is_err());
        assert!(session.start_jump(1.0).is_err());
    }

    #[test]
    fn test_idle_runner_keeps_running() {
        let mut settings = quiet_settings();
        // One endless land run
        settings.land = Curve::constant(Bounds::new(100_000, 100_000));
        let mut session = playing(settings);
        for _ in 0..2000 {
            assert!(matches!(session.advance(), TickOutcome::Continue { .. }));
            let runner = &session.state().protagonist;
            assert_eq!(runner.status, ProtagonistStatus::Running);
            assert_eq!(runner.height, 0.0);
        }
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_walking_into_gap_is_free_fall() {
        let mut settings = quiet_settings();
        settings.run_speed = Curve::constant(2.0);
        let mut session = playing(settings);

        let mut previous = None;
        let mut fell_at = None;
        for n in 0..5000 {
            session.advance();
            let runner = &session.state().protagonist;
            if runner.status == ProtagonistStatus::Jumping {
                fell_at = Some(n);
                assert_eq!(previous, Some(ProtagonistStatus::Running));
                assert_eq!(runner.arc.power, 0.0);
                assert_eq!(runner.jump_count, 1);
                break;
            }
            previous = Some(runner.status);
        }
        assert!(fell_at.is_some());

        let gravity = session.settings().protagonist.jump.gravity;
        let origin = session.state().protagonist.arc.origin;
        let mut last = origin;
        for n in 1..=5u32 {
            session.advance();
            let runner = &session.state().protagonist;
            if runner.status != ProtagonistStatus::Jumping {
                break;
            }
            let frame = n as f64;
            assert_eq!(runner.height, origin + 0.0 * frame - 0.5 * gravity * frame * frame);
            assert!(runner.height < last);
            last = runner.height;
        }
    }

    #[test]
    fn test_score_target_wins() {
        let mut settings = quiet_settings();
        settings.win = WinCondition {
            score: Some(10),
            time: None,
        };
        let mut session = playing(settings);
        let x = session.state().protagonist.location;
        for (i, offset) in [40.0, 60.0].into_iter().enumerate() {
            // Score 5 each, in the runner's path at head height
            session.state.awards.push(Award {
                id: 10_000 + i as u32,
                kind: 1,
                location: x + offset,
                height: 10.0,
                status: AwardStatus::Held,
                frame: 0,
            });
        }
        assert_eq!(run_until_finished(&mut session, 200), Some(GamePhase::Won));
        assert_eq!(session.score(), 10);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::ScoreChanged {
            score: 10,
            target: Some(10)
        }));
        assert!(events.contains(&GameEvent::Won));
        assert!(!events.contains(&GameEvent::Lost));
        // Nothing runs after the outcome
        let ticks = session.state().time_ticks;
        assert_eq!(session.advance(), TickOutcome::Finished(GamePhase::Won));
        assert_eq!(session.state().time_ticks, ticks);
    }

    #[test]
    fn test_time_target_wins_before_score() {
        let mut settings = quiet_settings();
        settings.land = Curve::constant(Bounds::new(100_000, 100_000));
        settings.win = WinCondition {
            score: Some(1000),
            time: Some(2000.0),
        };
        let mut session = playing(settings);
        assert_eq!(run_until_finished(&mut session, 1000), Some(GamePhase::Won));
        assert!(session.state().elapsed_ms >= 2000.0);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_falling_below_world_loses() {
        let settings = quiet_settings();
        let mut session = playing(settings);
        session.advance();
        let runner = &mut session.state.protagonist;
        runner.die(&session.settings.protagonist.jump);

        assert_eq!(run_until_finished(&mut session, 500), Some(GamePhase::Lost));
        let runner = &session.state().protagonist;
        assert!(runner.height < -session.settings().protagonist.size.height);
        assert_eq!(runner.status, ProtagonistStatus::Dead);
        assert!(session.drain_events().contains(&GameEvent::Lost));
    }

    #[test]
    fn test_dead_runner_cannot_win_on_time() {
        let mut settings = quiet_settings();
        settings.win = WinCondition {
            time: Some(500.0),
            score: None,
        };
        let mut session = playing(settings);
        for _ in 0..10 {
            session.advance();
        }
        let runner = &mut session.state.protagonist;
        runner.die(&session.settings.protagonist.jump);

        // The time target passes while the body is still falling
        assert_eq!(run_until_finished(&mut session, 500), Some(GamePhase::Lost));
        assert!(session.state().elapsed_ms > 500.0);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::Lost));
        assert!(!events.contains(&GameEvent::Won));
    }

    #[test]
    fn test_stomp_rebounds_runner() {
        let mut settings = quiet_settings();
        settings.land = Curve::constant(Bounds::new(100_000, 100_000));
        settings.run_speed = Curve::constant(0.0);
        let mut session = playing(settings);
        session.advance();

        let x = session.state().protagonist.location;
        let id = session.state.next_entity_id();
        session
            .state
            .enemies
            .push(Enemy::new(id, 0, x, 0.0, Direction::Left));
        // Runner dropping onto the enemy's head
        let runner = &mut session.state.protagonist;
        runner.status = ProtagonistStatus::Jumping;
        runner.height = 60.0;
        runner.arc = JumpArc::fall(60.0);
        runner.frame = 0;
        runner.jump_count = 2;

        let rebound = session.settings().enemies[0].rebound;
        let mut stomped = false;
        for _ in 0..20 {
            session.advance();
            if session.drain_events().contains(&GameEvent::EnemyStomped { id }) {
                stomped = true;
                break;
            }
        }
        assert!(stomped);
        let runner = &session.state().protagonist;
        assert_eq!(runner.status, ProtagonistStatus::Jumping);
        assert_eq!(runner.arc.power, rebound.power);
        assert_eq!(runner.jump_count, rebound.count);
        let enemy = session.state().enemies.iter().find(|e| e.id == id);
        assert!(enemy.is_none_or(|e| e.status == EnemyStatus::Dead));

        // The bounce carries the runner upward
        session.advance();
        assert!(session.state().protagonist.height > session.state().protagonist.prev_height);
    }

    #[test]
    fn test_reset_rebuilds_world() {
        let mut session = playing(quiet_settings());
        for _ in 0..50 {
            session.advance();
        }
        assert!(session.state().camera > 0.0);
        session.reset(7);
        assert_eq!(session.phase(), GamePhase::Initialized);
        assert_eq!(session.state().camera, 0.0);
        assert_eq!(session.state().seed, 7);
        assert_eq!(
            session.state().terrain.front().map(|t| t.kind),
            Some(TileKind::Middle)
        );
    }

    #[test]
    fn test_delay_follows_fps_curve() {
        let mut settings = quiet_settings();
        settings.fps = Curve::from_fn(|_, elapsed| if elapsed < 150.0 { 10.0 } else { 50.0 });
        let mut session = playing(settings);
        assert_eq!(
            session.advance(),
            TickOutcome::Continue {
                delay: Duration::from_secs_f64(0.1)
            }
        );
        assert_eq!(
            session.advance(),
            TickOutcome::Continue {
                delay: Duration::from_secs_f64(0.02)
            }
        );
    }
}

//! Cooperative variable-delay scheduler
//!
//! Exactly one tick runs at a time. After each tick the session reports the
//! delay until the next one, recomputed from the live fps curve; once it
//! reports a terminal phase no further tick is issued.

use std::io;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::render::Renderer;
use crate::sim::session::{Session, SessionError, TickOutcome};
use crate::sim::state::{GameEvent, GamePhase};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("renderer failed: {0}")]
    Render(#[from] io::Error),
}

/// Source of inter-tick delays
pub trait Clock {
    fn sleep(&mut self, delay: Duration);
}

/// Real time, blocking the thread
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, delay: Duration) {
        thread::sleep(delay);
    }
}

/// Records requested delays without waiting
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    delays: Vec<Duration>,
}

impl ManualClock {
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Simulated wall time
    pub fn elapsed(&self) -> Duration {
        self.delays.iter().sum()
    }
}

impl Clock for ManualClock {
    fn sleep(&mut self, delay: Duration) {
        self.delays.push(delay);
    }
}

/// Issues commands before each tick
pub trait Controller {
    fn control(&mut self, session: &mut Session);
}

/// No input at all
impl Controller for () {
    fn control(&mut self, _session: &mut Session) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub phase: GamePhase,
    pub ticks: u64,
    pub score: u64,
    pub elapsed_ms: f64,
}

pub struct Scheduler<R: Renderer, C: Clock> {
    renderer: R,
    clock: C,
    max_ticks: Option<u64>,
}

impl<R: Renderer, C: Clock> Scheduler<R, C> {
    pub fn new(renderer: R, clock: C) -> Self {
        Self {
            renderer,
            clock,
            max_ticks: None,
        }
    }

    /// Stop the session after this many ticks
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Draw the first frame, start the session and tick it to an outcome.
    ///
    /// `on_event` sees every event in order, including the ones queued before
    /// the run began.
    pub fn run(
        &mut self,
        session: &mut Session,
        controller: &mut impl Controller,
        mut on_event: impl FnMut(&GameEvent),
    ) -> Result<RunSummary, RunError> {
        let viewport = self.renderer.viewport();
        if viewport != session.settings().viewport {
            log::warn!(
                "Renderer viewport {}x{} differs from configured {}x{}",
                viewport.width,
                viewport.height,
                session.settings().viewport.width,
                session.settings().viewport.height
            );
        }

        if session.phase() == GamePhase::Initialized {
            self.renderer.draw(&session.snapshot())?;
            session.start()?;
        } else if session.phase() == GamePhase::Uninitialized {
            session.start()?;
        }

        let first_tick = session.state().time_ticks;
        let phase = loop {
            for event in session.drain_events() {
                on_event(&event);
            }
            let ticks = session.state().time_ticks - first_tick;
            if self.max_ticks.is_some_and(|max| ticks >= max) && !session.phase().is_terminal() {
                session.stop()?;
                for event in session.drain_events() {
                    on_event(&event);
                }
                break session.phase();
            }

            controller.control(session);
            match session.advance() {
                TickOutcome::Continue { delay } => {
                    self.renderer.draw(&session.snapshot())?;
                    self.clock.sleep(delay);
                }
                TickOutcome::Finished(phase) => {
                    self.renderer.draw(&session.snapshot())?;
                    for event in session.drain_events() {
                        on_event(&event);
                    }
                    break phase;
                }
                TickOutcome::Idle => break session.phase(),
            }
        };

        let state = session.state();
        log::info!(
            "Run ended {phase:?} after {} ticks, score {}",
            state.time_ticks,
            state.score
        );
        Ok(RunSummary {
            phase,
            ticks: state.time_ticks,
            score: state.score,
            elapsed_ms: state.elapsed_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetEvent, AssetRef};
    use crate::render::Snapshot;
    use crate::settings::{GameOptions, Settings, Viewport, WinCondition};

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(u64, GamePhase)>,
    }

    impl Renderer for Recorder {
        fn viewport(&self) -> Viewport {
            Viewport {
                width: 800.0,
                height: 450.0,
            }
        }

        fn draw(&mut self, snapshot: &Snapshot) -> io::Result<()> {
            self.frames.push((snapshot.tick, snapshot.phase));
            Ok(())
        }
    }

    fn session(win: WinCondition) -> Session {
        let mut options = GameOptions::demo();
        options.config.enemies[0].probability = 0.0;
        options.config.win = win;
        let settings = Settings::from_options(&options).unwrap();
        let mut session = Session::with_seed(settings, 3);
        session.load_assets(&mut |a: &AssetRef| AssetEvent::Loaded(a.id.clone()));
        session
    }

    #[test]
    fn test_runs_to_time_win_without_extra_ticks() {
        let mut session = session(WinCondition {
            time: Some(990.0),
            score: None,
        });
        let mut scheduler = Scheduler::new(Recorder::default(), ManualClock::default());
        let mut events = Vec::new();
        let summary = scheduler
            .run(&mut session, &mut (), |e| events.push(e.clone()))
            .unwrap();

        assert_eq!(summary.phase, GamePhase::Won);
        // 30 fps: 30 ticks of 33.3ms
        assert_eq!(summary.ticks, 30);
        // Initial frame plus one per tick
        let frames = &scheduler.renderer().frames;
        assert_eq!(frames.len(), 31);
        assert_eq!(frames[0], (0, GamePhase::Initialized));
        assert_eq!(frames.last(), Some(&(30, GamePhase::Won)));
        // No sleep after the final tick
        assert_eq!(scheduler.clock().delays().len(), 29);
        assert!(events.starts_with(&[GameEvent::Inited, GameEvent::Started]));
        assert_eq!(events.last(), Some(&GameEvent::Won));

        // Finished sessions stay finished
        assert_eq!(session.advance(), TickOutcome::Finished(GamePhase::Won));
    }

    #[test]
    fn test_tick_cap_stops_session() {
        let mut session = session(WinCondition::default());
        let mut scheduler =
            Scheduler::new(Recorder::default(), ManualClock::default()).with_max_ticks(Some(12));
        let mut events = Vec::new();
        let summary = scheduler
            .run(&mut session, &mut (), |e| events.push(e.clone()))
            .unwrap();
        assert_eq!(summary.phase, GamePhase::Stopped);
        assert_eq!(summary.ticks, 12);
        assert_eq!(events.last(), Some(&GameEvent::Stopped));
    }

    #[test]
    fn test_unsettled_session_refuses_to_run() {
        let settings = Settings::from_options(&GameOptions::demo()).unwrap();
        let mut session = Session::with_seed(settings, 1);
        let mut scheduler = Scheduler::new(Recorder::default(), ManualClock::default());
        let err = scheduler.run(&mut session, &mut (), |_| {}).unwrap_err();
        assert!(matches!(
            err,
            RunError::Session(SessionError::AssetsPending { .. })
        ));
        assert!(scheduler.renderer().frames.is_empty());
    }

    #[test]
    fn test_delays_follow_fps() {
        let mut session = session(WinCondition {
            time: Some(500.0),
            score: None,
        });
        let mut scheduler = Scheduler::new(Recorder::default(), ManualClock::default());
        scheduler.run(&mut session, &mut (), |_| {}).unwrap();
        let expected = Duration::from_secs_f64(1.0 / 30.0);
        assert!(scheduler.clock().delays().iter().all(|d| *d == expected));
    }
}

//! The per-frame trial loop.
//!
//! A trial has two phases. While awaiting the start, pointer readings only
//! drive the start point; once the finger leaves it through the allowed edge
//! the movement phase begins and every frame:
//!
//! 1. reads the pointer,
//! 2. fails the trial if the finger was lifted,
//! 3. runs the validator chain,
//! 4. feeds the trajectory-sensitive objects,
//! 5. fires due operations and advances animations,
//! 6. presents the scene,
//! 7. ends the trial successfully once a target is reached.

use crate::error::Result;
use crate::events::EventManager;
use crate::generator::Animator;
use crate::operation::{Operation, OperationTarget};
use crate::output::DiagnosticLog;
use crate::sensitive::TrajectorySensitive;
use trajex_core::event::{TRIAL_ENDED, TRIAL_FAILED, TRIAL_INITIALIZED, TRIAL_STARTED, TRIAL_SUCCEEDED};
use trajex_core::host::LoggingSoundPlayer;
use trajex_core::{
    ErrorCode, HostError, PointerInput, PointerState, Presenter, Scene, SessionContext, SoundPlayer, TrialState,
    ValidationError,
};
use trajex_timing::Timer;
use trajex_validation::{FingerLiftedValidator, StartPoint, StartPointState, ValidatorChain};

/// Dispatched `stimulus_onset` seconds after the movement starts, when a trial sets one.
pub const TARGET_ONSET: &str = "TARGET_ONSET";

#[derive(Debug, Clone, PartialEq)]
pub enum TrialEnd {
    Succeeded,
    Failed(ValidationError),
    /// The finger was lifted inside the start area.
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Continue,
    Finished(TrialEnd),
    /// No trial in progress.
    Idle,
}

/// Everything operations can act on.
pub struct TrialWorld {
    pub chain: ValidatorChain,
    pub scene: Scene,
    pub animator: Animator,
    pub sounds: Box<dyn SoundPlayer>,
}

impl TrialWorld {
    pub fn new(chain: ValidatorChain, scene: Scene) -> Self {
        Self {
            chain,
            scene,
            animator: Animator::default(),
            sounds: Box::new(LoggingSoundPlayer),
        }
    }

    pub fn with_sounds(mut self, sounds: Box<dyn SoundPlayer>) -> Self {
        self.sounds = sounds;
        self
    }
}

impl OperationTarget for TrialWorld {
    fn execute(&mut self, operation: &Operation, time: f64) {
        let found = match operation {
            Operation::Show { stimulus } => self.scene.set_visible(stimulus, true),
            Operation::Hide { stimulus } => self.scene.set_visible(stimulus, false),
            Operation::Move { stimulus, x, y } => self.scene.move_to(stimulus, (*x, *y).into()),
            Operation::SetText { stimulus, text } => self.scene.set_text(stimulus, text),
            Operation::Enable { validator } => self.chain.set_enabled(validator, true),
            Operation::Disable { validator } => self.chain.set_enabled(validator, false),
            Operation::PlaySound { sound } => {
                self.sounds.play(sound);
                true
            }
            Operation::Animate { stimulus, trajectory } => {
                let found = self.scene.contains(stimulus);
                if found {
                    self.animator.start(stimulus, trajectory.build(), time);
                }
                found
            }
            Operation::StopAnimation { stimulus } => {
                self.animator.stop(stimulus);
                self.scene.contains(stimulus)
            }
            Operation::Log { message } => {
                tracing::info!(time, "{message}");
                true
            }
            Operation::DispatchEvent { .. } => true,
        };
        if !found {
            tracing::warn!(action = operation.action(), subject = ?operation.subject(), "operation target not found");
        }
    }
}

impl std::fmt::Debug for TrialWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrialWorld")
            .field("chain", &self.chain)
            .field("scene", &self.scene)
            .field("animator", &self.animator)
            .finish_non_exhaustive()
    }
}

/// Fires due operations, logs them and moves animated stimuli.
fn tick(events: &mut EventManager, world: &mut TrialWorld, diag: &mut Option<DiagnosticLog>, now: f64) -> Result<()> {
    for fired in events.advance(now, world) {
        tracing::debug!(event = %fired.event, action = fired.operation.action(), due = fired.due, "operation fired");
        if let Some(log) = diag {
            let subject = fired.operation.subject().unwrap_or("");
            log.line("operation", fired.operation.action(), &[&subject, &fired.event, &fired.due])?;
        }
    }
    world.animator.update(&mut world.scene, now);
    Ok(())
}

#[derive(Debug)]
pub struct TrialDriver {
    pub start_point: StartPoint,
    pub world: TrialWorld,
    pub events: EventManager,
    pub finger: FingerLiftedValidator,
    sensitive: Vec<Box<dyn TrajectorySensitive>>,
    diag: Option<DiagnosticLog>,
    state: TrialState,
    active: bool,
    movement_start: Option<f64>,
    target_onset: Option<f64>,
}

impl TrialDriver {
    pub fn new(start_point: StartPoint, world: TrialWorld, events: EventManager, ctx: &SessionContext) -> Self {
        Self {
            start_point,
            world,
            events,
            finger: FingerLiftedValidator::new(ctx),
            sensitive: Vec::new(),
            diag: None,
            state: TrialState::AwaitingStart,
            active: false,
            movement_start: None,
            target_onset: None,
        }
    }

    /// Registers an object fed after validation; called in registration order.
    pub fn add_sensitive(&mut self, object: impl TrajectorySensitive + 'static) {
        self.sensitive.push(Box::new(object));
    }

    pub fn set_diagnostics(&mut self, log: DiagnosticLog) {
        self.diag = Some(log);
    }

    pub fn diagnostics(&mut self) -> Option<&mut DiagnosticLog> {
        self.diag.as_mut()
    }

    /// Seconds after the movement start at which [`TARGET_ONSET`] is dispatched.
    pub fn set_target_onset(&mut self, onset: Option<f64>) {
        self.target_onset = onset;
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn scene(&self) -> &Scene {
        &self.world.scene
    }

    pub fn movement_start(&self) -> Option<f64> {
        self.movement_start
    }

    /// First response measured by a trajectory-sensitive object.
    pub fn response(&self) -> Option<f64> {
        self.sensitive.iter().find_map(|s| s.response())
    }

    fn dispatch(&mut self, event_id: &str, time: f64) -> Result<()> {
        tracing::debug!(event = event_id, time, "dispatch event");
        self.events.dispatch_event(event_id, time);
        if let Some(log) = &mut self.diag {
            log.line("event", "dispatch", &[&event_id, &time])?;
        }
        Ok(())
    }

    fn tick(&mut self, now: f64) -> Result<()> {
        tick(&mut self.events, &mut self.world, &mut self.diag, now)
    }

    pub fn begin_trial(&mut self, now: f64) -> Result<()> {
        self.state = TrialState::AwaitingStart;
        self.active = true;
        self.movement_start = None;
        self.world.scene.reset();
        self.world.animator.clear();
        self.start_point.reset();
        self.events.on_trial_started();
        self.dispatch(TRIAL_INITIALIZED, now)?;
        self.tick(now)
    }

    fn start_movement(&mut self, now: f64) -> Result<()> {
        self.state = TrialState::Moving;
        self.movement_start = Some(now);
        self.world.chain.reset(now);
        self.finger.reset(now);
        for s in &mut self.sensitive {
            s.reset(now);
        }
        self.dispatch(TRIAL_STARTED, now)?;
        if let Some(onset) = self.target_onset {
            self.dispatch(TARGET_ONSET, now + onset)?;
        }
        self.tick(now)
    }

    fn resolve_start(&mut self, state: StartPointState, now: f64) -> Result<FrameOutcome> {
        match state {
            StartPointState::Start => {
                self.start_movement(now)?;
                Ok(FrameOutcome::Continue)
            }
            StartPointState::Error => {
                let err = ValidationError::new(
                    ErrorCode::StartWrongDirection,
                    "you left the start area in the wrong direction",
                );
                self.finish(TrialEnd::Failed(err), now)
            }
            StartPointState::Aborted => self.finish(TrialEnd::Aborted, now),
            StartPointState::Init | StartPointState::MouseUp => {
                self.tick(now)?;
                Ok(FrameOutcome::Continue)
            }
        }
    }

    /// One frame of whichever phase the trial is in.
    pub fn step(&mut self, pointer: PointerState, now: f64) -> Result<FrameOutcome> {
        if !self.active {
            return Ok(FrameOutcome::Idle);
        }
        match self.state {
            TrialState::AwaitingStart => {
                let state = self.start_point.update(pointer.position, pointer.pressed);
                self.resolve_start(state, now)
            }
            _ => self.process_frame(pointer, now),
        }
    }

    /// One frame of the movement phase.
    pub fn process_frame(&mut self, pointer: PointerState, now: f64) -> Result<FrameOutcome> {
        if let Err(err) = self.finger.check_pressed(pointer.pressed, now) {
            return self.finish(TrialEnd::Failed(err), now);
        }
        if let Err(err) = self.world.chain.evaluate(pointer.position, now) {
            return self.finish(TrialEnd::Failed(err), now);
        }
        for s in &mut self.sensitive {
            s.update_xyt(pointer.position, now);
        }
        self.tick(now)?;
        if self.sensitive.iter().any(|s| s.target_reached()) {
            return self.finish(TrialEnd::Succeeded, now);
        }
        Ok(FrameOutcome::Continue)
    }

    fn finish(&mut self, end: TrialEnd, now: f64) -> Result<FrameOutcome> {
        self.active = false;
        match &end {
            TrialEnd::Succeeded => {
                self.state = TrialState::Succeeded;
                self.dispatch(TRIAL_SUCCEEDED, now)?;
            }
            TrialEnd::Failed(err) => {
                self.state = TrialState::Failed;
                tracing::info!(code = %err.code, "trial failed: {}", err.message);
                if let Some(log) = &mut self.diag {
                    log.line("validation", "failed", &[&err.code, &now])?;
                }
                self.dispatch(TRIAL_FAILED, now)?;
            }
            TrialEnd::Aborted => {
                self.state = TrialState::Aborted;
            }
        }
        self.dispatch(TRIAL_ENDED, now)?;
        self.tick(now)?;
        Ok(FrameOutcome::Finished(end))
    }

    /// Runs one trial to its end, blocking on `input` for every frame.
    pub fn run_trial<I, P, T>(&mut self, input: &mut I, presenter: &mut P, timer: &mut T) -> Result<TrialEnd>
    where
        I: PointerInput + ?Sized,
        P: Presenter + ?Sized,
        T: Timer,
    {
        self.begin_trial(timer.now_secs())?;
        presenter.present(&self.world.scene)?;

        let Self {
            start_point,
            world,
            events,
            diag,
            ..
        } = self;
        let exit = start_point.wait_until_exit(input, |_| {
            tick(events, world, diag, timer.now_secs())?;
            presenter.present(&world.scene)?;
            Ok::<(), crate::Error>(())
        })?;

        let outcome = self.resolve_start(exit, timer.now_secs())?;
        presenter.present(&self.world.scene)?;
        if let FrameOutcome::Finished(end) = outcome {
            return Ok(end);
        }

        loop {
            if !input.poll() {
                return Err(HostError::InputClosed.into());
            }
            let frame_start = timer.now();
            let outcome = self.process_frame(input.state(), timer.now_secs())?;
            presenter.present(&self.world.scene)?;
            let frame_time = timer.elapsed(frame_start);
            timer.record_frame(frame_time);
            if let FrameOutcome::Finished(end) = outcome {
                return Ok(end);
            }
        }
    }
}

//! A sequence of trials: ordering, per-trial setup, retries and result files.

use crate::config::{ExperimentConfig, LoadContext, SessionConfig, TrialSpec, load_trials};
use crate::driver::{FrameOutcome, TrialDriver, TrialEnd};
use crate::error::Result;
use crate::output::{DiagnosticLog, OutputError, ResultsWriter, TrajectoryWriter};
use crate::sensitive::TrajectoryRecorder;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;
use trajex_core::{PointerInput, PointerState, Presenter, Scene, TrialInfo};
use trajex_timing::Timer;

/// Stimulus whose text is set to each trial's presented target.
pub const TARGET_STIMULUS: &str = "target";

pub const TRAJECTORIES_FILE: &str = "trajectories.csv";
pub const RESULTS_FILE: &str = "results.csv";
pub const DIAGNOSTICS_FILE: &str = "session.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    BetweenTrials,
    Finished,
}

pub struct Session {
    driver: TrialDriver,
    settings: SessionConfig,
    queue: VecDeque<TrialSpec>,
    current: Option<(TrialSpec, TrialInfo)>,
    results: Vec<TrialInfo>,
    recorder: TrajectoryRecorder,
    trajectories: Option<TrajectoryWriter>,
    results_out: Option<ResultsWriter>,
    session_start: Option<f64>,
    waiting_until: Option<f64>,
}

impl Session {
    pub fn new(mut driver: TrialDriver, mut trials: Vec<TrialSpec>, settings: SessionConfig) -> Self {
        if settings.shuffle {
            let mut rng = match settings.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            trials.shuffle(&mut rng);
        }
        let recorder = TrajectoryRecorder::new();
        driver.add_sensitive(recorder.clone());
        Self {
            driver,
            settings,
            queue: trials.into(),
            current: None,
            results: Vec::new(),
            recorder,
            trajectories: None,
            results_out: None,
            session_start: None,
            waiting_until: None,
        }
    }

    /// Loads the config's trials and opens the result files in its output directory.
    pub fn from_config(config: &ExperimentConfig, base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let cx = LoadContext {
            session: config.session_context()?,
            base_dir: base_dir.to_path_buf(),
        };
        let mut driver = config.build_driver(&cx)?;
        let trials = load_trials(config.trials_path(base_dir), &config.trial_schema())?;

        let out = config.output_path(base_dir);
        std::fs::create_dir_all(&out).map_err(|source| OutputError::Create {
            path: out.display().to_string(),
            source,
        })?;
        driver.set_diagnostics(DiagnosticLog::create(out.join(DIAGNOSTICS_FILE))?);
        tracing::info!(trials = trials.len(), output = %out.display(), "session loaded");

        Ok(Self::new(driver, trials, config.session.clone()).with_outputs(
            TrajectoryWriter::create(out.join(TRAJECTORIES_FILE))?,
            ResultsWriter::create(out.join(RESULTS_FILE))?,
        ))
    }

    pub fn with_outputs(mut self, trajectories: TrajectoryWriter, results: ResultsWriter) -> Self {
        self.trajectories = Some(trajectories);
        self.results_out = Some(results);
        self
    }

    pub fn results(&self) -> &[TrialInfo] {
        &self.results
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn scene(&self) -> &Scene {
        self.driver.scene()
    }

    pub fn driver(&self) -> &TrialDriver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut TrialDriver {
        &mut self.driver
    }

    /// The trial in progress, if any.
    pub fn current_trial(&self) -> Option<&TrialInfo> {
        self.current.as_ref().map(|(_, info)| info)
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    /// Applies the next queued trial's parameters to the driver.
    fn setup_trial(&mut self, now: f64) -> bool {
        let Some(spec) = self.queue.pop_front() else {
            return false;
        };
        let start = *self.session_start.get_or_insert(now);
        let mut info = TrialInfo::new(self.results.len() + 1, spec.target, spec.presented_target.clone());
        info.time_in_session = now - start;
        info.custom = spec.custom.clone();

        self.driver.world.scene.set_text(TARGET_STIMULUS, &spec.presented_target);
        self.driver.world.chain.set_max_movement_time(spec.max_movement_time);
        self.driver.set_target_onset(spec.stimulus_onset);
        tracing::info!(trial = info.trial_num, target = spec.target, row = spec.row, "trial starting");

        self.current = Some((spec, info));
        true
    }

    fn complete(&mut self, end: TrialEnd, now: f64) -> Result<()> {
        let Some((spec, mut info)) = self.current.take() else {
            return Ok(());
        };
        match &end {
            TrialEnd::Aborted => {
                tracing::info!(trial = info.trial_num, "trial aborted, restarting");
                self.recorder.take();
                self.queue.push_front(spec);
                return Ok(());
            }
            TrialEnd::Succeeded => info.succeed(),
            TrialEnd::Failed(err) => info.fail(err),
        }
        if let Some(start) = self.driver.movement_start() {
            info.movement_time.set(now - start)?;
        }
        if let Some(response) = self.driver.response() {
            info.set_response(response)?;
        }

        let samples = self.recorder.take();
        if let Some(out) = &mut self.trajectories {
            out.write_trial(info.trial_num, &samples)?;
        }
        if let Some(out) = &mut self.results_out {
            out.write(&info)?;
        }
        if let Some(log) = self.driver.diagnostics() {
            log.flush()?;
        }

        if !info.is_success() && self.settings.repeat_failed {
            self.queue.push_back(spec);
        }
        tracing::info!(trial = info.trial_num, status = ?info.status, samples = samples.len(), "trial finished");
        self.results.push(info);
        Ok(())
    }

    /// Runs every trial to completion, blocking on `input`.
    pub fn run<I, P, T>(&mut self, input: &mut I, presenter: &mut P, timer: &mut T) -> Result<&[TrialInfo]>
    where
        I: PointerInput + ?Sized,
        P: Presenter + ?Sized,
        T: Timer,
    {
        while self.setup_trial(timer.now_secs()) {
            let end = self.driver.run_trial(input, presenter, timer)?;
            self.complete(end, timer.now_secs())?;
            if !self.queue.is_empty() && self.settings.inter_trial_interval > 0.0 {
                timer.sleep(Duration::from_secs_f64(self.settings.inter_trial_interval));
            }
        }
        let stats = timer.frame_stats();
        tracing::info!(trials = self.results.len(), frames = stats.frames, "session finished");
        Ok(&self.results)
    }

    /// Advances the session by one frame without blocking.
    pub fn frame(&mut self, pointer: PointerState, now: f64) -> Result<SessionStatus> {
        if let Some(until) = self.waiting_until {
            if now < until {
                return Ok(SessionStatus::BetweenTrials);
            }
            self.waiting_until = None;
        }
        if self.current.is_none() {
            if !self.setup_trial(now) {
                return Ok(SessionStatus::Finished);
            }
            self.driver.begin_trial(now)?;
            return Ok(SessionStatus::Running);
        }
        match self.driver.step(pointer, now)? {
            FrameOutcome::Finished(end) => {
                self.complete(end, now)?;
                if self.queue.is_empty() {
                    tracing::info!(trials = self.results.len(), "session finished");
                    return Ok(SessionStatus::Finished);
                }
                self.waiting_until = Some(now + self.settings.inter_trial_interval);
                Ok(SessionStatus::BetweenTrials)
            }
            FrameOutcome::Continue | FrameOutcome::Idle => Ok(SessionStatus::Running),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("driver", &self.driver)
            .field("settings", &self.settings)
            .field("remaining", &self.queue.len())
            .field("results", &self.results.len())
            .finish_non_exhaustive()
    }
}

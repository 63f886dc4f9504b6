use serde_json::json;
use std::path::Path;
use trajex_core::{ErrorCode, HostError, PointerState, Presenter, Scene, TrialStatus};
use trajex_experiment::config::{LoadContext, TrialSchema, read_trials};
use trajex_experiment::session::{RESULTS_FILE, TRAJECTORIES_FILE};
use trajex_experiment::{ExperimentConfig, ReplayInput, Session, SessionStatus};
use trajex_timing::{ManualTimer, Timer};

#[derive(Default)]
struct CountingPresenter {
    frames: usize,
}

impl Presenter for CountingPresenter {
    fn present(&mut self, _scene: &Scene) -> Result<(), HostError> {
        self.frames += 1;
        Ok(())
    }
}

fn config(extra: serde_json::Value) -> serde_json::Value {
    let mut base = json!({
        "trials": "trials.csv",
        "output_dir": "out",
        "session": {"inter_trial_interval": 0},
        "start_point": {"x": 0, "y": -300, "width": 100, "height": 50, "exit_area": "up"},
        "number_line": {"position": {"x": 0, "y": 300}, "length": 800, "min_value": 0, "max_value": 100, "touch_distance": 10},
        "stimuli": [{"id": "target", "kind": {"kind": "text", "content": "", "size": 32, "color": [255, 255, 255, 255]}, "position": {"x": 0, "y": 350}}],
        "validators": {"trial_duration": {"max_trial_duration": 3}},
        "operations": [{"event": "TRIAL_STARTED + 0.1", "action": "show", "stimulus": "target"}]
    });
    if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    base
}

fn write_experiment(dir: &Path, config: serde_json::Value, trials: &str) -> ExperimentConfig {
    std::fs::write(dir.join("trials.csv"), trials).unwrap();
    let text = config.to_string();
    std::fs::write(dir.join("experiment.json"), &text).unwrap();
    ExperimentConfig::load(dir.join("experiment.json")).unwrap()
}

/// Touch the start area at `t`, leave it upwards and reach the number line at `value`.
fn reach(input: &mut ReplayInput, value: f64, t: f64) {
    let x_end = -400.0 + value * 8.0;
    input.touch(0.0, -300.0, t).touch(0.0, -270.0, t + 0.02);
    for i in 1..=10 {
        let f = i as f64 / 10.0;
        input.touch(x_end * f, -270.0 + 57.0 * i as f64, t + 0.02 + 0.05 * i as f64);
    }
}

/// Leave the start area, creep up at 1% of the path per 0.1 s, then finish
/// the reach at the middle of the number line.
fn creep(input: &mut ReplayInput, t: f64) {
    input.touch(0.0, -300.0, t).touch(0.0, -270.0, t + 0.02);
    for i in 1..=5 {
        input.touch(0.0, -270.0 + 5.7 * i as f64, t + 0.02 + 0.1 * i as f64);
    }
    for k in 1..=4 {
        input.touch(0.0, -241.5 + 135.0 * k as f64, t + 0.52 + 0.05 * k as f64);
    }
}

#[test]
fn completes_every_trial_and_writes_results() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_experiment(dir.path(), config(json!({})), "target\n25\n75\n");
    let mut session = Session::from_config(&config, dir.path()).unwrap();

    let mut timer = ManualTimer::new();
    let mut input = ReplayInput::default().with_clock(timer.clone());
    reach(&mut input, 25.0, 0.0);
    reach(&mut input, 75.0, 1.0);
    let mut presenter = CountingPresenter::default();

    let results = session.run(&mut input, &mut presenter, &mut timer).unwrap();
    assert_eq!(results.len(), 2);
    for (info, target) in results.iter().zip([25.0, 75.0]) {
        assert_eq!(info.status, TrialStatus::Ok);
        assert_eq!(info.target, target);
        assert_eq!(info.response.get(), Some(&target));
        assert_eq!(info.endpoint_error, Some(0.0));
        let movement_time = *info.movement_time.get().unwrap();
        assert!((movement_time - 0.5).abs() < 1e-6, "{movement_time}");
    }
    assert!(session.is_finished());
    assert!(presenter.frames >= 24);

    let out = dir.path().join("out");
    let trajectories = std::fs::read_to_string(out.join(TRAJECTORIES_FILE)).unwrap();
    assert_eq!(trajectories.lines().count(), 1 + 20);
    assert!(trajectories.starts_with("trial,time,x,y"));
    let results = std::fs::read_to_string(out.join(RESULTS_FILE)).unwrap();
    assert_eq!(results.lines().count(), 3);
    let first = results.lines().nth(1).unwrap();
    assert!(first.starts_with("1,"));
    assert!(first.contains(",ok,"));
}

#[test]
fn custom_trial_columns_reach_the_results_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_experiment(dir.path(), config(json!({})), "target,block\n25,A\n75,B\n");
    let mut session = Session::from_config(&config, dir.path()).unwrap();

    let mut timer = ManualTimer::new();
    let mut input = ReplayInput::default().with_clock(timer.clone());
    reach(&mut input, 25.0, 0.0);
    reach(&mut input, 75.0, 1.0);
    session.run(&mut input, &mut CountingPresenter::default(), &mut timer).unwrap();

    let results = std::fs::read_to_string(dir.path().join("out").join(RESULTS_FILE)).unwrap();
    let lines: Vec<_> = results.lines().collect();
    assert!(lines[0].ends_with(",time_in_session,block"), "{}", lines[0]);
    assert!(lines[1].ends_with(",A"));
    assert!(lines[2].ends_with(",B"));
}

#[test]
fn movement_time_override_applies_to_its_own_row_only() {
    let dir = tempfile::tempdir().unwrap();
    let extra = json!({
        "validators": {"global_speed": {"axis": "y", "origin_coord": -270, "end_coord": 300, "max_movement_time": 1}}
    });
    let config = write_experiment(dir.path(), config(extra), "target,max_movement_time\n50,100\n50,\n");
    let mut session = Session::from_config(&config, dir.path()).unwrap();

    let mut timer = ManualTimer::new();
    let mut input = ReplayInput::default().with_clock(timer.clone());
    creep(&mut input, 0.0);
    creep(&mut input, 2.0);

    let results = session.run(&mut input, &mut CountingPresenter::default(), &mut timer).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status, TrialStatus::Ok);
    assert_eq!(results[1].status, TrialStatus::Failed);
    assert_eq!(results[1].error_code, Some(ErrorCode::TooSlow));
}

#[test]
fn failed_trials_are_repeated() {
    let dir = tempfile::tempdir().unwrap();
    let extra = json!({
        "session": {"inter_trial_interval": 0, "repeat_failed": true},
        "validators": {"speed": {"axis": "y", "min_speed": 100}}
    });
    let config = write_experiment(dir.path(), config(extra), "target\n50\n");
    let mut session = Session::from_config(&config, dir.path()).unwrap();

    let mut timer = ManualTimer::new();
    let mut input = ReplayInput::default().with_clock(timer.clone());
    input.touch(0.0, -300.0, 0.0).touch(0.0, -270.0, 0.02);
    input.touch(0.0, -265.0, 0.1).touch(0.0, -264.0, 0.2);
    reach(&mut input, 50.0, 1.0);

    let results = session.run(&mut input, &mut CountingPresenter::default(), &mut timer).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status, TrialStatus::Failed);
    assert_eq!(results[0].error_code, Some(ErrorCode::TooSlow));
    assert!(results[0].response.get().is_none());
    assert_eq!(results[1].status, TrialStatus::Ok);
    assert_eq!(results[1].trial_num, 2);
}

#[test]
fn lifting_in_the_start_area_restarts_the_trial() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_experiment(dir.path(), config(json!({})), "target\n10\n");
    let mut session = Session::from_config(&config, dir.path()).unwrap();

    let mut timer = ManualTimer::new();
    let mut input = ReplayInput::default().with_clock(timer.clone());
    input.touch(0.0, -300.0, 0.0).release(0.0, -300.0, 0.1);
    reach(&mut input, 10.0, 0.5);

    let results = session.run(&mut input, &mut CountingPresenter::default(), &mut timer).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].trial_num, 1);
    assert_eq!(results[0].status, TrialStatus::Ok);
}

#[test]
fn leaving_the_start_area_sideways_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_experiment(dir.path(), config(json!({})), "target\n10\n");
    let mut session = Session::from_config(&config, dir.path()).unwrap();

    let mut timer = ManualTimer::new();
    let mut input = ReplayInput::default().with_clock(timer.clone());
    input.touch(0.0, -300.0, 0.0).touch(80.0, -300.0, 0.05);

    let results = session.run(&mut input, &mut CountingPresenter::default(), &mut timer).unwrap();
    assert_eq!(results[0].error_code, Some(ErrorCode::StartWrongDirection));
    assert!(results[0].movement_time.get().is_none());
}

#[test]
fn exhausted_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_experiment(dir.path(), config(json!({})), "target\n10\n");
    let mut session = Session::from_config(&config, dir.path()).unwrap();

    let mut timer = ManualTimer::new();
    let mut input = ReplayInput::default().with_clock(timer.clone());
    input.touch(0.0, -300.0, 0.0);

    let err = session
        .run(&mut input, &mut CountingPresenter::default(), &mut timer)
        .unwrap_err();
    assert!(matches!(err, trajex_experiment::Error::Host(HostError::InputClosed)));
}

#[test]
fn stepping_mode_runs_operations_on_schedule() {
    let config: ExperimentConfig = serde_json::from_value(config(json!({}))).unwrap();
    let cx = LoadContext {
        session: config.session_context().unwrap(),
        ..LoadContext::default()
    };
    let driver = config.build_driver(&cx).unwrap();
    let trials = read_trials("target\n50\n".as_bytes(), &TrialSchema::default()).unwrap();
    let mut session = Session::new(driver, trials, config.session.clone());

    let up = |y: f64| PointerState::pressed_at(0.0, y);
    assert_eq!(session.frame(PointerState::default(), 0.0).unwrap(), SessionStatus::Running);
    assert_eq!(session.current_trial().map(|t| t.status), Some(TrialStatus::Pending));
    assert_eq!(session.scene().get("target").map(|s| s.visible), Some(false));

    session.frame(up(-300.0), 0.02).unwrap();
    session.frame(up(-270.0), 0.04).unwrap();
    session.frame(up(-200.0), 0.1).unwrap();
    assert_eq!(session.scene().get("target").map(|s| s.visible), Some(false));
    session.frame(up(-100.0), 0.15).unwrap();
    let target = session.scene().get("target").unwrap();
    assert!(target.visible);

    assert_eq!(session.frame(up(300.0), 0.2).unwrap(), SessionStatus::Finished);
    assert_eq!(session.results()[0].response.get(), Some(&50.0));
    assert_eq!(session.frame(up(300.0), 0.3).unwrap(), SessionStatus::Finished);
}

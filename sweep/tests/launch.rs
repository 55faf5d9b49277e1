use std::path::PathBuf;

use anyhow::{bail, Result};
use common::{HarnessError, Value};
use sweep::{
    launch_experiments, CommandBackend, DryRunBackend, LaunchOptions, RunRequest, SnapshotMode,
    TrainingBackend, VariantGenerator, VARIANT_FILE_NAME,
};
use tempfile::tempdir;

struct RecordingBackend {
    calls: Vec<String>,
    fail_at: Option<usize>,
}

impl RecordingBackend {
    fn new(fail_at: Option<usize>) -> Self {
        Self {
            calls: vec![],
            fail_at,
        }
    }
}

impl TrainingBackend for RecordingBackend {
    fn run(&mut self, request: &RunRequest) -> Result<()> {
        self.calls.push(request.exp_name.clone());

        if self.fail_at == Some(request.index) {
            bail!("training crashed");
        }

        Ok(())
    }
}

fn generator(seeds: &[i64]) -> VariantGenerator {
    let mut vg = VariantGenerator::new();
    vg.add_value("prefix", "swimmer".into()).unwrap();
    vg.add("seed", seeds.iter().map(|s| Value::Integer(*s)).collect())
        .unwrap();
    vg.add_value("snapshot_mode", "gap".into()).unwrap();
    vg.add_value("snapshot_gap", Value::Integer(10)).unwrap();
    vg.add_value("sync_pkl", Value::Boolean(true)).unwrap();
    vg
}

fn options(log_dir: PathBuf) -> LaunchOptions {
    LaunchOptions {
        exp_name: "run".to_string(),
        mode: "local".to_string(),
        log_dir,
        n_parallel: 1,
        tag_keys: vec!["seed".to_string()],
        env_idx: 0,
        no_graphics: false,
    }
}

fn is_configuration_error(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<HarnessError>(),
        Some(HarnessError::Configuration { .. })
    )
}

#[test]
fn dispatches_every_variant_in_generator_order() {
    let mut backend = DryRunBackend::new();
    let requests = launch_experiments(
        &generator(&[1, 2, 3]),
        &options(PathBuf::from("/logs")),
        &mut backend,
    )
    .unwrap();

    assert_eq!(requests.len(), 3);
    assert_eq!(backend.requests(), requests.as_slice());

    let first = &requests[0];
    assert_eq!(first.tag, "seed_1");
    assert_eq!(first.log_dir, PathBuf::from("/logs/seed_1"));
    assert_eq!(first.exp_prefix, "swimmer/run");
    assert_eq!(first.exp_name, "swimmer-run-00");
    assert_eq!(first.seed, 1);
    assert_eq!(first.snapshot_mode, SnapshotMode::Gap);
    assert_eq!(first.snapshot_gap, 10);
    assert!(first.sync_snapshots);
    assert!(first.terminate_machine);
    assert_eq!(first.n_parallel, 1);

    let names = requests.iter().map(|r| r.exp_name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["swimmer-run-00", "swimmer-run-01", "swimmer-run-02"]);
}

#[test]
fn parallelism_above_one_is_rejected_before_any_call() {
    let mut backend = RecordingBackend::new(None);
    let mut options = options(PathBuf::from("/logs"));
    options.n_parallel = 4;

    let err = launch_experiments(&generator(&[1, 2]), &options, &mut backend).unwrap_err();

    assert!(is_configuration_error(&err));
    assert!(backend.calls.is_empty());
}

#[test]
fn swept_parallelism_above_one_is_rejected_before_any_call() {
    let mut backend = RecordingBackend::new(None);
    let mut vg = generator(&[1]);
    vg.add("n_parallel", vec![Value::Integer(1), Value::Integer(2)])
        .unwrap();

    let err = launch_experiments(&vg, &options(PathBuf::from("/logs")), &mut backend).unwrap_err();

    assert!(is_configuration_error(&err));
    assert!(backend.calls.is_empty());
}

#[test]
fn failure_aborts_remaining_variants_with_index_and_tag() {
    let mut backend = RecordingBackend::new(Some(1));

    let err = launch_experiments(
        &generator(&[1, 2, 3]),
        &options(PathBuf::from("/logs")),
        &mut backend,
    )
    .unwrap_err();

    match err.downcast_ref::<HarnessError>() {
        Some(HarnessError::Dispatch { index, tag, .. }) => {
            assert_eq!(*index, 1);
            assert_eq!(tag, "seed_2");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(backend.calls, vec!["swimmer-run-00", "swimmer-run-01"]);
}

#[test]
fn empty_parameter_list_is_surfaced() {
    let mut backend = RecordingBackend::new(None);

    let err = launch_experiments(
        &generator(&[]),
        &options(PathBuf::from("/logs")),
        &mut backend,
    )
    .unwrap_err();

    assert!(is_configuration_error(&err));
    assert!(err.to_string().contains("seed"));
    assert!(backend.calls.is_empty());
}

#[test]
fn missing_prefix_is_a_configuration_error() {
    let mut vg = VariantGenerator::new();
    vg.add_value("seed", Value::Integer(1)).unwrap();
    let mut backend = RecordingBackend::new(None);

    let err = launch_experiments(&vg, &options(PathBuf::from("/logs")), &mut backend).unwrap_err();

    assert!(is_configuration_error(&err));
}

#[test]
fn command_backend_writes_variant_and_runs_command() {
    let dir = tempdir().unwrap();
    let mut backend = CommandBackend::new("test -f {variant} && test {seed} -eq 1".to_string());

    let requests = launch_experiments(
        &generator(&[1]),
        &options(dir.path().to_path_buf()),
        &mut backend,
    )
    .unwrap();

    let variant_path = requests[0].log_dir.join(VARIANT_FILE_NAME);
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(variant_path).unwrap()).unwrap();
    assert_eq!(written["exp_name"], "swimmer-run-00");
    assert_eq!(written["variant"]["seed"], 1);
}

#[test]
fn command_backend_failure_is_a_dispatch_error() {
    let dir = tempdir().unwrap();
    let mut backend = CommandBackend::new("exit 3".to_string());

    let err = launch_experiments(
        &generator(&[5]),
        &options(dir.path().to_path_buf()),
        &mut backend,
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<HarnessError>(),
        Some(HarnessError::Dispatch { index: 0, .. })
    ));
}

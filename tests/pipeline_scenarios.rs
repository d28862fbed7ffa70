//! End-to-end batch scenarios against the fake toolchain

use panbatch::discovery::SourceSpec;
use panbatch::dispatch::{DispatchOutcome, ParallelHandler, SerialHandler, TaskHandler};
use panbatch::queue::TaskQueueBuilder;
use panbatch::sensor::{derive_pan_name, ResolutionError, Sensor};
use panbatch::testing::{default_options, write_wv02_pair, FakeToolchain};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_single_pair_with_scratch_directory() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    write_wv02_pair(src.path(), 0).unwrap();
    let mut options = default_options();
    options.working_dir = Some(scratch.path().to_path_buf());
    let source = SourceSpec::classify(src.path()).unwrap();

    let queue = TaskQueueBuilder::new(dst.path(), options.clone())
        .build(&source)
        .unwrap();
    assert_eq!(queue.len(), 1);

    let fake = Arc::new(FakeToolchain::new());
    let outcome = SerialHandler::new(fake.executor())
        .dispatch(&queue.tasks)
        .await
        .unwrap();
    let DispatchOutcome::Completed(report) = outcome else {
        panic!("expected a completed batch");
    };
    assert!(report.is_success());

    let names = files_in(dst.path());
    assert!(names
        .iter()
        .any(|n| n.ends_with("-M1BS-10300100106FC100_u8rf3413_pansh.tif")));
    assert!(names
        .iter()
        .any(|n| n.ends_with("-M1BS-10300100106FC100_u8rf3413_pansh.xml")));
    assert!(files_in(scratch.path()).is_empty());

    // A second build over the same inputs finds nothing left to do
    let rerun = TaskQueueBuilder::new(dst.path(), options)
        .build(&source)
        .unwrap();
    assert!(rerun.is_empty());
    assert_eq!(rerun.summary.already_complete, 1);
}

#[tokio::test]
async fn test_interrupted_batch_resumes() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    for i in 0..4 {
        write_wv02_pair(src.path(), i).unwrap();
    }
    let source = SourceSpec::Directory(src.path().to_path_buf());

    // First run loses pansharpening entirely
    let queue = TaskQueueBuilder::new(dst.path(), default_options())
        .build(&source)
        .unwrap();
    let broken = Arc::new(FakeToolchain::new().fail_pansharpen());
    let DispatchOutcome::Completed(report) = ParallelHandler::new(broken.executor(), 2)
        .dispatch(&queue.tasks)
        .await
        .unwrap()
    else {
        panic!("expected a completed batch");
    };
    assert_eq!(report.failed().len(), 4);

    // The rerun keeps the ortho products and only pansharpens
    let queue = TaskQueueBuilder::new(dst.path(), default_options())
        .build(&source)
        .unwrap();
    assert_eq!(queue.len(), 4);
    let fixed = Arc::new(FakeToolchain::new());
    let DispatchOutcome::Completed(report) = ParallelHandler::new(fixed.executor(), 2)
        .dispatch(&queue.tasks)
        .await
        .unwrap()
    else {
        panic!("expected a completed batch");
    };
    assert!(report.is_success());
    assert!(fixed.ortho_calls().is_empty());
    assert_eq!(fixed.pansharpen_count(), 4);
}

#[test]
fn test_ge01_ambiguous_companion_is_excluded() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    let mul = src
        .path()
        .join("GE01_110108M0010160234A222000100252M_5V000500940.ntf");
    std::fs::write(&mul, b"m").unwrap();
    for pan in [
        "GE01_110108P0010160234A222000100252M_5V000500939.ntf",
        "GE01_110108P0010160234A222000100252M_5V000500941.tif",
    ] {
        std::fs::write(src.path().join(pan), b"p").unwrap();
    }

    let err = derive_pan_name(Sensor::GE01, &mul).unwrap_err();
    assert!(matches!(err, ResolutionError::AmbiguousCompanion { count: 2, .. }));

    let queue = TaskQueueBuilder::new(dst.path(), default_options())
        .build(&SourceSpec::Image(mul))
        .unwrap();
    assert!(queue.is_empty());
    assert_eq!(queue.summary.excluded, 1);
}

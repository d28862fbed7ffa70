use super::*;

#[tokio::test]
async fn test_production_runner_captures_output() {
    let command = ProcessCommandBuilder::new("echo").arg("hello world").build();

    let output = TokioProcessRunner.run(command).await.unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout.trim(), "hello world");
    assert!(output.stderr.is_empty());
}

#[tokio::test]
async fn test_production_runner_reports_exit_code() {
    let command = ProcessCommandBuilder::new("false").build();

    let output = TokioProcessRunner.run(command).await.unwrap();
    assert_eq!(output.status, ExitStatus::Error(1));
}

#[tokio::test]
async fn test_production_runner_missing_program() {
    let command = ProcessCommandBuilder::new("panbatch-no-such-tool").build();

    let result = TokioProcessRunner.run(command).await;
    assert!(matches!(result, Err(ProcessError::CommandNotFound(p)) if p == "panbatch-no-such-tool"));
}

#[tokio::test]
async fn test_mock_first_matching_rule_wins() {
    let (manager, mock) = SubprocessManager::mock();
    mock.respond_when(
        "qsub",
        |args| args.iter().any(|a| a == "Pansh0002"),
        MockReply::exit(1).with_stderr("qsub: Unknown queue"),
    );
    mock.respond("qsub", MockReply::stdout("1234.pbs01\n"));

    let first = manager
        .run(ProcessCommandBuilder::new("qsub").option("-N", "Pansh0001").build())
        .await
        .unwrap();
    let second = manager
        .run(ProcessCommandBuilder::new("qsub").option("-N", "Pansh0002").build())
        .await
        .unwrap();

    assert_eq!(first.stdout, "1234.pbs01\n");
    assert_eq!(second.status, ExitStatus::Error(1));
    assert_eq!(second.stderr, "qsub: Unknown queue");
    assert_eq!(mock.call_count("qsub"), 2);
    assert_eq!(mock.calls()[1].args, vec!["-N", "Pansh0002"]);
}

#[tokio::test]
async fn test_mock_limited_rule_is_exhausted() {
    let mock = MockProcessRunner::new();
    mock.respond_times("gdalinfo", MockReply::ok(), 2);

    for _ in 0..2 {
        assert!(mock.run(ProcessCommandBuilder::new("gdalinfo").build()).await.is_ok());
    }
    let result = mock.run(ProcessCommandBuilder::new("gdalinfo").build()).await;
    assert!(matches!(result, Err(ProcessError::Unscripted(_))));
    assert_eq!(mock.call_count("gdalinfo"), 3);
}

#[tokio::test]
async fn test_mock_simulated_missing_program() {
    let mock = MockProcessRunner::new();
    mock.respond("gdaladdo", MockReply::not_found());

    let result = mock.run(ProcessCommandBuilder::new("gdaladdo").build()).await;
    assert!(matches!(result, Err(ProcessError::CommandNotFound(p)) if p == "gdaladdo"));
}

#[test]
fn test_builder_options_and_paths() {
    let command = ProcessCommandBuilder::new("pgc_ortho.py")
        .option("-p", 3413)
        .option("-t", "Byte")
        .path(std::path::Path::new("/data/a b.ntf"))
        .build();

    assert_eq!(command.args, vec!["-p", "3413", "-t", "Byte", "/data/a b.ntf"]);
    assert_eq!(command.display_line(), "pgc_ortho.py -p 3413 -t Byte '/data/a b.ntf'");
}

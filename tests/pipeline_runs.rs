//! End-to-end pipeline runs through the public API, with the external
//! decoder and the inference engine replaced by test doubles.

use mediascribe::config::Config;
use mediascribe::decode::MockDecoder;
use mediascribe::pipeline::orchestrator::RunRequest;
use mediascribe::pipeline::{PipelineEvent, Stage, WorkerScheduler};
use mediascribe::stt::adapter::MockLoader;
use mediascribe::stt::compute::{DeviceCapabilities, select_compute};
use mediascribe::stt::engine::EngineSpec;
use mediascribe::{ErrorKind, ModelTier};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn wav_bytes(samples: &[i16]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn request(source: &Path, out_dir: &Path) -> RunRequest {
    RunRequest {
        source: source.to_path_buf(),
        output_dir: out_dir.to_path_buf(),
        engine_spec: EngineSpec::new(
            ModelTier::Base,
            "en",
            select_compute(&DeviceCapabilities { accelerator: false }),
        ),
        batch_size: 16,
        decode_timeout: Duration::from_secs(5),
    }
}

fn drain(handle: mediascribe::RunHandle) -> Vec<PipelineEvent> {
    let events: Vec<PipelineEvent> = handle.events().iter().collect();
    handle.join();
    events
}

#[test]
fn successful_run_writes_transcript_file() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("interview.mp4");
    std::fs::write(&source, b"not real media").unwrap();
    let out_dir = dir.path().join("transcripts");

    let scheduler = WorkerScheduler::new(
        Arc::new(MockDecoder::new().with_artifact_bytes(wav_bytes(&[200i16; 3200]))),
        Box::new(MockLoader::new(&["First segment here.", "Second one."])),
    );
    let events = drain(scheduler.submit(request(&source, &out_dir)).unwrap());

    let result = match events.last() {
        Some(PipelineEvent::Completed(result)) => result.clone(),
        other => panic!("expected Completed, got {:?}", other),
    };

    assert_eq!(result.word_count, 5);
    assert_eq!(result.full_text, "First segment here. Second one.");

    let name = result
        .output_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap();
    assert!(
        name.starts_with("interview_transcript_") && name.ends_with(".txt"),
        "unexpected transcript name: {name}"
    );
    let contents = std::fs::read_to_string(&result.output_file).unwrap();
    assert_eq!(contents, "First segment here.\nSecond one.\n");
}

#[test]
fn progress_stages_arrive_in_order_with_terminal_last() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("talk.mkv");
    std::fs::write(&source, b"media").unwrap();
    let out_dir = dir.path().join("out");

    let scheduler = WorkerScheduler::new(
        Arc::new(MockDecoder::new().with_artifact_bytes(wav_bytes(&[1i16; 1600]))),
        Box::new(MockLoader::new(&["ok"])),
    );
    let events = drain(scheduler.submit(request(&source, &out_dir)).unwrap());

    let stages: Vec<Stage> = events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::Progress { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![
            Stage::Decoding,
            Stage::Decoding,
            Stage::ModelLoading,
            Stage::Transcribing,
            Stage::Persisting,
        ]
    );
    assert!(events.last().is_some_and(|e| e.is_terminal()));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[test]
fn missing_source_fails_before_invoking_the_decoder() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().join("out");
    let decoder = Arc::new(MockDecoder::new());

    let scheduler = WorkerScheduler::new(decoder.clone(), Box::new(MockLoader::default()));
    let events = drain(
        scheduler
            .submit(request(&dir.path().join("nope.mp4"), &out_dir))
            .unwrap(),
    );

    match events.last() {
        Some(PipelineEvent::Failed { kind, .. }) => assert_eq!(*kind, ErrorKind::NotFound),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert_eq!(decoder.invocations(), 0);
    assert!(!out_dir.exists(), "no transcript dir for a failed run");
}

#[test]
fn decode_failure_leaves_no_transcript() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("clip.mp4");
    std::fs::write(&source, b"media").unwrap();
    let out_dir = dir.path().join("out");

    let scheduler = WorkerScheduler::new(
        Arc::new(MockDecoder::new().with_failure("moov atom not found")),
        Box::new(MockLoader::default()),
    );
    let events = drain(scheduler.submit(request(&source, &out_dir)).unwrap());

    match events.last() {
        Some(PipelineEvent::Failed { kind, message }) => {
            assert_eq!(*kind, ErrorKind::DecodeFailed);
            assert!(message.contains("moov atom"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(!out_dir.exists());
}

#[test]
fn run_request_honors_config_settings() {
    let mut config = Config::default();
    config.stt.model = ModelTier::Small;
    config.stt.language = "de".to_string();
    config.stt.batch_size = 4;
    config.decode.timeout_secs = 30;
    config.output.dir = "some/where".into();

    let request = RunRequest::from_config("in.mp4".into(), &config);
    assert_eq!(request.engine_spec.tier, ModelTier::Small);
    assert_eq!(request.engine_spec.language, "de");
    assert_eq!(request.batch_size, 4);
    assert_eq!(request.decode_timeout, Duration::from_secs(30));
    assert_eq!(request.output_dir, Path::new("some/where"));
}

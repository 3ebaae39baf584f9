//! Write-lock protocol between the fill and the encoders.

use std::num::NonZeroUsize;

use zenramp::*;

fn surface(width: u32, height: u32) -> Surface {
    Surface::new(width, height, PixelFormat::default(), &Limits::none()).unwrap()
}

/// Fill where the rows in the lower half make the generator panic.
fn fill_with_failing_rows(surface: &mut Surface) -> Result<FillStats, HdrError> {
    let bounds = surface.bounds();
    let mut lock = surface.lock_for_write(bounds)?;
    let stats = FillEngine::new(NonZeroUsize::new(4).unwrap()).fill(
        &mut lock,
        &|_u: f32, v: f32| -> [f32; 3] {
            if v >= 0.5 {
                panic!("generator failure");
            }
            [1.0; 3]
        },
    )?;
    lock.unlock()?;
    Ok(stats)
}

#[test]
fn failed_fill_still_releases_lock() {
    let mut s = surface(2, 8);
    let err = fill_with_failing_rows(&mut s).unwrap_err();
    assert!(matches!(err, HdrError::WorkerPanicked { worker: 2 }), "{err:?}");
    assert_eq!(err.code(), 7);

    assert_eq!(s.lock_state(), LockState::Unlocked);
    // Bands that completed are visible; the rest stayed zero.
    assert_eq!(s.pixel(1, 3).unwrap(), [1.0; 3]);
    assert_eq!(s.pixel(1, 4).unwrap(), [0.0; 3]);
}

#[test]
fn leaked_lock_blocks_reads_and_encoding() {
    let mut s = surface(4, 4);
    let bounds = s.bounds();
    std::mem::forget(s.lock_for_write(bounds).unwrap());

    assert_eq!(s.lock_state(), LockState::LockedForWrite);
    assert!(matches!(s.row(0), Err(HdrError::LockProtocolViolation(_))));

    for request in [EncodeRequest::pfm(), EncodeRequest::radiance()] {
        let err = request.encode(&s, Unstoppable).unwrap_err();
        assert!(matches!(err, HdrError::LockProtocolViolation(_)), "{err:?}");
        assert_eq!(err.code(), 6);
    }
}

#[test]
fn frame_encoder_rejects_locked_surface_and_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("locked.pfm");

    let mut s = surface(3, 3);
    let bounds = s.bounds();
    std::mem::forget(s.lock_for_write(bounds).unwrap());

    let mut encoder = FrameEncoder::create(&dest, ContainerFormat::Pfm).unwrap();
    let err = encoder.write_source(&s, Unstoppable).unwrap_err();
    assert!(matches!(err, HdrError::LockProtocolViolation(_)));
    drop(encoder);

    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn second_lock_is_rejected_until_release() {
    let mut s = surface(2, 2);
    let bounds = s.bounds();
    {
        let _lock = s.lock_for_write(bounds).unwrap();
        // The guard borrows the surface mutably, so a second lock cannot
        // even be requested here; the state check covers leaked guards.
    }
    let lock = s.lock_for_write(bounds).unwrap();
    lock.unlock().unwrap();
    std::mem::forget(s.lock_for_write(bounds).unwrap());
    assert!(matches!(
        s.lock_for_write(bounds),
        Err(HdrError::LockProtocolViolation(_))
    ));
}

#[test]
fn pipeline_unlocks_before_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = Pipeline::new(PipelineConfig::new(16, 8, dir.path().join("trace.pfm")));
    let report = pipeline.run().unwrap();

    assert_eq!(
        report.trace.stages(),
        &[
            Stage::Created,
            Stage::Locked,
            Stage::Filled,
            Stage::Unlocked,
            Stage::Encoded,
            Stage::Committed,
        ]
    );
    assert!(report.trace.position(Stage::Unlocked) < report.trace.position(Stage::Encoded));
    assert_eq!(pipeline.trace(), &report.trace);
}

#[test]
fn pipeline_fill_failure_aborts_before_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("never.pfm");
    let mut pipeline = Pipeline::new(PipelineConfig::new(4, 8, &dest));

    let err = pipeline
        .run_with(
            &|_u: f32, v: f32| -> [f32; 3] {
                assert!(v < 0.5, "generator failure");
                [0.0; 3]
            },
            Unstoppable,
        )
        .unwrap_err();

    assert!(matches!(err, HdrError::WorkerPanicked { .. }));
    assert_eq!(
        pipeline.trace().stages(),
        &[Stage::Created, Stage::Locked, Stage::Failed]
    );
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

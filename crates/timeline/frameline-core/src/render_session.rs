//! Frame-by-frame capture: seek, wait for the host to settle, hand the frame to
//! the caller, repeat over an inclusive frame range.

use std::cell::Cell;
use std::rc::Rc;

use log::debug;

use crate::driver::StableFuture;
use crate::engine::Engine;
use crate::error::{FramelineError, Result};

/// What a capture loop drives. [`Engine`] is the usual target.
pub trait CaptureTarget {
    fn seek(&self, frame: f64);
    fn wait_until_stable(&self) -> StableFuture;
}

impl CaptureTarget for Engine {
    fn seek(&self, frame: f64) {
        Engine::seek(self, frame);
    }

    fn wait_until_stable(&self) -> StableFuture {
        Engine::wait_until_stable(self)
    }
}

impl<T: CaptureTarget + ?Sized> CaptureTarget for &T {
    fn seek(&self, frame: f64) {
        (**self).seek(frame);
    }

    fn wait_until_stable(&self) -> StableFuture {
        (**self).wait_until_stable()
    }
}

/// Shared cancel switch; clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct AbortFlag(Rc<Cell<bool>>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.set(true);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.get()
    }
}

pub struct RenderSession<T: CaptureTarget> {
    target: T,
    start_frame: f64,
    end_frame: f64,
    cursor: u64,
    abort: Option<AbortFlag>,
    finished: bool,
}

impl<T: CaptureTarget> RenderSession<T> {
    /// Capture `start_frame..=end_frame`. Equal bounds capture one frame.
    pub fn new(target: T, start_frame: f64, end_frame: f64) -> Result<Self> {
        let valid = start_frame.is_finite()
            && end_frame.is_finite()
            && start_frame >= 0.0
            && end_frame >= start_frame;
        if !valid {
            return Err(FramelineError::InvalidRenderRange {
                start_frame,
                end_frame,
            });
        }
        Ok(Self {
            target,
            start_frame,
            end_frame,
            cursor: 0,
            abort: None,
            finished: false,
        })
    }

    pub fn with_abort(mut self, abort: AbortFlag) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Number of frames a full run yields.
    pub fn frame_count(&self) -> u64 {
        (self.end_frame - self.start_frame).floor() as u64 + 1
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn aborted(&self) -> bool {
        self.abort.as_ref().is_some_and(AbortFlag::is_aborted)
    }

    fn stop(&mut self, why: &str) -> Result<Option<f64>> {
        if !self.finished {
            debug!("render session stopped after {} frames: {why}", self.cursor);
        }
        self.finished = true;
        Ok(None)
    }

    /// Seek to the next frame and resolve with it once the target is stable.
    /// `Ok(None)` once the range is exhausted or the session was aborted. A
    /// failed stability wait ends the session with that error.
    pub async fn next_frame(&mut self) -> Result<Option<f64>> {
        if self.finished {
            return Ok(None);
        }
        if self.cursor >= self.frame_count() {
            return self.stop("range complete");
        }
        if self.aborted() {
            return self.stop("aborted");
        }
        let frame = self.start_frame + self.cursor as f64;
        self.target.seek(frame);
        if let Err(err) = self.target.wait_until_stable().await {
            self.finished = true;
            return Err(err);
        }
        if self.aborted() {
            return self.stop("aborted while settling");
        }
        self.cursor += 1;
        Ok(Some(frame))
    }

    /// Drive the whole range, calling `on_frame` after each frame settles.
    /// Returns how many frames were delivered.
    pub async fn run(&mut self, mut on_frame: impl FnMut(f64) -> Result<()>) -> Result<u64> {
        let mut delivered = 0;
        while let Some(frame) = self.next_frame().await? {
            on_frame(frame)?;
            delivered += 1;
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        seeks: RefCell<Vec<f64>>,
        waits: Cell<usize>,
        abort_on_wait: Option<AbortFlag>,
        fail_on_wait: Option<usize>,
    }

    impl CaptureTarget for Recorder {
        fn seek(&self, frame: f64) {
            self.seeks.borrow_mut().push(frame);
        }

        fn wait_until_stable(&self) -> StableFuture {
            let n = self.waits.get() + 1;
            self.waits.set(n);
            if let Some(flag) = &self.abort_on_wait {
                flag.abort();
            }
            if self.fail_on_wait == Some(n) {
                return Box::pin(std::future::ready(Err(FramelineError::StabilityCheckFailed {
                    reason: "font load".into(),
                })));
            }
            driver::ready()
        }
    }

    fn drain<T: CaptureTarget>(session: &mut RenderSession<T>) -> Vec<f64> {
        let mut frames = Vec::new();
        while let Some(f) = pollster::block_on(session.next_frame()).unwrap() {
            frames.push(f);
        }
        frames
    }

    #[test]
    fn yields_every_frame_inclusive() {
        let target = Recorder::default();
        let mut session = RenderSession::new(&target, 0.0, 2.0).unwrap();
        assert_eq!(session.frame_count(), 3);
        assert_eq!(drain(&mut session), vec![0.0, 1.0, 2.0]);
        assert_eq!(*target.seeks.borrow(), vec![0.0, 1.0, 2.0]);
        assert_eq!(target.waits.get(), 3);
        assert!(session.is_finished());
        assert_eq!(pollster::block_on(session.next_frame()).unwrap(), None);
    }

    #[test]
    fn single_frame_range() {
        let target = Recorder::default();
        let mut session = RenderSession::new(&target, 5.0, 5.0).unwrap();
        assert_eq!(session.frame_count(), 1);
        assert_eq!(drain(&mut session), vec![5.0]);
        assert_eq!(*target.seeks.borrow(), vec![5.0]);
        assert_eq!(target.waits.get(), 1);
    }

    #[test]
    fn abort_between_frames() {
        let target = Recorder::default();
        let abort = AbortFlag::new();
        let mut session = RenderSession::new(&target, 0.0, 9.0)
            .unwrap()
            .with_abort(abort.clone());
        assert_eq!(pollster::block_on(session.next_frame()).unwrap(), Some(0.0));
        assert_eq!(pollster::block_on(session.next_frame()).unwrap(), Some(1.0));
        abort.abort();
        assert_eq!(pollster::block_on(session.next_frame()).unwrap(), None);
        assert_eq!(target.seeks.borrow().len(), 2);
    }

    #[test]
    fn abort_while_settling_drops_the_frame() {
        let abort = AbortFlag::new();
        let target = Recorder {
            abort_on_wait: Some(abort.clone()),
            ..Recorder::default()
        };
        let mut session = RenderSession::new(&target, 0.0, 3.0)
            .unwrap()
            .with_abort(abort);
        assert!(drain(&mut session).is_empty());
        assert_eq!(*target.seeks.borrow(), vec![0.0]);
    }

    #[test]
    fn pre_aborted_session_never_seeks() {
        let target = Recorder::default();
        let abort = AbortFlag::new();
        abort.abort();
        let mut session = RenderSession::new(&target, 0.0, 3.0)
            .unwrap()
            .with_abort(abort);
        assert!(drain(&mut session).is_empty());
        assert!(target.seeks.borrow().is_empty());
    }

    #[test]
    fn stability_failure_ends_session() {
        let target = Recorder {
            fail_on_wait: Some(2),
            ..Recorder::default()
        };
        let mut session = RenderSession::new(&target, 0.0, 3.0).unwrap();
        let mut seen = Vec::new();
        let err = pollster::block_on(session.run(|f| {
            seen.push(f);
            Ok(())
        }))
        .unwrap_err();
        assert_eq!(err.code(), "STABILITY_CHECK_FAILED");
        assert_eq!(seen, vec![0.0]);
        assert!(session.is_finished());
    }

    #[test]
    fn run_counts_frames() {
        let target = Recorder::default();
        let mut session = RenderSession::new(&target, 10.0, 14.5).unwrap();
        let delivered = pollster::block_on(session.run(|_| Ok(()))).unwrap();
        assert_eq!(delivered, 5);
        assert_eq!(*target.seeks.borrow(), vec![10.0, 11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn rejects_bad_ranges() {
        let target = Recorder::default();
        for (start, end) in [(-1.0, 5.0), (5.0, 4.0), (f64::NAN, 1.0), (0.0, f64::INFINITY)] {
            let err = RenderSession::new(&target, start, end).err().unwrap();
            assert_eq!(err.code(), "INVALID_RENDER_RANGE");
        }
    }
}

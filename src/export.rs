//!
//! Offline rendering of a fixed number of frames into a `FrameSink`.
//!
//! Exports run on a snapshot of the animator: once the export is over, successful or not,
//! the live animation continues exactly where it was.
//!

use std::path::Path;
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::animator::Animator;
use crate::encode::{save_png, FrameSink};
use crate::error::TrifadeResult;
use crate::params::Params;
use crate::raster::Renderer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSummary {
    pub frames: usize,
    pub seconds: f64,
}

/// Render `params.frame_count()` frames into `sink`, calling `progress(done, total)` after
/// each one. An uninitialized animator is initialized first.
#[instrument(skip_all, fields(width = params.width, height = params.height, fps = params.fps))]
pub fn export_animation(
    animator: &mut Animator,
    params: &Params,
    renderer: &mut dyn Renderer,
    mut sink: Box<dyn FrameSink>,
    mut progress: impl FnMut(usize, usize),
) -> TrifadeResult<ExportSummary> {
    let snapshot = animator.snapshot();
    if !animator.is_initialized() {
        animator.reset(params);
    }

    let total = params.frame_count();
    let start = Instant::now();
    info!(frames = total, "exporting animation");

    for i in 0..total {
        if let Err(e) = export_one(animator, params, renderer, sink.as_mut()) {
            warn!(frame = i, "export failed: {}", e);
            sink.abort();
            animator.restore(snapshot);
            return Err(e);
        }

        progress(i + 1, total);
    }

    let finished = sink.finish();
    animator.restore(snapshot);
    finished?;

    let summary = ExportSummary {
        frames: total,
        seconds: start.elapsed().as_secs_f64(),
    };
    info!(
        frames = summary.frames,
        seconds = summary.seconds,
        "export finished"
    );

    Ok(summary)
}

fn export_one(
    animator: &mut Animator,
    params: &Params,
    renderer: &mut dyn Renderer,
    sink: &mut dyn FrameSink,
) -> TrifadeResult<()> {
    animator.advance(params);
    renderer.draw(&animator.frame(params));
    let image = renderer.read_pixels().into_image()?;
    sink.write_frame(&image)
}

/// Save the current state as a single png without advancing the animation.
#[instrument(skip(animator, params, renderer))]
pub fn export_frame(
    animator: &mut Animator,
    params: &Params,
    renderer: &mut dyn Renderer,
    path: &Path,
) -> TrifadeResult<()> {
    if !animator.is_initialized() {
        animator.reset(params);
    }

    renderer.draw(&animator.frame(params));
    let image = renderer.read_pixels().into_image()?;
    save_png(&image, path)?;

    info!(path = %path.display(), "saved frame");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    use image::RgbImage;

    use crate::error::TrifadeError;
    use crate::raster::SoftwareRenderer;

    #[derive(Default)]
    struct Log {
        frames: usize,
        finished: bool,
        aborted: bool,
    }

    struct MemorySink {
        log: Rc<RefCell<Log>>,
        fail_at: Option<usize>,
    }

    impl FrameSink for MemorySink {
        fn write_frame(&mut self, _frame: &RgbImage) -> TrifadeResult<()> {
            let mut log = self.log.borrow_mut();
            if Some(log.frames) == self.fail_at {
                return Err(TrifadeError::export_sink("disk full"));
            }
            log.frames += 1;
            Ok(())
        }

        fn finish(self: Box<Self>) -> TrifadeResult<()> {
            self.log.borrow_mut().finished = true;
            Ok(())
        }

        fn abort(self: Box<Self>) {
            self.log.borrow_mut().aborted = true;
        }
    }

    fn params() -> Params {
        Params {
            width: 40,
            height: 30,
            fps: 10.0,
            duration: 1.5,
            num_points: 8,
            ..Params::default()
        }
    }

    #[test]
    fn exports_every_frame_and_restores_state() {
        let p = params();
        let mut animator = Animator::with_params(&p);
        animator.advance(&p);
        let before = animator.frame(&p);

        let log = Rc::new(RefCell::new(Log::default()));
        let sink = MemorySink {
            log: log.clone(),
            fail_at: None,
        };

        let mut calls = vec![];
        let mut renderer = SoftwareRenderer::new(1, 1);
        let summary = export_animation(&mut animator, &p, &mut renderer, Box::new(sink), |d, t| {
            calls.push((d, t))
        })
        .unwrap();

        assert_eq!(summary.frames, 15);
        assert_eq!(log.borrow().frames, 15);
        assert!(log.borrow().finished);
        assert_eq!(calls.len(), 15);
        assert_eq!(calls.last(), Some(&(15, 15)));

        assert_eq!(animator.frame(&p), before);
        assert_eq!(animator.frame_index(), 1);
    }

    #[test]
    fn failing_sink_aborts_and_restores_state() {
        let p = params();
        let mut animator = Animator::with_params(&p);
        let before = animator.frame(&p);

        let log = Rc::new(RefCell::new(Log::default()));
        let sink = MemorySink {
            log: log.clone(),
            fail_at: Some(3),
        };

        let mut renderer = SoftwareRenderer::new(40, 30);
        let res = export_animation(&mut animator, &p, &mut renderer, Box::new(sink), |_, _| {});

        assert!(res.is_err());
        assert!(log.borrow().aborted);
        assert!(!log.borrow().finished);
        assert_eq!(animator.frame(&p), before);
    }

    #[test]
    fn uninitialized_animator_is_initialized() {
        let p = params();
        let mut animator = Animator::new(p.seed);

        let log = Rc::new(RefCell::new(Log::default()));
        let sink = MemorySink {
            log: log.clone(),
            fail_at: None,
        };

        let mut renderer = SoftwareRenderer::new(40, 30);
        export_animation(&mut animator, &p, &mut renderer, Box::new(sink), |_, _| {}).unwrap();
        assert_eq!(log.borrow().frames, 15);
    }
}

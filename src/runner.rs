use log::{info, warn};

use crate::{
    annotate::draw_overlay,
    config::RunConfig,
    counter::CrossingCounter,
    detection::Detection,
    detector::Detector,
    error::{Error, Result},
    task::{Task, TaskStore},
    tracker::SortTracker,
    video::{FrameSink, FrameSource},
};

/// What a finished run reports back to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub car_count: u64,
    pub frames: u64,
}

/// Drives one counting run to completion: read frame, detect, filter, track,
/// count, annotate, write. All mutable tracking state is built fresh in here
/// and dropped on return, so concurrent runs cannot interfere.
///
/// A single frame's detection failure is absorbed (the tracker coasts on
/// predictions); `max_detection_failures` consecutive failures abort the run
/// rather than silently under-count.
pub fn run_task<S, K, D>(
    source: &mut S,
    sink: &mut K,
    detector: &mut D,
    config: &RunConfig,
) -> Result<RunOutcome>
where
    S: FrameSource,
    K: FrameSink,
    D: Detector,
{
    config.validate()?;

    let (width, height) = source.dimensions();
    info!(
        "starting run: {width}x{height} at {} fps, counting class {} over line a={} b={} tol={}",
        source.frame_rate(),
        config.class,
        config.line.a,
        config.line.b,
        config.line.tolerance
    );

    let mut tracker = SortTracker::from_config(config);
    let mut counter = CrossingCounter::new(config.line);
    let mut consecutive_failures: u32 = 0;
    let mut frames: u64 = 0;

    while let Some(mut frame) = source.read_frame()? {
        frames += 1;

        let detections: Vec<Detection> = match detector.detect(&frame) {
            Ok(detections) => {
                consecutive_failures = 0;
                detections
            }
            Err(e) => {
                consecutive_failures += 1;
                warn!("detection failed on frame {frames} ({consecutive_failures} in a row): {e}");
                if consecutive_failures > config.max_detection_failures {
                    return Err(Error::Input(format!(
                        "detector failed on {consecutive_failures} consecutive frames: {e}"
                    )));
                }
                Vec::new()
            }
        };

        let detections: Vec<Detection> = detections
            .into_iter()
            .filter(|detection| detection.passes(config.class, config.confidence_threshold))
            .collect();

        let tracks = tracker.update(&detections);
        for track in &tracks {
            counter.observe(track);
        }

        draw_overlay(&mut frame, &config.line, &tracks);
        sink.write_frame(&frame)?;
    }

    let outcome = RunOutcome {
        car_count: counter.count() as u64,
        frames,
    };
    info!(
        "run finished: {} frame(s), {} vehicle(s) counted",
        outcome.frames, outcome.car_count
    );
    Ok(outcome)
}

/// Wraps `run_task` for one persisted `Task`, driving the status lifecycle:
/// `processing` before the loop, `done` or `error` after, each transition
/// saved to the store before anything else happens. Failed runs are not
/// retried; the caller may resubmit as a new task.
pub struct TaskRunner<S: TaskStore> {
    store: S,
}

impl<S: TaskStore> TaskRunner<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn execute<Src, Snk, D>(
        &mut self,
        task: &mut Task,
        open_source: impl FnOnce() -> Result<Src>,
        sink: &mut Snk,
        detector: &mut D,
        config: &RunConfig,
    ) -> Result<RunOutcome>
    where
        Src: FrameSource,
        Snk: FrameSink,
        D: Detector,
    {
        task.start()?;
        self.store.save(task)?;

        let result = open_source()
            .and_then(|mut source| run_task(&mut source, sink, detector, config));

        match result {
            Ok(outcome) => {
                task.complete(outcome.car_count)?;
                self.store.save(task)?;
                Ok(outcome)
            }
            Err(e) => {
                warn!("task {} failed: {e}", task.id);
                task.fail(e.to_string())?;
                self.store.save(task)?;
                Err(e)
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

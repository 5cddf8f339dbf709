mod annotate;
mod associate;
mod bbox;
mod config;
mod counter;
mod detection;
mod detector;
mod error;
mod kalman_box_tracker;
mod runner;
mod task;
mod tracker;
mod video;

pub use annotate::draw_overlay;
pub use associate::{Association, associate_detections_to_tracks};
pub use bbox::BBox;
pub use config::RunConfig;
pub use counter::{CountingLine, CrossingCounter};
pub use detection::Detection;
pub use detector::{Detector, ScriptedDetector};
pub use error::{Error, Result};
pub use runner::{RunOutcome, TaskRunner, run_task};
pub use task::{JsonTaskStore, MemoryTaskStore, Task, TaskStatus, TaskStore};
pub use tracker::{SortTracker, Track};
pub use video::{
    BufferSink, BufferSource, FrameSink, FrameSource, ImageSequenceSink, ImageSequenceSource,
};

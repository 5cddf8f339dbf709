use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
};

use image::RgbImage;
use log::info;

use crate::error::{Error, Result};

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Frame-by-frame video input. Dimensions and frame rate are fixed at open
/// time and hold for the whole run.
pub trait FrameSource {
    fn dimensions(&self) -> (u32, u32);

    fn frame_rate(&self) -> f64;

    /// Next decoded frame, or `None` at end of stream.
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Frame-by-frame video output for the annotated audit stream.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;
}

/// Reads a directory of numbered frame images in lexicographic order. The
/// container format is the I/O collaborator's concern, not the core's; a
/// frame directory is the simplest collaborator that satisfies it.
pub struct ImageSequenceSource {
    frames: VecDeque<PathBuf>,
    dimensions: (u32, u32),
    frame_rate: f64,
}

impl ImageSequenceSource {
    pub fn open(dir: impl AsRef<Path>, frame_rate: f64) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir)
            .map_err(|e| Error::Input(format!("cannot open input {}: {e}", dir.display())))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext))
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(Error::Input(format!(
                "no frames found in {}",
                dir.display()
            )));
        }

        let dimensions = image::image_dimensions(&paths[0]).map_err(|e| {
            Error::Input(format!("cannot read frame {}: {e}", paths[0].display()))
        })?;
        info!(
            "opened {} ({} frames, {}x{} at {frame_rate} fps)",
            dir.display(),
            paths.len(),
            dimensions.0,
            dimensions.1
        );

        Ok(Self {
            frames: paths.into(),
            dimensions,
            frame_rate,
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.frames.pop_front() else {
            return Ok(None);
        };
        let frame = image::open(&path)
            .map_err(|e| Error::Input(format!("cannot decode frame {}: {e}", path.display())))?
            .to_rgb8();
        Ok(Some(frame))
    }
}

/// Writes annotated frames as numbered PNGs into a directory.
pub struct ImageSequenceSink {
    dir: PathBuf,
    written: u64,
}

impl ImageSequenceSink {
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| Error::Output(format!("cannot create output {}: {e}", dir.display())))?;
        Ok(Self { dir, written: 0 })
    }
}

impl FrameSink for ImageSequenceSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let path = self.dir.join(format!("frame_{:06}.png", self.written));
        frame
            .save(&path)
            .map_err(|e| Error::Output(format!("cannot write frame {}: {e}", path.display())))?;
        self.written += 1;
        Ok(())
    }
}

/// In-memory source over pre-built frames. Used by the demo binary and by
/// tests that script a whole run.
pub struct BufferSource {
    frames: VecDeque<RgbImage>,
    dimensions: (u32, u32),
    frame_rate: f64,
}

impl BufferSource {
    /// Builds a source of `count` blank frames of the given size.
    pub fn blank(width: u32, height: u32, count: usize, frame_rate: f64) -> Self {
        let frames = (0..count).map(|_| RgbImage::new(width, height)).collect();
        Self {
            frames,
            dimensions: (width, height),
            frame_rate,
        }
    }

    pub fn from_frames(frames: Vec<RgbImage>, frame_rate: f64) -> Self {
        let dimensions = frames
            .first()
            .map(|frame| frame.dimensions())
            .unwrap_or((0, 0));
        Self {
            frames: frames.into(),
            dimensions,
            frame_rate,
        }
    }
}

impl FrameSource for BufferSource {
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }
}

/// In-memory sink that keeps every written frame.
#[derive(Default)]
pub struct BufferSink {
    pub frames: Vec<RgbImage>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for BufferSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

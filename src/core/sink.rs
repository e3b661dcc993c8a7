use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::VideoWriter,
};
use thiserror::Error;

use crate::core::params::OUTPUT_FOURCC;
use crate::core::source::VideoMeta;

#[derive(Debug, Error)]
pub enum SinkError {
    /// No encoder accepted the codec, rate, or geometry.
    #[error("failed to create output video {0}")]
    Create(String),

    /// The encoder backend failed outright.
    #[error(transparent)]
    Backend(#[from] opencv::Error),
}

/// Order-preserving encoder for the annotated frames. Dimensions and frame
/// rate come from the source unchanged.
pub struct VideoSink {
    writer: VideoWriter,
}

impl VideoSink {
    pub fn create(path: &str, meta: &VideoMeta) -> Result<Self, SinkError> {
        let [c0, c1, c2, c3] = OUTPUT_FOURCC;
        let fourcc = VideoWriter::fourcc(c0, c1, c2, c3)?;
        let writer = VideoWriter::new(
            path,
            fourcc,
            meta.fps,
            Size::new(meta.width, meta.height),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(SinkError::Create(path.to_string()));
        }
        Ok(Self { writer })
    }

    /// Appends one frame to the container.
    pub fn write(&mut self, frame: &Mat) -> Result<(), SinkError> {
        self.writer.write(frame)?;
        Ok(())
    }

    /// Finalizes the container. A run that wrote nothing still leaves a
    /// valid zero-frame file.
    pub fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.release()?;
        Ok(())
    }
}

use opencv::{core::Mat, prelude::*, videoio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The file is missing, unreadable, or no decode backend accepts it.
    #[error("failed to open video file {0}")]
    Open(String),

    /// The container opened but reports dimensions no decoder can produce.
    #[error("video {path} reports unusable geometry {width}x{height}")]
    BadGeometry {
        path: String,
        width: i32,
        height: i32,
    },

    /// The decode backend failed outright.
    #[error(transparent)]
    Backend(#[from] opencv::Error),
}

/// Stream metadata captured once at open and copied verbatim to the sink.
#[derive(Clone, Copy, Debug)]
pub struct VideoMeta {
    pub width: i32,
    pub height: i32,
    pub fps: f64,
}

/// Sequential decoder over one video file. One frame at a time, no seeking.
#[derive(Debug)]
pub struct VideoSource {
    capture: videoio::VideoCapture,
    meta: VideoMeta,
}

impl VideoSource {
    /// Opens `path` and reads its stream metadata. CAP_ANY lets OpenCV pick
    /// the platform decode backend.
    pub fn open(path: &str) -> Result<Self, SourceError> {
        let capture = videoio::VideoCapture::from_file(path, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(SourceError::Open(path.to_string()));
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        if width <= 0 || height <= 0 {
            return Err(SourceError::BadGeometry {
                path: path.to_string(),
                width,
                height,
            });
        }

        Ok(Self {
            capture,
            meta: VideoMeta { width, height, fps },
        })
    }

    pub fn meta(&self) -> &VideoMeta {
        &self.meta
    }

    /// Decodes the next frame into `frame`, reusing its allocation. `false`
    /// means end of stream, the sole loop-termination signal.
    pub fn read_into(&mut self, frame: &mut Mat) -> Result<bool, SourceError> {
        if !self.capture.read(frame)? {
            return Ok(false);
        }
        // Some backends signal the tail of the stream with an empty frame.
        Ok(!frame.empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_open_error() {
        let err = VideoSource::open("/no/such/path/clip.avi").unwrap_err();
        assert!(matches!(err, SourceError::Open(_)));
    }
}

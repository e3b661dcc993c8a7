use anyhow::{Context, Result};
use opencv::{
    core::{self, Mat, Vector},
    imgproc,
    prelude::*,
};

use crate::core::draw;
use crate::core::sink::VideoSink;
use crate::core::source::{VideoMeta, VideoSource};
use crate::core::tracking;

/// Counters reported after a run.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunStats {
    pub frames_written: u64,
    pub vectors_drawn: u64,
}

/// Owns every buffer the per-frame step mutates: the decoded frame, the
/// working color frame the vectors are drawn on, the two-slot grayscale ring
/// and each slot's flow pyramid. Allocated once, overwritten every iteration.
pub struct FlowPipeline {
    decoded: Mat,
    color: Mat,
    gray: [Mat; 2],
    pyramids: [Vector<Mat>; 2],
    pyramid_levels: [i32; 2],
    // Slot holding the most recently decoded frame; the other slot holds the
    // one immediately prior.
    newest: usize,
    frames_seen: u64,
}

impl FlowPipeline {
    pub fn new(meta: &VideoMeta) -> Result<Self> {
        // Gray slots start zeroed so the pre-first-frame slot never holds
        // garbage.
        let gray = [
            Mat::zeros(meta.height, meta.width, core::CV_8UC1)?.to_mat()?,
            Mat::zeros(meta.height, meta.width, core::CV_8UC1)?.to_mat()?,
        ];
        Ok(Self {
            decoded: Mat::default(),
            color: Mat::default(),
            gray,
            pyramids: [Vector::new(), Vector::new()],
            pyramid_levels: [0, 0],
            newest: 1,
            frames_seen: 0,
        })
    }

    /// Drives the loop to end-of-stream, writing one annotated frame per
    /// decoded frame. One frame is fully read, processed and written before
    /// the next is read.
    pub fn run(&mut self, source: &mut VideoSource, sink: &mut VideoSink) -> Result<RunStats> {
        let mut stats = RunStats::default();
        loop {
            if !source
                .read_into(&mut self.decoded)
                .context("reading input frame")?
            {
                break; // normal end of stream
            }

            let vectors = self.step().context("processing frame")?;
            sink.write(&self.color).context("writing output frame")?;

            stats.frames_written += 1;
            stats.vectors_drawn += vectors;
        }
        Ok(stats)
    }

    /// One iteration: rotate the decoded frame into the ring, then detect,
    /// track and draw against the prior frame. Returns the drawn count.
    fn step(&mut self) -> Result<u64> {
        self.rotate_in()?;
        self.frames_seen += 1;
        if self.frames_seen < 2 {
            // No prior frame yet; the frame goes out unannotated.
            return Ok(0);
        }

        let corners = tracking::detect_corners(&self.gray[self.newest])?;

        let prior = 1 - self.newest;
        // Flow runs newest -> prior, so each segment points from a corner in
        // the new frame to its match in the previous one.
        let max_level = self.pyramid_levels[self.newest].min(self.pyramid_levels[prior]);
        let tracks = tracking::track(
            &self.pyramids[self.newest],
            &self.pyramids[prior],
            max_level,
            &corners,
        )?;

        Ok(draw::draw_tracks(&mut self.color, &tracks)?)
    }

    /// Slot rotation: the former newest slot becomes the prior one, and the
    /// freed slot takes the new frame's grayscale conversion and pyramid.
    fn rotate_in(&mut self) -> Result<()> {
        self.decoded.copy_to(&mut self.color)?;

        self.newest = 1 - self.newest;
        imgproc::cvt_color(
            &self.decoded,
            &mut self.gray[self.newest],
            imgproc::COLOR_BGR2GRAY,
            0,
        )?;
        self.pyramid_levels[self.newest] =
            tracking::build_pyramid(&self.gray[self.newest], &mut self.pyramids[self.newest])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::Scalar;

    fn meta(width: i32, height: i32) -> VideoMeta {
        VideoMeta {
            width,
            height,
            fps: 25.0,
        }
    }

    fn solid_frame(width: i32, height: i32, value: f64) -> Mat {
        Mat::new_rows_cols_with_default(height, width, core::CV_8UC3, Scalar::all(value)).unwrap()
    }

    fn gray_level(m: &Mat) -> u8 {
        *m.at_2d::<u8>(0, 0).unwrap()
    }

    #[test]
    fn rotation_alternates_slots_and_keeps_the_prior_frame() {
        let mut p = FlowPipeline::new(&meta(32, 32)).unwrap();

        p.decoded = solid_frame(32, 32, 10.0);
        p.rotate_in().unwrap();
        let first_slot = p.newest;
        assert_eq!(gray_level(&p.gray[p.newest]), 10);

        p.decoded = solid_frame(32, 32, 200.0);
        p.rotate_in().unwrap();
        assert_eq!(p.newest, 1 - first_slot);
        assert_eq!(gray_level(&p.gray[p.newest]), 200);
        assert_eq!(gray_level(&p.gray[1 - p.newest]), 10);
    }

    #[test]
    fn first_frame_is_written_unannotated() {
        let mut p = FlowPipeline::new(&meta(32, 32)).unwrap();
        p.decoded = solid_frame(32, 32, 128.0);
        let drawn = p.step().unwrap();
        assert_eq!(drawn, 0);
        let decoded_bytes = p.decoded.data_bytes().unwrap().to_vec();
        assert_eq!(p.color.data_bytes().unwrap(), decoded_bytes.as_slice());
    }

    #[test]
    fn featureless_frames_draw_no_vectors() {
        let mut p = FlowPipeline::new(&meta(32, 32)).unwrap();
        for _ in 0..3 {
            p.decoded = solid_frame(32, 32, 128.0);
            assert_eq!(p.step().unwrap(), 0);
        }
    }
}

//! Corner detection and pyramidal Lucas-Kanade flow, delegated to OpenCV.

use opencv::{
    core::{self, Mat, Point2f, Size, TermCriteria, Vector},
    imgproc,
    prelude::*,
    video,
};

use crate::core::params::{
    DETECT_BLOCK_SIZE, HARRIS_K, MAX_CORNERS, MIN_CORNER_DISTANCE, PYRAMID_LEVELS, QUALITY_LEVEL,
    TERM_EPSILON, TERM_MAX_ITER, WINDOW_SIZE,
};

/// One corner tracked between consecutive frames. `error` is only
/// meaningful while `found` is set.
#[derive(Clone, Copy, Debug)]
pub struct TrackedPoint {
    pub from: Point2f,
    pub to: Point2f,
    pub found: bool,
    pub error: f32,
}

fn term_criteria() -> opencv::Result<TermCriteria> {
    TermCriteria::new(
        core::TermCriteria_COUNT + core::TermCriteria_EPS,
        TERM_MAX_ITER,
        TERM_EPSILON,
    )
}

fn window() -> Size {
    Size::new(WINDOW_SIZE, WINDOW_SIZE)
}

/// Shi-Tomasi detection followed by sub-pixel refinement. The library clamps
/// the result to `MAX_CORNERS`; refinement is skipped when nothing was found.
pub fn detect_corners(gray: &Mat) -> opencv::Result<Vector<Point2f>> {
    let mut corners = Vector::new();
    imgproc::good_features_to_track(
        gray,
        &mut corners,
        MAX_CORNERS,
        QUALITY_LEVEL,
        MIN_CORNER_DISTANCE,
        &core::no_array(),
        DETECT_BLOCK_SIZE,
        false,
        HARRIS_K,
    )?;

    if !corners.is_empty() {
        imgproc::corner_sub_pix(
            gray,
            &mut corners,
            window(),
            Size::new(-1, -1),
            term_criteria()?,
        )?;
    }

    Ok(corners)
}

/// Builds the reusable flow pyramid for one grayscale frame, returning the
/// level count actually built (lower than requested for small frames).
pub fn build_pyramid(gray: &Mat, pyramid: &mut Vector<Mat>) -> opencv::Result<i32> {
    pyramid.clear();
    // Level 0 must not alias the rotating grayscale slot.
    video::build_optical_flow_pyramid(
        gray,
        pyramid,
        window(),
        PYRAMID_LEVELS,
        true,
        core::BORDER_REFLECT_101,
        core::BORDER_CONSTANT,
        false,
    )
}

/// Pyramidal Lucas-Kanade between two prebuilt pyramids: each corner of the
/// frame behind `from_pyr` is matched into the frame behind `to_pyr`.
/// `max_level` must not exceed either pyramid's built level count.
pub fn track(
    from_pyr: &Vector<Mat>,
    to_pyr: &Vector<Mat>,
    max_level: i32,
    corners: &Vector<Point2f>,
) -> opencv::Result<Vec<TrackedPoint>> {
    if corners.is_empty() {
        return Ok(Vec::new());
    }

    let mut matched = Vector::<Point2f>::new();
    let mut status = Vector::<u8>::new();
    let mut errors = Vector::<f32>::new();
    video::calc_optical_flow_pyr_lk(
        from_pyr,
        to_pyr,
        corners,
        &mut matched,
        &mut status,
        &mut errors,
        window(),
        max_level,
        term_criteria()?,
        0,
        1e-4,
    )?;

    let mut tracks = Vec::with_capacity(corners.len());
    for i in 0..corners.len() {
        tracks.push(TrackedPoint {
            from: corners.get(i)?,
            to: matched.get(i)?,
            found: status.get(i)? != 0,
            error: errors.get(i)?,
        });
    }
    Ok(tracks)
}

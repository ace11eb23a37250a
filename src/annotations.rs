//! Annotation results produced by vision processors
//!
//! These are the values a processor hands to the overlay. Coordinates are in
//! source-frame pixels; the overlay maps them onto its viewport using the
//! dimensions it was last given.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    #[must_use]
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
        }
    }

    #[must_use]
    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    #[must_use]
    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.xmin + self.width / 2., self.ymin + self.height / 2.)
    }
}

/// One pose landmark; `z` is depth relative to the hips, same scale as `x`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub in_frame_likelihood: f32,
}

impl Landmark {
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32, in_frame_likelihood: f32) -> Self {
        Self {
            x,
            y,
            z,
            in_frame_likelihood,
        }
    }
}

/// Detected pose
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseAnnotation {
    pub landmarks: Vec<Landmark>,
    /// Labels from pose classification (e.g. repetition counters), when enabled
    pub classification: Vec<String>,
}

/// Detected face
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceAnnotation {
    pub bounds: BoundingBox,
    pub tracking_id: Option<u32>,
    pub smiling_probability: Option<f32>,
    pub left_eye_open_probability: Option<f32>,
    pub right_eye_open_probability: Option<f32>,
}

/// A single drawable detection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Annotation {
    Pose(PoseAnnotation),
    Face(FaceAnnotation),
}

/// Everything a processor found in one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Annotations {
    pub frame_number: u64,
    pub items: Vec<Annotation>,
}

impl Annotations {
    #[must_use]
    pub fn new(frame_number: u64) -> Self {
        Self {
            frame_number,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, annotation: Annotation) -> Self {
        self.items.push(annotation);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn poses(&self) -> impl Iterator<Item = &PoseAnnotation> {
        self.items.iter().filter_map(|item| match item {
            Annotation::Pose(pose) => Some(pose),
            Annotation::Face(_) => None,
        })
    }

    pub fn faces(&self) -> impl Iterator<Item = &FaceAnnotation> {
        self.items.iter().filter_map(|item| match item {
            Annotation::Face(face) => Some(face),
            Annotation::Pose(_) => None,
        })
    }
}

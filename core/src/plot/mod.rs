//! Contour figure of the distortion overlaid on the MRI
//!
//! The figure is an A4 portrait SVG document with central sagittal, coronal
//! and axial slices of the MRI. Slice images are embedded as PNG; contours
//! and labels are vector graphics.

pub mod isoline;
mod figure;

pub use figure::{contour, title_for, Figure, Plane, CONTOUR_COLOURS, CONTOUR_LEVELS};

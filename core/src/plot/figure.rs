use super::isoline::isolines;
use crate::error::{GeomqaError, Result};
use crate::volume::{percentile, Volume};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageBuffer, ImageFormat, Luma};
use ndarray::ArrayView2;
use std::io::Cursor;
use std::path::Path;
use svg::node::element::path::Data;
use svg::node::element::{Group, Image, Path as SvgPath, Rectangle, Text};
use svg::node::Text as TextNode;
use svg::Document;

/// Distortion contour levels in mm
pub const CONTOUR_LEVELS: [f64; 11] = [0.1, 0.5, 1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 10.0, 15.0, 20.0];

/// Colour of each contour level
pub const CONTOUR_COLOURS: [&str; 11] = [
    "gray", "green", "green", "orange", "red", "red", "red", "red", "purple", "purple", "purple",
];

const NOTE: [&str; 8] = [
    "The contours show the distortion of the MRI",
    "in mm overlayed on the MRI. Distortion is",
    "quantified as the magnitude of the",
    "displacement field from the non-rigid",
    "registration of the MRI to a CT image of",
    "the phantom.",
    "If no contours are shown",
    "distortions are <0.1 mm.",
];

// A4 portrait in hundredths of an inch
const PAGE_WIDTH: f32 = 827.0;
const PAGE_HEIGHT: f32 = 1170.0;
const TITLE_HEIGHT: f32 = 100.0;
const MARGIN: f32 = 40.0;
const LABEL_SPACE: f32 = 22.0;

/// Slice plane through the centre of the volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Sagittal,
    Coronal,
    Axial,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Sagittal, Plane::Coronal, Plane::Axial];

    /// Volume axis perpendicular to the plane
    fn normal_axis(&self) -> usize {
        match self {
            Plane::Sagittal => 0,
            Plane::Coronal => 1,
            Plane::Axial => 2,
        }
    }

    /// Volume axes shown horizontally and vertically
    fn display_axes(&self) -> (usize, usize) {
        match self {
            Plane::Sagittal => (1, 2),
            Plane::Coronal => (0, 2),
            Plane::Axial => (0, 1),
        }
    }

    /// Orientation labels at the top, right, bottom and left of the slice
    pub fn labels(&self) -> [&'static str; 4] {
        match self {
            Plane::Sagittal => ["S", "A", "I", "P"],
            Plane::Coronal => ["S", "R", "I", "L"],
            Plane::Axial => ["A", "R", "P", "L"],
        }
    }

    /// Grid cell (column, row) of the plane on the page
    fn cell(&self) -> (usize, usize) {
        match self {
            Plane::Sagittal => (0, 0),
            Plane::Coronal => (1, 0),
            Plane::Axial => (0, 1),
        }
    }
}

/// Axis-aligned box on the page
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Frame {
    fn cell(column: usize, row: usize) -> Self {
        let width = (PAGE_WIDTH - 3.0 * MARGIN) / 2.0;
        let height = (PAGE_HEIGHT - TITLE_HEIGHT - 3.0 * MARGIN) / 2.0;
        Self {
            x: MARGIN + column as f32 * (width + MARGIN),
            y: TITLE_HEIGHT + MARGIN + row as f32 * (height + MARGIN),
            width,
            height,
        }
    }

    /// Largest box of the given physical aspect ratio centred in this one
    fn fit(&self, physical_width: f32, physical_height: f32) -> Self {
        let inner_width = self.width - 2.0 * LABEL_SPACE;
        let inner_height = self.height - 2.0 * LABEL_SPACE;
        let scale = (inner_width / physical_width).min(inner_height / physical_height);
        let width = physical_width * scale;
        let height = physical_height * scale;
        Self {
            x: self.x + (self.width - width) / 2.0,
            y: self.y + (self.height - height) / 2.0,
            width,
            height,
        }
    }
}

/// Three orthogonal slices of a base image overlaid with distortion contours
///
/// The page is laid out as
///
/// ```text
///          Figure Title
///
///   +---------+   +---------+
///   |   Sag   |   |   Cor   |
///   +---------+   +---------+
///   +---------+
///   |  Axial  |    note
///   +---------+
/// ```
pub struct Figure<'a> {
    base: &'a Volume,
    overlay: &'a Volume,
    title: String,
}

impl<'a> Figure<'a> {
    /// Creates a figure; `base` and `overlay` must share the same voxel grid
    pub fn new(base: &'a Volume, overlay: &'a Volume, title: impl Into<String>) -> Result<Self> {
        if base.shape() != overlay.shape() {
            return Err(GeomqaError::InvalidVolume(format!(
                "base shape {:?} does not match contour shape {:?}",
                base.shape(),
                overlay.shape()
            )));
        }
        if base.shape().iter().any(|&n| n == 0) {
            return Err(GeomqaError::InvalidVolume("empty volume".to_string()));
        }

        Ok(Self {
            base,
            overlay,
            title: title.into(),
        })
    }

    /// Builds the SVG document
    pub fn document(&self) -> Result<Document> {
        let values = self.base.values();
        let low = percentile(&values, 1.0).unwrap_or(0.0);
        let high = percentile(&values, 99.0).unwrap_or(1.0);

        let mut document = Document::new()
            .set("width", "210mm")
            .set("height", "297mm")
            .set("viewBox", format!("0 0 {} {}", PAGE_WIDTH, PAGE_HEIGHT))
            .set("font-family", "sans-serif")
            .add(
                Rectangle::new()
                    .set("width", PAGE_WIDTH)
                    .set("height", PAGE_HEIGHT)
                    .set("fill", "white"),
            )
            .add(
                text(&self.title, PAGE_WIDTH / 2.0, TITLE_HEIGHT / 2.0, "middle")
                    .set("font-size", 19)
                    .set("font-weight", "bold"),
            );

        for plane in Plane::ALL {
            document = document.add(self.panel(plane, low, high)?);
        }

        Ok(document.add(note(Frame::cell(1, 1))))
    }

    /// Writes the figure to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        svg::save(path, &self.document()?)?;
        Ok(())
    }

    fn panel(&self, plane: Plane, low: f64, high: f64) -> Result<Group> {
        let base = self.base.central_slice(plane.normal_axis());
        let overlay = self.overlay.central_slice(plane.normal_axis());
        let (rows, cols) = base.dim();

        let (h_axis, v_axis) = plane.display_axes();
        let (column, row) = plane.cell();
        let frame = Frame::cell(column, row).fit(
            cols as f32 * self.base.zooms[h_axis] as f32,
            rows as f32 * self.base.zooms[v_axis] as f32,
        );

        let png = encode_png(base, low, high)?;
        let mut group = Group::new().add(
            Image::new()
                .set("x", frame.x)
                .set("y", frame.y)
                .set("width", frame.width)
                .set("height", frame.height)
                .set("preserveAspectRatio", "none")
                .set("style", "image-rendering:pixelated")
                .set("href", format!("data:image/png;base64,{}", STANDARD.encode(png))),
        );

        // grid point (c, r) is the centre of pixel c, counted up from the bottom row
        let scale_x = frame.width / cols as f32;
        let scale_y = frame.height / rows as f32;
        let to_page = |(x, y): (f64, f64)| -> (f32, f32) {
            (
                frame.x + (x as f32 + 0.5) * scale_x,
                frame.y + frame.height - (y as f32 + 0.5) * scale_y,
            )
        };

        for (level, colour) in CONTOUR_LEVELS.iter().zip(CONTOUR_COLOURS) {
            let segments = isolines(overlay, *level);
            if segments.is_empty() {
                continue;
            }

            let mut data = Data::new();
            for [start, end] in &segments {
                data = data.move_to(to_page(*start)).line_to(to_page(*end));
            }
            group = group.add(
                SvgPath::new()
                    .set("d", data)
                    .set("fill", "none")
                    .set("stroke", colour)
                    .set("stroke-width", 1.2),
            );

            let [start, end] = segments[segments.len() / 2];
            let (x, y) = to_page(((start.0 + end.0) / 2.0, (start.1 + end.1) / 2.0));
            group = group.add(
                text(&format!("{:.1}", level), x, y, "middle")
                    .set("font-size", 10)
                    .set("fill", colour)
                    .set("stroke", "white")
                    .set("stroke-width", 0.3),
            );
        }

        let [top, right, bottom, left] = plane.labels();
        let middle_x = frame.x + frame.width / 2.0;
        let middle_y = frame.y + frame.height / 2.0;
        group = group
            .add(text(top, middle_x, frame.y - 6.0, "middle"))
            .add(text(right, frame.x + frame.width + 6.0, middle_y + 5.0, "start"))
            .add(text(bottom, middle_x, frame.y + frame.height + 16.0, "middle"))
            .add(text(left, frame.x - 6.0, middle_y + 5.0, "end"));

        Ok(group)
    }
}

/// Loads a base image and a contour image and writes the figure to `out`
///
/// The figure is titled after the base image file name.
pub fn contour(base_path: &Path, contour_path: &Path, out: &Path) -> Result<()> {
    let base = Volume::load(base_path)?;
    let overlay = Volume::load(contour_path)?;
    Figure::new(&base, &overlay, title_for(base_path))?.save(out)
}

/// Figure title for an MRI file
pub fn title_for(mri: &Path) -> String {
    let name = mri
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("Distortion of {}", name)
}

/// Greyscale PNG of a slice, windowed to `[low, high]`, bottom row last
fn encode_png(slice: ArrayView2<'_, f64>, low: f64, high: f64) -> Result<Vec<u8>> {
    let (rows, cols) = slice.dim();
    let range = high - low;

    let img = ImageBuffer::from_fn(cols as u32, rows as u32, |x, y| {
        let value = slice[[rows - 1 - y as usize, x as usize]];
        let scaled = if range > 0.0 && !value.is_nan() {
            ((value - low) / range).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Luma([(scaled * 255.0).round() as u8])
    });

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

fn text(content: &str, x: f32, y: f32, anchor: &str) -> Text {
    Text::new()
        .set("x", x)
        .set("y", y)
        .set("text-anchor", anchor)
        .add(TextNode::new(escape_xml(content)))
}

/// Text nodes are written verbatim, so markup characters must be escaped
fn escape_xml(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn note(cell: Frame) -> Group {
    let line_height = 18.0;
    let box_height = (NOTE.len() as f32 + 2.0) * line_height;
    let top = cell.y + (cell.height - box_height) / 2.0;

    let mut group = Group::new().add(
        Rectangle::new()
            .set("x", cell.x + 10.0)
            .set("y", top)
            .set("width", cell.width - 20.0)
            .set("height", box_height)
            .set("rx", 15)
            .set("fill", "gray")
            .set("fill-opacity", 0.5),
    );

    let mut y = top + 1.5 * line_height;
    for (i, line) in NOTE.iter().enumerate() {
        // blank line before the last paragraph
        if i == 6 {
            y += line_height / 2.0;
        }
        group = group.add(
            text(line, cell.x + cell.width / 2.0, y, "middle")
                .set("font-size", 13)
                .set("font-style", "italic"),
        );
        y += line_height;
    }

    group
}

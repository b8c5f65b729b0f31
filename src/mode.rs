//! Selectable effect modes and the table that maps each one to its renderer.

use std::fmt;

use image::{GrayImage, RgbImage};
use imageproc::rect::Rect;

use crate::effects::{self, DEFAULT_CARTOON_LEVELS};
use crate::filters;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    PassThrough,
    NativeGrayscale,
    Desaturate,
    Sepia,
    Blur,
    SobelX,
    SobelY,
    Magnitude,
    Quantize,
    FaceBoxes,
    Spotlight,
    Neon,
    Cartoon,
    Depth,
    Fog,
}

/// Auxiliary signals a mode consumes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Needs {
    pub faces: bool,
    pub depth: bool,
}

impl Needs {
    const NONE: Needs = Needs {
        faces: false,
        depth: false,
    };
    const FACES: Needs = Needs {
        faces: true,
        depth: false,
    };
    const DEPTH: Needs = Needs {
        faces: false,
        depth: true,
    };
}

/// Tunable effect parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectParams {
    pub quantize_levels: u32,
    pub cartoon_levels: u32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            quantize_levels: 10,
            cartoon_levels: DEFAULT_CARTOON_LEVELS,
        }
    }
}

/// Everything a renderer may read for one frame.
pub struct EffectInput<'a> {
    pub frame: &'a RgbImage,
    pub faces: &'a [Rect],
    pub depth: Option<&'a GrayImage>,
    pub params: &'a EffectParams,
}

pub type RenderFn = fn(&EffectInput<'_>) -> RgbImage;

pub struct ModeEntry {
    pub mode: Mode,
    pub key: char,
    pub label: &'static str,
    pub needs: Needs,
    pub render: RenderFn,
}

pub static MODE_TABLE: [ModeEntry; 15] = [
    ModeEntry {
        mode: Mode::PassThrough,
        key: 'c',
        label: "Color",
        needs: Needs::NONE,
        render: render_pass_through,
    },
    ModeEntry {
        mode: Mode::NativeGrayscale,
        key: 'g',
        label: "Grayscale",
        needs: Needs::NONE,
        render: render_luma,
    },
    ModeEntry {
        mode: Mode::Desaturate,
        key: 'h',
        label: "Desaturate",
        needs: Needs::NONE,
        render: render_desaturate,
    },
    ModeEntry {
        mode: Mode::Sepia,
        key: 'p',
        label: "Sepia",
        needs: Needs::NONE,
        render: render_sepia,
    },
    ModeEntry {
        mode: Mode::Blur,
        key: 'b',
        label: "Blur",
        needs: Needs::NONE,
        render: render_blur,
    },
    ModeEntry {
        mode: Mode::SobelX,
        key: 'x',
        label: "Sobel X",
        needs: Needs::NONE,
        render: render_sobel_x,
    },
    ModeEntry {
        mode: Mode::SobelY,
        key: 'y',
        label: "Sobel Y",
        needs: Needs::NONE,
        render: render_sobel_y,
    },
    ModeEntry {
        mode: Mode::Magnitude,
        key: 'm',
        label: "Gradient magnitude",
        needs: Needs::NONE,
        render: render_magnitude,
    },
    ModeEntry {
        mode: Mode::Quantize,
        key: 'l',
        label: "Blur + quantize",
        needs: Needs::NONE,
        render: render_quantize,
    },
    ModeEntry {
        mode: Mode::FaceBoxes,
        key: 'f',
        label: "Faces",
        needs: Needs::FACES,
        render: render_face_boxes,
    },
    ModeEntry {
        mode: Mode::Spotlight,
        key: '1',
        label: "Spotlight",
        needs: Needs::FACES,
        render: render_spotlight,
    },
    ModeEntry {
        mode: Mode::Neon,
        key: '2',
        label: "Neon edges",
        needs: Needs::NONE,
        render: render_neon,
    },
    ModeEntry {
        mode: Mode::Cartoon,
        key: '3',
        label: "Cartoon",
        needs: Needs::NONE,
        render: render_cartoon,
    },
    ModeEntry {
        mode: Mode::Depth,
        key: 'd',
        label: "Depth",
        needs: Needs::DEPTH,
        render: render_depth,
    },
    ModeEntry {
        mode: Mode::Fog,
        key: '4',
        label: "Digital fog",
        needs: Needs::DEPTH,
        render: render_fog,
    },
];

impl Mode {
    pub fn from_key(key: char) -> Option<Mode> {
        MODE_TABLE.iter().find(|entry| entry.key == key).map(|entry| entry.mode)
    }

    pub fn entry(self) -> &'static ModeEntry {
        // every variant has exactly one row
        MODE_TABLE
            .iter()
            .find(|entry| entry.mode == self)
            .unwrap_or(&MODE_TABLE[0])
    }

    pub fn key(self) -> char {
        self.entry().key
    }

    pub fn label(self) -> &'static str {
        self.entry().label
    }

    pub fn needs(self) -> Needs {
        self.entry().needs
    }

    pub fn render(self, input: &EffectInput<'_>) -> RgbImage {
        (self.entry().render)(input)
    }

    pub fn all() -> impl Iterator<Item = Mode> {
        MODE_TABLE.iter().map(|entry| entry.mode)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.key())
    }
}

fn render_pass_through(input: &EffectInput<'_>) -> RgbImage {
    input.frame.clone()
}

fn render_luma(input: &EffectInput<'_>) -> RgbImage {
    filters::luma_grayscale(input.frame)
}

fn render_desaturate(input: &EffectInput<'_>) -> RgbImage {
    filters::desaturate(input.frame)
}

fn render_sepia(input: &EffectInput<'_>) -> RgbImage {
    filters::sepia(input.frame)
}

fn render_blur(input: &EffectInput<'_>) -> RgbImage {
    filters::blur5x5_separable(input.frame)
}

fn render_sobel_x(input: &EffectInput<'_>) -> RgbImage {
    filters::abs_saturate(&filters::sobel_x(input.frame))
}

fn render_sobel_y(input: &EffectInput<'_>) -> RgbImage {
    filters::abs_saturate(&filters::sobel_y(input.frame))
}

fn render_magnitude(input: &EffectInput<'_>) -> RgbImage {
    filters::magnitude(&filters::sobel_x(input.frame), &filters::sobel_y(input.frame))
}

fn render_quantize(input: &EffectInput<'_>) -> RgbImage {
    filters::blur_quantize(input.frame, input.params.quantize_levels)
}

fn render_face_boxes(input: &EffectInput<'_>) -> RgbImage {
    effects::draw_face_boxes(input.frame, input.faces)
}

fn render_spotlight(input: &EffectInput<'_>) -> RgbImage {
    effects::spotlight(input.frame, input.faces)
}

fn render_neon(input: &EffectInput<'_>) -> RgbImage {
    effects::neon_edges(input.frame)
}

fn render_cartoon(input: &EffectInput<'_>) -> RgbImage {
    effects::cartoon(input.frame, input.params.cartoon_levels)
}

fn render_depth(input: &EffectInput<'_>) -> RgbImage {
    match input.depth {
        Some(depth) => effects::depth_view(depth),
        None => input.frame.clone(),
    }
}

fn render_fog(input: &EffectInput<'_>) -> RgbImage {
    match input.depth {
        Some(depth) => effects::digital_fog(input.frame, depth),
        None => input.frame.clone(),
    }
}

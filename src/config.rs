use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::mode::{EffectParams, Mode};
use crate::webcam::CameraRequest;

#[derive(Debug, Parser)]
#[command(name = "vidfx")]
#[command(about = "Live video effects on a webcam feed")]
#[command(version)]
#[command(subcommand_required = false)]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Blazeface ONNX model
    #[arg(long, global = true, default_value = "data/blazeface.onnx")]
    pub face_model: PathBuf,

    /// Blazeface anchors (.npy)
    #[arg(long, global = true, default_value = "data/anchors.npy")]
    pub face_anchors: PathBuf,

    /// Depth model candidates, tried in order
    #[arg(
        long = "depth-model",
        global = true,
        default_values = ["../data/depth_anything_v2_vits.onnx", "data/depth_anything_v2_vits.onnx"]
    )]
    pub depth_models: Vec<PathBuf>,

    /// TrueType font for the warning banner text
    #[arg(long, global = true)]
    pub font: Option<PathBuf>,

    #[arg(long, global = true, default_value = "data")]
    pub screenshot_dir: PathBuf,

    #[arg(long, global = true, default_value_t = 10, value_parser = levels_parser())]
    pub quantize_levels: u32,

    #[arg(long, global = true, default_value_t = 10, value_parser = levels_parser())]
    pub cartoon_levels: u32,

    /// Initial mode, by key (c, g, h, p, b, x, y, m, l, f, 1, 2, 3, d, 4)
    #[arg(long, global = true, default_value = "c", value_parser = parse_mode)]
    pub mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Process frames from a webcam (default)
    Live(LiveArgs),
    /// Process still images in a loop instead of a camera
    Files {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Time the naive and separable blur on one image
    BenchBlur {
        image: PathBuf,
        #[arg(short, long, default_value_t = 20)]
        iterations: u32,
    },
}

#[derive(Debug, Clone, Args)]
pub struct LiveArgs {
    #[arg(short, long, default_value_t = 0)]
    pub camera: u32,
    #[arg(long, default_value_t = 1280)]
    pub width: u32,
    #[arg(long, default_value_t = 720)]
    pub height: u32,
    #[arg(long, default_value_t = 30)]
    pub fps: u32,
}

impl Default for LiveArgs {
    fn default() -> Self {
        Self {
            camera: 0,
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

impl LiveArgs {
    pub fn camera_request(&self) -> CameraRequest {
        CameraRequest {
            device: self.camera,
            width: self.width,
            height: self.height,
            fps: self.fps,
        }
    }
}

impl Config {
    /// The subcommand to run, `live` when none was given.
    pub fn resolved_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Live(LiveArgs::default()))
    }

    pub fn effect_params(&self) -> EffectParams {
        EffectParams {
            quantize_levels: self.quantize_levels,
            cartoon_levels: self.cartoon_levels,
        }
    }
}

fn levels_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=255)
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => {
            Mode::from_key(key).ok_or_else(|| format!("no mode bound to key '{}'", key))
        }
        _ => Err(format!("expected a single mode key, got '{}'", value)),
    }
}

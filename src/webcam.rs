// thin wrapper around openpnp_capture, plus a still-image source
use std::ffi::CStr;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use image::RgbImage;
use openpnp_sys::{CapContext, CapFormatID, CapStream};
use tracing::{info, warn};

use openpnp_capture_sys as openpnp_sys;

use crate::error::CaptureError;
use crate::pipeline::FrameSource;

const OPEN_RETRY_DELAY: Duration = Duration::from_secs(2);
const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRequest {
    pub device: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub id: CapFormatID,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Pick the format closest to the requested resolution, preferring the
/// requested frame rate on ties.
pub fn select_format(formats: &[FormatInfo], request: &CameraRequest) -> Option<FormatInfo> {
    formats.iter().copied().min_by_key(|f| {
        let pixels = |w: u32, h: u32| w as i64 * h as i64;
        (
            (pixels(f.width, f.height) - pixels(request.width, request.height)).abs(),
            (f.fps as i64 - request.fps as i64).abs(),
        )
    })
}

pub struct WebcamSource {
    ctx: CapContext,
    stream: CapStream,
    format: FormatInfo,
    buffer: Vec<u8>,
}

impl WebcamSource {
    /// Open a camera stream. Opening is retried once after a short pause, which
    /// gives the OS time to resolve a camera permission prompt.
    pub fn open(request: CameraRequest) -> Result<WebcamSource, CaptureError> {
        let ctx = unsafe { openpnp_sys::Cap_createContext() };
        if ctx.is_null() {
            return Err(CaptureError::Context);
        }

        match Self::open_in_context(ctx, request) {
            Ok(source) => Ok(source),
            Err(err) => {
                unsafe { openpnp_sys::Cap_releaseContext(ctx) };
                Err(err)
            }
        }
    }

    fn open_in_context(
        ctx: CapContext,
        request: CameraRequest,
    ) -> Result<WebcamSource, CaptureError> {
        let available = unsafe { openpnp_sys::Cap_getDeviceCount(ctx) };
        if request.device >= available {
            return Err(CaptureError::NoDevice {
                index: request.device,
                available,
            });
        }

        let formats = read_formats(ctx, request.device);
        let format =
            select_format(&formats, &request).ok_or(CaptureError::NoFormat(request.device))?;
        info!(
            device = %device_name(ctx, request.device),
            width = format.width,
            height = format.height,
            fps = format.fps,
            "opening camera"
        );

        let mut stream = unsafe { openpnp_sys::Cap_openStream(ctx, request.device, format.id) };
        if stream < 0 {
            warn!("camera did not open, retrying");
            thread::sleep(OPEN_RETRY_DELAY);
            stream = unsafe { openpnp_sys::Cap_openStream(ctx, request.device, format.id) };
        }
        if stream < 0 {
            return Err(CaptureError::StreamOpen(request.device));
        }

        Ok(WebcamSource {
            ctx,
            stream,
            format,
            buffer: vec![0u8; (format.width * format.height * 3) as usize],
        })
    }
}

impl FrameSource for WebcamSource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        let deadline = Instant::now() + FRAME_TIMEOUT;
        while unsafe { openpnp_sys::Cap_hasNewFrame(self.ctx, self.stream) } == 0 {
            if Instant::now() >= deadline {
                warn!("camera stopped delivering frames");
                return None;
            }
            thread::sleep(Duration::from_millis(1));
        }

        let res = unsafe {
            openpnp_sys::Cap_captureFrame(
                self.ctx,
                self.stream,
                self.buffer.as_mut_ptr() as *mut std::ffi::c_void,
                self.buffer.len() as u32,
            )
        };
        if res != openpnp_sys::CAPRESULT_OK {
            warn!(result = res, "frame capture failed");
            return None;
        }

        RgbImage::from_raw(self.format.width, self.format.height, self.buffer.clone())
    }
}

impl Drop for WebcamSource {
    fn drop(&mut self) {
        unsafe {
            openpnp_sys::Cap_closeStream(self.ctx, self.stream);
            openpnp_sys::Cap_releaseContext(self.ctx);
        }
    }
}

fn device_name(ctx: CapContext, device: u32) -> String {
    let name = unsafe { openpnp_sys::Cap_getDeviceName(ctx, device) };
    if name.is_null() {
        return format!("camera {}", device);
    }
    unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned()
}

fn read_formats(ctx: CapContext, device: u32) -> Vec<FormatInfo> {
    let count = unsafe { openpnp_sys::Cap_getNumFormats(ctx, device) };
    (0..count.max(0) as u32)
        .filter_map(|id| {
            let mut info: openpnp_sys::CapFormatInfo = unsafe { std::mem::zeroed() };
            let res = unsafe { openpnp_sys::Cap_getFormatInfo(ctx, device, id, &mut info) };
            (res == openpnp_sys::CAPRESULT_OK).then_some(FormatInfo {
                id,
                width: info.width,
                height: info.height,
                fps: info.fps,
            })
        })
        .collect()
}

/// Feeds still images as frames, optionally cycling through them forever at a
/// fixed interval.
pub struct ImageSequenceSource {
    frames: Vec<RgbImage>,
    next: usize,
    looping: bool,
    interval: Duration,
}

impl ImageSequenceSource {
    pub fn new(frames: Vec<RgbImage>, looping: bool) -> Self {
        Self {
            frames,
            next: 0,
            looping,
            interval: Duration::ZERO,
        }
    }

    pub fn from_paths(paths: &[PathBuf], looping: bool) -> Result<Self, CaptureError> {
        if paths.is_empty() {
            return Err(CaptureError::NoImages);
        }
        let frames = paths
            .iter()
            .map(|path| {
                image::open(path)
                    .map(|image| image.to_rgb8())
                    .map_err(|source| CaptureError::Load {
                        path: path.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(count = frames.len(), "loaded input images");
        Ok(Self::new(frames, looping))
    }

    /// Pause between frames, standing in for a device frame rate.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        if self.frames.is_empty() {
            return None;
        }
        if self.next >= self.frames.len() {
            if !self.looping {
                return None;
            }
            self.next = 0;
        }
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
        let frame = self.frames[self.next].clone();
        self.next += 1;
        Some(frame)
    }
}

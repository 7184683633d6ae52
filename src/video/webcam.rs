//! V4L2 webcam access.
//!
//! Currently, only V4L2 `VIDEO_CAPTURE` devices yielding JFIF JPEG or Motion
//! JPEG frames are supported.

use std::env;

use anyhow::bail;
use linuxvideo::{
    format::{FrameIntervals, FrameSizes, PixFormat, Pixelformat},
    stream::ReadStream,
    BufType, CapabilityFlags, Device, Fract,
};

use crate::image::{Image, Resolution};
use crate::timer::Timer;

const ENV_VAR_WEBCAM_NAME: &str = "POSEVIEW_WEBCAM_NAME";

/// Format negotiation options.
///
/// The requested resolution and frame rate are *ideals*: negotiation prefers
/// the smallest camera mode that covers them and falls back to the closest
/// available mode when nothing does.
#[derive(Default, Clone)]
pub struct WebcamOptions {
    name: Option<String>,
    resolution: Option<Resolution>,
    fps: Option<u32>,
}

impl WebcamOptions {
    /// Sets the name of the webcam device to open.
    ///
    /// If no webcam with the given name can be found, opening the webcam will
    /// result in an error.
    #[inline]
    pub fn name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Sets the ideal image resolution.
    #[inline]
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Sets the ideal frame rate.
    #[inline]
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }
}

#[derive(Clone, Copy)]
struct FrameFormat {
    resolution: Resolution,
    frame_interval: Fract,
}

impl FrameFormat {
    fn fps(&self) -> f32 {
        1.0 / self.frame_interval.as_f32()
    }
}

fn supported_formats(device: &Device, pixel_format: Pixelformat) -> anyhow::Result<Vec<FrameFormat>> {
    let mut formats = Vec::new();
    match device.frame_sizes(pixel_format)? {
        FrameSizes::Discrete(sizes) => {
            for size in sizes {
                let intervals =
                    match device.frame_intervals(pixel_format, size.width(), size.height())? {
                        FrameIntervals::Discrete(intervals) => intervals,
                        FrameIntervals::Stepwise(_) | FrameIntervals::Continuous(_) => {
                            bail!("stepwise or continuous frame rates are not supported")
                        }
                    };
                for rate in intervals {
                    formats.push(FrameFormat {
                        resolution: Resolution::new(size.width(), size.height()),
                        frame_interval: *rate.fract(),
                    });
                }
            }
        }
        FrameSizes::Stepwise(_) | FrameSizes::Continuous(_) => {
            bail!("stepwise or continuous resolutions are not supported");
        }
    }
    Ok(formats)
}

fn negotiate_format(device: &Device, options: &WebcamOptions) -> anyhow::Result<(PixFormat, Fract)> {
    let mut pixel_format = None;
    for format in device.formats(BufType::VIDEO_CAPTURE) {
        let format = format?;
        if format.pixelformat() == Pixelformat::JPEG || format.pixelformat() == Pixelformat::MJPG {
            pixel_format = Some(format.pixelformat());
            break;
        }
    }

    let Some(pixel_format) = pixel_format else {
        bail!("no supported pixel format found");
    };

    let formats = supported_formats(device, pixel_format)?;
    if formats.is_empty() {
        bail!("webcam reports no usable frame formats");
    }

    // Smallest mode covering the ideal resolution and frame rate; at equal
    // pixel counts, the higher frame rate wins.
    let covering = formats
        .iter()
        .filter(|fmt| {
            options.resolution.map_or(true, |want| {
                fmt.resolution.width() >= want.width() && fmt.resolution.height() >= want.height()
            }) && options.fps.map_or(true, |want| fmt.fps().round() >= want as f32)
        })
        .min_by_key(|fmt| (fmt.resolution.num_pixels(), fmt.frame_interval))
        .copied();

    let chosen = match covering {
        Some(fmt) => fmt,
        None => {
            // Nothing covers the ideal parameters; take the biggest mode the
            // camera has.
            log::debug!("no camera mode covers the requested parameters, falling back");
            formats
                .iter()
                .max_by_key(|fmt| fmt.resolution.num_pixels())
                .copied()
                .unwrap()
        }
    };

    Ok((
        PixFormat::new(
            chosen.resolution.width(),
            chosen.resolution.height(),
            pixel_format,
        ),
        chosen.frame_interval,
    ))
}

/// A webcam yielding a stream of [`Image`]s.
pub struct Webcam {
    stream: ReadStream,
    resolution: Resolution,
    t_dequeue: Timer,
    t_decode: Timer,
}

impl Webcam {
    /// Opens the first supported webcam found.
    ///
    /// This function can block for a significant amount of time while the
    /// webcam initializes (on the order of hundreds of milliseconds).
    pub fn open(options: WebcamOptions) -> anyhow::Result<Self> {
        if let Ok(name) = env::var(ENV_VAR_WEBCAM_NAME) {
            log::debug!(
                "webcam override: `{}` is set to '{}'",
                ENV_VAR_WEBCAM_NAME,
                name,
            );
        }
        for res in linuxvideo::list()? {
            match res {
                Ok(dev) => match Self::open_impl(dev, &options) {
                    Ok(Some(webcam)) => return Ok(webcam),
                    Ok(None) => {}
                    Err(e) => {
                        log::debug!("{}", e);
                    }
                },
                Err(e) => {
                    log::warn!("{}", e);
                }
            }
        }

        bail!("no supported webcam device found")
    }

    fn open_impl(dev: Device, options: &WebcamOptions) -> anyhow::Result<Option<Self>> {
        let caps = dev.capabilities()?;
        let cam_name_from_env = env::var(ENV_VAR_WEBCAM_NAME).ok();
        if let Some(name) = &options.name.as_deref().or(cam_name_from_env.as_deref()) {
            if caps.card() != *name {
                return Ok(None);
            }
        }

        let cap_flags = caps.device_capabilities();
        let path = dev.path()?;
        log::debug!(
            "device {} ({}) capabilities: {:?}",
            caps.card(),
            path.display(),
            cap_flags,
        );

        if !cap_flags.contains(CapabilityFlags::VIDEO_CAPTURE) {
            return Ok(None);
        }

        let (pixfmt, fract) = negotiate_format(&dev, options)?;

        let capture = dev.video_capture(pixfmt)?;
        let format = capture.format();
        let resolution = Resolution::new(format.width(), format.height());
        let actual = capture.set_frame_interval(fract)?;

        log::info!(
            "opened {} ({}), {} @ {:.1}Hz",
            caps.card(),
            path.display(),
            resolution,
            1.0 / actual.as_f32(),
        );

        let stream = capture.into_stream(2)?;

        Ok(Some(Self {
            stream,
            resolution,
            t_dequeue: Timer::new("dequeue"),
            t_decode: Timer::new("decode"),
        }))
    }

    /// Returns the negotiated capture resolution.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Reads the next frame from the camera.
    ///
    /// If no frame is available, this method will block until one is.
    pub fn read(&mut self) -> anyhow::Result<Image> {
        let dequeue_guard = self.t_dequeue.start();
        let resolution = self.resolution;
        self.stream
            .dequeue(|buf| {
                drop(dequeue_guard);
                let image = match self.t_decode.time(|| Image::decode_jpeg(&buf)) {
                    Ok(image) => image,
                    Err(e) => {
                        // Even high-quality webcams produce occasional
                        // corrupted MJPG frames. Hand back a blank image
                        // instead of skipping, which would cause 2x latency
                        // spikes.
                        log::error!("webcam decode error: {}", e);
                        Image::new(resolution.width(), resolution.height())
                    }
                };
                Ok(image)
            })
            .map_err(Into::into)
    }

    /// Returns a borrowing iterator over the frames produced by this webcam.
    pub fn iter_mut(&mut self) -> IterMut<'_> {
        IterMut { webcam: self }
    }

    /// Returns profiling timers for webcam access and decoding.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_dequeue, &self.t_decode].into_iter()
    }
}

impl IntoIterator for Webcam {
    type Item = anyhow::Result<Image>;
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { webcam: self }
    }
}

impl<'a> IntoIterator for &'a mut Webcam {
    type Item = anyhow::Result<Image>;
    type IntoIter = IterMut<'a>;

    fn into_iter(self) -> Self::IntoIter {
        IterMut { webcam: self }
    }
}

/// An owned iterator over the frames captured by a [`Webcam`].
pub struct IntoIter {
    webcam: Webcam,
}

/// A borrowing iterator over the frames captured by a [`Webcam`].
pub struct IterMut<'a> {
    webcam: &'a mut Webcam,
}

impl Iterator for IntoIter {
    type Item = anyhow::Result<Image>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.webcam.read())
    }
}

impl Iterator for IterMut<'_> {
    type Item = anyhow::Result<Image>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.webcam.read())
    }
}

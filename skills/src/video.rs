//! Raw RGB video container for rendered rollouts.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use common::HarnessError;
use environment::Frame;

pub const VIDEO_MAGIC: &[u8; 4] = b"RGBV";
pub const VIDEO_VERSION: u16 = 1;
pub const VIDEO_EXTENSION: &str = "rgbv";

/// Playback rate before any speedup is applied.
pub const BASE_FPS: f64 = 30.0;

/// Encodes a sequence of frames to a file.
pub trait VideoWriter {
    fn extension(&self) -> &str;

    fn write(&mut self, path: &Path, frames: &[&Frame]) -> Result<()>;
}

impl<W: VideoWriter + ?Sized> VideoWriter for Box<W> {
    fn extension(&self) -> &str {
        (**self).extension()
    }

    fn write(&mut self, path: &Path, frames: &[&Frame]) -> Result<()> {
        (**self).write(path, frames)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoHeader {
    pub width: u32,
    pub height: u32,
    pub frame_count: u64,
    pub fps: f32,
}

impl VideoHeader {
    /// Magic(4) + Version(2) + Width(4) + Height(4) + FrameCount(8) + Fps(4) = 26
    pub const SIZE: usize = 26;

    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(VIDEO_MAGIC)?;
        w.write_all(&VIDEO_VERSION.to_le_bytes())?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&self.fps.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != VIDEO_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid RGBV magic bytes",
            ));
        }

        let mut buf2 = [0u8; 2];
        let mut buf4 = [0u8; 4];
        let mut buf8 = [0u8; 8];

        r.read_exact(&mut buf2)?;
        let version = u16::from_le_bytes(buf2);
        if version != VIDEO_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported RGBV version: {}", version),
            ));
        }

        r.read_exact(&mut buf4)?;
        let width = u32::from_le_bytes(buf4);
        r.read_exact(&mut buf4)?;
        let height = u32::from_le_bytes(buf4);
        r.read_exact(&mut buf8)?;
        let frame_count = u64::from_le_bytes(buf8);
        r.read_exact(&mut buf4)?;
        let fps = f32::from_le_bytes(buf4);

        Ok(Self {
            width,
            height,
            frame_count,
            fps,
        })
    }
}

/// Writes a header followed by every frame's packed RGB bytes.
#[derive(Debug, Clone)]
pub struct RawVideoWriter {
    fps: f32,
}

impl RawVideoWriter {
    pub fn new(speedup: f64) -> Result<Self> {
        if !speedup.is_finite() || speedup <= 0.0 {
            return Err(HarnessError::configuration(format!(
                "Speedup must be a positive number, got {}",
                speedup
            ))
            .into());
        }

        Ok(Self {
            fps: (BASE_FPS * speedup) as f32,
        })
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl VideoWriter for RawVideoWriter {
    fn extension(&self) -> &str {
        VIDEO_EXTENSION
    }

    fn write(&mut self, path: &Path, frames: &[&Frame]) -> Result<()> {
        let first = match frames.first() {
            Some(first) => first,
            None => bail!("No frames to write to {:?}", path),
        };

        let (width, height) = (first.width(), first.height());
        if let Some(frame) = frames
            .iter()
            .find(|f| f.width() != width || f.height() != height)
        {
            bail!(
                "Frame size {}x{} does not match {}x{} in {:?}",
                frame.width(),
                frame.height(),
                width,
                height,
                path
            );
        }

        let header = VideoHeader {
            width,
            height,
            frame_count: frames.len() as u64,
            fps: self.fps,
        };

        let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut writer = BufWriter::new(file);
        header.write_to(&mut writer)?;
        for frame in frames {
            writer.write_all(frame.pixels())?;
        }
        writer.flush()?;

        Ok(())
    }
}

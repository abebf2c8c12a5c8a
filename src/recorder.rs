//! Ordered frame capture
//!
//! Frames are written as numbered PNGs (`frame_000000.png`, ...) into a work
//! directory. Tick indices must arrive contiguous from 0 so the encoder can
//! read the directory as an image sequence.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use crate::error::RenderError;

/// printf-style pattern matching [`frame_file_name`], as understood by ffmpeg
pub const FRAME_PATTERN: &str = "frame_%06d.png";

pub fn frame_file_name(tick: u64) -> String {
    format!("frame_{tick:06}.png")
}

#[derive(Debug)]
pub struct FrameRecorder {
    dir: PathBuf,
    created_dir: bool,
    frames: Vec<PathBuf>,
}

impl FrameRecorder {
    /// Record into `dir`, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let dir = dir.into();
        let created_dir = !dir.exists();
        fs::create_dir_all(&dir).map_err(|e| RenderError::io(&dir, e))?;
        log::info!("Recording frames to {}", dir.display());
        Ok(Self {
            dir,
            created_dir,
            frames: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Input pattern for the encoder
    pub fn pattern(&self) -> PathBuf {
        self.dir.join(FRAME_PATTERN)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    /// Tick index the next frame must carry
    pub fn next_tick(&self) -> u64 {
        self.frames.len() as u64
    }

    pub fn record(&mut self, tick: u64, image: &RgbaImage) -> Result<(), RenderError> {
        let expected = self.next_tick();
        if tick != expected {
            return Err(RenderError::FrameGap {
                expected,
                got: tick,
            });
        }
        let path = self.dir.join(frame_file_name(tick));
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| RenderError::Frame { tick, source })?;
        self.frames.push(path);
        Ok(())
    }

    /// Delete the recorded frames, and the directory if this recorder made it
    pub fn cleanup(self) -> Result<(), RenderError> {
        for path in &self.frames {
            fs::remove_file(path).map_err(|e| RenderError::io(path, e))?;
        }
        if self.created_dir {
            if let Err(e) = fs::remove_dir(&self.dir) {
                log::warn!("Left frame directory {} in place: {}", self.dir.display(), e);
            }
        }
        log::info!("Removed {} frame(s) from {}", self.frames.len(), self.dir.display());
        Ok(())
    }
}

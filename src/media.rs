//! Media assembly
//!
//! Fits the synthesized track to the captured frame span, exports it as WAV
//! and hands frames plus audio to an external encoder. The encoder sits
//! behind [`MediaEncoder`] so runs can be assembled without a real ffmpeg.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::audio::{Waveform, samples_for, write_wav};
use crate::error::RenderError;
use crate::recorder::FrameRecorder;
use crate::settings::EncoderConfig;

/// Everything an encoder needs for one artifact
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeJob {
    /// printf-style pattern of the numbered frame files
    pub frame_pattern: PathBuf,
    pub frame_count: usize,
    pub fps: u32,
    /// 16-bit mono WAV to mux, if any
    pub audio: Option<PathBuf>,
    pub output: PathBuf,
    /// Exact output length in seconds (`frame_count / fps`)
    pub duration_secs: f64,
}

pub trait MediaEncoder {
    fn encode(&mut self, job: &EncodeJob) -> Result<(), RenderError>;
}

/// Encodes through an `ffmpeg` executable
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    video_codec: String,
    audio_codec: String,
    audio_bitrate: String,
}

impl FfmpegEncoder {
    /// Resolve the configured program on `PATH` (or as a path)
    pub fn locate(config: &EncoderConfig) -> Result<Self, RenderError> {
        let program = which::which(&config.program)
            .map_err(|_| RenderError::EncoderNotFound(config.program.clone()))?;
        log::debug!("Using encoder at {}", program.display());
        Ok(Self::with_program(program, config))
    }

    pub fn with_program(program: PathBuf, config: &EncoderConfig) -> Self {
        Self {
            program,
            video_codec: config.video_codec.clone(),
            audio_codec: config.audio_codec.clone(),
            audio_bitrate: config.audio_bitrate.clone(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for a job
    pub fn args(&self, job: &EncodeJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-framerate".into(),
            job.fps.to_string().into(),
            "-start_number".into(),
            "0".into(),
            "-i".into(),
            job.frame_pattern.clone().into(),
        ];
        if let Some(audio) = &job.audio {
            args.push("-i".into());
            args.push(audio.clone().into());
        }
        args.extend(
            [
                "-c:v",
                self.video_codec.as_str(),
                "-pix_fmt",
                "yuv420p",
                // yuv420p needs even dimensions
                "-vf",
                "pad=ceil(iw/2)*2:ceil(ih/2)*2",
            ]
            .map(OsString::from),
        );
        if job.audio.is_some() {
            args.extend(
                [
                    "-c:a",
                    self.audio_codec.as_str(),
                    "-b:a",
                    self.audio_bitrate.as_str(),
                ]
                .map(OsString::from),
            );
        } else {
            args.push("-an".into());
        }
        args.push("-t".into());
        args.push(format!("{:.6}", job.duration_secs).into());
        args.push(job.output.clone().into());
        args
    }
}

impl MediaEncoder for FfmpegEncoder {
    fn encode(&mut self, job: &EncodeJob) -> Result<(), RenderError> {
        log::info!(
            "Encoding {} frames at {} fps into {}",
            job.frame_count,
            job.fps,
            job.output.display()
        );
        let output = Command::new(&self.program)
            .args(self.args(job))
            .output()
            .map_err(|e| RenderError::io(&self.program, e))?;
        if !output.status.success() {
            return Err(RenderError::EncoderFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Where the WAV track goes for a given video path
///
/// Normally the video path with a `.wav` extension; when the video itself
/// ends in `.wav` the track becomes `<stem>_audio.wav` so neither overwrites
/// the other.
pub fn track_path(output: &Path) -> PathBuf {
    let is_wav = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if !is_wav {
        return output.with_extension("wav");
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{stem}_audio.wav"))
}

/// What a run produced on disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artifact {
    pub video: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub frame_count: usize,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct MediaAssembler {
    fps: u32,
    sample_rate: u32,
}

impl MediaAssembler {
    pub fn new(fps: u32, sample_rate: u32) -> Self {
        Self { fps, sample_rate }
    }

    pub fn duration_secs(&self, frame_count: usize) -> f64 {
        frame_count as f64 / self.fps as f64
    }

    /// Audio length matching `frame_count` frames
    pub fn target_samples(&self, frame_count: usize) -> usize {
        samples_for(self.duration_secs(frame_count), self.sample_rate)
    }

    /// Write the track next to `output` and, given an encoder, mux the video
    pub fn assemble(
        &self,
        frames: &FrameRecorder,
        track: Option<Waveform>,
        output: &Path,
        encoder: Option<&mut dyn MediaEncoder>,
    ) -> Result<Artifact, RenderError> {
        if frames.is_empty() {
            return Err(RenderError::NoFrames);
        }
        let frame_count = frames.len();
        let duration_secs = self.duration_secs(frame_count);

        let audio = match track {
            Some(mut track) => {
                track.fit_to(self.target_samples(frame_count));
                let path = track_path(output);
                write_wav(&path, &track)?;
                Some(path)
            }
            None => None,
        };

        let video = match encoder {
            Some(encoder) => {
                let job = EncodeJob {
                    frame_pattern: frames.pattern(),
                    frame_count,
                    fps: self.fps,
                    audio: audio.clone(),
                    output: output.to_path_buf(),
                    duration_secs,
                };
                encoder.encode(&job)?;
                Some(output.to_path_buf())
            }
            None => None,
        };

        Ok(Artifact {
            video,
            audio,
            frame_count,
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[derive(Default)]
    struct Recording {
        jobs: Vec<EncodeJob>,
    }

    impl MediaEncoder for Recording {
        fn encode(&mut self, job: &EncodeJob) -> Result<(), RenderError> {
            self.jobs.push(job.clone());
            Ok(())
        }
    }

    fn recorder_with(dir: &Path, frames: u64) -> FrameRecorder {
        let mut recorder = FrameRecorder::new(dir.join("frames")).unwrap();
        for tick in 0..frames {
            recorder.record(tick, &RgbaImage::new(2, 2)).unwrap();
        }
        recorder
    }

    fn job(audio: Option<&str>) -> EncodeJob {
        EncodeJob {
            frame_pattern: PathBuf::from("work/frame_%06d.png"),
            frame_count: 90,
            fps: 60,
            audio: audio.map(PathBuf::from),
            output: PathBuf::from("out.mp4"),
            duration_secs: 1.5,
        }
    }

    #[test]
    fn test_ffmpeg_args_with_audio() {
        let encoder = FfmpegEncoder::with_program("ffmpeg".into(), &EncoderConfig::default());
        let args: Vec<String> = encoder
            .args(&job(Some("out.wav")))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let joined = args.join(" ");
        assert!(joined.contains("-framerate 60 -start_number 0 -i work/frame_%06d.png -i out.wav"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-c:a aac -b:a 192k"));
        assert!(joined.ends_with("-t 1.500000 out.mp4"));
        assert!(!args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_ffmpeg_args_without_audio() {
        let encoder = FfmpegEncoder::with_program("ffmpeg".into(), &EncoderConfig::default());
        let args: Vec<String> = encoder
            .args(&job(None))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
    }

    #[test]
    fn test_missing_program_is_reported() {
        let config = EncoderConfig {
            program: "definitely-not-an-encoder-7f3a".into(),
            ..EncoderConfig::default()
        };
        let err = FfmpegEncoder::locate(&config).unwrap_err();
        assert!(matches!(err, RenderError::EncoderNotFound(name) if name == config.program));
    }

    #[test]
    fn test_track_is_fitted_to_frame_span() {
        let dir = tempfile::tempdir().unwrap();
        let frames = recorder_with(dir.path(), 3);
        let assembler = MediaAssembler::new(60, 44_100);
        let output = dir.path().join("run.mp4");
        let mut encoder = Recording::default();

        // Longer than three frames: envelope tail must be trimmed
        let track = Waveform::silence(10_000, 44_100);
        let artifact = assembler
            .assemble(&frames, Some(track), &output, Some(&mut encoder))
            .unwrap();

        let wav = artifact.audio.clone().unwrap();
        assert_eq!(wav, dir.path().join("run.wav"));
        let reader = hound::WavReader::open(&wav).unwrap();
        assert_eq!(reader.len() as usize, assembler.target_samples(3));
        assert_eq!(reader.len(), 2205);

        assert_eq!(artifact.video, Some(output.clone()));
        assert_eq!(encoder.jobs.len(), 1);
        let job = &encoder.jobs[0];
        assert_eq!(job.frame_count, 3);
        assert_eq!(job.audio, Some(wav));
        assert!((job.duration_secs - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_track_never_overwrites_the_video() {
        assert_eq!(track_path(Path::new("out/run.mp4")), PathBuf::from("out/run.wav"));
        assert_eq!(track_path(Path::new("run")), PathBuf::from("run.wav"));
        assert_eq!(
            track_path(Path::new("out/run.wav")),
            PathBuf::from("out/run_audio.wav")
        );
        assert_eq!(track_path(Path::new("RUN.WAV")), PathBuf::from("RUN_audio.wav"));
    }

    #[test]
    fn test_wav_named_output_keeps_video_and_track_apart() {
        let dir = tempfile::tempdir().unwrap();
        let frames = recorder_with(dir.path(), 2);
        let output = dir.path().join("run.wav");
        let mut encoder = Recording::default();
        let artifact = MediaAssembler::new(60, 8000)
            .assemble(
                &frames,
                Some(Waveform::silence(1, 8000)),
                &output,
                Some(&mut encoder),
            )
            .unwrap();
        let audio = artifact.audio.unwrap();
        assert_eq!(audio, dir.path().join("run_audio.wav"));
        assert_ne!(Some(audio.clone()), artifact.video);
        assert_eq!(encoder.jobs[0].audio, Some(audio));
        assert_eq!(encoder.jobs[0].output, output);
    }

    #[test]
    fn test_no_encoder_writes_audio_only() {
        let dir = tempfile::tempdir().unwrap();
        let frames = recorder_with(dir.path(), 2);
        let artifact = MediaAssembler::new(60, 8000)
            .assemble(
                &frames,
                Some(Waveform::silence(1, 8000)),
                &dir.path().join("run.mp4"),
                None,
            )
            .unwrap();
        assert!(artifact.video.is_none());
        assert!(artifact.audio.unwrap().is_file());
    }

    #[test]
    fn test_zero_frames_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let frames = recorder_with(dir.path(), 0);
        let err = MediaAssembler::new(60, 44_100)
            .assemble(&frames, None, &dir.path().join("run.mp4"), None)
            .unwrap_err();
        assert!(matches!(err, RenderError::NoFrames));
    }
}

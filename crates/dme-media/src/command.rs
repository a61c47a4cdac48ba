//! FFmpeg command builder.

use std::path::{Path, PathBuf};

use dme_models::{QualityFlag, TranscodeRequest};

use crate::filters::build_video_filter;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Set quality through the codec's flag family.
    pub fn quality(self, flag: QualityFlag, value: u8) -> Self {
        self.output_arg(flag.as_arg()).output_arg(value.to_string())
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        // Output path is always the final positional argument
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Assemble the transcode invocation for a request.
///
/// Pure: the same request and output path always give the same command.
pub fn build_transcode_command(request: &TranscodeRequest, output_path: &Path) -> FfmpegCommand {
    FfmpegCommand::new(&request.input_path, output_path)
        .video_filter(build_video_filter(request))
        .video_codec(&request.codec)
        .preset(&request.preset)
        .quality(QualityFlag::for_codec(&request.codec), request.quality)
        .audio_codec("copy")
}

/// Argument vector for a request (program name excluded).
pub fn build_transcode_args(request: &TranscodeRequest, output_path: &Path) -> Vec<String> {
    build_transcode_command(request, output_path).build_args()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dme_models::ResolutionMode;

    fn count(args: &[String], flag: &str) -> usize {
        args.iter().filter(|a| *a == flag).count()
    }

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .video_codec("libx264")
            .preset("fast");

        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        assert!(args.contains(&"-c:v".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert_eq!(args.last().unwrap(), "output.mp4");
    }

    #[test]
    fn test_transcode_args_layout() {
        let request = TranscodeRequest::new("/in/clip.mp4", "/out")
            .with_filter(0.5, 0.02)
            .with_resolution(ResolutionMode::Square512)
            .with_encoder("libx265", 20, "slow");

        let args = build_transcode_args(&request, Path::new("/out/clip_G0.50_S0.020.mp4"));
        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "/in/clip.mp4",
                "-vf",
                "crop=iw/2:ih:iw/2:0,gblur=sigma=0.5,bilateral=sigmaS=0.5:sigmaR=0.02,scale=512:512",
                "-c:v",
                "libx265",
                "-preset",
                "slow",
                "-crf",
                "20",
                "-c:a",
                "copy",
                "/out/clip_G0.50_S0.020.mp4",
            ]
        );
    }

    #[test]
    fn test_hardware_codec_uses_cq() {
        let request = TranscodeRequest::new("in.mp4", "/out").with_encoder("hevc_nvenc", 23, "p4");
        let args = build_transcode_args(&request, Path::new("out.mp4"));
        assert_eq!(count(&args, "-cq"), 1);
        assert_eq!(count(&args, "-crf"), 0);
    }

    #[test]
    fn test_software_codec_uses_crf() {
        for codec in ["libx264", "libx265", "libsvtav1"] {
            let request = TranscodeRequest::new("in.mp4", "/out").with_encoder(codec, 23, "medium");
            let args = build_transcode_args(&request, Path::new("out.mp4"));
            assert_eq!(count(&args, "-crf"), 1);
            assert_eq!(count(&args, "-cq"), 0);
        }
    }

    #[test]
    fn test_audio_is_stream_copied() {
        let args = build_transcode_args(&TranscodeRequest::new("in.mp4", "/out"), Path::new("o.ts"));
        let pos = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[pos + 1], "copy");
        assert!(!args.contains(&"-b:a".to_string()));
    }

    #[test]
    fn test_build_is_deterministic() {
        let request = TranscodeRequest::new("in.mp4", "/out").with_filter(1.25, 0.035);
        let output = Path::new("/out/x.mkv");
        assert_eq!(
            build_transcode_args(&request, output),
            build_transcode_args(&request.clone(), output)
        );
    }
}

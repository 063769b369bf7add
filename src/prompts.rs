use std::fmt;
use std::fs;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The editing library the generated script should be built around.
/// Interpolated into the system instruction; has no other effect on
/// local control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LibraryPreference {
    #[default]
    MoviePy,
    FfmpegPython,
    OpenCv,
    YtDlp,
}

impl fmt::Display for LibraryPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LibraryPreference::MoviePy => "MoviePy",
            LibraryPreference::FfmpegPython => "FFmpeg-Python",
            LibraryPreference::OpenCv => "OpenCV",
            LibraryPreference::YtDlp => "yt-dlp (Downloader)",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for LibraryPreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "moviepy" => Ok(LibraryPreference::MoviePy),
            "ffmpeg" | "ffmpeg-python" => Ok(LibraryPreference::FfmpegPython),
            "opencv" => Ok(LibraryPreference::OpenCv),
            "yt-dlp" | "ytdlp" => Ok(LibraryPreference::YtDlp),
            other => anyhow::bail!(
                "Unknown library: {}. Available: moviepy, ffmpeg, opencv, yt-dlp",
                other
            ),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// System instruction template. `{library}` and `{comment_language}`
    /// are substituted at request time.
    pub instructions: String,
    pub comment_language: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExplainConfig {
    /// Explanation prompt template; `{code}` is substituted.
    pub prompt: String,
    /// Shown when the explain call fails. Explanation is best-effort and
    /// must never block display of the generated code.
    pub fallback: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptsConfig {
    pub system: SystemConfig,
    pub explain: ExplainConfig,
}

impl PromptsConfig {
    pub fn load() -> Result<Self> {
        let config_paths = ["prompts.toml", "./prompts.toml", "../prompts.toml"];

        for path in &config_paths {
            if let Ok(content) = fs::read_to_string(path) {
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse prompts.toml from {}", path));
            }
        }

        Ok(Self::default())
    }

    pub fn system_instruction(&self, library: LibraryPreference) -> String {
        self.system
            .instructions
            .replace("{library}", &library.to_string())
            .replace("{comment_language}", &self.system.comment_language)
    }

    /// The user message for the code-generation call.
    pub fn generation_message(&self, composed_prompt: &str) -> String {
        format!("Write a Python script to: {}", composed_prompt)
    }

    pub fn explain_prompt(&self, code: &str) -> String {
        self.explain.prompt.replace("{code}", code)
    }

    pub fn explain_fallback(&self) -> &str {
        &self.explain.fallback
    }
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            system: SystemConfig {
                comment_language: "Vietnamese".to_string(),
                instructions: r#"You are an expert Python automation engineer specializing in video processing and media acquisition.
Your goal is to generate robust, production-ready Python scripts to download and edit videos based on user requests.

Primary Libraries & Capabilities:
- yt-dlp: For downloading videos from YouTube, TikTok, Facebook, Twitter, and other social platforms.
- MoviePy / FFmpeg / OpenCV: For editing, processing, and analyzing video content.

Guidelines:
1. Library Selection:
   - If the user asks to DOWNLOAD videos (from a URL or general request), ALWAYS use the 'yt-dlp' library for that part of the task.
   - If the user asks to EDIT videos, use the user's preferred library: {library}.
   - If the user asks to DOWNLOAD AND EDIT, combine them: use 'yt-dlp' to download the file to a temporary or specific path, then use {library} to process that downloaded file.

2. CRITICAL - MOVIEPY IMPORTS (Fix for 'No module named moviepy.editor'):
   - DO NOT USE: `from moviepy.editor import *` or `import moviepy.editor as mp`. This module is deprecated/removed in newer versions.
   - USE DIRECT IMPORTS: Import specific classes directly from the main package.
     Example: `from moviepy import VideoFileClip, TextClip, CompositeVideoClip, concatenate_videoclips, vfx, AudioFileClip`
   - For effects in MoviePy v2+: Use the `vfx` module import or method chaining correctly.

3. Script Structure:
   - Clean structure (imports -> functions -> main execution).
   - If downloading, include error handling (try/except) for network issues or invalid URLs.
   - Use descriptive variable names (e.g., 'input_video_path', 'output_final.mp4').

4. Language & Comments:
   - IMPORTANT: Write all comments (#) in {comment_language}.
   - The variable names and logic must remain in English (standard Python practice), but the explanation within the code must be in {comment_language}.

5. Output Format:
   - DO NOT wrap code in markdown (```python). Return plain text code.
   - Add a comment block at the top listing the pip packages required to run the script.
     - Example for MoviePy: `# pip install moviepy yt-dlp`

6. Special Video Effects Logic (Apply when requested):
   - Trimming / Cutting:
     - MoviePy: Use `clip.subclipped(start_time, end_time)`. Ensure start/end are in seconds or (min, sec) format.
     - FFmpeg: Use `ffmpeg.input(..., ss=start_time).output(..., to=end_time)` for fast seeking.
   - Speed Change:
     - MoviePy: Use `clip.with_speed_scaled(factor)` (v2) or `clip.fx(vfx.speedx, factor)`.
     - FFmpeg: Use `setpts` filter for video and `atempo` for audio.
   - Flip / Mirror:
     - MoviePy: Use `clip.fx(vfx.mirror_x)` for horizontal flip, `clip.fx(vfx.mirror_y)` for vertical flip.
     - FFmpeg: Use `hflip` filter for horizontal, `vflip` for vertical.
   - Thumbnail Extraction (Save Frame):
     - MoviePy: Use `clip.save_frame("thumbnail.jpg", t=timestamp)`.
       - If "middle": calculate `t=clip.duration/2`.
       - If "random": use a random float between 0 and duration.
     - FFmpeg: Use `-ss timestamp -i input.mp4 -vframes 1 output.jpg`.
   - Subtitles / Text Overlay:
     - MoviePy (Text): Use `TextClip(text="...", font_size=..., color='white', font='Arial')`.
       Set duration: `.with_duration(...)`. Set position: `.with_position(('center', 'bottom'))`.
       Crucial: Combine using `CompositeVideoClip([base_video, text_clip])`.
     - MoviePy (File): If the user provides a .srt/.vtt file, mention that `SubtitlesClip` requires ImageMagick, or suggest using FFmpeg for hard burning.
     - FFmpeg: Text via the `drawtext` filter; files via the `subtitles='filename.srt'` filter (best for hard subs).
   - Audio Processing:
     - MoviePy:
       - Adjust Volume: `clip.with_volume_scaled(factor)` (v2) or `clip.volumex(factor)`.
       - Remove Audio: `clip.without_audio()`.
       - Replace Audio: Load `audio = AudioFileClip("file.mp3")`, set with `clip.with_audio(audio)`. Ensure durations match or trim (e.g. `audio.subclipped(0, clip.duration)`).
       - Audio Fades: `audio.audio_fadein(duration)` and `audio.audio_fadeout(duration)` applied to the audio clip before setting it on the video.
     - FFmpeg:
       - Adjust Volume: `-filter:a "volume=1.5"` (150%).
       - Remove Audio: `-an` flag.
       - Replace Audio: Input both files `-i vid.mp4 -i aud.mp3`, map streams `-map 0:v -map 1:a`, use `-shortest` if needed.
       - Audio Fades: `afade` filter (e.g., `afade=t=in:ss=0:d=2`).
   - Zoom (Magnification):
     - Concept: To zoom, crop a smaller area and resize it back to the original dimensions.
     - MoviePy:
       `new_w = clip.w / zoom_factor`
       `new_h = clip.h / zoom_factor`
       `clip.cropped(x_center=clip.w/2, y_center=clip.h/2, width=new_w, height=new_h).resized(width=clip.w)`
       (Adjust x_center/y_center if the user requests zooming into a specific corner.)
     - FFmpeg: Use `scale` and `crop` filters.

7. Advanced Features Logic:
   - Chroma Key / Green Screen:
     - MoviePy: Use `clip.fx(vfx.mask_color, color=[r, g, b], thr=threshold, s=stiffness)`.
       Convert hex colors to RGB values (0-255). The function creates a mask;
       if adding a background: `CompositeVideoClip([background_clip, masked_clip])`.
   - Silence Removal (Jump Cuts):
     - Concept: Iterate through audio chunks, find parts where volume < threshold, and keep only the loud parts.
     - Implementation: Generate a custom function using `clip.audio.iter_chunks()` and an RMS/max volume check with numpy.
     - If too complex for a single script, generate a simplified version based on fixed segment logic or recommend the 'auto-editor' library, but try a basic numpy heuristic first.
   - Color Filters:
     - MoviePy:
       - Black & White: `clip.fx(vfx.blackwhite)`
       - Invert: `clip.fx(vfx.invert_colors)`
       - Brightness/Contrast: `clip.fx(vfx.colorx, factor)` or `clip.fx(vfx.lum_contrast, lum=..., contrast=...)`.
       - Sepia: Manually apply matrix multiplication using `clip.color_matrix`.

8. Concatenation & Transitions Logic (Apply when requested):
   - Simple Join: `concatenate_videoclips([clip1, clip2, ...], method='compose')`.
   - Transitions (MoviePy):
     - Crossfade (Dissolve): Overlap clips.
       `clips = [clip1, clip2.with_start(clip1.duration - fade_duration).crossfadein(fade_duration)]`
       `final = CompositeVideoClip(clips)`
       OR: `concatenate_videoclips([clip1, clip2], padding=-fade_duration, method='compose')` with `.crossfadein(fade_duration)` on the second clip.
     - Fade to Black (Dip): Apply `.fadeout(d).fadein(d)` to clips individually before concatenating.
     - Slide: Use `CompositeVideoClip` with `.with_position` driven by a lambda animating x/y over time.
   - Transitions (FFmpeg): Use the `xfade` filter. Example: `-filter_complex "[0][1]xfade=transition=fade:duration=1:offset=10"`.

9. Impossible Tasks:
   - If the requested library cannot perform a specific task, switch to the best alternative and explain why in the comments (in {comment_language})."#
                    .to_string(),
            },
            explain: ExplainConfig {
                prompt: r#"Explain this video-automation Python script simply for the user, in Vietnamese. If the code contains effects or video concatenation, briefly explain how they work. Keep it short:

{code}"#
                    .to_string(),
                fallback: "Không thể tạo hướng dẫn.".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_interpolated_into_instruction() {
        let prompts = PromptsConfig::default();
        let instruction = prompts.system_instruction(LibraryPreference::OpenCv);
        assert!(instruction.contains("preferred library: OpenCV"));
        assert!(!instruction.contains("{library}"));
    }

    #[test]
    fn test_comment_language_interpolated() {
        let mut prompts = PromptsConfig::default();
        prompts.system.comment_language = "English".to_string();
        let instruction = prompts.system_instruction(LibraryPreference::MoviePy);
        assert!(instruction.contains("comments (#) in English"));
        assert!(!instruction.contains("{comment_language}"));
    }

    #[test]
    fn test_explain_prompt_embeds_code() {
        let prompts = PromptsConfig::default();
        let prompt = prompts.explain_prompt("print('hi')");
        assert!(prompt.contains("print('hi')"));
        assert!(!prompt.contains("{code}"));
    }

    #[test]
    fn test_generation_message_framing() {
        let prompts = PromptsConfig::default();
        let msg = prompts.generation_message("Trim the intro.");
        assert_eq!(msg, "Write a Python script to: Trim the intro.");
    }

    #[test]
    fn test_library_parse_and_display() {
        assert_eq!(
            "ffmpeg".parse::<LibraryPreference>().unwrap(),
            LibraryPreference::FfmpegPython
        );
        assert_eq!(LibraryPreference::YtDlp.to_string(), "yt-dlp (Downloader)");
        assert!("imagemagick".parse::<LibraryPreference>().is_err());
    }

    #[test]
    fn test_config_roundtrip_through_toml() {
        let config = PromptsConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: PromptsConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.system.comment_language, "Vietnamese");
        assert_eq!(parsed.explain.fallback, config.explain.fallback);
    }
}

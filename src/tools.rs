use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

/// One user-configured edit effect. Variants are closed on purpose:
/// `render` must stay exhaustive so adding a tool without a prompt
/// fragment is a compile error.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    Trim { start: String, end: String },
    Zoom { factor: f32, anchor: ZoomAnchor },
    Subtitle(SubtitleSpec),
    AudioAdjust(AudioAdjust),
    Transition { kind: TransitionKind, duration_secs: f32 },
    Flip(FlipDirection),
    Thumbnail(ThumbnailSpec),
    ChromaKey { color: String, threshold: f32 },
    SilenceRemoval { threshold_db: i32 },
    ColorFilter(ColorFilterKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomAnchor {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubtitleSpec {
    Text {
        text: String,
        start_secs: String,
        duration_secs: String,
    },
    File {
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioAdjust {
    Volume(f32),
    Mute,
    Replace {
        source: String,
        fade_in_secs: f32,
        fade_out_secs: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Crossfade,
    FadeBlack,
    Slide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailSpec {
    Middle,
    Random,
    At(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFilterKind {
    Grayscale,
    Sepia,
    Invert,
    Brightness,
}

// Parameter bounds mirror the ranges the original slider widgets allowed.
const ZOOM_RANGE: (f32, f32) = (1.1, 5.0);
const VOLUME_RANGE: (f32, f32) = (0.0, 3.0);
const TRANSITION_RANGE: (f32, f32) = (0.5, 3.0);
const CHROMA_RANGE: (f32, f32) = (0.1, 1.0);
const SILENCE_RANGE: (i32, i32) = (-60, -10);

impl ToolRequest {
    /// Render this request to its natural-language prompt fragment.
    /// Deterministic per variant; parameters are interpolated verbatim.
    pub fn render(&self) -> String {
        match self {
            ToolRequest::Trim { start, end } => {
                format!("Cut the video from {} to {}.", start, end)
            }
            ToolRequest::Zoom { factor, anchor } => {
                format!("Zoom the video by {}x into the {}.", factor, anchor)
            }
            ToolRequest::Subtitle(SubtitleSpec::Text {
                text,
                start_secs,
                duration_secs,
            }) => format!(
                "Overlay the text \"{}\" starting at {}s for {}s.",
                text, start_secs, duration_secs
            ),
            ToolRequest::Subtitle(SubtitleSpec::File { name }) => {
                format!("Hardcode the subtitle file \"{}\" into the video.", name)
            }
            ToolRequest::AudioAdjust(AudioAdjust::Volume(factor)) => {
                format!("Set the audio volume to {}%.", (factor * 100.0).round())
            }
            ToolRequest::AudioAdjust(AudioAdjust::Mute) => {
                "Remove the audio track completely.".to_string()
            }
            ToolRequest::AudioAdjust(AudioAdjust::Replace {
                source,
                fade_in_secs,
                fade_out_secs,
            }) => format!(
                "Replace the audio with \"{}\". Fade in: {}s, fade out: {}s.",
                source, fade_in_secs, fade_out_secs
            ),
            ToolRequest::Transition { kind, duration_secs } => format!(
                "Join the clips using a {} transition of {}s.",
                kind, duration_secs
            ),
            ToolRequest::Flip(FlipDirection::Horizontal) => {
                "Flip the video horizontally (mirror).".to_string()
            }
            ToolRequest::Flip(FlipDirection::Vertical) => {
                "Flip the video vertically.".to_string()
            }
            ToolRequest::Thumbnail(ThumbnailSpec::Middle) => {
                "Extract a thumbnail image from the middle of the video.".to_string()
            }
            ToolRequest::Thumbnail(ThumbnailSpec::Random) => {
                "Extract a thumbnail image at a random timestamp.".to_string()
            }
            ToolRequest::Thumbnail(ThumbnailSpec::At(t)) => {
                format!("Extract a thumbnail image at {}.", t)
            }
            ToolRequest::ChromaKey { color, threshold } => format!(
                "Remove the green screen (chroma key) using color {} with threshold {}.",
                color, threshold
            ),
            ToolRequest::SilenceRemoval { threshold_db } => format!(
                "Automatically cut out silent sections (silence removal) below {}dB.",
                threshold_db
            ),
            ToolRequest::ColorFilter(kind) => {
                format!("Apply a {} color filter to the video.", kind)
            }
        }
    }

    /// Short label for listing queued requests.
    pub fn label(&self) -> &'static str {
        match self {
            ToolRequest::Trim { .. } => "trim",
            ToolRequest::Zoom { .. } => "zoom",
            ToolRequest::Subtitle(_) => "subtitle",
            ToolRequest::AudioAdjust(_) => "audio",
            ToolRequest::Transition { .. } => "transition",
            ToolRequest::Flip(_) => "flip",
            ToolRequest::Thumbnail(_) => "thumbnail",
            ToolRequest::ChromaKey { .. } => "chroma",
            ToolRequest::SilenceRemoval { .. } => "silence",
            ToolRequest::ColorFilter(_) => "filter",
        }
    }
}

impl fmt::Display for ZoomAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ZoomAnchor::Center => "center",
            ZoomAnchor::TopLeft => "top-left corner",
            ZoomAnchor::TopRight => "top-right corner",
            ZoomAnchor::BottomLeft => "bottom-left corner",
            ZoomAnchor::BottomRight => "bottom-right corner",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransitionKind::Crossfade => "crossfade",
            TransitionKind::FadeBlack => "fade-to-black",
            TransitionKind::Slide => "slide",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for ColorFilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColorFilterKind::Grayscale => "grayscale (black & white)",
            ColorFilterKind::Sepia => "sepia",
            ColorFilterKind::Invert => "inverted colors",
            ColorFilterKind::Brightness => "brightness boost",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ZoomAnchor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "center" => Ok(ZoomAnchor::Center),
            "top-left" | "topleft" => Ok(ZoomAnchor::TopLeft),
            "top-right" | "topright" => Ok(ZoomAnchor::TopRight),
            "bottom-left" | "bottomleft" => Ok(ZoomAnchor::BottomLeft),
            "bottom-right" | "bottomright" => Ok(ZoomAnchor::BottomRight),
            other => bail!(
                "Unknown zoom anchor: {}. Available: center, top-left, top-right, bottom-left, bottom-right",
                other
            ),
        }
    }
}

impl FromStr for TransitionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "crossfade" => Ok(TransitionKind::Crossfade),
            "fade-black" | "fadeblack" | "fade_black" => Ok(TransitionKind::FadeBlack),
            "slide" => Ok(TransitionKind::Slide),
            other => bail!(
                "Unknown transition: {}. Available: crossfade, fade-black, slide",
                other
            ),
        }
    }
}

impl FromStr for FlipDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "horizontal" | "h" => Ok(FlipDirection::Horizontal),
            "vertical" | "v" => Ok(FlipDirection::Vertical),
            other => bail!("Unknown flip direction: {}. Available: horizontal, vertical", other),
        }
    }
}

impl FromStr for ColorFilterKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "grayscale" | "bw" => Ok(ColorFilterKind::Grayscale),
            "sepia" => Ok(ColorFilterKind::Sepia),
            "invert" => Ok(ColorFilterKind::Invert),
            "brightness" => Ok(ColorFilterKind::Brightness),
            other => bail!(
                "Unknown color filter: {}. Available: grayscale, sepia, invert, brightness",
                other
            ),
        }
    }
}

fn parse_in_range(value: &str, what: &str, range: (f32, f32)) -> Result<f32> {
    let parsed: f32 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid {}: {}", what, value))?;
    if parsed < range.0 || parsed > range.1 {
        bail!("{} must be between {} and {}", what, range.0, range.1);
    }
    Ok(parsed)
}

/// Build a trim request: `/trim <start> <end>`.
pub fn parse_trim(args: &[&str]) -> Result<ToolRequest> {
    match args {
        [start, end] => Ok(ToolRequest::Trim {
            start: start.to_string(),
            end: end.to_string(),
        }),
        _ => bail!("Usage: /trim <start> <end>   (e.g. /trim 00:00:10 00:00:30)"),
    }
}

/// Build a zoom request: `/zoom <factor> [anchor]`.
pub fn parse_zoom(args: &[&str]) -> Result<ToolRequest> {
    let (factor, anchor) = match args {
        [factor] => (factor, ZoomAnchor::Center),
        [factor, anchor] => (factor, anchor.parse()?),
        _ => bail!("Usage: /zoom <factor> [anchor]   (factor 1.1-5.0)"),
    };
    Ok(ToolRequest::Zoom {
        factor: parse_in_range(factor, "zoom factor", ZOOM_RANGE)?,
        anchor,
    })
}

/// Build a subtitle request:
/// `/subtitle file <name>` or `/subtitle <start_s> <duration_s> <text...>`.
pub fn parse_subtitle(args: &[&str]) -> Result<ToolRequest> {
    match args {
        ["file", name] => Ok(ToolRequest::Subtitle(SubtitleSpec::File {
            name: name.to_string(),
        })),
        [start, duration, text @ ..] if !text.is_empty() => {
            Ok(ToolRequest::Subtitle(SubtitleSpec::Text {
                text: text.join(" "),
                start_secs: start.to_string(),
                duration_secs: duration.to_string(),
            }))
        }
        _ => bail!("Usage: /subtitle file <name.srt>  or  /subtitle <start_s> <duration_s> <text>"),
    }
}

/// Build an audio request:
/// `/audio volume <factor>`, `/audio mute`,
/// `/audio replace <file> [fade_in] [fade_out]`.
pub fn parse_audio(args: &[&str]) -> Result<ToolRequest> {
    match args {
        ["volume", factor] => Ok(ToolRequest::AudioAdjust(AudioAdjust::Volume(
            parse_in_range(factor, "volume factor", VOLUME_RANGE)?,
        ))),
        ["mute"] => Ok(ToolRequest::AudioAdjust(AudioAdjust::Mute)),
        ["replace", source, rest @ ..] => {
            let fade_in = rest.first().map(|v| parse_fade(v)).transpose()?.unwrap_or(0.0);
            let fade_out = rest.get(1).map(|v| parse_fade(v)).transpose()?.unwrap_or(0.0);
            Ok(ToolRequest::AudioAdjust(AudioAdjust::Replace {
                source: source.to_string(),
                fade_in_secs: fade_in,
                fade_out_secs: fade_out,
            }))
        }
        _ => bail!(
            "Usage: /audio volume <0.0-3.0> | /audio mute | /audio replace <file> [fade_in] [fade_out]"
        ),
    }
}

fn parse_fade(value: &str) -> Result<f32> {
    let fade: f32 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid fade duration: {}", value))?;
    if fade < 0.0 {
        bail!("Fade duration cannot be negative");
    }
    Ok(fade)
}

/// Build a transition request: `/transition <kind> [duration]`.
pub fn parse_transition(args: &[&str]) -> Result<ToolRequest> {
    let (kind, duration) = match args {
        [kind] => (kind.parse()?, 1.0),
        [kind, duration] => (
            kind.parse()?,
            parse_in_range(duration, "transition duration", TRANSITION_RANGE)?,
        ),
        _ => bail!("Usage: /transition <crossfade|fade-black|slide> [duration]"),
    };
    Ok(ToolRequest::Transition {
        kind,
        duration_secs: duration,
    })
}

/// Build a flip request: `/flip <horizontal|vertical>`.
pub fn parse_flip(args: &[&str]) -> Result<ToolRequest> {
    match args {
        [direction] => Ok(ToolRequest::Flip(direction.parse()?)),
        _ => bail!("Usage: /flip <horizontal|vertical>"),
    }
}

/// Build a thumbnail request: `/thumbnail middle|random|<timestamp>`.
pub fn parse_thumbnail(args: &[&str]) -> Result<ToolRequest> {
    match args {
        ["middle"] => Ok(ToolRequest::Thumbnail(ThumbnailSpec::Middle)),
        ["random"] => Ok(ToolRequest::Thumbnail(ThumbnailSpec::Random)),
        [timestamp] => Ok(ToolRequest::Thumbnail(ThumbnailSpec::At(
            timestamp.to_string(),
        ))),
        _ => bail!("Usage: /thumbnail <middle|random|timestamp>"),
    }
}

/// Build a chroma-key request: `/chroma <#rrggbb> [threshold]`.
pub fn parse_chroma(args: &[&str]) -> Result<ToolRequest> {
    let (color, threshold) = match args {
        [color] => (*color, 0.4),
        [color, threshold] => (
            *color,
            parse_in_range(threshold, "chroma threshold", CHROMA_RANGE)?,
        ),
        _ => bail!("Usage: /chroma <#rrggbb> [threshold 0.1-1.0]"),
    };
    if color.len() != 7
        || !color.starts_with('#')
        || !color[1..].chars().all(|c| c.is_ascii_hexdigit())
    {
        bail!("Chroma color must be a hex value like #00ff00");
    }
    Ok(ToolRequest::ChromaKey {
        color: color.to_lowercase(),
        threshold,
    })
}

/// Build a silence-removal request: `/silence [threshold_db]`.
pub fn parse_silence(args: &[&str]) -> Result<ToolRequest> {
    let threshold_db = match args {
        [] => -30,
        [value] => {
            let db: i32 = value
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid silence threshold: {}", value))?;
            if db < SILENCE_RANGE.0 || db > SILENCE_RANGE.1 {
                bail!(
                    "Silence threshold must be between {}dB and {}dB",
                    SILENCE_RANGE.0,
                    SILENCE_RANGE.1
                );
            }
            db
        }
        _ => bail!("Usage: /silence [threshold_db -60..-10]"),
    };
    Ok(ToolRequest::SilenceRemoval { threshold_db })
}

/// Build a color-filter request: `/filter <kind>`.
pub fn parse_filter(args: &[&str]) -> Result<ToolRequest> {
    match args {
        [kind] => Ok(ToolRequest::ColorFilter(kind.parse()?)),
        _ => bail!("Usage: /filter <grayscale|sepia|invert|brightness>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_render_mentions_both_timestamps() {
        let tool = parse_trim(&["00:00:00", "00:00:10"]).unwrap();
        let fragment = tool.render();
        assert!(fragment.contains("00:00:00"));
        assert!(fragment.contains("00:00:10"));
    }

    #[test]
    fn test_zoom_range_enforced() {
        assert!(parse_zoom(&["1.5"]).is_ok());
        assert!(parse_zoom(&["0.5"]).is_err());
        assert!(parse_zoom(&["6.0"]).is_err());
        assert!(parse_zoom(&["abc"]).is_err());
    }

    #[test]
    fn test_zoom_anchor_defaults_to_center() {
        let tool = parse_zoom(&["2.0"]).unwrap();
        assert_eq!(
            tool,
            ToolRequest::Zoom {
                factor: 2.0,
                anchor: ZoomAnchor::Center
            }
        );
        assert!(tool.render().contains("center"));
    }

    #[test]
    fn test_subtitle_text_joins_words() {
        let tool = parse_subtitle(&["5", "3", "hello", "world"]).unwrap();
        assert!(tool.render().contains("\"hello world\""));
        assert!(tool.render().contains("5s"));
    }

    #[test]
    fn test_subtitle_file_mode() {
        let tool = parse_subtitle(&["file", "subs.srt"]).unwrap();
        assert!(tool.render().contains("subs.srt"));
    }

    #[test]
    fn test_audio_volume_rendered_as_percent() {
        let tool = parse_audio(&["volume", "1.5"]).unwrap();
        assert!(tool.render().contains("150%"));
    }

    #[test]
    fn test_audio_replace_with_fades() {
        let tool = parse_audio(&["replace", "music.mp3", "2", "1.5"]).unwrap();
        let fragment = tool.render();
        assert!(fragment.contains("music.mp3"));
        assert!(fragment.contains("Fade in: 2s"));
        assert!(fragment.contains("fade out: 1.5s"));
    }

    #[test]
    fn test_chroma_validates_hex_color() {
        assert!(parse_chroma(&["#00ff00"]).is_ok());
        assert!(parse_chroma(&["00ff00"]).is_err());
        assert!(parse_chroma(&["#00ff0g"]).is_err());
        assert!(parse_chroma(&["#00ff00", "2.0"]).is_err());
    }

    #[test]
    fn test_silence_default_threshold() {
        let tool = parse_silence(&[]).unwrap();
        assert_eq!(tool, ToolRequest::SilenceRemoval { threshold_db: -30 });
        assert!(tool.render().contains("-30dB"));
    }

    #[test]
    fn test_transition_kinds() {
        assert!(parse_transition(&["crossfade"]).is_ok());
        assert!(parse_transition(&["fade-black", "2.0"]).is_ok());
        assert!(parse_transition(&["wipe"]).is_err());
        assert!(parse_transition(&["slide", "10.0"]).is_err());
    }

    #[test]
    fn test_every_variant_renders_nonempty() {
        let tools = vec![
            parse_trim(&["0:00", "0:10"]).unwrap(),
            parse_zoom(&["1.5", "top-left"]).unwrap(),
            parse_subtitle(&["file", "a.srt"]).unwrap(),
            parse_audio(&["mute"]).unwrap(),
            parse_transition(&["slide"]).unwrap(),
            parse_flip(&["vertical"]).unwrap(),
            parse_thumbnail(&["random"]).unwrap(),
            parse_chroma(&["#00ff00", "0.4"]).unwrap(),
            parse_silence(&["-40"]).unwrap(),
            parse_filter(&["sepia"]).unwrap(),
        ];
        for tool in tools {
            assert!(!tool.render().is_empty(), "{} rendered empty", tool.label());
        }
    }
}

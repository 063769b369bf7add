use crate::tools::ToolRequest;

/// Where the source media comes from. Local mode tells the model which
/// files will sit next to the generated script; Remote mode tells it the
/// media has to be fetched from a URL first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Local,
    Remote,
}

const MERGE_DIRECTIVE: &str = "CRITICAL TASK: After processing any other requests, you MUST \
concatenate (merge) all the video clips (downloaded or local) into a single final output video \
file named 'final_merged_output.mp4'. Ensure audio is synced.";

/// Assemble the final user message from scattered session state.
///
/// The output is fully determined by the inputs: source framing first,
/// then the free-text request, then each tool fragment in the order the
/// user added it, then the merge directive if requested. Never fails;
/// the caller guards against starting a generation with nothing in it.
pub fn compose(
    base_text: &str,
    source_mode: SourceMode,
    local_files: &[String],
    auto_merge: bool,
    tool_requests: &[ToolRequest],
) -> String {
    let mut prompt = String::new();

    match source_mode {
        SourceMode::Local => {
            let filenames = local_files
                .iter()
                .map(|name| format!("\"{}\"", name))
                .collect::<Vec<_>>()
                .join(", ");
            prompt.push_str(&format!(
                "I have the following local video files in the same directory as the script: [{}].",
                filenames
            ));
        }
        SourceMode::Remote => {
            prompt.push_str("Source is from URL/Internet.");
        }
    }

    let base = base_text.trim();
    if !base.is_empty() {
        prompt.push(' ');
        prompt.push_str(base);
    }

    for tool in tool_requests {
        prompt.push(' ');
        prompt.push_str(&tool.render());
    }

    if auto_merge {
        prompt.push_str("\n\n");
        prompt.push_str(MERGE_DIRECTIVE);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{self, FlipDirection};

    #[test]
    fn test_local_files_listed_verbatim() {
        let files = vec!["a.mp4".to_string(), "b.mp4".to_string()];
        let prompt = compose("Join the clips", SourceMode::Local, &files, false, &[]);
        assert!(prompt.contains("\"a.mp4\""));
        assert!(prompt.contains("\"b.mp4\""));
        assert!(prompt.contains("same directory as the script"));
    }

    #[test]
    fn test_remote_framing() {
        let prompt = compose("Download this", SourceMode::Remote, &[], false, &[]);
        assert!(prompt.starts_with("Source is from URL/Internet."));
        assert!(prompt.contains("Download this"));
    }

    #[test]
    fn test_tool_fragments_keep_insertion_order() {
        let requests = vec![
            tools::parse_trim(&["00:00:00", "00:00:10"]).unwrap(),
            ToolRequest::Flip(FlipDirection::Horizontal),
            tools::parse_silence(&[]).unwrap(),
        ];
        let prompt = compose("Edit it", SourceMode::Remote, &[], false, &requests);

        let trim_pos = prompt.find("Cut the video").unwrap();
        let flip_pos = prompt.find("Flip the video").unwrap();
        let silence_pos = prompt.find("silence removal").unwrap();
        assert!(trim_pos < flip_pos);
        assert!(flip_pos < silence_pos);
    }

    #[test]
    fn test_merge_directive_appended_exactly_once() {
        let requests = vec![
            tools::parse_flip(&["horizontal"]).unwrap(),
            tools::parse_filter(&["sepia"]).unwrap(),
        ];
        let prompt = compose("", SourceMode::Local, &["x.mp4".to_string()], true, &requests);
        assert_eq!(prompt.matches("final_merged_output.mp4").count(), 1);
        assert!(prompt.ends_with("Ensure audio is synced."));
    }

    #[test]
    fn test_no_merge_directive_when_not_requested() {
        let prompt = compose("Trim it", SourceMode::Remote, &[], false, &[]);
        assert!(!prompt.contains("final_merged_output.mp4"));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let requests = vec![tools::parse_zoom(&["1.5", "center"]).unwrap()];
        let files = vec!["clip.mp4".to_string()];
        let first = compose("Zoom in", SourceMode::Local, &files, true, &requests);
        let second = compose("Zoom in", SourceMode::Local, &files, true, &requests);
        assert_eq!(first, second);
    }

    #[test]
    fn test_remote_trim_scenario() {
        let requests = vec![tools::parse_trim(&["00:00:00", "00:00:10"]).unwrap()];
        let prompt = compose("Cut the intro", SourceMode::Remote, &[], false, &requests);

        assert!(prompt.contains("Source is from URL/Internet."));
        assert!(prompt.contains("Cut the intro"));
        assert!(prompt.contains("00:00:00"));
        assert!(prompt.contains("00:00:10"));
        assert!(!prompt.contains("final_merged_output.mp4"));
    }
}

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use colored::*;

use crate::composer::{compose, SourceMode};
use crate::config::AppConfig;
use crate::history::{HistoryItem, HistoryLog};
use crate::input;
use crate::llm::GeminiClient;
use crate::prompts::{LibraryPreference, PromptsConfig};
use crate::recorder::VoiceRecorder;
use crate::session::{GenerationSession, GenerationStatus};
use crate::theme::ThemeConfig;
use crate::thinking;
use crate::tools::{self, ToolRequest};
use crate::render_markdown;

const SCRIPT_FILENAME: &str = "generated_script.py";
const RECORDING_FILENAME: &str = "recorded_voice.wav";

/// Everything the user has assembled so far for the next generation run.
struct Draft {
    library: LibraryPreference,
    source_mode: SourceMode,
    local_files: Vec<String>,
    auto_merge: bool,
    prompt_text: String,
    tools: Vec<ToolRequest>,
}

impl Draft {
    fn new(library: LibraryPreference) -> Self {
        Self {
            library,
            source_mode: SourceMode::Remote,
            local_files: Vec::new(),
            auto_merge: false,
            prompt_text: String::new(),
            tools: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.local_files.clear();
        self.auto_merge = false;
        self.prompt_text.clear();
        self.tools.clear();
    }

    fn composed(&self) -> String {
        compose(
            &self.prompt_text,
            self.source_mode,
            &self.local_files,
            self.auto_merge,
            &self.tools,
        )
    }
}

pub async fn run(mut config: AppConfig) -> Result<()> {
    let header_width = 60;
    let mut theme = config.theme();

    println!("{}", "═".repeat(header_width).bright_blue());
    println!("{}", theme.accent("AutoEdit - AI Video Script Generator").bold());
    println!("{}", "═".repeat(header_width).bright_blue());

    show_key_status();

    println!("{}", "─".repeat(header_width).dimmed());
    println!("{} Type '/help' for available commands", "💡".yellow());
    println!("{} Type anything else to describe your edit", "🎬".bright_blue());
    println!();

    let prompts = PromptsConfig::load().unwrap_or_default();
    let mut draft = Draft::new(config.llm.default_library);
    let mut session: Option<GenerationSession> = None;
    let mut recorder = VoiceRecorder::new();
    let history = HistoryLog::new(AppConfig::data_dir()?.join("history.json"));

    loop {
        let user_input = input::read_line()?;
        let trimmed = user_input.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with('/') {
            let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
            let command = parts[0];
            let arg = if parts.len() > 1 { parts[1].trim() } else { "" };

            let outcome = handle_command(
                command,
                arg,
                &mut draft,
                &mut session,
                &mut recorder,
                &mut config,
                &mut theme,
                &prompts,
                &history,
            )
            .await;

            match outcome {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => eprintln!("{} {}", "Error:".red(), e),
            }
        } else {
            // Free text extends the running request, like typing into the
            // prompt box.
            if !draft.prompt_text.is_empty() {
                draft.prompt_text.push(' ');
            }
            draft.prompt_text.push_str(trimmed);
            println!("{}", theme.secondary("Added to request. /show to preview, /generate to run."));
        }

        println!();
    }

    Ok(())
}

fn show_key_status() {
    if std::env::var("GEMINI_API_KEY").is_ok() {
        println!("{} {}", "Provider:".dimmed(), "Google Gemini (cloud)".cyan());
    } else {
        println!("{} {}", "Provider:".dimmed(), "Google Gemini (cloud) - Missing API key".yellow());
        println!("{} export GEMINI_API_KEY=your_api_key", "Set with:".dimmed());
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_command(
    command: &str,
    arg: &str,
    draft: &mut Draft,
    session: &mut Option<GenerationSession>,
    recorder: &mut VoiceRecorder,
    config: &mut AppConfig,
    theme: &mut ThemeConfig,
    prompts: &PromptsConfig,
    history: &HistoryLog,
) -> Result<bool> {
    let args: Vec<&str> = arg.split_whitespace().collect();

    match command {
        "/help" => print_help(),
        "/quit" => {
            println!("{}", "─".repeat(60).dimmed());
            println!("{}", "Goodbye!".bright_white());
            return Ok(true);
        }

        "/library" => {
            if arg.is_empty() {
                println!("Current library: {}", theme.accent(&draft.library.to_string()));
                println!("{}", "Switch with: /library <moviepy|ffmpeg|opencv|yt-dlp>".dimmed());
            } else {
                draft.library = arg.parse()?;
                println!("Editing library set to {}", theme.accent(&draft.library.to_string()));
            }
        }

        "/source" => match arg {
            "url" | "remote" => {
                draft.source_mode = SourceMode::Remote;
                println!("Source mode: {}", theme.accent("URL / Internet"));
            }
            "local" => {
                draft.source_mode = SourceMode::Local;
                println!("Source mode: {}", theme.accent("local files"));
            }
            _ => println!("Usage: /source <url|local>"),
        },

        "/file" => match args.as_slice() {
            ["add", names @ ..] if !names.is_empty() => {
                for name in names {
                    draft.local_files.push(name.to_string());
                    println!("{} {}", "Added file:".green(), name);
                }
                draft.source_mode = SourceMode::Local;
            }
            ["remove", index] => {
                let i: usize = index.parse().map_err(|_| anyhow::anyhow!("Invalid index: {}", index))?;
                if i == 0 || i > draft.local_files.len() {
                    anyhow::bail!("No file at position {}", i);
                }
                let removed = draft.local_files.remove(i - 1);
                println!("{} {}", "Removed file:".green(), removed);
            }
            ["list"] | [] => {
                if draft.local_files.is_empty() {
                    println!("No local files added.");
                } else {
                    for (i, name) in draft.local_files.iter().enumerate() {
                        println!("{}. {}", i + 1, name);
                    }
                }
            }
            _ => println!("Usage: /file add <name...> | /file remove <n> | /file list"),
        },

        "/merge" => match arg {
            "on" => {
                draft.auto_merge = true;
                println!("{}", "Auto-merge enabled: all clips will be joined into one output file.".green());
            }
            "off" => {
                draft.auto_merge = false;
                println!("Auto-merge disabled.");
            }
            _ => println!("Auto-merge is {}. Usage: /merge <on|off>", if draft.auto_merge { "on" } else { "off" }),
        },

        // Tool panels: each builds one ToolRequest and queues it.
        "/trim" => queue_tool(draft, theme, tools::parse_trim(&args)?),
        "/zoom" => queue_tool(draft, theme, tools::parse_zoom(&args)?),
        "/subtitle" => queue_tool(draft, theme, tools::parse_subtitle(&args)?),
        "/audio" => queue_tool(draft, theme, tools::parse_audio(&args)?),
        "/transition" => queue_tool(draft, theme, tools::parse_transition(&args)?),
        "/flip" => queue_tool(draft, theme, tools::parse_flip(&args)?),
        "/thumbnail" => queue_tool(draft, theme, tools::parse_thumbnail(&args)?),
        "/chroma" => queue_tool(draft, theme, tools::parse_chroma(&args)?),
        "/silence" => queue_tool(draft, theme, tools::parse_silence(&args)?),
        "/filter" => queue_tool(draft, theme, tools::parse_filter(&args)?),

        "/tools" => {
            if draft.tools.is_empty() {
                println!("No tool requests queued.");
            } else {
                for (i, tool) in draft.tools.iter().enumerate() {
                    println!("{}. [{}] {}", i + 1, tool.label(), tool.render());
                }
            }
        }

        "/undo" => match draft.tools.pop() {
            Some(tool) => println!("{} [{}]", "Removed last tool request".green(), tool.label()),
            None => println!("Nothing to undo."),
        },

        "/quick" => match arg {
            "chroma" => {
                draft.prompt_text =
                    "Remove the green screen and replace it with a black background.".to_string();
                println!("{}", theme.secondary("Quick prompt set. /generate to run."));
            }
            "silence" => {
                draft.prompt_text =
                    "Automatically cut out all silent sections (silence removal).".to_string();
                println!("{}", theme.secondary("Quick prompt set. /generate to run."));
            }
            _ => println!("Usage: /quick <chroma|silence>"),
        },

        "/record" => match arg {
            "start" => {
                recorder.start()?;
                println!("{} Recording... use '/record stop' to finish.", "🎙".red());
            }
            "stop" => {
                let duration = recorder.stop(Path::new(RECORDING_FILENAME))?;
                println!(
                    "{} Saved {:.0}s of audio to {}",
                    "✓".green(),
                    duration.as_secs_f32(),
                    RECORDING_FILENAME
                );
                println!("{}", theme.secondary(&format!("Use it with: /audio replace {}", RECORDING_FILENAME)));
            }
            _ => {
                if recorder.is_recording() {
                    let elapsed = recorder.elapsed().unwrap_or_default();
                    println!("Recording for {:.0}s. Usage: /record stop", elapsed.as_secs_f32());
                } else {
                    println!("Usage: /record <start|stop>");
                }
            }
        },

        "/show" => {
            println!("{}", "--- Composed prompt preview ---".dimmed());
            println!("{}", draft.composed());
            println!("{}", "--- End preview ---".dimmed());
        }

        "/clear" => {
            draft.reset();
            println!("{}", "Request cleared".green());
        }

        "/theme" => {
            if arg.is_empty() {
                println!(
                    "Theme: {} mode, {} accent ({})",
                    format!("{:?}", theme.mode).to_lowercase(),
                    theme.accent.name(),
                    theme.accent.hex()
                );
            } else if let Ok(mode) = arg.parse() {
                theme.set_mode(mode);
                config.theme.mode = mode;
                config.save(&AppConfig::default_path()?)?;
                println!("Theme mode updated.");
            } else {
                let accent = arg.parse()?;
                theme.set_accent(accent);
                config.theme.accent = accent;
                config.save(&AppConfig::default_path()?)?;
                println!("Accent color set to {}", theme.accent(accent.name()));
            }
        }

        "/history" => {
            let limit = args.first().and_then(|v| v.parse().ok()).unwrap_or(5);
            let items = history.recent(limit)?;
            if items.is_empty() {
                println!("No history yet.");
            } else {
                for item in items {
                    println!(
                        "{} [{}] {}",
                        item.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                        item.library.cyan(),
                        item.prompt
                    );
                }
            }
        }

        "/generate" => {
            run_generation(draft, session, config, theme, prompts, history).await?;
        }

        "/explain" => match session {
            Some(s) if !s.result().explanation.is_empty() => {
                let _ = render_markdown(&s.result().explanation);
            }
            _ => println!("No explanation available. Run /generate first."),
        },

        "/save" => {
            let path = args.first().copied().unwrap_or(SCRIPT_FILENAME);
            save_script(session, path)?;
        }

        _ => println!("Unknown command: {}. Type '/help' for available commands.", command),
    }

    Ok(false)
}

fn queue_tool(draft: &mut Draft, theme: &ThemeConfig, tool: ToolRequest) {
    println!("{} {}", "Queued:".green(), theme.secondary(&tool.render()));
    draft.tools.push(tool);
}

async fn run_generation(
    draft: &mut Draft,
    session: &mut Option<GenerationSession>,
    config: &AppConfig,
    theme: &ThemeConfig,
    prompts: &PromptsConfig,
    history: &HistoryLog,
) -> Result<()> {
    // Empty-input guard lives here, at the trigger boundary; compose
    // itself never fails.
    if draft.prompt_text.trim().is_empty() && draft.tools.is_empty() && !draft.auto_merge {
        println!("{}", "Nothing to generate: describe an edit, queue a tool, or enable /merge.".yellow());
        return Ok(());
    }
    if draft.source_mode == SourceMode::Local && draft.local_files.is_empty() {
        println!("{}", "Local source selected but no files added. Use /file add <name>.".yellow());
        return Ok(());
    }

    if session.is_none() {
        let client = GeminiClient::from_env()?;
        *session = Some(GenerationSession::new(client, config.generation_settings()));
    }
    let Some(session) = session.as_mut() else {
        return Ok(());
    };

    let composed = draft.composed();
    let system = prompts.system_instruction(draft.library);
    let message = prompts.generation_message(&composed);

    let spinner = thinking::show_connecting();
    let mut first_fragment = true;
    let outcome = session
        .generate(&system, &message, |fragment| {
            if first_fragment {
                spinner.finish();
                println!("{}", "--- Generated script ---".dimmed());
                first_fragment = false;
            }
            print!("{}", fragment);
            let _ = io::stdout().flush();
        })
        .await
        .map(|_| ());
    spinner.finish();
    if !first_fragment {
        println!();
        println!("{}", "--- End script ---".dimmed());
    }

    match outcome {
        Ok(_) => {
            if let Err(e) = history.append(HistoryItem::new(composed, draft.library.to_string())) {
                eprintln!("{} failed to record history: {}", "Warning:".yellow(), e);
            }

            let spinner = thinking::show_explaining();
            session.explain(prompts).await;
            spinner.finish();

            println!();
            println!("{}", theme.accent("How it works").bold());
            let _ = render_markdown(&session.result().explanation);

            println!("{} Python script generated successfully!", "✓".green());
            println!("{}", theme.secondary(&format!("Save it with: /save [{}]", SCRIPT_FILENAME)));
        }
        Err(e) => {
            eprintln!("{} {}", "Generation failed:".red(), e);
        }
    }

    Ok(())
}

fn save_script(session: &Option<GenerationSession>, path: &str) -> Result<()> {
    let Some(session) = session else {
        println!("No script generated yet. Run /generate first.");
        return Ok(());
    };
    if session.status() != GenerationStatus::Complete || session.result().code.is_empty() {
        println!("No completed script to save. Run /generate first.");
        return Ok(());
    }

    if Path::new(path).exists() {
        println!("{} {} already exists. Overwrite? [y/N]", "Warning:".yellow(), path);
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        let answer = answer.trim().to_lowercase();
        if answer != "y" && answer != "yes" {
            println!("Save cancelled.");
            return Ok(());
        }
    }

    std::fs::write(path, &session.result().code)?;
    println!("{} Script saved to {}", "✓".green(), path);
    Ok(())
}

fn print_help() {
    println!("{}", "Request building:".bold());
    println!("  <free text>                     describe the edit in your own words");
    println!("  /library [name]                 show or set the editing library");
    println!("  /source <url|local>             where the source media comes from");
    println!("  /file add|remove|list           manage local file names");
    println!("  /merge <on|off>                 concatenate all clips into one output");
    println!("  /quick <chroma|silence>         preset one-line requests");
    println!();
    println!("{}", "Tool requests (queued in order):".bold());
    println!("  /trim <start> <end>");
    println!("  /zoom <factor 1.1-5.0> [anchor]");
    println!("  /subtitle file <name.srt> | /subtitle <start_s> <dur_s> <text>");
    println!("  /audio volume <0-3> | mute | replace <file> [fade_in] [fade_out]");
    println!("  /transition <crossfade|fade-black|slide> [duration 0.5-3]");
    println!("  /flip <horizontal|vertical>");
    println!("  /thumbnail <middle|random|timestamp>");
    println!("  /chroma <#rrggbb> [threshold 0.1-1.0]");
    println!("  /silence [threshold_db -60..-10]");
    println!("  /filter <grayscale|sepia|invert|brightness>");
    println!("  /tools                          list queued requests");
    println!("  /undo                           drop the last queued request");
    println!();
    println!("{}", "Running:".bold());
    println!("  /show                           preview the composed prompt");
    println!("  /generate                       stream the Python script");
    println!("  /explain                        re-print the explanation");
    println!("  /save [path]                    write the script to disk");
    println!("  /record <start|stop>            capture voice-over audio");
    println!();
    println!("{}", "Other:".bold());
    println!("  /history [n]                    recent generation prompts");
    println!("  /theme <dark|light|color>       adjust appearance");
    println!("  /clear                          reset the current request");
    println!("  /quit                           exit");
}

use std::time::Duration;

use crate::audio::{BindingStatus, RingStatus};
use crate::config::EngineConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{ErrorSeverity, HandoverError};

/// Status display formatter for the CLI
pub struct StatusDisplay;

impl StatusDisplay {
    /// Display the orchestrator and audio tap state in a box
    pub fn display_full(diagnostics: &Diagnostics, binding: BindingStatus, ring: &RingStatus) {
        println!("┌─ Handover Status ───────────────────────────────────────┐");
        for (label, value) in diagnostics.rows() {
            println!("│ {}: {}", label, Self::truncate(&value, 50usize.saturating_sub(label.len())));
        }

        println!("│");
        println!(
            "│ Position: {} / {}",
            Self::format_duration(Duration::from_secs_f64(diagnostics.current_time.max(0.0))),
            Self::format_duration(Duration::from_secs_f64(diagnostics.duration.max(0.0)))
        );
        println!(
            "│ Progress: [{}] {:.1}%",
            Self::progress_bar(diagnostics.playback_progress, 40),
            diagnostics.playback_progress * 100.0
        );
        println!(
            "│ Handover buffer: [{}] {:.0}%",
            Self::progress_bar(diagnostics.handover / 100.0, 33),
            diagnostics.handover
        );
        if diagnostics.video_width > 0 {
            println!(
                "│ Video: {}x{} @ {:.2} fps",
                diagnostics.video_width, diagnostics.video_height, diagnostics.framerate
            );
        }

        println!("│");
        println!("│ ┌─ Audio Tap ─────────────────────────────────────────┐");
        println!("│ │ Binding: {}", binding.as_str());
        match ring.format {
            Some(format) => println!("│ │ Format: {}", format.format_description()),
            None => println!("│ │ Format: none"),
        }
        println!(
            "│ │ Ring: {} / {} bytes ({})",
            ring.buffered_bytes,
            ring.capacity,
            ring.status_description()
        );
        println!(
            "│ │ Underruns: {} | Overruns: {} | Rebases: {}",
            ring.stats.underruns, ring.stats.overruns, ring.stats.rebases
        );
        println!("│ └─────────────────────────────────────────────────────┘");
        println!("└─────────────────────────────────────────────────────────┘");
    }

    /// One-line status
    pub fn display_compact(diagnostics: &Diagnostics) {
        println!("{}", Self::compact_line(diagnostics));
    }

    pub fn compact_line(diagnostics: &Diagnostics) -> String {
        format!(
            "{} | {} | {} | {} [{}] | handover {}",
            diagnostics.playback_state.as_str(),
            diagnostics.player_state.as_str(),
            Self::truncate(&diagnostics.url, 30),
            Self::format_duration(Duration::from_secs_f64(diagnostics.current_time.max(0.0))),
            Self::progress_bar(diagnostics.playback_progress, 20),
            diagnostics.handover_state.as_str()
        )
    }

    pub fn display_config(config: &EngineConfig) {
        println!("┌─ Configuration ─────────────────────────────────────────┐");
        println!("│ Handover ready threshold: {:.0}%", config.handover_ready_threshold);
        println!("│ Default volume: {}%", config.default_volume);
        println!("│ Tick rate: {} Hz", config.tick_rate_hz);
        println!("│ Swap warning: {} ms", config.swap_warn_ms);
        println!("│ Audio safety factor: {}", config.audio.safety_factor);
        println!("│ Audio rebase tolerance: {:.0}%", config.audio.rebase_tolerance * 100.0);
        println!("│ Audio overrun policy: {:?}", config.audio.overrun_policy);
        println!(
            "│ Audio delivery: {:?} (channel capacity {})",
            config.audio.delivery, config.audio.channel_capacity
        );
        println!("└─────────────────────────────────────────────────────────┘");
    }

    /// Display error message with formatting and recovery suggestions
    pub fn display_error(error: &HandoverError) {
        let severity = error.severity();
        let severity_icon = match severity {
            ErrorSeverity::Info => "ℹ",
            ErrorSeverity::Warning => "⚠",
            ErrorSeverity::Error => "✗",
            ErrorSeverity::Critical => "🔥",
        };

        eprintln!("┌─ {} {} ─────────────────────────────────────────────────┐",
            severity_icon, severity.as_str());

        for line in Self::wrap_text(&error.user_message(), 55) {
            eprintln!("│ {}", line);
        }

        let suggestions = error.recovery_suggestions();
        if !suggestions.is_empty() {
            eprintln!("│");
            eprintln!("│ Suggestions:");
            for suggestion in suggestions.iter().take(3) {
                for line in Self::wrap_text(&format!("• {}", suggestion), 53) {
                    eprintln!("│   {}", line);
                }
            }
        }

        eprintln!("└─────────────────────────────────────────────────────────┘");
    }

    /// Display a simple error message for non-interactive contexts
    pub fn display_simple_error(error: &HandoverError) {
        eprintln!("[{}] {}", error.severity().as_str(), error.user_message());

        let suggestions = error.recovery_suggestions();
        if let Some(first) = suggestions.first() {
            eprintln!("Suggestion: {}", first);
        }
    }

    /// Wrap text to fit within specified width
    fn wrap_text(text: &str, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current_line = String::new();

        for word in text.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.len() + word.len() + 1 <= width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(current_line);
                current_line = word.to_string();
            }
        }

        if !current_line.is_empty() {
            lines.push(current_line);
        }
        lines
    }

    pub fn progress_bar(progress: f64, width: usize) -> String {
        let filled = ((progress.clamp(0.0, 1.0) * width as f64) as usize).min(width);
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }

    /// Format duration as MM:SS, or HH:MM:SS past an hour
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }

    /// Truncate to `max_len` characters, marking the cut with "..."
    pub fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", kept)
        }
    }
}

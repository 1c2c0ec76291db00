//! Terminal rendering of dashboard frames and operator command parsing.

use colored::{ColoredString, Colorize};
use lib_spectrum::telemetry::dashboard::WidgetReading;
use lib_spectrum::{ActionError, ActionOutcome, DashboardFrame, FeedState, VehicleConfig, VehicleValueConfig};

const BAR_WIDTH: usize = 24;

/// Shown in place of the dashboard whenever the feed reports an error.
pub const ERROR_BANNER: &str = "Error occurred";

/// Operator input read from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Act,
    Refresh,
    Status,
    Help,
    Quit,
}

impl OperatorCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "act" | "a" => Some(Self::Act),
            "refresh" | "r" => Some(Self::Refresh),
            "status" | "s" => Some(Self::Status),
            "help" | "h" | "?" => Some(Self::Help),
            "quit" | "q" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

pub const HELP: &str = "commands: act | refresh | status | help | quit";

/// `#RRGGBB` to an RGB triple.
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn paint(text: &str, color: &str) -> ColoredString {
    match parse_hex(color) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

/// Share of the projected range covered by `normalized`, in `[0, 1]`.
pub fn fill_fraction(normalized: f64, config: &VehicleValueConfig) -> f64 {
    let span = config.projected_max - config.projected_min;
    if span == 0.0 {
        return 0.0;
    }
    ((normalized - config.projected_min) / span).clamp(0.0, 1.0)
}

pub fn bar(fraction: f64, width: usize) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn render_widget(widget: &WidgetReading, config: &VehicleValueConfig) -> String {
    let fraction = fill_fraction(widget.result.normalized_value, config);
    format!(
        "{:<12} {:>14}  {}  {}",
        widget.title,
        paint(&widget.display, &widget.color).bold(),
        paint(&bar(fraction, BAR_WIDTH), &widget.color),
        paint(&format!("{:?}", widget.severity).to_uppercase(), &widget.color),
    )
}

/// Multi-line text block for one frame.
pub fn render_frame(frame: &DashboardFrame, config: &VehicleConfig) -> String {
    let direction = match frame.is_ascending {
        Some(true) => "ascending",
        Some(false) => "descending",
        None => "-",
    };

    let mut lines = vec![format!(
        "{} {}  ({})",
        "Status:".bold(),
        frame.status_message,
        direction
    )];

    let configs = [&config.velocity, &config.temperature, &config.altitude];
    for (widget, value_config) in frame.widgets().into_iter().zip(configs) {
        lines.push(render_widget(widget, value_config));
    }

    let action = if frame.is_action_required {
        "ACTION REQUIRED, type `act`".bright_white().on_red().bold()
    } else {
        "no action required".truecolor(128, 128, 128)
    };
    lines.push(format!("{:<12} {}", "ActOnSpectrum", action));

    lines.join("\n")
}

pub fn render_error() -> String {
    ERROR_BANNER.bright_red().bold().to_string()
}

pub fn render_state(state: FeedState) -> String {
    let label = format!("feed {state:?}");
    match state {
        FeedState::Streaming => label.bright_green().to_string(),
        FeedState::Errored => label.bright_red().to_string(),
        FeedState::Connecting => label.bright_yellow().to_string(),
        FeedState::Disconnected | FeedState::Closed => label.truecolor(128, 128, 128).to_string(),
    }
}

pub fn render_outcome(outcome: &Result<ActionOutcome, ActionError>) -> String {
    match outcome {
        Ok(ActionOutcome::Completed { status }) => format!("ActOnSpectrum accepted ({status})").bright_green().to_string(),
        Ok(ActionOutcome::NotRequired) => "ActOnSpectrum not required right now".bright_yellow().to_string(),
        Ok(ActionOutcome::AlreadyInFlight) => "ActOnSpectrum already in flight".bright_yellow().to_string(),
        Ok(ActionOutcome::Rejected { status, body }) => format!(
            "ActOnSpectrum rejected ({status}){}",
            body.as_deref().map(|b| format!(": {b}")).unwrap_or_default()
        )
        .bright_red()
        .to_string(),
        Err(e) => format!("ActOnSpectrum failed: {e}").bright_red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_spectrum::{ColorTable, VehicleState};

    #[test]
    fn test_parse_hex_theme_colors() {
        assert_eq!(parse_hex("#095EDD"), Some((0x09, 0x5E, 0xDD)));
        assert_eq!(parse_hex("#DD2209"), Some((0xDD, 0x22, 0x09)));
        assert_eq!(parse_hex("095EDD"), None);
        assert_eq!(parse_hex("#XYZXYZ"), None);
    }

    #[test]
    fn test_fill_fraction_handles_signed_projection() {
        let config = VehicleConfig::default();
        assert!((fill_fraction(-1.0, &config.velocity) - 0.0).abs() < 1e-9);
        assert!((fill_fraction(0.0, &config.velocity) - 0.5).abs() < 1e-9);
        assert!((fill_fraction(0.25, &config.altitude) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_bar_width_is_constant() {
        for fraction in [0.0, 0.3, 1.0, 2.0] {
            assert_eq!(bar(fraction, 10).chars().count(), 10);
        }
    }

    #[test]
    fn test_render_frame_shows_values_and_action() {
        let state = VehicleState {
            velocity: 80.0,
            altitude: -40000.0,
            temperature: 1.0,
            status_message: "Max Q".to_string(),
            is_ascending: true,
            is_action_required: true,
        };
        let config = VehicleConfig::default();
        let frame = DashboardFrame::build(Some(&state), &config, &ColorTable::default());
        let text = render_frame(&frame, &config);

        assert!(text.contains("Max Q"));
        assert!(text.contains("80.00 m/s"));
        assert!(text.contains("WARNING"));
        assert!(text.contains("ACTION REQUIRED"));
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(OperatorCommand::parse(" ACT \n"), Some(OperatorCommand::Act));
        assert_eq!(OperatorCommand::parse("q"), Some(OperatorCommand::Quit));
        assert_eq!(OperatorCommand::parse("launch"), None);
    }
}

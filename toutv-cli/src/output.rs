use crate::{cli::OutputFormat, error::Result};
#[cfg(feature = "colored-output")]
use colored::*;
use toutv_parser::media::DelegateReference;

pub enum Color {
    Green,
    Yellow,
    Cyan,
    Blue,
}

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn format_reference(
        &self,
        reference: &DelegateReference,
        format: &OutputFormat,
        show_session: bool,
    ) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.format_pretty(reference, show_session)),
            OutputFormat::Json => self.format_json(reference, show_session, true),
            OutputFormat::JsonCompact => self.format_json(reference, show_session, false),
        }
    }

    fn format_pretty(&self, reference: &DelegateReference, show_session: bool) -> String {
        let mut output = String::new();
        output.push_str(&self.colorize("Media Information:", &Color::Green, true));
        output.push('\n');

        let mut line = |label: &str, value: &str, color: Color| {
            output.push_str(&format!(
                "  {}: {}\n",
                self.colorize(label, &Color::Yellow, false),
                self.colorize(value, &color, false)
            ));
        };

        line("Title", &reference.title, Color::Cyan);
        line("ID", &reference.id, Color::Cyan);
        line("Resolver URL", reference.url.primary(), Color::Blue);
        if let Some(thumbnail) = &reference.thumbnail {
            line("Thumbnail", thumbnail, Color::Blue);
        }
        if let Some(duration) = reference.duration {
            line("Duration", &format_duration(duration), Color::Cyan);
        }
        if let Some(description) = &reference.description {
            line("Description", description, Color::Cyan);
        }
        if show_session {
            let attached = if reference.url.sidecar().is_some() {
                "attached"
            } else {
                "none (anonymous)"
            };
            line("Session", attached, Color::Cyan);
        }

        output
    }

    fn format_json(
        &self,
        reference: &DelegateReference,
        show_session: bool,
        pretty: bool,
    ) -> Result<String> {
        let mut value = serde_json::to_value(reference)?;
        if show_session && let Some(obj) = value.as_object_mut() {
            obj.insert(
                "authenticated".to_string(),
                reference.url.sidecar().is_some().into(),
            );
        }
        let json = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(json)
    }

    #[cfg(feature = "colored-output")]
    pub fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        if !self.colored {
            return text.to_string();
        }
        let colored = match color {
            Color::Green => text.green(),
            Color::Yellow => text.yellow(),
            Color::Cyan => text.cyan(),
            Color::Blue => text.blue(),
        };
        if bold {
            colored.bold().to_string()
        } else {
            colored.to_string()
        }
    }

    #[cfg(not(feature = "colored-output"))]
    pub fn colorize(&self, text: &str, _color: &Color, _bold: bool) -> String {
        let _ = self.colored;
        text.to_string()
    }
}

/// `1h 02m 03s`, `12m 05s` or `42s`.
pub fn format_duration(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s:02}s"),
        _ => format!("{h}h {m:02}m {s:02}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toutv_parser::media::SmuggledUrl;

    fn reference() -> DelegateReference {
        DelegateReference {
            url: SmuggledUrl::new("radiocanada:toutv:122017"),
            id: "122017".to_string(),
            title: "Épisode 17".to_string(),
            thumbnail: Some("https://images.tou.tv/17.jpg".to_string()),
            duration: Some(1320),
            description: None,
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(1320), "22m 00s");
        assert_eq!(format_duration(3723), "1h 02m 03s");
    }

    #[test]
    fn test_pretty_output() {
        let output = OutputManager::new(false)
            .format_reference(&reference(), &OutputFormat::Pretty, true)
            .unwrap();
        assert!(output.contains("Resolver URL: radiocanada:toutv:122017"));
        assert!(output.contains("Duration: 22m 00s"));
        assert!(output.contains("Session: none (anonymous)"));
        assert!(!output.contains("Description"));
    }

    #[test]
    fn test_json_output() {
        let output = OutputManager::new(false)
            .format_reference(&reference(), &OutputFormat::JsonCompact, true)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["url"], "radiocanada:toutv:122017");
        assert_eq!(value["duration"], 1320);
        assert_eq!(value["authenticated"], false);
    }
}

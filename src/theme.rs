use std::str::FromStr;

use tuirealm::ratatui::style::Color;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum ThemePreset {
    #[default]
    Default,
    Light,
    HighContrast,
    Mono,
}

impl ThemePreset {
    pub const ALL: [Self; 4] = [Self::Default, Self::Light, Self::HighContrast, Self::Mono];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Light => "light",
            Self::HighContrast => "high-contrast",
            Self::Mono => "mono",
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Default => Self::Light,
            Self::Light => Self::HighContrast,
            Self::HighContrast => Self::Mono,
            Self::Mono => Self::Default,
        }
    }
}

impl FromStr for ThemePreset {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "light" | "day" => Ok(Self::Light),
            "high-contrast" | "high_contrast" | "contrast" => Ok(Self::HighContrast),
            "mono" | "monochrome" => Ok(Self::Mono),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub preset: ThemePreset,
    pub base: BasePalette,
    pub interactive: InteractivePalette,
    pub panel: PanelPalette,
}

#[derive(Debug, Clone, Copy)]
pub struct BasePalette {
    pub text: Color,
    pub text_muted: Color,
    pub header: Color,
    pub accent: Color,
    pub danger: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct InteractivePalette {
    pub focus: Color,
    pub selected_bg: Color,
    pub border: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct PanelPalette {
    pub input_bg: Color,
    pub task_open: Color,
    pub task_done: Color,
    pub hint: Color,
}

impl Theme {
    pub fn from_preset(preset: ThemePreset) -> Self {
        match preset {
            ThemePreset::Default => Self {
                preset,
                base: BasePalette {
                    text: Color::White,
                    text_muted: Color::DarkGray,
                    header: Color::Cyan,
                    accent: Color::Magenta,
                    danger: Color::Red,
                },
                interactive: InteractivePalette {
                    focus: Color::Cyan,
                    selected_bg: Color::Rgb(54, 48, 72),
                    border: Color::DarkGray,
                },
                panel: PanelPalette {
                    input_bg: Color::Rgb(36, 40, 56),
                    task_open: Color::LightYellow,
                    task_done: Color::LightGreen,
                    hint: Color::Gray,
                },
            },
            ThemePreset::Light => Self {
                preset,
                base: BasePalette {
                    text: Color::Rgb(32, 38, 51),
                    text_muted: Color::Rgb(95, 105, 122),
                    header: Color::Rgb(37, 99, 235),
                    accent: Color::Rgb(2, 132, 199),
                    danger: Color::Rgb(185, 28, 28),
                },
                interactive: InteractivePalette {
                    focus: Color::Rgb(37, 99, 235),
                    selected_bg: Color::Rgb(227, 237, 255),
                    border: Color::Rgb(196, 208, 224),
                },
                panel: PanelPalette {
                    input_bg: Color::Rgb(241, 245, 249),
                    task_open: Color::Rgb(161, 98, 7),
                    task_done: Color::Rgb(22, 163, 74),
                    hint: Color::Rgb(71, 85, 105),
                },
            },
            ThemePreset::HighContrast => Self {
                preset,
                base: BasePalette {
                    text: Color::White,
                    text_muted: Color::Gray,
                    header: Color::LightCyan,
                    accent: Color::LightBlue,
                    danger: Color::LightRed,
                },
                interactive: InteractivePalette {
                    focus: Color::LightCyan,
                    selected_bg: Color::Rgb(36, 36, 36),
                    border: Color::Gray,
                },
                panel: PanelPalette {
                    input_bg: Color::Rgb(20, 20, 20),
                    task_open: Color::LightYellow,
                    task_done: Color::LightGreen,
                    hint: Color::White,
                },
            },
            ThemePreset::Mono => Self {
                preset,
                base: BasePalette {
                    text: Color::White,
                    text_muted: Color::Gray,
                    header: Color::White,
                    accent: Color::Gray,
                    danger: Color::White,
                },
                interactive: InteractivePalette {
                    focus: Color::White,
                    selected_bg: Color::Rgb(35, 35, 35),
                    border: Color::Gray,
                },
                panel: PanelPalette {
                    input_bg: Color::Rgb(26, 26, 26),
                    task_open: Color::White,
                    task_done: Color::Gray,
                    hint: Color::Gray,
                },
            },
        }
    }

    pub fn panel_border(&self, selected: bool) -> Color {
        if selected {
            self.interactive.focus
        } else {
            self.interactive.border
        }
    }

    pub fn task_color(&self, completed: bool) -> Color {
        if completed {
            self.panel.task_done
        } else {
            self.panel.task_open
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_preset(ThemePreset::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_default_preset() {
        let theme = Theme::default();
        assert_eq!(theme.preset, ThemePreset::Default);
        assert_eq!(theme.base.header, Color::Cyan);
        assert_eq!(theme.interactive.focus, Color::Cyan);
        assert_eq!(theme.base.text_muted, Color::DarkGray);
    }

    #[test]
    fn test_panel_border_tracks_selection() {
        let theme = Theme::from_preset(ThemePreset::Light);
        assert_eq!(theme.panel_border(true), theme.interactive.focus);
        assert_eq!(theme.panel_border(false), theme.interactive.border);
        assert_eq!(theme.task_color(true), theme.panel.task_done);
    }

    #[test]
    fn test_theme_preset_parse() {
        assert_eq!(ThemePreset::from_str("default"), Ok(ThemePreset::Default));
        assert_eq!(ThemePreset::from_str(" Light "), Ok(ThemePreset::Light));
        assert_eq!(
            ThemePreset::from_str("contrast"),
            Ok(ThemePreset::HighContrast)
        );
        assert!(ThemePreset::from_str("unknown").is_err());
    }

    #[test]
    fn test_theme_preset_cycle_visits_every_preset() {
        let mut preset = ThemePreset::Default;
        for expected in ThemePreset::ALL.iter().skip(1) {
            preset = preset.next();
            assert_eq!(preset, *expected);
        }
        assert_eq!(preset.next(), ThemePreset::Default);
    }
}

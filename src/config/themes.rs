use std::collections::HashSet;

use ratatui::style::Color;

use super::ThemeName;

/// Colors the list screen draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub muted: Color,
    pub highlight: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub editing: Color,
    pub danger: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    names: HashSet<ThemeName>,
}

impl ThemeRegistry {
    pub fn all(&self) -> impl Iterator<Item = &ThemeName> {
        self.names.iter()
    }

    pub fn palette(&self, theme: &ThemeName) -> Palette {
        match theme {
            ThemeName::Dark => Palette {
                accent: Color::Cyan,
                muted: Color::Gray,
                highlight: Color::Yellow,
                selection_bg: Color::Blue,
                selection_fg: Color::Black,
                editing: Color::Magenta,
                danger: Color::Red,
            },
            ThemeName::Light => Palette {
                accent: Color::Blue,
                muted: Color::DarkGray,
                highlight: Color::Magenta,
                selection_bg: Color::LightBlue,
                selection_fg: Color::Black,
                editing: Color::Red,
                danger: Color::Red,
            },
            ThemeName::HighContrast => Palette {
                accent: Color::White,
                muted: Color::White,
                highlight: Color::Yellow,
                selection_bg: Color::White,
                selection_fg: Color::Black,
                editing: Color::LightMagenta,
                danger: Color::LightRed,
            },
            ThemeName::Solarized => Palette {
                accent: Color::Rgb(38, 139, 210),
                muted: Color::Rgb(131, 148, 150),
                highlight: Color::Rgb(181, 137, 0),
                selection_bg: Color::Rgb(7, 54, 66),
                selection_fg: Color::Rgb(238, 232, 213),
                editing: Color::Rgb(211, 54, 130),
                danger: Color::Rgb(220, 50, 47),
            },
        }
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        let names = [
            ThemeName::Dark,
            ThemeName::Light,
            ThemeName::HighContrast,
            ThemeName::Solarized,
        ]
        .into_iter()
        .collect();
        Self { names }
    }
}

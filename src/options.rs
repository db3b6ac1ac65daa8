//! Display options selected through the query string.

use std::fmt;

use serde::Serialize;
use url::form_urlencoded;

/// Background mode passed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    /// `bg=dark`
    Dark,
    /// `bg=light`
    Light,
}

impl Background {
    fn parse(value: &str) -> Option<Background> {
        match value {
            "dark" => Some(Background::Dark),
            "light" => Some(Background::Light),
            _ => None,
        }
    }

    /// The query parameter value.
    pub fn as_str(self) -> &'static str {
        match self {
            Background::Dark => "dark",
            Background::Light => "light",
        }
    }
}

/// Whether line numbers are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineNumbers {
    /// `nu=on`
    On,
    /// `nu=off`
    Off,
}

impl LineNumbers {
    fn parse(value: &str) -> Option<LineNumbers> {
        match value {
            "on" => Some(LineNumbers::On),
            "off" => Some(LineNumbers::Off),
            _ => None,
        }
    }

    /// The query parameter value.
    pub fn as_str(self) -> &'static str {
        match self {
            LineNumbers::On => "on",
            LineNumbers::Off => "off",
        }
    }
}

/// The view options of a request.
///
/// Only the `colorscheme`, `bg` and `nu` query parameters are recognized. Anything else, and any
/// value a parameter does not accept, is ignored. When a parameter is repeated the first
/// occurrence wins.
///
/// The [`Display`](fmt::Display) implementation is the canonical form used in cache keys and
/// links: set options only, sorted by key, form-encoded. It is empty when nothing is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Color scheme name from `colorscheme`.
    pub colorscheme: Option<String>,

    /// Background from `bg`.
    pub background: Option<Background>,

    /// Line numbers from `nu`.
    pub line_numbers: Option<LineNumbers>,
}

impl ViewOptions {
    /// Builds options from a raw, still-encoded query string.
    pub fn from_query(query: Option<&str>) -> ViewOptions {
        let mut options = ViewOptions::default();
        let (mut seen_colorscheme, mut seen_bg, mut seen_nu) = (false, false, false);

        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match &*key {
                "colorscheme" if !seen_colorscheme => {
                    seen_colorscheme = true;
                    options.colorscheme = Some(value.into_owned()).filter(|v| is_theme_name(v));
                }
                "bg" if !seen_bg => {
                    seen_bg = true;
                    options.background = Background::parse(&value);
                }
                "nu" if !seen_nu => {
                    seen_nu = true;
                    options.line_numbers = LineNumbers::parse(&value);
                }
                _ => {}
            }
        }

        options
    }

    /// Renderer directives for these options. Scheme selection always precedes the `set`
    /// options, since loading a scheme resets settings like `background`.
    pub fn directives(&self) -> Vec<String> {
        let mut commands = vec![];
        let mut settings = vec![];

        if let Some(colorscheme) = &self.colorscheme {
            commands.push(format!("colorscheme {}", colorscheme));
        }

        if let Some(background) = self.background {
            settings.push(format!("set bg={}", background.as_str()));
        }

        match self.line_numbers {
            Some(LineNumbers::On) => settings.push(String::from("set nu")),
            Some(LineNumbers::Off) => settings.push(String::from("set nu!")),
            None => {}
        }

        commands.extend(settings);
        commands
    }

    /// `?`-prefixed canonical query string, or the empty string when nothing is set.
    pub fn query_string(&self) -> String {
        let query = self.to_string();
        if query.is_empty() {
            query
        } else {
            format!("?{}", query)
        }
    }

    /// Drops a color scheme that is not among `available`. An empty catalog keeps whatever was
    /// requested.
    pub fn retain_known_theme(&mut self, available: &[String]) {
        if available.is_empty() {
            return;
        }

        if let Some(colorscheme) = &self.colorscheme {
            if !available.iter().any(|theme| theme == colorscheme) {
                self.colorscheme = None;
            }
        }
    }
}

impl fmt::Display for ViewOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut serializer = form_urlencoded::Serializer::new(String::new());

        if let Some(background) = self.background {
            serializer.append_pair("bg", background.as_str());
        }
        if let Some(colorscheme) = &self.colorscheme {
            serializer.append_pair("colorscheme", colorscheme);
        }
        if let Some(line_numbers) = self.line_numbers {
            serializer.append_pair("nu", line_numbers.as_str());
        }

        f.write_str(&serializer.finish())
    }
}

/// Scheme names end up in a renderer command line, so only plain file-name characters are
/// accepted.
fn is_theme_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
}

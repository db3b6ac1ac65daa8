//! HTML produced by the server itself: directory listings and the decorations injected into
//! rendered documents.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use handlebars::{Handlebars, TemplateError};
use regex::Regex;
use serde::Serialize;

use crate::options::{Background, LineNumbers};
use crate::{Error, ViewOptions};

const LISTING: &str = "listing";
const UP_LINK: &str = "up_link";
const VIEW_OPTIONS: &str = "view_options";

/// Registered page templates.
#[derive(Debug)]
pub(crate) struct Pages {
    handlebars: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Pages, TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(|s| escape_html(s).into_owned());

        handlebars.register_template_string(LISTING, include_str!("../templates/listing.html"))?;
        handlebars.register_template_string(UP_LINK, include_str!("../templates/up_link.html"))?;
        handlebars.register_template_string(
            VIEW_OPTIONS,
            include_str!("../templates/view_options.html"),
        )?;

        Ok(Pages { handlebars })
    }

    /// Lists the directory at `path`, which was requested as `url`.
    ///
    /// Entries are sorted by name. Subdirectories link with, and are shown with, a trailing
    /// slash.
    pub fn listing(&self, path: &Path, url: &str) -> Result<String, Error> {
        let base = if url == "." { "" } else { url.trim_matches('/') };

        let mut entries = fs::read_dir(path)?
            .map(|entry| {
                let entry = entry?;
                let is_dir = entry.file_type()?.is_dir()
                    || (entry.file_type()?.is_symlink() && entry.path().is_dir());
                Ok((entry.file_name().to_string_lossy().into_owned(), is_dir))
            })
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();

        let entries = entries
            .into_iter()
            .map(|(name, is_dir)| {
                let slash = if is_dir { "/" } else { "" };
                let href = if base.is_empty() {
                    format!("/{}{}", name, slash)
                } else {
                    format!("/{}/{}{}", base, name, slash)
                };

                ListingEntry {
                    href,
                    name: format!("{}{}", name, slash),
                }
            })
            .collect();

        let data = ListingData {
            title: if base.is_empty() { "/" } else { base },
            entries,
        };

        Ok(self.handlebars.render(LISTING, &data)?)
    }

    /// Link to the directory containing `url`.
    pub fn up_link(&self, url: &str, options: &ViewOptions) -> Result<String, Error> {
        let url = url.trim_matches('/');
        let parent = match url.rfind('/') {
            Some(idx) => format!("/{}/", &url[..idx]),
            None => String::from("/"),
        };

        let data = UpLinkData {
            href: format!("{}{}", parent, options.query_string()),
        };

        Ok(self.handlebars.render(UP_LINK, &data)?)
    }

    /// The form that lets the viewer change `options`.
    pub fn view_options(&self, options: &ViewOptions, themes: &[String]) -> Result<String, Error> {
        let current = options.colorscheme.as_deref();

        let data = ViewOptionsData {
            has_colorscheme: current.is_some(),
            themes: themes
                .iter()
                .map(|name| ThemeEntry {
                    name,
                    selected: Some(name.as_str()) == current,
                })
                .collect(),
            bg_dark: options.background == Some(Background::Dark),
            bg_light: options.background == Some(Background::Light),
            bg_default: options.background.is_none(),
            nu_on: options.line_numbers == Some(LineNumbers::On),
            nu_off: options.line_numbers == Some(LineNumbers::Off),
        };

        Ok(self.handlebars.render(VIEW_OPTIONS, &data)?)
    }
}

#[derive(Debug, Serialize)]
struct ListingData<'a> {
    title: &'a str,
    entries: Vec<ListingEntry>,
}

#[derive(Debug, Serialize)]
struct ListingEntry {
    href: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct UpLinkData {
    href: String,
}

#[derive(Debug, Serialize)]
struct ViewOptionsData<'a> {
    has_colorscheme: bool,
    themes: Vec<ThemeEntry<'a>>,
    bg_dark: bool,
    bg_light: bool,
    bg_default: bool,
    nu_on: bool,
    nu_off: bool,
}

#[derive(Debug, Serialize)]
struct ThemeEntry<'a> {
    name: &'a str,
    selected: bool,
}

/// Inserts `fragment` right after the opening `<body>` tag, or at the very start of documents
/// without one.
pub(crate) fn insert_after_body(html: &str, fragment: &str) -> String {
    static BODY: OnceLock<Regex> = OnceLock::new();
    let body = BODY.get_or_init(|| Regex::new(r"(?i)<body(\s[^>]*)?>").expect("body pattern is valid"));

    let at = body.find(html).map_or(0, |m| m.end());

    let mut out = String::with_capacity(html.len() + fragment.len());
    out.push_str(&html[..at]);
    out.push_str(fragment);
    out.push_str(&html[at..]);
    out
}

/// Escapes text for use in HTML content and double-quoted attributes.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '"', '<', '>']) {
        return Cow::Borrowed(s);
    }

    let mut escaped = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

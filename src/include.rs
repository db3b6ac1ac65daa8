//! Turning `#include` directives in rendered HTML into links.
//!
//! `:TOhtml` renders a directive such as `#include "util.h"` as
//!
//! ```html
//! <span class="PreProc">#include </span><span class="Constant">&quot;util.h&quot;</span>
//! ```
//!
//! The linker matches that shape and, when the named file can be found, wraps the file name in
//! an anchor. Everything else in the document is left untouched.

use std::borrow::Cow;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::page::escape_html;
use crate::resolve::Resolver;

/// Marker carried by every anchor the linker inserts.
pub const INCLUDE_LINK_MARKER: &str = r#"class="include" "#;

/// The two ways the renderer delimits an included file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludePattern {
    /// `#include "file.h"`, rendered as `&quot;file.h&quot;`.
    Quoted,
    /// `#include <file.h>`, rendered as `&lt;file.h&gt;`.
    Bracketed,
}

impl IncludePattern {
    /// Every variant, in the order the linker applies them.
    pub const ALL: [IncludePattern; 2] = [IncludePattern::Quoted, IncludePattern::Bracketed];

    /// Escaped opening and closing delimiters as they appear in the markup.
    pub fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            IncludePattern::Quoted => ("&quot;", "&quot;"),
            IncludePattern::Bracketed => ("&lt;", "&gt;"),
        }
    }

    /// Matches the directive markup up to and including the file name.
    ///
    /// Group `prefix` is the keyword wrapper plus the opening tag of the name wrapper, `name` is
    /// the file name. The name cannot contain markup or entities, so an anchor inserted by an
    /// earlier pass never matches again.
    pub fn regex(self) -> &'static Regex {
        static QUOTED: OnceLock<Regex> = OnceLock::new();
        static BRACKETED: OnceLock<Regex> = OnceLock::new();

        let cell = match self {
            IncludePattern::Quoted => &QUOTED,
            IncludePattern::Bracketed => &BRACKETED,
        };

        cell.get_or_init(|| {
            let (open, close) = self.delimiters();
            let pattern = format!(
                r"(?P<prefix><[^<>]*>#\s*include\s*</[^<>]*><[^<>]*>){}(?P<name>[^<>&]+){}",
                regex::escape(open),
                regex::escape(close),
            );
            Regex::new(&pattern).expect("include pattern is valid")
        })
    }
}

/// Rewrites include directives in `html`, which was rendered from `current`.
///
/// Names that do not resolve are left exactly as they were.
pub fn link_includes<'h>(html: &'h str, current: &Path, resolver: &Resolver<'_>) -> Cow<'h, str> {
    let mut html = Cow::Borrowed(html);

    for pattern in IncludePattern::ALL {
        let linked = match link_pattern(&html, pattern, current, resolver) {
            Cow::Owned(linked) => Some(linked),
            Cow::Borrowed(_) => None,
        };

        if let Some(linked) = linked {
            html = Cow::Owned(linked);
        }
    }

    html
}

fn link_pattern<'h>(
    html: &'h str,
    pattern: IncludePattern,
    current: &Path,
    resolver: &Resolver<'_>,
) -> Cow<'h, str> {
    let (open, close) = pattern.delimiters();

    pattern.regex().replace_all(html, |caps: &Captures<'_>| {
        let name = &caps["name"];

        match resolver.resolve_from(name, Some(current)) {
            Some(target) => format!(
                r#"{}{}<a style="color: inherit" {}href="/{}">{}</a>{}"#,
                &caps["prefix"],
                open,
                INCLUDE_LINK_MARKER,
                escape_html(&target.link),
                name,
                close,
            ),
            None => caps[0].to_owned(),
        }
    })
}

/// Appends `query` to the `href` of every anchor whose attributes begin with `prefix`.
///
/// An empty `prefix` applies to every `href` in the document.
pub fn add_query_to_links<'h>(html: &'h str, prefix: &str, query: &str) -> Cow<'h, str> {
    if query.is_empty() {
        return Cow::Borrowed(html);
    }

    let pattern = format!(r#"{}href="(?P<href>[^"]*)""#, regex::escape(prefix));
    let regex = match Regex::new(&pattern) {
        Ok(regex) => regex,
        Err(_) => return Cow::Borrowed(html),
    };

    regex.replace_all(html, |caps: &Captures<'_>| {
        format!(r#"{}href="{}{}""#, prefix, &caps["href"], escape_html(query))
    })
}

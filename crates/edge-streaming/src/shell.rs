//! Document shell: everything the browser needs before the first section.

use std::fmt::Write;

/// Content of `<head>`.
///
/// Inline scripts are rendered with the request nonce so they pass a
/// nonce-based Content Security Policy.
#[derive(Debug, Clone, Default)]
pub struct HeadContent {
    pub title: Option<String>,
    /// `(name, content)` pairs. Names starting with `og:` render as `property`.
    pub meta: Vec<(String, String)>,
    pub canonical: Option<String>,
    pub stylesheets: Vec<String>,
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
    /// Serialized JSON-LD documents.
    pub structured_data: Vec<String>,
    pub nonce: Option<String>,
}

impl HeadContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_meta(mut self, name: &str, content: &str) -> Self {
        self.meta.push((name.to_string(), content.to_string()));
        self
    }

    pub fn with_canonical(mut self, href: impl Into<String>) -> Self {
        self.canonical = Some(href.into());
        self
    }

    pub fn with_stylesheet(mut self, href: &str) -> Self {
        self.stylesheets.push(href.to_string());
        self
    }

    pub fn with_style(mut self, css: &str) -> Self {
        self.styles.push(css.to_string());
        self
    }

    pub fn with_script(mut self, js: &str) -> Self {
        self.scripts.push(js.to_string());
        self
    }

    pub fn with_structured_data(mut self, json: impl Into<String>) -> Self {
        self.structured_data.push(json.into());
        self
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn render(&self) -> String {
        let mut html = String::new();
        let nonce = match &self.nonce {
            Some(nonce) => format!(r#" nonce="{}""#, escape_attr(nonce)),
            None => String::new(),
        };

        html.push_str("<meta charset=\"utf-8\">\n");
        html.push_str("<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n");

        if let Some(title) = &self.title {
            let _ = writeln!(html, "<title>{}</title>", escape_attr(title));
        }

        for (name, content) in &self.meta {
            let key = if name.starts_with("og:") { "property" } else { "name" };
            let _ = writeln!(
                html,
                r#"<meta {}="{}" content="{}">"#,
                key,
                escape_attr(name),
                escape_attr(content)
            );
        }

        if let Some(canonical) = &self.canonical {
            let _ = writeln!(html, r#"<link rel="canonical" href="{}">"#, escape_attr(canonical));
        }

        for href in &self.stylesheets {
            let _ = writeln!(html, r#"<link rel="stylesheet" href="{}">"#, escape_attr(href));
        }

        for css in &self.styles {
            let _ = writeln!(html, "<style{}>{}</style>", nonce, css);
        }

        for json in &self.structured_data {
            let _ = writeln!(
                html,
                r#"<script type="application/ld+json"{}>{}</script>"#,
                nonce,
                json.replace("</", "<\\/")
            );
        }

        for js in &self.scripts {
            let _ = writeln!(html, "<script{}>{}</script>", nonce, js);
        }

        html
    }
}

/// Document frame around the streamed sections.
#[derive(Debug, Clone)]
pub struct Shell {
    pub lang: String,
    pub head: HeadContent,
    /// HTML after `<body>` and before the first section.
    pub body_start: String,
    /// HTML after the last section, up to `</html>`.
    pub body_end: String,
}

impl Shell {
    pub fn new(head: HeadContent) -> Self {
        Self {
            lang: "en".to_string(),
            head,
            body_start: "<main>\n".to_string(),
            body_end: "</main>\n".to_string(),
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_body_start(mut self, html: impl Into<String>) -> Self {
        self.body_start = html.into();
        self
    }

    pub fn with_body_end(mut self, html: impl Into<String>) -> Self {
        self.body_end = html.into();
        self
    }

    /// Everything up to and including `body_start`.
    pub fn render_opening(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n{}</head>\n<body>\n{}",
            escape_attr(&self.lang),
            self.head.render(),
            self.body_start
        )
    }

    /// `body_end` followed by the closing document tags.
    pub fn render_closing(&self) -> String {
        format!("{}</body>\n</html>\n", self.body_end)
    }
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_carry_nonce() {
        let head = HeadContent::new("Dress")
            .with_script("window.__tryOn = {};")
            .with_nonce("abc");
        let html = head.render();
        assert!(html.contains(r#"<script nonce="abc">window.__tryOn = {};</script>"#));
    }

    #[test]
    fn test_og_meta_uses_property() {
        let html = HeadContent::new("T")
            .with_meta("og:title", "Silk \"Dress\"")
            .with_meta("description", "d")
            .render();
        assert!(html.contains(r#"<meta property="og:title" content="Silk &quot;Dress&quot;">"#));
        assert!(html.contains(r#"<meta name="description" content="d">"#));
    }

    #[test]
    fn test_structured_data_cannot_close_script() {
        let html = HeadContent::default()
            .with_structured_data(r#"{"name":"</script><b>"}"#)
            .render();
        assert!(html.contains(r#"{"name":"<\/script><b>"}"#));
    }

    #[test]
    fn test_shell_opening_and_closing() {
        let shell = Shell::new(HeadContent::new("<Dress>")).with_body_start("<div id=\"app\">\n");
        let opening = shell.render_opening();
        assert!(opening.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
        assert!(opening.contains("<title>&lt;Dress&gt;</title>"));
        assert!(opening.ends_with("<body>\n<div id=\"app\">\n"));
        assert_eq!(shell.render_closing(), "</main>\n</body>\n</html>\n");
    }
}

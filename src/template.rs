//! Gallery page template.
//!
//! The template is plain HTML with `{{url}}`, `{{caption}}` and
//! `{{copyright}}` placeholders. Values are HTML-escaped on substitution.

use crate::{gallery::ImageRecord, Error};
use std::path::Path;

const PLACEHOLDERS: [&str; 3] = ["{{url}}", "{{caption}}", "{{copyright}}"];

#[derive(Clone, Debug)]
pub struct PageTemplate {
    source: String,
}

impl PageTemplate {
    /// Read and validate the template at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let source = std::fs::read_to_string(path)?;
        Self::from_source(source)
    }

    /// Build a template from its source text.
    ///
    /// A template that references none of the image fields is rejected.
    pub fn from_source(source: impl Into<String>) -> Result<Self, Error> {
        let source = source.into();
        if !PLACEHOLDERS.iter().any(|p| source.contains(p)) {
            return Err(Error::Template(String::from(
                "template does not reference any image field",
            )));
        }
        Ok(Self { source })
    }

    /// Substitute the image fields in a single pass, so field values are
    /// never scanned for placeholders themselves.
    pub fn render(&self, image: &ImageRecord) -> String {
        let mut page = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();

        while let Some(start) = rest.find("{{") {
            let (text, tail) = rest.split_at(start);
            page.push_str(text);

            match PLACEHOLDERS.iter().find(|p| tail.starts_with(*p)) {
                Some(placeholder) => {
                    escape_into(&mut page, field(image, placeholder));
                    rest = &tail[placeholder.len()..];
                }
                None => {
                    page.push_str("{{");
                    rest = &tail[2..];
                }
            }
        }
        page.push_str(rest);

        page
    }
}

fn field<'a>(image: &'a ImageRecord, placeholder: &str) -> &'a str {
    match placeholder {
        "{{url}}" => &image.url,
        "{{caption}}" => &image.caption,
        _ => &image.copyright,
    }
}

fn escape_into(page: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => page.push_str("&amp;"),
            '<' => page.push_str("&lt;"),
            '>' => page.push_str("&gt;"),
            '"' => page.push_str("&#34;"),
            '\'' => page.push_str("&#39;"),
            c => page.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(caption: &str) -> ImageRecord {
        ImageRecord {
            url: String::from("https://example.com/a.jpg"),
            caption: String::from(caption),
            copyright: String::from("Jane Doe"),
        }
    }

    #[test]
    fn renders_fields() {
        let template = PageTemplate::from_source(
            r#"<img src="{{url}}"><p>{{caption}}</p><small>{{copyright}}</small>"#,
        )
        .unwrap();

        let page = template.render(&image("Sunset"));

        assert_eq!(
            page,
            r#"<img src="https://example.com/a.jpg"><p>Sunset</p><small>Jane Doe</small>"#
        );
    }

    #[test]
    fn escapes_values() {
        let template = PageTemplate::from_source("<p>{{caption}}</p>").unwrap();

        let page = template.render(&image(r#"<script>alert("x")</script> & 'more'"#));

        assert_eq!(
            page,
            "<p>&lt;script&gt;alert(&#34;x&#34;)&lt;/script&gt; &amp; &#39;more&#39;</p>"
        );
    }

    #[test]
    fn values_are_not_expanded() {
        let template = PageTemplate::from_source("{{caption}}|{{copyright}}|{{other}}").unwrap();

        let page = template.render(&image("{{copyright}}"));

        assert_eq!(page, "{{copyright}}|Jane Doe|{{other}}");
    }

    #[test]
    fn rejects_template_without_fields() {
        let err = PageTemplate::from_source("<p>static</p>").unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = PageTemplate::load("/nonexistent/index.html").unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn bundled_template_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/index.html");
        let template = PageTemplate::load(path).unwrap();

        assert!(template.render(&image("Sunset")).contains("Sunset"));
    }
}

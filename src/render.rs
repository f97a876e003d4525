use handlebars::Handlebars;

use crate::model::{Style, View};

const LINK_TEMPLATE: &str = r#"<a href="{{url}}">{{url}}</a>"#;
const NOTICE_TEMPLATE: &str = "{{text}}";
const ERROR_TEMPLATE: &str = "{{text}}";

/// Rendered is what the result region receives for one outcome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rendered {
    pub style: Style,
    pub markup: String, // escaped markup for regions that take HTML
    pub text: String,   // raw payload for plain-text regions
    pub settled: bool,  // false while the request is still in flight
}

#[derive(Clone, Debug)]
pub struct Renderer {
    handlebars: Handlebars<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        let mut bars = Handlebars::new();
        bars.set_strict_mode(true);
        for (name, template) in [("link", LINK_TEMPLATE), ("notice", NOTICE_TEMPLATE), ("error", ERROR_TEMPLATE)] {
            if let Err(e) = bars.register_template_string(name, template) {
                tracing::error!("{e}");
            }
        }
        Self { handlebars: bars }
    }

    pub fn render(&self, view: &View) -> Rendered {
        let result = match view {
            View::Link(url) => self.handlebars.render("link", &serde_json::json!({"url": url})),
            View::Notice(text) => self.handlebars.render("notice", &serde_json::json!({"text": text})),
            View::Error(text) => self.handlebars.render("error", &serde_json::json!({"text": text})),
        };
        let markup = match result {
            Ok(markup) => markup,
            Err(e) => {
                tracing::error!("{e}");
                handlebars::html_escape(view.text())
            }
        };
        Rendered {
            style: view.style(),
            markup,
            text: view.text().to_string(),
            settled: !matches!(view, View::Notice(_)),
        }
    }
}

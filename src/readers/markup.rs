use scraper::{ElementRef, Html, Node};

/// One step of a left-to-right walk over a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    End {
        name: String,
    },
}

impl MarkupEvent {
    pub fn start(name: &str) -> Self {
        MarkupEvent::Start {
            name: name.to_string(),
            attrs: Vec::new(),
        }
    }

    pub fn start_with(name: &str, attrs: &[(&str, &str)]) -> Self {
        MarkupEvent::Start {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn text(text: &str) -> Self {
        MarkupEvent::Text(text.to_string())
    }

    pub fn end(name: &str) -> Self {
        MarkupEvent::End {
            name: name.to_string(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            MarkupEvent::Start { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Flatten a page into document-order events.
///
/// html5ever does the tolerant parsing (unclosed cells, implied `tbody`), so
/// every `Start` here is matched by an `End`.
pub fn events(markup: &str) -> Vec<MarkupEvent> {
    let document = Html::parse_document(markup);
    let mut out = Vec::new();
    walk(document.root_element(), &mut out);
    out
}

fn walk(element: ElementRef<'_>, out: &mut Vec<MarkupEvent>) {
    let value = element.value();
    let name = value.name().to_ascii_lowercase();

    out.push(MarkupEvent::Start {
        name: name.clone(),
        attrs: value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    });

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            walk(child_element, out);
        } else if let Node::Text(text) = child.value() {
            let text: &str = text;
            out.push(MarkupEvent::Text(text.to_string()));
        }
    }

    out.push(MarkupEvent::End { name });
}

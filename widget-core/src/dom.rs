//! A small in-memory document: the host side of the widget boundary.
//!
//! Elements are kept flat in document order. Each carries its tag name, the
//! `data-*` attributes (keys stored without the `data-` prefix) and the
//! content a widget rendered into it.

use scraper::{ElementRef, Html};
use std::{collections::BTreeMap, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    tag: String,
    dataset: BTreeMap<String, String>,
    content: String,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.dataset.get(key).map(String::as_str)
    }

    pub fn set_data(&mut self, key: &str, value: &str) {
        self.dataset.insert(key.to_string(), value.to_string());
    }

    pub fn dataset(&self) -> &BTreeMap<String, String> {
        &self.dataset
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: String) {
        self.content = content;
    }
}

type ReadyListener = Box<dyn FnOnce(&mut Document)>;

pub struct Document {
    elements: Vec<Element>,
    ready_state: ReadyState,
    ready_listeners: Vec<ReadyListener>,
}

impl Document {
    pub fn new(ready_state: ReadyState) -> Self {
        Self {
            elements: Vec::new(),
            ready_state,
            ready_listeners: Vec::new(),
        }
    }

    /// Build a document from HTML text. The result is still `Loading`; call
    /// [`Document::finish_loading`] to fire the ready listeners.
    pub fn parse_html(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Self::new(ReadyState::Loading);

        for node in parsed.root_element().descendants() {
            let Some(el) = ElementRef::wrap(node) else {
                continue;
            };

            let mut element = Element::new(el.value().name());
            for (name, value) in el.value().attrs() {
                if let Some(key) = name.strip_prefix("data-") {
                    element.set_data(key, value);
                }
            }
            doc.elements.push(element);
        }

        tracing::debug!(elements = doc.elements.len(), "Parsed HTML document");
        doc
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn append(&mut self, element: Element) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    pub fn append_element(&mut self, tag: &str) -> ElementId {
        self.append(Element::new(tag))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.0)
    }

    /// Every element with the given tag, in document order. Tag names
    /// compare ASCII case-insensitively, as in HTML.
    pub fn query_selector_all(&self, tag: &str) -> Vec<ElementId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.tag.eq_ignore_ascii_case(tag))
            .map(|(idx, _)| ElementId(idx))
            .collect()
    }

    pub fn data(&self, id: ElementId, key: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.data(key))
    }

    pub fn set_data(&mut self, id: ElementId, key: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.set_data(key, value);
        }
    }

    /// Register a callback that runs once when the document leaves `Loading`.
    /// Registering after that point runs nothing; check
    /// [`Document::ready_state`] first.
    pub fn on_ready<F>(&mut self, listener: F)
    where
        F: FnOnce(&mut Document) + 'static,
    {
        if self.ready_state == ReadyState::Loading {
            self.ready_listeners.push(Box::new(listener));
        }
    }

    /// Leave `Loading` and fire the ready listeners in registration order.
    pub fn finish_loading(&mut self) {
        if self.ready_state != ReadyState::Loading {
            return;
        }
        self.ready_state = ReadyState::Interactive;

        let listeners = std::mem::take(&mut self.ready_listeners);
        tracing::debug!(listeners = listeners.len(), "Document ready");
        for listener in listeners {
            listener(self);
        }
    }

    pub fn complete(&mut self) {
        self.finish_loading();
        self.ready_state = ReadyState::Complete;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(ReadyState::Complete)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.elements)
            .field("ready_state", &self.ready_state)
            .field("ready_listeners", &self.ready_listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn query_selector_all_matches_tag_in_order() {
        let mut doc = Document::default();
        assert!(doc.is_empty());

        let a = doc.append_element("weather-widget");
        doc.append_element("div");
        let b = doc.append_element("WEATHER-WIDGET");
        assert_eq!(doc.len(), 3);

        assert_eq!(doc.query_selector_all("weather-widget"), vec![a, b]);
        assert!(doc.query_selector_all("span").is_empty());
    }

    #[test]
    fn dataset_roundtrip() {
        let mut doc = Document::default();
        let id = doc.append_element("weather-widget");

        assert!(doc.data(id, "mounted").is_none());
        doc.set_data(id, "mounted", "true");
        assert_eq!(doc.data(id, "mounted"), Some("true"));
    }

    #[test]
    fn parse_html_collects_elements_and_data_attributes() {
        let doc = Document::parse_html(
            r#"<!doctype html>
            <html><body>
              <weather-widget data-city="Paris"></weather-widget>
              <p>hello</p>
              <weather-widget data-lat="51.5" data-lon="-0.12" data-mounted="true"></weather-widget>
            </body></html>"#,
        );

        assert_eq!(doc.ready_state(), ReadyState::Loading);
        // html, head, body, two placeholders and the paragraph
        assert_eq!(doc.len(), 6);

        let hosts = doc.query_selector_all("weather-widget");
        assert_eq!(hosts.len(), 2);
        assert_eq!(doc.data(hosts[0], "city"), Some("Paris"));
        assert_eq!(doc.data(hosts[1], "lat"), Some("51.5"));
        assert_eq!(doc.data(hosts[1], "mounted"), Some("true"));
        assert_eq!(doc.query_selector_all("p").len(), 1);
    }

    #[test]
    fn ready_listeners_fire_once() {
        let mut doc = Document::new(ReadyState::Loading);
        let fired = Rc::new(Cell::new(0));

        let counter = Rc::clone(&fired);
        doc.on_ready(move |_| counter.set(counter.get() + 1));

        doc.finish_loading();
        doc.finish_loading();
        doc.complete();

        assert_eq!(fired.get(), 1);
        assert_eq!(doc.ready_state(), ReadyState::Complete);
    }

    #[test]
    fn listener_registered_after_ready_is_ignored() {
        let mut doc = Document::new(ReadyState::Interactive);
        let fired = Rc::new(Cell::new(false));

        let flag = Rc::clone(&fired);
        doc.on_ready(move |_| flag.set(true));
        doc.finish_loading();

        assert!(!fired.get());
    }
}

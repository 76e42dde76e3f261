//! Attaching widget components to placeholder elements.
//!
//! A host element moves from unmounted to mounted exactly once. The
//! `data-mounted="true"` attribute is the only record of that transition, so
//! scanning the same document again never attaches a second component.

use std::{cell::RefCell, rc::Rc};

use crate::dom::{Document, ElementId, ReadyState};

/// Placeholder tag that marks where a widget goes.
pub const WIDGET_TAG: &str = "weather-widget";

/// Dataset key of the mount flag (`data-mounted` in HTML).
pub const MOUNTED_KEY: &str = "mounted";
pub const MOUNTED_VALUE: &str = "true";

/// Creates the component bound to a host element.
pub trait WidgetFactory {
    type Widget;

    fn create(&self, doc: &Document, host: ElementId) -> Self::Widget;
}

impl<W, F> WidgetFactory for F
where
    F: Fn(&Document, ElementId) -> W,
{
    type Widget = W;

    fn create(&self, doc: &Document, host: ElementId) -> W {
        self(doc, host)
    }
}

pub fn is_mounted(doc: &Document, host: ElementId) -> bool {
    doc.data(host, MOUNTED_KEY) == Some(MOUNTED_VALUE)
}

#[derive(Debug)]
pub struct WidgetMounter<F: WidgetFactory> {
    factory: F,
    tag: String,
    instances: Vec<F::Widget>,
}

impl<F: WidgetFactory> WidgetMounter<F> {
    pub fn new(factory: F) -> Self {
        Self::with_tag(factory, WIDGET_TAG)
    }

    pub fn with_tag(factory: F, tag: &str) -> Self {
        Self {
            factory,
            tag: tag.to_string(),
            instances: Vec::new(),
        }
    }

    /// Mount a component on every placeholder that is not mounted yet.
    /// Returns how many were mounted by this call.
    pub fn mount_widgets(&mut self, doc: &mut Document) -> usize {
        let mut mounted = 0;

        for host in doc.query_selector_all(&self.tag) {
            if is_mounted(doc, host) {
                continue;
            }

            let widget = self.factory.create(doc, host);
            self.instances.push(widget);
            doc.set_data(host, MOUNTED_KEY, MOUNTED_VALUE);
            mounted += 1;
        }

        tracing::debug!(tag = %self.tag, mounted, total = self.instances.len(), "Mounted widgets");
        mounted
    }

    pub fn instances(&self) -> &[F::Widget] {
        &self.instances
    }

    /// Hand the mounted components over to the caller. Hosts stay flagged,
    /// so later scans still skip them.
    pub fn take_instances(&mut self) -> Vec<F::Widget> {
        std::mem::take(&mut self.instances)
    }
}

/// Run the mounter as soon as the document allows: right away when it is past
/// `Loading`, otherwise once from the document's ready event. The mounter stays
/// shared so callers can scan again after inserting new placeholders.
pub fn install<F>(mounter: Rc<RefCell<WidgetMounter<F>>>, doc: &mut Document)
where
    F: WidgetFactory + 'static,
    F::Widget: 'static,
{
    if doc.ready_state() == ReadyState::Loading {
        tracing::debug!("Document still loading, deferring widget mount");
        doc.on_ready(move |doc| {
            mounter.borrow_mut().mount_widgets(doc);
        });
    } else {
        mounter.borrow_mut().mount_widgets(doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    fn counting_mounter() -> WidgetMounter<impl Fn(&Document, ElementId) -> ElementId> {
        WidgetMounter::new(|_: &Document, host: ElementId| host)
    }

    #[test]
    fn mounts_every_unmounted_placeholder() {
        let mut doc = Document::default();
        let a = doc.append_element(WIDGET_TAG);
        let b = doc.append_element(WIDGET_TAG);
        let mut mounter = counting_mounter();

        assert_eq!(mounter.mount_widgets(&mut doc), 2);

        assert_eq!(mounter.instances(), &[a, b]);
        assert!(is_mounted(&doc, a));
        assert!(is_mounted(&doc, b));
        assert_eq!(doc.data(a, "mounted"), Some("true"));
    }

    #[test]
    fn second_scan_is_a_no_op() {
        let mut doc = Document::default();
        doc.append_element(WIDGET_TAG);
        doc.append_element(WIDGET_TAG);
        let mut mounter = counting_mounter();

        mounter.mount_widgets(&mut doc);
        assert_eq!(mounter.mount_widgets(&mut doc), 0);
        assert_eq!(mounter.instances().len(), 2);
    }

    #[test]
    fn skips_hosts_flagged_before_the_scan() {
        let mut doc = Document::default();
        let mut pre = Element::new(WIDGET_TAG);
        pre.set_data(MOUNTED_KEY, MOUNTED_VALUE);
        doc.append(pre);
        let fresh = doc.append_element(WIDGET_TAG);
        let mut mounter = counting_mounter();

        assert_eq!(mounter.mount_widgets(&mut doc), 1);
        assert_eq!(mounter.instances(), &[fresh]);
    }

    #[test]
    fn other_flag_values_do_not_count_as_mounted() {
        let mut doc = Document::default();
        let host = doc.append_element(WIDGET_TAG);
        doc.set_data(host, MOUNTED_KEY, "false");
        let mut mounter = counting_mounter();

        assert_eq!(mounter.mount_widgets(&mut doc), 1);
        assert!(is_mounted(&doc, host));
    }

    #[test]
    fn ignores_other_tags() {
        let mut doc = Document::default();
        let div = doc.append_element("div");
        let mut mounter = counting_mounter();

        assert_eq!(mounter.mount_widgets(&mut doc), 0);
        assert!(!is_mounted(&doc, div));
    }

    #[test]
    fn late_placeholder_waits_for_next_scan() {
        let mut doc = Document::default();
        doc.append_element(WIDGET_TAG);
        let mut mounter = counting_mounter();
        mounter.mount_widgets(&mut doc);

        let late = doc.append_element(WIDGET_TAG);
        assert!(!is_mounted(&doc, late));
        assert_eq!(mounter.instances().len(), 1);

        assert_eq!(mounter.mount_widgets(&mut doc), 1);
        assert!(is_mounted(&doc, late));
        assert_eq!(mounter.instances().len(), 2);
    }

    #[test]
    fn custom_tag() {
        let mut doc = Document::default();
        doc.append_element(WIDGET_TAG);
        let other = doc.append_element("forecast-widget");
        let mut mounter = WidgetMounter::with_tag(|_: &Document, host: ElementId| host, "forecast-widget");

        assert_eq!(mounter.mount_widgets(&mut doc), 1);
        assert_eq!(mounter.instances(), &[other]);
    }

    #[test]
    fn take_instances_keeps_hosts_flagged() {
        let mut doc = Document::default();
        doc.append_element(WIDGET_TAG);
        let mut mounter = counting_mounter();
        mounter.mount_widgets(&mut doc);

        assert_eq!(mounter.take_instances().len(), 1);
        assert_eq!(mounter.mount_widgets(&mut doc), 0);
        assert!(mounter.instances().is_empty());
    }

    #[test]
    fn install_mounts_immediately_when_ready() {
        let mut doc = Document::new(ReadyState::Interactive);
        doc.append_element(WIDGET_TAG);
        let mounter = Rc::new(RefCell::new(counting_mounter()));

        install(Rc::clone(&mounter), &mut doc);

        assert_eq!(mounter.borrow().instances().len(), 1);
    }

    #[test]
    fn install_defers_until_ready_event() {
        let mut doc = Document::new(ReadyState::Loading);
        let host = doc.append_element(WIDGET_TAG);
        let mounter = Rc::new(RefCell::new(counting_mounter()));

        install(Rc::clone(&mounter), &mut doc);
        assert!(mounter.borrow().instances().is_empty());
        assert!(!is_mounted(&doc, host));

        doc.finish_loading();
        assert_eq!(mounter.borrow().instances(), &[host]);
        assert!(is_mounted(&doc, host));

        // The ready event fires once; the manual re-scan stays available.
        doc.append_element(WIDGET_TAG);
        doc.complete();
        assert_eq!(mounter.borrow().instances().len(), 1);
        assert_eq!(mounter.borrow_mut().mount_widgets(&mut doc), 1);
    }

    #[test]
    fn parsed_page_mounts_on_ready() {
        let mut doc = Document::parse_html(
            r#"<body><weather-widget></weather-widget><weather-widget data-mounted="true"></weather-widget></body>"#,
        );
        let mounter = Rc::new(RefCell::new(counting_mounter()));

        install(Rc::clone(&mounter), &mut doc);
        doc.finish_loading();

        assert_eq!(mounter.borrow().instances().len(), 1);
        assert!(
            doc.query_selector_all(WIDGET_TAG)
                .into_iter()
                .all(|host| is_mounted(&doc, host))
        );
    }
}

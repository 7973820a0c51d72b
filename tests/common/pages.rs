use page_grounding::dom::document::{Document, Layout, NodeId, Rect};

/// Hand-built page with `<html>`, `<head>` and `<body>`. Elements created
/// through [`Page::el`] get a visible rect inside the default viewport.
pub struct Page {
    pub doc: Document,
    pub html: NodeId,
    pub head: NodeId,
    pub body: NodeId,
    placed: usize,
}

impl Page {
    pub fn new() -> Self {
        let mut doc = Document::new();
        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        let root = doc.root();
        doc.append_child(root, html).unwrap();
        doc.append_child(html, head).unwrap();
        doc.append_child(html, body).unwrap();
        doc.set_layout(
            body,
            Layout {
                rects: vec![Rect::new(0.0, 0.0, 1280.0, 2000.0)],
                ..Layout::default()
            },
        );
        Self {
            doc,
            html,
            head,
            body,
            placed: 0,
        }
    }

    /// Visible element appended under `parent`.
    pub fn el(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.hidden(parent, tag, attrs);
        let y = (self.placed % 25) as f64 * 24.0;
        self.placed += 1;
        self.rect(node, 10.0, y, 300.0, 20.0);
        node
    }

    /// Element without any layout (zero-area).
    pub fn hidden(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.doc.create_element(tag);
        for (name, value) in attrs {
            self.doc.set_attr(node, name, value);
        }
        self.doc.append_child(parent, node).unwrap();
        node
    }

    pub fn text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node).unwrap();
        node
    }

    pub fn rect(&mut self, node: NodeId, x: f64, y: f64, width: f64, height: f64) {
        self.doc.set_layout(
            node,
            Layout {
                rects: vec![Rect::new(x, y, width, height)],
                ..Layout::default()
            },
        );
    }
}

/// `ul.list > li.item` x3, each item holding a link and a sentence.
pub struct ListPage {
    pub page: Page,
    pub list: NodeId,
    pub items: Vec<NodeId>,
    pub links: Vec<NodeId>,
}

pub fn list_page() -> ListPage {
    let mut page = Page::new();
    let body = page.body;
    let list = page.el(body, "ul", &[("class", "list")]);

    let mut items = Vec::new();
    let mut links = Vec::new();
    for i in 1..=3 {
        let item = page.el(list, "li", &[("class", "item")]);
        let href = format!("/articles/{i}");
        let link = page.el(item, "a", &[("href", href.as_str())]);
        page.text(link, &format!("Article number {i}"));
        page.text(item, " with a summary that is long enough to count");
        items.push(item);
        links.push(link);
    }

    ListPage {
        page,
        list,
        items,
        links,
    }
}

/// A small form: text input, password, select, textarea, checkbox, button
/// and a plain paragraph.
pub struct FormPage {
    pub page: Page,
    pub text_input: NodeId,
    pub password: NodeId,
    pub select: NodeId,
    pub textarea: NodeId,
    pub checkbox: NodeId,
    pub button: NodeId,
    pub editor: NodeId,
    pub paragraph: NodeId,
}

pub fn form_page() -> FormPage {
    let mut page = Page::new();
    let body = page.body;
    let form = page.el(body, "form", &[("id", "signup")]);

    let label = page.el(form, "label", &[("for", "email")]);
    page.text(label, "Email address");
    let text_input = page.el(
        form,
        "input",
        &[("id", "email"), ("type", "email"), ("name", "email"), ("placeholder", "you@example.com")],
    );
    let password = page.el(form, "input", &[("type", "password"), ("name", "pw"), ("value", "hunter2")]);

    let select = page.el(form, "select", &[("name", "plan")]);
    let free = page.el(select, "option", &[("value", "free")]);
    page.text(free, "Free");
    let pro = page.el(select, "option", &[("value", "pro"), ("selected", "")]);
    page.text(pro, "Pro");
    let team = page.el(select, "option", &[]);
    page.text(team, "  Team   plan ");

    let textarea = page.el(form, "textarea", &[("name", "bio")]);
    let checkbox = page.el(form, "input", &[("type", "checkbox"), ("name", "terms")]);
    let button = page.el(form, "button", &[("type", "submit")]);
    page.text(button, "Sign up");

    let editor = page.el(body, "div", &[("contenteditable", "true"), ("role", "textbox")]);
    let paragraph = page.el(body, "p", &[]);
    page.text(paragraph, "Plain text");

    FormPage {
        page,
        text_input,
        password,
        select,
        textarea,
        checkbox,
        button,
        editor,
        paragraph,
    }
}

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::ElementRef;

/// Renders an element's visible text roughly the way a browser's `innerText`
/// does: runs of whitespace collapse to one space, block elements start on a
/// new line and paragraphs/headings are separated by a blank line.
pub fn inner_text(element: ElementRef) -> String {
    let mut ctx = TextContext::default();
    visit_children(element, &mut ctx);
    ctx.into_text()
}

fn visit_node(node: NodeRef<'_, Node>, ctx: &mut TextContext) {
    match node.value() {
        Node::Text(text) => ctx.append_text(text),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, ctx);
            }
        }
        _ => {
            for child in node.children() {
                visit_node(child, ctx);
            }
        }
    }
}

fn visit_element(element: ElementRef, ctx: &mut TextContext) {
    let tag = element.value().name().to_ascii_lowercase();
    match tag.as_str() {
        "br" => ctx.line_break(),
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            ctx.request_breaks(2);
            visit_children(element, ctx);
            ctx.request_breaks(2);
        }
        "div" | "li" | "ul" | "ol" | "section" | "article" | "header" | "footer" | "nav"
        | "main" | "aside" | "table" | "tr" | "blockquote" | "dl" | "dt" | "dd" | "pre"
        | "figure" | "form" => {
            ctx.request_breaks(1);
            visit_children(element, ctx);
            ctx.request_breaks(1);
        }
        "script" | "style" | "noscript" | "template" | "iframe" => {}
        _ => visit_children(element, ctx),
    }
}

fn visit_children(element: ElementRef, ctx: &mut TextContext) {
    for child in element.children() {
        visit_node(child, ctx);
    }
}

#[derive(Default)]
struct TextContext {
    builder: String,
    pending_breaks: usize,
}

impl TextContext {
    fn into_text(self) -> String {
        self.builder.trim().to_string()
    }

    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                let at_line_start = self.builder.is_empty() || self.builder.ends_with(['\n', ' ']);
                if self.pending_breaks == 0 && !at_line_start {
                    self.builder.push(' ');
                }
            } else {
                self.flush_breaks();
                self.builder.push(ch);
            }
        }
    }

    fn request_breaks(&mut self, count: usize) {
        self.pending_breaks = self.pending_breaks.max(count);
    }

    fn line_break(&mut self) {
        self.flush_breaks();
        self.trim_trailing_space();
        self.builder.push('\n');
    }

    fn flush_breaks(&mut self) {
        if self.pending_breaks == 0 {
            return;
        }
        if !self.builder.is_empty() {
            self.trim_trailing_space();
            let existing = self.builder.len() - self.builder.trim_end_matches('\n').len();
            for _ in existing..self.pending_breaks {
                self.builder.push('\n');
            }
        }
        self.pending_breaks = 0;
    }

    fn trim_trailing_space(&mut self) {
        while self.builder.ends_with(' ') {
            self.builder.pop();
        }
    }
}

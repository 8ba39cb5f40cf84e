//! HTML parser – converts a normalized document (or a bare fragment) into a
//! simple DOM tree.
//!
//! Generated guides use a small, predictable vocabulary:
//! - Structural: div, section, article, header, footer, figure, p, h1-h6,
//!   ul, ol, li, table, thead, tbody, tr, td, th, img, br
//! - Inline: span, strong, b, em, i, a
//! - Metadata (parsed, never rendered): head, title, meta, link, script, style,
//!   svg, noscript
//!
//! Styling comes from `class` and `style` attributes.

use std::collections::HashMap;

use markup5ever::data::NAMED_ENTITIES;

/// Deepest element nesting kept in the tree. Elements opened below this
/// level are dropped and their content joins the deepest kept element, so
/// every later tree walk stays within a fixed stack budget.
pub const MAX_DEPTH: usize = 128;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Body,
    Div,
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Ul,
    Ol,
    Li,
    Table,
    Tr,
    Td,
    Th,
    Span,
    Strong,
    Em,
    A,
    Img,
    Br,
    /// title, meta, link, script, style – kept in the tree, never rendered.
    Metadata(String),
    /// Anything else renders as a block container.
    Unknown(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "body" => Tag::Body,
            "div" | "section" | "article" | "header" | "footer" | "figure" | "main" | "nav"
            | "thead" | "tbody" | "tfoot" => Tag::Div,
            "p" | "blockquote" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "h5" => Tag::H5,
            "h6" => Tag::H6,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "span" | "small" | "mark" | "code" => Tag::Span,
            "strong" | "b" => Tag::Strong,
            "em" | "i" => Tag::Em,
            "a" => Tag::A,
            "img" => Tag::Img,
            "br" => Tag::Br,
            "title" | "meta" | "link" | "script" | "style" | "svg" | "noscript" => {
                Tag::Metadata(lower)
            }
            _ => Tag::Unknown(lower),
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6)
    }

    /// Elements whose inline content is merged into one wrapped text run.
    pub fn is_text_block(&self) -> bool {
        self.is_heading() || *self == Tag::P
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Tag::Span | Tag::Strong | Tag::Em | Tag::A | Tag::Br)
    }

    /// Elements that never have children or a closing tag.
    fn is_void(name: &str) -> bool {
        matches!(
            name.to_ascii_lowercase().as_str(),
            "img" | "br" | "hr" | "meta" | "link" | "input" | "source" | "wbr"
        )
    }

    /// Elements whose content is raw text up to the matching closing tag.
    fn is_raw_text(name: &str) -> bool {
        matches!(name.to_ascii_lowercase().as_str(), "script" | "style")
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(|s| s.as_str())
    }

    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").map(|s| s.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(|s| s.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parser – recursive descent, tolerant of unclosed tags
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of DOM nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    let nodes = parser.parse_nodes();
    if parser.flattened > 0 {
        log::warn!(
            "flattened {} elements nested deeper than {MAX_DEPTH} levels",
            parser.flattened
        );
    }
    nodes
}

/// Outcome of parsing one piece of markup.
enum Parsed {
    Node(DomNode),
    /// Comment, doctype or processing instruction.
    Skipped,
    /// Opening tag past [`MAX_DEPTH`]; its content continues in the
    /// enclosing node list.
    Flattened,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
    flattened: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
            flattened: 0,
        }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        // Flattened elements still open in this list.
        let mut open = 0usize;
        loop {
            self.skip_inter_element_whitespace();
            if self.eof() {
                break;
            }
            if self.starts_with("</") {
                if open == 0 {
                    break;
                }
                open -= 1;
                self.skip_closing_tag();
                continue;
            }
            match self.parse_node() {
                Parsed::Node(node) => nodes.push(node),
                Parsed::Flattened => open += 1,
                Parsed::Skipped => {}
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Parsed {
        if self.starts_with("<!--") {
            self.skip_past("-->");
            return Parsed::Skipped;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            self.skip_past(">");
            return Parsed::Skipped;
        }
        if self.starts_with("<") {
            self.parse_element()
        } else {
            Parsed::Node(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        while !self.eof() && !self.starts_with("<") {
            self.advance();
        }
        DomNode::Text(decode_entities(&self.input[start..self.pos]))
    }

    fn parse_element(&mut self) -> Parsed {
        self.advance(); // '<'
        let name = self.parse_name();
        let mut elem = ElementNode::new(Tag::from_name(&name));

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if self.pos == before {
                // Stray character (e.g. a lone quote); step over it.
                self.advance();
                continue;
            }
            if !key.is_empty() {
                elem.attributes.insert(key.to_ascii_lowercase(), value);
            }
        }

        if self.starts_with("/>") {
            self.pos += 2;
            return Parsed::Node(DomNode::Element(elem));
        }
        if self.starts_with(">") {
            self.pos += 1;
        }
        if Tag::is_void(&name) {
            return Parsed::Node(DomNode::Element(elem));
        }
        if self.depth >= MAX_DEPTH && !Tag::is_raw_text(&name) {
            self.flattened += 1;
            return Parsed::Flattened;
        }

        if Tag::is_raw_text(&name) {
            let close = format!("</{}", name.to_ascii_lowercase());
            let rest = &self.input[self.pos..];
            let end = rest.to_ascii_lowercase().find(&close).unwrap_or(rest.len());
            let raw = &rest[..end];
            if !raw.trim().is_empty() {
                elem.children.push(DomNode::Text(raw.to_string()));
            }
            self.pos += end;
        } else {
            self.depth += 1;
            elem.children = self.parse_nodes();
            self.depth -= 1;
        }

        // Closing tag (whatever its name – tolerant of mismatches).
        if self.starts_with("</") {
            self.skip_closing_tag();
        }

        Parsed::Node(DomNode::Element(elem))
    }

    fn skip_closing_tag(&mut self) {
        self.pos += 2;
        self.parse_name();
        self.skip_past(">");
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(); // '='
        self.skip_whitespace();
        (key, self.parse_attr_value())
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ["\"", "'"] {
            if self.starts_with(quote) {
                self.advance();
                let start = self.pos;
                while !self.eof() && !self.starts_with(quote) {
                    self.advance();
                }
                let val = decode_entities(&self.input[start..self.pos]);
                if !self.eof() {
                    self.advance();
                }
                return val;
            }
        }
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_whitespace() || c == '>' {
                break;
            }
            self.advance();
        }
        self.input[start..self.pos].to_string()
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Skip a whitespace run only when it separates two tags.
    fn skip_inter_element_whitespace(&mut self) {
        let saved = self.pos;
        self.skip_whitespace();
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
        }
    }

    fn skip_past(&mut self, marker: &str) {
        match self.input[self.pos..].find(marker) {
            Some(idx) => self.pos += idx + marker.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current_char() {
            self.pos += c.len_utf8();
        }
    }
}

/// Decode character references: the HTML5 named-entity table plus decimal
/// and hex numeric references. Anything unrecognised is kept verbatim.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx + 1..];
        match decode_reference(tail) {
            Some((decoded, used)) => {
                out.push_str(&decoded);
                rest = &tail[used..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the reference at the start of `tail` (the text after `&`).
/// Returns the decoded characters and the bytes consumed, `;` included.
fn decode_reference(tail: &str) -> Option<(String, usize)> {
    let semi = tail.find(';')?;
    let body = &tail[..semi];
    if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(|c| (c.to_string(), semi + 1));
    }
    if body.is_empty() || body.len() > 32 || !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    // Prefix entries in the table map to (0, 0).
    let &(first, second) = NAMED_ENTITIES.get(&tail[..=semi])?;
    let mut decoded: String = char::from_u32(first).filter(|_| first != 0)?.into();
    if let Some(c) = char::from_u32(second).filter(|_| second != 0) {
        decoded.push(c);
    }
    Some((decoded, semi + 1))
}

// ---------------------------------------------------------------------------
// Convenience helpers
// ---------------------------------------------------------------------------

/// Find the `<body>` element and return its children, or return all nodes if
/// no `<body>` is present.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Body {
                return e.children.clone();
            }
            if e.tag == Tag::Html {
                let inner = body_children(&e.children);
                if !inner.is_empty() {
                    return inner;
                }
            }
        }
    }
    nodes.to_vec()
}

/// Depth-first search for the element carrying `id`.
pub fn find_by_id<'a>(nodes: &'a [DomNode], id: &str) -> Option<&'a ElementNode> {
    nodes.iter().find_map(|node| match node {
        DomNode::Element(e) if e.id() == Some(id) => Some(e),
        DomNode::Element(e) => find_by_id(&e.children, id),
        DomNode::Text(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_card_with_arbitrary_classes() {
        let html = r#"<div class="bg-[#eef3fe] rounded-2xl p-8"><h1>Hola</h1></div>"#;
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        if let DomNode::Element(e) = &nodes[0] {
            assert_eq!(e.tag, Tag::Div);
            assert_eq!(e.classes(), vec!["bg-[#eef3fe]", "rounded-2xl", "p-8"]);
            assert_eq!(e.children.len(), 1);
        } else {
            panic!("Expected element");
        }
    }

    #[test]
    fn void_elements_do_not_swallow_siblings() {
        let nodes = parse_html(r#"<link href="x" rel="stylesheet"><p>after</p>"#);
        assert_eq!(nodes.len(), 2);
        let nodes = parse_html("<p>a<br>b</p>");
        if let DomNode::Element(p) = &nodes[0] {
            assert_eq!(p.children.len(), 3);
        } else {
            panic!("Expected p element");
        }
    }

    #[test]
    fn script_body_is_raw_text() {
        let nodes = parse_html("<script>if (a < b) { go(); }</script><p>x</p>");
        assert_eq!(nodes.len(), 2);
        if let DomNode::Element(s) = &nodes[0] {
            assert_eq!(s.tag, Tag::Metadata("script".into()));
            assert!(matches!(&s.children[0], DomNode::Text(t) if t.contains("a < b")));
        } else {
            panic!("Expected script element");
        }
    }

    #[test]
    fn find_container_by_id() {
        let html = r#"<html><body><div><div id="cf-preview-card"><p>x</p></div></div></body></html>"#;
        let nodes = parse_html(html);
        let card = find_by_id(&nodes, "cf-preview-card").unwrap();
        assert_eq!(card.children.len(), 1);
        assert!(find_by_id(&nodes, "missing").is_none());
    }

    #[test]
    fn numeric_entities_decode() {
        assert_eq!(decode_entities("Espa&#241;a &#xE1; &amp;lt;"), "España á &lt;");
        assert_eq!(decode_entities("a &# b"), "a &# b");
    }

    #[test]
    fn named_entities_decode() {
        assert_eq!(
            decode_entities("&iquest;Qu&eacute; pa&iacute;s? Espa&ntilde;a &copy; 2024&hellip;"),
            "¿Qué país? España © 2024…"
        );
        assert_eq!(decode_entities("a&nbsp;b &mdash; &Aacute;rea"), "a\u{00A0}b — Área");
        // Unknown names and missing semicolons stay as written.
        assert_eq!(decode_entities("&madeup; &aacute &amp"), "&madeup; &aacute &amp");
    }

    #[test]
    fn entities_decode_in_text_and_attributes() {
        let nodes = parse_html(r#"<p title="Informaci&oacute;n">Administraci&oacute;n</p>"#);
        let DomNode::Element(p) = &nodes[0] else {
            panic!("Expected p element");
        };
        assert_eq!(p.attributes["title"], "Información");
        assert!(matches!(&p.children[0], DomNode::Text(t) if t == "Administración"));
    }

    fn nesting_depth(nodes: &[DomNode]) -> usize {
        nodes
            .iter()
            .map(|n| match n {
                DomNode::Element(e) => 1 + nesting_depth(&e.children),
                DomNode::Text(_) => 0,
            })
            .max()
            .unwrap_or(0)
    }

    fn deep_divs(levels: usize, inner: &str) -> String {
        format!("{}{inner}{}", "<div>".repeat(levels), "</div>".repeat(levels))
    }

    #[test]
    fn deep_nesting_is_flattened_at_the_limit() {
        let html = format!("{}<p>despu&eacute;s</p>", deep_divs(5000, "<p>hondo</p><span>x</span>"));
        let nodes = parse_html(&html);

        assert_eq!(nesting_depth(&nodes), MAX_DEPTH);
        // Siblings after the deep subtree are not swallowed by it.
        assert_eq!(nodes.len(), 2);
        assert!(matches!(&nodes[1], DomNode::Element(e) if e.tag == Tag::P));

        let mut deepest = &nodes[0];
        while let DomNode::Element(e) = deepest {
            match e.children.first() {
                Some(child @ DomNode::Element(c)) if c.tag == Tag::Div => deepest = child,
                _ => break,
            }
        }
        let DomNode::Element(last) = deepest else {
            panic!("Expected element");
        };
        // Content below the limit survives as text of the deepest kept element.
        let texts: Vec<&str> = last
            .children
            .iter()
            .filter_map(|c| match c {
                DomNode::Text(t) => Some(t.as_str()),
                DomNode::Element(_) => None,
            })
            .collect();
        assert_eq!(texts, vec!["hondo", "x"]);
    }

    #[test]
    fn nesting_within_the_limit_is_kept() {
        let nodes = parse_html(&deep_divs(MAX_DEPTH - 1, "<span>x</span>"));
        assert_eq!(nesting_depth(&nodes), MAX_DEPTH);
    }

    #[test]
    fn headings_are_recognised() {
        for (name, tag) in [("h4", Tag::H4), ("H2", Tag::H2), ("strong", Tag::Strong)] {
            assert_eq!(Tag::from_name(name), tag);
        }
        assert!(Tag::H5.is_heading());
        assert!(!Tag::P.is_heading());
    }
}

// Minimal XML element tree and serializer for the SVG writer.
//
// roxmltree is read-only, so output goes through this small builder
// instead. Attributes keep insertion order, which keeps the emitted
// documents stable across runs.

pub(crate) const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub(crate) const FAINT_NS: &str = "http://www.code.google.com/p/faint-graphics-editor";
pub(crate) const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    // Sets an attribute, replacing any previous value in place.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        for attr in &mut self.attrs {
            if attr.0 == key {
                attr.1 = value;
                return;
            }
        }
        self.attrs.push((key.to_string(), value));
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn append(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn write_compact(&self, out: &mut String) {
        self.write_start_tag(out);
        if self.text.is_empty() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        escape_xml_text(&self.text, out);
        for child in &self.children {
            child.write_compact(out);
        }
        self.write_end_tag(out);
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        self.write_start_tag(out);
        if self.text.is_empty() && self.children.is_empty() {
            out.push_str("/>\n");
        } else if !self.text.is_empty() {
            // Text content is whitespace-sensitive, so elements carrying
            // it serialize on a single line.
            out.push('>');
            escape_xml_text(&self.text, out);
            for child in &self.children {
                child.write_compact(out);
            }
            self.write_end_tag(out);
            out.push('\n');
        } else {
            out.push_str(">\n");
            for child in &self.children {
                child.write_pretty(out, depth + 1);
            }
            for _ in 0..depth {
                out.push_str("  ");
            }
            self.write_end_tag(out);
            out.push('\n');
        }
    }

    fn write_start_tag(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            escape_xml_attr(value, out);
            out.push('"');
        }
    }

    fn write_end_tag(&self, out: &mut String) {
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

pub fn to_svg_document(root: &Element, pretty: bool) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str(
        "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \
         \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n",
    );
    if pretty {
        root.write_pretty(&mut out, 0);
    } else {
        root.write_compact(&mut out);
        out.push('\n');
    }
    out
}

fn escape_xml_attr(input: &str, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
}

fn escape_xml_text(input: &str, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

// Formats a coordinate with the shortest representation that parses
// back to the same f64.
pub(crate) fn fmt_f64(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_elements_self_close() {
        let mut el = Element::new("rect");
        el.set("x", "10");
        let mut out = String::new();
        el.write_compact(&mut out);
        assert_eq!(out, r#"<rect x="10"/>"#);
    }

    #[test]
    fn attributes_keep_insertion_order_and_replace_in_place() {
        let mut el = Element::new("svg");
        el.set("width", "640");
        el.set("height", "480");
        el.set("width", "320");
        let mut out = String::new();
        el.write_compact(&mut out);
        assert_eq!(out, r#"<svg width="320" height="480"/>"#);
    }

    #[test]
    fn attr_values_and_text_are_escaped() {
        let mut el = Element::new("text");
        el.set("font-family", "\"Sans\" & <mono>");
        el.set_text("a < b & c");
        let mut out = String::new();
        el.write_compact(&mut out);
        assert_eq!(
            out,
            r#"<text font-family="&quot;Sans&quot; &amp; &lt;mono&gt;">a &lt; b &amp; c</text>"#
        );
    }

    #[test]
    fn pretty_printing_indents_but_keeps_text_inline() {
        let mut tspan = Element::new("tspan");
        tspan.set_text("  two spaces  ");
        let mut text = Element::new("text");
        text.append(tspan);
        let mut root = Element::new("svg");
        root.append(text);

        let doc = to_svg_document(&root, true);
        assert!(
            doc.contains("<svg>\n  <text>\n    <tspan>  two spaces  </tspan>\n  </text>\n</svg>"),
            "tspan text must stay inline: {doc}"
        );
    }

    #[test]
    fn document_carries_declaration_and_doctype() {
        let root = Element::new("svg");
        let doc = to_svg_document(&root, false);
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(doc.contains("<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\""));
    }

    #[test]
    fn coordinates_format_round_trippable() {
        assert_eq!(fmt_f64(100.0), "100");
        assert_eq!(fmt_f64(0.1), "0.1");
        assert_eq!(fmt_f64(-2.5), "-2.5");
        let v = 1.0 / 3.0;
        let parsed: f64 = fmt_f64(v).parse().unwrap();
        assert!((parsed - v).abs() == 0.0);
    }
}

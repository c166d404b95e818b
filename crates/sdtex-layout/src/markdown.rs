//! Markdown export of a document tree.
//!
//! | tag | Markdown |
//! |-----|----------|
//! | `sdtitle` | `# text` |
//! | `sdtext` | paragraph |
//! | `sdbullet` | `- text`, consecutive bullets form one list |
//! | `sdquote` | `> ` prefixed on its text and every child |
//! | `sdauthor` | `*text*` |
//! | `sdcode` | fenced block |
//! | `sdlink` | `[url](url)` or `<text>` |
//! | `sdimage` | `![name](src)` |
//! | `sdgraph` | one-line description of the plot |
//! | `sdnline` | `&nbsp;` |
//! | `sdfooter`, `attribution` | after a `---` rule at the end |
//!
//! Unknown tags contribute nothing themselves; their children are exported.

use sdtex_markup::{Content, Document, Node, TagKind};

/// Renders `document` as CommonMark text ending in a newline.
pub fn to_markdown(document: &Document) -> String {
    let mut out = Exporter::default();
    for node in &document.nodes {
        out.node(node);
    }
    out.finish()
}

#[derive(Default)]
struct Exporter {
    blocks: Vec<Block>,
    footer: Vec<String>,
}

struct Block {
    text: String,
    list_item: bool,
}

impl Exporter {
    fn push(&mut self, text: String, list_item: bool) {
        self.blocks.push(Block { text, list_item });
    }

    fn node(&mut self, node: &Node) {
        let text = node.text();
        match node.kind() {
            TagKind::Title => self.push(format!("# {text}"), false),
            TagKind::Text => self.push(text.to_string(), false),
            TagKind::Bullet => self.push(format!("- {text}"), true),
            TagKind::Author => self.push(format!("*{text}*"), false),
            TagKind::Code => self.push(format!("```\n{text}\n```"), false),
            TagKind::Link => {
                let link = match &node.content {
                    Content::Source(url) => format!("[{url}]({url})"),
                    _ => format!("<{text}>"),
                };
                self.push(link, false);
            }
            TagKind::Image => {
                if let Some(src) = node.content.as_source() {
                    let name = src.rsplit('/').next().unwrap_or(src);
                    self.push(format!("![{name}]({src})"), false);
                }
            }
            TagKind::Graph => {
                let attr = |key: &str, default: &'static str| node.attributes.get(key).unwrap_or(default).to_string();
                self.push(
                    format!(
                        "*Graph of f(x) = {} for x in [{}, {}]*",
                        attr("function", "?"),
                        attr("first_point", "0"),
                        attr("last_point", "10"),
                    ),
                    false,
                );
            }
            TagKind::NewLine => self.push("&nbsp;".to_string(), false),
            TagKind::Footer | TagKind::Attribution => {
                if !text.is_empty() {
                    self.footer.push(format!("*{text}*"));
                }
            }
            TagKind::Quote => {
                self.quote(node);
                return;
            }
            TagKind::Unknown => log::debug!("markdown: skipping `{}` at {}", node.tag, node.origin),
        }
        for child in &node.children {
            self.node(child);
        }
    }

    /// Exports the quote's subtree on its own, then prefixes every line.
    fn quote(&mut self, node: &Node) {
        let mut inner = Exporter::default();
        if !node.text().is_empty() {
            inner.push(node.text().to_string(), false);
        }
        for child in &node.children {
            inner.node(child);
        }
        self.footer.append(&mut inner.footer);

        let body = inner.join();
        let quoted = body
            .lines()
            .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {line}") })
            .collect::<Vec<_>>()
            .join("\n");
        if !quoted.is_empty() {
            self.push(quoted, false);
        }
    }

    fn join(&self) -> String {
        let mut out = String::new();
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                let tight = block.list_item && self.blocks[i - 1].list_item;
                out.push_str(if tight { "\n" } else { "\n\n" });
            }
            out.push_str(&block.text);
        }
        out
    }

    fn finish(self) -> String {
        let mut out = self.join();
        if !self.footer.is_empty() {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str("---\n\n");
            out.push_str(&self.footer.join("\n\n"));
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(src: &str) -> String {
        to_markdown(&sdtex_markup::parse(src).unwrap())
    }

    #[test]
    fn title_and_paragraph() {
        assert_eq!(md("(sdtitle)Hello(!sdtitle)(sdtext)World(!sdtext)"), "# Hello\n\nWorld\n");
    }

    #[test]
    fn consecutive_bullets_form_one_list() {
        let out = md("(sdbullet)one(!sdbullet)(sdbullet)two(!sdbullet)(sdtext)after(!sdtext)");
        assert_eq!(out, "- one\n- two\n\nafter\n");
    }

    #[test]
    fn quote_prefixes_its_children() {
        let out = md("(sdquote)Stay hungry.(sdauthor)Jobs(!sdauthor)(!sdquote)");
        assert_eq!(out, "> Stay hungry.\n>\n> *Jobs*\n");
    }

    #[test]
    fn code_is_fenced() {
        assert_eq!(md("(sdcode)let x = 1;(!sdcode)"), "```\nlet x = 1;\n```\n");
    }

    #[test]
    fn links_and_images() {
        let out = md(r#"(sdlink src="https://example.com")site(!sdlink)(sdimage src="img/cat.png")(!sdimage)"#);
        assert_eq!(out, "[https://example.com](https://example.com)\n\n![cat.png](img/cat.png)\n");
    }

    #[test]
    fn graph_is_described() {
        let out = md("(sdgraph attributes={function: \"x^2\", last_point: 3})(!sdgraph)");
        assert_eq!(out, "*Graph of f(x) = x^2 for x in [0, 3]*\n");
    }

    #[test]
    fn footers_move_to_the_end() {
        let out = md("(sdfooter)page foot(!sdfooter)(sdtext)body(!sdtext)");
        assert_eq!(out, "body\n\n---\n\n*page foot*\n");
    }

    #[test]
    fn unknown_tags_export_their_children() {
        assert_eq!(md("(box)ignored(sdtext)kept(!sdtext)(!box)"), "kept\n");
    }

    #[test]
    fn empty_document() {
        assert_eq!(md(""), "\n");
    }
}

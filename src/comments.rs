use scraper::{ElementRef, Html};

use crate::config::{Config, Selectors};

/// Which of the two observed comment-list structures a notice page uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Rows of `<date, link-to-commenter>` inside a responsive table.
    Tabular,
    /// Repeated author/date/body groups inside a named list container.
    Block,
}

/// One row of the comment listing, before its content has been resolved.
#[derive(Debug, Clone)]
pub struct CommentReference {
    pub commenter: String,
    pub date: String,
    /// Absolute URL of the comment's full content (HTML page or PDF).
    pub link: String,
    /// Block layouts carry the comment body inline on the notice page.
    /// When present it is authoritative for non-PDF links and no second
    /// fetch happens for that comment.
    pub inline_body: Option<String>,
}

#[derive(Debug)]
pub struct CommentListing {
    /// `None` means neither structural marker was found: a "no comments"
    /// condition at the notice level, not an error.
    pub layout: Option<Layout>,
    pub refs: Vec<CommentReference>,
}

fn element_text(el: &ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn absolutize(href: &str, origin: &str) -> String {
    if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        href.to_string()
    }
}

/// Locates the comment listing on a fetched notice page and yields one
/// reference per resolvable comment, in document order. References without a
/// link cannot be retrieved and are discarded here.
pub fn list_comments(html: &str, cfg: &Config, sel: &Selectors) -> CommentListing {
    let doc = Html::parse_document(html);

    if let Some(table) = doc.select(&sel.comment_table).next() {
        let mut refs = Vec::new();
        for row in table.select(&sel.table_row) {
            let cols: Vec<ElementRef> = row.select(&sel.table_cell).collect();
            if cols.len() < 2 {
                tracing::debug!("skipping malformed comment row (fewer than two cells)");
                continue;
            }
            let date = element_text(&cols[0]);
            let anchor = cols[1].select(&sel.anchor).next();
            let commenter = anchor
                .map(|a| element_text(&a))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| element_text(&cols[1]));
            let Some(href) = anchor
                .and_then(|a| a.value().attr("href"))
                .filter(|h| !h.is_empty())
            else {
                tracing::debug!(%commenter, "comment row without link, discarded");
                continue;
            };
            refs.push(CommentReference {
                commenter,
                date,
                link: absolutize(href, &cfg.origin),
                inline_body: None,
            });
        }
        return CommentListing {
            layout: Some(Layout::Tabular),
            refs,
        };
    }

    if let Some(list) = doc.select(&sel.block_list).next() {
        let mut refs = Vec::new();
        for item in list.select(&sel.block_item) {
            // Blocks tolerate missing sub-fields individually instead of
            // failing the whole group.
            let commenter = item
                .select(&sel.block_author)
                .next()
                .map(|a| element_text(&a))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Unknown".to_string());
            let date = item
                .select(&sel.block_date)
                .next()
                .map(|d| element_text(&d))
                .unwrap_or_default();
            let inline_body = item
                .select(&sel.block_body)
                .next()
                .map(|b| element_text(&b))
                .filter(|t| !t.is_empty());
            let Some(href) = item
                .select(&sel.anchor)
                .next()
                .and_then(|a| a.value().attr("href"))
                .filter(|h| !h.is_empty())
            else {
                tracing::debug!(%commenter, "comment block without link, discarded");
                continue;
            };
            refs.push(CommentReference {
                commenter,
                date,
                link: absolutize(href, &cfg.origin),
                inline_body,
            });
        }
        return CommentListing {
            layout: Some(Layout::Block),
            refs,
        };
    }

    CommentListing {
        layout: None,
        refs: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Config, Selectors) {
        let cfg = Config::default();
        let sel = Selectors::compile(&cfg.selectors).unwrap();
        (cfg, sel)
    }

    const TABULAR_PAGE: &str = r#"
        <html><body><main>
        <div class="table-responsive"><table>
          <tbody>
            <tr><td>01/15/2023</td><td><a href="/sites/default/comment-a.pdf">Alice Adams</a></td></tr>
            <tr><td>malformed single cell</td></tr>
            <tr><td>01/16/2023</td><td>Bob Brown</td></tr>
            <tr><td>01/17/2023</td><td><a href="https://example.org/comment-c">Carol Clark</a></td></tr>
          </tbody>
        </table></div>
        </main></body></html>"#;

    #[test]
    fn tabular_layout_yields_references_in_document_order() {
        let (cfg, sel) = setup();
        let listing = list_comments(TABULAR_PAGE, &cfg, &sel);
        assert_eq!(listing.layout, Some(Layout::Tabular));
        assert_eq!(listing.refs.len(), 2);
        assert_eq!(listing.refs[0].commenter, "Alice Adams");
        assert_eq!(listing.refs[0].date, "01/15/2023");
        assert_eq!(listing.refs[1].commenter, "Carol Clark");
    }

    #[test]
    fn relative_links_are_rewritten_to_the_origin() {
        let (cfg, sel) = setup();
        let listing = list_comments(TABULAR_PAGE, &cfg, &sel);
        assert_eq!(
            listing.refs[0].link,
            "https://www.finra.org/sites/default/comment-a.pdf"
        );
        assert_eq!(listing.refs[1].link, "https://example.org/comment-c");
    }

    #[test]
    fn rows_without_links_are_discarded() {
        let (cfg, sel) = setup();
        let listing = list_comments(TABULAR_PAGE, &cfg, &sel);
        assert!(listing.refs.iter().all(|r| r.commenter != "Bob Brown"));
    }

    #[test]
    fn block_layout_substitutes_missing_fields() {
        let (cfg, sel) = setup();
        let page = r#"
            <html><body><main>
            <div class="comment-list">
              <div class="comment">
                <span class="comment-author">Dana Diaz</span>
                <span class="comment-date">02/01/2023</span>
                <div class="comment-body">Inline body text here.</div>
                <a href="/comments/1234">permalink</a>
              </div>
              <div class="comment">
                <div class="comment-body">Anonymous submission.</div>
                <a href="/comments/1235">permalink</a>
              </div>
              <div class="comment">
                <span class="comment-author">No Link</span>
              </div>
            </div>
            </main></body></html>"#;
        let listing = list_comments(page, &cfg, &sel);
        assert_eq!(listing.layout, Some(Layout::Block));
        assert_eq!(listing.refs.len(), 2);
        assert_eq!(listing.refs[0].commenter, "Dana Diaz");
        assert_eq!(
            listing.refs[0].inline_body.as_deref(),
            Some("Inline body text here.")
        );
        assert_eq!(listing.refs[1].commenter, "Unknown");
        assert_eq!(listing.refs[1].date, "");
    }

    #[test]
    fn page_without_either_marker_is_no_comments() {
        let (cfg, sel) = setup();
        let listing = list_comments("<html><body><main><p>hi</p></main></body></html>", &cfg, &sel);
        assert!(listing.layout.is_none());
        assert!(listing.refs.is_empty());
    }
}

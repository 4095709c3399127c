use anyhow::{Context, Result};

use crate::comments::{self, CommentReference};
use crate::config::{Config, Selectors};
use crate::extract;
use crate::fetch::Fetch;
use crate::notices;
use crate::sentiment::{SentimentAnalyzer, SentimentScore};
use crate::summarize;

/// One surviving comment. Immutable once built; scores stay unrounded here,
/// rounding happens only at the aggregation boundary.
#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub notice_id: String,
    pub notice_slug: String,
    pub comment_id: String,
    pub comment_link: String,
    pub commenter: String,
    pub date: String,
    pub comment_text: String,
    pub summary: String,
    pub score: SentimentScore,
}

/// Per-notice rollup, emitted only for notices with at least one surviving
/// comment.
#[derive(Debug, Clone)]
pub struct NoticeAggregate {
    pub notice_id: String,
    pub num_comments: usize,
    pub avg_score: f64,
    pub avg_pos: f64,
    pub avg_neg: f64,
    pub content_summary: String,
}

/// Both output collections for a run. Owned here, flushed to CSV exactly
/// once by the caller at the end of the batch.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub detailed: Vec<CommentRecord>,
    pub aggregated: Vec<NoticeAggregate>,
}

pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn comment_id(link: &str) -> String {
    link.split('/').next_back().unwrap_or_default().to_string()
}

/// Averages the already-computed per-comment scores (the combined text is
/// never re-scored, so each comment keeps equal weight) and summarizes the
/// concatenated texts.
pub fn aggregate(
    notice_id: &str,
    records: &[CommentRecord],
    summary_sentences: usize,
) -> Option<NoticeAggregate> {
    if records.is_empty() {
        return None;
    }
    let n = records.len() as f64;
    let mean = |pick: fn(&SentimentScore) -> f64| {
        round3(records.iter().map(|r| pick(&r.score)).sum::<f64>() / n)
    };
    let combined = records
        .iter()
        .map(|r| r.comment_text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Some(NoticeAggregate {
        notice_id: notice_id.to_string(),
        num_comments: records.len(),
        avg_score: mean(|s| s.compound),
        avg_pos: mean(|s| s.pos),
        avg_neg: mean(|s| s.neg),
        content_summary: summarize::summarize(&combined, summary_sentences),
    })
}

pub struct Pipeline<'a> {
    cfg: &'a Config,
    selectors: &'a Selectors,
    fetcher: &'a dyn Fetch,
    analyzer: &'a SentimentAnalyzer,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        cfg: &'a Config,
        selectors: &'a Selectors,
        fetcher: &'a dyn Fetch,
        analyzer: &'a SentimentAnalyzer,
    ) -> Pipeline<'a> {
        Pipeline {
            cfg,
            selectors,
            fetcher,
            analyzer,
        }
    }

    /// Processes the batch strictly in order, one notice at a time. A failure
    /// inside one notice loses that notice only; the batch always runs to the
    /// end.
    pub async fn run(&self, notice_ids: &[String]) -> PipelineOutput {
        let mut out = PipelineOutput::default();
        for notice_id in notice_ids {
            tracing::info!(%notice_id, "processing notice");
            match self.process_notice(notice_id).await {
                Ok(records) => {
                    if let Some(agg) = aggregate(notice_id, &records, self.cfg.summary_sentences) {
                        out.aggregated.push(agg);
                    }
                    out.detailed.extend(records);
                }
                Err(e) => {
                    let chain = format!("{e:#}");
                    tracing::error!(%notice_id, error = %chain, "notice failed, continuing");
                }
            }
        }
        out
    }

    async fn process_notice(&self, notice_id: &str) -> Result<Vec<CommentRecord>> {
        let slug = notices::slug(notice_id, self.cfg);
        let url = self.cfg.notice_url(&slug);
        let page = self
            .fetcher
            .fetch_text(&url)
            .await
            .with_context(|| format!("fetching notice page {url}"))?;

        let listing = comments::list_comments(&page, self.cfg, self.selectors);
        let Some(layout) = listing.layout else {
            tracing::info!(%notice_id, "no comment listing on notice page");
            return Ok(Vec::new());
        };
        tracing::debug!(%notice_id, ?layout, comments = listing.refs.len(), "comment listing found");

        let mut records = Vec::new();
        for reference in listing.refs {
            let text = self.resolve_content(&reference).await;
            if let Some(reason) = extract::reject_reason(&text, self.cfg) {
                tracing::info!(link = %reference.link, %reason, "skipping comment");
                continue;
            }
            let score = self.analyzer.score(&text);
            let summary = summarize::summarize(&text, self.cfg.summary_sentences);
            records.push(CommentRecord {
                notice_id: notice_id.to_string(),
                notice_slug: slug.clone(),
                comment_id: comment_id(&reference.link),
                comment_link: reference.link.clone(),
                commenter: reference.commenter,
                date: reference.date,
                comment_text: text,
                summary,
                score,
            });
        }
        Ok(records)
    }

    /// Resolves one reference to plain text. Every failure mode collapses to
    /// empty text (logged with the link) so the quality filter drops it and
    /// sibling comments keep flowing.
    async fn resolve_content(&self, reference: &CommentReference) -> String {
        if extract::is_pdf_link(&reference.link) {
            match self.fetcher.fetch_bytes(&reference.link).await {
                Ok(bytes) => extract::pdf_text(&bytes, &reference.link),
                Err(e) => {
                    tracing::warn!(link = %reference.link, error = %e, "comment pdf fetch failed");
                    String::new()
                }
            }
        } else if let Some(body) = &reference.inline_body {
            // Block layouts carry the body on the notice page itself; that
            // inline text is authoritative and saves a fetch.
            body.clone()
        } else {
            match self.fetcher.fetch_text(&reference.link).await {
                Ok(html) => extract::html_prose(&html, self.selectors),
                Err(e) => {
                    tracing::warn!(link = %reference.link, error = %e, "comment page fetch failed");
                    String::new()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::fetch::FetchError;

    /// Offline stand-in for the network: unknown URLs answer 404.
    #[derive(Default)]
    struct StubFetcher {
        responses: HashMap<String, String>,
    }

    impl StubFetcher {
        fn with_page(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), body.to_string());
            self
        }

        fn not_found(url: &str) -> FetchError {
            FetchError::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND,
            }
        }
    }

    #[async_trait]
    impl Fetch for StubFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| Self::not_found(url))
        }

        async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.fetch_text(url).await.map(String::into_bytes)
        }
    }

    fn comment_page(text: &str) -> String {
        format!("<html><body><main><p>{text}</p></main></body></html>")
    }

    fn record(notice_id: &str, compound: f64, pos: f64, neg: f64) -> CommentRecord {
        CommentRecord {
            notice_id: notice_id.to_string(),
            notice_slug: "x".to_string(),
            comment_id: "c".to_string(),
            comment_link: "https://example.org/c".to_string(),
            commenter: "A".to_string(),
            date: "01/01/2023".to_string(),
            comment_text: "text".to_string(),
            summary: "text".to_string(),
            score: SentimentScore { compound, pos, neg },
        }
    }

    #[test]
    fn comment_id_is_final_path_segment() {
        assert_eq!(comment_id("https://x.org/a/b/comment-9"), "comment-9");
        assert_eq!(comment_id("https://x.org/doc.pdf"), "doc.pdf");
    }

    #[test]
    fn aggregate_of_nothing_is_nothing() {
        assert!(aggregate("Regulatory Notice 23-05", &[], 3).is_none());
    }

    #[test]
    fn aggregate_averages_stored_scores_to_three_decimals() {
        let records = vec![
            record("n", 0.1, 0.2, 0.05),
            record("n", 0.2, 0.4, 0.15),
            record("n", 0.4, 0.3, 0.10),
        ];
        let agg = aggregate("n", &records, 3).unwrap();
        assert_eq!(agg.num_comments, 3);
        assert_eq!(agg.avg_score, round3((0.1 + 0.2 + 0.4) / 3.0));
        assert_eq!(agg.avg_score, 0.233);
        assert_eq!(agg.avg_pos, 0.3);
        assert_eq!(agg.avg_neg, 0.1);
    }

    #[test]
    fn round3_rounds_to_three_decimals() {
        assert_eq!(round3(0.23349), 0.233);
        assert_eq!(round3(0.23351), 0.234);
        assert_eq!(round3(-0.23351), -0.234);
        assert_eq!(round3(1.0 / 3.0), 0.333);
    }

    /// The end-to-end scenario: two notices, two good HTML comments, one
    /// failing PDF comment, one notice without any comment container.
    #[tokio::test]
    async fn batch_scenario_produces_expected_rows() {
        let cfg = Config::default();
        let selectors = Selectors::compile(&cfg.selectors).unwrap();
        let analyzer = SentimentAnalyzer::new();

        let long_a = "We support the proposal because it helps investors. ".repeat(5);
        let long_b = "The rule is burdensome and costly for small firms to follow. ".repeat(5);
        let notice_page = r#"
            <html><body><main>
            <div class="table-responsive"><table><tbody>
              <tr><td>01/10/2023</td><td><a href="/comments/alpha">Alice</a></td></tr>
              <tr><td>01/11/2023</td><td><a href="/comments/beta">Bob</a></td></tr>
              <tr><td>01/12/2023</td><td><a href="/docs/gamma.pdf">Carol</a></td></tr>
            </tbody></table></div>
            </main></body></html>"#;

        let fetcher = StubFetcher::default()
            .with_page(
                "https://www.finra.org/rules-guidance/notices/23-01",
                notice_page,
            )
            .with_page("https://www.finra.org/comments/alpha", &comment_page(&long_a))
            .with_page("https://www.finra.org/comments/beta", &comment_page(&long_b))
            .with_page(
                "https://www.finra.org/rules-guidance/notices/23-02",
                "<html><body><main><p>No comments were received.</p></main></body></html>",
            );
        // the gamma.pdf link is deliberately absent: its download fails

        let pipeline = Pipeline::new(&cfg, &selectors, &fetcher, &analyzer);
        let out = pipeline
            .run(&[
                "Regulatory Notice 23-01".to_string(),
                "Regulatory Notice 23-02".to_string(),
            ])
            .await;

        assert_eq!(out.detailed.len(), 2);
        assert_eq!(out.detailed[0].commenter, "Alice");
        assert_eq!(out.detailed[0].comment_id, "alpha");
        assert_eq!(out.detailed[0].notice_slug, "23-01");
        assert_eq!(out.detailed[1].commenter, "Bob");

        assert_eq!(out.aggregated.len(), 1);
        let agg = &out.aggregated[0];
        assert_eq!(agg.notice_id, "Regulatory Notice 23-01");
        assert_eq!(agg.num_comments, 2);
        let expected =
            round3((out.detailed[0].score.compound + out.detailed[1].score.compound) / 2.0);
        assert_eq!(agg.avg_score, expected);
        assert!(!agg.content_summary.is_empty());
    }

    #[tokio::test]
    async fn failing_notice_does_not_block_the_next_one() {
        let cfg = Config::default();
        let selectors = Selectors::compile(&cfg.selectors).unwrap();
        let analyzer = SentimentAnalyzer::new();

        let body = "This proposal is effective and we welcome the added clarity. ".repeat(4);
        let notice_page = r#"
            <html><body><main>
            <div class="table-responsive"><table><tbody>
              <tr><td>02/01/2023</td><td><a href="/comments/delta">Dana</a></td></tr>
            </tbody></table></div>
            </main></body></html>"#;

        // 23-01's page fetch fails outright; 23-02 works
        let fetcher = StubFetcher::default()
            .with_page(
                "https://www.finra.org/rules-guidance/notices/23-02",
                notice_page,
            )
            .with_page("https://www.finra.org/comments/delta", &comment_page(&body));

        let pipeline = Pipeline::new(&cfg, &selectors, &fetcher, &analyzer);
        let out = pipeline
            .run(&[
                "Regulatory Notice 23-01".to_string(),
                "Regulatory Notice 23-02".to_string(),
            ])
            .await;

        assert_eq!(out.detailed.len(), 1);
        assert_eq!(out.detailed[0].notice_id, "Regulatory Notice 23-02");
        assert_eq!(out.aggregated.len(), 1);
        assert_eq!(out.aggregated[0].num_comments, 1);
    }

    #[tokio::test]
    async fn short_and_boilerplate_comments_produce_no_records() {
        let cfg = Config::default();
        let selectors = Selectors::compile(&cfg.selectors).unwrap();
        let analyzer = SentimentAnalyzer::new();

        let boiler = format!(
            "For the Public disclaimer text. {}",
            "Generic site words. ".repeat(20)
        );
        let notice_page = r#"
            <html><body><main>
            <div class="table-responsive"><table><tbody>
              <tr><td>03/01/2023</td><td><a href="/comments/short">Eve</a></td></tr>
              <tr><td>03/02/2023</td><td><a href="/comments/boiler">Frank</a></td></tr>
            </tbody></table></div>
            </main></body></html>"#;

        let fetcher = StubFetcher::default()
            .with_page(
                "https://www.finra.org/rules-guidance/notices/23-03",
                notice_page,
            )
            .with_page("https://www.finra.org/comments/short", &comment_page("Too short."))
            .with_page("https://www.finra.org/comments/boiler", &comment_page(&boiler));

        let pipeline = Pipeline::new(&cfg, &selectors, &fetcher, &analyzer);
        let out = pipeline.run(&["Regulatory Notice 23-03".to_string()]).await;

        assert!(out.detailed.is_empty());
        assert!(out.aggregated.is_empty());
    }

    #[tokio::test]
    async fn block_layout_uses_the_inline_body() {
        let cfg = Config::default();
        let selectors = Selectors::compile(&cfg.selectors).unwrap();
        let analyzer = SentimentAnalyzer::new();

        let body = "We support this rule and appreciate the clear guidance it offers firms. "
            .repeat(3);
        let notice_page = format!(
            r#"<html><body><main>
            <div class="comment-list">
              <div class="comment">
                <span class="comment-author">Grace</span>
                <span class="comment-date">04/01/2023</span>
                <div class="comment-body">{body}</div>
                <a href="/comments/grace-1">permalink</a>
              </div>
            </div>
            </main></body></html>"#
        );

        // only the notice page is stubbed: if the pipeline tried to fetch the
        // permalink it would 404 and the record would be lost
        let fetcher = StubFetcher::default().with_page(
            "https://www.finra.org/rules-guidance/notices/23-04",
            &notice_page,
        );

        let pipeline = Pipeline::new(&cfg, &selectors, &fetcher, &analyzer);
        let out = pipeline.run(&["Regulatory Notice 23-04".to_string()]).await;

        assert_eq!(out.detailed.len(), 1);
        assert_eq!(out.detailed[0].commenter, "Grace");
        assert_eq!(out.detailed[0].comment_id, "grace-1");
        assert!(out.detailed[0].comment_text.contains("support this rule"));
    }
}

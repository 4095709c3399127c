use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;

use crate::pipeline::{CommentRecord, NoticeAggregate};

/// Reads the batch list. The identifier column name is an external contract
/// with two observed variants, so the candidates come from configuration and
/// the first one present wins. Null and empty cells are dropped.
pub fn read_notice_ids(path: &Path, id_columns: &[String]) -> Result<Vec<String>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("opening input {}", path.display()))?
        .finish()
        .with_context(|| format!("reading input {}", path.display()))?;

    let column = id_columns
        .iter()
        .find_map(|name| df.column(name).ok())
        .ok_or_else(|| {
            anyhow!(
                "input {} has none of the identifier columns {:?}",
                path.display(),
                id_columns
            )
        })?;
    let ids = column
        .as_materialized_series()
        .str()
        .context("notice identifier column is not text")?
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Ok(ids)
}

pub fn detailed_frame(records: &[CommentRecord]) -> PolarsResult<DataFrame> {
    let n = records.len();
    let mut notice_id_col = Vec::with_capacity(n);
    let mut slug_col = Vec::with_capacity(n);
    let mut comment_id_col = Vec::with_capacity(n);
    let mut link_col = Vec::with_capacity(n);
    let mut commenter_col = Vec::with_capacity(n);
    let mut date_col = Vec::with_capacity(n);
    let mut text_col = Vec::with_capacity(n);
    let mut summary_col = Vec::with_capacity(n);
    let mut score_col = Vec::with_capacity(n);
    let mut pos_col = Vec::with_capacity(n);
    let mut neg_col = Vec::with_capacity(n);
    for r in records {
        notice_id_col.push(r.notice_id.clone());
        slug_col.push(r.notice_slug.clone());
        comment_id_col.push(r.comment_id.clone());
        link_col.push(r.comment_link.clone());
        commenter_col.push(r.commenter.clone());
        date_col.push(r.date.clone());
        text_col.push(r.comment_text.clone());
        summary_col.push(r.summary.clone());
        score_col.push(r.score.compound);
        pos_col.push(r.score.pos);
        neg_col.push(r.score.neg);
    }

    df![
        "notice_id" => notice_id_col,
        "notice_id_slug" => slug_col,
        "comment_id" => comment_id_col,
        "comment_link" => link_col,
        "commenter" => commenter_col,
        "date" => date_col,
        "comment_text" => text_col,
        "summary" => summary_col,
        "score" => score_col,
        "pos" => pos_col,
        "neg" => neg_col,
    ]
}

pub fn aggregate_frame(aggregates: &[NoticeAggregate]) -> PolarsResult<DataFrame> {
    let n = aggregates.len();
    let mut notice_id_col = Vec::with_capacity(n);
    let mut num_comments_col: Vec<u32> = Vec::with_capacity(n);
    let mut avg_score_col = Vec::with_capacity(n);
    let mut avg_pos_col = Vec::with_capacity(n);
    let mut avg_neg_col = Vec::with_capacity(n);
    let mut summary_col = Vec::with_capacity(n);
    for a in aggregates {
        notice_id_col.push(a.notice_id.clone());
        num_comments_col.push(a.num_comments as u32);
        avg_score_col.push(a.avg_score);
        avg_pos_col.push(a.avg_pos);
        avg_neg_col.push(a.avg_neg);
        summary_col.push(a.content_summary.clone());
    }

    df![
        "notice_id" => notice_id_col,
        "num_comments" => num_comments_col,
        "avg_score" => avg_score_col,
        "avg_pos" => avg_pos_col,
        "avg_neg" => avg_neg_col,
        "content_summary" => summary_col,
    ]
}

/// Single end-of-run write, overwriting any prior file at the same path.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut outf =
        File::create(path).with_context(|| format!("creating output {}", path.display()))?;
    CsvWriter::new(&mut outf)
        .include_header(true)
        .with_separator(b',')
        .finish(df)
        .with_context(|| format!("writing output {}", path.display()))?;
    Ok(())
}

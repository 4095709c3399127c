/*
 * Tasks:
 * Input: CSV listing regulatory notice identifiers (one per row)
 * Output: Two CSV files: one row per harvested comment, one aggregate row per notice
 * Algo:
 *  Stage 0. Parse inputs
 *
 *  1. Cli: input CSV path, output directory, optional TOML config
 *  2. Read the notice identifier column (first of `notice_title`/`notice_id`)
 *
 *  Stage 1. Harvest comments, one notice at a time
 *
 *  1. Normalize the identifier to a slug and build the notice page URL
 *  2. Fetch the notice page and locate the comment listing
 *      a. Tabular layout: rows of <date, link-to-commenter>
 *      b. Block layout: repeated author/date/body groups
 *      c. Neither present => "no comments", move on
 *  3. For each comment reference, resolve its content
 *      a. Links ending in .pdf => fetch bytes, linear text extraction
 *      b. Otherwise => fetch page, scrape <p> blocks inside <main>
 *      c. Too short or boilerplate => skip, no row
 *  4. Score sentiment and summarize per comment, accumulate rows
 *  5. Aggregate per notice: averaged scores + combined summary
 *
 *  Stage 2. Write both DataFrames as CSV, exactly once, at run end
 *
 * Everything runs sequentially: one request in flight at a time, comments in
 * document order, notices in input order. A failing comment only loses that
 * comment; a failing notice only loses that notice.
 */

pub mod comments;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod notices;
pub mod pipeline;
pub mod report;
pub mod sentiment;
pub mod summarize;

use crate::config::Config;

/// Normalizes an operator-entered notice identifier ("Regulatory Notice
/// 23-01") to the slug used in the notice page URL ("23-01").
///
/// Lowercase, drop the prefix phrase, trim; optionally drop hyphens when the
/// target site's slug convention omits them. Each step is idempotent, so the
/// whole normalization is: `slug(slug(x)) == slug(x)`.
pub fn slug(notice_id: &str, cfg: &Config) -> String {
    let mut s = notice_id.to_lowercase();
    s = s.replace(&cfg.notice_prefix_phrase, "");
    if cfg.strip_slug_hyphens {
        s = s.replace('-', "");
    }
    s.trim().to_string()
}

use crate::config::{FetchConfig, SourceConfig};
use crate::error::{Result, StatsError};
use crate::types::{Cell, RawFragment, TableSource};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));
static HEAD_ROWS: Lazy<Selector> = Lazy::new(|| Selector::parse("thead > tr").expect("valid selector"));
static BODY_ROWS: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody > tr").expect("valid selector"));
static CELLS: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").expect("valid selector"));

/// Body rows with this class are column-group spacers, not data.
const SPACER_CLASS: &str = "over_header";

/// Reads HTML tables from a URL or a local file.
pub struct HtmlTableSource {
    name: String,
    locator: String,
    source_id: Option<String>,
    inject_source_id: bool,
    client: reqwest::Client,
}

impl HtmlTableSource {
    pub fn new(source: &SourceConfig, client: reqwest::Client) -> Self {
        Self {
            name: source.name.clone(),
            locator: source.url.clone(),
            source_id: source.source_id.clone(),
            inject_source_id: source.inject_source_id,
            client,
        }
    }

    /// Builds the shared HTTP client used by every source.
    pub fn client(fetch: &FetchConfig) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(fetch.user_agent.clone())
            .timeout(Duration::from_secs(fetch.timeout_seconds))
            .build()
            .map_err(StatsError::from)
    }

    fn is_remote(&self) -> bool {
        self.locator.starts_with("http://") || self.locator.starts_with("https://")
    }

    async fn fetch_html(&self) -> Result<String> {
        if self.is_remote() {
            let body = self
                .client
                .get(&self.locator)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            Ok(body)
        } else {
            Ok(tokio::fs::read_to_string(&self.locator).await?)
        }
    }
}

#[async_trait::async_trait]
impl TableSource for HtmlTableSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn fetch_fragments(&self) -> Result<Vec<RawFragment>> {
        info!(locator = %self.locator, "fetching tables");
        let html = self.fetch_html().await?;
        let fragments: Vec<RawFragment> = extract_tables(&html)
            .into_iter()
            .map(|mut fragment| {
                fragment.source = self.name.clone();
                fragment.source_id = self.source_id.clone();
                fragment.inject_source_id = self.inject_source_id;
                fragment
            })
            .collect();

        if fragments.is_empty() {
            warn!("no tables found - the page structure may have changed");
        } else {
            info!(tables = fragments.len(), "extracted tables");
        }
        Ok(fragments)
    }
}

/// Extracts every `<table>` in the document, in document order.
///
/// Tables hidden inside HTML comments are included. Header rows come from
/// `<thead>`, outer to leaf, with `colspan` expanded so every level has one
/// label per column. Without a `<thead>` the first body row is the header.
pub fn extract_tables(html: &str) -> Vec<RawFragment> {
    let uncommented = html.replace("<!--", "").replace("-->", "");
    let document = Html::parse_document(&uncommented);

    document
        .select(&TABLE)
        .filter_map(|table| {
            let fragment = extract_table(table);
            if fragment.is_none() {
                debug!("skipping table without a header");
            }
            fragment
        })
        .collect()
}

fn extract_table(table: ElementRef<'_>) -> Option<RawFragment> {
    let mut header: Vec<Vec<String>> = table.select(&HEAD_ROWS).map(expand_row).collect();

    let mut body = table
        .select(&BODY_ROWS)
        .filter(|tr| !tr.value().classes().any(|c| c == SPACER_CLASS));

    if header.is_empty() {
        header.push(expand_row(body.next()?));
    }

    let width = header.last().map(Vec::len).unwrap_or(0);
    if width == 0 {
        return None;
    }
    for level in &mut header {
        level.resize(width, String::new());
    }

    let rows: Vec<Vec<Cell>> = body
        .map(|tr| tr.select(&CELLS).map(|cell| Some(cell_text(cell))).collect())
        .collect();

    Some(RawFragment::new(String::new(), header, rows))
}

/// Header row labels, repeating each cell `colspan` times.
fn expand_row(tr: ElementRef<'_>) -> Vec<String> {
    let mut labels = Vec::new();
    for cell in tr.select(&CELLS) {
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1);
        let text = cell_text(cell);
        labels.extend(std::iter::repeat(text).take(span));
    }
    labels
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_LEVEL: &str = r#"
        <html><body>
        <div id="all_stats_standard"><!--
        <table id="stats_standard">
          <thead>
            <tr class="over_header">
              <th colspan="2"></th>
              <th colspan="2">Performance</th>
              <th colspan="1">Per 90 Minutes</th>
            </tr>
            <tr>
              <th>Player</th><th>Squad</th><th>Gls</th><th>Ast</th><th>Gls</th>
            </tr>
          </thead>
          <tbody>
            <tr><td>José Sá</td><td>Wolves</td><td>0</td><td>0</td><td>0.00</td></tr>
            <tr class="over_header thead"><th colspan="2"></th><th colspan="2">Performance</th><th>Per 90 Minutes</th></tr>
            <tr class="thead"><th>Player</th><th>Squad</th><th>Gls</th><th>Ast</th><th>Gls</th></tr>
            <tr><td>Erling Haaland</td><td>Manchester City</td><td>27</td><td>5</td><td>0.87</td></tr>
          </tbody>
        </table>
        --></div>
        </body></html>
    "#;

    #[test]
    fn test_commented_two_level_table_extracted() {
        let tables = extract_tables(TWO_LEVEL);
        assert_eq!(tables.len(), 1);

        let t = &tables[0];
        assert_eq!(t.header.len(), 2);
        assert_eq!(t.header[0], vec!["", "", "Performance", "Performance", "Per 90 Minutes"]);
        assert_eq!(t.header[1], vec!["Player", "Squad", "Gls", "Ast", "Gls"]);
        // spacer row dropped, header echo kept for the normalizer
        assert_eq!(t.rows.len(), 3);
        assert_eq!(t.rows[1][0].as_deref(), Some("Player"));
        assert_eq!(t.rows[2][4].as_deref(), Some("0.87"));
    }

    #[test]
    fn test_table_without_thead_uses_first_row() {
        let html = "<table><tr><th>Player</th><th>Gls</th></tr><tr><td>A</td><td>1</td></tr></table>";
        let tables = extract_tables(html);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].header, vec![vec!["Player".to_string(), "Gls".to_string()]]);
        assert_eq!(tables[0].rows, vec![vec![Some("A".to_string()), Some("1".to_string())]]);
    }

    #[test]
    fn test_document_without_tables() {
        assert!(extract_tables("<html><body><p>nothing here</p></body></html>").is_empty());
    }
}

//! External knowledge sources and the keyword router that picks one.
//!
//! Each source honors the same contract: `lookup(term)` yields
//! `Some((summary, source_url))` or None. None means "no result" — network
//! failures, non-2xx statuses and unparseable payloads are logged by the
//! source and collapse to None rather than propagating.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lookup(&self, client: &reqwest::Client, term: &str) -> Option<(String, String)>;
}

async fn get_json(
    client: &reqwest::Client,
    source: &str,
    request: reqwest::RequestBuilder,
) -> Option<Value> {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(source, "request failed: {e}");
            return None;
        }
    };
    if !response.status().is_success() {
        debug!(source, status = %response.status(), "non-success response");
        return None;
    }
    match response.json::<Value>().await {
        Ok(payload) => Some(payload),
        Err(e) => {
            debug!(source, "malformed payload: {e}");
            None
        }
    }
}

/// General-purpose encyclopedia summaries (REST page-summary API).
pub struct Wikipedia;

#[async_trait]
impl KnowledgeSource for Wikipedia {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    async fn lookup(&self, client: &reqwest::Client, term: &str) -> Option<(String, String)> {
        let slug = term.replace(' ', "_");
        let url = format!("https://en.wikipedia.org/api/rest_v1/page/summary/{slug}");
        let payload = get_json(client, self.name(), client.get(url)).await?;

        let summary = payload.get("extract").and_then(Value::as_str)?.to_string();
        let page = payload
            .pointer("/content_urls/desktop/page")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some((summary, page))
    }
}

/// Entity descriptions from the Wikidata search API.
pub struct Wikidata;

#[async_trait]
impl KnowledgeSource for Wikidata {
    fn name(&self) -> &'static str {
        "wikidata"
    }

    async fn lookup(&self, client: &reqwest::Client, term: &str) -> Option<(String, String)> {
        let request = client
            .get("https://www.wikidata.org/w/api.php")
            .query(&[
                ("action", "wbsearchentities"),
                ("search", term),
                ("language", "en"),
                ("format", "json"),
            ]);
        let payload = get_json(client, self.name(), request).await?;

        let hit = payload.get("search").and_then(Value::as_array)?.first()?;
        let description = hit.get("description").and_then(Value::as_str)?.to_string();
        let uri = hit
            .get("concepturi")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some((description, uri))
    }
}

/// Abstracts from the DBpedia SPARQL endpoint.
pub struct DbPedia;

#[async_trait]
impl KnowledgeSource for DbPedia {
    fn name(&self) -> &'static str {
        "dbpedia"
    }

    async fn lookup(&self, client: &reqwest::Client, term: &str) -> Option<(String, String)> {
        let resource = term.replace(' ', "_");
        let query = format!(
            "PREFIX dbo: <http://dbpedia.org/ontology/> \
             PREFIX dbr: <http://dbpedia.org/resource/> \
             SELECT ?abstract WHERE {{ dbr:{resource} dbo:abstract ?abstract . \
             FILTER(lang(?abstract)='en') }}"
        );
        let request = client
            .get("https://dbpedia.org/sparql")
            .query(&[("query", query.as_str()), ("format", "application/sparql-results+json")]);
        let payload = get_json(client, self.name(), request).await?;

        let value = payload
            .pointer("/results/bindings/0/abstract/value")
            .and_then(Value::as_str)?
            .to_string();
        Some((value, format!("https://dbpedia.org/resource/{resource}")))
    }
}

/// Paper titles from the arXiv Atom feed. The feed is XML; only the first
/// entry's title and id are picked out, at the string level.
pub struct Arxiv;

#[async_trait]
impl KnowledgeSource for Arxiv {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    async fn lookup(&self, client: &reqwest::Client, term: &str) -> Option<(String, String)> {
        let search = format!("all:{term}");
        let request = client.get("http://export.arxiv.org/api/query").query(&[
            ("search_query", search.as_str()),
            ("start", "0"),
            ("max_results", "1"),
        ]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(source = self.name(), "request failed: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(source = self.name(), status = %response.status(), "non-success response");
            return None;
        }
        let body = response.text().await.ok()?;

        let entry = body.split("<entry>").nth(1)?;
        let title = extract_tag(entry, "title")?;
        let link = extract_tag(entry, "id").unwrap_or_default();
        Some((title, link))
    }
}

fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    let value = xml[start..end].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Research-paper summaries from the Open Research Knowledge Graph.
pub struct Orkg;

#[async_trait]
impl KnowledgeSource for Orkg {
    fn name(&self) -> &'static str {
        "orkg"
    }

    async fn lookup(&self, client: &reqwest::Client, term: &str) -> Option<(String, String)> {
        let request = client
            .get("https://www.orkg.org/api/papers")
            .query(&[("query", term)]);
        let payload = get_json(client, self.name(), request).await?;

        let paper = payload.get("content").and_then(Value::as_array)?.first()?;
        let title = paper.get("title").and_then(Value::as_str)?.to_string();
        let field = paper
            .pointer("/research_fields/0/label")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let url = paper
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let summary = if field.is_empty() {
            title
        } else {
            format!("{title}\n\n{field}")
        };
        Some((summary, url))
    }
}

/// Static keyword router: term categories map to a source, with a
/// general-purpose encyclopedia fallback.
pub struct SourceRouter {
    routes: Vec<(&'static [&'static str], Box<dyn KnowledgeSource>)>,
    fallback: Box<dyn KnowledgeSource>,
}

const SCIENTIFIC: &[&str] = &["quantum", "neural", "embedding", "reasoning"];
const PHILOSOPHICAL: &[&str] = &["philosophy", "ontology", "ai", "structure"];
const DEFINITIONAL: &[&str] = &["symbol", "representation", "definition", "concept"];
const FACTUAL: &[&str] = &["data", "entity", "name", "date"];

impl SourceRouter {
    pub fn new() -> Self {
        Self {
            routes: vec![
                (SCIENTIFIC, Box::new(Arxiv)),
                (PHILOSOPHICAL, Box::new(Orkg)),
                (DEFINITIONAL, Box::new(DbPedia)),
                (FACTUAL, Box::new(Wikidata)),
            ],
            fallback: Box::new(Wikipedia),
        }
    }

    /// Match whole lowercase words of the term against each category in
    /// table order; first hit wins.
    pub fn route(&self, term: &str) -> &dyn KnowledgeSource {
        let lowered = term.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        for (keywords, source) in &self.routes {
            if keywords.iter().any(|k| words.contains(k)) {
                return source.as_ref();
            }
        }
        self.fallback.as_ref()
    }
}

impl Default for SourceRouter {
    fn default() -> Self {
        Self::new()
    }
}

//! Arweave gateway client.
//!
//! - Tag search through the gateway GraphQL endpoint (cursor paging)
//! - Raw data by transaction id
//! - Anchor and price lookup for new transactions
//! - Transaction submission

use super::traits::{Ledger, LedgerError, LedgerResult, SubmitResponse};
use super::transaction::{DraftTransaction, TxId};
use super::wallet::Signer;
use crate::config::ArweaveConfig;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use tracing::{debug, warn};

const TAG_QUERY: &str = r#"query($tags: [TagFilter!], $first: Int, $after: String) {
  transactions(tags: $tags, first: $first, after: $after) {
    pageInfo { hasNextPage }
    edges { cursor node { id } }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    transactions: TransactionConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionConnection {
    page_info: PageInfo,
    edges: Vec<TransactionEdge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct TransactionEdge {
    cursor: String,
    node: TransactionNode,
}

#[derive(Debug, Deserialize)]
struct TransactionNode {
    id: String,
}

/// One page of tag-search results.
#[derive(Debug, PartialEq, Eq)]
struct TagPage {
    ids: Vec<TxId>,
    next_cursor: Option<String>,
}

fn parse_tag_page(body: &str) -> LedgerResult<TagPage> {
    let resp: GraphQlResponse =
        serde_json::from_str(body).map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

    if let Some(err) = resp.errors.first() {
        return Err(LedgerError::InvalidResponse(err.message.clone()));
    }
    let conn = resp
        .data
        .ok_or_else(|| LedgerError::InvalidResponse("GraphQL response without data".into()))?
        .transactions;

    let next_cursor = if conn.page_info.has_next_page {
        conn.edges.last().map(|e| e.cursor.clone())
    } else {
        None
    };
    Ok(TagPage {
        ids: conn.edges.into_iter().map(|e| TxId(e.node.id)).collect(),
        next_cursor,
    })
}

/// Follow cursors until the last page or `max_pages` pages.
///
/// The flag is true when the gateway still had more pages at the limit.
async fn collect_pages<F, Fut>(max_pages: u32, mut next_page: F) -> LedgerResult<(Vec<TxId>, bool)>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = LedgerResult<TagPage>>,
{
    let mut ids = Vec::new();
    let mut cursor: Option<String> = None;

    for _ in 0..max_pages {
        let page = next_page(cursor.take()).await?;
        ids.extend(page.ids);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return Ok((ids, false)),
        }
    }
    Ok((ids, cursor.is_some()))
}

/// Client for an Arweave gateway (e.g. `https://arweave.net`).
#[derive(Clone)]
pub struct ArweaveHttpClient {
    base_url: String,
    http: reqwest::Client,
    page_size: u32,
    max_pages: u32,
}

impl ArweaveHttpClient {
    pub fn new(config: &ArweaveConfig) -> LedgerResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LedgerError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url(),
            http,
            page_size: config.query_page_size,
            max_pages: config.max_query_pages,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> LedgerResult<reqwest::Response> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn get_text(&self, path: &str) -> LedgerResult<String> {
        self.get(path)
            .await?
            .text()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))
    }

    /// Current transaction anchor.
    pub async fn tx_anchor(&self) -> LedgerResult<Vec<u8>> {
        let anchor = self.get_text("tx_anchor").await?;
        URL_SAFE_NO_PAD
            .decode(anchor.trim())
            .map_err(|_| LedgerError::InvalidResponse(format!("bad anchor: {}", anchor)))
    }

    /// Reward (in winston) for storing `bytes` bytes.
    pub async fn price(&self, bytes: usize) -> LedgerResult<String> {
        let price = self.get_text(&format!("price/{}", bytes)).await?;
        let price = price.trim();
        if price.is_empty() || !price.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::InvalidResponse(format!("bad price: {}", price)));
        }
        Ok(price.to_string())
    }

    async fn query_page(
        &self,
        name: &str,
        value: &str,
        after: Option<&str>,
    ) -> LedgerResult<TagPage> {
        let body = json!({
            "query": TAG_QUERY,
            "variables": {
                "tags": [{ "name": name, "values": [value] }],
                "first": self.page_size,
                "after": after,
            }
        });

        let resp = self
            .http
            .post(self.url("graphql"))
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(LedgerError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        parse_tag_page(&text)
    }
}

#[async_trait]
impl Ledger for ArweaveHttpClient {
    async fn query_by_tag(&self, name: &str, value: &str) -> LedgerResult<Vec<TxId>> {
        let (ids, truncated) = collect_pages(self.max_pages, |cursor| async move {
            self.query_page(name, value, cursor.as_deref()).await
        })
        .await?;

        if truncated {
            warn!(
                tag = name,
                value,
                pages = self.max_pages,
                found = ids.len(),
                "tag query hit the page limit, oldest matches were not fetched"
            );
        }
        debug!(tag = name, value, found = ids.len(), "arweave tag query");
        Ok(ids)
    }

    async fn fetch_data(&self, id: &TxId) -> LedgerResult<Vec<u8>> {
        let resp = self.get(id.as_str()).await.map_err(|e| match e {
            LedgerError::Http { status: 404, .. } => LedgerError::NotFound(id.clone()),
            other => other,
        })?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn create_transaction(
        &self,
        data: Vec<u8>,
        signer: &dyn Signer,
    ) -> LedgerResult<DraftTransaction> {
        let last_tx = self.tx_anchor().await?;
        let reward = self.price(data.len()).await?;
        Ok(DraftTransaction::new(
            data,
            signer.owner().to_vec(),
            last_tx,
            reward,
        ))
    }

    async fn submit(&self, tx: &DraftTransaction) -> LedgerResult<SubmitResponse> {
        let resp = self
            .http
            .post(self.url("tx"))
            .json(&tx.to_json())
            .send()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        let status = resp.status();
        Ok(SubmitResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }
}

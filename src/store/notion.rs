//! Notion database backend.
//!
//! Each record is a page in one database with the properties `Name`
//! (title), `Date` (date), `Location` and `Description` (rich text) and
//! `URL` (url). Archiving a page hides it from database queries.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{RecordFilter, RecordStore, StoreError};
use crate::models::{NewRecord, RecordPatch, RemoteRecord};

pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

const NAME_PROPERTY: &str = "Name";
const DATE_PROPERTY: &str = "Date";
const LOCATION_PROPERTY: &str = "Location";
const DESCRIPTION_PROPERTY: &str = "Description";
const URL_PROPERTY: &str = "URL";

/// Notion rejects rich text items longer than this.
const RICH_TEXT_LIMIT: usize = 2000;

#[derive(Debug, Clone)]
pub struct NotionSettings {
    pub token: String,
    pub database_id: String,
    pub api_base: String,
    pub version: String,
    pub timeout: Duration,
}

pub struct NotionStore {
    client: Client,
    settings: NotionSettings,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<PageObject>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageObject {
    id: String,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    properties: Map<String, Value>,
}

impl NotionStore {
    pub fn new(settings: NotionSettings) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("free-food-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.api_base.trim_end_matches('/'), path)
    }

    fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, StoreError> {
        let response = request
            .bearer_auth(&self.settings.token)
            .header("Notion-Version", &self.settings.version)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|source| StoreError::Decode {
            context: context.to_string(),
            source,
        })
    }
}

impl RecordStore for NotionStore {
    fn query(&mut self, filter: &RecordFilter) -> Result<Vec<RemoteRecord>, StoreError> {
        let url = self.url(&format!("databases/{}/query", self.settings.database_id));
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = query_body(filter, cursor.as_deref());
            let page: QueryResponse = self.send(self.client.post(&url).json(&body), "query")?;
            records.extend(page.results.iter().map(record_from_page));

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(records)
    }

    fn create(&mut self, fields: &NewRecord) -> Result<RemoteRecord, StoreError> {
        let body = create_body(&self.settings.database_id, fields);
        let page: PageObject = self.send(self.client.post(self.url("pages")).json(&body), "page")?;
        Ok(record_from_page(&page))
    }

    fn update(&mut self, id: &str, patch: &RecordPatch) -> Result<RemoteRecord, StoreError> {
        let url = self.url(&format!("pages/{id}"));
        let page: PageObject = self.send(self.client.patch(url).json(patch), "page")?;
        Ok(record_from_page(&page))
    }
}

fn query_body(filter: &RecordFilter, cursor: Option<&str>) -> Value {
    let mut body = Map::new();
    if let RecordFilter::TitleEquals(title) = filter {
        body.insert(
            "filter".to_string(),
            json!({ "property": NAME_PROPERTY, "title": { "equals": title } }),
        );
    }
    if let Some(cursor) = cursor {
        body.insert("start_cursor".to_string(), json!(cursor));
    }
    Value::Object(body)
}

fn create_body(database_id: &str, fields: &NewRecord) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": properties(fields),
    })
}

fn properties(fields: &NewRecord) -> Value {
    let mut props = Map::new();
    props.insert(
        NAME_PROPERTY.to_string(),
        json!({ "title": rich_text(&fields.title) }),
    );
    if let Some(date) = fields.date {
        props.insert(
            DATE_PROPERTY.to_string(),
            json!({ "date": { "start": date.format("%Y-%m-%d").to_string() } }),
        );
    }
    props.insert(
        LOCATION_PROPERTY.to_string(),
        json!({ "rich_text": rich_text(&fields.location) }),
    );
    props.insert(
        DESCRIPTION_PROPERTY.to_string(),
        json!({ "rich_text": rich_text(&fields.description) }),
    );
    let url = if fields.url.is_empty() {
        Value::Null
    } else {
        json!(fields.url)
    };
    props.insert(URL_PROPERTY.to_string(), json!({ "url": url }));
    Value::Object(props)
}

fn rich_text(content: &str) -> Value {
    let chars: Vec<char> = content.chars().collect();
    let items: Vec<Value> = chars
        .chunks(RICH_TEXT_LIMIT)
        .map(|chunk| json!({ "text": { "content": chunk.iter().collect::<String>() } }))
        .collect();
    Value::Array(items)
}

fn record_from_page(page: &PageObject) -> RemoteRecord {
    let prop = |name: &str| page.properties.get(name);
    RemoteRecord {
        id: page.id.clone(),
        title: prop(NAME_PROPERTY)
            .and_then(|p| p.get("title"))
            .map(plain_text)
            .unwrap_or_default(),
        date: prop(DATE_PROPERTY)
            .and_then(|p| p.get("date"))
            .and_then(|d| d.get("start"))
            .and_then(Value::as_str)
            .map(str::to_string),
        location: prop(LOCATION_PROPERTY)
            .and_then(|p| p.get("rich_text"))
            .map(plain_text)
            .unwrap_or_default(),
        description: prop(DESCRIPTION_PROPERTY)
            .and_then(|p| p.get("rich_text"))
            .map(plain_text)
            .unwrap_or_default(),
        url: prop(URL_PROPERTY)
            .and_then(|p| p.get("url"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        archived: page.archived,
    }
}

fn plain_text(items: &Value) -> String {
    items
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get("plain_text")
                        .or_else(|| item.get("text").and_then(|t| t.get("content")))
                        .and_then(Value::as_str)
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

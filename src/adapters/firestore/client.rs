//! Firestore REST document store.
//!
//! Talks to `projects/{project}/databases/(default)/documents` with
//! `reqwest`. Writes use `PATCH`: without an update mask the document is
//! replaced, with a mask naming the written top-level keys it is merged.
//! Updates add the `currentDocument.exists` precondition.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::adapters::gcp::GcpTokenSource;
use crate::domain::foundation::{CollectionPath, Document, DocumentPath};
use crate::ports::{DocumentStore, Page, PageRequest, StoreError, StoredDocument};

use super::value::{decode_fields, encode_fields, field_path};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

/// Firestore document store.
pub struct FirestoreDocumentStore {
    base_url: String,
    /// `projects/{project}/databases/(default)/documents`
    root: String,
    tokens: Arc<GcpTokenSource>,
    http_client: reqwest::Client,
}

impl FirestoreDocumentStore {
    pub fn new(project_id: &str, tokens: Arc<GcpTokenSource>) -> Self {
        Self {
            base_url: FIRESTORE_BASE_URL.to_string(),
            root: format!("projects/{}/databases/(default)/documents", project_id),
            tokens,
            http_client: reqwest::Client::new(),
        }
    }

    /// Point at the local emulator (`host:port`).
    pub fn with_emulator(mut self, host: &str) -> Self {
        self.base_url = format!("http://{}", host);
        self
    }

    fn document_url(&self, path: &str) -> String {
        format!("{}/v1/{}/{}", self.base_url, self.root, path)
    }

    /// Strip the resource prefix off a returned document name.
    fn relative_path(&self, name: &str) -> Result<DocumentPath, StoreError> {
        let relative = name
            .split_once(&format!("{}/", self.root))
            .map(|(_, rest)| rest)
            .unwrap_or(name);
        DocumentPath::parse(relative).map_err(|e| StoreError::Malformed {
            path: name.to_string(),
            message: e.to_string(),
        })
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        let bearer = self
            .tokens
            .bearer()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(match bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn execute(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, StoreError> {
        let response = self
            .authorized(request)
            .await?
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        tracing::warn!(path, status = status.as_u16(), "Firestore request failed");
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(StoreError::Unavailable(format!("{}: {}", status, message)))
        } else {
            Err(StoreError::Rejected {
                path: path.to_string(),
                message,
            })
        }
    }

    async fn write(
        &self,
        path: &DocumentPath,
        document: &Document,
        mask: Option<Vec<String>>,
        must_exist: bool,
    ) -> Result<(), StoreError> {
        let raw = path.to_string();
        let mut query: Vec<(&str, String)> = mask
            .into_iter()
            .flatten()
            .map(|key| ("updateMask.fieldPaths", key))
            .collect();
        if must_exist {
            query.push(("currentDocument.exists", "true".to_string()));
        }
        let request = self
            .http_client
            .patch(self.document_url(&raw))
            .query(&query)
            .json(&json!({ "fields": encode_fields(document) }));
        let response = self.execute(&raw, request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            if must_exist {
                return Err(StoreError::NotFound(raw));
            }
            return Err(StoreError::Rejected {
                path: raw,
                message: "parent path not found".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let raw = path.to_string();
        let response = self
            .execute(&raw, self.http_client.get(self.document_url(&raw)))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: RawDocument = response.json().await.map_err(|e| StoreError::Malformed {
            path: raw.clone(),
            message: e.to_string(),
        })?;
        decode_fields(&document.fields)
            .map(Some)
            .map_err(|message| StoreError::Malformed { path: raw, message })
    }

    async fn set(&self, path: &DocumentPath, document: Document) -> Result<(), StoreError> {
        self.write(path, &document, None, false).await
    }

    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError> {
        let mask = fields.keys().map(|key| field_path(key)).collect();
        self.write(path, &fields, Some(mask), false).await
    }

    async fn update(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError> {
        let mask = fields.keys().map(|key| field_path(key)).collect();
        self.write(path, &fields, Some(mask), true).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let raw = path.to_string();
        self.execute(&raw, self.http_client.delete(self.document_url(&raw)))
            .await?;
        Ok(())
    }

    async fn list(
        &self,
        collection: &CollectionPath,
        page: PageRequest,
    ) -> Result<Page, StoreError> {
        let raw = collection.to_string();
        let mut query = vec![
            ("pageSize", page.size.to_string()),
            ("orderBy", "__name__".to_string()),
        ];
        if let Some(token) = page.after {
            query.push(("pageToken", token));
        }
        let response = self
            .execute(
                &raw,
                self.http_client.get(self.document_url(&raw)).query(&query),
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Page::default());
        }
        let listed: ListResponse = response.json().await.map_err(|e| StoreError::Malformed {
            path: raw.clone(),
            message: e.to_string(),
        })?;

        let documents = listed
            .documents
            .into_iter()
            .map(|document| {
                let path = self.relative_path(&document.name)?;
                let data = decode_fields(&document.fields).map_err(|message| {
                    StoreError::Malformed {
                        path: document.name.clone(),
                        message,
                    }
                })?;
                Ok(StoredDocument { path, data })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(Page {
            documents,
            next: listed.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}

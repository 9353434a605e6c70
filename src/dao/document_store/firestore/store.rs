use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};

use crate::dao::{
    document::{Document, auto_id},
    document_store::{DocumentStore, FoundDocument, ListQuery},
    paths::{CollectionPath, DocumentPath},
    storage::{StoreError, StoreResult},
};

use super::{
    config::FirestoreConfig,
    error::{FirestoreApiError, FirestoreResult},
    models::{
        CommitRequest, GoogleErrorBody, RunQueryRequest, RunQueryResponseItem, StructuredQuery,
        CollectionSelector, WireDocument, WireFilter, WireOrder, WireValue, WireWrite,
    },
};

/// Document store backed by the Firestore REST v1 API.
#[derive(Clone)]
pub struct FirestoreDocumentStore {
    client: Client,
    /// `{base_url}/v1/projects/{p}/databases/{d}/documents`
    documents_url: Arc<str>,
    /// `projects/{p}/databases/{d}/documents`, the resource-name prefix.
    resource_root: Arc<str>,
    bearer: Option<Arc<str>>,
}

impl FirestoreDocumentStore {
    /// Build a store from the given configuration.
    pub fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| FirestoreApiError::ClientBuilder { source })?;

        let resource_root = format!(
            "projects/{}/databases/{}/documents",
            config.project_id, config.database_id
        );
        let documents_url = format!(
            "{}/v1/{}",
            config.base_url.trim_end_matches('/'),
            resource_root
        );

        Ok(Self {
            client,
            documents_url: Arc::from(documents_url.as_str()),
            resource_root: Arc::from(resource_root.as_str()),
            bearer: config.bearer_token.map(|token| Arc::from(token.as_str())),
        })
    }

    /// Full resource name of a document, as the wire models expect it.
    fn resource_name(&self, path: &DocumentPath) -> String {
        format!("{}/{}", self.resource_root, path)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.bearer {
            Some(ref token) => builder.bearer_auth(token.as_ref()),
            None => builder,
        }
    }

    /// Turn a non-success response into a typed error, keeping the Google
    /// status payload when the body carries one.
    async fn status_error(path: &str, response: Response) -> FirestoreApiError {
        let status = response.status();
        let parsed = response.json::<GoogleErrorBody>().await.ok();
        let (grpc_status, message) = match parsed {
            Some(body) => (body.error.status, Some(body.error.message)),
            None => (None, None),
        };
        FirestoreApiError::RequestStatus {
            path: path.to_owned(),
            status,
            grpc_status,
            message,
        }
    }

    async fn get_document(&self, path: &DocumentPath) -> FirestoreResult<Option<WireDocument>> {
        let url = format!("{}/{}", self.documents_url, path);
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|source| FirestoreApiError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<WireDocument>().await.map(Some).map_err(|source| {
                    FirestoreApiError::DecodeResponse {
                        path: path.to_string(),
                        source,
                    }
                })
            }
            _ => Err(Self::status_error(path.as_str(), response).await),
        }
    }

    async fn commit(&self, path: &str, writes: Vec<WireWrite>) -> FirestoreResult<()> {
        let url = format!("{}:commit", self.documents_url);
        let response = self
            .request(Method::POST, url)
            .json(&CommitRequest { writes })
            .send()
            .await
            .map_err(|source| FirestoreApiError::RequestSend {
                path: path.to_owned(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::status_error(path, response).await)
        }
    }

    async fn run_query(&self, query: &ListQuery) -> FirestoreResult<Vec<WireDocument>> {
        // runQuery hangs off the parent document; a top-level collection
        // queries the database root.
        let url = match query.collection.parent() {
            Some(parent) => format!("{}/{}:runQuery", self.documents_url, parent),
            None => format!("{}:runQuery", self.documents_url),
        };

        let request = RunQueryRequest {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: query.collection.leaf().to_owned(),
                }],
                filter: query.filter.as_ref().and_then(|(field, value)| {
                    WireValue::encode(value)
                        .map(|wire| WireFilter::equality(field.clone(), wire))
                }),
                order_by: vec![WireOrder::by(query.order_field.clone(), query.descending)],
            },
        };

        let path = query.collection.as_str();
        let response = self
            .request(Method::POST, url)
            .json(&request)
            .send()
            .await
            .map_err(|source| FirestoreApiError::RequestSend {
                path: path.to_owned(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(Self::status_error(path, response).await);
        }

        let items = response
            .json::<Vec<RunQueryResponseItem>>()
            .await
            .map_err(|source| FirestoreApiError::DecodeResponse {
                path: path.to_owned(),
                source,
            })?;

        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    /// Map a backend failure onto the backend-neutral classification. The
    /// query context, when present, names the fields a missing composite
    /// index would have to cover.
    fn classify(err: FirestoreApiError, query: Option<&ListQuery>) -> StoreError {
        if err.is_permission_denied() {
            return StoreError::permission_denied(err);
        }
        if err.is_missing_index() {
            if let Some(query) = query {
                if let Some((filter_field, _)) = query.filter.as_ref() {
                    return StoreError::MissingIndex {
                        filter_field: filter_field.clone(),
                        order_field: query.order_field.clone(),
                        source: Box::new(err),
                    };
                }
            }
        }
        StoreError::unavailable(err.to_string(), err)
    }
}

impl DocumentStore for FirestoreDocumentStore {
    fn create(
        &self,
        collection: CollectionPath,
        document: Document,
    ) -> BoxFuture<'static, StoreResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            // The REST surface has no addDoc; like the official SDKs, mint
            // the id client-side and commit a full set.
            let id = auto_id();
            let path = collection.document(&id);
            let (wire, transforms) = WireDocument::encode(store.resource_name(&path), &document);
            store
                .commit(path.as_str(), vec![WireWrite::set(wire, transforms)])
                .await
                .map_err(|err| Self::classify(err, None))?;
            Ok(id)
        })
    }

    fn find(&self, path: DocumentPath) -> BoxFuture<'static, StoreResult<Option<Document>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document(&path)
                .await
                .map_err(|err| Self::classify(err, None))?;
            Ok(maybe_doc.map(WireDocument::decode))
        })
    }

    fn list(&self, query: ListQuery) -> BoxFuture<'static, StoreResult<Vec<FoundDocument>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents = store
                .run_query(&query)
                .await
                .map_err(|err| Self::classify(err, Some(&query)))?;
            Ok(documents
                .into_iter()
                .map(|wire| FoundDocument {
                    id: wire.id().to_owned(),
                    document: wire.decode(),
                })
                .collect())
        })
    }

    fn merge(
        &self,
        path: DocumentPath,
        fields: Document,
    ) -> BoxFuture<'static, StoreResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let (wire, transforms) = WireDocument::encode(store.resource_name(&path), &fields);
            store
                .commit(path.as_str(), vec![WireWrite::merge(wire, transforms)])
                .await
                .map_err(|err| Self::classify(err, None))
        })
    }

    fn delete(&self, path: DocumentPath) -> BoxFuture<'static, StoreResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let name = store.resource_name(&path);
            store
                .commit(path.as_str(), vec![WireWrite::delete(name)])
                .await
                .map_err(|err| Self::classify(err, None))
        })
    }
}

//! # Storefront API Client
//!
//! HTTP adapter for the remote cart, order placement and branch inventory.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation          Request                          Auth              │
//! │  ─────────          ───────                          ────              │
//! │  fetch cart         GET    {base}/cart               bearer            │
//! │  add line           POST   {base}/cart               bearer            │
//! │  update quantity    PATCH  {base}/cart/{id}          bearer            │
//! │  remove line        DELETE {base}/cart/{id}          bearer            │
//! │  place order        POST   {base}/orders             bearer if logged in│
//! │  branches           GET    {base}/branches?productIds=a,b              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Non-2xx responses carry `{ "message": "..." }`, which is surfaced as-is.
//! Requests that never get a response become errors with `status: None`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use storefront_core::order::OrderPayload;
use storefront_core::{AuthToken, Branch, BranchAvailability, CartLineItem, PlacedOrder, Session};

use crate::config::{ApiSettings, ClientConfig};
use crate::error::{ClientError, ClientResult};
use crate::ports::{BranchInventory, NewRemoteLine, OrderPlacement, RemoteCart};

/// Which collaborator a request belongs to, for error mapping.
#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Cart,
    Orders,
    Branches,
}

impl Endpoint {
    fn error(self, status: Option<u16>, message: String) -> ClientError {
        match self {
            Endpoint::Cart => ClientError::RemoteCart { status, message },
            Endpoint::Orders => ClientError::OrderSubmission { status, message },
            Endpoint::Branches => ClientError::BranchLookup { status, message },
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Serialize)]
struct QuantityBody {
    quantity: i64,
}

/// reqwest-backed client for the storefront REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> ClientResult<Self> {
        let base_url = Url::parse(&settings.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(settings.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(ApiClient { client, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(&config.api)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Sends a request and turns transport failures and non-2xx statuses
    /// into the endpoint's error.
    async fn send(&self, endpoint: Endpoint, request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await.map_err(|e| {
            warn!(?endpoint, error = %e, "Storefront API unreachable");
            endpoint.error(None, e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("Unexpected response")
                    .to_string()
            });
        warn!(?endpoint, status = status.as_u16(), message = %message, "Storefront API returned an error");
        Err(endpoint.error(Some(status.as_u16()), message))
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        response: Response,
    ) -> ClientResult<T> {
        let body = response
            .text()
            .await
            .map_err(|e| endpoint.error(None, e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            warn!(?endpoint, error = %e, "Storefront API returned an unreadable body");
            match endpoint {
                // The order went through; only the confirmation is garbled
                Endpoint::Orders => ClientError::OrderOutcomeUnknown(e.to_string()),
                Endpoint::Cart | Endpoint::Branches => e.into(),
            }
        })
    }
}

// =============================================================================
// Remote Cart
// =============================================================================

#[async_trait]
impl RemoteCart for ApiClient {
    async fn fetch(&self, token: &AuthToken) -> ClientResult<Vec<CartLineItem>> {
        let url = self.endpoint(&["cart"])?;
        let request = self.client.get(url).bearer_auth(token.as_str());
        let response = self.send(Endpoint::Cart, request).await?;
        let lines: Vec<CartLineItem> = self.read_json(Endpoint::Cart, response).await?;
        debug!(count = lines.len(), "Fetched remote cart");
        Ok(lines)
    }

    async fn add(&self, token: &AuthToken, line: &NewRemoteLine) -> ClientResult<CartLineItem> {
        let url = self.endpoint(&["cart"])?;
        let request = self.client.post(url).bearer_auth(token.as_str()).json(line);
        let response = self.send(Endpoint::Cart, request).await?;
        let created: CartLineItem = self.read_json(Endpoint::Cart, response).await?;
        debug!(item_id = %created.id, product_id = %line.product_id, "Added remote cart line");
        Ok(created)
    }

    async fn update_quantity(
        &self,
        token: &AuthToken,
        id: &str,
        quantity: i64,
    ) -> ClientResult<()> {
        let url = self.endpoint(&["cart", id])?;
        let request = self
            .client
            .patch(url)
            .bearer_auth(token.as_str())
            .json(&QuantityBody { quantity });
        self.send(Endpoint::Cart, request).await?;
        debug!(item_id = %id, quantity, "Updated remote cart quantity");
        Ok(())
    }

    async fn remove(&self, token: &AuthToken, id: &str) -> ClientResult<()> {
        let url = self.endpoint(&["cart", id])?;
        let request = self.client.delete(url).bearer_auth(token.as_str());
        self.send(Endpoint::Cart, request).await?;
        debug!(item_id = %id, "Removed remote cart line");
        Ok(())
    }
}

// =============================================================================
// Orders & Branches
// =============================================================================

#[async_trait]
impl OrderPlacement for ApiClient {
    async fn place_order(
        &self,
        session: &Session,
        payload: &OrderPayload,
    ) -> ClientResult<PlacedOrder> {
        let url = self.endpoint(&["orders"])?;
        let mut request = self.client.post(url).json(payload);
        if let Some(token) = session.token() {
            request = request.bearer_auth(token.as_str());
        }

        let response = self.send(Endpoint::Orders, request).await?;
        let placed: PlacedOrder = self.read_json(Endpoint::Orders, response).await?;
        debug!(order_id = %placed.id, order_code = %placed.order_code, "Order placed");
        Ok(placed)
    }
}

#[async_trait]
impl BranchInventory for ApiClient {
    async fn branches(&self, product_ids: &[String]) -> ClientResult<BranchAvailability> {
        let mut url = self.endpoint(&["branches"])?;
        url.query_pairs_mut()
            .append_pair("productIds", &product_ids.join(","));

        let response = self.send(Endpoint::Branches, self.client.get(url)).await?;
        let branches: Vec<Branch> = self.read_json(Endpoint::Branches, response).await?;
        debug!(count = branches.len(), "Fetched branch availability");
        Ok(BranchAvailability::new(branches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, patch, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use storefront_core::order::{OrderComposer, OrderDraft};
    use storefront_core::{CustomerInfo, DeliveryMethod, Money, TransactionType};

    type Log = Arc<Mutex<Vec<String>>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer t1")
    }

    fn unauthorized() -> (StatusCode, Json<Value>) {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Please log in again" })),
        )
    }

    async fn get_cart(headers: HeaderMap) -> (StatusCode, Json<Value>) {
        if !authorized(&headers) {
            return unauthorized();
        }
        (
            StatusCode::OK,
            Json(json!([{
                "cartItemId": "srv-1",
                "productId": "p1",
                "productName": "Linen shirt",
                "unitPrice": 100000,
                "quantity": 2,
                "color": "white",
                "size": "L",
                "condition": "new"
            }])),
        )
    }

    async fn add_line(
        State(log): State<Log>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if !authorized(&headers) {
            return unauthorized();
        }
        log.lock().unwrap().push(format!("POST {}", body));
        let mut created = body.clone();
        created["cartItemId"] = json!("srv-7");
        (StatusCode::CREATED, Json(created))
    }

    async fn update_line(
        State(log): State<Log>,
        Path(id): Path<String>,
        Json(body): Json<Value>,
    ) -> StatusCode {
        log.lock().unwrap().push(format!("PATCH {} {}", id, body["quantity"]));
        StatusCode::NO_CONTENT
    }

    async fn delete_line(State(log): State<Log>, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
        if id == "missing" {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Cart item not found" })),
            );
        }
        log.lock().unwrap().push(format!("DELETE {}", id));
        (StatusCode::OK, Json(json!({})))
    }

    async fn place_order(
        State(log): State<Log>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        log.lock().unwrap().push(format!(
            "ORDER auth={} type={}",
            authorized(&headers),
            body["transactionType"]
        ));
        if body["discountCode"] == "EXPIRED" {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": "Discount code expired" })),
            );
        }
        if body["discountCode"] == "LEGACY" {
            return (StatusCode::OK, Json(json!({ "status": "accepted" })));
        }
        (
            StatusCode::OK,
            Json(json!({ "id": "o-1", "orderCode": "OD0001" })),
        )
    }

    async fn branches(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let ids = params.get("productIds").cloned().unwrap_or_default();
        Json(json!([
            { "id": "b1", "name": "District 1", "outOfStockProductIds": [] },
            { "id": "b2", "name": "Echo", "address": ids, "outOfStockProductIds": ["p1"] }
        ]))
    }

    async fn spawn_server() -> (ApiClient, Log) {
        let log: Log = Arc::default();
        let app = Router::new()
            .route("/api/cart", get(get_cart).post(add_line))
            .route("/api/cart/{id}", patch(update_line).delete(delete_line))
            .route("/api/orders", post(place_order))
            .route("/api/branches", get(branches))
            .with_state(log.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = ApiClient::new(&ApiSettings {
            base_url: format!("http://{}/api", addr),
            timeout_secs: 5,
        })
        .unwrap();
        (client, log)
    }

    fn guest_payload(discount: Option<&str>) -> OrderPayload {
        let mut item = CartLineItem::new("l1", "p1", "Linen shirt");
        item.unit_price = Money::new(100_000);
        let mut draft = OrderDraft::new(
            TransactionType::Purchase,
            DeliveryMethod::HomeDelivery,
            vec![item],
        )
        .with_customer(CustomerInfo {
            full_name: "Lan".into(),
            phone_number: "0912345678".into(),
            address: "1 Le Loi".into(),
            ..Default::default()
        });
        draft.discount_code = discount.map(str::to_string);
        OrderComposer::new(Session::Guest)
            .prepare(&draft, None)
            .unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = ApiClient::new(&ApiSettings {
            base_url: "https://shop.example.com/api/".into(),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            client.endpoint(&["cart", "a b"]).unwrap().as_str(),
            "https://shop.example.com/api/cart/a%20b"
        );
    }

    #[tokio::test]
    async fn test_fetch_cart_with_token() {
        let (client, _log) = spawn_server().await;

        let lines = client.fetch(&AuthToken::new("t1")).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id, "srv-1");
        assert_eq!(lines[0].quantity, 2);

        let err = client.fetch(&AuthToken::new("wrong")).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Remote cart request failed: Please log in again");
    }

    #[tokio::test]
    async fn test_cart_mutations() {
        let (client, log) = spawn_server().await;
        let token = AuthToken::new("t1");

        let created = client
            .add(
                &token,
                &NewRemoteLine {
                    product_id: "p1".into(),
                    color: "white".into(),
                    size: "L".into(),
                    condition: "new".into(),
                    quantity: 1,
                },
            )
            .await
            .unwrap();
        assert_eq!(created.id, "srv-7");
        assert_eq!(created.product_id, "p1");

        client.update_quantity(&token, "srv-7", 3).await.unwrap();
        client.remove(&token, "srv-7").await.unwrap();

        let missing = client.remove(&token, "missing").await.unwrap_err();
        assert_eq!(missing.status(), Some(404));

        let log = log.lock().unwrap().clone();
        assert!(log[0].starts_with("POST"));
        assert!(log[0].contains("\"productId\":\"p1\""));
        assert_eq!(log[1], "PATCH srv-7 3");
        assert_eq!(log[2], "DELETE srv-7");
    }

    #[tokio::test]
    async fn test_place_order() {
        let (client, log) = spawn_server().await;

        let placed = client
            .place_order(&Session::Guest, &guest_payload(None))
            .await
            .unwrap();
        assert_eq!(placed.order_code, "OD0001");

        let session = Session::from_token(Some("t1".into()), None);
        client
            .place_order(&session, &guest_payload(None))
            .await
            .unwrap();

        let rejected = client
            .place_order(&Session::Guest, &guest_payload(Some("EXPIRED")))
            .await
            .unwrap_err();
        assert!(matches!(
            rejected,
            ClientError::OrderSubmission { status: Some(422), ref message } if message == "Discount code expired"
        ));
        assert!(!rejected.is_retryable());

        let log = log.lock().unwrap().clone();
        assert_eq!(log[0], "ORDER auth=false type=\"PURCHASE\"");
        assert_eq!(log[1], "ORDER auth=true type=\"PURCHASE\"");
    }

    #[tokio::test]
    async fn test_unreadable_order_confirmation() {
        let (client, log) = spawn_server().await;

        let err = client
            .place_order(&Session::Guest, &guest_payload(Some("LEGACY")))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::OrderOutcomeUnknown(_)));
        assert!(!err.is_retryable());
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_branches_query() {
        let (client, _log) = spawn_server().await;

        let availability = client
            .branches(&["p1".to_string(), "p2".to_string()])
            .await
            .unwrap();

        assert_eq!(availability.branches.len(), 2);
        let b2 = availability.find("b2").unwrap();
        assert_eq!(b2.address, "p1,p2");
        assert!(b2.is_out_of_stock("p1"));
    }

    #[tokio::test]
    async fn test_unreachable_server_has_no_status() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(&ApiSettings {
            base_url: format!("http://{}/api", addr),
            timeout_secs: 2,
        })
        .unwrap();

        let err = client
            .place_order(&Session::Guest, &guest_payload(None))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::OrderSubmission { status: None, .. }));
        assert!(err.is_retryable());
    }
}

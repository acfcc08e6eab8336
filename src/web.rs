use crate::form::{OrderForm, ValidationError};
use crate::locale::Locale;
use crate::order::{OrderRow, OrderStatus};
use crate::query::{self, Pager, QueryDescriptor, SortDirection, SortKey, SortState};
use crate::source::OrderSource;
use crate::temporal::Instant;
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::{error, info};

pub struct AppState {
    pub source: Box<dyn OrderSource>,
    pub locale: Locale,
    pub default_page_size: usize,
}

type Shared = Arc<AppState>;

#[derive(Debug, Default, Deserialize)]
struct TableParams {
    #[serde(default)]
    search: String,
    sort: Option<SortKey>,
    dir: Option<SortDirection>,
    /// Column header clicked on top of the current `sort`/`dir`.
    select: Option<SortKey>,
    page: Option<usize>,
    size: Option<usize>,
}

impl TableParams {
    fn descriptor(&self, default_page_size: usize) -> QueryDescriptor {
        let descriptor = QueryDescriptor::default()
            .with_page_size(self.size.unwrap_or(default_page_size))
            .with_search(self.search.as_str())
            .with_sort(SortState::new(self.sort.unwrap_or_default(), self.dir.unwrap_or_default()))
            .with_page(self.page.unwrap_or(1));

        match self.select {
            Some(key) => descriptor.with_sort_column(key),
            None => descriptor,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderTable {
    rows: Vec<OrderRow>,
    locale: String,
    search: String,
    sort: SortState,
    page_size: usize,
    page: usize,
    total_pages: usize,
    total_matching: usize,
    summary: String,
    pager: Pager,
}

async fn api_orders(State(state): State<Shared>, Query(params): Query<TableParams>) -> Response {
    let orders = match state.source.list_orders() {
        Ok(orders) => orders,
        Err(err) => {
            error!(error = %err, "Failed to load orders");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let descriptor = params.descriptor(state.default_page_size);
    let result = query::apply(&orders, &descriptor, &state.locale);

    Json(OrderTable {
        rows: result
            .visible_records
            .iter()
            .map(|order| OrderRow::render(order, &state.locale))
            .collect(),
        locale: state.locale.tag().to_string(),
        search: descriptor.search_term.clone(),
        sort: descriptor.sort,
        page_size: descriptor.page_size,
        page: result.page,
        total_pages: result.total_pages,
        total_matching: result.total_matching,
        summary: result.summary(),
        pager: Pager::for_result(&result),
    })
    .into_response()
}

/// A form plus the choices for its status selector.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormView {
    #[serde(flatten)]
    form: OrderForm,
    statuses: [OrderStatus; 5],
}

impl FormView {
    fn new(form: OrderForm) -> Self {
        Self {
            form,
            statuses: OrderStatus::ALL,
        }
    }
}

fn rejected(err: ValidationError) -> Response {
    info!(reason = %err, "Order form rejected");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

async fn api_new_form() -> Response {
    Json(FormView::new(OrderForm::blank(Instant::now()))).into_response()
}

async fn api_order_form(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    match state.source.find_order(id) {
        Ok(Some(order)) => Json(FormView::new(OrderForm::from_order(&order, Instant::now()))).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!(error = %err, id, "Failed to load order");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

async fn api_validate(Json(form): Json<OrderForm>) -> Response {
    match form.validate() {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => rejected(err),
    }
}

async fn api_payload(Json(form): Json<OrderForm>) -> Response {
    match form.to_payload() {
        Ok(payload) => Json(payload).into_response(),
        Err(err) => rejected(err),
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/orders", get(api_orders))
        .route("/api/orders/new/form", get(api_new_form))
        .route("/api/orders/{id}/form", get(api_order_form))
        .route("/api/orders/validate", post(api_validate))
        .route("/api/orders/payload", post(api_payload))
        .with_state(state)
}

/// Serve the table view until `running` is cleared.
pub fn start(state: AppState, port: u16, running: Arc<AtomicBool>) -> Result<()> {
    let app = router(Arc::new(state));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime for web server")?;

    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("Web server failed to bind port {port}"))?;

        info!(port, "Web server listening");

        let shutdown = async move {
            while running.load(Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
            info!("Web server shutting down");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Web server error")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    struct Fixed(Vec<Order>);

    impl OrderSource for Fixed {
        fn list_orders(&self) -> Result<Vec<Order>> {
            Ok(self.0.clone())
        }
    }

    fn test_router() -> Router {
        let orders = crate::source::parse_orders(
            r#"[
                {"id": 1, "customerName": "Ann", "product": "Widget", "quantity": 2, "unitPrice": 1234.5, "status": "NEW"},
                {"id": 2, "customerName": "Bob", "product": "Gadget", "quantity": 1, "unitPrice": "3", "status": "SHIPPED"},
                {"id": 3, "customerName": "Cy", "product": "Widget", "quantity": 4, "unitPrice": 0.5, "status": "NEW"}
            ]"#,
        )
        .unwrap();
        router(Arc::new(AppState {
            source: Box::new(Fixed(orders)),
            locale: Locale::default(),
            default_page_size: 5,
        }))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn params_default_to_id_ascending_first_page() {
        let descriptor = TableParams::default().descriptor(10);
        assert_eq!(descriptor.sort, SortState::default());
        assert_eq!(descriptor.page, 1);
        assert_eq!(descriptor.page_size, 10);
        assert_eq!(descriptor.search_term, "");
    }

    #[test]
    fn params_read_query_string_values() {
        let params: TableParams = serde_json::from_value(json!({
            "search": "acme",
            "sort": "unitPrice",
            "dir": "desc",
            "page": 2,
            "size": 25
        }))
        .unwrap();
        let descriptor = params.descriptor(5);

        assert_eq!(descriptor.sort, SortState::new(SortKey::UnitPrice, SortDirection::Descending));
        assert_eq!(descriptor.page, 2);
        assert_eq!(descriptor.page_size, 25);
    }

    #[test]
    fn header_selection_toggles_the_current_sort() {
        let same: TableParams = serde_json::from_value(json!({
            "sort": "product",
            "dir": "asc",
            "select": "product"
        }))
        .unwrap();
        assert_eq!(
            same.descriptor(5).sort,
            SortState::new(SortKey::Product, SortDirection::Descending)
        );

        let other: TableParams = serde_json::from_value(json!({
            "sort": "product",
            "dir": "desc",
            "select": "status"
        }))
        .unwrap();
        assert_eq!(
            other.descriptor(5).sort,
            SortState::new(SortKey::Status, SortDirection::Ascending)
        );
    }

    #[tokio::test]
    async fn table_response_shape() {
        let request = Request::builder()
            .uri("/api/orders?search=widget&sort=customerName&select=customerName")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let table = body_json(response).await;
        assert_eq!(table["locale"], "en-US");
        assert_eq!(table["sort"], json!({"key": "customerName", "dir": "desc"}));
        assert_eq!(table["totalMatching"], 2);
        assert_eq!(table["totalPages"], 1);
        assert_eq!(table["summary"], "Showing 2 of 2 orders");
        assert_eq!(table["pager"]["hasNext"], false);
        assert_eq!(table["rows"][0]["customerName"], "Cy");
        assert_eq!(table["rows"][1]["unitPrice"], "1,234.50");
        assert_eq!(table["rows"][1]["lineTotal"], "2,469.00");
        assert_eq!(table["rows"][1]["statusClass"], "new");
    }

    #[tokio::test]
    async fn edit_form_lists_statuses() {
        let request = Request::builder()
            .uri("/api/orders/2/form")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let form = body_json(response).await;
        assert_eq!(form["customerName"], "Bob");
        assert_eq!(form["status"], "SHIPPED");
        assert_eq!(
            form["statuses"],
            json!(["NEW", "PROCESSING", "SHIPPED", "COMPLETED", "CANCELLED"])
        );

        let request = Request::builder()
            .uri("/api/orders/9/form")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejected_form_reports_first_error() {
        let form = json!({
            "customerName": " ",
            "product": "",
            "quantity": "1",
            "unitPrice": "0",
            "orderDate": "2024-03-05T09:15",
            "status": "NEW"
        });

        let response = test_router()
            .oneshot(post_json("/api/orders/payload", form.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await, json!({"error": "Customer name is required"}));

        let response = test_router()
            .oneshot(post_json("/api/orders/validate", form))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn accepted_form_becomes_payload() {
        let form = json!({
            "id": "4",
            "customerName": " Dee ",
            "product": "Widget",
            "quantity": "2",
            "unitPrice": "2.50",
            "orderDate": "2024-03-05T09:15",
            "status": "PROCESSING"
        });

        let response = test_router()
            .oneshot(post_json("/api/orders/validate", form.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = test_router()
            .oneshot(post_json("/api/orders/payload", form))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "id": 4,
                "customerName": "Dee",
                "product": "Widget",
                "quantity": 2,
                "unitPrice": 2.5,
                "orderDate": "2024-03-05T09:15:00",
                "status": "PROCESSING"
            })
        );
    }
}

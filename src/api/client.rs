//! The typed client for the Eventory backend.
//!
//! Every authenticated request carries the session's bearer token. When the backend answers 403
//! the client refreshes the access token once and retries once; whatever the retry returns is
//! final. An access token that the clock says has expired is refreshed before sending instead of
//! being sent, and that refresh counts as the one refresh for the call.

use crate::api::{session, ApiRequest, ApiResponse, Session, Tokens, Transport};
use crate::error::{Error, ErrorType, IntoResult, Result};
use crate::model::wire::{
    self, RawCustomer, RawInventoryItem, RawItemReport, RawLedger, RawSale, TokenResponse,
};
use crate::model::{
    CustomerForm, CustomerRecord, Decoded, InventoryItem, ItemForm, ItemReport, Ledger, NewSale,
    Sale, SaleType,
};
use anyhow::Context;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const REFRESH_PATH: &str = "/refresh-token";

/// The outcome of `register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    pub message: Option<String>,
    /// Whether the backend issued tokens, in which case the user is now logged in.
    pub logged_in: bool,
}

pub struct ApiClient {
    transport: Box<dyn Transport>,
    session: Session,
    submitting: Mutex<()>,
}

impl ApiClient {
    pub fn new(transport: Box<dyn Transport>, session: Session) -> Self {
        Self {
            transport,
            session,
            submitting: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // =========================================================================================
    // Auth
    // =========================================================================================

    /// Logs in and stores the issued tokens.
    pub async fn login(&self, username: &str, password: &str) -> Result<Tokens> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(Error::msg(
                ErrorType::Validation,
                "A username and password are required",
            ));
        }
        let request = ApiRequest::post(
            "/login",
            json!({"username": username, "password": password}),
        );
        let body = self.unauthenticated(request).await?;
        let tokens: TokenResponse = serde_json::from_value(body)
            .context("The login response did not contain an access token")
            .pub_result(ErrorType::Auth)?;
        self.session
            .begin(
                tokens.access_token,
                tokens.refresh_token,
                session::login_access_ttl(),
            )
            .await
    }

    /// Creates an account. `confirm` must match `password`; this is checked before anything is
    /// sent.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<Registered> {
        if password != confirm {
            return Err(Error::msg(ErrorType::Validation, "Passwords do not match"));
        }
        if username.trim().is_empty() || password.is_empty() {
            return Err(Error::msg(
                ErrorType::Validation,
                "A username and password are required",
            ));
        }
        let request = ApiRequest::post(
            "/register",
            json!({"username": username, "password": password, "email": email}),
        );
        let body = self.unauthenticated(request).await?;
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let logged_in = match serde_json::from_value::<TokenResponse>(body) {
            Ok(tokens) => {
                self.session
                    .begin(
                        tokens.access_token,
                        tokens.refresh_token,
                        session::register_access_ttl(),
                    )
                    .await?;
                true
            }
            Err(_) => false,
        };
        Ok(Registered { message, logged_in })
    }

    /// Forgets the stored tokens. The backend is not involved.
    pub async fn logout(&self) -> Result<()> {
        self.session.end().await
    }

    // =========================================================================================
    // Sales and reports
    // =========================================================================================

    pub async fn sales(&self) -> Result<Decoded<Sale>> {
        let body = self.call(ApiRequest::get("/sales")).await?;
        wire::decode_list::<RawSale, Sale>("sale", body).pub_result(ErrorType::Validation)
    }

    /// Per-item totals, aggregated by the backend.
    pub async fn item_report(&self) -> Result<Decoded<ItemReport>> {
        let body = self.call(ApiRequest::get("/report")).await?;
        wire::decode_list::<RawItemReport, ItemReport>("item report", body)
            .pub_result(ErrorType::Validation)
    }

    pub async fn ledger(&self, customer_id: &str) -> Result<Ledger> {
        require("customer id", customer_id)?;
        let request = ApiRequest::post("/customer/ledger", json!({"customerId": customer_id}));
        let body = self.call(request).await?;
        wire::decode::<RawLedger, Ledger>(body)
            .context("Invalid ledger response")
            .pub_result(ErrorType::Validation)
    }

    /// Records a sale. A second call while one is still in flight on this client is refused
    /// rather than sent twice.
    pub async fn record_sale(&self, sale: &NewSale) -> Result<Option<String>> {
        require("item id", &sale.item_id)?;
        if sale.quantity == 0 {
            return Err(Error::msg(
                ErrorType::Validation,
                "Quantity must be at least 1",
            ));
        }
        if sale.sale_type == SaleType::Customer && sale.customer_name.trim().is_empty() {
            return Err(Error::msg(
                ErrorType::Validation,
                "A customer name is required for a customer sale",
            ));
        }
        let _guard = self.submitting.try_lock().map_err(|_| {
            Error::msg(
                ErrorType::Request,
                "A sale submission is already in progress",
            )
        })?;
        let body = serde_json::to_value(sale)
            .context("Unable to serialize the sale")
            .pub_result(ErrorType::Validation)?;
        let response = self.call(ApiRequest::post("/sales", body)).await?;
        Ok(message(&response))
    }

    /// Emails a customer's ledger. The transactions are sent as they were received.
    pub async fn send_ledger_email(
        &self,
        customer_id: &str,
        email: &str,
        ledger: &Ledger,
    ) -> Result<Option<String>> {
        validate_email(email)?;
        require("customer id", customer_id)?;
        let request = ApiRequest::post(
            "/send-ledger-email",
            json!({
                "customerId": customer_id,
                "email": email,
                "ledgerDetails": ledger.transactions.records(),
            }),
        );
        let response = self.call(request).await?;
        Ok(message(&response))
    }

    /// Emails the given sales rows, in the order given.
    pub async fn send_sales_email(
        &self,
        email: &str,
        subject: &str,
        rows: &[Sale],
    ) -> Result<Option<String>> {
        validate_email(email)?;
        let sales: Vec<Value> = rows
            .iter()
            .map(|s| {
                json!({
                    "item": s.item_name().unwrap_or("Unknown"),
                    "customer": s.customer_name(),
                    "quantity": s.quantity(),
                    "saleType": s.sale_type(),
                    "date": s.date(),
                })
            })
            .collect();
        let request = ApiRequest::post(
            "/send-email",
            json!({"email": email, "subject": subject, "sales": sales}),
        );
        let response = self.call(request).await?;
        Ok(message(&response))
    }

    // =========================================================================================
    // Inventory
    // =========================================================================================

    pub async fn inventory(&self) -> Result<Decoded<InventoryItem>> {
        let body = self.call(ApiRequest::get("/inventory")).await?;
        decode_items(body)
    }

    /// An empty query lists the whole inventory.
    pub async fn search_inventory(&self, query: &str) -> Result<Decoded<InventoryItem>> {
        if query.trim().is_empty() {
            return self.inventory().await;
        }
        let request = ApiRequest::get("/inventory/search").with_query("q", query.trim());
        decode_items(self.call(request).await?)
    }

    pub async fn add_item(&self, item: &ItemForm) -> Result<Option<String>> {
        require("item name", &item.name)?;
        self.send_form(ApiRequest::post("/inventory", to_body(item)?))
            .await
    }

    pub async fn update_item(&self, item: &ItemForm) -> Result<Option<String>> {
        require("item id", item.id.as_deref().unwrap_or_default())?;
        self.send_form(ApiRequest::put("/inventory", to_body(item)?))
            .await
    }

    pub async fn delete_item(&self, id: &str) -> Result<Option<String>> {
        require("item id", id)?;
        self.send_form(ApiRequest::delete("/inventory", json!({"id": id})))
            .await
    }

    // =========================================================================================
    // Customers
    // =========================================================================================

    pub async fn customers(&self) -> Result<Decoded<CustomerRecord>> {
        let body = self.call(ApiRequest::get("/customers")).await?;
        decode_customers(body)
    }

    /// An empty query lists every customer.
    pub async fn search_customers(&self, query: &str) -> Result<Decoded<CustomerRecord>> {
        if query.trim().is_empty() {
            return self.customers().await;
        }
        let request = ApiRequest::get("/customers/search").with_query("q", query.trim());
        decode_customers(self.call(request).await?)
    }

    pub async fn add_customer(&self, customer: &CustomerForm) -> Result<Option<String>> {
        require("customer name", &customer.name)?;
        self.send_form(ApiRequest::post("/customers", to_body(customer)?))
            .await
    }

    pub async fn update_customer(&self, customer: &CustomerForm) -> Result<Option<String>> {
        require("customer id", customer.id.as_deref().unwrap_or_default())?;
        self.send_form(ApiRequest::put("/customers", to_body(customer)?))
            .await
    }

    pub async fn delete_customer(&self, id: &str) -> Result<Option<String>> {
        require("customer id", id)?;
        self.send_form(ApiRequest::delete("/customers", json!({"id": id})))
            .await
    }

    // =========================================================================================
    // Plumbing
    // =========================================================================================

    async fn send_form(&self, request: ApiRequest) -> Result<Option<String>> {
        let body = self.call(request).await?;
        Ok(message(&body))
    }

    /// Sends an authenticated request and returns the body of a successful response.
    async fn call(&self, mut request: ApiRequest) -> Result<Value> {
        let tokens = self.session.tokens().await?;
        let mut refreshed = false;
        let access = if tokens.access_valid(self.session.now()) {
            tokens.access_token().to_string()
        } else {
            debug!("The access token has expired, refreshing before {}", request.path);
            refreshed = true;
            self.refresh(&tokens).await?
        };
        request.bearer = Some(access);

        let response = self.exchange(&request).await?;
        if response.status != 403 || refreshed {
            return check_status(&request, response);
        }

        debug!(
            "{} {} was refused with 403, refreshing the access token and retrying once",
            request.method, request.path
        );
        let access = self.refresh(&tokens).await?;
        request.bearer = Some(access);
        let response = self.exchange(&request).await?;
        check_status(&request, response)
    }

    /// Sends a request that needs no token, e.g. `/login`. Any failure status is an `Auth` error.
    async fn unauthenticated(&self, request: ApiRequest) -> Result<Value> {
        let response = self.exchange(&request).await?;
        if response.is_success() {
            return Ok(response.body);
        }
        Err(Error::msg(
            ErrorType::Auth,
            format!(
                "{} failed with status {}: {}",
                request.path,
                response.status,
                response.message().unwrap_or("no message")
            ),
        ))
    }

    /// Exchanges the refresh token for a new access token, stores it and returns it.
    async fn refresh(&self, tokens: &Tokens) -> Result<String> {
        let refresh_token = tokens.refresh_token().ok_or_else(|| {
            Error::msg(
                ErrorType::Auth,
                "No refresh token is available, log in again",
            )
        })?;
        if !tokens.refresh_valid(self.session.now()) {
            return Err(Error::msg(
                ErrorType::Auth,
                "The session has expired, log in again",
            ));
        }

        let request = ApiRequest::post(REFRESH_PATH, json!({"token": refresh_token}));
        let response = self.exchange(&request).await?;
        if !response.is_success() {
            warn!("Token refresh was refused with status {}", response.status);
            return Err(Error::msg(
                ErrorType::Auth,
                format!(
                    "Token refresh failed with status {}: {}",
                    response.status,
                    response.message().unwrap_or("no message")
                ),
            ));
        }
        let renewed: TokenResponse = serde_json::from_value(response.body)
            .context("The refresh response did not contain an access token")
            .pub_result(ErrorType::Auth)?;
        let tokens = self.session.update_access(renewed.access_token).await?;
        Ok(tokens.access_token().to_string())
    }

    async fn exchange(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.transport
            .send(request)
            .await
            .with_context(|| format!("{} {} failed", request.method, request.path))
            .pub_result(ErrorType::Network)
    }
}

fn check_status(request: &ApiRequest, response: ApiResponse) -> Result<Value> {
    if response.is_success() {
        return Ok(response.body);
    }
    let error_type = match response.status {
        401 | 403 => ErrorType::Auth,
        _ => ErrorType::Network,
    };
    Err(Error::msg(
        error_type,
        format!(
            "{} {} failed with status {}: {}",
            request.method,
            request.path,
            response.status,
            response.message().unwrap_or("no message")
        ),
    ))
}

fn message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::msg(
            ErrorType::Validation,
            format!("A {what} is required"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::msg(
            ErrorType::Validation,
            "Please provide an email address",
        ));
    }
    if !email.contains('@') {
        return Err(Error::msg(
            ErrorType::Validation,
            format!("'{email}' is not an email address"),
        ));
    }
    Ok(())
}

fn to_body<T: Serialize>(form: &T) -> Result<Value> {
    serde_json::to_value(form)
        .context("Unable to serialize the form")
        .pub_result(ErrorType::Validation)
}

fn decode_items(body: Value) -> Result<Decoded<InventoryItem>> {
    wire::decode_list::<RawInventoryItem, InventoryItem>("inventory item", body)
        .pub_result(ErrorType::Validation)
}

fn decode_customers(body: Value) -> Result<Decoded<CustomerRecord>> {
    wire::decode_list::<RawCustomer, CustomerRecord>("customer", body)
        .pub_result(ErrorType::Validation)
}

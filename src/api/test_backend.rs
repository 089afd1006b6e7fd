//! An in-memory stand-in for the Eventory backend.
//!
//! Note: this is compiled even in the production build so that the whole app can run top-to-bottom
//! without a server (see `Mode::Test`). Each instance starts from the same seed data, and changes
//! last only as long as the instance does.

use crate::api::{ApiRequest, ApiResponse, Method, Transport};
use anyhow::anyhow;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Mutex;
use tracing::trace;

/// The seeded user's credentials.
pub const TEST_USERNAME: &str = "demo";
pub const TEST_PASSWORD: &str = "demo123";

const REFRESH_TOKEN: &str = "test-refresh";

/// A `Transport` that answers from seeded in-memory data.
#[derive(Debug)]
pub struct TestBackend {
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    users: Vec<(String, String)>,
    inventory: Vec<Value>,
    customers: Vec<Value>,
    /// Stored with `itemId` as a plain id; populated on read.
    sales: Vec<Value>,
    outbox: Vec<Value>,
    generation: u32,
    next_id: u32,
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new(seed_inventory(), seed_customers(), seed_sales())
    }
}

impl TestBackend {
    /// A backend holding the given records. `sales` reference inventory items by `itemId`.
    pub fn new(inventory: Vec<Value>, customers: Vec<Value>, sales: Vec<Value>) -> Self {
        Self {
            state: Mutex::new(State {
                users: vec![(TEST_USERNAME.to_string(), TEST_PASSWORD.to_string())],
                inventory,
                customers,
                sales,
                outbox: Vec::new(),
                generation: 1,
                next_id: 1,
            }),
        }
    }

    /// The access token currently accepted, as issued by `/login` and `/refresh-token`.
    pub fn access_token(&self) -> String {
        self.state
            .lock()
            .map(|s| access_token(s.generation))
            .unwrap_or_default()
    }

    /// Makes the backend reject the current access token, as if it had expired server-side.
    pub fn expire_access_token(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.generation += 1;
        }
    }

    /// The bodies of every email request received so far.
    pub fn outbox(&self) -> Vec<Value> {
        self.state
            .lock()
            .map(|s| s.outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Transport for TestBackend {
    async fn send(&self, request: &ApiRequest) -> anyhow::Result<ApiResponse> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("The test backend state is poisoned"))?;
        let response = state.route(request);
        trace!(
            "test backend: {} {} -> {}",
            request.method,
            request.path,
            response.status
        );
        Ok(response)
    }
}

fn access_token(generation: u32) -> String {
    format!("test-access-{generation}")
}

fn reply(status: u16, message: &str) -> ApiResponse {
    ApiResponse::new(status, json!({ "message": message }))
}

fn body_str<'a>(request: &'a ApiRequest, key: &str) -> &'a str {
    request
        .body
        .as_ref()
        .and_then(|b| b.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn field<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn decimal(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string()).unwrap_or_default(),
        Some(Value::String(s)) => Decimal::from_str(s).unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}

fn count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_default(),
        Some(Value::String(s)) => s.parse().unwrap_or_default(),
        _ => 0,
    }
}

fn matches(record: &Value, keys: &[&str], query: &str) -> bool {
    let query = query.to_lowercase();
    keys.iter()
        .any(|k| field(record, k).to_lowercase().contains(&query))
}

impl State {
    fn route(&mut self, request: &ApiRequest) -> ApiResponse {
        let path = request.path.as_str();
        match (request.method, path) {
            (Method::Post, "/login") => return self.login(request),
            (Method::Post, "/register") => return self.register(request),
            (Method::Post, "/refresh-token") => return self.refresh(request),
            _ => {}
        }

        if request.bearer.as_deref() != Some(access_token(self.generation).as_str()) {
            return reply(403, "Invalid or expired token");
        }

        match (request.method, path) {
            (Method::Get, "/sales") => ApiResponse::ok(Value::Array(self.populated_sales())),
            (Method::Post, "/sales") => self.record_sale(request),
            (Method::Get, "/report") => self.report(),
            (Method::Post, "/customer/ledger") => self.ledger(request),
            (Method::Post, "/send-ledger-email") | (Method::Post, "/send-email") => {
                self.outbox.push(request.body.clone().unwrap_or(Value::Null));
                reply(200, "Email sent successfully")
            }
            (Method::Get, "/inventory") => ApiResponse::ok(Value::Array(self.inventory.clone())),
            (Method::Get, "/inventory/search") => {
                let q = request.query_value("q").unwrap_or_default();
                let found = self
                    .inventory
                    .iter()
                    .filter(|i| matches(i, &["name", "description"], q))
                    .cloned()
                    .collect();
                ApiResponse::ok(Value::Array(found))
            }
            (Method::Get, "/customers") => ApiResponse::ok(Value::Array(self.customers.clone())),
            (Method::Get, "/customers/search") => {
                let q = request.query_value("q").unwrap_or_default();
                let found = self
                    .customers
                    .iter()
                    .filter(|c| matches(c, &["name", "address", "mobile"], q))
                    .cloned()
                    .collect();
                ApiResponse::ok(Value::Array(found))
            }
            (method, "/inventory") => {
                let id = self.new_id("item");
                crud(&mut self.inventory, method, request, id, "Item")
            }
            (method, "/customers") => {
                let id = self.new_id("customer");
                crud(&mut self.customers, method, request, id, "Customer")
            }
            _ => reply(404, "Not found"),
        }
    }

    fn new_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-new-{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn tokens(&self) -> ApiResponse {
        ApiResponse::ok(json!({
            "accessToken": access_token(self.generation),
            "refreshToken": REFRESH_TOKEN,
        }))
    }

    fn login(&self, request: &ApiRequest) -> ApiResponse {
        let username = body_str(request, "username");
        let password = body_str(request, "password");
        if self
            .users
            .iter()
            .any(|(u, p)| u == username && p == password)
        {
            self.tokens()
        } else {
            reply(400, "Invalid credentials")
        }
    }

    fn register(&mut self, request: &ApiRequest) -> ApiResponse {
        let username = body_str(request, "username");
        if self.users.iter().any(|(u, _)| u == username) {
            return reply(400, "User already exists");
        }
        self.users
            .push((username.to_string(), body_str(request, "password").to_string()));
        reply(201, "User registered successfully")
    }

    fn refresh(&self, request: &ApiRequest) -> ApiResponse {
        if body_str(request, "token") == REFRESH_TOKEN {
            ApiResponse::ok(json!({ "accessToken": access_token(self.generation) }))
        } else {
            reply(403, "Invalid refresh token")
        }
    }

    fn item(&self, id: &str) -> Option<&Value> {
        self.inventory.iter().find(|i| field(i, "_id") == id)
    }

    /// Replaces each sale's `itemId` with the item document, or null when the item is gone.
    fn populate(&self, sale: &Value) -> Value {
        let mut sale = sale.clone();
        let item = self
            .item(field(&sale, "itemId"))
            .cloned()
            .unwrap_or(Value::Null);
        if let Some(obj) = sale.as_object_mut() {
            obj.insert("itemId".into(), item);
        }
        sale
    }

    fn populated_sales(&self) -> Vec<Value> {
        self.sales.iter().map(|s| self.populate(s)).collect()
    }

    fn record_sale(&mut self, request: &ApiRequest) -> ApiResponse {
        let Some(body) = request.body.clone().filter(Value::is_object) else {
            return reply(400, "Missing sale");
        };
        let item_id = field(&body, "itemId").to_string();
        let quantity = count(body.get("quantity"));
        let Some(stock) = self.item(&item_id).map(|i| count(i.get("quantity"))) else {
            return reply(404, "Item not found");
        };
        if quantity == 0 || quantity > stock {
            return reply(400, "Insufficient stock");
        }
        if let Some(item) = self
            .inventory
            .iter_mut()
            .find(|i| field(i, "_id") == item_id)
        {
            item["quantity"] = json!(stock - quantity);
        }
        let id = self.new_id("sale");
        let mut sale = body;
        sale["_id"] = json!(id);
        self.sales.push(sale);
        reply(201, "Sale recorded successfully")
    }

    fn report(&self) -> ApiResponse {
        let rows: Vec<Value> = self
            .inventory
            .iter()
            .map(|item| {
                let id = field(item, "_id");
                let price = decimal(item.get("price"));
                let sold: u64 = self
                    .sales
                    .iter()
                    .filter(|s| field(s, "itemId") == id)
                    .map(|s| count(s.get("quantity")))
                    .sum();
                json!({
                    "_id": id,
                    "name": field(item, "name"),
                    "description": field(item, "description"),
                    "totalSold": sold,
                    "revenue": (price * Decimal::from(sold)).to_string(),
                })
            })
            .collect();
        ApiResponse::ok(Value::Array(rows))
    }

    fn ledger(&self, request: &ApiRequest) -> ApiResponse {
        let customer_id = body_str(request, "customerId");
        let Some(customer) = self
            .customers
            .iter()
            .find(|c| field(c, "_id") == customer_id)
        else {
            return reply(404, "Customer not found");
        };
        let name = field(customer, "name").to_lowercase();
        let transactions: Vec<Value> = self
            .sales
            .iter()
            .filter(|s| field(s, "customerName").to_lowercase() == name)
            .map(|s| self.populate(s))
            .collect();
        let total: Decimal = transactions
            .iter()
            .map(|t| {
                let price = decimal(t.get("itemId").and_then(|i| i.get("price")));
                price * Decimal::from(count(t.get("quantity")))
            })
            .sum();
        ApiResponse::ok(json!({
            "customer": customer,
            "transactions": transactions,
            "totalBalance": total.to_string(),
        }))
    }
}

/// Create, update and delete for a flat collection keyed by `_id`.
fn crud(
    records: &mut Vec<Value>,
    method: Method,
    request: &ApiRequest,
    new_id: String,
    what: &str,
) -> ApiResponse {
    let Some(body) = request.body.clone().filter(Value::is_object) else {
        return reply(400, &format!("Missing {}", what.to_lowercase()));
    };
    match method {
        Method::Post => {
            let mut record = body;
            record["_id"] = json!(new_id);
            records.push(record);
            reply(201, &format!("{what} added successfully"))
        }
        Method::Put => {
            let id = field(&body, "_id").to_string();
            match records.iter_mut().find(|r| field(r, "_id") == id) {
                Some(existing) => {
                    *existing = body;
                    reply(200, &format!("{what} updated successfully"))
                }
                None => reply(404, &format!("{what} not found")),
            }
        }
        Method::Delete => {
            let id = field(&body, "id").to_string();
            let before = records.len();
            records.retain(|r| field(r, "_id") != id);
            if records.len() < before {
                reply(200, &format!("{what} deleted successfully"))
            } else {
                reply(404, &format!("{what} not found"))
            }
        }
        Method::Get => reply(404, "Not found"),
    }
}

fn seed_inventory() -> Vec<Value> {
    vec![
        json!({"_id": "item-1", "name": "Desk Lamp", "description": "LED, warm white", "quantity": 40, "price": 24.99}),
        json!({"_id": "item-2", "name": "Office Chair", "description": "Mesh back", "quantity": 12, "price": 149.5}),
        json!({"_id": "item-3", "name": "Notebook", "description": "A5, dotted", "quantity": 300, "price": 3.25}),
    ]
}

fn seed_customers() -> Vec<Value> {
    vec![
        json!({"_id": "cust-1", "name": "Ada Lovelace", "address": "12 Analytical Way", "mobile": "555-0101"}),
        json!({"_id": "cust-2", "name": "Grace Hopper", "address": "7 Compiler Court", "mobile": "555-0102"}),
    ]
}

/// Includes one sale whose item no longer exists and one with an unusable date.
fn seed_sales() -> Vec<Value> {
    vec![
        json!({"_id": "sale-1", "itemId": "item-1", "quantity": 2, "date": "2024-01-02T10:15:00.000Z", "saleType": "Cash", "customerName": ""}),
        json!({"_id": "sale-2", "itemId": "item-3", "quantity": 3, "date": "2024-01-03T09:00:00.000Z", "saleType": "Customer", "customerName": "Ada Lovelace"}),
        json!({"_id": "sale-3", "itemId": "item-2", "quantity": 1, "date": "2024-01-03T16:40:00.000Z", "saleType": "Card", "customerName": "Grace Hopper"}),
        json!({"_id": "sale-4", "itemId": "item-1", "quantity": 4, "date": "2024-02-04T12:00:00.000Z", "saleType": "Customer", "customerName": "Ada Lovelace"}),
        json!({"_id": "sale-5", "itemId": "item-retired", "quantity": 5, "date": "2024-02-20T08:30:00.000Z", "saleType": "Online", "customerName": "Linus"}),
        json!({"_id": "sale-6", "itemId": "item-3", "quantity": 10, "date": "2024-03-11T14:00:00.000Z", "saleType": "Cash", "customerName": ""}),
        json!({"_id": "sale-7", "itemId": "item-3", "quantity": 1, "date": "sometime in March", "saleType": "Cash", "customerName": ""}),
    ]
}

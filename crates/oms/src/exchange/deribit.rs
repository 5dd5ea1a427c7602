use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::Command;
use crate::exchange::rpc::{self, RpcRequest};
use crate::exchange::transport::{HttpTransport, Transport};
use crate::exchange::Exchange;
use crate::{Error, Result};

pub const TESTNET_URL: &str = "https://test.deribit.com/api/v2";

#[derive(Debug, Serialize)]
struct AuthParams<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResult {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct BuyParams<'a> {
    instrument_name: &'a str,
    amount: f64,
    #[serde(rename = "type")]
    order_type: &'static str,
    label: &'static str,
    price: f64,
}

#[derive(Debug, Serialize)]
struct CancelParams<'a> {
    order_id: &'a str,
}

#[derive(Debug, Serialize)]
struct EditParams<'a> {
    order_id: &'a str,
    amount: f64,
    price: f64,
}

#[derive(Debug, Serialize)]
struct OrderBookParams<'a> {
    instrument_name: &'a str,
    depth: u32,
}

#[derive(Debug, Serialize)]
struct PositionsParams<'a> {
    instrument_name: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenOrdersParams {
    kind: &'static str,
    #[serde(rename = "type")]
    order_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub asks: Vec<(f64, f64)>,
    #[serde(default)]
    pub bids: Vec<(f64, f64)>,
}

impl OrderBook {
    pub fn ask_lines(&self) -> Vec<String> {
        self.asks
            .iter()
            .map(|(price, amount)| format!("Price {price} Amount {amount}"))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Position {
    pub instrument_name: String,
    pub size: f64,
    pub average_price: f64,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Instrument: {} Size: {} Average Price: {}",
            self.instrument_name, self.size, self.average_price
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenOrder {
    pub order_id: String,
    pub price: f64,
    pub amount: f64,
    pub instrument_name: String,
}

impl fmt::Display for OpenOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order ID: {} Price: {} Amount: {} Instrument {}",
            self.order_id, self.price, self.amount, self.instrument_name
        )
    }
}

/// Client for the Deribit JSON-RPC over HTTP API.
///
/// Authenticate once before sharing the client between workers; the token
/// is not refreshed.
#[derive(Debug)]
pub struct DeribitClient<T = HttpTransport>
where
    T: Transport,
{
    transport: T,
    base_url: String,
    token: Option<String>,
}

impl<T> DeribitClient<T>
where
    T: Transport,
{
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn call<P, R>(&self, method: &str, params: P, private: bool) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let body = RpcRequest::new(method, params).to_bytes()?;
        let token = if private { self.token() } else { None };
        if private && token.is_none() {
            tracing::warn!("Calling {} without an access token", method);
        }

        tracing::debug!("POST {}", url);
        let response = self.transport.post(&url, body, token)?;

        match rpc::decode(&response.body) {
            Err(err @ Error::Rpc { .. }) => Err(err),
            _ if !response.is_success() => Err(Error::Network(format!(
                "{} returned HTTP status {}",
                method, response.status
            ))),
            decoded => decoded,
        }
    }

    /// Exchanges client credentials for an access token and keeps it.
    pub fn authenticate(&mut self, client_id: &str, client_secret: &str) -> Result<()> {
        let params = AuthParams {
            grant_type: "client_credentials",
            client_id,
            client_secret,
        };
        let AuthResult { access_token } = self.call("public/auth", params, false)?;
        self.token = Some(access_token);
        tracing::info!("Authenticated against {}", self.base_url);
        Ok(())
    }

    pub fn place_order(&self, instrument: &str, price: f64, amount: f64) -> Result<Value> {
        let params = BuyParams {
            instrument_name: instrument,
            amount,
            order_type: "limit",
            label: "bot",
            price,
        };
        self.call("private/buy", params, true)
    }

    pub fn cancel_order(&self, order_id: &str) -> Result<Value> {
        self.call("private/cancel", CancelParams { order_id }, true)
    }

    pub fn modify_order(&self, order_id: &str, amount: f64, price: f64) -> Result<Value> {
        let params = EditParams {
            order_id,
            amount,
            price,
        };
        self.call("private/edit", params, true)
    }

    pub fn get_orderbook(&self, instrument: &str, depth: u32) -> Result<OrderBook> {
        let params = OrderBookParams {
            instrument_name: instrument,
            depth,
        };
        self.call("public/get_order_book", params, false)
    }

    pub fn get_positions(&self, instrument: &str) -> Result<Vec<Position>> {
        let params = PositionsParams {
            instrument_name: instrument,
        };
        self.call("private/get_positions", params, true)
    }

    pub fn get_open_orders(&self) -> Result<Vec<OpenOrder>> {
        let params = OpenOrdersParams {
            kind: "future",
            order_type: "limit",
        };
        self.call("private/get_open_orders", params, true)
    }
}

impl<T> Exchange for DeribitClient<T>
where
    T: Transport,
{
    fn execute(&self, command: &Command) -> Result<Vec<String>> {
        let lines = match command {
            Command::PlaceOrder {
                instrument,
                price,
                amount,
            } => vec![self.place_order(instrument, *price, *amount)?.to_string()],
            Command::CancelOrder { order_id } => vec![self.cancel_order(order_id)?.to_string()],
            Command::ModifyOrder {
                order_id,
                price,
                amount,
            } => vec![self.modify_order(order_id, *amount, *price)?.to_string()],
            Command::GetOrderBook { instrument, depth } => {
                self.get_orderbook(instrument, *depth)?.ask_lines()
            }
            Command::GetPositions { instrument } => self
                .get_positions(instrument)?
                .iter()
                .map(Position::to_string)
                .collect(),
            Command::GetOpenOrders => {
                let orders = self.get_open_orders()?;
                if orders.is_empty() {
                    vec!["No open orders".to_string()]
                } else {
                    orders.iter().map(OpenOrder::to_string).collect()
                }
            }
        };
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::exchange::transport::RawResponse;

    #[derive(Debug, Clone)]
    struct SentRequest {
        url: String,
        body: Value,
        token: Option<String>,
    }

    /// Replies with a canned response and remembers every request.
    struct MockTransport {
        status: u16,
        reply: String,
        sent: Mutex<Vec<SentRequest>>,
    }

    impl MockTransport {
        fn replying(status: u16, reply: Value) -> Self {
            Self::raw(status, reply.to_string())
        }

        fn raw(status: u16, reply: impl Into<String>) -> Self {
            Self {
                status,
                reply: reply.into(),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn last(&self) -> SentRequest {
            self.sent.lock().last().cloned().expect("no request sent")
        }
    }

    impl Transport for MockTransport {
        fn post(&self, url: &str, body: Vec<u8>, bearer_token: Option<&str>) -> Result<RawResponse> {
            self.sent.lock().push(SentRequest {
                url: url.to_string(),
                body: serde_json::from_slice(&body)?,
                token: bearer_token.map(str::to_string),
            });
            Ok(RawResponse {
                status: self.status,
                body: self.reply.clone().into_bytes(),
            })
        }
    }

    fn ok(result: Value) -> Value {
        json!({ "jsonrpc": "2.0", "id": 0, "result": result })
    }

    fn client(transport: MockTransport) -> DeribitClient<MockTransport> {
        DeribitClient::new(transport, "https://test.deribit.com/api/v2/").with_token("tok")
    }

    #[test]
    fn test_authenticate_stores_token() {
        let transport = MockTransport::replying(200, ok(json!({ "access_token": "secret-token" })));
        let mut client = DeribitClient::new(transport, TESTNET_URL);

        client.authenticate("id", "secret").unwrap();
        assert_eq!(client.token(), Some("secret-token"));

        let sent = client.transport.last();
        assert_eq!(sent.url, "https://test.deribit.com/api/v2/public/auth");
        assert_eq!(sent.token, None);
        assert_eq!(
            sent.body["params"],
            json!({
                "grant_type": "client_credentials",
                "client_id": "id",
                "client_secret": "secret"
            })
        );
    }

    #[test]
    fn test_place_order_request() {
        let client = client(MockTransport::replying(200, ok(json!({ "order": { "order_id": "1" } }))));

        let lines = client
            .execute(&Command::PlaceOrder {
                instrument: "BTC-PERPETUAL".into(),
                price: 65000.0,
                amount: 10.0,
            })
            .unwrap();
        assert_eq!(lines, vec![r#"{"order":{"order_id":"1"}}"#.to_string()]);

        let sent = client.transport.last();
        assert_eq!(sent.url, "https://test.deribit.com/api/v2/private/buy");
        assert_eq!(sent.token.as_deref(), Some("tok"));
        assert_eq!(sent.body["method"], "private/buy");
        assert_eq!(
            sent.body["params"],
            json!({
                "instrument_name": "BTC-PERPETUAL",
                "amount": 10.0,
                "type": "limit",
                "label": "bot",
                "price": 65000.0
            })
        );
    }

    #[test]
    fn test_modify_order_is_authenticated() {
        let client = client(MockTransport::replying(200, ok(json!({}))));

        client
            .execute(&Command::ModifyOrder {
                order_id: "ETH-42".into(),
                price: 3000.5,
                amount: 2.0,
            })
            .unwrap();

        let sent = client.transport.last();
        assert_eq!(sent.token.as_deref(), Some("tok"));
        assert_eq!(
            sent.body["params"],
            json!({ "order_id": "ETH-42", "amount": 2.0, "price": 3000.5 })
        );
    }

    #[test]
    fn test_orderbook_lines() {
        let client = client(MockTransport::replying(
            200,
            ok(json!({ "asks": [[65000.5, 10.0], [65001.0, 2.5]], "bids": [] })),
        ));

        let lines = client
            .execute(&Command::GetOrderBook {
                instrument: "BTC-PERPETUAL".into(),
                depth: 2,
            })
            .unwrap();
        assert_eq!(
            lines,
            vec!["Price 65000.5 Amount 10", "Price 65001 Amount 2.5"]
        );

        let sent = client.transport.last();
        assert_eq!(sent.token, None);
        assert_eq!(sent.body["params"]["depth"], 2);
    }

    #[test]
    fn test_positions_lines() {
        let client = client(MockTransport::replying(
            200,
            ok(json!([{
                "instrument_name": "ETH-PERPETUAL",
                "size": 40.0,
                "average_price": 2512.25,
                "kind": "future"
            }])),
        ));

        let lines = client
            .execute(&Command::GetPositions {
                instrument: "ETH-PERPETUAL".into(),
            })
            .unwrap();
        assert_eq!(
            lines,
            vec!["Instrument: ETH-PERPETUAL Size: 40 Average Price: 2512.25"]
        );
    }

    #[test]
    fn test_open_orders_lines() {
        let empty = client(MockTransport::replying(200, ok(json!([]))));
        assert_eq!(
            empty.execute(&Command::GetOpenOrders).unwrap(),
            vec!["No open orders"]
        );

        let some = client(MockTransport::replying(
            200,
            ok(json!([{
                "order_id": "BTC-1",
                "price": 64000.0,
                "amount": 10.0,
                "instrument_name": "BTC-PERPETUAL"
            }])),
        ));
        assert_eq!(
            some.execute(&Command::GetOpenOrders).unwrap(),
            vec!["Order ID: BTC-1 Price: 64000 Amount: 10 Instrument BTC-PERPETUAL"]
        );
        assert_eq!(
            some.transport.last().body["params"],
            json!({ "kind": "future", "type": "limit" })
        );
    }

    #[test]
    fn test_error_shaped_response() {
        let client = client(MockTransport::replying(
            400,
            json!({ "jsonrpc": "2.0", "id": 0, "error": { "code": 13009, "message": "unauthorized" } }),
        ));

        let result = client.execute(&Command::CancelOrder {
            order_id: "x".into(),
        });
        assert!(matches!(result, Err(Error::Rpc { code: 13009, .. })));
    }

    #[test]
    fn test_http_failure_is_network_error() {
        let client = client(MockTransport::raw(502, "<html>Bad Gateway</html>"));
        let result = client.execute(&Command::GetOpenOrders);
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[test]
    fn test_unparseable_body_is_parse_failure() {
        let client = client(MockTransport::raw(200, "not json"));
        let err = client.execute(&Command::GetOpenOrders).unwrap_err();
        assert_eq!(err.as_label(), "parse_failure");
    }
}

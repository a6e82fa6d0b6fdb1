//! Live-state synchronizer for the shop-floor screens.
//!
//! Each screen owns one [`ScreenClient`]: it seeds local collections from a
//! REST snapshot, keeps them live by applying broadcast-hub frames from a
//! single WebSocket connection, and exposes fire-and-forget mutation calls.
//! There is deliberately no retry, reconnect, or de-duplication layer: frames
//! apply in arrival order, last writer wins per entity id, and a REST
//! response may race the broadcast for the same mutation. The backend is the
//! sole authority; everything here is a disposable, re-fetchable cache.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::domain::{
    Food, Order, OrderId, Ticket, TicketId, TicketStatus, Todo, TodoId, TodoStatus,
};
use shared::error::ApiError;
use shared::protocol::{
    BulkOrderRequest, ChatMessage, CreateTicketRequest, CreateTodoRequest, ServerEvent,
    UpdateTicketStatusRequest, UpdateTodoRequest, UpdateTodoStatusRequest,
};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

pub mod error;

pub use error::{ClientError, ClientResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notifications pushed to screens. Screens re-read the collection
/// snapshots when one arrives; the payload is informational.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Connected,
    Disconnected,
    Server(ServerEvent),
    Chat(ChatMessage),
}

#[derive(Default)]
struct ScreenState {
    foods: Vec<Food>,
    orders: Vec<Order>,
    tickets: Vec<Ticket>,
    todos: Vec<Todo>,
    messages: Vec<ChatMessage>,
}

struct WsSession {
    writer: Arc<Mutex<WsWriter>>,
    reader_task: JoinHandle<()>,
}

/// One screen's view of the backend: REST snapshot + mutations over HTTP,
/// live updates over a single WebSocket connection.
pub struct ScreenClient {
    http: reqwest::Client,
    base_url: String,
    ws_url: String,
    state: Mutex<ScreenState>,
    session: Mutex<Option<WsSession>>,
    connected: AtomicBool,
    events: broadcast::Sender<ClientEvent>,
}

impl ScreenClient {
    /// Validates the base URL and builds a disconnected client. `server_url`
    /// must be `http://` or `https://`; the streaming URL is derived by
    /// swapping the scheme to `ws://`/`wss://`.
    pub fn new(server_url: impl Into<String>) -> ClientResult<Arc<Self>> {
        let base_url = server_url.into().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url).map_err(|source| ClientError::InvalidUrl {
            url: base_url.clone(),
            source,
        })?;
        let ws_url = match parsed.scheme() {
            "http" => base_url.replacen("http://", "ws://", 1),
            "https" => base_url.replacen("https://", "wss://", 1),
            _ => return Err(ClientError::UnsupportedScheme(base_url)),
        };

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Arc::new(Self {
            http: reqwest::Client::new(),
            base_url,
            ws_url,
            state: Mutex::new(ScreenState::default()),
            session: Mutex::new(None),
            connected: AtomicBool::new(false),
            events,
        }))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    // ----- streaming connection -------------------------------------------

    /// Opens the WebSocket and spawns the reader task. A second call while
    /// the connection is up is a no-op.
    pub async fn connect(self: &Arc<Self>) -> ClientResult<()> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return Ok(());
        }

        let (stream, _) = connect_async(self.ws_url.as_str()).await?;
        let (writer, reader) = stream.split();

        self.connected.store(true, Ordering::SeqCst);
        let _ = self.events.send(ClientEvent::Connected);

        let reader_task = tokio::spawn(Arc::clone(self).read_frames(reader));
        *session = Some(WsSession {
            writer: Arc::new(Mutex::new(writer)),
            reader_task,
        });
        Ok(())
    }

    /// Tears the streaming connection down. Idempotent: the socket is closed
    /// and `Disconnected` is emitted at most once, no matter how often this
    /// is called or whether the peer already went away.
    pub async fn close(&self) {
        let session = self.session.lock().await.take();
        let Some(session) = session else {
            return;
        };

        {
            let mut writer = session.writer.lock().await;
            let _ = writer.send(Message::Close(None)).await;
            let _ = writer.close().await;
        }
        session.reader_task.abort();

        if self.connected.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(ClientEvent::Disconnected);
        }
    }

    async fn read_frames(self: Arc<Self>, mut reader: WsReader) {
        while let Some(frame) = reader.next().await {
            match frame {
                Ok(Message::Text(text)) => self.handle_frame(&text).await,
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(error) => {
                    warn!(%error, "websocket receive failed");
                    break;
                }
            }
        }
        if self.connected.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(ClientEvent::Disconnected);
        }
    }

    /// Routes one text frame. Frames that decode as neither an envelope nor
    /// a bare chat message are logged and dropped; the connection stays up.
    async fn handle_frame(&self, text: &str) {
        match serde_json::from_str::<ServerEvent>(text) {
            Ok(event) => {
                self.apply_event(&event).await;
                let _ = self.events.send(ClientEvent::Server(event));
            }
            Err(envelope_error) => match serde_json::from_str::<ChatMessage>(text) {
                Ok(message) => {
                    self.state.lock().await.messages.push(message.clone());
                    let _ = self.events.send(ClientEvent::Chat(message));
                }
                Err(_) => {
                    warn!(%envelope_error, frame = %text, "dropping malformed frame");
                }
            },
        }
    }

    /// The reducer: replace-all (`init`, `new_todo`, `update_todo`),
    /// append-one (`new_order`, `new_ticket`), update-by-id
    /// (`update_status`, unknown ids fall through silently).
    async fn apply_event(&self, event: &ServerEvent) {
        let mut state = self.state.lock().await;
        match event {
            ServerEvent::Init { orders, tickets } => {
                state.orders = orders.clone();
                state.tickets = tickets.clone();
            }
            ServerEvent::NewOrder { order } => state.orders.push(order.clone()),
            ServerEvent::NewTicket { ticket } => state.tickets.push(ticket.clone()),
            ServerEvent::UpdateStatus { ticket } => {
                for existing in &mut state.tickets {
                    if existing.id == ticket.id {
                        *existing = ticket.clone();
                    }
                }
            }
            ServerEvent::NewTodo { todos } | ServerEvent::UpdateTodo { todos } => {
                state.todos = todos.clone();
            }
        }
    }

    // ----- collection snapshots -------------------------------------------

    pub async fn foods(&self) -> Vec<Food> {
        self.state.lock().await.foods.clone()
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.state.lock().await.orders.clone()
    }

    pub async fn tickets(&self) -> Vec<Ticket> {
        self.state.lock().await.tickets.clone()
    }

    pub async fn todos(&self) -> Vec<Todo> {
        self.state.lock().await.todos.clone()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().await.messages.clone()
    }

    // ----- REST snapshots --------------------------------------------------

    /// Seeds the menu. On failure the list stays as it was (initially empty);
    /// there is no retry.
    pub async fn fetch_foods(&self) -> ClientResult<()> {
        match self.get_json::<Vec<Food>>("/foods", "fetch foods").await {
            Ok(foods) => {
                self.state.lock().await.foods = foods;
                Ok(())
            }
            Err(error) => {
                warn!(%error, "food snapshot failed");
                Err(error)
            }
        }
    }

    pub async fn refresh_orders(&self) -> ClientResult<()> {
        match self.get_json::<Vec<Order>>("/orders", "fetch orders").await {
            Ok(orders) => {
                self.state.lock().await.orders = orders;
                Ok(())
            }
            Err(error) => {
                warn!(%error, "order snapshot failed");
                Err(error)
            }
        }
    }

    pub async fn refresh_tickets(&self) -> ClientResult<()> {
        match self.get_json::<Vec<Ticket>>("/tickets", "fetch tickets").await {
            Ok(tickets) => {
                self.state.lock().await.tickets = tickets;
                Ok(())
            }
            Err(error) => {
                warn!(%error, "ticket snapshot failed");
                Err(error)
            }
        }
    }

    pub async fn refresh_todos(&self) -> ClientResult<()> {
        match self.get_json::<Vec<Todo>>("/todos", "fetch todos").await {
            Ok(todos) => {
                self.state.lock().await.todos = todos;
                Ok(())
            }
            Err(error) => {
                warn!(%error, "todo snapshot failed");
                Err(error)
            }
        }
    }

    // ----- POS actions ------------------------------------------------------

    /// Appends a pending order with a client-generated millisecond-timestamp
    /// id. The backend assigns real ids on bulk submission.
    pub async fn add_local_order(&self, food: &Food, qty: u32, table_no: &str) -> Order {
        let now = chrono::Utc::now();
        let order = Order {
            id: OrderId(now.timestamp_millis()),
            food_id: food.id,
            name: food.name.clone(),
            price: food.price,
            table_no: table_no.to_string(),
            qty,
            created_at: now,
        };
        self.state.lock().await.orders.push(order.clone());
        order
    }

    /// Removes the listed order with the given id. Returns whether anything
    /// was removed.
    pub async fn remove_order(&self, id: OrderId) -> bool {
        let mut state = self.state.lock().await;
        let before = state.orders.len();
        state.orders.retain(|order| order.id != id);
        state.orders.len() != before
    }

    /// Submits everything currently listed as one bulk order and clears the
    /// list on success. Returns the number of submitted lines; zero means
    /// there was nothing to send and no request was made.
    pub async fn submit_all_orders(&self, table_no: &str) -> ClientResult<usize> {
        let items = self.state.lock().await.orders.clone();
        if items.is_empty() {
            return Ok(0);
        }
        let count = items.len();
        let request = BulkOrderRequest {
            table_no: table_no.to_string(),
            items,
        };
        self.post_json("/orders/bulk", &request, "submit orders")
            .await?;
        self.state.lock().await.orders.clear();
        debug!(count, table_no, "bulk order submitted");
        Ok(count)
    }

    // ----- repair actions ---------------------------------------------------

    pub async fn create_ticket(
        &self,
        machine: &str,
        detail: &str,
        reporter: &str,
    ) -> ClientResult<()> {
        let request = CreateTicketRequest {
            machine: machine.to_string(),
            detail: detail.to_string(),
            reporter: reporter.to_string(),
        };
        self.post_json("/tickets", &request, "create ticket").await
    }

    pub async fn update_ticket_status(
        &self,
        id: TicketId,
        status: TicketStatus,
    ) -> ClientResult<()> {
        let request = UpdateTicketStatusRequest { status };
        self.put_json(
            &format!("/tickets/{id}/status"),
            &request,
            "update ticket status",
        )
        .await
    }

    // ----- todo actions -----------------------------------------------------

    pub async fn add_todo(&self, request: &CreateTodoRequest) -> ClientResult<()> {
        self.post_json("/todos", request, "create todo").await
    }

    pub async fn change_todo_status(&self, id: TodoId, status: TodoStatus) -> ClientResult<()> {
        let request = UpdateTodoStatusRequest { status };
        self.put_json(&format!("/todos/{id}/status"), &request, "update todo status")
            .await
    }

    pub async fn update_todo(&self, id: TodoId, request: &UpdateTodoRequest) -> ClientResult<()> {
        self.put_json(&format!("/todos/{id}"), request, "update todo")
            .await
    }

    pub async fn delete_todo(&self, id: TodoId) -> ClientResult<()> {
        let response = self
            .http
            .delete(format!("{}/todos/{id}", self.base_url))
            .send()
            .await?;
        Self::ensure_success(response, "delete todo").await?;
        Ok(())
    }

    // ----- chat -------------------------------------------------------------

    /// Writes one chat frame on the open socket. The hub relays it back to
    /// every subscriber, the sender included, so the local log is only
    /// appended on receipt.
    pub async fn send_chat(&self, message: &ChatMessage) -> ClientResult<()> {
        let session = self.session.lock().await;
        let Some(session) = session.as_ref() else {
            return Err(ClientError::NotConnected);
        };
        let frame = serde_json::to_string(message)?;
        session.writer.lock().await.send(Message::Text(frame)).await?;
        Ok(())
    }

    // ----- http plumbing ----------------------------------------------------

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        context: &'static str,
    ) -> ClientResult<T> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .send()
            .await?;
        let response = Self::ensure_success(response, context).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        context: &'static str,
    ) -> ClientResult<()> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        Self::ensure_success(response, context).await?;
        Ok(())
    }

    async fn put_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        context: &'static str,
    ) -> ClientResult<()> {
        let response = self
            .http
            .put(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        Self::ensure_success(response, context).await?;
        Ok(())
    }

    async fn ensure_success(
        response: reqwest::Response,
        context: &'static str,
    ) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = match response.text().await {
            Ok(body) => serde_json::from_str::<ApiError>(&body)
                .map(|error| format!(": {error}"))
                .unwrap_or_default(),
            Err(_) => String::new(),
        };
        Err(ClientError::Status {
            context,
            status,
            detail,
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

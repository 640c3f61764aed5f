use std::sync::{Arc, Mutex};

use agent_ui::{
    IdentityStore, MemoryIdentityStore, PlaygroundApiClient, PlaygroundApiConfig,
    PlaygroundState, Principal,
};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Answers one listing request, but only after `release` is notified.
struct HeldListingServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    request_seen: Arc<Notify>,
    release: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl HeldListingServer {
    async fn new(body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener
            .local_addr()
            .expect("resolved local listener address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let request_seen = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let handle = tokio::spawn({
            let requests = Arc::clone(&requests);
            let request_seen = Arc::clone(&request_seen);
            let release = Arc::clone(&release);
            async move {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let request = read_head(&mut socket).await;
                requests.lock().expect("request log lock").push(request);
                request_seen.notify_one();
                release.notified().await;

                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
            request_seen,
            release,
            handle,
        }
    }

    fn client(&self) -> PlaygroundApiClient {
        PlaygroundApiClient::new(PlaygroundApiConfig::default().with_base_url(self.base_url.clone()))
            .expect("client")
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log lock").clone()
    }

    fn shutdown(&self) {
        self.handle.abort();
    }
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let read = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(read) => read,
        };
        buffer.extend_from_slice(&chunk[..read]);
        if buffer.windows(4).any(|window| window == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

const LISTING: &str = r#"[{"session_id":"s-1","title":"first","user_id":"1"}]"#;

fn principal(user_id: u64) -> Principal {
    Principal::new(
        Some(format!("user{user_id}")),
        Some(user_id),
        Some(format!("tok{user_id}")),
    )
}

#[tokio::test]
async fn listing_is_stored_for_the_user_it_was_fetched_for() {
    let server = HeldListingServer::new(LISTING).await;
    let client = server.client();
    let store = Arc::new(MemoryIdentityStore::with_principal(principal(1)));
    let mut state = PlaygroundState::new(store);

    let (loaded, _) = tokio::join!(state.load_sessions(&client, "web_agent"), async {
        server.request_seen.notified().await;
        server.release.notify_one();
    });

    assert!(loaded.expect("listing loads"));
    let sessions = state.sessions().expect("listing stored");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, "s-1");
    assert!(server.requests()[0]
        .starts_with("GET /v1/playground/agents/web_agent/sessions?user_id=1 HTTP/1.1"));
    server.shutdown();
}

#[tokio::test]
async fn listing_arriving_after_a_user_switch_is_dropped() {
    let server = HeldListingServer::new(LISTING).await;
    let client = server.client();
    let store = Arc::new(MemoryIdentityStore::with_principal(principal(1)));
    let mut state = PlaygroundState::new(store.clone());

    let (loaded, _) = tokio::join!(state.load_sessions(&client, "web_agent"), async {
        server.request_seen.notified().await;
        store.set(&principal(2)).expect("memory store");
        server.release.notify_one();
    });

    assert!(!loaded.expect("request itself succeeds"));
    assert_eq!(state.sessions(), None);
    assert_eq!(state.user_id(), Some(2));
    server.shutdown();
}

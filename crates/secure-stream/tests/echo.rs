use secure_stream::{dial, echo, ChannelConfig, NonceStrategy, SecureListener};
use tokio::sync::oneshot;

async fn start_echo(config: ChannelConfig) -> (std::net::SocketAddr, oneshot::Sender<()>) {
    let listener = SecureListener::bind("127.0.0.1:0", config).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    tokio::spawn(echo::serve(listener, async move {
        let _ = stop_rx.await;
    }));

    (addr, stop_tx)
}

#[tokio::test]
async fn ping_is_echoed() {
    let (addr, _stop) = start_echo(ChannelConfig::default()).await;

    let client = dial(addr, &ChannelConfig::default()).await.unwrap();
    client.write_all(b"ping").await.unwrap();

    let mut buf = [0u8; 4];
    client.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"ping");

    client.close().await.unwrap();
}

#[tokio::test]
async fn concurrent_clients_are_independent() {
    let (addr, _stop) = start_echo(ChannelConfig::default()).await;

    let mut clients = Vec::new();
    for id in 0..8u8 {
        clients.push(tokio::spawn(async move {
            let client = dial(addr, &ChannelConfig::default()).await.unwrap();
            let message = vec![id; 50_000];
            let (reader, writer) = client.split();

            let sent = message.clone();
            let sender = tokio::spawn(async move {
                writer.write_all(&sent).await.unwrap();
                writer
            });

            let mut echoed = vec![0u8; message.len()];
            reader.read_exact(&mut echoed).await.unwrap();
            assert!(echoed == message, "client {}", id);

            sender.await.unwrap().shutdown().await.unwrap();
        }));
    }

    for client in clients {
        client.await.unwrap();
    }
}

#[tokio::test]
async fn nonce_strategies_interoperate() {
    let server_config = ChannelConfig {
        nonce_strategy: NonceStrategy::Random,
        ..Default::default()
    };
    let (addr, _stop) = start_echo(server_config).await;

    let client = dial(addr, &ChannelConfig::default()).await.unwrap();
    let payload: Vec<u8> = (0..100_000).map(|i| (i % 199) as u8).collect();
    let mut echoed = vec![0u8; payload.len()];
    let (sent, received) = tokio::join!(client.write_all(&payload), client.read_exact(&mut echoed));
    sent.unwrap();
    received.unwrap();
    assert!(echoed == payload);

    client.close().await.unwrap();
}

#[tokio::test]
async fn server_stops_accepting_after_shutdown() {
    let (addr, stop) = start_echo(ChannelConfig::default()).await;
    stop.send(()).unwrap();

    // Give the accept loop a moment to observe shutdown and drop the listener
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let config = ChannelConfig {
        handshake_timeout_ms: Some(500),
        ..Default::default()
    };
    assert!(dial(addr, &config).await.is_err());
}

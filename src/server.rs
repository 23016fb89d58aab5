use std::future::Future;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tracing::{debug, error, info, instrument};

use crate::codec::MessageCodec;
use crate::config::Config;
use crate::connection::Connection;
use crate::dispatcher::Dispatcher;
use crate::store::Store;
use crate::Error;

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let snapshot_file = config.snapshot_file();
    let snapshot = match &snapshot_file {
        Some(file) => {
            let snapshot = file.load().await.map_err(|e| {
                error!("Failed to load snapshot from {}: {}", file.path().display(), e);
                e
            })?;
            info!("Loaded {} keys from {}", snapshot.len(), file.path().display());
            snapshot
        }
        None => Vec::new(),
    };
    let store = Store::from_snapshot(snapshot, snapshot_file);

    let listener = TcpListener::bind((config.host, config.port)).await?;
    info!("Server listening on {}", listener.local_addr()?);

    serve_until(listener, store, config.max_frame_size, signal::ctrl_c()).await
}

/// Serves clients until `shutdown` completes or accepting fails, then writes the final
/// snapshot either way.
pub async fn serve_until(
    listener: TcpListener,
    store: Store,
    max_frame_size: usize,
    shutdown: impl Future,
) -> Result<(), Error> {
    let res = tokio::select! {
        res = serve(listener, store.clone(), max_frame_size) => res,
        _ = shutdown => {
            info!("Shutting down");
            Ok(())
        }
    };

    save_on_exit(&store, res).await
}

async fn save_on_exit(store: &Store, res: Result<(), Error>) -> Result<(), Error> {
    if let Err(e) = &res {
        error!("Server stopped accepting connections: {}", e);
    }

    if let Err(e) = store.save().await {
        error!("Failed to save snapshot on shutdown: {}", e);
    }

    res
}

/// Accepts connections until the listener fails, serving each one on its own task.
pub async fn serve(listener: TcpListener, store: Store, max_frame_size: usize) -> Result<(), Error> {
    let dispatcher = Dispatcher::new(store);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let dispatcher = dispatcher.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            let codec = MessageCodec::new(max_frame_size);
            if let Err(e) = handle_connection(socket, client_address, dispatcher, codec).await {
                error!("Connection failed: {}", e);
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip_all,
    fields(connection_id, client_address = %client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    dispatcher: Dispatcher,
    codec: MessageCodec,
) -> Result<(), Error> {
    let mut conn = Connection::with_codec(stream, codec);

    tracing::Span::current().record("connection_id", conn.id.to_string());

    while let Some(message) = conn.read_message().await? {
        debug!("Received {} bytes from client", message.len());
        let reply = dispatcher.handle(&message);
        debug!("Sending {} bytes to client", reply.len());

        conn.write_reply(reply).await?;
    }

    info!("Connection closed");
    Ok(())
}

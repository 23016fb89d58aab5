use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::codec::MessageCodec;
use crate::Error;

pub struct Connection {
    pub id: Uuid,
    // Data is read from the socket into the read buffer. When a message is complete, the
    // corresponding data is removed from the buffer.
    framed: Framed<TcpStream, MessageCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Self::with_codec(stream, MessageCodec::default())
    }

    pub fn with_codec(stream: TcpStream, codec: MessageCodec) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            // Allocate the buffer with 4kb of capacity.
            framed: Framed::with_capacity(stream, codec, 4096),
        }
    }

    /// Waits for the next complete message. `None` means the client closed the connection.
    pub async fn read_message(&mut self) -> Result<Option<BytesMut>, Error> {
        self.framed.next().await.transpose()
    }

    pub async fn write_reply(&mut self, reply: Vec<u8>) -> Result<(), Error> {
        self.framed.send(reply).await
    }
}

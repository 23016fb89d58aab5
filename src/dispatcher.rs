use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

use crate::commands::executable::Executable;
use crate::commands::{Command, CommandError};
use crate::frame::{self, Frame};
use crate::request::decode_command;
use crate::store::Store;
use crate::Error;

/// Turns each inbound message into exactly one encoded reply. Nothing is kept between messages
/// but the store itself.
#[derive(Clone)]
pub struct Dispatcher {
    store: Store,
}

impl Dispatcher {
    pub fn new(store: Store) -> Dispatcher {
        Dispatcher { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn handle(&self, message: &[u8]) -> Vec<u8> {
        let request = match decode_command(message) {
            Ok(request) => request,
            Err(err) => {
                warn!("Rejecting message: {}", err);
                return frame::encode(&Frame::Simple(err.to_string()), Some("ERR"));
            }
        };

        debug!("Executing {} with {} arguments", request.name, request.args.len());

        self.execute(|store| Command::try_from(request)?.exec(store))
    }

    /// Runs `handler` against the store and encodes its outcome. A panic becomes an ERR reply
    /// like any other failure.
    fn execute<F>(&self, handler: F) -> Vec<u8>
    where
        F: FnOnce(Store) -> Result<Frame, Error>,
    {
        let store = self.store.clone();
        let result = panic::catch_unwind(AssertUnwindSafe(|| handler(store)));

        match result {
            Ok(Ok(frame)) => frame::encode(&frame, None),
            Ok(Err(err)) => {
                let tag = err
                    .downcast_ref::<CommandError>()
                    .map_or("ERR", CommandError::tag);
                frame::encode(&Frame::Simple(err.to_string()), Some(tag))
            }
            Err(panic) => {
                let msg = panic_message(panic);
                error!("Command panicked: {}", msg);
                frame::encode(&Frame::Simple(msg), Some("ERR"))
            }
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "command failed".to_string()
    }
}

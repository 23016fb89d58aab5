use respkv::config::Config;
use respkv::{server, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_args();

    server::run(config).await
}

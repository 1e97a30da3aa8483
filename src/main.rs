use luxpower_poller::options::Options;
use luxpower_poller::prelude::*;

#[tokio::main]
async fn main() {
    let options = Options::new();

    if options.list_fields {
        luxpower_poller::print_fields();
        return;
    }

    if let Err(err) = luxpower_poller::app(options).await {
        // config errors happen before the configured logger is installed
        luxpower_poller::init_logging("info");

        match err.downcast_ref::<Error>() {
            Some(Error::Config(_)) => {
                error!("Failed to load config: {}", err);
                std::process::exit(255);
            }
            _ => {
                error!("Application error: {:?}", err);
                std::process::exit(1);
            }
        }
    }
}

//! murmur: REST backend for a small social network.
//!
//! Serves the JSON API over HTTP and persists users, posts, likes and
//! follows in SQLite. See `murmur --help` for configuration.

#[tokio::main]
async fn main() {
    if let Err(e) = murmur::web::run().await {
        eprintln!("murmur: {e}");
        std::process::exit(1);
    }
}

//! llama-chains command-line entry point.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    llama_chains::cli::run().await
}

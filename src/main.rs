use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    ingate_server::run().await
}

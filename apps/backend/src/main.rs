#[tokio::main]
async fn main() -> anyhow::Result<()> {
    learntocode_backend::run().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = testevy_attempt::run().await {
        eprintln!("testevy-attempt fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

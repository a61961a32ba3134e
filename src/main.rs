use rask_log_sink::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::main().await
}

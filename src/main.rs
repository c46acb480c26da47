#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ivr_navigator_lib::run().await
}

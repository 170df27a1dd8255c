use platform::{Platform, PlatformOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let platform = Platform::bootstrap(PlatformOptions::default()).await?;
    platform.serve().await
}

/// Entry point for the Creo Discovery container discovery agent.
///
/// Discovers the containers running on the host, matches them against the
/// configured collection filters and reports matched and removed containers.
///
/// # Errors
///
/// Returns an error if the configuration in the environment is malformed.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=info INCLUDE_LABELS="app=web" ROOTFS_MOUNT_PATH=/rootfs cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    creo_discovery::run().await?;
    Ok(())
}

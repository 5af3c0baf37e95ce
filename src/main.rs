#[tokio::main]
async fn main() {
    if let Err(e) = precision_desktop_lib::run().await {
        tracing::error!(error = %e, "precision-desktop exited with error");
        std::process::exit(1);
    }
}

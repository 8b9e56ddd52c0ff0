use anyhow::Result;
use helpdesk_common::version::helpdesk_version;
use helpdesk_core::Services;
use helpdesk_http::HttpServer;
#[cfg(target_os = "linux")]
use sd_notify::NotifyState;
use tracing::*;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli) -> Result<()> {
    let version = helpdesk_version();
    info!(%version, "Helpdesk");

    let config = load_config(&cli.config, true)?;
    let services = Services::new(config.clone()).await?;

    let address = *config.store.http.listen;
    let server = HttpServer::new(&services).run(address);

    if console::user_attended() {
        info!("--------------------------------------------");
        info!("Helpdesk is now running.");
        info!("Accepting HTTP connections on http://{}", config.store.http.listen);
        info!("API docs at http://{}/api/docs", config.store.http.listen);
        info!("--------------------------------------------");
    }

    #[cfg(target_os = "linux")]
    if let Ok(true) = sd_notify::booted() {
        use std::time::Duration;
        tokio::spawn(async {
            if let Err(error) = async {
                sd_notify::notify(false, &[NotifyState::Ready])?;
                loop {
                    sd_notify::notify(false, &[NotifyState::Watchdog])?;
                    tokio::time::sleep(Duration::from_secs(15)).await;
                }
                #[allow(unreachable_code)]
                Ok::<(), anyhow::Error>(())
            }
            .await
            {
                error!(?error, "Failed to communicate with systemd");
            }
        });
    }

    drop(config);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt");
        }
        result = server => {
            if let Err(error) = result {
                error!(?error, "HTTP server error");
                return Err(error);
            }
        }
    }

    info!("Exiting");
    Ok(())
}

//! Docker container management for MySQL testing

use crate::SourceOpts;
use anyhow::{Context, Result};
use mysql_async::prelude::*;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const ROOT_PASSWORD: &str = "testpass";
const DATABASE: &str = "testdb";

/// A throwaway MySQL 8 server in Docker
pub struct MySQLContainer {
    pub container_name: String,
    pub host_port: u16,
    pub image_name: String,
}

impl MySQLContainer {
    pub fn new(container_name: &str, host_port: u16) -> Self {
        Self {
            container_name: container_name.to_string(),
            host_port,
            image_name: "mysql:8.0".to_string(),
        }
    }

    /// Options pointing at the container's test database.
    pub fn source_opts(&self) -> SourceOpts {
        SourceOpts {
            host: "127.0.0.1".to_string(),
            port: self.host_port,
            username: "root".to_string(),
            password: ROOT_PASSWORD.to_string(),
            database: DATABASE.to_string(),
        }
    }

    fn remove_existing(&self) {
        for action in ["stop", "rm"] {
            let _ = Command::new("docker")
                .args([action, &self.container_name])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }

    pub fn start(&self) -> Result<()> {
        info!("Starting MySQL container: {}", self.container_name);
        self.remove_existing();

        let output = Command::new("docker")
            .args([
                "run",
                "--name",
                &self.container_name,
                "-e",
                &format!("MYSQL_ROOT_PASSWORD={ROOT_PASSWORD}"),
                "-e",
                &format!("MYSQL_DATABASE={DATABASE}"),
                "-p",
                &format!("{}:3306", self.host_port),
                "-d",
                &self.image_name,
            ])
            .output()
            .context("Failed to start Docker container")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to start container: {stderr}");
        }

        info!(
            "Started container: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    /// Poll until the server accepts connections or `timeout_secs` elapse.
    pub async fn wait_until_ready(&self, timeout_secs: u64) -> Result<()> {
        info!("Waiting for MySQL to be ready...");

        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);

        while start.elapsed() < timeout {
            match self.connect().await {
                Ok(conn) => {
                    let _ = conn.disconnect().await;
                    info!("MySQL is ready!");
                    return Ok(());
                }
                Err(e) => {
                    debug!("Connection attempt failed: {}", e);
                    tokio::time::sleep(Duration::from_millis(1000)).await;
                }
            }
        }

        anyhow::bail!("MySQL did not become ready within {timeout_secs} seconds")
    }

    /// A raw connection for seeding fixtures.
    pub async fn connect(&self) -> Result<mysql_async::Conn> {
        let mut conn = mysql_async::Conn::new(self.source_opts().to_mysql_opts())
            .await
            .context("Failed to connect")?;
        conn.query_drop("SELECT 1")
            .await
            .context("Failed to execute test query")?;
        Ok(conn)
    }

    pub fn stop(&self) -> Result<()> {
        info!("Stopping container: {}", self.container_name);

        for action in ["stop", "rm"] {
            let output = Command::new("docker")
                .args([action, &self.container_name])
                .output()
                .with_context(|| format!("Failed to {action} container"))?;
            if !output.status.success() {
                debug!(
                    "docker {} failed (container may not exist): {}",
                    action,
                    String::from_utf8_lossy(&output.stderr)
                );
            }
        }

        info!("Container stopped and removed");
        Ok(())
    }
}

impl Drop for MySQLContainer {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = self.stop();
    }
}

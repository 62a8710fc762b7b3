//! MongoDB database wrapper.

use anyhow::Context;
use mongodb::bson::doc;
use mongodb::{Client, Collection, options::ClientOptions};
use tracing::info;

/// Database wrapper for MongoDB operations.
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    db: mongodb::Database,
}

impl Database {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// # Errors
    /// Returns error if the URI is invalid or the server does not answer a ping.
    pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .context("Invalid MONGODB_URI")?;
        options.app_name = Some("depotline".to_string());
        let client = Client::with_options(options)?;

        let database = Self {
            db: client.database(db_name),
            client,
        };
        database.ping().await.context("MongoDB did not answer ping")?;

        info!("Successfully connected to MongoDB database '{}'", db_name);
        Ok(database)
    }

    /// Round-trip to the server; used at startup and by the health check.
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    /// Get a typed collection from the database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}

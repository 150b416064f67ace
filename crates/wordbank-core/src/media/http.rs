//! HTTP implementation of [`RemoteFetch`].

use async_trait::async_trait;
use tracing::debug;

use super::{MediaResult, RemoteFetch};

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("wordbank/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteFetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> MediaResult<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(url = %url, bytes = bytes.len(), "fetched remote media");
        Ok(bytes.to_vec())
    }
}

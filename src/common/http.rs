use std::time::Duration;

use reqwest::{Client, Error};

const USER_AGENT: &str = concat!("subrewind/", env!("CARGO_PKG_VERSION"));

pub struct HttpClient;

impl HttpClient {
  pub fn user_agent() -> String {
    USER_AGENT.to_string()
  }

  pub fn new(timeout_secs: u64) -> Result<Client, Error> {
    Client::builder()
      .user_agent(Self::user_agent())
      .timeout(Duration::from_secs(timeout_secs))
      .build()
  }
}

use clap::Parser;

use crate::{catalog::SessionContext, utils::version};

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
  #[arg(short, long, value_name = "FLOAT", help = "Tick rate, i.e. number of ticks per second", default_value_t = 4.0)]
  pub tick_rate: f64,

  #[arg(short, long, value_name = "FLOAT", help = "Frame rate, i.e. number of frames per second", default_value_t = 24.0)]
  pub frame_rate: f64,

  #[arg(long, value_name = "URL", help = "Catalog service base URL")]
  pub catalog_url: Option<String>,

  #[arg(long, value_name = "URL", help = "Query service base URL")]
  pub query_url: Option<String>,

  #[arg(short, long, value_name = "NAME", help = "Account the session is scoped to")]
  pub account: Option<String>,

  #[arg(short, long, value_name = "NAME", help = "Bucket the session is scoped to")]
  pub bucket: Option<String>,

  #[arg(long, value_name = "TOKEN", help = "Bearer token for both services")]
  pub token: Option<String>,

  #[arg(short, long, value_name = "SQL", help = "Execute this query once the catalog is loaded")]
  pub execute: Option<String>,
}

impl Cli {
  /// Command-line values override whatever the config file provided.
  pub fn apply_to(&self, session: &mut SessionContext) {
    if let Some(url) = &self.catalog_url {
      session.catalog_endpoint = url.clone();
    }
    if let Some(url) = &self.query_url {
      session.query_endpoint = url.clone();
    }
    if let Some(account) = &self.account {
      session.account = account.clone();
    }
    if let Some(bucket) = &self.bucket {
      session.bucket = bucket.clone();
    }
    if let Some(token) = &self.token {
      session.token = Some(token.clone());
    }
  }
}

pub mod app_config;
pub mod gateway;
pub mod lookup;
pub mod token;

pub use app_config::{Config, ConfigError, LookupConfig, ServerConfig, UpstreamConfig};
pub use gateway::UpstreamGateway;
pub use lookup::{LocationLookup, LookupSnapshot, LookupState};
pub use token::{AccessToken, ClientCredentials, Clock, CredentialExchange, SystemClock, TokenCache};

use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use domain_tenant_store::TenantStoreConfig;

pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub store: TenantStoreConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let store = TenantStoreConfig::from_env()?; // Uses defaults: in-memory backend, 384 dims

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            store,
        })
    }
}

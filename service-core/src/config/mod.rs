use serde::Deserialize;

/// Server settings shared by every service in the workspace. Each service
/// embeds this in its own config struct and fills it from its environment.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

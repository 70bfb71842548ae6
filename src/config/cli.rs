use crate::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECONDS};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "restaurant-client")]
#[command(about = "Browse the menu, place an order and follow it live")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS, help = "Request timeout in seconds")]
    pub timeout: u64,

    /// TOML file whose [client] section overrides --base-url and --timeout
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the menu
    Menu {
        #[arg(long)]
        category: Option<String>,
    },
    /// Build a cart from item ids and place the order
    Order {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        /// Menu item id; repeat to add more than one unit
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        /// Follow the order's events once it is placed
        #[arg(long)]
        track: bool,
    },
    /// Show an order as the server sees it
    Status { order_id: String },
    /// Capture payment with the token returned at checkout
    Pay {
        order_id: String,
        #[arg(long)]
        token: String,
    },
    /// Send the delivery location and print the ETA
    Locate {
        order_id: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Follow an order's status events until the stream closes
    Track { order_id: String },
}

impl CliConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            request_timeout_seconds: self.timeout,
        }
    }
}

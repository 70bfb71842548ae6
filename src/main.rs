use clap::Parser;
use restaurant_client::domain::model::{OrderEvent, OrderStatus};
use restaurant_client::utils::error::ErrorCategory;
use restaurant_client::utils::{logger, validation::Validate};
use restaurant_client::{
    format_amount, Cart, Checkout, CliConfig, ClientConfig, Command, HttpOrderApi, OrderError,
    OrderTracker, TomlConfig, TrackerUpdate, TrackingSession,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let file_config = match cli.config.as_deref().map(TomlConfig::from_file).transpose() {
        Ok(file_config) => file_config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(exit_code(&e));
        }
    };

    let verbose = cli.verbose || file_config.as_ref().is_some_and(TomlConfig::verbose);
    if file_config.as_ref().is_some_and(TomlConfig::json_logs) {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    let config = file_config
        .as_ref()
        .map(TomlConfig::client_config)
        .unwrap_or_else(|| cli.client_config());
    tracing::debug!("Client config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(&e));
    }

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!("❌ {} (Category: {:?})", e, e.category());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

fn exit_code(e: &OrderError) -> i32 {
    match e.category() {
        ErrorCategory::Lookup | ErrorCategory::Input => 2,
        ErrorCategory::Server => 1,
        ErrorCategory::Network => 3,
        ErrorCategory::Internal => 4,
    }
}

async fn run(command: Command, config: &ClientConfig) -> restaurant_client::Result<()> {
    let api = HttpOrderApi::from_config(config)?;
    let checkout = Checkout::new(api.clone());

    match command {
        Command::Menu { category } => {
            let menu = checkout.fetch_menu(category.as_deref()).await?;
            if menu.is_empty() {
                println!("The menu is empty.");
            }
            for item in menu {
                println!("[{}] {} ₹{}", item.id, item.name, format_amount(item.price));
                if !item.description.is_empty() {
                    println!("      {}", item.description);
                }
            }
        }
        Command::Order {
            name,
            phone,
            items,
            track,
        } => {
            let menu = checkout.fetch_menu(None).await?;
            let mut cart = Cart::new();
            for id in items {
                if let Err(e) = cart.add_item(&menu, id.as_str()) {
                    tracing::warn!("Skipping {}: {}", id, e);
                }
            }
            print_cart(&cart);

            let receipt = checkout.submit_order(&name, &phone, &cart).await?;
            cart.clear();
            println!(
                "Order placed: {} (status: {}). PaymentToken: {}",
                receipt.order_id, receipt.status, receipt.payment_token
            );

            if track {
                let mut tracker = OrderTracker::new(Arc::new(api));
                let session = tracker.start_tracking(&receipt.order_id)?;
                follow(session).await;
            }
        }
        Command::Status { order_id } => {
            let order = checkout.fetch_order(&order_id).await?;
            let settled = order
                .status
                .parse::<OrderStatus>()
                .is_ok_and(|status| status.is_terminal());
            println!(
                "Order {} for {} ({}{})",
                order.id,
                order.customer_name,
                order.status,
                if settled { ", final" } else { "" }
            );
            for item in &order.items {
                println!(
                    "  {} x {}  ₹{}",
                    item.name,
                    item.quantity,
                    format_amount(item.unit_price * rust_decimal::Decimal::from(item.quantity))
                );
            }
            println!("Total: ₹{}", format_amount(order.total_amount));
            if let Some(eta) = order.eta_seconds {
                println!("ETA: {} min", eta.div_ceil(60));
            }
        }
        Command::Pay { order_id, token } => {
            let receipt = checkout.pay_order(&order_id, &token).await?;
            println!("Payment status: {}", receipt.status);
        }
        Command::Locate { order_id, lat, lng } => {
            let eta = checkout.set_delivery_location(&order_id, lat, lng).await?;
            println!("Estimated delivery in {} min", eta.eta_seconds.div_ceil(60));
        }
        Command::Track { order_id } => {
            let mut tracker = OrderTracker::new(Arc::new(api));
            let session = tracker.start_tracking(&order_id)?;
            follow(session).await;
        }
    }

    Ok(())
}

fn print_cart(cart: &Cart) {
    for line in cart.snapshot() {
        println!("{} x {}  ₹{}", line.name, line.quantity, format_amount(line.line_total()));
    }
    println!("Total: ₹{}", format_amount(cart.total()));
}

async fn follow(session: &mut TrackingSession) {
    println!("Connecting...");
    loop {
        tokio::select! {
            update = session.next_update() => match update {
                Some(update) => render(&update),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                session.stop();
                println!("Stopped tracking {}.", session.order_id());
                break;
            }
        }
    }
}

fn render(update: &TrackerUpdate) {
    match update {
        TrackerUpdate::Opened => println!("Connected."),
        TrackerUpdate::Snapshot(status) => println!("Current status: {}", status),
        TrackerUpdate::Event(OrderEvent::Status(status)) => println!("{}", status.display_line()),
        TrackerUpdate::Event(OrderEvent::Notification(message)) => println!("🔔 {}", message),
        TrackerUpdate::Malformed(_) => eprintln!("⚠️  Received an unreadable status update"),
        TrackerUpdate::Ignored(_) => {}
        TrackerUpdate::Closed(_) => println!("{}", restaurant_client::core::tracker::CONNECTION_CLOSED),
    }
}

//! FreshCart CLI - browse the catalog and manage a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the password may also come from FRESHCART_PASSWORD)
//! freshcart login -e shopper@example.com -p secret123
//!
//! # Browse
//! freshcart products --search shawl
//! freshcart product 6428ebc6dc1175abc65ca0b9
//!
//! # Cart and checkout
//! freshcart cart add 6428ebc6dc1175abc65ca0b9
//! freshcart checkout --details "12 Nile St" --phone 01012345678 --city Cairo --payment cod
//!
//! # Open a storefront path
//! freshcart open /allorders
//! ```
//!
//! Notifications are written to stderr; page output goes to stdout.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use freshcart_storefront::Storefront;
use freshcart_storefront::config::{SentryConfig, StorefrontConfig};
use freshcart_storefront::error::AppError;
use freshcart_storefront::notify::{Level, Notification};
use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::broadcast::Receiver;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "freshcart")]
#[command(author, version, about = "FreshCart storefront from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "FRESHCART_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        /// Egyptian mobile number
        #[arg(long)]
        phone: String,

        #[arg(short, long, env = "FRESHCART_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password confirmation; defaults to the password
        #[arg(long)]
        re_password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Recover a forgotten password
    Password {
        #[command(subcommand)]
        action: PasswordAction,
    },
    /// List products
    Products {
        /// Only titles containing this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product with related products
    Product { id: String },
    /// List categories
    Categories,
    /// List the subcategories of a category
    Subcategories { category_id: String },
    /// List brands
    Brands,
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Show or change the wishlist
    Wishlist {
        #[command(subcommand)]
        action: Option<WishlistAction>,
    },
    /// Place an order for the current cart
    Checkout {
        /// Cart to check out, as shown in `/checkout/<cart-id>`
        #[arg(long)]
        cart: Option<String>,

        /// Street address
        #[arg(long)]
        details: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        city: String,

        /// `cod` (cash on delivery) or `online`
        #[arg(long, default_value = "cod")]
        payment: String,
    },
    /// List past orders
    Orders,
    /// Open a storefront path such as `/cart` or `/productdetails/Electronics/<id>`
    Open { path: String },
}

#[derive(Subcommand)]
enum PasswordAction {
    /// Email a reset code
    Forgot {
        #[arg(short, long)]
        email: String,
    },
    /// Check the emailed reset code
    Verify { code: String },
    /// Set a new password
    Reset {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "FRESHCART_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    Show,
    Add { product_id: String },
    Remove { product_id: String },
    Update { product_id: String, count: u32 },
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    Show,
    Add { product_id: String },
    Remove { product_id: String },
    /// Add if absent, remove if present
    Toggle { product_id: String },
}

fn init_sentry(config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.environment.clone().map(std::borrow::Cow::Owned),
            sample_rate: config.sample_rate,
            traces_sample_rate: config.traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            report_failure(&AppError::from(e), &[]);
            std::process::exit(2);
        }
    };

    // Must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config.sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "freshcart_storefront=warn,freshcart_cli=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let storefront = match Storefront::new(config) {
        Ok(storefront) => storefront,
        Err(e) => {
            report_failure(&e.report(), &[]);
            std::process::exit(2);
        }
    };

    let mut notifications = storefront.notifier().subscribe();
    storefront.start().await;

    let result = run(cli.command, &storefront).await;
    let shown = drain(&mut notifications);

    let code = match result {
        Ok(output) => {
            print_output(&output);
            0
        }
        Err(e) => {
            report_failure(&e, &shown);
            1
        }
    };

    // Flush pending Sentry events before exiting
    drop(sentry_guard);
    std::process::exit(code);
}

async fn run(command: Commands, storefront: &Storefront) -> Result<String, AppError> {
    use commands::{account, cart, catalog, checkout, navigate, orders, wishlist};

    match command {
        Commands::Login { email, password } => account::login(storefront, email, password).await,
        Commands::Signup {
            name,
            email,
            phone,
            password,
            re_password,
        } => {
            let re_password = re_password.unwrap_or_else(|| password.clone());
            account::signup(storefront, name, email, phone, password, re_password).await
        }
        Commands::Logout => account::logout(storefront).await,
        Commands::Whoami => Ok(account::whoami(storefront)),
        Commands::Password { action } => match action {
            PasswordAction::Forgot { email } => account::forgot_password(storefront, email).await,
            PasswordAction::Verify { code } => account::verify_reset_code(storefront, code).await,
            PasswordAction::Reset {
                email,
                new_password,
            } => account::reset_password(storefront, email, new_password).await,
        },
        Commands::Products { search } => catalog::products(storefront, search.as_deref()).await,
        Commands::Product { id } => catalog::product(storefront, &id).await,
        Commands::Categories => catalog::categories(storefront).await,
        Commands::Subcategories { category_id } => {
            catalog::subcategories(storefront, &category_id).await
        }
        Commands::Brands => catalog::brands(storefront).await,
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => cart::show(storefront),
            CartAction::Add { product_id } => cart::add(storefront, &product_id).await,
            CartAction::Remove { product_id } => cart::remove(storefront, &product_id).await,
            CartAction::Update { product_id, count } => {
                cart::update(storefront, &product_id, count).await
            }
            CartAction::Clear => cart::clear(storefront).await,
        },
        Commands::Wishlist { action } => match action.unwrap_or(WishlistAction::Show) {
            WishlistAction::Show => wishlist::show(storefront),
            WishlistAction::Add { product_id } => wishlist::add(storefront, &product_id).await,
            WishlistAction::Remove { product_id } => {
                wishlist::remove(storefront, &product_id).await
            }
            WishlistAction::Toggle { product_id } => {
                wishlist::toggle(storefront, &product_id).await
            }
        },
        Commands::Checkout {
            cart: cart_id,
            details,
            phone,
            city,
            payment,
        } => checkout::place_order(storefront, cart_id, details, phone, city, payment).await,
        Commands::Orders => orders::list(storefront).await,
        Commands::Open { path } => navigate::open(storefront, &path).await,
    }
}

/// Print every notification published so far and return them.
fn drain(notifications: &mut Receiver<Notification>) -> Vec<Notification> {
    let mut shown = Vec::new();
    while let Ok(notification) = notifications.try_recv() {
        print_notification(&notification);
        shown.push(notification);
    }
    shown
}

#[allow(clippy::print_stdout)]
fn print_output(output: &str) {
    if !output.is_empty() {
        println!("{output}");
    }
}

#[allow(clippy::print_stderr)]
fn print_notification(notification: &Notification) {
    eprintln!("[{}] {}", notification.level, notification.message);
}

/// Show the failure unless a notification already said the same thing.
#[allow(clippy::print_stderr)]
fn report_failure(err: &AppError, shown: &[Notification]) {
    let message = err.user_message();
    let already_shown = shown
        .iter()
        .any(|n| n.level == Level::Error && n.message == message);
    if !already_shown {
        eprintln!("[{}] {message}", Level::Error);
    }
    tracing::debug!(error = %err, "Command failed");
}

//! Command-line front end for the BSS client library. Exercises the same
//! workflows the mobile app runs: login, QR station authentication and
//! order purchase with settlement watching.

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use bss_client::api::{CreateOrderRequest, CreateVehicleRequest, RegisterRequest};
use bss_client::utils::storage::FileStorage;
use bss_client::workflows::auth::{sign_in, LoginDestination};
use bss_client::workflows::payment::{purchase, PaymentOutcome};
use bss_client::workflows::scan::{ScanController, ScanOutcome};
use bss_client::{ApiClient, Config, SessionStore};

#[derive(Parser)]
#[command(name = "bss", about = "BSS battery-swap client", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session.
    Login { email: String, password: String },
    /// Create an account.
    Register {
        name: String,
        email: String,
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Show the current profile.
    Me,
    /// Drop the stored session.
    Logout,
    /// Authenticate a scanned QR payload against a station.
    Scan {
        /// Raw QR payload or deep link.
        code: String,
        /// PIN to submit if the station raises a 2FA challenge.
        #[arg(long)]
        pin: Option<String>,
    },
    /// End a station session.
    EndSession {
        id: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// List subscription packages.
    Packages,
    /// List my subscriptions.
    Subscriptions,
    /// Show my swap credit balance.
    Credits,
    /// Show single-swap price tiers.
    Prices,
    /// Buy swaps and watch the order until it settles.
    Buy {
        /// Number of single swaps to buy.
        #[arg(long, conflicts_with = "package")]
        quantity: Option<u32>,
        /// Subscription package id to buy instead.
        #[arg(long)]
        package: Option<String>,
    },
    /// Show order history.
    History {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 20)]
        per_page: i64,
    },
    /// List my vehicles.
    Vehicles,
    /// Register a vehicle.
    AddVehicle {
        plate: String,
        model: String,
        #[arg(long)]
        battery: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bss=info,bss_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    let storage = FileStorage::new(&config.storage_path)
        .with_context(|| format!("opening session store at {}", config.storage_path.display()))?;
    let session = Arc::new(SessionStore::new(Arc::new(storage)));
    if let Err(err) = session.hydrate() {
        tracing::warn!(%err, "could not restore the saved session");
    }
    let api = Arc::new(ApiClient::new(config, session));

    match cli.command {
        Command::Login { email, password } => {
            let (user, destination) = sign_in(&api, &email, &password).await?;
            print_json(&user)?;
            if destination == LoginDestination::VehicleSetup {
                println!("No vehicle on file yet; run `bss add-vehicle` to finish setup.");
            }
        }
        Command::Register {
            name,
            email,
            password,
            phone,
        } => {
            let auth = api
                .register(RegisterRequest {
                    name,
                    email,
                    password,
                    phone,
                })
                .await?;
            print_json(&auth.user)?;
        }
        Command::Me => {
            let user = api.get_me().await?;
            print_json(&user)?;
        }
        Command::Logout => {
            api.logout()?;
            println!("Logged out.");
        }
        Command::Scan { code, pin } => {
            let controller = ScanController::new(Arc::clone(&api));
            let mut outcome = controller.handle_scan(&code).await;
            if let (ScanOutcome::PinRequired(_), Some(pin)) = (&outcome, pin.as_deref()) {
                outcome = controller.verify_pin(pin).await;
            }
            report_scan(outcome)?;
        }
        Command::EndSession { id, token } => {
            api.end_station_session(&id, token.as_deref()).await?;
            println!("Session {id} ended.");
        }
        Command::Packages => print_json(&api.list_packages().await?)?,
        Command::Subscriptions => print_json(&api.my_subscriptions().await?)?,
        Command::Credits => print_json(&api.my_swap_credits().await?)?,
        Command::Prices => print_json(&api.single_swap_prices().await?)?,
        Command::Buy { quantity, package } => {
            let request = match (quantity, package) {
                (Some(quantity), None) => CreateOrderRequest::single(quantity),
                (None, Some(package)) => CreateOrderRequest::package(package),
                _ => bail!("pass exactly one of --quantity or --package"),
            };
            let (order, handle) = purchase(&api, request).await?;
            print_json(&order)?;
            println!("Waiting for payment to settle (ctrl-c to stop watching)...");
            match handle.wait().await {
                Some(PaymentOutcome::Paid(order)) => {
                    println!("Order {} paid.", order.id);
                }
                Some(PaymentOutcome::Closed(order)) => {
                    println!("Order {} closed without payment ({:?}).", order.id, order.status);
                }
                Some(PaymentOutcome::TimedOut(order)) => {
                    println!(
                        "Order {} is still pending; check `bss history` later.",
                        order.id
                    );
                }
                None => println!("Stopped watching."),
            }
        }
        Command::History { page, per_page } => {
            print_json(&api.order_history(page, per_page).await?)?
        }
        Command::Vehicles => print_json(&api.my_vehicles().await?)?,
        Command::AddVehicle {
            plate,
            model,
            battery,
        } => {
            let vehicle = api
                .create_vehicle(CreateVehicleRequest {
                    plate_number: plate,
                    model,
                    battery_type: battery,
                })
                .await?;
            print_json(&vehicle)?;
        }
    }

    Ok(())
}

fn report_scan(outcome: ScanOutcome) -> anyhow::Result<()> {
    match outcome {
        ScanOutcome::SessionReady(session) => {
            println!("Station session active:");
            print_json(&session)?;
        }
        ScanOutcome::PinRequired(_) => {
            println!("This station requires a PIN; rerun with --pin <PIN>.");
        }
        ScanOutcome::UnsupportedCode => bail!("that QR code is not a BSS station code"),
        ScanOutcome::Rejected(err) => bail!("station rejected the code: {err}"),
        ScanOutcome::Ignored => {}
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

use anyhow::anyhow;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;

use nikogrid::api::Coord;
use nikogrid::api::backend::{Client, Credentials, LocationDetails};
use nikogrid::api::geocoder::Nominatim;
use nikogrid::camera::Camera;
use nikogrid::config::Config;
use nikogrid::feed::{FeedConfig, FeedController};
use nikogrid::geo::{ViewportBounds, parse_coordinate_pair};
use nikogrid::notice::{Notice, Notifier};
use nikogrid::search::{CachedPosition, FixedPosition, Search};
use nikogrid::{admin, auth, booking};

use crate::interactive;

/// Initial view when no position is configured.
pub const DEFAULT_CENTER: Coord = Coord {
    lat: 40.6405,
    lon: -8.6538,
};
pub const DEFAULT_ZOOM: u8 = 13;

#[derive(Parser, Debug)]
#[command(name = "nikogrid", about = "NikoGrid charging station client", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List interest points inside a bounding box
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        west: f64,
        #[arg(long, allow_negative_numbers = true)]
        north: f64,
        #[arg(long, allow_negative_numbers = true)]
        east: f64,
        #[arg(long, allow_negative_numbers = true)]
        south: f64,
        #[arg(long, default_value_t = DEFAULT_ZOOM)]
        zoom: u8,
        /// Only count chargers that are currently available
        #[arg(long)]
        only_active: bool,
    },
    /// Find the closest station to an address, a "lat, lon" pair or the current position
    Closest {
        #[arg(allow_hyphen_values = true)]
        query: Option<String>,
    },
    /// Show a station and its chargers
    Station { id: i64 },
    /// Log in and print the session token
    Login { email: String, password: String },
    Register {
        email: String,
        password: String,
        confirm: String,
    },
    Logout,
    /// Show the logged in user
    Me,
    Reservations,
    /// Reserve a charger, times are local "YYYY-MM-DDTHH:MM"
    Book {
        charger_id: i64,
        start: String,
        end: String,
    },
    Cancel { id: i64 },
    /// Create a location (admin only)
    CreateLocation {
        name: String,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
    /// Add a charger to a location (admin only)
    CreateCharger {
        location_id: i64,
        name: String,
        max_power: f64,
    },
    /// Interactive map session
    Map {
        /// Initial center as "lat, lon"
        #[arg(long, allow_hyphen_values = true, value_parser = parse_center)]
        center: Option<Coord>,
        #[arg(long, default_value_t = DEFAULT_ZOOM)]
        zoom: u8,
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 720)]
        height: u32,
        #[arg(long)]
        only_active: bool,
    },
}

fn parse_center(raw: &str) -> Result<Coord, String> {
    parse_coordinate_pair(raw).ok_or_else(|| format!("{raw:?} is not a \"lat, lon\" pair"))
}

pub async fn execute(command: Command, config: &Config, client: Client) -> anyhow::Result<()> {
    let (notifier, mut notices) = Notifier::channel();

    let result = dispatch(command, config, client, notifier, &mut notices).await;
    print_notices(&mut notices);

    result
}

fn print_notices(notices: &mut UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        println!("{notice}");
    }
}

async fn dispatch(
    command: Command,
    config: &Config,
    client: Client,
    notifier: Notifier,
    notices: &mut UnboundedReceiver<Notice>,
) -> anyhow::Result<()> {
    match command {
        Command::Nearby {
            west,
            north,
            east,
            south,
            zoom,
            only_active,
        } => {
            let bounds = ViewportBounds {
                west,
                north,
                east,
                south,
                zoom,
            };
            bounds.validate().map_err(|e| anyhow!("{e}"))?;

            let points = client.nearby(&bounds, only_active).await?;
            if points.is_empty() {
                println!("No stations in {bounds}");
            }
            for (index, point) in points.iter().enumerate() {
                let marker = nikogrid::marker::Marker::for_point(index, point, None, None);
                println!(
                    "{:<6} {:<10} {}  {}",
                    marker.test_id, marker.group, marker.position, marker.label.text
                );
            }
        }
        Command::Closest { query } => {
            let camera = Camera::new(DEFAULT_CENTER, DEFAULT_ZOOM, 1, 1);
            let search = search(config, client.clone(), camera, notifier)?;

            let input = query.as_deref().unwrap_or("");
            if let Some(location) = search.find_closest(input).await {
                let at = Coord::new(location.lat, location.lon);
                println!("#{} {} ({at})", location.id, location.name);
            }
        }
        Command::Station { id } => print_details(&client.location(id).await?),
        Command::Login { email, password } => {
            let credentials = Credentials { email, password };
            auth::login(&client, &notifier, &credentials).await?;
            print_notices(notices);
            if let Some(token) = client.token() {
                println!("NIKOGRID_AUTH_TOKEN={token}");
            }
        }
        Command::Register {
            email,
            password,
            confirm,
        } => auth::register(&client, &notifier, &email, &password, &confirm).await?,
        Command::Logout => auth::logout(&client, &notifier).await?,
        Command::Me => {
            let user = client.me().await?;
            let role = if user.is_admin { "admin" } else { "user" };
            println!("{} ({role}, {})", user.email, user.id);
        }
        Command::Reservations => {
            let now = Utc::now();
            let listings = booking::list(&client).await?;
            if listings.is_empty() {
                println!("No reservations");
            }
            for r in listings {
                println!(
                    "#{:<5} {} -> {}  {} @ {} ({} kW){}",
                    r.id,
                    r.start.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    r.end.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    r.charger,
                    r.location,
                    r.max_power,
                    if r.is_past(now) { "  [past]" } else { "" }
                );
            }
        }
        Command::Book {
            charger_id,
            start,
            end,
        } => {
            let times = booking::parse_local(&start)
                .and_then(|start| booking::parse_local(&end).map(|end| (start, end)));
            let (start, end) = match times {
                Ok(times) => times,
                Err(e) => {
                    notifier.error(booking::booking_error_message(&e));
                    return Err(e.into());
                }
            };
            booking::book(&client, &notifier, charger_id, start, end).await?;
        }
        Command::Cancel { id } => booking::cancel(&client, &notifier, id).await?,
        Command::CreateLocation { name, lat, lon } => {
            let location = admin::create_location(&client, &notifier, &name, lat, lon).await?;
            println!("#{} {}", location.id, location.name);
        }
        Command::CreateCharger {
            location_id,
            name,
            max_power,
        } => {
            let charger =
                admin::create_charger(&client, &notifier, location_id, &name, max_power).await?;
            println!("#{} {}", charger.id, charger.name);
        }
        Command::Map {
            center,
            zoom,
            width,
            height,
            only_active,
        } => {
            let center = center.or(config.position).unwrap_or(DEFAULT_CENTER);
            let camera = Camera::new(center, zoom, width, height);

            let feed_config = FeedConfig {
                debounce: config.debounce,
                ordering: config.ordering,
                only_active,
            };
            let feed =
                FeedController::mount(client.clone(), camera.clone(), feed_config, notifier.clone());
            let search = search(config, client.clone(), camera, notifier)?;

            interactive::run(feed, search, client, notices).await?;
        }
    }

    Ok(())
}

pub type MapSearch = Search<Client, Nominatim, CachedPosition<FixedPosition>>;

fn search(
    config: &Config,
    client: Client,
    camera: Camera,
    notifier: Notifier,
) -> anyhow::Result<MapSearch> {
    let geocoder = Nominatim::new(&config.geocoder_url, config.http_timeout)?;
    let position = CachedPosition::new(FixedPosition(config.position));

    Ok(Search::new(client, geocoder, position, camera, notifier))
}

pub fn print_details(details: &LocationDetails) {
    println!(
        "#{} {} ({})",
        details.id,
        details.name,
        Coord::new(details.lat, details.lon)
    );

    if details.chargers.is_empty() {
        println!("  No chargers at this location");
    }
    for charger in &details.chargers {
        let state = if charger.is_available {
            "Operational"
        } else {
            "Unavailable"
        };
        println!(
            "  #{:<5} {:<20} {:<12} {} kW",
            charger.id, charger.name, state, charger.max_power
        );
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use roster_sync::agenda::{agenda, entries_on};
use roster_sync::config::{self, CloudProvider, Settings};
use roster_sync::model::roster::today;
use roster_sync::model::{
    Address, ClientDraft, Coordinate, Document, OpeningBalance, TourStatus, TransactionKind,
};
use roster_sync::persistence::FileStore;
use roster_sync::planner::{self, route_length_km, RouteHandoff, StartPoint};
use roster_sync::proximity::{
    parse_position_line, PositionFeed, ProximityConfig, ProximityWatcher,
};
use roster_sync::sync::engine::SyncConfig;
use roster_sync::sync::remote::SupabaseRemote;
use roster_sync::sync::{Confirmation, PullOutcome, SyncOrchestrator};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Directory holding the local store.
    #[arg(long, env = "ROSTER_DATA_DIR", default_value = "roster-data")]
    data_dir: PathBuf,

    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the client roster.
    #[command(subcommand)]
    Clients(ClientsCmd),
    /// Plan and manage tours.
    #[command(subcommand)]
    Tour(TourCmd),
    /// Show tours, payment alerts and events by date.
    Agenda {
        /// Only this date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
    },
    /// Remote synchronization.
    #[command(subcommand)]
    Sync(SyncCmd),
    #[command(subcommand)]
    Settings(SettingsCmd),
    /// Read `lat,lng[,accuracy]` lines from stdin and report nearby clients.
    Watch {
        #[arg(long, default_value_t = 0.5)]
        radius_km: f64,
        #[arg(long, default_value_t = 60)]
        period_secs: u64,
    },
}

#[derive(Subcommand)]
enum ClientsCmd {
    Add(AddClient),
    List {
        /// Filter by company or contact name.
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: String,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Record a movement on a client's account.
    Pay {
        id: String,
        amount: f64,
        #[arg(long, value_enum, default_value_t = Entry::Credit)]
        kind: Entry,
        #[arg(long, default_value = "")]
        description: String,
        /// Payment alert date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<String>,
    },
}

#[derive(Args)]
struct AddClient {
    #[arg(long)]
    company: String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    street: String,
    #[arg(long, default_value = "")]
    number: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    zip: String,
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    lng: f64,
    #[arg(long, default_value = "")]
    notes: String,
    /// Amount already owed when the client is entered.
    #[arg(long)]
    opening_balance: Option<f64>,
}

#[derive(Subcommand)]
enum TourCmd {
    /// Order the selected clients by nearest neighbor and save the tour.
    Plan {
        /// Client ids to visit.
        #[arg(long, value_delimiter = ',', required = true)]
        clients: Vec<String>,
        /// Start from this client instead of the live position.
        #[arg(long)]
        from_client: Option<String>,
        /// Live position latitude.
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        #[arg(long)]
        date: Option<String>,
    },
    List,
    Show {
        id: String,
    },
    Status {
        id: String,
        #[arg(value_enum)]
        status: Status,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum SyncCmd {
    Status,
    /// Push the local document now.
    Push,
    /// Replace local data with the remote copy.
    Pull {
        #[arg(long)]
        yes: bool,
    },
    /// Erase all local data.
    Wipe {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCmd {
    Show,
    Set {
        #[arg(value_enum)]
        key: SettingKey,
        /// Empty string resets the value.
        value: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Entry {
    /// Owed by the client (dare).
    Debit,
    /// Paid by the client (avere).
    Credit,
}

impl From<Entry> for TransactionKind {
    fn from(e: Entry) -> Self {
        match e {
            Entry::Debit => TransactionKind::Debit,
            Entry::Credit => TransactionKind::Credit,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Status {
    Planned,
    Completed,
    Cancelled,
}

impl From<Status> for TourStatus {
    fn from(s: Status) -> Self {
        match s {
            Status::Planned => TourStatus::Planned,
            Status::Completed => TourStatus::Completed,
            Status::Cancelled => TourStatus::Cancelled,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SettingKey {
    Provider,
    SupabaseUrl,
    SupabaseKey,
    MapsKey,
    HomeImage,
    BackgroundImage,
}

type Session = SyncOrchestrator<FileStore>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store = FileStore::open(&cli.data_dir)?;

    if let Command::Settings(cmd) = &cli.command {
        return run_settings(store, cmd);
    }

    let settings = Settings::load(&store)?
        .with_overrides(cli.supabase_url.clone(), cli.supabase_key.clone());

    let mut session = SyncOrchestrator::new(store, SyncConfig::default());
    if let Some(remote) = settings.supabase() {
        session = session.with_remote(Arc::new(SupabaseRemote::new(remote)?));
    }
    session.load().await?;

    let result = match cli.command {
        Command::Clients(cmd) => run_clients(&mut session, cmd).await,
        Command::Tour(cmd) => run_tour(&mut session, cmd).await,
        Command::Agenda { date } => {
            print_agenda(session.document(), date.as_deref());
            Ok(())
        }
        Command::Sync(cmd) => run_sync(&mut session, cmd).await,
        Command::Watch {
            radius_km,
            period_secs,
        } => {
            let config = ProximityConfig {
                radius_km,
                period: std::time::Duration::from_secs(period_secs),
                ..ProximityConfig::default()
            };
            run_watch(&session, config).await
        }
        Command::Settings(_) => Ok(()),
    };

    // A one-shot run must not exit with a debounced push still pending.
    session.settle().await;
    session.dispose().await;
    result
}

// ================================
// Clients
// ================================

async fn run_clients(session: &mut Session, cmd: ClientsCmd) -> Result<()> {
    match cmd {
        ClientsCmd::Add(args) => {
            let draft = ClientDraft {
                company_name: args.company,
                first_name: args.first_name,
                last_name: args.last_name,
                phone: args.phone,
                email: args.email,
                address: Address {
                    street: args.street,
                    number: args.number,
                    city: args.city,
                    zip: args.zip,
                    ..Address::default()
                },
                coords: Coordinate::new(args.lat, args.lng),
                notes: args.notes,
                ..ClientDraft::default()
            };
            let opening = args.opening_balance.map(OpeningBalance::debit);

            let id = session
                .apply(|doc| doc.add_client(draft, opening).map(|c| c.id.clone()))
                .await?;
            println!("[CLIENTS] added {}", id);
        }

        ClientsCmd::List { search } => {
            let doc = session.document();
            let clients = doc.search(search.as_deref().unwrap_or(""));
            for c in &clients {
                println!(
                    "{}  {:<30} {:>10.2}  {}",
                    c.id,
                    c.company_name,
                    c.balance(),
                    c.address.city
                );
            }
            println!("[CLIENTS] {} of {}", clients.len(), doc.clients.len());
        }

        ClientsCmd::Show { id } => {
            let doc = session.document();
            let Some(c) = doc.find_client(&id) else {
                bail!("client {} not found", id);
            };
            println!("{} ({})", c.company_name, c.id);
            if !c.contact_name().is_empty() {
                println!("  contact:  {}", c.contact_name());
            }
            println!("  address:  {}", c.address.one_line());
            println!("  position: {:.6},{:.6}", c.coords.lat, c.coords.lng);
            if !c.phone.is_empty() {
                println!("  phone:    {}", c.phone);
            }
            println!("  balance:  {:.2}", c.balance());
            for tx in &c.transactions {
                println!(
                    "    {} {:>10.2} {}{}",
                    tx.date,
                    tx.signed_amount(),
                    tx.description,
                    tx.alert_date
                        .as_ref()
                        .map(|d| format!(" (due {})", d))
                        .unwrap_or_default()
                );
            }
        }

        ClientsCmd::Delete { id, yes } => {
            if Confirmation::from(yes) != Confirmation::Confirmed {
                println!("[CLIENTS] not deleted, pass --yes to confirm");
                return Ok(());
            }
            let removed = session.apply(|doc| Ok(doc.delete_client(&id))).await?;
            match removed {
                Some(c) => println!("[CLIENTS] deleted {}", c.company_name),
                None => bail!("client {} not found", id),
            }
        }

        ClientsCmd::Pay {
            id,
            amount,
            kind,
            description,
            due,
        } => {
            let balance = session
                .apply(|doc| {
                    doc.add_transaction(&id, kind.into(), amount, &description, due)?;
                    Ok(doc.find_client(&id).map(|c| c.balance()).unwrap_or_default())
                })
                .await?;
            println!("[CLIENTS] balance now {:.2}", balance);
        }
    }
    Ok(())
}

// ================================
// Tours
// ================================

async fn run_tour(session: &mut Session, cmd: TourCmd) -> Result<()> {
    match cmd {
        TourCmd::Plan {
            clients,
            from_client,
            lat,
            lng,
            date,
        } => {
            let live = lat.zip(lng).map(|(lat, lng)| Coordinate::new(lat, lng));
            let start = match from_client {
                Some(id) => StartPoint::Client(id),
                None => StartPoint::LivePosition,
            };
            let date = date.unwrap_or_else(today);

            let tour = session
                .apply(|doc| {
                    let tour = planner::plan_tour(doc, &clients, &start, live, &date)?;
                    doc.save_tour(tour.clone());
                    Ok(tour)
                })
                .await?;
            println!("[TOUR] {} ({})", tour.name, tour.id);
            print_tour(session.document(), &tour.id, live)?;
        }

        TourCmd::List => {
            for t in &session.document().tours {
                println!(
                    "{}  {}  {:<24} {:>3} stops  {:?}",
                    t.id,
                    t.date,
                    t.name,
                    t.stops.len(),
                    t.status
                );
            }
        }

        TourCmd::Show { id } => print_tour(session.document(), &id, None)?,

        TourCmd::Status { id, status } => {
            session
                .apply(|doc| doc.set_tour_status(&id, status.into()))
                .await?;
            println!("[TOUR] {} -> {:?}", id, status);
        }

        TourCmd::Delete { id } => {
            let removed = session.apply(|doc| Ok(doc.delete_tour(&id))).await?;
            if removed.is_none() {
                bail!("tour {} not found", id);
            }
            println!("[TOUR] deleted {}", id);
        }
    }
    Ok(())
}

fn print_tour(doc: &Document, id: &str, origin: Option<Coordinate>) -> Result<()> {
    let Some(tour) = doc.find_tour(id) else {
        bail!("tour {} not found", id);
    };

    println!("{} on {} [{:?}]", tour.name, tour.date, tour.status);
    for (i, stop) in tour.stops.iter().enumerate() {
        println!("  {:>2}. {}  {}", i + 1, stop.time, doc.stop_label(stop));
    }
    println!(
        "  ~{:.1} km",
        route_length_km(doc, origin, &tour.stops)
    );

    if let Some(handoff) = RouteHandoff::for_tour(doc, tour, origin) {
        println!("  {}", handoff.directions_url()?);
    }
    Ok(())
}

fn print_agenda(doc: &Document, date: Option<&str>) {
    let entries = match date {
        Some(date) => entries_on(doc, date),
        None => agenda(doc),
    };
    for e in entries {
        match &e.client_name {
            Some(name) => println!("{}  {:<11} {} ({})", e.date, e.kind, e.title, name),
            None => println!("{}  {:<11} {}", e.date, e.kind, e.title),
        }
    }
}

// ================================
// Sync
// ================================

async fn run_sync(session: &mut Session, cmd: SyncCmd) -> Result<()> {
    match cmd {
        SyncCmd::Status => {
            println!(
                "[SYNC] remote: {}",
                if session.has_remote() { "supabase" } else { "none" }
            );
            println!("[SYNC] status: {}", session.status().as_str());
            let doc = session.document();
            println!(
                "[SYNC] {} clients, {} tours",
                doc.clients.len(),
                doc.tours.len()
            );
        }

        SyncCmd::Push => {
            session.force_push().await?;
            println!("[SYNC] pushed");
        }

        SyncCmd::Pull { yes } => match session.force_pull(Confirmation::from(yes)).await? {
            PullOutcome::Restored { clients, tours } => {
                println!("[SYNC] restored {} clients, {} tours", clients, tours)
            }
            PullOutcome::NothingToRestore => println!("[SYNC] remote is empty, nothing restored"),
            PullOutcome::Declined => println!("[SYNC] not pulled, pass --yes to confirm"),
        },

        SyncCmd::Wipe { yes } => {
            if session.wipe_local(Confirmation::from(yes)).await? {
                println!("[SYNC] local data erased");
            } else {
                println!("[SYNC] not erased, pass --yes to confirm");
            }
        }
    }
    Ok(())
}

// ================================
// Settings
// ================================

fn run_settings(mut store: FileStore, cmd: &SettingsCmd) -> Result<()> {
    let mut settings = Settings::load(&store)?;

    match cmd {
        SettingsCmd::Show => {
            println!("provider:         {:?}", settings.cloud_provider);
            println!("supabase url:     {}", settings.supabase_url);
            println!(
                "supabase key:     {}",
                if settings.supabase_key.is_empty() { "-" } else { "(set)" }
            );
            println!(
                "maps key:         {}",
                if settings.google_maps_api_key.is_empty() { "-" } else { "(set)" }
            );
            println!("home image:       {}", config::home_image(&store)?);
            println!(
                "background image: {}",
                config::background_image(&store)?.unwrap_or_else(|| "-".to_string())
            );
        }

        SettingsCmd::Set { key, value } => {
            let value = value.trim();
            let reset = value.is_empty();
            match key {
                SettingKey::Provider => {
                    settings.cloud_provider = if reset {
                        CloudProvider::default()
                    } else {
                        CloudProvider::from_str(value, true).map_err(|e| {
                            anyhow!("provider must be `none` or `supabase`: {}", e)
                        })?
                    };
                }
                SettingKey::SupabaseUrl => settings.supabase_url = value.to_string(),
                SettingKey::SupabaseKey => settings.supabase_key = value.to_string(),
                SettingKey::MapsKey => settings.google_maps_api_key = value.to_string(),
                SettingKey::HomeImage => {
                    return config::set_home_image(&mut store, (!reset).then_some(value));
                }
                SettingKey::BackgroundImage => {
                    return config::set_background_image(&mut store, (!reset).then_some(value));
                }
            }
            settings.save(&mut store)?;
            println!("[CONFIG] saved");
        }
    }
    Ok(())
}

// ================================
// Proximity
// ================================

async fn run_watch(session: &Session, config: ProximityConfig) -> Result<()> {
    let (tx, rx) = mpsc::channel(16);
    let mut feed = PositionFeed::spawn(rx);
    let (mut watcher, mut raised) =
        ProximityWatcher::spawn(config, feed.subscribe(), session.subscribe_document());

    println!(
        "[RADAR] watching {} clients within {} km, one check every {:?}",
        session.document().clients.len(),
        config.radius_km,
        config.period
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match parse_position_line(&line) {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => log::warn!("{:#}", e),
                    },
                    None => {
                        log::info!("[RADAR] end of position input");
                        stdin_open = false;
                    }
                }
            }

            Some(hit) = raised.recv() => {
                println!("[RADAR] {} ({:.0} m)", hit.text(), hit.distance_km * 1000.0);
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    watcher.dispose();
    feed.stop();
    Ok(())
}

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use gateway::{bootstrap, observability, ApiClient, GatewayConfig};
use serde_json::Value;
use service::auth::{AuthService, Credentials};
use service::{ClientDirectory, ListQuery, ServiceError};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Command-line shell for the Mecanix shop backend.
#[derive(Parser, Debug)]
#[command(name = "mecanix")]
#[command(about = "Mecanix repair-shop administration client")]
struct Args {
    /// Backend base URL; overrides config.toml and MECANIX_API_URL
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Log every request and response
    #[arg(long)]
    dev: bool,

    /// Print gateway metrics after the command
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a session token for later calls
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Drop the stored session token
    Logout,
    /// List a resource
    List {
        resource: ResourceKind,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        /// Repeatable status filter
        #[arg(long)]
        status: Vec<String>,
    },
    /// Fetch one record by id
    Get { resource: ResourceKind, id: i64 },
    /// Vehicles owned by a client
    ClientVehicles { client_id: i64 },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ResourceKind {
    Clients,
    Vehicles,
    Services,
    Mechanics,
    Reservations,
    Orders,
}

fn init_logging(dev: bool, json: bool) {
    if json {
        common::utils::logging::init_logging_json(dev);
    } else {
        common::utils::logging::init_logging_default();
    }
    info!(service = "mecanix", event = "logger_init", "tracing subscriber initialized");
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|e| ServiceError::Validation(e.to_string()))
}

async fn run(args: &Args, client: Arc<ApiClient>, use_mock_data: bool) -> Result<Value, ServiceError> {
    match &args.command {
        Command::Login { email, password } => {
            let auth = AuthService::new(client);
            let response = auth.login(&Credentials::new(email.clone(), password.clone())).await?;
            Ok(response.user.unwrap_or(Value::Null))
        }
        Command::Logout => {
            AuthService::new(client).logout().await;
            Ok(Value::Null)
        }
        Command::List { resource, search, page, limit, status } => {
            let mut query = ListQuery::new();
            if let Some(page) = page {
                query = query.page(*page, *limit);
            }
            if let Some(search) = search {
                query = query.search(search.clone());
            }
            for s in status {
                query = query.status(s.clone());
            }
            match resource {
                ResourceKind::Clients => to_json(&ClientDirectory::from_settings(client, use_mock_data).list(&query).await?),
                ResourceKind::Vehicles => to_json(&service::vehicle_service(client).list(&query).await?),
                ResourceKind::Services => to_json(&service::service_service(client).list(&query).await?),
                ResourceKind::Mechanics => to_json(&service::mechanic_service(client).list(&query).await?),
                ResourceKind::Reservations => to_json(&service::reservation_service(client).list(&query).await?),
                ResourceKind::Orders => to_json(&service::order_service(client).list(&query).await?),
            }
        }
        Command::Get { resource, id } => match resource {
            ResourceKind::Clients => to_json(&ClientDirectory::from_settings(client, use_mock_data).get(*id).await?),
            ResourceKind::Vehicles => to_json(&service::vehicle_service(client).get(*id).await?),
            ResourceKind::Services => to_json(&service::service_service(client).get(*id).await?),
            ResourceKind::Mechanics => to_json(&service::mechanic_service(client).get(*id).await?),
            ResourceKind::Reservations => to_json(&service::reservation_service(client).get(*id).await?),
            ResourceKind::Orders => to_json(&service::order_service(client).get(*id).await?),
        },
        Command::ClientVehicles { client_id } => {
            to_json(&service::client_vehicle_service(client).vehicles_of_client(*client_id).await?)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    common::env::load_dotenv();
    let loaded = configs::load_default();
    let json_logs = loaded.as_ref().map(|c| c.app.json_logs).unwrap_or(false);
    init_logging(args.dev, json_logs);

    let mut cfg = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "config file not loaded; using defaults");
        configs::AppConfig::default()
    });
    if let Err(e) = cfg.apply_overrides(args.api_url.as_deref(), args.dev) {
        error!(service = "mecanix", event = "config_invalid", error = %e, "invalid api configuration");
        return ExitCode::FAILURE;
    }

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "mecanix",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "mecanix", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(service = "mecanix", event = "start", %service_id, pid, version, "mecanix client starting");

    rt.block_on(async move {
        let config = GatewayConfig::from_api_config(&cfg.api);
        let client = match bootstrap::connect(config).await {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!(service = "mecanix", event = "connect_failed", error = %e, "failed to set up gateway client");
                return ExitCode::FAILURE;
            }
        };
        let listener = bootstrap::spawn_session_listener(&client, |target| {
            eprintln!("-> {target}");
        });

        let result = run(&args, client.clone(), cfg.app.use_mock_data).await;
        if args.metrics {
            print!("{}", observability::encode_metrics());
        }
        drop(client);
        let _ = listener.await;

        match result {
            Ok(Value::Null) => ExitCode::SUCCESS,
            Ok(value) => {
                println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e.user_message());
                ExitCode::FAILURE
            }
        }
    })
}

//! Improv Provisioning Service - Main Entry Point

use std::{sync::Arc, time::Duration};

use clap::Parser;
use improv_provisioning_service::{
    backend::{HostIdentify, WifiCtrlBackend},
    codec::encode_status,
    config::{CliArgs, Settings},
    core::{
        engine::ProvisioningEngine,
        service::{ProvisioningService, ServiceHandle},
    },
    transport::{
        NotificationHub,
        ble::{BleAdapter, CharacteristicHandler, GattServer},
        unix_socket::{RequestHandler, UnixSocketServer, bind_listener, inherited_listener},
    },
};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HUB_CAPACITY: usize = 64;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,improv_provisioning_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    info!(?args, "Starting Improv provisioning service");

    let settings = Settings::try_from(args).inspect_err(|e| error!("Invalid configuration: {}", e))?;
    info!(
        "Initial state {:?}, command gating {:?}, capabilities {:#04x}",
        settings.engine.initial_state,
        settings.engine.gating,
        settings.engine.capabilities.bits()
    );

    let engine = ProvisioningEngine::new(settings.engine.clone())?;

    let connector = Arc::new(WifiCtrlBackend::new(
        settings.interface.clone(),
        settings.connect_policy,
    )?);
    info!("Wi-Fi connector initialized for interface: {}", settings.interface);

    let identify = match &settings.identify_command {
        Some(command) => HostIdentify::new(settings.device_name.clone()).with_command(command),
        None => HostIdentify::new(settings.device_name.clone()),
    };

    let hub = NotificationHub::new(HUB_CAPACITY);
    let (service, handle) = ProvisioningService::new(
        engine,
        connector,
        Arc::new(identify),
        Arc::new(hub.clone()),
    );

    let mut tasks = Vec::new();

    if settings.enable_unix_socket {
        let listener = match inherited_listener()? {
            Some(listener) => {
                info!("Using socket-activated listener");
                listener
            }
            None => {
                info!("Binding Unix socket {}", settings.socket_path.display());
                bind_listener(&settings.socket_path, settings.socket_mode).await?
            }
        };

        let server = UnixSocketServer::new(RequestHandler::new(handle.clone()), hub.clone());
        tasks.push(tokio::spawn(async move {
            if let Err(e) = server.serve(listener).await {
                error!("Unix socket server error: {}", e);
            }
        }));
    }

    if settings.enable_ble {
        match start_ble_transport(&settings.device_name, &handle, &hub).await {
            Ok(task) => tasks.push(task),
            Err(e) => {
                error!("Failed to start BLE transport: {}", e);
                if !settings.enable_unix_socket {
                    return Err(e);
                }
            }
        }
    }

    let service_task = tokio::spawn(service.run());

    #[cfg(feature = "systemd")]
    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]) {
        warn!("Failed to notify systemd: {}", e);
    }

    info!("Service started successfully");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT (Ctrl+C), shutting down gracefully");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully");
                break;
            }
            _ = sigusr1.recv() => {
                info!("Received SIGUSR1, authorizing");
                if let Err(e) = handle.authorize().await {
                    warn!("Authorization failed: {}", e);
                }
            }
        }
    }

    info!("Shutting down...");
    for task in tasks {
        task.abort();
    }
    drop(handle);

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, service_task)
        .await
        .is_err()
    {
        warn!("Provisioning service did not stop in time");
    }

    Ok(())
}

async fn start_ble_transport(
    device_name: &str,
    handle: &ServiceHandle,
    hub: &NotificationHub,
) -> Result<tokio::task::JoinHandle<()>, Box<dyn std::error::Error>> {
    let adapter = BleAdapter::new(device_name.to_string()).await?;
    let gatt_server = GattServer::new(CharacteristicHandler::new(handle.clone()), hub.clone());

    let status = handle.status();
    let initial_status = encode_status(status.state, status.capabilities);
    let events = hub.subscribe();

    Ok(tokio::spawn(async move {
        if let Err(e) = adapter.run(&gatt_server, initial_status, events).await {
            error!("BLE transport error: {}", e);
        }
    }))
}

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use mw_core::{
    MetricsHandle,
    clock::system_clock,
    controller::{Controller, ControllerAction, ControllerRuntime},
    router::{ChannelName, ChannelRouter, ChannelScheme},
    screen::{LogPresenter, ScreenRuntime, ScreenSyncState},
    transport::{LocalBroadcast, Transport, TransportHandle},
};
use mw_model::{ConfigSnapshot, ControllerState, Group, GroupId, ROTATION_EVENT, ScreenIdentity};
use mw_prometheus::PrometheusMetrics;
use mw_relay::{RelayServer, RelayTransport, serve};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpListener,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    cli::{ControllerArgs, DemoArgs, ScreenArgs},
    command::parse_command,
    config::{TransportKind, WallConfig},
};

const DEMO_GROUP: &str = "demo";
const DEMO_PRODUCTS: &str = "Item A\n\nItem B\n\nItem C\n\nItem D";

/// Transport selected by the configuration.
pub fn build_transport(cfg: &WallConfig) -> anyhow::Result<TransportHandle> {
    match cfg.transport.kind {
        TransportKind::Local => Ok(Arc::new(LocalBroadcast::with_scheme(cfg.scheme()))),
        TransportKind::Relay => {
            let relay = RelayTransport::new(&cfg.transport.endpoint)?.with_scheme(cfg.scheme());
            Ok(Arc::new(relay))
        }
    }
}

/// Transport for a standalone `screen` or `controller` process.
///
/// The local broadcast never leaves the process, so two such processes would never see
/// each other; only `demo` hosts both ends in one daemon.
pub fn cross_process_transport(cfg: &WallConfig) -> anyhow::Result<TransportHandle> {
    if cfg.transport.kind == TransportKind::Local {
        anyhow::bail!(
            "transport 'local' only reaches the same process; set transport.kind = \"relay\" \
             for standalone screens and controllers, or use `demo`"
        );
    }
    build_transport(cfg)
}

/// Snapshot named by the configuration, empty when none is configured.
pub fn load_snapshot(cfg: &WallConfig) -> anyhow::Result<ConfigSnapshot> {
    let Some(path) = &cfg.snapshot else {
        return Ok(ConfigSnapshot::default());
    };
    let raw = std::fs::read(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    ConfigSnapshot::from_json(&raw)
        .with_context(|| format!("invalid snapshot {}", path.display()))
}

/// Initial edit state of a controller taking over `group`.
pub fn controller_state(group: Option<&Group>) -> ControllerState {
    let mut state = ControllerState::default();
    if let Some(group) = group {
        state.products = group.products.join("\n\n");
        state.layout_mode = group.layout_mode;
        state.production_mode = group.production_mode;
        if let Some(secs) = group.interval_seconds {
            state.interval_seconds = i64::try_from(secs).unwrap_or(i64::MAX);
        }
    }
    state
}

pub async fn run_relay(
    cfg: &WallConfig,
    listen: Option<String>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listen = listen.unwrap_or_else(|| cfg.relay.listen.clone());
    let hub = LocalBroadcast::with_scheme(ChannelScheme::relay());
    let metrics = PrometheusMetrics::new()?;
    let router = RelayServer::new(Arc::new(hub))
        .with_metrics(metrics)
        .router();

    let listener = TcpListener::bind(&listen)
        .await
        .with_context(|| format!("failed to bind relay on {listen}"))?;
    serve(listener, router, cancel).await?;
    Ok(())
}

pub async fn run_screen(
    cfg: &WallConfig,
    args: ScreenArgs,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let snapshot = load_snapshot(cfg)?;
    let group_id = match args.group {
        Some(group) => GroupId::from(group),
        None => snapshot
            .screen_assignments
            .get(&args.position)
            .cloned()
            .with_context(|| format!("no group assigned to position {}", args.position))?,
    };
    let group = snapshot.group(&group_id);
    if group.is_none() {
        warn!(group = %group_id, "group not in snapshot, waiting for controller");
    }

    let identity = ScreenIdentity::new(cfg.instance.clone(), group_id, args.position);
    let transport = cross_process_transport(cfg)?;
    let channel = ChannelRouter::new(transport.scheme())
        .channel_for(&identity.instance_id, &identity.group_id)?;

    let state = ScreenSyncState::new(identity, group, &cfg.screen());
    let runtime = ScreenRuntime::new(
        state,
        transport,
        channel,
        system_clock(),
        LogPresenter,
        cfg.timing.transition_ms,
    );
    let state = runtime.run(cancel).await?;
    info!(screen = %state.identity(), status = %state.status(), "screen stopped");
    Ok(())
}

pub async fn run_controller(
    cfg: &WallConfig,
    args: ControllerArgs,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let snapshot = load_snapshot(cfg)?;
    let group_id = GroupId::from(args.group);
    let state = controller_state(snapshot.group(&group_id));

    let transport = cross_process_transport(cfg)?;
    let channel = ChannelRouter::new(transport.scheme()).channel_for(&cfg.instance, &group_id)?;
    let controller = Controller::new(cfg.instance.clone(), group_id, state);
    let (runtime, client) = ControllerRuntime::new(controller, transport, channel, system_clock());
    let task = tokio::spawn(runtime.run(cancel.clone()));

    info!("reading commands from stdin (start, stop, reset, interval, products, layout, production, show)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(action) => match client.send(action).await {
                Ok(state) => info!(
                    running = state.is_running,
                    interval_s = state.interval_seconds,
                    layout = state.layout_mode.as_str(),
                    items = state.items().len(),
                    "controller state"
                ),
                Err(e) => error!(error = %e, "command failed"),
            },
            Err(e) => warn!(error = %e, "invalid command"),
        }
    }

    cancel.cancel();
    let controller = task.await?;
    info!(session = controller.session().short(), "controller stopped");
    Ok(())
}

/// One controller and `args.screens` screens sharing a group over the local transport.
pub async fn run_demo(
    cfg: &WallConfig,
    args: DemoArgs,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let hub = LocalBroadcast::with_scheme(ChannelScheme::Local {
        prefix: cfg.channels.local_prefix.clone(),
    });
    let transport: TransportHandle = Arc::new(hub.clone());
    let group_id = GroupId::from(DEMO_GROUP);
    let channel = ChannelRouter::new(transport.scheme()).channel_for(&cfg.instance, &group_id)?;

    let metrics = PrometheusMetrics::new()?;
    let handle: MetricsHandle = Arc::new(metrics.clone());
    let done = cancel.child_token();

    let mut screens = Vec::new();
    for position in 0..args.screens {
        let identity = ScreenIdentity::new(cfg.instance.clone(), group_id.clone(), position);
        let state = ScreenSyncState::new(identity, None, &cfg.screen()).with_metrics(handle.clone());
        let runtime = ScreenRuntime::new(
            state,
            transport.clone(),
            channel.clone(),
            system_clock(),
            LogPresenter,
            cfg.timing.transition_ms,
        );
        screens.push(tokio::spawn(runtime.run(done.clone())));
    }

    let controller = Controller::new(cfg.instance.clone(), group_id, ControllerState::default());
    let (runtime, client) =
        ControllerRuntime::new(controller, transport, channel.clone(), system_clock());
    let controller_task = tokio::spawn(runtime.with_metrics(handle).run(done.clone()));

    // Screens plus the controller's peer subscription.
    let expected = args.screens as usize + 1;
    if !wait_for_subscribers(&hub, &channel, expected).await {
        warn!(expected, "not every subscriber showed up, starting anyway");
    }

    client.send(ControllerAction::SetInterval(args.interval)).await?;
    client.send(ControllerAction::SetProducts(DEMO_PRODUCTS.to_string())).await?;
    client.start().await?;
    info!(screens = args.screens, interval_s = args.interval, "demo rotation started");

    match args.duration {
        Some(secs) => tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
        },
        None => cancel.cancelled().await,
    }

    if let Err(e) = client.stop().await {
        warn!(error = %e, "stop not delivered");
    }
    done.cancel();

    for screen in screens {
        let state = screen.await??;
        info!(
            screen = %state.identity(),
            index = state.displayed_index(),
            status = %state.status(),
            "screen finished"
        );
    }
    controller_task.await?;

    print!("{}", metrics.encode_text()?);
    Ok(())
}

async fn wait_for_subscribers(hub: &LocalBroadcast, channel: &ChannelName, n: usize) -> bool {
    for _ in 0..200 {
        if hub.subscriber_count(channel, ROTATION_EVENT) >= n {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

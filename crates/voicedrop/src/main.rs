//! VoiceDrop: hold a global hotkey to record, release to upload.

mod app;
mod app_command;
mod config;
mod consent_prompt;
mod display_status;
mod error;
mod gesture_state;
mod hotkey_handler;
mod main_command;
mod status_observer;
#[cfg(test)]
mod tests;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    consent_prompt::TerminalPrompt,
    display_status::DisplayStatus,
    error::{AppError, Result as AppResult},
    gesture_state::GestureState,
    hotkey_handler::HotkeyHandler,
    main_command::MainCommand,
    status_observer::StatusObserver,
};

use crate::config::Config;

use std::sync::Arc;

use global_hotkey::GlobalHotKeyManager;
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{mpsc, watch};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use voicedrop_core::{
    CaptureSession, ConsentGate, CpalDevice, RecordingController, UploadClient,
};

const DEFAULT_LOG_FILTER: &str = "voicedrop=debug,voicedrop_core=debug";

/// Builds the controller from configuration.
fn build_controller(config: &Config) -> AppResult<RecordingController> {
    let gate = ConsentGate::with_decision(Arc::new(TerminalPrompt), config.permission.state());

    let capture = CaptureSession::new(
        Box::new(CpalDevice::new()),
        config.encoding_profile(),
        config.storage.recordings_dir.clone(),
    );

    let uploader = UploadClient::new()?;

    Ok(RecordingController::new(
        Arc::new(gate),
        capture,
        Arc::new(uploader),
        config.upload_target(),
    ))
}

/// Application entry point.
fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let event_loop = EventLoopBuilder::<MainCommand>::with_user_event().build();
    let main_proxy = event_loop.create_proxy();

    // Persists across event loop iterations; dropping it unregisters the hotkey.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(MainCommand::Shutdown) => {
                *control_flow = ControlFlow::ExitWithCode(0);
                return;
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let config = match Config::load() {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to load config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                if let Err(e) = config.validate_endpoint() {
                    warn!(error = ?e, "Uploads will fail until the endpoint is fixed");
                }

                let controller = match build_controller(&config) {
                    Ok(c) => Arc::new(c),
                    Err(e) => {
                        error!("Failed to create RecordingController: {:?}", e);
                        std::process::exit(1);
                    }
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let (command_tx, command_rx) = mpsc::channel(32);
                let (shutdown_tx, shutdown_rx) = watch::channel(false);

                // Register on the main thread: tao's event loop pumps the
                // messages needed for WM_HOTKEY delivery on Windows.
                let (manager, hotkey_id) = match HotkeyHandler::register_hotkey() {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Failed to register hotkey: {:?}", e);
                        std::process::exit(1);
                    }
                };
                hotkey_manager = Some(manager);

                let main_proxy = main_proxy.clone();

                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let hotkey_handler = HotkeyHandler::new(hotkey_id, command_tx);

                        let app = App {
                            controller,
                            config,
                            main_proxy,
                            command_rx,
                            shutdown_tx,
                        };

                        tokio::join!(
                            async {
                                if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            _ => {}
        }

        // Keep hotkey_manager alive in the closure for the app's lifetime.
        let _ = &hotkey_manager;
    });
}

// Learn more about Tauri commands at https://tauri.app/develop/calling-rust/
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Emitter, Manager};
use tauri_plugin_global_shortcut::ShortcutState;
use tracing::{debug, error, info, warn};

use crate::companion;
use crate::errors::{EngineError, NativeTabError};
use crate::hotkey;
use crate::interceptor::keys::{Key, KeyDown, Modifiers};
use crate::interceptor::shortcuts::{
    FocusContext, KeyOutcome, ShortcutAction, ShortcutArbitrator, Trigger,
};
use crate::interceptor::workspace::{MacWorkspace, Workspace};
use crate::interceptor::{CompanionPlacement, Engine, EngineListener, MainThreadDispatch};
use crate::logging::{self, LogHandle};
use crate::permissions::{self, PermissionStatus, ACCESSIBILITY_SETTINGS_URL};
use crate::settings::{self, Settings, SettingsSource, SharedSettings};

struct ShellState {
    settings: SharedSettings,
    log: LogHandle,
    engine: Mutex<Option<Engine>>,
    arbitrator: Mutex<ShortcutArbitrator<String>>,
    focus: Mutex<FocusContext>,
}

/// Emits engine callbacks to the webview and applies companion geometry.
struct ShellListener {
    app: AppHandle,
}

impl EngineListener for ShellListener {
    fn on_drag_selection_detected(&self) {
        let _ = self.app.emit("drag-selection-detected", ());
    }

    fn on_geometry_changed(&self, placement: CompanionPlacement) {
        if let Err(err) = companion::apply_placement(&self.app, placement) {
            warn!(event = "shell.placement_failed", error = %err);
            return;
        }
        let _ = self.app.emit("geometry-changed", placement);
    }

    fn on_activation_shortcut_triggered(&self) {
        let _ = self.app.emit("activation-shortcut", ());
    }

    fn on_escape_triggered(&self) {
        let _ = self.app.emit("escape-triggered", ());
    }

    fn on_panel_toggle_triggered(&self) {
        let _ = self.app.emit("panel-toggle", ());
    }
}

/// `run_on_main_thread` plus a completion handshake.
struct TauriDispatch {
    app: AppHandle,
}

impl MainThreadDispatch for TauriDispatch {
    fn run_sync(&self, job: Box<dyn FnOnce() + Send>) -> bool {
        let (tx, rx) = mpsc::channel();
        let scheduled = self.app.run_on_main_thread(move || {
            job();
            let _ = tx.send(());
        });
        if scheduled.is_err() {
            return false;
        }
        rx.recv_timeout(Duration::from_secs(2)).is_ok()
    }
}

/// Start the engine unless it is already running. Permission problems are reported to
/// the webview, not treated as failures.
fn ensure_engine(app: &AppHandle) {
    let state = app.state::<ShellState>();
    let Ok(mut engine) = state.engine.lock() else {
        return;
    };
    if engine.is_some() {
        return;
    }

    let settings: Arc<dyn SettingsSource> = Arc::new(state.settings.clone());
    let listener = Arc::new(ShellListener { app: app.clone() });
    let dispatch = Arc::new(TauriDispatch { app: app.clone() });

    match Engine::start(settings, listener, dispatch) {
        Ok(started) => *engine = Some(started),
        Err(e) if e.is_permission_error() => {
            info!(event = "shell.permission_required");
            let _ = app.emit("permission-required", ());
        }
        Err(e) => error!(event = "shell.engine_start_failed", code = e.error_code(), error = %e),
    }
}

#[tauri::command]
async fn check_permissions(app: AppHandle) -> PermissionStatus {
    let status = permissions::check();
    if status.accessibility {
        ensure_engine(&app);
    }
    status
}

#[tauri::command]
async fn request_accessibility(app: AppHandle) -> PermissionStatus {
    let (tx, rx) = mpsc::channel();
    let _ = app.run_on_main_thread(move || {
        let result = permissions::prompt_accessibility();
        debug!(event = "shell.accessibility_prompted", trusted = result);
        let _ = tx.send(());
    });
    let _ = rx.recv();

    if let Err(err) = tauri_plugin_opener::open_url(ACCESSIBILITY_SETTINGS_URL, None::<&str>) {
        warn!(event = "shell.open_settings_failed", error = %err);
    }

    check_permissions(app).await
}

#[tauri::command]
fn get_settings(state: tauri::State<'_, ShellState>) -> Settings {
    state.settings.current()
}

#[tauri::command]
fn update_settings(
    app: AppHandle,
    state: tauri::State<'_, ShellState>,
    settings: Settings,
) -> Result<Settings, String> {
    settings.validate().map_err(|e| e.to_string())?;
    settings::save(&settings).map_err(|e| e.to_string())?;

    state.log.set_debug(settings.debug_mode);
    state.settings.replace(settings.clone());
    hotkey::sync(&app, &settings);
    let _ = app.emit("settings-changed", &settings);

    if let Ok(engine) = state.engine.lock() {
        if let Some(engine) = engine.as_ref() {
            engine.request_snap();
        }
    }
    Ok(settings)
}

#[tauri::command]
fn report_focus(state: tauri::State<'_, ShellState>, focus: FocusContext) {
    if let Ok(mut current) = state.focus.lock() {
        *current = focus;
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyDownPayload {
    key: String,
    code: String,
    modifiers: Modifiers,
    focus: FocusContext,
    /// Ids of the list items currently visible, in display order.
    #[serde(default)]
    visible_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyDownResponse {
    consumed: bool,
    action: Option<ShortcutAction<String>>,
}

fn return_to_target_app(settings: &Settings) -> bool {
    let activated = MacWorkspace.activate(&settings.target);
    if !activated {
        warn!(event = "shell.return_to_target_failed", bundle_id = %settings.target.bundle_id);
    }
    activated
}

/// Run arbitration and perform the focus-transfer side of the outcome.
fn arbitrate(
    app: &AppHandle,
    state: &ShellState,
    event: KeyDown,
    focus: FocusContext,
    visible: &[String],
) -> KeyOutcome<String> {
    let settings = state.settings.current();
    let rules = settings.shortcut_rules();
    let outcome = match state.arbitrator.lock() {
        Ok(mut arbitrator) => arbitrator.handle(event, focus, &rules, visible),
        Err(_) => return KeyOutcome::PassThrough,
    };

    if let KeyOutcome::Consumed { trigger, action } = &outcome {
        debug!(event = "shell.shortcut_consumed", trigger = ?trigger, action = ?action);
        match action {
            ShortcutAction::ReturnToTarget => {
                return_to_target_app(&settings);
            }
            ShortcutAction::FocusSearch if *trigger == Trigger::Activation => {
                if let Err(err) = companion::bring_forward(app) {
                    warn!(event = "shell.bring_forward_failed", error = %err);
                }
            }
            _ => {}
        }
    }
    outcome.notify(&ShellListener { app: app.clone() });
    outcome
}

#[tauri::command]
fn handle_key_down(
    app: AppHandle,
    state: tauri::State<'_, ShellState>,
    payload: KeyDownPayload,
) -> KeyDownResponse {
    let event = KeyDown::new(Key::from_dom(&payload.key, &payload.code), payload.modifiers);
    if let Ok(mut current) = state.focus.lock() {
        *current = payload.focus;
    }

    match arbitrate(&app, &state, event, payload.focus, &payload.visible_ids) {
        KeyOutcome::Consumed { action, .. } => KeyDownResponse {
            consumed: true,
            action: Some(action),
        },
        KeyOutcome::PassThrough => KeyDownResponse {
            consumed: false,
            action: None,
        },
    }
}

#[tauri::command]
fn snap_now(state: tauri::State<'_, ShellState>) -> Result<bool, String> {
    let engine = state.engine.lock().map_err(|e| e.to_string())?;
    match engine.as_ref() {
        Some(engine) => Ok(engine.request_snap()),
        None => Err(EngineError::PermissionDenied.to_string()),
    }
}

#[tauri::command]
fn return_to_target(state: tauri::State<'_, ShellState>) -> bool {
    return_to_target_app(&state.settings.current())
}

pub fn run() {
    let initial = settings::load();
    let log = logging::init(initial.debug_mode);
    if let Err(e) = initial.validate() {
        warn!(event = "shell.settings_invalid", error = %e);
    }

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(|app, shortcut, event| {
                    if event.state() != ShortcutState::Pressed {
                        return;
                    }
                    let state = app.state::<ShellState>();
                    let focus = state.focus.lock().map(|f| *f).unwrap_or_default();
                    let key_down = hotkey::key_down_for(shortcut);
                    arbitrate(app, &state, key_down, focus, &[]);
                })
                .build(),
        )
        .setup(|app| {
            let handle = app.handle().clone();
            let state = handle.state::<ShellState>();
            hotkey::sync(&handle, &state.settings.current());

            if permissions::check().accessibility {
                ensure_engine(&handle);
            } else {
                let _ = handle.emit("permission-required", ());
            }

            info!(event = "shell.started", companion = companion::companion_label());
            Ok(())
        })
        .manage(ShellState {
            settings: SharedSettings::new(initial),
            log,
            engine: Mutex::new(None),
            arbitrator: Mutex::new(ShortcutArbitrator::new()),
            focus: Mutex::new(FocusContext::default()),
        })
        .invoke_handler(tauri::generate_handler![
            check_permissions,
            request_accessibility,
            get_settings,
            update_settings,
            report_focus,
            handle_key_down,
            snap_now,
            return_to_target,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

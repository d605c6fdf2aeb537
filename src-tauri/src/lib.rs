//! PixelCat PDF: a lightweight desktop PDF viewer.
//! Engine layer: open, split, merge, organize, protect, extract text.
//! Render layer: page thumbnails on worker threads.

pub mod config;
pub mod engine;
pub mod error;
pub mod render;
pub mod session;
pub mod state;

#[cfg(feature = "desktop")]
mod commands;

pub use error::{AppError, AppResult};

/// Install the `env_logger` backend. `RUST_LOG` overrides the default `info`.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    init_logging();
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .menu(|handle| {
            use tauri::menu::{Menu, MenuItem, PredefinedMenuItem, Submenu};

            let open =
                MenuItem::with_id(handle, "open-pdf", "Open PDF...", true, Some("CmdOrCtrl+O"))?;
            let toggle_mode = MenuItem::with_id(
                handle,
                "toggle-appearance",
                "Toggle Dark Mode",
                true,
                None::<&str>,
            )?;

            let app_menu = Submenu::with_items(
                handle,
                session::APP_NAME,
                true,
                &[
                    &PredefinedMenuItem::about(handle, None, None)?,
                    &PredefinedMenuItem::separator(handle)?,
                    &PredefinedMenuItem::quit(handle, None)?,
                ],
            )?;
            let file_menu = Submenu::with_items(handle, "File", true, &[&open])?;
            let view_menu = Submenu::with_items(
                handle,
                "View",
                true,
                &[&toggle_mode, &PredefinedMenuItem::fullscreen(handle, None)?],
            )?;

            Menu::with_items(handle, &[&app_menu, &file_menu, &view_menu])
        })
        .on_menu_event(|app, event| {
            use tauri::Emitter;

            let id = event.id().as_ref();
            if id == "open-pdf" || id == "toggle-appearance" {
                if let Err(e) = app.emit(id, ()) {
                    log::warn!("could not forward menu event {}: {}", id, e);
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::open_pdf,
            commands::current_document,
            commands::show_panel,
            commands::pdf_properties,
            commands::render_pages,
            commands::split_all,
            commands::extract_range,
            commands::split_preview,
            commands::split_pdf,
            commands::merge_queue,
            commands::merge_add,
            commands::merge_remove,
            commands::merge_move,
            commands::merge_clear,
            commands::merge_run,
            commands::mix_run,
            commands::organizer_open,
            commands::organizer_toggle,
            commands::organizer_select_all,
            commands::organizer_clear,
            commands::organizer_rotate,
            commands::organizer_delete,
            commands::organizer_restore,
            commands::organizer_apply,
            commands::rotate_pages,
            commands::protect_pdf,
            commands::extract_text,
            commands::save_text,
            commands::get_settings,
            commands::set_zoom,
            commands::set_appearance,
        ])
        .setup(|app| {
            let settings_path = app
                .path()
                .app_config_dir()
                .ok()
                .map(|dir| dir.join(config::SETTINGS_FILE));
            let settings = settings_path
                .as_deref()
                .map(config::Settings::load)
                .unwrap_or_default();
            log::info!(
                "starting {} (zoom {}, {:?} mode)",
                session::APP_NAME,
                settings.zoom,
                settings.appearance
            );
            app.manage(state::AppState::with_pdfium(settings, settings_path));

            let url = tauri::WebviewUrl::App("index.html".into());
            tauri::WebviewWindowBuilder::new(app, "main", url)
                .title(session::APP_NAME)
                .inner_size(1100.0, 850.0)
                .min_inner_size(640.0, 480.0)
                .build()?;
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

//! Data Sweeper - Frontend Rust/Leptos Application
//!
//! A WebAssembly frontend for converting CSV and Excel files, with
//! duplicate removal, missing-value filling, column selection and charts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        App                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Header (session, file count)                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MainContent                                                 │
//! │  ├── Hero (title, description)                              │
//! │  ├── UploadSection                                          │
//! │  ├── FileCard × N (preview, clean, columns, chart, convert) │
//! │  └── LogsPanel                                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Footer                                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`] - API and UI types
//! - [`components`] - UI components
//! - [`services`] - Backend client and downloads

use leptos::*;
use leptos_router::*;
use wasm_bindgen::prelude::*;

// =============================================================================
// Module declarations
// =============================================================================

pub mod config;
pub mod types;
pub mod components;
pub mod services;

// =============================================================================
// Re-exports
// =============================================================================

// Configuration
pub use config::*;

// Types
pub use types::{
    cell_text,
    // Logs
    LogEntry, LogLevel,
    // Files
    ColumnInfo, FileSummary, TablePreview, UploadOutcome, UploadResponse,
    // Commands
    BarChart, ChartResponse, CleanReport, CleanResponse, Download, OutputFormat,
    // Errors
    AppError, AppResult,
};

// Components
pub use components::*;

// Services
pub use services::*;

// =============================================================================
// Application Entry Point
// =============================================================================

/// WASM entry point - called automatically by trunk.
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    _ = console_log::init_with_level(log::Level::Debug);

    log::info!("🦀 Data Sweeper - Starting Leptos App");

    mount_to_body(|| view! { <App/> });
}

#[component]
pub fn App() -> impl IntoView {
    view! {
        <Router>
            <main>
                <Routes>
                    <Route path="/" view=MainContent/>
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn MainContent() -> impl IntoView {
    let client = create_rw_signal(None::<ApiClient>);
    let (files, set_files) = create_signal(Vec::<FileSummary>::new());
    let (logs, set_logs) = create_signal(Vec::<LogEntry>::new());

    // Initialize SSE connection ONCE at app startup
    init_sse_logs(set_logs);

    spawn_local(async move {
        match ApiClient::connect(BACKEND_URL).await {
            Ok(api) => client.set(Some(api)),
            Err(e) => add_log(
                set_logs,
                LogLevel::Error,
                &format!("❌ Could not reach the backend: {}", e),
            ),
        }
    });

    let session_id = Signal::derive(move || client.get().map(|c| c.session_id().to_string()));
    let file_count = Signal::derive(move || files.get().len());

    view! {
        <Header session_id=session_id file_count=file_count/>

        <div class="container">
            <Hero/>

            <UploadSection client=client.into() set_files=set_files set_logs=set_logs/>

            <For
                each=move || files.get()
                key=|file| file.id.clone()
                children=move |initial| {
                    let id = initial.id.clone();
                    let file = Signal::derive(move || {
                        files
                            .get()
                            .into_iter()
                            .find(|f| f.id == id)
                            .unwrap_or_else(|| initial.clone())
                    });
                    client.get_untracked().map(|api| {
                        view! {
                            <FileCard client=api file=file set_files=set_files set_logs=set_logs/>
                        }
                    })
                }
            />

            <LogsPanel logs=logs set_logs=set_logs/>
        </div>

        <Footer/>
    }
}

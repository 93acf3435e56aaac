//! File upload component.
//!
//! Accepts several `.csv` / `.xlsx` files at once and sends them in a single
//! request. Files the backend rejects are reported in the logs; the others
//! appear as cards.

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, File, HtmlInputElement};

use crate::components::add_log;
use crate::services::ApiClient;
use crate::{FileSummary, LogEntry, LogLevel, ACCEPTED_EXTENSIONS};

#[component]
pub fn UploadSection(
    client: Signal<Option<ApiClient>>,
    set_files: WriteSignal<Vec<FileSummary>>,
    set_logs: WriteSignal<Vec<LogEntry>>,
) -> impl IntoView {
    let (is_uploading, set_is_uploading) = create_signal(false);
    let (error, set_error) = create_signal(None::<String>);

    let on_file_change = move |ev: Event| {
        let input: HtmlInputElement = event_target(&ev);
        let Some(list) = input.files() else {
            return;
        };
        let selected: Vec<File> = (0..list.length()).filter_map(|i| list.get(i)).collect();
        // Allow picking the same files again
        input.set_value("");

        if selected.is_empty() {
            return;
        }
        let Some(client) = client.get_untracked() else {
            set_error.set(Some("Not connected to the backend yet".to_string()));
            return;
        };

        set_error.set(None);
        spawn_local(async move {
            set_is_uploading.set(true);
            add_log(
                set_logs,
                LogLevel::Info,
                &format!("📤 Uploading {} file(s)...", selected.len()),
            );

            match client.upload(selected).await {
                Ok(response) => {
                    for outcome in response.files {
                        match (outcome.summary, outcome.error) {
                            (Some(summary), _) => {
                                add_log(
                                    set_logs,
                                    LogLevel::Success,
                                    &format!(
                                        "✅ {} loaded: {} rows, {} columns",
                                        summary.name,
                                        summary.row_count,
                                        summary.columns.len()
                                    ),
                                );
                                set_files.update(|files| files.push(summary));
                            }
                            (None, error) => {
                                let message = error.unwrap_or_else(|| "unknown error".to_string());
                                add_log(
                                    set_logs,
                                    LogLevel::Error,
                                    &format!("❌ {}: {}", outcome.file, message),
                                );
                            }
                        }
                    }
                }
                Err(e) => {
                    add_log(set_logs, LogLevel::Error, &format!("❌ Upload failed: {}", e));
                    set_error.set(Some(e.to_string()));
                }
            }

            set_is_uploading.set(false);
        });
    };

    let trigger_file_input = move |_| {
        if let Some(input) = gloo_utils::document()
            .get_element_by_id("fileInput")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            input.click();
        }
    };

    view! {
        <div class="upload-section" id="uploadZone" on:click=trigger_file_input>
            <div class="upload-icon">"📤"</div>
            <div class="upload-text">
                {move || if is_uploading.get() {
                    "⏳ Uploading and reading files..."
                } else {
                    "Upload your files (CSV or Excel)"
                }}
            </div>

            <Show when=move || !is_uploading.get() fallback=|| view! { }>
                <div class="upload-hint">"Click to select one or more files"</div>
            </Show>

            <Show when=move || error.get().is_some() fallback=|| view! { }>
                <div class="error-message">{move || error.get().unwrap_or_default()}</div>
            </Show>

            <input
                type="file"
                id="fileInput"
                accept=ACCEPTED_EXTENSIONS
                multiple=true
                style="display:none"
                on:click=|ev| ev.stop_propagation()
                on:change=on_file_change
            />
        </div>
    }
}

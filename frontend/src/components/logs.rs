//! Real-time log streaming using Server-Sent Events (SSE).
//!
//! Connects to the backend's `/api/logs` endpoint and shows pipeline logs
//! next to messages raised by the UI itself.

use leptos::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{EventSource, MessageEvent};

use crate::{LogEntry, LogLevel, BACKEND_URL, MAX_LOG_ENTRIES};

fn request_animation_frame(f: impl FnOnce() + 'static) {
    let closure = Closure::once(f);
    if let Some(window) = web_sys::window() {
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    }
    closure.forget();
}

fn now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Parse a streamed entry, re-stamping it with local display time.
fn parse_sse_log(json: &str) -> Option<LogEntry> {
    let mut entry: LogEntry = serde_json::from_str(json).ok()?;
    entry.timestamp = chrono::DateTime::parse_from_rfc3339(&entry.timestamp)
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|_| now());
    Some(entry)
}

fn push_capped(logs: &mut Vec<LogEntry>, entry: LogEntry) {
    logs.push(entry);
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
}

/// Add a UI-side log line and mirror it to the console.
pub fn add_log(set_logs: WriteSignal<Vec<LogEntry>>, level: LogLevel, message: &str) {
    let entry = LogEntry {
        level,
        message: message.to_string(),
        indent: 0,
        timestamp: now(),
    };
    set_logs.update(|logs| push_capped(logs, entry));
    log::info!("{}", message);
}

/// Start SSE connection to receive real-time logs.
/// Should be called ONCE at app startup.
pub fn init_sse_logs(set_logs: WriteSignal<Vec<LogEntry>>) {
    let sse_url = format!("{}/api/logs", BACKEND_URL);

    let event_source = match EventSource::new(&sse_url) {
        Ok(es) => es,
        Err(e) => {
            log::error!("Failed to create EventSource: {:?}", e);
            return;
        }
    };

    let onmessage = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Some(entry) = event.data().as_string().and_then(|d| parse_sse_log(&d)) {
            set_logs.update(|logs| push_capped(logs, entry));
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    event_source.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    let onerror = Closure::wrap(Box::new(move |_: web_sys::Event| {
        log::warn!("SSE connection error - will auto-reconnect");
    }) as Box<dyn FnMut(web_sys::Event)>);
    event_source.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    // Lives for the whole page
    std::mem::forget(event_source);

    log::info!("📡 SSE log stream initialized");
}

/// Processing logs panel.
#[component]
pub fn LogsPanel(
    logs: ReadSignal<Vec<LogEntry>>,
    set_logs: WriteSignal<Vec<LogEntry>>,
) -> impl IntoView {
    let logs_container = create_node_ref::<leptos::html::Div>();

    // Keep the newest entry in view
    create_effect(move |_| {
        let _ = logs.get();
        if let Some(container) = logs_container.get() {
            request_animation_frame(move || {
                container.set_scroll_top(container.scroll_height());
            });
        }
    });

    view! {
        <Show when=move || !logs.get().is_empty() fallback=|| view! { }>
            <div class="logs-panel">
                <div class="logs-header">
                    <span class="logs-title">"📋 Processing Logs"</span>
                    <button class="logs-clear" on:click=move |_| set_logs.set(vec![])>
                        "Clear"
                    </button>
                </div>
                <div class="logs-content" node_ref=logs_container>
                    <For
                        each=move || logs.get().into_iter().enumerate()
                        key=|(i, entry)| (*i, entry.timestamp.clone())
                        children=move |(_, entry)| {
                            let padding = format!("padding-left: {}em", entry.indent);
                            view! {
                                <div class=format!("log-entry {}", entry.level.css_class()) style=padding>
                                    <span class="log-time">"[" {entry.timestamp.clone()} "] "</span>
                                    {entry.message.clone()}
                                </div>
                            }
                        }
                    />
                </div>
            </div>
        </Show>
    }
}

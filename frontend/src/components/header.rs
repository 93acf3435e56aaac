use leptos::*;

use crate::APP_NAME;

#[component]
pub fn Header(
    /// Active backend session, once connected
    session_id: Signal<Option<String>>,
    /// Number of files loaded in the session
    file_count: Signal<usize>,
) -> impl IntoView {
    view! {
        <header>
            <div class="header-left">
                <a href="#" class="logo">{APP_NAME}</a>
                <span class="badge">
                    {move || match file_count.get() {
                        1 => "1 file".to_string(),
                        n => format!("{} files", n),
                    }}
                </span>
            </div>
            <div class="header-right">
                <div class="session-status" class:connected=move || session_id.get().is_some()>
                    <span class="session-dot" class:connected=move || session_id.get().is_some()></span>
                    <span>
                        {move || match session_id.get() {
                            Some(id) => format!("Session {}", &id[..8.min(id.len())]),
                            None => "Connecting...".to_string(),
                        }}
                    </span>
                </div>
            </div>
        </header>
    }
}

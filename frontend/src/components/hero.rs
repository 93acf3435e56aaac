//! Hero section component

use leptos::*;

#[component]
pub fn Hero() -> impl IntoView {
    view! {
        <div class="hero">
            <h1>"💿 Data Sweeper"</h1>
            <p class="subtitle">
                "Transform your files between CSV and Excel formats with built-in data cleaning "
                "and visualization."
            </p>
        </div>
    }
}

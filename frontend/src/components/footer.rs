//! Footer component

use leptos::*;

#[component]
pub fn Footer() -> impl IntoView {
    view! {
        <footer>
            <div>"Data Sweeper • Powered by " <span class="rust-badge">"🦀 Rust + Leptos"</span></div>
            <div class="footer-links">
                <a href="https://github.com/datasweep/datasweep" class="footer-link" target="_blank">
                    "GitHub"
                </a>
            </div>
        </footer>
    }
}

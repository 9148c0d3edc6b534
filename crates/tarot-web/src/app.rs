//! Main App Component

use leptos::prelude::*;

use crate::api::{self, SpreadCard};
use crate::components::{CoinCounter, CoinPackButton};

/// A fixed three-card spread; card drawing itself is handled elsewhere
fn sample_spread() -> Vec<SpreadCard> {
    vec![
        SpreadCard {
            position: "past".into(),
            card_name: "The Fool".into(),
            reversed: false,
        },
        SpreadCard {
            position: "present".into(),
            card_name: "The Tower".into(),
            reversed: true,
        },
        SpreadCard {
            position: "future".into(),
            card_name: "The Star".into(),
            reversed: false,
        },
    ]
}

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    let (token, set_token) = signal(String::new());
    let (coins, set_coins) = signal(0u64);
    let (question, set_question) = signal(String::new());
    let (reading, set_reading) = signal(String::new());
    let (error, set_error) = signal(String::new());
    let (loading, set_loading) = signal(false);

    // Pull-refresh: the server balance is authoritative, this is a cache.
    let refresh = move || {
        let token = token.get_untracked();
        if token.is_empty() {
            return;
        }
        leptos::task::spawn_local(async move {
            match api::fetch_balance(&token).await {
                Ok(balance) => set_coins.set(balance),
                Err(e) => set_error.set(e),
            }
        });
    };

    let sign_in = move |_| {
        set_error.set(String::new());
        refresh();
    };

    let draw = move |_| {
        let q = question.get();
        if q.is_empty() || loading.get() {
            return;
        }

        set_error.set(String::new());
        set_reading.set(String::new());
        set_loading.set(true);

        let token = token.get_untracked();
        leptos::task::spawn_local(async move {
            match api::request_fortune(&token, &q, &sample_spread()).await {
                Ok(text) => set_reading.set(text),
                Err(e) => set_error.set(e),
            }
            set_loading.set(false);
            // The debit already happened server-side; reconcile the display.
            refresh();
        });
    };

    let buy = move |price_id: &'static str| {
        let uid = token
            .get_untracked()
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();
        leptos::task::spawn_local(async move {
            match api::create_checkout(price_id, &uid).await {
                Ok(url) if !url.is_empty() => {
                    if let Some(window) = web_sys::window() {
                        let _ = window.location().set_href(&url);
                    }
                }
                Ok(_) | Err(_) => set_error.set("Failed to start checkout".into()),
            }
        });
    };

    view! {
        <main class="app">
            <header class="topbar">
                <h1>"🔮 Tarot Lumina"</h1>
                <CoinCounter coins=Signal::derive(move || coins.get()) />
            </header>

            <section class="signin">
                <input
                    type="password"
                    placeholder="Session token"
                    prop:value=move || token.get()
                    on:input=move |ev| set_token.set(event_target_value(&ev))
                />
                <button on:click=sign_in>"Sign in"</button>
            </section>

            <section class="reading">
                <textarea
                    placeholder="What would you ask the cards?"
                    prop:value=move || question.get()
                    on:input=move |ev| set_question.set(event_target_value(&ev))
                />
                <button on:click=draw disabled=move || loading.get()>
                    {move || if loading.get() { "Reading..." } else { "Draw (100 coins)" }}
                </button>

                <Show when=move || !reading.get().is_empty()>
                    <p class="fortune">{move || reading.get()}</p>
                </Show>
                <Show when=move || !error.get().is_empty()>
                    <p class="error">{move || error.get()}</p>
                </Show>
            </section>

            <section class="shop">
                <h2>"Coin packs"</h2>
                <div class="packs">
                    <CoinPackButton label="Starter" coins=100
                        on_buy=Callback::new(move |()| buy("price_coins_100")) />
                    <CoinPackButton label="Seeker" coins=380
                        on_buy=Callback::new(move |()| buy("price_coins_380")) />
                    <CoinPackButton label="Mystic" coins=1120
                        on_buy=Callback::new(move |()| buy("price_coins_1120")) />
                    <CoinPackButton label="Oracle" coins=3000
                        on_buy=Callback::new(move |()| buy("price_coins_3000")) />
                </div>
            </section>
        </main>
    }
}

//! UI Components

use std::time::Duration;

use leptos::leptos_dom::helpers::{set_interval_with_handle, IntervalHandle};
use leptos::prelude::*;

use crate::coins::CoinAnimation;

/// Animated coin balance display.
///
/// Whenever the cached balance changes, the shown number walks toward it
/// one coin per tick instead of jumping.
#[component]
pub fn CoinCounter(coins: Signal<u64>) -> impl IntoView {
    let initial = coins.get_untracked();
    let (displayed, set_displayed) = signal(initial);
    let anim = StoredValue::new(CoinAnimation::new(initial));
    let running: StoredValue<Option<IntervalHandle>> = StoredValue::new(None);

    let stop = move || {
        if let Some(handle) = running.get_value() {
            handle.clear();
            running.set_value(None);
        }
    };

    Effect::new(move |_| {
        let target = coins.get();
        stop();

        let Some(interval_ms) = anim.try_update_value(|a| a.retarget(target)).flatten() else {
            set_displayed.set(target);
            return;
        };

        let handle = set_interval_with_handle(
            move || {
                set_displayed.set(anim.try_update_value(CoinAnimation::tick).unwrap());
                if anim.with_value(CoinAnimation::done) {
                    stop();
                }
            },
            Duration::from_millis(interval_ms),
        )
        .ok();
        running.set_value(handle);
    });

    view! {
        <span class="coin-counter">"🪙 " {move || displayed.get()}</span>
    }
}

/// One purchasable coin pack
#[component]
pub fn CoinPackButton(
    label: &'static str,
    coins: u64,
    #[prop(into)] on_buy: Callback<()>,
) -> impl IntoView {
    view! {
        <button class="pack" on:click=move |_| on_buy.run(())>
            <span class="pack-coins">{coins} " coins"</span>
            <span class="pack-label">{label}</span>
        </button>
    }
}

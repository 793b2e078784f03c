/// Popup UI: inactive tabs past the threshold, and the threshold setting

use crate::browser::ChromeStorage;
use crate::config::Threshold;
use crate::error::TrackerError;
use crate::storage::Persistence;
use crate::tab_data::{InactiveEntry, TabId, TrackingMap};
use crate::ui::components::InactiveTabRow;
use patternfly_yew::prelude::*;
use serde_json::Value;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Clone, PartialEq)]
enum PopupState {
    Loading,
    Idle,
    Saved(String),
    Error(&'static str, String),
}

/// Entries shown in the popup: past the threshold, oldest first
fn visible_entries(map: &TrackingMap, now: f64, threshold: Threshold) -> Vec<(TabId, InactiveEntry)> {
    map.past_threshold(now, threshold.as_millis())
        .into_iter()
        .map(|(id, entry)| (id, entry.clone()))
        .collect()
}

/// Threshold field contents as a storage value. Text that is not a number
/// is passed through as a string so validation rejects it.
fn threshold_input_value(raw: &str) -> Value {
    match raw.trim().parse::<f64>() {
        Ok(secs) => Value::from(secs),
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Alert title for a failed threshold save
fn threshold_error_title(error: &TrackerError) -> &'static str {
    match error {
        TrackerError::InvalidThreshold(_) => "Invalid threshold",
        TrackerError::StorageWrite(_) => "Could not save threshold",
        _ => "Error",
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| PopupState::Loading);
    let tracking = use_state(TrackingMap::new);
    let threshold = use_state(Threshold::default);
    let threshold_input = use_state(String::new);
    let now = js_sys::Date::now();

    // Load tracked tabs and the threshold on mount
    {
        let state = state.clone();
        let tracking = tracking.clone();
        let threshold = threshold.clone();
        let threshold_input = threshold_input.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                let persistence = Persistence::new(ChromeStorage);
                let stored_threshold = persistence.get_inactive_threshold().await;

                tracking.set(persistence.get_inactive_tabs_data().await);
                threshold_input.set(stored_threshold.secs().to_string());
                threshold.set(stored_threshold);
                state.set(PopupState::Idle);
            });
            || ()
        });
    }

    let on_threshold_input = {
        let threshold_input = threshold_input.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                threshold_input.set(input.value());
            }
        })
    };

    let on_save_threshold = {
        let state = state.clone();
        let threshold = threshold.clone();
        let threshold_input = threshold_input.clone();

        Callback::from(move |_| {
            let state = state.clone();
            let threshold = threshold.clone();
            let value = threshold_input_value(&threshold_input);

            spawn_local(async move {
                let persistence = Persistence::new(ChromeStorage);
                match persistence.set_inactive_threshold(&value).await {
                    Ok(saved) => {
                        threshold.set(saved);
                        state.set(PopupState::Saved(format!("Threshold set to {} seconds", saved.secs())));
                    }
                    Err(e) => {
                        log::warn!("Failed to save threshold: {}", e);
                        state.set(PopupState::Error(threshold_error_title(&e), e.to_string()));
                    }
                }
            });
        })
    };

    let entries = visible_entries(&tracking, now, *threshold);
    let is_loading = *state == PopupState::Loading;

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Tab Graveyard"}</h1>

            {match &*state {
                PopupState::Loading => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{"Loading inactive tabs..."}</p>
                    </div>
                },
                PopupState::Saved(msg) => html! {
                    <Alert r#type={AlertType::Success} title={msg.clone()} inline={true}>
                    </Alert>
                },
                PopupState::Error(title, err) => html! {
                    <Alert r#type={AlertType::Danger} title={*title} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                PopupState::Idle => html! {}
            }}

            <div class="threshold-container">
                <label class="threshold-label" for="threshold-input">{"Inactive after (seconds)"}</label>
                <input
                    id="threshold-input"
                    type="number"
                    min="0"
                    step="any"
                    value={(*threshold_input).clone()}
                    oninput={on_threshold_input}
                    class="threshold-input"
                    disabled={is_loading}
                />
                <Button onclick={on_save_threshold} disabled={is_loading} variant={ButtonVariant::Secondary}>
                    {"Save"}
                </Button>
            </div>

            if !is_loading {
                if entries.is_empty() {
                    <div class="empty-state">
                        <p>{"No inactive tabs."}</p>
                    </div>
                } else {
                    <div class="tab-list">
                        {for entries.iter().map(|(id, entry)| html! {
                            <InactiveTabRow key={*id} entry={entry.clone()} now={now} />
                        })}
                    </div>
                }
            }

            <p class="footer-popup">
                {format!("{} tracked • {} inactive", tracking.len(), entries.len())}
            </p>
        </div>
    }
}

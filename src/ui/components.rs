/// Reusable UI components

use crate::tab_data::InactiveEntry;
use yew::prelude::*;

const HOUR_MS: f64 = 60.0 * 60.0 * 1000.0;

/// How long a tab has been inactive, as shown next to it
#[derive(Debug, Clone, PartialEq)]
pub struct InactiveAge {
    pub text: String,
    pub class: &'static str,
}

/// Bucket an inactivity span into the popup's age labels:
/// under an hour is "just now", under six hours is recent, under a day is
/// today, anything older is counted in days.
pub fn format_inactive_age(now: f64, inactive_from: f64) -> InactiveAge {
    let hours = (now - inactive_from) / HOUR_MS;

    if hours < 6.0 {
        InactiveAge {
            text: if hours < 1.0 {
                "just now".to_string()
            } else {
                format!("{}h", hours.floor())
            },
            class: "time-recent",
        }
    } else if hours < 24.0 {
        InactiveAge {
            text: format!("{}h", hours.floor()),
            class: "time-today",
        }
    } else {
        InactiveAge {
            text: format!("{}d", (hours / 24.0).floor()),
            class: "time-old",
        }
    }
}

/// Host part of a tab URL, for the secondary line of a row
pub fn display_host(tab_url: &str) -> Option<String> {
    url::Url::parse(tab_url)
        .ok()?
        .host_str()
        .map(|host| host.trim_start_matches("www.").to_string())
}

#[derive(Properties, PartialEq)]
pub struct InactiveTabRowProps {
    pub entry: InactiveEntry,
    pub now: f64,
}

#[function_component(InactiveTabRow)]
pub fn inactive_tab_row(props: &InactiveTabRowProps) -> Html {
    let entry = &props.entry;
    let age = format_inactive_age(props.now, entry.inactive_from);

    let title = if entry.title.is_empty() { entry.url.clone() } else { entry.title.clone() };
    let host = display_host(&entry.url).unwrap_or_else(|| entry.url.clone());

    html! {
        <div class="tab-item">
            <div class="tab-content">
                <div class="tab-title" title={entry.url.clone()}>{title}</div>
                <div class="tab-host">{host}</div>
            </div>
            <span class={classes!("tab-time", age.class)}>{age.text}</span>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: f64 = 1_700_000_000_000.0;

    fn age_after_hours(hours: f64) -> InactiveAge {
        format_inactive_age(NOW, NOW - hours * HOUR_MS)
    }

    #[test]
    fn test_format_just_now() {
        assert_eq!(
            age_after_hours(0.0),
            InactiveAge { text: "just now".to_string(), class: "time-recent" }
        );
        assert_eq!(age_after_hours(0.99).text, "just now");
    }

    #[test]
    fn test_format_recent_and_today() {
        assert_eq!(
            age_after_hours(1.5),
            InactiveAge { text: "1h".to_string(), class: "time-recent" }
        );
        assert_eq!(
            age_after_hours(6.0),
            InactiveAge { text: "6h".to_string(), class: "time-today" }
        );
        assert_eq!(age_after_hours(23.9).text, "23h");
    }

    #[test]
    fn test_format_days() {
        assert_eq!(
            age_after_hours(24.0),
            InactiveAge { text: "1d".to_string(), class: "time-old" }
        );
        assert_eq!(age_after_hours(24.0 * 9.5).text, "9d");
    }

    #[test]
    fn test_display_host() {
        assert_eq!(display_host("https://www.google.com/search?q=rust"), Some("google.com".to_string()));
        assert_eq!(display_host("https://docs.rs/serde"), Some("docs.rs".to_string()));
        assert_eq!(display_host("chrome://newtab/"), Some("newtab".to_string()));
        assert_eq!(display_host("not a url"), None);
        assert_eq!(display_host(""), None);
    }
}

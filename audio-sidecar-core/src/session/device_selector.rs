use crate::models::audio_models::AudioDevice;
use crate::models::config::MatchPolicy;

/// Pick the input device whose name contains `fragment`, ignoring case.
///
/// With [`MatchPolicy::LastMatch`] the last matching device in enumeration
/// order wins. An unset or empty fragment matches nothing.
pub fn select_device<'a>(
    devices: &'a [AudioDevice],
    fragment: Option<&str>,
    policy: MatchPolicy,
) -> Option<&'a AudioDevice> {
    let needle = match fragment.map(str::trim) {
        Some(f) if !f.is_empty() => f.to_lowercase(),
        _ => {
            log::warn!("No Interface configured; capture stays unbound");
            return None;
        }
    };

    let mut matches = devices
        .iter()
        .filter(|device| device.name.to_lowercase().contains(&needle));
    let selected = match policy {
        MatchPolicy::FirstMatch => matches.next(),
        MatchPolicy::LastMatch => matches.last(),
    };

    match selected {
        Some(device) => log::info!("Selected device[{}]: {}", device.index, device.name),
        None => log::warn!("No input device name contains {:?}", needle),
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices(names: &[&str]) -> Vec<AudioDevice> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| AudioDevice::named(i, name))
            .collect()
    }

    #[test]
    fn last_match_wins_by_default() {
        let list = devices(&["Scarlett 2i2 (in 1)", "Scarlett 2i2 (in 2)"]);
        let selected = select_device(&list, Some("scarlett"), MatchPolicy::default()).unwrap();
        assert_eq!(selected.name, "Scarlett 2i2 (in 2)");
        assert_eq!(selected.index, 1);
    }

    #[test]
    fn first_match_policy() {
        let list = devices(&["Built-in Mic", "Scarlett 2i2 (in 1)", "Scarlett 2i2 (in 2)"]);
        let selected = select_device(&list, Some("scarlett"), MatchPolicy::FirstMatch).unwrap();
        assert_eq!(selected.index, 1);
    }

    #[test]
    fn matching_ignores_case_on_both_sides() {
        let list = devices(&["focusrite USB"]);
        assert!(select_device(&list, Some("FocusRite"), MatchPolicy::LastMatch).is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let list = devices(&["Built-in Mic", "HDMI"]);
        assert!(select_device(&list, Some("scarlett"), MatchPolicy::LastMatch).is_none());
    }

    #[test]
    fn unset_or_empty_fragment_matches_nothing() {
        let list = devices(&["Built-in Mic"]);
        assert!(select_device(&list, None, MatchPolicy::LastMatch).is_none());
        assert!(select_device(&list, Some(""), MatchPolicy::LastMatch).is_none());
        assert!(select_device(&list, Some("  "), MatchPolicy::FirstMatch).is_none());
    }

    #[test]
    fn empty_enumeration() {
        assert!(select_device(&[], Some("mic"), MatchPolicy::LastMatch).is_none());
    }
}

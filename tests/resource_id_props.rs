use azrm::providers::azure::{ResourceId, WebAppId};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9._()-]{0,23}"
}

fn namespace() -> impl Strategy<Value = String> {
    "Microsoft\\.[A-Z][A-Za-z]{1,15}"
}

fn resource_id() -> impl Strategy<Value = ResourceId> {
    (
        segment(),
        segment(),
        namespace(),
        segment(),
        segment(),
        prop::collection::vec((segment(), segment()), 0..3),
    )
        .prop_map(|(sub, group, provider, resource_type, name, children)| {
            children.into_iter().fold(
                ResourceId::new(sub, group, provider, resource_type, name),
                |id, (child_type, child_name)| id.with_child(child_type, child_name),
            )
        })
}

proptest! {
    #[test]
    fn test_parse_inverts_display(id in resource_id()) {
        let rendered = id.to_string();
        let parsed = ResourceId::parse(&rendered).unwrap();
        prop_assert_eq!(&parsed, &id);
        prop_assert_eq!(parsed.to_string(), rendered);
    }

    #[test]
    fn test_leaf_name_is_last_segment(id in resource_id()) {
        let rendered = id.to_string();
        let last = rendered.rsplit('/').next().unwrap();
        prop_assert_eq!(id.leaf_name(), last);
    }

    #[test]
    fn test_web_app_id_round_trip(sub in segment(), group in segment(), site in segment()) {
        let id = WebAppId::new(&sub, &group, &site);
        let parsed = WebAppId::parse(&id.to_string()).unwrap();
        prop_assert_eq!(parsed, id);
    }

    #[test]
    fn test_trailing_slash_is_rejected(id in resource_id()) {
        let rendered = format!("{}/", id);
        prop_assert!(ResourceId::parse(&rendered).is_err());
    }

    #[test]
    fn test_parse_never_panics(input in "\\PC{0,120}") {
        let _ = ResourceId::parse(&input);
    }
}

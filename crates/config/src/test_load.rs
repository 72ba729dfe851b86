#[cfg(test)]
mod tests {
    use std::{fs, path::Path, time::Duration};

    use crate::*;

    const HOME: &str = "/Users/alice";

    fn load(src: &str) -> Result<ProfileStore, Error> {
        load_from_str(src, None, Some(Path::new(HOME)))
    }

    #[test]
    fn work_profile_parses() {
        let store = load(
            r#"{
                "modes": {
                    "Work": { "dockItems": ["Mail", "Slack"], "wallpaperPath": "/img/work.png" }
                }
            }"#,
        )
        .unwrap();
        let work = store.get("Work").unwrap();
        assert_eq!(
            work.dock_items.as_deref(),
            Some(&["Mail".to_string(), "Slack".to_string()][..])
        );
        assert_eq!(work.wallpaper_path.as_deref(), Some(Path::new("/img/work.png")));
        assert!(store.get("Personal").is_none());
    }

    #[test]
    fn snake_case_aliases_accepted() {
        let store = load(
            r#"{
                "poll_interval_secs": 10,
                "modes": { "Sleep": { "dock_items": [], "wallpaper": "~/night.jpg" } }
            }"#,
        )
        .unwrap();
        let sleep = store.get("Sleep").unwrap();
        assert_eq!(sleep.dock_items.as_deref(), Some(&[][..]));
        assert_eq!(
            sleep.wallpaper_path.as_deref(),
            Some(Path::new("/Users/alice/night.jpg"))
        );
        assert_eq!(store.poll_interval(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn duplicate_mode_rejected() {
        let err = load(
            r#"{
                "modes": {
                    "Work": { "dockItems": ["Mail"] },
                    "Personal": {},
                    "Work": { "dockItems": ["Slack"] }
                }
            }"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateMode);
        match err {
            Error::DuplicateMode { mode, .. } => assert_eq!(mode, "Work"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_dock_item_rejected() {
        let err = load(r#"{ "modes": { "Work": { "dockItems": ["Mail", "  "] } } }"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDockItem);
        match err {
            Error::InvalidDockItem { mode, index, .. } => {
                assert_eq!(mode, "Work");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn relative_wallpaper_rejected() {
        let err = load(r#"{ "modes": { "Work": { "wallpaperPath": "work.png" } } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidWallpaperPath { .. }));
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
    }

    #[test]
    fn unknown_keys_route_to_extensions() {
        let store = load(
            r#"{
                "version": 2,
                "modes": {
                    "Work": {
                        "dockItems": ["Mail"],
                        "menuBarHidden": true,
                        "theme": "dark",
                        "extensions": { "theme": "light", "accent": "blue" }
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(store.extensions().get("version").map(String::as_str), Some("2"));
        let ext = &store.get("Work").unwrap().extensions;
        assert_eq!(ext.get("menuBarHidden").map(String::as_str), Some("true"));
        assert_eq!(ext.get("theme").map(String::as_str), Some("light"));
        assert_eq!(ext.get("accent").map(String::as_str), Some("blue"));
    }

    #[test]
    fn syntax_error_reports_location() {
        let err = load("{\n  \"modes\": {\n    \"Work\": { \"dockItems\": [\"Mail\",] }\n  }\n}")
            .unwrap_err();
        match &err {
            Error::Parse { line, excerpt, .. } => {
                assert_eq!(*line, 3);
                assert!(excerpt.contains('^'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
    }

    #[test]
    fn wrong_type_is_parse_failure() {
        let err = load(r#"{ "modes": { "Work": { "dockItems": "Mail" } } }"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "modes": { "Do Not Disturb": { "wallpaperPath": "/img/dnd.png" } } }"#,
        )
        .unwrap();
        let store = load_from_path(&path).unwrap();
        assert_eq!(store.modes().collect::<Vec<_>>(), vec!["Do Not Disturb"]);
        assert!(store.get("Do Not Disturb").unwrap().dock_items.is_none());
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use dockscreen_db::AdmetProfile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.database.path, PathBuf::from("./data/dockscreen.json"));
        assert_eq!(config.docking.receptor, "1e9h");
        assert_eq!(config.docking.timeout_secs, 1800);
        assert_eq!(config.admet.timeout_secs, 30);
        assert_eq!(config.admet.profile, AdmetProfile::Standard);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            [docking]
            vina_path = "/opt/vina/bin/vina"
            timeout_secs = 600

            [admet]
            api_url = "http://localhost:8089/admet"
            profile = "legacy"
            "#,
        )
        .unwrap();
        assert_eq!(config.docking.vina_path, PathBuf::from("/opt/vina/bin/vina"));
        assert_eq!(config.docking.timeout_secs, 600);
        assert_eq!(config.docking.work_dir, PathBuf::from("./docking"));
        assert_eq!(config.admet.api_url, "http://localhost:8089/admet");
        assert_eq!(config.admet.profile, AdmetProfile::Legacy);
        assert_eq!(config.admet.timeout_secs, 30);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.docking.max_parallel, 2);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dockscreen.toml");
        std::fs::write(&path, "[docking\ntimeout_secs = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let example = Config::from_toml(include_str!("../../../../dockscreen.example.toml")).unwrap();
        let defaults = Config::default();
        assert_eq!(example.database.path, defaults.database.path);
        assert_eq!(example.docking, defaults.docking);
        assert_eq!(example.admet, defaults.admet);
    }
}

const BRIDGE_SETTINGS: &str = "FLAPJACK_BRIDGE_SETTINGS";

pub fn get_settings_path() -> Option<String> {
    let path_from_env = std::env::var(BRIDGE_SETTINGS);
    path_from_env.ok().filter(|path| !path.is_empty())
}

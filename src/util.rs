use crate::monitor::DEFAULT_NAME;

const COMPLAINER_NAME: &str = "COMPLAINER_NAME";

/// Monitor name from the environment, or the default one
pub fn get_name() -> String {
    std::env::var(COMPLAINER_NAME)
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string())
}

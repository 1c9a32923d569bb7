use std::{
    env,
    fmt::{Debug, Display},
    str::FromStr,
};

use tracing::{debug, warn};

pub fn get_env_var_or_default<T>(var_name: &str, default: T) -> T
where
    T: Display + Debug + FromStr,
    <T as FromStr>::Err: Display,
{
    match env::var(var_name) {
        Ok(val) => match T::from_str(val.trim()) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(
                    "Invalid value {:?} in \"{}\" env var. Defaulting to \"{}\". Error details: {}",
                    val, var_name, default, error
                );
                default
            }
        },
        Err(error) => {
            debug!(
                "Error reading \"{}\" env var. Defaulting to \"{}\". Error details: {}",
                var_name, default, error
            );
            default
        }
    }
}

/// Reads a comma-separated list. The whole list falls back to `default` if
/// any entry fails to parse, so a typo never silently drops an item.
pub fn get_env_list_or_default<T>(var_name: &str, default: &str) -> Vec<T>
where
    T: FromStr,
    <T as FromStr>::Err: Display,
{
    let raw = env::var(var_name).unwrap_or_else(|_| default.to_string());

    match parse_list(&raw) {
        Ok(items) => items,
        Err(error) => {
            warn!(
                "Invalid entry in \"{}\" env var ({}). Defaulting to \"{}\"",
                var_name, error, default
            );
            parse_list(default).unwrap_or_default()
        }
    }
}

pub(crate) fn parse_list<T>(raw: &str) -> Result<Vec<T>, String>
where
    T: FromStr,
    <T as FromStr>::Err: Display,
{
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| T::from_str(item).map_err(|e| format!("{item:?}: {e}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_skips_blank_entries() {
        let parsed: Vec<u16> = parse_list(" 5, 10,,20 ").unwrap();
        assert_eq!(parsed, vec![5, 10, 20]);
    }

    #[test]
    fn parse_list_rejects_bad_entry() {
        assert!(parse_list::<u16>("5,ten").is_err());
    }

    #[test]
    fn missing_var_falls_back_to_default() {
        let value: u64 = get_env_var_or_default("DEPTH_MONITOR_TEST_UNSET_VAR", 42);
        assert_eq!(value, 42);

        let list: Vec<u16> = get_env_list_or_default("DEPTH_MONITOR_TEST_UNSET_LIST", "1,2");
        assert_eq!(list, vec![1, 2]);
    }
}

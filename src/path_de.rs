use serde::de::DeserializeOwned;

use crate::error::FixtureError;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, FixtureError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(path_error)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, FixtureError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(path_error)
}

fn path_error(err: serde_path_to_error::Error<serde_json::Error>) -> FixtureError {
    let path = err.path().to_string();
    FixtureError::config(format!("at JSON path {path} → {}", err.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn error_names_the_json_path() {
        let err = from_str_with_path::<Settings>(r#"{"collection_min_size": "many"}"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("at JSON path collection_min_size"), "{msg}");
        assert!(matches!(err, FixtureError::Config(_)));
    }

    #[test]
    fn unknown_settings_are_rejected() {
        let err = from_slice_with_path::<Settings>(br#"{"colection_max_size": 3}"#).unwrap_err();
        assert!(err.to_string().contains("colection_max_size"));
    }
}
